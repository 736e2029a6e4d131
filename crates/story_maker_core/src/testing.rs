//! In-memory stand-ins for the ports, used by the unit tests.

use crate::domain::{timestamp_now, Artifact};
use crate::export::ExportDocument;
use crate::generation::{GeneratedImage, GeneratedStory, ImageRequest, StoryRequest};
use crate::ports::{
    ArtifactRepository, ExportService, ImageGenerationService, KeyValueStore, KvError, PortError,
    PortResult, StoryGenerationService,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::Notify;

/// Records kept in insertion order.
pub struct MemoryRepository<A> {
    records: Mutex<Vec<A>>,
}

impl<A> Default for MemoryRepository<A> {
    fn default() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl<A: Artifact> ArtifactRepository<A> for MemoryRepository<A> {
    async fn get_all(&self) -> PortResult<Vec<A>> {
        let mut all: Vec<A> = self.records.lock().unwrap().iter().rev().cloned().collect();
        all.sort_by_key(|r| std::cmp::Reverse(r.created_at()));
        Ok(all)
    }

    async fn get_one(&self, id: A::Id) -> PortResult<Option<A>> {
        Ok(self.records.lock().unwrap().iter().find(|r| r.id() == id).cloned())
    }

    async fn add(&self, draft: A::Draft) -> PortResult<A> {
        let record = A::create(draft, timestamp_now())?;
        self.records.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn update(&self, record: A) -> PortResult<A> {
        let mut records = self.records.lock().unwrap();
        let slot = records
            .iter_mut()
            .find(|r| r.id() == record.id())
            .ok_or_else(|| PortError::NotFound(record.id().to_string()))?;
        let revised = record.revise(slot, timestamp_now())?;
        *slot = revised.clone();
        Ok(revised)
    }

    async fn delete(&self, id: A::Id) -> PortResult<()> {
        self.records.lock().unwrap().retain(|r| r.id() != id);
        Ok(())
    }

    async fn clear_all(&self) -> PortResult<()> {
        self.records.lock().unwrap().clear();
        Ok(())
    }
}

/// Holds the first `get_all` after it has read its snapshot, until `release` fires.
pub struct GatedRepository<A> {
    inner: MemoryRepository<A>,
    armed: AtomicBool,
    pub entered: Notify,
    pub release: Notify,
}

impl<A> Default for GatedRepository<A> {
    fn default() -> Self {
        Self {
            inner: MemoryRepository::default(),
            armed: AtomicBool::new(true),
            entered: Notify::new(),
            release: Notify::new(),
        }
    }
}

#[async_trait]
impl<A: Artifact> ArtifactRepository<A> for GatedRepository<A> {
    async fn get_all(&self) -> PortResult<Vec<A>> {
        let snapshot = self.inner.get_all().await?;
        if self.armed.swap(false, Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        Ok(snapshot)
    }

    async fn get_one(&self, id: A::Id) -> PortResult<Option<A>> {
        self.inner.get_one(id).await
    }

    async fn add(&self, draft: A::Draft) -> PortResult<A> {
        self.inner.add(draft).await
    }

    async fn update(&self, record: A) -> PortResult<A> {
        self.inner.update(record).await
    }

    async fn delete(&self, id: A::Id) -> PortResult<()> {
        self.inner.delete(id).await
    }

    async fn clear_all(&self) -> PortResult<()> {
        self.inner.clear_all().await
    }
}

#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), KvError> {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), KvError> {
        self.values.lock().unwrap().remove(key);
        Ok(())
    }
}

/// Fails every call, like a browser with storage disabled.
pub struct FailingStore;

impl KeyValueStore for FailingStore {
    fn get(&self, _key: &str) -> Result<Option<String>, KvError> {
        Err(KvError::Unavailable("storage disabled".into()))
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), KvError> {
        Err(KvError::Unavailable("quota exceeded".into()))
    }

    fn remove(&self, _key: &str) -> Result<(), KvError> {
        Err(KvError::Io(std::io::Error::other("boom")))
    }
}

pub struct StubStories {
    text: String,
}

impl StubStories {
    pub fn new(text: &str) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
impl StoryGenerationService for StubStories {
    async fn generate_story(&self, _request: &StoryRequest) -> PortResult<GeneratedStory> {
        GeneratedStory::parse(&self.text)
    }
}

pub struct StubImages;

#[async_trait]
impl ImageGenerationService for StubImages {
    async fn generate_image(&self, request: &ImageRequest) -> PortResult<GeneratedImage> {
        GeneratedImage::parse(format!("https://img.test/{}.png", request.prompt.len()))
    }
}

pub struct FailingImages;

#[async_trait]
impl ImageGenerationService for FailingImages {
    async fn generate_image(&self, _request: &ImageRequest) -> PortResult<GeneratedImage> {
        Err(PortError::GenerationFailed("rate limited".into()))
    }
}

#[derive(Default)]
pub struct RecordingExporter {
    documents: Mutex<Vec<ExportDocument>>,
}

impl RecordingExporter {
    pub fn take(&self) -> Vec<ExportDocument> {
        std::mem::take(&mut *self.documents.lock().unwrap())
    }
}

#[async_trait]
impl ExportService for RecordingExporter {
    async fn export(&self, document: &ExportDocument) -> PortResult<()> {
        self.documents.lock().unwrap().push(document.clone());
        Ok(())
    }
}
