//! crates/story_maker_core/src/cache.rs
//!
//! An in-memory, observable mirror of one kind of artifact. The cache is the only
//! write path the outer layers use: every mutation goes to the repository first and
//! reaches the in-memory list only once the repository has confirmed it.

use crate::domain::{Artifact, Story, StoryDraft, StoryPage, Storybook, StorybookId};
use crate::fallback::SafeStorage;
use crate::ports::{ArtifactRepository, PortError, PortResult};
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

//=========================================================================================
// Observable State
//=========================================================================================

/// What consumers of a cache can observe.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheState<A> {
    /// True until the first load has finished, successfully or not.
    pub loading: bool,
    /// Set when the first load failed; the list is then session-only.
    pub degraded: bool,
    /// Records, newest first.
    pub items: Vec<A>,
}

impl<A> Default for CacheState<A> {
    fn default() -> Self {
        Self {
            loading: true,
            degraded: false,
            items: Vec::new(),
        }
    }
}

/// The fallback key under which the last unsaved write of a kind is kept.
pub fn backup_key(kind: &str) -> String {
    format!("story-maker:backup:{}", kind)
}

//=========================================================================================
// The Cache
//=========================================================================================

pub struct ArtifactCache<A: Artifact> {
    repo: Arc<dyn ArtifactRepository<A>>,
    backup: SafeStorage,
    state: watch::Sender<CacheState<A>>,
    /// Bumped by every mutation applied to `state`, so a load can tell it raced one.
    epoch: AtomicU64,
}

impl<A: Artifact> ArtifactCache<A> {
    pub fn new(repo: Arc<dyn ArtifactRepository<A>>) -> Self {
        let (state, _) = watch::channel(CacheState::default());
        Self {
            repo,
            backup: SafeStorage::disabled(),
            state,
            epoch: AtomicU64::new(0),
        }
    }

    /// Keeps a copy of any write that fails in `backup`, so the work is not lost.
    pub fn with_backup(mut self, backup: SafeStorage) -> Self {
        self.backup = backup;
        self
    }

    //-------------------------------------------------------------------------------------
    // Loading
    //-------------------------------------------------------------------------------------

    /// Starts the initial load in the background and returns immediately.
    pub fn spawn_load(self: &Arc<Self>, token: CancellationToken) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move { cache.load(&token).await })
    }

    /// Loads every record from the repository into memory.
    ///
    /// A failure leaves an empty, degraded list instead of an error. If `token` is
    /// cancelled by the time the repository answers, the answer is discarded.
    pub async fn load(&self, token: &CancellationToken) {
        loop {
            let epoch = self.epoch.load(Ordering::Acquire);
            let result = self.repo.get_all().await;

            if token.is_cancelled() {
                debug!(kind = A::KIND, "Load finished after its consumer went away; discarding");
                return;
            }

            let applied = match result {
                Ok(items) => {
                    let count = items.len();
                    let applied = self.state.send_if_modified(|state| {
                        if self.epoch.load(Ordering::Acquire) != epoch {
                            return false;
                        }
                        state.items = items;
                        state.loading = false;
                        state.degraded = false;
                        true
                    });
                    if applied {
                        info!(kind = A::KIND, count, "Loaded records");
                    }
                    applied
                }
                Err(e) => {
                    warn!(
                        kind = A::KIND,
                        error = %e,
                        "Initial load failed; continuing with an empty list"
                    );
                    self.state.send_modify(|state| {
                        state.items.clear();
                        state.loading = false;
                        state.degraded = true;
                    });
                    true
                }
            };

            if applied {
                return;
            }
            debug!(kind = A::KIND, "Records changed while loading; fetching again");
        }
    }

    //-------------------------------------------------------------------------------------
    // Reads
    //-------------------------------------------------------------------------------------

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn is_degraded(&self) -> bool {
        self.state.borrow().degraded
    }

    /// A snapshot of the cached records, newest first.
    pub fn items(&self) -> Vec<A> {
        self.state.borrow().items.clone()
    }

    pub fn get(&self, id: A::Id) -> Option<A> {
        self.state
            .borrow()
            .items
            .iter()
            .find(|item| item.id() == id)
            .cloned()
    }

    /// Like [`get`](Self::get), but asks the repository when the record is not cached,
    /// e.g. while the first load is still running.
    pub async fn get_one(&self, id: A::Id) -> PortResult<Option<A>> {
        match self.get(id) {
            Some(record) => Ok(Some(record)),
            None => self.repo.get_one(id).await,
        }
    }

    /// A receiver that is notified after every change to the cached state.
    pub fn subscribe(&self) -> watch::Receiver<CacheState<A>> {
        self.state.subscribe()
    }

    //-------------------------------------------------------------------------------------
    // Mutations
    //-------------------------------------------------------------------------------------

    pub async fn add(&self, draft: A::Draft) -> PortResult<A> {
        match self.repo.add(draft.clone()).await {
            Ok(record) => {
                self.apply(|items| items.insert(0, record.clone()));
                debug!(kind = A::KIND, id = %record.id(), "Added record");
                Ok(record)
            }
            Err(e) => {
                self.keep_backup("add", &draft, &e);
                Err(e)
            }
        }
    }

    /// Replaces a record. An unknown id fails with `NotFound` and leaves the list alone.
    pub async fn update(&self, record: A) -> PortResult<A> {
        match self.repo.update(record.clone()).await {
            Ok(stored) => {
                self.apply(|items| match items.iter_mut().find(|i| i.id() == stored.id()) {
                    Some(slot) => *slot = stored.clone(),
                    None => {
                        items.push(stored.clone());
                        items.sort_by_key(|i| std::cmp::Reverse(i.created_at()));
                    }
                });
                debug!(kind = A::KIND, id = %stored.id(), "Updated record");
                Ok(stored)
            }
            Err(e) => {
                self.keep_backup("update", &record, &e);
                Err(e)
            }
        }
    }

    /// Removes a record. Removing an unknown id succeeds.
    pub async fn delete(&self, id: A::Id) -> PortResult<()> {
        self.repo.delete(id).await?;
        self.apply(|items| items.retain(|i| i.id() != id));
        debug!(kind = A::KIND, %id, "Deleted record");
        Ok(())
    }

    /// Removes every record of this kind. Not reversible.
    pub async fn clear_all(&self) -> PortResult<()> {
        self.repo.clear_all().await?;
        self.apply(|items| items.clear());
        info!(kind = A::KIND, "Cleared all records");
        Ok(())
    }

    /// Applies `edit` to the current version of a record and saves the result.
    ///
    /// If `edit` fails, nothing is written.
    pub async fn modify<F>(&self, id: A::Id, edit: F) -> PortResult<A>
    where
        F: FnOnce(&mut A) -> PortResult<()> + Send,
    {
        let mut record = self
            .get_one(id)
            .await?
            .ok_or_else(|| PortError::NotFound(format!("{} {}", A::KIND, id)))?;
        edit(&mut record)?;
        self.update(record).await
    }

    //-------------------------------------------------------------------------------------
    // Backups
    //-------------------------------------------------------------------------------------

    /// The last write of this kind that failed to save, if one was kept.
    pub fn recover_backup<T: DeserializeOwned>(&self) -> Option<T> {
        self.backup.safe_get(&backup_key(A::KIND))
    }

    pub fn discard_backup(&self) {
        self.backup.safe_remove(&backup_key(A::KIND));
    }

    fn keep_backup<T: serde::Serialize>(&self, operation: &str, value: &T, cause: &PortError) {
        error!(kind = A::KIND, operation, error = %cause, "Save failed");
        // Only storage failures are backed up, not rejected edits.
        let rejected = matches!(cause, PortError::NotFound(_) | PortError::InvalidInput(_));
        if !rejected && self.backup.is_enabled() {
            self.backup.safe_set(&backup_key(A::KIND), value);
            info!(kind = A::KIND, "Kept a backup of the unsaved work");
        }
    }

    fn apply(&self, change: impl FnOnce(&mut Vec<A>)) {
        self.state.send_modify(|state| {
            change(&mut state.items);
            self.epoch.fetch_add(1, Ordering::AcqRel);
        });
    }
}

//=========================================================================================
// Kind-specific Operations
//=========================================================================================

impl ArtifactCache<Story> {
    /// Adds a story together with a cover image and its caption.
    pub async fn add_with_image(
        &self,
        title: impl Into<String>,
        content: impl Into<String>,
        image: impl Into<String>,
        description: Option<String>,
    ) -> PortResult<Story> {
        let draft = StoryDraft {
            title: title.into(),
            content: content.into(),
            image: Some(image.into()),
            description,
        };
        self.add(draft).await
    }
}

impl ArtifactCache<Storybook> {
    pub async fn add_page(&self, id: StorybookId, page: StoryPage) -> PortResult<Storybook> {
        self.modify(id, |book| {
            book.add_page(page);
            Ok(())
        })
        .await
    }

    pub async fn update_page(
        &self,
        id: StorybookId,
        index: usize,
        page: StoryPage,
    ) -> PortResult<Storybook> {
        self.modify(id, |book| book.update_page(index, page)).await
    }

    /// Deletes one page. Deleting the only page is rejected before anything is written.
    pub async fn delete_page(&self, id: StorybookId, index: usize) -> PortResult<Storybook> {
        self.modify(id, |book| book.delete_page(index).map(|_| ())).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ImageDraft, SavedImage, StoryId, StorybookDraft};
    use crate::offline::OfflineRepository;
    use crate::testing::{GatedRepository, MemoryRepository, MemoryStore};

    fn story_cache() -> (Arc<MemoryRepository<Story>>, ArtifactCache<Story>) {
        let repo = Arc::new(MemoryRepository::<Story>::default());
        let cache = ArtifactCache::new(repo.clone() as Arc<dyn ArtifactRepository<Story>>);
        (repo, cache)
    }

    async fn loaded<A: Artifact>(cache: &ArtifactCache<A>) {
        cache.load(&CancellationToken::new()).await;
    }

    #[tokio::test]
    async fn basic_story_lifecycle() {
        let (repo, cache) = story_cache();
        loaded(&cache).await;
        assert!(!cache.is_loading());

        let story = cache
            .add(StoryDraft::new("Trip", "We went to the beach."))
            .await
            .unwrap();
        let all = repo.get_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "Trip");
        assert_eq!(all[0].content, "We went to the beach.");
        assert_eq!(all[0].created_at, all[0].updated_at);

        let mut edited = story.clone();
        edited.content = "We went to the beach and it rained.".to_string();
        cache.update(edited).await.unwrap();
        let fetched = repo.get_one(story.id).await.unwrap().unwrap();
        assert_eq!(fetched.content, "We went to the beach and it rained.");
        assert!(fetched.updated_at > fetched.created_at);

        cache.delete(story.id).await.unwrap();
        assert!(repo.get_all().await.unwrap().is_empty());
        assert!(cache.items().is_empty());
    }

    #[tokio::test]
    async fn update_of_unknown_id_fails_and_leaves_the_cache_alone() {
        let (_repo, cache) = story_cache();
        loaded(&cache).await;
        cache.add(StoryDraft::new("Kept", "text")).await.unwrap();
        let before = cache.items();

        let mut ghost = before[0].clone();
        ghost.id = StoryId::new();
        ghost.title = "Ghost".to_string();
        let err = cache.update(ghost).await.unwrap_err();

        assert!(matches!(err, PortError::NotFound(_)));
        assert_eq!(cache.items(), before);
    }

    #[tokio::test]
    async fn repeated_updates_never_move_updated_at_backwards() {
        let (_repo, cache) = story_cache();
        loaded(&cache).await;
        let mut story = cache.add(StoryDraft::new("Draft", "v0")).await.unwrap();
        for n in 1..=5 {
            let previous = story.updated_at;
            story.content = format!("v{}", n);
            story = cache.update(story).await.unwrap();
            assert!(story.updated_at > previous);
            assert!(story.updated_at >= story.created_at);
        }
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (_repo, cache) = story_cache();
        loaded(&cache).await;
        let story = cache.add(StoryDraft::new("Gone", "soon")).await.unwrap();
        cache.delete(story.id).await.unwrap();
        cache.delete(story.id).await.unwrap();
        assert!(cache.items().is_empty());
    }

    #[tokio::test]
    async fn cache_matches_repository_after_every_mutation() {
        let repo = Arc::new(MemoryRepository::<SavedImage>::default());
        let cache = ArtifactCache::new(repo.clone() as Arc<dyn ArtifactRepository<SavedImage>>);
        loaded(&cache).await;

        let mut ids = Vec::new();
        for n in 0..4 {
            let image = cache
                .add(ImageDraft {
                    image: format!("https://img/{}.png", n),
                    prompt: format!("prompt {}", n),
                })
                .await
                .unwrap();
            ids.push(image.id);
            assert_eq!(cache.items(), repo.get_all().await.unwrap());
        }

        let mut edited = cache.get(ids[1]).unwrap();
        edited.prompt = "a better prompt".to_string();
        cache.update(edited).await.unwrap();
        assert_eq!(cache.items(), repo.get_all().await.unwrap());

        cache.delete(ids[2]).await.unwrap();
        assert_eq!(cache.items(), repo.get_all().await.unwrap());

        cache.clear_all().await.unwrap();
        assert_eq!(cache.items(), repo.get_all().await.unwrap());
        assert!(cache.items().is_empty());
    }

    #[tokio::test]
    async fn items_are_newest_first() {
        let (repo, cache) = story_cache();
        loaded(&cache).await;
        for title in ["first", "second", "third"] {
            cache.add(StoryDraft::new(title, "")).await.unwrap();
        }
        let titles: Vec<_> = cache.items().into_iter().map(|s| s.title).collect();
        assert_eq!(titles, ["third", "second", "first"]);

        let reloaded = ArtifactCache::new(repo as Arc<dyn ArtifactRepository<Story>>);
        loaded(&reloaded).await;
        assert_eq!(reloaded.items(), cache.items());
    }

    #[tokio::test]
    async fn a_write_during_the_first_load_is_not_lost() {
        let repo = Arc::new(GatedRepository::<Story>::default());
        let cache = Arc::new(ArtifactCache::new(
            repo.clone() as Arc<dyn ArtifactRepository<Story>>
        ));

        let load = cache.spawn_load(CancellationToken::new());
        // The load has read an empty table and is now held before returning it.
        repo.entered.notified().await;

        let story = cache.add(StoryDraft::new("Early", "saved mid-load")).await.unwrap();
        repo.release.notify_one();
        load.await.unwrap();

        assert!(!cache.is_loading());
        assert_eq!(cache.items(), repo.get_all().await.unwrap());
        assert_eq!(cache.items(), vec![story]);
    }

    #[tokio::test]
    async fn records_missing_from_the_cache_are_read_from_the_repository() {
        let (repo, cache) = story_cache();
        let stored = repo.add(StoryDraft::new("On disk", "not loaded yet")).await.unwrap();
        assert!(cache.is_loading());
        assert_eq!(cache.get(stored.id), None);

        assert_eq!(cache.get_one(stored.id).await.unwrap(), Some(stored));
        assert_eq!(cache.get_one(StoryId::new()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn unavailable_storage_degrades_to_an_empty_list() {
        let cache = Arc::new(ArtifactCache::<Story>::new(Arc::new(OfflineRepository::new(
            "disabled in test",
        ))));
        assert!(cache.is_loading());

        cache.spawn_load(CancellationToken::new()).await.unwrap();

        assert!(!cache.is_loading());
        assert!(cache.is_degraded());
        assert!(cache.items().is_empty());
    }

    #[tokio::test]
    async fn failed_saves_are_backed_up() {
        let backup = SafeStorage::new(Arc::new(MemoryStore::default()));
        let repo = Arc::new(OfflineRepository::new("disabled in test"));
        let cache = ArtifactCache::<Story>::new(repo).with_backup(backup);
        loaded(&cache).await;

        let draft = StoryDraft::new("Unsaved", "Please don't lose me");
        let err = cache.add(draft.clone()).await.unwrap_err();
        assert!(matches!(err, PortError::StorageUnavailable(_)));
        assert!(cache.items().is_empty());

        assert_eq!(cache.recover_backup::<StoryDraft>(), Some(draft));
        cache.discard_backup();
        assert_eq!(cache.recover_backup::<StoryDraft>(), None);
    }

    #[tokio::test]
    async fn cancelled_load_is_discarded() {
        let (repo, cache) = story_cache();
        repo.add(StoryDraft::new("Existing", "")).await.unwrap();

        let token = CancellationToken::new();
        token.cancel();
        cache.load(&token).await;

        assert!(cache.is_loading());
        assert!(cache.items().is_empty());
    }

    #[tokio::test]
    async fn subscribers_see_mutations() {
        let (_repo, cache) = story_cache();
        let mut rx = cache.subscribe();
        loaded(&cache).await;
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();

        cache.add_with_image("Cover", "text", "data:image/png;base64,AAAA", Some("A fox".into()))
            .await
            .unwrap();
        assert!(rx.has_changed().unwrap());
        let state = rx.borrow_and_update().clone();
        assert_eq!(state.items.len(), 1);
        assert_eq!(state.items[0].description.as_deref(), Some("A fox"));
    }

    #[tokio::test]
    async fn storybook_page_guard() {
        let repo = Arc::new(MemoryRepository::<Storybook>::default());
        let cache = ArtifactCache::new(repo.clone() as Arc<dyn ArtifactRepository<Storybook>>);
        loaded(&cache).await;

        let book = cache
            .add(StorybookDraft {
                title: "The Fox".into(),
                prompt: "a fox".into(),
                style: "cartoon".into(),
                cover_image_url: None,
                pages: vec![StoryPage::new("Once upon a time")],
            })
            .await
            .unwrap();

        let err = cache.delete_page(book.id, 0).await.unwrap_err();
        assert!(matches!(err, PortError::InvalidInput(_)));
        let stored = repo.get_one(book.id).await.unwrap().unwrap();
        assert_eq!(stored.pages.len(), 1);
        assert_eq!(cache.get(book.id).unwrap().pages.len(), 1);

        cache.add_page(book.id, StoryPage::new("The end")).await.unwrap();
        cache
            .update_page(book.id, 0, StoryPage::with_image("Once", "https://img/1.png"))
            .await
            .unwrap();
        let book = cache.delete_page(book.id, 1).await.unwrap();
        assert_eq!(book.pages, vec![StoryPage::with_image("Once", "https://img/1.png")]);
        assert_eq!(repo.get_one(book.id).await.unwrap().unwrap(), book);
    }
}
