//! crates/story_maker_core/src/domain.rs
//!
//! Defines the core records of the application: stories, saved images and storybooks.
//! These structs are independent of any database or transport format.

use crate::ports::{PortError, PortResult};
use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{fmt, hash::Hash, str::FromStr};
use uuid::Uuid;

//=========================================================================================
// Identities
//=========================================================================================

macro_rules! artifact_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a fresh random identity.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

artifact_id!(
    /// Identity of a [`Story`].
    StoryId
);
artifact_id!(
    /// Identity of a [`SavedImage`].
    ImageId
);
artifact_id!(
    /// Identity of a [`Storybook`].
    StorybookId
);

//=========================================================================================
// Timestamps
//=========================================================================================

/// The current time, truncated to the microsecond precision used by the stores.
pub fn timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Computes the modification time for a record previously modified at `previous`.
///
/// The result is strictly later than `previous`, even if the wall clock stalls
/// or steps backwards between writes.
pub fn next_updated_at(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    now.max(previous + Duration::microseconds(1))
}

//=========================================================================================
// The Artifact Abstraction
//=========================================================================================

/// Behaviour shared by every kind of record kept in the local store.
pub trait Artifact:
    Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    type Id: Copy + Eq + Hash + fmt::Display + fmt::Debug + Send + Sync + 'static;
    /// The caller-supplied content of a record that has not been stored yet.
    type Draft: Clone + fmt::Debug + Serialize + Send + Sync + 'static;

    /// Short, stable name of the kind, e.g. `"stories"`.
    const KIND: &'static str;

    fn id(&self) -> Self::Id;

    fn created_at(&self) -> DateTime<Utc>;

    /// Builds a new record from a draft, assigning identity and creation time.
    fn create(draft: Self::Draft, now: DateTime<Utc>) -> PortResult<Self>;

    /// Produces the record to persist when `self` replaces `stored`.
    ///
    /// Identity and creation time always come from `stored`.
    fn revise(self, stored: &Self, now: DateTime<Utc>) -> PortResult<Self>;
}

//=========================================================================================
// Story
//=========================================================================================

/// A free-form written piece.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub id: StoryId,
    pub title: String,
    pub content: String,
    /// Cover image as a data URL.
    pub image: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoryDraft {
    pub title: String,
    pub content: String,
    pub image: Option<String>,
    pub description: Option<String>,
}

impl StoryDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            image: None,
            description: None,
        }
    }
}

impl Artifact for Story {
    type Id = StoryId;
    type Draft = StoryDraft;

    const KIND: &'static str = "stories";

    fn id(&self) -> StoryId {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn create(draft: StoryDraft, now: DateTime<Utc>) -> PortResult<Self> {
        Ok(Self {
            id: StoryId::new(),
            title: draft.title,
            content: draft.content,
            image: draft.image,
            description: draft.description,
            created_at: now,
            updated_at: now,
        })
    }

    fn revise(self, stored: &Self, now: DateTime<Utc>) -> PortResult<Self> {
        Ok(Self {
            id: stored.id,
            created_at: stored.created_at,
            updated_at: next_updated_at(stored.updated_at, now),
            ..self
        })
    }
}

//=========================================================================================
// SavedImage
//=========================================================================================

/// A single generated illustration kept in the gallery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedImage {
    pub id: ImageId,
    /// A data URL or a remote URL.
    pub image: String,
    pub prompt: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageDraft {
    pub image: String,
    pub prompt: String,
}

fn require_image(image: &str) -> PortResult<()> {
    if image.trim().is_empty() {
        return Err(PortError::InvalidInput(
            "A saved image must contain image data".to_string(),
        ));
    }
    Ok(())
}

impl Artifact for SavedImage {
    type Id = ImageId;
    type Draft = ImageDraft;

    const KIND: &'static str = "images";

    fn id(&self) -> ImageId {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn create(draft: ImageDraft, now: DateTime<Utc>) -> PortResult<Self> {
        require_image(&draft.image)?;
        Ok(Self {
            id: ImageId::new(),
            image: draft.image,
            prompt: draft.prompt,
            created_at: now,
        })
    }

    fn revise(self, stored: &Self, _now: DateTime<Utc>) -> PortResult<Self> {
        require_image(&self.image)?;
        Ok(Self {
            id: stored.id,
            created_at: stored.created_at,
            ..self
        })
    }
}

//=========================================================================================
// Storybook
//=========================================================================================

/// One page of a storybook, in reading order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoryPage {
    pub text: String,
    pub image_url: Option<String>,
}

impl StoryPage {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image_url: None,
        }
    }

    pub fn with_image(text: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image_url: Some(image_url.into()),
        }
    }
}

/// A multi-page composed work. Always holds at least one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Storybook {
    pub id: StorybookId,
    pub title: String,
    pub prompt: String,
    pub style: String,
    pub cover_image_url: Option<String>,
    pub pages: Vec<StoryPage>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorybookDraft {
    pub title: String,
    pub prompt: String,
    pub style: String,
    pub cover_image_url: Option<String>,
    pub pages: Vec<StoryPage>,
}

fn require_pages(pages: &[StoryPage]) -> PortResult<()> {
    if pages.is_empty() {
        return Err(PortError::InvalidInput(
            "A storybook must have at least one page".to_string(),
        ));
    }
    Ok(())
}

impl Storybook {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Appends a page after the current last page.
    pub fn add_page(&mut self, page: StoryPage) {
        self.pages.push(page);
    }

    /// Inserts a page so that it ends up at `index`.
    pub fn insert_page(&mut self, index: usize, page: StoryPage) -> PortResult<()> {
        if index > self.pages.len() {
            return Err(self.out_of_range(index));
        }
        self.pages.insert(index, page);
        Ok(())
    }

    pub fn update_page(&mut self, index: usize, page: StoryPage) -> PortResult<()> {
        let slot = self
            .pages
            .get_mut(index)
            .ok_or_else(|| PortError::InvalidInput(format!("Page {} does not exist", index)))?;
        *slot = page;
        Ok(())
    }

    /// Removes the page at `index`. Removing the only remaining page is rejected.
    pub fn delete_page(&mut self, index: usize) -> PortResult<StoryPage> {
        if index >= self.pages.len() {
            return Err(self.out_of_range(index));
        }
        if self.pages.len() == 1 {
            return Err(PortError::InvalidInput(
                "Cannot delete the last page of a storybook".to_string(),
            ));
        }
        Ok(self.pages.remove(index))
    }

    fn out_of_range(&self, index: usize) -> PortError {
        PortError::InvalidInput(format!(
            "Page {} is out of range for a storybook with {} pages",
            index,
            self.pages.len()
        ))
    }
}

impl Artifact for Storybook {
    type Id = StorybookId;
    type Draft = StorybookDraft;

    const KIND: &'static str = "storybooks";

    fn id(&self) -> StorybookId {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn create(draft: StorybookDraft, now: DateTime<Utc>) -> PortResult<Self> {
        require_pages(&draft.pages)?;
        Ok(Self {
            id: StorybookId::new(),
            title: draft.title,
            prompt: draft.prompt,
            style: draft.style,
            cover_image_url: draft.cover_image_url,
            pages: draft.pages,
            created_at: now,
        })
    }

    fn revise(self, stored: &Self, _now: DateTime<Utc>) -> PortResult<Self> {
        require_pages(&self.pages)?;
        Ok(Self {
            id: stored.id,
            created_at: stored.created_at,
            ..self
        })
    }
}
