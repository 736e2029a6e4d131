//! services/api/src/web/protocol.rs
//!
//! Defines the JSON payloads exchanged between the browser client and the API server.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use story_maker_core::domain::{
    ImageDraft, SavedImage, Story, StoryDraft, StoryPage, Storybook, StorybookDraft,
};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

//=========================================================================================
// Shared
//=========================================================================================

/// Destructive endpoints only act when the client confirms explicitly.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ConfirmParams {
    /// Must be `true` for the deletion to happen.
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PagePayload {
    pub text: String,
    pub image_url: Option<String>,
}

impl From<PagePayload> for StoryPage {
    fn from(p: PagePayload) -> Self {
        StoryPage {
            text: p.text,
            image_url: p.image_url,
        }
    }
}

impl From<StoryPage> for PagePayload {
    fn from(p: StoryPage) -> Self {
        PagePayload {
            text: p.text,
            image_url: p.image_url,
        }
    }
}

//=========================================================================================
// Stories
//=========================================================================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct StoryPayload {
    pub title: String,
    pub content: String,
    /// Cover image as a data URL.
    pub image: Option<String>,
    pub description: Option<String>,
}

impl From<StoryPayload> for StoryDraft {
    fn from(p: StoryPayload) -> Self {
        StoryDraft {
            title: p.title,
            content: p.content,
            image: p.image,
            description: p.description,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StoryResponse {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub image: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Story> for StoryResponse {
    fn from(s: Story) -> Self {
        Self {
            id: s.id.as_uuid(),
            title: s.title,
            content: s.content,
            image: s.image,
            description: s.description,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

//=========================================================================================
// Images
//=========================================================================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct ImagePayload {
    /// A data URL or a remote URL.
    pub image: String,
    pub prompt: String,
}

impl From<ImagePayload> for ImageDraft {
    fn from(p: ImagePayload) -> Self {
        ImageDraft {
            image: p.image,
            prompt: p.prompt,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ImageResponse {
    pub id: Uuid,
    pub image: String,
    pub prompt: String,
    pub created_at: DateTime<Utc>,
}

impl From<SavedImage> for ImageResponse {
    fn from(i: SavedImage) -> Self {
        Self {
            id: i.id.as_uuid(),
            image: i.image,
            prompt: i.prompt,
            created_at: i.created_at,
        }
    }
}

//=========================================================================================
// Storybooks
//=========================================================================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct StorybookPayload {
    pub title: String,
    pub prompt: String,
    pub style: String,
    pub cover_image_url: Option<String>,
    /// Pages in reading order; at least one.
    pub pages: Vec<PagePayload>,
}

impl From<StorybookPayload> for StorybookDraft {
    fn from(p: StorybookPayload) -> Self {
        StorybookDraft {
            title: p.title,
            prompt: p.prompt,
            style: p.style,
            cover_image_url: p.cover_image_url,
            pages: p.pages.into_iter().map(StoryPage::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StorybookResponse {
    pub id: Uuid,
    pub title: String,
    pub prompt: String,
    pub style: String,
    pub cover_image_url: Option<String>,
    pub pages: Vec<PagePayload>,
    pub created_at: DateTime<Utc>,
}

impl From<Storybook> for StorybookResponse {
    fn from(b: Storybook) -> Self {
        Self {
            id: b.id.as_uuid(),
            title: b.title,
            prompt: b.prompt,
            style: b.style,
            cover_image_url: b.cover_image_url,
            pages: b.pages.into_iter().map(PagePayload::from).collect(),
            created_at: b.created_at,
        }
    }
}

//=========================================================================================
// Generation
//=========================================================================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct GenerateImagePayload {
    pub prompt: String,
    pub style: Option<String>,
    /// Also keep the image in the gallery.
    #[serde(default)]
    pub save: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GeneratedImageResponse {
    pub image: String,
    /// Set when the image was saved to the gallery.
    pub saved: Option<ImageResponse>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GenerateStoryPayload {
    pub prompt: String,
    pub genre: Option<String>,
    #[serde(default)]
    pub save: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GeneratedStoryResponse {
    pub title: String,
    pub content: String,
    pub saved: Option<StoryResponse>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GenerateStorybookPayload {
    pub prompt: String,
    pub style: String,
    pub pages: usize,
    #[serde(default)]
    pub save: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GeneratedStorybookResponse {
    pub title: String,
    pub cover_image_url: Option<String>,
    pub pages: Vec<PagePayload>,
    pub saved: Option<StorybookResponse>,
}

//=========================================================================================
// Status
//=========================================================================================

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CollectionStatus {
    pub loading: bool,
    /// The collection could not be loaded; changes will not persist.
    pub degraded: bool,
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    pub stories: CollectionStatus,
    pub images: CollectionStatus,
    pub storybooks: CollectionStatus,
    pub fallback_available: bool,
}
