//! crates/story_maker_core/src/generation.rs
//!
//! Requests sent to the generation collaborators and the validated results that come
//! back. Raw provider output is checked here before anything downstream sees it.

use crate::domain::{StoryPage, StorybookDraft};
use crate::ports::{ImageGenerationService, PortError, PortResult, StoryGenerationService};
use tracing::{info, warn};

//=========================================================================================
// Requests
//=========================================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ImageRequest {
    pub prompt: String,
    /// Art style, e.g. "watercolor" or "cartoon".
    pub style: Option<String>,
}

impl ImageRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            style: None,
        }
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    /// The full prompt text handed to an image model.
    pub fn render_prompt(&self) -> String {
        match self.style.as_deref().map(str::trim) {
            Some(style) if !style.is_empty() => format!(
                "A child-friendly illustration in a {} style: {}",
                style,
                self.prompt.trim()
            ),
            _ => format!("A child-friendly illustration: {}", self.prompt.trim()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoryRequest {
    pub prompt: String,
    /// Genre, e.g. "adventure" or "bedtime".
    pub genre: Option<String>,
    /// When set, the story is written as this many paragraphs.
    pub paragraphs: Option<usize>,
}

impl StoryRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            genre: None,
            paragraphs: None,
        }
    }
}

//=========================================================================================
// Validated Results
//=========================================================================================

/// An image returned by a generation service, known to be a data URL or an http(s) URL.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedImage {
    url: String,
}

impl GeneratedImage {
    pub fn parse(raw: impl Into<String>) -> PortResult<Self> {
        let url = raw.into();
        let trimmed = url.trim();
        let valid = trimmed.starts_with("data:image/")
            || trimmed.starts_with("https://")
            || trimmed.starts_with("http://");
        if !valid {
            return Err(PortError::GenerationFailed(
                "Image service returned something that is not an image URL".to_string(),
            ));
        }
        Ok(Self {
            url: trimmed.to_string(),
        })
    }

    /// Wraps base64-encoded PNG bytes as a data URL.
    pub fn from_base64_png(b64: &str) -> PortResult<Self> {
        if b64.trim().is_empty() {
            return Err(PortError::GenerationFailed(
                "Image service returned empty image data".to_string(),
            ));
        }
        Self::parse(format!("data:image/png;base64,{}", b64.trim()))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn into_url(self) -> String {
        self.url
    }
}

/// A story returned by a generation service.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedStory {
    pub title: Option<String>,
    pub content: String,
}

impl GeneratedStory {
    /// Validates raw model text. A leading `Title: ...` line becomes the title.
    pub fn parse(raw: &str) -> PortResult<Self> {
        let text = raw.trim();
        let heading = text.split_once('\n').and_then(|(first, rest)| {
            let first = first.trim();
            first
                .get(..6)
                .filter(|prefix| prefix.eq_ignore_ascii_case("title:"))
                .map(|_| (first[6..].trim().trim_matches('"').to_string(), rest.trim()))
        });
        let (title, body) = match heading {
            Some((title, rest)) => (Some(title).filter(|t| !t.is_empty()), rest),
            None => (None, text),
        };
        if body.is_empty() {
            return Err(PortError::GenerationFailed(
                "Story service returned no text".to_string(),
            ));
        }
        Ok(Self {
            title,
            content: body.to_string(),
        })
    }

    /// Splits the story into `count` pages of whole paragraphs, in order.
    ///
    /// Fewer pages are returned when the story has fewer paragraphs than `count`.
    pub fn into_pages(&self, count: usize) -> Vec<String> {
        let paragraphs: Vec<&str> = self
            .content
            .split("\n\n")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        let count = count.max(1).min(paragraphs.len().max(1));
        let (base, extra) = (paragraphs.len() / count, paragraphs.len() % count);
        let mut rest = paragraphs.as_slice();
        (0..count)
            .map(|page| {
                // The first `extra` pages carry one more paragraph.
                let (chunk, tail) = rest.split_at(base + usize::from(page < extra));
                rest = tail;
                chunk.join("\n\n")
            })
            .collect()
    }
}

//=========================================================================================
// Storybook Composition
//=========================================================================================

/// Parameters for composing a whole illustrated storybook.
#[derive(Debug, Clone, PartialEq)]
pub struct StorybookRequest {
    pub prompt: String,
    pub style: String,
    pub page_count: usize,
}

pub const MAX_STORYBOOK_PAGES: usize = 12;

/// Writes a story, splits it into pages and illustrates each one.
///
/// Any collaborator failure aborts the composition; nothing is retried here.
pub struct StorybookComposer<'a> {
    stories: &'a dyn StoryGenerationService,
    images: &'a dyn ImageGenerationService,
}

impl<'a> StorybookComposer<'a> {
    pub fn new(
        stories: &'a dyn StoryGenerationService,
        images: &'a dyn ImageGenerationService,
    ) -> Self {
        Self { stories, images }
    }

    pub async fn compose(&self, request: &StorybookRequest) -> PortResult<StorybookDraft> {
        if request.page_count == 0 || request.page_count > MAX_STORYBOOK_PAGES {
            return Err(PortError::InvalidInput(format!(
                "A storybook can have between 1 and {} pages",
                MAX_STORYBOOK_PAGES
            )));
        }

        let story = self
            .stories
            .generate_story(&StoryRequest {
                prompt: request.prompt.clone(),
                genre: None,
                paragraphs: Some(request.page_count),
            })
            .await?;
        let texts = story.into_pages(request.page_count);
        if texts.len() < request.page_count {
            warn!(
                requested = request.page_count,
                produced = texts.len(),
                "Story was shorter than the requested page count"
            );
        }

        let mut pages = Vec::with_capacity(texts.len());
        for text in texts {
            let image = self
                .images
                .generate_image(
                    &ImageRequest::new(text.as_str()).with_style(request.style.as_str()),
                )
                .await?;
            pages.push(StoryPage::with_image(text, image.into_url()));
        }

        let cover = self
            .images
            .generate_image(
                &ImageRequest::new(request.prompt.as_str()).with_style(request.style.as_str()),
            )
            .await?;

        info!(pages = pages.len(), "Composed storybook");
        Ok(StorybookDraft {
            title: story.title.unwrap_or_else(|| request.prompt.clone()),
            prompt: request.prompt.clone(),
            style: request.style.clone(),
            cover_image_url: Some(cover.into_url()),
            pages,
        })
    }
}
