//! crates/story_maker_core/src/export.rs
//!
//! The document handed to an export sink (e.g. a PDF renderer).

use crate::domain::{Story, Storybook};
use crate::ports::{ExportService, PortResult};
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub struct ExportPage {
    pub text: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportDocument {
    pub title: String,
    pub author: String,
    /// Pages in reading order.
    pub pages: Vec<ExportPage>,
}

impl ExportDocument {
    /// A storybook becomes an optional cover page followed by its pages in order.
    pub fn from_storybook(book: &Storybook, author: &str) -> Self {
        let cover = book.cover_image_url.as_ref().map(|url| ExportPage {
            text: book.title.clone(),
            image_url: Some(url.clone()),
        });
        let pages = cover
            .into_iter()
            .chain(book.pages.iter().map(|p| ExportPage {
                text: p.text.clone(),
                image_url: p.image_url.clone(),
            }))
            .collect();
        Self {
            title: book.title.clone(),
            author: author.to_string(),
            pages,
        }
    }

    /// A story becomes a single page carrying its cover image.
    pub fn from_story(story: &Story, author: &str) -> Self {
        Self {
            title: story.title.clone(),
            author: author.to_string(),
            pages: vec![ExportPage {
                text: story.content.clone(),
                image_url: story.image.clone(),
            }],
        }
    }
}

/// Sends a storybook to an export sink.
pub async fn export_storybook(
    exporter: &dyn ExportService,
    book: &Storybook,
    author: &str,
) -> PortResult<()> {
    let document = ExportDocument::from_storybook(book, author);
    exporter.export(&document).await?;
    info!(id = %book.id, pages = document.pages.len(), "Exported storybook");
    Ok(())
}
