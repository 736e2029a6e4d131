//! services/api/src/adapters/db/storybooks.rs
//!
//! `ArtifactRepository<Storybook>` over the `storybooks` table. Pages are kept as a
//! JSON array column so their reading order travels with the row.

use super::{db_error, decode_id, decode_timestamp, encode_timestamp, DbAdapter};
use async_trait::async_trait;
use sqlx::FromRow;
use story_maker_core::domain::{
    timestamp_now, Artifact, StoryPage, Storybook, StorybookDraft, StorybookId,
};
use story_maker_core::ports::{ArtifactRepository, PortError, PortResult};

#[derive(FromRow)]
struct StorybookRecord {
    id: String,
    title: String,
    prompt: String,
    style: String,
    cover_image_url: Option<String>,
    pages: String,
    created_at: String,
}

impl StorybookRecord {
    fn to_domain(self) -> PortResult<Storybook> {
        let pages: Vec<StoryPage> = serde_json::from_str(&self.pages).map_err(|e| {
            PortError::Unexpected(format!("Corrupt pages for storybook {}: {}", self.id, e))
        })?;
        Ok(Storybook {
            id: decode_id(&self.id)?,
            title: self.title,
            prompt: self.prompt,
            style: self.style,
            cover_image_url: self.cover_image_url,
            pages,
            created_at: decode_timestamp(&self.created_at)?,
        })
    }
}

fn encode_pages(pages: &[StoryPage]) -> PortResult<String> {
    serde_json::to_string(pages).map_err(|e| PortError::Unexpected(e.to_string()))
}

const SELECT_STORYBOOK: &str =
    "SELECT id, title, prompt, style, cover_image_url, pages, created_at FROM storybooks";

#[async_trait]
impl ArtifactRepository<Storybook> for DbAdapter {
    async fn get_all(&self) -> PortResult<Vec<Storybook>> {
        let records = sqlx::query_as::<_, StorybookRecord>(&format!(
            "{} ORDER BY created_at DESC, rowid DESC",
            SELECT_STORYBOOK
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        records.into_iter().map(StorybookRecord::to_domain).collect()
    }

    async fn get_one(&self, id: StorybookId) -> PortResult<Option<Storybook>> {
        let record =
            sqlx::query_as::<_, StorybookRecord>(&format!("{} WHERE id = ?", SELECT_STORYBOOK))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;

        record.map(StorybookRecord::to_domain).transpose()
    }

    async fn add(&self, draft: StorybookDraft) -> PortResult<Storybook> {
        let book = Storybook::create(draft, timestamp_now())?;
        sqlx::query(
            "INSERT INTO storybooks (id, title, prompt, style, cover_image_url, pages, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(book.id.to_string())
        .bind(&book.title)
        .bind(&book.prompt)
        .bind(&book.style)
        .bind(&book.cover_image_url)
        .bind(encode_pages(&book.pages)?)
        .bind(encode_timestamp(&book.created_at))
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(book)
    }

    async fn update(&self, book: Storybook) -> PortResult<Storybook> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let stored =
            sqlx::query_as::<_, StorybookRecord>(&format!("{} WHERE id = ?", SELECT_STORYBOOK))
                .bind(book.id.to_string())
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_error)?
                .ok_or_else(|| PortError::NotFound(format!("Storybook {} not found", book.id)))?
                .to_domain()?;

        let revised = book.revise(&stored, timestamp_now())?;
        sqlx::query(
            "UPDATE storybooks SET title = ?, prompt = ?, style = ?, cover_image_url = ?, pages = ?
             WHERE id = ?",
        )
        .bind(&revised.title)
        .bind(&revised.prompt)
        .bind(&revised.style)
        .bind(&revised.cover_image_url)
        .bind(encode_pages(&revised.pages)?)
        .bind(revised.id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        Ok(revised)
    }

    async fn delete(&self, id: StorybookId) -> PortResult<()> {
        sqlx::query("DELETE FROM storybooks WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    async fn clear_all(&self) -> PortResult<()> {
        sqlx::query("DELETE FROM storybooks")
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }
}
