//! services/api/src/adapters/db/stories.rs
//!
//! `ArtifactRepository<Story>` over the `stories` table.

use super::{db_error, decode_id, decode_timestamp, encode_timestamp, DbAdapter};
use async_trait::async_trait;
use sqlx::FromRow;
use story_maker_core::domain::{timestamp_now, Artifact, Story, StoryDraft, StoryId};
use story_maker_core::ports::{ArtifactRepository, PortError, PortResult};

//=========================================================================================
// "Impure" Database Record Struct
//=========================================================================================

#[derive(FromRow)]
struct StoryRecord {
    id: String,
    title: String,
    content: String,
    image: Option<String>,
    description: Option<String>,
    created_at: String,
    updated_at: String,
}

impl StoryRecord {
    fn to_domain(self) -> PortResult<Story> {
        Ok(Story {
            id: decode_id(&self.id)?,
            title: self.title,
            content: self.content,
            image: self.image,
            description: self.description,
            created_at: decode_timestamp(&self.created_at)?,
            updated_at: decode_timestamp(&self.updated_at)?,
        })
    }
}

const SELECT_STORY: &str =
    "SELECT id, title, content, image, description, created_at, updated_at FROM stories";

//=========================================================================================
// `ArtifactRepository<Story>` Trait Implementation
//=========================================================================================

#[async_trait]
impl ArtifactRepository<Story> for DbAdapter {
    async fn get_all(&self) -> PortResult<Vec<Story>> {
        let records = sqlx::query_as::<_, StoryRecord>(&format!(
            "{} ORDER BY created_at DESC, rowid DESC",
            SELECT_STORY
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        records.into_iter().map(StoryRecord::to_domain).collect()
    }

    async fn get_one(&self, id: StoryId) -> PortResult<Option<Story>> {
        let record = sqlx::query_as::<_, StoryRecord>(&format!("{} WHERE id = ?", SELECT_STORY))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        record.map(StoryRecord::to_domain).transpose()
    }

    async fn add(&self, draft: StoryDraft) -> PortResult<Story> {
        let story = Story::create(draft, timestamp_now())?;
        sqlx::query(
            "INSERT INTO stories (id, title, content, image, description, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(story.id.to_string())
        .bind(&story.title)
        .bind(&story.content)
        .bind(&story.image)
        .bind(&story.description)
        .bind(encode_timestamp(&story.created_at))
        .bind(encode_timestamp(&story.updated_at))
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(story)
    }

    async fn update(&self, story: Story) -> PortResult<Story> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let stored = sqlx::query_as::<_, StoryRecord>(&format!("{} WHERE id = ?", SELECT_STORY))
            .bind(story.id.to_string())
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error)?
            .ok_or_else(|| PortError::NotFound(format!("Story {} not found", story.id)))?
            .to_domain()?;

        let revised = story.revise(&stored, timestamp_now())?;
        sqlx::query(
            "UPDATE stories SET title = ?, content = ?, image = ?, description = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&revised.title)
        .bind(&revised.content)
        .bind(&revised.image)
        .bind(&revised.description)
        .bind(encode_timestamp(&revised.updated_at))
        .bind(revised.id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        Ok(revised)
    }

    async fn delete(&self, id: StoryId) -> PortResult<()> {
        sqlx::query("DELETE FROM stories WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    async fn clear_all(&self) -> PortResult<()> {
        sqlx::query("DELETE FROM stories")
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }
}
