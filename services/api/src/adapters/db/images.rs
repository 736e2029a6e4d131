//! services/api/src/adapters/db/images.rs
//!
//! `ArtifactRepository<SavedImage>` over the `images` table.

use super::{db_error, decode_id, decode_timestamp, encode_timestamp, DbAdapter};
use async_trait::async_trait;
use sqlx::FromRow;
use story_maker_core::domain::{timestamp_now, Artifact, ImageDraft, ImageId, SavedImage};
use story_maker_core::ports::{ArtifactRepository, PortError, PortResult};

#[derive(FromRow)]
struct ImageRecord {
    id: String,
    image: String,
    prompt: String,
    created_at: String,
}

impl ImageRecord {
    fn to_domain(self) -> PortResult<SavedImage> {
        Ok(SavedImage {
            id: decode_id(&self.id)?,
            image: self.image,
            prompt: self.prompt,
            created_at: decode_timestamp(&self.created_at)?,
        })
    }
}

const SELECT_IMAGE: &str = "SELECT id, image, prompt, created_at FROM images";

#[async_trait]
impl ArtifactRepository<SavedImage> for DbAdapter {
    async fn get_all(&self) -> PortResult<Vec<SavedImage>> {
        let records = sqlx::query_as::<_, ImageRecord>(&format!(
            "{} ORDER BY created_at DESC, rowid DESC",
            SELECT_IMAGE
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        records.into_iter().map(ImageRecord::to_domain).collect()
    }

    async fn get_one(&self, id: ImageId) -> PortResult<Option<SavedImage>> {
        let record = sqlx::query_as::<_, ImageRecord>(&format!("{} WHERE id = ?", SELECT_IMAGE))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        record.map(ImageRecord::to_domain).transpose()
    }

    async fn add(&self, draft: ImageDraft) -> PortResult<SavedImage> {
        let image = SavedImage::create(draft, timestamp_now())?;
        sqlx::query("INSERT INTO images (id, image, prompt, created_at) VALUES (?, ?, ?, ?)")
            .bind(image.id.to_string())
            .bind(&image.image)
            .bind(&image.prompt)
            .bind(encode_timestamp(&image.created_at))
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(image)
    }

    async fn update(&self, image: SavedImage) -> PortResult<SavedImage> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let stored = sqlx::query_as::<_, ImageRecord>(&format!("{} WHERE id = ?", SELECT_IMAGE))
            .bind(image.id.to_string())
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error)?
            .ok_or_else(|| PortError::NotFound(format!("Image {} not found", image.id)))?
            .to_domain()?;

        let revised = image.revise(&stored, timestamp_now())?;
        sqlx::query("UPDATE images SET image = ?, prompt = ? WHERE id = ?")
            .bind(&revised.image)
            .bind(&revised.prompt)
            .bind(revised.id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        Ok(revised)
    }

    async fn delete(&self, id: ImageId) -> PortResult<()> {
        sqlx::query("DELETE FROM images WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    async fn clear_all(&self) -> PortResult<()> {
        sqlx::query("DELETE FROM images")
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }
}
