//! Exercises the SQLite adapter against real database files.

use api_lib::adapters::{db::schema::MIGRATIONS, DbAdapter, DbGateway};
use sqlx::sqlite::SqlitePoolOptions;
use std::path::Path;
use std::sync::Arc;
use story_maker_core::{
    ArtifactCache, ArtifactRepository, ImageDraft, PortError, SavedImage, Story, StoryDraft,
    StoryId, StoryPage, Storybook, StorybookDraft,
};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn database_url(dir: &TempDir) -> String {
    format!("sqlite://{}", dir.path().join("story_maker.db").display())
}

fn fox_book() -> StorybookDraft {
    StorybookDraft {
        title: "The Clever Fox".into(),
        prompt: "a fox who learns to share".into(),
        style: "watercolor".into(),
        cover_image_url: Some("https://img.test/cover.png".into()),
        pages: vec![
            StoryPage::with_image("Once upon a time", "https://img.test/1.png"),
            StoryPage::new("The end"),
        ],
    }
}

/// Creates a database as the first release left it: only the stories table, one row.
async fn seed_version_one(path: &Path) {
    let url = format!("sqlite://{}?mode=rwc", path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&url)
        .await
        .unwrap();
    for statement in MIGRATIONS[0].1.split(';').filter(|s| !s.trim().is_empty()) {
        sqlx::query(statement).execute(&pool).await.unwrap();
    }
    sqlx::query("PRAGMA user_version = 1").execute(&pool).await.unwrap();
    sqlx::query(
        "INSERT INTO stories (id, title, content, image, description, created_at, updated_at)
         VALUES (?, 'Old story', 'Written before storybooks existed.', NULL, NULL, ?, ?)",
    )
    .bind(StoryId::new().to_string())
    .bind("2024-01-01T10:00:00.000000Z")
    .bind("2024-01-01T10:00:00.000000Z")
    .execute(&pool)
    .await
    .unwrap();
    pool.close().await;
}

#[tokio::test]
async fn story_lifecycle_round_trips_through_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let db = DbAdapter::open(&database_url(&dir)).await.unwrap();
    let stories: &dyn ArtifactRepository<Story> = &db;

    let mut draft = StoryDraft::new("Trip", "We went to the beach.");
    draft.image = Some("data:image/png;base64,AAAA".into());
    let saved = stories.add(draft).await.unwrap();
    assert_eq!(saved.created_at, saved.updated_at);

    let fetched = stories.get_one(saved.id).await.unwrap().unwrap();
    assert_eq!(fetched, saved);

    let mut edited = fetched.clone();
    edited.content = "We went to the beach and it rained.".into();
    let updated = stories.update(edited).await.unwrap();
    assert!(updated.updated_at > saved.updated_at);
    assert_eq!(updated.created_at, saved.created_at);
    assert_eq!(stories.get_one(saved.id).await.unwrap(), Some(updated));

    stories.delete(saved.id).await.unwrap();
    assert_eq!(stories.get_one(saved.id).await.unwrap(), None);
    db.close().await;

    // Reopening sees exactly what was committed.
    let reopened = DbAdapter::open(&database_url(&dir)).await.unwrap();
    let stories: &dyn ArtifactRepository<Story> = &reopened;
    assert!(stories.get_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn get_all_returns_newest_first() {
    let db = DbAdapter::open("sqlite::memory:").await.unwrap();
    let images: &dyn ArtifactRepository<SavedImage> = &db;

    for prompt in ["first", "second", "third"] {
        images
            .add(ImageDraft {
                image: format!("https://img.test/{}.png", prompt),
                prompt: prompt.into(),
            })
            .await
            .unwrap();
    }

    let prompts: Vec<String> = images
        .get_all()
        .await
        .unwrap()
        .into_iter()
        .map(|i| i.prompt)
        .collect();
    assert_eq!(prompts, vec!["third", "second", "first"]);
}

#[tokio::test]
async fn updating_a_missing_record_is_not_found_and_writes_nothing() {
    let db = DbAdapter::open("sqlite::memory:").await.unwrap();
    let stories: &dyn ArtifactRepository<Story> = &db;

    let saved = stories.add(StoryDraft::new("Kept", "text")).await.unwrap();
    stories.delete(saved.id).await.unwrap();

    let result = stories.update(saved.clone()).await;
    assert!(matches!(result, Err(PortError::NotFound(_))));
    assert!(stories.get_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_and_clear_are_idempotent() {
    let db = DbAdapter::open("sqlite::memory:").await.unwrap();
    let stories: &dyn ArtifactRepository<Story> = &db;

    stories.delete(StoryId::new()).await.unwrap();
    stories.add(StoryDraft::new("One", "a")).await.unwrap();
    stories.add(StoryDraft::new("Two", "b")).await.unwrap();
    stories.clear_all().await.unwrap();
    stories.clear_all().await.unwrap();
    assert!(stories.get_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn storybook_pages_keep_their_order() {
    let db = DbAdapter::open("sqlite::memory:").await.unwrap();
    let books: &dyn ArtifactRepository<Storybook> = &db;

    let saved = books.add(fox_book()).await.unwrap();
    let fetched = books.get_one(saved.id).await.unwrap().unwrap();
    assert_eq!(fetched.pages, fox_book().pages);
    assert_eq!(fetched.cover_image_url.as_deref(), Some("https://img.test/cover.png"));

    let empty = StorybookDraft {
        pages: Vec::new(),
        ..fox_book()
    };
    assert!(matches!(books.add(empty).await, Err(PortError::InvalidInput(_))));
}

#[tokio::test]
async fn kinds_are_stored_independently() {
    let db = DbAdapter::open("sqlite::memory:").await.unwrap();
    let stories: &dyn ArtifactRepository<Story> = &db;
    let books: &dyn ArtifactRepository<Storybook> = &db;

    stories.add(StoryDraft::new("Loose story", "text")).await.unwrap();
    books.add(fox_book()).await.unwrap();
    books.clear_all().await.unwrap();

    assert_eq!(stories.get_all().await.unwrap().len(), 1);
    assert!(books.get_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn upgrading_an_old_database_keeps_its_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("story_maker.db");
    seed_version_one(&path).await;

    let db = DbAdapter::open(&database_url(&dir)).await.unwrap();
    assert_eq!(
        DbGateway::schema_version(db.pool()).await.unwrap(),
        api_lib::adapters::db::schema::SCHEMA_VERSION
    );

    let stories: &dyn ArtifactRepository<Story> = &db;
    let old = stories.get_all().await.unwrap();
    assert_eq!(old.len(), 1);
    assert_eq!(old[0].title, "Old story");

    // The tables added by later versions are usable straight away.
    let books: &dyn ArtifactRepository<Storybook> = &db;
    books.add(fox_book()).await.unwrap();
    assert_eq!(books.get_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn a_database_from_a_newer_release_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("story_maker.db");
    seed_version_one(&path).await;

    let url = format!("sqlite://{}", path.display());
    let pool = SqlitePoolOptions::new().connect(&url).await.unwrap();
    sqlx::query("PRAGMA user_version = 99").execute(&pool).await.unwrap();
    pool.close().await;

    let result = DbAdapter::open(&url).await;
    assert!(matches!(result, Err(PortError::StorageUnavailable(_))));
}

#[tokio::test]
async fn the_cache_never_deletes_the_last_page() {
    let db = Arc::new(DbAdapter::open("sqlite::memory:").await.unwrap());
    let cache = ArtifactCache::<Storybook>::new(db.clone());
    cache.load(&CancellationToken::new()).await;

    let book = cache.add(fox_book()).await.unwrap();
    let book = cache.delete_page(book.id, 0).await.unwrap();
    assert_eq!(book.pages, vec![StoryPage::new("The end")]);

    let result = cache.delete_page(book.id, 0).await;
    assert!(matches!(result, Err(PortError::InvalidInput(_))));

    let books: &dyn ArtifactRepository<Storybook> = &*db;
    let stored = books.get_one(book.id).await.unwrap().unwrap();
    assert_eq!(stored.page_count(), 1);
}
