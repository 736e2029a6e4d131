//! services/api/src/adapters/db/schema.rs
//!
//! Ordered schema migrations. A migration is applied once, when the stored
//! `user_version` is below its version; released entries must never change.

/// The schema version this build expects.
pub const SCHEMA_VERSION: i64 = 3;

pub const MIGRATIONS: &[(i64, &str)] = &[
    (
        1,
        "
-- Free-form written stories
CREATE TABLE IF NOT EXISTS stories (
    id TEXT PRIMARY KEY,          -- UUID v4 string
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    image TEXT,                   -- Cover image as a data URL
    description TEXT,
    created_at TEXT NOT NULL,     -- RFC 3339, microseconds, UTC
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_stories_title ON stories(title);
CREATE INDEX IF NOT EXISTS idx_stories_created ON stories(created_at);
",
    ),
    (
        2,
        "
-- Generated illustrations kept in the gallery
CREATE TABLE IF NOT EXISTS images (
    id TEXT PRIMARY KEY,
    image TEXT NOT NULL,          -- Data URL or remote URL
    prompt TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_images_created ON images(created_at);
",
    ),
    (
        3,
        "
-- Multi-page storybooks
CREATE TABLE IF NOT EXISTS storybooks (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    prompt TEXT NOT NULL,
    style TEXT NOT NULL,
    cover_image_url TEXT,
    pages TEXT NOT NULL,          -- JSON array of {text, image_url}, in reading order
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_storybooks_created ON storybooks(created_at);
",
    ),
];
