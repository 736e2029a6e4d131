pub mod db;
pub mod disabled;
pub mod image_llm;
pub mod kv;
pub mod story_llm;

pub use db::{DbAdapter, DbGateway};
pub use disabled::GenerationDisabled;
pub use image_llm::OpenAiImageAdapter;
pub use kv::JsonFileStore;
pub use story_llm::OpenAiStoryAdapter;
