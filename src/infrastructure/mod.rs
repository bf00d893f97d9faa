// Infrastructure - storage, caching, media, security and request plumbing
pub mod cache;       // LRU with TTL
pub mod database;    // SQLite pool and schema
pub mod media;       // Uploaded images
pub mod middleware;  // Viewer context and page cache layers
pub mod security;    // Password hashing, session tokens
pub mod viewer;      // Viewer context

pub use cache::Cache;
pub use database::BlogDatabase;
pub use media::{ImageKind, ImageUpload, MediaStore};
pub use viewer::ViewerContext;
