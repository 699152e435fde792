#![forbid(unsafe_code)]

pub mod record;
pub mod repository;
pub mod sqlite;

pub use record::{DecodeQuality, PROGRESS_KEY, ProgressRecord, decode_lenient};
pub use repository::{InMemoryRepository, KeyValueStore, Storage, StorageError};
