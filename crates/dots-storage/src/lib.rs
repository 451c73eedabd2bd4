//! Dots Storage Library
//!
//! File-store abstraction for the label's shared storage: the artist roster,
//! the events list and submitted demos with their metadata sidecars.
//!
//! # Path format
//!
//! Paths are absolute within the store and shared by every backend:
//!
//! - **Demo audio**: `{DEMO_UPLOAD_DIR}/{artist} - {title}.mp3`
//! - **Demo metadata**: `{audio path}.metadata.json`
//! - **Content files**: `ARTISTS_DATA_PATH`, `EVENTS_DATA_PATH`
//!
//! Paths must not contain `..`.

#[cfg(feature = "storage-dropbox")]
pub mod dropbox;
pub mod factory;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod traits;

pub use dots_core::StorageBackend;
#[cfg(feature = "storage-dropbox")]
pub use dropbox::{DropboxCredentials, DropboxStorage};
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use traits::{DownloadResult, Storage, StorageError, StorageResult};
