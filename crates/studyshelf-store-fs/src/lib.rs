//! Filesystem backend for StudyShelf note files.
//!
//! Objects live under a single root directory at their key's relative path.
//! No binary data lives in the database; notes only carry the key and the
//! public URL derived from it.

mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::FsObjectStore;
