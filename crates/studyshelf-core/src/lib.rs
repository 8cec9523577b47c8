//! Core types and trait definitions for StudyShelf.
//!
//! This crate is deliberately free of HTTP and database dependencies. It holds
//! the bundled curriculum catalog, the note model and its review state machine,
//! the note-to-curriculum resolver, and the storage traits that backends
//! implement.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod catalog;
pub mod course;
pub mod error;
pub mod identity;
pub mod note;
pub mod object;
pub mod resolver;
pub mod review;
pub mod store;

pub use error::{Error, Result};
