//! Domain model for the book catalog.
//!
//! # Invariants
//! - Every book is identified by a storage-assigned `BookId`.
//! - Deletion is represented by `BookState::Deleted`, not hard delete.

pub mod book;
