//! Core domain logic for the book catalog service.
//! This crate is the single source of truth for book invariants.

pub mod db;
pub mod health;
pub mod logging;
pub mod model;
pub mod repo;
pub mod seed;
pub mod service;
pub mod view;

pub use db::{open_pool, open_pool_in_memory, DbError, DbPool, PoolOptions};
pub use health::{liveness, readiness, CheckOutcome, HealthReport, HealthStatus, StorageProbe};
pub use logging::{init_logging, logging_status, LogTarget, LoggingError};
pub use model::book::{Book, BookDraft, BookId, BookState, BookValidationError, FieldError};
pub use repo::book_repo::{BookRepository, RepoError, RepoResult, SqliteBookRepository};
pub use seed::{initial_catalog, seed_initial_books, SeedOutcome};
pub use service::book_service::{parse_book_id, BookRequest, BookService, BookServiceError};
pub use view::BookResponse;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
