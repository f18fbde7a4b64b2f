//! First-run catalog seeding.
//!
//! # Invariants
//! - Seeding only happens when the table holds no rows at all; soft-deleted
//!   rows count as existing.
//! - Each entry is an independent insert. A failing entry is logged and the
//!   rest still run.
//! - Never fails startup: storage errors are logged, not returned.
//! - Not safe against two processes seeding the same file concurrently.

use crate::model::book::BookDraft;
use crate::repo::book_repo::BookRepository;
use log::{error, info};

/// What a seeding attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// Rows already existed; nothing was written.
    Skipped { existing: u64 },
    /// The catalog was inserted, possibly with some failed entries.
    Seeded { inserted: usize, failed: usize },
    /// The initial row count could not be read.
    Aborted,
}

/// The fixed catalog inserted into an empty store.
pub fn initial_catalog() -> Vec<BookDraft> {
    vec![
        BookDraft::new(
            "Go Programming Language",
            "Alan Donovan",
            45.99,
            "Technology",
        ),
        BookDraft::new("Clean Code", "Robert C. Martin", 39.99, "Programming"),
        BookDraft::new(
            "Design Patterns",
            "Gang of Four",
            55.00,
            "Software Engineering",
        ),
        BookDraft::new(
            "Microservices Patterns",
            "Chris Richardson",
            49.99,
            "Architecture",
        ),
        BookDraft::new("Docker Deep Dive", "Nigel Poulton", 42.50, "DevOps"),
    ]
}

/// Inserts [`initial_catalog`] when the store is empty.
pub fn seed_initial_books<R: BookRepository>(repo: &R) -> SeedOutcome {
    let existing = match repo.count_all() {
        Ok(count) => count,
        Err(err) => {
            error!("event=seed module=seed status=error error_code=count_failed error={err}");
            return SeedOutcome::Aborted;
        }
    };

    if existing > 0 {
        info!("event=seed module=seed status=skipped existing={existing}");
        return SeedOutcome::Skipped { existing };
    }

    info!("event=seed module=seed status=start");
    let mut inserted = 0;
    let mut failed = 0;
    for draft in initial_catalog() {
        match repo.create(&draft) {
            Ok(book) => {
                inserted += 1;
                info!(
                    "event=seed module=seed status=ok book_id={} title={:?}",
                    book.id, book.title
                );
            }
            Err(err) => {
                failed += 1;
                error!(
                    "event=seed module=seed status=error title={:?} error={err}",
                    draft.title
                );
            }
        }
    }

    info!("event=seed module=seed status=done inserted={inserted} failed={failed}");
    SeedOutcome::Seeded { inserted, failed }
}
