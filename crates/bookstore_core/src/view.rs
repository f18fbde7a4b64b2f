//! Response projection for books.
//!
//! Hides storage bookkeeping (`updated_at`, soft-delete state) and renders
//! `created_at` as `YYYY-MM-DD HH:MM:SS` in UTC.

use crate::model::book::{Book, BookId};
use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::OffsetDateTime;

/// External shape of a book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookResponse {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub price: f64,
    pub category: String,
    pub created_at: String,
}

impl From<&Book> for BookResponse {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id,
            title: book.title.clone(),
            author: book.author.clone(),
            price: book.price,
            category: book.category.clone(),
            created_at: format_timestamp(book.created_at),
        }
    }
}

/// Maps a list of books, preserving order.
pub fn to_responses(books: &[Book]) -> Vec<BookResponse> {
    books.iter().map(BookResponse::from).collect()
}

/// Formats Unix epoch milliseconds as `YYYY-MM-DD HH:MM:SS` (UTC).
///
/// Out-of-range values render as the Unix epoch.
pub fn format_timestamp(epoch_ms: i64) -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    let instant = OffsetDateTime::from_unix_timestamp_nanos(i128::from(epoch_ms) * 1_000_000)
        .unwrap_or(OffsetDateTime::UNIX_EPOCH);
    instant.format(&format).unwrap_or_default()
}
