//! Book domain model.
//!
//! # Responsibility
//! - Define the persisted `Book` record and its soft-delete state.
//! - Own the field rules shared by create/update paths (`BookDraft::validate`).
//!
//! # Invariants
//! - `id` is assigned by storage and never reused.
//! - An active book has non-empty `title`/`author` and `price > 0`.
//! - `created_at <= updated_at`.
//! - `BookState` is the source of truth for tombstone state.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage-assigned surrogate identifier.
pub type BookId = i64;

/// Lifecycle state of a persisted book.
///
/// Read paths match on this explicitly; a `Deleted` book is never surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookState {
    Active,
    /// Soft-deleted at the given Unix epoch milliseconds.
    Deleted { at: i64 },
}

/// Canonical persisted book record.
#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub price: f64,
    pub category: String,
    /// Unix epoch milliseconds (UTC).
    pub created_at: i64,
    /// Unix epoch milliseconds (UTC). Never earlier than `created_at`.
    pub updated_at: i64,
    pub state: BookState,
}

impl Book {
    /// Returns whether this book should be considered visible.
    pub fn is_active(&self) -> bool {
        matches!(self.state, BookState::Active)
    }

    /// Returns the mutable fields as a draft.
    pub fn to_draft(&self) -> BookDraft {
        BookDraft {
            title: self.title.clone(),
            author: self.author.clone(),
            price: self.price,
            category: self.category.clone(),
        }
    }

    /// Replaces every mutable field with the draft values.
    ///
    /// Identity and timestamps are left to the repository.
    pub fn apply(&mut self, draft: BookDraft) {
        self.title = draft.title;
        self.author = draft.author;
        self.price = draft.price;
        self.category = draft.category;
    }

    /// Validates the active-row invariants of this record.
    pub fn validate(&self) -> Result<(), BookValidationError> {
        let mut errors = collect_field_errors(&self.title, &self.author, self.price);
        if self.created_at > self.updated_at {
            errors.push(FieldError::new(
                "updated_at",
                format!(
                    "updated_at ({}) must be >= created_at ({})",
                    self.updated_at, self.created_at
                ),
            ));
        }
        BookValidationError::from_fields(errors)
    }
}

/// The mutable fields of a book, before storage assigns identity.
#[derive(Debug, Clone, PartialEq)]
pub struct BookDraft {
    pub title: String,
    pub author: String,
    pub price: f64,
    pub category: String,
}

impl BookDraft {
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        price: f64,
        category: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            price,
            category: category.into(),
        }
    }

    /// Checks every field rule and reports all failures at once.
    pub fn validate(&self) -> Result<(), BookValidationError> {
        BookValidationError::from_fields(collect_field_errors(
            &self.title,
            &self.author,
            self.price,
        ))
    }
}

/// One failing field with a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Input or persisted state that breaks a book rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookValidationError {
    fields: Vec<FieldError>,
}

impl BookValidationError {
    /// Builds an error for a single field.
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            fields: vec![FieldError::new(field, message)],
        }
    }

    fn from_fields(fields: Vec<FieldError>) -> Result<(), Self> {
        if fields.is_empty() {
            Ok(())
        } else {
            Err(Self { fields })
        }
    }

    /// Failing fields in rule order.
    pub fn fields(&self) -> &[FieldError] {
        &self.fields
    }

    /// Returns whether the named field is among the failures.
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|item| item.field == field)
    }
}

impl Display for BookValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let messages = self
            .fields
            .iter()
            .map(|item| item.message.as_str())
            .collect::<Vec<_>>();
        write!(f, "{}", messages.join("; "))
    }
}

impl Error for BookValidationError {}

fn collect_field_errors(title: &str, author: &str, price: f64) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if title.trim().is_empty() {
        errors.push(FieldError::new("title", "title is required"));
    }
    if author.trim().is_empty() {
        errors.push(FieldError::new("author", "author is required"));
    }
    // Negated comparison also rejects NaN.
    if !(price > 0.0) || !price.is_finite() {
        errors.push(FieldError::new("price", "price must be greater than 0"));
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::{Book, BookDraft, BookState};

    fn sample_book() -> Book {
        Book {
            id: 7,
            title: "Clean Code".to_string(),
            author: "Robert C. Martin".to_string(),
            price: 39.99,
            category: "Programming".to_string(),
            created_at: 1_700_000_000_000,
            updated_at: 1_700_000_000_000,
            state: BookState::Active,
        }
    }

    #[test]
    fn draft_reports_every_failing_field() {
        let err = BookDraft::new(" ", "", 0.0, "").validate().unwrap_err();
        assert!(err.has_field("title"));
        assert!(err.has_field("author"));
        assert!(err.has_field("price"));
        assert_eq!(err.fields().len(), 3);
    }

    #[test]
    fn draft_rejects_nan_and_negative_price() {
        assert!(BookDraft::new("t", "a", f64::NAN, "").validate().is_err());
        assert!(BookDraft::new("t", "a", -1.0, "").validate().is_err());
        assert!(BookDraft::new("t", "a", 0.01, "").validate().is_ok());
    }

    #[test]
    fn apply_replaces_all_mutable_fields() {
        let mut book = sample_book();
        book.apply(BookDraft::new("Refactoring", "Martin Fowler", 30.0, ""));

        assert_eq!(book.id, 7);
        assert_eq!(book.title, "Refactoring");
        assert_eq!(book.author, "Martin Fowler");
        assert_eq!(book.price, 30.0);
        assert_eq!(book.category, "");
        assert_eq!(book.created_at, 1_700_000_000_000);
    }

    #[test]
    fn validate_rejects_reversed_timestamps() {
        let mut book = sample_book();
        book.updated_at = book.created_at - 1;
        let err = book.validate().unwrap_err();
        assert!(err.has_field("updated_at"));
    }

    #[test]
    fn deleted_state_is_not_active() {
        let mut book = sample_book();
        assert!(book.is_active());
        book.state = BookState::Deleted { at: 1_700_000_100_000 };
        assert!(!book.is_active());
    }
}
