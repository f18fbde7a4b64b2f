//! Book use-case service.
//!
//! # Responsibility
//! - Validate request DTOs and raw identifiers before touching storage.
//! - Orchestrate repository calls and map results through the view layer.
//! - Translate repository outcomes into found/not-found/validation/storage.
//!
//! # Invariants
//! - No repository call happens for an input that fails validation.
//! - `update_book` is a full replace: omitted request fields become empty/zero.
//! - Every mutation commits immediately and is never retried.

use crate::model::book::{BookDraft, BookId, BookValidationError};
use crate::repo::book_repo::{BookRepository, RepoError};
use crate::view::{to_responses, BookResponse};
use log::{error, info};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Inbound book payload for create and update.
///
/// Missing fields deserialize to empty/zero so validation reports them.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BookRequest {
    pub title: String,
    pub author: String,
    pub price: f64,
    pub category: Option<String>,
}

impl BookRequest {
    fn to_draft(&self) -> BookDraft {
        BookDraft::new(
            self.title.as_str(),
            self.author.as_str(),
            self.price,
            self.category.clone().unwrap_or_default(),
        )
    }
}

/// Service error for book use-cases.
#[derive(Debug)]
pub enum BookServiceError {
    /// Malformed identifier or rule-breaking request.
    Validation(BookValidationError),
    /// No active book with this id.
    NotFound(BookId),
    /// Persistence-layer failure.
    Storage(RepoError),
}

impl Display for BookServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "book not found: {id}"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BookServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::NotFound(_) => None,
        }
    }
}

impl From<BookValidationError> for BookServiceError {
    fn from(value: BookValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for BookServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Storage(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, BookServiceError>;

/// Book service facade over repository implementations.
#[derive(Clone)]
pub struct BookService<R: BookRepository> {
    repo: R,
}

impl<R: BookRepository> BookService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Lists every active book.
    pub fn list_books(&self) -> ServiceResult<Vec<BookResponse>> {
        let books = self.repo.find_all().inspect_err(log_storage_error("book_list"))?;
        Ok(to_responses(&books))
    }

    /// Gets one active book by raw path identifier.
    pub fn get_book(&self, raw_id: &str) -> ServiceResult<BookResponse> {
        let id = parse_book_id(raw_id)?;
        let book = self
            .repo
            .find_by_id(id)
            .inspect_err(log_storage_error("book_get"))?
            .ok_or(BookServiceError::NotFound(id))?;
        Ok(BookResponse::from(&book))
    }

    /// Validates and persists a new book.
    pub fn create_book(&self, request: &BookRequest) -> ServiceResult<BookResponse> {
        let draft = request.to_draft();
        draft.validate()?;

        let book = self
            .repo
            .create(&draft)
            .inspect_err(log_storage_error("book_create"))?;
        info!(
            "event=book_create module=service status=ok book_id={}",
            book.id
        );
        Ok(BookResponse::from(&book))
    }

    /// Replaces all mutable fields of an existing book.
    ///
    /// Checks run in order: id format, existence, request rules.
    pub fn update_book(&self, raw_id: &str, request: &BookRequest) -> ServiceResult<BookResponse> {
        let id = parse_book_id(raw_id)?;
        let mut book = self
            .repo
            .find_by_id(id)
            .inspect_err(log_storage_error("book_update"))?
            .ok_or(BookServiceError::NotFound(id))?;

        let draft = request.to_draft();
        draft.validate()?;
        book.apply(draft);

        let stored = self
            .repo
            .update(&book)
            .inspect_err(log_storage_error("book_update"))?;
        info!(
            "event=book_update module=service status=ok book_id={}",
            stored.id
        );
        Ok(BookResponse::from(&stored))
    }

    /// Soft-deletes an existing book.
    pub fn delete_book(&self, raw_id: &str) -> ServiceResult<()> {
        let id = parse_book_id(raw_id)?;
        let book = self
            .repo
            .find_by_id(id)
            .inspect_err(log_storage_error("book_delete"))?
            .ok_or(BookServiceError::NotFound(id))?;

        self.repo
            .soft_delete(&book)
            .inspect_err(log_storage_error("book_delete"))?;
        info!("event=book_delete module=service status=ok book_id={id}");
        Ok(())
    }
}

/// Parses a raw identifier into a positive `BookId`.
pub fn parse_book_id(raw: &str) -> Result<BookId, BookValidationError> {
    match raw.parse::<u32>() {
        Ok(id) if id > 0 => Ok(BookId::from(id)),
        _ => Err(BookValidationError::single(
            "id",
            format!("invalid book id `{raw}`; expected a positive integer"),
        )),
    }
}

fn log_storage_error(event: &'static str) -> impl Fn(&RepoError) {
    move |err| {
        if !matches!(err, RepoError::NotFound(_) | RepoError::Validation(_)) {
            error!("event={event} module=service status=error error={err}");
        }
    }
}
