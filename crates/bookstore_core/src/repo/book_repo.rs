//! Book repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD APIs over the `books` table.
//! - Keep SQL details inside the core persistence boundary.
//! - Own `created_at`/`updated_at`/`deleted_at` bookkeeping.
//!
//! # Invariants
//! - Write paths validate drafts before SQL mutations.
//! - Read paths return active books only, and reject invalid persisted state
//!   instead of masking it.
//! - Soft delete never removes a row.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::{DbError, DbPool, PooledConnection};
use crate::model::book::{Book, BookDraft, BookId, BookState, BookValidationError};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use time::OffsetDateTime;

const BOOK_SELECT_SQL: &str = "SELECT
    id,
    title,
    author,
    price,
    category,
    created_at,
    updated_at,
    deleted_at
FROM books";

const REQUIRED_BOOK_COLUMNS: &[&str] = &[
    "id",
    "title",
    "author",
    "price",
    "category",
    "created_at",
    "updated_at",
    "deleted_at",
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for book persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(BookValidationError),
    Db(DbError),
    NotFound(BookId),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "book not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted book data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; open the pool through db::open_pool"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<BookValidationError> for RepoError {
    fn from(value: BookValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<r2d2::Error> for RepoError {
    fn from(value: r2d2::Error) -> Self {
        Self::Db(DbError::Pool(value))
    }
}

/// Repository interface for book CRUD operations.
///
/// Every method is one atomic storage round-trip; nothing is retried.
pub trait BookRepository {
    /// Inserts a new row and returns it with storage-assigned id and timestamps.
    fn create(&self, draft: &BookDraft) -> RepoResult<Book>;
    /// Returns the active book with `id`, or `None` when absent or deleted.
    fn find_by_id(&self, id: BookId) -> RepoResult<Option<Book>>;
    /// Returns all active books ordered by id.
    fn find_all(&self) -> RepoResult<Vec<Book>>;
    /// Persists the mutable fields of a previously fetched active book.
    fn update(&self, book: &Book) -> RepoResult<Book>;
    /// Marks a previously fetched active book as deleted.
    fn soft_delete(&self, book: &Book) -> RepoResult<Book>;
    /// Counts rows in any state, deleted included.
    fn count_all(&self) -> RepoResult<u64>;
}

/// SQLite-backed book repository over a shared connection pool.
#[derive(Clone)]
pub struct SqliteBookRepository {
    pool: DbPool,
}

impl SqliteBookRepository {
    /// Constructs a repository from a migrated pool.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations were not applied.
    /// - `MissingRequiredTable`/`MissingRequiredColumn` when the schema drifted.
    pub fn try_new(pool: DbPool) -> RepoResult<Self> {
        let conn = pool.get()?;
        ensure_connection_ready(&conn)?;
        drop(conn);
        Ok(Self { pool })
    }

    /// Returns the pool backing this repository.
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    fn conn(&self) -> RepoResult<PooledConnection> {
        Ok(self.pool.get()?)
    }
}

impl BookRepository for SqliteBookRepository {
    fn create(&self, draft: &BookDraft) -> RepoResult<Book> {
        draft.validate()?;

        let conn = self.conn()?;
        let now = now_epoch_ms();
        conn.execute(
            "INSERT INTO books (
                title,
                author,
                price,
                category,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?5);",
            params![
                draft.title.as_str(),
                draft.author.as_str(),
                draft.price,
                draft.category.as_str(),
                now,
            ],
        )?;

        Ok(Book {
            id: conn.last_insert_rowid(),
            title: draft.title.clone(),
            author: draft.author.clone(),
            price: draft.price,
            category: draft.category.clone(),
            created_at: now,
            updated_at: now,
            state: BookState::Active,
        })
    }

    fn find_by_id(&self, id: BookId) -> RepoResult<Option<Book>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "{BOOK_SELECT_SQL}
             WHERE id = ?1
               AND deleted_at IS NULL;"
        ))?;

        let row = stmt
            .query_row([id], |row| Ok(parse_book_row(row)))
            .optional()?;
        match row {
            Some(parsed) => Ok(active_only(parsed?)),
            None => Ok(None),
        }
    }

    fn find_all(&self) -> RepoResult<Vec<Book>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "{BOOK_SELECT_SQL}
             WHERE deleted_at IS NULL
             ORDER BY id ASC;"
        ))?;

        let mut rows = stmt.query([])?;
        let mut books = Vec::new();
        while let Some(row) = rows.next()? {
            if let Some(book) = active_only(parse_book_row(row)?) {
                books.push(book);
            }
        }

        Ok(books)
    }

    fn update(&self, book: &Book) -> RepoResult<Book> {
        if let BookState::Deleted { .. } = book.state {
            return Err(RepoError::NotFound(book.id));
        }
        book.to_draft().validate()?;

        let updated_at = now_epoch_ms().max(book.created_at);
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE books
             SET
                title = ?1,
                author = ?2,
                price = ?3,
                category = ?4,
                updated_at = ?5
             WHERE id = ?6
               AND deleted_at IS NULL;",
            params![
                book.title.as_str(),
                book.author.as_str(),
                book.price,
                book.category.as_str(),
                updated_at,
                book.id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(book.id));
        }

        let mut stored = book.clone();
        stored.updated_at = updated_at;
        Ok(stored)
    }

    fn soft_delete(&self, book: &Book) -> RepoResult<Book> {
        if let BookState::Deleted { .. } = book.state {
            return Err(RepoError::NotFound(book.id));
        }

        let deleted_at = now_epoch_ms();
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE books
             SET deleted_at = ?1
             WHERE id = ?2
               AND deleted_at IS NULL;",
            params![deleted_at, book.id],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(book.id));
        }

        let mut stored = book.clone();
        stored.state = BookState::Deleted { at: deleted_at };
        Ok(stored)
    }

    fn count_all(&self) -> RepoResult<u64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM books;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative row count `{count}`")))
    }
}

/// Current wall-clock time as Unix epoch milliseconds (UTC).
pub fn now_epoch_ms() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

fn active_only(book: Book) -> Option<Book> {
    match book.state {
        BookState::Active => Some(book),
        BookState::Deleted { .. } => None,
    }
}

fn parse_book_row(row: &Row<'_>) -> RepoResult<Book> {
    let state = match row.get::<_, Option<i64>>("deleted_at")? {
        Some(at) => BookState::Deleted { at },
        None => BookState::Active,
    };

    let book = Book {
        id: row.get("id")?,
        title: row.get("title")?,
        author: row.get("author")?,
        price: row.get("price")?,
        category: row.get("category")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        state,
    };

    if book.is_active() {
        book.validate().map_err(|err| {
            RepoError::InvalidData(format!("book {} violates invariants: {err}", book.id))
        })?;
    }
    Ok(book)
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let table_exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = 'books'
        );",
        [],
        |row| row.get(0),
    )?;
    if table_exists == 0 {
        return Err(RepoError::MissingRequiredTable("books"));
    }

    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info('books');")?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    for column in REQUIRED_BOOK_COLUMNS {
        if !columns.iter().any(|name| name == column) {
            return Err(RepoError::MissingRequiredColumn {
                table: "books",
                column: *column,
            });
        }
    }

    Ok(())
}
