//! HTTP surface for the book catalog.
//!
//! Routes translate between JSON and [`bookstore_core`]; blocking storage
//! work runs on tokio's blocking pool.

use std::sync::Arc;

use axum::Router;
use bookstore_core::{BookService, BookServiceError, DbPool, SqliteBookRepository};

pub mod error;
pub mod routes;
pub mod settings;

use error::ApiError;

pub type CatalogService = BookService<SqliteBookRepository>;

/// Shared handler state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    books: Arc<CatalogService>,
    pool: DbPool,
}

impl AppState {
    pub fn new(books: CatalogService) -> Self {
        let pool = books.repository().pool().clone();
        Self {
            books: Arc::new(books),
            pool,
        }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Runs one service call on the blocking pool.
    pub(crate) async fn run<T, F>(&self, task: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&CatalogService) -> Result<T, BookServiceError> + Send + 'static,
    {
        let books = Arc::clone(&self.books);
        let outcome = tokio::task::spawn_blocking(move || task(&books)).await?;
        Ok(outcome?)
    }
}

/// Builds the full router: health probes plus book routes under both
/// `/api/v1` and the root.
pub fn build_router(state: AppState) -> Router {
    let books = routes::books::router();
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", books.clone())
        .merge(books)
        .with_state(state)
}

/// Binds and serves until the listener fails.
pub async fn serve(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    use anyhow::Context;

    let listener = tokio::net::TcpListener::bind((host, port))
        .await
        .with_context(|| format!("failed to bind {host}:{port}"))?;
    log::info!("event=http_listen module=http status=ok addr={host}:{port}");

    axum::serve(listener, build_router(state))
        .await
        .context("HTTP server failed")
}
