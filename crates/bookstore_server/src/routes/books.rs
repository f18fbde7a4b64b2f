//! `/books` CRUD routes.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use bookstore_core::{BookRequest, BookResponse};

use crate::error::ApiError;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/books", get(list_books).post(create_book))
        .route(
            "/books/{id}",
            get(get_book).put(update_book).delete(delete_book),
        )
}

async fn list_books(State(state): State<AppState>) -> Result<Json<Vec<BookResponse>>, ApiError> {
    let books = state.run(|service| service.list_books()).await?;
    Ok(Json(books))
}

async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BookResponse>, ApiError> {
    let book = state.run(move |service| service.get_book(&id)).await?;
    Ok(Json(book))
}

async fn create_book(
    State(state): State<AppState>,
    payload: Result<Json<BookRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BookResponse>), ApiError> {
    let Json(request) = payload?;
    let book = state
        .run(move |service| service.create_book(&request))
        .await?;
    Ok((StatusCode::CREATED, Json(book)))
}

async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<BookRequest>, JsonRejection>,
) -> Result<Json<BookResponse>, ApiError> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            // A bad id or missing book outranks a bad body.
            state.run(move |service| service.get_book(&id)).await?;
            return Err(rejection.into());
        }
    };

    let book = state
        .run(move |service| service.update_book(&id, &request))
        .await?;
    Ok(Json(book))
}

async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.run(move |service| service.delete_book(&id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
