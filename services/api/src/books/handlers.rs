//! books HTTP 路由处理函数。

use axum::{Extension, Json, extract::State};
use bookshelf_protocol::{Book, BookResponse};
use tracing::info;

use crate::{
    api::{
        error::ApiError,
        extract::{ApiJson, ApiPath},
    },
    auth::gate::AuthenticatedUser,
    state::AppState,
};

pub(crate) async fn list_books_handler(
    State(state): State<AppState>,
) -> Result<Json<BookResponse>, ApiError> {
    state.list_books().await.map(Json)
}

pub(crate) async fn get_book_handler(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<BookResponse>, ApiError> {
    state.read_book(id).await.map(Json)
}

pub(crate) async fn create_book_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedUser>,
    ApiJson(draft): ApiJson<Book>,
) -> Result<Json<BookResponse>, ApiError> {
    let resp = state.create_book(&draft).await?;
    if let Some(book) = resp.data.first() {
        info!(actor = %actor.username, book_id = book.id, "book inserted");
    }
    Ok(Json(resp))
}

pub(crate) async fn update_book_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedUser>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(draft): ApiJson<Book>,
) -> Result<Json<BookResponse>, ApiError> {
    let resp = state.update_book(id, &draft).await?;
    info!(actor = %actor.username, book_id = id, "book updated");
    Ok(Json(resp))
}

pub(crate) async fn delete_book_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedUser>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<BookResponse>, ApiError> {
    let resp = state.delete_book(id).await?;
    info!(actor = %actor.username, book_id = id, "book deleted");
    Ok(Json(resp))
}
