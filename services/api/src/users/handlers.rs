//! users HTTP 路由处理函数。

use axum::{Extension, Json, extract::State};
use bookshelf_protocol::{User, UserResponse};
use tracing::info;

use crate::{
    api::{
        error::ApiError,
        extract::{ApiJson, ApiPath},
    },
    auth::gate::AuthenticatedUser,
    state::AppState,
};

pub(crate) async fn list_users_handler(
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, ApiError> {
    state.list_users().await.map(Json)
}

pub(crate) async fn get_user_handler(
    State(state): State<AppState>,
    ApiPath(username): ApiPath<String>,
) -> Result<Json<UserResponse>, ApiError> {
    state.read_user(&username).await.map(Json)
}

/// 创建用户；响应里带上新用户的 token。
pub(crate) async fn create_user_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedUser>,
    ApiJson(draft): ApiJson<User>,
) -> Result<Json<UserResponse>, ApiError> {
    let resp = state.create_user(&draft).await?;
    info!(actor = %actor.username, username = %draft.username.trim(), "user created");
    Ok(Json(resp))
}

pub(crate) async fn update_user_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedUser>,
    ApiPath(username): ApiPath<String>,
    ApiJson(draft): ApiJson<User>,
) -> Result<Json<UserResponse>, ApiError> {
    let resp = state.update_user(&username, &draft).await?;
    info!(
        actor = %actor.username,
        username = %username,
        password_changed = !draft.password.is_empty(),
        "user updated"
    );
    Ok(Json(resp))
}

pub(crate) async fn delete_user_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedUser>,
    ApiPath(username): ApiPath<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let resp = state.delete_user(&username).await?;
    info!(actor = %actor.username, username = %username, "user deleted");
    Ok(Json(resp))
}
