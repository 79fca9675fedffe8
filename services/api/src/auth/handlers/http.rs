//! 鉴权 HTTP 路由处理函数。

use axum::{Json, extract::State};
use bookshelf_protocol::{AuthRequest, AuthResponse};

use crate::{
    api::{error::ApiError, extract::ApiJson},
    state::AppState,
};

/// 登录接口：校验用户名密码并签发 token。
pub(crate) async fn login_handler(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<AuthRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    state.authenticate(&req).await.map(Json)
}
