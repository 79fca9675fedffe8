//! 受保护路由的鉴权门：校验 `x-auth-token`，失败直接 403 且不进入业务处理。

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use bookshelf_protocol::{AUTH_TOKEN_HEADER, unix_now};
use tracing::debug;

use crate::{
    auth::token::{AuthStage, TokenClaims, TokenRejection},
    state::AppState,
};

/// 已通过鉴权的调用方身份，挂在请求扩展上供业务处理读取。
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AuthenticatedUser {
    pub(crate) username: String,
}

/// 鉴权中间件：通过则转发，任何拒绝都返回空 body 的 403。
pub(crate) async fn require_token(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    match admit(&state, req.headers(), unix_now()) {
        Ok(claims) => {
            debug!(
                stage = ?AuthStage::Admitted,
                username = %claims.username,
                "request admitted"
            );
            req.extensions_mut().insert(AuthenticatedUser {
                username: claims.username,
            });
            next.run(req).await
        }
        Err(rejection) => {
            debug!(
                stage = ?rejection.stage(),
                reason = %rejection,
                path = %req.uri().path(),
                "request rejected"
            );
            StatusCode::FORBIDDEN.into_response()
        }
    }
}

/// 从请求头取出 token 并校验。
fn admit(state: &AppState, headers: &HeaderMap, now: u64) -> Result<TokenClaims, TokenRejection> {
    let token = headers
        .get(AUTH_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(TokenRejection::Missing)?;
    state.tokens.validate(token, now)
}
