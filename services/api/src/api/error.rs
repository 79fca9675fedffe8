//! API 错误定义与响应转换。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bookshelf_protocol::ErrorResponse;
use tracing::error;

use crate::{auth::password::CredentialError, storage::StorageError};

/// 接口错误：HTTP 状态 + 稳定错误码 + 面向调用方的说明。
#[derive(Debug)]
pub(crate) struct ApiError {
    pub(crate) status: StatusCode,
    pub(crate) code: &'static str,
    pub(crate) message: String,
}

impl ApiError {
    /// 构造统一 API 错误。
    pub(crate) fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message)
    }

    /// 用户不存在与密码错误对外不区分。
    pub(crate) fn credentials_invalid() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            "CREDENTIALS_INVALID",
            "Credentials invalid",
        )
    }

    pub(crate) fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, code, message)
    }

    /// 内部错误：细节只写日志，不回给客户端。
    pub(crate) fn internal(context: &str, detail: impl std::fmt::Display) -> Self {
        error!("{context}: {detail}");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "Internal server error",
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                success: false,
                code: self.code.to_string(),
                message: self.message,
            }),
        )
            .into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Conflict(message) => {
                Self::new(StatusCode::CONFLICT, "ALREADY_EXISTS", message)
            }
            StorageError::Backend(detail) => Self::internal("storage operation failed", detail),
        }
    }
}

impl From<CredentialError> for ApiError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::TooLong(_) => Self::bad_request(err.to_string()),
            other => Self::internal("credential operation failed", other),
        }
    }
}
