// 文件职责：
// 1) 定义 bookshelf API 与客户端共用的请求/响应数据结构。
// 2) 提供鉴权请求头名称、时间戳等跨端一致的基础常量与函数。
// 3) 作为 Rust 侧协议唯一代码源，供服务端与测试复用。

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// 受保护接口携带 token 的请求头。
pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Book {
    #[serde(default)]
    // 自增主键，创建时由存储层分配。
    pub id: i64,
    #[serde(default)]
    // ISBN 编号。
    pub isbn: i64,
    #[serde(default)]
    // 书名。
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct User {
    #[serde(default)]
    // 登录名（唯一）。
    pub username: String,
    #[serde(default)]
    // 名。
    pub name: String,
    #[serde(default)]
    // 姓。
    pub lastname: String,
    #[serde(default, skip_serializing)]
    // 明文密码：只在请求中出现，任何响应都不会回写。
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BookResponse {
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub data: Vec<Book>,
}

impl BookResponse {
    /// 构造成功响应。
    pub fn ok(message: impl Into<String>, data: Vec<Book>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserResponse {
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub data: Vec<User>,
    // 仅创建用户时非空。
    #[serde(default)]
    pub token: String,
}

impl UserResponse {
    /// 构造成功响应（不带 token）。
    pub fn ok(message: impl Into<String>, data: Vec<User>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
            token: String::new(),
        }
    }
}

/// 登录请求体。
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub token: String,
}

/// 失败响应体：`code` 为稳定的机器可读错误码。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub code: String,
    pub message: String,
}

/// 当前 unix 秒。
pub fn unix_now() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::{Book, User};

    #[test]
    fn user_password_is_write_only() {
        let user: User = serde_json::from_str(
            r#"{"username":"bob","name":"Bob","lastname":"Stone","password":"p@ss1"}"#,
        )
        .unwrap();
        assert_eq!(user.password, "p@ss1");

        let encoded = serde_json::to_value(&user).unwrap();
        assert_eq!(encoded["username"], "bob");
        assert!(encoded.get("password").is_none());
    }

    #[test]
    fn book_without_id_defaults_to_zero() {
        let book: Book = serde_json::from_str(r#"{"isbn":9780,"title":"Dune"}"#).unwrap();
        assert_eq!(book.id, 0);
        assert_eq!(book.isbn, 9780);
        assert_eq!(book.title, "Dune");
    }
}
