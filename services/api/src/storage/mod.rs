//! 存储抽象：books/users 两张表的读写接口，以及 MySQL / 内存两种实现。

mod memory;
mod mysql;

use std::sync::Arc;

use async_trait::async_trait;
use bookshelf_protocol::{Book, User};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::DatabaseConfig;

pub(crate) use memory::MemoryStorage;
pub(crate) use mysql::MySqlStorage;

/// 存储错误。
#[derive(Debug, Error)]
pub(crate) enum StorageError {
    /// 唯一键冲突（如重复用户名）。
    #[error("{0}")]
    Conflict(String),
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// users 表的一行：`password_hash` 只在服务端流转，绝不序列化给客户端。
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UserRecord {
    pub(crate) username: String,
    pub(crate) name: String,
    pub(crate) lastname: String,
    pub(crate) password_hash: String,
}

impl UserRecord {
    /// 转为对外用户视图（不含密码）。
    pub(crate) fn to_user(&self) -> User {
        User {
            username: self.username.clone(),
            name: self.name.clone(),
            lastname: self.lastname.clone(),
            password: String::new(),
        }
    }
}

/// books/users 存储接口。更新/删除返回是否命中目标行，未命中由调用方映射为 404。
#[async_trait]
pub(crate) trait Storage: Send + Sync {
    /// 后端名称，用于日志。
    fn backend_name(&self) -> &'static str;

    async fn list_books(&self) -> Result<Vec<Book>, StorageError>;
    async fn get_book(&self, id: i64) -> Result<Option<Book>, StorageError>;
    /// 插入新书，返回带自增 id 的完整记录。
    async fn insert_book(&self, isbn: i64, title: &str) -> Result<Book, StorageError>;
    async fn update_book(&self, book: &Book) -> Result<bool, StorageError>;
    async fn delete_book(&self, id: i64) -> Result<bool, StorageError>;

    async fn list_users(&self) -> Result<Vec<User>, StorageError>;
    /// 凭证查找：按用户名读取含哈希的整行。
    async fn get_user(&self, username: &str) -> Result<Option<UserRecord>, StorageError>;
    /// 凭证写入：用户名重复返回 `Conflict`。
    async fn insert_user(&self, record: &UserRecord) -> Result<(), StorageError>;
    /// 更新资料；`password_hash` 为 `None` 时保留原哈希。
    async fn update_user(
        &self,
        username: &str,
        name: &str,
        lastname: &str,
        password_hash: Option<&str>,
    ) -> Result<bool, StorageError>;
    async fn delete_user(&self, username: &str) -> Result<bool, StorageError>;
}

/// 按配置选择存储后端：配置了数据库走 MySQL，否则退回内存存储。
pub(crate) async fn connect(
    database: Option<&DatabaseConfig>,
) -> Result<Arc<dyn Storage>, StorageError> {
    match database {
        Some(db) => {
            let storage = MySqlStorage::connect(db).await?;
            info!("storage backend: mysql ({})", db.display_target());
            Ok(Arc::new(storage))
        }
        None => {
            warn!("no database configured; using in-memory storage, data is lost on exit");
            Ok(Arc::new(MemoryStorage::default()))
        }
    }
}
