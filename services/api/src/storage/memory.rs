//! 内存存储：开发与测试使用，进程退出即丢失。

use std::collections::BTreeMap;

use async_trait::async_trait;
use bookshelf_protocol::{Book, User};
use tokio::sync::RwLock;

use super::{Storage, StorageError, UserRecord};

#[derive(Debug, Default)]
struct Tables {
    books: BTreeMap<i64, Book>,
    last_book_id: i64,
    users: BTreeMap<String, UserRecord>,
}

/// 基于 `RwLock` 的内存表。
#[derive(Debug, Default)]
pub(crate) struct MemoryStorage {
    tables: RwLock<Tables>,
}

#[async_trait]
impl Storage for MemoryStorage {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn list_books(&self) -> Result<Vec<Book>, StorageError> {
        let guard = self.tables.read().await;
        Ok(guard.books.values().cloned().collect())
    }

    async fn get_book(&self, id: i64) -> Result<Option<Book>, StorageError> {
        let guard = self.tables.read().await;
        Ok(guard.books.get(&id).cloned())
    }

    async fn insert_book(&self, isbn: i64, title: &str) -> Result<Book, StorageError> {
        let mut guard = self.tables.write().await;
        guard.last_book_id += 1;
        let book = Book {
            id: guard.last_book_id,
            isbn,
            title: title.to_string(),
        };
        guard.books.insert(book.id, book.clone());
        Ok(book)
    }

    async fn update_book(&self, book: &Book) -> Result<bool, StorageError> {
        let mut guard = self.tables.write().await;
        let Some(existing) = guard.books.get_mut(&book.id) else {
            return Ok(false);
        };
        existing.isbn = book.isbn;
        existing.title = book.title.clone();
        Ok(true)
    }

    async fn delete_book(&self, id: i64) -> Result<bool, StorageError> {
        Ok(self.tables.write().await.books.remove(&id).is_some())
    }

    async fn list_users(&self) -> Result<Vec<User>, StorageError> {
        let guard = self.tables.read().await;
        Ok(guard.users.values().map(UserRecord::to_user).collect())
    }

    async fn get_user(&self, username: &str) -> Result<Option<UserRecord>, StorageError> {
        let guard = self.tables.read().await;
        Ok(guard.users.get(username).cloned())
    }

    async fn insert_user(&self, record: &UserRecord) -> Result<(), StorageError> {
        let mut guard = self.tables.write().await;
        if guard.users.contains_key(&record.username) {
            return Err(StorageError::Conflict(format!(
                "user {} already exists",
                record.username
            )));
        }
        guard.users.insert(record.username.clone(), record.clone());
        Ok(())
    }

    async fn update_user(
        &self,
        username: &str,
        name: &str,
        lastname: &str,
        password_hash: Option<&str>,
    ) -> Result<bool, StorageError> {
        let mut guard = self.tables.write().await;
        let Some(existing) = guard.users.get_mut(username) else {
            return Ok(false);
        };
        existing.name = name.to_string();
        existing.lastname = lastname.to_string();
        if let Some(hash) = password_hash {
            existing.password_hash = hash.to_string();
        }
        Ok(true)
    }

    async fn delete_user(&self, username: &str) -> Result<bool, StorageError> {
        Ok(self.tables.write().await.users.remove(username).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryStorage;
    use crate::storage::{Storage, StorageError, UserRecord};

    fn record(username: &str, hash: &str) -> UserRecord {
        UserRecord {
            username: username.to_string(),
            name: "Bob".to_string(),
            lastname: "Stone".to_string(),
            password_hash: hash.to_string(),
        }
    }

    #[tokio::test]
    async fn book_ids_are_assigned_sequentially_and_not_reused() {
        let storage = MemoryStorage::default();
        let first = storage.insert_book(111, "Dune").await.unwrap();
        let second = storage.insert_book(222, "Emma").await.unwrap();
        assert_eq!((first.id, second.id), (1, 2));

        storage.delete_book(second.id).await.unwrap();
        let third = storage.insert_book(333, "Ulysses").await.unwrap();
        assert_eq!(third.id, 3);

        let titles: Vec<String> = storage
            .list_books()
            .await
            .unwrap()
            .into_iter()
            .map(|book| book.title)
            .collect();
        assert_eq!(titles, vec!["Dune", "Ulysses"]);
    }

    #[tokio::test]
    async fn update_book_overwrites_fields() {
        let storage = MemoryStorage::default();
        let mut book = storage.insert_book(111, "Dune").await.unwrap();
        book.isbn = 999;
        book.title = "Dune Messiah".to_string();
        storage.update_book(&book).await.unwrap();

        assert_eq!(storage.get_book(book.id).await.unwrap(), Some(book));
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let storage = MemoryStorage::default();
        storage.insert_user(&record("bob", "h1")).await.unwrap();
        let err = storage.insert_user(&record("bob", "h2")).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict(_)));
        assert_eq!(
            storage.get_user("bob").await.unwrap().unwrap().password_hash,
            "h1"
        );
    }

    #[tokio::test]
    async fn update_user_keeps_hash_unless_given() {
        let storage = MemoryStorage::default();
        storage.insert_user(&record("bob", "h1")).await.unwrap();

        storage
            .update_user("bob", "Robert", "Stone", None)
            .await
            .unwrap();
        let row = storage.get_user("bob").await.unwrap().unwrap();
        assert_eq!(row.name, "Robert");
        assert_eq!(row.password_hash, "h1");

        storage
            .update_user("bob", "Robert", "Stone", Some("h2"))
            .await
            .unwrap();
        let row = storage.get_user("bob").await.unwrap().unwrap();
        assert_eq!(row.password_hash, "h2");
    }

    #[tokio::test]
    async fn writes_to_missing_rows_report_no_hit() {
        let storage = MemoryStorage::default();
        let book = storage.insert_book(111, "Dune").await.unwrap();
        assert!(storage.delete_book(book.id).await.unwrap());
        assert!(!storage.update_book(&book).await.unwrap());
        assert!(!storage.delete_book(book.id).await.unwrap());
        assert!(storage.list_books().await.unwrap().is_empty());

        assert!(
            !storage
                .update_user("ghost", "G", "Host", Some("h"))
                .await
                .unwrap()
        );
        assert!(!storage.delete_user("ghost").await.unwrap());
        assert!(storage.get_user("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn listed_users_carry_no_password() {
        let storage = MemoryStorage::default();
        storage.insert_user(&record("bob", "h1")).await.unwrap();
        let users = storage.list_users().await.unwrap();
        assert_eq!(users.len(), 1);
        assert!(users[0].password.is_empty());
    }
}
