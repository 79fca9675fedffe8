//! books 业务逻辑。

use bookshelf_protocol::{Book, BookResponse};

use crate::{api::error::ApiError, state::AppState};

const BOOK_NOT_FOUND: &str = "Book not found";

impl AppState {
    pub(crate) async fn list_books(&self) -> Result<BookResponse, ApiError> {
        let books = self.storage.list_books().await?;
        Ok(BookResponse::ok("", books))
    }

    pub(crate) async fn read_book(&self, id: i64) -> Result<BookResponse, ApiError> {
        let book = self.require_book(id).await?;
        Ok(BookResponse::ok("", vec![book]))
    }

    /// 新书入库；`id` 字段忽略，由存储层分配。
    pub(crate) async fn create_book(&self, draft: &Book) -> Result<BookResponse, ApiError> {
        let title = validate_title(&draft.title)?;
        let book = self.storage.insert_book(draft.isbn, title).await?;
        Ok(BookResponse::ok("Book inserted", vec![book]))
    }

    /// 覆盖 isbn/title；路径 id 为准，body 中的 id 忽略。
    pub(crate) async fn update_book(&self, id: i64, draft: &Book) -> Result<BookResponse, ApiError> {
        let title = validate_title(&draft.title)?;
        let book = Book {
            id,
            isbn: draft.isbn,
            title: title.to_string(),
        };
        if !self.storage.update_book(&book).await? {
            return Err(book_not_found());
        }
        Ok(BookResponse::ok("Successful update", vec![book]))
    }

    pub(crate) async fn delete_book(&self, id: i64) -> Result<BookResponse, ApiError> {
        if !self.storage.delete_book(id).await? {
            return Err(book_not_found());
        }
        Ok(BookResponse::ok("Document deleted", Vec::new()))
    }

    async fn require_book(&self, id: i64) -> Result<Book, ApiError> {
        self.storage
            .get_book(id)
            .await?
            .ok_or_else(book_not_found)
    }
}

fn book_not_found() -> ApiError {
    ApiError::not_found("BOOK_NOT_FOUND", BOOK_NOT_FOUND)
}

fn validate_title(raw: &str) -> Result<&str, ApiError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(ApiError::bad_request("title is required"));
    }
    Ok(title)
}
