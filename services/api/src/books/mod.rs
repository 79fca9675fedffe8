//! books 资源：增删改查接口。

mod handlers;
mod ops;

pub(crate) use handlers::{
    create_book_handler, delete_book_handler, get_book_handler, list_books_handler,
    update_book_handler,
};
