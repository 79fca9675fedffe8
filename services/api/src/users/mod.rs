//! users 资源：增删改查接口，密码只写不读。

mod handlers;
mod ops;

pub(crate) use handlers::{
    create_user_handler, delete_user_handler, get_user_handler, list_users_handler,
    update_user_handler,
};
