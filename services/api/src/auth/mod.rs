//! 鉴权模块：密码哈希、token 签发/校验、鉴权门与登录接口。

pub(crate) mod gate;
pub(crate) mod handlers;
pub(crate) mod password;
pub(crate) mod token;
pub(crate) mod token_crypto;
