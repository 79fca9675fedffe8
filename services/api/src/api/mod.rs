//! HTTP 接口公共部分。

pub(crate) mod error;
pub(crate) mod extract;
