//! 密码哈希与校验（bcrypt）。
//!
//! 每次 `hash` 都使用新的随机盐，同一明文两次哈希结果不同，但都能通过 `verify`。
//! bcrypt 刻意很慢，调用方应放到阻塞线程池执行（见 `AppState::hash_secret`）。
//! bcrypt 只读取前 72 字节，超长密码直接拒绝，否则共享前缀的不同密码会互相通过校验。

use std::sync::Arc;

use thiserror::Error;

/// 默认工作因子。
pub(crate) const DEFAULT_BCRYPT_COST: u32 = 10;
/// bcrypt 允许的最小工作因子。
pub(crate) const MIN_BCRYPT_COST: u32 = 4;
/// bcrypt 允许的最大工作因子。
pub(crate) const MAX_BCRYPT_COST: u32 = 31;

/// bcrypt 实际参与运算的最大密码字节数。
pub(crate) const MAX_PASSWORD_BYTES: usize = 72;

/// 未知用户登录时用于对齐耗时的占位明文。
const DUMMY_SECRET: &str = "bookshelf-timing-placeholder";

/// 凭证哈希/校验错误。
#[derive(Debug, Error)]
pub(crate) enum CredentialError {
    #[error("invalid bcrypt cost {0}, expected 4..=31")]
    InvalidCost(u32),
    #[error("stored password hash is malformed: {0}")]
    MalformedHash(String),
    #[error("hash password failed: {0}")]
    Hash(String),
    #[error("password must be at most 72 bytes, got {0}")]
    TooLong(usize),
}

/// 凭证哈希器：持有工作因子与一份同成本的占位哈希。
#[derive(Debug, Clone)]
pub(crate) struct CredentialHasher {
    cost: u32,
    dummy_hash: Arc<str>,
}

impl CredentialHasher {
    /// 校验工作因子并预计算占位哈希；工作因子非法时启动失败。
    pub(crate) fn new(cost: u32) -> Result<Self, CredentialError> {
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&cost) {
            return Err(CredentialError::InvalidCost(cost));
        }
        let dummy_hash = bcrypt::hash(DUMMY_SECRET, cost)
            .map_err(|err| CredentialError::Hash(err.to_string()))?;
        Ok(Self {
            cost,
            dummy_hash: Arc::from(dummy_hash),
        })
    }

    pub(crate) fn cost(&self) -> u32 {
        self.cost
    }

    /// 生成带随机盐的 bcrypt 哈希。
    pub(crate) fn hash(&self, plaintext: &str) -> Result<String, CredentialError> {
        check_length(plaintext)?;
        bcrypt::hash(plaintext, self.cost).map_err(|err| CredentialError::Hash(err.to_string()))
    }

    /// 比对明文与已存哈希：不匹配返回 `Ok(false)`，哈希格式损坏才返回错误。
    pub(crate) fn verify(&self, plaintext: &str, stored_hash: &str) -> Result<bool, CredentialError> {
        check_length(plaintext)?;
        bcrypt::verify(plaintext, stored_hash)
            .map_err(|err| CredentialError::MalformedHash(err.to_string()))
    }

    /// 用户不存在时执行一次等价成本的比对，结果恒为 `false`。
    pub(crate) fn verify_unknown(&self, plaintext: &str) -> Result<bool, CredentialError> {
        check_length(plaintext)?;
        let _ = bcrypt::verify(plaintext, &self.dummy_hash);
        Ok(false)
    }
}

fn check_length(plaintext: &str) -> Result<(), CredentialError> {
    if plaintext.len() > MAX_PASSWORD_BYTES {
        return Err(CredentialError::TooLong(plaintext.len()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{CredentialError, CredentialHasher, MAX_PASSWORD_BYTES, MIN_BCRYPT_COST};

    fn hasher() -> CredentialHasher {
        CredentialHasher::new(MIN_BCRYPT_COST).unwrap()
    }

    #[test]
    fn registered_password_verifies_and_wrong_one_does_not() {
        let hasher = hasher();
        let stored = hasher.hash("p@ss1").unwrap();

        assert_ne!(stored, "p@ss1");
        assert!(hasher.verify("p@ss1", &stored).unwrap());
        assert!(!hasher.verify("wrong", &stored).unwrap());
    }

    #[test]
    fn same_plaintext_gets_distinct_salts() {
        let hasher = hasher();
        let first = hasher.hash("correct horse").unwrap();
        let second = hasher.hash("correct horse").unwrap();

        assert_ne!(first, second);
        assert!(hasher.verify("correct horse", &first).unwrap());
        assert!(hasher.verify("correct horse", &second).unwrap());
    }

    #[test]
    fn distinct_plaintexts_do_not_cross_verify() {
        let hasher = hasher();
        let stored = hasher.hash("alpha").unwrap();
        for other in ["beta", "Alpha", "alpha ", ""] {
            assert!(!hasher.verify(other, &stored).unwrap(), "{other:?}");
        }
    }

    #[test]
    fn malformed_stored_hash_is_an_error() {
        let hasher = hasher();
        assert!(matches!(
            hasher.verify("p@ss1", "plaintext-in-db"),
            Err(CredentialError::MalformedHash(_))
        ));
    }

    #[test]
    fn out_of_range_cost_is_rejected() {
        assert!(matches!(
            CredentialHasher::new(3),
            Err(CredentialError::InvalidCost(3))
        ));
        assert!(matches!(
            CredentialHasher::new(32),
            Err(CredentialError::InvalidCost(32))
        ));
    }

    #[test]
    fn unknown_user_never_verifies() {
        let hasher = hasher();
        assert!(!hasher.verify_unknown("bookshelf-timing-placeholder").unwrap());
    }

    #[test]
    fn passwords_past_72_bytes_are_refused() {
        let hasher = hasher();
        let prefix = "a".repeat(MAX_PASSWORD_BYTES);
        let first = format!("{prefix}secret-one");
        let second = format!("{prefix}totally-different");

        assert!(matches!(
            hasher.hash(&first),
            Err(CredentialError::TooLong(82))
        ));

        // 72 字节整的密码仍然可用，但带同样前缀的长密码不能冒充它。
        let stored = hasher.hash(&prefix).unwrap();
        assert!(hasher.verify(&prefix, &stored).unwrap());
        assert!(matches!(
            hasher.verify(&second, &stored),
            Err(CredentialError::TooLong(_))
        ));
        assert!(matches!(
            hasher.verify_unknown(&second),
            Err(CredentialError::TooLong(_))
        ));
    }
}
