//! 服务共享状态：存储句柄、token 签发器与密码哈希器。

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::{
    api::error::ApiError,
    auth::{
        password::{CredentialError, CredentialHasher},
        token::TokenSigner,
    },
    config::{AuthConfig, BootstrapUser, Config},
    storage::{self, Storage, UserRecord},
};

/// 服务共享状态；签名密钥与工作因子在启动后不再变化。
#[derive(Clone)]
pub(crate) struct AppState {
    /// books/users 存储后端。
    pub(crate) storage: Arc<dyn Storage>,
    /// token 签发与校验。
    pub(crate) tokens: Arc<TokenSigner>,
    pub(crate) hasher: CredentialHasher,
}

impl AppState {
    /// 按配置装配状态：连接存储，并在需要时创建初始用户。
    pub(crate) async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let storage = storage::connect(config.database.as_ref())
            .await
            .context("connect storage failed")?;
        let state = Self::new(storage, &config.auth)?;
        if let Some(user) = &config.bootstrap_user {
            state.ensure_bootstrap_user(user).await?;
        }
        Ok(state)
    }

    /// 用给定存储构建状态；签名密钥或工作因子非法时返回错误。
    pub(crate) fn new(storage: Arc<dyn Storage>, auth: &AuthConfig) -> anyhow::Result<Self> {
        let tokens = TokenSigner::new(auth.jwt_key.expose(), auth.token_ttl())
            .context("build token signer failed")?;
        let hasher =
            CredentialHasher::new(auth.bcrypt_cost).context("build credential hasher failed")?;
        Ok(Self {
            storage,
            tokens: Arc::new(tokens),
            hasher,
        })
    }

    /// 在阻塞线程池上哈希密码。
    pub(crate) async fn hash_secret(&self, plaintext: &str) -> Result<String, CredentialError> {
        let hasher = self.hasher.clone();
        let plaintext = plaintext.to_string();
        tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|err| CredentialError::Hash(err.to_string()))?
    }

    /// 在阻塞线程池上比对密码；`stored_hash` 为 `None`（用户不存在）时仍付出同等耗时。
    pub(crate) async fn verify_secret(
        &self,
        plaintext: &str,
        stored_hash: Option<String>,
    ) -> Result<bool, CredentialError> {
        let hasher = self.hasher.clone();
        let plaintext = plaintext.to_string();
        tokio::task::spawn_blocking(move || match stored_hash {
            Some(hash) => hasher.verify(&plaintext, &hash),
            None => hasher.verify_unknown(&plaintext),
        })
        .await
        .map_err(|err| CredentialError::Hash(err.to_string()))?
    }

    /// 为指定用户签发 token（以当前时间为 `iat`）。
    pub(crate) fn issue_token(&self, username: &str) -> Result<String, ApiError> {
        self.tokens
            .issue(username, bookshelf_protocol::unix_now())
            .map_err(|err| ApiError::internal("issue token failed", err))
    }

    /// 初始用户不存在时创建；已存在则保持原样。
    async fn ensure_bootstrap_user(&self, user: &BootstrapUser) -> anyhow::Result<()> {
        let username = user.username.trim();
        if self
            .storage
            .get_user(username)
            .await
            .context("lookup bootstrap user failed")?
            .is_some()
        {
            info!(username, "bootstrap user already exists");
            return Ok(());
        }
        let password_hash = self
            .hash_secret(&user.password)
            .await
            .context("hash bootstrap password failed")?;
        self.storage
            .insert_user(&UserRecord {
                username: username.to_string(),
                name: String::new(),
                lastname: String::new(),
                password_hash,
            })
            .await
            .context("create bootstrap user failed")?;
        info!(username, "bootstrap user created");
        Ok(())
    }
}
