//! Token 签发与校验。
//!
//! 格式：`base64url(header).base64url(payload).base64url(signature)`，签名为
//! HMAC-SHA256(signing_key, "<header>.<payload>")。服务端不保存 token，有效性只取决于
//! 签名与过期时间。

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::token_crypto::{
    HmacSha256, b64url_decode, b64url_encode, hmac_b64url, hmac_verify, keyed_mac,
};

/// 唯一支持的签名算法。
pub(crate) const TOKEN_ALG: &str = "HS256";
/// 固定 header。
const TOKEN_HEADER_JSON: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

/// token payload：扁平记录，不含 nonce/jti。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct TokenClaims {
    pub(crate) username: String,
    /// 签发时间（unix 秒）。
    pub(crate) iat: u64,
    /// 过期时间（unix 秒），`exp > now` 才有效。
    pub(crate) exp: u64,
}

#[derive(Debug, Deserialize)]
struct TokenHeader {
    alg: String,
}

/// 单次请求的鉴权阶段：Received -> Parsed -> SignatureChecked -> ExpiryChecked -> Admitted。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AuthStage {
    Received,
    Parsed,
    SignatureChecked,
    ExpiryChecked,
    Admitted,
}

/// token 拒绝原因；对客户端统一表现为 403，原因只写日志。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub(crate) enum TokenRejection {
    #[error("token missing")]
    Missing,
    #[error("token malformed")]
    Malformed,
    #[error("token signature invalid")]
    BadSignature,
    /// 签名正确但 payload 不是合法 claims。
    #[error("token claims undecodable")]
    InvalidClaims,
    #[error("token expired")]
    Expired,
}

impl TokenRejection {
    /// 未通过的那一步。
    pub(crate) fn stage(self) -> AuthStage {
        match self {
            Self::Missing => AuthStage::Received,
            Self::Malformed => AuthStage::Parsed,
            Self::BadSignature => AuthStage::SignatureChecked,
            Self::InvalidClaims | Self::Expired => AuthStage::ExpiryChecked,
        }
    }
}

/// 签名器构造错误（启动期致命）。
#[derive(Debug, Error)]
pub(crate) enum SigningKeyError {
    #[error("jwt_key must not be empty")]
    EmptyKey,
    #[error("token lifetime must be positive")]
    ZeroTtl,
    #[error("jwt_key rejected by hmac: {0}")]
    InvalidKey(String),
}

/// 进程级签名器：持有签名密钥与 token 生命周期，启动后只读。
pub(crate) struct TokenSigner {
    mac: HmacSha256,
    header_b64: String,
    ttl_sec: u64,
}

impl fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSigner")
            .field("alg", &TOKEN_ALG)
            .field("ttl_sec", &self.ttl_sec)
            .finish_non_exhaustive()
    }
}

impl TokenSigner {
    /// 构造签名器；空密钥或零生命周期直接失败。
    pub(crate) fn new(signing_key: &str, ttl: Duration) -> Result<Self, SigningKeyError> {
        if signing_key.trim().is_empty() {
            return Err(SigningKeyError::EmptyKey);
        }
        let ttl_sec = ttl.as_secs();
        if ttl_sec == 0 {
            return Err(SigningKeyError::ZeroTtl);
        }
        let mac = keyed_mac(signing_key.as_bytes())
            .map_err(|err| SigningKeyError::InvalidKey(err.to_string()))?;
        Ok(Self {
            mac,
            header_b64: b64url_encode(TOKEN_HEADER_JSON.as_bytes()),
            ttl_sec,
        })
    }

    pub(crate) fn ttl_sec(&self) -> u64 {
        self.ttl_sec
    }

    /// 为 `username` 签发 token，`exp = now + ttl`。
    pub(crate) fn issue(&self, username: &str, now: u64) -> Result<String, serde_json::Error> {
        let claims = TokenClaims {
            username: username.to_string(),
            iat: now,
            exp: now.saturating_add(self.ttl_sec),
        };
        let payload_b64 = b64url_encode(&serde_json::to_vec(&claims)?);
        let signing_input = format!("{}.{payload_b64}", self.header_b64);
        let sig_b64 = hmac_b64url(&self.mac, signing_input.as_bytes());
        Ok(format!("{signing_input}.{sig_b64}"))
    }

    /// 校验 token：结构 -> 签名 -> 过期，任一步失败立即拒绝。
    pub(crate) fn validate(&self, token: &str, now: u64) -> Result<TokenClaims, TokenRejection> {
        let mut parts = token.split('.');
        let (Some(header_b64), Some(payload_b64), Some(sig_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenRejection::Malformed);
        };
        if header_b64.is_empty() || payload_b64.is_empty() || sig_b64.is_empty() {
            return Err(TokenRejection::Malformed);
        }

        let header: TokenHeader = b64url_decode(header_b64)
            .and_then(|raw| serde_json::from_slice(&raw).ok())
            .ok_or(TokenRejection::Malformed)?;
        if header.alg != TOKEN_ALG {
            return Err(TokenRejection::Malformed);
        }
        let payload_raw = b64url_decode(payload_b64).ok_or(TokenRejection::Malformed)?;
        let sig = b64url_decode(sig_b64).ok_or(TokenRejection::Malformed)?;

        let signing_input = &token[..header_b64.len() + 1 + payload_b64.len()];
        if !hmac_verify(&self.mac, signing_input.as_bytes(), &sig) {
            return Err(TokenRejection::BadSignature);
        }

        let claims: TokenClaims =
            serde_json::from_slice(&payload_raw).map_err(|_| TokenRejection::InvalidClaims)?;
        if claims.exp <= now {
            return Err(TokenRejection::Expired);
        }
        Ok(claims)
    }
}
