//! 登录逻辑：查找凭证、比对密码、签发 token。

use bookshelf_protocol::{AuthRequest, AuthResponse};
use tracing::{debug, info};

use crate::{api::error::ApiError, state::AppState};

impl AppState {
    /// 用户名与密码校验通过后签发 token。
    pub(crate) async fn authenticate(&self, req: &AuthRequest) -> Result<AuthResponse, ApiError> {
        let username = req.username.trim();
        if username.is_empty() || req.password.is_empty() {
            return Err(ApiError::bad_request("username and password are required"));
        }

        let record = self.storage.get_user(username).await?;
        let known = record.is_some();
        let verified = self
            .verify_secret(&req.password, record.map(|row| row.password_hash))
            .await?;
        if !verified {
            let reason = if known {
                "password mismatch"
            } else {
                "unknown user"
            };
            debug!(username, reason, "login rejected");
            return Err(ApiError::credentials_invalid());
        }

        let token = self.issue_token(username)?;
        info!(username, "user authorized");
        Ok(AuthResponse {
            success: true,
            message: "User authorized".to_string(),
            token,
        })
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use bookshelf_protocol::{AuthRequest, unix_now};

    use crate::{state::tests::test_state, storage::UserRecord};

    fn request(username: &str, password: &str) -> AuthRequest {
        AuthRequest {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn registered_user_gets_token_for_own_identity() {
        let state = test_state();
        let password_hash = state.hash_secret("p@ss1").await.unwrap();
        state
            .storage
            .insert_user(&UserRecord {
                username: "bob".to_string(),
                name: "Bob".to_string(),
                lastname: "Stone".to_string(),
                password_hash,
            })
            .await
            .unwrap();

        let resp = state.authenticate(&request("bob", "p@ss1")).await.unwrap();
        assert!(resp.success);
        assert_eq!(resp.message, "User authorized");
        let claims = state.tokens.validate(&resp.token, unix_now()).unwrap();
        assert_eq!(claims.username, "bob");

        let err = state
            .authenticate(&request("bob", "wrong"))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_user_and_bad_password_look_the_same() {
        let state = test_state();
        let password_hash = state.hash_secret("p@ss1").await.unwrap();
        state
            .storage
            .insert_user(&UserRecord {
                username: "bob".to_string(),
                name: String::new(),
                lastname: String::new(),
                password_hash,
            })
            .await
            .unwrap();

        let unknown = state
            .authenticate(&request("nobody", "p@ss1"))
            .await
            .unwrap_err();
        let mismatch = state
            .authenticate(&request("bob", "nope"))
            .await
            .unwrap_err();
        assert_eq!(unknown.status, mismatch.status);
        assert_eq!(unknown.code, mismatch.code);
        assert_eq!(unknown.message, mismatch.message);
        assert_eq!(unknown.message, "Credentials invalid");
    }

    #[tokio::test]
    async fn shared_72_byte_prefix_does_not_log_in() {
        let state = test_state();
        let prefix = "a".repeat(72);
        let password_hash = state.hash_secret(&prefix).await.unwrap();
        state
            .storage
            .insert_user(&UserRecord {
                username: "carol".to_string(),
                name: String::new(),
                lastname: String::new(),
                password_hash,
            })
            .await
            .unwrap();

        assert!(state.authenticate(&request("carol", &prefix)).await.is_ok());
        let err = state
            .authenticate(&request("carol", &format!("{prefix}totally-different")))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn empty_fields_are_bad_requests() {
        let state = test_state();
        let err = state.authenticate(&request("", "x")).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        let err = state.authenticate(&request("bob", "")).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}
