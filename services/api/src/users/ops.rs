//! users 业务逻辑：创建时哈希密码并签发 token，更新时仅在给出新密码时重新哈希。

use bookshelf_protocol::{User, UserResponse};

use crate::{api::error::ApiError, state::AppState, storage::UserRecord};

const USER_NOT_FOUND: &str = "User not found";

impl AppState {
    pub(crate) async fn list_users(&self) -> Result<UserResponse, ApiError> {
        let users = self.storage.list_users().await?;
        Ok(UserResponse::ok("", users))
    }

    pub(crate) async fn read_user(&self, username: &str) -> Result<UserResponse, ApiError> {
        let record = self.require_user(username).await?;
        Ok(UserResponse::ok("", vec![record.to_user()]))
    }

    /// 注册用户并为其签发 token。
    pub(crate) async fn create_user(&self, draft: &User) -> Result<UserResponse, ApiError> {
        let username = draft.username.trim();
        if username.is_empty() || draft.password.is_empty() {
            return Err(ApiError::bad_request("username and password are required"));
        }

        let record = UserRecord {
            username: username.to_string(),
            name: draft.name.clone(),
            lastname: draft.lastname.clone(),
            password_hash: self.hash_secret(&draft.password).await?,
        };
        self.storage.insert_user(&record).await?;

        let token = self.issue_token(username)?;
        Ok(UserResponse {
            token,
            ..UserResponse::ok("User created", vec![record.to_user()])
        })
    }

    /// 覆盖 name/lastname；`password` 非空时才替换哈希。
    pub(crate) async fn update_user(
        &self,
        username: &str,
        draft: &User,
    ) -> Result<UserResponse, ApiError> {
        let mut record = self.require_user(username).await?;
        let password_hash = if draft.password.is_empty() {
            None
        } else {
            Some(self.hash_secret(&draft.password).await?)
        };
        let updated = self
            .storage
            .update_user(
                &record.username,
                &draft.name,
                &draft.lastname,
                password_hash.as_deref(),
            )
            .await?;
        if !updated {
            return Err(user_not_found());
        }

        record.name = draft.name.clone();
        record.lastname = draft.lastname.clone();
        Ok(UserResponse::ok("Successful update", vec![record.to_user()]))
    }

    pub(crate) async fn delete_user(&self, username: &str) -> Result<UserResponse, ApiError> {
        if !self.storage.delete_user(username.trim()).await? {
            return Err(user_not_found());
        }
        Ok(UserResponse::ok("Document deleted", Vec::new()))
    }

    async fn require_user(&self, username: &str) -> Result<UserRecord, ApiError> {
        self.storage
            .get_user(username.trim())
            .await?
            .ok_or_else(user_not_found)
    }
}

fn user_not_found() -> ApiError {
    ApiError::not_found("USER_NOT_FOUND", USER_NOT_FOUND)
}
