mod auth;

pub use auth::{CredentialRecord, LoginData, LoginRequest, RefreshRequest, TokenPair};

use serde::{Deserialize, Serialize};

/// 业务状态码：成功
pub const CODE_OK: i32 = 200;
/// 业务状态码：未授权，与 HTTP 状态码无关
pub const CODE_UNAUTHORIZED: i32 = 401;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserInfo {
    pub user_id: String,
    pub user_name: String,
    pub nickname: String,
    pub avatar_url: String,
    pub email: String,
    pub phone: String,
}

/// 后端统一响应包装
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub code: i32,
    #[serde(default, alias = "msg")]
    pub message: String,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    pub fn is_success(&self) -> bool {
        self.code == CODE_OK
    }
}
