use super::UserInfo;
use serde::{Deserialize, Serialize};

/// 刷新接口返回的令牌三元组
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// 登录接口返回的完整会话信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    pub user_id: String,
    pub token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: i64,
    #[serde(default)]
    pub user_info: Option<UserInfo>,
}

/// 持久化的会话状态
///
/// `is_logged_in` 为真时 `access_token` 必然非空；退出登录后令牌与身份字段
/// 全部清空，`user_info` 保留但不再可信。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialRecord {
    pub user_id: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_in: i64,
    pub user_info: Option<UserInfo>,
    pub is_logged_in: bool,
}

impl CredentialRecord {
    pub fn from_login(data: LoginData) -> Self {
        Self {
            user_id: Some(data.user_id),
            is_logged_in: !data.token.is_empty(),
            access_token: Some(data.token).filter(|t| !t.is_empty()),
            refresh_token: Some(data.refresh_token).filter(|t| !t.is_empty()),
            expires_in: data.expires_in,
            user_info: data.user_info,
        }
    }

    /// 仅更新令牌字段，身份与资料保持不变
    pub fn with_tokens(&self, pair: &TokenPair) -> Self {
        Self {
            access_token: Some(pair.token.clone()).filter(|t| !t.is_empty()),
            refresh_token: Some(pair.refresh_token.clone()).filter(|t| !t.is_empty()),
            expires_in: pair.expires_in,
            ..self.clone()
        }
    }

    pub fn cleared(&self) -> Self {
        Self {
            user_id: None,
            access_token: None,
            refresh_token: None,
            expires_in: 0,
            user_info: self.user_info.clone(),
            is_logged_in: false,
        }
    }

    pub fn has_session(&self) -> bool {
        self.is_logged_in && self.access_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}
