use crate::common::{AppResult, RefreshError};
use crate::conf::Settings;
use crate::model::{ApiEnvelope, RefreshRequest, TokenPair};
use reqwest::Url;

/// 调用刷新接口的独立客户端
///
/// 不经过拦截器与认证器，超时设置与普通请求客户端分开。
#[derive(Debug, Clone)]
pub struct TokenRefreshClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl TokenRefreshClient {
    pub fn new(settings: &Settings) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.refresh.connect_timeout())
            .timeout(settings.refresh.io_timeout())
            .user_agent(settings.api.user_agent.as_str())
            .tcp_nodelay(true)
            .build()?;

        Ok(Self {
            client,
            endpoint: settings.endpoint(&settings.api.refresh_path)?,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, RefreshError> {
        if refresh_token.is_empty() {
            return Err(RefreshError::EmptyToken);
        }

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&RefreshRequest {
                refresh_token: refresh_token.to_string(),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RefreshError::Status(status));
        }

        let body = response.bytes().await?;
        let envelope = serde_json::from_slice::<ApiEnvelope<TokenPair>>(&body)?;
        if !envelope.is_success() {
            return Err(RefreshError::Rejected {
                code: envelope.code,
                message: envelope.message,
            });
        }

        envelope
            .data
            .filter(|pair| !pair.token.is_empty())
            .ok_or(RefreshError::MissingData)
    }
}
