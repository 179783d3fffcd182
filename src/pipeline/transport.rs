use super::{Authenticator, HttpResponse};
use crate::common::AppResult;
use reqwest::{Request, StatusCode};
use std::sync::Arc;

/// 单个原始请求允许的认证重发次数上限
const MAX_FOLLOW_UPS: u32 = 3;

/// 链尾：发出请求并读取响应，HTTP 401 时调用认证器
pub struct Transport {
    client: reqwest::Client,
    authenticator: Option<Arc<dyn Authenticator>>,
}

impl Transport {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            authenticator: None,
        }
    }

    pub fn with_authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticator = Some(authenticator);
        self
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub async fn execute(&self, request: Request) -> AppResult<HttpResponse> {
        let mut request = request;
        let mut follow_ups = 0;

        loop {
            // 流式请求体无法复制，这类请求不会被重发
            let replay = request.try_clone();
            let response = HttpResponse::read(self.client.execute(request).await?).await?;

            if response.status() != StatusCode::UNAUTHORIZED {
                return Ok(response);
            }

            let (Some(authenticator), Some(replay)) = (&self.authenticator, replay) else {
                return Ok(response);
            };

            match authenticator.authenticate(&replay, &response).await {
                Some(next) if follow_ups < MAX_FOLLOW_UPS => {
                    follow_ups += 1;
                    request = next;
                }
                Some(_) => {
                    tracing::warn!(url = %response.url().path(), "too many authentication follow-ups");
                    return Ok(response);
                }
                None => return Ok(response),
            }
        }
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("authenticator", &self.authenticator.is_some())
            .finish_non_exhaustive()
    }
}
