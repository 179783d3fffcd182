use super::{Chain, HttpResponse, Interceptor};
use crate::common::AppResult;
use crate::service::{RefreshOutcome, Session};
use crate::util::{self, EnvelopeProbe};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::Request;

/// 为请求附加访问令牌，并根据响应体中的业务状态码刷新令牌后重发一次
#[derive(Debug, Clone)]
pub struct SessionInterceptor {
    session: Session,
}

impl SessionInterceptor {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    fn attach_token(&self, request: &mut Request) {
        if request.headers().contains_key(AUTHORIZATION) {
            return;
        }

        let token = self.session.store().get_access_token().filter(|t| !t.is_empty());
        if let Some(value) = token.as_deref().and_then(util::bearer_value) {
            request.headers_mut().insert(AUTHORIZATION, value);
        }
    }
}

#[async_trait]
impl Interceptor for SessionInterceptor {
    async fn intercept(&self, mut request: Request, chain: Chain<'_>) -> AppResult<HttpResponse> {
        // 重发时基于未附加令牌的原始请求
        let original = request.try_clone();
        self.attach_token(&mut request);

        let sent_token = util::bearer_token(request.headers()).map(str::to_owned);
        let exempt = self.session.is_refresh_request(request.url());
        let is_retry = util::has_retry_marker(request.headers());

        let response = chain.proceed(request).await?;

        if exempt || is_retry {
            return Ok(response);
        }

        match response.probe() {
            probe if probe.is_unauthorized() => {}
            EnvelopeProbe::Malformed(reason) => {
                tracing::trace!(%reason, "response body is not an envelope");
                return Ok(response);
            }
            _ => return Ok(response),
        }

        tracing::warn!(path = %response.url().path(), "server reported unauthorized, refreshing token");

        let token = match self.session.refresher().refresh(sent_token.as_deref()).await {
            RefreshOutcome::Refreshed(token) => token,
            RefreshOutcome::LoggedOut => return Ok(response),
        };

        let Some(mut retry) = original else {
            tracing::warn!("request body cannot be replayed, returning original response");
            return Ok(response);
        };
        let Some(value) = util::bearer_value(&token) else {
            tracing::warn!("refreshed token is not a valid header value, returning original response");
            return Ok(response);
        };
        drop(response);

        retry.headers_mut().insert(AUTHORIZATION, value);
        util::set_retry_marker(retry.headers_mut());

        chain.proceed(retry).await
    }
}
