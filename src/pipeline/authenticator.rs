use super::HttpResponse;
use crate::service::{RefreshOutcome, Session};
use crate::util;
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::Request;
use tokio::sync::Mutex;

/// 传输层收到 HTTP 401 时调用；返回 `None` 表示放弃，直接把 401 交给调用方
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, request: &Request, response: &HttpResponse) -> Option<Request>;
}

/// 刷新令牌后以递增的重试计数重发请求
#[derive(Debug)]
pub struct TokenAuthenticator {
    session: Session,
    max_retry_count: u32,
    lock: Mutex<()>,
}

impl TokenAuthenticator {
    pub fn new(session: Session, max_retry_count: u32) -> Self {
        Self {
            session,
            max_retry_count,
            lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl Authenticator for TokenAuthenticator {
    async fn authenticate(&self, request: &Request, response: &HttpResponse) -> Option<Request> {
        if self.session.is_refresh_request(request.url()) {
            return None;
        }

        // 串行执行，后到者在锁释放后由刷新协调器复用已轮换的令牌
        let _guard = self.lock.lock().await;

        let count = util::retry_count(request.headers());
        if count >= self.max_retry_count {
            tracing::info!(
                path = %response.url().path(),
                count,
                "retry budget exhausted, giving up"
            );
            return None;
        }

        let rejected = util::bearer_token(request.headers());
        let token = match self.session.refresher().refresh(rejected).await {
            RefreshOutcome::Refreshed(token) => token,
            RefreshOutcome::LoggedOut => return None,
        };

        let mut next = request.try_clone()?;
        next.headers_mut().insert(AUTHORIZATION, util::bearer_value(&token)?);
        util::set_retry_count(next.headers_mut(), count + 1);
        Some(next)
    }
}
