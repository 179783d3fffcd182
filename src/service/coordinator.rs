use super::refresh::TokenRefreshClient;
use crate::store::CredentialStore;
use crate::util;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::fmt;
use std::sync::{Arc, Mutex};

/// 一次刷新的结果，所有等待同一次刷新的请求共享
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// 可用的新访问令牌
    Refreshed(String),
    /// 刷新失败，会话已清除
    LoggedOut,
}

type SharedRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

/// 全局唯一的令牌刷新入口
///
/// 同一时刻最多只有一次刷新请求在途，后到的调用者等待同一结果。
/// 被拒绝的令牌正是上一次刷新替换掉的旧令牌时，直接复用存储中的新令牌。
/// 刷新在独立任务中执行，发起者被取消后仍会完成并落盘。
pub struct TokenRefresher {
    store: Arc<CredentialStore>,
    client: TokenRefreshClient,
    in_flight: Mutex<Option<SharedRefresh>>,
    retired: Arc<Mutex<Option<String>>>,
}

impl TokenRefresher {
    pub fn new(store: Arc<CredentialStore>, client: TokenRefreshClient) -> Self {
        Self {
            store,
            client,
            in_flight: Mutex::new(None),
            retired: Arc::new(Mutex::new(None)),
        }
    }

    pub fn client(&self) -> &TokenRefreshClient {
        &self.client
    }

    /// `rejected` 为被服务端拒绝的访问令牌，请求未携带令牌时为 `None`
    pub async fn refresh(&self, rejected: Option<&str>) -> RefreshOutcome {
        let (future, leader) = {
            let mut slot = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
            match slot.as_ref().filter(|f| f.peek().is_none()) {
                Some(pending) => {
                    tracing::debug!("joining in-flight token refresh");
                    (pending.clone(), false)
                }
                None => {
                    if let Some(current) = self.rotated_since(rejected) {
                        tracing::debug!("access token already rotated, reusing it");
                        return RefreshOutcome::Refreshed(current);
                    }

                    let task = tokio::spawn(refresh_once(
                        Arc::clone(&self.store),
                        self.client.clone(),
                        Arc::clone(&self.retired),
                    ));
                    let future = task
                        .map(|joined| joined.unwrap_or(RefreshOutcome::LoggedOut))
                        .boxed()
                        .shared();
                    *slot = Some(future.clone());
                    (future, true)
                }
            }
        };

        let outcome = future.clone().await;

        if leader {
            let mut slot = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
            if slot.as_ref().is_some_and(|f| f.ptr_eq(&future)) {
                *slot = None;
            }
        }

        outcome
    }

    /// 被拒绝的令牌已被上一次刷新替换时返回当前令牌
    fn rotated_since(&self, rejected: Option<&str>) -> Option<String> {
        let rejected = rejected?;
        let retired = self.retired.lock().unwrap_or_else(|e| e.into_inner());
        if retired.as_deref() != Some(rejected) {
            return None;
        }
        self.store
            .get_access_token()
            .filter(|current| !current.is_empty() && current != rejected)
    }
}

impl fmt::Debug for TokenRefresher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRefresher")
            .field("endpoint", &self.client.endpoint().as_str())
            .finish_non_exhaustive()
    }
}

async fn refresh_once(
    store: Arc<CredentialStore>,
    client: TokenRefreshClient,
    retired: Arc<Mutex<Option<String>>>,
) -> RefreshOutcome {
    let Some(refresh_token) = store.get_refresh_token().filter(|t| !t.is_empty()) else {
        tracing::warn!("no refresh token stored, clearing session");
        clear_session(&store);
        return RefreshOutcome::LoggedOut;
    };

    tracing::info!(endpoint = %client.endpoint(), "refreshing access token");
    let pair = match client.refresh(&refresh_token).await {
        Ok(pair) => pair,
        Err(e) => {
            tracing::warn!(error = %e, "token refresh failed, clearing session");
            clear_session(&store);
            return RefreshOutcome::LoggedOut;
        }
    };

    if util::bearer_value(&pair.token).is_none() {
        tracing::warn!("refreshed access token is not a valid header value, clearing session");
        clear_session(&store);
        return RefreshOutcome::LoggedOut;
    }

    let previous = store.get_access_token();
    match store.update_token(&pair.token, &pair.refresh_token, pair.expires_in) {
        Ok(()) => {
            *retired.lock().unwrap_or_else(|e| e.into_inner()) = previous;
            tracing::info!(expires_in = pair.expires_in, "access token refreshed");
            RefreshOutcome::Refreshed(pair.token)
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to persist refreshed tokens, clearing session");
            clear_session(&store);
            RefreshOutcome::LoggedOut
        }
    }
}

fn clear_session(store: &CredentialStore) {
    // 持久化失败时内存已清除，这里只记录
    if let Err(e) = store.clear_login_info() {
        tracing::error!(error = %e, "failed to persist cleared session");
    }
}
