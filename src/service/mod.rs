mod coordinator;
mod refresh;

pub use coordinator::{RefreshOutcome, TokenRefresher};
pub use refresh::TokenRefreshClient;

use crate::common::AppResult;
use crate::conf::Settings;
use crate::store::{CredentialStore, FilePreferences};
use reqwest::Url;
use std::sync::Arc;

/// 会话上下文，由启动流程显式构造并注入到各组件
#[derive(Debug, Clone)]
pub struct Session {
    store: Arc<CredentialStore>,
    refresher: Arc<TokenRefresher>,
}

impl Session {
    pub fn new(settings: &Settings, store: CredentialStore) -> AppResult<Self> {
        let store = Arc::new(store);
        let client = TokenRefreshClient::new(settings)?;
        let refresher = Arc::new(TokenRefresher::new(Arc::clone(&store), client));
        tracing::info!(logged_in = store.is_logged_in(), "session initialized");
        Ok(Self { store, refresher })
    }

    /// 使用配置中的会话文件
    pub fn open(settings: &Settings) -> AppResult<Self> {
        let store = CredentialStore::open(FilePreferences::new(&settings.session.store_path));
        Self::new(settings, store)
    }

    pub fn store(&self) -> &Arc<CredentialStore> {
        &self.store
    }

    pub fn refresher(&self) -> &Arc<TokenRefresher> {
        &self.refresher
    }

    pub fn is_refresh_request(&self, url: &Url) -> bool {
        let endpoint = self.refresher.client().endpoint();
        url.path().trim_end_matches('/') == endpoint.path().trim_end_matches('/')
    }
}
