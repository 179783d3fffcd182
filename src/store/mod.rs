mod backend;

pub use backend::{FilePreferences, MemoryPreferences, PreferenceBackend};

use crate::common::{AppError, AppResult};
use crate::model::{CredentialRecord, LoginData, TokenPair, UserInfo};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// 会话凭据存储
///
/// 内存中保存一份完整记录，所有写操作在写锁内先提交到后端、再整体替换内存记录，
/// 因此读者只会看到写入前或写入后的完整状态。
pub struct CredentialStore {
    state: RwLock<CredentialRecord>,
    backend: Box<dyn PreferenceBackend>,
}

impl CredentialStore {
    /// 从后端加载已持久化的会话；记录损坏时按未登录处理
    pub fn open(backend: impl PreferenceBackend + 'static) -> Self {
        let record = match backend.load() {
            Ok(Some(record)) => record,
            Ok(None) => CredentialRecord::default(),
            Err(e) => {
                log::warn!("读取会话记录失败，按未登录处理: {}", e);
                CredentialRecord::default()
            }
        };

        let record = if record.is_logged_in && !record.has_session() {
            log::warn!("会话记录不完整，已重置为未登录");
            record.cleared()
        } else {
            record
        };

        Self {
            state: RwLock::new(record),
            backend: Box::new(backend),
        }
    }

    pub fn in_memory() -> Self {
        Self::open(MemoryPreferences::new())
    }

    pub fn get_access_token(&self) -> Option<String> {
        self.read().access_token.clone()
    }

    pub fn get_refresh_token(&self) -> Option<String> {
        self.read().refresh_token.clone()
    }

    pub fn get_user_id(&self) -> Option<String> {
        self.read().user_id.clone()
    }

    /// 同一时刻观察到的访问令牌与刷新令牌
    pub fn tokens(&self) -> (Option<String>, Option<String>) {
        let state = self.read();
        (state.access_token.clone(), state.refresh_token.clone())
    }

    pub fn is_logged_in(&self) -> bool {
        self.read().has_session()
    }

    /// 登录状态下缓存的用户资料
    pub fn user_info(&self) -> Option<UserInfo> {
        let state = self.read();
        if state.has_session() {
            state.user_info.clone()
        } else {
            None
        }
    }

    pub fn snapshot(&self) -> CredentialRecord {
        self.read().clone()
    }

    pub fn save_login_info(&self, data: LoginData) -> AppResult<()> {
        let next = CredentialRecord::from_login(data);
        let mut state = self.write();
        self.backend.commit(&next)?;
        *state = next;
        log::info!("登录信息已保存, userId: {:?}", state.user_id);
        Ok(())
    }

    /// 刷新成功后更新令牌，身份与资料不变；会话已被清除时拒绝写入
    pub fn update_token(&self, access_token: &str, refresh_token: &str, expires_in: i64) -> AppResult<()> {
        if access_token.is_empty() {
            return Err(AppError::InvalidToken);
        }

        let mut state = self.write();
        if state.user_id.is_none() {
            log::warn!("会话已清除，丢弃刷新得到的令牌");
            return Err(AppError::Unauthenticated);
        }

        let pair = TokenPair {
            token: access_token.to_string(),
            refresh_token: refresh_token.to_string(),
            expires_in,
        };
        let next = CredentialRecord {
            is_logged_in: true,
            ..state.with_tokens(&pair)
        };
        self.backend.commit(&next)?;
        *state = next;
        log::debug!("令牌已更新, expiresIn: {}", expires_in);
        Ok(())
    }

    /// 清除会话；持久化失败时内存状态仍然清除
    pub fn clear_login_info(&self) -> AppResult<()> {
        let mut state = self.write();
        let next = state.cleared();
        let committed = self.backend.commit(&next);
        *state = next;
        if let Err(e) = &committed {
            log::error!("清除会话持久化失败: {}", e);
        }
        committed
    }

    fn read(&self) -> RwLockReadGuard<'_, CredentialRecord> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, CredentialRecord> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("logged_in", &self.is_logged_in())
            .finish_non_exhaustive()
    }
}
