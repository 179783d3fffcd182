//! 带会话管理的 HTTP 客户端
//!
//! 所有请求经过 [`pipeline`] 附加访问令牌；服务端以业务码 401 或 HTTP 401
//! 拒绝时，由 [`service::TokenRefresher`] 统一刷新令牌并重发，刷新失败则清除会话。

pub mod api;
pub mod common;
pub mod conf;
pub mod model;
pub mod pipeline;
pub mod service;
pub mod store;
pub mod util;

pub use api::ApiClient;
pub use common::{AppError, AppResult};
pub use conf::Settings;
pub use service::Session;
pub use store::CredentialStore;
