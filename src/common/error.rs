use reqwest::StatusCode;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("Serialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("HTTP请求失败: {0}")]
    Status(StatusCode),

    #[error("API错误: 代码={code}, 消息={message}")]
    Api { code: i32, message: String },

    #[error("无效的令牌")]
    InvalidToken,

    #[error("未登录或会话已失效")]
    Unauthenticated,
}

pub type AppResult<T> = Result<T, AppError>;

/// 刷新令牌失败的原因，仅用于日志，调用方统一视为“未获得新令牌”
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("refresh token is empty")]
    EmptyToken,

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected HTTP status: {0}")]
    Status(StatusCode),

    #[error("malformed refresh response: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("refresh rejected: code={code}, message={message}")]
    Rejected { code: i32, message: String },

    #[error("refresh response carried no token")]
    MissingData,
}
