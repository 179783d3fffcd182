use crate::common::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Settings {
    pub api: ApiConfig,
    pub refresh: RefreshConfig,
    pub session: SessionConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ApiConfig {
    pub base_url: String,           // 后端地址，普通请求与刷新请求共用
    pub refresh_path: String,       // 刷新令牌接口
    pub login_path: String,         // 登录接口
    pub request_timeout_secs: u64,  // 普通请求超时 (s)
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RefreshConfig {
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    pub write_timeout_secs: u64,
    pub max_retry_count: u32,       // 401 认证器最多重试次数
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SessionConfig {
    pub store_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LogConfig {
    pub level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            api: ApiConfig {
                base_url: "http://localhost:8080".to_string(),
                refresh_path: "/auth/refresh".to_string(),
                login_path: "/auth/login".to_string(),
                request_timeout_secs: 15,
                user_agent: format!("session-relay/{}", env!("CARGO_PKG_VERSION")),
            },
            refresh: RefreshConfig {
                connect_timeout_secs: 30,
                read_timeout_secs: 30,
                write_timeout_secs: 30,
                max_retry_count: 1,
            },
            session: SessionConfig {
                store_path: PathBuf::from("session.json"),
            },
            log: LogConfig {
                level: "info".to_string(),
            },
        }
    }
}

impl Settings {
    /// 读取配置文件；文件不存在时写出默认配置并使用之
    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let config = match fs::read_to_string(path) {
            Ok(content) => toml::from_str::<Settings>(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let default_config = Settings::default();
                let content = toml::to_string_pretty(&default_config)?;
                fs::write(path, content)?;
                default_config
            }
            Err(e) => return Err(AppError::Io(e)),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        self.base_url()?;

        for (name, path) in [
            ("refresh_path", &self.api.refresh_path),
            ("login_path", &self.api.login_path),
        ] {
            if !path.starts_with('/') {
                return Err(AppError::Config(format!("{} must start with '/': {}", name, path)));
            }
        }

        let timeouts = [
            ("request_timeout_secs", self.api.request_timeout_secs),
            ("connect_timeout_secs", self.refresh.connect_timeout_secs),
            ("read_timeout_secs", self.refresh.read_timeout_secs),
            ("write_timeout_secs", self.refresh.write_timeout_secs),
        ];
        if let Some((name, _)) = timeouts.iter().find(|(_, secs)| *secs == 0) {
            return Err(AppError::Config(format!("{} must be greater than zero", name)));
        }

        Ok(())
    }

    pub fn base_url(&self) -> AppResult<Url> {
        Url::parse(&self.api.base_url)
            .map_err(|e| AppError::Config(format!("invalid base_url {}: {}", self.api.base_url, e)))
    }

    /// 拼接接口地址，保留 base_url 中的路径前缀
    pub fn endpoint(&self, path: &str) -> AppResult<Url> {
        let base = self.api.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Url::parse(&format!("{}/{}", base, path))
            .map_err(|e| AppError::Config(format!("invalid endpoint {}: {}", path, e)))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.request_timeout_secs)
    }
}

impl RefreshConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// reqwest 没有单独的写超时，读写取较大者作为整体超时
    pub fn io_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs.max(self.write_timeout_secs))
    }
}
