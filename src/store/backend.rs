use crate::common::AppResult;
use crate::model::CredentialRecord;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// 会话记录的持久化后端
///
/// `commit` 必须在返回前完成落盘，调用方据此认为写入已持久。
pub trait PreferenceBackend: Send + Sync {
    fn load(&self) -> AppResult<Option<CredentialRecord>>;

    fn commit(&self, record: &CredentialRecord) -> AppResult<()>;
}

/// JSON 文件后端，先写临时文件再原子替换
#[derive(Debug)]
pub struct FilePreferences {
    path: PathBuf,
}

impl FilePreferences {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "session".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl PreferenceBackend for FilePreferences {
    fn load(&self) -> AppResult<Option<CredentialRecord>> {
        match fs::read(&self.path) {
            Ok(content) if content.is_empty() => Ok(None),
            Ok(content) => Ok(Some(serde_json::from_slice(&content)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn commit(&self, record: &CredentialRecord) -> AppResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_vec_pretty(record)?;
        let temp = self.temp_path();
        {
            let mut file = File::create(&temp)?;
            file.write_all(&content)?;
            file.sync_all()?;
        }
        fs::rename(&temp, &self.path)?;
        Ok(())
    }
}

/// 进程内后端，用于测试及临时会话
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    record: Mutex<Option<CredentialRecord>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: CredentialRecord) -> Self {
        Self {
            record: Mutex::new(Some(record)),
        }
    }

    pub fn snapshot(&self) -> Option<CredentialRecord> {
        self.record
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl PreferenceBackend for MemoryPreferences {
    fn load(&self) -> AppResult<Option<CredentialRecord>> {
        Ok(self.snapshot())
    }

    fn commit(&self, record: &CredentialRecord) -> AppResult<()> {
        *self.record.lock().unwrap_or_else(|e| e.into_inner()) = Some(record.clone());
        Ok(())
    }
}
