use crate::model::CODE_UNAUTHORIZED;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use serde::Deserialize;

/// 拦截器重试标记头
pub const RETRY_MARKER_HEADER: &str = "x-token-refreshed";
/// 认证器重试计数头
pub const RETRY_COUNT_HEADER: &str = "retry-count";

/// 响应体探测结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeProbe {
    /// 解析出业务状态码
    Code(i32),
    Empty,
    /// 无法解析，按无信号处理
    Malformed(String),
}

impl EnvelopeProbe {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, EnvelopeProbe::Code(CODE_UNAUTHORIZED))
    }
}

#[derive(Deserialize)]
struct CodeOnly {
    code: i32,
}

/// 只读取包装中的 `code` 字段，其余内容忽略
pub fn probe_envelope(body: &[u8]) -> EnvelopeProbe {
    if body.iter().all(u8::is_ascii_whitespace) {
        return EnvelopeProbe::Empty;
    }

    match serde_json::from_slice::<CodeOnly>(body) {
        Ok(envelope) => EnvelopeProbe::Code(envelope.code),
        Err(e) => EnvelopeProbe::Malformed(e.to_string()),
    }
}

pub fn bearer_value(token: &str) -> Option<HeaderValue> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token)).ok()?;
    value.set_sensitive(true);
    Some(value)
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

pub fn has_retry_marker(headers: &HeaderMap) -> bool {
    headers.contains_key(RETRY_MARKER_HEADER)
}

/// 缺失或无法解析时视为 0
pub fn retry_count(headers: &HeaderMap) -> u32 {
    headers
        .get(RETRY_COUNT_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0)
}

pub fn set_retry_count(headers: &mut HeaderMap, count: u32) {
    headers.insert(HeaderName::from_static(RETRY_COUNT_HEADER), HeaderValue::from(count));
}

pub fn set_retry_marker(headers: &mut HeaderMap) {
    headers.insert(HeaderName::from_static(RETRY_MARKER_HEADER), HeaderValue::from_static("1"));
}
