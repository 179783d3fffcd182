use super::{Chain, HttpResponse, Interceptor};
use crate::common::AppResult;
use async_trait::async_trait;
use reqwest::Request;
use std::time::Instant;

/// 记录请求方法、路径、状态码与耗时；不记录查询参数与请求头
#[derive(Debug, Default)]
pub struct LoggingInterceptor;

#[async_trait]
impl Interceptor for LoggingInterceptor {
    async fn intercept(&self, request: Request, chain: Chain<'_>) -> AppResult<HttpResponse> {
        let method = request.method().clone();
        let path = request.url().path().to_string();
        let started = Instant::now();

        let result = chain.proceed(request).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(response) => tracing::debug!(%method, %path, status = %response.status(), elapsed_ms, "request completed"),
            Err(e) => tracing::warn!(%method, %path, elapsed_ms, error = %e, "request failed"),
        }

        result
    }
}
