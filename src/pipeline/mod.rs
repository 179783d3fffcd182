//! 请求管道：拦截器链 + 传输层
//!
//! 每个请求依次经过 [`Interceptor`]，链尾由 [`Transport`] 真正发出。
//! 传输层收到 HTTP 401 时交给 [`Authenticator`] 决定是否带新请求重发。

mod authenticator;
mod interceptor;
mod logging;
mod response;
mod transport;

pub use authenticator::{Authenticator, TokenAuthenticator};
pub use interceptor::SessionInterceptor;
pub use logging::LoggingInterceptor;
pub use response::HttpResponse;
pub use transport::Transport;

use crate::common::AppResult;
use async_trait::async_trait;
use reqwest::Request;
use std::sync::Arc;

#[async_trait]
pub trait Interceptor: Send + Sync {
    async fn intercept(&self, request: Request, chain: Chain<'_>) -> AppResult<HttpResponse>;
}

/// 剩余的拦截器与链尾传输层
#[derive(Clone, Copy)]
pub struct Chain<'a> {
    interceptors: &'a [Arc<dyn Interceptor>],
    transport: &'a Transport,
}

impl<'a> Chain<'a> {
    pub fn new(interceptors: &'a [Arc<dyn Interceptor>], transport: &'a Transport) -> Self {
        Self {
            interceptors,
            transport,
        }
    }

    /// 交给下一个拦截器；拦截器可多次调用以重发请求
    pub async fn proceed(&self, request: Request) -> AppResult<HttpResponse> {
        match self.interceptors.split_first() {
            Some((head, rest)) => head.intercept(request, Chain::new(rest, self.transport)).await,
            None => self.transport.execute(request).await,
        }
    }
}
