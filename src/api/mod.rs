use crate::common::{AppError, AppResult};
use crate::conf::Settings;
use crate::model::{LoginData, LoginRequest, UserInfo};
use crate::pipeline::{
    Chain, HttpResponse, Interceptor, LoggingInterceptor, SessionInterceptor, TokenAuthenticator,
    Transport,
};
use crate::service::Session;
use reqwest::{Method, Request, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// 业务层使用的 API 客户端，令牌附加与刷新对调用方透明
pub struct ApiClient {
    settings: Settings,
    session: Session,
    interceptors: Vec<Arc<dyn Interceptor>>,
    transport: Transport,
}

impl ApiClient {
    pub fn new(settings: &Settings, session: Session) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .tcp_keepalive(std::time::Duration::from_secs(15))
            .tcp_nodelay(true)
            .user_agent(settings.api.user_agent.as_str())
            .build()?;

        let authenticator = TokenAuthenticator::new(session.clone(), settings.refresh.max_retry_count);
        let transport = Transport::new(client).with_authenticator(Arc::new(authenticator));

        let interceptors: Vec<Arc<dyn Interceptor>> = vec![
            Arc::new(LoggingInterceptor),
            Arc::new(SessionInterceptor::new(session.clone())),
        ];

        Ok(Self {
            settings: settings.clone(),
            session,
            interceptors,
            transport,
        })
    }

    /// 在最外层追加拦截器
    pub fn with_interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.insert(0, interceptor);
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn request(&self, method: Method, path: &str) -> AppResult<RequestBuilder> {
        let url = self.settings.endpoint(path)?;
        Ok(self.transport.client().request(method, url))
    }

    pub async fn execute(&self, request: Request) -> AppResult<HttpResponse> {
        Chain::new(&self.interceptors, &self.transport).proceed(request).await
    }

    pub async fn send(&self, builder: RequestBuilder) -> AppResult<HttpResponse> {
        self.execute(builder.build()?).await
    }

    pub async fn get(&self, path: &str) -> AppResult<HttpResponse> {
        self.send(self.request(Method::GET, path)?).await
    }

    pub async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> AppResult<HttpResponse> {
        self.send(self.request(Method::POST, path)?.json(body)).await
    }

    /// GET 并解出包装中的 `data`
    pub async fn get_envelope<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        let response = self.get(path).await?;
        decode_envelope(&response)
    }

    pub async fn login(&self, username: &str, password: &str) -> AppResult<Option<UserInfo>> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response = self.post_json(&self.settings.api.login_path, &request).await?;
        let data: LoginData = decode_envelope(&response)?;

        self.session.store().save_login_info(data)?;
        if !self.session.store().is_logged_in() {
            return Err(AppError::Unauthenticated);
        }
        Ok(self.session.store().user_info())
    }

    pub fn logout(&self) -> AppResult<()> {
        tracing::info!("logging out");
        self.session.store().clear_login_info()
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.store().is_logged_in()
    }

    pub fn current_user(&self) -> Option<UserInfo> {
        self.session.store().user_info()
    }
}

pub fn decode_envelope<T: DeserializeOwned>(response: &HttpResponse) -> AppResult<T> {
    let status = response.status();
    if !status.is_success() {
        log::error!("请求失败, HTTP状态码: {}, path: {}", status, response.url().path());
        return Err(AppError::Status(status));
    }

    let envelope = response.envelope::<T>().map_err(|e| {
        log::error!("解析API响应失败: {}, path: {}", e, response.url().path());
        e
    })?;

    if !envelope.is_success() {
        log::error!("API调用失败: 代码={}, 消息={}", envelope.code, envelope.message);
        return Err(AppError::Api {
            code: envelope.code,
            message: envelope.message,
        });
    }

    envelope.data.ok_or_else(|| AppError::Api {
        code: envelope.code,
        message: "响应缺少 data 字段".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use reqwest::header::HeaderMap;
    use reqwest::{StatusCode, Url};

    fn response(status: StatusCode, body: &'static str) -> HttpResponse {
        HttpResponse::new(
            status,
            HeaderMap::new(),
            Url::parse("http://localhost/schedules").unwrap(),
            Bytes::from_static(body.as_bytes()),
        )
    }

    #[test]
    fn test_decode_envelope_success() {
        let value: Vec<u32> =
            decode_envelope(&response(StatusCode::OK, r#"{"code":200,"message":"ok","data":[1,2]}"#)).unwrap();
        assert_eq!(value, vec![1, 2]);
    }

    #[test]
    fn test_decode_envelope_failures() {
        let err = decode_envelope::<u32>(&response(StatusCode::BAD_GATEWAY, "")).unwrap_err();
        assert!(matches!(err, AppError::Status(StatusCode::BAD_GATEWAY)));

        let err =
            decode_envelope::<u32>(&response(StatusCode::OK, r#"{"code":500,"message":"boom"}"#)).unwrap_err();
        assert!(matches!(err, AppError::Api { code: 500, .. }));

        let err = decode_envelope::<u32>(&response(StatusCode::OK, r#"{"code":200,"data":null}"#)).unwrap_err();
        assert!(matches!(err, AppError::Api { code: 200, .. }));

        let err = decode_envelope::<u32>(&response(StatusCode::OK, "<html>")).unwrap_err();
        assert!(matches!(err, AppError::SerdeJson(_)));
    }
}
