//! HTTP 传输层
//!
//! 持有唯一的 cookie jar，只暴露"发送请求"的能力：
//! - 不认识课程 / 作业
//! - 不判断登录状态
//! - 网络错误按 `RetryPolicy` 重试，HTTP 4xx/5xx 原样返回

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::redirect::Policy;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

pub use reqwest::{Method, StatusCode, Url};

use crate::config::Config;
use crate::error::TransportError;
use crate::infrastructure::retry::{with_retry, AttemptFailure, RetryPolicy};

/// 最多跟随的重定向次数
const MAX_REDIRECTS: usize = 10;

/// 请求体
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// `application/x-www-form-urlencoded`
    Form(Vec<(String, String)>),
    Json(Value),
}

/// 传输层请求
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: Url,
    pub body: Option<RequestBody>,
    pub headers: Vec<(String, String)>,
}

impl TransportRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            body: None,
            headers: Vec::new(),
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post_form<K, V>(url: Url, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::new(Method::POST, url).with_form(fields)
    }

    pub fn patch_form<K, V>(url: Url, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::new(Method::PATCH, url).with_form(fields)
    }

    pub fn with_form<K, V>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.body = Some(RequestBody::Form(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ));
        self
    }

    pub fn with_json(mut self, value: Value) -> Self {
        self.body = Some(RequestBody::Json(value));
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// 表单字段（测试与日志使用）
    pub fn form_value(&self, key: &str) -> Option<&str> {
        match &self.body {
            Some(RequestBody::Form(fields)) => fields
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    pub fn json_body(&self) -> Option<&Value> {
        match &self.body {
            Some(RequestBody::Json(value)) => Some(value),
            _ => None,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// 传输层响应
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: StatusCode,
    /// 跟随重定向之后的最终地址
    pub url: Url,
    /// 是否发生过重定向
    pub redirected: bool,
    pub headers: HeaderMap,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// 最终地址的路径部分
    pub fn path(&self) -> &str {
        self.url.path()
    }
}

/// 传输层抽象
///
/// 会话管理器只依赖此 trait，测试中可替换为脚本化的实现
#[async_trait]
pub trait Transport: Send + Sync {
    /// 发送请求，网络错误已按策略重试
    async fn execute(&self, request: &TransportRequest)
        -> Result<TransportResponse, TransportError>;

    /// 丢弃所有 cookie，开始新的会话
    fn reset_cookies(&self) -> Result<(), TransportError>;

    /// 当前发往 `url` 的 Cookie 请求头
    fn cookie_header(&self, url: &Url) -> Option<String>;
}

struct ClientState {
    client: Client,
    jar: Arc<Jar>,
}

/// 基于 reqwest 的传输层实现
pub struct HttpTransport {
    state: Mutex<ClientState>,
    user_agent: String,
    timeout: Duration,
    retry: RetryPolicy,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Result<Self, TransportError> {
        Self::with_settings(
            &config.user_agent,
            config.request_timeout(),
            RetryPolicy::from_config(config),
        )
    }

    pub fn with_settings(
        user_agent: &str,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, TransportError> {
        let state = build_client(user_agent, timeout)?;
        Ok(Self {
            state: Mutex::new(state),
            user_agent: user_agent.to_string(),
            timeout,
            retry,
        })
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    fn lock_state(&self) -> MutexGuard<'_, ClientState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn header_map(request: &TransportRequest) -> Result<HeaderMap, TransportError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &request.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| TransportError::InvalidHeader { name: name.clone() })?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|_| TransportError::InvalidHeader { name: name.clone() })?;
            headers.insert(header_name, header_value);
        }
        Ok(headers)
    }

    fn build_request(
        client: &Client,
        request: &TransportRequest,
        headers: HeaderMap,
    ) -> reqwest::RequestBuilder {
        let builder = client
            .request(request.method.clone(), request.url.clone())
            .headers(headers);
        match &request.body {
            Some(RequestBody::Form(fields)) => builder.form(fields),
            Some(RequestBody::Json(value)) => builder.json(value),
            None => builder,
        }
    }
}

fn build_client(user_agent: &str, timeout: Duration) -> Result<ClientState, TransportError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/json;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

    let jar = Arc::new(Jar::default());
    let client = Client::builder()
        .user_agent(user_agent)
        .default_headers(headers)
        .cookie_provider(Arc::clone(&jar))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .timeout(timeout)
        .build()
        .map_err(TransportError::Build)?;

    Ok(ClientState { client, jar })
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(
        &self,
        request: &TransportRequest,
    ) -> Result<TransportResponse, TransportError> {
        // Client 内部是 Arc，克隆后立即释放锁
        let client = self.lock_state().client.clone();
        let url = request.url.to_string();

        debug!("🌐 {} {}", request.method, url);

        let headers = Self::header_map(request)?;
        let (status, final_url, headers, body) = with_retry(&self.retry, &url, |_| {
            let builder = Self::build_request(&client, request, headers.clone());
            async move {
                let response = builder.send().await?;
                let status = response.status();
                let final_url = response.url().clone();
                let headers = response.headers().clone();
                let body = response.text().await?;
                Ok::<_, AttemptFailure>((status, final_url, headers, body))
            }
        })
        .await?;

        let redirected = final_url != request.url;
        debug!(
            "📥 {} {} -> {}{}",
            request.method,
            url,
            status,
            if redirected {
                format!(" (重定向到 {})", final_url)
            } else {
                String::new()
            }
        );

        Ok(TransportResponse {
            status,
            url: final_url,
            redirected,
            headers,
            body,
        })
    }

    fn reset_cookies(&self) -> Result<(), TransportError> {
        let fresh = build_client(&self.user_agent, self.timeout)?;
        *self.lock_state() = fresh;
        debug!("🍪 已重置 cookie");
        Ok(())
    }

    fn cookie_header(&self, url: &Url) -> Option<String> {
        let jar = Arc::clone(&self.lock_state().jar);
        jar.cookies(url)
            .and_then(|value| value.to_str().ok().map(str::to_string))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_request_builders() {
        let req = TransportRequest::post_form(
            url("https://www.gradescope.com/login"),
            [("session[email]", "a@b.c"), ("commit", "Log In")],
        )
        .with_header("X-CSRF-Token", "tok");

        assert_eq!(req.method, Method::POST);
        assert_eq!(req.form_value("commit"), Some("Log In"));
        assert_eq!(req.form_value("missing"), None);
        assert_eq!(req.header("x-csrf-token"), Some("tok"));
    }

    #[test]
    fn test_invalid_header_is_rejected() {
        let transport =
            HttpTransport::with_settings("test-agent", Duration::from_secs(1), RetryPolicy::none())
                .unwrap();
        let req = TransportRequest::get(url("https://www.gradescope.com/"))
            .with_header("bad header", "x");

        let err = tokio_test::block_on(transport.execute(&req)).unwrap_err();
        assert!(matches!(err, TransportError::InvalidHeader { .. }));
    }

    #[test]
    fn test_reset_cookies_clears_jar() {
        let transport =
            HttpTransport::with_settings("test-agent", Duration::from_secs(1), RetryPolicy::none())
                .unwrap();
        let site = url("https://www.gradescope.com/");
        transport
            .lock_state()
            .jar
            .add_cookie_str("_gradescope_session=abc; Path=/", &site);
        assert!(transport
            .cookie_header(&site)
            .unwrap()
            .contains("_gradescope_session=abc"));

        transport.reset_cookies().unwrap();
        assert_eq!(transport.cookie_header(&site), None);
    }
}
