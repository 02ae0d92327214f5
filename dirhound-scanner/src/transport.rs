use crate::error::{ProbeFailure, Result};
use crate::policy::RequestPolicy;
use async_trait::async_trait;
use reqwest::header::{COOKIE, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::{Client, Method};
use std::time::Duration;
use tracing::debug;

/// A fully read HTTP response.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status_code: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("text/html"))
    }
}

/// Sends one request and reads the whole body.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, url: &str, user_agent: &str) -> std::result::Result<RawResponse, ProbeFailure>;
}

/// `reqwest` transport configured once from a [`RequestPolicy`].
pub struct ReqwestTransport {
    client: Client,
    method: Method,
    user_agent_fixed: bool,
}

impl ReqwestTransport {
    pub fn new(policy: &RequestPolicy) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        for (name, value) in policy.headers() {
            // validated by the policy builder
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                default_headers.insert(name, value);
            }
        }
        if let Some(cookie) = policy.cookie_header()
            && let Ok(value) = HeaderValue::from_str(&cookie)
        {
            default_headers.insert(COOKIE, value);
        }
        let user_agent_fixed = default_headers.contains_key(USER_AGENT);

        let redirect = if policy.follow_redirects() {
            reqwest::redirect::Policy::limited(10)
        } else {
            reqwest::redirect::Policy::none()
        };

        let mut builder = Client::builder()
            .timeout(policy.timeout())
            .connect_timeout(policy.timeout())
            .pool_max_idle_per_host(policy.concurrency())
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .danger_accept_invalid_certs(true)
            .redirect(redirect)
            .default_headers(default_headers);

        if let Some(proxy) = policy.proxy() {
            builder = builder.proxy(reqwest::Proxy::all(proxy.as_str())?);
        }

        debug!(
            "HTTP transport ready: {} with timeout {:?}, redirects {}",
            policy.method(),
            policy.timeout(),
            if policy.follow_redirects() { "followed" } else { "not followed" }
        );

        Ok(Self {
            client: builder.build()?,
            method: policy.method().to_reqwest(),
            user_agent_fixed,
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, url: &str, user_agent: &str) -> std::result::Result<RawResponse, ProbeFailure> {
        let mut request = self.client.request(self.method.clone(), url);
        if !self.user_agent_fixed {
            request = request.header(USER_AGENT, user_agent);
        }

        let response = request.send().await?;
        let status_code = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body = response.bytes().await?.to_vec();

        Ok(RawResponse {
            status_code,
            content_type,
            body,
        })
    }
}
