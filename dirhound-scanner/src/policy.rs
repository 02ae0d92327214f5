use crate::error::{Result, ScanError};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

pub const DEFAULT_MATCH_CODES: [u16; 11] = [200, 201, 202, 203, 204, 301, 302, 307, 308, 401, 403];
pub const DEFAULT_TIMEOUT_SECS: f64 = 10.0;
pub const DEFAULT_CONCURRENCY: usize = 10;
pub const DEFAULT_CRAWL_DEPTH: usize = 2;
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Head,
    Put,
    Delete,
    Patch,
    Options,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Head => "HEAD",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Options => "OPTIONS",
        }
    }

    pub(crate) fn to_reqwest(self) -> reqwest::Method {
        match self {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Head => reqwest::Method::HEAD,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Options => reqwest::Method::OPTIONS,
        }
    }
}

impl FromStr for HttpMethod {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "HEAD" => Ok(HttpMethod::Head),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            "PATCH" => Ok(HttpMethod::Patch),
            "OPTIONS" => Ok(HttpMethod::Options),
            other => Err(ScanError::Config(format!(
                "unsupported HTTP method '{}' (allowed: GET, POST, HEAD, PUT, DELETE, PATCH, OPTIONS)",
                other
            ))),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated, read-only settings shared by every probe of a run.
///
/// Only [`RequestPolicyBuilder::build`] produces one, so anything holding a
/// `RequestPolicy` can trust its contents.
#[derive(Debug, Clone)]
pub struct RequestPolicy {
    base_url: String,
    method: HttpMethod,
    timeout: Duration,
    follow_redirects: bool,
    match_codes: BTreeSet<u16>,
    cookies: BTreeMap<String, String>,
    proxy: Option<Url>,
    headers: BTreeMap<String, String>,
    retries: usize,
    retry_backoff: Duration,
    rate_limit: Option<f64>,
    concurrency: usize,
    crawl: bool,
    crawl_depth: usize,
}

impl RequestPolicy {
    pub fn builder(base_url: impl Into<String>) -> RequestPolicyBuilder {
        RequestPolicyBuilder::new(base_url)
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn follow_redirects(&self) -> bool {
        self.follow_redirects
    }

    pub fn match_codes(&self) -> &BTreeSet<u16> {
        &self.match_codes
    }

    pub fn is_match(&self, status_code: u16) -> bool {
        self.match_codes.contains(&status_code)
    }

    pub fn cookies(&self) -> &BTreeMap<String, String> {
        &self.cookies
    }

    /// The cookie jar rendered as a single `Cookie` header value.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        let pairs: Vec<String> = self
            .cookies
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        Some(pairs.join("; "))
    }

    pub fn proxy(&self) -> Option<&Url> {
        self.proxy.as_ref()
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn retries(&self) -> usize {
        self.retries
    }

    pub fn retry_backoff(&self) -> Duration {
        self.retry_backoff
    }

    pub fn rate_limit(&self) -> Option<f64> {
        self.rate_limit
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn crawl(&self) -> bool {
        self.crawl
    }

    pub fn crawl_depth(&self) -> usize {
        self.crawl_depth
    }

    /// Join a candidate path onto the base URL with exactly one slash between them.
    pub fn join(&self, path: &str) -> String {
        join_path(&self.base_url, path)
    }
}

pub fn join_path(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim().trim_start_matches('/')
    )
}

pub struct RequestPolicyBuilder {
    base_url: String,
    method: HttpMethod,
    timeout_secs: f64,
    follow_redirects: bool,
    match_codes: BTreeSet<u16>,
    cookies: BTreeMap<String, String>,
    proxy: Option<String>,
    headers: BTreeMap<String, String>,
    retries: usize,
    retry_backoff: Duration,
    rate_limit: Option<f64>,
    concurrency: usize,
    crawl: bool,
    crawl_depth: usize,
}

impl RequestPolicyBuilder {
    fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            method: HttpMethod::Get,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            follow_redirects: false,
            match_codes: DEFAULT_MATCH_CODES.into_iter().collect(),
            cookies: BTreeMap::new(),
            proxy: None,
            headers: BTreeMap::new(),
            retries: 0,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            rate_limit: None,
            concurrency: DEFAULT_CONCURRENCY,
            crawl: false,
            crawl_depth: DEFAULT_CRAWL_DEPTH,
        }
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    pub fn timeout_secs(mut self, secs: f64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }

    pub fn match_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.match_codes = codes.into_iter().collect();
        self
    }

    pub fn cookies(mut self, cookies: BTreeMap<String, String>) -> Self {
        self.cookies = cookies;
        self
    }

    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    pub fn proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers.extend(headers);
        self
    }

    pub fn retries(mut self, retries: usize) -> Self {
        self.retries = retries;
        self
    }

    pub fn retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    pub fn rate_limit(mut self, per_second: Option<f64>) -> Self {
        self.rate_limit = per_second;
        self
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn crawl(mut self, enabled: bool) -> Self {
        self.crawl = enabled;
        self
    }

    pub fn crawl_depth(mut self, depth: usize) -> Self {
        self.crawl_depth = depth;
        self
    }

    pub fn build(self) -> Result<RequestPolicy> {
        let base_url = normalize_base_url(&self.base_url)?;

        if !self.timeout_secs.is_finite() || self.timeout_secs <= 0.0 {
            return Err(ScanError::Config(format!(
                "timeout must be a positive number of seconds, got {}",
                self.timeout_secs
            )));
        }
        let timeout = Duration::try_from_secs_f64(self.timeout_secs).map_err(|_| {
            ScanError::Config(format!("timeout of {} seconds is too large", self.timeout_secs))
        })?;

        if self.concurrency == 0 {
            return Err(ScanError::Config("concurrency must be at least 1".to_string()));
        }

        if let Some(rate) = self.rate_limit {
            if !rate.is_finite() || rate <= 0.0 {
                return Err(ScanError::Config(format!(
                    "rate limit must be a positive number of requests per second, got {}",
                    rate
                )));
            }
            rate_interval(rate)?;
        }

        if let Some(code) = self.match_codes.iter().find(|c| !(100..=599).contains(*c)) {
            return Err(ScanError::Config(format!(
                "status code {} is outside 100-599",
                code
            )));
        }

        for (name, value) in &self.headers {
            reqwest::header::HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ScanError::Config(format!("invalid header name '{}'", name)))?;
            reqwest::header::HeaderValue::from_str(value).map_err(|_| {
                ScanError::Config(format!("invalid value for header '{}'", name))
            })?;
        }

        let proxy = match self.proxy {
            Some(raw) => Some(
                Url::parse(&raw)
                    .map_err(|e| ScanError::Config(format!("invalid proxy '{}': {}", raw, e)))?,
            ),
            None => None,
        };

        Ok(RequestPolicy {
            base_url,
            method: self.method,
            timeout,
            follow_redirects: self.follow_redirects,
            match_codes: self.match_codes,
            cookies: self.cookies,
            proxy,
            headers: self.headers,
            retries: self.retries,
            retry_backoff: self.retry_backoff,
            rate_limit: self.rate_limit,
            concurrency: self.concurrency,
            crawl: self.crawl,
            crawl_depth: self.crawl_depth,
        })
    }
}

/// Spacing between requests for a rate in requests per second.
pub fn rate_interval(rate: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(1.0 / rate).map_err(|_| {
        ScanError::Config(format!("rate limit of {} requests per second is too low", rate))
    })
}

/// Parse the target, adding `http://` when no scheme is given, and drop any
/// trailing slash, query or fragment.
pub fn normalize_base_url(raw: &str) -> Result<String> {
    let raw = raw.trim();
    let with_scheme = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("http://{}", raw)
    };

    let mut url = Url::parse(&with_scheme)
        .map_err(|e| ScanError::InvalidUrl(format!("'{}': {}", raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ScanError::InvalidUrl(format!(
            "'{}': only http and https are supported",
            raw
        )));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ScanError::InvalidUrl(format!("'{}': missing host", raw)));
    }

    url.set_query(None);
    url.set_fragment(None);

    Ok(url.as_str().trim_end_matches('/').to_string())
}

/// Parse `200,301, 403` into a set of status codes.
pub fn parse_match_codes(raw: &str) -> Result<BTreeSet<u16>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u16>()
                .map_err(|_| ScanError::Config(format!("invalid status code '{}'", s)))
        })
        .collect()
}

/// Parse `a=1,b=2` or `a=1; b=2` into a cookie map.
pub fn parse_cookies(raw: &str) -> Result<BTreeMap<String, String>> {
    let mut cookies = BTreeMap::new();
    for pair in raw.split([',', ';']).map(str::trim).filter(|s| !s.is_empty()) {
        let (name, value) = pair
            .split_once('=')
            .ok_or_else(|| ScanError::Config(format!("invalid cookie '{}', expected key=value", pair)))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(ScanError::Config(format!("cookie '{}' has no name", pair)));
        }
        cookies.insert(name.to_string(), value.trim().to_string());
    }
    Ok(cookies)
}

/// Parse a `Name: value` header argument.
pub fn parse_header(raw: &str) -> Result<(String, String)> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| ScanError::Config(format!("invalid header '{}', expected 'Name: value'", raw)))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(ScanError::Config(format!("header '{}' has no name", raw)));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let policy = RequestPolicy::builder("http://example.test").build().unwrap();
        assert_eq!(policy.base_url(), "http://example.test");
        assert_eq!(policy.method(), HttpMethod::Get);
        assert_eq!(policy.timeout(), Duration::from_secs(10));
        assert_eq!(policy.concurrency(), 10);
        assert_eq!(policy.retries(), 0);
        assert!(policy.is_match(200));
        assert!(policy.is_match(403));
        assert!(!policy.is_match(404));
        assert!(!policy.crawl());
        assert!(policy.rate_limit().is_none());
    }

    #[test]
    fn test_base_url_normalization() {
        assert_eq!(normalize_base_url("http://example.test/").unwrap(), "http://example.test");
        assert_eq!(normalize_base_url("example.test").unwrap(), "http://example.test");
        assert_eq!(
            normalize_base_url("https://example.test:8443/app/?q=1#x").unwrap(),
            "https://example.test:8443/app"
        );
        assert!(normalize_base_url("ftp://example.test").is_err());
        assert!(normalize_base_url("http://").is_err());
    }

    #[test]
    fn test_join_single_slash() {
        let policy = RequestPolicy::builder("http://example.test/").build().unwrap();
        assert_eq!(policy.join("admin"), "http://example.test/admin");
        assert_eq!(policy.join("/admin"), "http://example.test/admin");
        assert_eq!(policy.join("//admin/"), "http://example.test/admin/");
        assert_eq!(join_path("http://example.test/api", "v1"), "http://example.test/api/v1");
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!("get".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!("Patch".parse::<HttpMethod>().unwrap(), HttpMethod::Patch);
        assert!("TRACE".parse::<HttpMethod>().is_err());
        assert_eq!(HttpMethod::Delete.to_string(), "DELETE");
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(RequestPolicy::builder("http://x.test").timeout_secs(0.0).build().is_err());
        assert!(RequestPolicy::builder("http://x.test").timeout_secs(f64::NAN).build().is_err());
        assert!(RequestPolicy::builder("http://x.test").concurrency(0).build().is_err());
        assert!(RequestPolicy::builder("http://x.test").rate_limit(Some(0.0)).build().is_err());
        assert!(RequestPolicy::builder("http://x.test").match_codes([200, 999]).build().is_err());
        assert!(RequestPolicy::builder("http://x.test").header("bad header", "v").build().is_err());
        assert!(
            RequestPolicy::builder("http://x.test")
                .proxy(Some("not a proxy".to_string()))
                .build()
                .is_err()
        );
    }

    #[test]
    fn test_out_of_range_durations_are_config_errors() {
        let err = RequestPolicy::builder("http://x.test")
            .timeout_secs(1e30)
            .build()
            .unwrap_err();
        assert!(matches!(err, ScanError::Config(ref msg) if msg.contains("too large")));

        let err = RequestPolicy::builder("http://x.test")
            .rate_limit(Some(1e-30))
            .build()
            .unwrap_err();
        assert!(matches!(err, ScanError::Config(ref msg) if msg.contains("too low")));

        let policy = RequestPolicy::builder("http://x.test")
            .timeout_secs(86_400.0)
            .rate_limit(Some(0.001))
            .build()
            .unwrap();
        assert_eq!(policy.timeout(), Duration::from_secs(86_400));
        assert_eq!(rate_interval(0.001).unwrap(), Duration::from_secs(1000));
    }

    #[test]
    fn test_empty_match_codes_rejects_everything() {
        let policy = RequestPolicy::builder("http://x.test")
            .match_codes(Vec::new())
            .build()
            .unwrap();
        assert!(!policy.is_match(200));
    }

    #[test]
    fn test_cookie_header() {
        let policy = RequestPolicy::builder("http://x.test")
            .cookie("session", "abc")
            .cookie("lang", "en")
            .build()
            .unwrap();
        assert_eq!(policy.cookie_header().unwrap(), "lang=en; session=abc");

        let bare = RequestPolicy::builder("http://x.test").build().unwrap();
        assert!(bare.cookie_header().is_none());
    }

    #[test]
    fn test_parse_helpers() {
        let codes = parse_match_codes("200, 301,403,").unwrap();
        assert_eq!(codes.into_iter().collect::<Vec<_>>(), vec![200, 301, 403]);
        assert!(parse_match_codes("200,abc").is_err());

        let cookies = parse_cookies("a=1,b=2; c = 3").unwrap();
        assert_eq!(cookies.get("a").unwrap(), "1");
        assert_eq!(cookies.get("c").unwrap(), "3");
        assert!(parse_cookies("novalue").is_err());

        let (name, value) = parse_header("X-Api-Key: secret:with:colons").unwrap();
        assert_eq!(name, "X-Api-Key");
        assert_eq!(value, "secret:with:colons");
        assert!(parse_header("nocolon").is_err());
    }
}
