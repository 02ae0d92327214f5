use crate::error::ProbeFailure;
use crate::extract::extract_links;
use crate::policy::RequestPolicy;
use crate::result::ProbeResult;
use crate::transport::Transport;
use std::collections::HashSet;
use tokio::time::Instant;
use tracing::debug;
use url::Url;

/// A matched response plus any same-origin links scraped from it.
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    pub result: ProbeResult,
    pub links: HashSet<Url>,
}

/// Send one request for `path` and classify the answer.
///
/// `Ok(None)` means the server answered with a status outside the match
/// set. Retrying is the caller's business; this is always a single attempt.
pub async fn probe(
    transport: &dyn Transport,
    policy: &RequestPolicy,
    path: &str,
    user_agent: &str,
) -> Result<Option<ProbeOutcome>, ProbeFailure> {
    let url = policy.join(path);

    let start = Instant::now();
    let response = tokio::time::timeout(policy.timeout(), transport.send(&url, user_agent))
        .await
        .map_err(|_| ProbeFailure::Timeout)??;
    let elapsed = start.elapsed();

    debug!("{} {} -> {} in {:?}", policy.method(), url, response.status_code, elapsed);

    if !policy.is_match(response.status_code) {
        return Ok(None);
    }

    let links = if policy.crawl() && response.status_code == 200 && response.is_html() {
        match Url::parse(&url) {
            Ok(source) => extract_links(&String::from_utf8_lossy(&response.body), &source),
            Err(_) => HashSet::new(),
        }
    } else {
        HashSet::new()
    };

    let result = ProbeResult {
        url,
        status_code: response.status_code,
        elapsed,
        content_length: response.body.len() as u64,
        content_type: response.content_type,
    };

    Ok(Some(ProbeOutcome { result, links }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{RawResponse, ReqwestTransport};
    use async_trait::async_trait;
    use std::time::Duration;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    struct Hang;

    #[async_trait]
    impl Transport for Hang {
        async fn send(&self, _url: &str, _ua: &str) -> Result<RawResponse, ProbeFailure> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(RawResponse {
                status_code: 200,
                content_type: None,
                body: Vec::new(),
            })
        }
    }

    async fn html_server() -> MockServer {
        let mock_server = MockServer::start().await;

        let page = format!(
            r#"<html><body><a href="/secret">s</a><a href="{}/other">o</a></body></html>"#,
            mock_server.uri()
        );
        Mock::given(method("GET"))
            .and(path("/admin"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(page, "text/html"),
            )
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
            .mount(&mock_server)
            .await;

        mock_server
    }

    #[tokio::test]
    async fn test_match_reports_body_length_and_type() {
        let mock_server = html_server().await;
        let policy = RequestPolicy::builder(mock_server.uri()).build().unwrap();
        let transport = ReqwestTransport::new(&policy).unwrap();

        let outcome = probe(&transport, &policy, "admin", "ua").await.unwrap().unwrap();

        assert_eq!(outcome.result.url, format!("{}/admin", mock_server.uri()));
        assert_eq!(outcome.result.status_code, 200);
        assert!(outcome.result.content_length > 0);
        assert_eq!(outcome.result.content_type.as_deref(), Some("text/html"));
        // crawl disabled, so nothing is scraped
        assert!(outcome.links.is_empty());
    }

    #[tokio::test]
    async fn test_filtered_status_is_not_an_error() {
        let mock_server = html_server().await;
        let policy = RequestPolicy::builder(mock_server.uri())
            .match_codes([200, 301, 403])
            .build()
            .unwrap();
        let transport = ReqwestTransport::new(&policy).unwrap();

        let outcome = probe(&transport, &policy, "/missing", "ua").await.unwrap();
        assert!(outcome.is_none());
    }

    #[tokio::test]
    async fn test_crawl_mode_returns_links() {
        let mock_server = html_server().await;
        let policy = RequestPolicy::builder(mock_server.uri())
            .crawl(true)
            .build()
            .unwrap();
        let transport = ReqwestTransport::new(&policy).unwrap();

        let outcome = probe(&transport, &policy, "admin", "ua").await.unwrap().unwrap();
        let mut links: Vec<String> = outcome.links.into_iter().map(String::from).collect();
        links.sort();
        assert_eq!(
            links,
            vec![
                format!("{}/other", mock_server.uri()),
                format!("{}/secret", mock_server.uri()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_policy_timeout_bounds_the_transport() {
        let policy = RequestPolicy::builder("http://example.test")
            .timeout_secs(2.0)
            .build()
            .unwrap();

        let failure = probe(&Hang, &policy, "admin", "ua").await.unwrap_err();
        assert_eq!(failure, ProbeFailure::Timeout);
    }
}
