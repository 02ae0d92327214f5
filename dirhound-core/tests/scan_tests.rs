// End-to-end scans through the console front end against a mock server

use dirhound_core::scan::{ScanOptions, execute_scan, format_match};
use dirhound_scanner::{CancelSignal, ProbeResult, RequestPolicy, ScanPhase};
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_execute_scan_filters_and_collects() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let policy = RequestPolicy::builder(server.uri())
        .match_codes([200, 403])
        .concurrency(2)
        .build()
        .unwrap();

    let report = execute_scan(
        ScanOptions {
            policy,
            wordlist: vec!["admin".into(), "login".into(), "missing".into()],
            user_agents: Vec::new(),
            show_progress: false,
        },
        CancelSignal::new(),
    )
    .await
    .unwrap();

    assert_eq!(report.phase, ScanPhase::Completed);
    assert_eq!(report.failed, 0);
    assert_eq!(report.probed, 3);
    assert_eq!(report.results.len(), 2);
    let found: Vec<(String, u16)> = report
        .results
        .sorted()
        .iter()
        .map(|r| (r.url.clone(), r.status_code))
        .collect();
    assert_eq!(
        found,
        vec![
            (format!("{}/admin", server.uri()), 200),
            (format!("{}/login", server.uri()), 403),
        ]
    );
}

#[tokio::test]
async fn test_execute_scan_rotates_given_user_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin"))
        .and(header("user-agent", "dirhound-test/1.0"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let policy = RequestPolicy::builder(server.uri()).build().unwrap();
    let report = execute_scan(
        ScanOptions {
            policy,
            wordlist: vec!["admin".into()],
            user_agents: vec!["dirhound-test/1.0".into()],
            show_progress: false,
        },
        CancelSignal::new(),
    )
    .await
    .unwrap();

    assert_eq!(report.results.len(), 1);
}

#[tokio::test]
async fn test_execute_scan_pre_cancelled_returns_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let cancel = CancelSignal::new();
    cancel.cancel();

    let policy = RequestPolicy::builder(server.uri()).build().unwrap();
    let report = execute_scan(
        ScanOptions {
            policy,
            wordlist: vec!["a".into(), "b".into()],
            user_agents: Vec::new(),
            show_progress: false,
        },
        cancel,
    )
    .await
    .unwrap();

    assert_eq!(report.phase, ScanPhase::Cancelled);
    assert!(report.results.is_empty());
}

#[test]
fn test_format_match_line() {
    colored::control::set_override(false);
    let line = format_match(&ProbeResult {
        url: "http://example.test/admin".to_string(),
        status_code: 200,
        elapsed: Duration::from_millis(1500),
        content_length: 2048,
        content_type: None,
    });
    assert_eq!(line, "[200]   1.500s      2048B  http://example.test/admin");
}
