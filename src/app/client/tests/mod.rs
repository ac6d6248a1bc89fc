//! HTTP fetcher tests against a local mock origin

use url::Url;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

use super::*;

fn fetcher_for(server: &MockServer) -> HttpFetcher {
    let config = ClientConfig::default()
        .with_base_url(server.uri())
        .with_rate_limit(50);
    HttpFetcher::new(&config).unwrap()
}

fn url(server: &MockServer, p: &str) -> Url {
    Url::parse(&format!("{}{}", server.uri(), p)).unwrap()
}

/// A 200 response yields the page body
#[tokio::test]
async fn test_fetch_returns_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/60-Day-Notice-2020-00001"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>notice</html>"))
        .mount(&server)
        .await;

    let fetcher = fetcher_for(&server);
    let body = fetcher
        .fetch(&url(&server, "/60-Day-Notice-2020-00001"))
        .await
        .unwrap();
    assert_eq!(body, "<html>notice</html>");
}

/// 404 is reported as absent rather than transient
#[tokio::test]
async fn test_fetch_missing_page_is_absent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let fetcher = fetcher_for(&server);
    let err = fetcher
        .fetch(&url(&server, "/60-Day-Notice-2020-09999"))
        .await
        .unwrap_err();
    assert!(err.is_absent());
}

/// Server errors are transient
#[tokio::test]
async fn test_fetch_server_error_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let fetcher = fetcher_for(&server);
    let err = fetcher
        .fetch(&url(&server, "/60-Day-Notice-2020-00002"))
        .await
        .unwrap_err();
    assert!(err.is_transient());
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = ClientConfig::default().with_rate_limit(0);
    assert!(HttpFetcher::new(&config).is_err());
}
