//! Shared fixtures for pipeline tests: a mock notice origin and page markup

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use notice_harvester::app::{
    ClientConfig, Coordinator, CoordinatorConfig, HttpFetcher, NoticeId, NoticePageExtractor,
};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

pub const YEAR: u16 = 2020;

/// Base URL of the notice origin served by `server`
pub fn base_url(server: &MockServer) -> String {
    format!("{}/prop65", server.uri())
}

pub fn notice_url(server: &MockServer, sequence: u32) -> String {
    NoticeId::new(YEAR, sequence).url(&base_url(server))
}

/// Minimal notice page with one settlement section
pub fn notice_page(sequence: u32, chemical: &str, penalty: &str) -> String {
    format!(
        r#"<html><body>
        <div class="field"><div class="field-label">AG Number:</div><div class="field-items">{year}-{seq:05}</div></div>
        <div class="field"><div class="field-label">Date Filed:</div><div class="field-items">01/02/{year}</div></div>
        <div class="field"><div class="field-label">Noticing Party:</div><div class="field-items">Consumer Advocacy Group</div></div>
        <div class="field"><div class="field-label">Chemicals:</div><div class="field-items">{chemical}</div></div>
        <div class="title">Settlement</div>
        <div class="section">
          <div class="field-label">Settlement Date:</div><div>03/04/{year}</div>
          <div class="details-label"><div class="details">Non-Contingent Civil Penalty:</div> {penalty}</div>
        </div>
        </body></html>"#,
        year = YEAR,
        seq = sequence,
        chemical = chemical,
        penalty = penalty,
    )
}

/// Serve `html` for notice `sequence`; unknown notices answer 404
pub async fn mount_notice(server: &MockServer, sequence: u32, html: String) {
    Mock::given(method("GET"))
        .and(path(format!(
            "/prop65/60-Day-Notice-{}-{:05}",
            YEAR, sequence
        )))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .mount(server)
        .await;
}

/// Coordinator harvesting from `server` and writing into `dir`
pub fn coordinator(
    server: &MockServer,
    dir: &Path,
) -> Coordinator<HttpFetcher, NoticePageExtractor> {
    with_config(server, CoordinatorConfig::for_testing(dir))
}

/// Coordinator writing its output to `dir/file_name`
pub fn coordinator_writing(
    server: &MockServer,
    dir: &Path,
    file_name: &str,
) -> Coordinator<HttpFetcher, NoticePageExtractor> {
    with_config(
        server,
        CoordinatorConfig::for_testing(dir).with_output_path(dir.join(file_name)),
    )
}

fn with_config(
    server: &MockServer,
    config: CoordinatorConfig,
) -> Coordinator<HttpFetcher, NoticePageExtractor> {
    let client = ClientConfig::default()
        .with_base_url(base_url(server))
        .with_rate_limit(50);
    let config = config.with_base_url(base_url(server));

    Coordinator::new(
        config,
        Arc::new(HttpFetcher::new(&client).unwrap()),
        Arc::new(NoticePageExtractor::new().unwrap()),
    )
}
