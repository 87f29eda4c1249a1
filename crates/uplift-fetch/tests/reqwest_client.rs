//! `ReqwestClient` against a local mock server.

use std::time::Duration;

use uplift_fetch::{FetchOptions, Fetcher, HttpClient, ReqwestClient};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn get_follows_redirects_and_reports_final_url() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/o/r/releases/latest"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", format!("{}/o/r/releases/tag/v1.2.0", server.uri())),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/o/r/releases/tag/v1.2.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string("release page"))
        .mount(&server)
        .await;

    let client = ReqwestClient::new().unwrap();
    let response = client
        .get(&format!("{}/o/r/releases/latest", server.uri()), &[])
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert!(response.final_url.ends_with("/o/r/releases/tag/v1.2.0"));
    assert_eq!(&response.body[..], b"release page");
}

#[tokio::test]
async fn head_does_not_follow_redirects() {
    let server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/archive.zip"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", format!("{}/gone", server.uri())),
        )
        .mount(&server)
        .await;

    let client = ReqwestClient::new().unwrap();
    let status = client
        .head(&format!("{}/archive.zip", server.uri()), &[])
        .await
        .unwrap();

    assert_eq!(status, 302);
}

#[tokio::test]
async fn fetcher_sends_headers_and_writes_file() {
    let server = MockServer::start().await;
    let body = vec![42u8; 20_000];

    Mock::given(method("GET"))
        .and(path("/asset.zip"))
        .and(header("Accept", "application/octet-stream"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("asset.zip");
    let options = FetchOptions::default()
        .timeout(Duration::from_secs(5))
        .header("Accept", "application/octet-stream");

    let fetcher = Fetcher::new(ReqwestClient::new().unwrap());
    let written = fetcher
        .fetch(&format!("{}/asset.zip", server.uri()), &dest, &options)
        .await
        .unwrap();

    assert_eq!(written, body.len() as u64);
    assert_eq!(std::fs::read(&dest).unwrap(), body);
}
