use course_platform::{ContentFetcher, Error};
use reqwest::Client;
use serde_json::{json, Value};
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher(server: &MockServer) -> ContentFetcher {
    ContentFetcher::new(Client::new(), Url::parse(&server.uri()).unwrap()).with_asset_scheme("http:")
}

/// Asset descriptor pointing at the mock server with a protocol-relative url.
fn asset(server: &MockServer, file_name: &str) -> Value {
    let host = server.uri().trim_start_matches("http:").to_owned();

    json!({
        "sys": { "type": "Asset" },
        "fields": {
            "title": file_name,
            "file": { "url": format!("{host}/assets/{file_name}"), "fileName": file_name }
        }
    })
}

async fn serve_asset(server: &MockServer, file_name: &str, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/assets/{file_name}")))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn fetch_file_downloads_and_tags_language() {
    let server = MockServer::start().await;
    serve_asset(&server, "lib.rs", 200, "pub fn answer() -> u32 { 42 }").await;
    serve_asset(&server, "step.diff", 200, "+ added").await;
    serve_asset(&server, "Dockerfile", 200, "FROM rust").await;

    let fetcher = fetcher(&server);

    let file = fetcher.fetch_file(&asset(&server, "lib.rs")).await.unwrap();
    assert_eq!(file.file_name, "lib.rs");
    assert_eq!(file.code, "pub fn answer() -> u32 { 42 }");
    assert_eq!(file.language, "rust");

    let diff = fetcher.fetch_file(&asset(&server, "step.diff")).await.unwrap();
    assert_eq!(diff.language, "diff");

    let other = fetcher.fetch_file(&asset(&server, "Dockerfile")).await.unwrap();
    assert_eq!(other.language, "text");
}

#[tokio::test]
async fn fetch_file_reports_bad_descriptor_and_status() {
    let server = MockServer::start().await;
    serve_asset(&server, "gone.rs", 404, "").await;

    let fetcher = fetcher(&server);

    assert!(matches!(
        fetcher.fetch_file(&json!({ "sys": {} })).await,
        Err(Error::InvalidDescriptor(_))
    ));
    assert!(matches!(
        fetcher.fetch_file(&asset(&server, "gone.rs")).await,
        Err(Error::HttpStatus(status)) if status.as_u16() == 404
    ));
}

#[tokio::test]
async fn failing_group_degrades_to_empty() {
    let server = MockServer::start().await;
    serve_asset(&server, "main.ts", 200, "export const x = 1;").await;
    serve_asset(&server, "solution.ts", 500, "").await;

    let entry = json!({
        "fields": {
            "source": [asset(&server, "main.ts")],
            "template": null,
            "solution": [asset(&server, "main.ts"), asset(&server, "solution.ts")]
        }
    });

    let files = fetcher(&server).files_for_chapter(&entry).await.unwrap();

    assert_eq!(files.source.len(), 1);
    assert_eq!(files.source[0].language, "typescript");
    assert!(files.template.is_empty());
    assert!(files.solution.is_empty());
}

#[tokio::test]
async fn chapter_without_fields_is_an_error() {
    let server = MockServer::start().await;

    let result = fetcher(&server).files_for_chapter(&json!({ "sys": {} })).await;

    assert!(matches!(result, Err(Error::InvalidDescriptor(_))));
}

#[tokio::test]
async fn course_details_query_the_content_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/get-content"))
        .and(query_param("type", "courseModule"))
        .and(query_param("slug", "rust-basics"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "fields": { "slug": "rust-basics" } })),
        )
        .expect(2)
        .mount(&server)
        .await;

    let fetcher = fetcher(&server);

    for _ in 0..2 {
        let details = fetcher.course_details("rust-basics").await.unwrap();
        assert_eq!(details["fields"]["slug"], "rust-basics");
    }
}
