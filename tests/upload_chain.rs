use httpmock::prelude::*;
use qrforge::config::ServiceEntry;
use qrforge::upload::{EXHAUSTED_MESSAGE, HttpUploadService, ResponseShape, build_client};
use qrforge::{Error, UploadChain, UploadOptions, UploadService};
use std::time::Duration;

fn build_chain(services: Vec<HttpUploadService>, timeout_secs: u64) -> UploadChain {
    let options = UploadOptions {
        timeout_secs,
        ..UploadOptions::default()
    };
    let client = build_client(&options).expect("build client");
    let services = services
        .into_iter()
        .map(|service| Box::new(service) as Box<dyn UploadService>)
        .collect();
    UploadChain::new(client, services)
}

#[tokio::test]
async fn test_first_service_json_success() {
    let server = MockServer::start();
    let file_io = server.mock(|when, then| {
        when.method(POST)
            .path("/fileio")
            .body_contains("name=\"file\"")
            .body_contains("filename=\"content.txt\"")
            .body_contains("hello cloud");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({
                "success": true,
                "link": "https://file.io/abc123",
                "key": "abc123"
            }));
    });
    let zero = server.mock(|when, then| {
        when.method(POST).path("/0x0");
        then.status(200).body("https://0x0.st/unused.txt\n");
    });

    let chain = build_chain(
        vec![
            HttpUploadService::new("file.io", server.url("/fileio"), "file", ResponseShape::Json),
            HttpUploadService::new("0x0.st", server.url("/0x0"), "file", ResponseShape::Text),
        ],
        5,
    );

    let result = chain.upload("hello cloud").await.unwrap();

    file_io.assert();
    zero.assert_hits(0);
    assert_eq!(result.service_name, "file.io");
    assert_eq!(result.link, "https://file.io/abc123");
}

#[tokio::test]
async fn test_status_failure_falls_back_to_text_service() {
    let server = MockServer::start();
    let file_io = server.mock(|when, then| {
        when.method(POST).path("/fileio");
        then.status(503);
    });
    let zero = server.mock(|when, then| {
        when.method(POST).path("/0x0").body_contains("payload body");
        then.status(200).body("https://0x0.st/Hk3a.txt\n");
    });

    let chain = build_chain(
        vec![
            HttpUploadService::new("file.io", server.url("/fileio"), "file", ResponseShape::Json),
            HttpUploadService::new("0x0.st", server.url("/0x0"), "file", ResponseShape::Text),
        ],
        5,
    );

    let result = chain.upload("payload body").await.unwrap();

    file_io.assert();
    zero.assert();
    assert_eq!(result.service_name, "0x0.st");
    assert_eq!(result.link, "https://0x0.st/Hk3a.txt");
}

#[tokio::test]
async fn test_parser_failures_advance_to_last_service() {
    let server = MockServer::start();
    let file_io = server.mock(|when, then| {
        when.method(POST).path("/fileio");
        then.status(200)
            .json_body(serde_json::json!({ "success": false, "message": "quota exceeded" }));
    });
    let zero = server.mock(|when, then| {
        when.method(POST).path("/0x0");
        then.status(200).body("<html>maintenance</html>");
    });
    let uguu = server.mock(|when, then| {
        when.method(POST)
            .path("/uguu")
            .query_param("d", "upload-tool")
            .body_contains("name=\"files[]\"")
            .body_contains("filename=\"content.txt\"");
        then.status(200).body("https://a.uguu.se/xyz.txt");
    });

    let chain = build_chain(
        vec![
            HttpUploadService::new("file.io", server.url("/fileio"), "file", ResponseShape::Json),
            HttpUploadService::new("0x0.st", server.url("/0x0"), "file", ResponseShape::Text),
            HttpUploadService::new(
                "uguu.se",
                server.url("/uguu?d=upload-tool"),
                "files[]",
                ResponseShape::Text,
            ),
        ],
        5,
    );

    let result = chain.upload("large text").await.unwrap();

    file_io.assert();
    zero.assert();
    uguu.assert();
    assert_eq!(result.service_name, "uguu.se");
    assert_eq!(result.link, "https://a.uguu.se/xyz.txt");
}

#[tokio::test]
async fn test_all_services_failing_exhausts_chain() {
    let server = MockServer::start();
    let file_io = server.mock(|when, then| {
        when.method(POST).path("/fileio");
        then.status(500);
    });
    let zero = server.mock(|when, then| {
        when.method(POST).path("/0x0");
        then.status(200).body("not a link");
    });

    let chain = build_chain(
        vec![
            HttpUploadService::new("file.io", server.url("/fileio"), "file", ResponseShape::Json),
            HttpUploadService::new("0x0.st", server.url("/0x0"), "file", ResponseShape::Text),
            // Nothing listens on port 1
            HttpUploadService::new("offline", "http://127.0.0.1:1/", "file", ResponseShape::Text),
        ],
        5,
    );

    match chain.upload("doomed").await {
        Err(Error::AllServicesUnreachable(message)) => assert_eq!(message, EXHAUSTED_MESSAGE),
        other => panic!("unexpected result: {other:?}"),
    }

    file_io.assert_hits(1);
    zero.assert_hits(1);
}

#[tokio::test]
async fn test_slow_service_times_out_and_falls_back() {
    let server = MockServer::start();
    let _slow = server.mock(|when, then| {
        when.method(POST).path("/slow");
        then.status(200)
            .delay(Duration::from_secs(3))
            .body("https://slow.test/late");
    });
    let fast = server.mock(|when, then| {
        when.method(POST).path("/fast");
        then.status(200).body("https://fast.test/ok");
    });

    let chain = build_chain(
        vec![
            HttpUploadService::new("slow", server.url("/slow"), "file", ResponseShape::Text),
            HttpUploadService::new("fast", server.url("/fast"), "file", ResponseShape::Text),
        ],
        1,
    );

    let result = chain.upload("tick").await.unwrap();

    fast.assert();
    assert_eq!(result.link, "https://fast.test/ok");
}

#[tokio::test]
async fn test_configured_services_replace_defaults() {
    let server = MockServer::start();
    let custom = server.mock(|when, then| {
        when.method(PUT).path("/custom").body_contains("name=\"upload\"");
        then.status(201).body("https://custom.test/1");
    });

    let options = UploadOptions {
        timeout_secs: 5,
        user_agent: None,
        services: Some(vec![ServiceEntry {
            name: "custom".to_string(),
            endpoint: server.url("/custom"),
            field: "upload".to_string(),
            response: ResponseShape::Text,
            method: Some("put".to_string()),
        }]),
    };

    let chain = UploadChain::from_options(&options).unwrap();
    assert_eq!(chain.service_names(), vec!["custom"]);

    let result = chain.upload("configured").await.unwrap();
    custom.assert();
    assert_eq!(result.service_name, "custom");
    assert_eq!(result.link, "https://custom.test/1");
}
