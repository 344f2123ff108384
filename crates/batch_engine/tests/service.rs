use std::time::Duration;

use batch_engine::{
    ConversionError, ConversionService, ReqwestConversionService, ServiceResponse,
    ServiceSettings, TransportKind, UploadItem,
};
use pretty_assertions::assert_eq;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn service_for(server: &MockServer) -> ReqwestConversionService {
    ReqwestConversionService::new(ServiceSettings {
        base_url: server.uri(),
        ..ServiceSettings::default()
    })
    .expect("client builds")
}

fn upload(name: &str) -> UploadItem {
    UploadItem {
        name: name.to_string(),
        content: bytes::Bytes::from_static(b"fake png bytes"),
        content_kind: "image/png".to_string(),
    }
}

#[tokio::test]
async fn convert_posts_multipart_and_parses_artifact() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/convert"))
        .and(body_string_contains("name=\"target_format\""))
        .and(body_string_contains("webp"))
        .and(body_string_contains("filename=\"holiday.png\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "output_filename": "abc_output.webp",
            "text_content": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let service = service_for(&server);
    let response = service
        .convert(&upload("holiday.png"), "webp")
        .await
        .expect("convert ok");

    assert_eq!(
        response,
        ServiceResponse {
            success: true,
            output_filename: Some("abc_output.webp".to_string()),
            text_content: None,
            error: None,
        }
    );
    assert_eq!(
        service.artifact_location("abc_output.webp"),
        format!("{}/download/abc_output.webp", server.uri())
    );
}

#[tokio::test]
async fn convert_accepts_camel_case_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/convert"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "textContent": "hello"
        })))
        .mount(&server)
        .await;

    let response = service_for(&server)
        .convert(&upload("scan.png"), "txt")
        .await
        .expect("convert ok");
    assert_eq!(response.text_content.as_deref(), Some("hello"));
    assert_eq!(response.output_filename, None);
}

#[tokio::test]
async fn error_status_uses_service_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/convert"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "success": false,
            "error": "File has no extension"
        })))
        .mount(&server)
        .await;

    let err = service_for(&server)
        .convert(&upload("noext"), "png")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ConversionError::Service {
            status: Some(400),
            message: "File has no extension".to_string()
        }
    );
}

#[tokio::test]
async fn error_status_without_body_falls_back_to_reason() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/convert"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = service_for(&server)
        .convert(&upload("a.png"), "png")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Internal Server Error");
}

#[tokio::test]
async fn malformed_success_body_is_a_service_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/convert"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = service_for(&server)
        .convert(&upload("a.png"), "png")
        .await
        .unwrap_err();
    match err {
        ConversionError::Service { status, message } => {
            assert_eq!(status, Some(200));
            assert!(message.starts_with("Invalid response from conversion service"));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn slow_service_is_a_transport_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/convert"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_json(serde_json::json!({ "success": true })),
        )
        .mount(&server)
        .await;

    let service = ReqwestConversionService::new(ServiceSettings {
        base_url: server.uri(),
        request_timeout: Duration::from_millis(50),
        ..ServiceSettings::default()
    })
    .unwrap();

    let err = service.convert(&upload("a.png"), "png").await.unwrap_err();
    assert!(matches!(
        err,
        ConversionError::Transport {
            kind: TransportKind::Timeout,
            ..
        }
    ));
    assert!(err.to_string().starts_with("An error occurred: "));
}

#[tokio::test]
async fn fetch_artifact_returns_bytes_and_enforces_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/download/abc_output.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"0123456789".to_vec()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/download/missing.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let service = service_for(&server);
    let bytes = service.fetch_artifact("abc_output.png").await.unwrap();
    assert_eq!(&bytes[..], b"0123456789");

    let err = service.fetch_artifact("missing.png").await.unwrap_err();
    assert_eq!(
        err,
        ConversionError::Service {
            status: Some(404),
            message: "Not Found".to_string()
        }
    );

    let limited = ReqwestConversionService::new(ServiceSettings {
        base_url: server.uri(),
        max_artifact_bytes: 4,
        ..ServiceSettings::default()
    })
    .unwrap();
    assert!(limited.fetch_artifact("abc_output.png").await.is_err());
}
