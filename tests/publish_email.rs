// tests/publish_email.rs
use ainews_pipeline::publish::email::ButtondownClient;
use ainews_pipeline::publish::PublishError;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> ButtondownClient {
    ButtondownClient::new("bd-key".into()).with_api_url(format!("{}/v1/emails", server.uri()))
}

#[tokio::test]
async fn publishes_with_token_auth_and_first_line_subject() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/emails"))
        .and(header("Authorization", "Token bd-key"))
        .and(body_partial_json(json!({
            "subject": "AIニュース 2025年07月17日",
            "status": "published",
            "email_type": "public"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "em_123",
            "status": "about_to_send",
            "subject": "AIニュース 2025年07月17日",
            "absolute_url": "https://buttondown.example/archive/em_123"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let sent = client(&server)
        .publish("AIニュース 2025年07月17日\n\n本文", false)
        .await
        .unwrap();

    assert_eq!(sent.id.as_deref(), Some("em_123"));
    assert_eq!(sent.subject.as_deref(), Some("AIニュース 2025年07月17日"));
    assert_eq!(
        sent.url.as_deref(),
        Some("https://buttondown.example/archive/em_123")
    );
}

#[tokio::test]
async fn draft_flag_sets_draft_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "status": "draft" })))
        .respond_with(ResponseTemplate::new(201).set_body_string("not json"))
        .expect(1)
        .mount(&server)
        .await;

    let sent = client(&server).publish("subject\nbody", true).await.unwrap();
    assert!(sent.id.is_none());
}

#[tokio::test]
async fn unauthorized_and_bad_request_are_distinct() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("Authorization", "Token bd-key"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    let err = client(&server).publish("s\nb", false).await.unwrap_err();
    assert!(matches!(err, PublishError::Unauthorized));
    assert_eq!(err.to_string(), "invalid API key");

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("subject too long"))
        .mount(&server)
        .await;
    let err = client(&server).publish("s\nb", false).await.unwrap_err();
    assert!(matches!(err, PublishError::BadRequest(ref b) if b == "subject too long"));

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let err = client(&server).publish("s\nb", false).await.unwrap_err();
    assert!(matches!(err, PublishError::Http { status: 503, .. }));
}
