// tests/notify_http.rs
use ainews_pipeline::notify::discord::DiscordNotifier;
use ainews_pipeline::notify::slack::SlackNotifier;
use ainews_pipeline::notify::twitter::{OAuthCredentials, XClient};
use ainews_pipeline::notify::{send_best_effort, Announcement, Notifier};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn note() -> Announcement {
    Announcement {
        title: "AIニュース".into(),
        body: "本日のまとめ".into(),
        url: Some("https://example.org/ainews/newsletters/2025-07-17.html".into()),
    }
}

#[tokio::test]
async fn discord_retries_then_posts_embed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(body_partial_json(json!({
            "embeds": [{
                "title": "AIニュース",
                "description": "本日のまとめ",
                "url": "https://example.org/ainews/newsletters/2025-07-17.html"
            }]
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    DiscordNotifier::new(format!("{}/hook", server.uri()))
        .with_base_delay(Duration::from_millis(1))
        .send(&note())
        .await
        .unwrap();
}

#[tokio::test]
async fn discord_gives_up_after_bounded_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502))
        .expect(3)
        .mount(&server)
        .await;

    let err = DiscordNotifier::new(server.uri())
        .with_base_delay(Duration::from_millis(1))
        .send(&note())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Discord webhook HTTP error"));
}

#[tokio::test]
async fn discord_retry_count_is_configurable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502))
        .expect(2)
        .mount(&server)
        .await;

    let err = DiscordNotifier::new(server.uri())
        .with_retries(2)
        .with_base_delay(Duration::from_millis(1))
        .send(&note())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("502"));
}

#[tokio::test]
async fn slack_posts_text_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "text": "*AIニュース*\n本日のまとめ\nhttps://example.org/ainews/newsletters/2025-07-17.html"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    SlackNotifier::new(server.uri()).send(&note()).await.unwrap();
}

#[tokio::test]
async fn slack_failure_is_swallowed_by_best_effort() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let slack = SlackNotifier::new(server.uri());
    assert!(slack.send(&note()).await.is_err());
    // returns unit; must not panic or propagate
    send_best_effort(&slack, &note()).await;
}

#[tokio::test]
async fn x_client_posts_signed_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .and(header_exists("authorization"))
        .and(body_partial_json(json!({ "text": "hello https://example.org" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": { "id": "1880000000000000000", "text": "hello https://example.org" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let creds = OAuthCredentials {
        consumer_key: "ck".into(),
        consumer_secret: "cs".into(),
        access_token: "at".into(),
        access_token_secret: "ats".into(),
    };
    let id = XClient::new(creds)
        .unwrap()
        .with_base_url(server.uri())
        .post_tweet("hello https://example.org")
        .await
        .unwrap();
    assert_eq!(id, "1880000000000000000");

    let received = server.received_requests().await.unwrap();
    let auth = received[0].headers.get("authorization").unwrap().to_str().unwrap();
    assert!(auth.starts_with("OAuth "));
    assert!(auth.contains("oauth_consumer_key=\"ck\""));
    assert!(auth.contains("oauth_token=\"at\""));
}

#[tokio::test]
async fn x_client_surfaces_api_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let creds = OAuthCredentials {
        consumer_key: "ck".into(),
        consumer_secret: "cs".into(),
        access_token: "at".into(),
        access_token_secret: "ats".into(),
    };
    let err = XClient::new(creds)
        .unwrap()
        .with_base_url(server.uri())
        .post_tweet("x")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("403"));
}
