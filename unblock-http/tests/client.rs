use std::time::Duration;

use serde_json::json;
use unblock_http::{HttpClient, HttpError, RequestOpts};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn bearer(token: &str) -> RequestOpts<'_> {
    RequestOpts {
        bearer: Some(token),
        ..Default::default()
    }
}

#[tokio::test]
async fn posts_json_and_returns_text() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/request"))
        .and(header("authorization", "Bearer tok-1"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({ "url": "https://example.com", "zone": "z" })))
        .respond_with(ResponseTemplate::new(200).set_body_string("# Title\n\nbody"))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let resp = client
        .post_json_text(
            "request",
            &json!({ "url": "https://example.com", "zone": "z" }),
            bearer("tok-1"),
        )
        .await
        .unwrap();

    assert_eq!(resp.status.as_u16(), 200);
    assert_eq!(resp.body, "# Title\n\nbody");
}

#[tokio::test]
async fn non_success_status_is_an_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/request"))
        .respond_with(
            ResponseTemplate::new(401)
                .insert_header("x-request-id", "abc")
                .set_body_string(r#"{"error":"invalid token"}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let err = client
        .post_json_text("request", &json!({}), bearer("nope"))
        .await
        .unwrap_err();

    match &err {
        HttpError::Api {
            status,
            message,
            request_id,
        } => {
            assert_eq!(status.as_u16(), 401);
            assert_eq!(message, "invalid token");
            assert_eq!(request_id, "abc");
        }
        other => panic!("expected api error, got {other:?}"),
    }
    assert_eq!(err.status().map(|s| s.as_u16()), Some(401));
}

#[tokio::test]
async fn slow_responses_time_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let err = client
        .post_json_text(
            "request",
            &json!({}),
            RequestOpts {
                timeout: Some(Duration::from_millis(50)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, HttpError::Timeout(d) if d == Duration::from_millis(50)));
}

#[tokio::test]
async fn blank_bearer_is_rejected_before_sending() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let err = client
        .post_json_text("request", &json!({}), bearer("  "))
        .await
        .unwrap_err();

    assert!(matches!(err, HttpError::Build(_)));
}

#[tokio::test(flavor = "multi_thread")]
async fn blocking_send_behaves_like_async() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/request"))
        .and(header("authorization", "Bearer tok-2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("blocking body"))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let resp = tokio::task::spawn_blocking(move || {
        client.post_json_text_blocking("request", &json!({ "url": "u" }), bearer("tok-2"))
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(resp.status.as_u16(), 200);
    assert_eq!(resp.body, "blocking body");
}

#[tokio::test]
async fn unreachable_host_is_a_network_error() {
    // Bind an ephemeral port, then release it so nothing is listening there.
    let uri = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        format!("http://{}", listener.local_addr().unwrap())
    };

    let client = HttpClient::new(&uri).unwrap();
    let err = client
        .post_json_text("request", &json!({}), RequestOpts::default())
        .await
        .unwrap_err();

    assert!(matches!(err, HttpError::Network(_)), "got {err:?}");
}
