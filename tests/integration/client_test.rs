//! Client integration tests
//!
//! These tests dispatch real requests to a local mock server and verify URL
//! merging, header inheritance, body encoding and response resolution.

use super::{api_base, api_instance, mock_server};
use highway::config::{reset_config, update_config};
use highway::{
    is_api_error, Body, Highway, HighwayConfig, HighwayError, HttpMethod, Request, Resolved,
    Resolver,
};
use serde::Deserialize;
use serde_json::json;
use serial_test::serial;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{body_json, body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Deserialize, PartialEq)]
struct Penguin {
    id: u32,
    name: String,
}

/// Serves one connection with a canned raw HTTP response, then closes it.
///
/// Returns the base URL of the server.
async fn raw_server(response: &'static [u8]) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 4096];
        let _ = socket.read(&mut request).await;
        socket.write_all(response).await.unwrap();
        let _ = socket.shutdown().await;
    });

    format!("http://{}", addr)
}

async fn last_request(server: &MockServer) -> wiremock::Request {
    server
        .received_requests()
        .await
        .expect("request recording enabled")
        .pop()
        .expect("at least one request")
}

#[tokio::test]
async fn test_get_resolves_json() {
    let server = mock_server().await;
    Mock::given(method("GET"))
        .and(path("/api/penguins"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "name": "Pingu"},
            {"id": 2, "name": "Pinga"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_instance(&server);
    let resolved = api
        .get(Request::to("/penguins").param("page", "2").resolver(Resolver::Json))
        .await
        .unwrap();

    let penguins: Vec<Penguin> = resolved.into_json().unwrap().unwrap();
    assert_eq!(penguins.len(), 2);
    assert_eq!(
        penguins[0],
        Penguin {
            id: 1,
            name: "Pingu".to_string()
        }
    );
}

#[tokio::test]
async fn test_raw_response_without_resolver() {
    let server = mock_server().await;
    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("all good")
                .insert_header("X-Colony", "Adelie"),
        )
        .mount(&server)
        .await;

    let resolved = api_instance(&server)
        .get(Request::to("/status"))
        .await
        .unwrap();

    let response = resolved.into_response().expect("raw response");
    assert_eq!(response.status_code, 200);
    assert_eq!(response.status_text, "OK");
    assert_eq!(response.header("x-colony"), Some("Adelie"));
    assert_eq!(response.text().unwrap(), "all good");
    assert!(response.url.ends_with("/api/status"));
}

#[tokio::test]
async fn test_base_path_and_query_are_preserved() {
    let server = mock_server().await;
    Mock::given(method("GET"))
        .and(path("/api/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let api = Highway::new(HighwayConfig::with_base(format!(
        "{}?key=k1",
        api_base(&server)
    )))
    .unwrap();
    api.get(Request::to("/search?q=fish").param("page", "2"))
        .await
        .unwrap();

    let request = last_request(&server).await;
    assert_eq!(request.url.path(), "/api/search");
    assert_eq!(request.url.query(), Some("key=k1&q=fish&page=2"));
}

#[tokio::test]
async fn test_absolute_path_overrides_base() {
    let base_server = mock_server().await;
    let other_server = mock_server().await;
    Mock::given(method("GET"))
        .and(path("/elsewhere"))
        .respond_with(ResponseTemplate::new(200).set_body_string("other"))
        .expect(1)
        .mount(&other_server)
        .await;

    let resolved = api_instance(&base_server)
        .get(Request::to(format!("{}/elsewhere", other_server.uri())).resolver(Resolver::Text))
        .await
        .unwrap();

    assert_eq!(resolved.into_text().as_deref(), Some("other"));
    assert!(base_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_request_headers_override_instance_headers() {
    let server = mock_server().await;
    Mock::given(method("GET"))
        .and(path("/api/me"))
        .and(header("x-client", "child"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let api = Highway::new(
        HighwayConfig::with_base(api_base(&server))
            .header("X-Client", "parent")
            .header("Accept", "application/json"),
    )
    .unwrap();
    api.get(Request::to("/me").header("x-client", "child"))
        .await
        .unwrap();

    let request = last_request(&server).await;
    assert_eq!(request.headers.get_all("x-client").iter().count(), 1);
}

#[tokio::test]
async fn test_post_sends_json_body() {
    let server = mock_server().await;
    Mock::given(method("POST"))
        .and(path("/api/penguins"))
        .and(body_json(json!({"name": "Robert"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 3, "name": "Robert"})))
        .expect(1)
        .mount(&server)
        .await;

    let resolved = api_instance(&server)
        .post(
            Request::to("/penguins")
                .json(&json!({"name": "Robert"}))
                .unwrap()
                .resolver(Resolver::Json),
        )
        .await
        .unwrap();

    let created: Penguin = resolved.into_json().unwrap().unwrap();
    assert_eq!(created.id, 3);

    // JSON bodies get no implicit Content-Type
    let request = last_request(&server).await;
    assert!(request.headers.get("content-type").is_none());
}

#[tokio::test]
async fn test_put_sends_raw_body() {
    let server = mock_server().await;
    Mock::given(method("PUT"))
        .and(path("/api/penguins/3/notes"))
        .and(body_string("likes fish"))
        .respond_with(ResponseTemplate::new(200).set_body_string("saved"))
        .expect(1)
        .mount(&server)
        .await;

    let resolved = api_instance(&server)
        .put(
            Request::to("/penguins/3/notes")
                .header("Content-Type", "text/plain")
                .body("likes fish"),
        )
        .await
        .unwrap();

    assert_eq!(resolved.into_response().unwrap().status_code, 200);
}

#[tokio::test]
async fn test_patch_and_destroy_methods() {
    let server = mock_server().await;
    Mock::given(method("PATCH"))
        .and(path("/api/penguins/3"))
        .respond_with(ResponseTemplate::new(200).set_body_string("patched"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/penguins/3"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_instance(&server);
    let patched = api
        .patch(
            Request::to("/penguins/3")
                .body(Body::Json(json!({"name": "Bob"})))
                .resolver(Resolver::Text),
        )
        .await
        .unwrap();
    assert_eq!(patched.into_text().as_deref(), Some("patched"));

    let deleted = api
        .destroy(Request::to("/penguins/3").resolver(Resolver::Void))
        .await
        .unwrap();
    assert!(deleted.is_empty());
}

#[tokio::test]
async fn test_non_success_status_becomes_api_error() {
    let server = mock_server().await;
    Mock::given(method("GET"))
        .and(path("/api/penguins/99"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no penguin here"))
        .expect(1)
        .mount(&server)
        .await;

    let err = api_instance(&server)
        .get(Request::to("/penguins/99").resolver(Resolver::Json))
        .await
        .unwrap_err();

    assert!(is_api_error(&err));
    let api_error = err.as_api_error().unwrap();
    assert_eq!(api_error.status(), 404);
    assert_eq!(api_error.status_text(), "Not Found");
    assert!(api_error.url().path().ends_with("/api/penguins/99"));

    // The body is read once and cached
    assert_eq!(api_error.text().await.unwrap(), "no penguin here");
    assert_eq!(api_error.text().await.unwrap(), "no penguin here");
}

#[tokio::test]
async fn test_api_error_text_fails_after_truncated_body() {
    let base = raw_server(
        b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 100\r\n\r\nshort",
    )
    .await;
    let api = Highway::new(HighwayConfig::with_base(base)).unwrap();

    let err = api.get(Request::to("/broken")).await.unwrap_err();
    let api_error = err.as_api_error().unwrap();
    assert_eq!(api_error.status(), 500);

    assert!(api_error.text().await.is_err());
    // The body is gone; a second read must not pass for an empty body
    let second = api_error.text().await.unwrap_err();
    assert!(matches!(second, HighwayError::Decode(_)));
}

#[tokio::test]
async fn test_non_utf8_header_values_are_kept() {
    let base = raw_server(b"HTTP/1.1 200 OK\r\nX-Colony: caf\xe9\r\nContent-Length: 2\r\n\r\nok").await;
    let api = Highway::new(HighwayConfig::with_base(base)).unwrap();

    let response = api
        .get(Request::to("/colony"))
        .await
        .unwrap()
        .into_response()
        .unwrap();

    assert_eq!(response.header("x-colony"), Some("caf\u{fffd}"));
    assert_eq!(response.text().unwrap(), "ok");
}

#[tokio::test]
async fn test_soft_returns_error_responses() {
    let server = mock_server().await;
    Mock::given(method("GET"))
        .and(path("/api/broken"))
        .respond_with(ResponseTemplate::new(500).set_body_string("melted"))
        .mount(&server)
        .await;

    let resolved = api_instance(&server)
        .get(Request::to("/broken").soft())
        .await
        .unwrap();

    let response = resolved.into_response().unwrap();
    assert_eq!(response.status_code, 500);
    assert!(response.is_server_error());
    assert_eq!(response.body, b"melted");
}

#[tokio::test]
async fn test_empty_body_handling() {
    let server = mock_server().await;
    Mock::given(method("GET"))
        .and(path("/api/empty"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let api = api_instance(&server);

    let raw = api.get(Request::to("/empty")).await.unwrap();
    assert_eq!(raw.into_response().unwrap().status_code, 204);

    let resolved = api
        .get(Request::to("/empty").resolver(Resolver::Json))
        .await
        .unwrap();
    assert_eq!(resolved, Resolved::Empty);

    let err = api
        .get(Request::to("/empty").resolver(Resolver::Json).must())
        .await
        .unwrap_err();
    assert!(matches!(err, HighwayError::EmptyBody));
    assert_eq!(err.to_string(), "api call returned an empty response body");

    let err = api.get(Request::to("/empty").must()).await.unwrap_err();
    assert!(matches!(err, HighwayError::EmptyBody));

    // Soft requests skip the empty-body check
    let soft = api
        .get(Request::to("/empty").soft().must())
        .await
        .unwrap();
    assert_eq!(soft.into_response().unwrap().status_code, 204);
}

#[tokio::test]
async fn test_text_bytes_and_blob_resolvers() {
    let server = mock_server().await;
    Mock::given(method("GET"))
        .and(path("/api/photo"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0x89u8, 0x50, 0x4e, 0x47], "image/png"))
        .mount(&server)
        .await;

    let api = api_instance(&server);

    let blob = match api
        .get(Request::to("/photo").resolver(Resolver::Blob))
        .await
        .unwrap()
    {
        Resolved::Blob(blob) => blob,
        other => panic!("expected blob, got {:?}", other),
    };
    assert_eq!(blob.content_type.as_deref(), Some("image/png"));
    assert_eq!(blob.len(), 4);

    let bytes = api
        .get(Request::to("/photo").resolver(Resolver::Bytes))
        .await
        .unwrap();
    assert_eq!(bytes.into_bytes(), Some(vec![0x89, 0x50, 0x4e, 0x47]));

    let text = api
        .get(Request::to("/photo").resolver(Resolver::Text))
        .await
        .unwrap()
        .into_text()
        .unwrap();
    assert!(text.ends_with("PNG"));
}

#[tokio::test]
async fn test_form_resolver() {
    let server = mock_server().await;
    Mock::given(method("GET"))
        .and(path("/api/form"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("colony=adelie&motto=eat+fish", "application/x-www-form-urlencoded"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/not-form"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"a": 1})))
        .mount(&server)
        .await;

    let api = api_instance(&server);

    let pairs = api
        .get(Request::to("/form").resolver(Resolver::Form))
        .await
        .unwrap()
        .into_form()
        .unwrap();
    assert_eq!(
        pairs,
        vec![
            ("colony".to_string(), "adelie".to_string()),
            ("motto".to_string(), "eat fish".to_string()),
        ]
    );

    let err = api
        .get(Request::to("/not-form").resolver(Resolver::Form))
        .await
        .unwrap_err();
    assert!(matches!(err, HighwayError::Decode(_)));
}

#[tokio::test]
async fn test_invalid_json_fails_to_decode() {
    let server = mock_server().await;
    Mock::given(method("GET"))
        .and(path("/api/garbled"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&server)
        .await;

    let err = api_instance(&server)
        .get(Request::to("/garbled").resolver(Resolver::Json))
        .await
        .unwrap_err();
    assert!(matches!(err, HighwayError::Decode(_)));
}

#[tokio::test]
async fn test_request_timeout() {
    let server = mock_server().await;
    Mock::given(method("GET"))
        .and(path("/api/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("late")
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let err = api_instance(&server)
        .get(Request::to("/slow").timeout(50))
        .await
        .unwrap_err();
    assert!(matches!(err, HighwayError::Timeout));
}

#[tokio::test]
async fn test_get_with_body_is_rejected() {
    let server = mock_server().await;

    let err = api_instance(&server)
        .handle(Request::new(HttpMethod::GET, "/penguins").body("fish"))
        .await
        .unwrap_err();

    assert!(matches!(err, HighwayError::BodyNotAllowed(HttpMethod::GET)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_relative_path_without_base() {
    let api = Highway::new(HighwayConfig::default()).unwrap();

    let err = api.get(Request::to("/penguins")).await.unwrap_err();
    assert!(matches!(err, HighwayError::MissingBase(_)));
}

#[tokio::test]
async fn test_child_instances_inherit_parameters() {
    let server = mock_server().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/penguins"))
        .and(query_param("key", "k1"))
        .and(header("x-parent", "1"))
        .and(header("x-child", "1"))
        .and(header("authorization", "Bearer grandchild"))
        .respond_with(ResponseTemplate::new(200).set_body_string("deep"))
        .expect(1)
        .mount(&server)
        .await;

    let parent = Highway::new(
        HighwayConfig::with_base(format!("{}?key=k1", api_base(&server)))
            .header("X-Parent", "1")
            .header("Authorization", "Bearer parent"),
    )
    .unwrap();

    // The middle instance sets no base, so the parent's is kept
    let child = parent
        .create_instance(HighwayConfig::default().header("X-Child", "1"))
        .unwrap();
    assert_eq!(child.base(), parent.base());

    let grandchild = child
        .create_instance(
            HighwayConfig::with_base("/v2").header("Authorization", "Bearer grandchild"),
        )
        .unwrap();

    let resolved = grandchild
        .get(Request::to("/penguins").resolver(Resolver::Text))
        .await
        .unwrap();
    assert_eq!(resolved.into_text().as_deref(), Some("deep"));

    let request = last_request(&server).await;
    assert_eq!(request.url.query(), Some("key=k1"));
}

#[tokio::test]
async fn test_child_with_absolute_base_replaces_parent() {
    let parent_server = mock_server().await;
    let child_server = mock_server().await;
    Mock::given(method("GET"))
        .and(path("/v1/ping"))
        .and(header("x-parent", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("pong"))
        .expect(1)
        .mount(&child_server)
        .await;

    let parent = Highway::new(
        HighwayConfig::with_base(api_base(&parent_server)).header("X-Parent", "1"),
    )
    .unwrap();
    let child = parent
        .create_instance(HighwayConfig::with_base(format!(
            "{}/v1",
            child_server.uri()
        )))
        .unwrap();

    let resolved = child
        .get(Request::to("/ping").resolver(Resolver::Text))
        .await
        .unwrap();
    assert_eq!(resolved.into_text().as_deref(), Some("pong"));
}

#[tokio::test]
#[serial]
async fn test_default_instance_follows_global_config() {
    let server = mock_server().await;
    Mock::given(method("GET"))
        .and(path("/api/penguins"))
        .and(header("x-global", "yes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": 2})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/admin/penguins"))
        .respond_with(ResponseTemplate::new(201).set_body_string("made"))
        .expect(1)
        .mount(&server)
        .await;

    let base = api_base(&server);
    update_config(|config| {
        config.base = Some(base.clone());
        config
            .headers
            .insert("X-Global".to_string(), "yes".to_string());
    });

    let resolved = highway::get(Request::to("/penguins").resolver(Resolver::Json))
        .await
        .unwrap();
    assert_eq!(resolved, Resolved::Json(json!({"count": 2})));

    let admin = highway::create_instance(HighwayConfig::with_base("/admin")).unwrap();
    let made = admin
        .post(Request::to("/penguins").body("{}").resolver(Resolver::Text))
        .await
        .unwrap();
    assert_eq!(made.into_text().as_deref(), Some("made"));

    reset_config();
    let err = highway::get(Request::to("/penguins")).await.unwrap_err();
    assert!(matches!(err, HighwayError::MissingBase(_)));
}
