//! Storage and feed tests against a mock hub.

use httpmock::prelude::*;
use iothub_client::{ClientConfig, Credentials, EnvironmentInfo, ErrorKind, FeedDirection, HubClient};
use serde_json::json;

fn client_for(base_url: &str) -> HubClient {
    let creds = Credentials::new(base_url, "hub1", "k1", "s1").unwrap();
    HubClient::with_config(creds, ClientConfig::default(), EnvironmentInfo::default()).unwrap()
}

fn message(id: &str) -> serde_json::Value {
    json!({"Id": id, "Topic": "hub1", "Metadata": {"eid": "demo.feed"}})
}

// ── Storage ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_message() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/hub1/storage/ca72d03b/")
                .query_param("key", "k1")
                .query_param_exists("signature");
            then.status(200).json_body(message("ca72d03b"));
        })
        .await;

    let resp = client_for(&server.base_url()).get_message("ca72d03b").await.unwrap();

    mock.assert_async().await;
    assert_eq!(resp.id.as_deref(), Some("ca72d03b"));
}

#[tokio::test]
async fn test_get_message_not_found() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/hub1/storage/missing/");
            then.status(404);
        })
        .await;

    let err = client_for(&server.base_url()).get_message("missing").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TransportFailure);
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_update_meta_sends_bare_string() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/hub1/storage/ca72d03b/meta/ip/")
                .header("content-type", "application/json")
                .body("1234");
            then.status(200).json_body(json!({"Id": "ca72d03b", "Metadata": {"ip": "1234"}}));
        })
        .await;

    let resp = client_for(&server.base_url())
        .update_meta("ca72d03b", "ip", "1234")
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(resp.metadata.unwrap().ip.as_deref(), Some("1234"));
}

#[tokio::test]
async fn test_delete_missing_meta_succeeds() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/hub1/storage/ca72d03b/meta/nope/");
            then.status(200);
        })
        .await;

    let resp = client_for(&server.base_url())
        .delete_meta("ca72d03b", "nope")
        .await
        .unwrap();

    mock.assert_async().await;
    assert!(resp.is_none());
}

#[tokio::test]
async fn test_delete_meta_returns_updated_message() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(DELETE).path("/hub1/storage/ca72d03b/meta/ip/");
            then.status(200).json_body(message("ca72d03b"));
        })
        .await;

    let resp = client_for(&server.base_url())
        .delete_meta("ca72d03b", "ip")
        .await
        .unwrap()
        .unwrap();
    assert!(resp.metadata.unwrap().ip.is_none());
}

// ── Feed ────────────────────────────────────────────────────────────

async fn two_page_feed(server: &MockServer) -> (httpmock::Mock<'_>, httpmock::Mock<'_>) {
    let first = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/hub1/feed/")
                .query_param("direction", "forward")
                .query_param("size", "2")
                .query_param_missing("token");
            then.status(200)
                .header("cursor-position", "cursor+1/=")
                .json_body(json!([message("m1"), message("m2")]));
        })
        .await;

    let second = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/hub1/feed/")
                .query_param("direction", "forward")
                .query_param("size", "2")
                .query_param("token", "cursor+1/=");
            then.status(200).json_body(json!([message("m3")]));
        })
        .await;

    (first, second)
}

#[tokio::test]
async fn test_feed_first_page_and_token() {
    let server = MockServer::start_async().await;
    let (first, _) = two_page_feed(&server).await;

    let page = client_for(&server.base_url())
        .get_feed(None, FeedDirection::Forward, 2)
        .await
        .unwrap();

    first.assert_async().await;
    let ids: Vec<_> = page.messages.iter().filter_map(|m| m.id.as_deref()).collect();
    assert_eq!(ids, vec!["m1", "m2"]);
    assert_eq!(page.next_token.as_deref(), Some("cursor+1/="));
    assert!(!page.is_last());
}

#[tokio::test]
async fn test_feed_missing_cursor_is_end() {
    let server = MockServer::start_async().await;
    let (_, second) = two_page_feed(&server).await;

    let client = client_for(&server.base_url());
    let page = client
        .get_feed(Some("cursor+1/="), FeedDirection::Forward, 2)
        .await
        .unwrap();
    assert!(page.is_last());

    // Same token, same page.
    let again = client
        .get_feed(Some("cursor+1/="), FeedDirection::Forward, 2)
        .await
        .unwrap();
    assert_eq!(page, again);
    second.assert_calls_async(2).await;
}

#[tokio::test]
async fn test_feed_pager_walks_without_gaps() {
    let server = MockServer::start_async().await;
    let (first, second) = two_page_feed(&server).await;

    let client = client_for(&server.base_url());
    let mut pager = client.feed_pager(FeedDirection::Forward, 2, None);
    let mut ids = Vec::new();
    while let Some(page) = pager.next_page().await.unwrap() {
        ids.extend(page.messages.into_iter().filter_map(|m| m.id));
    }

    assert_eq!(ids, vec!["m1", "m2", "m3"]);
    assert!(pager.is_done());
    assert_eq!(pager.token(), Some("cursor+1/="));
    assert!(pager.next_page().await.unwrap().is_none());
    first.assert_calls_async(1).await;
    second.assert_calls_async(1).await;
}

#[tokio::test]
async fn test_feed_backward_direction() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/hub1/feed/")
                .query_param("direction", "backward")
                .query_param("size", "10")
                .query_param("token", "t9");
            then.status(200).header("cursor-position", "").json_body(json!([]));
        })
        .await;

    let page = client_for(&server.base_url())
        .get_feed(Some("t9"), FeedDirection::Backward, 10)
        .await
        .unwrap();

    mock.assert_async().await;
    assert!(page.messages.is_empty());
    // Empty header value means no further pages.
    assert!(page.is_last());
}

#[tokio::test]
async fn test_feed_error_keeps_pager_position() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/hub1/feed/");
            then.status(502);
        })
        .await;

    let client = client_for(&server.base_url());
    let mut pager = client.feed_pager(FeedDirection::Forward, 5, Some("resume".into()));
    let err = pager.next_page().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TransportFailure);
    assert_eq!(pager.token(), Some("resume"));
    assert!(!pager.is_done());
}
