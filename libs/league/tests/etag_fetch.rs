//! Conditional fetch tests against a mock HTTP server

mod common;

use common::fixtures::tours_snapshot;
use league::infrastructure::keys;
use league::{
    AppEvent, CacheEntry, CacheStore, EtagFetcher, EventBus, FetchError, FetchOptions, LeagueApi,
    MatchIdentity, SyncConfig,
};
use mockito::Matcher;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

fn fetcher() -> (EtagFetcher, Arc<CacheStore>, broadcast::Receiver<AppEvent>) {
    let store = Arc::new(CacheStore::in_memory());
    let bus = EventBus::new();
    let events = bus.subscribe();
    let fetcher = EtagFetcher::new(reqwest::Client::new(), Arc::clone(&store), bus);
    (fetcher, store, events)
}

/// Entry old enough to need revalidation
fn expired_entry(etag: &str, payload: serde_json::Value) -> CacheEntry {
    CacheEntry {
        etag: Some(etag.to_string()),
        timestamp: 0,
        payload,
    }
}

#[tokio::test]
async fn test_fresh_entry_skips_network() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/league-table")
        .with_status(200)
        .with_header("etag", "\"t1\"")
        .with_body(r#"[{"team": "Зенит", "points": 40}]"#)
        .expect(1)
        .create_async()
        .await;

    let (fetcher, store, _events) = fetcher();
    let url = format!("{}/api/league-table", server.url());
    let options = FetchOptions::new(keys::LEAGUE_TABLE).fresh_window(Duration::from_secs(60));

    let first = fetcher.fetch(&url, &options).await.unwrap();
    assert!(first.updated);
    assert!(!first.from_cache);
    assert_eq!(first.etag.as_deref(), Some("\"t1\""));

    let second = fetcher.fetch(&url, &options).await.unwrap();
    assert!(second.from_cache);
    assert!(!second.updated);
    assert_eq!(second.data, first.data);

    assert_eq!(store.get_entry(keys::LEAGUE_TABLE).unwrap().etag.as_deref(), Some("\"t1\""));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_not_modified_keeps_payload_and_touches_entry() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/schedule")
        .match_header("if-none-match", "\"s1\"")
        .with_status(304)
        .with_header("x-updated-at", "2025-03-01T12:00:00Z")
        .create_async()
        .await;

    let (fetcher, store, mut events) = fetcher();
    store.put_entry(keys::SCHEDULE, &expired_entry("\"s1\"", json!({"tour": 12})));

    let url = format!("{}/api/schedule", server.url());
    let outcome = fetcher
        .fetch(&url, &FetchOptions::new(keys::SCHEDULE))
        .await
        .unwrap();

    assert!(outcome.from_cache);
    assert!(!outcome.updated);
    assert_eq!(outcome.data, json!({"tour": 12}));
    assert_eq!(outcome.updated_at.as_deref(), Some("2025-03-01T12:00:00Z"));

    let entry = store.get_entry(keys::SCHEDULE).unwrap();
    assert!(entry.timestamp > 0, "revalidation bumps the timestamp");
    assert_eq!(entry.payload, json!({"tour": 12}));

    let published = common::drain(&mut events);
    assert!(matches!(
        &published[..],
        [AppEvent::EtagSuccess { from_cache: true, updated: false, .. }]
    ));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_unchanged_body_version_is_not_an_update() {
    let mut server = mockito::Server::new_async().await;
    let mut body = tours_snapshot(7);
    body["tours"][0]["tour"] = json!(99);
    let _mock = server
        .mock("GET", "/api/betting/tours")
        .with_status(200)
        .with_body(body.to_string())
        .create_async()
        .await;

    let (fetcher, store, _events) = fetcher();
    store.put_entry(keys::TOURS, &expired_entry("7", tours_snapshot(7)));

    let url = format!("{}/api/betting/tours", server.url());
    let outcome = fetcher.fetch(&url, &FetchOptions::new(keys::TOURS)).await.unwrap();

    assert!(!outcome.updated);
    assert_eq!(outcome.data, tours_snapshot(7));
    assert_eq!(outcome.raw, Some(body));
    assert_eq!(store.get_entry(keys::TOURS).unwrap().payload, tours_snapshot(7));
}

#[tokio::test]
async fn test_new_body_version_replaces_payload() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/betting/tours")
        .with_status(200)
        .with_body(tours_snapshot(8).to_string())
        .create_async()
        .await;

    let (fetcher, store, _events) = fetcher();
    store.put_entry(keys::TOURS, &expired_entry("7", tours_snapshot(7)));

    let url = format!("{}/api/betting/tours", server.url());
    let outcome = fetcher.fetch(&url, &FetchOptions::new(keys::TOURS)).await.unwrap();

    assert!(outcome.updated);
    assert_eq!(outcome.etag.as_deref(), Some("8"));
    assert_eq!(store.get_entry(keys::TOURS).unwrap().payload["version"], json!(8));
}

#[tokio::test]
async fn test_lower_body_version_keeps_richer_cache() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/betting/tours")
        .with_status(200)
        .with_body(r#"{"version": 6, "tours": []}"#)
        .create_async()
        .await;

    let (fetcher, store, mut events) = fetcher();
    store.put_entry(keys::TOURS, &expired_entry("7", tours_snapshot(7)));

    let url = format!("{}/api/betting/tours", server.url());
    let outcome = fetcher.fetch(&url, &FetchOptions::new(keys::TOURS)).await.unwrap();

    assert!(!outcome.updated);
    assert!(outcome.from_cache);
    assert_eq!(outcome.etag.as_deref(), Some("7"));
    assert_eq!(outcome.data, tours_snapshot(7));

    let entry = store.get_entry(keys::TOURS).unwrap();
    assert_eq!(entry.payload, tours_snapshot(7));
    assert!(entry.timestamp > 0, "lagging response still revalidates the entry");
    assert!(matches!(
        &common::drain(&mut events)[..],
        [AppEvent::EtagSuccess { updated: false, .. }]
    ));
}

#[tokio::test]
async fn test_server_error_serves_stale_cache() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/results")
        .with_status(500)
        .create_async()
        .await;

    let (fetcher, store, mut events) = fetcher();
    store.put_entry(keys::RESULTS, &expired_entry("\"r1\"", json!({"results": [1]})));

    let url = format!("{}/api/results", server.url());
    let outcome = fetcher.fetch(&url, &FetchOptions::new(keys::RESULTS)).await.unwrap();

    assert!(outcome.stale);
    assert!(outcome.from_cache);
    assert_eq!(outcome.data, json!({"results": [1]}));

    let published = common::drain(&mut events);
    verbose_println!("published: {:?}", published);
    assert!(matches!(
        &published[..],
        [AppEvent::EtagError { stale_fallback: true, .. }]
    ));
}

#[tokio::test]
async fn test_server_error_without_cache_fails() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/results")
        .with_status(503)
        .create_async()
        .await;

    let (fetcher, store, mut events) = fetcher();
    let url = format!("{}/api/results", server.url());
    let err = fetcher
        .fetch(&url, &FetchOptions::new(keys::RESULTS))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Status(503)));
    assert!(store.is_empty());
    assert!(matches!(
        &common::drain(&mut events)[..],
        [AppEvent::EtagError { stale_fallback: false, .. }]
    ));
}

#[tokio::test]
async fn test_force_revalidate_bypasses_fresh_window() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/achievements")
        .with_status(200)
        .with_header("etag", "\"a2\"")
        .with_body(r#"{"items": ["first_win"]}"#)
        .expect(1)
        .create_async()
        .await;

    let (fetcher, store, _events) = fetcher();
    store.put_entry(
        keys::ACHIEVEMENTS,
        &CacheEntry::new(Some("\"a1\"".into()), json!({"items": []})),
    );

    let url = format!("{}/api/achievements", server.url());
    let options = FetchOptions::new(keys::ACHIEVEMENTS)
        .fresh_window(Duration::from_secs(300))
        .force_revalidate(true);
    let outcome = fetcher.fetch(&url, &options).await.unwrap();

    assert!(outcome.updated);
    assert_eq!(outcome.data, json!({"items": ["first_win"]}));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_tours_endpoint_merges_cached_odds() {
    let mut server = mockito::Server::new_async().await;
    let mut fresh = tours_snapshot(9);
    fresh["tours"][0]["matches"][0]["odds"] = json!({});
    fresh["tours"][0]["matches"][0]["markets"] = json!({});
    let mock = server
        .mock("GET", "/api/betting/tours")
        .match_header("x-telegram-init-data", "query_id=1&user=42")
        .with_status(200)
        .with_body(fresh.to_string())
        .create_async()
        .await;

    let mut config = SyncConfig::with_base_url(server.url());
    config.init_data = Some("query_id=1&user=42".to_string());
    let (fetcher, store, _events) = fetcher();
    store.put_entry(keys::TOURS, &expired_entry("8", tours_snapshot(8)));

    let api = LeagueApi::new(Arc::new(config), fetcher);
    let outcome = api.tours(false).await.unwrap();

    let first = &outcome.data["tours"][0]["matches"][0];
    assert_eq!(first["odds"], json!({"home": 1.8, "draw": 3.4, "away": 4.2}));
    assert_eq!(first["markets"]["totals"][0]["line"], json!(2.5));
    assert_eq!(store.get_entry(keys::TOURS).unwrap().payload, outcome.data);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_match_details_sends_identity_params() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/match-details")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("home".into(), "Зенит".into()),
            Matcher::UrlEncoded("away".into(), "Спартак".into()),
            Matcher::UrlEncoded("date".into(), "2025-03-01".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"lineups": {"home": [], "away": []}}"#)
        .create_async()
        .await;

    let (fetcher, store, _events) = fetcher();
    let api = LeagueApi::new(Arc::new(SyncConfig::with_base_url(server.url())), fetcher);
    let identity = MatchIdentity::new(" Зенит ", "Спартак", "2025-03-01T18:00:00");

    let outcome = api.match_details(&identity, false).await.unwrap();
    assert!(outcome.updated);
    assert!(store.get_entry(&keys::match_details(&identity)).is_some());
    mock.assert_async().await;
}
