//! Tab navigation, cache and icon scenarios

mod common;

use common::{harness, harness_with, TTL_MS};
use scorelens::application::navigation::{on_action_clicked, on_tab_removed, on_tab_updated};
use scorelens::domain::model::{IconState, Report};
use scorelens::infrastructure::config::Config;
use scorelens::test_utils::{HostCall, MockSource};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn unseen_domain_is_fetched_cached_and_scored() {
    let h = harness(MockSource::new().body("example.com", r#"{"score":82,"count":3}"#)).await;

    let state = on_tab_updated(&h.state, 1, "https://example.com/some/page")
        .await
        .unwrap();

    assert_eq!(state.label(), Some("82"));
    assert_eq!(h.source.calls_for("example.com"), 1);

    let cached = h.state.cache.get("example.com").await.unwrap().unwrap();
    assert_eq!(cached.value, Report::new(Some(82.0), 3));

    let icon = h.host.last_icon(1).unwrap();
    assert_eq!(icon[&19], "assets/scores/82/19.png");
    assert_eq!(h.host.calls().last(), Some(&HostCall::Show { tab_id: 1 }));
}

#[tokio::test]
async fn zero_count_renders_blank() {
    let h = harness(MockSource::with_default(r#"{"score":97,"count":0}"#)).await;

    let state = on_tab_updated(&h.state, 2, "https://quiet.org/").await;

    assert_eq!(state, Some(IconState::Blank));
    assert_eq!(h.host.last_icon(2).unwrap()[&19], "assets/bg19.png");
}

#[tokio::test]
async fn one_network_call_per_ttl_window() {
    let h = harness(MockSource::with_default(r#"{"score":55,"count":1}"#)).await;

    on_tab_updated(&h.state, 1, "https://Example.com/a").await;
    on_tab_updated(&h.state, 2, "https://example.com/b").await;
    h.clock.advance(TTL_MS);
    on_tab_updated(&h.state, 3, "https://example.com/c").await;
    assert_eq!(h.source.calls(), 1);

    h.clock.advance(1);
    on_tab_updated(&h.state, 4, "https://example.com/d").await;
    assert_eq!(h.source.calls(), 2);
}

#[tokio::test]
async fn failed_lookup_renders_blank_and_is_retried() {
    let h = harness(MockSource::new().body("broken.net", "Internal Server Error")).await;

    assert_eq!(
        on_tab_updated(&h.state, 1, "https://broken.net/").await,
        Some(IconState::Blank)
    );
    assert_eq!(
        on_tab_updated(&h.state, 1, "https://unreachable.net/").await,
        Some(IconState::Blank)
    );
    on_tab_updated(&h.state, 1, "https://broken.net/").await;

    assert_eq!(h.source.calls_for("broken.net"), 2);
    assert_eq!(h.source.calls_for("unreachable.net"), 1);
}

#[tokio::test]
async fn ineligible_pages_are_ignored() {
    let h = harness(MockSource::with_default(r#"{"score":1,"count":1}"#)).await;

    assert!(on_tab_updated(&h.state, 1, "chrome://newtab").await.is_none());
    assert!(on_tab_updated(&h.state, 1, "http://localhost:8080/").await.is_none());
    assert!(on_tab_updated(&h.state, 1, "").await.is_none());

    assert_eq!(h.source.calls(), 0);
    assert!(h.host.calls().is_empty());
}

#[tokio::test]
async fn stale_result_is_not_rendered() {
    let source = MockSource::new()
        .body("slow.com", r#"{"score":12,"count":4}"#)
        .body("fast.com", r#"{"score":91,"count":4}"#)
        .delay("slow.com", Duration::from_millis(200));
    let h = harness(source).await;
    let state = Arc::new(h.state.clone());

    let first = {
        let state = state.clone();
        tokio::spawn(async move { on_tab_updated(&state, 5, "https://slow.com/").await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    let second = on_tab_updated(&state, 5, "https://fast.com/").await;

    assert_eq!(second.unwrap().label(), Some("91"));
    assert_eq!(first.await.unwrap(), None);
    assert_eq!(h.host.last_icon(5).unwrap()[&19], "assets/scores/91/19.png");
    // The slow report still lands in the cache
    assert!(h.state.cache.get("slow.com").await.unwrap().is_some());
}

#[tokio::test]
async fn stale_result_is_dropped_when_tab_id_is_reused() {
    let source = MockSource::new()
        .body("slow.com", r#"{"score":12,"count":4}"#)
        .body("fast.com", r#"{"score":91,"count":4}"#)
        .delay("slow.com", Duration::from_millis(200));
    let h = harness(source).await;
    let state = Arc::new(h.state.clone());

    let first = {
        let state = state.clone();
        tokio::spawn(async move { on_tab_updated(&state, 5, "https://slow.com/").await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    on_tab_removed(&state, 5);
    let second = on_tab_updated(&state, 5, "https://fast.com/").await;

    assert_eq!(second.unwrap().label(), Some("91"));
    assert_eq!(first.await.unwrap(), None);
    assert_eq!(h.host.last_icon(5).unwrap()[&19], "assets/scores/91/19.png");
}

#[tokio::test]
async fn leaving_for_an_ineligible_page_drops_pending_result() {
    let source = MockSource::new()
        .body("slow.com", r#"{"score":12,"count":4}"#)
        .delay("slow.com", Duration::from_millis(200));
    let h = harness(source).await;
    let state = Arc::new(h.state.clone());

    let first = {
        let state = state.clone();
        tokio::spawn(async move { on_tab_updated(&state, 6, "https://slow.com/").await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(on_tab_updated(&state, 6, "chrome://newtab").await.is_none());

    assert_eq!(first.await.unwrap(), None);
    assert!(h.host.last_icon(6).is_none());
}

#[tokio::test]
async fn stale_result_renders_when_guard_is_off() {
    let source = MockSource::new()
        .body("slow.com", r#"{"score":12,"count":4}"#)
        .body("fast.com", r#"{"score":91,"count":4}"#)
        .delay("slow.com", Duration::from_millis(200));
    let config = Config {
        discard_stale_renders: false,
        ..Config::default()
    };
    let h = harness_with(source, config).await;
    let state = Arc::new(h.state.clone());

    let first = {
        let state = state.clone();
        tokio::spawn(async move { on_tab_updated(&state, 5, "https://slow.com/").await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    on_tab_updated(&state, 5, "https://fast.com/").await;

    assert_eq!(first.await.unwrap().unwrap().label(), Some("12"));
    assert_eq!(h.host.last_icon(5).unwrap()[&19], "assets/scores/12/19.png");
}

#[tokio::test]
async fn action_click_warms_cache_and_opens_report_page() {
    let h = harness(MockSource::with_default(r#"{"score":70,"count":2}"#)).await;

    let target = on_action_clicked(&h.state, "https://shop.example.com/cart?id=9")
        .await
        .unwrap();

    assert_eq!(target.path(), "/v1/redirect");
    assert_eq!(h.host.opened_tabs(), vec![target.to_string()]);
    assert_eq!(h.source.calls_for("shop.example.com"), 1);
    assert!(h.state.cache.get("shop.example.com").await.unwrap().is_some());
}
