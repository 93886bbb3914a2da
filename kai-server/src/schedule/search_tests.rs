//! Scenario tests for schedule search against a mocked booking site.

use super::*;
use crate::cache::{CacheConfig, ManualClock, ResultCache};
use crate::kai::{KaiConfig, KaiError};
use crate::stations::{Station, StationClient, StationDirectory, StationStore};
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn christmas() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 12, 25).unwrap()
}

fn results_page(cards: &[(&str, &str, &str)]) -> String {
    let cards: String = cards
        .iter()
        .map(|(name, from, to)| {
            format!(
                r#"<div class="data-block list-kereta">
                    <div class="name">{name}</div>
                    <div class="station-start">{from}</div>
                    <div class="time-start">05:00</div>
                    <div class="station-end">{to}</div>
                    <div class="time-end">08:10</div>
                    <div class="long-time">3j 10m</div>
                    <div class="price">Rp 200.000,-</div>
                    <small class="sisa-kursi">Tersedia</small>
                </div>"#
            )
        })
        .collect();

    format!(
        r#"<html><body>
        <input name="flexdatalist-origination" value="GAMBIR">
        <input name="flexdatalist-destination" value="BANDUNG">
        {cards}
        </body></html>"#
    )
}

/// A mock booking site that answers the warm-up request.
async fn site() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>home</html>"))
        .mount(&server)
        .await;
    server
}

/// Answer the search request with a redirect straight to `/search`.
async fn mount_direct_results(server: &MockServer, body: String) {
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("origination", "GMR"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("location", "/search?session=1"),
        )
        .with_priority(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Number of search requests (step 1) the site has seen.
async fn search_requests(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.query_pairs().any(|(k, _)| k == "origination"))
        .count()
}

struct Fixture {
    service: ScheduleService,
    clock: Arc<ManualClock>,
    _dir: TempDir,
}

async fn fixture(server: &MockServer) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let store = StationStore::new(dir.path().join("stations.json"));
    store
        .save(&[
            Station {
                code: "GMR".into(),
                name: "GAMBIR".into(),
                city: "GAMBIR".into(),
                cityname: "JAKARTA".into(),
            },
            Station {
                code: "BD".into(),
                name: "BANDUNG".into(),
                city: "BANDUNG".into(),
                cityname: "KOTA BANDUNG".into(),
            },
        ])
        .unwrap();

    let config = KaiConfig::new(server.uri()).with_timeout(5);
    let stations = StationDirectory::load(StationClient::new(config.clone()), store)
        .await
        .unwrap();

    let clock = Arc::new(ManualClock::new());
    let cache_config = CacheConfig {
        ttl: Duration::from_secs(900),
        max_capacity: 16,
    };
    let cache = ResultCache::with_clock(&cache_config, clock.clone());

    Fixture {
        service: ScheduleService::new(config, cache, stations),
        clock,
        _dir: dir,
    }
}

#[tokio::test]
async fn zero_matching_cards_is_an_empty_result() {
    let server = site().await;
    mount_direct_results(
        &server,
        results_page(&[("ELSEWHERE", "PASAR SENEN", "CIMAHI")]),
    )
    .await;
    let fx = fixture(&server).await;

    let records = fx.service.search("GMR", "BD", christmas()).await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn sends_site_formatted_query() {
    let server = site().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("origination", "GMR"))
        .and(query_param("destination", "BD"))
        .and(query_param("tanggal", "25-Desember-2025"))
        .and(query_param("adult", "1"))
        .and(query_param("infant", "0"))
        .and(query_param("submit", "Cari+&+Pesan+Tiket"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/search"))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(results_page(&[("ARGO PARAHYANGAN", "GAMBIR", "BANDUNG")])),
        )
        .mount(&server)
        .await;
    let fx = fixture(&server).await;

    // Lowercase codes are normalised before the request
    let records = fx.service.search("gmr", "bd", christmas()).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].train_name, "ARGO PARAHYANGAN");
    assert_eq!(records[0].price, "Rp 200.000,-");
}

#[tokio::test]
async fn follows_refresh_marker() {
    let server = site().await;
    let marker = format!(
        r#"<html><head><meta http-equiv="refresh" content="0;url='{}/hasil?token=abc'"></head></html>"#,
        server.uri()
    );
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("origination", "GMR"))
        .respond_with(ResponseTemplate::new(200).set_body_string(marker))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/hasil"))
        .and(query_param("token", "abc"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(results_page(&[
                ("TAKSAKA", "GAMBIR", "BANDUNG"),
                ("NEARBY", "GAMBIR", "KIARACONDONG"),
            ])),
        )
        .expect(1)
        .mount(&server)
        .await;
    let fx = fixture(&server).await;

    let records = fx.service.search("GMR", "BD", christmas()).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].train_name, "TAKSAKA");
}

#[tokio::test]
async fn missing_refresh_marker_is_an_error() {
    let server = site().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("origination", "GMR"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>Just a moment...</html>"))
        .with_priority(1)
        .mount(&server)
        .await;
    let fx = fixture(&server).await;

    let err = fx.service.search("GMR", "BD", christmas()).await.unwrap_err();
    assert!(matches!(err, SearchError::Upstream(KaiError::RedirectNotFound)));
    assert!(!err.is_validation());

    // Failures are not cached
    let _ = fx.service.search("GMR", "BD", christmas()).await;
    assert_eq!(search_requests(&server).await, 2);
}

#[tokio::test]
async fn repeated_search_within_ttl_fetches_once() {
    let server = site().await;
    mount_direct_results(&server, results_page(&[("ARGO", "GAMBIR", "BANDUNG")])).await;
    let fx = fixture(&server).await;

    let first = fx.service.search("GMR", "BD", christmas()).await.unwrap();
    fx.clock.advance(Duration::from_secs(899));
    let second = fx.service.search("GMR", "BD", christmas()).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(search_requests(&server).await, 1);

    fx.clock.advance(Duration::from_secs(1));
    fx.service.search("GMR", "BD", christmas()).await.unwrap();
    assert_eq!(search_requests(&server).await, 2);
}

#[tokio::test]
async fn different_dates_are_cached_separately() {
    let server = site().await;
    mount_direct_results(&server, results_page(&[("ARGO", "GAMBIR", "BANDUNG")])).await;
    let fx = fixture(&server).await;

    let boxing_day = NaiveDate::from_ymd_opt(2025, 12, 26).unwrap();
    fx.service.search("GMR", "BD", christmas()).await.unwrap();
    fx.service.search("GMR", "BD", boxing_day).await.unwrap();

    assert_eq!(search_requests(&server).await, 2);
}

#[tokio::test]
async fn unknown_origin_is_reported_first() {
    let server = site().await;
    let fx = fixture(&server).await;

    let err = fx.service.search("XXX", "BD", christmas()).await.unwrap_err();
    assert!(matches!(&err, SearchError::InvalidOrigin(code) if code == "XXX"));
    assert_eq!(err.to_string(), "invalid origin station code: 'XXX'");

    let err = fx.service.search("XXX", "YYY", christmas()).await.unwrap_err();
    assert!(matches!(&err, SearchError::InvalidOrigin(code) if code == "XXX"));

    let err = fx.service.search("GMR", "YYY", christmas()).await.unwrap_err();
    assert!(matches!(&err, SearchError::InvalidDestination(code) if code == "YYY"));
    assert!(err.is_validation());

    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn same_station_is_rejected_without_fetching() {
    let server = site().await;
    let fx = fixture(&server).await;

    let err = fx.service.search("GMR", "gmr", christmas()).await.unwrap_err();
    assert!(matches!(err, SearchError::SameStation));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn failed_warm_up_is_an_upstream_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let fx = fixture(&server).await;

    let err = fx.service.search("GMR", "BD", christmas()).await.unwrap_err();
    assert!(matches!(
        err,
        SearchError::Upstream(KaiError::UpstreamStatus { status: 503, .. })
    ));
}
