mod common;

use common::{config, mount_city, requests_for, sample_observation};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use weather_features::{
    CacheKey, CurrentWeatherFetcher, DiskCache, ResultCache, FETCH_FUNCTION_NAME,
};
use wiremock::MockServer;

fn key(city: &str) -> CacheKey {
    let mut kwargs = BTreeMap::new();
    kwargs.insert("city".to_string(), serde_json::json!(city));
    CacheKey::from_kwargs(FETCH_FUNCTION_NAME, kwargs).unwrap()
}

#[tokio::test]
async fn repeated_city_within_ttl_hits_upstream_once() {
    let server = MockServer::start().await;
    mount_city(&server, "Vienna", sample_observation("Vienna", 2761369, 13.0)).await;
    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(DiskCache::open(dir.path()).await.unwrap());
    let fetcher = CurrentWeatherFetcher::new(
        &config(&server, dir.path(), Duration::from_secs(3)),
        cache.clone(),
    );

    let first = fetcher.fetch("Vienna").await.unwrap();
    let second = fetcher.fetch("Vienna").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(requests_for(&server, "Vienna").await, 1);
    assert!(cache.entry_path(&key("Vienna")).exists());
}

#[tokio::test]
async fn expired_entry_triggers_new_fetch_and_overwrite() {
    let server = MockServer::start().await;
    mount_city(&server, "Prague", sample_observation("Prague", 3067696, 10.0)).await;
    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(DiskCache::open(dir.path()).await.unwrap());
    let fetcher = CurrentWeatherFetcher::new(
        &config(&server, dir.path(), Duration::from_millis(200)),
        cache.clone(),
    );

    fetcher.fetch("Prague").await.unwrap();
    let written = cache.read_entry(&key("Prague")).await.unwrap().unwrap();

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(cache.get(&key("Prague")).await.unwrap().is_none());

    fetcher.fetch("Prague").await.unwrap();
    let rewritten = cache.read_entry(&key("Prague")).await.unwrap().unwrap();

    assert_eq!(requests_for(&server, "Prague").await, 2);
    assert!(rewritten.created_at > written.created_at);
    assert_ne!(rewritten.value["timestamp"], written.value["timestamp"]);
}

#[tokio::test]
async fn different_cities_are_cached_separately() {
    let server = MockServer::start().await;
    mount_city(&server, "Rome", sample_observation("Rome", 3169070, 22.0)).await;
    mount_city(&server, "Milan", sample_observation("Milan", 3173435, 17.0)).await;
    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(DiskCache::open(dir.path()).await.unwrap());
    let fetcher = CurrentWeatherFetcher::new(
        &config(&server, dir.path(), Duration::from_secs(3)),
        cache,
    );

    let rome = fetcher.fetch("Rome").await.unwrap();
    let milan = fetcher.fetch("Milan").await.unwrap();
    fetcher.fetch("Rome").await.unwrap();

    assert_eq!(rome["city_id"], serde_json::json!(3169070));
    assert_eq!(milan["city_id"], serde_json::json!(3173435));
    assert_eq!(requests_for(&server, "Rome").await, 1);
    assert_eq!(requests_for(&server, "Milan").await, 1);
}

#[tokio::test]
async fn cache_is_shared_through_the_directory() {
    let server = MockServer::start().await;
    mount_city(&server, "Dublin", sample_observation("Dublin", 2964574, 9.0)).await;
    let dir = tempfile::tempdir().unwrap();
    let config = config(&server, dir.path(), Duration::from_secs(3));

    let first = CurrentWeatherFetcher::new(&config, Arc::new(DiskCache::open(dir.path()).await.unwrap()));
    first.fetch("Dublin").await.unwrap();

    let second = CurrentWeatherFetcher::new(&config, Arc::new(DiskCache::open(dir.path()).await.unwrap()));
    let record = second.fetch("Dublin").await.unwrap();

    assert_eq!(record["city"], serde_json::json!("Dublin"));
    assert_eq!(requests_for(&server, "Dublin").await, 1);
}

#[tokio::test]
async fn corrupt_entry_is_refetched_and_replaced() {
    let server = MockServer::start().await;
    mount_city(&server, "Porto", sample_observation("Porto", 2735943, 19.0)).await;
    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(DiskCache::open(dir.path()).await.unwrap());
    std::fs::write(cache.entry_path(&key("Porto")), b"\x00\x01garbage").unwrap();
    let fetcher = CurrentWeatherFetcher::new(
        &config(&server, dir.path(), Duration::from_secs(3)),
        cache.clone(),
    );

    let record = fetcher.fetch("Porto").await.unwrap();

    assert_eq!(record["city_id"], serde_json::json!(2735943));
    assert_eq!(requests_for(&server, "Porto").await, 1);
    let stored = cache.read_entry(&key("Porto")).await.unwrap().unwrap();
    assert_eq!(stored.value, serde_json::Value::Object(record));
}
