//! Requires Docker; run with `cargo test -- --ignored`.

use std::time::Duration;

use minifier_cache::RedisLookupCache;
use minifier_core::LookupCache;
use minifier_test_infra::redis::RedisServer;
use redis::AsyncCommands;

async fn start() -> (RedisServer, RedisLookupCache) {
    let server = RedisServer::start().await.expect("start redis");
    let cache = RedisLookupCache::connect(server.url())
        .await
        .expect("connect");
    (server, cache)
}

#[tokio::test]
#[ignore = "needs docker"]
async fn set_get_and_del() {
    let (_server, cache) = start().await;

    assert_eq!(cache.get("code:abc1234").await.unwrap(), None);

    cache
        .set("code:abc1234", "payload", Duration::from_secs(60))
        .await
        .unwrap();
    assert_eq!(
        cache.get("code:abc1234").await.unwrap().as_deref(),
        Some("payload")
    );

    cache.del("code:abc1234").await.unwrap();
    cache.del("code:abc1234").await.unwrap();
    assert_eq!(cache.get("code:abc1234").await.unwrap(), None);
}

#[tokio::test]
#[ignore = "needs docker"]
async fn keys_are_namespaced_and_expire() {
    let (server, cache) = start().await;

    cache
        .set("id:url_1", "payload", Duration::from_millis(1_500))
        .await
        .unwrap();

    let mut conn = server
        .client()
        .unwrap()
        .get_multiplexed_async_connection()
        .await
        .unwrap();

    let raw: Option<String> = conn.get("minifier:id:url_1").await.unwrap();
    assert_eq!(raw.as_deref(), Some("payload"));

    let pttl: i64 = conn.pttl("minifier:id:url_1").await.unwrap();
    assert!(pttl > 0 && pttl <= 1_500);

    tokio::time::sleep(Duration::from_millis(2_000)).await;
    assert_eq!(cache.get("id:url_1").await.unwrap(), None);
}
