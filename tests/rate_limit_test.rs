mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{FailingStore, SlowIncrStore};
use precis::{KvStore, MemoryStore, RateLimitConfig, RateLimiter};

fn limiter(store: Arc<MemoryStore>, max: u64, window: Duration) -> RateLimiter {
    RateLimiter::new(
        store,
        RateLimitConfig::new().max_requests(max).window(window),
    )
}

#[tokio::test]
async fn rejects_after_ceiling() {
    let store = Arc::new(MemoryStore::new());
    let limiter = RateLimiter::new(store.clone(), RateLimitConfig::default());

    for i in 0..100 {
        assert!(limiter.admit("client-a").await, "request {i} rejected");
    }
    assert!(!limiter.admit("client-a").await);
    assert!(!limiter.admit("client-a").await);

    // Rejections are not counted.
    assert_eq!(
        store.get("rate_limit:client-a").await.unwrap().as_deref(),
        Some("100")
    );
}

#[tokio::test]
async fn window_rolls_over() {
    let store = Arc::new(MemoryStore::new());
    let limiter = limiter(store.clone(), 2, Duration::from_millis(200));

    assert!(limiter.admit("client-a").await);
    assert!(limiter.admit("client-a").await);
    assert!(!limiter.admit("client-a").await);

    tokio::time::sleep(Duration::from_millis(300)).await;

    assert!(limiter.admit("client-a").await);
    assert_eq!(
        store.get("rate_limit:client-a").await.unwrap().as_deref(),
        Some("1")
    );
}

#[tokio::test]
async fn increments_keep_window_expiry() {
    let store = Arc::new(MemoryStore::new());
    let limiter = limiter(store.clone(), 10, Duration::from_millis(200));

    assert!(limiter.admit("client-a").await);
    tokio::time::sleep(Duration::from_millis(120)).await;
    assert!(limiter.admit("client-a").await);
    tokio::time::sleep(Duration::from_millis(150)).await;

    // The increment did not push the window out.
    assert_eq!(store.get("rate_limit:client-a").await.unwrap(), None);
}

#[tokio::test]
async fn boundary_burst_admits_twice_the_ceiling() {
    let store = Arc::new(MemoryStore::new());
    let limiter = limiter(store, 3, Duration::from_millis(200));

    let mut admitted = 0;
    for _ in 0..3 {
        admitted += u32::from(limiter.admit("client-a").await);
    }
    tokio::time::sleep(Duration::from_millis(220)).await;
    for _ in 0..3 {
        admitted += u32::from(limiter.admit("client-a").await);
    }
    // Six requests inside roughly one window length.
    assert_eq!(admitted, 6);
}

#[tokio::test]
async fn credentials_are_independent() {
    let store = Arc::new(MemoryStore::new());
    let limiter = limiter(store, 1, Duration::from_secs(60));

    assert!(limiter.admit("client-a").await);
    assert!(!limiter.admit("client-a").await);
    assert!(limiter.admit("client-b").await);
}

#[tokio::test]
async fn fails_open_when_store_errors() {
    let limiter = RateLimiter::new(
        Arc::new(FailingStore),
        RateLimitConfig::new().max_requests(1),
    );
    for _ in 0..10 {
        assert!(limiter.admit("client-a").await);
    }
}

#[tokio::test]
async fn unreadable_counter_admits() {
    let store = Arc::new(MemoryStore::new());
    store
        .set_ex("rate_limit:client-a", "garbage", Duration::from_secs(60))
        .await
        .unwrap();
    let limiter = limiter(store, 1, Duration::from_secs(60));

    assert!(limiter.admit("client-a").await);
}

#[tokio::test]
async fn counter_recreated_by_late_increment_still_expires() {
    // Every increment lands after the 100ms window has already expired.
    let store = Arc::new(SlowIncrStore::new(Duration::from_millis(150)));
    let limiter = RateLimiter::new(
        store.clone(),
        RateLimitConfig::new()
            .max_requests(2)
            .window(Duration::from_millis(100)),
    );

    for _ in 0..10 {
        limiter.admit("client-a").await;
    }
    tokio::time::sleep(Duration::from_millis(150)).await;

    assert_eq!(store.get("rate_limit:client-a").await.unwrap(), None);
    assert!(limiter.admit("client-a").await);
}
