//! Integration Tests for the Cache Engine
//!
//! Exercises the public engine API under concurrency and cancellation.

use std::time::{Duration, Instant};

use lrucache::{Cache, CacheError, CancelToken};

fn token() -> CancelToken {
    CancelToken::new()
}

async fn settle<V: Clone + Send + 'static>(cache: &Cache<V>) {
    let started = Instant::now();
    while cache.in_flight() > 0 {
        assert!(
            started.elapsed() < Duration::from_secs(10),
            "background operations never finished"
        );
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}

#[tokio::test]
async fn test_eviction_order() {
    let capacity = 5;
    let cache = Cache::new(capacity).unwrap();

    for i in 1..=capacity + 1 {
        cache.set(&token(), format!("k{i}"), i).await.unwrap();
    }

    let keys = cache.keys().await;
    assert_eq!(keys.len(), capacity);
    assert_eq!(keys.first().map(String::as_str), Some("k2"));
    assert_eq!(cache.get(&token(), "k1").await.unwrap(), None);
    for i in 2..=capacity + 1 {
        assert_eq!(cache.get(&token(), format!("k{i}")).await.unwrap(), Some(i));
    }
}

#[tokio::test]
async fn test_overwrite_preserves_size() {
    let cache = Cache::new(3).unwrap();
    for key in ["a", "b", "c"] {
        cache.set(&token(), key, 0).await.unwrap();
    }

    cache.set(&token(), "b", 1).await.unwrap();

    assert_eq!(cache.len().await, 3);
    assert_eq!(cache.keys().await, vec!["a", "c", "b"]);
    assert_eq!(cache.stats().await.evictions, 0);
}

#[tokio::test]
async fn test_capacity_one() {
    let cache = Cache::new(1).unwrap();

    for i in 0..5 {
        cache.set(&token(), "same", i).await.unwrap();
    }
    assert_eq!(cache.stats().await.evictions, 0);
    assert_eq!(cache.get(&token(), "same").await.unwrap(), Some(4));

    cache.set(&token(), "other", 9).await.unwrap();
    assert_eq!(cache.keys().await, vec!["other"]);
    assert_eq!(cache.stats().await.evictions, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_mixed_keys_keep_invariant() {
    let capacity = 16;
    let cache = Cache::new(capacity).unwrap();

    let mut handles = Vec::new();
    for worker in 0..8 {
        let cache = cache.clone();
        handles.push(tokio::spawn(async move {
            for i in 0..200u32 {
                let key = format!("k{}", (i * 7 + worker) % 40);
                cache.set(&CancelToken::new(), key.clone(), i).await.unwrap();
                cache.get(&CancelToken::new(), key).await.unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let keys = cache.keys().await;
    let stats = cache.stats().await;
    assert_eq!(keys.len(), capacity);
    assert_eq!(stats.size, capacity);

    let mut unique = keys.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), keys.len(), "duplicate keys in recency list");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cancellation_under_load_drains() {
    let cache = Cache::new(8).unwrap();

    let mut handles = Vec::new();
    for worker in 0..16u32 {
        let cache = cache.clone();
        handles.push(tokio::spawn(async move {
            let mut timed_out = 0;
            for i in 0..50u32 {
                let token = CancelToken::new();
                if i % 2 == 0 {
                    token.cancel();
                }
                match cache.set(&token, format!("k{}", (worker + i) % 12), i).await {
                    Ok(()) => {}
                    Err(err) => {
                        assert!(err.is_timeout());
                        timed_out += 1;
                    }
                }
            }
            timed_out
        }));
    }

    let mut timed_out = 0;
    for handle in handles {
        timed_out += handle.await.unwrap();
    }
    assert_eq!(timed_out, 16 * 25);

    settle(&cache).await;
    let stats = cache.stats().await;
    assert_eq!(stats.in_flight, 0);
    assert_eq!(stats.size, 8);
}

#[tokio::test]
async fn test_fired_token_returns_promptly() {
    let cache: Cache<u32> = Cache::new(4).unwrap();
    let token = CancelToken::new();
    token.cancel();

    let started = Instant::now();
    let result = cache.get(&token, "k").await;

    assert!(matches!(result, Err(CacheError::Cancelled)));
    assert!(started.elapsed() < Duration::from_secs(1));
}
