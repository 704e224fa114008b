//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the store and engine against a simple LRU model.

use proptest::prelude::*;
use std::collections::VecDeque;

use crate::cache::{Cache, CacheStore, CancelToken};

// == Strategies ==
/// Small key space so sequences revisit keys often
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-h]{1,2}".prop_map(|s| s)
}

fn value_strategy() -> impl Strategy<Value = u32> {
    any::<u32>()
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: u32 },
    Get { key: String },
    Flush,
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        6 => (key_strategy(), value_strategy())
            .prop_map(|(key, value)| CacheOp::Set { key, value }),
        4 => key_strategy().prop_map(|key| CacheOp::Get { key }),
        1 => Just(CacheOp::Flush),
    ]
}

// == Reference Model ==
/// Naive LRU: front = least recently used.
struct Model {
    order: VecDeque<(String, u32)>,
    capacity: usize,
}

impl Model {
    fn new(capacity: usize) -> Self {
        Self {
            order: VecDeque::new(),
            capacity,
        }
    }

    fn get(&mut self, key: &str) -> Option<u32> {
        let pos = self.order.iter().position(|(k, _)| k == key)?;
        let entry = self.order.remove(pos)?;
        let value = entry.1;
        self.order.push_back(entry);
        Some(value)
    }

    fn set(&mut self, key: String, value: u32) {
        if let Some(pos) = self.order.iter().position(|(k, _)| *k == key) {
            self.order.remove(pos);
        } else if self.order.len() == self.capacity {
            self.order.pop_front();
        }
        self.order.push_back((key, value));
    }

    fn keys(&self) -> Vec<String> {
        self.order.iter().map(|(k, _)| k.clone()).collect()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // Every operation sequence leaves the store in the same order as the
    // model, within capacity.
    #[test]
    fn prop_matches_lru_model(
        capacity in 1usize..6,
        ops in prop::collection::vec(cache_op_strategy(), 1..80)
    ) {
        let mut store = CacheStore::new(capacity).unwrap();
        let mut model = Model::new(capacity);

        for op in ops {
            match op {
                CacheOp::Set { key, value } => {
                    store.set(key.clone(), value);
                    model.set(key, value);
                }
                CacheOp::Get { key } => {
                    prop_assert_eq!(store.get(&key).copied(), model.get(&key));
                }
                CacheOp::Flush => {
                    prop_assert_eq!(store.flush(), model.order.len());
                    model.order.clear();
                }
            }

            prop_assert!(store.len() <= capacity);
            prop_assert_eq!(store.keys(), model.keys());
        }
    }

    // Distinct keys beyond capacity evict in insertion order.
    #[test]
    fn prop_eviction_order(capacity in 1usize..20, extra in 1usize..10) {
        let mut store = CacheStore::new(capacity).unwrap();
        let total = capacity + extra;

        for i in 0..total {
            store.set(format!("k{i}"), i as u32);
        }

        prop_assert_eq!(store.len(), capacity);
        for i in 0..extra {
            let key = format!("k{}", i);
            prop_assert!(!store.contains(&key));
        }
        let expected_head = format!("k{extra}");
        prop_assert_eq!(store.least_recent(), Some(expected_head.as_str()));
        prop_assert_eq!(store.stats().evictions, extra as u64);
    }

    // Overwriting never changes size and moves the key to the tail.
    #[test]
    fn prop_overwrite_preserves_size(
        keys in prop::collection::hash_set(key_strategy(), 1..8),
        pick in any::<prop::sample::Index>(),
        value in value_strategy()
    ) {
        let keys: Vec<String> = keys.into_iter().collect();
        let mut store = CacheStore::new(keys.len()).unwrap();
        for key in &keys {
            store.set(key.clone(), 0);
        }

        let target = pick.get(&keys).clone();
        store.set(target.clone(), value);

        prop_assert_eq!(store.len(), keys.len());
        prop_assert_eq!(store.most_recent(), Some(target.as_str()));
        prop_assert_eq!(store.get(&target).copied(), Some(value));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    // set followed by get through the async engine returns the stored value.
    #[test]
    fn prop_engine_round_trip(key in key_strategy(), value in value_strategy()) {
        let found = tokio_test::block_on(async {
            let cache = Cache::new(4).unwrap();
            let token = CancelToken::new();
            cache.set(&token, key.clone(), value).await.unwrap();
            cache.get(&token, key.clone()).await.unwrap()
        });

        prop_assert_eq!(found, Some(value));
    }
}
