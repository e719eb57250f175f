//! State cache: a mutex-protected key/value store of the last observed
//! value for each recognised device key.
//!
//! Reads of an absent key return the empty string (or -1 / false for the
//! typed accessors); writes are atomic with respect to reads, last writer
//! wins.

use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
pub struct StateCache {
    values: Mutex<HashMap<String, String>>,
}

impl StateCache {
    pub fn new() -> Self {
        StateCache {
            values: Mutex::new(HashMap::new()),
        }
    }

    pub fn set(&self, key: &str, value: impl Into<String>) {
        let mut values = self.values.lock().unwrap();
        values.insert(key.to_string(), value.into());
    }

    /// Returns the empty string for an absent key.
    pub fn get(&self, key: &str) -> String {
        self.values
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns -1 for an absent or unparsable key.
    pub fn get_int(&self, key: &str) -> i32 {
        self.values
            .lock()
            .unwrap()
            .get(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(-1)
    }

    /// Returns `false` for an absent key.
    pub fn get_bool(&self, key: &str) -> bool {
        self.values
            .lock()
            .unwrap()
            .get(key)
            .map(|v| v == "true")
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn absent_key_returns_empty_and_sentinel_values() {
        let cache = StateCache::new();
        assert_eq!(cache.get("nope"), "");
        assert_eq!(cache.get_int("nope"), -1);
        assert!(!cache.get_bool("nope"));
    }

    #[test]
    fn last_writer_wins_on_same_key() {
        let cache = StateCache::new();
        cache.set("volume", "10");
        cache.set("volume", "42");
        assert_eq!(cache.get("volume"), "42");
    }

    #[test]
    fn concurrent_writes_to_distinct_keys_all_survive() {
        let cache = Arc::new(StateCache::new());
        let mut handles = Vec::new();
        for i in 0..16 {
            let cache = Arc::clone(&cache);
            handles.push(thread::spawn(move || {
                cache.set(&format!("key{i}"), format!("{i}"));
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        for i in 0..16 {
            assert_eq!(cache.get_int(&format!("key{i}")), i);
        }
    }
}
