use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestRecord {
    pub method: String,
    pub path: String,
    pub timestamp: DateTime<Utc>,
    pub payload: Value,
}

/// Append-only log of inbound calls, shared by all request handlers.
#[derive(Debug, Clone, Default)]
pub struct RequestHistory {
    entries: Arc<Mutex<Vec<RequestRecord>>>,
}

impl RequestHistory {
    pub fn record(&self, method: impl Into<String>, path: impl Into<String>, payload: Value) {
        let record = RequestRecord {
            method: method.into(),
            path: path.into(),
            timestamp: Utc::now(),
            payload,
        };
        self.entries.lock().push(record);
    }

    pub fn snapshot(&self) -> Vec<RequestRecord> {
        self.entries.lock().clone()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::thread;

    #[test]
    fn test_concurrent_appends_are_all_kept() {
        let history = RequestHistory::default();
        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let history = history.clone();
                thread::spawn(move || {
                    for i in 0..25 {
                        history.record("POST", "/mdk/x", json!({"worker": worker, "i": i}));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(history.len(), 200);

        // each worker's own entries stay in order
        let snapshot = history.snapshot();
        for worker in 0..8 {
            let seen: Vec<i64> = snapshot
                .iter()
                .filter(|r| r.payload["worker"] == json!(worker))
                .map(|r| r.payload["i"].as_i64().unwrap())
                .collect();
            assert_eq!(seen, (0..25).collect::<Vec<_>>());
        }

        history.clear();
        assert!(history.is_empty());
    }
}
