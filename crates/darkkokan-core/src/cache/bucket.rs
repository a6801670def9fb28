use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{Request, Response};

/// Envelope recording when a value was written to storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        let now = Utc::now();
        (now - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew (negative ages)
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }
}

/// A named, versioned store of response snapshots keyed by request identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub label: String,
    #[serde(default)]
    entries: HashMap<String, Response>,
}

impl Bucket {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            entries: HashMap::new(),
        }
    }

    pub fn get(&self, request: &Request) -> Option<&Response> {
        self.entries.get(&request.cache_key())
    }

    pub fn put(&mut self, request: &Request, response: Response) {
        self.entries.insert(request.cache_key(), response);
    }

    pub fn contains(&self, request: &Request) -> bool {
        self.entries.contains_key(&request.cache_key())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_bucket_put_and_get() {
        let mut bucket = Bucket::new("v1");
        let request = Request::get("/index.html");
        bucket.put(&request, Response::new(200, "<html>"));

        assert!(bucket.contains(&request));
        assert_eq!(bucket.get(&request).map(|r| r.status), Some(200));
        assert!(bucket.get(&Request::get("/missing")).is_none());
        assert_eq!(bucket.len(), 1);
    }

    #[test]
    fn test_bucket_put_replaces_same_identity() {
        let mut bucket = Bucket::new("v1");
        let request = Request::get("/css/style.css");
        bucket.put(&request, Response::new(200, "a"));
        bucket.put(&request, Response::new(200, "b"));
        assert_eq!(bucket.len(), 1);
        assert_eq!(bucket.get(&request).map(Response::text), Some("b".to_string()));
    }

    #[test]
    fn test_cached_data_age_display() {
        let fresh = CachedData::new(Bucket::new("v1"));
        assert_eq!(fresh.age_display(), "just now");

        let mut old = CachedData::new(Bucket::new("v1"));
        old.cached_at = Utc::now() - Duration::minutes(45);
        assert_eq!(old.age_display(), "45m ago");

        old.cached_at = Utc::now() - Duration::minutes(95);
        assert_eq!(old.age_display(), "2h ago");

        old.cached_at = Utc::now() - Duration::hours(26);
        assert_eq!(old.age_display(), "1d ago");
    }
}
