use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use spin_sdk::http::Response;
use spin_sdk::key_value::Store;

#[derive(Serialize, Deserialize)]
struct CachedPage {
    content_type: String,
    body: Vec<u8>,
    stored_at: String,
}

/// Whole-page cache with a time-boxed validity window, backed by the
/// key-value store. Handlers receive it explicitly; nothing reads it as
/// ambient global state.
pub struct PageCache<'a> {
    store: &'a Store,
    ttl_secs: i64,
}

fn cache_key(path: &str) -> String {
    format!("cache:{}", path)
}

fn is_fresh(stored_at: &str, now: DateTime<Utc>, ttl_secs: i64) -> bool {
    match DateTime::parse_from_rfc3339(stored_at) {
        Ok(stored) => (now - stored.with_timezone(&Utc)).num_seconds() < ttl_secs,
        Err(_) => false,
    }
}

impl<'a> PageCache<'a> {
    pub fn new(store: &'a Store, ttl_secs: i64) -> Self {
        Self { store, ttl_secs }
    }

    /// A cached response for `path`, if one exists and is still inside
    /// the validity window. Stale entries are dropped on read.
    pub fn get(&self, path: &str) -> anyhow::Result<Option<Response>> {
        let key = cache_key(path);
        let Some(page) = self.store.get_json::<CachedPage>(&key)? else {
            return Ok(None);
        };

        if !is_fresh(&page.stored_at, Utc::now(), self.ttl_secs) {
            self.store.delete(&key)?;
            return Ok(None);
        }

        Ok(Some(
            Response::builder()
                .status(200)
                .header("Content-Type", page.content_type.as_str())
                .body(page.body)
                .build(),
        ))
    }

    pub fn put(&self, path: &str, content_type: &str, body: &[u8]) -> anyhow::Result<()> {
        let page = CachedPage {
            content_type: content_type.to_string(),
            body: body.to_vec(),
            stored_at: Utc::now().to_rfc3339(),
        };
        self.store.set_json(&cache_key(path), &page)?;
        Ok(())
    }

    /// Drop the cached entry for `path`, fresh or not.
    pub fn clear(&self, path: &str) -> anyhow::Result<()> {
        self.store.delete(&cache_key(path))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn entry_is_fresh_inside_window() {
        let now = Utc::now();
        let stored = (now - Duration::seconds(5)).to_rfc3339();
        assert!(is_fresh(&stored, now, 20));
    }

    #[test]
    fn entry_expires_after_window() {
        let now = Utc::now();
        let stored = (now - Duration::seconds(21)).to_rfc3339();
        assert!(!is_fresh(&stored, now, 20));
    }

    #[test]
    fn unparseable_timestamp_counts_as_stale() {
        assert!(!is_fresh("not-a-date", Utc::now(), 20));
    }
}
