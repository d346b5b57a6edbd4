//! Persistent [`ResponseCache`] backed by the `http_cache` table.

use crate::Database;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use sdd_weather::cache::{CacheKey, CachePolicy, CachedResponse, ResponseCache};

impl ResponseCache for Database {
    fn get(&self, key: &CacheKey) -> anyhow::Result<Option<CachedResponse>> {
        let conn = self.conn.borrow();
        let row = conn
            .query_row(
                "SELECT body, stored_at, ttl_seconds FROM http_cache WHERE cache_key = ?1",
                params![key.as_str()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<i64>>(2)?,
                    ))
                },
            )
            .optional()?;

        match row {
            None => Ok(None),
            Some((body, stored_at, ttl_seconds)) => Ok(Some(CachedResponse {
                body,
                stored_at: DateTime::parse_from_rfc3339(&stored_at)?.with_timezone(&Utc),
                policy: CachePolicy::from_ttl_seconds(ttl_seconds),
            })),
        }
    }

    fn put(&self, key: &CacheKey, response: &CachedResponse) -> anyhow::Result<()> {
        self.conn.borrow().execute(
            "INSERT OR REPLACE INTO http_cache (cache_key, body, stored_at, ttl_seconds)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                key.as_str(),
                response.body,
                response.stored_at.to_rfc3339(),
                response.policy.ttl_seconds()
            ],
        )?;
        log::debug!("Cached {} bytes for {}", response.body.len(), key);
        Ok(())
    }
}
