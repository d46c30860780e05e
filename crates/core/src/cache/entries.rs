//! Cache entry operations on the SQLite store.
//!
//! Entries live in `cache_entries`, keyed by `(namespace, key)`.

use super::connection::CacheDb;
use super::store::{CachedResponse, NamespaceStats, ResponseType};
use crate::Error;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

impl CacheDb {
    /// Insert or replace entries inside a single transaction.
    ///
    /// Either every entry is written or, on any failure, none are.
    pub async fn upsert_entries(&self, entries: &[CachedResponse]) -> Result<(), Error> {
        let mut rows = Vec::with_capacity(entries.len());
        for entry in entries {
            rows.push((entry.clone(), serde_json::to_string(&entry.headers)?));
        }

        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                {
                    let mut stmt = tx.prepare(
                        "INSERT INTO cache_entries (
                        namespace, key, method, url, status, status_text,
                        headers_json, response_type, body, stored_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                    ON CONFLICT(namespace, key) DO UPDATE SET
                        method = excluded.method,
                        url = excluded.url,
                        status = excluded.status,
                        status_text = excluded.status_text,
                        headers_json = excluded.headers_json,
                        response_type = excluded.response_type,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    )?;

                    for (entry, headers_json) in &rows {
                        stmt.execute(params![
                            &entry.namespace,
                            &entry.key,
                            &entry.method,
                            &entry.url,
                            entry.status,
                            &entry.status_text,
                            headers_json,
                            entry.response_type.as_str(),
                            &entry.body,
                            &entry.stored_at,
                        ])?;
                    }
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get an entry by namespace and cache key.
    ///
    /// Returns None if no such entry exists.
    pub async fn get_entry(&self, namespace: &str, key: &str) -> Result<Option<CachedResponse>, Error> {
        let namespace = namespace.to_string();
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<CachedResponse>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT
                    namespace, key, method, url, status, status_text,
                    headers_json, response_type, body, stored_at
                FROM cache_entries WHERE namespace = ?1 AND key = ?2",
                )?;

                let result = stmt.query_row(params![namespace, key], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, u16>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, String>(6)?,
                        row.get::<_, String>(7)?,
                        row.get::<_, Vec<u8>>(8)?,
                        row.get::<_, String>(9)?,
                    ))
                });

                match result {
                    Ok((namespace, key, method, url, status, status_text, headers_json, response_type, body, stored_at)) => {
                        Ok(Some(CachedResponse {
                            namespace,
                            key,
                            method,
                            url,
                            status,
                            status_text,
                            headers: serde_json::from_str(&headers_json)?,
                            response_type: ResponseType::parse(&response_type)?,
                            body,
                            stored_at,
                        }))
                    }
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Distinct namespaces present in the store.
    pub async fn list_namespaces(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT DISTINCT namespace FROM cache_entries ORDER BY namespace")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every entry in a namespace.
    ///
    /// Returns the number of deleted entries.
    pub async fn delete_entries_in(&self, namespace: &str) -> Result<u64, Error> {
        let namespace = namespace.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let tx = conn.transaction()?;
                let count = tx.execute("DELETE FROM cache_entries WHERE namespace = ?1", params![namespace])?;
                tx.execute("DELETE FROM controller_state WHERE namespace = ?1", params![namespace])?;
                tx.commit()?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Entry counts and body sizes per namespace.
    pub async fn namespace_stats(&self) -> Result<Vec<NamespaceStats>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<NamespaceStats>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT namespace, COUNT(*), COALESCE(SUM(LENGTH(body)), 0)
                     FROM cache_entries GROUP BY namespace ORDER BY namespace",
                )?;
                let stats = stmt
                    .query_map([], |row| {
                        Ok(NamespaceStats {
                            namespace: row.get(0)?,
                            entries: row.get::<_, i64>(1)? as u64,
                            bytes: row.get::<_, i64>(2)? as u64,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(stats)
            })
            .await
            .map_err(Error::from)
    }
}
