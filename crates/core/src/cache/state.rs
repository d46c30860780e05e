//! Saved controller lifecycle state.

use super::connection::CacheDb;
use super::store::Lifecycle;
use crate::Error;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

impl CacheDb {
    /// Saved lifecycle state of `namespace`.
    pub async fn get_lifecycle(&self, namespace: &str) -> Result<Option<Lifecycle>, Error> {
        let namespace = namespace.to_string();
        self.conn
            .call(move |conn| -> Result<Option<Lifecycle>, Error> {
                let result = conn.query_row(
                    "SELECT lifecycle FROM controller_state WHERE namespace = ?1",
                    params![namespace],
                    |row| row.get::<_, String>(0),
                );
                match result {
                    Ok(state) => Ok(Some(Lifecycle::parse(&state)?)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or replace the lifecycle state of `namespace`.
    pub async fn put_lifecycle(&self, namespace: &str, state: Lifecycle) -> Result<(), Error> {
        let namespace = namespace.to_string();
        let updated_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO controller_state (namespace, lifecycle, updated_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT(namespace) DO UPDATE SET
                        lifecycle = excluded.lifecycle,
                        updated_at = excluded.updated_at",
                    params![namespace, state.as_str(), updated_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}
