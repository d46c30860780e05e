//! Pending offline submission queue.
//!
//! Submissions are drained oldest-first by the background-sync pass.

use super::connection::CacheDb;
use super::store::PendingSubmission;
use crate::Error;
use tokio_rusqlite::params;

impl CacheDb {
    /// Append a submission to the queue for `tag`.
    ///
    /// Returns the id assigned to it.
    pub async fn insert_submission(&self, tag: &str, payload: &serde_json::Value) -> Result<i64, Error> {
        let tag = tag.to_string();
        let payload_json = serde_json::to_string(payload)?;
        let created_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<i64, Error> {
                conn.execute(
                    "INSERT INTO pending_submissions (tag, payload_json, created_at) VALUES (?1, ?2, ?3)",
                    params![tag, payload_json, created_at],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
            .map_err(Error::from)
    }

    /// Queued submissions for `tag`, in insertion order.
    pub async fn list_submissions(&self, tag: &str) -> Result<Vec<PendingSubmission>, Error> {
        let tag = tag.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<PendingSubmission>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT id, tag, payload_json, created_at, attempts, last_error
                     FROM pending_submissions WHERE tag = ?1 ORDER BY id ASC",
                )?;
                let rows = stmt
                    .query_map(params![tag], |row| {
                        Ok((
                            row.get::<_, i64>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, String>(3)?,
                            row.get::<_, u32>(4)?,
                            row.get::<_, Option<String>>(5)?,
                        ))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;

                let mut submissions = Vec::with_capacity(rows.len());
                for (id, tag, payload_json, created_at, attempts, last_error) in rows {
                    submissions.push(PendingSubmission {
                        id,
                        tag,
                        payload: serde_json::from_str(&payload_json)?,
                        created_at,
                        attempts,
                        last_error,
                    });
                }
                Ok(submissions)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a submission by id.
    pub async fn delete_submission(&self, id: i64) -> Result<bool, Error> {
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM pending_submissions WHERE id = ?1", params![id])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Increment the attempt counter and remember the last error.
    ///
    /// Returns the new attempt count, or `CacheMiss` if the id is unknown.
    pub async fn bump_submission_attempts(&self, id: i64, error: &str) -> Result<u32, Error> {
        let error = error.to_string();
        self.conn
            .call(move |conn| -> Result<u32, Error> {
                let updated = conn.execute(
                    "UPDATE pending_submissions SET attempts = attempts + 1, last_error = ?2 WHERE id = ?1",
                    params![id, error],
                )?;
                if updated == 0 {
                    return Err(Error::CacheMiss(format!("submission {id}")));
                }
                let attempts =
                    conn.query_row("SELECT attempts FROM pending_submissions WHERE id = ?1", params![id], |row| {
                        row.get(0)
                    })?;
                Ok(attempts)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_queue_is_fifo_per_tag() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let first = db.insert_submission("contact-form-sync", &json!({"name": "a"})).await.unwrap();
        db.insert_submission("other", &json!({"name": "x"})).await.unwrap();
        let second = db.insert_submission("contact-form-sync", &json!({"name": "b"})).await.unwrap();

        let pending = db.list_submissions("contact-form-sync").await.unwrap();
        let ids: Vec<i64> = pending.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![first, second]);
        assert_eq!(pending[0].payload, json!({"name": "a"}));
        assert_eq!(pending[0].attempts, 0);
    }

    #[tokio::test]
    async fn test_delete_submission() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let id = db.insert_submission("contact-form-sync", &json!({})).await.unwrap();

        assert!(db.delete_submission(id).await.unwrap());
        assert!(!db.delete_submission(id).await.unwrap());
        assert!(db.list_submissions("contact-form-sync").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bump_attempts() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let id = db.insert_submission("contact-form-sync", &json!({})).await.unwrap();

        assert_eq!(db.bump_submission_attempts(id, "timeout").await.unwrap(), 1);
        assert_eq!(db.bump_submission_attempts(id, "refused").await.unwrap(), 2);

        let pending = db.list_submissions("contact-form-sync").await.unwrap();
        assert_eq!(pending[0].last_error.as_deref(), Some("refused"));
    }

    #[tokio::test]
    async fn test_bump_unknown_submission() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let result = db.bump_submission_attempts(42, "timeout").await;
        assert!(matches!(result, Err(Error::CacheMiss(_))));
    }
}
