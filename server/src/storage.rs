use std::pin::Pin;
use std::time::Duration;

use futures_util::stream::Stream;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use thiserror::Error;
use tracing::debug;

use crate::models::{Change, ChangeKind, NewUpdate, StoredUpdate};

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const CHANGE_BATCH: i64 = 100;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("relation does not exist: {0}")]
    MissingTable(String),

    #[error("update {0} not found")]
    NotFound(String),

    #[error("Database error: {0}")]
    Sql(sqlx::Error),

    #[error("invalid stored payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("invalid change kind: {0}")]
    ChangeKind(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        let missing_table = err
            .as_database_error()
            .map(|db| db.message().starts_with("no such table"))
            .unwrap_or(false);

        if missing_table {
            StorageError::MissingTable(err.to_string())
        } else {
            StorageError::Sql(err)
        }
    }
}

#[derive(sqlx::FromRow)]
struct UpdateRow {
    id: String,
    message: String,
    timestamp: i64,
    cities: Option<String>,
    traffic_status: Option<String>,
    checkpoint_status: Option<String>,
    incidents: Option<String>,
}

impl TryFrom<UpdateRow> for StoredUpdate {
    type Error = StorageError;

    fn try_from(row: UpdateRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            message: row.message,
            timestamp: row.timestamp,
            cities: decode_column(row.cities)?,
            traffic_status: decode_column(row.traffic_status)?,
            checkpoint_status: decode_column(row.checkpoint_status)?,
            incidents: decode_column(row.incidents)?,
        })
    }
}

fn decode_column<T: DeserializeOwned>(column: Option<String>) -> Result<Option<T>, StorageError> {
    column
        .map(|text| serde_json::from_str(&text))
        .transpose()
        .map_err(StorageError::from)
}

fn encode_column<T: Serialize>(value: &Option<T>) -> Result<Option<String>, StorageError> {
    value
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(StorageError::from)
}

pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Most recent updates first.
    pub async fn list_latest(&self, limit: u32) -> Result<Vec<StoredUpdate>, StorageError> {
        let rows = sqlx::query_as::<_, UpdateRow>(
            "SELECT id, message, timestamp, cities, traffic_status, checkpoint_status, incidents
             FROM traffic_updates ORDER BY timestamp DESC, rowid DESC LIMIT ?",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(StoredUpdate::try_from).collect()
    }

    pub async fn get(&self, id: &str) -> Result<StoredUpdate, StorageError> {
        let row = sqlx::query_as::<_, UpdateRow>(
            "SELECT id, message, timestamp, cities, traffic_status, checkpoint_status, incidents
             FROM traffic_updates WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| StorageError::NotFound(id.to_string()))?
            .try_into()
    }

    pub async fn insert(&self, content: NewUpdate) -> Result<StoredUpdate, StorageError> {
        let update = StoredUpdate::new(content);
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO traffic_updates
                (id, message, timestamp, cities, traffic_status, checkpoint_status, incidents)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&update.id)
        .bind(&update.message)
        .bind(update.timestamp)
        .bind(encode_column(&update.cities)?)
        .bind(encode_column(&update.traffic_status)?)
        .bind(encode_column(&update.checkpoint_status)?)
        .bind(encode_column(&update.incidents)?)
        .execute(&mut *tx)
        .await?;

        let ordinal = record_change(&mut tx, ChangeKind::Insert, &update).await?;
        tx.commit().await?;

        debug!(id = %update.id, ordinal, "stored traffic update");
        Ok(update)
    }

    /// Replaces the content of an update, keeping its id and timestamp.
    pub async fn revise(&self, id: &str, content: NewUpdate) -> Result<StoredUpdate, StorageError> {
        let current = self.get(id).await?;
        let update = StoredUpdate {
            timestamp: current.timestamp,
            ..StoredUpdate::with_id(current.id, content)
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE traffic_updates
             SET message = ?, cities = ?, traffic_status = ?, checkpoint_status = ?, incidents = ?
             WHERE id = ?",
        )
        .bind(&update.message)
        .bind(encode_column(&update.cities)?)
        .bind(encode_column(&update.traffic_status)?)
        .bind(encode_column(&update.checkpoint_status)?)
        .bind(encode_column(&update.incidents)?)
        .bind(&update.id)
        .execute(&mut *tx)
        .await?;

        let ordinal = record_change(&mut tx, ChangeKind::Update, &update).await?;
        tx.commit().await?;

        debug!(id = %update.id, ordinal, "revised traffic update");
        Ok(update)
    }

    pub async fn delete(&self, id: &str) -> Result<StoredUpdate, StorageError> {
        let removed = self.get(id).await?;
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM traffic_updates WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let ordinal = record_change(&mut tx, ChangeKind::Delete, &removed).await?;
        tx.commit().await?;

        debug!(id = %removed.id, ordinal, "deleted traffic update");
        Ok(removed)
    }

    /// Ordinal of the newest change, 0 when the log is empty.
    pub async fn latest_ordinal(&self) -> Result<u64, StorageError> {
        let latest: Option<i64> = sqlx::query("SELECT MAX(ordinal) AS max_ord FROM traffic_changes")
            .fetch_one(&self.pool)
            .await?
            .get("max_ord");

        Ok(latest.unwrap_or(0) as u64)
    }

    async fn changes_batch(&self, after: i64) -> Result<Vec<Change>, StorageError> {
        let rows = sqlx::query_as::<_, (i64, String, String)>(
            "SELECT ordinal, kind, payload FROM traffic_changes
             WHERE ordinal > ? ORDER BY ordinal LIMIT ?",
        )
        .bind(after)
        .bind(CHANGE_BATCH)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(ordinal, kind, payload)| {
                Ok(Change {
                    ordinal: ordinal as u64,
                    kind: kind.parse().map_err(StorageError::ChangeKind)?,
                    update: serde_json::from_str(&payload)?,
                })
            })
            .collect()
    }

    /// Endless stream of changes committed after `ordinal`.
    ///
    /// Polls the change log; the stream ends after yielding the first error.
    pub fn changes_after(
        &self,
        ordinal: u64,
    ) -> Pin<Box<dyn Stream<Item = Result<Change, StorageError>> + Send>> {
        let storage = Storage::new(self.pool.clone());
        Box::pin(async_stream::stream! {
            let mut ordinal = ordinal as i64;

            loop {
                let batch = match storage.changes_batch(ordinal).await {
                    Ok(batch) => batch,
                    Err(e) => {
                        yield Err(e);
                        break;
                    }
                };

                if batch.is_empty() {
                    tokio::time::sleep(POLL_INTERVAL).await;
                    continue;
                }

                for change in batch {
                    ordinal = change.ordinal as i64;
                    yield Ok(change);
                }
            }
        })
    }
}

async fn record_change(
    tx: &mut Transaction<'_, Sqlite>,
    kind: ChangeKind,
    update: &StoredUpdate,
) -> Result<i64, StorageError> {
    let payload = serde_json::to_string(update)?;
    let row = sqlx::query(
        "INSERT INTO traffic_changes (kind, update_id, payload, timestamp)
         VALUES (?, ?, ?, ?) RETURNING ordinal",
    )
    .bind(kind.as_str())
    .bind(&update.id)
    .bind(payload)
    .bind(chrono::Utc::now().timestamp_millis())
    .fetch_one(&mut **tx)
    .await?;

    Ok(row.get("ordinal"))
}
