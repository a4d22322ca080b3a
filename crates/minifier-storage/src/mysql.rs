use async_trait::async_trait;
use jiff::Timestamp;
use minifier_core::store::Result;
use minifier_core::{RecordId, RecordStore, ShortCode, StorageError, StoreOp, UrlRecord};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use tracing::debug;

/// Schema for the `url_records` table.
pub const SCHEMA: &str = include_str!("../ddl/mysql/url_records.sql");

/// MySQL implementation of the record store contract.
///
/// Timestamps are stored as unix milliseconds. Uniqueness of `short_code` and
/// `id` is enforced by the table's keys; the violated key decides between
/// [`StorageError::Duplicate`] and [`StorageError::DuplicateId`].
#[derive(Debug, Clone)]
pub struct MySqlRecordStore {
    pool: MySqlPool,
}

impl MySqlRecordStore {
    /// Creates a store from an existing MySQL connection pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Creates a store by opening a new MySQL connection pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = MySqlPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error(StoreOp::Find, e))?;
        Ok(Self::new(pool))
    }

    /// Creates the `url_records` table if it does not exist.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(StoreOp::Insert, e))?;
        debug!("url_records schema ensured");
        Ok(())
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

fn parse_millis(op: StoreOp, column: &str, millis: i64) -> Result<Timestamp> {
    Timestamp::from_millisecond(millis).map_err(|e| StorageError::InvalidData {
        op,
        message: format!("invalid {column} timestamp '{millis}': {e}"),
    })
}

/// Name of the unique key on `short_code` in `url_records.sql`.
const SHORT_CODE_KEY: &str = "uk_url_records_short_code";

/// Which unique key an insert violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UniqueKey {
    ShortCode,
    Id,
}

/// Classifies a unique violation by the key MySQL names in its message,
/// e.g. `Duplicate entry 'x' for key 'url_records.PRIMARY'`.
fn violated_key(message: &str) -> UniqueKey {
    if message.contains(SHORT_CODE_KEY) {
        UniqueKey::ShortCode
    } else if message.contains("PRIMARY") {
        UniqueKey::Id
    } else {
        UniqueKey::ShortCode
    }
}

fn unique_violation(err: &sqlx::Error) -> Option<UniqueKey> {
    let db = err.as_database_error()?;
    db.is_unique_violation().then(|| violated_key(db.message()))
}

fn map_sqlx_error(op: StoreOp, err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout { op, message },
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable { op, message },
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_) => StorageError::InvalidData { op, message },
        _ => StorageError::Query { op, message },
    }
}

fn row_to_record(op: StoreOp, row: &MySqlRow) -> Result<UrlRecord> {
    let get = |column: &str| -> Result<String> {
        row.try_get(column).map_err(|e| map_sqlx_error(op, e))
    };

    let created_at: i64 = row
        .try_get("created_at")
        .map_err(|e| map_sqlx_error(op, e))?;
    let expires_at: i64 = row
        .try_get("expires_at")
        .map_err(|e| map_sqlx_error(op, e))?;
    let custom_alias: Option<String> = row
        .try_get("custom_alias")
        .map_err(|e| map_sqlx_error(op, e))?;

    Ok(UrlRecord {
        id: RecordId::new(get("id")?),
        long_url: get("long_url")?,
        short_code: ShortCode::new_unchecked(get("short_code")?),
        owner_id: get("user_id")?,
        created_at: parse_millis(op, "created_at", created_at)?,
        expires_at: parse_millis(op, "expires_at", expires_at)?,
        custom_alias: custom_alias.map(ShortCode::new_unchecked),
    })
}

const SELECT_COLUMNS: &str =
    "SELECT id, long_url, short_code, user_id, created_at, expires_at, custom_alias FROM url_records";

#[async_trait]
impl RecordStore for MySqlRecordStore {
    async fn insert(&self, record: UrlRecord) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO url_records
                (id, long_url, short_code, user_id, created_at, expires_at, custom_alias)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.id.as_str())
        .bind(&record.long_url)
        .bind(record.short_code.as_str())
        .bind(&record.owner_id)
        .bind(record.created_at.as_millisecond())
        .bind(record.expires_at.as_millisecond())
        .bind(record.custom_alias.as_ref().map(ShortCode::as_str))
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) => match unique_violation(&err) {
                Some(UniqueKey::ShortCode) => {
                    Err(StorageError::Duplicate(record.short_code.to_string()))
                }
                Some(UniqueKey::Id) => Err(StorageError::DuplicateId(record.id.to_string())),
                None => Err(map_sqlx_error(StoreOp::Insert, err)),
            },
        }
    }

    async fn find_by_code(&self, code: &ShortCode) -> Result<UrlRecord> {
        let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE short_code = ? LIMIT 1"))
            .bind(code.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(StoreOp::Find, e))?;

        match row {
            Some(row) => row_to_record(StoreOp::Find, &row),
            None => Err(StorageError::NotFound(code.to_string())),
        }
    }

    async fn find_by_id(&self, id: &RecordId) -> Result<UrlRecord> {
        let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE id = ? LIMIT 1"))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(StoreOp::Find, e))?;

        match row {
            Some(row) => row_to_record(StoreOp::Find, &row),
            None => Err(StorageError::NotFound(id.to_string())),
        }
    }

    async fn delete(&self, id: &RecordId) -> Result<()> {
        let result = sqlx::query("DELETE FROM url_records WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(StoreOp::Delete, e))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn code_available(&self, code: &ShortCode) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM url_records WHERE short_code = ?")
            .bind(code.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(StoreOp::Count, e))?;

        Ok(count == 0)
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<UrlRecord>> {
        let rows = sqlx::query(&format!("{SELECT_COLUMNS} WHERE user_id = ?"))
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(StoreOp::List, e))?;

        rows.iter()
            .map(|row| row_to_record(StoreOp::List, row))
            .collect()
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}
