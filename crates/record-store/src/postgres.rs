use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Collection, Filter, Record, RecordId, RecordStoreError, Result, UniqueKey, Version, Write,
    WriteBatch, store::RecordStore,
};

const RECORD_COLUMNS: &str = "collection, id, version, data, created_at, updated_at";

/// PostgreSQL-backed record store implementation.
///
/// Each batch runs in one transaction. Updated rows are locked with
/// `SELECT ... FOR UPDATE` before their version is checked, and unique field
/// checks are serialized with transaction-scoped advisory locks.
#[derive(Clone)]
pub struct PostgresRecordStore {
    pool: PgPool,
}

impl PostgresRecordStore {
    /// Creates a new PostgreSQL record store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_record(row: PgRow) -> Result<Record> {
        let collection: String = row.try_get("collection")?;
        let collection = collection
            .parse::<Collection>()
            .map_err(RecordStoreError::InvalidWrite)?;

        Ok(Record {
            collection,
            id: RecordId::from_uuid(row.try_get::<Uuid, _>("id")?),
            version: Version::new(row.try_get("version")?),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            data: row.try_get("data")?,
        })
    }

    async fn apply_insert(
        tx: &mut Transaction<'_, Postgres>,
        collection: Collection,
        id: RecordId,
        data: &serde_json::Value,
        unique: &[UniqueKey],
        now: chrono::DateTime<Utc>,
    ) -> Result<Record> {
        for key in unique {
            let lock_key = format!("{}:{}:{}", collection, key.field, key.value);
            sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
                .bind(lock_key)
                .execute(&mut **tx)
                .await?;

            let taken: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM records WHERE collection = $1 AND data -> $2 = $3)",
            )
            .bind(collection.as_str())
            .bind(&key.field)
            .bind(&key.value)
            .fetch_one(&mut **tx)
            .await?;

            if taken {
                return Err(RecordStoreError::UniqueViolation {
                    collection,
                    field: key.field.clone(),
                    value: key.value_text(),
                });
            }
        }

        let row = sqlx::query(&format!(
            "INSERT INTO records (collection, id, version, data, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $5) RETURNING {RECORD_COLUMNS}"
        ))
        .bind(collection.as_str())
        .bind(id.as_uuid())
        .bind(Version::first().as_i64())
        .bind(data)
        .bind(now)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("records_pkey")
            {
                return RecordStoreError::DuplicateId { collection, id };
            }
            RecordStoreError::Database(e)
        })?;

        Self::row_to_record(row)
    }

    async fn apply_update(
        tx: &mut Transaction<'_, Postgres>,
        collection: Collection,
        id: RecordId,
        patch: &serde_json::Value,
        expected_version: Option<Version>,
        now: chrono::DateTime<Utc>,
    ) -> Result<Record> {
        let current: Option<i64> = sqlx::query_scalar(
            "SELECT version FROM records WHERE collection = $1 AND id = $2 FOR UPDATE",
        )
        .bind(collection.as_str())
        .bind(id.as_uuid())
        .fetch_optional(&mut **tx)
        .await?;

        let actual = current
            .map(Version::new)
            .ok_or(RecordStoreError::NotFound { collection, id })?;

        if let Some(expected) = expected_version
            && actual != expected
        {
            return Err(RecordStoreError::ConcurrencyConflict {
                collection,
                id,
                expected,
                actual,
            });
        }

        let row = sqlx::query(&format!(
            "UPDATE records SET data = data || $3, version = version + 1, updated_at = $4 \
             WHERE collection = $1 AND id = $2 RETURNING {RECORD_COLUMNS}"
        ))
        .bind(collection.as_str())
        .bind(id.as_uuid())
        .bind(patch)
        .bind(now)
        .fetch_one(&mut **tx)
        .await?;

        Self::row_to_record(row)
    }
}

#[async_trait]
impl RecordStore for PostgresRecordStore {
    async fn commit(&self, batch: WriteBatch) -> Result<Vec<Record>> {
        batch.validate()?;

        let started = std::time::Instant::now();
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let mut records = Vec::with_capacity(batch.len());

        for write in batch.writes() {
            let record = match write {
                Write::Insert {
                    collection,
                    id,
                    data,
                    unique,
                } => Self::apply_insert(&mut tx, *collection, *id, data, unique, now).await,
                Write::Update {
                    collection,
                    id,
                    patch,
                    expected_version,
                } => {
                    Self::apply_update(&mut tx, *collection, *id, patch, *expected_version, now)
                        .await
                }
            };

            match record {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::debug!(error = %e, "rolling back batch");
                    metrics::counter!("record_store_rollbacks_total").increment(1);
                    tx.rollback().await?;
                    return Err(e);
                }
            }
        }

        tx.commit().await?;
        metrics::histogram!("record_store_commit_seconds").record(started.elapsed().as_secs_f64());
        Ok(records)
    }

    async fn get(&self, collection: Collection, id: RecordId) -> Result<Option<Record>> {
        let row: Option<PgRow> = sqlx::query(&format!(
            "SELECT {RECORD_COLUMNS} FROM records WHERE collection = $1 AND id = $2"
        ))
        .bind(collection.as_str())
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_record).transpose()
    }

    async fn find(&self, collection: Collection, filter: Filter) -> Result<Vec<Record>> {
        let mut sql = format!("SELECT {RECORD_COLUMNS} FROM records WHERE collection = $1");
        let mut param_count = 1;

        // Build dynamic query
        for (_, value) in &filter.predicates {
            param_count += 1;
            let field_param = param_count;
            if value.is_null() {
                sql.push_str(&format!(
                    " AND (data -> ${field_param} IS NULL OR data -> ${field_param} = 'null'::jsonb)"
                ));
            } else {
                param_count += 1;
                sql.push_str(&format!(" AND data -> ${field_param} = ${param_count}"));
            }
        }

        sql.push_str(" ORDER BY created_at ASC, id ASC");

        if filter.limit.is_some() {
            param_count += 1;
            sql.push_str(&format!(" LIMIT ${param_count}"));
        }
        if filter.offset.is_some() {
            param_count += 1;
            sql.push_str(&format!(" OFFSET ${param_count}"));
        }

        // Bind parameters in the same order they were numbered
        let mut query = sqlx::query(&sql).bind(collection.as_str());
        for (field, value) in &filter.predicates {
            query = query.bind(field);
            if !value.is_null() {
                query = query.bind(value);
            }
        }
        if let Some(limit) = filter.limit {
            query = query.bind(limit as i64);
        }
        if let Some(offset) = filter.offset {
            query = query.bind(offset as i64);
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_record).collect()
    }
}
