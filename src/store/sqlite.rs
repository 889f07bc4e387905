//! SQLite record store.
//!
//! Records live in a single `dns_records` table. Lookups compare `LOWER()`
//! of name and zone and order by rowid, so the oldest row wins ties.

use async_trait::async_trait;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous,
};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use super::{RecordStore, Result, TypeFilter};
use crate::config::DatabaseConfig;
use crate::error::StoreError;
use crate::record::DnsRecord;

const SELECT_COLUMNS: &str = "SELECT name, zone, rtype, value, priority, ttl, user FROM dns_records";

/// SQLite-backed record store.
#[derive(Debug, Clone)]
pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    /// Open (creating if missing) the database described by `config`.
    pub async fn open(config: &DatabaseConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.create_tables().await?;
        info!(url = %config.url, "SQLite record store opened");
        Ok(store)
    }

    /// Open a private in-memory database.
    ///
    /// Every SQLite connection to `:memory:` is its own database, so the pool
    /// is pinned to one connection that never expires.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.create_tables().await?;
        Ok(store)
    }

    /// Close the pool. Later calls fail with a database error.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn create_tables(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS dns_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                zone TEXT NOT NULL,
                rtype INTEGER NOT NULL,
                value TEXT NOT NULL DEFAULT '',
                priority TEXT NOT NULL DEFAULT '',
                ttl INTEGER NOT NULL,
                user TEXT NOT NULL DEFAULT ''
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_dns_records_name_zone \
             ON dns_records(LOWER(name), LOWER(zone))",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn from_row(row: &SqliteRow) -> Result<DnsRecord> {
        let rtype: i64 = row.try_get("rtype")?;
        let ttl: i64 = row.try_get("ttl")?;

        Ok(DnsRecord {
            name: row.try_get("name")?,
            zone: row.try_get("zone")?,
            rtype: u16::try_from(rtype)
                .map_err(|_| StoreError::InvalidData(format!("record type {rtype} out of range")))?,
            value: row.try_get("value")?,
            priority: row.try_get("priority")?,
            ttl: u32::try_from(ttl)
                .map_err(|_| StoreError::InvalidData(format!("ttl {ttl} out of range")))?,
            user: row.try_get("user")?,
        })
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn find_one(&self, name: &str, zone: &str) -> Result<Option<DnsRecord>> {
        let sql = format!(
            "{SELECT_COLUMNS} WHERE LOWER(name) = LOWER(?1) AND LOWER(zone) = LOWER(?2) \
             ORDER BY id LIMIT 1"
        );
        let row = sqlx::query(&sql)
            .bind(name)
            .bind(zone)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::from_row).transpose()
    }

    async fn find_all(
        &self,
        name: &str,
        zone: &str,
        filter: TypeFilter,
    ) -> Result<Vec<DnsRecord>> {
        let base =
            format!("{SELECT_COLUMNS} WHERE LOWER(name) = LOWER(?1) AND LOWER(zone) = LOWER(?2)");
        let sql = match filter {
            TypeFilter::Any => format!("{base} ORDER BY id"),
            TypeFilter::Exactly(_) => format!("{base} AND rtype = ?3 ORDER BY id"),
            TypeFilter::Except(_) => format!("{base} AND rtype != ?3 ORDER BY id"),
        };

        let mut q = sqlx::query(&sql).bind(name).bind(zone);
        if let TypeFilter::Exactly(t) | TypeFilter::Except(t) = filter {
            q = q.bind(i64::from(u16::from(t)));
        }

        let rows = q.fetch_all(&self.pool).await?;
        debug!(name, zone, ?filter, rows = rows.len(), "find_all");
        rows.iter().map(Self::from_row).collect()
    }

    async fn insert(&self, record: &DnsRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO dns_records (name, zone, rtype, value, priority, ttl, user) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(record.name.as_str())
        .bind(record.zone.as_str())
        .bind(i64::from(record.rtype))
        .bind(record.value.as_str())
        .bind(record.priority.as_str())
        .bind(i64::from(record.ttl))
        .bind(record.user.as_str())
        .execute(&self.pool)
        .await?;

        debug!(name = %record.name, zone = %record.zone, rtype = record.rtype, "inserted record");
        Ok(())
    }
}
