/*!
Layout derivation store.

Persists serialized [`Layout`] values under opaque identifiers with
lineage and last-access timestamps, and performs expiration sweeps.

## Lineage

Every record optionally points at the record it derives from (`based_on`).
The flattening rule in [`LayoutStore::derive`] guarantees the lineage
graph has depth at most 2: a derived record always points directly at the
original parse result, never at another derived record, no matter how
many searches the user chains.

## Policies

Timestamp refresh and expiration each support two policies:

- [`TouchPolicy::Cascade`] (default) refreshes a record together with its
  base and everything based on it, keeping a base-plus-derivations family
  alive as a unit as long as any member is accessed.
  [`TouchPolicy::Local`] refreshes only the record itself.
- [`SweepPolicy::Cascade`] (default) deletes a dead root's dependents in
  the same sweep regardless of their own age, as one atomic batch.
  [`SweepPolicy::Local`] evaluates every record on its own timestamp.

The defaults match the original system's observed behavior; both are
valid configurations.

## Behavior

- Timestamps are stored as fixed-precision RFC3339 text, so lexicographic
  comparison in SQL equals chronological comparison.
- When the `sqlite-migrations` feature is enabled (default), embedded
  migrations (`sqlx::migrate!("./migrations")`) run on connect; disabling
  the feature assumes external migration orchestration.
- Lookup misses and duplicate-id anomalies are returned as "not found"
  and logged, never raised to the caller.
*/

mod models;

pub use models::{PersistedLayout, PersistedSearchFilters};

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use miette::Diagnostic;
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};
use thiserror::Error;
use tracing::{debug, error, info, instrument};

use crate::layout::Layout;
use crate::search::SearchFilter;
use crate::utils::ids::generate_layout_id;

/// Number of days before a stored layout expires.
pub const DEFAULT_TTL_DAYS: i64 = 90;

#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    #[diagnostic(
        code(parseboard::store::sqlx),
        help("Ensure the SQLite database URL is valid and accessible.")
    )]
    Sqlx(#[from] sqlx::Error),

    #[error("JSON serialization error: {0}")]
    #[diagnostic(
        code(parseboard::store::serde),
        help("Check that the stored payload matches the persisted layout shape.")
    )]
    Serde(#[from] serde_json::Error),

    #[error("Backend error: {0}")]
    #[diagnostic(code(parseboard::store::backend))]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Timestamp refresh policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TouchPolicy {
    /// Refresh the record, its base, and every record based on it.
    #[default]
    Cascade,
    /// Refresh only the record itself.
    Local,
}

/// Expiration sweep policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SweepPolicy {
    /// A deleted root takes its dependents with it, regardless of their age.
    #[default]
    Cascade,
    /// Every record is evaluated solely on its own timestamp.
    Local,
}

/// Store configuration with builder-style setters.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    pub database_url: String,
    pub touch_policy: TouchPolicy,
    pub sweep_policy: SweepPolicy,
    pub ttl: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: Self::resolve_database_url(None),
            touch_policy: TouchPolicy::default(),
            sweep_policy: SweepPolicy::default(),
            ttl: Duration::days(DEFAULT_TTL_DAYS),
        }
    }
}

impl StoreConfig {
    fn resolve_database_url(provided: Option<String>) -> String {
        if let Some(url) = provided {
            return url;
        }
        dotenvy::dotenv().ok();
        std::env::var("PARSEBOARD_DB_URL").unwrap_or_else(|_| "sqlite://parseboard.db".to_string())
    }

    pub fn new(database_url: Option<String>) -> Self {
        Self {
            database_url: Self::resolve_database_url(database_url),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_touch_policy(mut self, policy: TouchPolicy) -> Self {
        self.touch_policy = policy;
        self
    }

    #[must_use]
    pub fn with_sweep_policy(mut self, policy: SweepPolicy) -> Self {
        self.sweep_policy = policy;
        self
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// One persisted layout record.
#[derive(Clone, Debug, PartialEq)]
pub struct StoredLayoutRecord {
    /// Opaque globally-unique identifier.
    pub id: String,
    /// Last-access time; refreshed on every touch.
    pub timestamp: DateTime<Utc>,
    pub layout_json: String,
    pub search_filters_json: Option<String>,
    /// Lineage root, when this record derives from another.
    pub based_on: Option<String>,
}

impl StoredLayoutRecord {
    /// Deserialize the stored layout.
    pub fn layout(&self) -> Result<Layout> {
        let persisted: PersistedLayout = serde_json::from_str(&self.layout_json)?;
        Ok(Layout::from(persisted))
    }

    /// Deserialize the stored search filters, if any.
    pub fn search_filters(&self) -> Result<Option<Vec<SearchFilter>>> {
        match &self.search_filters_json {
            Some(json) => {
                let persisted: PersistedSearchFilters = serde_json::from_str(json)?;
                Ok(Some(persisted.0))
            }
            None => Ok(None),
        }
    }
}

/// Outcome of one expiration sweep.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepStats {
    /// Records deleted because their own timestamp expired.
    pub expired: u64,
    /// Records deleted because their base expired (cascading policy only).
    pub cascaded: u64,
}

/// SQLite-backed layout derivation store.
///
/// Safe under concurrent access from multiple sessions: every mutation is
/// a per-record transaction, and the cascading sweep deletes a parent and
/// its dependents as one atomic batch.
pub struct LayoutStore {
    pool: SqlitePool,
    config: StoreConfig,
}

impl std::fmt::Debug for LayoutStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutStore")
            .field("config", &self.config)
            .finish()
    }
}

/// Fixed-precision RFC3339 so string comparison equals time comparison.
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

impl LayoutStore {
    /// Connect (or create) the store at the configured database URL.
    /// Example URL: `sqlite://parseboard.db`.
    #[instrument(skip(config))]
    pub async fn connect(config: StoreConfig) -> Result<Self> {
        let pool = SqlitePool::connect(&config.database_url)
            .await
            .map_err(|e| StoreError::Backend(format!("connect error: {e}")))?;
        #[cfg(feature = "sqlite-migrations")]
        {
            if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
                return Err(StoreError::Backend(format!("migration failure: {e}")));
            }
        }
        Ok(Self { pool, config })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Look up a record by id.
    ///
    /// Absent ids and the never-expected duplicate-id case both come back
    /// as `None`; the duplicate case is logged as an internal error.
    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Result<Option<StoredLayoutRecord>> {
        let rows: Vec<SqliteRow> = sqlx::query(
            r#"
            SELECT id, timestamp, layout_json, search_filters_json, based_on
            FROM stored_layouts
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        match rows.len() {
            0 => {
                info!(id, "no stored layout found");
                Ok(None)
            }
            1 => Ok(Some(row_to_record(&rows[0]))),
            n => {
                error!(id, count = n, "multiple stored layouts share one id");
                Ok(None)
            }
        }
    }

    /// Look up a record and refresh its timestamp, per the configured
    /// touch policy. This is the access path used on every client request.
    pub async fn fetch(&self, id: &str) -> Result<Option<StoredLayoutRecord>> {
        let record = self.get(id).await?;
        if record.is_some() {
            self.touch(id).await?;
        }
        Ok(record)
    }

    /// Refresh a record's timestamp to now.
    ///
    /// Under [`TouchPolicy::Cascade`] the record's base and every record
    /// based on it are refreshed in the same statement, so the family's
    /// last-access time moves as a unit.
    #[instrument(skip(self))]
    pub async fn touch(&self, id: &str) -> Result<()> {
        let now = format_timestamp(Utc::now());
        let affected = match self.config.touch_policy {
            TouchPolicy::Cascade => {
                sqlx::query(
                    r#"
                    UPDATE stored_layouts
                    SET timestamp = ?1
                    WHERE id = ?2
                       OR based_on = ?2
                       OR id = (SELECT based_on FROM stored_layouts WHERE id = ?2)
                    "#,
                )
                .bind(&now)
                .bind(id)
                .execute(&self.pool)
                .await?
                .rows_affected()
            }
            TouchPolicy::Local => {
                sqlx::query("UPDATE stored_layouts SET timestamp = ?1 WHERE id = ?2")
                    .bind(&now)
                    .bind(id)
                    .execute(&self.pool)
                    .await?
                    .rows_affected()
            }
        };
        debug!(id, affected, "refreshed stored layout timestamp");
        Ok(())
    }

    /// Persist a freshly parsed layout as a lineage root.
    #[instrument(skip(self, layout), err)]
    pub async fn create_root(&self, layout: &Layout) -> Result<String> {
        let id = generate_layout_id();
        let layout_json = serde_json::to_string(&PersistedLayout::from(layout))?;
        sqlx::query(
            r#"
            INSERT INTO stored_layouts (id, timestamp, layout_json, search_filters_json, based_on)
            VALUES (?1, ?2, ?3, NULL, NULL)
            "#,
        )
        .bind(&id)
        .bind(format_timestamp(Utc::now()))
        .bind(&layout_json)
        .execute(&self.pool)
        .await?;
        info!(id = %id, corpus_size = layout.corpus_size, "stored root layout");
        Ok(id)
    }

    /// Persist a search result derived from `current`, applying the
    /// flattening rule: when the current record is itself derived, the new
    /// record's base is the current record's base, not the current record.
    /// Every derived record therefore points directly at the original
    /// parse result, keeping lineage depth at most 2 for any chain of
    /// searches. A `None` current (searching from the standard layout)
    /// produces a fresh root.
    ///
    /// The base record's content is never mutated here; its timestamp
    /// moves only through [`Self::touch`].
    #[instrument(skip(self, current, layout, filters), err)]
    pub async fn derive(
        &self,
        current: Option<&StoredLayoutRecord>,
        layout: &Layout,
        filters: &[SearchFilter],
    ) -> Result<String> {
        let based_on = current.map(|record| {
            record
                .based_on
                .clone()
                .unwrap_or_else(|| record.id.clone())
        });

        let id = generate_layout_id();
        let layout_json = serde_json::to_string(&PersistedLayout::from(layout))?;
        let filters_json = serde_json::to_string(&PersistedSearchFilters::from(filters))?;
        sqlx::query(
            r#"
            INSERT INTO stored_layouts (id, timestamp, layout_json, search_filters_json, based_on)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&id)
        .bind(format_timestamp(Utc::now()))
        .bind(&layout_json)
        .bind(&filters_json)
        .bind(&based_on)
        .execute(&self.pool)
        .await?;
        info!(id = %id, based_on = based_on.as_deref(), "stored derived layout");
        Ok(id)
    }

    /// Delete every record whose last-access time is older than the
    /// configured ttl, measured from the current time. Records exactly
    /// ttl old are retained.
    ///
    /// Under [`SweepPolicy::Cascade`] a dead record's dependents go with
    /// it in the same transaction, regardless of their own timestamps.
    pub async fn sweep(&self) -> Result<SweepStats> {
        self.sweep_at(Utc::now()).await
    }

    /// [`Self::sweep`] with an explicit reference time.
    #[instrument(skip(self), err)]
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> Result<SweepStats> {
        let cutoff = format_timestamp(now - self.config.ttl);
        let stats = match self.config.sweep_policy {
            SweepPolicy::Local => {
                let expired = sqlx::query("DELETE FROM stored_layouts WHERE timestamp < ?1")
                    .bind(&cutoff)
                    .execute(&self.pool)
                    .await?
                    .rows_affected();
                SweepStats {
                    expired,
                    cascaded: 0,
                }
            }
            SweepPolicy::Cascade => {
                let mut tx = self.pool.begin().await?;
                let cascaded = sqlx::query(
                    r#"
                    DELETE FROM stored_layouts
                    WHERE timestamp >= ?1
                      AND based_on IN (SELECT id FROM stored_layouts WHERE timestamp < ?1)
                    "#,
                )
                .bind(&cutoff)
                .execute(&mut *tx)
                .await?
                .rows_affected();
                let expired = sqlx::query("DELETE FROM stored_layouts WHERE timestamp < ?1")
                    .bind(&cutoff)
                    .execute(&mut *tx)
                    .await?
                    .rows_affected();
                tx.commit().await?;
                SweepStats { expired, cascaded }
            }
        };
        if stats.expired > 0 || stats.cascaded > 0 {
            info!(
                expired = stats.expired,
                cascaded = stats.cascaded,
                "swept expired layouts"
            );
        }
        Ok(stats)
    }

    /// Children of a record, reconstructed from the child -> parent
    /// pointers via the `based_on` index.
    #[instrument(skip(self))]
    pub async fn children_of(&self, id: &str) -> Result<Vec<StoredLayoutRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, timestamp, layout_json, search_filters_json, based_on
            FROM stored_layouts
            WHERE based_on = ?1
            ORDER BY timestamp DESC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(row_to_record).collect())
    }

    /// Backdate a record's timestamp. Exists for expiration tests; not
    /// part of the production surface.
    #[doc(hidden)]
    pub async fn set_timestamp_for_test(&self, id: &str, ts: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE stored_layouts SET timestamp = ?1 WHERE id = ?2")
            .bind(format_timestamp(ts))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn row_to_record(row: &SqliteRow) -> StoredLayoutRecord {
    let timestamp: String = row.get("timestamp");
    StoredLayoutRecord {
        id: row.get("id"),
        timestamp: parse_timestamp(&timestamp),
        layout_json: row.get("layout_json"),
        search_filters_json: row.get("search_filters_json"),
        based_on: row.get("based_on"),
    }
}
