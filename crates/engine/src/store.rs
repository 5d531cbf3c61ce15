use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use common::{Direction, Error, Exit, Result, Trade, TradeStatus, TradeStore};

/// SQLite-backed trade store.
///
/// Each method is a single statement, so every operation is atomic on its
/// own. Closing is a conditional update on `status = 'OPEN'`, which makes a
/// second close of the same trade a no-op.
#[derive(Clone)]
pub struct SqliteTradeStore {
    pool: SqlitePool,
}

impl SqliteTradeStore {
    /// Open (creating if missing) the database at `url` and apply migrations.
    ///
    /// `sqlite::memory:` is supported; the pool is then pinned to a single
    /// long-lived connection so every query sees the same database.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let in_memory = url.contains(":memory:");

        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { 5 })
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        sqlx::migrate!("../../migrations").run(&pool).await?;
        info!(url, "Trade store ready");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close every pooled connection. Call once at shutdown.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Trade store closed");
    }

    /// Trades created on the given UTC calendar day, newest first.
    pub async fn list_created_on(&self, day: NaiveDate) -> Result<Vec<Trade>> {
        let prefix = format!("{}%", day.format("%Y-%m-%d"));
        let rows = sqlx::query_as::<_, TradeRow>(
            r#"
            SELECT id, pair, direction, entry, sl, tp, status, pnl, created_at, closed_at
            FROM trades WHERE created_at LIKE ?1 ORDER BY id DESC
            "#,
        )
        .bind(prefix)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Trade::try_from).collect()
    }
}

#[async_trait]
impl TradeStore for SqliteTradeStore {
    async fn insert_open(
        &self,
        pair: &str,
        direction: Direction,
        entry: f64,
        sl: f64,
        tp: f64,
    ) -> Result<i64> {
        let created_at = timestamp(Utc::now());

        let result = sqlx::query(
            r#"
            INSERT INTO trades (pair, direction, entry, sl, tp, status, pnl, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, 'OPEN', 0, ?6)
            "#,
        )
        .bind(pair)
        .bind(direction.to_string())
        .bind(entry)
        .bind(sl)
        .bind(tp)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!(id, pair, %direction, "Trade row inserted");
        Ok(id)
    }

    async fn close_by_id(&self, id: i64, exit: Exit, pnl: f64) -> Result<bool> {
        let status = TradeStatus::from(exit).to_string();
        let closed_at = timestamp(Utc::now());

        let result = sqlx::query(
            r#"
            UPDATE trades SET status = ?1, pnl = ?2, closed_at = ?3
            WHERE id = ?4 AND status = 'OPEN'
            "#,
        )
        .bind(status)
        .bind(pnl)
        .bind(closed_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_open(&self) -> Result<Vec<Trade>> {
        let rows = sqlx::query_as::<_, TradeRow>(
            r#"
            SELECT id, pair, direction, entry, sl, tp, status, pnl, created_at, closed_at
            FROM trades WHERE status = 'OPEN' ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Trade::try_from).collect()
    }

    async fn list_today(&self) -> Result<Vec<Trade>> {
        self.list_created_on(Utc::now().date_naive()).await
    }
}

/// Timestamps are stored as RFC 3339 text in UTC (`…Z`) so that a
/// `YYYY-MM-DD` prefix selects one calendar day.
fn timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::Other(format!("bad stored timestamp '{s}': {e}")))
}

#[derive(sqlx::FromRow)]
struct TradeRow {
    id: i64,
    pair: String,
    direction: String,
    entry: f64,
    sl: f64,
    tp: f64,
    status: String,
    pnl: f64,
    created_at: String,
    closed_at: Option<String>,
}

impl TryFrom<TradeRow> for Trade {
    type Error = Error;

    fn try_from(row: TradeRow) -> Result<Self> {
        Ok(Trade {
            id: row.id,
            pair: row.pair,
            direction: row.direction.parse()?,
            entry: row.entry,
            sl: row.sl,
            tp: row.tp,
            status: row.status.parse()?,
            pnl: row.pnl,
            created_at: parse_timestamp(&row.created_at)?,
            closed_at: row.closed_at.as_deref().map(parse_timestamp).transpose()?,
        })
    }
}
