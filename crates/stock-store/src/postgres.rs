//! PostgreSQL implementation of [`StockStore`].
//!
//! Every statement goes through the shared pool, which scopes a
//! connection to the single statement (acquired on execute, released on
//! completion). Statements are logged with their logical operation name
//! and elapsed time at debug level.

use std::time::Instant;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::date_filter::DateFilter;
use crate::error::StoreError;
use crate::store::StockStore;
use crate::types::{
    AgentSignal, CompanyFacts, FinancialMetricsRecord, FundamentalsSnapshot, NewsItem, PricePoint,
    SentimentSnapshot, SophieAnalysis, StockSearchResult, TechnicalsSnapshot, TickerScore,
    ValuationRecord,
};

/// Audit timestamps are rendered in SQL with a literal `Z` suffix and
/// millisecond precision; no timezone conversion happens.
const TIMESTAMP_FORMAT: &str = r#"'YYYY-MM-DD"T"HH24:MI:SS.MS"Z"'"#;

/// Column list for `sophie_analysis` with formatted audit stamps.
fn sophie_columns() -> String {
    format!(
        "id, ticker, biz_date, signal, confidence, overall_score, reasoning, \
         short_term_outlook, medium_term_outlook, long_term_outlook, \
         bullish_factors, bearish_factors, risks, model_name, model_display_name, \
         TO_CHAR(created_at, {TIMESTAMP_FORMAT}) AS created_at, \
         TO_CHAR(updated_at, {TIMESTAMP_FORMAT}) AS updated_at"
    )
}

/// The latest-per-key idiom, shared by every singleton-latest lookup:
/// newest `biz_date` wins, equal dates tie-broken by highest id.
/// `extra_filter` is appended to the `WHERE` clause verbatim and must
/// only contain `$n` placeholders, never interpolated values.
fn latest_by_date_sql(table: &str, columns: &str, extra_filter: &str) -> String {
    format!(
        "SELECT {columns} FROM {table} WHERE ticker = $1{extra_filter} \
         ORDER BY biz_date DESC, id DESC LIMIT 1"
    )
}

fn log_query(op: &str, started: Instant, rows: usize) {
    tracing::debug!(
        op,
        elapsed_ms = started.elapsed().as_millis() as u64,
        rows,
        "executed query"
    );
}

pub struct PgStockStore {
    pool: PgPool,
}

impl PgStockStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connectivity probe used at startup before serving traffic.
    pub async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl StockStore for PgStockStore {
    async fn ticker_exists(&self, ticker: &str) -> Result<bool, StoreError> {
        let started = Instant::now();
        let row: Option<(String,)> =
            sqlx::query_as("SELECT ticker FROM company_facts WHERE ticker = $1")
                .bind(ticker)
                .fetch_optional(&self.pool)
                .await?;
        log_query("ticker_exists", started, usize::from(row.is_some()));
        Ok(row.is_some())
    }

    async fn company_facts(&self, ticker: &str) -> Result<Option<CompanyFacts>, StoreError> {
        let started = Instant::now();
        let row = sqlx::query_as::<_, CompanyFacts>(
            "SELECT * FROM company_facts WHERE ticker = $1",
        )
        .bind(ticker)
        .fetch_optional(&self.pool)
        .await?;
        log_query("company_facts", started, usize::from(row.is_some()));
        Ok(row)
    }

    async fn companies(&self, tickers: &[String]) -> Result<Vec<CompanyFacts>, StoreError> {
        let started = Instant::now();
        let rows = sqlx::query_as::<_, CompanyFacts>(
            "SELECT * FROM company_facts WHERE ticker = ANY($1)",
        )
        .bind(tickers)
        .fetch_all(&self.pool)
        .await?;
        log_query("companies", started, rows.len());
        Ok(rows)
    }

    async fn prices(
        &self,
        ticker: &str,
        filter: &DateFilter,
    ) -> Result<Vec<PricePoint>, StoreError> {
        let (predicate, binds) = filter.to_sql("biz_date", 2);
        let sql = format!(
            "SELECT ticker, biz_date, open, high, low, close, volume \
             FROM prices WHERE ticker = $1 AND {predicate} \
             ORDER BY biz_date DESC"
        );

        let started = Instant::now();
        let mut query = sqlx::query_as::<_, PricePoint>(&sql).bind(ticker);
        for date in binds {
            query = query.bind(date);
        }
        let rows = query.fetch_all(&self.pool).await?;
        log_query("prices", started, rows.len());
        Ok(rows)
    }

    async fn prices_for_all(
        &self,
        tickers: &[String],
        filter: &DateFilter,
    ) -> Result<Vec<PricePoint>, StoreError> {
        let (predicate, binds) = filter.to_sql("biz_date", 2);
        let sql = format!(
            "SELECT ticker, biz_date, open, high, low, close, volume \
             FROM prices WHERE ticker = ANY($1) AND {predicate} \
             ORDER BY ticker, biz_date DESC"
        );

        let started = Instant::now();
        let mut query = sqlx::query_as::<_, PricePoint>(&sql).bind(tickers);
        for date in binds {
            query = query.bind(date);
        }
        let rows = query.fetch_all(&self.pool).await?;
        log_query("prices_for_all", started, rows.len());
        Ok(rows)
    }

    async fn news(&self, ticker: &str, limit: i64) -> Result<Vec<NewsItem>, StoreError> {
        let started = Instant::now();
        let rows = sqlx::query_as::<_, NewsItem>(
            "SELECT ticker, title, author, source, date, url, sentiment \
             FROM company_news WHERE ticker = $1 ORDER BY date DESC LIMIT $2",
        )
        .bind(ticker)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        log_query("news", started, rows.len());
        Ok(rows)
    }

    async fn financial_metrics(
        &self,
        ticker: &str,
    ) -> Result<Vec<FinancialMetricsRecord>, StoreError> {
        let started = Instant::now();
        let rows = sqlx::query_as::<_, FinancialMetricsRecord>(
            "SELECT * FROM financial_metrics WHERE ticker = $1 ORDER BY report_period DESC",
        )
        .bind(ticker)
        .fetch_all(&self.pool)
        .await?;
        log_query("financial_metrics", started, rows.len());
        Ok(rows)
    }

    async fn latest_financial_metrics(
        &self,
        ticker: &str,
    ) -> Result<Option<FinancialMetricsRecord>, StoreError> {
        let started = Instant::now();
        let row = sqlx::query_as::<_, FinancialMetricsRecord>(
            "SELECT * FROM financial_metrics WHERE ticker = $1 \
             ORDER BY report_period DESC LIMIT 1",
        )
        .bind(ticker)
        .fetch_optional(&self.pool)
        .await?;
        log_query("latest_financial_metrics", started, usize::from(row.is_some()));
        Ok(row)
    }

    async fn latest_valuations(&self, ticker: &str) -> Result<Vec<ValuationRecord>, StoreError> {
        // Windowed top-1 per method: DISTINCT ON keeps the first row of
        // each valuation_method group under the same tie-break as the
        // singleton lookups.
        let started = Instant::now();
        let rows = sqlx::query_as::<_, ValuationRecord>(
            "SELECT DISTINCT ON (valuation_method) \
             ticker, valuation_method, intrinsic_value, market_cap, gap, signal, biz_date \
             FROM valuation WHERE ticker = $1 \
             ORDER BY valuation_method, biz_date DESC, id DESC",
        )
        .bind(ticker)
        .fetch_all(&self.pool)
        .await?;
        log_query("latest_valuations", started, rows.len());
        Ok(rows)
    }

    async fn latest_fundamentals(
        &self,
        ticker: &str,
    ) -> Result<Option<FundamentalsSnapshot>, StoreError> {
        let sql = latest_by_date_sql("fundamentals", "*", "");
        let started = Instant::now();
        let row = sqlx::query_as::<_, FundamentalsSnapshot>(&sql)
            .bind(ticker)
            .fetch_optional(&self.pool)
            .await?;
        log_query("latest_fundamentals", started, usize::from(row.is_some()));
        Ok(row)
    }

    async fn latest_sentiment(
        &self,
        ticker: &str,
    ) -> Result<Option<SentimentSnapshot>, StoreError> {
        let sql = latest_by_date_sql("sentiment", "*", "");
        let started = Instant::now();
        let row = sqlx::query_as::<_, SentimentSnapshot>(&sql)
            .bind(ticker)
            .fetch_optional(&self.pool)
            .await?;
        log_query("latest_sentiment", started, usize::from(row.is_some()));
        Ok(row)
    }

    async fn latest_technicals(
        &self,
        ticker: &str,
    ) -> Result<Option<TechnicalsSnapshot>, StoreError> {
        let sql = latest_by_date_sql("technicals", "*", "");
        let started = Instant::now();
        let row = sqlx::query_as::<_, TechnicalsSnapshot>(&sql)
            .bind(ticker)
            .fetch_optional(&self.pool)
            .await?;
        log_query("latest_technicals", started, usize::from(row.is_some()));
        Ok(row)
    }

    async fn latest_agent_signal(
        &self,
        ticker: &str,
        agent: &str,
    ) -> Result<Option<AgentSignal>, StoreError> {
        let columns = format!(
            "id, ticker, agent, signal, confidence, reasoning, biz_date, \
             TO_CHAR(created_at, {TIMESTAMP_FORMAT}) AS created_at, \
             TO_CHAR(updated_at, {TIMESTAMP_FORMAT}) AS updated_at"
        );
        let sql = latest_by_date_sql("ai_analysis", &columns, " AND agent = $2");
        let started = Instant::now();
        let row = sqlx::query_as::<_, AgentSignal>(&sql)
            .bind(ticker)
            .bind(agent)
            .fetch_optional(&self.pool)
            .await?;
        log_query("latest_agent_signal", started, usize::from(row.is_some()));
        Ok(row)
    }

    async fn latest_sophie_analysis(
        &self,
        ticker: &str,
    ) -> Result<Option<SophieAnalysis>, StoreError> {
        let sql = latest_by_date_sql("sophie_analysis", &sophie_columns(), "");
        let started = Instant::now();
        let row = sqlx::query_as::<_, SophieAnalysis>(&sql)
            .bind(ticker)
            .fetch_optional(&self.pool)
            .await?;
        log_query("latest_sophie_analysis", started, usize::from(row.is_some()));
        Ok(row)
    }

    async fn search(&self, query: &str, cap: i64) -> Result<Vec<StockSearchResult>, StoreError> {
        let pattern = format!("%{query}%");
        let started = Instant::now();
        let rows = sqlx::query_as::<_, StockSearchResult>(
            "SELECT ticker, name FROM company_facts \
             WHERE ticker ILIKE $1 OR name ILIKE $1 LIMIT $2",
        )
        .bind(&pattern)
        .bind(cap)
        .fetch_all(&self.pool)
        .await?;
        log_query("search", started, rows.len());
        Ok(rows)
    }

    async fn covered_tickers(&self, top: Option<i64>) -> Result<Vec<TickerScore>, StoreError> {
        // Correlated latest-per-group: each ticker contributes only the
        // row at its own maximum biz_date (highest id on a date tie).
        let mut sql = String::from(
            "SELECT sa.ticker, sa.overall_score AS score \
             FROM sophie_analysis sa \
             JOIN company_facts cf ON sa.ticker = cf.ticker \
             WHERE sa.biz_date = \
               (SELECT MAX(biz_date) FROM sophie_analysis WHERE ticker = sa.ticker) \
             AND sa.id = \
               (SELECT MAX(id) FROM sophie_analysis \
                WHERE ticker = sa.ticker AND biz_date = sa.biz_date) \
             ORDER BY sa.overall_score DESC, sa.ticker ASC",
        );
        if top.is_some() {
            sql.push_str(" LIMIT $1");
        }

        let started = Instant::now();
        let mut query = sqlx::query_as::<_, TickerScore>(&sql);
        if let Some(limit) = top {
            query = query.bind(limit);
        }
        let rows = query.fetch_all(&self.pool).await?;
        log_query("covered_tickers", started, rows.len());
        Ok(rows)
    }
}
