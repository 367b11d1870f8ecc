//! Storage-access contract for the query layer.
//!
//! Resolvers never talk to a pool directly; they receive a `dyn
//! StockStore` so the backing engine can be swapped (Postgres in
//! production, [`crate::MemoryStore`] in tests).

use async_trait::async_trait;

use crate::date_filter::DateFilter;
use crate::error::StoreError;
use crate::types::{
    AgentSignal, CompanyFacts, FinancialMetricsRecord, FundamentalsSnapshot, NewsItem, PricePoint,
    SentimentSnapshot, SophieAnalysis, StockSearchResult, TechnicalsSnapshot, TickerScore,
    ValuationRecord,
};

/// Read-only access to every entity the query surface exposes.
///
/// "Latest" lookups over `biz_date`-keyed tables share one tie-break
/// policy: on equal `biz_date`, the row with the highest surrogate id
/// wins. Financial metrics are keyed by `report_period` instead, one
/// row per period, so no tie-break applies there.
#[async_trait]
pub trait StockStore: Send + Sync {
    /// Whether a ticker has an authoritative company-facts row.
    async fn ticker_exists(&self, ticker: &str) -> Result<bool, StoreError>;

    /// Company facts for one ticker, if present.
    async fn company_facts(&self, ticker: &str) -> Result<Option<CompanyFacts>, StoreError>;

    /// Company facts for a batch of tickers. Tickers without a row are
    /// simply absent from the result; output order is storage order.
    async fn companies(&self, tickers: &[String]) -> Result<Vec<CompanyFacts>, StoreError>;

    /// Price history for one ticker under `filter`, newest first.
    async fn prices(&self, ticker: &str, filter: &DateFilter)
        -> Result<Vec<PricePoint>, StoreError>;

    /// Price history for a batch of tickers under one shared `filter`,
    /// ordered by ticker then date descending.
    async fn prices_for_all(
        &self,
        tickers: &[String],
        filter: &DateFilter,
    ) -> Result<Vec<PricePoint>, StoreError>;

    /// Most recent news for one ticker, newest first, capped at `limit`.
    async fn news(&self, ticker: &str, limit: i64) -> Result<Vec<NewsItem>, StoreError>;

    /// Full financial-metrics history, newest report period first.
    async fn financial_metrics(
        &self,
        ticker: &str,
    ) -> Result<Vec<FinancialMetricsRecord>, StoreError>;

    /// Metrics for the most recent report period, if any. The metrics
    /// table carries no surrogate id; `report_period` is unique per
    /// ticker, so which row wins a duplicate period is unspecified.
    async fn latest_financial_metrics(
        &self,
        ticker: &str,
    ) -> Result<Option<FinancialMetricsRecord>, StoreError>;

    /// The most recent valuation per valuation method.
    async fn latest_valuations(&self, ticker: &str) -> Result<Vec<ValuationRecord>, StoreError>;

    async fn latest_fundamentals(
        &self,
        ticker: &str,
    ) -> Result<Option<FundamentalsSnapshot>, StoreError>;

    async fn latest_sentiment(&self, ticker: &str)
        -> Result<Option<SentimentSnapshot>, StoreError>;

    async fn latest_technicals(
        &self,
        ticker: &str,
    ) -> Result<Option<TechnicalsSnapshot>, StoreError>;

    /// Most recent signal from one named agent.
    async fn latest_agent_signal(
        &self,
        ticker: &str,
        agent: &str,
    ) -> Result<Option<AgentSignal>, StoreError>;

    /// Most recent composite analysis, if any.
    async fn latest_sophie_analysis(
        &self,
        ticker: &str,
    ) -> Result<Option<SophieAnalysis>, StoreError>;

    /// Case-insensitive substring search over ticker and company name,
    /// capped at `cap` rows. Length validation is the caller's job.
    async fn search(&self, query: &str, cap: i64) -> Result<Vec<StockSearchResult>, StoreError>;

    /// Tickers ordered by their latest composite score descending,
    /// ties broken by ticker ascending, optionally truncated to `top`.
    async fn covered_tickers(&self, top: Option<i64>) -> Result<Vec<TickerScore>, StoreError>;
}
