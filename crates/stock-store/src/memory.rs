//! In-memory [`StockStore`] used by the schema tests and for running the
//! gateway without a database. Rows live in plain vectors; "storage
//! order" is insertion order.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::date_filter::DateFilter;
use crate::error::StoreError;
use crate::store::StockStore;
use crate::types::{
    AgentSignal, CompanyFacts, FinancialMetricsRecord, FundamentalsSnapshot, NewsItem, PricePoint,
    SentimentSnapshot, SophieAnalysis, StockSearchResult, TechnicalsSnapshot, TickerScore,
    ValuationRecord,
};

/// The latest-per-key idiom over in-memory rows: newest date wins,
/// equal dates tie-broken by highest id. Mirrors the SQL
/// `ORDER BY biz_date DESC, id DESC LIMIT 1`.
fn latest_by<'a, T>(
    rows: impl Iterator<Item = &'a T>,
    date: impl Fn(&T) -> NaiveDate,
    id: impl Fn(&T) -> i32,
) -> Option<&'a T> {
    rows.max_by_key(|&row| (date(row), id(row)))
}

#[derive(Default)]
pub struct MemoryStore {
    pub companies: Vec<CompanyFacts>,
    pub prices: Vec<PricePoint>,
    pub news: Vec<NewsItem>,
    pub financial_metrics: Vec<FinancialMetricsRecord>,
    pub valuations: Vec<ValuationRecord>,
    pub fundamentals: Vec<FundamentalsSnapshot>,
    pub sentiment: Vec<SentimentSnapshot>,
    pub technicals: Vec<TechnicalsSnapshot>,
    pub agent_signals: Vec<AgentSignal>,
    pub sophie_analyses: Vec<SophieAnalysis>,
    /// Tickers whose composite-analysis fetch should fail, for
    /// exercising the batch fan-out failure policy.
    pub fail_sophie_for: Vec<String>,
}

#[async_trait]
impl StockStore for MemoryStore {
    async fn ticker_exists(&self, ticker: &str) -> Result<bool, StoreError> {
        Ok(self.companies.iter().any(|c| c.ticker == ticker))
    }

    async fn company_facts(&self, ticker: &str) -> Result<Option<CompanyFacts>, StoreError> {
        Ok(self
            .companies
            .iter()
            .find(|c| c.ticker == ticker)
            .cloned())
    }

    async fn companies(&self, tickers: &[String]) -> Result<Vec<CompanyFacts>, StoreError> {
        Ok(self
            .companies
            .iter()
            .filter(|c| tickers.contains(&c.ticker))
            .cloned()
            .collect())
    }

    async fn prices(
        &self,
        ticker: &str,
        filter: &DateFilter,
    ) -> Result<Vec<PricePoint>, StoreError> {
        let mut rows: Vec<PricePoint> = self
            .prices
            .iter()
            .filter(|p| p.ticker == ticker && filter.matches(p.biz_date))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.biz_date.cmp(&a.biz_date));
        Ok(rows)
    }

    async fn prices_for_all(
        &self,
        tickers: &[String],
        filter: &DateFilter,
    ) -> Result<Vec<PricePoint>, StoreError> {
        let mut rows: Vec<PricePoint> = self
            .prices
            .iter()
            .filter(|p| tickers.contains(&p.ticker) && filter.matches(p.biz_date))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            a.ticker
                .cmp(&b.ticker)
                .then(b.biz_date.cmp(&a.biz_date))
        });
        Ok(rows)
    }

    async fn news(&self, ticker: &str, limit: i64) -> Result<Vec<NewsItem>, StoreError> {
        let mut rows: Vec<NewsItem> = self
            .news
            .iter()
            .filter(|n| n.ticker == ticker)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn financial_metrics(
        &self,
        ticker: &str,
    ) -> Result<Vec<FinancialMetricsRecord>, StoreError> {
        let mut rows: Vec<FinancialMetricsRecord> = self
            .financial_metrics
            .iter()
            .filter(|m| m.ticker == ticker)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.report_period.cmp(&a.report_period));
        Ok(rows)
    }

    async fn latest_financial_metrics(
        &self,
        ticker: &str,
    ) -> Result<Option<FinancialMetricsRecord>, StoreError> {
        Ok(self
            .financial_metrics
            .iter()
            .filter(|m| m.ticker == ticker)
            .max_by_key(|m| m.report_period)
            .cloned())
    }

    async fn latest_valuations(&self, ticker: &str) -> Result<Vec<ValuationRecord>, StoreError> {
        let mut methods: Vec<String> = self
            .valuations
            .iter()
            .filter(|v| v.ticker == ticker)
            .map(|v| v.valuation_method.clone())
            .collect();
        methods.sort();
        methods.dedup();

        // Top-1 per method; later insertion wins a date tie, matching
        // the highest-surrogate-id policy.
        Ok(methods
            .into_iter()
            .filter_map(|method| {
                self.valuations
                    .iter()
                    .enumerate()
                    .filter(|(_, v)| v.ticker == ticker && v.valuation_method == method)
                    .max_by_key(|(index, v)| (v.biz_date, *index))
                    .map(|(_, v)| v.clone())
            })
            .collect())
    }

    async fn latest_fundamentals(
        &self,
        ticker: &str,
    ) -> Result<Option<FundamentalsSnapshot>, StoreError> {
        Ok(latest_by(
            self.fundamentals.iter().filter(|f| f.ticker == ticker),
            |f| f.biz_date,
            |f| f.id,
        )
        .cloned())
    }

    async fn latest_sentiment(
        &self,
        ticker: &str,
    ) -> Result<Option<SentimentSnapshot>, StoreError> {
        Ok(latest_by(
            self.sentiment.iter().filter(|s| s.ticker == ticker),
            |s| s.biz_date,
            |s| s.id,
        )
        .cloned())
    }

    async fn latest_technicals(
        &self,
        ticker: &str,
    ) -> Result<Option<TechnicalsSnapshot>, StoreError> {
        Ok(latest_by(
            self.technicals.iter().filter(|t| t.ticker == ticker),
            |t| t.biz_date,
            |t| t.id,
        )
        .cloned())
    }

    async fn latest_agent_signal(
        &self,
        ticker: &str,
        agent: &str,
    ) -> Result<Option<AgentSignal>, StoreError> {
        Ok(latest_by(
            self.agent_signals
                .iter()
                .filter(|s| s.ticker == ticker && s.agent == agent),
            |s| s.biz_date,
            |s| s.id,
        )
        .cloned())
    }

    async fn latest_sophie_analysis(
        &self,
        ticker: &str,
    ) -> Result<Option<SophieAnalysis>, StoreError> {
        if self.fail_sophie_for.iter().any(|t| t == ticker) {
            return Err(StoreError::Unavailable(format!(
                "sophie_analysis fetch failed for {ticker}"
            )));
        }
        Ok(latest_by(
            self.sophie_analyses.iter().filter(|a| a.ticker == ticker),
            |a| a.biz_date,
            |a| a.id,
        )
        .cloned())
    }

    async fn search(&self, query: &str, cap: i64) -> Result<Vec<StockSearchResult>, StoreError> {
        let needle = query.to_lowercase();
        let mut rows: Vec<StockSearchResult> = self
            .companies
            .iter()
            .filter(|c| {
                c.ticker.to_lowercase().contains(&needle)
                    || c.name.to_lowercase().contains(&needle)
            })
            .map(|c| StockSearchResult {
                ticker: c.ticker.clone(),
                name: c.name.clone(),
            })
            .collect();
        rows.truncate(cap.max(0) as usize);
        Ok(rows)
    }

    async fn covered_tickers(&self, top: Option<i64>) -> Result<Vec<TickerScore>, StoreError> {
        let mut scores: Vec<TickerScore> = self
            .companies
            .iter()
            .filter_map(|company| {
                latest_by(
                    self.sophie_analyses
                        .iter()
                        .filter(|a| a.ticker == company.ticker),
                    |a| a.biz_date,
                    |a| a.id,
                )
                .map(|a| TickerScore {
                    ticker: a.ticker.clone(),
                    score: a.overall_score,
                })
            })
            .collect();
        scores.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.ticker.cmp(&b.ticker))
        });
        if let Some(limit) = top {
            scores.truncate(limit.max(0) as usize);
        }
        Ok(scores)
    }
}
