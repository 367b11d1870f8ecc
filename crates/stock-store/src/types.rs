//! Row models for every entity the query layer surfaces.
//!
//! All structs are read-only projections of store rows: `sqlx::FromRow`
//! for the Postgres store, `serde` for transport, and (behind the
//! `graphql` feature) `async_graphql::SimpleObject` so the gateway can
//! expose them without a parallel set of wire types. GraphQL field names
//! stay snake_case to match the published schema.
//!
//! Business dates are `NaiveDate` (serialized `YYYY-MM-DD`). The
//! `created_at`/`updated_at` audit stamps are carried as pre-formatted
//! strings: the store renders the raw value with a literal `Z` suffix and
//! millisecond precision, without any timezone conversion.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Render an audit timestamp the way the store presents it:
/// `YYYY-MM-DDTHH:MM:SS.mmmZ`. The `Z` is a label, not a conversion.
pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Static descriptive attributes of a listed company; one row per ticker.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
#[cfg_attr(feature = "graphql", derive(async_graphql::SimpleObject))]
#[cfg_attr(
    feature = "graphql",
    graphql(name = "CompanyFacts", rename_fields = "snake_case")
)]
pub struct CompanyFacts {
    pub ticker: String,
    pub name: String,
    pub cik: Option<String>,
    pub industry: Option<String>,
    pub sector: Option<String>,
    pub category: Option<String>,
    pub exchange: Option<String>,
    pub is_active: Option<i32>,
    pub listing_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub market_cap: Option<f64>,
    pub number_of_employees: Option<i64>,
    pub sec_filings_url: Option<String>,
    pub sic_code: Option<String>,
    pub sic_industry: Option<String>,
    pub sic_sector: Option<String>,
    pub website_url: Option<String>,
    pub weighted_average_shares: Option<i64>,
}

/// One OHLCV observation. The ticker is kept for grouping in batch
/// queries but is not part of the GraphQL `Price` type.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
#[cfg_attr(feature = "graphql", derive(async_graphql::SimpleObject))]
#[cfg_attr(
    feature = "graphql",
    graphql(name = "Price", rename_fields = "snake_case")
)]
pub struct PricePoint {
    #[cfg_attr(feature = "graphql", graphql(skip))]
    pub ticker: String,
    pub biz_date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

/// A news article with its upstream-computed sentiment label.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
#[cfg_attr(feature = "graphql", derive(async_graphql::SimpleObject))]
#[cfg_attr(
    feature = "graphql",
    graphql(name = "CompanyNews", rename_fields = "snake_case")
)]
pub struct NewsItem {
    #[cfg_attr(feature = "graphql", graphql(skip))]
    pub ticker: String,
    pub title: String,
    pub author: Option<String>,
    pub source: Option<String>,
    pub date: NaiveDate,
    pub url: Option<String>,
    pub sentiment: String,
}

/// Derived ratios for one reporting period. Individual ratios are
/// nullable depending on reporting completeness.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
#[cfg_attr(feature = "graphql", derive(async_graphql::SimpleObject))]
#[cfg_attr(
    feature = "graphql",
    graphql(name = "FinancialMetrics", rename_fields = "snake_case")
)]
pub struct FinancialMetricsRecord {
    #[cfg_attr(feature = "graphql", graphql(skip))]
    pub ticker: String,
    pub report_period: NaiveDate,
    pub period: String,
    pub currency: String,
    pub market_cap: Option<f64>,
    pub enterprise_value: Option<f64>,
    pub price_to_earnings_ratio: Option<f64>,
    pub price_to_book_ratio: Option<f64>,
    pub price_to_sales_ratio: Option<f64>,
    pub enterprise_value_to_ebitda_ratio: Option<f64>,
    pub enterprise_value_to_revenue_ratio: Option<f64>,
    pub free_cash_flow_yield: Option<f64>,
    pub peg_ratio: Option<f64>,
    pub gross_margin: Option<f64>,
    pub operating_margin: Option<f64>,
    pub net_margin: Option<f64>,
    pub return_on_equity: Option<f64>,
    pub return_on_assets: Option<f64>,
    pub return_on_invested_capital: Option<f64>,
    pub asset_turnover: Option<f64>,
    pub inventory_turnover: Option<f64>,
    pub receivables_turnover: Option<f64>,
    pub days_sales_outstanding: Option<f64>,
    pub operating_cycle: Option<f64>,
    pub working_capital_turnover: Option<f64>,
    pub current_ratio: Option<f64>,
    pub quick_ratio: Option<f64>,
    pub cash_ratio: Option<f64>,
    pub operating_cash_flow_ratio: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub debt_to_assets: Option<f64>,
    pub interest_coverage: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub earnings_growth: Option<f64>,
    pub book_value_growth: Option<f64>,
    pub earnings_per_share_growth: Option<f64>,
    pub free_cash_flow_growth: Option<f64>,
    pub operating_income_growth: Option<f64>,
    pub ebitda_growth: Option<f64>,
    pub payout_ratio: Option<f64>,
    pub earnings_per_share: Option<f64>,
    pub book_value_per_share: Option<f64>,
    pub free_cash_flow_per_share: Option<f64>,
}

/// An intrinsic-value estimate from one valuation method. Methods are
/// tracked independently; "latest" means latest per method.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
#[cfg_attr(feature = "graphql", derive(async_graphql::SimpleObject))]
#[cfg_attr(
    feature = "graphql",
    graphql(name = "Valuation", rename_fields = "snake_case")
)]
pub struct ValuationRecord {
    pub ticker: String,
    pub valuation_method: String,
    pub intrinsic_value: f64,
    pub market_cap: f64,
    pub gap: f64,
    pub signal: String,
    pub biz_date: NaiveDate,
}

/// Point-in-time fundamentals assessment with its scoring thresholds.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
#[cfg_attr(feature = "graphql", derive(async_graphql::SimpleObject))]
#[cfg_attr(
    feature = "graphql",
    graphql(name = "Fundamentals", rename_fields = "snake_case")
)]
pub struct FundamentalsSnapshot {
    pub id: i32,
    pub ticker: String,
    pub biz_date: NaiveDate,
    pub overall_signal: String,
    pub confidence: f64,
    pub return_on_equity: f64,
    pub roe_threshold: f64,
    pub net_margin: f64,
    pub net_margin_threshold: f64,
    pub operating_margin: f64,
    pub op_margin_threshold: f64,
    pub profitability_score: i32,
    pub profitability_signal: String,
    pub revenue_growth: f64,
    pub revenue_growth_threshold: f64,
    pub earnings_growth: f64,
    pub earnings_growth_threshold: f64,
    pub book_value_growth: f64,
    pub book_value_growth_threshold: f64,
    pub growth_score: i32,
    pub growth_signal: String,
    pub current_ratio: Option<f64>,
    pub current_ratio_threshold: f64,
    pub debt_to_equity: f64,
    pub debt_to_equity_threshold: f64,
    pub free_cash_flow_per_share: f64,
    pub earnings_per_share: f64,
    pub fcf_conversion_threshold: f64,
    pub health_score: i32,
    pub health_signal: String,
    pub pe_ratio: f64,
    pub pe_threshold: f64,
    pub pb_ratio: f64,
    pub pb_threshold: f64,
    pub ps_ratio: f64,
    pub ps_threshold: f64,
    pub valuation_score: i32,
    pub valuation_signal: String,
}

/// Point-in-time sentiment assessment built from insider trades and news.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
#[cfg_attr(feature = "graphql", derive(async_graphql::SimpleObject))]
#[cfg_attr(
    feature = "graphql",
    graphql(name = "Sentiment", rename_fields = "snake_case")
)]
pub struct SentimentSnapshot {
    pub id: i32,
    pub ticker: String,
    pub biz_date: NaiveDate,
    pub overall_signal: String,
    pub confidence: f64,
    pub insider_total: i32,
    pub insider_bullish: i32,
    pub insider_bearish: i32,
    pub insider_value_total: f64,
    pub insider_value_bullish: f64,
    pub insider_value_bearish: f64,
    pub insider_weight: f64,
    pub news_total: i32,
    pub news_bullish: i32,
    pub news_bearish: i32,
    pub news_neutral: i32,
    pub news_weight: f64,
    pub weighted_bullish: f64,
    pub weighted_bearish: f64,
}

/// Point-in-time technical assessment across the five strategy families.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
#[cfg_attr(feature = "graphql", derive(async_graphql::SimpleObject))]
#[cfg_attr(
    feature = "graphql",
    graphql(name = "Technicals", rename_fields = "snake_case")
)]
pub struct TechnicalsSnapshot {
    pub id: i32,
    pub ticker: String,
    pub biz_date: NaiveDate,
    pub signal: String,
    pub confidence: f64,
    pub trend_signal: String,
    pub trend_confidence: f64,
    pub trend_score: f64,
    pub trend_adx_threshold: f64,
    pub trend_ema_crossover_threshold: bool,
    pub ema_8: f64,
    pub ema_21: f64,
    pub ema_55: f64,
    pub adx: f64,
    pub di_plus: f64,
    pub di_minus: f64,
    pub mr_signal: String,
    pub mr_confidence: f64,
    pub mr_score: f64,
    pub mr_z_score_threshold: f64,
    pub mr_rsi_low_threshold: f64,
    pub mr_rsi_high_threshold: f64,
    pub z_score: f64,
    pub bb_upper: f64,
    pub bb_lower: f64,
    pub rsi_14: f64,
    pub rsi_28: f64,
    pub momentum_signal: String,
    pub momentum_confidence: f64,
    pub momentum_score: f64,
    pub momentum_min_strength: f64,
    pub momentum_volume_ratio_threshold: f64,
    pub mom_1m: f64,
    pub mom_3m: f64,
    pub mom_6m: f64,
    pub volume_ratio: f64,
    pub volatility_signal: String,
    pub volatility_confidence: f64,
    pub volatility_score: f64,
    pub volatility_low_regime: f64,
    pub volatility_high_regime: f64,
    pub volatility_z_threshold: f64,
    pub hist_vol_21d: f64,
    pub vol_regime: f64,
    pub vol_z_score: f64,
    pub atr_ratio: f64,
    pub stat_arb_signal: String,
    pub stat_arb_confidence: f64,
    pub stat_arb_score: f64,
    pub stat_arb_hurst_threshold: f64,
    pub stat_arb_skew_threshold: f64,
    pub hurst_exp: f64,
    pub skewness: f64,
    pub kurtosis: f64,
}

/// The latest stance of one analysis agent on one ticker.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
#[cfg_attr(feature = "graphql", derive(async_graphql::SimpleObject))]
#[cfg_attr(
    feature = "graphql",
    graphql(name = "AgentSignal", rename_fields = "snake_case")
)]
pub struct AgentSignal {
    pub id: i32,
    pub ticker: String,
    pub agent: String,
    pub signal: String,
    pub confidence: f64,
    pub reasoning: Option<String>,
    pub biz_date: NaiveDate,
    pub created_at: String,
    pub updated_at: String,
}

/// Composite scored assessment combining all signal sources.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
#[cfg_attr(feature = "graphql", derive(async_graphql::SimpleObject))]
#[cfg_attr(
    feature = "graphql",
    graphql(name = "SophieAnalysis", rename_fields = "snake_case")
)]
pub struct SophieAnalysis {
    pub id: i32,
    pub ticker: String,
    pub biz_date: NaiveDate,
    pub signal: String,
    pub confidence: f64,
    pub overall_score: f64,
    pub reasoning: Option<String>,
    pub short_term_outlook: Option<String>,
    pub medium_term_outlook: Option<String>,
    pub long_term_outlook: Option<String>,
    pub bullish_factors: Option<Vec<String>>,
    pub bearish_factors: Option<Vec<String>>,
    pub risks: Option<Vec<String>>,
    pub model_name: Option<String>,
    pub model_display_name: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Lightweight search hit.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
#[cfg_attr(feature = "graphql", derive(async_graphql::SimpleObject))]
#[cfg_attr(
    feature = "graphql",
    graphql(name = "StockSearchResult", rename_fields = "snake_case")
)]
pub struct StockSearchResult {
    pub ticker: String,
    pub name: String,
}

/// A ticker ranked by its most recent composite score.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
#[cfg_attr(feature = "graphql", derive(async_graphql::SimpleObject))]
#[cfg_attr(
    feature = "graphql",
    graphql(name = "TickerScore", rename_fields = "snake_case")
)]
pub struct TickerScore {
    pub ticker: String,
    pub score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    #[test]
    fn test_timestamp_relabeled_with_millis_and_z() {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_time(NaiveTime::from_hms_milli_opt(14, 30, 9, 7).unwrap());
        assert_eq!(format_timestamp(ts), "2024-03-05T14:30:09.007Z");
    }
}
