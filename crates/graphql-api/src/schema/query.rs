//! Root query resolvers.
//!
//! Absence is a legitimate null for every `latest*` lookup and for
//! `stock` itself; only validation failures and storage errors surface
//! as GraphQL errors.

use async_graphql::{Context, ErrorExtensions, Object, Result};
use chrono::NaiveDate;

use stock_store::{
    AgentSignal, FundamentalsSnapshot, SentimentSnapshot, SophieAnalysis, StockSearchResult,
    TechnicalsSnapshot, TickerScore, ValuationRecord,
};

use super::batch::{self, BatchStock};
use super::stock::Stock;
use super::{clock_from, store_from};
use crate::error::GatewayError;

/// Hard cap on search hits regardless of match count.
const SEARCH_RESULT_CAP: i64 = 50;
/// Shorter search strings are rejected before any storage access.
const MIN_SEARCH_CHARS: usize = 2;

pub struct QueryRoot;

#[Object(rename_args = "snake_case")]
impl QueryRoot {
    /// Existence check. Returns a handle for nested resolution if the
    /// ticker is known, null otherwise.
    async fn stock(&self, ctx: &Context<'_>, ticker: String) -> Result<Option<Stock>> {
        let exists = store_from(ctx)
            .ticker_exists(&ticker)
            .await
            .map_err(|e| GatewayError::internal("fetch stock data", e).extend())?;
        Ok(exists.then(|| Stock { ticker }))
    }

    /// Case-insensitive substring search over ticker and company name.
    async fn search_stocks(
        &self,
        ctx: &Context<'_>,
        query: String,
    ) -> Result<Vec<StockSearchResult>> {
        if query.chars().count() < MIN_SEARCH_CHARS {
            return Err(
                GatewayError::validation("Search query must be at least 2 characters").extend(),
            );
        }
        Ok(store_from(ctx)
            .search(&query, SEARCH_RESULT_CAP)
            .await
            .map_err(|e| GatewayError::internal("search stocks", e).extend())?)
    }

    /// One entry per valuation method, each the most recent for that
    /// method.
    async fn latest_valuations(
        &self,
        ctx: &Context<'_>,
        ticker: String,
    ) -> Result<Vec<ValuationRecord>> {
        Ok(store_from(ctx)
            .latest_valuations(&ticker)
            .await
            .map_err(|e| GatewayError::internal("fetch latest valuations", e).extend())?)
    }

    async fn latest_fundamentals(
        &self,
        ctx: &Context<'_>,
        ticker: String,
    ) -> Result<Option<FundamentalsSnapshot>> {
        Ok(store_from(ctx)
            .latest_fundamentals(&ticker)
            .await
            .map_err(|e| GatewayError::internal("fetch latest fundamentals", e).extend())?)
    }

    async fn latest_sentiment(
        &self,
        ctx: &Context<'_>,
        ticker: String,
    ) -> Result<Option<SentimentSnapshot>> {
        Ok(store_from(ctx)
            .latest_sentiment(&ticker)
            .await
            .map_err(|e| GatewayError::internal("fetch latest sentiment", e).extend())?)
    }

    async fn latest_technicals(
        &self,
        ctx: &Context<'_>,
        ticker: String,
    ) -> Result<Option<TechnicalsSnapshot>> {
        Ok(store_from(ctx)
            .latest_technicals(&ticker)
            .await
            .map_err(|e| GatewayError::internal("fetch latest technicals", e).extend())?)
    }

    async fn latest_agent_signal(
        &self,
        ctx: &Context<'_>,
        ticker: String,
        agent: String,
    ) -> Result<Option<AgentSignal>> {
        Ok(store_from(ctx)
            .latest_agent_signal(&ticker, &agent)
            .await
            .map_err(|e| GatewayError::internal("fetch latest agent signal", e).extend())?)
    }

    async fn latest_sophie_analysis(
        &self,
        ctx: &Context<'_>,
        ticker: String,
    ) -> Result<Option<SophieAnalysis>> {
        Ok(store_from(ctx)
            .latest_sophie_analysis(&ticker)
            .await
            .map_err(|e| GatewayError::internal("fetch latest Sophie analysis", e).extend())?)
    }

    /// Multi-ticker aggregate; see [`batch::batch_stocks`] for the
    /// join rules.
    async fn batch_stocks(
        &self,
        ctx: &Context<'_>,
        tickers: Vec<String>,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<BatchStock>> {
        Ok(batch::batch_stocks(store_from(ctx), clock_from(ctx), &tickers, start_date, end_date)
            .await
            .map_err(|e| e.extend())?)
    }

    /// Tickers ranked by their most recent composite score, descending;
    /// ties break by ticker ascending. `top`, when given, must be >= 1.
    async fn covered_tickers(
        &self,
        ctx: &Context<'_>,
        top: Option<i32>,
    ) -> Result<Vec<TickerScore>> {
        if let Some(limit) = top {
            if limit < 1 {
                return Err(GatewayError::validation("top must be a positive integer").extend());
            }
        }
        Ok(store_from(ctx)
            .covered_tickers(top.map(i64::from))
            .await
            .map_err(|e| GatewayError::internal("fetch covered tickers", e).extend())?)
    }
}
