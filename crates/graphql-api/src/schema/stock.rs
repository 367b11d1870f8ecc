//! Nested resolvers under a validated stock handle. Each field is
//! resolved lazily and independently per parent.

use async_graphql::{Context, ErrorExtensions, Object, Result};
use chrono::NaiveDate;

use stock_store::{CompanyFacts, DateFilter, FinancialMetricsRecord, NewsItem, PricePoint};

use super::{clock_from, store_from};
use crate::error::GatewayError;

/// Lightweight handle produced by the `stock` existence check.
pub struct Stock {
    pub ticker: String,
}

#[Object(rename_args = "snake_case")]
impl Stock {
    /// The parent handle was validated against company_facts, so a
    /// missing row here is an internal consistency failure, not a null.
    async fn company(&self, ctx: &Context<'_>) -> Result<CompanyFacts> {
        let facts = store_from(ctx)
            .company_facts(&self.ticker)
            .await
            .map_err(|e| GatewayError::internal("fetch company information", e).extend())?;
        match facts {
            Some(company) => Ok(company),
            None => Err(GatewayError::internal(
                "fetch company information",
                format!("company facts missing for validated ticker {}", self.ticker),
            )
            .extend()),
        }
    }

    /// Price history, newest first. Without bounds this is the last 30
    /// days relative to query time.
    async fn prices(
        &self,
        ctx: &Context<'_>,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<PricePoint>> {
        let filter = DateFilter::resolve(start_date, end_date, clock_from(ctx).today());
        Ok(store_from(ctx)
            .prices(&self.ticker, &filter)
            .await
            .map_err(|e| GatewayError::internal("fetch price data", e).extend())?)
    }

    async fn news(
        &self,
        ctx: &Context<'_>,
        #[graphql(default = 100)] limit: i64,
    ) -> Result<Vec<NewsItem>> {
        Ok(store_from(ctx)
            .news(&self.ticker, limit)
            .await
            .map_err(|e| GatewayError::internal("fetch news data", e).extend())?)
    }

    /// Full reporting history, newest report period first.
    async fn financial_metrics(&self, ctx: &Context<'_>) -> Result<Vec<FinancialMetricsRecord>> {
        Ok(store_from(ctx)
            .financial_metrics(&self.ticker)
            .await
            .map_err(|e| GatewayError::internal("fetch financial metrics", e).extend())?)
    }

    async fn financial_metrics_latest(
        &self,
        ctx: &Context<'_>,
    ) -> Result<Option<FinancialMetricsRecord>> {
        Ok(store_from(ctx)
            .latest_financial_metrics(&self.ticker)
            .await
            .map_err(|e| GatewayError::internal("fetch latest financial metrics", e).extend())?)
    }
}
