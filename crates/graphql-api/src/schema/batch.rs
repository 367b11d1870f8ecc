//! Multi-ticker aggregate assembly for `batchStocks`.

use std::collections::HashMap;
use std::sync::Arc;

use async_graphql::SimpleObject;
use chrono::NaiveDate;
use futures_util::future::try_join_all;

use stock_store::{
    CompanyFacts, DateFilter, PricePoint, SophieAnalysis, StockStore, StoreError,
};

use crate::clock::Clock;
use crate::error::GatewayError;

/// One entry of the `batchStocks` aggregate.
#[derive(Debug, Clone, SimpleObject)]
#[graphql(name = "BatchStock")]
pub struct BatchStock {
    pub ticker: String,
    pub company: CompanyFacts,
    pub prices: Vec<PricePoint>,
    pub latest_sophie_analysis: Option<SophieAnalysis>,
}

/// Assemble one composite record per resolvable ticker.
///
/// Company facts and prices are fetched in one batched lookup each; the
/// per-ticker composite analyses are independent fetches issued
/// concurrently, and any single failure fails the whole batch. Sub-results
/// are joined by ticker key, never by position, so storage reordering or
/// dropped tickers cannot misattribute data. Tickers without a company
/// row are silently omitted; output order is the company fetch order.
pub async fn batch_stocks(
    store: &Arc<dyn StockStore>,
    clock: &Clock,
    tickers: &[String],
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Result<Vec<BatchStock>, GatewayError> {
    if tickers.is_empty() {
        return Err(GatewayError::validation(
            "At least one ticker must be provided",
        ));
    }

    let companies = store
        .companies(tickers)
        .await
        .map_err(|e| GatewayError::internal("fetch batch stock data", e))?;

    let filter = DateFilter::resolve(start_date, end_date, clock.today());
    let price_rows = store
        .prices_for_all(tickers, &filter)
        .await
        .map_err(|e| GatewayError::internal("fetch batch stock data", e))?;
    let mut prices_by_ticker: HashMap<String, Vec<PricePoint>> = HashMap::new();
    for row in price_rows {
        prices_by_ticker
            .entry(row.ticker.clone())
            .or_default()
            .push(row);
    }

    let analysis_fetches = tickers.iter().map(|ticker| async move {
        let analysis = store.latest_sophie_analysis(ticker).await?;
        Ok::<_, StoreError>((ticker.clone(), analysis))
    });
    let analyses_by_ticker: HashMap<String, SophieAnalysis> = try_join_all(analysis_fetches)
        .await
        .map_err(|e| GatewayError::internal("fetch batch stock data", e))?
        .into_iter()
        .filter_map(|(ticker, analysis)| analysis.map(|a| (ticker, a)))
        .collect();

    Ok(companies
        .into_iter()
        .map(|company| {
            let ticker = company.ticker.clone();
            BatchStock {
                prices: prices_by_ticker.remove(&ticker).unwrap_or_default(),
                latest_sophie_analysis: analyses_by_ticker.get(&ticker).cloned(),
                company,
                ticker,
            }
        })
        .collect())
}
