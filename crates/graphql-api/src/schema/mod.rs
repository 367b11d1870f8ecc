//! GraphQL schema assembly: the root query, the `Stock` nested object,
//! and the `batchStocks` aggregator. The backing [`StockStore`] and the
//! [`Clock`] are injected through schema context data.

pub mod batch;
pub mod query;
pub mod stock;

#[path = "schema_tests.rs"]
mod schema_tests;

use std::sync::Arc;

use async_graphql::{Context, EmptyMutation, EmptySubscription, Schema};
use stock_store::StockStore;

use crate::clock::Clock;
pub use query::QueryRoot;

pub type GatewaySchema = Schema<QueryRoot, EmptyMutation, EmptySubscription>;

pub fn build_schema(store: Arc<dyn StockStore>, clock: Clock) -> GatewaySchema {
    Schema::build(QueryRoot, EmptyMutation, EmptySubscription)
        .data(store)
        .data(clock)
        .finish()
}

pub(crate) fn store_from<'a>(ctx: &'a Context<'_>) -> &'a Arc<dyn StockStore> {
    ctx.data_unchecked::<Arc<dyn StockStore>>()
}

pub(crate) fn clock_from<'a>(ctx: &'a Context<'_>) -> &'a Clock {
    ctx.data_unchecked::<Clock>()
}
