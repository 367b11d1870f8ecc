//! GraphQL gateway over the equity-market store.
//!
//! Wires the schema to an axum server: `POST /graphql` executes
//! queries, `GET /graphql` serves the GraphiQL playground.

pub mod clock;
pub mod config;
pub mod error;
pub mod schema;

use std::sync::Arc;

use anyhow::Context as _;
use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::extract::State;
use axum::http::HeaderValue;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::clock::Clock;
use crate::config::GatewayConfig;
use crate::schema::{build_schema, GatewaySchema};
use stock_store::PgStockStore;

async fn graphql_handler(
    State(schema): State<GatewaySchema>,
    req: GraphQLRequest,
) -> GraphQLResponse {
    schema.execute(req.into_inner()).await.into()
}

async fn graphiql() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint("/graphql").finish())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|origin| origin == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let list: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(list))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

pub fn router(schema: GatewaySchema, config: &GatewayConfig) -> Router {
    Router::new()
        .route("/graphql", get(graphiql).post(graphql_handler))
        .layer(cors_layer(&config.cors_allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(schema)
}

pub async fn run_server() -> anyhow::Result<()> {
    let config = GatewayConfig::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to database")?;

    let store = PgStockStore::new(pool);
    store
        .ping()
        .await
        .context("database connectivity check failed")?;
    tracing::info!("Database connection successful");

    let gateway_schema = build_schema(Arc::new(store), Clock::system());
    let app = router(gateway_schema, &config);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("GraphQL server ready at http://{addr}/graphql");
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
