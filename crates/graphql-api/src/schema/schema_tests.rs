#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_graphql::Response;
    use chrono::NaiveDate;
    use serde_json::Value;

    use stock_store::{
        format_timestamp, CompanyFacts, FinancialMetricsRecord, FundamentalsSnapshot, MemoryStore,
        NewsItem, PricePoint, SophieAnalysis, ValuationRecord,
    };

    use crate::clock::Clock;
    use crate::schema::build_schema;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn company(ticker: &str, name: &str) -> CompanyFacts {
        CompanyFacts {
            ticker: ticker.to_string(),
            name: name.to_string(),
            sector: Some("Technology".to_string()),
            ..Default::default()
        }
    }

    fn price(ticker: &str, date: NaiveDate, close: f64) -> PricePoint {
        PricePoint {
            ticker: ticker.to_string(),
            biz_date: date,
            open: close - 1.0,
            high: close + 1.0,
            low: close - 2.0,
            close,
            volume: 1_000,
        }
    }

    fn sophie(id: i32, ticker: &str, date: NaiveDate, score: f64) -> SophieAnalysis {
        SophieAnalysis {
            id,
            ticker: ticker.to_string(),
            biz_date: date,
            signal: "bullish".to_string(),
            confidence: 0.8,
            overall_score: score,
            created_at: format_timestamp(date.and_hms_opt(9, 30, 0).unwrap()),
            updated_at: format_timestamp(date.and_hms_opt(9, 30, 0).unwrap()),
            ..Default::default()
        }
    }

    fn valuation(ticker: &str, method: &str, date: NaiveDate) -> ValuationRecord {
        ValuationRecord {
            ticker: ticker.to_string(),
            valuation_method: method.to_string(),
            intrinsic_value: 150.0,
            market_cap: 2.0e12,
            gap: 0.1,
            signal: "bullish".to_string(),
            biz_date: date,
        }
    }

    fn fundamentals(id: i32, ticker: &str, date: NaiveDate) -> FundamentalsSnapshot {
        FundamentalsSnapshot {
            id,
            ticker: ticker.to_string(),
            biz_date: date,
            overall_signal: "bullish".to_string(),
            confidence: 0.7,
            ..Default::default()
        }
    }

    fn metrics(ticker: &str, period: NaiveDate, pe: f64) -> FinancialMetricsRecord {
        FinancialMetricsRecord {
            ticker: ticker.to_string(),
            report_period: period,
            period: "quarterly".to_string(),
            currency: "USD".to_string(),
            price_to_earnings_ratio: Some(pe),
            ..Default::default()
        }
    }

    async fn execute(store: MemoryStore, clock: Clock, query: &str) -> Response {
        build_schema(Arc::new(store), clock).execute(query).await
    }

    fn data(resp: &Response) -> Value {
        assert!(resp.errors.is_empty(), "unexpected errors: {:?}", resp.errors);
        resp.data.clone().into_json().unwrap()
    }

    fn error_code(resp: &Response) -> String {
        assert!(!resp.errors.is_empty(), "expected an error");
        let errors = serde_json::to_value(&resp.errors).unwrap();
        errors[0]["extensions"]["code"]
            .as_str()
            .expect("error carries a code extension")
            .to_string()
    }

    fn fixed_clock() -> Clock {
        Clock::fixed(d(2024, 6, 15))
    }

    #[tokio::test]
    async fn test_stock_unknown_ticker_is_null_not_error() {
        let store = MemoryStore {
            companies: vec![company("AAPL", "Apple Inc")],
            ..Default::default()
        };
        let resp = execute(
            store,
            fixed_clock(),
            r#"{ stock(ticker: "ZZZ") { company { name } } }"#,
        )
        .await;
        assert!(data(&resp)["stock"].is_null());
    }

    #[tokio::test]
    async fn test_stock_resolves_nested_company() {
        let store = MemoryStore {
            companies: vec![company("AAPL", "Apple Inc")],
            ..Default::default()
        };
        let resp = execute(
            store,
            fixed_clock(),
            r#"{ stock(ticker: "AAPL") { company { ticker name sector } } }"#,
        )
        .await;
        let company = &data(&resp)["stock"]["company"];
        assert_eq!(company["ticker"], "AAPL");
        assert_eq!(company["name"], "Apple Inc");
        assert_eq!(company["sector"], "Technology");
    }

    #[tokio::test]
    async fn test_search_rejects_single_character() {
        let store = MemoryStore {
            companies: vec![company("AAPL", "Apple Inc")],
            ..Default::default()
        };
        let resp = execute(
            store,
            fixed_clock(),
            r#"{ searchStocks(query: "a") { ticker } }"#,
        )
        .await;
        assert_eq!(error_code(&resp), "VALIDATION");
        assert!(resp.errors[0].message.contains("at least 2 characters"));
    }

    #[tokio::test]
    async fn test_search_two_characters_matches_case_insensitively() {
        let store = MemoryStore {
            companies: vec![company("AAPL", "Apple Inc"), company("MSFT", "Microsoft")],
            ..Default::default()
        };
        let resp = execute(
            store,
            fixed_clock(),
            r#"{ searchStocks(query: "aP") { ticker name } }"#,
        )
        .await;
        let hits = data(&resp)["searchStocks"].as_array().unwrap().clone();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0]["ticker"], "AAPL");
    }

    #[tokio::test]
    async fn test_search_empty_result_is_not_an_error() {
        let resp = execute(
            MemoryStore::default(),
            fixed_clock(),
            r#"{ searchStocks(query: "ab") { ticker } }"#,
        )
        .await;
        assert_eq!(data(&resp)["searchStocks"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_search_never_exceeds_50_results() {
        let companies = (0..60)
            .map(|i| company(&format!("T{i:02}"), &format!("Acme Holdings {i}")))
            .collect();
        let store = MemoryStore {
            companies,
            ..Default::default()
        };
        let resp = execute(
            store,
            fixed_clock(),
            r#"{ searchStocks(query: "acme") { ticker } }"#,
        )
        .await;
        assert_eq!(data(&resp)["searchStocks"].as_array().unwrap().len(), 50);
    }

    #[tokio::test]
    async fn test_latest_valuations_one_per_method() {
        let store = MemoryStore {
            valuations: vec![
                valuation("AAPL", "DCF", d(2024, 1, 1)),
                valuation("AAPL", "DCF", d(2024, 2, 1)),
                valuation("AAPL", "comparables", d(2024, 1, 15)),
            ],
            ..Default::default()
        };
        let resp = execute(
            store,
            fixed_clock(),
            r#"{ latestValuations(ticker: "AAPL") { valuation_method biz_date } }"#,
        )
        .await;
        let rows = data(&resp)["latestValuations"].as_array().unwrap().clone();
        assert_eq!(rows.len(), 2);
        let by_method = |m: &str| {
            rows.iter()
                .find(|r| r["valuation_method"] == m)
                .unwrap()
                .clone()
        };
        assert_eq!(by_method("DCF")["biz_date"], "2024-02-01");
        assert_eq!(by_method("comparables")["biz_date"], "2024-01-15");
    }

    #[tokio::test]
    async fn test_prices_inclusive_range_ordered_descending() {
        let store = MemoryStore {
            companies: vec![company("AAPL", "Apple Inc")],
            prices: vec![
                price("AAPL", d(2023, 12, 31), 95.0),
                price("AAPL", d(2024, 1, 1), 100.0),
                price("AAPL", d(2024, 1, 15), 105.0),
                price("AAPL", d(2024, 1, 31), 110.0),
                price("AAPL", d(2024, 2, 1), 115.0),
            ],
            ..Default::default()
        };
        let resp = execute(
            store,
            fixed_clock(),
            r#"{ stock(ticker: "AAPL") {
                prices(start_date: "2024-01-01", end_date: "2024-01-31") { biz_date close }
            } }"#,
        )
        .await;
        let rows = data(&resp)["stock"]["prices"].as_array().unwrap().clone();
        let dates: Vec<&str> = rows.iter().map(|r| r["biz_date"].as_str().unwrap()).collect();
        assert_eq!(dates, vec!["2024-01-31", "2024-01-15", "2024-01-01"]);
    }

    #[tokio::test]
    async fn test_prices_default_window_is_last_30_days_of_injected_clock() {
        // Clock pinned to 2024-06-15; the window is [2024-05-16, ...].
        let store = MemoryStore {
            companies: vec![company("AAPL", "Apple Inc")],
            prices: vec![
                price("AAPL", d(2024, 6, 10), 100.0),
                price("AAPL", d(2024, 5, 16), 90.0),
                price("AAPL", d(2024, 5, 15), 80.0),
                price("AAPL", d(2024, 4, 1), 70.0),
            ],
            ..Default::default()
        };
        let resp = execute(
            store,
            fixed_clock(),
            r#"{ stock(ticker: "AAPL") { prices { biz_date } } }"#,
        )
        .await;
        let rows = data(&resp)["stock"]["prices"].as_array().unwrap().clone();
        let dates: Vec<&str> = rows.iter().map(|r| r["biz_date"].as_str().unwrap()).collect();
        assert_eq!(dates, vec!["2024-06-10", "2024-05-16"]);
    }

    #[tokio::test]
    async fn test_news_defaults_to_100_and_honors_limit() {
        let news = (0..120i64)
            .map(|i| NewsItem {
                ticker: "AAPL".to_string(),
                title: format!("Headline {i}"),
                date: d(2024, 1, 1) + chrono::Duration::days(i),
                sentiment: "neutral".to_string(),
                ..Default::default()
            })
            .collect();
        let store = MemoryStore {
            companies: vec![company("AAPL", "Apple Inc")],
            news,
            ..Default::default()
        };
        let schema = build_schema(Arc::new(store), fixed_clock());

        let resp = schema
            .execute(r#"{ stock(ticker: "AAPL") { news { title } } }"#)
            .await;
        assert_eq!(data(&resp)["stock"]["news"].as_array().unwrap().len(), 100);

        let resp = schema
            .execute(r#"{ stock(ticker: "AAPL") { news(limit: 5) { title } } }"#)
            .await;
        assert_eq!(data(&resp)["stock"]["news"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_financial_metrics_full_history_newest_period_first() {
        // Seeded out of order; the surface always reports newest first.
        let store = MemoryStore {
            companies: vec![company("AAPL", "Apple Inc")],
            financial_metrics: vec![
                metrics("AAPL", d(2023, 12, 31), 28.0),
                metrics("AAPL", d(2024, 6, 30), 31.0),
                metrics("AAPL", d(2024, 3, 31), 30.0),
                metrics("MSFT", d(2024, 6, 30), 35.0),
            ],
            ..Default::default()
        };
        let resp = execute(
            store,
            fixed_clock(),
            r#"{ stock(ticker: "AAPL") {
                financialMetrics { report_period period currency price_to_earnings_ratio }
            } }"#,
        )
        .await;
        let rows = data(&resp)["stock"]["financialMetrics"]
            .as_array()
            .unwrap()
            .clone();
        let periods: Vec<&str> = rows
            .iter()
            .map(|r| r["report_period"].as_str().unwrap())
            .collect();
        assert_eq!(periods, vec!["2024-06-30", "2024-03-31", "2023-12-31"]);
        assert_eq!(rows[0]["price_to_earnings_ratio"], 31.0);
        assert_eq!(rows[0]["period"], "quarterly");
        assert_eq!(rows[0]["currency"], "USD");
    }

    #[tokio::test]
    async fn test_financial_metrics_latest_is_newest_period_or_null() {
        let store = MemoryStore {
            companies: vec![company("AAPL", "Apple Inc"), company("NEWCO", "New Co")],
            financial_metrics: vec![
                metrics("AAPL", d(2024, 3, 31), 30.0),
                metrics("AAPL", d(2024, 6, 30), 31.0),
            ],
            ..Default::default()
        };
        let schema = build_schema(Arc::new(store), fixed_clock());

        let resp = schema
            .execute(
                r#"{ stock(ticker: "AAPL") {
                    financialMetricsLatest { report_period price_to_earnings_ratio }
                } }"#,
            )
            .await;
        let latest = data(&resp)["stock"]["financialMetricsLatest"].clone();
        assert_eq!(latest["report_period"], "2024-06-30");
        assert_eq!(latest["price_to_earnings_ratio"], 31.0);

        // A covered ticker with no filings yet: null latest, empty history.
        let resp = schema
            .execute(
                r#"{ stock(ticker: "NEWCO") {
                    financialMetrics { report_period }
                    financialMetricsLatest { report_period }
                } }"#,
            )
            .await;
        let stock = data(&resp)["stock"].clone();
        assert_eq!(stock["financialMetrics"].as_array().unwrap().len(), 0);
        assert!(stock["financialMetricsLatest"].is_null());
    }

    #[tokio::test]
    async fn test_batch_empty_ticker_list_rejected() {
        let resp = execute(
            MemoryStore::default(),
            fixed_clock(),
            r#"{ batchStocks(tickers: []) { ticker } }"#,
        )
        .await;
        assert_eq!(error_code(&resp), "VALIDATION");
        assert!(resp.errors[0].message.contains("At least one ticker"));
    }

    #[tokio::test]
    async fn test_batch_silently_drops_unknown_tickers() {
        let store = MemoryStore {
            companies: vec![company("AAPL", "Apple Inc")],
            ..Default::default()
        };
        let resp = execute(
            store,
            fixed_clock(),
            r#"{ batchStocks(tickers: ["AAPL", "NOPE"]) { ticker } }"#,
        )
        .await;
        let rows = data(&resp)["batchStocks"].as_array().unwrap().clone();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["ticker"], "AAPL");
    }

    #[tokio::test]
    async fn test_batch_missing_analysis_is_null_not_error() {
        let store = MemoryStore {
            companies: vec![company("AAPL", "Apple Inc")],
            ..Default::default()
        };
        let resp = execute(
            store,
            fixed_clock(),
            r#"{ batchStocks(tickers: ["AAPL"]) {
                ticker latestSophieAnalysis { overall_score }
            } }"#,
        )
        .await;
        let rows = data(&resp)["batchStocks"].as_array().unwrap().clone();
        assert!(rows[0]["latestSophieAnalysis"].is_null());
    }

    #[tokio::test]
    async fn test_batch_joins_by_ticker_key_not_position() {
        // Storage returns companies in insertion order (MSFT first),
        // which differs from the request order; every sub-result must
        // still land on its own ticker.
        let store = MemoryStore {
            companies: vec![company("MSFT", "Microsoft"), company("AAPL", "Apple Inc")],
            prices: vec![
                price("AAPL", d(2024, 1, 10), 1.0),
                price("MSFT", d(2024, 1, 10), 2.0),
            ],
            sophie_analyses: vec![sophie(1, "AAPL", d(2024, 1, 10), 0.9)],
            ..Default::default()
        };
        let resp = execute(
            store,
            fixed_clock(),
            r#"{ batchStocks(tickers: ["AAPL", "MSFT"], start_date: "2024-01-01", end_date: "2024-01-31") {
                ticker
                company { name }
                prices { close }
                latestSophieAnalysis { overall_score }
            } }"#,
        )
        .await;
        let rows = data(&resp)["batchStocks"].as_array().unwrap().clone();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["ticker"], "MSFT");
        assert_eq!(rows[0]["company"]["name"], "Microsoft");
        assert_eq!(rows[0]["prices"][0]["close"], 2.0);
        assert!(rows[0]["latestSophieAnalysis"].is_null());
        assert_eq!(rows[1]["ticker"], "AAPL");
        assert_eq!(rows[1]["prices"][0]["close"], 1.0);
        assert_eq!(rows[1]["latestSophieAnalysis"]["overall_score"], 0.9);
    }

    #[tokio::test]
    async fn test_batch_fails_whole_batch_when_one_analysis_fetch_fails() {
        let store = MemoryStore {
            companies: vec![company("AAPL", "Apple Inc"), company("MSFT", "Microsoft")],
            fail_sophie_for: vec!["MSFT".to_string()],
            ..Default::default()
        };
        let resp = execute(
            store,
            fixed_clock(),
            r#"{ batchStocks(tickers: ["AAPL", "MSFT"]) { ticker } }"#,
        )
        .await;
        assert_eq!(error_code(&resp), "INTERNAL");
        assert_eq!(resp.errors[0].message, "Failed to fetch batch stock data");
    }

    #[tokio::test]
    async fn test_covered_tickers_ranked_with_documented_tie_break() {
        let store = MemoryStore {
            companies: vec![
                company("A", "Alpha"),
                company("B", "Beta"),
                company("C", "Gamma"),
            ],
            sophie_analyses: vec![
                sophie(1, "A", d(2024, 1, 1), 0.9),
                sophie(2, "B", d(2024, 1, 1), 0.5),
                sophie(3, "C", d(2024, 1, 1), 0.9),
                // Older, higher score for B must not win.
                sophie(4, "B", d(2023, 1, 1), 1.0),
            ],
            ..Default::default()
        };
        let schema = build_schema(Arc::new(store), fixed_clock());

        let resp = schema
            .execute(r#"{ coveredTickers(top: 2) { ticker score } }"#)
            .await;
        let rows = data(&resp)["coveredTickers"].as_array().unwrap().clone();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["ticker"], "A");
        assert_eq!(rows[1]["ticker"], "C");
        assert_eq!(rows[0]["score"], 0.9);
        assert_eq!(rows[1]["score"], 0.9);

        let resp = schema
            .execute(r#"{ coveredTickers { ticker } }"#)
            .await;
        let rows = data(&resp)["coveredTickers"].as_array().unwrap().clone();
        let tickers: Vec<&str> = rows.iter().map(|r| r["ticker"].as_str().unwrap()).collect();
        assert_eq!(tickers, vec!["A", "C", "B"]);
    }

    #[tokio::test]
    async fn test_covered_tickers_rejects_non_positive_top() {
        let resp = execute(
            MemoryStore::default(),
            fixed_clock(),
            r#"{ coveredTickers(top: 0) { ticker } }"#,
        )
        .await;
        assert_eq!(error_code(&resp), "VALIDATION");
    }

    #[tokio::test]
    async fn test_latest_agent_signal_is_scoped_to_agent() {
        let signal = |id: i32, agent: &str, date: NaiveDate| stock_store::AgentSignal {
            id,
            ticker: "AAPL".to_string(),
            agent: agent.to_string(),
            signal: "buy".to_string(),
            confidence: 0.6,
            biz_date: date,
            created_at: format_timestamp(date.and_hms_opt(8, 0, 0).unwrap()),
            updated_at: format_timestamp(date.and_hms_opt(8, 0, 0).unwrap()),
            ..Default::default()
        };
        let store = MemoryStore {
            agent_signals: vec![
                signal(1, "warren", d(2024, 1, 1)),
                signal(2, "cathie", d(2024, 2, 1)),
                signal(3, "warren", d(2024, 1, 15)),
            ],
            ..Default::default()
        };
        let schema = build_schema(Arc::new(store), fixed_clock());

        let resp = schema
            .execute(r#"{ latestAgentSignal(ticker: "AAPL", agent: "warren") { id biz_date } }"#)
            .await;
        let row = data(&resp)["latestAgentSignal"].clone();
        assert_eq!(row["id"], 3);
        assert_eq!(row["biz_date"], "2024-01-15");

        let resp = schema
            .execute(r#"{ latestAgentSignal(ticker: "AAPL", agent: "nobody") { id } }"#)
            .await;
        assert!(data(&resp)["latestAgentSignal"].is_null());
    }

    #[tokio::test]
    async fn test_sophie_timestamps_keep_millisecond_z_format() {
        let store = MemoryStore {
            sophie_analyses: vec![sophie(1, "AAPL", d(2024, 3, 5), 0.75)],
            ..Default::default()
        };
        let resp = execute(
            store,
            fixed_clock(),
            r#"{ latestSophieAnalysis(ticker: "AAPL") { created_at updated_at } }"#,
        )
        .await;
        let row = data(&resp)["latestSophieAnalysis"].clone();
        assert_eq!(row["created_at"], "2024-03-05T09:30:00.000Z");
        assert_eq!(row["updated_at"], "2024-03-05T09:30:00.000Z");
    }

    #[tokio::test]
    async fn test_latest_lookups_are_idempotent() {
        let store = MemoryStore {
            fundamentals: vec![
                fundamentals(1, "AAPL", d(2024, 1, 1)),
                fundamentals(2, "AAPL", d(2024, 2, 1)),
            ],
            ..Default::default()
        };
        let schema = build_schema(Arc::new(store), fixed_clock());
        let query = r#"{ latestFundamentals(ticker: "AAPL") { id biz_date overall_signal } }"#;

        let first = data(&schema.execute(query).await);
        let second = data(&schema.execute(query).await);
        assert_eq!(first, second);
        assert_eq!(first["latestFundamentals"]["id"], 2);
    }
}
