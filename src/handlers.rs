//! HTTP surface: `GET /get-prices` and a liveness probe.

use std::collections::BTreeMap;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::{NaiveDate, Utc};
use log::{error, info};
use serde::{Deserialize, Serialize};

use crate::aggregator::{GradeFilter, PriceAggregator};
use crate::confidence::{estimate_windows, ConfidenceResult, Window};
use crate::resolver::Resolver;
use crate::sources::{GraphqlTransport, PricingError};
use crate::types::Transaction;

#[derive(Clone)]
pub struct AppState<T> {
    pub resolver: Resolver<T>,
    pub aggregator: PriceAggregator<T>,
}

impl<T: GraphqlTransport + Clone> AppState<T> {
    pub fn new(transport: T) -> Self {
        Self {
            resolver: Resolver::new(transport.clone()),
            aggregator: PriceAggregator::new(transport),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuery {
    #[serde(alias = "psaNumber")]
    pub slab_number: Option<String>,
    pub grading_company: Option<String>,
    pub grade_number: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PriceResponse {
    pub prices: Vec<Transaction>,
    pub confidence: BTreeMap<Window, ConfidenceResult>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl IntoResponse for PricingError {
    fn into_response(self) -> Response {
        match self {
            PricingError::MissingParameter(name) => (
                StatusCode::BAD_REQUEST,
                format!("Please provide a {name} query parameter"),
            )
                .into_response(),
            other => {
                if other.is_upstream() {
                    error!("Upstream lookup failed: {}", other);
                } else {
                    error!("Request failed: {}", other);
                }
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch prices").into_response()
            }
        }
    }
}

/// Fetches with the caller's filter, then over the full matrix if that found nothing
pub async fn fetch_with_fallback<T: GraphqlTransport>(
    aggregator: &PriceAggregator<T>,
    asset_id: &str,
    filter: &GradeFilter,
) -> Result<Vec<Transaction>, PricingError> {
    let transactions = aggregator.fetch_prices(asset_id, filter).await?;

    if transactions.is_empty() && !filter.is_empty() {
        info!(
            "No transactions for asset {} under {:?}, retrying unfiltered",
            asset_id, filter
        );
        return aggregator
            .fetch_prices(asset_id, &GradeFilter::default())
            .await;
    }

    Ok(transactions)
}

/// Resolves, aggregates and rates prices for one slab as of `today`
pub async fn price_slab<T: GraphqlTransport>(
    state: &AppState<T>,
    query: PriceQuery,
    today: NaiveDate,
) -> Result<PriceResponse, PricingError> {
    let slab_number = query
        .slab_number
        .filter(|s| !s.trim().is_empty())
        .ok_or(PricingError::MissingParameter("slabNumber"))?;
    let filter = GradeFilter::new(query.grading_company, query.grade_number);

    let asset_id = state.resolver.resolve(&slab_number).await?;
    let prices = fetch_with_fallback(&state.aggregator, &asset_id, &filter).await?;
    let confidence = estimate_windows(&prices, today);

    Ok(PriceResponse { prices, confidence })
}

/// GET /get-prices?slabNumber=...&gradingCompany=...&gradeNumber=...
async fn get_prices<T>(
    State(state): State<AppState<T>>,
    Query(query): Query<PriceQuery>,
) -> Result<Json<PriceResponse>, PricingError>
where
    T: GraphqlTransport + Clone + Send + Sync + 'static,
{
    let response = price_slab(&state, query, Utc::now().date_naive()).await?;
    Ok(Json(response))
}

/// GET /health
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_owned(),
    })
}

pub fn create_router<T>(state: AppState<T>) -> Router
where
    T: GraphqlTransport + Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/get-prices", get(get_prices::<T>))
        .route("/health", get(health_check))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::mock::MockTransport;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    fn query(slab: Option<&str>, company: Option<&str>, grade: Option<&str>) -> PriceQuery {
        PriceQuery {
            slab_number: slab.map(str::to_owned),
            grading_company: company.map(str::to_owned),
            grade_number: grade.map(str::to_owned),
        }
    }

    fn cert() -> Result<serde_json::Value, PricingError> {
        Ok(json!({ "cert": { "asset": { "id": "A1", "name": "Card" } } }))
    }

    fn sales(rows: serde_json::Value) -> Result<serde_json::Value, PricingError> {
        Ok(json!({ "asset": { "marketTransactions": rows } }))
    }

    #[tokio::test]
    async fn missing_slab_number_is_a_validation_error() {
        let transport = MockTransport::default();
        let state = AppState::new(transport.clone());

        let result = price_slab(&state, query(Some(""), None, None), today()).await;

        assert_eq!(result.unwrap_err(), PricingError::MissingParameter("slabNumber"));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn exact_filter_hit_stops_after_one_query() {
        let transport = MockTransport::with_responses(vec![
            cert(),
            sales(json!([{ "price": "100.00", "date": "2024-06-20" }])),
        ]);
        let state = AppState::new(transport.clone());

        let response = price_slab(&state, query(Some("1"), Some("PSA"), Some("10.0")), today())
            .await
            .unwrap();

        assert_eq!(response.prices.len(), 1);
        // certificate lookup plus a single transactions query
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn empty_filtered_result_falls_back_to_full_matrix() {
        let transport = MockTransport::with_responses(vec![
            cert(),
            sales(json!([])),
            sales(json!([
                { "price": "100.00", "date": "2024-06-25" },
                { "price": "300.00", "date": "2024-06-26" }
            ])),
        ]);
        let state = AppState::new(transport.clone());

        let response = price_slab(&state, query(Some("1"), Some("PSA"), Some("8.0")), today())
            .await
            .unwrap();

        assert_eq!(transport.request_count(), 1 + 1 + 5);
        assert_eq!(response.prices.len(), 2);
        assert_eq!(response.prices[0].grade_number, "9.0");
        assert_eq!(
            response.confidence[&Window::Week].confidence_level,
            crate::confidence::ConfidenceLevel::Low
        );
    }

    #[tokio::test]
    async fn unfiltered_request_does_not_retry() {
        let transport = MockTransport::with_responses(vec![cert()]);
        let state = AppState::new(transport.clone());

        let response = price_slab(&state, query(Some("1"), None, None), today())
            .await
            .unwrap();

        assert!(response.prices.is_empty());
        assert_eq!(transport.request_count(), 1 + 5);
    }

    #[tokio::test]
    async fn overflowing_prices_do_not_fail_the_request() {
        let transport = MockTransport::with_responses(vec![
            cert(),
            sales(json!([
                { "price": "79228162514264337593543950335", "date": "2024-06-28" },
                { "price": "79228162514264337593543950335", "date": "2024-06-29" }
            ])),
        ]);
        let state = AppState::new(transport);

        let response = price_slab(&state, query(Some("1"), Some("PSA"), Some("9.0")), today())
            .await
            .unwrap();

        assert_eq!(response.prices.len(), 2);
        for result in response.confidence.values() {
            assert_eq!(result.average_price, rust_decimal::Decimal::ZERO);
            assert_eq!(
                result.confidence_level,
                crate::confidence::ConfidenceLevel::Low
            );
        }
    }

    #[test]
    fn psa_number_is_accepted_as_alias() {
        let parsed: PriceQuery =
            serde_json::from_value(json!({ "psaNumber": "42", "gradeNumber": "9.0" })).unwrap();

        assert_eq!(parsed.slab_number.as_deref(), Some("42"));
        assert_eq!(parsed.grade_number.as_deref(), Some("9.0"));
        assert_eq!(parsed.grading_company, None);
    }
}
