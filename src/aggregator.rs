//! Fetches an asset's sale history across grading companies and grades.
//!
//! The upstream API only filters on a single (company, grade) pair per query,
//! so the aggregator walks a small matrix of pairs and merges the results.

use log::{debug, error, info};
use serde::Deserialize;
use serde_json::json;

use crate::sources::{GraphqlRequest, GraphqlTransport, PricingError, Service};
use crate::types::{RawTransaction, Transaction};

const MARKET_TRANSACTIONS_QUERY: &str = r#"query AssetMarketTransactions($id: ID!, $marketTransactionFilter: MarketTransactionFilter) {
  asset(id: $id) {
    marketTransactions(marketTransactionFilter: $marketTransactionFilter) {
      price
      date
    }
  }
}"#;

/// Grades queried per company when the caller does not pick one
pub const GRADE_MATRIX: &[(&str, &[&str])] = &[
    ("PSA", &["9.0", "10.0"]),
    ("BGS", &["9.0", "9.5", "10.0"]),
];

#[derive(Debug, Deserialize)]
struct MarketTransactionsData {
    asset: Option<AssetTransactions>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetTransactions {
    market_transactions: Option<Vec<RawTransaction>>,
}

/// Optional caller-supplied filters, already stripped of blank values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GradeFilter {
    pub grading_company: Option<String>,
    pub grade_number: Option<String>,
}

impl GradeFilter {
    pub fn new(grading_company: Option<String>, grade_number: Option<String>) -> Self {
        let clean = |value: Option<String>| {
            value
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };

        Self {
            grading_company: clean(grading_company),
            grade_number: clean(grade_number),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.grading_company.is_none() && self.grade_number.is_none()
    }

    pub fn is_exact(&self) -> bool {
        self.grading_company.is_some() && self.grade_number.is_some()
    }

    /// Expands the filter into the ordered (company, grade) pairs to query
    pub fn pairs(&self) -> Vec<(String, String)> {
        let companies: Vec<&str> = match &self.grading_company {
            Some(company) => vec![company.as_str()],
            None => GRADE_MATRIX.iter().map(|(company, _)| *company).collect(),
        };

        let mut pairs = Vec::new();

        for company in companies {
            match &self.grade_number {
                Some(grade) => pairs.push((company.to_owned(), grade.clone())),
                None => {
                    let grades = GRADE_MATRIX
                        .iter()
                        .find(|(known, _)| known.eq_ignore_ascii_case(company))
                        .map(|(_, grades)| *grades)
                        .unwrap_or_default();

                    pairs.extend(
                        grades
                            .iter()
                            .map(|grade| (company.to_owned(), (*grade).to_owned())),
                    );
                }
            }
        }

        pairs
    }
}

#[derive(Clone)]
pub struct PriceAggregator<T> {
    transport: T,
}

impl<T: GraphqlTransport> PriceAggregator<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Queries every pair the filter expands to and merges the results
    ///
    /// Any failing sub-query aborts the whole aggregation.
    pub async fn fetch_prices(
        &self,
        asset_id: &str,
        filter: &GradeFilter,
    ) -> Result<Vec<Transaction>, PricingError> {
        let mut transactions = Vec::new();

        for (company, grade) in filter.pairs() {
            let mut batch = self.fetch_pair(asset_id, &company, &grade).await?;
            debug!(
                "Asset {}: {} transactions for {} {}",
                asset_id,
                batch.len(),
                company,
                grade
            );
            transactions.append(&mut batch);

            if filter.is_exact() && !transactions.is_empty() {
                break;
            }
        }

        info!(
            "Fetched {} transactions for asset {}",
            transactions.len(),
            asset_id
        );

        Ok(transactions)
    }

    async fn fetch_pair(
        &self,
        asset_id: &str,
        company: &str,
        grade: &str,
    ) -> Result<Vec<Transaction>, PricingError> {
        let request = GraphqlRequest {
            service: Service::Transactions,
            operation_name: "AssetMarketTransactions",
            query: MARKET_TRANSACTIONS_QUERY,
            variables: json!({
                "id": asset_id,
                "marketTransactionFilter": {
                    "gradingCompany": company,
                    "gradeNumber": grade,
                    "showSkipped": true,
                }
            }),
        };

        let data = self.transport.execute(&request).await?;

        let parsed: MarketTransactionsData = match serde_json::from_value(data) {
            Ok(parsed) => parsed,
            Err(e) => {
                error!("Unexpected AssetMarketTransactions shape: {:?}", e);
                return Err(PricingError::MalformedResponse(
                    "AssetMarketTransactions".to_owned(),
                ));
            }
        };

        let Some(asset) = parsed.asset else {
            return Err(PricingError::MalformedResponse(
                "AssetMarketTransactions".to_owned(),
            ));
        };

        Ok(asset
            .market_transactions
            .unwrap_or_default()
            .into_iter()
            .filter_map(|raw| raw.into_transaction(company, grade))
            .collect())
    }
}
