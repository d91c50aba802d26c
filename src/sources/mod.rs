pub mod graphql;

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    /// A required query parameter was absent or empty
    #[error("missing required parameter: {0}")]
    MissingParameter(&'static str),
    /// The certificate lookup returned no `cert.asset.id`
    #[error("no asset found for certificate {0}")]
    NotFound(String),
    #[error("upstream server error: {0}")]
    ServerError(u16),
    #[error("upstream request failed")]
    InternalError,
    #[error("malformed upstream response: {0}")]
    MalformedResponse(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PricingError {
    /// Whether the error came from one of the two upstream APIs
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            PricingError::NotFound(_)
                | PricingError::ServerError(_)
                | PricingError::InternalError
                | PricingError::MalformedResponse(_)
        )
    }
}

/// Which upstream endpoint a request is meant for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Certificates,
    Transactions,
}

#[derive(Debug, Clone)]
pub struct GraphqlRequest {
    pub service: Service,
    pub operation_name: &'static str,
    pub query: &'static str,
    pub variables: Value,
}

pub trait GraphqlTransport {
    /// Runs a single GraphQL operation and returns its `data` object
    fn execute(
        &self,
        request: &GraphqlRequest,
    ) -> impl std::future::Future<Output = Result<Value, PricingError>> + Send;
}
