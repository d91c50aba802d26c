use self::types::{GraphqlBody, GraphqlEnvelope};
use crate::config::Config;
use crate::sources::{GraphqlRequest, GraphqlTransport, PricingError, Service};
use log::{debug, error};
use reqwest::Client;
use serde_json::Value;

pub mod types;

/// Authenticated client for the certificate and transaction GraphQL APIs
#[derive(Clone)]
pub struct GraphqlClient {
    req_client: Client,
    api_token: String,
    cert_api_url: String,
    transactions_api_url: String,
}

impl GraphqlClient {
    pub fn new(config: &Config) -> Result<Self, PricingError> {
        let mut builder = reqwest::ClientBuilder::new();

        if let Some(timeout) = config.upstream_timeout {
            builder = builder.timeout(timeout);
        }

        let client = match builder.build() {
            Ok(client) => client,
            Err(e) => {
                error!("Failed to build HTTP client: {:?}", e);
                return Err(PricingError::InvalidConfig("http client".to_owned()));
            }
        };

        Ok(Self {
            req_client: client,
            api_token: config.api_token.clone(),
            cert_api_url: config.cert_api_url.clone(),
            transactions_api_url: config.transactions_api_url.clone(),
        })
    }

    fn url_for(&self, service: Service) -> &str {
        match service {
            Service::Certificates => &self.cert_api_url,
            Service::Transactions => &self.transactions_api_url,
        }
    }
}

impl GraphqlTransport for GraphqlClient {
    async fn execute(&self, request: &GraphqlRequest) -> Result<Value, PricingError> {
        let body = GraphqlBody {
            operation_name: request.operation_name,
            query: request.query,
            variables: &request.variables,
        };

        debug!("Sending {} to {:?} API", request.operation_name, request.service);

        let req = match self
            .req_client
            .post(self.url_for(request.service))
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .await
        {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to send {} request: {:?}", request.operation_name, e);
                return Err(PricingError::InternalError);
            }
        };

        let status = req.status();

        if status.is_server_error() {
            error!("{} failed with status {}", request.operation_name, status);
            return Err(PricingError::ServerError(status.as_u16()));
        }

        if status != 200 {
            error!(
                "{} failed: {:?}, {:?}",
                request.operation_name,
                status,
                req.text().await.unwrap_or_default()
            );
            return Err(PricingError::InternalError);
        }

        let envelope: GraphqlEnvelope = match req.json().await {
            Ok(res) => res,
            Err(e) => {
                error!("Failed to parse JSON from {}: {:?}", request.operation_name, e);
                return Err(PricingError::MalformedResponse(
                    request.operation_name.to_owned(),
                ));
            }
        };

        envelope.into_data().map_err(|reason| {
            error!("{} returned an unusable body: {}", request.operation_name, reason);
            PricingError::MalformedResponse(request.operation_name.to_owned())
        })
    }
}
