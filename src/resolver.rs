use log::{debug, warn};
use serde_json::json;

use crate::sources::{GraphqlRequest, GraphqlTransport, PricingError, Service};

const CERT_QUERY: &str = r#"query Cert($certNumber: String!) {
  cert(certNumber: $certNumber) {
    asset {
      id
      name
    }
  }
}"#;

/// Turns a certificate (slab) number into the upstream's internal asset id
#[derive(Clone)]
pub struct Resolver<T> {
    transport: T,
}

impl<T: GraphqlTransport> Resolver<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub async fn resolve(&self, cert_number: &str) -> Result<String, PricingError> {
        let cert_number = cert_number.trim();
        if cert_number.is_empty() {
            return Err(PricingError::MissingParameter("slabNumber"));
        }

        let request = GraphqlRequest {
            service: Service::Certificates,
            operation_name: "Cert",
            query: CERT_QUERY,
            variables: json!({ "certNumber": cert_number }),
        };

        let data = self.transport.execute(&request).await?;
        let asset = &data["cert"]["asset"];

        let Some(id) = asset["id"].as_str().filter(|id| !id.is_empty()) else {
            warn!("No asset found for certificate {}", cert_number);
            return Err(PricingError::NotFound(cert_number.to_owned()));
        };

        debug!(
            "Certificate {} resolved to asset {} ({})",
            cert_number,
            id,
            asset["name"].as_str().unwrap_or("unnamed")
        );

        Ok(id.to_owned())
    }
}
