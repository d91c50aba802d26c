use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body POSTed to a GraphQL endpoint
#[derive(Debug, Serialize)]
pub struct GraphqlBody<'a> {
    #[serde(rename = "operationName")]
    pub operation_name: &'a str,
    pub query: &'a str,
    pub variables: &'a Value,
}

/// Standard GraphQL response envelope
#[derive(Debug, Deserialize)]
pub struct GraphqlEnvelope {
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GraphqlError {
    #[serde(default)]
    pub message: String,
}

impl GraphqlEnvelope {
    /// Unwraps the `data` object, treating any reported error as a failure
    pub fn into_data(self) -> Result<Value, String> {
        if let Some(first) = self.errors.first() {
            return Err(format!(
                "{} error(s), first: {}",
                self.errors.len(),
                first.message
            ));
        }

        match self.data {
            Some(data @ Value::Object(_)) => Ok(data),
            _ => Err("response has no data object".to_owned()),
        }
    }
}
