//! Wire types for the Weaviate REST and GraphQL endpoints

use crate::models::QaRecord;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body of `POST /v1/schema`
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ClassDefinition {
    pub class: String,
    pub vectorizer: String,
    #[serde(rename = "moduleConfig")]
    pub module_config: Map<String, Value>,
    pub properties: Vec<PropertyDefinition>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct PropertyDefinition {
    pub name: String,
    #[serde(rename = "dataType")]
    pub data_type: Vec<String>,
}

/// Body of `POST /v1/batch/objects`
#[derive(Debug, Clone, Serialize)]
pub(crate) struct BatchRequest<'a> {
    pub objects: Vec<BatchObject<'a>>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct BatchObject<'a> {
    pub class: &'a str,
    pub id: String,
    pub properties: &'a QaRecord,
}

/// One element of the batch response array
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct BatchObjectResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub result: Option<BatchObjectResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct BatchObjectResult {
    #[serde(default)]
    pub errors: Option<ErrorList>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorList {
    #[serde(default)]
    pub error: Vec<ErrorMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorMessage {
    pub message: String,
}

impl BatchObjectResponse {
    /// Joined error messages, if the object was rejected
    pub fn error_message(&self) -> Option<String> {
        let errors = self.result.as_ref()?.errors.as_ref()?;
        if errors.error.is_empty() {
            return None;
        }
        Some(
            errors
                .error
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// Body of `POST /v1/graphql`
#[derive(Debug, Clone, Serialize)]
pub(crate) struct GraphqlRequest {
    pub query: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GraphqlResponse {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Option<Vec<ErrorMessage>>,
}

/// One object returned by a `Get` query
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GraphqlHit {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
    #[serde(rename = "_additional", default)]
    pub additional: Additional,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct Additional {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub distance: Option<f32>,
}
