//! Weaviate REST client
//!
//! Objects are embedded server-side by the collection's vectorizer module,
//! so this client only moves JSON: schema, batch objects and GraphQL
//! near-text queries.

use super::payload::{
    BatchObject, BatchObjectResponse, BatchRequest, ClassDefinition, GraphqlHit, GraphqlRequest,
    GraphqlResponse, PropertyDefinition,
};
use super::{CollectionSchema, CollectionStore, ObjectOutcome};
use crate::config::{StoreConfig, StoreCredentials};
use crate::error::{Error, Result};
use crate::models::{MatchedRecord, QaRecord};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Response, StatusCode};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Weaviate store handle
pub struct WeaviateStore {
    client: Client,
    base_url: Url,
}

impl WeaviateStore {
    /// Build a client for the endpoint; no request is made until first use
    pub fn connect(credentials: &StoreCredentials, config: &StoreConfig) -> Result<Self> {
        let base_url = parse_endpoint(&credentials.url)?;
        debug!("Connecting to Weaviate at {}", base_url);

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            secret_header(&format!("Bearer {}", credentials.api_key))?,
        );
        // Read by the text2vec-weaviate vectorizer on Weaviate Cloud
        headers.insert("X-Weaviate-Api-Key", secret_header(&credentials.api_key)?);
        headers.insert(
            "X-Weaviate-Cluster-Url",
            secret_header(base_url.as_str().trim_end_matches('/'))?,
        );
        if let Some(key) = &credentials.cohere_api_key {
            headers.insert("X-Cohere-Api-Key", secret_header(key)?);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Connection(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::Config(format!("Invalid Weaviate URL: {}", e)))
    }
}

/// Weaviate class names start with an upper-case letter (`faq` becomes `Faq`)
pub fn class_name(collection: &str) -> String {
    let mut chars = collection.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn parse_endpoint(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    let with_scheme = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    };

    let mut url = Url::parse(&with_scheme)
        .map_err(|e| Error::Config(format!("Invalid Weaviate URL '{}': {}", raw, e)))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn secret_header(value: &str) -> Result<HeaderValue> {
    let mut header = HeaderValue::from_str(value)
        .map_err(|_| Error::Config("Credential contains invalid header characters".to_string()))?;
    header.set_sensitive(true);
    Ok(header)
}

/// Pass successful responses through; map the rest onto store errors
async fn check_status(response: Response, action: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Err(Error::Auth(format!("{}: HTTP {}", action, status)))
        }
        _ => Err(Error::Store(format!("{} failed: HTTP {}: {}", action, status, body))),
    }
}

fn near_text_query(class: &str, text: &str, limit: usize) -> Result<String> {
    // JSON string literals are valid GraphQL string literals
    let concept = serde_json::to_string(text)?;
    Ok(format!(
        "{{ Get {{ {class}(nearText: {{concepts: [{concept}]}}, limit: {limit}) \
         {{ category question answer _additional {{ id distance }} }} }} }}"
    ))
}

#[async_trait]
impl CollectionStore for WeaviateStore {
    async fn is_ready(&self) -> Result<bool> {
        let url = self.endpoint("v1/.well-known/ready")?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Connection(format!("{}: {}", self.base_url, e)))?;

        match response.status() {
            StatusCode::SERVICE_UNAVAILABLE => Ok(false),
            _ => {
                check_status(response, "Readiness check").await?;
                Ok(true)
            }
        }
    }

    async fn collection_exists(&self, name: &str) -> Result<bool> {
        let url = self.endpoint(&format!("v1/schema/{}", class_name(name)))?;
        let response = self.client.get(url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        check_status(response, "Schema lookup").await?;
        Ok(true)
    }

    async fn create_collection(&self, schema: &CollectionSchema) -> Result<()> {
        let class = class_name(&schema.name);
        info!(
            "Creating collection {} (vectorizer {})",
            class, schema.vectorizer
        );

        let mut module_config = Map::new();
        module_config.insert(schema.vectorizer.clone(), Value::Object(Map::new()));
        if let Some(generative) = &schema.generative {
            module_config.insert(generative.clone(), Value::Object(Map::new()));
        }

        let definition = ClassDefinition {
            class,
            vectorizer: schema.vectorizer.clone(),
            module_config,
            properties: schema
                .properties
                .iter()
                .map(|name| PropertyDefinition {
                    name: name.clone(),
                    data_type: vec!["text".to_string()],
                })
                .collect(),
        };

        let url = self.endpoint("v1/schema")?;
        let response = self.client.post(url).json(&definition).send().await?;

        if response.status() == StatusCode::UNPROCESSABLE_ENTITY {
            let body = response.text().await.unwrap_or_default();
            if body.contains("already exists") {
                return Err(Error::CollectionExists(schema.name.clone()));
            }
            return Err(Error::Store(format!("Schema creation rejected: {}", body)));
        }

        check_status(response, "Schema creation").await?;
        Ok(())
    }

    async fn insert_objects(
        &self,
        collection: &str,
        records: &[QaRecord],
    ) -> Result<Vec<ObjectOutcome>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let class = class_name(collection);
        let ids: Vec<String> = records.iter().map(|r| r.object_id().to_string()).collect();
        let request = BatchRequest {
            objects: records
                .iter()
                .zip(&ids)
                .map(|(record, id)| BatchObject {
                    class: &class,
                    id: id.clone(),
                    properties: record,
                })
                .collect(),
        };

        debug!("Sending batch of {} objects to {}", records.len(), class);
        let url = self.endpoint("v1/batch/objects")?;
        let response = self.client.post(url).json(&request).send().await?;

        let status = response.status();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(Error::Auth(format!("Batch import: HTTP {}", status)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = format!("batch request failed: HTTP {}: {}", status, body);
            return Ok(vec![ObjectOutcome::Failed(message); records.len()]);
        }

        let parsed: Vec<BatchObjectResponse> = response.json().await?;
        // Identical records share an id and so share one result
        let by_id: HashMap<String, Option<String>> = parsed
            .into_iter()
            .filter_map(|r| {
                let error = r.error_message();
                r.id.map(|id| (id, error))
            })
            .collect();

        Ok(ids
            .iter()
            .map(|id| match by_id.get(id) {
                Some(None) => ObjectOutcome::Stored,
                Some(Some(message)) => ObjectOutcome::Failed(message.clone()),
                None => ObjectOutcome::Failed("no result returned for object".to_string()),
            })
            .collect())
    }

    async fn query_near_text(
        &self,
        collection: &str,
        text: &str,
        limit: usize,
    ) -> Result<Vec<MatchedRecord>> {
        let class = class_name(collection);
        let request = GraphqlRequest {
            query: near_text_query(&class, text, limit)?,
        };

        let url = self.endpoint("v1/graphql")?;
        let response = self.client.post(url).json(&request).send().await?;
        let response = check_status(response, "Near-text query").await?;
        let parsed: GraphqlResponse = response.json().await?;

        if let Some(errors) = parsed.errors.filter(|e| !e.is_empty()) {
            let messages: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
            return Err(Error::Store(format!(
                "Near-text query failed: {}",
                messages.join("; ")
            )));
        }

        let hits = parsed
            .data
            .as_ref()
            .and_then(|d| d.get("Get"))
            .and_then(|g| g.get(&class))
            .filter(|hits| !hits.is_null())
            .cloned()
            .unwrap_or(Value::Array(Vec::new()));
        let hits: Vec<GraphqlHit> = serde_json::from_value(hits)?;

        Ok(hits
            .into_iter()
            .map(|hit| MatchedRecord {
                id: hit.additional.id.unwrap_or_default(),
                distance: hit.additional.distance,
                record: QaRecord {
                    category: hit.category,
                    question: hit.question,
                    answer: hit.answer,
                },
            })
            .collect())
    }

    async fn close(&self) -> Result<()> {
        debug!("Closing Weaviate session for {}", self.base_url);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BatchConfig;
    use crate::store::{import_records, Session};
    use indicatif::ProgressBar;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credentials(url: &str) -> StoreCredentials {
        StoreCredentials {
            url: url.to_string(),
            api_key: "secret".to_string(),
            cohere_api_key: None,
        }
    }

    fn store(server: &MockServer) -> WeaviateStore {
        WeaviateStore::connect(&credentials(&server.uri()), &StoreConfig::default()).unwrap()
    }

    #[test]
    fn test_class_name() {
        assert_eq!(class_name("faq"), "Faq");
        assert_eq!(class_name("Faq"), "Faq");
        assert_eq!(class_name(""), "");
    }

    #[test]
    fn test_parse_endpoint_adds_scheme_and_slash() {
        assert_eq!(
            parse_endpoint("abc.weaviate.cloud").unwrap().as_str(),
            "https://abc.weaviate.cloud/"
        );
        assert_eq!(
            parse_endpoint("http://localhost:8080/base").unwrap().as_str(),
            "http://localhost:8080/base/"
        );
    }

    #[test]
    fn test_near_text_query_escapes_text() {
        let query = near_text_query("Faq", "say \"hi\"", 2).unwrap();
        assert!(query.contains(r#"concepts: ["say \"hi\""]"#));
        assert!(query.contains("limit: 2"));
        assert!(query.contains("_additional { id distance }"));
    }

    #[tokio::test]
    async fn test_ready_sends_auth_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/.well-known/ready"))
            .and(header("authorization", "Bearer secret"))
            .and(header("x-weaviate-api-key", "secret"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        assert!(store(&server).is_ready().await.unwrap());
    }

    #[tokio::test]
    async fn test_rejected_credentials_are_auth_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/.well-known/ready"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = Session::connect(store(&server)).await.err().unwrap();
        assert!(matches!(err, Error::Auth(_)));
    }

    #[tokio::test]
    async fn test_unreachable_store_is_connection_error() {
        let creds = credentials("http://127.0.0.1:1");
        let store = WeaviateStore::connect(&creds, &StoreConfig::default()).unwrap();
        let err = store.is_ready().await.unwrap_err();
        assert!(matches!(err, Error::Connection(_)));
    }

    #[tokio::test]
    async fn test_create_collection_posts_class_definition() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/schema"))
            .and(body_partial_json(json!({
                "class": "Faq",
                "vectorizer": "text2vec-weaviate",
                "moduleConfig": {"text2vec-weaviate": {}, "generative-cohere": {}},
                "properties": [
                    {"name": "category", "dataType": ["text"]},
                    {"name": "question", "dataType": ["text"]},
                    {"name": "answer", "dataType": ["text"]}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"class": "Faq"})))
            .expect(1)
            .mount(&server)
            .await;

        let schema = CollectionSchema::faq("faq", &StoreConfig::default());
        store(&server).create_collection(&schema).await.unwrap();
    }

    #[tokio::test]
    async fn test_create_existing_collection_maps_to_exists() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/schema"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "error": [{"message": "class name \"Faq\" already exists"}]
            })))
            .mount(&server)
            .await;

        let schema = CollectionSchema::faq("faq", &StoreConfig::default());
        let err = store(&server).create_collection(&schema).await.unwrap_err();
        assert!(matches!(err, Error::CollectionExists(_)));
    }

    #[tokio::test]
    async fn test_collection_exists() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/schema/Faq"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"class": "Faq"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/schema/Missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let store = store(&server);
        assert!(store.collection_exists("faq").await.unwrap());
        assert!(!store.collection_exists("missing").await.unwrap());
    }

    #[tokio::test]
    async fn test_insert_objects_reports_per_object_errors() {
        let server = MockServer::start().await;
        let ok = QaRecord::new("General", "Where?", "Here").unwrap();
        let bad = QaRecord::new("General", "When?", "Now").unwrap();

        Mock::given(method("POST"))
            .and(path("/v1/batch/objects"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": ok.object_id().to_string(), "result": {}},
                {"id": bad.object_id().to_string(), "result": {"errors": {"error": [{"message": "vectorizer timeout"}]}}}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let outcomes = store(&server)
            .insert_objects("faq", &[ok, bad])
            .await
            .unwrap();

        assert_eq!(
            outcomes,
            vec![
                ObjectOutcome::Stored,
                ObjectOutcome::Failed("vectorizer timeout".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_identical_records_in_one_batch_are_both_stored() {
        let server = MockServer::start().await;
        let record = QaRecord::new("General", "Where?", "Here").unwrap();
        let id = record.object_id().to_string();

        Mock::given(method("POST"))
            .and(path("/v1/batch/objects"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": id, "result": {}},
                {"id": id, "result": {}}
            ])))
            .mount(&server)
            .await;

        let outcomes = store(&server)
            .insert_objects("faq", &[record.clone(), record])
            .await
            .unwrap();

        assert_eq!(outcomes, vec![ObjectOutcome::Stored, ObjectOutcome::Stored]);
    }

    #[tokio::test]
    async fn test_failed_batch_request_fails_every_object() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/batch/objects"))
            .respond_with(ResponseTemplate::new(500).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let records: Vec<QaRecord> = (0..12)
            .map(|i| QaRecord::new("General", format!("Q{}", i), "A").unwrap())
            .collect();
        let config = BatchConfig {
            initial_size: 4,
            max_size: 4,
            max_errors: 10,
        };

        let result = import_records(
            &store(&server),
            "faq",
            &records,
            &config,
            &ProgressBar::hidden(),
        )
        .await
        .unwrap();

        assert_eq!(result.failed, 12);
        assert_eq!(result.imported, 0);
        assert!(result.first_failure.unwrap().message.contains("overloaded"));
    }

    #[tokio::test]
    async fn test_query_near_text_parses_hits() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/graphql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"Get": {"Faq": [
                    {"category": "General", "question": "Can I attend in person?", "answer": "Yes",
                     "_additional": {"id": "id-1", "distance": 0.12}},
                    {"category": "Registration", "question": "What does it cost?", "answer": "$100",
                     "_additional": {"id": "id-2", "distance": 0.4}}
                ]}}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let matches = store(&server)
            .query_near_text("faq", "in person", 2)
            .await
            .unwrap();

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].id, "id-1");
        assert_eq!(matches[0].record.question, "Can I attend in person?");
        assert_eq!(matches[1].record.category, "Registration");
    }

    #[tokio::test]
    async fn test_query_graphql_errors_are_store_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/graphql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"Get": {"Faq": null}},
                "errors": [{"message": "no module with name text2vec-weaviate present"}]
            })))
            .mount(&server)
            .await;

        let err = store(&server)
            .query_near_text("faq", "in person", 2)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("text2vec-weaviate"));
    }
}
