//! Default values for configuration

/// Default collection name (normalised to the class `Faq` on the store)
pub fn default_collection_name() -> String {
    "faq".to_string()
}

/// Default FAQ page to crawl
pub fn default_seed_url() -> String {
    "https://www.nvidia.com/gtc/faq/".to_string()
}

/// Default environment variable holding the store endpoint
pub fn default_store_url_env() -> String {
    "WEAVIATE_URL".to_string()
}

/// Default environment variable holding the store API key
pub fn default_store_api_key_env() -> String {
    "WEAVIATE_API_KEY".to_string()
}

/// Default environment variable holding the Cohere key for generative queries
pub fn default_cohere_api_key_env() -> String {
    "COHERE_APIKEY".to_string()
}

/// Default vectorizer module
pub fn default_vectorizer() -> String {
    "text2vec-weaviate".to_string()
}

/// Default generative module
pub fn default_generative() -> Option<String> {
    Some("generative-cohere".to_string())
}

/// Default store request timeout in seconds
pub fn default_store_timeout() -> u64 {
    60
}

/// Default maximum pages per crawl
pub fn default_crawl_max_pages() -> u32 {
    200
}

/// Default request timeout in seconds
pub fn default_crawl_timeout() -> u64 {
    30
}

/// Default total crawl budget in seconds
pub fn default_crawl_max_secs() -> u64 {
    600
}

/// Default user agent
pub fn default_crawl_user_agent() -> String {
    format!("faqrag/{} (FAQ Indexer)", env!("CARGO_PKG_VERSION"))
}

/// Default first batch size
pub fn default_batch_initial_size() -> usize {
    20
}

/// Default upper bound for the dynamic batch size
pub fn default_batch_max_size() -> usize {
    100
}

/// Default failure count tolerated before an import stops
pub fn default_batch_max_errors() -> usize {
    10
}

/// Default label for questions no rule matches
pub fn default_category() -> String {
    "General".to_string()
}

/// Default number of query results
pub fn default_query_limit() -> usize {
    2
}
