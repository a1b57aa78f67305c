//! Configuration types for catalog client construction.

use std::collections::BTreeMap;
use std::time::Duration;

/// Default catalog service.
pub const DEFAULT_CATALOG_URL: &str = "https://dummyjson.com";

/// Configuration for catalog client construction.
#[derive(Debug, Clone)]
pub struct CatalogClientConfig {
    /// Base URL for the catalog API.
    pub catalog_url: String,
    /// Additional headers to include in requests.
    pub extra_headers: BTreeMap<String, String>,
    /// Value of the `user-agent` header, if any.
    pub user_agent: Option<String>,
    /// Timeout for establishing a connection.
    pub connect_timeout: Duration,
    /// Timeout for a whole request, including reading the body.
    pub request_timeout: Duration,
}

impl Default for CatalogClientConfig {
    fn default() -> Self {
        Self {
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            extra_headers: BTreeMap::new(),
            user_agent: None,
            connect_timeout: Duration::from_secs(15),
            request_timeout: Duration::from_secs(60),
        }
    }
}
