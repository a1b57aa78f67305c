use std::path::PathBuf;

use anyhow::{Context, bail};
use storefront_catalog::{
    CatalogClient,
    CatalogClientConfig,
    Client,
    DEFAULT_CATALOG_URL,
    MockClient,
    STOREFRONT_CATALOG_MOCK_DATA_VAR,
};
use tracing::debug;

use crate::config::Config;

/// Initialize the catalog client
///
/// - Initialize a mock client if `_STOREFRONT_USE_CATALOG_MOCK` points at a
///   file of mock responses
/// - Initialize an HTTP client for the configured catalog otherwise
pub fn init_catalog_client(config: &Config) -> Result<Client, anyhow::Error> {
    // if $_STOREFRONT_USE_CATALOG_MOCK is set to a path to mock data, use the mock client
    if let Ok(path_str) = std::env::var(STOREFRONT_CATALOG_MOCK_DATA_VAR) {
        let path = PathBuf::from(path_str);
        if !path.exists() {
            bail!("path to mock data file doesn't exist: {}", path.display());
        }

        debug!(mock_data_path = %path.display(), "using mock catalog client");
        Ok(MockClient::new(Some(path))?.into())
    } else {
        let client_config = catalog_client_config(config);
        debug!("using catalog client with url: {}", client_config.catalog_url);
        let client = CatalogClient::new(client_config).context("Could not create catalog client")?;
        Ok(client.into())
    }
}

fn catalog_client_config(config: &Config) -> CatalogClientConfig {
    let mut extra_headers = config.extra_headers.clone();

    // Pass in a bool if we are running in CI, so requests can reflect this in the headers
    if std::env::var("CI").is_ok() {
        extra_headers.insert("storefront-ci".to_string(), "true".to_string());
    };

    CatalogClientConfig {
        // If not configured, use the default URL
        catalog_url: config
            .catalog_url
            .clone()
            .unwrap_or_else(|| DEFAULT_CATALOG_URL.to_string()),
        extra_headers,
        user_agent: Some(
            config
                .user_agent
                .clone()
                .unwrap_or_else(|| format!("storefront/{}", env!("CARGO_PKG_VERSION"))),
        ),
        ..Default::default()
    }
}
