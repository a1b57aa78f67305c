//! HTTP client infrastructure for the remote product catalog.
//!
//! This crate provides:
//! - HTTP client construction with configurable headers and timeouts
//! - The [`ClientTrait`] catalog interface and its HTTP implementation
//! - A [`MockClient`] answering from canned responses, for tests and
//!   scripted runs
//! - Common error handling for catalog operations
//!
//! ## Usage
//!
//! ```ignore
//! use storefront_catalog::{CatalogClient, CatalogClientConfig, ClientTrait};
//!
//! let client = CatalogClient::new(CatalogClientConfig::default())?;
//! let page = client.search("phone", NonZeroU32::new(12).unwrap(), 0).await?;
//! ```

mod client;
mod config;
mod error;
mod mock;
pub mod types;

pub use client::{CatalogClient, Client, ClientTrait};
pub use config::{CatalogClientConfig, DEFAULT_CATALOG_URL};
pub use error::{ApiErrorResponse, CatalogClientError, GetProductError, MapApiErrorExt};
pub use mock::{
    GenericErrorResponse,
    MockClient,
    MockDataError,
    Response as MockResponse,
    STOREFRONT_CATALOG_MOCK_DATA_VAR,
    read_mock_responses,
};
pub use reqwest::StatusCode;
