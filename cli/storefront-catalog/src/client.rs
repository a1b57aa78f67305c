//! Catalog client for the remote product catalog service.

use std::fmt::Debug;
use std::num::NonZeroU32;
use std::str::FromStr;

use enum_dispatch::enum_dispatch;
use reqwest::header::{self, HeaderMap};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use crate::config::CatalogClientConfig;
use crate::error::{CatalogClientError, GetProductError, MapApiErrorExt};
use crate::mock::MockClient;
use crate::types::*;

/// Either a client for the actual catalog service,
/// or a mock client for testing.
#[derive(Debug)]
#[enum_dispatch(ClientTrait)]
pub enum Client {
    Catalog(CatalogClient),
    Mock(MockClient),
}

/// A client for the catalog service.
///
/// Handles:
/// - HTTP client configuration with timeouts
/// - extra headers and user agent sent with every request
/// - mapping of non-success responses to [CatalogClientError]s
pub struct CatalogClient {
    client: reqwest::Client,
    base_url: Url,
    config: CatalogClientConfig,
}

impl Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("catalog_url", &self.config.catalog_url)
            .finish_non_exhaustive()
    }
}

impl CatalogClient {
    /// Create a new catalog client from configuration.
    pub fn new(config: CatalogClientConfig) -> Result<Self, CatalogClientError> {
        let base_url = parse_base_url(&config.catalog_url)?;
        let client = build_http_client(&config)?;

        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, CatalogClientError> {
        self.base_url
            .join(path)
            .map_err(|source| CatalogClientError::InvalidUrl {
                url: format!("{}{path}", self.base_url),
                source,
            })
    }

    /// The url of a single product, `products/{id}`.
    fn product_endpoint(&self, id: ProductId) -> Result<Url, CatalogClientError> {
        self.endpoint(&format!("products/{id}"))
    }

    /// Send a request and decode the JSON body of a successful response.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, CatalogClientError> {
        let response = request
            .send()
            .await
            .map_err(CatalogClientError::Request)?
            .map_api_error()
            .await?;

        response
            .json::<T>()
            .await
            .map_err(CatalogClientError::InvalidResponsePayload)
    }

    /// Fetch a server paginated listing and normalize it into a [ResultPage].
    async fn paginated(
        &self,
        url: Url,
        extra_query: &[(&str, &str)],
        limit: NonZeroU32,
        offset: u64,
    ) -> Result<ResultPage, CatalogClientError> {
        let request = self
            .client
            .get(url)
            .query(extra_query)
            .query(&[("limit", limit.get() as u64), ("skip", offset)]);
        let list: ProductList = self.send(request).await?;

        debug!(
            n_products = list.products.len(),
            total = list.total,
            "received product page"
        );

        Ok(ResultPage::new(list.products, list.total, limit))
    }
}

// ---------------------------------------------------------------------------
// Catalog trait
// ---------------------------------------------------------------------------

/// The complete catalog API interface.
///
/// This trait enables alternate implementations:
/// - **HTTP**: REST calls to the catalog service via [`CatalogClient`]
/// - **Mock**: canned responses without HTTP via [`MockClient`]
#[enum_dispatch]
#[allow(async_fn_in_trait)]
pub trait ClientTrait {
    /// List products in the catalog's default order.
    async fn list_default(
        &self,
        limit: NonZeroU32,
        offset: u64,
    ) -> Result<ResultPage, CatalogClientError>;

    /// Search for products matching a search term.
    async fn search(
        &self,
        search_term: impl AsRef<str> + Send + Sync,
        limit: NonZeroU32,
        offset: u64,
    ) -> Result<ResultPage, CatalogClientError>;

    /// List **all** products of a category.
    ///
    /// The result is not paginated, callers that show pages have to slice it
    /// themselves.
    async fn list_by_category(
        &self,
        slug: impl AsRef<str> + Send + Sync,
    ) -> Result<Vec<Product>, CatalogClientError>;

    /// List the slugs of all categories.
    async fn list_category_slugs(&self) -> Result<Vec<String>, CatalogClientError>;

    /// List all categories with their display names.
    async fn list_categories(&self) -> Result<Vec<Category>, CatalogClientError>;

    /// Get a single product.
    async fn get_by_id(&self, id: ProductId) -> Result<Product, GetProductError>;

    /// Create a product, the catalog assigns its id.
    async fn create(&self, draft: &ProductDraft) -> Result<Product, CatalogClientError>;

    /// Update a product with the fields set in `draft`.
    async fn update(
        &self,
        id: ProductId,
        draft: &ProductDraft,
    ) -> Result<Product, GetProductError>;

    /// Delete a product.
    async fn delete(&self, id: ProductId) -> Result<DeletedProduct, GetProductError>;
}

// ---------------------------------------------------------------------------
// ClientTrait implementation for CatalogClient
// ---------------------------------------------------------------------------

impl ClientTrait for CatalogClient {
    #[instrument(skip(self))]
    async fn list_default(
        &self,
        limit: NonZeroU32,
        offset: u64,
    ) -> Result<ResultPage, CatalogClientError> {
        let url = self.endpoint("products")?;
        self.paginated(url, &[], limit, offset).await
    }

    #[instrument(skip_all, fields(search_term = %search_term.as_ref(), limit = %limit, offset))]
    async fn search(
        &self,
        search_term: impl AsRef<str> + Send + Sync,
        limit: NonZeroU32,
        offset: u64,
    ) -> Result<ResultPage, CatalogClientError> {
        let url = self.endpoint("products/search")?;
        self.paginated(url, &[("q", search_term.as_ref())], limit, offset)
            .await
    }

    #[instrument(skip_all, fields(slug = %slug.as_ref()))]
    async fn list_by_category(
        &self,
        slug: impl AsRef<str> + Send + Sync,
    ) -> Result<Vec<Product>, CatalogClientError> {
        let mut url = self.endpoint("products/category")?;
        url.path_segments_mut()
            .map_err(|_| CatalogClientError::Other("catalog url cannot be a base".to_string()))?
            .push(slug.as_ref());

        // `limit=0` asks the service for the whole category in one response.
        let request = self.client.get(url).query(&[("limit", 0)]);
        let list: ProductList = self.send(request).await?;

        debug!(n_products = list.products.len(), "received category listing");
        Ok(list.products)
    }

    #[instrument(skip_all)]
    async fn list_category_slugs(&self) -> Result<Vec<String>, CatalogClientError> {
        let url = self.endpoint("products/category-list")?;
        self.send(self.client.get(url)).await
    }

    #[instrument(skip_all)]
    async fn list_categories(&self) -> Result<Vec<Category>, CatalogClientError> {
        let url = self.endpoint("products/categories")?;
        self.send(self.client.get(url)).await
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: ProductId) -> Result<Product, GetProductError> {
        let url = self.product_endpoint(id)?;
        self.send(self.client.get(url))
            .await
            .map_err(|e| GetProductError::from_client_error(id, e))
    }

    #[instrument(skip_all)]
    async fn create(&self, draft: &ProductDraft) -> Result<Product, CatalogClientError> {
        let url = self.endpoint("products/add")?;
        let product: Product = self.send(self.client.post(url).json(draft)).await?;
        debug!(id = %product.id, "successfully created product");
        Ok(product)
    }

    #[instrument(skip(self, draft))]
    async fn update(
        &self,
        id: ProductId,
        draft: &ProductDraft,
    ) -> Result<Product, GetProductError> {
        let url = self.product_endpoint(id)?;
        self.send(self.client.put(url).json(draft))
            .await
            .map_err(|e| GetProductError::from_client_error(id, e))
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: ProductId) -> Result<DeletedProduct, GetProductError> {
        let url = self.product_endpoint(id)?;
        self.send(self.client.delete(url))
            .await
            .map_err(|e| GetProductError::from_client_error(id, e))
    }
}

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

/// Parse the configured catalog url.
///
/// A trailing slash is added so that joining endpoint paths keeps any path
/// prefix of the catalog url.
fn parse_base_url(catalog_url: &str) -> Result<Url, CatalogClientError> {
    let mut url = Url::parse(catalog_url).map_err(|source| CatalogClientError::InvalidUrl {
        url: catalog_url.to_string(),
        source,
    })?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

// ---------------------------------------------------------------------------
// HTTP client builder
// ---------------------------------------------------------------------------

/// Build the HTTP client used for all catalog requests.
fn build_http_client(config: &CatalogClientConfig) -> Result<reqwest::Client, CatalogClientError> {
    let mut headers = HeaderMap::new();

    for (key, value) in &config.extra_headers {
        headers.insert(
            header::HeaderName::from_str(key).map_err(
                |e: reqwest::header::InvalidHeaderName| CatalogClientError::Other(e.to_string()),
            )?,
            header::HeaderValue::from_str(value).map_err(
                |e: reqwest::header::InvalidHeaderValue| CatalogClientError::Other(e.to_string()),
            )?,
        );
    }

    debug!(
        catalog_url = %config.catalog_url,
        extra_headers = config.extra_headers.len(),
        "building catalog HTTP client"
    );

    let client_builder = reqwest::Client::builder()
        .default_headers(headers)
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout);

    let client_builder = if let Some(ref user_agent) = config.user_agent {
        client_builder.user_agent(user_agent)
    } else {
        client_builder
    };

    client_builder
        .build()
        .map_err(|e| CatalogClientError::Other(e.to_string()))
}
