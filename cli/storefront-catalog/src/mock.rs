//! A catalog client that answers from a queue of canned responses.
//!
//! Responses are handed out in the order they were pushed, regardless of
//! which operation asks for them. An operation that pops a response of the
//! wrong kind panics, so tests fail loudly when the call sequence changes.

use std::collections::VecDeque;
use std::num::NonZeroU32;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::client::ClientTrait;
use crate::error::{CatalogClientError, GetProductError};
use crate::types::*;

/// Environment variable pointing at a JSON file of mock responses.
pub const STOREFRONT_CATALOG_MOCK_DATA_VAR: &str = "_STOREFRONT_USE_CATALOG_MOCK";

// Arc allows you to push things into the client from outside the client if necessary
// Mutex allows you to share across threads (necessary because of tokio)
type MockField<T> = Arc<Mutex<T>>;

/// An error response as stored in mock data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericErrorResponse {
    pub status: u16,
    pub message: String,
}

impl TryFrom<GenericErrorResponse> for CatalogClientError {
    type Error = MockDataError;

    fn try_from(value: GenericErrorResponse) -> Result<Self, Self::Error> {
        let status = StatusCode::from_u16(value.status)
            .map_err(|_| MockDataError::InvalidData("invalid status code".into()))?;
        Ok(CatalogClientError::ErrorResponse {
            status,
            message: value.message,
        })
    }
}

/// A canned catalog response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Error(GenericErrorResponse),
    Page(ResultPage),
    Product(Product),
    // Also serves category listings, which are plain product sequences.
    Products(Vec<Product>),
    CategorySlugs(Vec<String>),
    Categories(Vec<Category>),
}

#[derive(Debug, Error)]
pub enum MockDataError {
    /// Failed to read the JSON file pointed at by the mock data variable
    #[error("failed to read mock response file")]
    ReadMockFile(#[source] std::io::Error),
    /// Failed to parse the contents of the mock data file as JSON
    #[error("failed to parse mock data as JSON")]
    ParseJson(#[source] serde_json::Error),
    /// The data was parsed as JSON but it wasn't semantically valid
    #[error("invalid mocked data: {0}")]
    InvalidData(String),
}

/// Reads a list of mock responses from disk.
pub fn read_mock_responses(path: impl AsRef<Path>) -> Result<VecDeque<Response>, MockDataError> {
    let contents = std::fs::read_to_string(path).map_err(MockDataError::ReadMockFile)?;
    let deserialized: Vec<Response> =
        serde_json::from_str(&contents).map_err(MockDataError::ParseJson)?;
    Ok(deserialized.into())
}

#[derive(Debug)]
struct QueuedResponse {
    response: Response,
    delay: Option<Duration>,
}

/// A catalog client that can be seeded with mock responses
#[derive(Debug, Default, Clone)]
pub struct MockClient {
    mock_responses: MockField<VecDeque<QueuedResponse>>,
}

impl MockClient {
    /// Create a new mock client, potentially reading mock responses from disk
    pub fn new(mock_data_path: Option<impl AsRef<Path>>) -> Result<Self, MockDataError> {
        let client = Self::default();
        if let Some(path) = mock_data_path {
            for response in read_mock_responses(path)? {
                client.push(response, None);
            }
        }
        Ok(client)
    }

    fn push(&self, response: Response, delay: Option<Duration>) {
        self.mock_responses
            .lock()
            .expect("couldn't acquire mock lock")
            .push_back(QueuedResponse { response, delay });
    }

    /// Push a new response into the list of mock responses
    pub fn push_response(&self, response: Response) {
        self.push(response, None);
    }

    /// Push a response that is only returned after `delay` has passed.
    ///
    /// The response is still taken from the queue as soon as it is requested,
    /// which lets tests control the order in which concurrent requests
    /// complete.
    pub fn push_delayed_response(&self, response: Response, delay: Duration) {
        self.push(response, Some(delay));
    }

    /// Push a page for `list_default` or `search`
    pub fn push_page(&self, items: Vec<Product>, total: u64, page_size: NonZeroU32) {
        self.push_response(Response::Page(ResultPage::new(items, total, page_size)));
    }

    /// Push an API error into the list of mock responses
    pub fn push_error_response(&self, status: u16, message: impl Into<String>) {
        self.push_response(Response::Error(GenericErrorResponse {
            status,
            message: message.into(),
        }));
    }

    /// Number of responses that have not been consumed yet.
    pub fn remaining(&self) -> usize {
        self.mock_responses
            .lock()
            .expect("couldn't acquire mock lock")
            .len()
    }

    async fn next_response(&self) -> Option<Response> {
        let queued = self
            .mock_responses
            .lock()
            .expect("couldn't acquire mock lock")
            .pop_front()?;
        if let Some(delay) = queued.delay {
            tokio::time::sleep(delay).await;
        }
        Some(queued.response)
    }
}

fn mock_error(err: GenericErrorResponse) -> CatalogClientError {
    err.try_into()
        .expect("couldn't convert mock error response")
}

impl ClientTrait for MockClient {
    async fn list_default(
        &self,
        _limit: NonZeroU32,
        _offset: u64,
    ) -> Result<ResultPage, CatalogClientError> {
        match self.next_response().await {
            Some(Response::Page(page)) => Ok(page),
            Some(Response::Error(err)) => Err(mock_error(err)),
            mock_resp => panic!("expected page response, found {mock_resp:?}"),
        }
    }

    async fn search(
        &self,
        _search_term: impl AsRef<str> + Send + Sync,
        _limit: NonZeroU32,
        _offset: u64,
    ) -> Result<ResultPage, CatalogClientError> {
        match self.next_response().await {
            Some(Response::Page(page)) => Ok(page),
            Some(Response::Error(err)) => Err(mock_error(err)),
            mock_resp => panic!("expected page response, found {mock_resp:?}"),
        }
    }

    async fn list_by_category(
        &self,
        _slug: impl AsRef<str> + Send + Sync,
    ) -> Result<Vec<Product>, CatalogClientError> {
        match self.next_response().await {
            Some(Response::Products(products)) => Ok(products),
            Some(Response::Error(err)) => Err(mock_error(err)),
            mock_resp => panic!("expected products response, found {mock_resp:?}"),
        }
    }

    async fn list_category_slugs(&self) -> Result<Vec<String>, CatalogClientError> {
        match self.next_response().await {
            Some(Response::CategorySlugs(slugs)) => Ok(slugs),
            // `[]` parses as the first matching untagged variant
            Some(Response::Products(products)) if products.is_empty() => Ok(Vec::new()),
            Some(Response::Error(err)) => Err(mock_error(err)),
            mock_resp => panic!("expected category slugs response, found {mock_resp:?}"),
        }
    }

    async fn list_categories(&self) -> Result<Vec<Category>, CatalogClientError> {
        match self.next_response().await {
            Some(Response::Categories(categories)) => Ok(categories),
            Some(Response::Products(products)) if products.is_empty() => Ok(Vec::new()),
            Some(Response::Error(err)) => Err(mock_error(err)),
            mock_resp => panic!("expected categories response, found {mock_resp:?}"),
        }
    }

    async fn get_by_id(&self, id: ProductId) -> Result<Product, GetProductError> {
        match self.next_response().await {
            Some(Response::Product(product)) => Ok(product),
            Some(Response::Error(err)) => {
                Err(GetProductError::from_client_error(id, mock_error(err)))
            },
            mock_resp => panic!("expected product response, found {mock_resp:?}"),
        }
    }

    async fn create(&self, _draft: &ProductDraft) -> Result<Product, CatalogClientError> {
        match self.next_response().await {
            Some(Response::Product(product)) => Ok(product),
            Some(Response::Error(err)) => Err(mock_error(err)),
            mock_resp => panic!("expected product response, found {mock_resp:?}"),
        }
    }

    async fn update(
        &self,
        id: ProductId,
        _draft: &ProductDraft,
    ) -> Result<Product, GetProductError> {
        self.get_by_id(id).await
    }

    async fn delete(&self, id: ProductId) -> Result<DeletedProduct, GetProductError> {
        let product = self.get_by_id(id).await?;
        Ok(DeletedProduct {
            product,
            is_deleted: true,
            deleted_on: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serde_json::json;

    use super::*;

    #[test]
    fn reads_responses_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let data = json!([
            { "items": [{ "id": 1, "title": "a" }], "total": 1, "page_size": 12 },
            ["beauty", "laptops"],
            [{ "slug": "beauty", "name": "Beauty", "url": "" }],
            { "id": 2, "title": "b" },
            [{ "id": 3, "title": "c" }],
            { "status": 500, "message": "boom" }
        ]);
        write!(file, "{data}").unwrap();

        let responses = read_mock_responses(file.path()).unwrap();
        let kinds = responses
            .iter()
            .map(|response| match response {
                Response::Error(_) => "error",
                Response::Page(_) => "page",
                Response::Product(_) => "product",
                Response::Products(_) => "products",
                Response::CategorySlugs(_) => "slugs",
                Response::Categories(_) => "categories",
            })
            .collect::<Vec<_>>();
        assert_eq!(kinds, vec![
            "page",
            "slugs",
            "categories",
            "product",
            "products",
            "error"
        ]);
    }

    #[tokio::test]
    async fn answers_in_push_order() {
        let client = MockClient::default();
        let page_size = NonZeroU32::new(12).unwrap();
        client.push_page(vec![Product::new(1, "a")], 1, page_size);
        client.push_error_response(404, "Product with id '9' not found");

        let page = client.list_default(page_size, 0).await.unwrap();
        assert_eq!(page.total(), 1);

        let missing = client.get_by_id(ProductId::from(9)).await;
        assert!(matches!(missing, Err(GetProductError::NotFound(_))));
        assert_eq!(client.remaining(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn delayed_responses_complete_out_of_order() {
        let client = MockClient::default();
        let page_size = NonZeroU32::new(12).unwrap();
        client.push_delayed_response(
            Response::Page(ResultPage::new(vec![Product::new(1, "slow")], 1, page_size)),
            Duration::from_millis(50),
        );
        client.push_page(vec![Product::new(2, "fast")], 1, page_size);

        let completed = Mutex::new(Vec::new());
        let slow = async {
            let page = client.search("slow", page_size, 0).await.unwrap();
            completed.lock().unwrap().push(page.items()[0].id);
        };
        let fast = async {
            // yield so the slow request takes its response first
            tokio::task::yield_now().await;
            let page = client.search("fast", page_size, 0).await.unwrap();
            completed.lock().unwrap().push(page.items()[0].id);
        };
        tokio::join!(slow, fast);

        assert_eq!(completed.into_inner().unwrap(), vec![
            ProductId::from(2),
            ProductId::from(1)
        ]);
    }
}
