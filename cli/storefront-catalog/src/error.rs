//! Error handling for catalog API operations.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::ProductId;

/// Body of an error response as sent by the catalog service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub message: String,
}

/// Common error type for catalog API operations.
#[derive(Debug, Error)]
pub enum CatalogClientError {
    #[error("catalog request failed")]
    Request(#[source] reqwest::Error),
    /// A non-success status with an error body we could parse.
    #[error("{status}: {message}")]
    ErrorResponse { status: StatusCode, message: String },
    /// A non-success status without a recognizable error body.
    #[error("{0}")]
    UnexpectedResponse(StatusCode),
    #[error("invalid response from catalog")]
    InvalidResponsePayload(#[source] reqwest::Error),
    #[error("invalid catalog url '{url}'")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("{}", .0)]
    Other(String),
}

impl CatalogClientError {
    /// The HTTP status of the response that caused this error, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            CatalogClientError::ErrorResponse { status, .. } => Some(*status),
            CatalogClientError::UnexpectedResponse(status) => Some(*status),
            CatalogClientError::Request(err) | CatalogClientError::InvalidResponsePayload(err) => {
                err.status()
            },
            CatalogClientError::InvalidUrl { .. } | CatalogClientError::Other(_) => None,
        }
    }
}

/// Errors of operations addressing a single product.
#[derive(Debug, Error)]
pub enum GetProductError {
    #[error("product {0} not found")]
    NotFound(ProductId),
    #[error(transparent)]
    CatalogClientError(#[from] CatalogClientError),
}

impl GetProductError {
    /// Maps a `404` from the catalog to [GetProductError::NotFound],
    /// so consumers don't need to inspect the raw error response.
    pub(crate) fn from_client_error(id: ProductId, err: CatalogClientError) -> Self {
        match err.status() {
            Some(StatusCode::NOT_FOUND) => GetProductError::NotFound(id),
            _ => GetProductError::CatalogClientError(err),
        }
    }
}

/// Extension trait for turning non-success responses into client errors.
pub trait MapApiErrorExt: Sized {
    /// Returns the response unchanged if its status is a success,
    /// otherwise consumes it and returns a [CatalogClientError].
    fn map_api_error(
        self,
    ) -> impl std::future::Future<Output = Result<reqwest::Response, CatalogClientError>> + Send;
}

impl MapApiErrorExt for reqwest::Response {
    async fn map_api_error(self) -> Result<reqwest::Response, CatalogClientError> {
        let status = self.status();
        if status.is_success() {
            return Ok(self);
        }

        // The body may be HTML garbage from a proxy, only keep it if it
        // matches the documented error shape.
        match self.json::<ApiErrorResponse>().await {
            Ok(ApiErrorResponse { message }) => {
                Err(CatalogClientError::ErrorResponse { status, message })
            },
            Err(_) => Err(CatalogClientError::UnexpectedResponse(status)),
        }
    }
}
