use indoc::formatdoc;
use storefront_catalog::{CatalogClientError, GetProductError};
use storefront_sdk::models::catalog_query::CatalogFetchError;
use tracing::trace;

/// Human readable rendering of a failed listing fetch.
pub fn format_fetch_error(err: &CatalogFetchError) -> String {
    trace!("formatting fetch error: {err:?}");

    match err {
        CatalogFetchError::Timeout(timeout) => formatdoc! {"
            The catalog did not respond within {timeout:?}.

            Retry, or raise 'request_timeout_secs' in the storefront config.
        "},
        CatalogFetchError::Catalog(err) => format_client_error(err),
    }
}

pub fn format_client_error(err: &CatalogClientError) -> String {
    match err {
        CatalogClientError::ErrorResponse { status, message } => {
            format!("The catalog rejected the request ({status}): {message}")
        },
        CatalogClientError::Request(_) => formatdoc! {"
            Failed to reach the catalog: {chain}

            Check your network connection and the configured 'catalog_url'.
        ", chain = display_chain(err)},
        _ => display_chain(err),
    }
}

pub fn format_get_product_error(err: &GetProductError) -> String {
    match err {
        GetProductError::NotFound(id) => format!("Product {id} not found"),
        GetProductError::CatalogClientError(err) => format_client_error(err),
    }
}

/// Render an error returned by a command.
///
/// Catalog errors get their dedicated rendering, anything else is printed
/// with its chain of causes.
pub fn format_error(err: &anyhow::Error) -> String {
    if let Some(err) = err.downcast_ref::<CatalogFetchError>() {
        return format_fetch_error(err);
    }
    if let Some(err) = err.downcast_ref::<GetProductError>() {
        return format_get_product_error(err);
    }
    if let Some(err) = err.downcast_ref::<CatalogClientError>() {
        return format_client_error(err);
    }

    err.chain()
        .skip(1)
        .fold(err.to_string(), |acc, cause| format!("{acc}: {cause}"))
}

pub fn display_chain(mut err: &dyn std::error::Error) -> String {
    let mut fmt = err.to_string();
    while let Some(source) = err.source() {
        fmt = format!("{fmt}: {source}");
        err = source;
    }

    fmt
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use storefront_catalog::types::ProductId;

    use super::*;

    #[test]
    fn not_found_names_product() {
        let err = GetProductError::NotFound(ProductId::from(42));
        assert_eq!(format_get_product_error(&err), "Product 42 not found");
    }

    #[test]
    fn error_response_includes_status_and_message() {
        let err = CatalogFetchError::Catalog(CatalogClientError::ErrorResponse {
            status: reqwest_status(400),
            message: "bad query".to_string(),
        });
        let formatted = format_fetch_error(&err);
        assert!(formatted.contains("400"), "{formatted}");
        assert!(formatted.contains("bad query"), "{formatted}");
    }

    #[test]
    fn timeout_suggests_config() {
        let formatted = format_fetch_error(&CatalogFetchError::Timeout(Duration::from_secs(10)));
        assert!(formatted.contains("10s"), "{formatted}");
        assert!(formatted.contains("request_timeout_secs"), "{formatted}");
    }

    #[test]
    fn chain_joins_sources() {
        let err = CatalogFetchError::Catalog(CatalogClientError::Other("boom".to_string()));
        assert!(display_chain(&err).ends_with(": boom"));
    }

    #[test]
    fn command_errors_keep_catalog_rendering() {
        let err = anyhow::Error::new(GetProductError::NotFound(ProductId::from(7)));
        assert_eq!(format_error(&err), "Product 7 not found");

        let err = anyhow::Error::new(CatalogFetchError::Timeout(Duration::from_secs(3)));
        assert!(format_error(&err).contains("request_timeout_secs"));

        let err = anyhow::Error::new(CatalogClientError::ErrorResponse {
            status: reqwest_status(503),
            message: "unavailable".to_string(),
        });
        assert_eq!(
            format_error(&err),
            "The catalog rejected the request (503 Service Unavailable): unavailable"
        );
    }

    #[test]
    fn other_errors_print_their_causes() {
        let err = anyhow::anyhow!("disk full").context("Could not write config");
        assert_eq!(format_error(&err), "Could not write config: disk full");
    }

    fn reqwest_status(code: u16) -> storefront_catalog::StatusCode {
        storefront_catalog::StatusCode::from_u16(code).unwrap()
    }
}
