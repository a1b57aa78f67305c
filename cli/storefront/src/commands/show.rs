use anyhow::Result;
use bpaf::Bpaf;
use storefront_catalog::ClientTrait;
use storefront_catalog::types::ProductId;
use storefront_sdk::storefront::Storefront;
use tracing::instrument;

use crate::utils::display::DisplayProduct;

// Show details about a single product
#[derive(Debug, Bpaf, Clone)]
pub struct Show {
    /// Display the product as JSON
    #[bpaf(long)]
    pub json: bool,

    /// The id of the product to show
    #[bpaf(positional("id"))]
    pub id: ProductId,
}

impl Show {
    #[instrument(name = "show", skip_all, fields(id = %self.id))]
    pub async fn handle(self, storefront: &Storefront<impl ClientTrait>) -> Result<()> {
        let product = storefront.client().get_by_id(self.id).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&product)?);
        } else {
            println!("{}", DisplayProduct(&product));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use storefront_catalog::{GetProductError, MockClient};
    use storefront_sdk::models::catalog_query::QuerySettings;

    use super::*;

    #[tokio::test]
    async fn missing_product_is_reported() {
        let client = MockClient::default();
        client.push_error_response(404, "Product with id '99' not found");
        let storefront = Storefront::new(client, QuerySettings::default());

        let err = Show {
            json: false,
            id: ProductId::from(99),
        }
        .handle(&storefront)
        .await
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GetProductError>(),
            Some(GetProductError::NotFound(id)) if *id == ProductId::from(99)
        ));
    }
}
