use anyhow::Result;
use bpaf::Bpaf;
use storefront_catalog::ClientTrait;
use storefront_sdk::storefront::Storefront;
use tracing::instrument;

use crate::utils::display::DisplayProducts;
use crate::utils::message;

// Show a selection of products
#[derive(Debug, Bpaf, Clone)]
pub struct Featured {
    /// Display the products as a JSON array
    #[bpaf(long)]
    pub json: bool,
}

impl Featured {
    #[instrument(name = "featured", skip_all)]
    pub async fn handle(self, storefront: &Storefront<impl ClientTrait>) -> Result<()> {
        let products = storefront
            .catalog
            .featured_products(storefront.featured_limit)
            .await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&products)?);
            return Ok(());
        }

        if products.is_empty() {
            message::plain("No featured products");
            return Ok(());
        }

        message::plain("Featured products:");
        println!("{}", DisplayProducts::new(&products));
        Ok(())
    }
}
