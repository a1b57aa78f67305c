use anyhow::{Context, Result};
use bpaf::Bpaf;
use storefront_catalog::ClientTrait;
use storefront_sdk::storefront::Storefront;
use tracing::instrument;

use crate::utils::message;

// List the product categories
#[derive(Debug, Bpaf, Clone)]
pub struct Categories {
    /// Display the categories as a JSON array
    #[bpaf(long)]
    pub json: bool,
}

impl Categories {
    #[instrument(name = "categories", skip_all, fields(json = self.json))]
    pub async fn handle(self, storefront: &Storefront<impl ClientTrait>) -> Result<()> {
        let categories = storefront.client().list_categories().await?;

        if self.json {
            let json = serde_json::to_string_pretty(&categories)
                .context("Could not serialize categories")?;
            println!("{json}");
            return Ok(());
        }

        if categories.is_empty() {
            message::plain("The catalog has no categories");
            return Ok(());
        }

        let width = categories
            .iter()
            .map(|category| category.slug.len())
            .max()
            .unwrap_or_default();
        for category in categories {
            println!("{slug:<width$}  {name}", slug = category.slug, name = category.name);
        }
        Ok(())
    }
}
