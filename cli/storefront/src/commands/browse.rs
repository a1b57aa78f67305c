use std::num::NonZeroU32;

use anyhow::{Result, bail};
use bpaf::Bpaf;
use serde::Serialize;
use storefront_catalog::ClientTrait;
use storefront_catalog::types::Product;
use storefront_sdk::models::catalog_query::NavigationError;
use storefront_sdk::models::pagination::{PageControls, total_pages};
use storefront_sdk::models::query::{CategoryFilter, QueryState};
use storefront_sdk::storefront::Storefront;
use tracing::instrument;

use crate::utils::display::{DisplayPageControls, DisplayProducts};
use crate::utils::message;

// List a page of products
#[derive(Debug, Bpaf, Clone)]
pub struct Browse {
    /// Only list products matching <term>
    #[bpaf(long, short, argument("term"))]
    pub search: Option<String>,

    /// Only list products of <category>, or 'all'.
    /// Ignored when searching.
    #[bpaf(long, short, argument("category"))]
    pub category: Option<CategoryFilter>,

    /// The page to show, starting at 1
    #[bpaf(long, short, argument("page"), fallback(NonZeroU32::MIN))]
    pub page: NonZeroU32,

    /// Display the page as JSON
    #[bpaf(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct JsonPage<'a> {
    page: NonZeroU32,
    total_pages: u32,
    total: u64,
    items: &'a [Product],
}

impl Browse {
    fn query(&self) -> QueryState {
        let mut query = QueryState::default();
        if let Some(category) = &self.category {
            query = query.with_category(category.clone());
        }
        if let Some(search) = &self.search {
            query = query.with_search_query(search.as_str());
        }
        query.with_page(self.page)
    }

    #[instrument(name = "browse", skip_all, fields(search = ?self.search, page = %self.page))]
    pub async fn handle(self, storefront: &Storefront<impl ClientTrait>) -> Result<()> {
        let query = self.query();
        let page = storefront.catalog.fetch_page(&query).await?;

        let total_pages = total_pages(page.total(), page.page_size());
        if page.is_empty() && self.page > NonZeroU32::MIN {
            bail!(NavigationError::PageOutOfRange {
                page: self.page.get(),
                total_pages,
            });
        }

        if self.json {
            let json = JsonPage {
                page: self.page,
                total_pages,
                total: page.total(),
                items: page.items(),
            };
            println!("{}", serde_json::to_string_pretty(&json)?);
            return Ok(());
        }

        if page.is_empty() {
            message::plain("No products found");
            return Ok(());
        }

        let favorites = storefront.favorites.snapshot();
        println!(
            "{}",
            DisplayProducts::new(page.items()).with_favorites(&favorites)
        );

        let controls = PageControls::new(page.total(), page.page_size(), self.page, false);
        if controls.is_visible() {
            message::plain(DisplayPageControls(&controls));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use storefront_catalog::{MockClient, MockResponse};
    use storefront_sdk::models::catalog_query::{DEFAULT_PAGE_SIZE, QuerySettings};

    use super::*;
    use crate::utils::message::history::History;

    fn browse(search: Option<&str>, category: Option<&str>, page: u32) -> Browse {
        Browse {
            search: search.map(str::to_string),
            category: category.map(CategoryFilter::from),
            page: NonZeroU32::new(page).unwrap(),
            json: false,
        }
    }

    #[test]
    fn search_wins_over_category() {
        let query = browse(Some("phone"), Some("laptops"), 2).query();
        assert_eq!(query.search_term(), Some("phone"));
        assert_eq!(query.category(), &CategoryFilter::from("laptops"));
        assert_eq!(query.page().get(), 2);
    }

    #[tokio::test]
    async fn prints_page_controls_for_multiple_pages() {
        let client = MockClient::default();
        let products = (13..=24).map(|id| Product::new(id, "p")).collect();
        client.push_page(products, 40, DEFAULT_PAGE_SIZE);
        let storefront = Storefront::new(client, QuerySettings::default());

        History::global().clear();
        browse(None, None, 2).handle(&storefront).await.unwrap();
        let messages = History::global().messages();
        assert_eq!(&messages, &["‹ 1 [2] 3 4 ›  page 2 of 4"]);
    }

    #[tokio::test]
    async fn empty_result_is_reported() {
        let client = MockClient::default();
        client.push_response(MockResponse::Products(Vec::new()));
        let storefront = Storefront::new(client, QuerySettings::default());

        History::global().clear();
        browse(None, Some("empty"), 1)
            .handle(&storefront)
            .await
            .unwrap();
        assert_eq!(&History::global().messages(), &["No products found"]);
    }

    #[tokio::test]
    async fn page_past_the_end_is_an_error() {
        let client = MockClient::default();
        client.push_page(Vec::new(), 20, DEFAULT_PAGE_SIZE);
        let storefront = Storefront::new(client, QuerySettings::default());

        let err = browse(Some("lamp"), None, 5)
            .handle(&storefront)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "page 5 does not exist, there are 2 pages");
    }
}
