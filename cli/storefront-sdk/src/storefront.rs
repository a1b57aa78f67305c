use std::num::NonZeroU32;

use storefront_catalog::ClientTrait;

use crate::models::catalog_query::{CatalogQueryController, DEFAULT_FEATURED_LIMIT, QuerySettings};
use crate::models::favorites::FavoritesStore;

/// The state shared by everything a single storefront session does.
///
/// One invocation of the CLI runs on a single instance, which owns the
/// catalog client through the listing controller.
#[derive(Debug)]
pub struct Storefront<C> {
    pub catalog: CatalogQueryController<C>,
    pub favorites: FavoritesStore,
    pub featured_limit: NonZeroU32,
}

impl<C: ClientTrait> Storefront<C> {
    pub fn new(client: C, settings: QuerySettings) -> Self {
        Self {
            catalog: CatalogQueryController::new(client, settings),
            favorites: FavoritesStore::new(),
            featured_limit: DEFAULT_FEATURED_LIMIT,
        }
    }

    pub fn client(&self) -> &C {
        self.catalog.client()
    }
}
