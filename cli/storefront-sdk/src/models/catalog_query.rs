//! Query state for product listings and the reconciliation of catalog
//! responses into a single observable view.
//!
//! Every change to the query is a dispatch: it updates the [QueryState],
//! marks the view as loading and hands back a [FetchRequest]. Running the
//! request fetches from the catalog and applies the result, unless another
//! request was dispatched in the meantime. Late responses never overwrite
//! newer ones.

use std::future::Future;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use storefront_catalog::types::{Product, ResultPage};
use storefront_catalog::{CatalogClientError, ClientTrait};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use super::pagination::{PageControls, paginate_locally, total_pages};
use super::query::{CategoryFilter, FetchPlan, QueryState};

pub const DEFAULT_PAGE_SIZE: NonZeroU32 = NonZeroU32::new(12).unwrap();
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_FEATURED_LIMIT: NonZeroU32 = NonZeroU32::new(15).unwrap();

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySettings {
    pub page_size: NonZeroU32,
    /// Upper bound for a single catalog call.
    pub request_timeout: Duration,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Identifies a dispatch. Later dispatches have larger ids.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display,
)]
pub struct RequestId(u64);

impl RequestId {
    fn next(self) -> Self {
        RequestId(self.0 + 1)
    }
}

/// A dispatched, not yet executed fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchRequest {
    id: RequestId,
    query: QueryState,
}

impl FetchRequest {
    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn query(&self) -> &QueryState {
        &self.query
    }
}

#[derive(Debug, Error)]
pub enum CatalogFetchError {
    #[error("failed to load products")]
    Catalog(#[from] CatalogClientError),
    #[error("the catalog did not respond within {0:?}")]
    Timeout(Duration),
}

/// Outcome of [CatalogQueryController::run].
#[derive(Debug, Clone)]
pub enum FetchStatus {
    /// The page was loaded and is now displayed.
    Applied,
    /// The fetch failed, the previously displayed page is kept.
    Failed(Arc<CatalogFetchError>),
    /// A newer request was dispatched, the response was discarded.
    Stale,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NavigationError {
    #[error("a page is still loading")]
    FetchInFlight,
    #[error("page {page} does not exist, there are {total_pages} pages")]
    PageOutOfRange { page: u32, total_pages: u32 },
}

/// A page together with the query it answers.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedPage {
    pub query: QueryState,
    pub result: ResultPage,
}

/// Everything needed to render a product listing.
#[derive(Debug, Clone, Default)]
pub struct CatalogView {
    /// The query of the latest dispatch.
    pub query: QueryState,
    /// The last page that was successfully loaded.
    pub page: Option<LoadedPage>,
    /// The error of the latest request, cleared once a request succeeds.
    pub error: Option<Arc<CatalogFetchError>>,
    pub loading: bool,
    /// Category slugs to filter by.
    pub categories: Vec<String>,
    latest_request: RequestId,
}

impl CatalogView {
    pub fn items(&self) -> &[Product] {
        self.page.as_ref().map_or(&[], |page| page.result.items())
    }

    pub fn total(&self) -> u64 {
        self.page.as_ref().map_or(0, |page| page.result.total())
    }

    pub fn total_pages(&self) -> u32 {
        self.page
            .as_ref()
            .map_or(0, |page| total_pages(page.result.total(), page.result.page_size()))
    }

    /// The page number of the displayed items.
    pub fn current_page(&self) -> NonZeroU32 {
        self.page
            .as_ref()
            .map_or(self.query.page(), |page| page.query.page())
    }

    /// Pagination controls for the displayed page, if one was loaded.
    pub fn page_controls(&self) -> Option<PageControls> {
        let page = self.page.as_ref()?;
        Some(PageControls::new(
            page.result.total(),
            page.result.page_size(),
            page.query.page(),
            self.loading,
        ))
    }

    /// Where navigation starts from and how many pages it may reach.
    ///
    /// Only a loaded page of the current listing bounds navigation. After a
    /// search or category change that has not loaded yet, or failed, only
    /// the first page of the new listing is reachable.
    fn navigation_origin(&self) -> (NonZeroU32, u32) {
        match &self.page {
            Some(loaded) if loaded.query.same_listing(&self.query) => (
                loaded.query.page(),
                total_pages(loaded.result.total(), loaded.result.page_size()),
            ),
            _ => (self.query.page(), 0),
        }
    }

    fn dispatch(&mut self, update: impl FnOnce(QueryState) -> QueryState) -> FetchRequest {
        self.latest_request = self.latest_request.next();
        self.query = update(std::mem::take(&mut self.query));
        self.loading = true;
        FetchRequest {
            id: self.latest_request,
            query: self.query.clone(),
        }
    }
}

/// Owns the listing query and the view derived from it.
///
/// Dispatching methods are synchronous and return the [FetchRequest] to pass
/// to [CatalogQueryController::run].
#[derive(Debug)]
pub struct CatalogQueryController<C> {
    client: C,
    settings: QuerySettings,
    state: watch::Sender<CatalogView>,
}

impl<C: ClientTrait> CatalogQueryController<C> {
    pub fn new(client: C, settings: QuerySettings) -> Self {
        let (state, _) = watch::channel(CatalogView::default());
        Self {
            client,
            settings,
            state,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn settings(&self) -> &QuerySettings {
        &self.settings
    }

    /// Watch the view. Receivers are only notified about actual changes.
    pub fn subscribe(&self) -> watch::Receiver<CatalogView> {
        self.state.subscribe()
    }

    pub fn view(&self) -> CatalogView {
        self.state.borrow().clone()
    }

    pub fn page_controls(&self) -> Option<PageControls> {
        self.state.borrow().page_controls()
    }

    fn dispatch(&self, update: impl FnOnce(QueryState) -> QueryState) -> FetchRequest {
        let mut request = FetchRequest::default();
        self.state.send_modify(|view| request = view.dispatch(update));
        debug!(id = %request.id, query = ?request.query, "dispatched fetch");
        request
    }

    /// Start listing the first page of `search_query`.
    pub fn set_search_query(&self, search_query: impl Into<String>) -> FetchRequest {
        let search_query = search_query.into();
        self.dispatch(|query| query.with_search_query(search_query))
    }

    /// Start listing the first page of `category`.
    pub fn set_category(&self, category: CategoryFilter) -> FetchRequest {
        self.dispatch(|query| query.with_category(category))
    }

    /// Fetch the current query again, e.g. after an error.
    pub fn reload(&self) -> FetchRequest {
        self.dispatch(|query| query)
    }

    /// Navigate to `page` of the current query.
    ///
    /// Rejected while a fetch is pending and for pages past the last known
    /// one. Before any page was loaded only the first page is valid.
    pub fn go_to_page(&self, page: NonZeroU32) -> Result<FetchRequest, NavigationError> {
        let mut outcome = Err(NavigationError::FetchInFlight);
        self.state.send_if_modified(|view| {
            if view.loading {
                return false;
            }
            let (_, total_pages) = view.navigation_origin();
            if page.get() > total_pages.max(1) {
                outcome = Err(NavigationError::PageOutOfRange {
                    page: page.get(),
                    total_pages,
                });
                return false;
            }
            outcome = Ok(view.dispatch(|query| query.with_page(page)));
            true
        });
        if let Ok(request) = &outcome {
            debug!(id = %request.id, %page, "dispatched page navigation");
        }
        outcome
    }

    pub fn next_page(&self) -> Result<FetchRequest, NavigationError> {
        let (current, _) = self.state.borrow().navigation_origin();
        self.go_to_page(current.saturating_add(1))
    }

    pub fn previous_page(&self) -> Result<FetchRequest, NavigationError> {
        let (current, total_pages) = self.state.borrow().navigation_origin();
        let previous =
            NonZeroU32::new(current.get() - 1).ok_or(NavigationError::PageOutOfRange {
                page: 0,
                total_pages,
            })?;
        self.go_to_page(previous)
    }

    /// Execute a dispatched request and apply its result if it is still the
    /// latest one.
    #[instrument(skip_all, fields(request = %request.id))]
    pub async fn run(&self, request: FetchRequest) -> FetchStatus {
        let result = self.fetch_page(request.query()).await;
        self.reconcile(request, result)
    }

    fn reconcile(
        &self,
        request: FetchRequest,
        result: Result<ResultPage, CatalogFetchError>,
    ) -> FetchStatus {
        let mut status = FetchStatus::Stale;
        self.state.send_if_modified(|view| {
            if view.latest_request != request.id {
                return false;
            }
            view.loading = false;
            match result {
                Ok(result) => {
                    view.page = Some(LoadedPage {
                        query: request.query,
                        result,
                    });
                    view.error = None;
                    status = FetchStatus::Applied;
                },
                Err(err) => {
                    let err = Arc::new(err);
                    view.error = Some(err.clone());
                    status = FetchStatus::Failed(err);
                },
            }
            true
        });

        match &status {
            FetchStatus::Applied => debug!("applied page"),
            FetchStatus::Failed(err) => warn!(error = %err, "failed to load page"),
            FetchStatus::Stale => debug!("discarded stale response"),
        }
        status
    }

    /// Fetch one page of `query` without touching the view.
    pub async fn fetch_page(&self, query: &QueryState) -> Result<ResultPage, CatalogFetchError> {
        let plan = FetchPlan::for_query(query, self.settings.page_size);
        debug!(?plan, "fetching page");
        self.with_timeout(plan.execute(&self.client)).await
    }

    /// Refresh the category list. On failure the current list is kept.
    pub async fn load_categories(&self) -> Result<(), CatalogFetchError> {
        match self.with_timeout(self.client.list_category_slugs()).await {
            Ok(categories) => {
                debug!(count = categories.len(), "loaded categories");
                self.state.send_if_modified(|view| {
                    if view.categories == categories {
                        return false;
                    }
                    view.categories = categories;
                    true
                });
                Ok(())
            },
            Err(err) => {
                warn!(error = %err, "failed to load categories");
                Err(err)
            },
        }
    }

    /// The first `limit` products of the default listing.
    pub async fn featured_products(
        &self,
        limit: NonZeroU32,
    ) -> Result<Vec<Product>, CatalogFetchError> {
        let page = self
            .with_timeout(self.client.list_default(limit, 0))
            .await?;
        Ok(page.into_items())
    }

    async fn with_timeout<T>(
        &self,
        fut: impl Future<Output = Result<T, CatalogClientError>>,
    ) -> Result<T, CatalogFetchError> {
        match tokio::time::timeout(self.settings.request_timeout, fut).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(CatalogFetchError::Timeout(self.settings.request_timeout)),
        }
    }
}

impl FetchPlan {
    /// Run the plan against `client`, yielding one page.
    pub async fn execute(self, client: &impl ClientTrait) -> Result<ResultPage, CatalogClientError> {
        match self {
            FetchPlan::Search {
                term,
                limit,
                offset,
            } => client.search(term, limit, offset).await,
            FetchPlan::Default { limit, offset } => client.list_default(limit, offset).await,
            FetchPlan::Category {
                slug,
                page,
                page_size,
            } => {
                let all = client.list_by_category(slug).await?;
                Ok(paginate_locally(all, page, page_size))
            },
        }
    }
}
