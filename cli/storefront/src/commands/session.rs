use std::num::NonZeroU32;
use std::str::FromStr;

use anyhow::{Context, Result};
use bpaf::Bpaf;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use indoc::indoc;
use storefront_catalog::ClientTrait;
use storefront_catalog::types::{ProductId, category_display_name};
use storefront_sdk::models::catalog_query::{CatalogView, FetchRequest, FetchStatus};
use storefront_sdk::models::favorites::{Favorites, Toggled};
use storefront_sdk::models::query::CategoryFilter;
use storefront_sdk::storefront::Storefront;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, instrument};

use crate::utils::display::{DisplayPageControls, DisplayProduct, DisplayProducts};
use crate::utils::errors::{format_fetch_error, format_get_product_error};
use crate::utils::message;

const SESSION_HELP: &str = indoc! {"
    Commands:
      search <term>       list products matching <term>, 'search' alone clears it
      category <slug>     list products of a category, 'category all' clears it
      page <n>            go to page <n>
      next, prev          go to the next or previous page
      retry               load the current page again
      fav <id>            add or remove a product on this page as favorite
      favs                list favorites
      show <id>           show details about a product
      categories          list categories
      help                show this message
      quit                leave the session"
};

// Browse the catalog interactively
#[derive(Debug, Bpaf, Clone)]
pub struct Session {
    /// Start with products matching <term>
    #[bpaf(long, short, argument("term"))]
    pub search: Option<String>,

    /// Start with products of <category>
    #[bpaf(long, short, argument("category"))]
    pub category: Option<CategoryFilter>,
}

/// A line of input in an interactive session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Search(String),
    Category(CategoryFilter),
    Page(NonZeroU32),
    Next,
    Previous,
    Retry,
    ToggleFavorite(ProductId),
    Favorites,
    Show(ProductId),
    Categories,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq)]
pub enum ParseSessionCommandError {
    #[error("unknown command '{0}', type 'help' for a list of commands")]
    Unknown(String),
    #[error("'{command}' expects {expected}")]
    MissingArgument {
        command: &'static str,
        expected: &'static str,
    },
    #[error("'{value}' is not a valid {expected}")]
    InvalidArgument {
        expected: &'static str,
        value: String,
    },
}

impl FromStr for SessionCommand {
    type Err = ParseSessionCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (command, argument) = match s.split_once(char::is_whitespace) {
            Some((command, argument)) => (command, argument.trim()),
            None => (s, ""),
        };

        let required = |name: &'static str, expected: &'static str| {
            if argument.is_empty() {
                Err(ParseSessionCommandError::MissingArgument {
                    command: name,
                    expected,
                })
            } else {
                Ok(argument)
            }
        };
        let product_id = |name: &'static str| {
            required(name, "a product id")?.parse::<ProductId>().map_err(|_| {
                ParseSessionCommandError::InvalidArgument {
                    expected: "product id",
                    value: argument.to_string(),
                }
            })
        };

        let command = match command {
            "search" | "s" => SessionCommand::Search(argument.to_string()),
            "category" | "c" => {
                SessionCommand::Category(CategoryFilter::from(required("category", "a slug")?))
            },
            "page" | "p" => {
                let page = required("page", "a page number")?;
                SessionCommand::Page(page.parse().map_err(|_| {
                    ParseSessionCommandError::InvalidArgument {
                        expected: "page number",
                        value: page.to_string(),
                    }
                })?)
            },
            "next" | "n" => SessionCommand::Next,
            "prev" | "previous" => SessionCommand::Previous,
            "retry" | "r" => SessionCommand::Retry,
            "fav" | "f" => SessionCommand::ToggleFavorite(product_id("fav")?),
            "favs" | "favorites" => SessionCommand::Favorites,
            "show" => SessionCommand::Show(product_id("show")?),
            "categories" => SessionCommand::Categories,
            "help" | "?" => SessionCommand::Help,
            "quit" | "exit" | "q" => SessionCommand::Quit,
            other => return Err(ParseSessionCommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

impl Session {
    #[instrument(name = "session", skip_all)]
    pub async fn handle(self, storefront: &Storefront<impl ClientTrait>) -> Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        self.run(storefront, stdin).await
    }

    /// Run a session reading commands from `input` until it ends or `quit`.
    ///
    /// Fetches run concurrently with reading input. A fetch that completes
    /// after a newer one was dispatched is discarded by the controller.
    async fn run(
        self,
        storefront: &Storefront<impl ClientTrait>,
        input: impl AsyncBufRead + Unpin,
    ) -> Result<()> {
        let catalog = &storefront.catalog;
        let badge = spawn_favorites_badge(storefront.favorites.subscribe());

        // the session works without categories, 'categories' shows none
        if let Err(err) = catalog.load_categories().await {
            debug!(error = %err, "starting session without categories");
        }

        let mut pending = FuturesUnordered::new();
        let mut initial = None;
        if let Some(category) = self.category {
            initial = Some(catalog.set_category(category));
        }
        if let Some(search) = self.search {
            initial = Some(catalog.set_search_query(search));
        }
        let initial = initial.unwrap_or_else(|| catalog.reload());
        pending.push(catalog.run(initial));

        message::plain("Type 'help' for a list of commands");

        let mut lines = input.lines();
        loop {
            tokio::select! {
                biased;

                Some(status) = pending.next(), if !pending.is_empty() => {
                    render_status(storefront, &status);
                },
                line = lines.next_line() => {
                    let Some(line) = line.context("Could not read input")? else {
                        break;
                    };
                    if line.trim().is_empty() {
                        continue;
                    }
                    let command = match line.parse::<SessionCommand>() {
                        Ok(SessionCommand::Quit) => break,
                        Ok(command) => command,
                        Err(err) => {
                            message::error(err);
                            continue;
                        },
                    };
                    debug!(?command, "session command");
                    if let Some(request) = execute(storefront, command).await {
                        pending.push(catalog.run(request));
                    }
                },
            }
        }

        badge.abort();
        Ok(())
    }
}

/// Print the favorites count every time the favorites change
fn spawn_favorites_badge(mut favorites: watch::Receiver<Favorites>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while favorites.changed().await.is_ok() {
            let count = favorites.borrow_and_update().len();
            message::plain(favorites_badge(count));
        }
    })
}

fn favorites_badge(count: usize) -> String {
    match count {
        1 => "♥ 1 favorite".to_string(),
        n => format!("♥ {n} favorites"),
    }
}

/// Run a command, returning the fetch it dispatched, if any
async fn execute(
    storefront: &Storefront<impl ClientTrait>,
    command: SessionCommand,
) -> Option<FetchRequest> {
    let catalog = &storefront.catalog;
    let navigation = match command {
        SessionCommand::Search(search) => return Some(catalog.set_search_query(search)),
        SessionCommand::Category(category) => return Some(catalog.set_category(category)),
        SessionCommand::Retry => return Some(catalog.reload()),
        SessionCommand::Page(page) => catalog.go_to_page(page),
        SessionCommand::Next => catalog.next_page(),
        SessionCommand::Previous => catalog.previous_page(),
        SessionCommand::ToggleFavorite(id) => {
            toggle_favorite(storefront, id);
            return None;
        },
        SessionCommand::Favorites => {
            let favorites = storefront.favorites.snapshot();
            if favorites.is_empty() {
                message::plain("No favorites yet");
            } else {
                let products = favorites.iter().cloned().collect::<Vec<_>>();
                println!("{}", DisplayProducts::new(&products));
            }
            return None;
        },
        SessionCommand::Show(id) => {
            match storefront.client().get_by_id(id).await {
                Ok(product) => {
                    println!("{}", DisplayProduct(&product));
                    if storefront.favorites.is_favorite(id) {
                        message::plain("♥ in your favorites");
                    }
                },
                Err(err) => message::error(format_get_product_error(&err)),
            }
            return None;
        },
        SessionCommand::Categories => {
            list_categories(&catalog.view());
            return None;
        },
        SessionCommand::Help => {
            message::plain(SESSION_HELP);
            return None;
        },
        SessionCommand::Quit => return None,
    };

    match navigation {
        Ok(request) => Some(request),
        Err(err) => {
            message::warning(err);
            None
        },
    }
}

/// Toggle a product listed on the current page, or remove any favorite
fn toggle_favorite(storefront: &Storefront<impl ClientTrait>, id: ProductId) {
    let view = storefront.catalog.view();
    let product = view
        .items()
        .iter()
        .find(|product| product.id == id)
        .cloned()
        .or_else(|| storefront.favorites.snapshot().get(id).cloned());

    let Some(product) = product else {
        message::error(format!("Product {id} is not on the current page"));
        return;
    };

    let title = product.title.clone();
    match storefront.favorites.toggle(product) {
        Toggled::Added => message::updated(format!("Added '{title}' to favorites")),
        Toggled::Removed => message::updated(format!("Removed '{title}' from favorites")),
    }
}

fn list_categories(view: &CatalogView) {
    if view.categories.is_empty() {
        message::plain("No categories available");
        return;
    }
    let current = view.query.category().slug();
    for slug in &view.categories {
        let marker = if Some(slug.as_str()) == current { '*' } else { ' ' };
        println!("{marker} {slug}  ({})", category_display_name(slug));
    }
}

fn render_status(storefront: &Storefront<impl ClientTrait>, status: &FetchStatus) {
    match status {
        FetchStatus::Applied => render_view(storefront, &storefront.catalog.view()),
        FetchStatus::Failed(err) => {
            message::error(format_fetch_error(err));
            message::plain("Type 'retry' to try again");
        },
        FetchStatus::Stale => debug!("skipping stale page"),
    }
}

fn render_view(storefront: &Storefront<impl ClientTrait>, view: &CatalogView) {
    let query = &view.query;
    let heading = match (query.search_term(), query.category().slug()) {
        (Some(term), _) => format!("Search results for '{term}'"),
        (None, Some(slug)) => format!("Category: {}", category_display_name(slug)),
        (None, None) => "All products".to_string(),
    };
    message::plain(format!("{heading} ({} products)", view.total()));

    if view.items().is_empty() {
        message::plain("No products found");
        return;
    }

    let favorites = storefront.favorites.snapshot();
    println!(
        "{}",
        DisplayProducts::new(view.items()).with_favorites(&favorites)
    );
    if let Some(controls) = view.page_controls().filter(|c| c.is_visible()) {
        message::plain(DisplayPageControls(&controls));
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use storefront_catalog::types::Product;
    use storefront_catalog::{MockClient, MockResponse};
    use storefront_sdk::models::catalog_query::{DEFAULT_PAGE_SIZE, QuerySettings};

    use super::*;
    use crate::utils::message::history::History;

    fn products(ids: impl IntoIterator<Item = u64>) -> Vec<Product> {
        ids.into_iter()
            .map(|id| Product::new(id, format!("product {id}")))
            .collect()
    }

    fn empty_session() -> Session {
        Session {
            search: None,
            category: None,
        }
    }

    #[test]
    fn parses_commands() {
        let cases = [
            ("search red shoes", SessionCommand::Search("red shoes".to_string())),
            ("search", SessionCommand::Search(String::new())),
            ("category all", SessionCommand::Category(CategoryFilter::All)),
            (
                "c laptops",
                SessionCommand::Category(CategoryFilter::Slug("laptops".to_string())),
            ),
            ("page 3", SessionCommand::Page(NonZeroU32::new(3).unwrap())),
            ("  next ", SessionCommand::Next),
            ("prev", SessionCommand::Previous),
            ("fav 12", SessionCommand::ToggleFavorite(ProductId::from(12))),
            ("show 7", SessionCommand::Show(ProductId::from(7))),
            ("quit", SessionCommand::Quit),
        ];
        for (input, expected) in cases {
            assert_eq!(input.parse::<SessionCommand>(), Ok(expected), "{input}");
        }
    }

    #[test]
    fn rejects_invalid_commands() {
        assert_eq!(
            "dance".parse::<SessionCommand>(),
            Err(ParseSessionCommandError::Unknown("dance".to_string()))
        );
        assert_eq!(
            "page".parse::<SessionCommand>(),
            Err(ParseSessionCommandError::MissingArgument {
                command: "page",
                expected: "a page number",
            })
        );
        assert_eq!(
            "page 0".parse::<SessionCommand>(),
            Err(ParseSessionCommandError::InvalidArgument {
                expected: "page number",
                value: "0".to_string(),
            })
        );
        assert!(matches!(
            "fav abc".parse::<SessionCommand>(),
            Err(ParseSessionCommandError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn badge_counts_favorites() {
        assert_eq!(favorites_badge(0), "♥ 0 favorites");
        assert_eq!(favorites_badge(1), "♥ 1 favorite");
        assert_eq!(favorites_badge(3), "♥ 3 favorites");
    }

    #[tokio::test]
    async fn navigates_and_collects_favorites() {
        let client = MockClient::default();
        client.push_response(MockResponse::CategorySlugs(vec!["laptops".to_string()]));
        client.push_page(products(1..=12), 40, DEFAULT_PAGE_SIZE);
        client.push_response(MockResponse::Products(products(1..=37)));
        client.push_response(MockResponse::Products(products(1..=37)));
        let storefront = Storefront::new(client.clone(), QuerySettings::default());

        let script = indoc! {"
            category laptops
            page 3
            fav 25
            fav 2
            quit
        "};
        History::global().clear();
        empty_session()
            .run(&storefront, script.as_bytes())
            .await
            .unwrap();

        let view = storefront.catalog.view();
        assert_eq!(view.current_page().get(), 3);
        assert_eq!(view.categories, vec!["laptops"]);
        assert!(storefront.favorites.is_favorite(ProductId::from(25)));
        assert_eq!(storefront.favorites.len(), 1);
        assert_eq!(client.remaining(), 0);

        let messages = History::global().messages();
        assert!(messages.contains(&"✅ Added 'product 25' to favorites".to_string()));
        assert!(messages.contains(&"❌ ERROR: Product 2 is not on the current page".to_string()));
        assert!(messages.contains(&"Category: laptops (37 products)".to_string()));
    }

    #[tokio::test]
    async fn failed_page_can_be_retried() {
        let client = MockClient::default();
        client.push_error_response(503, "unavailable");
        client.push_error_response(500, "internal error");
        client.push_page(products(1..=3), 3, DEFAULT_PAGE_SIZE);
        let storefront = Storefront::new(client.clone(), QuerySettings::default());

        History::global().clear();
        empty_session()
            .run(&storefront, "retry\n".as_bytes())
            .await
            .unwrap();

        let view = storefront.catalog.view();
        assert!(view.error.is_none());
        assert_eq!(view.items().len(), 3);
        // the failed category load didn't stop the session
        assert!(view.categories.is_empty());
        assert_eq!(client.remaining(), 0);

        let messages = History::global().messages();
        assert!(messages.contains(&"Type 'retry' to try again".to_string()));
        assert!(messages.contains(&"All products (3 products)".to_string()));
    }
}
