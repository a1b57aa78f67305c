mod browse;
mod categories;
mod featured;
mod product;
mod session;
mod show;

use std::fmt;

use anyhow::Result;
use bpaf::{Bpaf, ParseFailure};
use indoc::indoc;
use storefront_catalog::Client;
use storefront_sdk::storefront::Storefront;
use tracing::debug;

use crate::config::Config;
use crate::utils::init::init_catalog_client;
use crate::utils::message;

static STOREFRONT_DESCRIPTION: &str = indoc! {"
    Browse, search and curate the products of a remote catalog from your terminal."
};

fn vec_len<T>(x: Vec<T>) -> usize {
    Vec::len(&x)
}

#[derive(Bpaf, Clone, Copy, Debug)]
pub enum Verbosity {
    Verbose(
        /// Increase logging verbosity
        ///
        /// Invoke multiple times for increasing detail.
        #[bpaf(short('v'), long("verbose"), req_flag(()), many, map(vec_len))]
        usize,
    ),

    /// Silence logs except for errors
    #[bpaf(short, long)]
    Quiet,
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::Verbose(0)
    }
}

#[derive(Bpaf)]
#[bpaf(options, version, descr(STOREFRONT_DESCRIPTION))]
pub struct StorefrontCli(#[bpaf(external(storefront_args))] pub StorefrontArgs);

/// Main storefront args parser
///
/// To parse the storefront CLI, use [`StorefrontCli`] via [`storefront_cli()`].
#[derive(Debug, Bpaf)]
#[bpaf(ignore_rustdoc)]
pub struct StorefrontArgs {
    /// Verbose mode
    ///
    /// Invoke multiple times for increasing detail.
    #[bpaf(external, fallback(Default::default()))]
    pub verbosity: Verbosity,

    #[bpaf(external(commands), optional)]
    command: Option<Commands>,
}

impl fmt::Debug for Commands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Command")
    }
}

impl StorefrontArgs {
    pub async fn handle(self, config: Config) -> Result<()> {
        // Given no command, print the help
        let Some(command) = self.command else {
            display_help(None);
            return Ok(());
        };

        let client = init_catalog_client(&config)?;
        let mut storefront = Storefront::new(client, config.query_settings());
        storefront.featured_limit = config.featured_limit;
        debug!(settings = ?storefront.catalog.settings(), "initialized storefront");

        command.handle(&storefront).await
    }
}

#[derive(Bpaf, Clone)]
enum Commands {
    /// Prints help information
    #[bpaf(command, hide)]
    Help(#[bpaf(external(help))] Help),

    Discover(#[bpaf(external(discover_commands))] DiscoverCommands),
    Manage(#[bpaf(external(manage_commands))] ManageCommands),

    /// Browse the catalog interactively
    #[bpaf(command, long("shell"))]
    Session(#[bpaf(external(session::session))] session::Session),
}

impl Commands {
    async fn handle(self, storefront: &Storefront<Client>) -> Result<()> {
        match self {
            Commands::Help(args) => args.handle(),
            Commands::Discover(args) => args.handle(storefront).await?,
            Commands::Manage(args) => args.handle(storefront).await?,
            Commands::Session(args) => args.handle(storefront).await?,
        }
        Ok(())
    }
}

#[derive(Debug, Bpaf, Clone)]
struct Help {
    /// Command to show help for
    #[bpaf(positional("cmd"))]
    cmd: Option<String>,
}

/// Force `--help` output for `storefront` with a given command
pub fn display_help(cmd: Option<String>) {
    let mut args = Vec::from_iter(cmd.as_deref());
    args.push("--help");

    match storefront_cli().run_inner(&*args) {
        Ok(_) => unreachable!(),
        Err(ParseFailure::Completion(comp)) => print!("{comp:80}"),
        Err(ParseFailure::Stdout(doc, _)) => message::plain(format!("{doc:80}")),
        Err(ParseFailure::Stderr(err)) => message::error(err),
    }
}

impl Help {
    fn handle(self) {
        display_help(self.cmd);
    }
}

/// Discover products
#[derive(Bpaf, Clone)]
enum DiscoverCommands {
    /// List a page of products, optionally filtered
    #[bpaf(command, long("list"))]
    Browse(#[bpaf(external(browse::browse))] browse::Browse),

    /// List the product categories
    #[bpaf(command)]
    Categories(#[bpaf(external(categories::categories))] categories::Categories),

    /// Show details about a single product
    #[bpaf(command)]
    Show(#[bpaf(external(show::show))] show::Show),

    /// Show a selection of products
    #[bpaf(command)]
    Featured(#[bpaf(external(featured::featured))] featured::Featured),
}

impl DiscoverCommands {
    async fn handle(self, storefront: &Storefront<Client>) -> Result<()> {
        match self {
            DiscoverCommands::Browse(args) => args.handle(storefront).await?,
            DiscoverCommands::Categories(args) => args.handle(storefront).await?,
            DiscoverCommands::Show(args) => args.handle(storefront).await?,
            DiscoverCommands::Featured(args) => args.handle(storefront).await?,
        }
        Ok(())
    }
}

/// Manage products
#[derive(Bpaf, Clone)]
enum ManageCommands {
    /// Add a product to the catalog
    #[bpaf(command, long("add"))]
    Create(#[bpaf(external(product::create))] product::Create),

    /// Change fields of an existing product
    #[bpaf(command, long("edit"))]
    Update(#[bpaf(external(product::update))] product::Update),

    /// Remove a product from the catalog
    #[bpaf(command, long("remove"))]
    Delete(#[bpaf(external(product::delete))] product::Delete),
}

impl ManageCommands {
    async fn handle(self, storefront: &Storefront<Client>) -> Result<()> {
        match self {
            ManageCommands::Create(args) => args.handle(storefront).await?,
            ManageCommands::Update(args) => args.handle(storefront).await?,
            ManageCommands::Delete(args) => args.handle(storefront).await?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> StorefrontArgs {
        let StorefrontCli(args) = storefront_cli().run_inner(args).unwrap();
        args
    }

    #[test]
    fn counts_verbose_flags() {
        let args = parse(&["-vv", "categories"]);
        assert!(matches!(args.verbosity, Verbosity::Verbose(2)));

        let args = parse(&["-q", "categories"]);
        assert!(matches!(args.verbosity, Verbosity::Quiet));
    }

    #[test]
    fn no_command_is_allowed() {
        let args = parse(&[]);
        assert!(matches!(args.verbosity, Verbosity::Verbose(0)));
        assert!(args.command.is_none());
    }

    #[test]
    fn parses_browse_filters() {
        let args = parse(&[
            "browse",
            "--search",
            "phone",
            "--category",
            "smartphones",
            "--page",
            "3",
            "--json",
        ]);
        let Some(Commands::Discover(DiscoverCommands::Browse(browse))) = args.command else {
            panic!("expected browse command");
        };
        assert_eq!(browse.search.as_deref(), Some("phone"));
        assert_eq!(browse.page.get(), 3);
        assert!(browse.json);
    }

    #[test]
    fn rejects_page_zero() {
        assert!(storefront_cli().run_inner(&["browse", "--page", "0"]).is_err());
    }

    #[test]
    fn parses_update_fields() {
        let args = parse(&["update", "7", "--price", "9.5", "--stock", "3"]);
        let Some(Commands::Manage(ManageCommands::Update(update))) = args.command else {
            panic!("expected update command");
        };
        assert_eq!(update.id.get(), 7);
        assert_eq!(update.fields.price, Some(9.5));
        assert_eq!(update.fields.stock, Some(3));
        assert_eq!(update.fields.title, None);
    }
}
