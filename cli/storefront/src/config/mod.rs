use std::collections::{BTreeMap, HashMap};
use std::env;
use std::num::{NonZeroU32, NonZeroU64};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config as HierarchicalConfig, Environment};
use serde::{Deserialize, Serialize};
use storefront_sdk::models::catalog_query::{
    DEFAULT_FEATURED_LIMIT,
    DEFAULT_PAGE_SIZE,
    DEFAULT_REQUEST_TIMEOUT,
    QuerySettings,
};
use tracing::debug;

/// Name of storefront managed directories
pub const STOREFRONT_DIR_NAME: &str = "storefront";
pub const STOREFRONT_CONFIG_DIR_VAR: &str = "STOREFRONT_CONFIG_DIR";
pub const STOREFRONT_CONFIG_FILE: &str = "storefront.toml";
const STOREFRONT_ENV_PREFIX: &str = "STOREFRONT_";

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// The URL of the catalog service to use
    // Using a URL here adds an extra trailing slash,
    // so just use a String.
    pub catalog_url: Option<String>,

    /// How many products a listing page shows
    pub page_size: NonZeroU32,

    /// Seconds to wait for a catalog response before giving up
    pub request_timeout_secs: NonZeroU64,

    /// How many products `storefront featured` shows
    pub featured_limit: NonZeroU32,

    /// Override the user agent sent to the catalog
    pub user_agent: Option<String>,

    /// Headers added to every catalog request
    pub extra_headers: BTreeMap<String, String>,
}

const DEFAULT_REQUEST_TIMEOUT_SECS: NonZeroU64 =
    NonZeroU64::new(DEFAULT_REQUEST_TIMEOUT.as_secs()).unwrap();

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_url: None,
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            featured_limit: DEFAULT_FEATURED_LIMIT,
            user_agent: None,
            extra_headers: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Creates a [Config] from the config files and the environment
    pub fn parse() -> Result<Config> {
        let system_config = PathBuf::from("/etc")
            .join(STOREFRONT_DIR_NAME)
            .join(STOREFRONT_CONFIG_FILE);
        let user_config = user_config_dir().map(|dir| dir.join(STOREFRONT_CONFIG_FILE));
        Self::read_from(&system_config, user_config.as_deref(), env::vars())
    }

    /// Merge the given sources, later sources override earlier ones
    fn read_from(
        system_config: &Path,
        user_config: Option<&Path>,
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Config> {
        let mut builder = HierarchicalConfig::builder().add_source(
            config::File::from(system_config)
                .format(config::FileFormat::Toml)
                .required(false),
        );

        if let Some(user_config) = user_config {
            debug!(path = %user_config.display(), "reading user config");
            builder = builder.add_source(
                config::File::from(user_config)
                    .format(config::FileFormat::Toml)
                    .required(false),
            );
        }

        // override via env variables
        let storefront_envs = vars
            .into_iter()
            .filter_map(|(k, v)| {
                k.strip_prefix(STOREFRONT_ENV_PREFIX)
                    .map(|k| (k.to_owned(), v))
            })
            .collect::<HashMap<_, _>>();
        builder = builder.add_source(
            Environment::default()
                .source(Some(storefront_envs))
                .try_parsing(true),
        );

        builder
            .build()?
            .try_deserialize()
            .context("Could not parse config")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.get())
    }

    pub fn query_settings(&self) -> QuerySettings {
        QuerySettings {
            page_size: self.page_size,
            request_timeout: self.request_timeout(),
        }
    }
}

/// `$STOREFRONT_CONFIG_DIR` if set, the platform config dir otherwise
fn user_config_dir() -> Option<PathBuf> {
    match env::var(STOREFRONT_CONFIG_DIR_VAR) {
        Ok(dir) => {
            debug!("`${STOREFRONT_CONFIG_DIR_VAR}` set: {dir}");
            Some(PathBuf::from(dir))
        },
        Err(_) => dirs::config_dir().map(|dir| dir.join(STOREFRONT_DIR_NAME)),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;

    fn vars(vars: &[(&str, &str)]) -> Vec<(String, String)> {
        vars.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_without_sources() {
        let tempdir = tempfile::tempdir().unwrap();
        let config = Config::read_from(
            &tempdir.path().join("missing.toml"),
            None,
            Vec::new(),
        )
        .unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.query_settings(), QuerySettings::default());
    }

    #[test]
    fn user_file_overrides_system_file() {
        let tempdir = tempfile::tempdir().unwrap();
        let system = tempdir.path().join("system.toml");
        let user = tempdir.path().join("user.toml");
        fs::write(&system, indoc! {r#"
            catalog_url = "https://system.example.com"
            page_size = 20
        "#})
        .unwrap();
        fs::write(&user, indoc! {r#"
            page_size = 24

            [extra_headers]
            x-tenant = "shop"
        "#})
        .unwrap();

        let config = Config::read_from(&system, Some(&user), Vec::new()).unwrap();
        assert_eq!(
            config.catalog_url.as_deref(),
            Some("https://system.example.com")
        );
        assert_eq!(config.page_size.get(), 24);
        assert_eq!(
            config.extra_headers,
            BTreeMap::from([("x-tenant".to_string(), "shop".to_string())])
        );
    }

    #[test]
    fn env_overrides_files() {
        let tempdir = tempfile::tempdir().unwrap();
        let user = tempdir.path().join("user.toml");
        fs::write(&user, "request_timeout_secs = 30\nfeatured_limit = 5\n").unwrap();

        let config = Config::read_from(
            &tempdir.path().join("missing.toml"),
            Some(&user),
            vars(&[
                ("STOREFRONT_REQUEST_TIMEOUT_SECS", "3"),
                ("STOREFRONT_CATALOG_URL", "http://localhost:8080"),
                ("UNRELATED_PAGE_SIZE", "99"),
            ]),
        )
        .unwrap();

        assert_eq!(config.request_timeout(), Duration::from_secs(3));
        assert_eq!(config.featured_limit.get(), 5);
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.catalog_url.as_deref(), Some("http://localhost:8080"));
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let tempdir = tempfile::tempdir().unwrap();
        let result = Config::read_from(
            &tempdir.path().join("missing.toml"),
            None,
            vars(&[("STOREFRONT_PAGE_SIZE", "0")]),
        );
        assert!(result.is_err());
    }

    #[test]
    fn zero_request_timeout_is_rejected() {
        let tempdir = tempfile::tempdir().unwrap();
        let user = tempdir.path().join("user.toml");
        fs::write(&user, "request_timeout_secs = 0\n").unwrap();

        let result = Config::read_from(&tempdir.path().join("missing.toml"), Some(&user), vars(&[]));
        assert!(result.is_err());
    }

    #[test]
    fn parse_reads_config_dir_from_env() {
        let tempdir = tempfile::tempdir().unwrap();
        fs::write(
            tempdir.path().join(STOREFRONT_CONFIG_FILE),
            "user_agent = \"storefront-test\"\n",
        )
        .unwrap();

        temp_env::with_vars(
            [
                (
                    STOREFRONT_CONFIG_DIR_VAR,
                    Some(tempdir.path().as_os_str().to_string_lossy().as_ref()),
                ),
                ("STOREFRONT_PAGE_SIZE", Some("6")),
            ],
            || {
                let config = Config::parse().unwrap();
                assert_eq!(config.user_agent.as_deref(), Some("storefront-test"));
                assert_eq!(config.page_size.get(), 6);
            },
        );
    }
}
