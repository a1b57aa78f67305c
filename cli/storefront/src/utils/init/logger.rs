use std::sync::OnceLock;

use tracing::error;
use tracing_subscriber::prelude::*;
use tracing_subscriber::reload::Handle;
use tracing_subscriber::{EnvFilter, Registry};

use crate::commands::Verbosity;

static LOGGER_HANDLE: OnceLock<Handle<EnvFilter, Registry>> = OnceLock::new();

/// Default filter directives for a verbosity level
pub(crate) fn log_filter(verbosity: Verbosity) -> &'static str {
    match verbosity {
        // Show only errors
        Verbosity::Quiet => "off,storefront=error",
        // Only show warnings
        Verbosity::Verbose(0) => "off,storefront=warn,storefront_sdk=warn",
        // Show our own info logs
        Verbosity::Verbose(1) => "off,storefront=info,storefront_sdk=info",
        // Also show debug from our libraries
        Verbosity::Verbose(2) => {
            "off,storefront=debug,storefront_sdk=debug,storefront_catalog=debug"
        },
        Verbosity::Verbose(3) => {
            "off,storefront=trace,storefront_sdk=trace,storefront_catalog=trace"
        },
        // Also show debug from the HTTP stack
        Verbosity::Verbose(4) => {
            "debug,storefront=trace,storefront_sdk=trace,storefront_catalog=trace"
        },
        Verbosity::Verbose(_) => "trace",
    }
}

/// Install the global subscriber on first use, update its filter afterwards.
///
/// `RUST_LOG` takes precedence over the verbosity.
pub(crate) fn init_logger(verbosity: Option<Verbosity>) {
    let log_filter = log_filter(verbosity.unwrap_or_default());

    let filter_handle = LOGGER_HANDLE.get_or_init(|| {
        let (subscriber, reload_handle) = create_registry_and_filter_reload_handle();
        subscriber.init();
        reload_handle
    });

    update_filters(filter_handle, log_filter);
}

fn update_filters(filter_handle: &Handle<EnvFilter, Registry>, log_filter: &str) {
    let result = filter_handle.modify(|layer| {
        match EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_filter)) {
            Ok(new_filter) => *layer = new_filter,
            Err(err) => {
                error!("Updating logger filter failed: {}", err);
            },
        };
    });
    if let Err(err) = result {
        error!("Updating logger filter failed: {}", err);
    }
}

fn create_registry_and_filter_reload_handle() -> (
    impl tracing::Subscriber + Send + Sync + 'static,
    Handle<EnvFilter, Registry>,
) {
    // Start permissive, the real filter is set right after installation.
    let filter = EnvFilter::new("trace");
    let (filter, filter_reload_handle) = tracing_subscriber::reload::Layer::new(filter);
    let log_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(filter);
    let registry = tracing_subscriber::registry().with(log_layer);

    (registry, filter_reload_handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_filters_are_valid() {
        let levels = [
            Verbosity::Quiet,
            Verbosity::Verbose(0),
            Verbosity::Verbose(1),
            Verbosity::Verbose(2),
            Verbosity::Verbose(3),
            Verbosity::Verbose(4),
            Verbosity::Verbose(9),
        ];
        for verbosity in levels {
            let filter = log_filter(verbosity);
            assert!(
                EnvFilter::try_new(filter).is_ok(),
                "invalid filter for {verbosity:?}: {filter}"
            );
        }
    }

    #[test]
    fn default_verbosity_shows_warnings() {
        assert_eq!(
            log_filter(Verbosity::default()),
            "off,storefront=warn,storefront_sdk=warn"
        );
        assert_eq!(log_filter(Verbosity::Quiet), "off,storefront=error");
    }
}
