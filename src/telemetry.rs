//! Tracing subscriber setup for binaries and tests.

use std::env;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "info,diesel=warn";

/// Installs a global `tracing` subscriber filtered by `RUST_LOG`.
///
/// Does nothing when a global subscriber is already set, so repeated calls
/// from tests are harmless.
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }

    let directives = env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_FILTER.to_owned());
    let filter = EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
    if installed.is_err() {
        tracing::debug!("tracing subscriber was installed concurrently");
    }
}
