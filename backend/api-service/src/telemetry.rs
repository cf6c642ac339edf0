//! Tracing subscriber setup shared by the API server and the CLIs.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info,actix_web=info,sqlx=warn";
const VERBOSE_FILTER: &str = "debug,actix_web=debug,sqlx=info";

/// Filter used when `RUST_LOG` is unset.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        VERBOSE_FILTER
    } else {
        DEFAULT_FILTER
    }
}

/// Install the global subscriber. `LOG_FORMAT=json` switches to JSON lines.
pub fn init_tracing(verbose: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(verbose).into());
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_verbosity() {
        assert!(default_filter(false).starts_with("info"));
        assert!(default_filter(true).starts_with("debug"));
    }
}
