use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

/// Crate-level filter. `verbose` enables debug output; with `RUST_LOG` set the
/// crate is left open so the env filter alone decides.
fn app_targets(verbose: bool, env_configured: bool) -> Targets {
    let level_filter = if verbose {
        LevelFilter::DEBUG
    } else if env_configured {
        LevelFilter::TRACE
    } else {
        LevelFilter::OFF
    };
    Targets::new().with_target("treasury", level_filter)
}

/// Installs the global subscriber. Silent unless `verbose` or `RUST_LOG` is set.
pub fn init_logging(verbose: bool) {
    let env_filter = EnvFilter::try_from_default_env().ok();
    let app_filter = app_targets(verbose, env_filter.is_some());
    let env_filter = env_filter.unwrap_or_else(|| {
        EnvFilter::new(if verbose { "debug" } else { "off" })
    });

    tracing_subscriber::registry()
        .with(fmt::layer().pretty().without_time().with_writer(std::io::stderr))
        .with(app_filter)
        .with(env_filter)
        .init();
}
