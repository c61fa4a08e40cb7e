//! Logging setup for the command-line tools using `tracing_subscriber`.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Install a stderr fmt subscriber. `RUST_LOG` overrides `directives`.
pub fn setup_logging(directives: &str) {
    let main_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives)))
        .with(main_layer)
        .try_init();
}

/// Default directive for a tool given its `--verbose` count.
pub fn directives_for(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "crlfilter=debug",
        _ => "crlfilter=trace",
    }
}
