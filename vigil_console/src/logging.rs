//! Tracing setup for the console binary

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// `VIGIL_LOG` always wins over the configured default filter. In
/// interactive mode the dashboards own the terminal, so unless `VIGIL_LOG`
/// is set explicitly, log output is discarded rather than written over the
/// alternate screen.
pub fn init(default_filter: &str, interactive: bool) {
    let explicit = std::env::var_os("VIGIL_LOG").is_some();
    let filter =
        EnvFilter::try_from_env("VIGIL_LOG").unwrap_or_else(|_| EnvFilter::new(default_filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    if interactive && !explicit {
        builder.with_writer(std::io::sink).init();
    } else {
        builder.with_writer(std::io::stderr).init();
    }
}
