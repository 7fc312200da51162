// Logging setup
//
// RUST_LOG wins when set; otherwise `info`, or `debug` with --debug /
// `debug_logging = true`.

use tracing_subscriber::EnvFilter;

/// Filter used when RUST_LOG is not set
pub fn default_filter(debug: bool) -> &'static str {
    if debug {
        "cvu=debug,info"
    } else {
        "info"
    }
}

/// Install the global fmt subscriber (logs go to stderr)
pub fn init_tracing(debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(debug)));

    // A second init (e.g. in tests) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(debug)
        .try_init();
}
