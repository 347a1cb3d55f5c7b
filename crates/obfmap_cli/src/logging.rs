use tracing_subscriber::EnvFilter;

/// Level directive selected by the `--debug` / `--trace` switches.
pub fn default_directive(debug: bool, trace: bool) -> &'static str {
    if trace {
        "trace"
    } else if debug {
        "debug"
    } else {
        "info"
    }
}

/// Installs the global subscriber. `RUST_LOG` takes precedence over the
/// switches.
pub fn init(debug: bool, trace: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(debug, trace)));

    // a second initialisation (tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
