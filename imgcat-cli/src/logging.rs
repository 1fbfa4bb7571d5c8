// ABOUTME: Logger setup for the imgcat binary
// ABOUTME: RUST_LOG wins; otherwise --verbose switches the default filter to debug

use env_logger::Env;

pub fn default_filter(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "warn" }
}

/// Logs go to stderr so they never mix with image frames on stdout.
pub fn init(verbose: bool) {
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter(verbose)))
        .target(env_logger::Target::Stderr)
        .format_timestamp(None)
        .init();
}
