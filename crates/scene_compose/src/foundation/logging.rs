//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

use log::LevelFilter;

/// Initialize the logging system from `RUST_LOG`
pub fn init() {
    env_logger::init();
}

/// Initialize logging with a default level such as `"info"` or `"debug"`.
///
/// `RUST_LOG`, when set, takes precedence over `level`. An unrecognised
/// level falls back to `info`. Returns `false` if a logger was already
/// installed.
pub fn init_with_level(level: &str) -> bool {
    let mut builder = env_logger::Builder::from_default_env();

    if std::env::var_os("RUST_LOG").is_none() {
        builder.filter_level(parse_level(level));
    }

    builder.try_init().is_ok()
}

/// Parse a textual log level, defaulting to `Info`
pub fn parse_level(level: &str) -> LevelFilter {
    level.trim().parse().unwrap_or(LevelFilter::Info)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("debug"), LevelFilter::Debug);
        assert_eq!(parse_level(" WARN "), LevelFilter::Warn);
        assert_eq!(parse_level("loud"), LevelFilter::Info);
    }
}
