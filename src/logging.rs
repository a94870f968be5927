//! Logging setup
//!
//! The crate logs through the `log` facade; binaries install `env_logger`
//! here. `RUST_LOG` always takes precedence over the default filter.

use log::LevelFilter;

/// Default filter directive for the given debug switch
pub fn default_filter(debug: bool) -> &'static str {
    if debug {
        "debug"
    } else {
        "info"
    }
}

fn builder(debug: bool) -> env_logger::Builder {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter(debug)));
    builder.format_timestamp_millis();
    builder
}

/// Installs the global logger; panics if one is already installed
pub fn init(debug: bool) {
    builder(debug).init();
}

/// Installs the global logger unless one already exists
pub fn try_init(debug: bool) -> bool {
    builder(debug).try_init().is_ok()
}

/// Level implied by the debug switch, ignoring `RUST_LOG`
pub fn level(debug: bool) -> LevelFilter {
    if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        assert_eq!(default_filter(true), "debug");
        assert_eq!(default_filter(false), "info");
        assert_eq!(level(true), LevelFilter::Debug);
    }

    #[test]
    fn test_try_init_is_repeatable() {
        try_init(false);
        assert!(!try_init(false));
    }
}
