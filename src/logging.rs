//! Logger setup.
//!
//! Diagnostics go to stderr through `env_logger`; stdout is reserved for the
//! report so it can be piped. `RUST_LOG` still wins over the CLI flags.

use log::LevelFilter;

/// Level used when `RUST_LOG` is unset.
pub fn default_level(verbose: bool, quiet: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else if quiet {
        LevelFilter::Warn
    } else {
        LevelFilter::Info
    }
}

/// Install the global logger. Calling it twice is harmless.
pub fn init(verbose: bool, quiet: bool) {
    let default = default_level(verbose, quiet).to_string().to_lowercase();
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_pick_level() {
        assert_eq!(default_level(false, false), LevelFilter::Info);
        assert_eq!(default_level(true, false), LevelFilter::Debug);
        assert_eq!(default_level(false, true), LevelFilter::Warn);
    }
}
