//! Diagnostics go to stderr through `tracing`, so stdout only ever carries the
//! rendered table.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Level for a `-v` count: none is warn, then info, debug and trace.
pub fn level_for_verbosity(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// `RUST_LOG` wins over the verbosity flag when it is set and parses.
pub fn filter_for(verbosity: u8) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = level_for_verbosity(verbosity).to_string().to_lowercase();
        EnvFilter::new(format!("landlordtop={level}"))
    })
}

/// Installs the global subscriber. A second call is a no-op.
pub fn init(verbosity: u8, no_color: bool) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter_for(verbosity))
        .with_writer(std::io::stderr)
        .with_ansi(!no_color)
        .with_target(false)
        .compact()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(level_for_verbosity(0), Level::WARN);
        assert_eq!(level_for_verbosity(1), Level::INFO);
        assert_eq!(level_for_verbosity(2), Level::DEBUG);
        assert_eq!(level_for_verbosity(9), Level::TRACE);
    }

    #[test]
    fn init_twice_does_not_panic() {
        init(0, true);
        init(3, true);
    }
}
