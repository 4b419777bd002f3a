//! Logging utilities

pub use log::{debug, error, info, trace, warn, LevelFilter};

/// Initialize the logging system
///
/// `RUST_LOG` still wins over `level` when it is set.
pub fn init(level: LevelFilter) {
    builder(level).init();
}

/// Initialize the logging system, ignoring an already installed logger
pub fn try_init(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    builder(level).try_init()
}

fn builder(level: LevelFilter) -> env_logger::Builder {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_rejected() {
        let _ = try_init(LevelFilter::Debug);
        assert!(try_init(LevelFilter::Info).is_err());
    }
}
