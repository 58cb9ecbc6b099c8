//! Log output setup for the binary.

use clap::ValueEnum;
use tracing::level_filters::LevelFilter;

/// Verbosity selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogLevel {
    #[default]
    Info,
    Debug,
    /// Install no subscriber at all.
    None,
}

impl LogLevel {
    pub fn filter(self) -> LevelFilter {
        match self {
            Self::Info => LevelFilter::INFO,
            Self::Debug => LevelFilter::DEBUG,
            Self::None => LevelFilter::OFF,
        }
    }
}

/// Install the global `fmt` subscriber for `level`.
pub fn init(level: LogLevel) {
    if level == LogLevel::None {
        return;
    }
    tracing_subscriber::fmt()
        .with_max_level(level.filter())
        .with_target(false)
        .init();
}
