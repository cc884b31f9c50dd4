//! Tracing setup for the command-line tools

use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

/// Log levels
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    pub fn is_verbose(&self) -> bool {
        matches!(self, LogLevel::Debug | LogLevel::Trace)
    }
}

/// Initialize tracing from the --log-level flag
///
/// `RUST_LOG` directives are added on top when set. Output goes to stderr so
/// stdout carries only results.
pub fn initialize_tracing(log_level: &LogLevel) {
    let mut filter = EnvFilter::new(log_level.to_filter_directive());

    if let Ok(extra) = std::env::var("RUST_LOG") {
        for directive in extra.split(',').filter(|d| !d.trim().is_empty()) {
            if let Ok(parsed) = directive.trim().parse() {
                filter = filter.add_directive(parsed);
            }
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
