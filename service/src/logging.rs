use crate::config::Config;
use log::{LevelFilter, SetLoggerError};
use simplelog::{ConfigBuilder, TermLogger};

/// HTTP and TLS plumbing under the BankID client and the axum server. Silenced below Trace.
const FILTERED_MODULES: &[&str] = &[
    "hyper", "h2", "reqwest", "rustls", "tower", "tracing", "axum",
];

pub struct Logger {}

impl Logger {
    /// Installs the terminal logger at the configured level.
    ///
    /// Fails when another global logger is already installed; the caller decides whether
    /// that is fatal.
    pub fn init_logger(config: &Config) -> Result<(), SetLoggerError> {
        TermLogger::init(
            config.log_level_filter,
            Self::log_config(config.log_level_filter),
            simplelog::TerminalMode::Mixed,
            simplelog::ColorChoice::Auto,
        )
    }

    fn log_config(level: LevelFilter) -> simplelog::Config {
        let mut builder = ConfigBuilder::new();
        builder.set_time_format_rfc3339();

        if level != LevelFilter::Trace {
            for module in FILTERED_MODULES {
                builder.add_filter_ignore_str(module);
            }
        }

        builder.build()
    }
}
