//! Command-line configuration

use std::path::PathBuf;

use clap::Args;

use basketry::{accounts::AccountScope, storage::DEFAULT_QUOTA_BYTES};

/// Log output format.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Args)]
pub(crate) struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true, env = "RUST_LOG", default_value = "warn")]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(
        long,
        global = true,
        env = "LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Compact
    )]
    pub log_format: LogFormat,
}

/// Cart store settings.
#[derive(Debug, Args)]
pub(crate) struct StoreConfig {
    /// Account key whose cart to use; omit for the anonymous cart
    #[arg(short, long, global = true, env = "BASKETRY_ACCOUNT")]
    pub account: Option<String>,

    /// Directory holding saved carts
    #[arg(
        long,
        global = true,
        env = "BASKETRY_STORAGE_DIR",
        default_value = ".basketry"
    )]
    pub storage_dir: PathBuf,

    /// Storage quota in bytes
    #[arg(
        long,
        global = true,
        env = "BASKETRY_QUOTA_BYTES",
        default_value_t = DEFAULT_QUOTA_BYTES
    )]
    pub quota_bytes: u64,

    /// Product catalog fixture
    #[arg(
        long,
        global = true,
        env = "BASKETRY_CATALOG",
        default_value = "fixtures/catalog.yml"
    )]
    pub catalog: PathBuf,
}

impl StoreConfig {
    /// Account scope selected on the command line.
    pub(crate) fn scope(&self) -> AccountScope {
        AccountScope::from_raw(self.account.as_deref())
    }
}
