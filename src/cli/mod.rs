use std::io::{self, Write};

use clap::{Parser, Subcommand};
use thiserror::Error;
use tracing::{debug, info, warn};

use basketry::{
    cart::CartChange,
    fixtures::{Catalog, FixtureError},
    items::{parse_quantity, parse_update_quantity},
    observer::{CartObserver, StorageNotice},
    storage::{FileStorage, StorageError},
    store::CartStore,
    summary::{self, SummaryError},
};

mod config;
mod logging;

use config::{LoggingConfig, StoreConfig};

/// Errors surfaced by the command-line driver.
#[derive(Debug, Error)]
pub(crate) enum CliError {
    /// Catalog could not be loaded or lacks the product.
    #[error(transparent)]
    Fixture(#[from] FixtureError),

    /// Storage directory could not be opened.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Cart could not be rendered.
    #[error(transparent)]
    Summary(#[from] SummaryError),

    /// Order payload could not be encoded.
    #[error("failed to encode order: {0}")]
    Encode(#[from] serde_json::Error),

    /// Output could not be written.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),

    /// Logging could not be initialised.
    #[error("failed to initialise logging: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),
}

#[derive(Debug, Parser)]
#[command(name = "basketry", about = "Shopping cart engine", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    store: StoreConfig,

    #[command(flatten)]
    logging: LoggingConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Add a catalog product to the cart
    Add {
        /// Product id from the catalog
        product: String,

        /// Units to add; anything that is not a positive number counts as one
        #[arg(short, long, default_value = "1", allow_hyphen_values = true)]
        quantity: String,
    },

    /// Set a product's quantity; zero or less removes it
    Set {
        /// Product id
        product: String,

        /// New quantity; input that is not a whole number is ignored
        #[arg(allow_hyphen_values = true)]
        quantity: String,
    },

    /// Take one unit of a product off the cart
    Decrement {
        /// Product id
        product: String,
    },

    /// Empty the cart
    Clear,

    /// Show the cart
    Show,

    /// Print the order payload and clear the cart
    Order,
}

impl Cli {
    /// Load configuration from `.env`, the environment and arguments.
    pub(crate) fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    pub(crate) fn run(self) -> Result<(), CliError> {
        logging::init(&self.logging)?;

        let storage = FileStorage::with_quota(&self.store.storage_dir, self.store.quota_bytes)?;
        let mut store = CartStore::with_observer(storage, self.store.scope(), NoticeLogger);

        info!(
            account = %store.scope(),
            storage_dir = %self.store.storage_dir.display(),
            "cart loaded"
        );

        let mut out = io::stdout().lock();

        match self.command {
            Commands::Add { product, quantity } => {
                let catalog = Catalog::from_path(&self.store.catalog)?;
                let product = catalog.get(&product)?;

                report(
                    &mut out,
                    store.add_item_with_quantity(product, i64::from(parse_quantity(&quantity))),
                )?;
            }
            Commands::Set { product, quantity } => {
                let change = match parse_update_quantity(&quantity) {
                    Some(quantity) => store.update_item_quantity(&product, quantity),
                    None => {
                        debug!(%quantity, "ignoring non-numeric quantity");
                        CartChange::Unchanged
                    }
                };

                report(&mut out, change)?;
            }
            Commands::Decrement { product } => {
                report(&mut out, store.remove_item_cart(&product))?;
            }
            Commands::Clear => {
                report(&mut out, store.clear_cart())?;
            }
            Commands::Show => {}
            Commands::Order => {
                let request = store.order_request();

                if request.is_empty() {
                    writeln!(out, "Cart is empty, nothing to order.")?;

                    return Ok(());
                }

                serde_json::to_writer_pretty(&mut out, &request)?;
                writeln!(out)?;

                store.complete_order();

                return Ok(());
            }
        }

        summary::write_to(&mut out, &store.view())?;

        Ok(())
    }
}

fn report(out: &mut impl Write, change: CartChange) -> Result<(), io::Error> {
    let message = match change {
        CartChange::Added => "Added to cart.",
        CartChange::Updated => "Cart updated.",
        CartChange::Removed => "Removed from cart.",
        CartChange::Cleared => "Cart cleared.",
        CartChange::Unchanged => "Nothing to change.",
    };

    writeln!(out, "{message}")
}

/// Logs storage notices as they happen.
#[derive(Debug)]
struct NoticeLogger;

impl CartObserver for NoticeLogger {
    fn on_storage_notice(&mut self, notice: &StorageNotice) {
        warn!("{notice}");
    }
}
