//! Command-line argument definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;

/// Sales order endpoints and address change detection over a local record store.
#[derive(Parser, Debug)]
#[command(name = "recordwatch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// SQLite record store; overrides the configured path
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print core linkage and version
    Ping,

    /// Save a JSON record into the store
    Import {
        /// Record JSON file
        file: PathBuf,
    },

    /// List open sales orders, or one order's item lines
    Fetch {
        /// Sales order internal id
        #[arg(long)]
        id: Option<String>,
    },

    /// Create an item fulfillment from a sales order
    Fulfill {
        /// Sales order internal id
        #[arg(long)]
        sales_order_id: String,

        /// Quantity override as ITEM=QTY (repeatable)
        #[arg(long = "item", value_name = "ITEM=QTY")]
        items: Vec<ItemQuantity>,
    },

    /// Compare a sublist between two record JSON files
    Detect {
        /// Current record JSON file
        #[arg(long)]
        current: PathBuf,

        /// Previous record JSON file; omit for a newly created record
        #[arg(long)]
        previous: Option<PathBuf>,

        /// Sublist to compare; defaults to the configured address sublist
        #[arg(long)]
        sublist: Option<String>,
    },
}

/// `ITEM=QTY` pair from the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemQuantity {
    pub item_id: String,
    pub quantity: f64,
}

impl FromStr for ItemQuantity {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (item_id, quantity) = value
            .split_once('=')
            .ok_or_else(|| format!("expected ITEM=QTY, got `{value}`"))?;
        let item_id = item_id.trim();
        if item_id.is_empty() {
            return Err(format!("missing item id in `{value}`"));
        }
        let quantity = quantity
            .trim()
            .parse::<f64>()
            .map_err(|err| format!("invalid quantity in `{value}`: {err}"))?;
        if !quantity.is_finite() {
            return Err(format!("quantity must be finite in `{value}`"));
        }
        Ok(Self {
            item_id: item_id.to_string(),
            quantity,
        })
    }
}
