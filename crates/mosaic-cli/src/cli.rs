//! CLI argument definitions for mosaic.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `search` | Fan queries out to every marketplace and balance the result |
//! | `single` | Run one query against one marketplace |
//! | `providers` | Show provider policies and credential status |
//!
//! # Examples
//!
//! ```bash
//! # Two furnishings queries and one handmade query, 200 products back
//! mosaic search --furnishings "oak desk" --furnishings "desk lamp" \
//!     --handmade "ceramic planter" --target 200 --pretty
//!
//! # Query plan from a file, handmade as the primary source
//! mosaic search --queries-file plan.json --primary handmade
//!
//! # One marketplace, no balancing
//! mosaic single home-goods "bath towel"
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use mosaic_core::{PrimarySelection, ProviderId};

/// Multi-marketplace product search.
#[derive(Debug, Parser)]
#[command(
    name = "mosaic",
    author,
    version,
    about = "Search several product marketplaces and merge the results"
)]
pub struct Cli {
    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Search every planned marketplace and return one balanced list.
    Search(SearchArgs),
    /// Search a single marketplace with one query.
    Single(SingleArgs),
    /// List providers with their policy and credential status.
    Providers,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Query for the furnishings marketplace (repeatable).
    #[arg(long = "furnishings", value_name = "QUERY")]
    pub furnishings: Vec<String>,

    /// Query for the handmade marketplace (repeatable).
    #[arg(long = "handmade", value_name = "QUERY")]
    pub handmade: Vec<String>,

    /// Query for the home goods marketplace (repeatable).
    #[arg(long = "home-goods", value_name = "QUERY")]
    pub home_goods: Vec<String>,

    /// JSON query plan, e.g. {"furnishings": ["sofa"], "handmade": []}.
    #[arg(long, value_name = "PATH")]
    pub queries_file: Option<PathBuf>,

    /// Maximum number of products returned.
    #[arg(long, default_value_t = mosaic_core::combiner::DEFAULT_TARGET_SIZE)]
    pub target: usize,

    /// Which provider gets the larger share.
    #[arg(long, value_enum, default_value_t = PrimaryChoice::Auto)]
    pub primary: PrimaryChoice,

    /// Seed for the final shuffle.
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Debug, Args)]
pub struct SingleArgs {
    #[arg(value_enum)]
    pub provider: ProviderChoice,

    pub query: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProviderChoice {
    Furnishings,
    Handmade,
    HomeGoods,
}

impl From<ProviderChoice> for ProviderId {
    fn from(choice: ProviderChoice) -> Self {
        match choice {
            ProviderChoice::Furnishings => Self::Furnishings,
            ProviderChoice::Handmade => Self::Handmade,
            ProviderChoice::HomeGoods => Self::HomeGoods,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PrimaryChoice {
    /// Largest pool after deduplication.
    Auto,
    Furnishings,
    Handmade,
    HomeGoods,
}

impl From<PrimaryChoice> for PrimarySelection {
    fn from(choice: PrimaryChoice) -> Self {
        match choice {
            PrimaryChoice::Auto => Self::LargestPool,
            PrimaryChoice::Furnishings => Self::Fixed(ProviderId::Furnishings),
            PrimaryChoice::Handmade => Self::Fixed(ProviderId::Handmade),
            PrimaryChoice::HomeGoods => Self::Fixed(ProviderId::HomeGoods),
        }
    }
}
