//! CLI argument definitions for itemcard
//!
//! This module contains all clap-derived structs and enums for CLI parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "itemcard")]
#[command(about = "ARPG item card parser and crafting tool", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse card text and display the resolved item
    #[command(visible_alias = "p")]
    Parse {
        /// Path to a card text file, or `-` for stdin
        input: PathBuf,

        /// Emit the full item record as JSON
        #[arg(short, long)]
        json: bool,

        /// Skip per-slot stat derivation
        #[arg(long)]
        no_derive: bool,
    },

    /// Parse card text and re-serialize it, verifying stability
    #[command(visible_alias = "r")]
    Roundtrip {
        /// Path to a card text file, or `-` for stdin
        input: PathBuf,
    },

    /// Rebuild explicit modifiers from the item's crafting selections
    #[command(visible_alias = "c")]
    Craft {
        /// Path to a card text file, or `-` for stdin
        input: PathBuf,

        /// Emit the crafted item as JSON instead of card text
        #[arg(short, long)]
        json: bool,
    },

    /// Show catalyst quality scaling
    Catalyst {
        /// Catalyst id (1-9); omit to list all catalysts
        id: Option<u8>,

        /// Comma-separated modifier tags to test against
        #[arg(short, long, value_delimiter = ',')]
        tags: Vec<String>,

        /// Catalyst quality (default 20)
        #[arg(short, long)]
        quality: Option<i32>,
    },
}
