mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Parse {
            input,
            json,
            no_derive,
        } => {
            commands::card::parse(&input, json, no_derive)?;
        }

        Commands::Roundtrip { input } => {
            commands::card::roundtrip(&input)?;
        }

        Commands::Craft { input, json } => {
            commands::card::run_craft(&input, json)?;
        }

        Commands::Catalyst { id, tags, quality } => {
            commands::catalyst::handle(id, &tags, quality)?;
        }
    }

    Ok(())
}
