//! Command handlers for the itemcard CLI
//!
//! Each subcommand has its own module with handler functions.

pub mod card;
pub mod catalyst;
