//! Subcommand implementations for the fx-history binary

pub mod download;
pub mod fetch;
pub mod inspect;
