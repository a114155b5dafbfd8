//! FX history datasets
//!
//! Downloads daily foreign-exchange price history from a market-data provider
//! and writes training/validation splits as flat CSV files.

pub mod config;
pub mod data;
pub mod error;
pub mod pipeline;
pub mod provider;
pub mod types;
pub mod yahoo;

pub use config::Config;
pub use error::{DataError, PipelineError};
pub use provider::DataProvider;
pub use types::*;
