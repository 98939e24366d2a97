pub mod build;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod identity;
pub mod rank;
pub mod reports;
pub mod scan;
pub mod source;

pub use error::{Error, Result};
