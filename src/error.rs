use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("I/O error")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Config parsing error: {0}")]
    Config(#[from] toml::de::Error),
    #[error("Report rendering error: {0}")]
    Report(#[from] tinytemplate::error::Error),
    #[error("Missing dataset file: {0:?}")]
    MissingFile(PathBuf),
    #[error("Invalid dataset size: {0} (expected one of small, 2m, 5m)")]
    InvalidSize(String),
    #[error("Invalid UTC offset: {0} hours")]
    InvalidOffset(i32),
    #[error("Inconsistent state: {0}")]
    Inconsistent(String),
}

pub type Result<T> = std::result::Result<T, Error>;
