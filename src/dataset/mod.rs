pub mod digest;
pub mod loader;
pub mod writer;

pub use loader::{load_histories, load_rates, DatasetPaths, Description, RateTable};
pub use writer::{DatasetWriter, TextColumns};
