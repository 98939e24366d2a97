pub mod dedup;
pub mod registry;

pub use dedup::{submission_key, Decision, DuplicateIndex, SubmissionKey};
pub use registry::UserRegistry;
