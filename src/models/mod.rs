pub mod result;
pub mod status;

pub use result::{Classification, NOT_AVAILABLE, RunSummary, TestResultRecord, duration_secs};
pub use status::TestStatus;
