// Report data model and the processing that produces it from raw findings.

pub mod build;
pub mod model;

pub use model::{FailedCheck, FetchedReport, Report, StatusBucket, StatusCounts, Summary};
