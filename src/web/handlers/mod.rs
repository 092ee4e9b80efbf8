pub mod processed;
pub mod runtime;
pub mod scan;
