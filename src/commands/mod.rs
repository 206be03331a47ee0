pub mod analyze;
pub mod fetch;
pub mod report;
pub mod serve;
pub mod status;
