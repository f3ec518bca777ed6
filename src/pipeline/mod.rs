pub mod processor;

pub use processor::{BulkRow, ImportOutcome, LabReportProcessor};
