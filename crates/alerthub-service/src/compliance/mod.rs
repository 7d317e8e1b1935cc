//! Compliance reporting over historical notifications.

pub mod report;
pub mod reporter;

pub use report::ComplianceReport;
pub use reporter::ComplianceReporter;
