pub mod metrics;
pub mod report;

pub use metrics::{compute_loan_metrics, compute_metrics, LoanInput, LoanMetricsOutput};
pub use report::{LoanReport, LoanResult, ReportSection};
