pub mod advisor;
pub mod analysis;
pub mod config;
pub mod report;

// Re-export commonly used types
pub use advisor::{ErrorAdvisor, ErrorContext, ErrorRule, Lookup, Severity};
pub use analysis::{BuildLogAnalyzer, LogAnalysis};
pub use config::Config;
pub use report::SummaryReport;
