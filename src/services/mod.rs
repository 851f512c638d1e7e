//! Service layer: pipeline logic separated from transport concerns.
//!
//! Services are used by the CLI and the Slack event server alike.

pub mod analysis;

pub use analysis::{assemble, render, AnalysisError, AnalysisReport, AnalysisService, ReportFlags};
