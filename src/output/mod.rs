//! Output module for run statistics and cluster reports
//!
//! This module handles:
//! - Tracking extraction outcomes and reporting their summary
//! - Picking representative keywords for a group of texts
//! - Writing one cluster report per clustering strategy

pub mod keywords;
mod report;
pub mod stats;
mod traits;

pub use keywords::{extract_keywords, keyword_line};
pub use report::{format_cluster_report, generate_cluster_report, group_by_label};
pub use stats::{
    format_statistics, log_statistics, print_statistics, write_statistics_json, OutcomeSummary,
    OutcomeTracker, STATS_TARGET,
};
pub use traits::{OutputError, OutputResult, ReportGroup, ReportItem};
