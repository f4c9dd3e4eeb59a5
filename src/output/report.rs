//! Cluster report generation
//!
//! This module writes the plain-text report for one clustering strategy:
//! one section per cluster label, each listing its links with a short
//! preview of their text.

use crate::analysis::ClusterLabel;
use crate::output::keywords::{keyword_line, DEFAULT_TOP_N};
use crate::output::traits::{OutputError, OutputResult, ReportGroup, ReportItem};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Characters of text shown under each link
pub const PREVIEW_CHARS: usize = 200;

/// Generates a cluster report and writes it to `output_path`
///
/// The file is replaced if it already exists.
///
/// # Arguments
///
/// * `links` - Input links, in input order
/// * `texts` - Text used for each link, same order
/// * `labels` - Cluster label of each link, same order
/// * `output_path` - Path where the report should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the report
/// * `Err(OutputError)` - The inputs disagree in length, or the write failed
pub fn generate_cluster_report(
    links: &[String],
    texts: &[String],
    labels: &[ClusterLabel],
    output_path: &Path,
) -> OutputResult<()> {
    let groups = group_by_label(links, texts, labels)?;
    let report = format_cluster_report(&groups);

    let mut file = File::create(output_path)?;
    file.write_all(report.as_bytes())?;

    tracing::info!(
        "Wrote cluster report with {} groups to {}",
        groups.len(),
        output_path.display()
    );
    Ok(())
}

/// Groups items by label, ascending, keeping input order within a group
pub fn group_by_label<'a>(
    links: &'a [String],
    texts: &'a [String],
    labels: &[ClusterLabel],
) -> OutputResult<Vec<ReportGroup<'a>>> {
    if links.len() != texts.len() || links.len() != labels.len() {
        return Err(OutputError::Mismatch {
            links: links.len(),
            texts: texts.len(),
            labels: labels.len(),
        });
    }

    let mut grouped: BTreeMap<ClusterLabel, Vec<ReportItem<'a>>> = BTreeMap::new();
    for ((link, text), label) in links.iter().zip(texts).zip(labels) {
        grouped.entry(*label).or_default().push(ReportItem {
            link: link.as_str(),
            text: text.as_str(),
        });
    }

    Ok(grouped
        .into_iter()
        .map(|(label, items)| {
            let combined = items
                .iter()
                .map(|item| item.text)
                .collect::<Vec<_>>()
                .join(" ");
            ReportGroup {
                label,
                keywords: keyword_line(&combined, DEFAULT_TOP_N),
                items,
            }
        })
        .collect())
}

/// Formats grouped items as report text
pub fn format_cluster_report(groups: &[ReportGroup<'_>]) -> String {
    let mut out = String::new();
    for group in groups {
        out.push_str(&format!(
            "Cluster {} ({} items) - Keywords: {}\n",
            group.label,
            group.len(),
            group.keywords
        ));
        for item in &group.items {
            out.push_str(&format!("  - {}\n", item.link));
            out.push_str(&format!("    {}...\n", preview(item.text)));
        }
        out.push('\n');
    }
    out
}

/// First characters of a text on a single line
fn preview(text: &str) -> String {
    text.chars()
        .take(PREVIEW_CHARS)
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect()
}
