use crate::advisor::{ErrorAdvisor, Severity};
use crate::analysis::LogAnalysis;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

const BANNER: &str = "CENTRAL PACKAGE MANAGEMENT MIGRATION - BUILD LOG ANALYSIS";

#[derive(Debug, Clone, Serialize)]
pub struct CodeSummary {
    pub code: String,
    pub description: String,
    pub severity: Severity,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    pub generated_at: DateTime<Utc>,
    pub files_analyzed: usize,
    pub total_errors: usize,
    /// Detected codes in remediation priority order.
    pub codes: Vec<CodeSummary>,
    /// Package name and the number of files it failed in, most frequent first.
    pub packages: Vec<(String, usize)>,
    pub unrecognized: Vec<String>,
    pub recommendations: Vec<String>,
    pub actions: Vec<String>,
}

impl SummaryReport {
    pub fn from_results(advisor: &ErrorAdvisor, results: &[LogAnalysis]) -> Self {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut packages: BTreeMap<String, usize> = BTreeMap::new();
        let mut unrecognized = BTreeSet::new();

        for result in results {
            for (code, count) in &result.counts {
                *counts.entry(code.clone()).or_insert(0) += count;
            }
            for package in &result.packages_affected {
                *packages.entry(package.clone()).or_insert(0) += 1;
            }
            unrecognized.extend(result.unrecognized.iter().cloned());
        }

        let ordered = advisor.prioritize(counts.keys());
        let codes: Vec<CodeSummary> = ordered
            .iter()
            .filter_map(|code| {
                let rule = advisor.lookup(code).rule()?;
                Some(CodeSummary {
                    code: rule.code.clone(),
                    description: rule.description.clone(),
                    severity: rule.severity,
                    count: counts.get(code).copied().unwrap_or(0),
                })
            })
            .collect();

        let recommendations = codes
            .iter()
            .filter_map(|summary| {
                let rule = advisor.lookup(&summary.code).rule()?;
                let noun = match rule.severity {
                    Severity::Warning => "warnings",
                    _ => "errors",
                };
                Some(format!("{} {}: {}", rule.code, noun, rule.remediation.first()?))
            })
            .collect();

        let mut packages: Vec<(String, usize)> = packages.into_iter().collect();
        packages.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        Self {
            generated_at: Utc::now(),
            files_analyzed: results.len(),
            total_errors: results.iter().map(|r| r.total_errors).sum(),
            actions: contextual_actions(advisor, results, &ordered),
            codes,
            packages,
            unrecognized: unrecognized.into_iter().collect(),
            recommendations,
        }
    }

    pub fn has_blocking(&self) -> bool {
        self.codes
            .iter()
            .any(|c| c.severity == Severity::Blocking && c.count > 0)
    }

    pub fn render(&self, top_packages: usize, color: bool) -> String {
        let heading = |text: &str| -> String {
            if color {
                text.bold().to_string()
            } else {
                text.to_string()
            }
        };

        let mut report = Vec::new();
        report.push("=".repeat(60));
        report.push(heading(BANNER));
        report.push("=".repeat(60));
        report.push(format!("Generated: {}", self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")));
        report.push(format!("Total files analyzed: {}", self.files_analyzed));
        report.push(format!("Total errors found: {}", self.total_errors));
        report.push(String::new());

        report.push(heading("ERROR SUMMARY BY PRIORITY:"));
        report.push("-".repeat(30));

        for severity in Severity::all() {
            let mut tier: Vec<&CodeSummary> =
                self.codes.iter().filter(|c| c.severity == severity).collect();
            if tier.is_empty() {
                continue;
            }
            // stable sort keeps priority order among equal counts
            tier.sort_by(|a, b| b.count.cmp(&a.count));

            report.push(String::new());
            let title = format!("{}:", severity.heading());
            report.push(if color {
                match severity {
                    Severity::Blocking => title.red().bold().to_string(),
                    Severity::Build => title.yellow().bold().to_string(),
                    Severity::Warning => title.cyan().to_string(),
                }
            } else {
                title
            });
            for summary in tier {
                report.push(format!(
                    "  {}: {:3} - {}",
                    summary.code, summary.count, summary.description
                ));
            }
        }

        if !self.packages.is_empty() {
            report.push(String::new());
            report.push(heading("MOST PROBLEMATIC PACKAGES:"));
            report.push("-".repeat(30));
            for (package, count) in self.packages.iter().take(top_packages) {
                report.push(format!("  {}: {} issues", package, count));
            }
        }

        if !self.unrecognized.is_empty() {
            report.push(String::new());
            report.push(heading("UNRECOGNIZED CODES:"));
            report.push("-".repeat(30));
            for code in &self.unrecognized {
                report.push(format!("  {}", code));
            }
            report.push("  New error types need review before the next migration batch.".to_string());
        }

        if !self.recommendations.is_empty() {
            report.push(String::new());
            report.push(heading("RECOMMENDATIONS:"));
            report.push("-".repeat(15));
            for recommendation in &self.recommendations {
                report.push(format!("• {}", recommendation));
            }
        }

        if !self.actions.is_empty() {
            report.push(String::new());
            report.push(heading("PACKAGE ACTIONS:"));
            report.push("-".repeat(15));
            for action in &self.actions {
                report.push(format!("  {}", action));
            }
        }

        report.join("\n")
    }
}

/// One advice line per distinct (code, package) pair, in priority order.
fn contextual_actions(
    advisor: &ErrorAdvisor,
    results: &[LogAnalysis],
    ordered: &[String],
) -> Vec<String> {
    let mut actions = Vec::new();
    let mut seen = BTreeSet::new();

    for code in ordered {
        for detection in results.iter().flat_map(|r| r.detections.iter()) {
            if &detection.code != code || detection.context.package.is_none() {
                continue;
            }
            if !seen.insert((code.clone(), detection.context.package.clone())) {
                continue;
            }
            match advisor.advise(code, &detection.context) {
                Ok(advice) => actions.push(format!("{}: {}", code, advice.action)),
                Err(e) => tracing::debug!("no advice for {}: {}", code, e),
            }
        }
    }

    actions
}

#[derive(Serialize)]
struct ExportDocument<'a> {
    summary: &'a SummaryReport,
    results: &'a [LogAnalysis],
}

pub fn export_json(path: &Path, summary: &SummaryReport, results: &[LogAnalysis]) -> Result<()> {
    let json = serde_json::to_string_pretty(&ExportDocument { summary, results })?;
    write_file(path, &json)
}

pub fn write_summary(path: &Path, summary: &SummaryReport, top_packages: usize) -> Result<()> {
    write_file(path, &summary.render(top_packages, false))
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
