use crate::advisor::ErrorAdvisor;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

mod scanner;

pub use scanner::{Detection, LogScanner, ScanResult};

pub const DEFAULT_EXTENSIONS: [&str; 2] = ["log", "txt"];

#[derive(Debug)]
pub enum AnalysisError {
    Io { path: PathBuf, source: std::io::Error },
    NoLogsFound(PathBuf),
    Pattern(regex::Error),
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "Failed to read {}: {}", path.display(), source),
            Self::NoLogsFound(dir) => write!(f, "No log files found in {}", dir.display()),
            Self::Pattern(e) => write!(f, "Invalid log pattern: {}", e),
        }
    }
}

impl std::error::Error for AnalysisError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Pattern(e) => Some(e),
            Self::NoLogsFound(_) => None,
        }
    }
}

impl From<regex::Error> for AnalysisError {
    fn from(error: regex::Error) -> Self {
        AnalysisError::Pattern(error)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LogAnalysis {
    pub file: PathBuf,
    pub detections: Vec<Detection>,
    pub counts: BTreeMap<String, usize>,
    pub packages_affected: Vec<String>,
    pub unrecognized: Vec<String>,
    pub total_errors: usize,
}

impl LogAnalysis {
    fn from_scan(file: PathBuf, scan: ScanResult) -> Self {
        let mut counts = BTreeMap::new();
        let mut packages = BTreeSet::new();

        for detection in &scan.detections {
            *counts.entry(detection.code.clone()).or_insert(0) += 1;
            if let Some(package) = &detection.context.package {
                packages.insert(package.clone());
            }
        }

        Self {
            file,
            total_errors: scan.detections.len(),
            detections: scan.detections,
            counts,
            packages_affected: packages.into_iter().collect(),
            unrecognized: scan.unrecognized,
        }
    }
}

pub struct BuildLogAnalyzer {
    advisor: ErrorAdvisor,
    scanner: LogScanner,
    extensions: Vec<String>,
}

impl BuildLogAnalyzer {
    pub fn new(advisor: ErrorAdvisor) -> Result<Self, AnalysisError> {
        Ok(Self {
            advisor,
            scanner: LogScanner::new()?,
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
        })
    }

    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions
            .into_iter()
            .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
            .collect();
        self
    }

    pub fn advisor(&self) -> &ErrorAdvisor {
        &self.advisor
    }

    pub fn analyze_text(&self, name: impl Into<PathBuf>, text: &str) -> LogAnalysis {
        let scan = self.scanner.scan(text, &self.advisor);
        LogAnalysis::from_scan(name.into(), scan)
    }

    pub async fn analyze_log(&self, path: &Path) -> Result<LogAnalysis, AnalysisError> {
        tracing::debug!(path = %path.display(), "scanning build log");

        let bytes = tokio::fs::read(path).await.map_err(|source| AnalysisError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let text = String::from_utf8_lossy(&bytes);
        let analysis = self.analyze_text(path, &text);

        tracing::info!(
            path = %path.display(),
            errors = analysis.total_errors,
            unrecognized = analysis.unrecognized.len(),
            "analyzed build log"
        );
        Ok(analysis)
    }

    /// Analyzes matching files (and symlinks to files) directly inside
    /// `dir`, in name order. Unreadable files are skipped.
    pub async fn analyze_directory(&self, dir: &Path) -> Result<Vec<LogAnalysis>, AnalysisError> {
        let log_files = self.find_logs(dir)?;
        if log_files.is_empty() {
            return Err(AnalysisError::NoLogsFound(dir.to_path_buf()));
        }

        let mut results = Vec::new();
        for path in log_files {
            match self.analyze_log(&path).await {
                Ok(analysis) => results.push(analysis),
                Err(e) => tracing::warn!("skipping log: {}", e),
            }
        }

        Ok(results)
    }

    fn find_logs(&self, dir: &Path) -> Result<Vec<PathBuf>, AnalysisError> {
        let mut files = Vec::new();

        for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| AnalysisError::Io {
                path: dir.to_path_buf(),
                source: e.into(),
            })?;
            // symlinks count when they point at a file or dangle; a
            // dangling one fails at read time and is skipped there
            if entry.file_type().is_dir() || entry.path().is_dir() {
                continue;
            }

            let matches = entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
                .unwrap_or(false);
            if matches {
                files.push(entry.into_path());
            }
        }

        Ok(files)
    }
}

#[cfg(test)]
mod tests;
