use crate::advisor::{ErrorAdvisor, ErrorContext};
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub code: String,
    pub line_number: usize,
    pub line: String,
    pub context: ErrorContext,
}

#[derive(Debug, Default)]
pub struct ScanResult {
    pub detections: Vec<Detection>,
    pub unrecognized: Vec<String>,
}

/// Finds NuGet and MSBuild codes in log text and pulls the package
/// details out of the message that follows them.
pub struct LogScanner {
    code_pattern: Regex,
    project_suffix: Regex,
    not_found: Regex,
    downgrade: Regex,
    incompatible: Regex,
    missing_version_items: Regex,
    missing_version_listed: Regex,
    missing_version_single: Regex,
    duplicate_items: Regex,
    duplicate_quoted: Regex,
    task_not_loaded: Regex,
}

const IDENT: &str = r"'?([\w.\-+]+)'?";

impl LogScanner {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            code_pattern: Regex::new(r"(?i)\b(NU\d{4}|MSB\d{4})\b")?,
            project_suffix: Regex::new(r"\s+\[[^\]]*\]\s*$")?,
            not_found: Regex::new(&format!(
                r"(?i)unable to find (?:a stable )?package\s+{IDENT}(?:\s+with version\s+'?\(?(?:>=\s*)?([\w.\-+]+))?"
            ))?,
            downgrade: Regex::new(&format!(
                r"(?i)detected package downgrade:?\s+{IDENT}\s+from\s+{IDENT}\s+to\s+{IDENT}"
            ))?,
            incompatible: Regex::new(&format!(
                r"(?i)package\s+{IDENT}\s+{IDENT}\s+is not compatible with\s+{IDENT}"
            ))?,
            missing_version_items: Regex::new(
                r"(?i)packagereference items?\s+(.+?)\s+do(?:es)? not have",
            )?,
            missing_version_listed: Regex::new(
                r"(?i)corresponding packageversion items?:\s*(.+)$",
            )?,
            missing_version_single: Regex::new(&format!(
                r"(?i)package reference\s+{IDENT}\s+does not contain a version"
            ))?,
            duplicate_items: Regex::new(r"(?i)duplicate 'packageversion' items are:\s+'?([\w.\-+]+)")?,
            duplicate_quoted: Regex::new(r"(?i)duplicate\s+'([^']+)'\s+package version")?,
            task_not_loaded: Regex::new(r#"(?i)the\s+["']([^"']+)["']\s+task could not be loaded"#)?,
        })
    }

    pub fn scan(&self, text: &str, advisor: &ErrorAdvisor) -> ScanResult {
        let mut result = ScanResult::default();

        for (i, line) in text.lines().enumerate() {
            let mut seen_on_line: Vec<String> = Vec::new();

            for capture in self.code_pattern.captures_iter(line) {
                let code = capture[1].to_ascii_uppercase();
                if seen_on_line.contains(&code) {
                    continue;
                }
                seen_on_line.push(code.clone());

                if !advisor.lookup(&code).is_found() {
                    if !result.unrecognized.contains(&code) {
                        tracing::warn!(code = %code, line = i + 1, "unrecognized error code in log");
                        result.unrecognized.push(code);
                    }
                    continue;
                }

                for context in self.extract_contexts(&code, line) {
                    result.detections.push(Detection {
                        code: code.clone(),
                        line_number: i + 1,
                        line: line.trim().to_string(),
                        context,
                    });
                }
            }
        }

        result.unrecognized.sort();
        result
    }

    /// One context per affected package; a single empty context when the
    /// message shape is not recognised.
    pub fn extract_contexts(&self, code: &str, line: &str) -> Vec<ErrorContext> {
        // dotnet build appends the project as " [path/to/App.csproj]"
        let line = self.project_suffix.replace(line, "");
        let line: &str = &line;

        let contexts: Vec<ErrorContext> = match code {
            "NU1103" => self
                .not_found
                .captures(line)
                .map(|c| ErrorContext {
                    package: group(&c, 1),
                    version_required: group(&c, 2),
                    ..Default::default()
                })
                .into_iter()
                .collect(),
            "NU1605" => self
                .downgrade
                .captures(line)
                .map(|c| ErrorContext {
                    package: group(&c, 1),
                    version_required: group(&c, 2),
                    version_found: group(&c, 3),
                    ..Default::default()
                })
                .into_iter()
                .collect(),
            "NU1202" => self
                .incompatible
                .captures(line)
                .map(|c| ErrorContext {
                    package: group(&c, 1),
                    version_found: group(&c, 2),
                    target_framework: group(&c, 3),
                    ..Default::default()
                })
                .into_iter()
                .collect(),
            "NU1010" => self.missing_version_packages(line),
            "NU1506" => self
                .duplicate_items
                .captures(line)
                .or_else(|| self.duplicate_quoted.captures(line))
                .map(|c| ErrorContext {
                    package: group(&c, 1),
                    ..Default::default()
                })
                .into_iter()
                .collect(),
            "MSB4062" => self
                .task_not_loaded
                .captures(line)
                .map(|c| ErrorContext {
                    package: group(&c, 1),
                    ..Default::default()
                })
                .into_iter()
                .collect(),
            _ => Vec::new(),
        };

        if contexts.is_empty() {
            vec![ErrorContext::default()]
        } else {
            contexts
        }
    }

    fn missing_version_packages(&self, line: &str) -> Vec<ErrorContext> {
        let listed = self
            .missing_version_items
            .captures(line)
            .or_else(|| self.missing_version_listed.captures(line));

        if let Some(c) = listed {
            return c[1]
                .split(|ch: char| ch == ',' || ch == ';' || ch.is_whitespace())
                .map(clean_value)
                .filter(|name| !name.is_empty())
                .map(|name| ErrorContext {
                    package: Some(name),
                    ..Default::default()
                })
                .collect();
        }

        self.missing_version_single
            .captures(line)
            .map(|c| ErrorContext {
                package: group(&c, 1),
                ..Default::default()
            })
            .into_iter()
            .collect()
    }
}

fn group(captures: &regex::Captures<'_>, index: usize) -> Option<String> {
    captures
        .get(index)
        .map(|m| clean_value(m.as_str()))
        .filter(|value| !value.is_empty())
}

// sentences end with a period right after the version
fn clean_value(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c: char| c == '\'' || c == '"')
        .trim_end_matches('.')
        .to_string()
}
