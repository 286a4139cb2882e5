//! Error-code rule table and remediation lookup for CPM migrations.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

mod error;
mod rules;

pub use error::AdvisorError;
pub use rules::default_rules;

/// Severity tier. Declaration order is priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Blocking,
    Build,
    Warning,
}

impl Severity {
    pub fn heading(&self) -> &'static str {
        match self {
            Severity::Blocking => "BLOCKING ERRORS",
            Severity::Build => "BUILD ISSUES",
            Severity::Warning => "WARNINGS",
        }
    }

    pub fn all() -> [Severity; 3] {
        [Severity::Blocking, Severity::Build, Severity::Warning]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRule {
    pub code: String,
    pub description: String,
    pub severity: Severity,
    #[serde(default)]
    pub causes: Vec<String>,
    pub remediation: Vec<String>,
}

/// What the log said about the failing package, when it said anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorContext {
    pub package: Option<String>,
    pub target_framework: Option<String>,
    pub version_found: Option<String>,
    pub version_required: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<'a> {
    Found(&'a ErrorRule),
    NotFound(String),
}

impl<'a> Lookup<'a> {
    pub fn rule(&self) -> Option<&'a ErrorRule> {
        match self {
            Lookup::Found(rule) => Some(*rule),
            Lookup::NotFound(_) => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Advice {
    pub rule: ErrorRule,
    pub action: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct RuleFile {
    rules: Vec<ErrorRule>,
}

fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Rules in priority order, indexed by code.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<ErrorRule>,
    index: HashMap<String, usize>,
}

impl RuleSet {
    pub fn new(rules: Vec<ErrorRule>) -> Result<Self, AdvisorError> {
        let mut rules: Vec<ErrorRule> = rules
            .into_iter()
            .map(|mut rule| {
                rule.code = normalize_code(&rule.code);
                rule
            })
            .collect();

        for rule in &rules {
            if rule.code.is_empty() {
                return Err(AdvisorError::InvalidRule("rule with empty code".to_string()));
            }
            if rule.remediation.iter().all(|step| step.trim().is_empty()) {
                return Err(AdvisorError::InvalidRule(format!(
                    "{} has no remediation steps",
                    rule.code
                )));
            }
        }

        // stable: table order breaks ties inside a tier
        rules.sort_by_key(|rule| rule.severity);

        let mut index = HashMap::new();
        for (i, rule) in rules.iter().enumerate() {
            if index.insert(rule.code.clone(), i).is_some() {
                return Err(AdvisorError::DuplicateCode(rule.code.clone()));
            }
        }

        Ok(Self { rules, index })
    }

    pub fn from_file(path: &Path) -> Result<Self, AdvisorError> {
        let content = std::fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("toml")
            .to_ascii_lowercase();

        let file: RuleFile = match extension.as_str() {
            "json" => serde_json::from_str(&content)?,
            "yaml" | "yml" => serde_yaml::from_str(&content)?,
            "toml" => toml::from_str(&content)?,
            other => {
                return Err(AdvisorError::RuleFile(format!(
                    "unsupported rule file extension: {}",
                    other
                )))
            }
        };

        Self::new(file.rules)
    }

    pub fn get(&self, code: &str) -> Option<&ErrorRule> {
        self.index
            .get(&normalize_code(code))
            .map(|&i| &self.rules[i])
    }

    fn position(&self, code: &str) -> Option<usize> {
        self.index.get(code).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ErrorRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        let rules = default_rules();
        let index = rules
            .iter()
            .enumerate()
            .map(|(i, rule)| (rule.code.clone(), i))
            .collect();
        Self { rules, index }
    }
}

pub struct ErrorAdvisor {
    rules: RuleSet,
}

impl ErrorAdvisor {
    pub fn new() -> Self {
        Self {
            rules: RuleSet::default(),
        }
    }

    pub fn with_rules(rules: RuleSet) -> Self {
        Self { rules }
    }

    /// Loads a rule table from disk, or falls back to the built-in table.
    pub fn from_optional_file(path: Option<&Path>) -> Result<Self, AdvisorError> {
        match path {
            Some(path) => Ok(Self::with_rules(RuleSet::from_file(path)?)),
            None => Ok(Self::new()),
        }
    }

    pub fn rules(&self) -> impl Iterator<Item = &ErrorRule> {
        self.rules.iter()
    }

    pub fn lookup(&self, code: &str) -> Lookup<'_> {
        match self.rules.get(code) {
            Some(rule) => Lookup::Found(rule),
            None => Lookup::NotFound(code.trim().to_string()),
        }
    }

    pub fn severity(&self, code: &str) -> Option<Severity> {
        self.rules.get(code).map(|rule| rule.severity)
    }

    /// Orders codes by severity tier, then rule table order. Unknown codes
    /// go last, sorted, so they still reach whoever reads the output.
    pub fn prioritize<I, S>(&self, codes: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let codes: BTreeSet<String> = codes
            .into_iter()
            .map(|code| normalize_code(code.as_ref()))
            .filter(|code| !code.is_empty())
            .collect();

        let (mut known, unknown): (Vec<String>, Vec<String>) = codes
            .into_iter()
            .partition(|code| self.rules.position(code).is_some());

        // position already encodes severity since the table is tier-sorted
        known.sort_by_key(|code| self.rules.position(code));
        known.extend(unknown);
        known
    }

    pub fn advise(&self, code: &str, context: &ErrorContext) -> Result<Advice, AdvisorError> {
        let rule = self
            .rules
            .get(code)
            .ok_or_else(|| AdvisorError::UnknownCode(code.trim().to_string()))?;

        Ok(Advice {
            action: contextual_action(rule, context),
            rule: rule.clone(),
        })
    }
}

impl Default for ErrorAdvisor {
    fn default() -> Self {
        Self::new()
    }
}

fn contextual_action(rule: &ErrorRule, context: &ErrorContext) -> String {
    let first_step = rule
        .remediation
        .first()
        .cloned()
        .unwrap_or_default();

    let package = match context.package.as_deref() {
        Some(package) => package,
        None => return first_step,
    };

    match rule.code.as_str() {
        "NU1103" => match context.version_required.as_deref() {
            Some(version) => format!(
                "Pin a stable version of {} available on the feed (requested {}), or reference its assembly directly",
                package, version
            ),
            None => format!(
                "Pin a stable version of {} available on the feed, or reference its assembly directly",
                package
            ),
        },
        "NU1605" => match (
            context.version_found.as_deref(),
            context.version_required.as_deref(),
        ) {
            (Some(found), Some(required)) => format!(
                "Raise {} from {} to {} in Directory.Packages.props",
                package, found, required
            ),
            _ => format!(
                "Raise the central version of {} to the highest version required",
                package
            ),
        },
        "NU1202" => match context.target_framework.as_deref() {
            Some(framework) => format!(
                "Choose a version of {} that supports {}",
                package, framework
            ),
            None => format!(
                "Choose a version of {} that supports the project's target framework",
                package
            ),
        },
        "NU1010" => format!(
            "Add <PackageVersion Include=\"{}\" Version=\"{}\" /> to Directory.Packages.props",
            package,
            context
                .version_required
                .as_deref()
                .or(context.version_found.as_deref())
                .unwrap_or("x.y.z")
        ),
        "MSB4062" => format!(
            "Add <GenerateAssemblyInfo>false</GenerateAssemblyInfo> to the project that loads {}",
            package
        ),
        "NU1506" => format!(
            "Keep a single PackageVersion entry for {} in Directory.Packages.props",
            package
        ),
        _ => format!("{} ({})", first_step, package),
    }
}
