use std::fmt;

#[derive(Debug)]
pub enum AdvisorError {
    UnknownCode(String),
    DuplicateCode(String),
    InvalidRule(String),
    RuleFile(String),
}

impl fmt::Display for AdvisorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCode(code) => write!(f, "Unknown error code: {}", code),
            Self::DuplicateCode(code) => write!(f, "Duplicate rule for code: {}", code),
            Self::InvalidRule(msg) => write!(f, "Invalid rule: {}", msg),
            Self::RuleFile(msg) => write!(f, "Rule file error: {}", msg),
        }
    }
}

impl std::error::Error for AdvisorError {}

impl From<serde_json::Error> for AdvisorError {
    fn from(error: serde_json::Error) -> Self {
        AdvisorError::RuleFile(format!("JSON parse error: {}", error))
    }
}

impl From<toml::de::Error> for AdvisorError {
    fn from(error: toml::de::Error) -> Self {
        AdvisorError::RuleFile(format!("TOML parse error: {}", error))
    }
}

impl From<serde_yaml::Error> for AdvisorError {
    fn from(error: serde_yaml::Error) -> Self {
        AdvisorError::RuleFile(format!("YAML parse error: {}", error))
    }
}

impl From<std::io::Error> for AdvisorError {
    fn from(error: std::io::Error) -> Self {
        AdvisorError::RuleFile(error.to_string())
    }
}
