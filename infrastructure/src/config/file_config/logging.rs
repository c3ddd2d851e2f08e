//! Logging configuration from TOML (`[logging]` section)

use boardroom_domain::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Raw logging configuration from TOML
///
/// # Example
///
/// ```toml
/// [logging]
/// level = "info"                       # used when neither -v nor RUST_LOG is given
/// event_log = "~/.local/share/boardroom/events.jsonl"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    pub level: Option<String>,
    /// JSONL audit log of engine events
    pub event_log: Option<PathBuf>,
}

impl FileLoggingConfig {
    /// The configured level, if it names a tracing level
    pub fn parse_level(&self) -> (Option<&str>, Vec<ConfigIssue>) {
        let Some(level) = self.level.as_deref() else {
            return (None, vec![]);
        };
        match LEVELS.iter().find(|l| l.eq_ignore_ascii_case(level.trim())) {
            Some(level) => (Some(*level), vec![]),
            None => {
                let issue = ConfigIssue::warning(
                    ConfigIssueCode::InvalidEnumValue {
                        field: "logging.level".to_string(),
                        value: level.to_string(),
                        valid_values: LEVELS.iter().map(|l| l.to_string()).collect(),
                    },
                    format!("logging.level: unknown value '{}', ignoring it", level),
                );
                (None, vec![issue])
            }
        }
    }

    /// Event log path with a leading `~` expanded to the home directory
    pub fn event_log_path(&self) -> Option<PathBuf> {
        let path = self.event_log.as_ref()?;
        if let Ok(rest) = path.strip_prefix("~")
            && let Some(home) = dirs::home_dir()
        {
            return Some(home.join(rest));
        }
        Some(path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_config_deserialize() {
        let toml_str = r#"
[logging]
level = "DEBUG"
event_log = "/tmp/boardroom/events.jsonl"
"#;
        let config: super::super::FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.logging.parse_level().0, Some("debug"));
        assert_eq!(
            config.logging.event_log_path(),
            Some(PathBuf::from("/tmp/boardroom/events.jsonl"))
        );
    }

    #[test]
    fn test_unknown_level_warns() {
        let config = FileLoggingConfig {
            level: Some("loud".to_string()),
            event_log: None,
        };
        let (level, issues) = config.parse_level();
        assert!(level.is_none());
        assert_eq!(issues.len(), 1);
    }
}
