//! JSONL file writer for engine events.
//!
//! Each [`EngineEvent`] is serialized as a single JSON line carrying its
//! `type` tag and a `timestamp`, appended to the file via a buffered writer.

use boardroom_application::{EngineEvent, EngineEventSink};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// JSONL audit log that writes one JSON object per line.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Appends to an existing file.
pub struct JsonlEventLog {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlEventLog {
    /// Open the log at the given path.
    ///
    /// Creates the file (and parent directories) if they don't exist.
    /// Returns `None` if the file cannot be opened.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create event log directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not open event log file {}: {}", path.display(), e);
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    /// Get the path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EngineEventSink for JsonlEventLog {
    fn emit(&self, event: &EngineEvent) {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        let mut record = match serde_json::to_value(event) {
            Ok(serde_json::Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                warn!("Could not serialize {} event", event.event_type());
                return;
            }
        };
        record.insert(
            "timestamp".to_string(),
            serde_json::Value::String(timestamp),
        );

        let Ok(line) = serde_json::to_string(&record) else {
            return;
        };

        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
            // Flush per line; readers tail the file
            let _ = writer.flush();
        }
    }
}

impl Drop for JsonlEventLog {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boardroom_domain::{CapacityTier, DecisionId, ModelVersion, RoleId, UpgradeTrigger};

    fn read_lines(path: &Path) -> Vec<serde_json::Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_event_log_writes_valid_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let log = JsonlEventLog::new(&path).unwrap();

        log.emit(&EngineEvent::DecisionFailed {
            decision_id: DecisionId::new("d-1"),
            reason: "no votes".to_string(),
        });
        log.emit(&EngineEvent::TierPromoted {
            role_id: RoleId::Cfo,
            from: CapacityTier::Baseline,
            to: CapacityTier::Upgraded,
            model_version: ModelVersion::new("cfo-upgraded-v1"),
            margin: 0.05,
        });

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        for value in &lines {
            assert!(value.get("type").is_some());
            assert!(value.get("timestamp").is_some());
        }

        assert_eq!(lines[0]["type"], "decision_failed");
        assert_eq!(lines[0]["decision_id"], "d-1");
        assert_eq!(lines[1]["type"], "tier_promoted");
        assert_eq!(lines[1]["role_id"], "cfo");
        assert_eq!(lines[1]["to"], "upgraded");
    }

    #[test]
    fn test_event_log_appends_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("events.jsonl");

        for _ in 0..2 {
            let log = JsonlEventLog::new(&path).unwrap();
            log.emit(&EngineEvent::UpgradeTriggered {
                role_id: RoleId::Cto,
                triggers: vec![UpgradeTrigger::OperatorRequested],
            });
        }

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["triggers"][0], "operator_requested");
    }
}
