//! Output format value object

use serde::{Deserialize, Serialize};

/// How decision outcomes and reports are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Every vote with its rationale
    Full,
    /// Category, scores and the rationale summary (default)
    #[default]
    Summary,
    /// JSON output
    Json,
}
