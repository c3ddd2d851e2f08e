//! Presentation-level configuration
//!
//! Resolved output settings after CLI flags are applied over the file config.

use boardroom_domain::OutputFormat;

/// Output configuration for the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Enable colored terminal output
    pub color: bool,
    /// Show progress indicators
    pub show_progress: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Summary,
            color: true,
            show_progress: true,
        }
    }
}

impl OutputConfig {
    /// CLI flags win over the file; `--quiet` and JSON output hide progress
    pub fn resolve(
        cli_format: Option<crate::OutputFormat>,
        file_format: Option<OutputFormat>,
        color: bool,
        show_progress: bool,
        quiet: bool,
    ) -> Self {
        let format = cli_format
            .map(OutputFormat::from)
            .or(file_format)
            .unwrap_or_default();
        Self {
            format,
            color,
            show_progress: show_progress && !quiet && format != OutputFormat::Json,
        }
    }
}
