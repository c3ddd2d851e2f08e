//! Output formatter trait

use boardroom_domain::DecisionOutcome;

/// Trait for formatting decision outcomes
pub trait OutputFormatter {
    /// Format the complete outcome, every vote included
    fn format(&self, outcome: &DecisionOutcome) -> String;

    /// Format as JSON
    fn format_json(&self, outcome: &DecisionOutcome) -> String;

    /// Format category and scores only (concise output)
    fn format_summary(&self, outcome: &DecisionOutcome) -> String;
}
