//! Console output formatter for outcomes and learning reports

use crate::output::formatter::OutputFormatter;
use boardroom_application::{
    CycleOutcome, CycleReport, LearningCycleError, RoleStatus, RoleUpgradeOutcome, UpgradeReport,
};
use boardroom_domain::{ConfigIssue, DecisionOutcome, LearningPhase, OutcomeCategory, Severity};
use colored::{ColoredString, Colorize};
use serde::Serialize;

/// Formats outcomes and reports for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the complete outcome, one line per vote
    pub fn format(outcome: &DecisionOutcome) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Board Decision"));
        output.push('\n');

        output.push_str(&format!(
            "{} {}\n",
            "Decision:".cyan().bold(),
            outcome.decision_id()
        ));
        output.push_str(&format!(
            "{} {}\n",
            "Type:".cyan().bold(),
            outcome.decision_type()
        ));

        output.push_str(&Self::section_header("Votes"));
        for (vote, contribution) in outcome.votes().iter().zip(outcome.contributions()) {
            let role = format!("{:<16}", vote.voter_id().as_str());
            if vote.is_abstention() {
                output.push_str(&format!(
                    "{} {} {}\n",
                    vote.symbol(),
                    role.dimmed(),
                    format!("abstained: {}", vote.rationale()).dimmed()
                ));
                continue;
            }
            let value = format!("{:+.2}", vote.vote_value());
            let value = if vote.is_approval() {
                value.green()
            } else if vote.is_rejection() {
                value.red()
            } else {
                value.yellow()
            };
            output.push_str(&format!(
                "{} {} {} conf {:.2}  weight {:.2}  {}\n",
                vote.symbol(),
                role.bold(),
                value,
                vote.confidence(),
                contribution.voting_weight,
                vote.rationale()
            ));
        }

        output.push_str(&Self::section_header("Outcome"));
        output.push_str(&Self::scores(outcome));
        output.push_str(&format!(
            "\n{}\n{}\n",
            "Rationale:".cyan().bold(),
            Self::indent(outcome.rationale_summary(), "  ")
        ));

        output.push_str(&Self::footer());
        output
    }

    /// Format as JSON
    pub fn format_json<T: Serialize>(value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
    }

    /// Category and scores only
    pub fn format_summary(outcome: &DecisionOutcome) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "{} {} ({})\n",
            "=== Board Decision".cyan().bold(),
            outcome.decision_id(),
            outcome.decision_type()
        ));
        output.push_str(&Self::scores(outcome));
        output.push_str(outcome.rationale_summary());
        output.push('\n');
        output
    }

    fn scores(outcome: &DecisionOutcome) -> String {
        format!(
            "{} {}\n{} {:+.3}   {} {:.3}   {}\n",
            Self::category(outcome.category()),
            outcome.category().label().dimmed(),
            "aggregate".bold(),
            outcome.aggregate_score(),
            "consensus".bold(),
            outcome.consensus_score(),
            outcome.vote_summary()
        )
    }

    fn category(category: OutcomeCategory) -> ColoredString {
        let text = category.as_str().bold();
        if category.is_approved() {
            text.green()
        } else if category.is_rejected() {
            text.red()
        } else {
            text.yellow()
        }
    }

    // ==================== Learning ====================

    pub fn format_role_statuses(statuses: &[RoleStatus]) -> String {
        let mut output = Self::section_header("Board Status");
        for status in statuses {
            output.push_str(&Self::format_role_status(status));
        }
        output
    }

    pub fn format_role_status(status: &RoleStatus) -> String {
        let score = status
            .last_evaluation_score
            .as_ref()
            .map(|s| format!("{:.3}", s.overall))
            .unwrap_or_else(|| "-".to_string());
        let mut line = format!(
            "{:<16} {:<9} {:<24} {:<11} eval {}  corpus {}+{}  datasets {}\n",
            status.role_id.as_str().bold(),
            status.capacity_tier.as_str(),
            status.active_model_version.as_str(),
            Self::phase(status.phase),
            score,
            status.original_examples,
            status.self_learning_examples,
            status.dataset_versions
        );
        if let Some(fault) = &status.last_fault {
            line.push_str(&format!("  {} {}\n", "fault:".red().bold(), fault));
        }
        line
    }

    fn phase(phase: LearningPhase) -> ColoredString {
        match phase {
            LearningPhase::Halted => phase.as_str().red().bold(),
            LearningPhase::Deployed => phase.as_str().green(),
            LearningPhase::RolledBack => phase.as_str().yellow(),
            LearningPhase::Idle => phase.as_str().dimmed(),
            _ => phase.as_str().cyan(),
        }
    }

    pub fn format_cycle_report(report: &CycleReport) -> String {
        let dataset = &report.dataset_version;
        let head = format!(
            "{} {} ({} original + {} self-learning, ratio {:.2})",
            report.role_id.as_str().bold(),
            dataset.version_id,
            dataset.original_count,
            dataset.self_learning_count,
            dataset.blend_ratio.original_share()
        );
        let result = match &report.outcome {
            CycleOutcome::Deployed {
                model_version,
                previous_version,
            } => format!(
                "{} {} -> {}",
                "deployed".green().bold(),
                previous_version,
                model_version
            ),
            CycleOutcome::RolledBack {
                rejected_version,
                active_version,
            } => format!(
                "{} {}, keeping {}",
                "rolled back".yellow().bold(),
                rejected_version,
                active_version
            ),
        };
        format!(
            "{}\n  {}  score {:.3} vs {:.3}\n",
            head, result, report.candidate.overall, report.baseline.overall
        )
    }

    pub fn format_cycle_error(role: &boardroom_domain::RoleId, error: &LearningCycleError) -> String {
        let label = if error.is_integrity_violation() {
            "halted".red().bold()
        } else {
            "skipped".yellow()
        };
        format!("{} {} {}\n", role.as_str().bold(), label, error)
    }

    pub fn format_upgrade_report(report: &UpgradeReport) -> String {
        let mut output = Self::section_header("Capacity Upgrade");
        for role in &report.roles {
            let detail = match &role.outcome {
                RoleUpgradeOutcome::Promoted {
                    from,
                    to,
                    model_version,
                    margin,
                } => format!(
                    "{} {} -> {} as {} (+{:.3})",
                    "promoted".green().bold(),
                    from,
                    to,
                    model_version,
                    margin
                ),
                RoleUpgradeOutcome::Retained {
                    tier,
                    current_mean,
                    candidate_mean,
                } => format!(
                    "{} on {} ({:.3} vs candidate {:.3})",
                    "retained".yellow(),
                    tier,
                    current_mean,
                    candidate_mean
                ),
                RoleUpgradeOutcome::Skipped { reason } => {
                    format!("{} {}", "skipped".dimmed(), reason)
                }
                RoleUpgradeOutcome::Failed { reason } => {
                    format!("{} {}", "failed".red().bold(), reason)
                }
            };
            output.push_str(&format!("{:<16} {}\n", role.role_id.as_str().bold(), detail));
        }
        output
    }

    pub fn format_issues(issues: &[ConfigIssue]) -> String {
        issues
            .iter()
            .map(|issue| match issue.severity {
                Severity::Error => format!("{} {}\n", "error:".red().bold(), issue.message),
                Severity::Warning => format!("{} {}\n", "warning:".yellow().bold(), issue.message),
            })
            .collect()
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format(&self, outcome: &DecisionOutcome) -> String {
        Self::format(outcome)
    }

    fn format_json(&self, outcome: &DecisionOutcome) -> String {
        Self::format_json(outcome)
    }

    fn format_summary(&self, outcome: &DecisionOutcome) -> String {
        Self::format_summary(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boardroom_domain::{
        ConfigIssueCode, DecisionId, DecisionRequest, DecisionType, RoleId, RoleWeightProfile,
        Vote, aggregate,
    };

    fn outcome() -> DecisionOutcome {
        colored::control::set_override(false);
        let request = DecisionRequest::new(
            DecisionId::new("d-1"),
            DecisionType::Investment,
            "Invest in the platform",
            [RoleId::Cfo, RoleId::Cto, RoleId::Cmo],
        );
        let votes = vec![
            Vote::new(RoleId::Cfo, 0.8, 0.9, "Payback inside two years", 0.9, 0.9),
            Vote::new(RoleId::Cto, 0.6, 0.8, "Platform fits", 0.8, 0.8),
            Vote::abstention(RoleId::Cmo, "timed out"),
        ];
        aggregate(&request, votes, &RoleWeightProfile::uniform()).unwrap()
    }

    #[test]
    fn test_full_format_lists_every_vote() {
        let outcome = outcome();
        let text = ConsoleFormatter::format(&outcome);
        assert!(text.contains("d-1"));
        assert!(text.contains("Payback inside two years"));
        assert!(text.contains("abstained: timed out"));
        assert!(text.contains(outcome.category().as_str()));
    }

    #[test]
    fn test_summary_omits_votes() {
        let outcome = outcome();
        let text = ConsoleFormatter::format_summary(&outcome);
        assert!(text.contains(outcome.category().as_str()));
        assert!(!text.contains("abstained"));
    }

    #[test]
    fn test_json_round_trips_scores() {
        let outcome = outcome();
        let json = ConsoleFormatter::format_json(&outcome);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["decision_id"], "d-1");
        assert!(value["votes"].as_array().unwrap().len() == 3);
    }

    #[test]
    fn test_issues_are_labeled_by_severity() {
        colored::control::set_override(false);
        let issues = vec![
            ConfigIssue::error(
                ConfigIssueCode::DuplicateRole {
                    role: "cfo".to_string(),
                },
                "roles: 'cfo' is declared more than once",
            ),
            ConfigIssue::warning(
                ConfigIssueCode::ZeroDuration {
                    field: "voting.judgment_timeout_ms".to_string(),
                },
                "voting.judgment_timeout_ms: must be positive",
            ),
        ];
        let text = ConsoleFormatter::format_issues(&issues);
        assert!(text.starts_with("error: roles"));
        assert!(text.contains("warning: voting.judgment_timeout_ms"));
    }
}
