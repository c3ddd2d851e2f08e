//! Progress reporting for vote collection

use boardroom_application::DecisionProgressNotifier;
use boardroom_domain::{DecisionId, RoleId, Vote};
use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::{Mutex, PoisonError};

/// Reports vote collection with a progress bar per decision
pub struct ProgressReporter {
    multi: MultiProgress,
    bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            bar: Mutex::new(None),
        }
    }

    fn collection_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn advance(&self, message: String) {
        if let Some(pb) = self
            .bar
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            pb.set_message(message);
            pb.inc(1);
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionProgressNotifier for ProgressReporter {
    fn on_collection_start(&self, decision_id: &DecisionId, roles: &[RoleId]) {
        let pb = self.multi.add(ProgressBar::new(roles.len() as u64));
        pb.set_style(Self::collection_style());
        pb.set_prefix(format!("Voting {}", decision_id));
        pb.set_message("Waiting for the board...");

        *self.bar.lock().unwrap_or_else(PoisonError::into_inner) = Some(pb);
    }

    fn on_vote(&self, vote: &Vote) {
        let value = format!("{:+.2}", vote.vote_value());
        let value = if vote.is_approval() {
            value.green()
        } else if vote.is_rejection() {
            value.red()
        } else {
            value.yellow()
        };
        self.advance(format!("{} {}", vote.voter_id(), value));
    }

    fn on_abstention(&self, role: &RoleId, _reason: &str) {
        self.advance(format!("{} {}", "x".red(), role));
    }

    fn on_collection_complete(&self, _decision_id: &DecisionId) {
        if let Some(pb) = self
            .bar
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            pb.finish_with_message(format!("{}", "votes collected".green()));
        }
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl DecisionProgressNotifier for SimpleProgress {
    fn on_collection_start(&self, decision_id: &DecisionId, roles: &[RoleId]) {
        println!(
            "{} {} ({} roles)",
            "->".cyan(),
            format!("Collecting votes for {}", decision_id).bold(),
            roles.len()
        );
    }

    fn on_vote(&self, vote: &Vote) {
        println!(
            "  {} {} {:+.2}",
            "v".green(),
            vote.voter_id(),
            vote.vote_value()
        );
    }

    fn on_abstention(&self, role: &RoleId, reason: &str) {
        println!("  {} {} (abstained: {})", "x".red(), role, reason);
    }

    fn on_collection_complete(&self, _decision_id: &DecisionId) {
        println!();
    }
}
