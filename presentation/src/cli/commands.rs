//! CLI command definitions

use boardroom_domain::{DecisionType, RoleId};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for outcomes and reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Every vote with its rationale
    Full,
    /// Category, scores and the rationale summary
    Summary,
    /// JSON output
    Json,
}

impl From<OutputFormat> for boardroom_domain::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Full => boardroom_domain::OutputFormat::Full,
            OutputFormat::Summary => boardroom_domain::OutputFormat::Summary,
            OutputFormat::Json => boardroom_domain::OutputFormat::Json,
        }
    }
}

/// CLI arguments for boardroom
#[derive(Parser, Debug)]
#[command(name = "boardroom")]
#[command(author, version, about = "Boardroom - Role-weighted decisions from an executive board")]
#[command(long_about = r#"
Boardroom puts a proposal in front of a board of executive roles, collects
one vote per role in parallel and aggregates them into a decision outcome.

Every decision becomes learning material. `boardroom learn` runs the
self-learning loop: curate a blended dataset, retrain, evaluate and deploy
or roll back. Roles that plateau can be promoted to a larger capacity tier.

Configuration files are loaded from (in priority order):
1. BOARDROOM_* environment variables
2. --config <path>     Explicit config file
3. ./boardroom.toml    Project-level config
4. ~/.config/boardroom/config.toml   Global config

Example:
  boardroom decide "Invest 5M in the cloud platform migration" --type technical
  boardroom decide "Acquire a competitor for 30M" -t investment -r ceo,cfo,general_counsel
  boardroom status cfo
  boardroom learn --rounds 3 --upgrade
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Output format [default: summary]
    #[arg(short, long, value_enum, global = true)]
    pub output: Option<OutputFormat>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,

    /// Append engine events to a JSONL file
    #[arg(long, value_name = "PATH", global = true)]
    pub event_log: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Put a proposal to the board and print the outcome
    Decide {
        /// The proposal text
        proposal: String,

        /// Decision type
        #[arg(short = 't', long = "type", default_value = "strategic")]
        decision_type: DecisionType,

        /// Roles that vote (comma separated); defaults to the whole board
        #[arg(short, long = "roles", value_delimiter = ',')]
        roles: Vec<RoleId>,

        /// Decision identifier; generated when omitted
        #[arg(long)]
        id: Option<String>,
    },

    /// Show the model and learning state of the board
    Status {
        /// Only this role
        role: Option<RoleId>,
    },

    /// Run self-learning cycles on generated decisions
    Learn {
        /// Number of collect-curate-retrain rounds
        #[arg(long, default_value_t = 1)]
        rounds: usize,

        /// Only this role
        #[arg(long)]
        role: Option<RoleId>,

        /// Generated decisions put to the board per round
        #[arg(long, default_value_t = 60)]
        decisions: usize,

        /// Check upgrade triggers after every round
        #[arg(long)]
        upgrade: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decide() {
        let cli = Cli::try_parse_from([
            "boardroom",
            "decide",
            "Invest in the platform",
            "--type",
            "technical",
            "--roles",
            "cto,cfo",
            "-o",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.output, Some(OutputFormat::Json));
        match cli.command {
            Some(Command::Decide {
                proposal,
                decision_type,
                roles,
                id,
            }) => {
                assert_eq!(proposal, "Invest in the platform");
                assert_eq!(decision_type, DecisionType::Technical);
                assert_eq!(roles, vec![RoleId::Cto, RoleId::Cfo]);
                assert!(id.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_learn_defaults() {
        let cli = Cli::try_parse_from(["boardroom", "-vv", "learn", "--upgrade"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(
            cli.command,
            Some(Command::Learn {
                rounds: 1,
                role: None,
                decisions: 60,
                upgrade: true,
            })
        );
    }

    #[test]
    fn test_unknown_decision_type_is_rejected() {
        let result = Cli::try_parse_from(["boardroom", "decide", "x", "--type", "moonshot"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_show_config_needs_no_command() {
        let cli = Cli::try_parse_from(["boardroom", "--show-config"]).unwrap();
        assert!(cli.show_config);
        assert!(cli.command.is_none());
    }
}
