//! CLI entrypoint for boardroom
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use boardroom_application::{
    AdapterFusionRegistry, BoardConfig, CapacityUpgradeManager, DecisionProgressNotifier,
    DecisionService, DecisionStatus, EngineEventSink, LearningLedger, NoEventSink,
    NoProgress, PersistentStore, RunDecisionUseCase, SelfLearningLoop, VoteSynthesizer,
};
use boardroom_domain::{
    DecisionId, DecisionRequest, DecisionType, OutputFormat, RoleId, SituationGenerator,
    TrackRecordBook,
};
use boardroom_infrastructure::{
    ConfigLoader, FileConfig, HeuristicJudgmentProvider, InMemoryStore, JsonlEventLog,
    LocalTrainingPipeline, ModelCatalog, SimulatedEvaluationHarness, bootstrap_seed,
    load_seed_file,
};
use boardroom_presentation::{
    Cli, Command, ConsoleFormatter, OutputConfig, ProgressReporter, SimpleProgress,
};
use clap::{CommandFactory, Parser};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Original examples generated for roles without a seed corpus
const BOOTSTRAP_EXAMPLES: usize = 40;

type Learning = SelfLearningLoop<HeuristicJudgmentProvider, LocalTrainingPipeline, SimulatedEvaluationHarness>;
type Upgrades =
    CapacityUpgradeManager<HeuristicJudgmentProvider, LocalTrainingPipeline, SimulatedEvaluationHarness>;

/// Every wired use case of one process
struct Board {
    service: DecisionService<HeuristicJudgmentProvider>,
    learning: Learning,
    upgrades: Upgrades,
    roles: Vec<RoleId>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        return Ok(());
    }

    let Some(command) = cli.command.clone() else {
        Cli::command().print_help()?;
        return Ok(());
    };

    // === Configuration ===
    let file_config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };

    init_tracing(cli.verbose, file_config.logging.parse_level().0);
    info!("Starting boardroom");

    let (board_config, mut issues) = file_config.to_board_config();
    issues.extend(file_config.logging.parse_level().1);
    if !issues.is_empty() {
        eprint!("{}", ConsoleFormatter::format_issues(&issues));
    }
    if issues.iter().any(|i| i.is_error()) {
        bail!("Configuration has errors; fix them and try again");
    }

    let output = OutputConfig::resolve(
        cli.output,
        file_config.output.format,
        file_config.output.color,
        file_config.output.show_progress,
        cli.quiet,
    );
    if !output.color {
        colored::control::set_override(false);
    }

    let event_log = cli
        .event_log
        .clone()
        .or_else(|| file_config.logging.event_log_path());

    // === Dependency Injection ===
    let board = build_board(&board_config, &file_config, event_log)?;

    match command {
        Command::Decide {
            proposal,
            decision_type,
            roles,
            id,
        } => decide(&board, &output, proposal, decision_type, roles, id).await,
        Command::Status { role } => status(&board, &output, role),
        Command::Learn {
            rounds,
            role,
            decisions,
            upgrade,
        } => learn(&board, &output, rounds, role, decisions, upgrade).await,
    }
}

fn init_tracing(verbose: u8, configured: Option<&str>) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(configured.unwrap_or("warn"))),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn build_board(
    config: &BoardConfig,
    file_config: &FileConfig,
    event_log: Option<PathBuf>,
) -> Result<Board> {
    let events: Arc<dyn EngineEventSink> = match event_log {
        Some(path) => match JsonlEventLog::new(&path) {
            Some(log) => {
                info!("Writing engine events to {}", log.path().display());
                Arc::new(log)
            }
            None => {
                warn!("Event log disabled");
                Arc::new(NoEventSink)
            }
        },
        None => Arc::new(NoEventSink),
    };

    let roles = config.role_ids();
    let provider = Arc::new(HeuristicJudgmentProvider::new());
    let catalog = ModelCatalog::new();
    let pipeline = Arc::new(LocalTrainingPipeline::new(catalog.clone()));
    let harness = Arc::new(SimulatedEvaluationHarness::new(catalog));
    let store: Arc<dyn PersistentStore> = Arc::new(InMemoryStore::new());
    let registry = Arc::new(AdapterFusionRegistry::new(config.roles.iter().cloned()));
    let ledger = Arc::new(LearningLedger::new(roles.clone()));
    let track_records = Arc::new(RwLock::new(TrackRecordBook::new()));

    seed_corpora(&ledger, &registry, &provider, file_config)?;

    let synthesizer = VoteSynthesizer::new(
        Arc::clone(&provider),
        Arc::clone(&registry),
        Arc::new(config.alignment.clone()),
        Arc::clone(&track_records),
        config.engine.clone(),
    );
    let run = RunDecisionUseCase::new(Arc::new(synthesizer), Arc::new(config.weights.clone()));
    let service = DecisionService::new(
        run,
        Arc::clone(&store),
        Arc::clone(&events),
        Arc::clone(&ledger),
        Arc::clone(&registry),
        track_records,
    );

    let learning = SelfLearningLoop::new(
        Arc::clone(&provider),
        Arc::clone(&pipeline),
        Arc::clone(&harness),
        Arc::clone(&ledger),
        Arc::clone(&registry),
        Arc::clone(&store),
        config.learning.clone(),
    )
    .with_event_sink(Arc::clone(&events));

    let upgrades = CapacityUpgradeManager::new(provider, pipeline, harness, ledger, registry, store)
        .with_params(config.upgrade.clone())
        .with_learning_params(config.learning.clone())
        .with_event_sink(events);

    Ok(Board {
        service,
        learning,
        upgrades,
        roles,
    })
}

/// Seed every role from its seed file, or bootstrap one from the templates
fn seed_corpora(
    ledger: &LearningLedger,
    registry: &AdapterFusionRegistry,
    provider: &HeuristicJudgmentProvider,
    file_config: &FileConfig,
) -> Result<()> {
    let seed_files: HashMap<RoleId, PathBuf> = file_config
        .roles
        .iter()
        .filter_map(|role| {
            let path = role.seed_corpus.clone()?;
            let id = role.id.parse::<RoleId>().ok()?;
            Some((id, path))
        })
        .collect();

    for role in registry.roles() {
        let Some(adapter) = registry.get(&role) else {
            continue;
        };
        let examples = match seed_files.get(&role) {
            Some(path) => load_seed_file(path)
                .with_context(|| format!("Failed to seed the original corpus of {}", role))?,
            None => bootstrap_seed(provider, &adapter, BOOTSTRAP_EXAMPLES),
        };
        let seeded = ledger
            .seed_original(&role, examples)
            .with_context(|| format!("Failed to seal the original corpus of {}", role))?;
        info!("Seeded {} original examples for {}", seeded.len(), role);
    }
    Ok(())
}

fn progress_for(output: &OutputConfig) -> Arc<dyn DecisionProgressNotifier> {
    if !output.show_progress {
        Arc::new(NoProgress)
    } else if output.format == OutputFormat::Full {
        Arc::new(SimpleProgress)
    } else {
        Arc::new(ProgressReporter::new())
    }
}

async fn decide(
    board: &Board,
    output: &OutputConfig,
    proposal: String,
    decision_type: DecisionType,
    roles: Vec<RoleId>,
    id: Option<String>,
) -> Result<()> {
    let roles = if roles.is_empty() {
        board.roles.clone()
    } else {
        roles
    };
    let id = id.unwrap_or_else(|| chrono::Utc::now().format("d-%Y%m%d-%H%M%S%3f").to_string());
    let request = DecisionRequest::new(DecisionId::new(id), decision_type, proposal, roles);

    let id = board
        .service
        .submit_with_progress(request, progress_for(output))?;
    match board.service.wait_for_outcome(&id).await? {
        DecisionStatus::Completed(outcome) => {
            let text = match output.format {
                OutputFormat::Full => ConsoleFormatter::format(&outcome),
                OutputFormat::Summary => ConsoleFormatter::format_summary(&outcome),
                OutputFormat::Json => ConsoleFormatter::format_json(&outcome),
            };
            println!("{}", text);
            Ok(())
        }
        DecisionStatus::Failed(reason) => bail!("Decision {} failed: {}", id, reason),
        DecisionStatus::Cancelled => bail!("Decision {} was cancelled", id),
        DecisionStatus::Pending => bail!("Decision {} did not settle", id),
    }
}

fn status(board: &Board, output: &OutputConfig, role: Option<RoleId>) -> Result<()> {
    let statuses = match role {
        Some(role) => vec![
            board
                .service
                .get_role_status(&role)
                .ok_or_else(|| anyhow!("{} is not on the board", role))?,
        ],
        None => board.service.role_statuses(),
    };

    if output.format == OutputFormat::Json {
        println!("{}", ConsoleFormatter::format_json(&statuses));
    } else {
        print!("{}", ConsoleFormatter::format_role_statuses(&statuses));
    }
    Ok(())
}

/// Put generated decisions to the board, then retrain on what they produced
async fn learn(
    board: &Board,
    output: &OutputConfig,
    rounds: usize,
    role: Option<RoleId>,
    decisions: usize,
    upgrade: bool,
) -> Result<()> {
    let roles = match role {
        Some(role) if board.roles.contains(&role) => vec![role],
        Some(role) => bail!("{} is not on the board", role),
        None => board.roles.clone(),
    };
    let json = output.format == OutputFormat::Json;
    let mut generator = SituationGenerator::new();

    for round in 1..=rounds {
        if !json {
            println!("Round {}/{}", round, rounds);
        }

        let situations = generator.generate(&DecisionType::ALL, decisions);
        let mut probes = Vec::with_capacity(situations.len());
        for situation in situations {
            probes.push(situation.situation_text());
            let request = DecisionRequest::new(
                DecisionId::new(format!("r{}-{}", round, situation.situation_id)),
                situation.decision_type,
                situation.text,
                board.roles.clone(),
            );
            let id = board.service.submit_decision(request)?;
            if let DecisionStatus::Failed(reason) = board.service.wait_for_outcome(&id).await? {
                warn!("Generated decision {} failed: {}", id, reason);
            }
        }

        for role in &roles {
            match board.learning.run_cycle(role).await {
                Ok(report) if json => println!("{}", ConsoleFormatter::format_json(&report)),
                Ok(report) => print!("{}", ConsoleFormatter::format_cycle_report(&report)),
                Err(e) if json => println!(
                    "{}",
                    ConsoleFormatter::format_json(&error_entry(role, &e.to_string()))
                ),
                Err(e) => print!("{}", ConsoleFormatter::format_cycle_error(role, &e)),
            }
        }

        if upgrade && let Some(report) = board.upgrades.check_and_upgrade(&probes).await {
            if json {
                println!("{}", ConsoleFormatter::format_json(&report));
            } else {
                print!("{}", ConsoleFormatter::format_upgrade_report(&report));
            }
        }
    }

    let statuses: Vec<_> = roles
        .iter()
        .filter_map(|role| board.service.get_role_status(role))
        .collect();
    if json {
        println!("{}", ConsoleFormatter::format_json(&statuses));
    } else {
        print!("{}", ConsoleFormatter::format_role_statuses(&statuses));
    }
    Ok(())
}

fn error_entry(role: &RoleId, error: &str) -> HashMap<&'static str, String> {
    HashMap::from([("role_id", role.to_string()), ("error", error.to_string())])
}
