//! Command-line front end for the relationship dynamics engine
//!
//! Thin by design: all semantics live in `relationship-sim-core`. The
//! CLI loads an experiment configuration, selects which checkpoint to
//! resume from, feeds pre-extracted period inputs (or raw transcripts
//! classified by the local fallback) into the orchestrator, and prints
//! per-period summaries.
//!
//! Period inputs are read from `--inputs`: `period_N.json` files with
//! serialized `PeriodInputs`, or `period_N.txt` transcripts to run
//! through the keyword classifier.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tracing::{error, info, warn};

use relationship_sim_core::{
    ExperimentConfig, ExtractionRequest, KeywordClassifier, MetricKind, Orchestrator,
    PeriodInputs, Variant,
};

/// Command line arguments for the simulation
#[derive(Parser, Debug)]
#[command(name = "relationship-sim")]
#[command(about = "Deterministic relationship and resource dynamics simulator")]
struct Args {
    /// Experiment configuration file (JSON)
    #[arg(long, default_value = "experiment.json")]
    config: PathBuf,

    /// Directory holding checkpoints
    #[arg(long, default_value = "output/state")]
    state_dir: PathBuf,

    /// Directory receiving per-period result files
    #[arg(long, default_value = "output/results")]
    results_dir: PathBuf,

    /// Directory holding per-period input files
    #[arg(long, default_value = "input")]
    inputs: PathBuf,

    /// Run a single period instead of all remaining ones
    #[arg(long)]
    month: Option<u32>,

    /// Resume from the last completed checkpoint
    #[arg(long)]
    resume: bool,

    /// Behavioral variant to apply
    #[arg(long, value_enum, default_value_t = CliVariant::Base)]
    variant: CliVariant,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliVariant {
    Base,
    Altered,
}

impl From<CliVariant> for Variant {
    fn from(v: CliVariant) -> Self {
        match v {
            CliVariant::Base => Variant::Base,
            CliVariant::Altered => Variant::Altered,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut config: ExperimentConfig =
        serde_json::from_slice(&fs::read(&args.config)?)?;
    config.variant = args.variant.into();

    let mut orchestrator = if args.resume {
        Orchestrator::resume(&config, &args.state_dir)?
    } else {
        Orchestrator::resume_or_new(&config, &args.state_dir)?
    };

    let participants: Vec<String> = config.agents.iter().map(|a| a.id.clone()).collect();

    loop {
        if orchestrator.is_finished() {
            info!("all periods completed");
            break;
        }
        let period = orchestrator.state().next_period();
        if let Some(only) = args.month {
            if period != only {
                if period > only {
                    warn!(period = only, "already completed; nothing to do");
                    break;
                }
                return Err(format!(
                    "period {only} cannot run yet; next period is {period}"
                )
                .into());
            }
        }

        let Some(inputs) = load_period_inputs(&args.inputs, period, &participants)? else {
            info!(period, "no input file; stopping");
            break;
        };

        let result = orchestrator.complete_period(&inputs)?;
        info!(
            period = result.period,
            admitted = result.admitted_events,
            discarded = result.discarded_events,
            conflicts = result.conflicts_recorded,
            alliances = result.alliances_recorded,
            "period complete"
        );
        export_period_results(&args.results_dir, &orchestrator, &result)?;
        print_summary(&orchestrator, result.period);

        if args.month.is_some() {
            break;
        }
    }

    Ok(())
}

/// Load `period_N.json` (pre-extracted events) or classify
/// `period_N.txt` with the keyword fallback
fn load_period_inputs(
    dir: &Path,
    period: u32,
    participants: &[String],
) -> Result<Option<PeriodInputs>, Box<dyn std::error::Error>> {
    let json_path = dir.join(format!("period_{period}.json"));
    if json_path.is_file() {
        let inputs: PeriodInputs = serde_json::from_slice(&fs::read(&json_path)?)?;
        return Ok(Some(inputs));
    }

    let txt_path = dir.join(format!("period_{period}.txt"));
    if txt_path.is_file() {
        let transcript = fs::read_to_string(&txt_path)?;
        let request = ExtractionRequest {
            transcript: transcript.clone(),
            participants: participants.to_vec(),
            period,
        };
        let classifier = KeywordClassifier::new();
        let events = classifier.classify(&request);
        let mentions = KeywordClassifier::mention_counts(&transcript, participants);
        info!(
            period,
            events = events.len(),
            "classified transcript with keyword fallback"
        );
        return Ok(Some(PeriodInputs {
            period,
            events,
            mentions,
        }));
    }

    Ok(None)
}

/// Write one immutable result file per completed period
///
/// Files accumulate across periods and are never overwritten, so
/// external analysis tooling can consume the full history.
fn export_period_results(
    dir: &Path,
    orchestrator: &Orchestrator,
    result: &relationship_sim_core::PeriodResult,
) -> Result<(), Box<dyn std::error::Error>> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("period_{}.json", result.period));
    if path.exists() {
        warn!(path = %path.display(), "result file already present; keeping the original");
        return Ok(());
    }

    let state = orchestrator.state();
    let snapshots: Vec<_> = state
        .metrics()
        .rows()
        .iter()
        .filter(|s| s.period == result.period)
        .collect();
    let payload = serde_json::json!({
        "period": result.period,
        "summary": result,
        "snapshots": snapshots,
        "connection_strengths": result.connection_strengths,
        "shared_budget": state.resources().shared().budget(),
    });
    fs::write(&path, serde_json::to_vec_pretty(&payload)?)?;
    info!(path = %path.display(), "period results exported");
    Ok(())
}

fn print_summary(orchestrator: &Orchestrator, period: u32) {
    let state = orchestrator.state();
    println!("=== Period {period} ===");
    for (id, agent) in state.agents() {
        let r = agent.resources();
        println!(
            "  {id}: money={:.2} reputation={:.2} time={:.1}h",
            r.money(),
            r.reputation_points(),
            r.time_remaining()
        );
    }
    println!("  shared budget: {:.2}", state.resources().shared().budget());
    println!("  reputation leaderboard:");
    for (rank, (id, score)) in state
        .metrics()
        .leaderboard(MetricKind::ReputationScore, period)
        .iter()
        .enumerate()
    {
        println!("    {}. {id} ({score:.2})", rank + 1);
    }
}
