//! Command-line driver: read an input file, evaluate it, optionally apply
//! a stream of edits, write the result, and optionally diff-test against
//! the reference oracle.
//!
//! Timing that would have been printed by a destructor on scope exit is
//! instead captured as `tracing` spans, since Rust doesn't want printing
//! destructors, and the verify pass compares both outputs as in-memory
//! value lists rather than diffing written files, since both already
//! live in this process.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;

use cellengine_common::EngineError;
use cellengine_core::{new_parallel_evaluator, EngineConfig, Evaluator, ReferenceEvaluator};

#[derive(Parser, Debug)]
#[command(name = "cellengine", about = "Evaluates a sheet of additive cell formulas")]
struct Cli {
    /// Input file: one cell per line, `name = addend (+ addend)*`.
    input: PathBuf,

    /// Where to write the `name = value` results.
    output: PathBuf,

    /// Optional edit-stream file: one formula change per line, applied in
    /// order after the initial evaluation.
    #[arg(long)]
    edits: Option<PathBuf>,

    /// Which evaluator to run.
    #[arg(long, value_enum, default_value_t = EngineKind::Parallel)]
    engine: EngineKind,

    /// Worker thread count for the parallel evaluator. Defaults to the
    /// number of available hardware threads.
    #[arg(long)]
    threads: Option<usize>,

    /// Also run the reference oracle on the same inputs and edits, and
    /// fail if the two evaluators disagree.
    #[arg(long)]
    verify: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum EngineKind {
    Parallel,
    Reference,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::from(0),
        Err(err) => {
            eprintln!("error: {err:#}");
            if err.downcast_ref::<EngineError>().is_some_and(|e| matches!(e, EngineError::Cycle { .. })) {
                ExitCode::from(2)
            } else {
                ExitCode::from(1)
            }
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let started = Instant::now();
    let text = std::fs::read_to_string(&cli.input)
        .with_context(|| format!("reading input file {}", cli.input.display()))?;
    info!(elapsed_ms = started.elapsed().as_millis() as u64, "read input file");

    let started = Instant::now();
    let (inputs, table) = cellengine_text::parse(&text)?;
    info!(elapsed_ms = started.elapsed().as_millis() as u64, cells = inputs.len(), "parsed input");

    let edit_text = cli
        .edits
        .as_ref()
        .map(|path| std::fs::read_to_string(path).with_context(|| format!("reading edit file {}", path.display())))
        .transpose()?;
    let edits = edit_text
        .as_deref()
        .map(|text| cellengine_text::parse_edits(text, &table))
        .transpose()?
        .unwrap_or_default();

    let config = EngineConfig {
        worker_threads: cli.threads.unwrap_or_else(|| EngineConfig::default().worker_threads),
        ..EngineConfig::default()
    };

    let values = match cli.engine {
        EngineKind::Parallel => {
            let mut evaluator = new_parallel_evaluator(config);
            evaluate(&mut evaluator, &inputs, &edits)?
        }
        EngineKind::Reference => {
            let mut evaluator = ReferenceEvaluator::new();
            evaluate(&mut evaluator, &inputs, &edits)?
        }
    };

    if cli.verify {
        let mut oracle = ReferenceEvaluator::new();
        let oracle_values = evaluate(&mut oracle, &inputs, &edits)?;
        if values != oracle_values {
            anyhow::bail!("evaluator output disagrees with the reference oracle");
        }
        info!("verified against reference oracle");
    }

    let rendered = cellengine_text::write(values);
    std::fs::write(&cli.output, rendered)
        .with_context(|| format!("writing output file {}", cli.output.display()))?;

    Ok(())
}

fn evaluate(
    evaluator: &mut dyn Evaluator,
    inputs: &[(cellengine_common::CellName, cellengine_common::Formula)],
    edits: &[(cellengine_common::CellId, cellengine_common::Formula)],
) -> Result<Vec<(cellengine_common::CellName, i32)>, EngineError> {
    evaluator.initial_calculate(inputs)?;
    for (cell, formula) in edits {
        evaluator.change_cell(*cell, formula.clone())?;
    }
    Ok(evaluator.get_current_values())
}
