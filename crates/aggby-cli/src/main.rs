//! aggby CLI: generate position datasets, run and compare aggregation modes.

use clap::{Args, Parser, Subcommand};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

use aggby_core::config::{AggConfig, ConfigOverrides};
use aggby_core::generate::PositionGenerator;
use aggby_core::mode::{AccumulationStyle, ExecMode};
use aggby_core::position::{Grouping, Position};
use aggby_exec::{plan_batches, Engine};
use aggby_io::{ManifestWriter, PositionCsvReader, PositionCsvWriter, StatsCsvWriter};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "aggby")]
#[command(about = "Grouped market-value aggregation in serial/parallel, eager/lazy modes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a random position dataset as CSV
    Generate {
        /// Number of positions (overrides config)
        #[arg(long)]
        size: Option<usize>,

        /// Random seed (overrides config)
        #[arg(long)]
        seed: Option<u64>,

        /// Output CSV path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Aggregate positions in one or more modes and verify them against serial-eager
    Run(RunArgs),

    /// Show how an input would be partitioned into batches
    Explain {
        /// Number of positions (overrides config)
        #[arg(long)]
        size: Option<usize>,

        /// Records per batch (overrides config)
        #[arg(long)]
        batch_size: Option<usize>,

        /// Worker threads (overrides config)
        #[arg(long)]
        threads: Option<usize>,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Position CSV to aggregate; positions are generated when absent
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Number of generated positions (overrides config)
    #[arg(long)]
    size: Option<usize>,

    /// Random seed for generation and per-iteration shuffles (overrides config)
    #[arg(long)]
    seed: Option<u64>,

    /// Grouping key: product, account, or category
    #[arg(long, default_value = "product")]
    grouping: Grouping,

    /// Comma-separated execution modes, or "all"
    #[arg(long, default_value = "all")]
    mode: String,

    /// Comma-separated accumulation styles (immutable, in-place, in-place-reduce), or "all"
    #[arg(long, default_value = "all")]
    style: String,

    /// Records per parallel batch (overrides config)
    #[arg(long)]
    batch_size: Option<usize>,

    /// Worker threads (overrides config)
    #[arg(long)]
    threads: Option<usize>,

    /// Repetitions; each one reshuffles the input and builds a fresh engine
    #[arg(long, default_value_t = 1)]
    iterations: usize,

    /// YAML file with config overrides
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write per-key statistics of the last iteration to this CSV
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Append one JSON manifest per run to this file
    #[arg(long)]
    manifest: Option<PathBuf>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Generate { size, seed, output } => generate_positions(size, seed, &output),
        Commands::Run(args) => run_aggregation(&args),
        Commands::Explain {
            size,
            batch_size,
            threads,
        } => explain_batches(size, batch_size, threads),
    };
    if let Err(e) = outcome {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn generate_positions(size: Option<usize>, seed: Option<u64>, output: &Path) -> CliResult<()> {
    let mut config = AggConfig::from_env();
    apply_cli_overrides(&mut config, None, None, size, seed);

    let mut generator = PositionGenerator::new(config.seed);
    let positions = generator.generate(config.dataset_size);
    PositionCsvWriter::to_path(output)?.write_all(&positions)?;

    println!("✓ Wrote {} positions to {}", positions.len(), output.display());
    println!("  Seed: {}", generator.seed());
    println!(
        "  Distinct: {} accounts, {} products, {} categories",
        generator.distinct_accounts(),
        generator.distinct_products(),
        generator.distinct_categories()
    );
    Ok(())
}

fn run_aggregation(args: &RunArgs) -> CliResult<()> {
    let mut config = AggConfig::from_env();
    if let Some(path) = &args.config {
        let doc = ConfigOverrides::from_yaml_str(&fs::read_to_string(path)?)?;
        config.apply(&doc);
    }
    apply_cli_overrides(&mut config, args.batch_size, args.threads, args.size, args.seed);
    config.validate()?;

    let modes = parse_modes(&args.mode)?;
    let styles = parse_styles(&args.style)?;

    let mut generator = PositionGenerator::new(config.seed);
    let mut positions = load_positions(args.input.as_deref(), &mut config, &mut generator)?;
    info!(
        "aggregating {} positions by {} (shuffle seed {})",
        positions.len(),
        args.grouping,
        generator.seed()
    );

    let mut manifests = args
        .manifest
        .as_ref()
        .map(ManifestWriter::append_to_path)
        .transpose()?;
    let mut stats_out = args.output.as_ref().map(StatsCsvWriter::to_path).transpose()?;

    for iteration in 0..args.iterations.max(1) {
        generator.shuffle(&mut positions);
        let engine = Engine::new(config.clone())?;
        debug!("iteration {}: {} workers", iteration, engine.workers());

        for &style in &styles {
            let reports = engine.compare_modes(&positions, args.grouping, style, &modes)?;
            for report in &reports {
                let m = &report.outcome.manifest;
                println!(
                    "{:>3} {:<15} {:<10} groups={:<7} batches={:<5} {:>6}ms {}",
                    iteration,
                    m.mode.as_str(),
                    m.style.as_str(),
                    m.groups,
                    m.batches,
                    m.duration_ms(),
                    if report.identical_to_baseline {
                        "identical"
                    } else {
                        "within tolerance"
                    }
                );
                if let Some(w) = manifests.as_mut() {
                    w.write(m)?;
                }
                if iteration + 1 == args.iterations.max(1) {
                    if let Some(w) = stats_out.as_mut() {
                        w.write_result(m.mode, m.style, m.grouping, &report.outcome.result)?;
                    }
                }
            }
        }

        engine.shutdown()?;
    }

    println!("✓ All modes agree with serial-eager");
    Ok(())
}

/// Read `input`, or generate `dataset_size` positions. Only a generated
/// dataset records its seed in `config`, and so in every run manifest.
fn load_positions(
    input: Option<&Path>,
    config: &mut AggConfig,
    generator: &mut PositionGenerator,
) -> CliResult<Vec<Position>> {
    match input {
        Some(path) => Ok(PositionCsvReader::from_path(path)?.read_all()?),
        None => {
            config.seed = Some(generator.seed());
            Ok(generator.generate(config.dataset_size))
        }
    }
}

fn explain_batches(
    size: Option<usize>,
    batch_size: Option<usize>,
    threads: Option<usize>,
) -> CliResult<()> {
    let mut config = AggConfig::from_env();
    apply_cli_overrides(&mut config, batch_size, threads, size, None);
    config.validate()?;

    let engine = Engine::new(config.clone())?;
    let records = config.dataset_size;
    let plan = plan_batches(records, engine.batch_size_for(records));

    println!("Batch Plan");
    println!("==========");
    println!();
    println!("Records: {}", records);
    println!("Workers: {}", engine.workers());
    println!(
        "Batch Size: {} records{}",
        plan.batch_size,
        if config.batch_size.is_some() {
            ""
        } else {
            " (derived)"
        }
    );
    println!("Total Batches: {}", plan.len());
    println!(
        "Batches per Worker: {:.2}",
        plan.len() as f64 / engine.workers() as f64
    );
    println!();
    println!("Batches:");
    const SHOWN: usize = 8;
    for batch in plan.batches.iter().take(SHOWN) {
        println!(
            "  {} rows {}..{} ({} records)",
            batch.id,
            batch.range.start,
            batch.range.end,
            batch.len()
        );
    }
    if plan.len() > SHOWN {
        println!("  ... {} more", plan.len() - SHOWN);
    }

    engine.shutdown()?;
    Ok(())
}

fn apply_cli_overrides(
    cfg: &mut AggConfig,
    batch_size: Option<usize>,
    threads: Option<usize>,
    size: Option<usize>,
    seed: Option<u64>,
) {
    if let Some(b) = batch_size {
        cfg.batch_size = Some(b);
    }
    if let Some(t) = threads {
        cfg.parallelism = Some(t);
    }
    if let Some(n) = size {
        cfg.dataset_size = n;
    }
    if let Some(s) = seed {
        cfg.seed = Some(s);
    }
}

fn parse_modes(arg: &str) -> Result<Vec<ExecMode>, aggby_core::error::Error> {
    if arg.trim().eq_ignore_ascii_case("all") {
        return Ok(ExecMode::ALL.to_vec());
    }
    arg.split(',').map(str::parse).collect()
}

fn parse_styles(arg: &str) -> Result<Vec<AccumulationStyle>, aggby_core::error::Error> {
    if arg.trim().eq_ignore_ascii_case("all") {
        return Ok(AccumulationStyle::ALL.to_vec());
    }
    arg.split(',').map(str::parse).collect()
}
