use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use flappy_autopilot::benchmark::{resolve_controllers, run_benchmark, BenchmarkConfig, Objective};
use flappy_autopilot::controllers::{
    controller_manifest_entries, create_controller, describe_controllers,
};
use flappy_autopilot::evolve::{run_generations, EvolutionConfig};
use flappy_autopilot::runner::{run_controller, run_controller_checked, run_controller_with};
use flappy_autopilot::util::{
    load_sim_config, now_unix_s, parse_seed, parse_seed_csv, parse_seed_file, seed_sequence,
    seed_to_hex, write_json,
};
use flappy_core::{Harness, SimConfig, StopSignal, WorldSnapshot};
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

const DEFAULT_RUN_TICKS: u64 = 10_000;

#[derive(Parser, Debug)]
#[command(name = "flappy-autopilot")]
#[command(about = "Evaluation lab for flappy-bird controllers: runs, benchmarks, evolution")]
struct Cli {
    /// Simulation config JSON; missing fields fall back to defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List built-in controllers
    ListControllers,
    /// Export the controller manifest (including config fingerprints)
    ControllerManifest {
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Run one controller on one seed and print its metrics
    Run {
        /// Roster id or path to a network JSON file
        #[arg(long)]
        controller: String,
        #[arg(long)]
        seed: String,
        #[arg(long)]
        max_ticks: Option<u64>,
        /// Check engine invariants after every tick
        #[arg(long, default_value_t = false)]
        strict: bool,
    },
    /// Run multi-seed benchmark across one or more controllers
    Benchmark {
        #[arg(long)]
        controllers: Option<String>,
        #[arg(long)]
        seeds: Option<String>,
        #[arg(long)]
        seed_file: Option<PathBuf>,
        #[arg(long)]
        seed_start: Option<String>,
        #[arg(long, default_value_t = 12)]
        seed_count: u32,
        #[arg(long, default_value_t = 5_000)]
        max_ticks: u64,
        #[arg(long, value_enum, default_value_t = CliObjective::Fitness)]
        objective: CliObjective,
        #[arg(long)]
        out_dir: Option<PathBuf>,
        #[arg(long)]
        jobs: Option<usize>,
    },
    /// Random-search evolution of feed-forward controllers
    Evolve {
        /// Evolution config JSON; flags below override its fields
        #[arg(long)]
        evolution: Option<PathBuf>,
        #[arg(long)]
        population: Option<usize>,
        #[arg(long)]
        generations: Option<u32>,
        #[arg(long)]
        seed: Option<String>,
        #[arg(long)]
        hidden_units: Option<usize>,
        #[arg(long)]
        target_fitness: Option<f64>,
        #[arg(long, default_value_t = 5_000)]
        max_ticks: u64,
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Write one JSON world snapshot per tick for a single run
    Trace {
        #[arg(long)]
        controller: String,
        #[arg(long)]
        seed: String,
        #[arg(long, default_value_t = 2_000)]
        max_ticks: u64,
        /// JSON-lines output; stdout when omitted
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the effective simulation (or evolution) config as JSON
    PrintConfig {
        #[arg(long, default_value_t = false)]
        evolution: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliObjective {
    Fitness,
    Score,
    Survival,
}

impl From<CliObjective> for Objective {
    fn from(value: CliObjective) -> Self {
        match value {
            CliObjective::Fitness => Objective::Fitness,
            CliObjective::Score => Objective::Score,
            CliObjective::Survival => Objective::Survival,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(io::stderr)
        .init();

    let Cli { config, command } = Cli::parse();
    let sim = load_sim_config(config.as_deref())?;

    match command {
        Commands::ListControllers => {
            for (id, description) in describe_controllers() {
                println!("{id:16} {description}");
            }
        }
        Commands::ControllerManifest { output } => {
            let manifest = controller_manifest_entries(&sim);
            if let Some(path) = output {
                write_json(&path, &manifest)?;
                println!("wrote={}", path.display());
                println!("controllers={}", manifest.len());
            } else {
                println!("{}", serde_json::to_string_pretty(&manifest)?);
            }
        }
        Commands::Run {
            controller,
            seed,
            max_ticks,
            strict,
        } => {
            let seed = parse_seed(&seed)?;
            let harness = build_harness(with_budget(sim, max_ticks))?;
            let metrics = if strict {
                run_controller_checked(&harness, &controller, seed)?
            } else {
                run_controller(&harness, &controller, seed)?
            };

            println!("controller={}", metrics.controller_id);
            println!("controller_fingerprint={}", metrics.controller_fingerprint);
            println!("seed={}", seed_to_hex(seed));
            println!("ticks={}", metrics.ticks);
            println!("score={}", metrics.score);
            println!("fitness={:.3}", metrics.fitness);
            println!("jump_ticks={}", metrics.jump_ticks);
            println!(
                "death={}",
                metrics
                    .death_cause
                    .map(|cause| format!("{cause:?}").to_lowercase())
                    .unwrap_or_else(|| "none".to_string())
            );
            println!("termination={:?}", metrics.termination);
            println!("rng={:#010x}", metrics.final_rng_state);
        }
        Commands::Benchmark {
            controllers,
            seeds,
            seed_file,
            seed_start,
            seed_count,
            max_ticks,
            objective,
            out_dir,
            jobs,
        } => {
            let controllers = resolve_controllers(controllers.as_deref())?;
            let seeds = resolve_seeds(
                seeds.as_deref(),
                seed_file.as_deref(),
                seed_start.as_deref(),
                seed_count,
            )?;
            let objective: Objective = objective.into();
            let out_dir = out_dir.unwrap_or_else(|| {
                PathBuf::from(format!(
                    "benchmarks/{}-{}",
                    objective.as_str(),
                    now_unix_s()
                ))
            });

            let report = run_benchmark(BenchmarkConfig {
                controllers,
                seeds,
                sim: with_budget(sim, Some(max_ticks)),
                objective,
                out_dir: out_dir.clone(),
                jobs,
            })?;

            println!("objective={}", objective.as_str());
            println!("runs={}", report.run_count);
            println!(
                "jobs={}",
                report
                    .jobs
                    .map(|value| value.to_string())
                    .unwrap_or_else(|| "auto".to_string())
            );
            println!("out_dir={}", out_dir.display());
            println!("rankings:");
            for (idx, row) in report.rankings.iter().take(5).enumerate() {
                println!(
                    "  {}. {}  objective={:.2} avg_fitness={:.2} avg_score={:.1} avg_ticks={:.1} survival={:.0}%",
                    idx + 1,
                    row.controller_id,
                    row.objective_value,
                    row.avg_fitness,
                    row.avg_score,
                    row.avg_ticks,
                    row.survival_rate * 100.0,
                );
            }
        }
        Commands::Evolve {
            evolution,
            population,
            generations,
            seed,
            hidden_units,
            target_fitness,
            max_ticks,
            out_dir,
        } => {
            let mut config = load_evolution_config(evolution.as_deref())?;
            if let Some(value) = population {
                config.population_size = value;
            }
            if let Some(value) = generations {
                config.generations = value;
            }
            if let Some(value) = seed {
                config.seed = parse_seed(&value)?;
            }
            if let Some(value) = hidden_units {
                config.hidden_units = value;
            }
            if target_fitness.is_some() {
                config.target_fitness = target_fitness;
            }

            let harness = build_harness(with_budget(sim, Some(max_ticks)))?;
            let out_dir = out_dir
                .unwrap_or_else(|| PathBuf::from(format!("evolution/{}", now_unix_s())));
            let outcome = run_generations(&harness, &config, Some(&out_dir))?;

            println!("generations={}", outcome.reports.len());
            println!("population={}", config.population_size);
            println!("out_dir={}", out_dir.display());
            if let Some(champion) = &outcome.champion {
                println!("champion_generation={}", champion.generation);
                println!("champion_fitness={:.3}", champion.fitness);
                println!("champion_fingerprint={}", champion.network.fingerprint());
                println!("champion={}", out_dir.join("champion.json").display());
            }
        }
        Commands::Trace {
            controller,
            seed,
            max_ticks,
            output,
        } => {
            let seed = parse_seed(&seed)?;
            let harness = build_harness(with_budget(sim, Some(max_ticks)))?;
            create_controller(&controller, harness.config())?;

            let sink: Box<dyn Write> = match &output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        fs::create_dir_all(parent)?;
                    }
                    let file = fs::File::create(path)
                        .with_context(|| format!("failed creating {}", path.display()))?;
                    Box::new(BufWriter::new(file))
                }
                None => Box::new(BufWriter::new(io::stdout().lock())),
            };
            let ticks = write_trace(&harness, &controller, seed, sink)?;
            if let Some(path) = output {
                println!("ticks={ticks}");
                println!("output={}", path.display());
            }
        }
        Commands::PrintConfig { evolution } => {
            if evolution {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&EvolutionConfig::default())?
                );
            } else {
                println!("{}", serde_json::to_string_pretty(&sim)?);
            }
        }
    }

    Ok(())
}

fn build_harness(config: SimConfig) -> Result<Harness> {
    Harness::new(config).map_err(|err| anyhow!("invalid simulation config: {err}"))
}

/// An explicit flag wins; otherwise the config file's budget, then a default.
fn with_budget(mut config: SimConfig, max_ticks: Option<u64>) -> SimConfig {
    config.max_ticks = max_ticks
        .or(config.max_ticks)
        .or(Some(DEFAULT_RUN_TICKS));
    config
}

fn load_evolution_config(path: Option<&Path>) -> Result<EvolutionConfig> {
    match path {
        Some(path) => {
            let data = fs::read(path)
                .with_context(|| format!("failed reading evolution config {}", path.display()))?;
            serde_json::from_slice(&data)
                .with_context(|| format!("failed parsing evolution config {}", path.display()))
        }
        None => Ok(EvolutionConfig::default()),
    }
}

/// Streams one snapshot per tick as JSON lines. The first write error stops
/// the run and is returned.
fn write_trace(
    harness: &Harness,
    controller: &str,
    seed: u32,
    mut sink: Box<dyn Write>,
) -> Result<u64> {
    let stop = StopSignal::new();
    let remote = stop.clone();
    let mut failure: Option<anyhow::Error> = None;
    let mut observer = |snapshot: &WorldSnapshot| {
        if failure.is_some() {
            return;
        }
        let written = serde_json::to_writer(&mut sink, snapshot)
            .map_err(anyhow::Error::from)
            .and_then(|()| sink.write_all(b"\n").map_err(anyhow::Error::from));
        if let Err(err) = written {
            failure = Some(err);
            remote.request_stop();
        }
    };

    let metrics = run_controller_with(harness, controller, seed, &stop, &mut observer)?;
    if let Some(err) = failure {
        return Err(err.context("failed writing trace"));
    }
    sink.flush().context("failed flushing trace")?;
    Ok(metrics.ticks)
}

fn resolve_seeds(
    seeds: Option<&str>,
    seed_file: Option<&Path>,
    seed_start: Option<&str>,
    seed_count: u32,
) -> Result<Vec<u32>> {
    if let Some(path) = seed_file {
        return parse_seed_file(path);
    }

    if let Some(csv) = seeds {
        return parse_seed_csv(csv);
    }

    if seed_count == 0 {
        return Err(anyhow!("--seed-count must be >= 1"));
    }

    let start = if let Some(start) = seed_start {
        parse_seed(start)?
    } else {
        0xF1A9_0001
    };
    Ok(seed_sequence(start, seed_count))
}
