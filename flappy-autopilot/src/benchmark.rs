use crate::controllers::controller_ids;
use crate::runner::{run_controller, RunMetrics};
use crate::util::{now_unix_s, seed_to_hex, write_json};
use anyhow::{anyhow, Context, Result};
use flappy_core::{Harness, SimConfig};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    Fitness,
    Score,
    Survival,
}

impl Objective {
    pub fn run_value(self, metrics: &RunMetrics) -> f64 {
        match self {
            Self::Fitness => metrics.fitness,
            Self::Score => metrics.score as f64 + metrics.ticks as f64 * 0.001,
            Self::Survival => metrics.ticks as f64 + metrics.score as f64 * 0.01,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fitness => "fitness",
            Self::Score => "score",
            Self::Survival => "survival",
        }
    }
}

#[derive(Clone, Debug)]
pub struct BenchmarkConfig {
    pub controllers: Vec<String>,
    pub seeds: Vec<u32>,
    pub sim: SimConfig,
    pub objective: Objective,
    pub out_dir: PathBuf,
    pub jobs: Option<usize>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunRecord {
    pub controller_id: String,
    pub controller_fingerprint: String,
    pub seed: u32,
    pub seed_hex: String,
    pub ticks: u64,
    pub score: u32,
    pub fitness: f64,
    pub survived: bool,
    pub death_cause: String,
    pub objective_value: f64,
    pub jump_ticks: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ControllerAggregate {
    pub controller_id: String,
    pub controller_fingerprint: String,
    pub runs: usize,
    pub avg_fitness: f64,
    pub max_fitness: f64,
    pub avg_score: f64,
    pub max_score: u32,
    pub avg_ticks: f64,
    pub max_ticks: u64,
    pub survival_rate: f64,
    pub objective_value: f64,
    pub avg_jump_ticks: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub generated_unix_s: u64,
    pub objective: Objective,
    pub max_ticks: Option<u64>,
    pub jobs: Option<usize>,
    pub controllers: Vec<String>,
    pub seeds: Vec<u32>,
    pub run_count: usize,
    pub rankings: Vec<ControllerAggregate>,
    pub runs: Vec<RunRecord>,
}

pub fn resolve_controllers(input: Option<&str>) -> Result<Vec<String>> {
    match input {
        None => Ok(controller_ids()
            .iter()
            .map(|id| (*id).to_string())
            .collect()),
        Some(raw) => {
            let mut controllers = Vec::new();
            for token in raw.split(',') {
                let token = token.trim();
                if token.is_empty() {
                    continue;
                }
                controllers.push(token.to_string());
            }
            if controllers.is_empty() {
                return Err(anyhow!("--controllers resolved to empty list"));
            }
            Ok(controllers)
        }
    }
}

pub fn run_benchmark(config: BenchmarkConfig) -> Result<BenchmarkReport> {
    if config.seeds.is_empty() {
        return Err(anyhow!("benchmark requires at least one seed"));
    }
    if config.controllers.is_empty() {
        return Err(anyhow!("benchmark requires at least one controller"));
    }
    if config.sim.max_ticks.is_none() {
        return Err(anyhow!(
            "benchmark requires a tick budget; a perfect controller never dies"
        ));
    }
    if let Some(jobs) = config.jobs {
        if jobs == 0 {
            return Err(anyhow!("benchmark --jobs must be >= 1 when provided"));
        }
    }

    let harness = Harness::new(config.sim.clone())
        .map_err(|err| anyhow!("invalid simulation config: {err}"))?;
    fs::create_dir_all(&config.out_dir)
        .with_context(|| format!("failed creating {}", config.out_dir.display()))?;

    let run_jobs: Vec<(String, u32)> = config
        .controllers
        .iter()
        .flat_map(|id| config.seeds.iter().map(move |seed| (id.clone(), *seed)))
        .collect();

    tracing::info!(
        runs = run_jobs.len(),
        objective = config.objective.as_str(),
        "benchmark starting"
    );

    let run_one = |(controller_id, seed): &(String, u32)| -> Result<(RunMetrics, f64)> {
        let metrics = run_controller(&harness, controller_id, *seed).with_context(|| {
            format!("benchmark run failed for controller={controller_id} seed={seed:#x}")
        })?;
        let objective_value = config.objective.run_value(&metrics);
        Ok((metrics, objective_value))
    };

    let run_results: Vec<Result<(RunMetrics, f64)>> = if let Some(jobs) = config.jobs {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .context("failed to build rayon threadpool")?;
        pool.install(|| run_jobs.par_iter().map(run_one).collect())
    } else {
        run_jobs.par_iter().map(run_one).collect()
    };

    let mut runs = Vec::with_capacity(run_results.len());
    for result in run_results {
        runs.push(result?);
    }

    let rankings = rank_controllers(&runs);

    let mut run_records: Vec<RunRecord> = runs
        .iter()
        .map(|(metrics, objective_value)| RunRecord {
            controller_id: metrics.controller_id.clone(),
            controller_fingerprint: metrics.controller_fingerprint.clone(),
            seed: metrics.seed,
            seed_hex: seed_to_hex(metrics.seed),
            ticks: metrics.ticks,
            score: metrics.score,
            fitness: metrics.fitness,
            survived: metrics.survived(),
            death_cause: metrics
                .death_cause
                .map(|cause| format!("{cause:?}").to_lowercase())
                .unwrap_or_else(|| "none".to_string()),
            objective_value: *objective_value,
            jump_ticks: metrics.jump_ticks,
        })
        .collect();

    run_records.sort_by(|a, b| {
        b.objective_value
            .total_cmp(&a.objective_value)
            .then_with(|| b.score.cmp(&a.score))
            .then_with(|| b.ticks.cmp(&a.ticks))
    });

    write_runs_csv(&config.out_dir.join("runs.csv"), &run_records)?;
    write_rankings_csv(&config.out_dir.join("rankings.csv"), &rankings)?;

    let report = BenchmarkReport {
        generated_unix_s: now_unix_s(),
        objective: config.objective,
        max_ticks: config.sim.max_ticks,
        jobs: config.jobs,
        controllers: config.controllers,
        seeds: config.seeds,
        run_count: run_records.len(),
        rankings,
        runs: run_records,
    };

    write_json(&config.out_dir.join("summary.json"), &report)?;
    if let Some(top) = report.rankings.first() {
        tracing::info!(
            leader = %top.controller_id,
            objective_value = top.objective_value,
            "benchmark finished"
        );
    }

    Ok(report)
}

fn rank_controllers(runs: &[(RunMetrics, f64)]) -> Vec<ControllerAggregate> {
    let mut grouped: HashMap<&str, Vec<&(RunMetrics, f64)>> = HashMap::new();
    for run in runs {
        grouped
            .entry(run.0.controller_id.as_str())
            .or_default()
            .push(run);
    }

    let mut rankings = Vec::with_capacity(grouped.len());
    for (controller_id, group) in grouped {
        let count = group.len() as f64;
        let controller_fingerprint = group
            .first()
            .map(|(metrics, _)| metrics.controller_fingerprint.clone())
            .unwrap_or_else(|| "unknown".to_string());
        let sum_fitness: f64 = group.iter().map(|(m, _)| m.fitness).sum();
        let max_fitness = group
            .iter()
            .map(|(m, _)| m.fitness)
            .fold(f64::NEG_INFINITY, f64::max);
        let sum_score: u64 = group.iter().map(|(m, _)| m.score as u64).sum();
        let max_score = group.iter().map(|(m, _)| m.score).max().unwrap_or_default();
        let sum_ticks: u64 = group.iter().map(|(m, _)| m.ticks).sum();
        let max_ticks = group.iter().map(|(m, _)| m.ticks).max().unwrap_or_default();
        let survived = group.iter().filter(|(m, _)| m.survived()).count();
        let sum_jumps: u64 = group.iter().map(|(m, _)| m.jump_ticks).sum();
        let objective_value = group.iter().map(|(_, value)| value).sum::<f64>() / count;

        rankings.push(ControllerAggregate {
            controller_id: controller_id.to_string(),
            controller_fingerprint,
            runs: group.len(),
            avg_fitness: sum_fitness / count,
            max_fitness,
            avg_score: sum_score as f64 / count,
            max_score,
            avg_ticks: sum_ticks as f64 / count,
            max_ticks,
            survival_rate: survived as f64 / count,
            objective_value,
            avg_jump_ticks: sum_jumps as f64 / count,
        });
    }

    rankings.sort_by(|a, b| {
        b.objective_value
            .total_cmp(&a.objective_value)
            .then_with(|| b.avg_score.total_cmp(&a.avg_score))
            .then_with(|| b.avg_ticks.total_cmp(&a.avg_ticks))
            .then_with(|| a.controller_id.cmp(&b.controller_id))
    });
    rankings
}

fn write_runs_csv(path: &Path, rows: &[RunRecord]) -> Result<()> {
    let mut csv = String::from(
        "controller_id,controller_fingerprint,seed_hex,seed,ticks,score,fitness,survived,death_cause,objective_value,jump_ticks\n",
    );
    for row in rows {
        csv.push_str(&format!(
            "{},{},{},{},{},{},{:.4},{},{},{:.4},{}\n",
            row.controller_id,
            row.controller_fingerprint,
            row.seed_hex,
            row.seed,
            row.ticks,
            row.score,
            row.fitness,
            row.survived,
            row.death_cause,
            row.objective_value,
            row.jump_ticks
        ));
    }
    fs::write(path, csv).with_context(|| format!("failed writing {}", path.display()))
}

fn write_rankings_csv(path: &Path, rows: &[ControllerAggregate]) -> Result<()> {
    let mut csv = String::from(
        "rank,controller_id,controller_fingerprint,runs,avg_fitness,max_fitness,avg_score,max_score,avg_ticks,max_ticks,survival_rate,objective_value,avg_jump_ticks\n",
    );
    for (idx, row) in rows.iter().enumerate() {
        csv.push_str(&format!(
            "{},{},{},{},{:.4},{:.4},{:.2},{},{:.2},{},{:.4},{:.4},{:.2}\n",
            idx + 1,
            row.controller_id,
            row.controller_fingerprint,
            row.runs,
            row.avg_fitness,
            row.max_fitness,
            row.avg_score,
            row.max_score,
            row.avg_ticks,
            row.max_ticks,
            row.survival_rate,
            row.objective_value,
            row.avg_jump_ticks
        ));
    }
    fs::write(path, csv).with_context(|| format!("failed writing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_default_and_explicit_controllers() {
        assert_eq!(
            resolve_controllers(None).expect("defaults").len(),
            controller_ids().len()
        );
        assert_eq!(
            resolve_controllers(Some("idle, gap-tracker,")).expect("csv"),
            vec!["idle".to_string(), "gap-tracker".to_string()]
        );
        assert!(resolve_controllers(Some(" , ")).is_err());
    }

    #[test]
    fn rejects_open_ended_runs_and_zero_jobs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let base = BenchmarkConfig {
            controllers: vec!["idle".to_string()],
            seeds: vec![1],
            sim: SimConfig::default(),
            objective: Objective::Fitness,
            out_dir: dir.path().to_path_buf(),
            jobs: None,
        };
        assert!(run_benchmark(base.clone()).is_err());

        let zero_jobs = BenchmarkConfig {
            sim: SimConfig {
                max_ticks: Some(100),
                ..SimConfig::default()
            },
            jobs: Some(0),
            ..base
        };
        assert!(run_benchmark(zero_jobs).is_err());
    }
}
