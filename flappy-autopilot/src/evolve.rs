//! Generational driver. Each generation asks the optimizer for a batch of
//! networks, evaluates the whole batch together on one seeded track, and
//! reports the fitness vector back.

use crate::network::FeedForward;
use crate::util::{now_unix_s, seed_sequence, write_json};
use anyhow::{anyhow, Result};
use flappy_core::rng::SeededRng;
use flappy_core::{Evaluation, Harness, StopSignal, Termination, WorldSnapshot};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    pub population_size: usize,
    pub generations: u32,
    pub seed: u32,
    pub hidden_units: usize,
    /// Initial weights and biases are drawn from `[-weight_scale, weight_scale)`.
    pub weight_scale: f64,
    /// Ends a generation early once any bird reaches this fitness.
    pub target_fitness: Option<f64>,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            generations: 50,
            seed: 0xF1A9_0001,
            hidden_units: 4,
            weight_scale: 1.0,
            target_fitness: None,
        }
    }
}

impl EvolutionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.population_size == 0 {
            return Err(anyhow!("population_size must be >= 1"));
        }
        if self.generations == 0 {
            return Err(anyhow!("generations must be >= 1"));
        }
        if !self.weight_scale.is_finite() || self.weight_scale <= 0.0 {
            return Err(anyhow!("weight_scale must be finite and > 0"));
        }
        if let Some(target) = self.target_fitness {
            if !target.is_finite() {
                return Err(anyhow!("target_fitness must be finite"));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Champion {
    pub network: FeedForward,
    pub fitness: f64,
    pub generation: u32,
}

/// Batch optimizer driven one generation at a time.
pub trait Optimizer {
    /// Candidates for the next evaluation.
    fn ask(&mut self) -> Vec<FeedForward>;
    /// Fitness for the batch last returned by `ask`, index-aligned.
    fn tell(&mut self, population: &[FeedForward], fitness: &[f64]);
    /// Best candidate seen so far.
    fn champion(&self) -> Option<&Champion>;
}

/// Samples every generation independently and keeps the best network ever
/// evaluated.
#[derive(Clone, Debug)]
pub struct RandomSearch {
    rng: SeededRng,
    population_size: usize,
    hidden_units: usize,
    weight_scale: f64,
    generation: u32,
    champion: Option<Champion>,
}

impl RandomSearch {
    pub fn new(config: &EvolutionConfig) -> Self {
        Self {
            rng: SeededRng::new(config.seed),
            population_size: config.population_size,
            hidden_units: config.hidden_units,
            weight_scale: config.weight_scale,
            generation: 0,
            champion: None,
        }
    }
}

impl Optimizer for RandomSearch {
    fn ask(&mut self) -> Vec<FeedForward> {
        (0..self.population_size)
            .map(|_| FeedForward::random(&mut self.rng, self.hidden_units, self.weight_scale))
            .collect()
    }

    fn tell(&mut self, population: &[FeedForward], fitness: &[f64]) {
        let best = population
            .iter()
            .zip(fitness)
            .filter(|(_, fitness)| fitness.is_finite())
            .fold(None::<(&FeedForward, f64)>, |best, (network, &fitness)| {
                match best {
                    Some((_, top)) if top >= fitness => best,
                    _ => Some((network, fitness)),
                }
            });

        if let Some((network, fitness)) = best {
            let improves = self
                .champion
                .as_ref()
                .map_or(true, |champion| fitness > champion.fitness);
            if improves {
                self.champion = Some(Champion {
                    network: network.clone(),
                    fitness,
                    generation: self.generation,
                });
            }
        }
        self.generation += 1;
    }

    fn champion(&self) -> Option<&Champion> {
        self.champion.as_ref()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationReport {
    pub generation: u32,
    pub seed: u32,
    pub population: usize,
    pub best_fitness: f64,
    pub mean_fitness: f64,
    pub score: u32,
    pub ticks: u64,
    pub termination: Termination,
    pub champion_fitness: f64,
    pub champion_fingerprint: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EvolutionOutcome {
    pub generated_unix_s: u64,
    pub config: EvolutionConfig,
    pub reports: Vec<GenerationReport>,
    pub champion: Option<Champion>,
}

/// Evaluates one generation: ask, run the batch on `seed`, tell.
pub fn run_generation<O: Optimizer>(
    harness: &Harness,
    optimizer: &mut O,
    generation: u32,
    seed: u32,
    target_fitness: Option<f64>,
) -> Result<GenerationReport> {
    let population = optimizer.ask();
    if population.is_empty() {
        return Err(anyhow!("optimizer returned an empty population"));
    }

    let mut batch = population.clone();
    let evaluation = evaluate_batch(harness, &mut batch, seed, target_fitness);
    optimizer.tell(&population, &evaluation.fitness);

    let best_fitness = evaluation.best().map_or(f64::NAN, |(_, fitness)| fitness);
    let mean_fitness =
        evaluation.fitness.iter().sum::<f64>() / evaluation.fitness.len() as f64;
    let (champion_fitness, champion_fingerprint) = optimizer
        .champion()
        .map(|champion| (champion.fitness, champion.network.fingerprint()))
        .unwrap_or((f64::NAN, "none".to_string()));

    Ok(GenerationReport {
        generation,
        seed,
        population: population.len(),
        best_fitness,
        mean_fitness,
        score: evaluation.score,
        ticks: evaluation.ticks,
        termination: evaluation.termination,
        champion_fitness,
        champion_fingerprint,
    })
}

fn evaluate_batch(
    harness: &Harness,
    batch: &mut [FeedForward],
    seed: u32,
    target_fitness: Option<f64>,
) -> Evaluation {
    let Some(target) = target_fitness else {
        return harness.evaluate(batch, seed);
    };
    let stop = StopSignal::new();
    let remote = stop.clone();
    let mut observer = |snapshot: &WorldSnapshot| {
        if snapshot.birds.iter().any(|bird| bird.fitness >= target) {
            remote.request_stop();
        }
    };
    harness.evaluate_with(batch, seed, &stop, &mut observer)
}

/// Runs `config.generations` generations of random search. When `out_dir`
/// is given, writes `generations.json` and `champion.json` there.
pub fn run_generations(
    harness: &Harness,
    config: &EvolutionConfig,
    out_dir: Option<&Path>,
) -> Result<EvolutionOutcome> {
    config.validate()?;
    if harness.config().max_ticks.is_none() && config.target_fitness.is_none() {
        return Err(anyhow!(
            "evolution needs max_ticks or target_fitness so a generation can end"
        ));
    }

    let mut optimizer = RandomSearch::new(config);
    let seeds = seed_sequence(config.seed, config.generations);
    let mut reports = Vec::with_capacity(seeds.len());

    for (generation, seed) in (0u32..).zip(seeds) {
        let report = run_generation(
            harness,
            &mut optimizer,
            generation,
            seed,
            config.target_fitness,
        )?;
        tracing::info!(
            generation,
            seed = %format!("{seed:#010x}"),
            best = report.best_fitness,
            mean = report.mean_fitness,
            score = report.score,
            champion = report.champion_fitness,
            "generation finished"
        );
        reports.push(report);
    }

    let outcome = EvolutionOutcome {
        generated_unix_s: now_unix_s(),
        config: config.clone(),
        reports,
        champion: optimizer.champion().cloned(),
    };

    if let Some(dir) = out_dir {
        write_json(&dir.join("generations.json"), &outcome)?;
        if let Some(champion) = &outcome.champion {
            write_json(&dir.join("champion.json"), &champion.network)?;
        }
    }

    Ok(outcome)
}
