use crate::controllers::{controller_fingerprint, create_controller};
use anyhow::{anyhow, Context, Result};
use flappy_core::sim::decide;
use flappy_core::{
    Controller, DeathCause, Evaluation, Harness, SensorVector, StopSignal, Termination,
    TickObserver,
};
use serde::Serialize;

#[derive(Clone, Debug, Serialize)]
pub struct RunMetrics {
    pub controller_id: String,
    pub controller_fingerprint: String,
    pub seed: u32,
    pub max_ticks: Option<u64>,
    pub ticks: u64,
    pub score: u32,
    pub fitness: f64,
    pub obstacles_passed: u32,
    pub death_cause: Option<DeathCause>,
    pub termination: Termination,
    pub final_rng_state: u32,
    pub jump_ticks: u64,
}

impl RunMetrics {
    /// The bird was still alive when the run ended.
    pub fn survived(&self) -> bool {
        self.death_cause.is_none()
    }
}

/// Counts the ticks on which the wrapped controller asked for a jump.
struct JumpCounter<C> {
    inner: C,
    threshold: f64,
    jumps: u64,
}

impl<C: Controller> Controller for JumpCounter<C> {
    fn activate(&mut self, inputs: &SensorVector) -> f64 {
        let output = self.inner.activate(inputs);
        if decide(output, self.threshold) {
            self.jumps += 1;
        }
        output
    }
}

pub fn run_controller(harness: &Harness, controller_id: &str, seed: u32) -> Result<RunMetrics> {
    run_controller_with(
        harness,
        controller_id,
        seed,
        &StopSignal::new(),
        &mut flappy_core::NoopObserver,
    )
}

/// Runs one bird driven by `controller_id` through a fresh track.
pub fn run_controller_with<O>(
    harness: &Harness,
    controller_id: &str,
    seed: u32,
    stop: &StopSignal,
    observer: &mut O,
) -> Result<RunMetrics>
where
    O: TickObserver + ?Sized,
{
    let config = harness.config();
    let controller = create_controller(controller_id, config)?;
    let fingerprint = controller_fingerprint(controller_id, config)
        .unwrap_or_else(|_| "unknown".to_string());

    let mut batch = [JumpCounter {
        inner: controller,
        threshold: config.jump_threshold,
        jumps: 0,
    }];
    let evaluation = harness.evaluate_with(&mut batch, seed, stop, observer);
    let [counter] = batch;

    metrics_from(controller_id, fingerprint, seed, harness, &evaluation, counter.jumps)
}

/// Like [`run_controller`], but fails on the first broken engine invariant.
pub fn run_controller_checked(
    harness: &Harness,
    controller_id: &str,
    seed: u32,
) -> Result<RunMetrics> {
    let config = harness.config();
    let controller = create_controller(controller_id, config)?;
    let fingerprint = controller_fingerprint(controller_id, config)
        .unwrap_or_else(|_| "unknown".to_string());

    let mut batch = [JumpCounter {
        inner: controller,
        threshold: config.jump_threshold,
        jumps: 0,
    }];
    let evaluation = harness
        .evaluate_checked(&mut batch, seed)
        .map_err(|violation| {
            anyhow!(
                "invariant {:?} broken at tick {}",
                violation.rule,
                violation.tick
            )
        })
        .with_context(|| format!("checked run failed for {controller_id} seed={seed:#x}"))?;
    let [counter] = batch;

    metrics_from(controller_id, fingerprint, seed, harness, &evaluation, counter.jumps)
}

fn metrics_from(
    controller_id: &str,
    controller_fingerprint: String,
    seed: u32,
    harness: &Harness,
    evaluation: &Evaluation,
    jump_ticks: u64,
) -> Result<RunMetrics> {
    let agent = evaluation
        .agents
        .first()
        .ok_or_else(|| anyhow!("evaluation returned no agents"))?;

    Ok(RunMetrics {
        controller_id: controller_id.to_string(),
        controller_fingerprint,
        seed,
        max_ticks: harness.config().max_ticks,
        ticks: evaluation.ticks,
        score: evaluation.score,
        fitness: agent.fitness,
        obstacles_passed: agent.obstacles_passed,
        death_cause: agent.death.map(|death| death.cause),
        termination: evaluation.termination,
        final_rng_state: evaluation.final_rng_state,
        jump_ticks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use flappy_core::SimConfig;

    fn harness(max_ticks: u64) -> Harness {
        Harness::new(SimConfig {
            max_ticks: Some(max_ticks),
            ..SimConfig::default()
        })
        .expect("valid config")
    }

    #[test]
    fn idle_run_never_jumps() {
        let metrics = run_controller(&harness(1_000), "idle", 1).expect("run");
        assert_eq!(metrics.jump_ticks, 0);
        assert_eq!(metrics.ticks, 23);
        assert_eq!(metrics.death_cause, Some(DeathCause::Ground));
        assert!(!metrics.survived());
    }

    #[test]
    fn flapper_jumps_and_is_counted() {
        let metrics = run_controller(&harness(1_000), "flapper", 1).expect("run");
        assert!(metrics.jump_ticks > 0);
        assert!(metrics.jump_ticks <= metrics.ticks);
    }

    #[test]
    fn checked_run_agrees_with_plain_run() {
        let harness = harness(800);
        let plain = run_controller(&harness, "gap-tracker", 77).expect("run");
        let checked = run_controller_checked(&harness, "gap-tracker", 77).expect("run");
        assert_eq!(plain.fitness, checked.fitness);
        assert_eq!(plain.ticks, checked.ticks);
        assert_eq!(plain.jump_ticks, checked.jump_ticks);
    }

    #[test]
    fn unknown_controller_is_an_error() {
        assert!(run_controller(&harness(10), "missing", 1).is_err());
    }
}
