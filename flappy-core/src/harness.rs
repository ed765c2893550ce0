use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::config::SimConfig;
use crate::error::ConfigError;
use crate::sim::{
    Controller, Death, Engine, EngineState, FitnessAccumulator, InvariantViolation, Silhouettes,
    Termination, WorldSnapshot,
};

/// Cooperative cancellation shared between an evaluation and whoever wants
/// to end it early. Polled once per tick boundary.
#[derive(Clone, Debug, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Receives a read-only view of the world after every tick.
pub trait TickObserver {
    fn observe(&mut self, snapshot: &WorldSnapshot);

    /// Observers that return `false` are never handed a snapshot, so the
    /// engine skips building one.
    fn wants_snapshots(&self) -> bool {
        true
    }
}

impl<F> TickObserver for F
where
    F: FnMut(&WorldSnapshot),
{
    fn observe(&mut self, snapshot: &WorldSnapshot) {
        self(snapshot)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl TickObserver for NoopObserver {
    fn observe(&mut self, _snapshot: &WorldSnapshot) {}

    fn wants_snapshots(&self) -> bool {
        false
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct AgentOutcome {
    pub fitness: f64,
    pub ticks_survived: u64,
    pub obstacles_passed: u32,
    pub death: Option<Death>,
}

impl From<FitnessAccumulator> for AgentOutcome {
    fn from(acc: FitnessAccumulator) -> Self {
        Self {
            fitness: acc.fitness,
            ticks_survived: acc.ticks_survived,
            obstacles_passed: acc.obstacles_passed,
            death: acc.death,
        }
    }
}

/// Result of one evaluation. `fitness[i]` and `agents[i]` belong to the
/// controller passed at index `i`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Evaluation {
    pub fitness: Vec<f64>,
    pub agents: Vec<AgentOutcome>,
    pub score: u32,
    pub ticks: u64,
    pub termination: Termination,
    pub final_rng_state: u32,
}

impl Evaluation {
    /// Index and fitness of the best agent. Ties go to the lower index.
    pub fn best(&self) -> Option<(usize, f64)> {
        self.fitness
            .iter()
            .copied()
            .enumerate()
            .fold(None, |best, (index, fitness)| match best {
                Some((_, top)) if top >= fitness => best,
                _ => Some((index, fitness)),
            })
    }
}

/// Validated configuration plus the collision shapes derived from it.
/// Cheap to share across threads; each evaluation builds its own engine.
#[derive(Clone, Debug)]
pub struct Harness {
    config: SimConfig,
    silhouettes: Silhouettes,
}

impl Harness {
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let silhouettes = Silhouettes::from_config(&config);
        Ok(Self {
            config,
            silhouettes,
        })
    }

    #[inline]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    #[inline]
    pub fn silhouettes(&self) -> &Silhouettes {
        &self.silhouettes
    }

    pub fn evaluate<C: Controller>(&self, controllers: &mut [C], seed: u32) -> Evaluation {
        self.evaluate_with(controllers, seed, &StopSignal::new(), &mut NoopObserver)
    }

    pub fn evaluate_with<C, O>(
        &self,
        controllers: &mut [C],
        seed: u32,
        stop: &StopSignal,
        observer: &mut O,
    ) -> Evaluation
    where
        C: Controller,
        O: TickObserver + ?Sized,
    {
        match self.drive(controllers, seed, stop, observer, |_| Ok::<(), Infallible>(())) {
            Ok(evaluation) => evaluation,
            Err(never) => match never {},
        }
    }

    /// Like [`Harness::evaluate`], but checks the engine invariants after
    /// every tick and stops at the first violation.
    pub fn evaluate_checked<C: Controller>(
        &self,
        controllers: &mut [C],
        seed: u32,
    ) -> Result<Evaluation, InvariantViolation> {
        self.drive(
            controllers,
            seed,
            &StopSignal::new(),
            &mut NoopObserver,
            |engine| {
                engine
                    .validate_invariants()
                    .map_err(|rule| InvariantViolation {
                        tick: engine.tick_count(),
                        rule,
                    })
            },
        )
    }

    pub fn fitness_of<C: Controller>(&self, controllers: &mut [C], seed: u32) -> Vec<f64> {
        self.evaluate(controllers, seed).fitness
    }

    fn drive<C, O, E>(
        &self,
        controllers: &mut [C],
        seed: u32,
        stop: &StopSignal,
        observer: &mut O,
        mut after_tick: impl FnMut(&Engine<'_, C>) -> Result<(), E>,
    ) -> Result<Evaluation, E>
    where
        C: Controller,
        O: TickObserver + ?Sized,
    {
        let mut engine = Engine::new(&self.config, &self.silhouettes, controllers, seed);
        let observing = observer.wants_snapshots();

        let termination = loop {
            if stop.is_requested() {
                engine.terminate(Termination::Stopped);
            }
            if let EngineState::Terminated(reason) = engine.state() {
                break reason;
            }
            engine.step();
            after_tick(&engine)?;
            if observing {
                observer.observe(&engine.snapshot());
            }
        };

        let ticks = engine.tick_count();
        let score = engine.track().score();
        let final_rng_state = engine.track().rng_state();
        let agents: Vec<AgentOutcome> = engine
            .finish()
            .into_iter()
            .map(AgentOutcome::from)
            .collect();
        let fitness = agents.iter().map(|agent| agent.fitness).collect();

        tracing::debug!(
            seed,
            ticks,
            score,
            agents = agents.len(),
            ?termination,
            "evaluation finished"
        );

        Ok(Evaluation {
            fitness,
            agents,
            score,
            ticks,
            termination,
            final_rng_state,
        })
    }
}
