use serde::{Deserialize, Serialize};

pub mod bird;
pub mod collision;
pub mod sensors;
pub mod track;

mod engine;

pub(crate) use engine::Engine;

pub use bird::{Bird, Kinematics};
pub use collision::{overlaps, Silhouettes};
pub use sensors::{controller_fn, decide, sense, Controller, FnController, SensorVector};
pub use track::{Pipe, Track};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    Collision,
    Ground,
    Ceiling,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Death {
    pub tick: u64,
    pub cause: DeathCause,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Every bird died.
    Extinct,
    /// A [`crate::harness::StopSignal`] was observed at a tick boundary.
    Stopped,
    /// `SimConfig::max_ticks` was reached.
    TickBudget,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    Running,
    Terminated(Termination),
}

/// Per-agent fitness ledger, index-aligned with the live birds and their
/// controllers until the agent dies, then retired.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitnessAccumulator {
    pub agent: usize,
    pub fitness: f64,
    pub ticks_survived: u64,
    pub obstacles_passed: u32,
    pub death: Option<Death>,
}

impl FitnessAccumulator {
    pub fn new(agent: usize) -> Self {
        Self {
            agent,
            fitness: 0.0,
            ticks_survived: 0,
            obstacles_passed: 0,
            death: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvariantRule {
    CollectionLengths,
    TombstoneInLiveSet,
    AgentOrder,
    PipeOrder,
    TiltRange,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InvariantViolation {
    pub tick: u64,
    pub rule: InvariantRule,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct BirdSnapshot {
    pub agent: usize,
    pub x: f64,
    pub y: f64,
    pub tilt: f64,
    pub wing_frame: usize,
    pub fitness: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PipeSnapshot {
    pub x: f64,
    pub gap_center: i32,
    pub gap_top: i32,
    pub gap_bottom: i32,
    pub passed: bool,
}

/// Read-only view handed to renderers and tracers after every tick.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub score: u32,
    pub alive: usize,
    pub birds: Vec<BirdSnapshot>,
    pub pipes: Vec<PipeSnapshot>,
}

impl BirdSnapshot {
    pub(crate) fn capture(bird: &Bird, acc: &FitnessAccumulator) -> Self {
        Self {
            agent: acc.agent,
            x: bird.x(),
            y: bird.y(),
            tilt: bird.tilt(),
            wing_frame: bird.wing_frame().index(),
            fitness: acc.fitness,
        }
    }
}

impl PipeSnapshot {
    pub(crate) fn capture(pipe: &Pipe) -> Self {
        Self {
            x: pipe.x(),
            gap_center: pipe.gap_center(),
            gap_top: pipe.gap_top(),
            gap_bottom: pipe.gap_bottom(),
            passed: pipe.passed(),
        }
    }
}
