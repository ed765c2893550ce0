//! Deterministic flappy-bird simulation used to score batches of
//! controllers. A [`Harness`] runs one evaluation per call and reports a
//! fitness value per controller; optimizers live outside this crate.

pub mod config;
pub mod constants;
pub mod error;
pub mod harness;
pub mod rng;
pub mod silhouette;
pub mod sim;

pub use config::SimConfig;
pub use error::{ConfigError, ConfigField};
pub use harness::{AgentOutcome, Evaluation, Harness, NoopObserver, StopSignal, TickObserver};
pub use sim::{
    controller_fn, Controller, Death, DeathCause, FnController, InvariantRule,
    InvariantViolation, SensorVector, Termination, WorldSnapshot,
};
