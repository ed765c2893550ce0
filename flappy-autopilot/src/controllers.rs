use anyhow::{anyhow, Result};
use flappy_core::{Controller, SensorVector, SimConfig};
use serde::Serialize;
use std::path::Path;

use crate::network::FeedForward;
use crate::util::fingerprint_json;

/// Hand-written policies shipped with the lab. Each reads only the sensor
/// vector, so they can be dropped into any evaluation next to networks.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Policy {
    /// Never jumps.
    Idle,
    /// Jumps whenever the bird's top edge drops below `altitude`.
    Altitude { altitude: f64 },
    /// Jumps whenever the bird's top edge is below the gap center plus
    /// `offset`, derived from the center and bottom distances.
    GapTracker { half_gap: f64, offset: f64 },
}

impl Controller for Policy {
    fn activate(&mut self, inputs: &SensorVector) -> f64 {
        let [y, to_center, to_bottom] = *inputs;
        let jump = match *self {
            Self::Idle => false,
            Self::Altitude { altitude } => y > altitude,
            Self::GapTracker { half_gap, offset } => {
                to_bottom + 1e-9 < to_center + half_gap - 2.0 * offset
            }
        };
        if jump {
            1.0
        } else {
            0.0
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct RosterEntry {
    id: &'static str,
    description: &'static str,
    build: fn(&SimConfig) -> Policy,
}

fn idle(_: &SimConfig) -> Policy {
    Policy::Idle
}

fn flapper(config: &SimConfig) -> Policy {
    Policy::Altitude {
        altitude: config.bird_start_y,
    }
}

fn gap_tracker(config: &SimConfig) -> Policy {
    Policy::GapTracker {
        half_gap: f64::from(config.pipe_gap / 2),
        offset: 0.0,
    }
}

fn gap_hugger(config: &SimConfig) -> Policy {
    Policy::GapTracker {
        half_gap: f64::from(config.pipe_gap / 2),
        offset: f64::from(config.pipe_gap / 4),
    }
}

const ROSTER: &[RosterEntry] = &[
    RosterEntry {
        id: "idle",
        description: "Never jumps; falls to the ground.",
        build: idle,
    },
    RosterEntry {
        id: "flapper",
        description: "Holds the starting altitude and ignores the pipes.",
        build: flapper,
    },
    RosterEntry {
        id: "gap-tracker",
        description: "Steers for the center of the upcoming gap.",
        build: gap_tracker,
    },
    RosterEntry {
        id: "gap-hugger",
        description: "Steers for a point below the gap center.",
        build: gap_hugger,
    },
];

fn roster() -> &'static [RosterEntry] {
    ROSTER
}

#[derive(Clone, Debug, Serialize)]
pub struct ControllerManifestEntry {
    pub id: String,
    pub family: String,
    pub description: String,
    pub config_hash: String,
    pub config: serde_json::Value,
}

pub fn controller_ids() -> Vec<&'static str> {
    roster().iter().map(|entry| entry.id).collect()
}

pub fn describe_controllers() -> Vec<(&'static str, &'static str)> {
    roster()
        .iter()
        .map(|entry| (entry.id, entry.description))
        .collect()
}

pub fn create_policy(id: &str, config: &SimConfig) -> Option<Policy> {
    roster()
        .iter()
        .find(|entry| entry.id == id)
        .map(|entry| (entry.build)(config))
}

/// Resolves a roster id, or a path to a saved network JSON file.
pub fn create_controller(id: &str, config: &SimConfig) -> Result<Box<dyn Controller>> {
    if let Some(policy) = create_policy(id, config) {
        return Ok(Box::new(policy));
    }
    let path = Path::new(id);
    if path.extension().is_some_and(|ext| ext == "json") {
        return Ok(Box::new(FeedForward::load(path)?));
    }
    let available = controller_ids().join(", ");
    Err(anyhow!(
        "unknown controller '{id}'. available: {available}, or a network .json path"
    ))
}

pub fn controller_manifest_entries(config: &SimConfig) -> Vec<ControllerManifestEntry> {
    roster()
        .iter()
        .map(|entry| {
            let config = serde_json::to_value((entry.build)(config))
                .unwrap_or(serde_json::Value::Null);
            ControllerManifestEntry {
                id: entry.id.to_string(),
                family: "policy".to_string(),
                description: entry.description.to_string(),
                config_hash: fingerprint_json(&config),
                config,
            }
        })
        .collect()
}

pub fn controller_fingerprint(id: &str, config: &SimConfig) -> Result<String> {
    if let Some(entry) = controller_manifest_entries(config)
        .into_iter()
        .find(|entry| entry.id == id)
    {
        return Ok(entry.config_hash);
    }
    Ok(FeedForward::load(Path::new(id))?.fingerprint())
}
