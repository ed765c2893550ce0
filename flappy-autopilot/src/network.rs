use anyhow::{anyhow, Context, Result};
use flappy_core::constants::SENSOR_COUNT;
use flappy_core::rng::SeededRng;
use flappy_core::{Controller, SensorVector};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::util::fingerprint_json;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Neuron {
    pub weights: Vec<f64>,
    pub bias: f64,
}

impl Neuron {
    fn random(rng: &mut SeededRng, inputs: usize, scale: f64) -> Self {
        Self {
            weights: (0..inputs).map(|_| rng.next_symmetric(scale)).collect(),
            bias: rng.next_symmetric(scale),
        }
    }

    #[inline]
    fn fire(&self, inputs: &[f64]) -> f64 {
        let sum: f64 = self
            .weights
            .iter()
            .zip(inputs)
            .map(|(weight, input)| weight * input)
            .sum();
        (sum + self.bias).tanh()
    }
}

/// Sensors, one tanh hidden layer, one tanh output. With no hidden units the
/// output neuron reads the sensors directly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeedForward {
    pub hidden: Vec<Neuron>,
    pub output: Neuron,
}

impl FeedForward {
    pub fn random(rng: &mut SeededRng, hidden_units: usize, scale: f64) -> Self {
        let hidden: Vec<Neuron> = (0..hidden_units)
            .map(|_| Neuron::random(rng, SENSOR_COUNT, scale))
            .collect();
        let fan_in = if hidden_units == 0 {
            SENSOR_COUNT
        } else {
            hidden_units
        };
        Self {
            hidden,
            output: Neuron::random(rng, fan_in, scale),
        }
    }

    pub fn hidden_units(&self) -> usize {
        self.hidden.len()
    }

    pub fn validate(&self) -> Result<()> {
        for (index, neuron) in self.hidden.iter().enumerate() {
            if neuron.weights.len() != SENSOR_COUNT {
                return Err(anyhow!(
                    "hidden neuron {index} has {} weights, expected {SENSOR_COUNT}",
                    neuron.weights.len()
                ));
            }
        }
        let fan_in = if self.hidden.is_empty() {
            SENSOR_COUNT
        } else {
            self.hidden.len()
        };
        if self.output.weights.len() != fan_in {
            return Err(anyhow!(
                "output neuron has {} weights, expected {fan_in}",
                self.output.weights.len()
            ));
        }
        Ok(())
    }

    pub fn forward(&self, inputs: &SensorVector) -> f64 {
        if self.hidden.is_empty() {
            return self.output.fire(inputs);
        }
        let hidden: Vec<f64> = self.hidden.iter().map(|n| n.fire(inputs)).collect();
        self.output.fire(&hidden)
    }

    pub fn fingerprint(&self) -> String {
        match serde_json::to_value(self) {
            Ok(value) => fingerprint_json(&value),
            Err(_) => "unknown".to_string(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data =
            fs::read(path).with_context(|| format!("failed reading network {}", path.display()))?;
        let network: Self = serde_json::from_slice(&data)
            .with_context(|| format!("failed parsing network {}", path.display()))?;
        network
            .validate()
            .with_context(|| format!("malformed network {}", path.display()))?;
        Ok(network)
    }
}

impl Controller for FeedForward {
    fn activate(&mut self, inputs: &SensorVector) -> f64 {
        self.forward(inputs)
    }
}
