use serde::{Deserialize, Serialize};

use crate::constants::{
    BIRD_HEIGHT, BIRD_START_X, BIRD_START_Y, BIRD_WIDTH, COLLISION_PENALTY, FIRST_PIPE_X,
    GAP_CENTER_MAX, GAP_CENTER_MIN, GRAVITY, GROUND_Y, JUMP_THRESHOLD, JUMP_VELOCITY,
    MAX_FALL_PER_TICK, MAX_SILHOUETTE_WIDTH, MAX_TILT_DEG, MIN_TILT_DEG, PASS_BONUS, PIPE_GAP,
    PIPE_HEIGHT, PIPE_SCROLL_SPEED, PIPE_WIDTH, RISE_BOOST, SPAWN_PIPE_X, SURVIVAL_BONUS,
    TILT_HOLD_BAND, TILT_STEP_DEG,
};
use crate::error::{ConfigError, ConfigField};

/// Every constant the simulation reads. Fixed for the lifetime of a
/// [`crate::harness::Harness`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub ground_y: f64,
    pub bird_start_x: f64,
    pub bird_start_y: f64,
    pub bird_width: u32,
    pub bird_height: u32,
    pub gravity: f64,
    pub jump_velocity: f64,
    pub max_fall_per_tick: f64,
    pub rise_boost: f64,
    pub tilt_hold_band: f64,
    pub max_tilt_deg: f64,
    pub min_tilt_deg: f64,
    pub tilt_step_deg: f64,
    pub pipe_width: u32,
    pub pipe_height: u32,
    pub pipe_gap: i32,
    pub scroll_speed: f64,
    pub gap_center_min: i32,
    pub gap_center_max: i32,
    pub first_pipe_x: f64,
    pub spawn_pipe_x: f64,
    pub survival_bonus: f64,
    pub pass_bonus: f64,
    pub collision_penalty: f64,
    pub jump_threshold: f64,
    /// Hard cap on ticks per evaluation. `None` runs until every bird is dead.
    pub max_ticks: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            ground_y: GROUND_Y,
            bird_start_x: BIRD_START_X,
            bird_start_y: BIRD_START_Y,
            bird_width: BIRD_WIDTH,
            bird_height: BIRD_HEIGHT,
            gravity: GRAVITY,
            jump_velocity: JUMP_VELOCITY,
            max_fall_per_tick: MAX_FALL_PER_TICK,
            rise_boost: RISE_BOOST,
            tilt_hold_band: TILT_HOLD_BAND,
            max_tilt_deg: MAX_TILT_DEG,
            min_tilt_deg: MIN_TILT_DEG,
            tilt_step_deg: TILT_STEP_DEG,
            pipe_width: PIPE_WIDTH,
            pipe_height: PIPE_HEIGHT,
            pipe_gap: PIPE_GAP,
            scroll_speed: PIPE_SCROLL_SPEED,
            gap_center_min: GAP_CENTER_MIN,
            gap_center_max: GAP_CENTER_MAX,
            first_pipe_x: FIRST_PIPE_X,
            spawn_pipe_x: SPAWN_PIPE_X,
            survival_bonus: SURVIVAL_BONUS,
            pass_bonus: PASS_BONUS,
            collision_penalty: COLLISION_PENALTY,
            jump_threshold: JUMP_THRESHOLD,
            max_ticks: None,
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = [
            (self.ground_y, ConfigField::GroundY),
            (self.bird_start_x, ConfigField::BirdStart),
            (self.bird_start_y, ConfigField::BirdStart),
            (self.gravity, ConfigField::Gravity),
            (self.jump_velocity, ConfigField::JumpVelocity),
            (self.max_fall_per_tick, ConfigField::MaxFall),
            (self.rise_boost, ConfigField::RiseBoost),
            (self.tilt_hold_band, ConfigField::Tilt),
            (self.max_tilt_deg, ConfigField::Tilt),
            (self.min_tilt_deg, ConfigField::Tilt),
            (self.tilt_step_deg, ConfigField::Tilt),
            (self.scroll_speed, ConfigField::ScrollSpeed),
            (self.first_pipe_x, ConfigField::SpawnX),
            (self.spawn_pipe_x, ConfigField::SpawnX),
            (self.survival_bonus, ConfigField::FitnessBonus),
            (self.pass_bonus, ConfigField::FitnessBonus),
            (self.collision_penalty, ConfigField::FitnessBonus),
            (self.jump_threshold, ConfigField::JumpThreshold),
        ];
        for (value, field) in finite {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { field });
            }
        }

        if self.ground_y <= 0.0 {
            return Err(ConfigError::NonPositive {
                field: ConfigField::GroundY,
            });
        }
        if self.bird_width == 0 || self.bird_height == 0 {
            return Err(ConfigError::NonPositive {
                field: ConfigField::BirdSize,
            });
        }
        if self.pipe_width == 0 || self.pipe_height == 0 {
            return Err(ConfigError::NonPositive {
                field: ConfigField::PipeSize,
            });
        }
        for width in [self.bird_width, self.pipe_width] {
            if width > MAX_SILHOUETTE_WIDTH {
                return Err(ConfigError::SilhouetteTooWide {
                    width,
                    max: MAX_SILHOUETTE_WIDTH,
                });
            }
        }
        if self.pipe_gap <= 0 {
            return Err(ConfigError::NonPositive {
                field: ConfigField::PipeGap,
            });
        }
        if self.scroll_speed <= 0.0 {
            return Err(ConfigError::NonPositive {
                field: ConfigField::ScrollSpeed,
            });
        }
        if self.max_fall_per_tick <= 0.0 {
            return Err(ConfigError::NonPositive {
                field: ConfigField::MaxFall,
            });
        }
        if self.gap_center_max <= self.gap_center_min {
            return Err(ConfigError::EmptyGapRange {
                min: self.gap_center_min,
                max: self.gap_center_max,
            });
        }
        for spawn_x in [self.first_pipe_x, self.spawn_pipe_x] {
            if spawn_x <= self.bird_start_x {
                return Err(ConfigError::SpawnBehindBird {
                    spawn_x,
                    bird_x: self.bird_start_x,
                });
            }
        }
        if self.bird_start_y + self.bird_height as f64 >= self.ground_y {
            return Err(ConfigError::BirdBelowGround {
                start_y: self.bird_start_y,
                ground_y: self.ground_y,
            });
        }
        if self.max_ticks == Some(0) {
            return Err(ConfigError::NonPositive {
                field: ConfigField::MaxTicks,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(SimConfig::default().validate(), Ok(()));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let cfg: SimConfig =
            serde_json::from_str(r#"{ "pipe_gap": 180, "max_ticks": 5000 }"#).expect("parse");
        assert_eq!(cfg.pipe_gap, 180);
        assert_eq!(cfg.max_ticks, Some(5000));
        assert_eq!(cfg.jump_velocity, JUMP_VELOCITY);
        assert_eq!(cfg.ground_y, GROUND_Y);
    }

    #[test]
    fn rejects_empty_gap_range() {
        let cfg = SimConfig {
            gap_center_min: 300,
            gap_center_max: 300,
            ..SimConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::EmptyGapRange { min: 300, max: 300 })
        );
    }

    #[test]
    fn rejects_wide_silhouettes() {
        let cfg = SimConfig {
            pipe_width: 200,
            ..SimConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::SilhouetteTooWide { width: 200, .. })
        ));
    }

    #[test]
    fn rejects_non_finite_gravity() {
        let cfg = SimConfig {
            gravity: f64::NAN,
            ..SimConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::NonFinite {
                field: ConfigField::Gravity
            })
        );
    }

    #[test]
    fn rejects_zero_tick_budget() {
        let cfg = SimConfig {
            max_ticks: Some(0),
            ..SimConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
