use crate::config::SimConfig;
use crate::constants::{NOSE_DIVE_TILT_DEG, WING_FRAME_TICKS};
use crate::silhouette::WingFrame;

/// Motion law coefficients, copied out of [`SimConfig`] once per harness.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Kinematics {
    pub gravity: f64,
    pub jump_velocity: f64,
    pub max_fall_per_tick: f64,
    pub rise_boost: f64,
    pub tilt_hold_band: f64,
    pub max_tilt_deg: f64,
    pub min_tilt_deg: f64,
    pub tilt_step_deg: f64,
}

impl Kinematics {
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            gravity: config.gravity,
            jump_velocity: config.jump_velocity,
            max_fall_per_tick: config.max_fall_per_tick,
            rise_boost: config.rise_boost,
            tilt_hold_band: config.tilt_hold_band,
            max_tilt_deg: config.max_tilt_deg,
            min_tilt_deg: config.min_tilt_deg,
            tilt_step_deg: config.tilt_step_deg,
        }
    }
}

impl Default for Kinematics {
    fn default() -> Self {
        Self::from_config(&SimConfig::default())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bird {
    x: f64,
    y: f64,
    velocity: f64,
    ticks_since_jump: u32,
    jump_ref: f64,
    tilt: f64,
    wing_ticks: u32,
    pub(crate) alive: bool,
}

impl Bird {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            velocity: 0.0,
            ticks_since_jump: 0,
            jump_ref: y,
            tilt: 0.0,
            wing_ticks: 0,
            alive: true,
        }
    }

    #[inline]
    pub fn x(&self) -> f64 {
        self.x
    }

    #[inline]
    pub fn y(&self) -> f64 {
        self.y
    }

    #[inline]
    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    #[inline]
    pub fn ticks_since_jump(&self) -> u32 {
        self.ticks_since_jump
    }

    #[inline]
    pub fn jump_ref(&self) -> f64 {
        self.jump_ref
    }

    #[inline]
    pub fn tilt(&self) -> f64 {
        self.tilt
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn jump(&mut self, kin: &Kinematics) {
        self.velocity = kin.jump_velocity;
        self.ticks_since_jump = 0;
        self.jump_ref = self.y;
    }

    /// One tick of vertical motion. Returns the applied displacement.
    pub fn advance(&mut self, kin: &Kinematics) -> f64 {
        self.ticks_since_jump = self.ticks_since_jump.saturating_add(1);
        let t = self.ticks_since_jump as f64;

        let mut d = displacement(kin, self.velocity, t);
        if d < 0.0 {
            d -= kin.rise_boost;
        }
        self.y += d;

        if d < 0.0 || self.y < self.jump_ref + kin.tilt_hold_band {
            if self.tilt < kin.max_tilt_deg {
                self.tilt = kin.max_tilt_deg;
            }
        } else if self.tilt > kin.min_tilt_deg {
            self.tilt = (self.tilt - kin.tilt_step_deg).max(kin.min_tilt_deg);
        }

        self.wing_ticks = (self.wing_ticks + 1) % (WING_FRAME_TICKS * 4);
        if self.tilt <= NOSE_DIVE_TILT_DEG {
            // Gliding nose-down: wings stay level and resume on the downstroke.
            self.wing_ticks = WING_FRAME_TICKS * 2;
        }

        d
    }

    pub fn wing_frame(&self) -> WingFrame {
        if self.tilt <= NOSE_DIVE_TILT_DEG {
            return WingFrame::Mid;
        }
        match self.wing_ticks / WING_FRAME_TICKS {
            0 => WingFrame::Up,
            1 | 3 => WingFrame::Mid,
            _ => WingFrame::Down,
        }
    }
}

/// Displacement before the rise boost: `v*t + g*t²`, clamped to the fall
/// limit when moving down.
#[inline]
pub fn displacement(kin: &Kinematics, velocity: f64, t: f64) -> f64 {
    let d = velocity * t + kin.gravity * t * t;
    if d >= kin.max_fall_per_tick {
        kin.max_fall_per_tick
    } else {
        d
    }
}
