use core::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigField {
    GroundY,
    BirdSize,
    BirdStart,
    Gravity,
    JumpVelocity,
    MaxFall,
    RiseBoost,
    Tilt,
    PipeSize,
    PipeGap,
    ScrollSpeed,
    SpawnX,
    FitnessBonus,
    JumpThreshold,
    MaxTicks,
}

impl fmt::Display for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GroundY => write!(f, "ground_y"),
            Self::BirdSize => write!(f, "bird_width/bird_height"),
            Self::BirdStart => write!(f, "bird_start_x/bird_start_y"),
            Self::Gravity => write!(f, "gravity"),
            Self::JumpVelocity => write!(f, "jump_velocity"),
            Self::MaxFall => write!(f, "max_fall_per_tick"),
            Self::RiseBoost => write!(f, "rise_boost"),
            Self::Tilt => write!(f, "tilt_*"),
            Self::PipeSize => write!(f, "pipe_width/pipe_height"),
            Self::PipeGap => write!(f, "pipe_gap"),
            Self::ScrollSpeed => write!(f, "scroll_speed"),
            Self::SpawnX => write!(f, "first_pipe_x/spawn_pipe_x"),
            Self::FitnessBonus => write!(f, "survival_bonus/pass_bonus/collision_penalty"),
            Self::JumpThreshold => write!(f, "jump_threshold"),
            Self::MaxTicks => write!(f, "max_ticks"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    NonFinite { field: ConfigField },
    NonPositive { field: ConfigField },
    EmptyGapRange { min: i32, max: i32 },
    SilhouetteTooWide { width: u32, max: u32 },
    SpawnBehindBird { spawn_x: f64, bird_x: f64 },
    BirdBelowGround { start_y: f64, ground_y: f64 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonFinite { field } => write!(f, "{field} must be finite"),
            Self::NonPositive { field } => write!(f, "{field} must be > 0"),
            Self::EmptyGapRange { min, max } => {
                write!(f, "gap center range is empty: [{min}, {max})")
            }
            Self::SilhouetteTooWide { width, max } => {
                write!(f, "silhouette width {width} exceeds {max} cells")
            }
            Self::SpawnBehindBird { spawn_x, bird_x } => write!(
                f,
                "pipes must spawn ahead of the bird: spawn_x={spawn_x}, bird_x={bird_x}"
            ),
            Self::BirdBelowGround { start_y, ground_y } => write!(
                f,
                "bird would start on or below the ground: start_y={start_y}, ground_y={ground_y}"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
