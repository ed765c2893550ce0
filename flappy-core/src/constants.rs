// Playfield (screen space, y grows downward)
pub const GROUND_Y: f64 = 730.0;

// Bird
pub const BIRD_START_X: f64 = 230.0;
pub const BIRD_START_Y: f64 = 350.0;
pub const BIRD_WIDTH: u32 = 68;
pub const BIRD_HEIGHT: u32 = 48;
pub const JUMP_VELOCITY: f64 = -10.5;
pub const GRAVITY: f64 = 1.5;
pub const MAX_FALL_PER_TICK: f64 = 16.0;
pub const RISE_BOOST: f64 = 2.0;
pub const TILT_HOLD_BAND: f64 = 50.0;
pub const MAX_TILT_DEG: f64 = 25.0;
pub const MIN_TILT_DEG: f64 = -90.0;
pub const TILT_STEP_DEG: f64 = 20.0;
pub const NOSE_DIVE_TILT_DEG: f64 = -80.0;
pub const WING_FRAME_TICKS: u32 = 5;

// Pipes
pub const PIPE_WIDTH: u32 = 104;
pub const PIPE_HEIGHT: u32 = 640;
pub const PIPE_SHAFT_INSET: u32 = 4;
pub const PIPE_LIP_HEIGHT: u32 = 38;
pub const PIPE_GAP: i32 = 200;
pub const PIPE_SCROLL_SPEED: f64 = 5.0;
pub const GAP_CENTER_MIN: i32 = 50;
pub const GAP_CENTER_MAX: i32 = 450;
pub const FIRST_PIPE_X: f64 = 700.0;
pub const SPAWN_PIPE_X: f64 = 600.0;

// Fitness accounting
pub const SURVIVAL_BONUS: f64 = 0.1;
pub const PASS_BONUS: f64 = 5.0;
pub const COLLISION_PENALTY: f64 = 1.0;
pub const JUMP_THRESHOLD: f64 = 0.5;

pub const SENSOR_COUNT: usize = 3;

/// Silhouette rows are packed into a single `u128`.
pub const MAX_SILHOUETTE_WIDTH: u32 = 128;
