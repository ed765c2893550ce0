use crate::constants::SENSOR_COUNT;

use super::bird::Bird;
use super::track::Pipe;

/// `[y, |y - gap_center|, |y - gap_bottom|]`
pub type SensorVector = [f64; SENSOR_COUNT];

/// Decision function bound to one bird for one evaluation.
pub trait Controller {
    fn activate(&mut self, inputs: &SensorVector) -> f64;
}

impl<C: Controller + ?Sized> Controller for Box<C> {
    fn activate(&mut self, inputs: &SensorVector) -> f64 {
        (**self).activate(inputs)
    }
}

impl<C: Controller + ?Sized> Controller for &mut C {
    fn activate(&mut self, inputs: &SensorVector) -> f64 {
        (**self).activate(inputs)
    }
}

/// Adapts a closure into a [`Controller`].
#[derive(Clone, Copy, Debug)]
pub struct FnController<F>(pub F);

impl<F> Controller for FnController<F>
where
    F: FnMut(&SensorVector) -> f64,
{
    fn activate(&mut self, inputs: &SensorVector) -> f64 {
        (self.0)(inputs)
    }
}

pub fn controller_fn<F>(f: F) -> FnController<F>
where
    F: FnMut(&SensorVector) -> f64,
{
    FnController(f)
}

pub fn sense(bird: &Bird, pipe: &Pipe) -> SensorVector {
    let y = bird.y();
    [
        y,
        (y - pipe.gap_center() as f64).abs(),
        (y - pipe.gap_bottom() as f64).abs(),
    ]
}

/// Jump when the output clears `threshold`. NaN and infinities never jump,
/// so a broken controller only hurts its own bird.
#[inline]
pub fn decide(output: f64, threshold: f64) -> bool {
    output.is_finite() && output > threshold
}
