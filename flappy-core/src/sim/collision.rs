use crate::config::SimConfig;
use crate::constants::{PIPE_LIP_HEIGHT, PIPE_SHAFT_INSET};
use crate::silhouette::{self, Silhouette, WingFrame};

use super::bird::Bird;
use super::track::Pipe;

/// Shapes shared by every evaluation run through one harness.
#[derive(Clone, Debug)]
pub struct Silhouettes {
    bird: [Silhouette; 3],
    pipe_top: Silhouette,
    pipe_bottom: Silhouette,
}

impl Silhouettes {
    pub fn from_config(config: &SimConfig) -> Self {
        let bird = WingFrame::ALL
            .map(|frame| silhouette::bird(frame, config.bird_width, config.bird_height));
        let lip = PIPE_LIP_HEIGHT.min(config.pipe_height);
        let pipe_bottom =
            silhouette::pipe(config.pipe_width, config.pipe_height, lip, PIPE_SHAFT_INSET);
        let pipe_top = pipe_bottom.flipped_vertical();
        Self {
            bird,
            pipe_top,
            pipe_bottom,
        }
    }

    #[inline]
    pub fn bird(&self, frame: WingFrame) -> &Silhouette {
        &self.bird[frame.index()]
    }

    #[inline]
    pub fn pipe_top(&self) -> &Silhouette {
        &self.pipe_top
    }

    #[inline]
    pub fn pipe_bottom(&self) -> &Silhouette {
        &self.pipe_bottom
    }
}

/// Cell-exact test of the bird's current frame against both halves of the
/// pipe. The top half hangs so its last row sits just above `gap_top`; the
/// bottom half starts at `gap_bottom`.
pub fn overlaps(shapes: &Silhouettes, bird: &Bird, pipe: &Pipe) -> bool {
    let mask = shapes.bird(bird.wing_frame());
    let dx = (pipe.x() - bird.x()).round() as i32;
    let bird_y = bird.y().round() as i32;

    let top_y = pipe.gap_top() - shapes.pipe_top.height() as i32;
    if mask.overlap(&shapes.pipe_top, dx, top_y - bird_y) {
        return true;
    }

    mask.overlap(&shapes.pipe_bottom, dx, pipe.gap_bottom() - bird_y)
}
