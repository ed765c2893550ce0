//! Cell-exact shapes for collision testing.
//!
//! A [`Silhouette`] is a bitmap at most 128 cells wide, one `u128` per row,
//! bit `c` of a row set when column `c` is solid. Overlap tests shift whole
//! rows instead of walking cells.

use crate::constants::MAX_SILHOUETTE_WIDTH;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Silhouette {
    width: u32,
    height: u32,
    rows: Vec<u128>,
}

impl Silhouette {
    pub fn from_fn(width: u32, height: u32, solid: impl Fn(u32, u32) -> bool) -> Self {
        debug_assert!(width <= MAX_SILHOUETTE_WIDTH);
        let width = width.min(MAX_SILHOUETTE_WIDTH);
        let rows = (0..height)
            .map(|y| {
                (0..width)
                    .filter(|&x| solid(x, y))
                    .fold(0u128, |row, x| row | (1u128 << x))
            })
            .collect();
        Self {
            width,
            height,
            rows,
        }
    }

    pub fn filled(width: u32, height: u32) -> Self {
        Self::from_fn(width, height, |_, _| true)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_set(&self, x: u32, y: u32) -> bool {
        x < self.width
            && self
                .rows
                .get(y as usize)
                .is_some_and(|row| (row >> x) & 1 == 1)
    }

    pub fn count(&self) -> u32 {
        self.rows.iter().map(|row| row.count_ones()).sum()
    }

    pub fn flipped_vertical(&self) -> Self {
        let mut rows = self.rows.clone();
        rows.reverse();
        Self {
            width: self.width,
            height: self.height,
            rows,
        }
    }

    /// True when any solid cell of `other`, placed with its top-left corner
    /// at `(dx, dy)` relative to `self`, lands on a solid cell of `self`.
    pub fn overlap(&self, other: &Silhouette, dx: i32, dy: i32) -> bool {
        if dx >= self.width as i32 || dx <= -(other.width as i32) {
            return false;
        }

        let y_start = dy.max(0);
        let y_end = (dy + other.height as i32).min(self.height as i32);
        if y_start >= y_end {
            return false;
        }

        for y in y_start..y_end {
            let mine = self.rows[y as usize];
            if mine == 0 {
                continue;
            }
            let theirs = other.rows[(y - dy) as usize];
            let shifted = if dx >= 0 {
                theirs << dx
            } else {
                theirs >> (-dx)
            };
            if mine & shifted != 0 {
                return true;
            }
        }

        false
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WingFrame {
    Up,
    Mid,
    Down,
}

impl WingFrame {
    pub const ALL: [WingFrame; 3] = [WingFrame::Up, WingFrame::Mid, WingFrame::Down];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Self::Up => 0,
            Self::Mid => 1,
            Self::Down => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// Elliptic body, a beak on the leading edge and one wing whose vertical
/// placement depends on the frame.
pub fn bird(frame: WingFrame, width: u32, height: u32) -> Silhouette {
    let w = width as f64;
    let h = height as f64;
    let (body_cx, body_cy) = (w * 0.44, h * 0.52);
    let (body_rx, body_ry) = (w * 0.40, h * 0.44);
    let wing_cy = match frame {
        WingFrame::Up => h * 0.30,
        WingFrame::Mid => h * 0.52,
        WingFrame::Down => h * 0.74,
    };
    let (wing_cx, wing_rx, wing_ry) = (w * 0.22, w * 0.17, h * 0.20);
    let beak_left = w * 0.78;
    let beak_half = h * 0.12;

    Silhouette::from_fn(width, height, |x, y| {
        let px = x as f64 + 0.5;
        let py = y as f64 + 0.5;
        let body = ellipse(px, py, body_cx, body_cy, body_rx, body_ry);
        let wing = ellipse(px, py, wing_cx, wing_cy, wing_rx, wing_ry);
        let beak = if px >= beak_left {
            let taper = 1.0 - (px - beak_left) / (w - beak_left).max(1.0);
            (py - body_cy * 1.08).abs() <= beak_half * taper
        } else {
            false
        };
        body || wing || beak
    })
}

/// Upright pipe: full-width lip across the first `lip_height` rows, then a
/// shaft inset by `shaft_inset` on both sides.
pub fn pipe(width: u32, height: u32, lip_height: u32, shaft_inset: u32) -> Silhouette {
    let inset = shaft_inset.min(width / 2);
    Silhouette::from_fn(width, height, |x, y| {
        y < lip_height || (x >= inset && x < width - inset)
    })
}

#[inline]
fn ellipse(px: f64, py: f64, cx: f64, cy: f64, rx: f64, ry: f64) -> bool {
    let nx = (px - cx) / rx;
    let ny = (py - cy) / ry;
    nx * nx + ny * ny <= 1.0
}
