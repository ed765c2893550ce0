use crate::config::SimConfig;
use crate::rng::SeededRng;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pipe {
    x: f64,
    gap_center: i32,
    half_gap_top: i32,
    half_gap_bottom: i32,
    pub(crate) passed: bool,
    pub(crate) retirable: bool,
}

impl Pipe {
    pub fn new(x: f64, gap_center: i32, gap: i32) -> Self {
        let half_gap_top = gap / 2;
        Self {
            x,
            gap_center,
            half_gap_top,
            half_gap_bottom: gap - half_gap_top,
            passed: false,
            retirable: false,
        }
    }

    #[inline]
    pub fn x(&self) -> f64 {
        self.x
    }

    #[inline]
    pub fn gap_center(&self) -> i32 {
        self.gap_center
    }

    /// Lowest row of open sky under the top pipe.
    #[inline]
    pub fn gap_top(&self) -> i32 {
        self.gap_center - self.half_gap_top
    }

    /// First row of the bottom pipe.
    #[inline]
    pub fn gap_bottom(&self) -> i32 {
        self.gap_center + self.half_gap_bottom
    }

    #[inline]
    pub fn passed(&self) -> bool {
        self.passed
    }

    #[inline]
    pub fn trailing_edge(&self, pipe_width: u32) -> f64 {
        self.x + pipe_width as f64
    }

    #[inline]
    pub fn advance(&mut self, scroll_speed: f64) {
        self.x -= scroll_speed;
    }
}

/// Pipes ordered by horizontal position, leading pipe first, plus the
/// running score.
#[derive(Clone, Debug)]
pub struct Track {
    pub(crate) pipes: Vec<Pipe>,
    pub(crate) score: u32,
    rng: SeededRng,
    gap: i32,
    gap_center_min: i32,
    gap_center_max: i32,
}

impl Track {
    /// Fresh track with one pipe at `first_pipe_x` and score 0.
    pub fn new(config: &SimConfig, seed: u32) -> Self {
        let mut track = Self {
            pipes: Vec::with_capacity(4),
            score: 0,
            rng: SeededRng::new(seed),
            gap: config.pipe_gap,
            gap_center_min: config.gap_center_min,
            gap_center_max: config.gap_center_max,
        };
        track.spawn(config.first_pipe_x);
        track
    }

    pub fn spawn(&mut self, x: f64) {
        let gap_center = self
            .rng
            .next_range(self.gap_center_min, self.gap_center_max);
        debug_assert!(self.pipes.last().map_or(true, |last| last.x <= x));
        self.pipes.push(Pipe::new(x, gap_center, self.gap));
    }

    #[inline]
    pub fn pipes(&self) -> &[Pipe] {
        &self.pipes
    }

    #[inline]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[inline]
    pub fn rng_state(&self) -> u32 {
        self.rng.state()
    }

    /// Index of the pipe a bird at `lead_x` should steer for: the leading
    /// pipe until the bird has crossed its x, then the next one. Falls back
    /// to the leading pipe when nothing follows it.
    pub fn relevant_index(&self, lead_x: f64) -> Option<usize> {
        let leading = self.pipes.first()?;
        if lead_x > leading.x() && self.pipes.len() > 1 {
            Some(1)
        } else {
            Some(0)
        }
    }

    pub fn relevant(&self, lead_x: f64) -> Option<&Pipe> {
        self.relevant_index(lead_x).map(|index| &self.pipes[index])
    }

    pub(crate) fn prune_retired(&mut self) -> usize {
        let before = self.pipes.len();
        self.pipes.retain(|pipe| !pipe.retirable);
        before - self.pipes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gap_extents_follow_center_and_size() {
        let pipe = Pipe::new(600.0, 300, 200);
        assert_eq!(pipe.gap_top(), 200);
        assert_eq!(pipe.gap_bottom(), 400);
        assert_eq!(pipe.gap_bottom() - pipe.gap_top(), 200);

        let odd = Pipe::new(600.0, 300, 151);
        assert_eq!(odd.gap_bottom() - odd.gap_top(), 151);
    }

    #[test]
    fn new_track_has_one_pipe_ahead() {
        let config = SimConfig::default();
        let track = Track::new(&config, 7);
        assert_eq!(track.pipes().len(), 1);
        assert_eq!(track.pipes()[0].x(), config.first_pipe_x);
        assert_eq!(track.score(), 0);
        assert!(!track.pipes()[0].passed());
    }

    #[test]
    fn gap_centers_are_seeded_and_in_range() {
        let config = SimConfig::default();
        let mut a = Track::new(&config, 0xABCD_0001);
        let mut b = Track::new(&config, 0xABCD_0001);
        for i in 1..=200u32 {
            let x = config.first_pipe_x + f64::from(i);
            a.spawn(x);
            b.spawn(x);
        }
        let centers_a: Vec<i32> = a.pipes().iter().map(Pipe::gap_center).collect();
        let centers_b: Vec<i32> = b.pipes().iter().map(Pipe::gap_center).collect();
        assert_eq!(centers_a, centers_b);
        assert!(centers_a.iter().all(|c| (50..450).contains(c)));
    }

    #[test]
    fn relevant_pipe_switches_once_crossed() {
        let config = SimConfig::default();
        let mut track = Track::new(&config, 3);
        assert_eq!(track.relevant_index(230.0), Some(0));

        track.pipes[0].x = 230.0;
        track.spawn(600.0);
        // Level with the pipe's x is not past it.
        assert_eq!(track.relevant_index(230.0), Some(0));

        // Past the pipe's x but still inside its width.
        track.pipes[0].x = 200.0;
        assert_eq!(track.relevant_index(230.0), Some(1));

        track.pipes[0].x = 100.0;
        assert_eq!(track.relevant_index(230.0), Some(1));
    }

    #[test]
    fn relevant_falls_back_to_leading_without_successor() {
        let config = SimConfig::default();
        let mut track = Track::new(&config, 3);
        track.pipes[0].x = 0.0;
        assert_eq!(track.relevant_index(230.0), Some(0));
        track.pipes.clear();
        assert_eq!(track.relevant_index(230.0), None);
    }

    #[test]
    fn prune_drops_only_retirable() {
        let config = SimConfig::default();
        let mut track = Track::new(&config, 3);
        let next_x = config.first_pipe_x + 100.0;
        track.spawn(next_x);
        track.pipes[0].retirable = true;
        assert_eq!(track.prune_retired(), 1);
        assert_eq!(track.pipes().len(), 1);
        assert_eq!(track.pipes()[0].x(), next_x);
    }
}
