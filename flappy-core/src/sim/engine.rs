use crate::config::SimConfig;

use super::bird::{Bird, Kinematics};
use super::collision::{overlaps, Silhouettes};
use super::sensors::{decide, sense, Controller, SensorVector};
use super::track::Track;
use super::{
    BirdSnapshot, Death, DeathCause, EngineState, FitnessAccumulator, InvariantRule,
    PipeSnapshot, Termination, WorldSnapshot,
};

/// One evaluation in flight. Birds, controllers and accumulators are three
/// parallel vectors; deaths only flip `Bird::alive` during a tick and the
/// vectors are compacted together once the tick's removals are known.
pub(crate) struct Engine<'a, C> {
    config: &'a SimConfig,
    kinematics: Kinematics,
    shapes: &'a Silhouettes,
    birds: Vec<Bird>,
    controllers: Vec<&'a mut C>,
    accumulators: Vec<FitnessAccumulator>,
    retired: Vec<FitnessAccumulator>,
    track: Track,
    tick: u64,
    state: EngineState,
    prune_pending: bool,
}

impl<'a, C: Controller> Engine<'a, C> {
    pub(crate) fn new(
        config: &'a SimConfig,
        shapes: &'a Silhouettes,
        controllers: &'a mut [C],
        seed: u32,
    ) -> Self {
        let count = controllers.len();
        let birds = (0..count)
            .map(|_| Bird::new(config.bird_start_x, config.bird_start_y))
            .collect();
        let accumulators = (0..count).map(FitnessAccumulator::new).collect();
        let state = if count == 0 {
            EngineState::Terminated(Termination::Extinct)
        } else {
            EngineState::Running
        };

        Self {
            config,
            kinematics: Kinematics::from_config(config),
            shapes,
            birds,
            controllers: controllers.iter_mut().collect(),
            accumulators,
            retired: Vec::with_capacity(count),
            track: Track::new(config, seed),
            tick: 0,
            state,
            prune_pending: false,
        }
    }

    #[inline]
    pub(crate) fn state(&self) -> EngineState {
        self.state
    }

    #[inline]
    pub(crate) fn tick_count(&self) -> u64 {
        self.tick
    }

    #[inline]
    pub(crate) fn track(&self) -> &Track {
        &self.track
    }

    #[inline]
    pub(crate) fn alive(&self) -> usize {
        self.birds.len()
    }

    /// Ends the run at a tick boundary. Repeated calls keep the first reason.
    pub(crate) fn terminate(&mut self, reason: Termination) {
        if self.state == EngineState::Running {
            self.state = EngineState::Terminated(reason);
        }
    }

    pub(crate) fn step(&mut self) -> EngineState {
        if self.state != EngineState::Running {
            return self.state;
        }
        self.tick += 1;

        self.think_and_move();
        let score_event = self.collide_and_scroll();
        if score_event {
            self.award_pass();
        }
        self.track.prune_retired();
        self.enforce_bounds();
        self.compact();

        if self.birds.is_empty() {
            self.state = EngineState::Terminated(Termination::Extinct);
        } else if self.config.max_ticks.is_some_and(|max| self.tick >= max) {
            self.state = EngineState::Terminated(Termination::TickBudget);
        }
        self.state
    }

    fn think_and_move(&mut self) {
        // Every decision this tick reads the pipes as they were before any of
        // them scroll.
        let target = lead_x(&self.birds)
            .and_then(|x| self.track.relevant(x))
            .copied();
        let survival_bonus = self.config.survival_bonus;
        let threshold = self.config.jump_threshold;

        for ((bird, controller), acc) in self
            .birds
            .iter_mut()
            .zip(self.controllers.iter_mut())
            .zip(self.accumulators.iter_mut())
        {
            acc.fitness += survival_bonus;
            acc.ticks_survived += 1;

            bird.advance(&self.kinematics);
            let inputs: SensorVector = match &target {
                Some(pipe) => sense(bird, pipe),
                None => [bird.y(), 0.0, 0.0],
            };
            if decide(controller.activate(&inputs), threshold) {
                bird.jump(&self.kinematics);
            }
        }
    }

    fn collide_and_scroll(&mut self) -> bool {
        let mut score_event = false;
        let pipe_width = self.config.pipe_width;
        let penalty = self.config.collision_penalty;
        let scroll_speed = self.config.scroll_speed;

        for pipe in self.track.pipes.iter_mut() {
            for (bird, acc) in self.birds.iter_mut().zip(self.accumulators.iter_mut()) {
                if !bird.alive {
                    continue;
                }
                if overlaps(self.shapes, bird, pipe) {
                    acc.fitness -= penalty;
                    bird.alive = false;
                    acc.death = Some(Death {
                        tick: self.tick,
                        cause: DeathCause::Collision,
                    });
                    self.prune_pending = true;
                }
            }

            if pipe.trailing_edge(pipe_width) < 0.0 {
                pipe.retirable = true;
            }

            if !pipe.passed && lead_x(&self.birds).is_some_and(|x| x > pipe.x()) {
                pipe.passed = true;
                score_event = true;
            }

            pipe.advance(scroll_speed);
        }

        score_event
    }

    fn award_pass(&mut self) {
        self.track.score += 1;
        let bonus = self.config.pass_bonus;
        for (bird, acc) in self.birds.iter().zip(self.accumulators.iter_mut()) {
            if bird.alive {
                acc.fitness += bonus;
                acc.obstacles_passed += 1;
            }
        }
        self.track.spawn(self.config.spawn_pipe_x);
        tracing::debug!(tick = self.tick, score = self.track.score, "pipe passed");
    }

    fn enforce_bounds(&mut self) {
        let ground_y = self.config.ground_y;
        let bird_height = self.config.bird_height as f64;

        for (bird, acc) in self.birds.iter_mut().zip(self.accumulators.iter_mut()) {
            if !bird.alive {
                continue;
            }
            let cause = if bird.y() + bird_height >= ground_y {
                DeathCause::Ground
            } else if bird.y() < 0.0 {
                DeathCause::Ceiling
            } else {
                continue;
            };
            bird.alive = false;
            acc.death = Some(Death {
                tick: self.tick,
                cause,
            });
            self.prune_pending = true;
        }
    }

    fn compact(&mut self) {
        if !self.prune_pending {
            return;
        }

        let keep: Vec<bool> = self.birds.iter().map(|bird| bird.alive).collect();
        retain_by_mask(&mut self.birds, &keep);
        retain_by_mask(&mut self.controllers, &keep);

        let accumulators = std::mem::take(&mut self.accumulators);
        self.accumulators = Vec::with_capacity(self.birds.len());
        for (acc, alive) in accumulators.into_iter().zip(keep) {
            if alive {
                self.accumulators.push(acc);
            } else {
                if let Some(death) = acc.death {
                    tracing::debug!(
                        agent = acc.agent,
                        tick = death.tick,
                        cause = ?death.cause,
                        fitness = acc.fitness,
                        "agent retired"
                    );
                }
                self.retired.push(acc);
            }
        }

        debug_assert_eq!(self.birds.len(), self.controllers.len());
        debug_assert_eq!(self.birds.len(), self.accumulators.len());
        self.prune_pending = false;
    }

    pub(crate) fn validate_invariants(&self) -> Result<(), InvariantRule> {
        if self.birds.len() != self.controllers.len()
            || self.birds.len() != self.accumulators.len()
        {
            return Err(InvariantRule::CollectionLengths);
        }
        if self.birds.iter().any(|bird| !bird.alive)
            || self.accumulators.iter().any(|acc| acc.death.is_some())
        {
            return Err(InvariantRule::TombstoneInLiveSet);
        }
        if self
            .accumulators
            .windows(2)
            .any(|pair| pair[0].agent >= pair[1].agent)
        {
            return Err(InvariantRule::AgentOrder);
        }
        if self
            .track
            .pipes
            .windows(2)
            .any(|pair| pair[0].x() > pair[1].x())
        {
            return Err(InvariantRule::PipeOrder);
        }
        let kin = &self.kinematics;
        if self
            .birds
            .iter()
            .any(|bird| bird.tilt() > kin.max_tilt_deg || bird.tilt() < kin.min_tilt_deg)
        {
            return Err(InvariantRule::TiltRange);
        }
        Ok(())
    }

    pub(crate) fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            tick: self.tick,
            score: self.track.score,
            alive: self.birds.len(),
            birds: self
                .birds
                .iter()
                .zip(self.accumulators.iter())
                .map(|(bird, acc)| BirdSnapshot::capture(bird, acc))
                .collect(),
            pipes: self.track.pipes.iter().map(PipeSnapshot::capture).collect(),
        }
    }

    /// Consumes the engine and returns every accumulator ordered by agent.
    pub(crate) fn finish(self) -> Vec<FitnessAccumulator> {
        let mut all = self.retired;
        all.extend(self.accumulators);
        all.sort_by_key(|acc| acc.agent);
        all
    }
}

fn lead_x(birds: &[Bird]) -> Option<f64> {
    birds
        .iter()
        .filter(|bird| bird.alive)
        .map(Bird::x)
        .reduce(f64::max)
}

/// Keeps `items[i]` exactly when `keep[i]`. `Vec::retain` visits in order,
/// so the mask lines up with the element being tested.
fn retain_by_mask<T>(items: &mut Vec<T>, keep: &[bool]) {
    debug_assert_eq!(items.len(), keep.len());
    let mut flags = keep.iter();
    items.retain(|_| flags.next().copied().unwrap_or(false));
}

#[cfg(test)]
mod tests;
