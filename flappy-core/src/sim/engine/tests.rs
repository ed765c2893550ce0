use super::*;
use crate::sim::sensors::{controller_fn, FnController};
use crate::sim::track::Pipe;

type Policy = fn(&SensorVector) -> f64;

fn idle(_: &SensorVector) -> f64 {
    0.0
}

fn always_jump(_: &SensorVector) -> f64 {
    1.0
}

fn broken(_: &SensorVector) -> f64 {
    f64::NAN
}

fn roster(policies: &[Policy]) -> Vec<FnController<Policy>> {
    policies.iter().copied().map(controller_fn).collect()
}

fn run_to_end<C: Controller>(engine: &mut Engine<'_, C>) -> EngineState {
    for _ in 0..10_000 {
        let state = engine.step();
        engine
            .validate_invariants()
            .expect("post-step state must satisfy invariants");
        if state != EngineState::Running {
            return state;
        }
    }
    panic!("engine did not terminate");
}

fn assert_invariant_violation(
    mutator: impl FnOnce(&mut Engine<'_, FnController<Policy>>),
    expected: InvariantRule,
) {
    let config = SimConfig::default();
    let shapes = Silhouettes::from_config(&config);
    let mut controllers = roster(&[idle, idle]);
    let mut engine = Engine::new(&config, &shapes, &mut controllers, 9);
    mutator(&mut engine);
    assert_eq!(engine.validate_invariants(), Err(expected));
}

#[test]
fn empty_batch_is_terminated_immediately() {
    let config = SimConfig::default();
    let shapes = Silhouettes::from_config(&config);
    let mut controllers: Vec<FnController<Policy>> = Vec::new();
    let mut engine = Engine::new(&config, &shapes, &mut controllers, 1);

    assert_eq!(
        engine.state(),
        EngineState::Terminated(Termination::Extinct)
    );
    assert_eq!(
        engine.step(),
        EngineState::Terminated(Termination::Extinct)
    );
    assert_eq!(engine.tick_count(), 0);
    assert!(engine.finish().is_empty());
}

#[test]
fn idle_flock_hits_the_ground_together() {
    let config = SimConfig::default();
    let shapes = Silhouettes::from_config(&config);
    let mut controllers = roster(&[idle, idle, idle]);
    let mut engine = Engine::new(&config, &shapes, &mut controllers, 42);

    let state = run_to_end(&mut engine);
    assert_eq!(state, EngineState::Terminated(Termination::Extinct));
    assert_eq!(engine.tick_count(), 23);
    assert_eq!(engine.alive(), 0);
    assert_eq!(engine.track().score(), 0);

    let results = engine.finish();
    assert_eq!(results.len(), 3);
    for (index, acc) in results.iter().enumerate() {
        assert_eq!(acc.agent, index);
        assert_eq!(acc.ticks_survived, 23);
        assert_eq!(
            acc.death,
            Some(Death {
                tick: 23,
                cause: DeathCause::Ground,
            })
        );
        assert!((acc.fitness - 2.3).abs() < 1e-9, "fitness={}", acc.fitness);
    }
}

#[test]
fn different_causes_in_one_tick_keep_collections_aligned() {
    let config = SimConfig::default();
    let shapes = Silhouettes::from_config(&config);
    let mut controllers = roster(&[idle, idle, idle, idle]);
    let mut engine = Engine::new(&config, &shapes, &mut controllers, 5);

    engine.track.pipes[0] = Pipe::new(230.0, 300, 200);
    // Inside the top pipe.
    engine.birds[0] = Bird::new(230.0, 150.0);
    // Clear of the pipe horizontally, but about to touch the ground.
    engine.birds[1] = Bird::new(-200.0, 690.0);
    // Above the ceiling after one tick.
    engine.birds[2] = Bird::new(-200.0, -20.0);
    engine.birds[3] = Bird::new(-200.0, 350.0);

    assert_eq!(engine.step(), EngineState::Running);
    assert_eq!(engine.validate_invariants(), Ok(()));
    assert_eq!(engine.alive(), 1);
    assert_eq!(engine.birds.len(), engine.controllers.len());
    assert_eq!(engine.birds.len(), engine.accumulators.len());
    assert_eq!(engine.accumulators[0].agent, 3);

    let results = engine.finish();
    let causes: Vec<Option<DeathCause>> = results
        .iter()
        .map(|acc| acc.death.map(|death| death.cause))
        .collect();
    assert_eq!(
        causes,
        vec![
            Some(DeathCause::Collision),
            Some(DeathCause::Ground),
            Some(DeathCause::Ceiling),
            None,
        ]
    );
    assert!(results[..3]
        .iter()
        .all(|acc| acc.death.map(|death| death.tick) == Some(1)));
    assert!((results[0].fitness - (0.1 - 1.0)).abs() < 1e-12);
    assert!((results[1].fitness - 0.1).abs() < 1e-12);
}

#[test]
fn pass_rewards_only_live_birds_and_spawns_one_pipe() {
    let config = SimConfig::default();
    let shapes = Silhouettes::from_config(&config);
    let mut controllers = roster(&[idle, idle]);
    let mut engine = Engine::new(&config, &shapes, &mut controllers, 5);

    // Gap rows 260..460; the lead bird is one unit past the pipe's x.
    engine.track.pipes[0] = Pipe::new(229.0, 360, 200);
    engine.birds[1] = Bird::new(230.0, 150.0);

    assert_eq!(engine.step(), EngineState::Running);
    assert_eq!(engine.track().score(), 1);

    let pipes = engine.track().pipes();
    assert_eq!(pipes.len(), 2);
    assert!(pipes[0].passed());
    assert_eq!(pipes[0].x(), 224.0);
    assert_eq!(pipes[1].x(), config.spawn_pipe_x);
    assert!(!pipes[1].passed());

    let results = engine.finish();
    assert_eq!(results[0].obstacles_passed, 1);
    assert!((results[0].fitness - 5.1).abs() < 1e-12);
    assert_eq!(results[1].obstacles_passed, 0);
    assert_eq!(
        results[1].death.map(|death| death.cause),
        Some(DeathCause::Collision)
    );
    assert!((results[1].fitness - (0.1 - 1.0)).abs() < 1e-12);
}

#[test]
fn a_pipe_is_passed_only_once() {
    let config = SimConfig::default();
    let shapes = Silhouettes::from_config(&config);
    let mut controllers = roster(&[idle]);
    let mut engine = Engine::new(&config, &shapes, &mut controllers, 5);
    engine.track.pipes[0] = Pipe::new(229.0, 360, 200);

    engine.step();
    engine.step();
    engine.step();
    assert_eq!(engine.track().score(), 1);
    assert_eq!(engine.track().pipes().len(), 2);
}

#[test]
fn non_finite_output_never_jumps() {
    let config = SimConfig::default();
    let shapes = Silhouettes::from_config(&config);
    let mut controllers = roster(&[broken, always_jump]);
    let mut engine = Engine::new(&config, &shapes, &mut controllers, 5);

    engine.step();
    assert_eq!(engine.birds[0].velocity(), 0.0);
    assert_eq!(engine.birds[1].velocity(), config.jump_velocity);
    assert_eq!(engine.birds[1].ticks_since_jump(), 0);
}

#[test]
fn live_fitness_never_decreases() {
    let config = SimConfig::default();
    let shapes = Silhouettes::from_config(&config);
    let hover: Policy = |inputs| if inputs[0] > 420.0 { 1.0 } else { 0.0 };
    let mut controllers = roster(&[idle, always_jump, hover]);
    let mut engine = Engine::new(&config, &shapes, &mut controllers, 77);

    let mut last = [0.0_f64; 3];
    while engine.step() == EngineState::Running {
        for bird in engine.snapshot().birds {
            assert!(bird.fitness >= last[bird.agent]);
            last[bird.agent] = bird.fitness;
        }
        if engine.tick_count() > 3_000 {
            break;
        }
    }
}

#[test]
fn terminate_keeps_the_first_reason() {
    let config = SimConfig::default();
    let shapes = Silhouettes::from_config(&config);
    let mut controllers = roster(&[idle]);
    let mut engine = Engine::new(&config, &shapes, &mut controllers, 5);

    engine.step();
    engine.terminate(Termination::Stopped);
    engine.terminate(Termination::TickBudget);
    assert_eq!(
        engine.state(),
        EngineState::Terminated(Termination::Stopped)
    );
    assert_eq!(
        engine.step(),
        EngineState::Terminated(Termination::Stopped)
    );
    assert_eq!(engine.tick_count(), 1);

    let results = engine.finish();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].death, None);
}

#[test]
fn tick_budget_ends_a_live_run() {
    let config = SimConfig {
        max_ticks: Some(5),
        ..SimConfig::default()
    };
    let shapes = Silhouettes::from_config(&config);
    let mut controllers = roster(&[idle, idle]);
    let mut engine = Engine::new(&config, &shapes, &mut controllers, 5);

    let state = run_to_end(&mut engine);
    assert_eq!(state, EngineState::Terminated(Termination::TickBudget));
    assert_eq!(engine.tick_count(), 5);
    assert_eq!(engine.alive(), 2);
}

#[test]
fn snapshot_lists_live_birds_and_pipes() {
    let config = SimConfig::default();
    let shapes = Silhouettes::from_config(&config);
    let mut controllers = roster(&[idle, always_jump]);
    let mut engine = Engine::new(&config, &shapes, &mut controllers, 5);
    engine.step();

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.tick, 1);
    assert_eq!(snapshot.alive, 2);
    assert_eq!(snapshot.birds[0].agent, 0);
    assert_eq!(snapshot.birds[0].y, 351.5);
    assert_eq!(snapshot.pipes.len(), 1);
    assert_eq!(snapshot.pipes[0].x, config.first_pipe_x - config.scroll_speed);
}

#[test]
fn invariant_checks_catch_corrupted_state() {
    assert_invariant_violation(
        |engine| {
            engine.accumulators.pop();
        },
        InvariantRule::CollectionLengths,
    );
    assert_invariant_violation(
        |engine| engine.birds[0].alive = false,
        InvariantRule::TombstoneInLiveSet,
    );
    assert_invariant_violation(
        |engine| engine.accumulators.swap(0, 1),
        InvariantRule::AgentOrder,
    );
    assert_invariant_violation(
        |engine| {
            engine.track.spawn(800.0);
            engine.track.pipes.swap(0, 1);
        },
        InvariantRule::PipeOrder,
    );
}

#[test]
fn sensing_moves_to_the_next_pipe_after_a_pass() {
    let config = SimConfig {
        gap_center_min: 100,
        gap_center_max: 200,
        ..SimConfig::default()
    };
    let shapes = Silhouettes::from_config(&config);
    let mut seen: Vec<SensorVector> = Vec::new();

    let (next, bird) = {
        let mut controllers = vec![controller_fn(|inputs: &SensorVector| {
            seen.push(*inputs);
            0.0
        })];
        let mut engine = Engine::new(&config, &shapes, &mut controllers, 5);
        // Gap rows 260..460; the bird is one unit past the pipe's x.
        engine.track.pipes[0] = Pipe::new(229.0, 360, 200);

        engine.step();
        assert_eq!(engine.track().pipes().len(), 2);
        engine.step();
        assert_eq!(engine.alive(), 1);
        (engine.track().pipes()[1], engine.birds[0])
    };

    // Nothing follows the crossed pipe yet, so tick 1 still reads it.
    assert_eq!(seen[0], [351.5, 8.5, 108.5]);
    assert_eq!(seen[1], sense(&bird, &next));
    assert!(next.gap_center() < 200);
}

#[test]
fn ground_is_inclusive_and_ceiling_is_strict() {
    let config = SimConfig {
        gravity: 0.0,
        ..SimConfig::default()
    };
    let shapes = Silhouettes::from_config(&config);
    let mut controllers = roster(&[idle, idle, idle, idle]);
    let mut engine = Engine::new(&config, &shapes, &mut controllers, 5);

    let floor = config.ground_y - config.bird_height as f64;
    engine.birds[0] = Bird::new(-200.0, floor);
    engine.birds[1] = Bird::new(-200.0, floor - 0.5);
    engine.birds[2] = Bird::new(-200.0, 0.0);
    engine.birds[3] = Bird::new(-200.0, -0.5);

    assert_eq!(engine.step(), EngineState::Running);
    assert_eq!(engine.alive(), 2);
    assert_eq!(engine.birds[0].y(), floor - 0.5);
    assert_eq!(engine.birds[1].y(), 0.0);

    let causes: Vec<Option<DeathCause>> = engine
        .finish()
        .iter()
        .map(|acc| acc.death.map(|death| death.cause))
        .collect();
    assert_eq!(
        causes,
        vec![Some(DeathCause::Ground), None, None, Some(DeathCause::Ceiling)]
    );
}
