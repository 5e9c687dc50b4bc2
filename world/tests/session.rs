use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    time::Duration,
};

use outbreak_core::{
    ActionEffect, ActionKind, Command, Event, NodeId, Outcome, Rejection, RunPhase,
    SimulationTuning,
};
use outbreak_world::{self as world, query, World, WorldConfig};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const FRAME: Duration = Duration::from_millis(50);

fn quiet_config() -> WorldConfig {
    let mut tuning = SimulationTuning::default();
    tuning.spread.base_rate = 0.0;
    WorldConfig {
        tuning,
        ..WorldConfig::default()
    }
}

fn started(config: WorldConfig, seed: u64) -> World {
    let mut world = World::new(config, seed);
    let mut events = Vec::new();
    world::apply(&mut world, Command::Start, &mut events);
    assert_eq!(events, vec![Event::PhaseChanged {
        phase: RunPhase::Running
    }]);
    world
}

fn healthy_node(world: &World) -> NodeId {
    query::topology(world)
        .nodes()
        .iter()
        .find(|node| !node.infected)
        .map(|node| node.id())
        .expect("at least one healthy node")
}

fn tick(world: &mut World, events: &mut Vec<Event>) {
    world::apply(world, Command::Tick { dt: FRAME }, events);
}

#[test]
fn ticks_are_rejected_before_start() {
    let mut world = World::new(WorldConfig::default(), 7);
    let mut events = Vec::new();
    let result = world.advance(0.05, &mut events);
    assert_eq!(result, Err(Rejection::NotRunning));
    assert_eq!(events, vec![Event::TickRejected {
        rejection: Rejection::NotRunning
    }]);
    assert_eq!(query::session_view(&world).timer, 120.0);
}

#[test]
fn actions_are_rejected_before_start() {
    let mut world = World::new(WorldConfig::default(), 7);
    let mut events = Vec::new();
    assert_eq!(
        world.apply_action(ActionKind::Sweep, None, &mut events),
        Err(Rejection::NotRunning)
    );
    assert_eq!(query::stats(&world).rejections, 1);
}

#[test]
fn pausing_freezes_time_energy_and_cooldowns() {
    let mut world = started(quiet_config(), 3);
    let mut events = Vec::new();
    let target = healthy_node(&world);
    assert!(world.apply_action(ActionKind::Isolate, Some(target), &mut events).is_ok());
    tick(&mut world, &mut events);

    world::apply(&mut world, Command::Pause, &mut events);
    let before = query::session_view(&world);
    let (energy, timer, now) = (before.energy, before.timer, before.now);
    let isolate_remaining = before.cooldown(ActionKind::Isolate).remaining;

    for _ in 0..40 {
        tick(&mut world, &mut events);
    }
    assert_eq!(
        world.apply_action(ActionKind::Isolate, Some(target), &mut events),
        Err(Rejection::NotRunning)
    );

    let paused = query::session_view(&world);
    assert_eq!(paused.phase, RunPhase::Paused);
    assert_eq!(paused.energy, energy);
    assert_eq!(paused.timer, timer);
    assert_eq!(paused.now, now);
    assert_eq!(paused.cooldown(ActionKind::Isolate).remaining, isolate_remaining);

    world::apply(&mut world, Command::TogglePause, &mut events);
    assert_eq!(query::phase(&world), RunPhase::Running);
    tick(&mut world, &mut events);
    assert!(query::session_view(&world).timer < timer);
}

#[test]
fn pause_commands_outside_running_are_ignored() {
    let mut world = World::new(WorldConfig::default(), 5);
    let mut events = Vec::new();
    world::apply(&mut world, Command::Pause, &mut events);
    world::apply(&mut world, Command::TogglePause, &mut events);
    world::apply(&mut world, Command::Resume, &mut events);
    assert!(events.is_empty());
    assert_eq!(query::phase(&world), RunPhase::NotStarted);
}

#[test]
fn second_isolate_inside_cooldown_is_refused() {
    let mut world = started(quiet_config(), 11);
    let mut events = Vec::new();
    let target = healthy_node(&world);

    let receipt = world
        .apply_action(ActionKind::Isolate, Some(target), &mut events)
        .expect("first isolate succeeds");
    assert_eq!(
        receipt.effect,
        ActionEffect::Isolation {
            node: target,
            isolated: true,
        }
    );

    for _ in 0..10 {
        tick(&mut world, &mut events);
    }
    let result = world.apply_action(ActionKind::Isolate, Some(target), &mut events);
    assert!(matches!(result, Err(Rejection::OnCooldown { .. })));
    assert!(query::topology(&world).nodes()[target.index()].isolated);
}

#[test]
fn sweep_window_covers_eight_seconds_of_simulation_time() {
    let mut world = started(quiet_config(), 13);
    let mut events = Vec::new();
    for _ in 0..100 {
        tick(&mut world, &mut events);
    }

    let receipt = world
        .apply_action(ActionKind::Sweep, None, &mut events)
        .expect("sweep applies");
    let started_at = receipt.at;
    assert_eq!(
        receipt.effect,
        ActionEffect::Sweep {
            active_until: started_at + 8.0
        }
    );
    let sweep_factor = query::tuning(&world).spread.sweep_factor;

    while query::phase(&world) == RunPhase::Running {
        let now = query::session_view(&world).now;
        let factor = query::spread_sweep_factor(&world);
        if now <= started_at + 7.999 {
            assert_eq!(factor, sweep_factor, "sweep lapsed early at {now}");
        } else if now >= started_at + 8.001 {
            assert_eq!(factor, 1.0, "sweep lingered at {now}");
            break;
        }
        tick(&mut world, &mut events);
    }
    assert_eq!(query::session_view(&world).sweep_remaining, 0.0);
}

#[test]
fn quiet_run_ends_in_victory_with_completion_bonus() {
    let mut config = quiet_config();
    config.tuning.clock.total_time = 1.0;
    let mut world = started(config, 17);
    let mut events = Vec::new();

    for _ in 0..40 {
        tick(&mut world, &mut events);
    }

    let view = query::session_view(&world);
    assert_eq!(view.phase, RunPhase::Ended(Outcome::Victory));
    assert_eq!(view.timer, 0.0);
    assert_eq!(view.score, 500);
    assert!(events.contains(&Event::RunEnded {
        outcome: Outcome::Victory,
        score: 500,
    }));
    assert!(events.contains(&Event::PhaseChanged {
        phase: RunPhase::Ended(Outcome::Victory)
    }));
}

fn overrun_world() -> World {
    let mut config = WorldConfig::default();
    config.tuning.spread.base_rate = 400.0;
    let mut world = started(config, 19);
    let mut events = Vec::new();
    for _ in 0..2_000 {
        if query::phase(&world) != RunPhase::Running {
            break;
        }
        tick(&mut world, &mut events);
    }
    world
}

#[test]
fn overwhelming_spread_ends_in_defeat() {
    let world = overrun_world();
    let view = query::session_view(&world);
    assert_eq!(view.phase, RunPhase::Ended(Outcome::Defeat));
    assert_eq!(view.risk, 1.0);
    assert!(query::stats(&world).peak_risk >= 1.0);
}

#[test]
fn ended_runs_are_frozen() {
    let mut world = overrun_world();
    let before = query::session_view(&world);
    let (score, timer, energy) = (before.score, before.timer, before.energy);
    let infected: Vec<bool> = before.nodes.iter().map(|node| node.infected).collect();
    let target = NodeId::new(0);

    let mut events = Vec::new();
    for _ in 0..20 {
        tick(&mut world, &mut events);
        for kind in ActionKind::ALL {
            world::apply(
                &mut world,
                Command::Act {
                    kind,
                    target: Some(target),
                },
                &mut events,
            );
        }
        world::apply(&mut world, Command::Start, &mut events);
        world::apply(&mut world, Command::TogglePause, &mut events);
    }

    let after = query::session_view(&world);
    assert_eq!(after.score, score);
    assert_eq!(after.timer, timer);
    assert_eq!(after.energy, energy);
    assert_eq!(
        after.nodes.iter().map(|node| node.infected).collect::<Vec<_>>(),
        infected
    );
    assert!(events.iter().all(|event| matches!(
        event,
        Event::TickRejected { .. }
            | Event::ActionRejected {
                rejection: Rejection::NotRunning,
                ..
            }
    )));
}

#[test]
fn energy_stays_within_bounds_under_random_play() {
    let mut rng = ChaCha8Rng::seed_from_u64(0xe4e7);
    let mut world = started(WorldConfig::default(), 23);
    let mut events = Vec::new();
    let node_count = query::topology(&world).len() as u32;

    for _ in 0..3_000 {
        if rng.gen_bool(0.3) {
            let kind = ActionKind::ALL[rng.gen_range(0..ActionKind::ALL.len())];
            let target = rng
                .gen_bool(0.9)
                .then(|| NodeId::new(rng.gen_range(0..node_count + 2)));
            let _ = world.apply_action(kind, target, &mut events);
        } else {
            let dt = rng.gen_range(-0.05..0.5);
            let _ = world.advance(dt, &mut events);
        }
        let energy = query::session_view(&world).energy;
        assert!((0.0..=100.0).contains(&energy), "energy out of bounds: {energy}");
    }
}

#[test]
fn tick_report_risk_matches_fresh_view() {
    let mut world = started(WorldConfig::default(), 29);
    let mut events = Vec::new();
    for _ in 0..200 {
        let Ok(report) = world.advance(0.05, &mut events) else {
            break;
        };
        let view = query::session_view(&world);
        assert_eq!(report.risk, view.risk);
        assert_eq!(report.infected as usize, query::topology(&world).infected_count());
    }
}

#[test]
fn new_topology_discards_the_run_and_waits_for_start() {
    let mut world = started(WorldConfig::default(), 31);
    let mut events = Vec::new();
    for _ in 0..30 {
        tick(&mut world, &mut events);
    }

    events.clear();
    world::apply(&mut world, Command::NewTopology { seed: 37 }, &mut events);
    assert_eq!(query::phase(&world), RunPhase::NotStarted);
    assert_eq!(query::seed(&world), 37);
    let view = query::session_view(&world);
    assert_eq!(view.timer, 120.0);
    assert_eq!(view.now, 0.0);
    assert_eq!(*query::stats(&world), Default::default());

    let fresh = World::new(WorldConfig::default(), 37);
    assert_eq!(view.nodes, query::session_view(&fresh).nodes);
}

#[test]
fn scripted_sessions_replay_identically() {
    let first = replay(script());
    let second = replay(script());
    assert_eq!(first, second, "replay diverged between runs");
    assert_ne!(first, 0);
}

fn script() -> Vec<Command> {
    let mut commands = vec![Command::Start];
    for step in 0..400u32 {
        commands.push(Command::Tick { dt: FRAME });
        match step {
            20 => commands.push(Command::Act {
                kind: ActionKind::Sweep,
                target: None,
            }),
            40 | 160 => commands.push(Command::Act {
                kind: ActionKind::Patch,
                target: Some(NodeId::new(step % 48)),
            }),
            80 => commands.push(Command::Act {
                kind: ActionKind::Honeypot,
                target: Some(NodeId::new(5)),
            }),
            120 => commands.push(Command::Act {
                kind: ActionKind::Isolate,
                target: None,
            }),
            200 => commands.push(Command::Pause),
            210 => commands.push(Command::Resume),
            _ => {}
        }
    }
    commands
}

fn replay(commands: Vec<Command>) -> u64 {
    let mut world = World::new(WorldConfig::default(), 0x0ddb_a11);
    let mut log = Vec::new();
    for command in commands {
        world::apply(&mut world, command, &mut log);
    }

    let mut hasher = DefaultHasher::new();
    format!("{log:?}").hash(&mut hasher);
    for node in query::topology(&world).nodes() {
        node.infected.hash(&mut hasher);
        node.clean_progress.to_bits().hash(&mut hasher);
    }
    query::session_view(&world).score.hash(&mut hasher);
    hasher.finish()
}
