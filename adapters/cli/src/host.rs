//! Headless frame loop driving a world the way an interactive host would.

use anyhow::{anyhow, bail, Result};
use outbreak_core::{ActionKind, Command, Event, NodeId, RunPhase, SessionView, Topology};
use outbreak_input::{command, select, SELECT_RADIUS};
use outbreak_world::{self as world, query, FrameClock, World};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

use crate::script::Script;

const HOST_STREAM: u64 = 0x686f_7374;
const SWEEP_INFECTED_THRESHOLD: usize = 5;

/// Decides which inputs the host feeds the world.
#[derive(Debug)]
pub(crate) enum Pilot {
    /// Never acts; the outbreak runs its course.
    Idle,
    /// Greedy player spending energy as soon as something useful is ready.
    Auto,
    /// Replays scripted key presses and clicks.
    Script(Script),
}

/// Frame pacing of the host loop.
#[derive(Clone, Copy, Debug)]
pub(crate) struct FramePacing {
    /// Mean host frame rate.
    pub(crate) fps: f64,
    /// Standard deviation of a frame's length, in seconds.
    pub(crate) jitter: f64,
    /// Host time after which the loop gives up on an unfinished run.
    pub(crate) max_host_seconds: f64,
}

/// What the host observed while driving the world.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct HostLog {
    /// Frames presented, including the first one that only primes the clock.
    pub(crate) frames: u64,
    /// Host seconds elapsed.
    pub(crate) elapsed: f64,
    /// Frames whose delta exceeded the tick bound.
    pub(crate) clamped_frames: u64,
    /// Sessions replaced by restart or new topology commands.
    pub(crate) replacements: u32,
    /// Scripted inputs that never fired.
    pub(crate) unplayed_inputs: usize,
}

/// Drives `world` frame by frame until the run ends or host time runs out.
pub(crate) fn run(
    world: &mut World,
    pilot: &mut Pilot,
    pacing: FramePacing,
    seed: u64,
) -> Result<HostLog> {
    if !(pacing.fps.is_finite() && pacing.fps > 0.0) {
        bail!("frame rate must be positive, got {}", pacing.fps);
    }
    if !(pacing.jitter.is_finite() && pacing.jitter >= 0.0) {
        bail!("frame jitter must be a non-negative number of seconds, got {}", pacing.jitter);
    }
    let frame_length = Normal::new(1.0 / pacing.fps, pacing.jitter)
        .map_err(|error| anyhow!("invalid frame pacing: {error}"))?;
    let mut rng = ChaCha8Rng::seed_from_u64(seed ^ HOST_STREAM);
    let mut clock = FrameClock::new();
    let mut selection: Option<NodeId> = None;
    let mut events = Vec::new();
    let mut observed = HostLog::default();

    world::apply(world, Command::Start, &mut events);
    while observed.elapsed <= pacing.max_host_seconds {
        let length: f64 = frame_length.sample(&mut rng);
        observed.elapsed += length.max(0.0);
        observed.frames += 1;
        let Some(dt) = clock.frame(observed.elapsed) else {
            continue;
        };

        for command in pilot.commands(world, &mut selection, observed.elapsed, &mut rng) {
            world::apply(world, command, &mut events);
        }
        world::apply(world, Command::Tick { dt }, &mut events);

        for event in events.drain(..) {
            match event {
                Event::SessionStarted { seed, nodes, edges } => {
                    observed.replacements += 1;
                    selection = None;
                    log::info!("session {seed:#x} replaced the run ({nodes} nodes, {edges} edges)");
                }
                Event::PhaseChanged { phase } => {
                    clock.reset();
                    log::debug!("phase changed to {phase:?} at {:.2}s", observed.elapsed);
                }
                Event::ActionRejected { kind, rejection } => {
                    log::debug!("{kind} refused: {rejection}");
                }
                Event::RunEnded { outcome, score } => {
                    log::info!("run ended in {outcome:?} with score {score}");
                }
                _ => {}
            }
        }

        match query::phase(world) {
            RunPhase::Ended(_) => break,
            RunPhase::NotStarted => world::apply(world, Command::Start, &mut events),
            RunPhase::Running | RunPhase::Paused => {}
        }
    }

    observed.clamped_frames = clock.clamped_frames();
    if let Pilot::Script(script) = pilot {
        observed.unplayed_inputs = script.pending();
    }
    if query::phase(world).outcome().is_none() {
        log::warn!(
            "host gave up after {:.1}s with the run still {:?}",
            observed.elapsed,
            query::phase(world)
        );
    }
    Ok(observed)
}

impl Pilot {
    fn commands(
        &mut self,
        world: &World,
        selection: &mut Option<NodeId>,
        now: f64,
        rng: &mut ChaCha8Rng,
    ) -> Vec<Command> {
        match self {
            Self::Idle => Vec::new(),
            Self::Auto => greedy(&query::session_view(world), query::topology(world))
                .into_iter()
                .collect(),
            Self::Script(script) => {
                let nodes = query::topology(world).nodes();
                let mut commands = Vec::new();
                for entry in script.due(now) {
                    if let Some(point) = entry.click {
                        *selection = select(nodes, point, SELECT_RADIUS);
                    }
                    let Some(key) = entry.key else {
                        continue;
                    };
                    match command(key) {
                        Some(host_command) => {
                            commands.push(host_command.into_command(*selection, rng.next_u64()));
                        }
                        None => log::warn!("ignoring unmapped key {key:?} at {now:.2}s"),
                    }
                }
                commands
            }
        }
    }
}

/// Picks the most useful ready action: sweep a spreading outbreak, patch the
/// infected node closest to critical assets, or cut off the busiest carrier.
pub(crate) fn greedy(view: &SessionView<'_>, topology: &Topology) -> Option<Command> {
    if !view.phase.is_running() {
        return None;
    }
    let ready = |kind: ActionKind| view.cooldown(kind).ready();
    let infected = topology.infected_count();

    if ready(ActionKind::Sweep)
        && infected >= SWEEP_INFECTED_THRESHOLD
        && view.sweep_remaining <= 0.0
    {
        return Some(Command::Act {
            kind: ActionKind::Sweep,
            target: None,
        });
    }

    if ready(ActionKind::Patch) {
        let target = topology
            .nodes()
            .iter()
            .filter(|node| node.infected && node.patched < 1.0)
            .max_by_key(|node| {
                let id = node.id();
                (
                    critical_neighbours(topology, id),
                    topology.degree(id),
                    std::cmp::Reverse(id),
                )
            })
            .map(|node| node.id());
        if target.is_some() {
            return Some(Command::Act {
                kind: ActionKind::Patch,
                target,
            });
        }
    }

    if ready(ActionKind::Isolate) {
        let target = topology
            .nodes()
            .iter()
            .filter(|node| node.infected && !node.isolated)
            .max_by_key(|node| (topology.degree(node.id()), std::cmp::Reverse(node.id())))
            .map(|node| node.id());
        if target.is_some() {
            return Some(Command::Act {
                kind: ActionKind::Isolate,
                target,
            });
        }
    }

    None
}

fn critical_neighbours(topology: &Topology, node: NodeId) -> usize {
    topology
        .edges()
        .iter()
        .filter(|edge| edge.touches(node))
        .map(|edge| if edge.a() == node { edge.b() } else { edge.a() })
        .filter(|other| topology.node(*other).is_some_and(|other| other.critical()))
        .count()
}

#[cfg(test)]
mod tests {
    use outbreak_world::WorldConfig;

    use super::*;

    fn pacing() -> FramePacing {
        FramePacing {
            fps: 60.0,
            jitter: 0.004,
            max_host_seconds: 200.0,
        }
    }

    #[test]
    fn greedy_waits_until_the_run_is_running() {
        let world = World::new(WorldConfig::default(), 3);
        assert_eq!(
            greedy(&query::session_view(&world), query::topology(&world)),
            None
        );
    }

    #[test]
    fn greedy_patches_an_infected_node_first() {
        let mut world = World::new(WorldConfig::default(), 3);
        let mut events = Vec::new();
        world::apply(&mut world, Command::Start, &mut events);
        let command = greedy(&query::session_view(&world), query::topology(&world));
        let Some(Command::Act {
            kind: ActionKind::Patch,
            target: Some(target),
        }) = command
        else {
            panic!("expected a patch, got {command:?}");
        };
        assert!(query::topology(&world).nodes()[target.index()].infected);
    }

    #[test]
    fn idle_run_finishes_and_reports_frames() {
        let mut config = WorldConfig::default();
        config.tuning.clock.total_time = 3.0;
        let mut world = World::new(config, 5);
        let observed = run(&mut world, &mut Pilot::Idle, pacing(), 5).expect("valid pacing");
        assert!(query::phase(&world).outcome().is_some());
        assert!(observed.frames > 150);
        assert!(observed.elapsed >= 3.0);
        assert_eq!(observed.replacements, 0);
    }

    #[test]
    fn scripted_restart_replaces_the_session() {
        let mut config = WorldConfig::default();
        config.tuning.clock.total_time = 4.0;
        let mut world = World::new(config, 5);
        let mut pilot = Pilot::Script(Script::parse("1@r;2@n;99@i").expect("valid script"));
        let observed = run(&mut world, &mut pilot, pacing(), 5).expect("valid pacing");
        assert_eq!(observed.replacements, 2);
        assert_eq!(observed.unplayed_inputs, 1);
        assert_ne!(query::seed(&world), 5);
    }

    #[test]
    fn negative_jitter_is_refused() {
        let mut world = World::new(WorldConfig::default(), 5);
        let pacing = FramePacing {
            jitter: -1.0,
            ..pacing()
        };
        assert!(run(&mut world, &mut Pilot::Idle, pacing, 5).is_err());
        assert_eq!(query::phase(&world), RunPhase::NotStarted);
    }

    #[test]
    fn degenerate_frame_rates_are_refused() {
        for fps in [0.0, -30.0, f64::NAN, f64::INFINITY] {
            let mut world = World::new(WorldConfig::default(), 5);
            let pacing = FramePacing { fps, ..pacing() };
            assert!(run(&mut world, &mut Pilot::Idle, pacing, 5).is_err());
        }
    }

    #[test]
    fn zero_jitter_is_accepted() {
        let mut config = WorldConfig::default();
        config.tuning.clock.total_time = 1.0;
        let mut world = World::new(config, 5);
        let pacing = FramePacing {
            jitter: 0.0,
            ..pacing()
        };
        assert!(run(&mut world, &mut Pilot::Idle, pacing, 5).is_ok());
        assert!(query::phase(&world).outcome().is_some());
    }
}
