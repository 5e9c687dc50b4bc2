#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative session state management for the outbreak engine.
//!
//! The world exclusively owns the topology, the gauges, the cooldown ledger
//! and the infection stream of the current session. Hosts mutate it only
//! through [`apply`] (or the typed [`World::advance`] and
//! [`World::apply_action`] shortcuts) and observe it through [`query`].

use std::time::Duration;

use outbreak_core::{
    session_rng, ActionKind, ActionReceipt, Command, Event, NodeId, Rejection, RngStream,
    RunPhase, SessionRng, SimulationTuning, TickReport, Topology, MAX_TICK_SECONDS,
};
use outbreak_system_actions::{ActionRequest, ActionTargets, Actions, CooldownLedger};
use outbreak_system_epidemic::{Epidemic, SpreadClock};
use outbreak_system_outcome::{Clock, Gauges};

mod frame;
mod stats;

pub use frame::FrameClock;
pub use stats::SessionStats;

const DEFAULT_CANVAS_WIDTH: f32 = 960.0;
const DEFAULT_CANVAS_HEIGHT: f32 = 640.0;

/// Canvas dimensions and tuning used for every session of a world.
#[derive(Clone, Debug, PartialEq)]
pub struct WorldConfig {
    /// Canvas width the topology is laid out on.
    pub width: f32,
    /// Canvas height the topology is laid out on.
    pub height: f32,
    /// Tuning applied to generation, spread, cure, clock and actions.
    pub tuning: SimulationTuning,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_CANVAS_WIDTH,
            height: DEFAULT_CANVAS_HEIGHT,
            tuning: SimulationTuning::default(),
        }
    }
}

/// Clamps a host-provided delta into `[0, MAX_TICK_SECONDS]`.
///
/// Non-finite deltas count as zero.
#[must_use]
pub fn clamp_tick(dt: f64) -> f64 {
    if dt.is_finite() {
        dt.clamp(0.0, MAX_TICK_SECONDS)
    } else {
        0.0
    }
}

#[derive(Debug)]
struct Session {
    seed: u64,
    topology: Topology,
    gauges: Gauges,
    ledger: CooldownLedger,
    phase: RunPhase,
    rng: SessionRng,
    stats: SessionStats,
}

impl Session {
    fn generate(config: &WorldConfig, seed: u64) -> Self {
        let topology = outbreak_system_topology::generate_with(
            &config.tuning.topology,
            seed,
            config.width,
            config.height,
        );
        Self {
            seed,
            topology,
            gauges: Gauges::fresh(&config.tuning.clock),
            ledger: CooldownLedger::new(),
            phase: RunPhase::NotStarted,
            rng: session_rng(seed, RngStream::Infection),
            stats: SessionStats::default(),
        }
    }
}

/// Represents the authoritative outbreak world state.
#[derive(Debug)]
pub struct World {
    config: WorldConfig,
    session: Session,
    epidemic: Epidemic,
    actions: Actions,
    clock: Clock,
}

impl World {
    /// Creates a world holding a prepared, not yet started, session for `seed`.
    #[must_use]
    pub fn new(config: WorldConfig, seed: u64) -> Self {
        let tuning = &config.tuning;
        let epidemic = Epidemic::new(tuning.spread.clone(), tuning.cure.clone(), &tuning.score);
        let actions = Actions::new(tuning.actions.clone());
        let clock = Clock::new(tuning.clock.clone(), tuning.score.completion_bonus);
        let session = Session::generate(&config, seed);
        log::info!(
            "prepared session {seed:#x}: {} nodes, {} edges",
            session.topology.len(),
            session.topology.edges().len()
        );
        Self {
            config,
            session,
            epidemic,
            actions,
            clock,
        }
    }

    /// Advances the running session by `dt` seconds, clamped to [`MAX_TICK_SECONDS`].
    ///
    /// Spread and cure run first, then the clock, then risk is recomputed from
    /// the freshly mutated nodes and the outcome decided.
    pub fn advance(&mut self, dt: f64, out: &mut Vec<Event>) -> Result<TickReport, Rejection> {
        let session = &mut self.session;
        if !session.phase.is_running() {
            out.push(Event::TickRejected {
                rejection: Rejection::NotRunning,
            });
            return Err(Rejection::NotRunning);
        }

        let clamped = clamp_tick(dt);
        if clamped < dt {
            log::warn!("clamped frame delta of {dt:.3}s to {clamped:.3}s");
        }
        out.push(Event::TimeAdvanced {
            dt: Duration::from_secs_f64(clamped),
        });

        let spread_clock = SpreadClock {
            now: session.gauges.now,
            sweep_until: session.ledger.sweep_until(),
        };
        let step = self.epidemic.step(
            &mut session.topology,
            spread_clock,
            clamped,
            &mut session.rng,
            out,
        );
        session.gauges.score += step.score;

        let previous = session.phase;
        let evaluation = self.clock.tick(
            &mut session.gauges,
            &session.topology,
            previous,
            clamped,
            out,
        );
        if evaluation.phase != previous {
            session.phase = evaluation.phase;
            out.push(Event::PhaseChanged {
                phase: evaluation.phase,
            });
        }

        let infected = session.topology.infected_count() as u32;
        session.stats.record_tick(&step, evaluation.risk, infected);

        Ok(TickReport {
            dt: clamped,
            now: session.gauges.now,
            risk: evaluation.risk,
            infected,
            newly_infected: step.newly_infected,
            cured: step.cured,
            phase: session.phase,
        })
    }

    /// Applies a player action at the current simulation time.
    pub fn apply_action(
        &mut self,
        kind: ActionKind,
        target: Option<NodeId>,
        out: &mut Vec<Event>,
    ) -> Result<ActionReceipt, Rejection> {
        let session = &mut self.session;
        let request = ActionRequest {
            kind,
            target,
            now: session.gauges.now,
        };
        let result = self.actions.apply(
            request,
            ActionTargets {
                phase: session.phase,
                energy: &mut session.gauges.energy,
                ledger: &mut session.ledger,
                topology: &mut session.topology,
            },
        );

        match result {
            Ok(receipt) => {
                session.stats.actions_applied += 1;
                out.push(Event::ActionApplied { receipt });
            }
            Err(rejection) => {
                session.stats.rejections += 1;
                log::debug!("{kind} rejected: {rejection}");
                out.push(Event::ActionRejected { kind, rejection });
            }
        }
        result
    }

    fn set_phase(&mut self, phase: RunPhase, out: &mut Vec<Event>) {
        if self.session.phase != phase {
            log::info!("phase {:?} -> {:?}", self.session.phase, phase);
            self.session.phase = phase;
            out.push(Event::PhaseChanged { phase });
        }
    }

    fn replace_session(&mut self, seed: u64, out: &mut Vec<Event>) {
        let session = Session::generate(&self.config, seed);
        out.push(Event::SessionStarted {
            seed,
            nodes: session.topology.len() as u32,
            edges: session.topology.edges().len() as u32,
        });
        log::info!(
            "replaced session with {seed:#x}: {} nodes, {} edges",
            session.topology.len(),
            session.topology.edges().len()
        );
        self.session = session;
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Start => {
            if world.session.phase == RunPhase::NotStarted {
                world.set_phase(RunPhase::Running, out_events);
            }
        }
        Command::Pause => {
            if world.session.phase == RunPhase::Running {
                world.set_phase(RunPhase::Paused, out_events);
            }
        }
        Command::Resume => {
            if world.session.phase == RunPhase::Paused {
                world.set_phase(RunPhase::Running, out_events);
            }
        }
        Command::TogglePause => match world.session.phase {
            RunPhase::Running => world.set_phase(RunPhase::Paused, out_events),
            RunPhase::Paused => world.set_phase(RunPhase::Running, out_events),
            RunPhase::NotStarted | RunPhase::Ended(_) => {}
        },
        Command::Restart { seed } => {
            world.replace_session(seed, out_events);
            world.set_phase(RunPhase::Running, out_events);
        }
        Command::NewTopology { seed } => {
            world.replace_session(seed, out_events);
            out_events.push(Event::PhaseChanged {
                phase: RunPhase::NotStarted,
            });
        }
        Command::Tick { dt } => {
            let _ = world.advance(dt.as_secs_f64(), out_events);
        }
        Command::Act { kind, target } => {
            let _ = world.apply_action(kind, target, out_events);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use outbreak_core::{RunPhase, SessionView, SimulationTuning, Topology};
    use outbreak_system_epidemic::sweep_factor;

    use super::{SessionStats, World};

    /// Captures the read-only view handed to hosts once per tick.
    ///
    /// Risk and cooldowns are derived from the current state on every call.
    #[must_use]
    pub fn session_view(world: &World) -> SessionView<'_> {
        let session = &world.session;
        let now = session.gauges.now;
        SessionView {
            nodes: session.topology.nodes(),
            edges: session.topology.edges(),
            energy: session.gauges.energy,
            timer: session.gauges.timer,
            risk: world.clock.risk(&session.topology),
            score: session.gauges.score,
            phase: session.phase,
            now,
            cooldowns: world
                .actions
                .cooldowns(&session.ledger, session.gauges.energy, now),
            sweep_remaining: session.ledger.sweep_remaining(now),
        }
    }

    /// Current run phase.
    #[must_use]
    pub fn phase(world: &World) -> RunPhase {
        world.session.phase
    }

    /// Seed the current session was generated from.
    #[must_use]
    pub fn seed(world: &World) -> u64 {
        world.session.seed
    }

    /// Provides read-only access to the current topology.
    #[must_use]
    pub fn topology(world: &World) -> &Topology {
        &world.session.topology
    }

    /// Counters accumulated over the current session.
    #[must_use]
    pub fn stats(world: &World) -> &SessionStats {
        &world.session.stats
    }

    /// Tuning the world was configured with.
    #[must_use]
    pub fn tuning(world: &World) -> &SimulationTuning {
        &world.config.tuning
    }

    /// Canvas dimensions the topology is laid out on.
    #[must_use]
    pub fn canvas(world: &World) -> (f32, f32) {
        (world.config.width, world.config.height)
    }

    /// Sweep multiplier the next spread evaluation will apply.
    #[must_use]
    pub fn spread_sweep_factor(world: &World) -> f64 {
        let session = &world.session;
        sweep_factor(
            world.epidemic.spread_tuning(),
            session.gauges.now,
            session.ledger.sweep_until(),
        )
    }
}
