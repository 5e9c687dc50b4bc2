//! Tuning constants for generation, spread, cure, the clock and player actions.

use crate::ActionKind;

/// Aggregated tuning knobs controlling every adjustable aspect of a session.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SimulationTuning {
    /// Shape of the generated network.
    pub topology: TopologyTuning,
    /// Hazard-rate composition for the spread phase.
    pub spread: SpreadTuning,
    /// Automatic cleaning of patched nodes.
    pub cure: CureTuning,
    /// Timer, energy and risk evaluation.
    pub clock: ClockTuning,
    /// Player action costs and effects.
    pub actions: ActionTuning,
    /// Score awarded for lures, cures and completion.
    pub score: ScoreTuning,
}

/// Parameters that shape the generated topology.
#[derive(Clone, Debug, PartialEq)]
pub struct TopologyTuning {
    /// Total number of nodes.
    pub node_count: usize,
    /// Number of concentric rings the nodes are spread across.
    pub ring_count: usize,
    /// Outer ring radius as a fraction of the smaller canvas dimension.
    pub span_fraction: f32,
    /// Angular offset applied per ring index, in radians.
    pub ring_phase: f32,
    /// Maximum absolute angular jitter, in radians.
    pub angular_jitter: f32,
    /// Maximum absolute radial jitter as a fraction of the smaller canvas dimension.
    pub radial_jitter_fraction: f32,
    /// Preferred distance kept between nodes and the canvas border.
    pub edge_margin: f32,
    /// Lower bound of the uniform security draw.
    pub security_min: f64,
    /// Upper bound (exclusive) of the uniform security draw.
    pub security_max: f64,
    /// Number of critical assets.
    pub critical_count: usize,
    /// Security added to critical assets, capped at 1.
    pub critical_security_bonus: f64,
    /// Nearest neighbours every node links to.
    pub nearest_neighbors: usize,
    /// Largest random number of extra nearest neighbours per node.
    pub extra_neighbors: usize,
    /// Number of long-range links, as a divisor of the node count.
    pub long_range_divisor: usize,
    /// Lower bound of the uniform edge weight draw.
    pub weight_min: f64,
    /// Upper bound (exclusive) of the uniform edge weight draw.
    pub weight_max: f64,
    /// Nodes infected when the session starts.
    pub initial_infected: usize,
}

impl Default for TopologyTuning {
    fn default() -> Self {
        Self {
            node_count: 48,
            ring_count: 4,
            span_fraction: 0.42,
            ring_phase: 0.37,
            angular_jitter: 0.18,
            radial_jitter_fraction: 0.035,
            edge_margin: 16.0,
            security_min: 0.3,
            security_max: 0.85,
            critical_count: 4,
            critical_security_bonus: 0.25,
            nearest_neighbors: 3,
            extra_neighbors: 1,
            long_range_divisor: 6,
            weight_min: 0.4,
            weight_max: 1.4,
            initial_infected: 2,
        }
    }
}

/// Factors composed into the per-edge hazard rate.
#[derive(Clone, Debug, PartialEq)]
pub struct SpreadTuning {
    /// Baseline infection intensity per second.
    pub base_rate: f64,
    /// Multiplier applied while a sweep is active.
    pub sweep_factor: f64,
    /// Global slowdown contributed by each honeypot.
    pub honeypot_slow_per_node: f64,
    /// Cap on the total honeypot slowdown.
    pub honeypot_slow_cap: f64,
    /// Attraction multiplier for honeypot destinations.
    pub honeypot_lure: f64,
    /// Susceptibility removed per unit of patch level.
    pub patch_hardening: f64,
    /// Susceptibility removed per unit of security.
    pub security_resistance: f64,
}

impl Default for SpreadTuning {
    fn default() -> Self {
        Self {
            base_rate: 0.14,
            sweep_factor: 0.35,
            honeypot_slow_per_node: 0.06,
            honeypot_slow_cap: 0.30,
            honeypot_lure: 1.8,
            patch_hardening: 0.75,
            security_resistance: 0.7,
        }
    }
}

/// Cleaning rates for infected, patched nodes.
#[derive(Clone, Debug, PartialEq)]
pub struct CureTuning {
    /// Progress per second for any patched, infected node.
    pub base_rate: f64,
    /// Extra progress per second per unit of patch level.
    pub patch_bonus_rate: f64,
    /// Progress required before the node is cured, in seconds.
    pub threshold: f64,
    /// Progress lost per second while cleaning is not under way.
    pub decay_rate: f64,
}

impl Default for CureTuning {
    fn default() -> Self {
        Self {
            base_rate: 0.6,
            patch_bonus_rate: 0.8,
            threshold: 6.5,
            decay_rate: 1.0,
        }
    }
}

/// Timer, energy and risk parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct ClockTuning {
    /// Length of a run, in seconds.
    pub total_time: f64,
    /// Energy available when a run starts.
    pub starting_energy: f64,
    /// Energy ceiling.
    pub max_energy: f64,
    /// Energy regained per second.
    pub energy_regen: f64,
    /// Risk added per infected critical node.
    pub critical_penalty: f64,
}

impl Default for ClockTuning {
    fn default() -> Self {
        Self {
            total_time: 120.0,
            starting_energy: 60.0,
            max_energy: 100.0,
            energy_regen: 8.0,
            critical_penalty: 0.22,
        }
    }
}

/// Energy cost and cooldown of an action.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActionCost {
    /// Energy deducted on use.
    pub energy: f64,
    /// Seconds that must pass between uses.
    pub cooldown: f64,
}

impl ActionCost {
    /// Creates a new cost descriptor.
    #[must_use]
    pub const fn new(energy: f64, cooldown: f64) -> Self {
        Self { energy, cooldown }
    }
}

/// Costs and effect sizes of the player actions.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionTuning {
    /// Cost of toggling isolation.
    pub isolate: ActionCost,
    /// Cost of patching.
    pub patch: ActionCost,
    /// Cost of toggling a honeypot.
    pub honeypot: ActionCost,
    /// Cost of a network-wide sweep.
    pub sweep: ActionCost,
    /// Patch level added per patch action.
    pub patch_increment: f64,
    /// Seconds a sweep stays active.
    pub sweep_duration: f64,
}

impl ActionTuning {
    /// Cost descriptor for `kind`.
    #[must_use]
    pub const fn cost(&self, kind: ActionKind) -> ActionCost {
        match kind {
            ActionKind::Isolate => self.isolate,
            ActionKind::Patch => self.patch,
            ActionKind::Honeypot => self.honeypot,
            ActionKind::Sweep => self.sweep,
        }
    }
}

impl Default for ActionTuning {
    fn default() -> Self {
        Self {
            isolate: ActionCost::new(18.0, 1.2),
            patch: ActionCost::new(24.0, 1.4),
            honeypot: ActionCost::new(28.0, 4.0),
            sweep: ActionCost::new(36.0, 12.0),
            patch_increment: 0.6,
            sweep_duration: 8.0,
        }
    }
}

/// Score granted for notable events.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoreTuning {
    /// Awarded when a honeypot lures an infection.
    pub lure_bonus: u64,
    /// Awarded when a patched node is cured.
    pub cure_bonus: u64,
    /// Awarded when the timer expires without defeat.
    pub completion_bonus: u64,
}

impl Default for ScoreTuning {
    fn default() -> Self {
        Self {
            lure_bonus: 15,
            cure_bonus: 25,
            completion_bonus: 500,
        }
    }
}
