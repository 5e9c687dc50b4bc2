#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the outbreak containment engine.
//!
//! This crate defines the data model and the message surface that connects
//! hosts, the authoritative world, and pure systems. Hosts submit [`Command`]
//! values describing desired mutations, the world executes those commands via
//! its `apply` entry point, and then broadcasts [`Event`] values describing
//! what changed. Systems operate on the [`Topology`] owned by the world and
//! never retain references across ticks.

use std::{collections::HashSet, fmt, time::Duration};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod tuning;

pub use tuning::{
    ActionCost, ActionTuning, ClockTuning, CureTuning, ScoreTuning, SimulationTuning,
    SpreadTuning, TopologyTuning,
};

/// Largest simulated step accepted by a single tick, in seconds.
///
/// Hosts clamp wall-clock frame deltas to this bound so that long gaps (for
/// example a backgrounded window) cannot produce a single oversized step.
pub const MAX_TICK_SECONDS: f64 = 0.06;

/// Deterministic generator used for every random draw in a session.
pub type SessionRng = ChaCha8Rng;

/// Independent random streams derived from a single session seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RngStream {
    /// Stream consumed by topology generation.
    Topology,
    /// Stream consumed by per-edge infection trials.
    Infection,
}

impl RngStream {
    const fn id(self) -> u64 {
        match self {
            Self::Topology => 0,
            Self::Infection => 1,
        }
    }
}

/// Constructs the random stream for `seed`, isolated from the other streams of the same seed.
#[must_use]
pub fn session_rng(seed: u64, stream: RngStream) -> SessionRng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(stream.id());
    rng
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Begins the prepared session when the world has not started yet.
    Start,
    /// Suspends a running session.
    Pause,
    /// Resumes a paused session.
    Resume,
    /// Pauses a running session or resumes a paused one.
    TogglePause,
    /// Discards the session and starts a fresh one generated from `seed`.
    Restart {
        /// Seed used to build the replacement topology and infection stream.
        seed: u64,
    },
    /// Discards the session and prepares a fresh, not yet started, one from `seed`.
    NewTopology {
        /// Seed used to build the replacement topology and infection stream.
        seed: u64,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that the player action be applied to the optional target.
    Act {
        /// Action the player issued.
        kind: ActionKind,
        /// Node selected by the player, if any.
        target: Option<NodeId>,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that a fresh session replaced the previous one.
    SessionStarted {
        /// Seed the session was generated from.
        seed: u64,
        /// Number of nodes in the generated topology.
        nodes: u32,
        /// Number of edges in the generated topology.
        edges: u32,
    },
    /// Announces that the run phase changed.
    PhaseChanged {
        /// Phase that became active after processing the command.
        phase: RunPhase,
    },
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Reports that a node was compromised across an edge.
    NodeInfected {
        /// Node that became infected.
        node: NodeId,
        /// Infected neighbour the compromise spread from.
        source: NodeId,
    },
    /// Reports that a patched node finished cleaning.
    NodeCured {
        /// Node that returned to a healthy state.
        node: NodeId,
    },
    /// Reports that score was awarded.
    ScoreAwarded {
        /// Points added to the score.
        amount: u64,
        /// Why the points were granted.
        reason: ScoreReason,
    },
    /// Confirms that a player action was applied.
    ActionApplied {
        /// Details of the applied action.
        receipt: ActionReceipt,
    },
    /// Reports that a player action was refused without any mutation.
    ActionRejected {
        /// Action that was requested.
        kind: ActionKind,
        /// Reason the action was refused.
        rejection: Rejection,
    },
    /// Reports that a tick was refused because the run is not active.
    TickRejected {
        /// Reason the tick was refused.
        rejection: Rejection,
    },
    /// Announces that the run reached a terminal outcome.
    RunEnded {
        /// Outcome of the run.
        outcome: Outcome,
        /// Final score after any completion bonus.
        score: u64,
    },
}

/// Sources of score awarded during a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScoreReason {
    /// A honeypot lured an infection.
    HoneypotLure,
    /// A patched node finished cleaning.
    Cure,
    /// The timer ran out before the network was lost.
    Completion,
}

/// Terminal outcome of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// The network survived until the timer expired.
    Victory,
    /// Risk reached its maximum.
    Defeat,
}

/// Top-level run phase of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunPhase {
    /// Session prepared but the clock has not started.
    NotStarted,
    /// Ticks and actions are accepted.
    Running,
    /// Time is suspended; nothing advances.
    Paused,
    /// The run is over and its state frozen.
    Ended(Outcome),
}

impl RunPhase {
    /// Reports whether ticks and actions are accepted.
    #[must_use]
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }

    /// Returns the terminal outcome, if the run ended.
    #[must_use]
    pub const fn outcome(self) -> Option<Outcome> {
        match self {
            Self::Ended(outcome) => Some(outcome),
            _ => None,
        }
    }
}

/// Player actions available during a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ActionKind {
    /// Toggles isolation of the targeted node.
    Isolate,
    /// Hardens the targeted node and lets it clean itself.
    Patch,
    /// Toggles the honeypot flag on the targeted node.
    Honeypot,
    /// Slows spread across the whole network for a while.
    Sweep,
}

impl ActionKind {
    /// Every action kind in a stable order.
    pub const ALL: [ActionKind; 4] = [Self::Isolate, Self::Patch, Self::Honeypot, Self::Sweep];

    /// Reports whether the action operates on a selected node.
    #[must_use]
    pub const fn requires_target(self) -> bool {
        !matches!(self, Self::Sweep)
    }

    /// Position of the action within [`ActionKind::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Isolate => 0,
            Self::Patch => 1,
            Self::Honeypot => 2,
            Self::Sweep => 3,
        }
    }

    /// Lowercase label suitable for player feedback.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Isolate => "isolate",
            Self::Patch => "patch",
            Self::Honeypot => "honeypot",
            Self::Sweep => "sweep",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Reasons an action or tick may be refused by the world.
///
/// Rejections never mutate state; they are surfaced to the player as feedback.
#[derive(Clone, Copy, Debug, PartialEq, Error, Serialize, Deserialize)]
pub enum Rejection {
    /// The action needs a node but none was selected.
    #[error("no target node selected")]
    NoTargetSelected,
    /// The selected node does not exist in the current topology.
    #[error("node {node} does not exist")]
    UnknownTarget {
        /// Identifier that failed to resolve.
        node: NodeId,
    },
    /// The player cannot afford the action.
    #[error("not enough energy: {required:.0} required, {available:.1} available")]
    InsufficientEnergy {
        /// Energy cost of the action.
        required: f64,
        /// Energy currently available.
        available: f64,
    },
    /// The action was used too recently.
    #[error("{kind} is cooling down for another {remaining:.1}s")]
    OnCooldown {
        /// Action that is still cooling down.
        kind: ActionKind,
        /// Seconds until the action becomes available again.
        remaining: f64,
    },
    /// The run is not in the running phase.
    #[error("the run is not active")]
    NotRunning,
}

/// Observable effect of a successfully applied action.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum ActionEffect {
    /// Isolation of a node was toggled.
    Isolation {
        /// Node whose isolation changed.
        node: NodeId,
        /// Isolation state after the toggle.
        isolated: bool,
    },
    /// A node was hardened.
    Patch {
        /// Node that was patched.
        node: NodeId,
        /// Patch level after the increment.
        level: f64,
    },
    /// The honeypot flag of a node was toggled.
    Honeypot {
        /// Node whose honeypot flag changed.
        node: NodeId,
        /// Honeypot state after the toggle.
        active: bool,
    },
    /// A network-wide sweep was launched.
    Sweep {
        /// Simulation time at which the sweep expires.
        active_until: f64,
    },
}

/// Confirmation returned for an applied action.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionReceipt {
    /// Action that was applied.
    pub kind: ActionKind,
    /// Energy deducted for the action.
    pub energy_spent: f64,
    /// Simulation time the action was stamped with.
    pub at: f64,
    /// Effect the action produced.
    pub effect: ActionEffect,
}

/// Summary of a single processed tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickReport {
    /// Simulated seconds the tick advanced by after clamping.
    pub dt: f64,
    /// Simulation clock after the tick.
    pub now: f64,
    /// Risk computed from the node states this tick produced.
    pub risk: f64,
    /// Number of infected nodes after the tick.
    pub infected: u32,
    /// Number of nodes infected during the tick.
    pub newly_infected: u32,
    /// Number of nodes cured during the tick.
    pub cured: u32,
    /// Run phase after outcome evaluation.
    pub phase: RunPhase,
}

/// Unique identifier assigned to a node; doubles as its index in the node sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    /// Creates a new node identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Index of the node within the topology's node sequence.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Canvas coordinate of a node.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    x: f32,
    y: f32,
}

impl Position {
    /// Creates a new position.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Horizontal coordinate.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical coordinate.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Squared Euclidean distance to `other`.
    #[must_use]
    pub fn distance_squared(self, other: Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// Fixed attributes of a node prior to insertion into a [`Topology`].
#[derive(Clone, Debug, PartialEq)]
pub struct NodeSeed {
    /// Canvas location of the node.
    pub position: Position,
    /// Display label.
    pub name: String,
    /// Intrinsic resistance in `[0, 1]`.
    pub security: f64,
    /// Whether the node is a high-value asset.
    pub critical: bool,
}

/// A single network asset.
///
/// Identity, placement, security and criticality are fixed when the topology
/// is built. The public fields are the per-run state mutated by systems.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    id: NodeId,
    position: Position,
    name: String,
    security: f64,
    critical: bool,
    /// Whether the node is compromised.
    pub infected: bool,
    /// Simulation time of the latest infection, cleared on cure.
    pub infected_at: Option<f64>,
    /// When set, every edge touching the node is inert.
    pub isolated: bool,
    /// Hardening level in `[0, 1]`.
    pub patched: f64,
    /// Whether the node lures infection attempts.
    pub honeypot: bool,
    /// Seconds accumulated toward automatic cure.
    pub clean_progress: f64,
}

impl Node {
    fn from_seed(id: NodeId, seed: NodeSeed) -> Self {
        Self {
            id,
            position: seed.position,
            name: seed.name,
            security: seed.security.clamp(0.0, 1.0),
            critical: seed.critical,
            infected: false,
            infected_at: None,
            isolated: false,
            patched: 0.0,
            honeypot: false,
            clean_progress: 0.0,
        }
    }

    /// Identifier of the node.
    #[must_use]
    pub const fn id(&self) -> NodeId {
        self.id
    }

    /// Canvas location of the node.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Display label of the node.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Intrinsic resistance in `[0, 1]`.
    #[must_use]
    pub const fn security(&self) -> f64 {
        self.security
    }

    /// Whether the node is a high-value asset.
    #[must_use]
    pub const fn critical(&self) -> bool {
        self.critical
    }

    /// Marks the node infected at `now`. Returns `false` if it already was.
    pub fn infect(&mut self, now: f64) -> bool {
        if self.infected {
            return false;
        }
        self.infected = true;
        self.infected_at = Some(now);
        true
    }

    /// Returns the node to a healthy state and clears its cleaning progress.
    pub fn cure(&mut self) {
        self.infected = false;
        self.infected_at = None;
        self.clean_progress = 0.0;
    }
}

/// Undirected link between two distinct nodes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    a: NodeId,
    b: NodeId,
    weight: f64,
}

impl Edge {
    /// Lower endpoint of the edge.
    #[must_use]
    pub const fn a(&self) -> NodeId {
        self.a
    }

    /// Higher endpoint of the edge.
    #[must_use]
    pub const fn b(&self) -> NodeId {
        self.b
    }

    /// Transmission affinity of the edge.
    #[must_use]
    pub const fn weight(&self) -> f64 {
        self.weight
    }

    /// Reports whether `node` is one of the endpoints.
    #[must_use]
    pub fn touches(&self, node: NodeId) -> bool {
        self.a == node || self.b == node
    }
}

/// Deduplicated edge collection for a fixed number of nodes.
///
/// Insertion order is preserved. Self-loops, out-of-range endpoints and
/// repeated unordered pairs are refused.
#[derive(Clone, Debug, Default)]
pub struct EdgeSet {
    node_count: usize,
    edges: Vec<Edge>,
    pairs: HashSet<(u32, u32)>,
}

impl EdgeSet {
    /// Creates an empty edge set for `node_count` nodes.
    #[must_use]
    pub fn new(node_count: usize) -> Self {
        Self {
            node_count,
            edges: Vec::new(),
            pairs: HashSet::new(),
        }
    }

    /// Inserts the undirected edge `a`-`b`. Returns `true` if it was added.
    pub fn insert(&mut self, a: NodeId, b: NodeId, weight: f64) -> bool {
        if a == b || a.index() >= self.node_count || b.index() >= self.node_count {
            return false;
        }
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        if !self.pairs.insert((low.get(), high.get())) {
            return false;
        }
        self.edges.push(Edge {
            a: low,
            b: high,
            weight,
        });
        true
    }

    /// Reports whether the unordered pair is already present.
    #[must_use]
    pub fn contains(&self, a: NodeId, b: NodeId) -> bool {
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        self.pairs.contains(&(low.get(), high.get()))
    }

    /// Number of edges in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Reports whether the set holds no edges.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Node and edge sequences for one session.
///
/// The edge set and node attributes never change after construction; only
/// the per-run node state is mutated by systems.
#[derive(Clone, Debug, Default)]
pub struct Topology {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl Topology {
    /// Builds a topology, assigning identifiers `0..N-1` in seed order.
    ///
    /// Edges referring to nodes beyond the seed list are discarded.
    #[must_use]
    pub fn new(seeds: Vec<NodeSeed>, edges: EdgeSet) -> Self {
        let nodes: Vec<Node> = seeds
            .into_iter()
            .enumerate()
            .map(|(index, seed)| Node::from_seed(NodeId::new(index as u32), seed))
            .collect();
        let count = nodes.len();
        let edges = edges
            .edges
            .into_iter()
            .filter(|edge| edge.b.index() < count)
            .collect();
        Self { nodes, edges }
    }

    /// Node sequence ordered by identifier.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Mutable access to the per-run state of every node.
    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    /// Edge sequence in generation order.
    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Looks up a node by identifier.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Looks up a node by identifier for mutation.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Reports whether the topology holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of edges incident to `node`.
    #[must_use]
    pub fn degree(&self, node: NodeId) -> usize {
        self.edges.iter().filter(|edge| edge.touches(node)).count()
    }

    /// Number of infected nodes.
    #[must_use]
    pub fn infected_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.infected).count()
    }

    /// Number of infected critical nodes.
    #[must_use]
    pub fn critical_infected_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| node.infected && node.critical)
            .count()
    }

    /// Number of nodes currently flagged as honeypots.
    #[must_use]
    pub fn honeypot_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.honeypot).count()
    }
}

/// Gating state of one action as seen by the host.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CooldownView {
    /// Action described by the entry.
    pub kind: ActionKind,
    /// Seconds until the action is off cooldown; zero when ready.
    pub remaining: f64,
    /// Energy cost of the action.
    pub cost: f64,
    /// Whether the current energy covers the cost.
    pub affordable: bool,
}

impl CooldownView {
    /// Reports whether the action may be issued right now, target aside.
    #[must_use]
    pub fn ready(&self) -> bool {
        self.affordable && self.remaining <= 0.0
    }
}

/// Read-only view of a session, valid until the next mutation.
#[derive(Clone, Copy, Debug)]
pub struct SessionView<'a> {
    /// Node sequence ordered by identifier.
    pub nodes: &'a [Node],
    /// Edge sequence.
    pub edges: &'a [Edge],
    /// Energy available for actions.
    pub energy: f64,
    /// Seconds left on the run timer.
    pub timer: f64,
    /// Risk computed from the current node states.
    pub risk: f64,
    /// Accumulated score.
    pub score: u64,
    /// Current run phase.
    pub phase: RunPhase,
    /// Simulation clock.
    pub now: f64,
    /// Gating state of every action, ordered as [`ActionKind::ALL`].
    pub cooldowns: [CooldownView; 4],
    /// Seconds until the active sweep expires; zero when none is active.
    pub sweep_remaining: f64,
}

impl SessionView<'_> {
    /// Gating state for `kind`.
    #[must_use]
    pub fn cooldown(&self, kind: ActionKind) -> &CooldownView {
        &self.cooldowns[kind.index()]
    }
}
