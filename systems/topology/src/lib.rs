#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic topology generation for outbreak sessions.
//!
//! Nodes are laid out on concentric rings around the canvas centre, wired to
//! their nearest neighbours plus a handful of long-range links, and two of
//! them are compromised before the first tick. The same seed and canvas
//! dimensions always reproduce the same topology.

use std::f32::consts::TAU;

use outbreak_core::{
    session_rng, EdgeSet, NodeId, NodeSeed, Position, RngStream, Topology, TopologyTuning,
};
use rand::{seq::index::sample, Rng};

const CRITICAL_NAMES: [&str; 6] = [
    "Domain Controller",
    "Core Database",
    "Payment Gateway",
    "Backup Vault",
    "Identity Provider",
    "Build Server",
];

const NAME_PREFIXES: [&str; 6] = ["WS", "SRV", "DB", "IOT", "VPN", "NAS"];

/// Attempts allowed per requested long-range link before giving up.
const LONG_RANGE_ATTEMPTS: usize = 8;

/// Generates the topology for `seed` on a `width` x `height` canvas using default tuning.
#[must_use]
pub fn generate(seed: u64, width: f32, height: f32) -> Topology {
    generate_with(&TopologyTuning::default(), seed, width, height)
}

/// Generates the topology for `seed` using the provided tuning.
#[must_use]
pub fn generate_with(tuning: &TopologyTuning, seed: u64, width: f32, height: f32) -> Topology {
    let mut rng = session_rng(seed, RngStream::Topology);
    generate_from_rng(tuning, &mut rng, width, height)
}

/// Generates a topology drawing every random value from `rng`.
pub fn generate_from_rng<R: Rng + ?Sized>(
    tuning: &TopologyTuning,
    rng: &mut R,
    width: f32,
    height: f32,
) -> Topology {
    let canvas = Canvas::new(width, height, tuning.edge_margin);
    let mut seeds = place_nodes(tuning, &canvas, rng);
    designate_critical(tuning, &mut seeds, rng);
    let edges = connect(tuning, &seeds, rng);

    let mut topology = Topology::new(seeds, edges);
    let count = topology.len();
    for index in sample(rng, count, tuning.initial_infected.min(count)) {
        if let Some(node) = topology.node_mut(NodeId::new(index as u32)) {
            let _ = node.infect(0.0);
        }
    }
    topology
}

#[derive(Clone, Copy, Debug)]
struct Canvas {
    width: f32,
    height: f32,
    margin_x: f32,
    margin_y: f32,
}

impl Canvas {
    fn new(width: f32, height: f32, margin: f32) -> Self {
        let width = sanitize_dimension(width);
        let height = sanitize_dimension(height);
        let margin = margin.max(0.0);
        Self {
            width,
            height,
            margin_x: margin.min(width / 2.0),
            margin_y: margin.min(height / 2.0),
        }
    }

    fn center(&self) -> (f32, f32) {
        (self.width / 2.0, self.height / 2.0)
    }

    fn min_dimension(&self) -> f32 {
        self.width.min(self.height)
    }

    fn clamp(&self, x: f32, y: f32) -> Position {
        Position::new(
            x.clamp(self.margin_x, self.width - self.margin_x),
            y.clamp(self.margin_y, self.height - self.margin_y),
        )
    }
}

fn sanitize_dimension(value: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        1.0
    }
}

fn place_nodes<R: Rng + ?Sized>(
    tuning: &TopologyTuning,
    canvas: &Canvas,
    rng: &mut R,
) -> Vec<NodeSeed> {
    let count = tuning.node_count;
    let rings = tuning.ring_count.clamp(1, count.max(1));
    let per_ring = count.div_ceil(rings).max(1);
    let (center_x, center_y) = canvas.center();
    let span = canvas.min_dimension() * tuning.span_fraction;
    let radial_jitter = canvas.min_dimension() * tuning.radial_jitter_fraction;

    let mut seeds = Vec::with_capacity(count);
    for index in 0..count {
        let ring = (index / per_ring).min(rings - 1);
        let slot = index - ring * per_ring;
        let ring_len = per_ring.min(count - ring * per_ring).max(1);

        let angle = TAU * slot as f32 / ring_len as f32
            + ring as f32 * tuning.ring_phase
            + symmetric(rng, tuning.angular_jitter);
        let radius =
            span * (ring + 1) as f32 / rings as f32 + symmetric(rng, radial_jitter);
        let position = canvas.clamp(
            center_x + radius * angle.cos(),
            center_y + radius * angle.sin(),
        );

        let security = uniform(rng, tuning.security_min, tuning.security_max);
        let prefix = NAME_PREFIXES[rng.gen_range(0..NAME_PREFIXES.len())];
        seeds.push(NodeSeed {
            position,
            name: format!("{prefix}-{index:02}"),
            security,
            critical: false,
        });
    }
    seeds
}

fn designate_critical<R: Rng + ?Sized>(
    tuning: &TopologyTuning,
    seeds: &mut [NodeSeed],
    rng: &mut R,
) {
    let count = tuning.critical_count.min(seeds.len());
    for (rank, index) in sample(rng, seeds.len(), count).into_iter().enumerate() {
        let seed = &mut seeds[index];
        seed.critical = true;
        seed.security = (seed.security + tuning.critical_security_bonus).min(1.0);
        seed.name = CRITICAL_NAMES[rank % CRITICAL_NAMES.len()].to_owned();
    }
}

fn connect<R: Rng + ?Sized>(tuning: &TopologyTuning, seeds: &[NodeSeed], rng: &mut R) -> EdgeSet {
    let count = seeds.len();
    let mut edges = EdgeSet::new(count);
    if count < 2 {
        return edges;
    }

    let mut neighbours: Vec<(f32, usize)> = Vec::with_capacity(count - 1);
    for (index, seed) in seeds.iter().enumerate() {
        neighbours.clear();
        neighbours.extend(
            seeds
                .iter()
                .enumerate()
                .filter(|(other, _)| *other != index)
                .map(|(other, candidate)| {
                    (seed.position.distance_squared(candidate.position), other)
                }),
        );
        neighbours.sort_by(|left, right| left.0.total_cmp(&right.0).then(left.1.cmp(&right.1)));

        let wanted = tuning.nearest_neighbors + rng.gen_range(0..=tuning.extra_neighbors);
        for &(_, other) in neighbours.iter().take(wanted) {
            let a = NodeId::new(index as u32);
            let b = NodeId::new(other as u32);
            if !edges.contains(a, b) {
                let weight = uniform(rng, tuning.weight_min, tuning.weight_max);
                let _ = edges.insert(a, b, weight);
            }
        }
    }

    let long_range = count / tuning.long_range_divisor.max(1);
    let mut added = 0;
    let mut attempts = 0;
    while added < long_range && attempts < long_range * LONG_RANGE_ATTEMPTS {
        attempts += 1;
        let a = NodeId::new(rng.gen_range(0..count) as u32);
        let b = NodeId::new(rng.gen_range(0..count) as u32);
        if a == b || edges.contains(a, b) {
            continue;
        }
        let weight = uniform(rng, tuning.weight_min, tuning.weight_max);
        if edges.insert(a, b, weight) {
            added += 1;
        }
    }
    edges
}

fn symmetric<R: Rng + ?Sized>(rng: &mut R, amplitude: f32) -> f32 {
    if amplitude > 0.0 {
        rng.gen_range(-amplitude..amplitude)
    } else {
        0.0
    }
}

fn uniform<R: Rng + ?Sized>(rng: &mut R, low: f64, high: f64) -> f64 {
    if low < high {
        rng.gen_range(low..high)
    } else {
        low
    }
}
