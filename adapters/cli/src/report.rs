//! End-of-run summary printed by the CLI.

use std::fmt::{self, Write as _};

use outbreak_core::Topology;
use outbreak_world::{query, World};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::host::HostLog;

/// Serializable summary of a finished (or abandoned) session.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub(crate) struct Summary {
    pub(crate) seed: u64,
    pub(crate) outcome: String,
    pub(crate) score: u64,
    pub(crate) risk: f64,
    pub(crate) timer: f64,
    pub(crate) energy: f64,
    pub(crate) simulated_seconds: f64,
    pub(crate) canvas: [f32; 2],
    pub(crate) nodes: usize,
    pub(crate) edges: usize,
    pub(crate) infected: usize,
    pub(crate) topology_fingerprint: String,
    pub(crate) stats: StatsSummary,
    pub(crate) host: HostSummary,
}

/// Session counters copied out of the world.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub(crate) struct StatsSummary {
    pub(crate) ticks: u64,
    pub(crate) infections: u64,
    pub(crate) cures: u64,
    pub(crate) actions_applied: u64,
    pub(crate) rejections: u64,
    pub(crate) peak_risk: f64,
    pub(crate) peak_infected: u32,
}

/// Frame loop counters.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub(crate) struct HostSummary {
    pub(crate) frames: u64,
    pub(crate) host_seconds: f64,
    pub(crate) clamped_frames: u64,
    pub(crate) replacements: u32,
    pub(crate) unplayed_inputs: usize,
}

impl Summary {
    /// Collects the summary of the world's current session.
    #[must_use]
    pub(crate) fn collect(world: &World, host: &HostLog) -> Self {
        let view = query::session_view(world);
        let topology = query::topology(world);
        let stats = query::stats(world);
        let (width, height) = query::canvas(world);
        let outcome = match view.phase.outcome() {
            Some(outcome) => format!("{outcome:?}").to_lowercase(),
            None => "unfinished".to_owned(),
        };

        Self {
            seed: query::seed(world),
            outcome,
            score: view.score,
            risk: view.risk,
            timer: view.timer,
            energy: view.energy,
            simulated_seconds: view.now,
            canvas: [width, height],
            nodes: topology.len(),
            edges: topology.edges().len(),
            infected: topology.infected_count(),
            topology_fingerprint: fingerprint(topology),
            stats: StatsSummary {
                ticks: stats.ticks,
                infections: stats.infections,
                cures: stats.cures,
                actions_applied: stats.actions_applied,
                rejections: stats.rejections,
                peak_risk: stats.peak_risk,
                peak_infected: stats.peak_infected,
            },
            host: HostSummary {
                frames: host.frames,
                host_seconds: host.elapsed,
                clamped_frames: host.clamped_frames,
                replacements: host.replacements,
                unplayed_inputs: host.unplayed_inputs,
            },
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "seed        {:#018x}", self.seed)?;
        writeln!(f, "outcome     {}", self.outcome)?;
        writeln!(f, "score       {}", self.score)?;
        writeln!(
            f,
            "risk        {:.3} (peak {:.3})",
            self.risk, self.stats.peak_risk
        )?;
        writeln!(
            f,
            "infected    {}/{} (peak {})",
            self.infected, self.nodes, self.stats.peak_infected
        )?;
        writeln!(
            f,
            "clock       {:.2}s simulated, {:.2}s left",
            self.simulated_seconds, self.timer
        )?;
        writeln!(f, "canvas      {}x{}", self.canvas[0], self.canvas[1])?;
        writeln!(
            f,
            "spread      {} infections, {} cures",
            self.stats.infections, self.stats.cures
        )?;
        writeln!(
            f,
            "actions     {} applied, {} refused",
            self.stats.actions_applied, self.stats.rejections
        )?;
        writeln!(
            f,
            "frames      {} over {:.2}s ({} clamped)",
            self.host.frames, self.host.host_seconds, self.host.clamped_frames
        )?;
        write!(f, "topology    {}", self.topology_fingerprint)
    }
}

/// SHA-256 over node layout and edges, hex encoded.
#[must_use]
pub(crate) fn fingerprint(topology: &Topology) -> String {
    let mut hasher = Sha256::new();
    for node in topology.nodes() {
        let position = node.position();
        hasher.update(node.id().get().to_le_bytes());
        hasher.update(position.x().to_bits().to_le_bytes());
        hasher.update(position.y().to_bits().to_le_bytes());
        hasher.update(node.security().to_bits().to_le_bytes());
        hasher.update([u8::from(node.critical())]);
        hasher.update(node.name().as_bytes());
    }
    for edge in topology.edges() {
        hasher.update(edge.a().get().to_le_bytes());
        hasher.update(edge.b().get().to_le_bytes());
        hasher.update(edge.weight().to_bits().to_le_bytes());
    }

    let digest = hasher.finalize();
    let mut encoded = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(encoded, "{byte:02x}");
    }
    encoded
}

/// Derives a session seed from a free-form phrase.
#[must_use]
pub(crate) fn seed_from_phrase(phrase: &str) -> u64 {
    let digest = Sha256::digest(phrase.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}
