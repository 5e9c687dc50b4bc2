#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-tick spread and cure computation over a session topology.
//!
//! Each edge carries an independent exponential waiting time in both
//! directions. The hazard rate of a direction is the product of the baseline
//! rate, the global sweep and honeypot dampers, the edge weight and the
//! destination's lure, hardening and resistance. A tick of `dt` seconds turns
//! the rate into the probability `1 - exp(-λ·dt)` and performs one uniform
//! draw per eligible direction. Cleaning of patched nodes is deterministic.

use outbreak_core::{CureTuning, Event, Node, NodeId, ScoreReason, ScoreTuning, SpreadTuning, Topology};
use rand::Rng;

/// Simulation times relevant to a spread evaluation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpreadClock {
    /// Simulation time at the start of the tick.
    pub now: f64,
    /// Simulation time at which the active sweep expires.
    pub sweep_until: f64,
}

/// Tally of what a single step changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepSummary {
    /// Nodes infected during the step.
    pub newly_infected: u32,
    /// Nodes cured during the step.
    pub cured: u32,
    /// Score earned from lures and cures during the step.
    pub score: u64,
}

/// Spread and cure model.
#[derive(Debug)]
pub struct Epidemic {
    spread: SpreadTuning,
    cure: CureTuning,
    lure_bonus: u64,
    cure_bonus: u64,
    sources: Vec<bool>,
}

impl Default for Epidemic {
    fn default() -> Self {
        Self::new(
            SpreadTuning::default(),
            CureTuning::default(),
            &ScoreTuning::default(),
        )
    }
}

impl Epidemic {
    /// Creates a new model using the provided tuning.
    #[must_use]
    pub fn new(spread: SpreadTuning, cure: CureTuning, score: &ScoreTuning) -> Self {
        Self {
            spread,
            cure,
            lure_bonus: score.lure_bonus,
            cure_bonus: score.cure_bonus,
            sources: Vec::new(),
        }
    }

    /// Spread tuning used by the model.
    #[must_use]
    pub fn spread_tuning(&self) -> &SpreadTuning {
        &self.spread
    }

    /// Advances infection and cleaning by `dt` seconds.
    ///
    /// Only nodes infected when the step begins act as sources. Randomness is
    /// consumed exclusively by infection draws, one per eligible direction.
    pub fn step<R: Rng + ?Sized>(
        &mut self,
        topology: &mut Topology,
        clock: SpreadClock,
        dt: f64,
        rng: &mut R,
        out: &mut Vec<Event>,
    ) -> StepSummary {
        let mut summary = StepSummary::default();
        if dt <= 0.0 {
            return summary;
        }

        self.spread_phase(topology, clock, dt, rng, &mut summary, out);
        self.cure_phase(topology, dt, &mut summary, out);
        summary
    }

    fn spread_phase<R: Rng + ?Sized>(
        &mut self,
        topology: &mut Topology,
        clock: SpreadClock,
        dt: f64,
        rng: &mut R,
        summary: &mut StepSummary,
        out: &mut Vec<Event>,
    ) {
        self.sources.clear();
        self.sources
            .extend(topology.nodes().iter().map(|node| node.infected));

        let sweep = sweep_factor(&self.spread, clock.now, clock.sweep_until);
        let slow = honeypot_global_slow(&self.spread, topology.honeypot_count());

        for index in 0..topology.edges().len() {
            let edge = topology.edges()[index];
            for (src, dst) in [(edge.a(), edge.b()), (edge.b(), edge.a())] {
                if !self.sources[src.index()] {
                    continue;
                }
                let Some(probability) =
                    self.transmission_probability(topology, src, dst, edge.weight(), sweep, slow, dt)
                else {
                    continue;
                };

                if rng.gen::<f64>() >= probability {
                    continue;
                }

                let Some(target) = topology.node_mut(dst) else {
                    continue;
                };
                if !target.infect(clock.now) {
                    continue;
                }
                summary.newly_infected += 1;
                log::debug!("{} ({}) infected via {}", dst, target.name(), src);
                out.push(Event::NodeInfected {
                    node: dst,
                    source: src,
                });

                if target.honeypot && self.lure_bonus > 0 {
                    summary.score += self.lure_bonus;
                    out.push(Event::ScoreAwarded {
                        amount: self.lure_bonus,
                        reason: ScoreReason::HoneypotLure,
                    });
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn transmission_probability(
        &self,
        topology: &Topology,
        src: NodeId,
        dst: NodeId,
        weight: f64,
        sweep: f64,
        slow: f64,
        dt: f64,
    ) -> Option<f64> {
        let source = topology.node(src)?;
        let target = topology.node(dst)?;
        if source.isolated || target.isolated || !source.infected || target.infected {
            return None;
        }
        let rate = hazard_rate(&self.spread, weight, target, sweep, slow);
        Some(infection_probability(rate, dt))
    }

    fn cure_phase(
        &self,
        topology: &mut Topology,
        dt: f64,
        summary: &mut StepSummary,
        out: &mut Vec<Event>,
    ) {
        for node in topology.nodes_mut() {
            if node.infected && node.patched > 0.0 {
                node.clean_progress += dt * cleaning_rate(&self.cure, node.patched);
                if node.clean_progress >= self.cure.threshold {
                    node.cure();
                    summary.cured += 1;
                    log::debug!("{} ({}) cleaned", node.id(), node.name());
                    out.push(Event::NodeCured { node: node.id() });
                    if self.cure_bonus > 0 {
                        summary.score += self.cure_bonus;
                        out.push(Event::ScoreAwarded {
                            amount: self.cure_bonus,
                            reason: ScoreReason::Cure,
                        });
                    }
                }
            } else if node.clean_progress > 0.0 {
                node.clean_progress = (node.clean_progress - self.cure.decay_rate * dt).max(0.0);
            }
        }
    }
}

/// Spread multiplier at `now` given the sweep expiry time.
#[must_use]
pub fn sweep_factor(tuning: &SpreadTuning, now: f64, sweep_until: f64) -> f64 {
    if now < sweep_until {
        tuning.sweep_factor
    } else {
        1.0
    }
}

/// Global damping contributed by `honeypots` active honeypots.
#[must_use]
pub fn honeypot_global_slow(tuning: &SpreadTuning, honeypots: usize) -> f64 {
    let reduction = honeypots as f64 * tuning.honeypot_slow_per_node;
    1.0 - reduction.min(tuning.honeypot_slow_cap)
}

/// Instantaneous infection intensity toward `target` across an edge of `weight`.
#[must_use]
pub fn hazard_rate(tuning: &SpreadTuning, weight: f64, target: &Node, sweep: f64, slow: f64) -> f64 {
    let lure = if target.honeypot {
        tuning.honeypot_lure
    } else {
        1.0
    };
    let harden = 1.0 - target.patched * tuning.patch_hardening;
    let resistance = 1.0 - target.security() * tuning.security_resistance;
    (tuning.base_rate * sweep * slow * weight * lure * harden * resistance).max(0.0)
}

/// Probability that an exponential waiting time of `rate` elapses within `dt`.
#[must_use]
pub fn infection_probability(rate: f64, dt: f64) -> f64 {
    if rate <= 0.0 || dt <= 0.0 {
        return 0.0;
    }
    1.0 - (-rate * dt).exp()
}

/// Cleaning progress gained per second at the given patch level.
#[must_use]
pub fn cleaning_rate(tuning: &CureTuning, patched: f64) -> f64 {
    tuning.base_rate + patched * tuning.patch_bonus_rate
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probability_is_zero_without_rate_or_time() {
        assert_eq!(infection_probability(0.0, 0.05), 0.0);
        assert_eq!(infection_probability(1.0, 0.0), 0.0);
    }

    #[test]
    fn probability_approaches_one_for_long_waits() {
        assert!(infection_probability(5.0, 100.0) > 0.999_999);
    }

    #[test]
    fn honeypot_slowdown_is_capped() {
        let tuning = SpreadTuning::default();
        assert_eq!(honeypot_global_slow(&tuning, 0), 1.0);
        assert!((honeypot_global_slow(&tuning, 2) - 0.88).abs() < 1e-12);
        assert!((honeypot_global_slow(&tuning, 50) - 0.70).abs() < 1e-12);
    }

    #[test]
    fn cleaning_rate_for_full_patch() {
        assert!((cleaning_rate(&CureTuning::default(), 1.0) - 1.4).abs() < 1e-12);
    }
}
