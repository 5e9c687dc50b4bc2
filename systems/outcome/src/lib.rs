#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Clock advancement, risk evaluation and win/loss decisions.

use outbreak_core::{ClockTuning, Event, Outcome, RunPhase, ScoreReason, ScoreTuning, Topology};

/// Scalar session gauges advanced by the clock.
#[derive(Clone, Debug, PartialEq)]
pub struct Gauges {
    /// Energy available for actions, in `[0, max_energy]`.
    pub energy: f64,
    /// Seconds left on the run timer, never negative.
    pub timer: f64,
    /// Simulation clock: seconds spent running.
    pub now: f64,
    /// Accumulated score; never decreases.
    pub score: u64,
}

impl Gauges {
    /// Gauges at the start of a run.
    #[must_use]
    pub fn fresh(tuning: &ClockTuning) -> Self {
        Self {
            energy: tuning.starting_energy.clamp(0.0, tuning.max_energy),
            timer: tuning.total_time.max(0.0),
            now: 0.0,
            score: 0,
        }
    }
}

/// Result of evaluating a tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Evaluation {
    /// Risk computed from the node states the tick produced.
    pub risk: f64,
    /// Run phase after the outcome check.
    pub phase: RunPhase,
}

/// Clock and outcome evaluator.
#[derive(Clone, Debug)]
pub struct Clock {
    tuning: ClockTuning,
    completion_bonus: u64,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(ClockTuning::default(), ScoreTuning::default().completion_bonus)
    }
}

impl Clock {
    /// Creates a new evaluator.
    #[must_use]
    pub fn new(tuning: ClockTuning, completion_bonus: u64) -> Self {
        Self {
            tuning,
            completion_bonus,
        }
    }

    /// Risk of `topology` under this evaluator's critical penalty.
    #[must_use]
    pub fn risk(&self, topology: &Topology) -> f64 {
        risk(topology, self.tuning.critical_penalty)
    }

    /// Advances energy, timer and clock by `dt`, then decides the outcome.
    ///
    /// Outside the running phase nothing is mutated and the phase is returned
    /// unchanged. Defeat takes priority over victory when both apply.
    pub fn tick(
        &self,
        gauges: &mut Gauges,
        topology: &Topology,
        phase: RunPhase,
        dt: f64,
        out: &mut Vec<Event>,
    ) -> Evaluation {
        let risk = self.risk(topology);
        if !phase.is_running() {
            return Evaluation { risk, phase };
        }

        let dt = dt.max(0.0);
        gauges.energy = (gauges.energy + self.tuning.energy_regen * dt).min(self.tuning.max_energy);
        gauges.timer = (gauges.timer - dt).max(0.0);
        gauges.now += dt;

        let outcome = if risk >= 1.0 {
            Some(Outcome::Defeat)
        } else if gauges.timer <= 0.0 {
            Some(Outcome::Victory)
        } else {
            None
        };

        let Some(outcome) = outcome else {
            return Evaluation { risk, phase };
        };

        if outcome == Outcome::Victory && self.completion_bonus > 0 {
            gauges.score += self.completion_bonus;
            out.push(Event::ScoreAwarded {
                amount: self.completion_bonus,
                reason: ScoreReason::Completion,
            });
        }
        log::info!(
            "run ended in {:?} at {:.2}s with risk {:.2} and score {}",
            outcome,
            gauges.now,
            risk,
            gauges.score
        );
        out.push(Event::RunEnded {
            outcome,
            score: gauges.score,
        });
        Evaluation {
            risk,
            phase: RunPhase::Ended(outcome),
        }
    }
}

/// Compromise level of `topology` in `[0, 1]`.
///
/// Computed from the node states as they are now; the infected share plus a
/// fixed penalty for every infected critical node.
#[must_use]
pub fn risk(topology: &Topology, critical_penalty: f64) -> f64 {
    let total = topology.len().max(1) as f64;
    let infected = topology.infected_count() as f64;
    let critical = topology.critical_infected_count() as f64;
    (infected / total + critical * critical_penalty).clamp(0.0, 1.0)
}
