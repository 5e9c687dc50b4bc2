//! Running counters describing how a session unfolded.

use outbreak_system_epidemic::StepSummary;

/// Counters accumulated over the lifetime of one session.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionStats {
    /// Ticks processed while running.
    pub ticks: u64,
    /// Infections across edges, excluding the initial outbreak.
    pub infections: u64,
    /// Nodes cleaned by patching.
    pub cures: u64,
    /// Player actions that were applied.
    pub actions_applied: u64,
    /// Player actions that were refused.
    pub rejections: u64,
    /// Highest risk observed at the end of a tick.
    pub peak_risk: f64,
    /// Highest number of simultaneously infected nodes.
    pub peak_infected: u32,
}

impl SessionStats {
    pub(crate) fn record_tick(&mut self, step: &StepSummary, risk: f64, infected: u32) {
        self.ticks += 1;
        self.infections += u64::from(step.newly_infected);
        self.cures += u64::from(step.cured);
        self.peak_risk = self.peak_risk.max(risk);
        self.peak_infected = self.peak_infected.max(infected);
    }
}
