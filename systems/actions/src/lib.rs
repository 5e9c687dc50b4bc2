#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Validation and application of the four player actions.
//!
//! Every action is gated by an energy cost and a per-kind cooldown measured
//! on the simulation clock. Validation runs to completion before anything is
//! mutated, so a rejected request leaves the session untouched.

use outbreak_core::{
    ActionEffect, ActionKind, ActionReceipt, ActionTuning, CooldownView, NodeId, Rejection,
    RunPhase, Topology,
};

/// Slack absorbing floating-point drift of the accumulated simulation clock.
const TIME_EPSILON: f64 = 1e-9;

/// Per-kind last-use stamps and the sweep expiry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CooldownLedger {
    last_used: [Option<f64>; 4],
    sweep_until: f64,
}

impl CooldownLedger {
    /// Creates a ledger in which every action is ready.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulation time `kind` was last applied, if ever.
    #[must_use]
    pub fn last_used(&self, kind: ActionKind) -> Option<f64> {
        self.last_used[kind.index()]
    }

    /// Simulation time at which the current sweep expires.
    #[must_use]
    pub fn sweep_until(&self) -> f64 {
        self.sweep_until
    }

    /// Seconds of sweep left at `now`.
    #[must_use]
    pub fn sweep_remaining(&self, now: f64) -> f64 {
        (self.sweep_until - now).max(0.0)
    }
}

/// Player request describing the action and its optional target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActionRequest {
    /// Action issued by the player.
    pub kind: ActionKind,
    /// Node selected when the action was issued.
    pub target: Option<NodeId>,
    /// Simulation time the request is processed at.
    pub now: f64,
}

/// Mutable session state an action may touch.
#[derive(Debug)]
pub struct ActionTargets<'a> {
    /// Current run phase.
    pub phase: RunPhase,
    /// Energy pool the cost is deducted from.
    pub energy: &'a mut f64,
    /// Cooldown stamps and sweep expiry.
    pub ledger: &'a mut CooldownLedger,
    /// Topology holding the targeted node.
    pub topology: &'a mut Topology,
}

/// Action system applying player requests against energy and cooldown constraints.
#[derive(Clone, Debug, Default)]
pub struct Actions {
    tuning: ActionTuning,
}

impl Actions {
    /// Creates a new action system using the provided tuning.
    #[must_use]
    pub fn new(tuning: ActionTuning) -> Self {
        Self { tuning }
    }

    /// Validates `request` and, if it is admissible, applies its effect exactly once.
    ///
    /// Checks run in order: run phase, target presence, target existence,
    /// cooldown, energy. The first failing check is reported.
    pub fn apply(
        &self,
        request: ActionRequest,
        targets: ActionTargets<'_>,
    ) -> Result<ActionReceipt, Rejection> {
        let target = self.validate(
            request,
            targets.phase,
            *targets.energy,
            targets.ledger,
            targets.topology,
        )?;

        let node = match target {
            Some(id) => Some(
                targets
                    .topology
                    .node_mut(id)
                    .ok_or(Rejection::UnknownTarget { node: id })?,
            ),
            None => None,
        };

        let effect = match (request.kind, node) {
            (ActionKind::Sweep, _) => {
                targets.ledger.sweep_until = request.now + self.tuning.sweep_duration;
                ActionEffect::Sweep {
                    active_until: targets.ledger.sweep_until,
                }
            }
            (ActionKind::Isolate, Some(node)) => {
                node.isolated = !node.isolated;
                ActionEffect::Isolation {
                    node: node.id(),
                    isolated: node.isolated,
                }
            }
            (ActionKind::Patch, Some(node)) => {
                node.patched = (node.patched + self.tuning.patch_increment).clamp(0.0, 1.0);
                ActionEffect::Patch {
                    node: node.id(),
                    level: node.patched,
                }
            }
            (ActionKind::Honeypot, Some(node)) => {
                node.honeypot = !node.honeypot;
                ActionEffect::Honeypot {
                    node: node.id(),
                    active: node.honeypot,
                }
            }
            (ActionKind::Isolate | ActionKind::Patch | ActionKind::Honeypot, None) => {
                return Err(Rejection::NoTargetSelected);
            }
        };

        let cost = self.tuning.cost(request.kind);
        *targets.energy = (*targets.energy - cost.energy).max(0.0);
        targets.ledger.last_used[request.kind.index()] = Some(request.now);

        log::debug!("{} applied at {:.2}s: {:?}", request.kind, request.now, effect);
        Ok(ActionReceipt {
            kind: request.kind,
            energy_spent: cost.energy,
            at: request.now,
            effect,
        })
    }

    /// Checks whether `request` would be accepted, returning the resolved target.
    pub fn validate(
        &self,
        request: ActionRequest,
        phase: RunPhase,
        energy: f64,
        ledger: &CooldownLedger,
        topology: &Topology,
    ) -> Result<Option<NodeId>, Rejection> {
        if !phase.is_running() {
            return Err(Rejection::NotRunning);
        }

        let target = if request.kind.requires_target() {
            let node = request.target.ok_or(Rejection::NoTargetSelected)?;
            if topology.node(node).is_none() {
                return Err(Rejection::UnknownTarget { node });
            }
            Some(node)
        } else {
            None
        };

        let remaining = self.remaining_cooldown(ledger, request.kind, request.now);
        if remaining > 0.0 {
            return Err(Rejection::OnCooldown {
                kind: request.kind,
                remaining,
            });
        }

        let required = self.tuning.cost(request.kind).energy;
        if energy < required {
            return Err(Rejection::InsufficientEnergy {
                required,
                available: energy,
            });
        }

        Ok(target)
    }

    /// Seconds until `kind` may be used again at `now`; zero when ready.
    #[must_use]
    pub fn remaining_cooldown(&self, ledger: &CooldownLedger, kind: ActionKind, now: f64) -> f64 {
        let remaining = ledger.last_used(kind).map_or(0.0, |last| {
            self.tuning.cost(kind).cooldown - (now - last)
        });
        if remaining > TIME_EPSILON {
            remaining
        } else {
            0.0
        }
    }

    /// Gating state of every action, ordered as [`ActionKind::ALL`].
    #[must_use]
    pub fn cooldowns(&self, ledger: &CooldownLedger, energy: f64, now: f64) -> [CooldownView; 4] {
        ActionKind::ALL.map(|kind| {
            let cost = self.tuning.cost(kind).energy;
            CooldownView {
                kind,
                remaining: self.remaining_cooldown(ledger, kind, now),
                cost,
                affordable: energy >= cost,
            }
        })
    }
}
