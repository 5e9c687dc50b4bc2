use outbreak_core::{
    ActionEffect, ActionKind, EdgeSet, NodeId, NodeSeed, Position, Rejection, RunPhase, Topology,
};
use outbreak_system_actions::{ActionRequest, ActionTargets, Actions, CooldownLedger};

struct Fixture {
    actions: Actions,
    phase: RunPhase,
    energy: f64,
    ledger: CooldownLedger,
    topology: Topology,
}

impl Fixture {
    fn new(energy: f64) -> Self {
        let seeds = (0..3)
            .map(|index| NodeSeed {
                position: Position::new(index as f32, 0.0),
                name: format!("n{index}"),
                security: 0.5,
                critical: false,
            })
            .collect();
        let mut edges = EdgeSet::new(3);
        assert!(edges.insert(NodeId::new(0), NodeId::new(1), 1.0));
        Self {
            actions: Actions::default(),
            phase: RunPhase::Running,
            energy,
            ledger: CooldownLedger::new(),
            topology: Topology::new(seeds, edges),
        }
    }

    fn act(
        &mut self,
        kind: ActionKind,
        target: Option<u32>,
        now: f64,
    ) -> Result<ActionEffect, Rejection> {
        let request = ActionRequest {
            kind,
            target: target.map(NodeId::new),
            now,
        };
        self.actions
            .apply(
                request,
                ActionTargets {
                    phase: self.phase,
                    energy: &mut self.energy,
                    ledger: &mut self.ledger,
                    topology: &mut self.topology,
                },
            )
            .map(|receipt| receipt.effect)
    }

    fn node_flags(&self) -> Vec<(bool, f64, bool)> {
        self.topology
            .nodes()
            .iter()
            .map(|node| (node.isolated, node.patched, node.honeypot))
            .collect()
    }
}

#[test]
fn isolate_twice_within_cooldown_is_rejected_and_leaves_toggle() {
    let mut fixture = Fixture::new(100.0);

    let effect = fixture.act(ActionKind::Isolate, Some(1), 5.0);
    assert_eq!(
        effect,
        Ok(ActionEffect::Isolation {
            node: NodeId::new(1),
            isolated: true,
        })
    );
    let energy_after_first = fixture.energy;

    let rejected = fixture.act(ActionKind::Isolate, Some(1), 5.9);
    match rejected {
        Err(Rejection::OnCooldown { kind, remaining }) => {
            assert_eq!(kind, ActionKind::Isolate);
            assert!((remaining - 0.3).abs() < 1e-9);
        }
        other => panic!("expected cooldown rejection, got {other:?}"),
    }
    assert!(fixture.topology.nodes()[1].isolated);
    assert_eq!(fixture.energy, energy_after_first);

    let effect = fixture.act(ActionKind::Isolate, Some(1), 6.2);
    assert_eq!(
        effect,
        Ok(ActionEffect::Isolation {
            node: NodeId::new(1),
            isolated: false,
        })
    );
}

#[test]
fn cooldown_is_tracked_per_action_kind() {
    let mut fixture = Fixture::new(100.0);
    assert!(fixture.act(ActionKind::Isolate, Some(0), 1.0).is_ok());
    assert!(fixture.act(ActionKind::Patch, Some(0), 1.0).is_ok());
}

#[test]
fn targeted_actions_require_a_selection() {
    for kind in [ActionKind::Isolate, ActionKind::Patch, ActionKind::Honeypot] {
        let mut fixture = Fixture::new(100.0);
        assert_eq!(fixture.act(kind, None, 0.0), Err(Rejection::NoTargetSelected));
        assert_eq!(fixture.energy, 100.0);
        assert_eq!(fixture.ledger, CooldownLedger::new());
    }
}

#[test]
fn unknown_targets_are_rejected() {
    let mut fixture = Fixture::new(100.0);
    assert_eq!(
        fixture.act(ActionKind::Patch, Some(7), 0.0),
        Err(Rejection::UnknownTarget {
            node: NodeId::new(7)
        })
    );
}

#[test]
fn insufficient_energy_is_reported_with_amounts() {
    let mut fixture = Fixture::new(20.0);
    let before = fixture.node_flags();
    assert_eq!(
        fixture.act(ActionKind::Patch, Some(0), 0.0),
        Err(Rejection::InsufficientEnergy {
            required: 24.0,
            available: 20.0,
        })
    );
    assert_eq!(fixture.node_flags(), before);
    assert_eq!(fixture.energy, 20.0);
    assert!(fixture.act(ActionKind::Isolate, Some(0), 0.0).is_ok());
    assert!((fixture.energy - 2.0).abs() < 1e-12);
}

#[test]
fn rejection_order_prefers_target_then_cooldown_then_energy() {
    let mut fixture = Fixture::new(18.0);
    assert!(fixture.act(ActionKind::Isolate, Some(0), 0.0).is_ok());
    assert_eq!(fixture.energy, 0.0);

    assert_eq!(
        fixture.act(ActionKind::Isolate, None, 0.5),
        Err(Rejection::NoTargetSelected)
    );
    assert!(matches!(
        fixture.act(ActionKind::Isolate, Some(0), 0.5),
        Err(Rejection::OnCooldown { .. })
    ));
    assert!(matches!(
        fixture.act(ActionKind::Isolate, Some(0), 2.0),
        Err(Rejection::InsufficientEnergy { .. })
    ));
}

#[test]
fn actions_outside_running_phase_are_refused() {
    for phase in [RunPhase::NotStarted, RunPhase::Paused] {
        let mut fixture = Fixture::new(100.0);
        fixture.phase = phase;
        assert_eq!(
            fixture.act(ActionKind::Sweep, None, 0.0),
            Err(Rejection::NotRunning)
        );
        assert_eq!(fixture.ledger.sweep_until(), 0.0);
    }
}

#[test]
fn patch_accumulates_up_to_the_cap() {
    let mut fixture = Fixture::new(100.0);
    assert_eq!(
        fixture.act(ActionKind::Patch, Some(2), 0.0),
        Ok(ActionEffect::Patch {
            node: NodeId::new(2),
            level: 0.6,
        })
    );
    assert_eq!(
        fixture.act(ActionKind::Patch, Some(2), 1.4),
        Ok(ActionEffect::Patch {
            node: NodeId::new(2),
            level: 1.0,
        })
    );
    fixture.energy = 100.0;
    assert!(fixture.act(ActionKind::Patch, Some(2), 2.8).is_ok());
    assert_eq!(fixture.topology.nodes()[2].patched, 1.0);
}

#[test]
fn honeypot_toggles_back_to_original_state() {
    let mut fixture = Fixture::new(100.0);
    let before = fixture.node_flags();
    assert!(fixture.act(ActionKind::Honeypot, Some(1), 0.0).is_ok());
    assert!(fixture.topology.nodes()[1].honeypot);
    assert!(fixture.act(ActionKind::Honeypot, Some(1), 4.0).is_ok());
    assert_eq!(fixture.node_flags(), before);
}

#[test]
fn sweep_is_global_and_ignores_any_target() {
    let mut fixture = Fixture::new(40.0);
    let before = fixture.node_flags();
    assert_eq!(
        fixture.act(ActionKind::Sweep, Some(0), 10.0),
        Ok(ActionEffect::Sweep { active_until: 18.0 })
    );
    assert_eq!(fixture.node_flags(), before);
    assert_eq!(fixture.ledger.sweep_until(), 18.0);
    assert!((fixture.ledger.sweep_remaining(15.0) - 3.0).abs() < 1e-12);
    assert!((fixture.energy - 4.0).abs() < 1e-12);
}

#[test]
fn cooldown_views_gate_affordability_and_readiness() {
    let mut fixture = Fixture::new(30.0);
    assert!(fixture.act(ActionKind::Isolate, Some(0), 0.0).is_ok());
    let views = fixture.actions.cooldowns(&fixture.ledger, fixture.energy, 0.2);

    let isolate = views[ActionKind::Isolate.index()];
    assert!((isolate.remaining - 1.0).abs() < 1e-9);
    assert!(!isolate.ready());

    let sweep = views[ActionKind::Sweep.index()];
    assert_eq!(sweep.remaining, 0.0);
    assert!(!sweep.affordable);
    assert_eq!(sweep.cost, 36.0);
}

#[test]
fn sweep_never_touches_a_node_even_with_an_unknown_target() {
    let mut fixture = Fixture::new(100.0);
    let before = fixture.node_flags();
    assert_eq!(
        fixture.act(ActionKind::Sweep, Some(42), 3.0),
        Ok(ActionEffect::Sweep { active_until: 11.0 })
    );
    assert_eq!(fixture.node_flags(), before);
}

#[test]
fn targeted_effects_report_the_resolved_node() {
    for (kind, expected) in [
        (
            ActionKind::Isolate,
            ActionEffect::Isolation {
                node: NodeId::new(2),
                isolated: true,
            },
        ),
        (
            ActionKind::Patch,
            ActionEffect::Patch {
                node: NodeId::new(2),
                level: 0.6,
            },
        ),
        (
            ActionKind::Honeypot,
            ActionEffect::Honeypot {
                node: NodeId::new(2),
                active: true,
            },
        ),
    ] {
        let mut fixture = Fixture::new(100.0);
        assert_eq!(fixture.act(kind, Some(2), 0.0), Ok(expected));
    }
}
