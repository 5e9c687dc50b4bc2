use glam::Vec2;
use outbreak_core::{ActionKind, Command, EdgeSet, NodeId, NodeSeed, Position, Topology};
use outbreak_input::{command, select, to_vec2, HostCommand, SELECT_RADIUS};

fn topology(positions: &[(f32, f32)]) -> Topology {
    let seeds = positions
        .iter()
        .enumerate()
        .map(|(index, &(x, y))| NodeSeed {
            position: Position::new(x, y),
            name: format!("n{index}"),
            security: 0.5,
            critical: false,
        })
        .collect();
    Topology::new(seeds, EdgeSet::new(positions.len()))
}

#[test]
fn selects_nearest_node_inside_radius() {
    let network = topology(&[(100.0, 100.0), (130.0, 100.0), (400.0, 400.0)]);
    assert_eq!(
        select(network.nodes(), Vec2::new(110.0, 100.0), SELECT_RADIUS),
        Some(NodeId::new(0))
    );
    assert_eq!(
        select(network.nodes(), Vec2::new(122.0, 101.0), SELECT_RADIUS),
        Some(NodeId::new(1))
    );
}

#[test]
fn points_outside_every_radius_select_nothing() {
    let network = topology(&[(100.0, 100.0), (400.0, 400.0)]);
    assert_eq!(select(network.nodes(), Vec2::new(250.0, 250.0), SELECT_RADIUS), None);
    assert_eq!(select(network.nodes(), Vec2::new(118.5, 100.0), SELECT_RADIUS), None);
    assert_eq!(
        select(network.nodes(), Vec2::new(118.0, 100.0), SELECT_RADIUS),
        Some(NodeId::new(0))
    );
}

#[test]
fn equidistant_nodes_resolve_to_lower_id() {
    let network = topology(&[(200.0, 100.0), (100.0, 100.0), (150.0, 150.0)]);
    assert_eq!(
        select(network.nodes(), Vec2::new(150.0, 100.0), 60.0),
        Some(NodeId::new(0))
    );
}

#[test]
fn degenerate_radius_and_points_select_nothing() {
    let network = topology(&[(10.0, 10.0)]);
    assert_eq!(select(network.nodes(), Vec2::new(10.0, 10.0), 0.0), None);
    assert_eq!(select(network.nodes(), Vec2::new(10.0, 10.0), f32::NAN), None);
    assert_eq!(select(network.nodes(), Vec2::new(f32::NAN, 10.0), 18.0), None);
    assert_eq!(select(&[], Vec2::new(10.0, 10.0), 18.0), None);
}

#[test]
fn hotkeys_are_case_insensitive() {
    assert_eq!(command('I'), Some(HostCommand::Action(ActionKind::Isolate)));
    assert_eq!(command('P'), Some(HostCommand::Action(ActionKind::Patch)));
    assert_eq!(command('H'), Some(HostCommand::Action(ActionKind::Honeypot)));
    assert_eq!(command('S'), Some(HostCommand::Action(ActionKind::Sweep)));
    assert_eq!(command(' '), Some(HostCommand::TogglePause));
    assert_eq!(command('R'), Some(HostCommand::Restart));
    assert_eq!(command('n'), Some(HostCommand::NewTopology));
}

#[test]
fn host_commands_become_world_commands() {
    let selection = Some(NodeId::new(4));
    assert_eq!(
        HostCommand::Action(ActionKind::Patch).into_command(selection, 9),
        Command::Act {
            kind: ActionKind::Patch,
            target: selection,
        }
    );
    assert_eq!(
        HostCommand::Action(ActionKind::Isolate).into_command(None, 9),
        Command::Act {
            kind: ActionKind::Isolate,
            target: None,
        }
    );
    assert_eq!(HostCommand::TogglePause.into_command(selection, 9), Command::TogglePause);
    assert_eq!(
        HostCommand::Restart.into_command(selection, 9),
        Command::Restart { seed: 9 }
    );
    assert_eq!(
        HostCommand::NewTopology.into_command(None, 11),
        Command::NewTopology { seed: 11 }
    );
}

#[test]
fn node_positions_convert_to_canvas_vectors() {
    let network = topology(&[(12.5, 40.0), (300.0, 7.25)]);
    let points: Vec<Vec2> = network
        .nodes()
        .iter()
        .map(|node| to_vec2(node.position()))
        .collect();
    assert_eq!(points, vec![Vec2::new(12.5, 40.0), Vec2::new(300.0, 7.25)]);
}
