#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared input contracts for outbreak hosts.
//!
//! Hosts translate pointer positions into node selections with [`select`] and
//! key presses into [`HostCommand`]s with [`command`]. Neither touches the
//! world; the host turns the result into a [`Command`] for it.

use glam::Vec2;
use outbreak_core::{ActionKind, Command, Node, NodeId, Position};

/// Pick radius around a node centre, in canvas pixels.
pub const SELECT_RADIUS: f32 = 18.0;

/// Host-level intent decoded from a key press.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HostCommand {
    /// Issue the player action against the current selection.
    Action(ActionKind),
    /// Pause a running session or resume a paused one.
    TogglePause,
    /// Throw the session away and start a fresh one immediately.
    Restart,
    /// Generate a new topology and wait for the player to start it.
    NewTopology,
}

impl HostCommand {
    /// Converts the intent into the world command it stands for.
    ///
    /// `selection` is only consulted for actions; `next_seed` only for the
    /// commands that replace the session.
    #[must_use]
    pub fn into_command(self, selection: Option<NodeId>, next_seed: u64) -> Command {
        match self {
            Self::Action(kind) => Command::Act {
                kind,
                target: selection,
            },
            Self::TogglePause => Command::TogglePause,
            Self::Restart => Command::Restart { seed: next_seed },
            Self::NewTopology => Command::NewTopology { seed: next_seed },
        }
    }
}

/// Maps a key to its host command. Letters are case-insensitive.
#[must_use]
pub fn command(key: char) -> Option<HostCommand> {
    let command = match key.to_ascii_lowercase() {
        '1' | 'i' => HostCommand::Action(ActionKind::Isolate),
        '2' | 'p' => HostCommand::Action(ActionKind::Patch),
        '3' | 'h' => HostCommand::Action(ActionKind::Honeypot),
        '4' | 's' => HostCommand::Action(ActionKind::Sweep),
        ' ' => HostCommand::TogglePause,
        'r' => HostCommand::Restart,
        'n' => HostCommand::NewTopology,
        _ => return None,
    };
    Some(command)
}

/// Finds the node nearest to `point` within `radius`.
///
/// Ties are broken in favour of the lower id. A non-positive or non-finite
/// radius selects nothing.
#[must_use]
pub fn select(nodes: &[Node], point: Vec2, radius: f32) -> Option<NodeId> {
    if !(radius.is_finite() && radius > 0.0) || !point.is_finite() {
        return None;
    }

    let limit = radius * radius;
    let mut best: Option<(f32, NodeId)> = None;
    for node in nodes {
        let distance = to_vec2(node.position()).distance_squared(point);
        if distance > limit {
            continue;
        }
        match best {
            Some((closest, id)) if closest < distance || (closest == distance && id < node.id()) => {}
            _ => best = Some((distance, node.id())),
        }
    }
    best.map(|(_, id)| id)
}

/// Converts a canvas position into a glam vector.
#[must_use]
pub fn to_vec2(position: Position) -> Vec2 {
    Vec2::new(position.x(), position.y())
}
