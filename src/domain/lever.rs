/// Levers and the doors they control.
///
/// Lever state is permanent for a level attempt: round resets never touch
/// it. Flipping toggles every controlled door's active state, so two flips
/// restore both the lever and its doors.

use std::fmt;

use super::grid::Position;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct LeverId(pub u8);

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct DoorId(pub u16);

impl fmt::Display for LeverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lever {}", self.0)
    }
}

/// A lever-controlled object. Active doors block movement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Door {
    pub id: DoorId,
    pub position: Position,
    pub active: bool,
}

impl Door {
    pub fn new(id: DoorId, position: Position, active: bool) -> Self {
        Door { id, position, active }
    }

    pub fn toggle(&mut self) {
        self.active = !self.active;
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lever {
    pub id: LeverId,
    pub position: Position,
    on: bool,
    controls: Vec<DoorId>,
}

impl Lever {
    pub fn new(id: LeverId, position: Position) -> Self {
        Lever { id, position, on: false, controls: Vec::new() }
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    pub fn controls(&self) -> &[DoorId] {
        &self.controls
    }

    pub fn attach(&mut self, door: DoorId) {
        if !self.controls.contains(&door) {
            self.controls.push(door);
        }
    }

    /// Toggle the lever. Returns the new state; the caller toggles
    /// [`controls`](Self::controls).
    pub fn flip(&mut self) -> bool {
        self.on = !self.on;
        self.on
    }
}
