/// Static terrain and its properties.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.
///
/// Doors and levers are not tiles: their state changes at runtime and
/// lives in the world alongside the actors.

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Tile {
    #[default]
    Empty,
    Solid,   // Ground and walls
    Ladder,  // Climbable, supports characters only
    Goal,    // Level exit
}

impl Tile {
    /// Does this tile block movement (and hold things up)?
    pub fn is_solid(self) -> bool {
        matches!(self, Tile::Solid)
    }

    /// Can a character climb (move up/down) on this tile?
    pub fn is_climbable(self) -> bool {
        matches!(self, Tile::Ladder)
    }

    pub fn is_goal(self) -> bool {
        matches!(self, Tile::Goal)
    }

    /// Level-file glyph for this tile.
    pub fn glyph(self) -> char {
        match self {
            Tile::Empty => ' ',
            Tile::Solid => '#',
            Tile::Ladder => 'H',
            Tile::Goal => 'G',
        }
    }
}
