/// Lattice coordinates and the four cardinal directions.
///
/// World space is y-up: `Direction::Up` adds one to `y`, and the ground a
/// character stands on is at `position.down()`. Every coordinate is an
/// exact integer lattice point, so equality is exact.

use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Position { x, y }
    }

    /// The neighbouring tile one step in `dir`.
    #[inline]
    pub fn offset(self, dir: Direction) -> Self {
        let (dx, dy) = dir.delta();
        Position { x: self.x + dx, y: self.y + dy }
    }

    #[inline]
    pub fn up(self) -> Self {
        self.offset(Direction::Up)
    }

    #[inline]
    pub fn down(self) -> Self {
        self.offset(Direction::Down)
    }

    /// Manhattan distance, used to size animation segments.
    pub fn manhattan(self, other: Position) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Facing of a character sprite. Only horizontal moves change it.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

/// Cardinal move direction. Diagonals are not representable.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, thiserror::Error)]
pub enum DirectionError {
    #[error("({dx}, {dy}) is not a cardinal unit vector")]
    NotCardinal { dx: i32, dy: i32 },
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
    ];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::Up => (0, 1),
            Direction::Down => (0, -1),
        }
    }

    /// Convert a raw vector into a direction.
    ///
    /// Anything other than an axis-aligned unit vector is a contract
    /// violation by the caller and is reported, never rounded.
    pub fn from_delta(dx: i32, dy: i32) -> Result<Self, DirectionError> {
        match (dx, dy) {
            (-1, 0) => Ok(Direction::Left),
            (1, 0) => Ok(Direction::Right),
            (0, 1) => Ok(Direction::Up),
            (0, -1) => Ok(Direction::Down),
            _ => Err(DirectionError::NotCardinal { dx, dy }),
        }
    }

    /// The facing a character takes after moving this way, if any.
    pub fn facing(self) -> Option<Facing> {
        match self {
            Direction::Left => Some(Facing::Left),
            Direction::Right => Some(Facing::Right),
            Direction::Up | Direction::Down => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Up => "up",
            Direction::Down => "down",
        };
        f.write_str(name)
    }
}
