/// Spatial occupancy queries, the contract between the rules and the world.
///
/// ## Architecture
///
/// The movement rules never look at tiles or actor lists directly. They ask
/// an [`OccupancyOracle`] "what occupies this tile, under these categories"
/// and decide from the answer. Anything that can answer the question can
/// drive the rules: the simulation [`World`](crate::sim::world::World), or a
/// hand-built fixture in a test.
///
/// ## Categories
///
/// | Category       | Who answers               |
/// |----------------|---------------------------|
/// | `MOVEMENT`     | solid terrain, closed doors |
/// | `STONE`        | live blocks (stones, time cubes) |
/// | `LADDER`       | ladder tiles              |
/// | `INTERACTABLE` | levers                    |
/// | `GOAL`         | goal tiles                |
///
/// Characters (player, ghosts) belong to no category: they never block
/// each other and never hold anything up.
///
/// When a mask spans several categories the answer is picked in this
/// order: block, terrain or door, ladder, lever, goal.

use bitflags::bitflags;

use super::actor::ActorId;
use super::grid::Position;
use super::lever::{DoorId, LeverId};
use super::movement::MoverKind;

bitflags! {
    /// Occupancy category mask for [`OccupancyOracle::query`].
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct Category: u8 {
        const MOVEMENT     = 1 << 0;
        const STONE        = 1 << 1;
        const LADDER       = 1 << 2;
        const INTERACTABLE = 1 << 3;
        const GOAL         = 1 << 4;
    }
}

impl Category {
    /// Anything a mover cannot walk into.
    pub const OBSTACLE: Category = Category::MOVEMENT.union(Category::STONE);

    /// What holds a mover of the given kind up. Characters stand on ladder
    /// tops; blocks drop straight through ladders.
    pub const fn ground_for(kind: MoverKind) -> Category {
        match kind {
            MoverKind::Character => Category::OBSTACLE.union(Category::LADDER),
            MoverKind::Block => Category::OBSTACLE,
        }
    }
}

/// What an occupancy query found.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Occupant {
    Terrain,
    Door(DoorId),
    Block(ActorId),
    Ladder,
    Lever(LeverId),
    Goal,
}

impl Occupant {
    pub fn lever(self) -> Option<LeverId> {
        match self {
            Occupant::Lever(id) => Some(id),
            _ => None,
        }
    }
}

/// Synchronous, read-only spatial occupancy service.
pub trait OccupancyOracle {
    /// Return the occupant of `position` among the categories in `mask`.
    fn query(&self, position: Position, mask: Category) -> Option<Occupant>;

    #[inline]
    fn is_occupied(&self, position: Position, mask: Category) -> bool {
        self.query(position, mask).is_some()
    }

    /// Tile of a door that flipping `lever` would shut on an actor, if any.
    fn door_obstruction(&self, _lever: LeverId) -> Option<Position> {
        None
    }
}

impl<T: OccupancyOracle + ?Sized> OccupancyOracle for &T {
    fn query(&self, position: Position, mask: Category) -> Option<Occupant> {
        (**self).query(position, mask)
    }

    fn door_obstruction(&self, lever: LeverId) -> Option<Position> {
        (**self).door_obstruction(lever)
    }
}
