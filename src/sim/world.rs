/// World: the complete mutable state of a level attempt.
///
/// ## Layers
///
///   - `tiles`: static terrain, indexed `tiles[y - origin.y][x - origin.x]`
///     (row 0 is the bottom row). Never mutated after load.
///   - `doors` / `levers`: lever-controlled state. Permanent across rounds.
///   - `actors`: player, ghosts and blocks. `ActorId` is the index.
///
/// Everything outside the tile rectangle is empty space: a mover that walks
/// off the map falls until the fall-check limit gives up.
///
/// All actor mutations go through `apply_plan()`, `flip_lever()` and the
/// scheduler's reset pass. The world answers occupancy queries for the
/// movement rules through its `OccupancyOracle` impl.

use crate::domain::actor::{Actor, ActorId, ActorKind, BlockKind};
use crate::domain::grid::Position;
use crate::domain::lever::{Door, DoorId, Lever, LeverId};
use crate::domain::movement::MovePlan;
use crate::domain::occupancy::{Category, OccupancyOracle, Occupant};
use crate::domain::task::Task;
use crate::domain::tile::Tile;

#[derive(Clone, Copy, PartialEq, Eq, Debug, thiserror::Error)]
pub enum WorldError {
    #[error("unknown actor {0}")]
    UnknownActor(ActorId),

    #[error("unknown {0}")]
    UnknownLever(LeverId),

    #[error("unknown door {0:?}")]
    UnknownDoor(DoorId),
}

#[derive(Clone, Debug)]
pub struct World {
    // ── Terrain ──
    tiles: Vec<Vec<Tile>>,
    width: usize,
    height: usize,
    origin: Position,

    // ── Lever-controlled state ──
    doors: Vec<Door>,
    levers: Vec<Lever>,

    // ── Actors ──
    actors: Vec<Actor>,
    player: Option<ActorId>,
}

// ── Construction ──

impl World {
    /// Empty world of `width` x `height` tiles whose bottom-left tile is
    /// `origin`.
    pub fn new(width: usize, height: usize, origin: Position) -> Self {
        World {
            tiles: vec![vec![Tile::Empty; width]; height],
            width,
            height,
            origin,
            doors: Vec::new(),
            levers: Vec::new(),
            actors: Vec::new(),
            player: None,
        }
    }

    pub fn add_door(&mut self, position: Position, active: bool) -> DoorId {
        let id = DoorId(self.doors.len() as u16);
        self.doors.push(Door::new(id, position, active));
        id
    }

    pub fn add_lever(&mut self, id: LeverId, position: Position) {
        self.levers.push(Lever::new(id, position));
    }

    /// Link `door` to `lever` so flipping the lever toggles the door.
    pub fn attach_door(&mut self, lever: LeverId, door: DoorId) -> Result<(), WorldError> {
        if !self.doors.iter().any(|d| d.id == door) {
            return Err(WorldError::UnknownDoor(door));
        }
        self.lever_mut(lever)?.attach(door);
        Ok(())
    }

    /// Add an actor at `position`. The first player spawned becomes the
    /// world's player.
    pub fn spawn(&mut self, kind: ActorKind, position: Position) -> ActorId {
        let id = ActorId(self.actors.len() as u32);
        self.actors.push(Actor::new(id, kind, position));
        if kind == ActorKind::Player && self.player.is_none() {
            self.player = Some(id);
        }
        id
    }

    /// Add a ghost that replays `history` from `initial`.
    pub fn spawn_ghost(&mut self, initial: Position, history: Vec<Task>) -> ActorId {
        let id = ActorId(self.actors.len() as u32);
        self.actors.push(Actor::ghost(id, initial, history));
        id
    }
}

// ── Terrain queries ──

impl World {
    #[inline]
    fn index(&self, p: Position) -> Option<(usize, usize)> {
        let col = usize::try_from(p.x - self.origin.x).ok()?;
        let row = usize::try_from(p.y - self.origin.y).ok()?;
        (col < self.width && row < self.height).then_some((col, row))
    }

    /// Terrain at `p`. Out of bounds is empty space.
    #[inline]
    pub fn tile_at(&self, p: Position) -> Tile {
        match self.index(p) {
            Some((col, row)) => self.tiles[row][col],
            None => Tile::Empty,
        }
    }

    /// Set terrain at `p`; ignored out of bounds.
    pub fn set_tile(&mut self, p: Position, tile: Tile) {
        if let Some((col, row)) = self.index(p) {
            self.tiles[row][col] = tile;
        }
    }
}

// ── Actor queries ──

impl World {
    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(id.0 as usize)
    }

    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.get_mut(id.0 as usize)
    }

    pub(crate) fn actors_mut(&mut self) -> &mut [Actor] {
        &mut self.actors
    }

    pub fn player_id(&self) -> Option<ActorId> {
        self.player
    }

    pub fn player(&self) -> Option<&Actor> {
        self.player.and_then(|id| self.actor(id))
    }

    /// Live block at `p`, lowest id first.
    pub fn block_at(&self, p: Position) -> Option<ActorId> {
        self.actors
            .iter()
            .find(|a| !a.is_character() && a.is_alive() && a.position == p)
            .map(|a| a.id)
    }

    /// Ids of every ghost, in spawn order.
    pub fn ghost_ids(&self) -> Vec<ActorId> {
        self.actors.iter().filter(|a| a.is_ghost()).map(|a| a.id).collect()
    }
}

// ── Levers and doors ──

impl World {
    pub fn levers(&self) -> &[Lever] {
        &self.levers
    }

    pub fn doors(&self) -> &[Door] {
        &self.doors
    }

    pub fn lever(&self, id: LeverId) -> Option<&Lever> {
        self.levers.iter().find(|l| l.id == id)
    }

    fn lever_mut(&mut self, id: LeverId) -> Result<&mut Lever, WorldError> {
        self.levers
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or(WorldError::UnknownLever(id))
    }

    pub fn lever_at(&self, p: Position) -> Option<&Lever> {
        self.levers.iter().find(|l| l.position == p)
    }

    pub fn door_at(&self, p: Position) -> Option<&Door> {
        self.doors.iter().find(|d| d.position == p)
    }

    /// Flip `id` and toggle every door it controls. Returns the lever's new
    /// state.
    pub fn flip_lever(&mut self, id: LeverId) -> Result<bool, WorldError> {
        let lever = self.lever_mut(id)?;
        let on = lever.flip();
        let controls = lever.controls().to_vec();
        for door in self.doors.iter_mut().filter(|d| controls.contains(&d.id)) {
            door.toggle();
        }
        Ok(on)
    }
}

// ── Mutation ──

impl World {
    /// Commit a resolved move: the mover and every pushed block take their
    /// destination tiles at once.
    pub fn apply_plan(&mut self, id: ActorId, plan: &MovePlan) -> Result<(), WorldError> {
        for step in &plan.pushed {
            let block = self.actor_mut(step.block).ok_or(WorldError::UnknownActor(step.block))?;
            block.position = step.to;
        }
        let actor = self.actor_mut(id).ok_or(WorldError::UnknownActor(id))?;
        actor.position = plan.destination;
        Ok(())
    }
}

// ── Occupancy ──

impl OccupancyOracle for World {
    fn query(&self, p: Position, mask: Category) -> Option<Occupant> {
        if mask.contains(Category::STONE) {
            if let Some(id) = self.block_at(p) {
                return Some(Occupant::Block(id));
            }
        }
        let tile = self.tile_at(p);
        if mask.contains(Category::MOVEMENT) {
            if tile.is_solid() {
                return Some(Occupant::Terrain);
            }
            if let Some(door) = self.doors.iter().find(|d| d.active && d.position == p) {
                return Some(Occupant::Door(door.id));
            }
        }
        if mask.contains(Category::LADDER) && tile.is_climbable() {
            return Some(Occupant::Ladder);
        }
        if mask.contains(Category::INTERACTABLE) {
            if let Some(lever) = self.lever_at(p) {
                return Some(Occupant::Lever(lever.id));
            }
        }
        if mask.contains(Category::GOAL) && tile.is_goal() {
            return Some(Occupant::Goal);
        }
        None
    }

    /// Only open doors close on a flip; closed ones never hold anyone.
    fn door_obstruction(&self, lever: LeverId) -> Option<Position> {
        let controls = self.lever(lever)?.controls();
        self.doors
            .iter()
            .filter(|d| !d.active && controls.contains(&d.id))
            .map(|d| d.position)
            .find(|&p| self.actors.iter().any(|a| a.is_alive() && a.position == p))
    }
}

// ── Text dump ──

impl World {
    fn actor_glyph(actor: &Actor) -> char {
        match actor.kind {
            ActorKind::Player => 'P',
            ActorKind::Ghost => 'g',
            ActorKind::Block(BlockKind::Stone) => 'B',
            ActorKind::Block(BlockKind::TimeCube) => 'C',
        }
    }

    /// Door glyph in level-file notation: `A`.. closed, `a`.. open, keyed by
    /// the controlling lever. Unlinked doors show as `=`.
    fn door_glyph(&self, door: &Door) -> char {
        let lever = self.levers.iter().find(|l| l.controls().contains(&door.id));
        match lever {
            Some(l) if (1..=9).contains(&l.id.0) => {
                let base = if door.active { b'A' } else { b'a' };
                (base + l.id.0 - 1) as char
            }
            _ => '=',
        }
    }

    /// Render the world as text, top row first. Live actors draw over
    /// levers and doors, which draw over terrain. The player wins ties.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for row in (0..self.height).rev() {
            for col in 0..self.width {
                let p = Position::new(self.origin.x + col as i32, self.origin.y + row as i32);
                let here = |a: &&Actor| a.is_alive() && a.position == p;
                let ch = if let Some(a) = self.player().filter(|a| here(a)) {
                    Self::actor_glyph(a)
                } else if let Some(a) = self.actors.iter().find(here) {
                    Self::actor_glyph(a)
                } else if let Some(lever) = self.lever_at(p) {
                    char::from_digit(u32::from(lever.id.0), 10).unwrap_or('L')
                } else if let Some(door) = self.door_at(p) {
                    self.door_glyph(door)
                } else {
                    self.tile_at(p).glyph()
                };
                out.push(ch);
            }
            out.push('\n');
        }
        out
    }
}
