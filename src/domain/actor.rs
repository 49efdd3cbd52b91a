/// Actors: the player, ghosts and pushable blocks.
///
/// One struct covers every kind; behaviour differences are asked of
/// [`ActorKind`] rather than split into separate types, so the scheduler
/// and world can keep all actors in a single `Vec`.
///
/// State per actor:
///   - `current`: the task being executed, if any (the busy flag)
///   - `history`: tasks the player performed this round, in order
///   - `replay_cursor`: how far a ghost has consumed its history
///   - `can_perform_action`: cleared when the player ends the round, a
///     ghost runs out of replay tasks, or the actor dies

use std::fmt;

use super::grid::{Facing, Position};
use super::movement::{Mover, MoverKind};
use super::task::{Task, TaskError};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ActorId(pub u32);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BlockKind {
    /// Returns to its spawn tile on every round reset.
    Stone,
    /// Keeps its position across resets; a fresh cube appears at the
    /// spawn tile if that tile is free.
    TimeCube,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ActorKind {
    Player,
    Ghost,
    Block(BlockKind),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum ActorStatus {
    #[default]
    Active,
    Dead,
}

#[derive(Clone, Debug)]
pub struct Actor {
    pub id: ActorId,
    pub kind: ActorKind,
    pub position: Position,
    pub initial_position: Position,
    pub facing: Facing,
    pub status: ActorStatus,
    pub can_perform_action: bool,
    current: Option<Task>,
    history: Vec<Task>,
    replay_cursor: usize,
}

impl Actor {
    pub fn new(id: ActorId, kind: ActorKind, initial: Position) -> Self {
        Actor {
            id,
            kind,
            position: initial,
            initial_position: initial,
            facing: Facing::Right,
            status: ActorStatus::Active,
            can_perform_action: true,
            current: None,
            history: Vec::new(),
            replay_cursor: 0,
        }
    }

    /// A ghost that will replay `history` from `initial`.
    pub fn ghost(id: ActorId, initial: Position, history: Vec<Task>) -> Self {
        Actor { history, ..Actor::new(id, ActorKind::Ghost, initial) }
    }

    // ── Kind queries ──

    pub fn is_player(&self) -> bool {
        self.kind == ActorKind::Player
    }

    pub fn is_ghost(&self) -> bool {
        self.kind == ActorKind::Ghost
    }

    /// Player or ghost.
    pub fn is_character(&self) -> bool {
        matches!(self.kind, ActorKind::Player | ActorKind::Ghost)
    }

    pub fn block_kind(&self) -> Option<BlockKind> {
        match self.kind {
            ActorKind::Block(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn mover_kind(&self) -> MoverKind {
        if self.is_character() {
            MoverKind::Character
        } else {
            MoverKind::Block
        }
    }

    pub fn mover(&self) -> Mover {
        Mover { id: self.id, position: self.position, kind: self.mover_kind() }
    }

    /// Time cubes stay where they were left when the round resets.
    pub fn resets_position(&self) -> bool {
        self.block_kind() != Some(BlockKind::TimeCube)
    }

    // ── Liveness ──

    pub fn is_alive(&self) -> bool {
        self.status == ActorStatus::Active
    }

    pub fn kill(&mut self) {
        self.status = ActorStatus::Dead;
        self.can_perform_action = false;
        self.current = None;
    }

    // ── Task execution ──

    pub fn is_performing_task(&self) -> bool {
        self.current.is_some()
    }

    /// Mark the actor busy with `task`. An actor runs one task at a time.
    pub fn begin_task(&mut self, task: Task) -> Result<(), TaskError> {
        if self.current.is_some() {
            return Err(TaskError::Busy(self.id));
        }
        self.current = Some(task);
        Ok(())
    }

    pub fn finish_task(&mut self) -> Option<Task> {
        self.current.take()
    }

    // ── History / replay ──

    /// Append a performed task to the player's history. Ghost histories are
    /// fixed at spawn, so this is a no-op for any other kind.
    pub fn record(&mut self, task: Task) {
        if self.is_player() {
            self.history.push(task);
        }
    }

    pub fn history(&self) -> &[Task] {
        &self.history
    }

    /// Next task a ghost should replay, advancing the cursor.
    pub fn next_replay(&mut self) -> Option<Task> {
        let task = self.history.get(self.replay_cursor).copied()?;
        self.replay_cursor += 1;
        Some(task)
    }

    pub fn replay_remaining(&self) -> usize {
        self.history.len().saturating_sub(self.replay_cursor)
    }

    /// Round reset: back to the spawn tile with a fresh action budget.
    ///
    /// Ghosts rewind their replay cursor and keep their history; the
    /// player starts an empty history. Time cubes keep their position.
    pub fn reset(&mut self) {
        if self.resets_position() {
            self.position = self.initial_position;
        }
        self.facing = Facing::Right;
        self.status = ActorStatus::Active;
        self.can_perform_action = true;
        self.current = None;
        self.replay_cursor = 0;
        if self.is_player() {
            self.history.clear();
        }
    }
}
