/// Events emitted while the scheduler advances.
/// The presentation layer consumes these for animation/sound; the
/// simulation behaves the same whether anyone listens or not.

use crate::domain::actor::ActorId;
use crate::domain::grid::Position;
use crate::domain::lever::LeverId;
use crate::domain::task::Task;

/// Animation channels a task can switch on and off.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AnimId {
    Moving,
    Pushing,
    Climbing,
    Falling,
    WinLevel,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SimEvent {
    TurnStarted { round: u32, turn: u32 },
    TaskStarted { actor: ActorId, task: Task },
    /// A ghost's replayed task was no longer legal and was skipped.
    GhostDiverged { actor: ActorId, task: Task },
    Animation { actor: ActorId, anim: AnimId, active: bool },
    /// Visual position sample, in tile units.
    Motion { actor: ActorId, x: f32, y: f32 },
    /// Landing squash, 0.0 (none) to 1.0.
    Squish { actor: ActorId, amount: f32 },
    Moved { actor: ActorId, from: Position, to: Position },
    LeverFlipped { lever: LeverId, on: bool },
    GoalReached { at: Position },
    ActorDied { actor: ActorId, at: Position },
    RoundEnded { round: u32 },
    GhostSpawned { ghost: ActorId, actions: usize },
    ActorReset { actor: ActorId, to: Position },
    TimeCubeRespawned { cube: ActorId, at: Position },
}
