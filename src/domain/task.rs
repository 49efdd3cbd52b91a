/// Tasks: the recorded and replayed unit of actor behaviour.
///
/// Two-phase contract:
///   1. [`Task::can_perform`] checks legality against the current world and
///      returns a [`Commit`] describing exactly what will happen (destination,
///      push chain, lever). A rejection is a value, not a failure.
///   2. The simulation executes the `Commit` without querying the world again.
///
/// Tasks do not name the actor that performs them. The same recorded
/// sequence replays unchanged for whichever ghost owns it.

use super::actor::{Actor, ActorId};
use super::grid::{Direction, Position};
use super::lever::LeverId;
use super::movement::{self, MoveError, MovePlan, MovementRules};
use super::occupancy::{Category, OccupancyOracle};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Task {
    Move(Direction),
    /// Stand still for `ticks` scheduler ticks.
    Wait { ticks: u32 },
    /// Flip the lever the actor stands on.
    Interact { lever: LeverId },
}

/// The committed effect of a task that passed its legality check.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Commit {
    Move(MovePlan),
    Wait { ticks: u32 },
    Interact { lever: LeverId },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, thiserror::Error)]
pub enum TaskError {
    #[error(transparent)]
    Move(#[from] MoveError),

    #[error("actor {actor} is not standing on {lever}")]
    NotAtLever { actor: ActorId, lever: LeverId },

    #[error("no lever at {at}")]
    NoLever { at: Position },

    #[error("{lever} would close a door on the actor at {at}")]
    DoorObstructed { lever: LeverId, at: Position },

    #[error("actor {0} is already performing a task")]
    Busy(ActorId),

    #[error("actor {0} cannot act this round")]
    Exhausted(ActorId),
}

impl TaskError {
    /// Only a bottomless fall is terminal for the actor.
    pub fn is_fatal(&self) -> bool {
        matches!(self, TaskError::Move(e) if e.is_fatal())
    }
}

impl Task {
    /// Find the lever under `position` and build the interact task for it.
    pub fn interact_at<O: OccupancyOracle + ?Sized>(oracle: &O, position: Position) -> Result<Task, TaskError> {
        oracle
            .query(position, Category::INTERACTABLE)
            .and_then(|o| o.lever())
            .map(|lever| Task::Interact { lever })
            .ok_or(TaskError::NoLever { at: position })
    }

    /// Legality check and destination computation in one pass.
    pub fn can_perform<O: OccupancyOracle + ?Sized>(
        &self,
        actor: &Actor,
        oracle: &O,
        rules: &MovementRules,
    ) -> Result<Commit, TaskError> {
        if actor.is_performing_task() {
            return Err(TaskError::Busy(actor.id));
        }
        if !actor.can_perform_action || !actor.is_alive() {
            return Err(TaskError::Exhausted(actor.id));
        }
        match *self {
            Task::Move(direction) => {
                let plan = movement::resolve_move(oracle, &actor.mover(), direction, rules)?;
                Ok(Commit::Move(plan))
            }
            Task::Wait { ticks } => Ok(Commit::Wait { ticks }),
            Task::Interact { lever } => {
                let here = oracle
                    .query(actor.position, Category::INTERACTABLE)
                    .and_then(|o| o.lever());
                if here != Some(lever) {
                    return Err(TaskError::NotAtLever { actor: actor.id, lever });
                }
                if let Some(at) = oracle.door_obstruction(lever) {
                    return Err(TaskError::DoorObstructed { lever, at });
                }
                Ok(Commit::Interact { lever })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::actor::ActorKind;
    use crate::domain::occupancy::Occupant;

    /// Flat floor at y = -1 with a lever at (2, 0).
    struct Floor;

    impl OccupancyOracle for Floor {
        fn query(&self, p: Position, mask: Category) -> Option<Occupant> {
            if mask.contains(Category::MOVEMENT) && p.y < 0 {
                return Some(Occupant::Terrain);
            }
            if mask.contains(Category::INTERACTABLE) && p == Position::new(2, 0) {
                return Some(Occupant::Lever(LeverId(1)));
            }
            None
        }
    }

    fn player_at(x: i32) -> Actor {
        Actor::new(ActorId(0), ActorKind::Player, Position::new(x, 0))
    }

    #[test]
    fn move_commits_plan() {
        let commit = Task::Move(Direction::Right)
            .can_perform(&player_at(0), &Floor, &MovementRules::default())
            .unwrap();
        match commit {
            Commit::Move(plan) => assert_eq!(plan.destination, Position::new(1, 0)),
            other => panic!("unexpected commit {other:?}"),
        }
    }

    #[test]
    fn wait_always_commits() {
        let commit = Task::Wait { ticks: 3 }
            .can_perform(&player_at(0), &Floor, &MovementRules::default());
        assert_eq!(commit, Ok(Commit::Wait { ticks: 3 }));
    }

    #[test]
    fn interact_requires_standing_on_lever() {
        let task = Task::Interact { lever: LeverId(1) };
        let rules = MovementRules::default();
        assert_eq!(
            task.can_perform(&player_at(2), &Floor, &rules),
            Ok(Commit::Interact { lever: LeverId(1) })
        );
        assert_eq!(
            task.can_perform(&player_at(1), &Floor, &rules),
            Err(TaskError::NotAtLever { actor: ActorId(0), lever: LeverId(1) })
        );
    }

    #[test]
    fn interact_at_finds_lever() {
        assert_eq!(
            Task::interact_at(&Floor, Position::new(2, 0)),
            Ok(Task::Interact { lever: LeverId(1) })
        );
        assert!(Task::interact_at(&Floor, Position::new(3, 0)).is_err());
    }

    #[test]
    fn busy_actor_cannot_start_another_task() {
        let mut actor = player_at(0);
        actor.begin_task(Task::Wait { ticks: 1 }).unwrap();
        assert_eq!(
            Task::Wait { ticks: 1 }.can_perform(&actor, &Floor, &MovementRules::default()),
            Err(TaskError::Busy(ActorId(0)))
        );
    }

    #[test]
    fn exhausted_actor_is_rejected() {
        let mut actor = player_at(0);
        actor.can_perform_action = false;
        assert_eq!(
            Task::Wait { ticks: 1 }.can_perform(&actor, &Floor, &MovementRules::default()),
            Err(TaskError::Exhausted(ActorId(0)))
        );
    }

    #[test]
    fn fatal_only_for_bottomless_fall() {
        let fall = TaskError::Move(MoveError::BottomlessFall { from: Position::new(0, 0), limit: 50 });
        assert!(fall.is_fatal());
        assert!(!TaskError::Move(MoveError::Blocked { at: Position::new(0, 0) }).is_fatal());
        assert!(!TaskError::Busy(ActorId(1)).is_fatal());
    }
}
