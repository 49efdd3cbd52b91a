/// Time-extended task execution.
///
/// A committed task takes effect on the world the moment it starts:
/// positions, pushed blocks and lever state are all updated by
/// [`Execution::start`]. What remains is the animation, which an
/// `Execution` plays out one scheduler tick at a time:
///
///   start ─► advance ─► advance ─► … ─► done (busy flag cleared)
///
/// Pushed blocks run as child tweens alongside their pusher. The pusher's
/// execution does not finish until every child has.

use crate::config::TimingConfig;
use crate::domain::actor::ActorId;
use crate::domain::grid::{Facing, Position};
use crate::domain::movement::{MotionKind, MovePlan};
use crate::domain::task::{Commit, Task, TaskError};
use crate::sim::event::{AnimId, SimEvent};
use crate::sim::world::{World, WorldError};

#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error(transparent)]
    Task(#[from] TaskError),

    #[error(transparent)]
    World(#[from] WorldError),
}

// ══════════════════════════════════════════════════════════════
// Motion paths
// ══════════════════════════════════════════════════════════════

/// Visual path of one actor: straight to `to`, or through `via` first.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct MotionPath {
    pub from: Position,
    pub via: Option<Position>,
    pub to: Position,
}

fn lerp(a: Position, b: Position, t: f32) -> (f32, f32) {
    let x = a.x as f32 + (b.x - a.x) as f32 * t;
    let y = a.y as f32 + (b.y - a.y) as f32 * t;
    (x, y)
}

impl MotionPath {
    pub fn straight(from: Position, to: Position) -> Self {
        MotionPath { from, via: None, to }
    }

    pub fn for_plan(plan: &MovePlan) -> Self {
        let via = match plan.motion {
            // Climb first, then over the ledge
            MotionKind::StepUp => Some(plan.origin.up()),
            _ => plan.via,
        };
        MotionPath { from: plan.origin, via, to: plan.destination }
    }

    /// Position at `t` in `[0, 1]`. With a waypoint, each leg gets time in
    /// proportion to its length.
    pub fn sample(&self, t: f32) -> (f32, f32) {
        let t = t.clamp(0.0, 1.0);
        let Some(via) = self.via else {
            return lerp(self.from, self.to, t);
        };
        let first = self.from.manhattan(via) as f32;
        let second = via.manhattan(self.to) as f32;
        let total = first + second;
        if total == 0.0 {
            return lerp(self.from, self.to, t);
        }
        let s = t * total;
        if s <= first && first > 0.0 {
            lerp(self.from, via, s / first)
        } else if second > 0.0 {
            lerp(via, self.to, (s - first) / second)
        } else {
            lerp(self.from, via, 1.0)
        }
    }
}

/// One actor moving along a path over a fixed number of ticks.
#[derive(Clone, Debug)]
pub struct Tween {
    pub actor: ActorId,
    pub path: MotionPath,
    elapsed: u32,
    duration: u32,
}

impl Tween {
    pub fn new(actor: ActorId, path: MotionPath, duration: u32) -> Self {
        Tween { actor, path, elapsed: 0, duration: duration.max(1) }
    }

    pub fn is_done(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// Advance one tick and emit the new visual position.
    pub fn step(&mut self, events: &mut Vec<SimEvent>) {
        if self.is_done() {
            return;
        }
        self.elapsed += 1;
        let (x, y) = self.path.sample(self.elapsed as f32 / self.duration as f32);
        events.push(SimEvent::Motion { actor: self.actor, x, y });
    }
}

// ── Durations ──

fn fall_ticks(timing: &TimingConfig, distance: u32) -> u32 {
    timing.fall_ticks_per_tile.saturating_mul(distance)
}

pub fn move_duration(timing: &TimingConfig, plan: &MovePlan) -> u32 {
    match plan.motion {
        MotionKind::Walk => timing.move_ticks,
        MotionKind::StepUp | MotionKind::Climb => timing.climb_ticks,
        MotionKind::Push => timing.push_ticks,
        MotionKind::Fall => timing.move_ticks + fall_ticks(timing, plan.fall_distance()),
    }
}

fn anim_for(motion: MotionKind) -> AnimId {
    match motion {
        MotionKind::Walk => AnimId::Moving,
        MotionKind::StepUp | MotionKind::Climb => AnimId::Climbing,
        MotionKind::Fall => AnimId::Falling,
        MotionKind::Push => AnimId::Pushing,
    }
}

// ══════════════════════════════════════════════════════════════
// Execution
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct Execution {
    actor: ActorId,
    /// `None` for gravity-settle drops, which are not tasks.
    task: Option<Task>,
    elapsed: u32,
    duration: u32,
    motion: Option<Tween>,
    anim: Option<AnimId>,
    landing: u32,
    children: Vec<Tween>,
}

impl Execution {
    /// Begin executing a committed task. World effects apply immediately.
    pub fn start(
        world: &mut World,
        actor: ActorId,
        task: Task,
        commit: Commit,
        timing: &TimingConfig,
        events: &mut Vec<SimEvent>,
    ) -> Result<Self, ExecutionError> {
        let mover = world.actor_mut(actor).ok_or(WorldError::UnknownActor(actor))?;
        mover.begin_task(task)?;
        if let Some(facing) = task_facing(task) {
            mover.facing = facing;
        }
        events.push(SimEvent::TaskStarted { actor, task });

        match commit {
            Commit::Move(plan) => Self::start_move(world, actor, Some(task), &plan, timing, events),
            Commit::Wait { ticks } => Ok(Self::idle(actor, Some(task), ticks)),
            Commit::Interact { lever } => {
                let on = world.flip_lever(lever)?;
                events.push(SimEvent::LeverFlipped { lever, on });
                Ok(Self::idle(actor, Some(task), timing.interact_ticks))
            }
        }
    }

    /// Drop a floating actor during gravity settle.
    pub fn settle(
        world: &mut World,
        actor: ActorId,
        plan: &MovePlan,
        timing: &TimingConfig,
        events: &mut Vec<SimEvent>,
    ) -> Result<Self, ExecutionError> {
        let drop = timing.fall_ticks_per_tile.max(1).saturating_mul(plan.fall_distance());
        let mut exec = Self::start_move(world, actor, None, plan, timing, events)?;
        exec.duration = drop.max(1);
        exec.motion = Some(Tween::new(actor, MotionPath::for_plan(plan), exec.duration));
        Ok(exec)
    }

    fn idle(actor: ActorId, task: Option<Task>, ticks: u32) -> Self {
        Execution {
            actor,
            task,
            elapsed: 0,
            duration: ticks.max(1),
            motion: None,
            anim: None,
            landing: 0,
            children: Vec::new(),
        }
    }

    fn start_move(
        world: &mut World,
        actor: ActorId,
        task: Option<Task>,
        plan: &MovePlan,
        timing: &TimingConfig,
        events: &mut Vec<SimEvent>,
    ) -> Result<Self, ExecutionError> {
        world.apply_plan(actor, plan)?;
        events.push(SimEvent::Moved { actor, from: plan.origin, to: plan.destination });

        let children = plan
            .pushed
            .iter()
            .map(|step| {
                events.push(SimEvent::Moved { actor: step.block, from: step.from, to: step.to });
                let drop = step.via.map_or(0, |via| via.y.abs_diff(step.to.y));
                let path = MotionPath { from: step.from, via: step.via, to: step.to };
                Tween::new(step.block, path, timing.push_ticks + fall_ticks(timing, drop))
            })
            .collect();

        let anim = anim_for(plan.motion);
        events.push(SimEvent::Animation { actor, anim, active: true });

        let duration = move_duration(timing, plan).max(1);
        Ok(Execution {
            actor,
            task,
            elapsed: 0,
            duration,
            motion: Some(Tween::new(actor, MotionPath::for_plan(plan), duration)),
            anim: Some(anim),
            landing: plan.fall_distance(),
            children,
        })
    }

    pub fn actor(&self) -> ActorId {
        self.actor
    }

    /// Advance one tick. Returns `true` once the actor and every pushed
    /// block have finished; the actor's busy flag is cleared at that point.
    pub fn advance(&mut self, world: &mut World, events: &mut Vec<SimEvent>) -> Result<bool, ExecutionError> {
        if self.elapsed < self.duration {
            self.elapsed += 1;
            if let Some(tween) = self.motion.as_mut() {
                tween.step(events);
            }
        }
        for child in &mut self.children {
            child.step(events);
        }
        if self.elapsed < self.duration || !self.children.iter().all(Tween::is_done) {
            return Ok(false);
        }

        let actor = world.actor_mut(self.actor).ok_or(WorldError::UnknownActor(self.actor))?;
        if self.task.is_some() {
            actor.finish_task();
        }
        if let Some(anim) = self.anim {
            events.push(SimEvent::Animation { actor: self.actor, anim, active: false });
        }
        if self.landing > 0 {
            let amount = (self.landing as f32 / 4.0).min(1.0);
            events.push(SimEvent::Squish { actor: self.actor, amount });
        }
        Ok(true)
    }
}

// ══════════════════════════════════════════════════════════════
// Rewind
// ══════════════════════════════════════════════════════════════

/// Round-reset animation: every displaced actor slides back to its
/// spawn tile at once.
#[derive(Clone, Debug)]
pub struct Rewind {
    tweens: Vec<Tween>,
    elapsed: u32,
    duration: u32,
}

impl Rewind {
    pub fn new(moves: impl IntoIterator<Item = (ActorId, Position, Position)>, ticks: u32) -> Self {
        let duration = ticks.max(1);
        let tweens = moves
            .into_iter()
            .filter(|(_, from, to)| from != to)
            .map(|(actor, from, to)| Tween::new(actor, MotionPath::straight(from, to), duration))
            .collect();
        Rewind { tweens, elapsed: 0, duration }
    }

    pub fn advance(&mut self, events: &mut Vec<SimEvent>) -> bool {
        self.elapsed += 1;
        for tween in &mut self.tweens {
            tween.step(events);
        }
        self.elapsed >= self.duration
    }
}

/// Horizontal moves turn the mover; everything else keeps its facing.
fn task_facing(task: Task) -> Option<Facing> {
    match task {
        Task::Move(direction) => direction.facing(),
        Task::Wait { .. } | Task::Interact { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::actor::{ActorKind, BlockKind};
    use crate::domain::grid::Direction;
    use crate::domain::lever::LeverId;
    use crate::domain::movement::{self, MovementRules};
    use crate::domain::tile::Tile;

    fn timing() -> TimingConfig {
        TimingConfig::default()
    }

    /// 6 x 2 world, floor along y = 0.
    fn floor_world() -> World {
        let mut w = World::new(6, 2, Position::new(0, 0));
        for x in 0..6 {
            w.set_tile(Position::new(x, 0), Tile::Solid);
        }
        w
    }

    fn run(exec: &mut Execution, world: &mut World, events: &mut Vec<SimEvent>) -> u32 {
        let mut ticks = 0;
        while !exec.advance(world, events).unwrap() {
            ticks += 1;
            assert!(ticks < 1000, "execution never finished");
        }
        ticks + 1
    }

    #[test]
    fn sample_goes_horizontal_then_down() {
        let path = MotionPath {
            from: Position::new(0, 3),
            via: Some(Position::new(1, 3)),
            to: Position::new(1, 0),
        };
        assert_eq!(path.sample(0.0), (0.0, 3.0));
        assert_eq!(path.sample(0.25), (1.0, 3.0));
        assert_eq!(path.sample(1.0), (1.0, 0.0));
    }

    #[test]
    fn walk_commits_at_start_and_clears_busy_at_end() {
        let mut world = floor_world();
        let player = world.spawn(ActorKind::Player, Position::new(0, 1));
        let task = Task::Move(Direction::Right);
        let commit = task
            .can_perform(world.actor(player).unwrap(), &world, &MovementRules::default())
            .unwrap();
        let mut events = Vec::new();

        let mut exec = Execution::start(&mut world, player, task, commit, &timing(), &mut events).unwrap();
        assert_eq!(world.actor(player).unwrap().position, Position::new(1, 1));
        assert!(world.actor(player).unwrap().is_performing_task());

        let ticks = run(&mut exec, &mut world, &mut events);
        assert_eq!(ticks, timing().move_ticks);
        assert!(!world.actor(player).unwrap().is_performing_task());
        assert!(events.contains(&SimEvent::Animation { actor: player, anim: AnimId::Moving, active: false }));
    }

    #[test]
    fn horizontal_move_turns_actor() {
        let mut world = floor_world();
        let player = world.spawn(ActorKind::Player, Position::new(2, 1));
        let mut events = Vec::new();
        let mut turn = |world: &mut World, dir: Direction| {
            let task = Task::Move(dir);
            let commit = task
                .can_perform(world.actor(player).unwrap(), &*world, &MovementRules::default())
                .unwrap();
            let mut exec = Execution::start(world, player, task, commit, &timing(), &mut events).unwrap();
            run(&mut exec, world, &mut events);
            world.actor(player).unwrap().facing
        };
        assert_eq!(turn(&mut world, Direction::Left), Facing::Left);
        assert_eq!(turn(&mut world, Direction::Right), Facing::Right);
    }

    #[test]
    fn pusher_waits_for_pushed_block() {
        let mut world = floor_world();
        let player = world.spawn(ActorKind::Player, Position::new(0, 1));
        let stone = world.spawn(ActorKind::Block(BlockKind::Stone), Position::new(1, 1));
        let task = Task::Move(Direction::Right);
        let commit = task
            .can_perform(world.actor(player).unwrap(), &world, &MovementRules::default())
            .unwrap();
        let mut events = Vec::new();

        let mut exec = Execution::start(&mut world, player, task, commit, &timing(), &mut events).unwrap();
        assert_eq!(world.actor(stone).unwrap().position, Position::new(2, 1));
        let ticks = run(&mut exec, &mut world, &mut events);
        assert_eq!(ticks, timing().push_ticks);
        let last_block_sample = events
            .iter()
            .rev()
            .find_map(|e| match e {
                SimEvent::Motion { actor, x, y } if *actor == stone => Some((*x, *y)),
                _ => None,
            })
            .unwrap();
        assert_eq!(last_block_sample, (2.0, 1.0));
    }

    #[test]
    fn busy_actor_cannot_start() {
        let mut world = floor_world();
        let player = world.spawn(ActorKind::Player, Position::new(0, 1));
        let mut events = Vec::new();
        let wait = Task::Wait { ticks: 2 };
        let _first = Execution::start(&mut world, player, wait, Commit::Wait { ticks: 2 }, &timing(), &mut events)
            .unwrap();
        let second = Execution::start(&mut world, player, wait, Commit::Wait { ticks: 2 }, &timing(), &mut events);
        assert!(matches!(second, Err(ExecutionError::Task(TaskError::Busy(_)))));
    }

    #[test]
    fn interact_flips_lever() {
        let mut world = floor_world();
        let player = world.spawn(ActorKind::Player, Position::new(2, 1));
        world.add_lever(LeverId(1), Position::new(2, 1));
        let mut events = Vec::new();
        let task = Task::Interact { lever: LeverId(1) };
        let mut exec = Execution::start(
            &mut world,
            player,
            task,
            Commit::Interact { lever: LeverId(1) },
            &timing(),
            &mut events,
        )
        .unwrap();
        assert!(world.lever(LeverId(1)).unwrap().is_on());
        assert_eq!(run(&mut exec, &mut world, &mut events), timing().interact_ticks);
        assert!(events.contains(&SimEvent::LeverFlipped { lever: LeverId(1), on: true }));
    }

    #[test]
    fn fall_lands_with_squish() {
        let mut world = World::new(3, 4, Position::new(0, 0));
        for x in 0..3 {
            world.set_tile(Position::new(x, 0), Tile::Solid);
        }
        world.set_tile(Position::new(0, 2), Tile::Solid);
        let player = world.spawn(ActorKind::Player, Position::new(0, 3));
        let mover = world.actor(player).unwrap().mover();
        let plan = movement::resolve_move(&world, &mover, Direction::Right, &MovementRules::default()).unwrap();
        assert_eq!(plan.fall_distance(), 2);

        let mut events = Vec::new();
        let task = Task::Move(Direction::Right);
        let mut exec = Execution::start(&mut world, player, task, Commit::Move(plan), &timing(), &mut events)
            .unwrap();
        let ticks = run(&mut exec, &mut world, &mut events);
        assert_eq!(ticks, timing().move_ticks + 2 * timing().fall_ticks_per_tile);
        assert!(events.iter().any(|e| matches!(e, SimEvent::Squish { actor, .. } if *actor == player)));
    }

    #[test]
    fn rewind_runs_for_configured_ticks() {
        let mut rewind = Rewind::new(
            [
                (ActorId(0), Position::new(4, 1), Position::new(0, 1)),
                (ActorId(1), Position::new(2, 1), Position::new(2, 1)),
            ],
            3,
        );
        let mut events = Vec::new();
        assert!(!rewind.advance(&mut events));
        assert!(!rewind.advance(&mut events));
        assert!(rewind.advance(&mut events));
        // Only the displaced actor animates
        assert_eq!(events.len(), 3);
        assert_eq!(events[2], SimEvent::Motion { actor: ActorId(0), x: 0.0, y: 1.0 });
    }
}
