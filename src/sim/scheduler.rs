/// Phase scheduler: the turn loop.
///
/// ## Phases
///
/// ```text
///                 decide()
///  AwaitingDecision ──────► Resolving ──► Settling ──┬─► AwaitingDecision
///        ▲                                           │
///        │                        player exhausted   ▼
///        └──────────── Settling ◄──────────────── Rewinding
/// ```
///
/// Plus two terminal phases: `LevelComplete` (player ended a move on a
/// goal) and `LevelFailed` (player dead straight after a rewind).
///
/// ## Resolution order
///
/// `[player, ghost 1, ghost 2, …]` in spawn order. Exactly one execution
/// runs at a time; the next actor starts only when the previous one has
/// finished, including any blocks it pushed. Blocks never act on their
/// own: they move when pushed and when gravity settle drops them.
///
/// ## Round reset
///
/// When the player can no longer act (end round, or death) the scheduler
/// spawns a ghost holding a copy of the player's history, resets every
/// actor to its spawn tile, respawns missing time cubes, plays the rewind
/// animation and settles the fresh world. Levers keep their state.

use std::collections::VecDeque;

use tracing::{debug, info};

use crate::config::{GameConfig, TimingConfig};
use crate::domain::actor::{ActorId, ActorKind, BlockKind};
use crate::domain::grid::{Direction, Position};
use crate::domain::movement::{self, MovementRules};
use crate::domain::occupancy::{Category, OccupancyOracle};
use crate::domain::task::{Commit, Task, TaskError};
use crate::sim::event::{AnimId, SimEvent};
use crate::sim::execution::{Execution, ExecutionError, Rewind};
use crate::sim::script::Command;
use crate::sim::world::{World, WorldError};

/// Level progression collaborator. Scene changes are its business.
pub trait LevelProgress {
    fn goal_reached(&mut self, at: Position);

    fn player_lost(&mut self, _at: Position) {}
}

/// What the input layer asks the player to do this turn.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Decision {
    Act(Task),
    EndRound,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DecisionOutcome {
    /// The turn is resolving.
    Accepted,
    /// Illegal right now; still awaiting a decision.
    Rejected(TaskError),
    /// The task killed the player. The turn resolves, then the round resets.
    PlayerLost,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    AwaitingDecision,
    Resolving,
    Settling,
    Rewinding,
    LevelComplete,
    LevelFailed,
}

impl Phase {
    pub fn is_level_over(self) -> bool {
        matches!(self, Phase::LevelComplete | Phase::LevelFailed)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("scheduler needs a world")]
    MissingWorld,

    #[error("scheduler needs a level progress collaborator")]
    MissingLevelProgress,

    #[error("world has no player")]
    NoPlayer,
}

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("cannot decide during {0:?}")]
    NotAwaitingDecision(Phase),

    #[error("level is over")]
    LevelOver,

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    World(#[from] WorldError),
}

// ══════════════════════════════════════════════════════════════
// Builder
// ══════════════════════════════════════════════════════════════

pub struct SchedulerBuilder<L> {
    world: Option<World>,
    level: Option<L>,
    rules: MovementRules,
    timing: TimingConfig,
}

impl<L: LevelProgress> SchedulerBuilder<L> {
    pub fn world(mut self, world: World) -> Self {
        self.world = Some(world);
        self
    }

    pub fn level(mut self, level: L) -> Self {
        self.level = Some(level);
        self
    }

    pub fn rules(mut self, rules: MovementRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    pub fn config(self, config: &GameConfig) -> Self {
        self.rules(config.rules.movement()).timing(config.timing)
    }

    /// The scheduler starts by settling the world; run it to idle before
    /// the first decision.
    pub fn build(self) -> Result<PhaseScheduler<L>, SetupError> {
        let world = self.world.ok_or(SetupError::MissingWorld)?;
        let level = self.level.ok_or(SetupError::MissingLevelProgress)?;
        let player = world.player_id().ok_or(SetupError::NoPlayer)?;

        let mut order = vec![player];
        order.extend(world.ghost_ids());

        Ok(PhaseScheduler {
            world,
            level,
            rules: self.rules,
            timing: self.timing,
            player,
            order,
            phase: Phase::Settling,
            pending: None,
            queue: VecDeque::new(),
            running: None,
            rewind: None,
            after_reset: true,
            round: 1,
            turn: 1,
            events: Vec::new(),
        })
    }
}

// ══════════════════════════════════════════════════════════════
// Scheduler
// ══════════════════════════════════════════════════════════════

pub struct PhaseScheduler<L> {
    world: World,
    level: L,
    rules: MovementRules,
    timing: TimingConfig,
    player: ActorId,
    /// Resolution order: player, then ghosts in spawn order.
    order: Vec<ActorId>,
    phase: Phase,

    // ── Resolving ──
    pending: Option<(Task, Commit)>,
    queue: VecDeque<ActorId>,
    running: Option<Execution>,

    // ── Rewinding / settling ──
    rewind: Option<Rewind>,
    /// The settle in progress follows a round reset (or level start).
    after_reset: bool,

    round: u32,
    turn: u32,
    events: Vec<SimEvent>,
}

impl<L: LevelProgress> PhaseScheduler<L> {
    pub fn builder() -> SchedulerBuilder<L> {
        SchedulerBuilder {
            world: None,
            level: None,
            rules: MovementRules::default(),
            timing: TimingConfig::default(),
        }
    }

    // ── Accessors ──

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn level(&self) -> &L {
        &self.level
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn order(&self) -> &[ActorId] {
        &self.order
    }

    pub fn player_id(&self) -> ActorId {
        self.player
    }

    pub fn player_position(&self) -> Option<Position> {
        self.world.actor(self.player).map(|a| a.position)
    }

    // ── Decisions ──

    /// Offer the player's decision for this turn.
    ///
    /// A rejected task leaves the scheduler awaiting another decision.
    pub fn decide(&mut self, decision: Decision) -> Result<DecisionOutcome, SchedulerError> {
        self.ensure_awaiting()?;

        let task = match decision {
            Decision::EndRound => {
                info!(round = self.round, turn = self.turn, "player ends the round");
                self.player_mut()?.can_perform_action = false;
                self.begin_resolving();
                return Ok(DecisionOutcome::Accepted);
            }
            Decision::Act(task) => task,
        };

        let player = self.world.actor(self.player).ok_or(WorldError::UnknownActor(self.player))?;
        match task.can_perform(player, &self.world, &self.rules) {
            Ok(commit) => {
                debug!(?task, "player task accepted");
                self.pending = Some((task, commit));
                self.begin_resolving();
                Ok(DecisionOutcome::Accepted)
            }
            Err(e) if e.is_fatal() => {
                // Recorded so the ghost walks into the same death
                self.player_mut()?.record(task);
                self.kill(self.player)?;
                self.begin_resolving();
                Ok(DecisionOutcome::PlayerLost)
            }
            Err(e) => {
                debug!(?task, error = %e, "player task rejected");
                Ok(DecisionOutcome::Rejected(e))
            }
        }
    }

    /// Translate an input-layer command into a decision. `Interact`
    /// targets the lever under the player.
    pub fn command(&mut self, command: Command) -> Result<DecisionOutcome, SchedulerError> {
        self.ensure_awaiting()?;
        let task = match command {
            Command::Move(dir) => Task::Move(dir),
            Command::Wait => Task::Wait { ticks: self.timing.wait_ticks },
            Command::EndRound => return self.decide(Decision::EndRound),
            Command::Interact => {
                let at = self.player_position().ok_or(WorldError::UnknownActor(self.player))?;
                match Task::interact_at(&self.world, at) {
                    Ok(task) => task,
                    Err(e) => {
                        debug!(error = %e, "nothing to interact with");
                        return Ok(DecisionOutcome::Rejected(e));
                    }
                }
            }
        };
        self.decide(Decision::Act(task))
    }

    fn ensure_awaiting(&self) -> Result<(), SchedulerError> {
        if self.phase.is_level_over() {
            return Err(SchedulerError::LevelOver);
        }
        if self.phase != Phase::AwaitingDecision {
            return Err(SchedulerError::NotAwaitingDecision(self.phase));
        }
        Ok(())
    }

    /// Shorthand for `command(Command::Move(dir))`.
    pub fn step(&mut self, dir: Direction) -> Result<DecisionOutcome, SchedulerError> {
        self.command(Command::Move(dir))
    }

    // ── Ticking ──

    /// Advance one tick and return the events it produced.
    pub fn tick(&mut self) -> Result<Vec<SimEvent>, SchedulerError> {
        match self.phase {
            Phase::Resolving => self.tick_resolving()?,
            Phase::Settling => self.tick_settling()?,
            Phase::Rewinding => self.tick_rewinding()?,
            Phase::AwaitingDecision | Phase::LevelComplete | Phase::LevelFailed => {}
        }
        Ok(std::mem::take(&mut self.events))
    }

    /// Tick until the scheduler needs a decision or the level is over.
    pub fn run_until_idle(&mut self) -> Result<Vec<SimEvent>, SchedulerError> {
        let mut events = std::mem::take(&mut self.events);
        while self.is_busy() {
            events.extend(self.tick()?);
        }
        Ok(events)
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.phase, Phase::Resolving | Phase::Settling | Phase::Rewinding)
    }

    // ══════════════════════════════════════════════════════════════
    // Resolving
    // ══════════════════════════════════════════════════════════════

    fn begin_resolving(&mut self) {
        self.phase = Phase::Resolving;
        self.queue = self.order.iter().copied().collect();
    }

    fn tick_resolving(&mut self) -> Result<(), SchedulerError> {
        if let Some(exec) = self.running.as_mut() {
            if !exec.advance(&mut self.world, &mut self.events)? {
                return Ok(());
            }
            let finished = exec.actor();
            self.running = None;
            if finished == self.player && self.check_goal() {
                return Ok(());
            }
        }

        // Start the next actor that has something to do
        while let Some(id) = self.queue.pop_front() {
            if let Some(exec) = self.start_actor(id)? {
                self.running = Some(exec);
                return Ok(());
            }
        }

        self.phase = Phase::Settling;
        self.after_reset = false;
        Ok(())
    }

    /// Start `id`'s task for this turn, if it has one.
    fn start_actor(&mut self, id: ActorId) -> Result<Option<Execution>, SchedulerError> {
        if id == self.player {
            let Some((task, commit)) = self.pending.take() else {
                return Ok(None);
            };
            self.player_mut()?.record(task);
            let exec = Execution::start(&mut self.world, id, task, commit, &self.timing, &mut self.events)?;
            return Ok(Some(exec));
        }

        let ghost = self.world.actor_mut(id).ok_or(WorldError::UnknownActor(id))?;
        if !ghost.is_alive() || !ghost.can_perform_action {
            return Ok(None);
        }
        let Some(task) = ghost.next_replay() else {
            debug!(ghost = %id, "replay exhausted");
            ghost.can_perform_action = false;
            return Ok(None);
        };

        let ghost = self.world.actor(id).ok_or(WorldError::UnknownActor(id))?;
        match task.can_perform(ghost, &self.world, &self.rules) {
            Ok(commit) => {
                let exec = Execution::start(&mut self.world, id, task, commit, &self.timing, &mut self.events)?;
                Ok(Some(exec))
            }
            Err(e) if e.is_fatal() => {
                self.kill(id)?;
                Ok(None)
            }
            Err(e) => {
                debug!(ghost = %id, ?task, error = %e, "ghost diverged from its recording");
                self.events.push(SimEvent::GhostDiverged { actor: id, task });
                Ok(None)
            }
        }
    }

    /// Player standing on a goal ends the level.
    fn check_goal(&mut self) -> bool {
        let Some(player) = self.world.actor(self.player) else {
            return false;
        };
        if !player.is_alive() || !self.world.is_occupied(player.position, Category::GOAL) {
            return false;
        }
        let at = player.position;
        info!(%at, round = self.round, turn = self.turn, "goal reached");
        self.events.push(SimEvent::GoalReached { at });
        self.events.push(SimEvent::Animation { actor: self.player, anim: AnimId::WinLevel, active: true });
        self.level.goal_reached(at);
        self.phase = Phase::LevelComplete;
        self.running = None;
        self.queue.clear();
        true
    }

    fn kill(&mut self, id: ActorId) -> Result<(), SchedulerError> {
        let actor = self.world.actor_mut(id).ok_or(WorldError::UnknownActor(id))?;
        actor.kill();
        let at = actor.position;
        let is_player = actor.is_player();
        info!(actor = %id, %at, "actor fell out of the world");
        self.events.push(SimEvent::ActorDied { actor: id, at });
        if is_player {
            self.level.player_lost(at);
        }
        Ok(())
    }

    fn player_mut(&mut self) -> Result<&mut crate::domain::actor::Actor, WorldError> {
        self.world.actor_mut(self.player).ok_or(WorldError::UnknownActor(self.player))
    }

    // ══════════════════════════════════════════════════════════════
    // Gravity settle
    // ══════════════════════════════════════════════════════════════

    /// Lowest floating live actor, ties broken by id.
    fn lowest_floating(&self) -> Option<ActorId> {
        self.world
            .actors()
            .iter()
            .filter(|a| a.is_alive() && !a.is_performing_task())
            .filter(|a| movement::is_floating(&self.world, a.position, a.mover_kind()))
            .min_by_key(|a| (a.position.y, a.id))
            .map(|a| a.id)
    }

    fn tick_settling(&mut self) -> Result<(), SchedulerError> {
        if let Some(exec) = self.running.as_mut() {
            if !exec.advance(&mut self.world, &mut self.events)? {
                return Ok(());
            }
            self.running = None;
        }

        while let Some(id) = self.lowest_floating() {
            let actor = self.world.actor(id).ok_or(WorldError::UnknownActor(id))?;
            match movement::resolve_move(&self.world, &actor.mover(), Direction::Down, &self.rules) {
                Ok(plan) => {
                    let exec = Execution::settle(&mut self.world, id, &plan, &self.timing, &mut self.events)?;
                    self.running = Some(exec);
                    return Ok(());
                }
                Err(e) => {
                    debug!(actor = %id, error = %e, "settle drop failed");
                    self.kill(id)?;
                }
            }
        }

        self.finish_settle();
        Ok(())
    }

    fn finish_settle(&mut self) {
        if self.check_goal() {
            return;
        }
        let player_alive = self.world.actor(self.player).is_some_and(|p| p.is_alive());
        if self.after_reset && !player_alive {
            info!(round = self.round, "player dead after rewind, level failed");
            self.phase = Phase::LevelFailed;
            return;
        }
        let player_exhausted = self.world.actor(self.player).map_or(true, |p| !p.can_perform_action);
        if player_exhausted {
            self.begin_round_reset();
            return;
        }
        if !self.after_reset {
            self.turn += 1;
        }
        self.phase = Phase::AwaitingDecision;
        self.events.push(SimEvent::TurnStarted { round: self.round, turn: self.turn });
    }

    // ══════════════════════════════════════════════════════════════
    // Round reset
    // ══════════════════════════════════════════════════════════════

    fn begin_round_reset(&mut self) {
        self.events.push(SimEvent::RoundEnded { round: self.round });

        let Some(player) = self.world.actor(self.player) else {
            return;
        };
        let history = player.history().to_vec();
        let spawn = player.initial_position;
        let last = player.position;

        // Where everything is before the reset, for the rewind animation
        let mut moves: Vec<(ActorId, Position, Position)> = Vec::new();
        let before: Vec<Position> = self.world.actors().iter().map(|a| a.position).collect();

        let actions = history.len();
        let ghost = self.world.spawn_ghost(spawn, history);
        self.order.push(ghost);
        moves.push((ghost, last, spawn));
        info!(ghost = %ghost, actions, round = self.round, "ghost spawned");
        self.events.push(SimEvent::GhostSpawned { ghost, actions });

        for (actor, from) in self.world.actors_mut().iter_mut().zip(before) {
            // A time cube lost to the void stays lost; a fresh one respawns
            if actor.block_kind() == Some(BlockKind::TimeCube) && !actor.is_alive() {
                continue;
            }
            actor.reset();
            moves.push((actor.id, from, actor.position));
            self.events.push(SimEvent::ActorReset { actor: actor.id, to: actor.position });
        }

        self.clear_cubes_from_stone_spawns();
        self.respawn_time_cubes();

        self.rewind = Some(Rewind::new(moves, self.timing.reset_ticks));
        self.phase = Phase::Rewinding;
    }

    /// A stone returning to its spawn tile crushes a time cube left there.
    fn clear_cubes_from_stone_spawns(&mut self) {
        let stones: Vec<Position> = self
            .world
            .actors()
            .iter()
            .filter(|a| a.block_kind() == Some(BlockKind::Stone) && a.is_alive())
            .map(|a| a.position)
            .collect();
        for cube in self.world.actors_mut() {
            if cube.block_kind() != Some(BlockKind::TimeCube) || !cube.is_alive() {
                continue;
            }
            if stones.contains(&cube.position) {
                cube.kill();
                debug!(cube = %cube.id, at = %cube.position, "time cube displaced by a stone");
                self.events.push(SimEvent::ActorDied { actor: cube.id, at: cube.position });
            }
        }
    }

    /// Put a fresh time cube on every cube spawn tile no block occupies.
    fn respawn_time_cubes(&mut self) {
        let mut spawns: Vec<Position> = self
            .world
            .actors()
            .iter()
            .filter(|a| a.block_kind() == Some(BlockKind::TimeCube))
            .map(|a| a.initial_position)
            .collect();
        spawns.sort();
        spawns.dedup();

        for at in spawns {
            if self.world.block_at(at).is_none() {
                let cube = self.world.spawn(ActorKind::Block(BlockKind::TimeCube), at);
                info!(cube = %cube, %at, "time cube respawned");
                self.events.push(SimEvent::TimeCubeRespawned { cube, at });
            }
        }
    }

    fn tick_rewinding(&mut self) -> Result<(), SchedulerError> {
        let done = match self.rewind.as_mut() {
            Some(rewind) => rewind.advance(&mut self.events),
            None => true,
        };
        if done {
            self.rewind = None;
            self.round += 1;
            self.turn = 1;
            info!(round = self.round, ghosts = self.order.len() - 1, "round started");
            self.phase = Phase::Settling;
            self.after_reset = true;
        }
        Ok(())
    }
}
