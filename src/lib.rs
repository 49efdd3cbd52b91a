/// Rewinder: a turn-based, time-rewinding puzzle-platformer core.
///
/// `domain` holds the pure rules (movement, tasks, actors); `sim` holds
/// the stateful simulation (world, scheduler, levels) built on them.

pub mod config;
pub mod domain;
pub mod sim;
