pub mod actor;
pub mod grid;
pub mod lever;
pub mod movement;
pub mod occupancy;
pub mod task;
pub mod tile;
