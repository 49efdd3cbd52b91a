pub mod event;
pub mod execution;
pub mod level;
pub mod scheduler;
pub mod script;
pub mod world;
