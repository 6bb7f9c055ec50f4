pub mod constants;
pub mod engine;
pub mod error;
pub mod ghost;
pub mod grid;
pub mod layout;
pub mod logging;
pub mod pathfinder;
pub mod player;
pub mod types;
