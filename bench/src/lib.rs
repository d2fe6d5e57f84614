mod board;
mod script;
mod simulation;

pub use anyhow::Result as AnyResult;
pub use board::{OutputWrite, SimBoard};
pub use script::{ButtonScript, ParseDurationError, parse_duration};
pub use simulation::{Event, Report, Simulation};
