// Session layer: command parsing and the controller actor
pub mod commands;
pub mod controller;

pub use commands::{parse_line, Command};
pub use controller::{SessionController, SessionEvent, SessionReport};
