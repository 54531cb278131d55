//! In-process event stream for one game run.
//!
//! The controller publishes what it is doing (phases, agent messages, tool
//! calls, the game result) on a broadcast bus. The binary attaches a
//! [`ConsoleReporter`] that prints the interesting ones; tests subscribe
//! directly and assert on the sequence.

mod console;
mod event_bus;
pub mod event_types;

pub use console::ConsoleReporter;
pub use event_bus::{EventBus, RunEvent};
