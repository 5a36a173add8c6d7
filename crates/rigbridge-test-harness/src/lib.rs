//! Test harness for the rigbridge crates.
//!
//! Provides [`SimBackend`], a simulated blocking driver backend whose rigs
//! keep their state in memory, sleep for a configurable latency on every
//! I/O call, and record each call in a shared [`CallLog`]. Each rig has a
//! [`SimPanel`] for front-panel events and fault injection.
//!
//! The model catalog lives in [`models`].

pub mod call_log;
pub mod models;
pub mod panel;
pub mod sim_driver;

pub use call_log::{CallLog, CallRecord};
pub use panel::SimPanel;
pub use sim_driver::{Fault, SimBackend, SimRig, SimState};
