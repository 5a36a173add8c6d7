//! rigbridge-core: error, event, and driver-interface definitions for
//! rigbridge.
//!
//! This crate defines the vocabulary shared by the async bridge and any
//! synchronous driver backend. Backends implement [`RigDriver`] and
//! [`DriverBackend`]; applications see only the symbolic types.
//!
//! # Key types
//!
//! - [`RigDriver`] -- one blocking driver connection
//! - [`DriverBackend`] -- model registry and error text
//! - [`RigEvent`] -- driver-originated notifications
//! - [`Error`] / [`Result`] -- error handling

pub mod driver;
pub mod error;
pub mod events;
pub mod native;
pub mod types;

pub use driver::{
    Channel, ChannelRange, DriverBackend, DriverResult, FilterSpec, FreqCallback, Granularity,
    PortConfig, PttCallback, RigCaps, RigDriver, SerialSettings, Status,
};
pub use error::{Error, Result};
pub use events::RigEvent;
pub use types::*;
