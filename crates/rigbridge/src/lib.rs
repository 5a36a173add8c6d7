//! # rigbridge -- async bridge over a blocking rig-control driver
//!
//! `rigbridge` lets an async application drive radios through a synchronous,
//! blocking driver library without ever blocking its own runtime. Each rig
//! is a [`RigHandle`]; every operation on it returns a [`Completion`] that
//! settles once the driver call has run on a bounded pool of blocking
//! workers.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use rigbridge::{Bridge, BridgeConfig, RigHandleBuilder};
//! use rigbridge_test_harness::SimBackend;
//! use rigbridge_test_harness::models::MODEL_IC7300;
//!
//! #[tokio::main]
//! async fn main() -> rigbridge::Result<()> {
//!     let bridge = Bridge::new(Arc::new(SimBackend::new()), BridgeConfig::default())?;
//!     let rig = RigHandleBuilder::new(MODEL_IC7300)
//!         .port("/dev/ttyUSB0")
//!         .build(&bridge)
//!         .await?;
//!
//!     rig.open().await?;
//!     rig.set_frequency(14_074_000, None).await?;
//!     rig.set_mode("PKTUSB", None).await?;
//!     println!("S-meter: {} dB over S9", rig.get_strength().await?);
//!     rig.destroy().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! | Module         | Purpose                                                   |
//! |----------------|-----------------------------------------------------------|
//! | [`handle`]     | [`RigHandle`]: lifecycle and the full operation surface   |
//! | [`builder`]    | [`RigHandleBuilder`]: model check, port settings, driver init |
//! | [`config`]     | [`Bridge`] and [`BridgeConfig`]: backend, worker pool      |
//! | [`translate`]  | Symbolic name <-> driver constant tables, level scaling   |
//! | [`completion`] | [`Completion`]: the future every operation returns        |
//! | `dispatcher`   | Per-handle FIFO lanes over the shared worker pool         |
//! | `relay`        | Driver callbacks -> [`RigEvent`] broadcast and observers   |
//!
//! ## Ordering and errors
//!
//! Operations on one handle reach the driver one at a time, in call order.
//! Operations on different handles run concurrently, bounded by
//! [`BridgeConfig::workers`]. Invalid arguments, a handle that is not open,
//! and a destroyed handle are reported without queuing anything; every other
//! failure is the driver's, carried in [`Error::Driver`] or
//! [`Error::Connection`] with its status code and text.

pub mod builder;
pub mod catalog;
pub mod completion;
pub mod config;
pub(crate) mod dispatcher;
pub mod handle;
pub(crate) mod operation;
pub(crate) mod relay;
pub mod translate;

pub use builder::RigHandleBuilder;
pub use completion::Completion;
pub use config::{Bridge, BridgeConfig};
pub use handle::RigHandle;
pub use relay::EventObserver;
pub use translate::Translator;

// Re-export the shared vocabulary so applications need only this crate.
pub use rigbridge_core::*;
