//! RigHandleBuilder -- fluent builder for [`RigHandle`] instances.
//!
//! Collects the port descriptor and the pass-through port settings, then
//! validates the model against the driver registry and initialises the
//! driver. No I/O happens here; the connection is made by
//! [`RigHandle::open`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use rigbridge::{Bridge, RigHandleBuilder};
//! use rigbridge_test_harness::SimBackend;
//! use rigbridge_test_harness::models::MODEL_IC7300;
//!
//! # async fn example() -> rigbridge::Result<()> {
//! let bridge = Bridge::with_defaults(Arc::new(SimBackend::new()))?;
//! let rig = RigHandleBuilder::new(MODEL_IC7300)
//!     .port("/dev/ttyUSB0")
//!     .serial_rate(19_200)
//!     .timeout(Duration::from_millis(500))
//!     .build(&bridge)
//!     .await?;
//! rig.open().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use rigbridge_core::error::{Error, Result};
use rigbridge_core::native::{DCD_TYPE_RIG, MODEL_NETRIGCTL, PTT_TYPE_RIG};
use rigbridge_core::types::{HandleState, ModelId, SerialParam, TransportKind};
use rigbridge_core::{PortConfig, SerialSettings};

use crate::config::Bridge;
use crate::dispatcher::{LaneContext, SharedState, spawn_lane};
use crate::handle::{HandleParts, RigHandle};
use crate::relay::Relay;
use crate::translate::{DCD_TYPES, PTT_TYPES, Translator, serial_value};

/// Default driver I/O timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1_000);

/// Fluent builder for [`RigHandle`].
#[derive(Debug, Clone)]
pub struct RigHandleBuilder {
    model: ModelId,
    port: Option<String>,
    timeout: Duration,
    retry: u32,
    rate: Option<u32>,
    data_bits: Option<u32>,
    stop_bits: Option<u32>,
    parity: Option<String>,
    handshake: Option<String>,
    ptt_type: Option<String>,
    dcd_type: Option<String>,
}

impl RigHandleBuilder {
    /// Create a builder for `model`.
    pub fn new(model: ModelId) -> Self {
        RigHandleBuilder {
            model,
            port: None,
            timeout: DEFAULT_TIMEOUT,
            retry: 0,
            rate: None,
            data_bits: None,
            stop_bits: None,
            parity: None,
            handshake: None,
            ptt_type: None,
            dcd_type: None,
        }
    }

    /// Serial path (e.g. `/dev/ttyUSB0`, `COM3`) or `host:port` endpoint.
    pub fn port(mut self, descriptor: &str) -> Self {
        self.port = Some(descriptor.to_string());
        self
    }

    /// Driver I/O timeout, passed through unchanged.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Driver retry count, passed through unchanged (default: 0).
    pub fn retry(mut self, retry: u32) -> Self {
        self.retry = retry;
        self
    }

    pub fn serial_rate(mut self, rate: u32) -> Self {
        self.rate = Some(rate);
        self
    }

    pub fn data_bits(mut self, bits: u32) -> Self {
        self.data_bits = Some(bits);
        self
    }

    pub fn stop_bits(mut self, bits: u32) -> Self {
        self.stop_bits = Some(bits);
        self
    }

    /// Serial parity: `None`, `Odd`, `Even`, `Mark` or `Space`.
    pub fn parity(mut self, parity: &str) -> Self {
        self.parity = Some(parity.to_string());
        self
    }

    /// Serial handshake: `None`, `XONXOFF` or `Hardware`.
    pub fn handshake(mut self, handshake: &str) -> Self {
        self.handshake = Some(handshake.to_string());
        self
    }

    /// PTT source, e.g. `RIG`, `DTR`, `RTS`.
    pub fn ptt_type(mut self, ptt_type: &str) -> Self {
        self.ptt_type = Some(ptt_type.to_string());
        self
    }

    /// DCD source, e.g. `RIG`, `DSR`, `CD`.
    pub fn dcd_type(mut self, dcd_type: &str) -> Self {
        self.dcd_type = Some(dcd_type.to_string());
        self
    }

    fn port_config(&self, descriptor: &str, kind: TransportKind) -> Result<PortConfig> {
        if self.timeout.is_zero() {
            return Err(Error::Config("timeout must be greater than zero".into()));
        }

        let mut serial = SerialSettings::default();
        let numeric = [
            (SerialParam::Rate, self.rate),
            (SerialParam::DataBits, self.data_bits),
            (SerialParam::StopBits, self.stop_bits),
        ];
        for (param, value) in numeric {
            if let Some(v) = value {
                serial.set(param, serial_value(param, &v.to_string()).map_err(as_config)?);
            }
        }
        let symbolic = [
            (SerialParam::Parity, &self.parity),
            (SerialParam::Handshake, &self.handshake),
        ];
        for (param, value) in symbolic {
            if let Some(v) = value {
                serial.set(param, serial_value(param, v).map_err(as_config)?);
            }
        }

        let ptt_type = match &self.ptt_type {
            Some(name) => PTT_TYPES.lookup(name).map_err(as_config)?,
            None => PTT_TYPE_RIG,
        };
        let dcd_type = match &self.dcd_type {
            Some(name) => DCD_TYPES.lookup(name).map_err(as_config)?,
            None => DCD_TYPE_RIG,
        };

        Ok(PortConfig {
            pathname: descriptor.to_string(),
            kind,
            timeout: self.timeout,
            retry: self.retry,
            serial,
            ptt_type,
            dcd_type,
        })
    }

    /// Validate the configuration, initialise the driver and start the
    /// handle's lane and relay on the current Tokio runtime.
    ///
    /// Fails with [`Error::InvalidModel`] when the driver registry does not
    /// know the model and with [`Error::Config`] for bad port settings.
    pub async fn build(self, bridge: &Bridge) -> Result<RigHandle> {
        let descriptor = match self.port.as_deref().map(str::trim) {
            Some(d) if !d.is_empty() => d.to_string(),
            _ => return Err(Error::Config("port descriptor is required".into())),
        };

        let backend = bridge.backend();
        if !backend.models().iter().any(|m| m.model_id == self.model) {
            return Err(Error::InvalidModel(self.model));
        }

        let transport = TransportKind::classify(&descriptor);
        let effective_model = match transport {
            TransportKind::Network => MODEL_NETRIGCTL,
            TransportKind::Serial => self.model,
        };
        let port = self.port_config(&descriptor, transport)?;

        let mut driver = backend
            .init(effective_model)
            .ok_or(Error::InvalidModel(self.model))?;
        driver.set_port(&port).map_err(|status| {
            Error::Config(format!("port rejected: {}", backend.error_text(status)))
        })?;

        let caps = Arc::new(driver.caps().clone());
        debug!(
            port = %descriptor,
            %transport,
            requested = self.model,
            effective = effective_model,
            model = caps.model_name,
            "rig handle created"
        );

        let relay = Relay::spawn(bridge.config().event_capacity);
        let state = SharedState::new(HandleState::Uninitialized);
        let lane = spawn_lane(
            driver,
            LaneContext {
                backend: Arc::clone(backend),
                pool: bridge.pool().clone(),
                relay: Arc::clone(relay.shared()),
                state: state.clone(),
                label: descriptor.clone(),
            },
        );

        Ok(RigHandle::new(HandleParts {
            transport,
            port: descriptor,
            requested_model: self.model,
            effective_model,
            translator: Translator::new(caps),
            state,
            relay,
            lane,
        }))
    }
}

fn as_config(e: Error) -> Error {
    match e {
        Error::InvalidArgument(msg) => Error::Config(msg),
        other => other,
    }
}
