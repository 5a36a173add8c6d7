//! Host-facing types shared by the bridge and the driver interface.
//!
//! These are the symbolic, manufacturer-agnostic shapes that callers see.
//! Driver-native constants live in [`crate::native`].

use std::fmt;
use std::str::FromStr;

/// Numeric model identifier as understood by the driver's model registry.
pub type ModelId = u32;

/// How the rig connects to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    /// Serial port (USB virtual COM or RS-232).
    Serial,
    /// Network endpoint (`host:port`).
    Network,
}

impl TransportKind {
    /// Classify a transport descriptor.
    ///
    /// A descriptor is a network endpoint when it has the shape `host:port`:
    /// a non-empty host and a numeric port after the last `:`. Bracketed
    /// IPv6 hosts (`[::1]:4532`) are accepted. Everything else, including
    /// `/dev/ttyUSB0` and `COM3`, is a serial path.
    ///
    /// # Example
    ///
    /// ```
    /// use rigbridge_core::TransportKind;
    ///
    /// assert_eq!(TransportKind::classify("localhost:4532"), TransportKind::Network);
    /// assert_eq!(TransportKind::classify("/dev/ttyUSB0"), TransportKind::Serial);
    /// ```
    pub fn classify(descriptor: &str) -> TransportKind {
        let Some((host, port)) = descriptor.rsplit_once(':') else {
            return TransportKind::Serial;
        };
        let host_ok = !host.is_empty()
            && (!host.contains(':') || (host.starts_with('[') && host.ends_with(']')));
        if host_ok && port.parse::<u16>().is_ok() {
            TransportKind::Network
        } else {
            TransportKind::Serial
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Serial => write!(f, "Serial"),
            TransportKind::Network => write!(f, "Network"),
        }
    }
}

/// Lifecycle state of a rig handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum HandleState {
    /// Created, never opened.
    Uninitialized = 0,
    /// Connected; operations are accepted.
    Open = 1,
    /// Disconnected; may be reopened.
    Closed = 2,
    /// Torn down; terminal.
    Destroyed = 3,
}

impl HandleState {
    /// Decode the `u8` representation used for atomic storage.
    pub fn from_u8(raw: u8) -> HandleState {
        match raw {
            0 => HandleState::Uninitialized,
            1 => HandleState::Open,
            2 => HandleState::Closed,
            _ => HandleState::Destroyed,
        }
    }
}

impl fmt::Display for HandleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HandleState::Uninitialized => "uninitialized",
            HandleState::Open => "open",
            HandleState::Closed => "closed",
            HandleState::Destroyed => "destroyed",
        };
        write!(f, "{s}")
    }
}

/// Maturity of a driver backend for one model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelStatus {
    Alpha,
    Untested,
    Beta,
    Stable,
    Buggy,
}

impl fmt::Display for ModelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ModelStatus::Alpha => "Alpha",
            ModelStatus::Untested => "Untested",
            ModelStatus::Beta => "Beta",
            ModelStatus::Stable => "Stable",
            ModelStatus::Buggy => "Buggy",
        };
        write!(f, "{s}")
    }
}

/// Kind of device a model describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceCategory {
    Transceiver,
    Handheld,
    Mobile,
    Receiver,
    Scanner,
    Computer,
    TunerOnly,
    Other,
}

impl fmt::Display for DeviceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeviceCategory::Transceiver => "Transceiver",
            DeviceCategory::Handheld => "Handheld",
            DeviceCategory::Mobile => "Mobile",
            DeviceCategory::Receiver => "Receiver",
            DeviceCategory::Scanner => "Scanner",
            DeviceCategory::Computer => "Computer",
            DeviceCategory::TunerOnly => "Tuner",
            DeviceCategory::Other => "Other",
        };
        write!(f, "{s}")
    }
}

/// One entry of the static model catalog.
///
/// Obtained without a handle and without I/O, suitable for populating a
/// model picker.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInfo {
    pub model_id: ModelId,
    pub model_name: &'static str,
    pub manufacturer: &'static str,
    pub driver_version: &'static str,
    pub status: ModelStatus,
    pub category: DeviceCategory,
}

/// Driver diagnostic verbosity, applied once per process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DebugLevel {
    #[default]
    None,
    Bug,
    Err,
    Warn,
    Verbose,
    Trace,
}

/// Error returned when a string cannot be parsed into a [`DebugLevel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDebugLevelError(String);

impl fmt::Display for ParseDebugLevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown debug level: '{}'. Expected: none, bug, err, warn, verbose, trace",
            self.0
        )
    }
}

impl std::error::Error for ParseDebugLevelError {}

impl FromStr for DebugLevel {
    type Err = ParseDebugLevelError;

    fn from_str(s: &str) -> std::result::Result<Self, ParseDebugLevelError> {
        match s.to_lowercase().as_str() {
            "none" => Ok(DebugLevel::None),
            "bug" => Ok(DebugLevel::Bug),
            "err" | "error" => Ok(DebugLevel::Err),
            "warn" | "warning" => Ok(DebugLevel::Warn),
            "verbose" => Ok(DebugLevel::Verbose),
            "trace" => Ok(DebugLevel::Trace),
            _ => Err(ParseDebugLevelError(s.to_string())),
        }
    }
}

/// Snapshot of a handle's identity and state, readable in any state.
#[derive(Debug, Clone, PartialEq)]
pub struct HandleInfo {
    pub transport: TransportKind,
    /// Serial path or `host:port` endpoint as given at creation.
    pub port: String,
    /// Model the caller asked for.
    pub requested_model: ModelId,
    /// Model the driver was initialised with (the network model for
    /// network endpoints).
    pub effective_model: ModelId,
    pub model_name: &'static str,
    pub state: HandleState,
}

/// Result of a mode query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeReading {
    /// Symbolic mode name, e.g. `"FM"`.
    pub mode: String,
    /// Passband width in hertz as reported by the driver.
    pub width: i64,
}

/// Result of a split status query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitStatus {
    pub enabled: bool,
    /// Symbolic name of the transmit VFO.
    pub tx_vfo: String,
}

/// Serial port parameters adjustable through the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SerialParam {
    Rate,
    DataBits,
    StopBits,
    Parity,
    Handshake,
}

impl SerialParam {
    /// Every parameter, in display order.
    pub const ALL: [SerialParam; 5] = [
        SerialParam::Rate,
        SerialParam::DataBits,
        SerialParam::StopBits,
        SerialParam::Parity,
        SerialParam::Handshake,
    ];

    /// Symbolic name used on the host surface.
    pub fn name(&self) -> &'static str {
        match self {
            SerialParam::Rate => "rate",
            SerialParam::DataBits => "data_bits",
            SerialParam::StopBits => "stop_bits",
            SerialParam::Parity => "serial_parity",
            SerialParam::Handshake => "serial_handshake",
        }
    }

    /// Look a parameter up by its exact symbolic name.
    pub fn from_name(name: &str) -> Option<SerialParam> {
        SerialParam::ALL.into_iter().find(|p| p.name() == name)
    }
}

/// Symbolic contents of one memory channel.
///
/// Optional fields are left unset by the driver when the model has no
/// storage for them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChannelData {
    pub frequency: u64,
    pub mode: Option<String>,
    pub width: Option<i64>,
    pub vfo: Option<String>,
    pub split: bool,
    pub tx_frequency: Option<u64>,
    pub tx_mode: Option<String>,
    pub repeater_shift: Option<String>,
    pub repeater_offset: Option<i32>,
    /// CTCSS tone in tenths of hertz.
    pub ctcss_tone: Option<u32>,
    pub dcs_code: Option<u32>,
    pub functions: Vec<String>,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_serial_paths() {
        assert_eq!(TransportKind::classify("/dev/ttyUSB0"), TransportKind::Serial);
        assert_eq!(TransportKind::classify("COM3"), TransportKind::Serial);
        assert_eq!(TransportKind::classify(""), TransportKind::Serial);
    }

    #[test]
    fn classify_network_endpoints() {
        assert_eq!(TransportKind::classify("localhost:4532"), TransportKind::Network);
        assert_eq!(TransportKind::classify("192.168.1.20:4532"), TransportKind::Network);
        assert_eq!(TransportKind::classify("[::1]:4532"), TransportKind::Network);
    }

    #[test]
    fn classify_malformed_endpoints_as_serial() {
        assert_eq!(TransportKind::classify(":4532"), TransportKind::Serial);
        assert_eq!(TransportKind::classify("host:port"), TransportKind::Serial);
        assert_eq!(TransportKind::classify("host:99999"), TransportKind::Serial);
        assert_eq!(TransportKind::classify("::1:4532"), TransportKind::Serial);
    }

    #[test]
    fn handle_state_u8_round_trip() {
        for state in [
            HandleState::Uninitialized,
            HandleState::Open,
            HandleState::Closed,
            HandleState::Destroyed,
        ] {
            assert_eq!(HandleState::from_u8(state as u8), state);
        }
    }

    #[test]
    fn debug_level_from_str() {
        assert_eq!("none".parse::<DebugLevel>().unwrap(), DebugLevel::None);
        assert_eq!("WARN".parse::<DebugLevel>().unwrap(), DebugLevel::Warn);
        assert_eq!("error".parse::<DebugLevel>().unwrap(), DebugLevel::Err);
        assert_eq!("err".parse::<DebugLevel>().unwrap(), DebugLevel::Err);
        assert_eq!(
            "loud".parse::<DebugLevel>(),
            Err(ParseDebugLevelError("loud".to_string()))
        );
    }

    #[test]
    fn serial_param_names() {
        for param in SerialParam::ALL {
            assert_eq!(SerialParam::from_name(param.name()), Some(param));
        }
        assert_eq!(SerialParam::from_name("baud"), None);
    }
}
