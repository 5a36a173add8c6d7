//! The synchronous driver interface the bridge calls through.
//!
//! A driver owns one wire-level connection to one rig. Every method may
//! block for as long as the driver's own timeout allows, so the bridge only
//! ever calls these from a worker thread, one call at a time per driver.
//!
//! Methods a backend does not implement fall back to [`Status::ENIMPL`],
//! the same way the driver itself reports a missing feature.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::native::*;
use crate::types::{
    DebugLevel, DeviceCategory, ModelId, ModelInfo, ModelStatus, SerialParam, TransportKind,
};

/// A non-success driver status code.
///
/// Codes are negative, matching the driver's convention where zero is
/// success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Status(i32);

impl Status {
    pub const EINVAL: Status = Status(-1);
    pub const ECONF: Status = Status(-2);
    pub const ENOMEM: Status = Status(-3);
    pub const ENIMPL: Status = Status(-4);
    pub const ETIMEOUT: Status = Status(-5);
    pub const EIO: Status = Status(-6);
    pub const EINTERNAL: Status = Status(-7);
    pub const EPROTO: Status = Status(-8);
    pub const ERJCTED: Status = Status(-9);
    pub const ETRUNC: Status = Status(-10);
    pub const ENAVAIL: Status = Status(-11);
    pub const ENTARGET: Status = Status(-12);
    pub const EBUSERROR: Status = Status(-13);
    pub const EBUSBUSY: Status = Status(-14);
    pub const EARG: Status = Status(-15);
    pub const EVFO: Status = Status(-16);
    pub const EDOM: Status = Status(-17);

    /// Wrap a raw status code.
    pub fn from_code(code: i32) -> Status {
        Status(code)
    }

    /// The raw status code.
    pub fn code(&self) -> i32 {
        self.0
    }

    /// The driver's standard text for this code.
    pub fn default_text(&self) -> &'static str {
        match self.0 {
            -1 => "Invalid parameter",
            -2 => "Invalid configuration",
            -3 => "Memory shortage",
            -4 => "Feature not implemented",
            -5 => "Communication timed out",
            -6 => "IO error",
            -7 => "Internal error",
            -8 => "Protocol error",
            -9 => "Command rejected by the rig",
            -10 => "Command performed, but arg truncated, result not guaranteed",
            -11 => "Feature not available",
            -12 => "Target VFO unaccessible",
            -13 => "Communication bus error",
            -14 => "Communication bus collision",
            -15 => "NULL RIG handle or invalid pointer parameter",
            -16 => "Invalid VFO",
            -17 => "Argument out of domain of func",
            _ => "Unknown error",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.default_text(), self.0)
    }
}

/// Outcome of one driver call.
pub type DriverResult<T> = std::result::Result<T, Status>;

// ---------------------------------------------------------------------------
// Capability record
// ---------------------------------------------------------------------------

/// Native range and resolution of one level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Granularity {
    pub min: f64,
    pub max: f64,
    /// Smallest adjustable increment; `0.0` means continuous.
    pub step: f64,
}

impl Granularity {
    pub const fn new(min: f64, max: f64, step: f64) -> Self {
        Granularity { min, max, step }
    }
}

/// An inclusive range of memory channel numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelRange {
    pub start: i32,
    pub end: i32,
}

impl ChannelRange {
    pub const fn new(start: i32, end: i32) -> Self {
        ChannelRange { start, end }
    }

    pub fn contains(&self, n: i32) -> bool {
        n >= self.start && n <= self.end
    }
}

/// Passband widths the model offers for a set of modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterSpec {
    pub modes: ModeBits,
    pub normal: i64,
    pub narrow: i64,
    pub wide: i64,
}

/// Everything the driver publishes about one model.
///
/// This is read once when a handle is created and never changes afterwards;
/// it is the source of truth for which symbolic values the bridge accepts.
#[derive(Debug, Clone)]
pub struct RigCaps {
    pub model_id: ModelId,
    pub model_name: &'static str,
    pub manufacturer: &'static str,
    pub version: &'static str,
    pub status: ModelStatus,
    pub category: DeviceCategory,
    pub modes: ModeBits,
    pub vfos: VfoBits,
    pub has_get_level: LevelBits,
    pub has_set_level: LevelBits,
    pub level_granularity: Vec<(LevelBits, Granularity)>,
    pub has_get_func: FuncBits,
    pub has_set_func: FuncBits,
    pub scan_ops: ScanBits,
    pub vfo_ops: VfoOpBits,
    /// Largest RIT offset magnitude in hertz; `0` means no RIT.
    pub max_rit: i32,
    /// Largest XIT offset magnitude in hertz; `0` means no XIT.
    pub max_xit: i32,
    /// Number of antenna ports, numbered from 1.
    pub antennas: u32,
    /// Supported CTCSS tones in tenths of hertz.
    pub ctcss_tones: Vec<u32>,
    pub dcs_codes: Vec<u32>,
    pub channels: Vec<ChannelRange>,
    pub filters: Vec<FilterSpec>,
}

impl RigCaps {
    /// Granularity published for `level`, if any.
    pub fn granularity(&self, level: LevelBits) -> Option<Granularity> {
        self.level_granularity
            .iter()
            .find(|(bit, _)| *bit == level)
            .map(|(_, g)| *g)
    }

    /// First filter entry covering `mode`.
    pub fn filter_for(&self, mode: ModeBits) -> Option<&FilterSpec> {
        self.filters.iter().find(|f| f.modes & mode != 0)
    }

    /// Catalog view of this record.
    pub fn model_info(&self) -> ModelInfo {
        ModelInfo {
            model_id: self.model_id,
            model_name: self.model_name,
            manufacturer: self.manufacturer,
            driver_version: self.version,
            status: self.status,
            category: self.category,
        }
    }
}

impl Default for RigCaps {
    fn default() -> Self {
        RigCaps {
            model_id: 0,
            model_name: "",
            manufacturer: "",
            version: "",
            status: ModelStatus::Untested,
            category: DeviceCategory::Other,
            modes: MODE_NONE,
            vfos: VFO_NONE,
            has_get_level: 0,
            has_set_level: 0,
            level_granularity: Vec::new(),
            has_get_func: 0,
            has_set_func: 0,
            scan_ops: 0,
            vfo_ops: 0,
            max_rit: 0,
            max_xit: 0,
            antennas: 0,
            ctcss_tones: Vec::new(),
            dcs_codes: Vec::new(),
            channels: Vec::new(),
            filters: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Call payloads
// ---------------------------------------------------------------------------

/// Native contents of one memory channel.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Channel {
    pub number: i32,
    pub vfo: VfoBits,
    pub freq: f64,
    pub mode: ModeBits,
    pub width: i64,
    pub split: bool,
    pub tx_freq: f64,
    pub tx_mode: ModeBits,
    pub rptr_shift: u32,
    pub rptr_offs: i32,
    pub ctcss_tone: u32,
    pub dcs_code: u32,
    pub funcs: FuncBits,
    pub description: String,
}

/// Serial line settings in native form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialSettings {
    pub rate: u32,
    pub data_bits: u32,
    pub stop_bits: u32,
    pub parity: u32,
    pub handshake: u32,
}

impl Default for SerialSettings {
    fn default() -> Self {
        SerialSettings {
            rate: 9600,
            data_bits: 8,
            stop_bits: 1,
            parity: PARITY_NONE,
            handshake: HANDSHAKE_NONE,
        }
    }
}

impl SerialSettings {
    pub fn get(&self, param: SerialParam) -> u32 {
        match param {
            SerialParam::Rate => self.rate,
            SerialParam::DataBits => self.data_bits,
            SerialParam::StopBits => self.stop_bits,
            SerialParam::Parity => self.parity,
            SerialParam::Handshake => self.handshake,
        }
    }

    pub fn set(&mut self, param: SerialParam, value: u32) {
        match param {
            SerialParam::Rate => self.rate = value,
            SerialParam::DataBits => self.data_bits = value,
            SerialParam::StopBits => self.stop_bits = value,
            SerialParam::Parity => self.parity = value,
            SerialParam::Handshake => self.handshake = value,
        }
    }
}

/// Port configuration handed to the driver once, before the first connect.
#[derive(Debug, Clone, PartialEq)]
pub struct PortConfig {
    pub pathname: String,
    pub kind: TransportKind,
    /// Per-call I/O timeout enforced inside the driver.
    pub timeout: Duration,
    /// Driver-internal retry count; the bridge itself never retries.
    pub retry: u32,
    pub serial: SerialSettings,
    pub ptt_type: u32,
    pub dcd_type: u32,
}

/// Frequency-change notification: `(vfo, hz)`.
pub type FreqCallback = Arc<dyn Fn(VfoBits, f64) + Send + Sync>;
/// PTT-change notification: `(vfo, ptt)`.
pub type PttCallback = Arc<dyn Fn(VfoBits, u32) + Send + Sync>;

// ---------------------------------------------------------------------------
// Driver traits
// ---------------------------------------------------------------------------

/// One blocking driver connection.
///
/// Not reentrant: the bridge guarantees at most one call at a time. Callbacks
/// registered with [`set_freq_callback`](RigDriver::set_freq_callback) and
/// [`set_ptt_callback`](RigDriver::set_ptt_callback) may be invoked from any
/// driver-owned thread.
pub trait RigDriver: Send {
    /// Capability record for the model this driver was initialised with.
    fn caps(&self) -> &RigCaps;

    /// Apply port settings. Called before the first `open`, no I/O.
    fn set_port(&mut self, _port: &PortConfig) -> DriverResult<()> {
        Ok(())
    }

    /// Connect to the rig.
    fn open(&mut self) -> DriverResult<()>;

    /// Disconnect from the rig. Rig-side state is left untouched.
    fn close(&mut self) -> DriverResult<()>;

    fn set_freq(&mut self, _vfo: VfoBits, _freq: f64) -> DriverResult<()> {
        Err(Status::ENIMPL)
    }

    fn get_freq(&mut self, _vfo: VfoBits) -> DriverResult<f64> {
        Err(Status::ENIMPL)
    }

    /// Set mode and passband; `width` may be [`PASSBAND_NORMAL`] or
    /// [`PASSBAND_NOCHANGE`].
    fn set_mode(&mut self, _vfo: VfoBits, _mode: ModeBits, _width: i64) -> DriverResult<()> {
        Err(Status::ENIMPL)
    }

    fn get_mode(&mut self, _vfo: VfoBits) -> DriverResult<(ModeBits, i64)> {
        Err(Status::ENIMPL)
    }

    fn set_vfo(&mut self, _vfo: VfoBits) -> DriverResult<()> {
        Err(Status::ENIMPL)
    }

    fn get_vfo(&mut self) -> DriverResult<VfoBits> {
        Err(Status::ENIMPL)
    }

    fn set_ptt(&mut self, _vfo: VfoBits, _ptt: u32) -> DriverResult<()> {
        Err(Status::ENIMPL)
    }

    fn get_ptt(&mut self, _vfo: VfoBits) -> DriverResult<u32> {
        Err(Status::ENIMPL)
    }

    fn get_dcd(&mut self, _vfo: VfoBits) -> DriverResult<u32> {
        Err(Status::ENIMPL)
    }

    /// Signal strength in dB relative to S9.
    fn get_strength(&mut self, vfo: VfoBits) -> DriverResult<i32> {
        match self.get_level(vfo, LEVEL_STRENGTH)? {
            LevelValue::Int(db) => Ok(db),
            LevelValue::Float(db) => Ok(db.round() as i32),
        }
    }

    fn set_channel(&mut self, _vfo: VfoBits, _channel: &Channel) -> DriverResult<()> {
        Err(Status::ENIMPL)
    }

    fn get_channel(&mut self, _vfo: VfoBits, _number: i32, _read_only: bool) -> DriverResult<Channel> {
        Err(Status::ENIMPL)
    }

    /// Make memory channel `number` the current one.
    fn set_mem(&mut self, _vfo: VfoBits, _number: i32) -> DriverResult<()> {
        Err(Status::ENIMPL)
    }

    fn set_rit(&mut self, _vfo: VfoBits, _offset: i32) -> DriverResult<()> {
        Err(Status::ENIMPL)
    }

    fn get_rit(&mut self, _vfo: VfoBits) -> DriverResult<i32> {
        Err(Status::ENIMPL)
    }

    fn set_xit(&mut self, _vfo: VfoBits, _offset: i32) -> DriverResult<()> {
        Err(Status::ENIMPL)
    }

    fn get_xit(&mut self, _vfo: VfoBits) -> DriverResult<i32> {
        Err(Status::ENIMPL)
    }

    fn scan(&mut self, _vfo: VfoBits, _scan: ScanBits, _channel: i32) -> DriverResult<()> {
        Err(Status::ENIMPL)
    }

    fn set_level(&mut self, _vfo: VfoBits, _level: LevelBits, _value: LevelValue) -> DriverResult<()> {
        Err(Status::ENIMPL)
    }

    fn get_level(&mut self, _vfo: VfoBits, _level: LevelBits) -> DriverResult<LevelValue> {
        Err(Status::ENIMPL)
    }

    fn set_func(&mut self, _vfo: VfoBits, _func: FuncBits, _on: bool) -> DriverResult<()> {
        Err(Status::ENIMPL)
    }

    fn get_func(&mut self, _vfo: VfoBits, _func: FuncBits) -> DriverResult<bool> {
        Err(Status::ENIMPL)
    }

    fn set_split_freq(&mut self, _vfo: VfoBits, _freq: f64) -> DriverResult<()> {
        Err(Status::ENIMPL)
    }

    fn get_split_freq(&mut self, _vfo: VfoBits) -> DriverResult<f64> {
        Err(Status::ENIMPL)
    }

    fn set_split_mode(&mut self, _vfo: VfoBits, _mode: ModeBits, _width: i64) -> DriverResult<()> {
        Err(Status::ENIMPL)
    }

    fn get_split_mode(&mut self, _vfo: VfoBits) -> DriverResult<(ModeBits, i64)> {
        Err(Status::ENIMPL)
    }

    fn set_split_vfo(&mut self, _vfo: VfoBits, _split: bool, _tx_vfo: VfoBits) -> DriverResult<()> {
        Err(Status::ENIMPL)
    }

    fn get_split_vfo(&mut self, _vfo: VfoBits) -> DriverResult<(bool, VfoBits)> {
        Err(Status::ENIMPL)
    }

    fn vfo_op(&mut self, _vfo: VfoBits, _op: VfoOpBits) -> DriverResult<()> {
        Err(Status::ENIMPL)
    }

    fn set_ant(&mut self, _vfo: VfoBits, _ant: u32) -> DriverResult<()> {
        Err(Status::ENIMPL)
    }

    fn get_ant(&mut self, _vfo: VfoBits) -> DriverResult<u32> {
        Err(Status::ENIMPL)
    }

    fn set_powerstat(&mut self, _status: u32) -> DriverResult<()> {
        Err(Status::ENIMPL)
    }

    fn get_powerstat(&mut self) -> DriverResult<u32> {
        Err(Status::ENIMPL)
    }

    fn set_rptr_shift(&mut self, _vfo: VfoBits, _shift: u32) -> DriverResult<()> {
        Err(Status::ENIMPL)
    }

    fn get_rptr_shift(&mut self, _vfo: VfoBits) -> DriverResult<u32> {
        Err(Status::ENIMPL)
    }

    fn set_rptr_offs(&mut self, _vfo: VfoBits, _offset: i32) -> DriverResult<()> {
        Err(Status::ENIMPL)
    }

    fn get_rptr_offs(&mut self, _vfo: VfoBits) -> DriverResult<i32> {
        Err(Status::ENIMPL)
    }

    fn set_ctcss_tone(&mut self, _vfo: VfoBits, _tone: u32) -> DriverResult<()> {
        Err(Status::ENIMPL)
    }

    fn get_ctcss_tone(&mut self, _vfo: VfoBits) -> DriverResult<u32> {
        Err(Status::ENIMPL)
    }

    fn set_dcs_code(&mut self, _vfo: VfoBits, _code: u32) -> DriverResult<()> {
        Err(Status::ENIMPL)
    }

    fn get_dcs_code(&mut self, _vfo: VfoBits) -> DriverResult<u32> {
        Err(Status::ENIMPL)
    }

    fn set_serial_config(&mut self, _param: SerialParam, _value: u32) -> DriverResult<()> {
        Err(Status::ENIMPL)
    }

    fn get_serial_config(&mut self, _param: SerialParam) -> DriverResult<u32> {
        Err(Status::ENIMPL)
    }

    fn set_ptt_type(&mut self, _ptt_type: u32) -> DriverResult<()> {
        Err(Status::ENIMPL)
    }

    fn get_ptt_type(&mut self) -> DriverResult<u32> {
        Err(Status::ENIMPL)
    }

    fn set_dcd_type(&mut self, _dcd_type: u32) -> DriverResult<()> {
        Err(Status::ENIMPL)
    }

    fn get_dcd_type(&mut self) -> DriverResult<u32> {
        Err(Status::ENIMPL)
    }

    /// Register or clear the frequency-change callback.
    fn set_freq_callback(&mut self, _callback: Option<FreqCallback>) -> DriverResult<()> {
        Err(Status::ENIMPL)
    }

    /// Register or clear the PTT-change callback.
    fn set_ptt_callback(&mut self, _callback: Option<PttCallback>) -> DriverResult<()> {
        Err(Status::ENIMPL)
    }
}

/// Process-level entry points of a driver library.
pub trait DriverBackend: Send + Sync {
    /// Every model the registry knows, without I/O.
    fn models(&self) -> Vec<ModelInfo>;

    /// Create an unconnected driver for `model`, or `None` if the registry
    /// rejects it.
    fn init(&self, model: ModelId) -> Option<Box<dyn RigDriver>>;

    /// Human-readable text for a status code.
    fn error_text(&self, status: Status) -> String {
        status.default_text().to_string()
    }

    /// Set the driver's diagnostic verbosity.
    fn set_debug_level(&self, _level: DebugLevel) {}
}
