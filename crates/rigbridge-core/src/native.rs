//! Driver-native constants.
//!
//! These are the bit values and enumerations the synchronous driver speaks.
//! The bridge never shows them to callers; the translation layer maps them
//! to and from symbolic names.

/// Mode bit set (one bit per mode).
pub type ModeBits = u64;
/// VFO designator bit set.
pub type VfoBits = u32;
/// Level bit set.
pub type LevelBits = u64;
/// Function bit set.
pub type FuncBits = u64;
/// Scan type bit set.
pub type ScanBits = u32;
/// VFO operation bit set.
pub type VfoOpBits = u32;

// ---------------------------------------------------------------------------
// Models
// ---------------------------------------------------------------------------

/// Built-in dummy rig model.
pub const MODEL_DUMMY: u32 = 1;
/// Generic network-control model used for `host:port` endpoints.
pub const MODEL_NETRIGCTL: u32 = 2;

// ---------------------------------------------------------------------------
// Modes
// ---------------------------------------------------------------------------

pub const MODE_NONE: ModeBits = 0;
pub const MODE_AM: ModeBits = 1 << 0;
pub const MODE_CW: ModeBits = 1 << 1;
pub const MODE_USB: ModeBits = 1 << 2;
pub const MODE_LSB: ModeBits = 1 << 3;
pub const MODE_RTTY: ModeBits = 1 << 4;
pub const MODE_FM: ModeBits = 1 << 5;
pub const MODE_WFM: ModeBits = 1 << 6;
pub const MODE_CWR: ModeBits = 1 << 7;
pub const MODE_RTTYR: ModeBits = 1 << 8;
pub const MODE_AMS: ModeBits = 1 << 9;
pub const MODE_PKTLSB: ModeBits = 1 << 10;
pub const MODE_PKTUSB: ModeBits = 1 << 11;
pub const MODE_PKTFM: ModeBits = 1 << 12;
pub const MODE_ECSSUSB: ModeBits = 1 << 13;
pub const MODE_ECSSLSB: ModeBits = 1 << 14;
pub const MODE_FAX: ModeBits = 1 << 15;
pub const MODE_SAM: ModeBits = 1 << 16;
pub const MODE_SAL: ModeBits = 1 << 17;
pub const MODE_SAH: ModeBits = 1 << 18;
pub const MODE_DSB: ModeBits = 1 << 19;
pub const MODE_FMN: ModeBits = 1 << 21;
pub const MODE_PKTAM: ModeBits = 1 << 22;

/// Passband width meaning "the driver's normal width for this mode".
pub const PASSBAND_NORMAL: i64 = 0;
/// Passband width meaning "leave the current width unchanged".
pub const PASSBAND_NOCHANGE: i64 = -1;

// ---------------------------------------------------------------------------
// VFOs
// ---------------------------------------------------------------------------

pub const VFO_NONE: VfoBits = 0;
pub const VFO_A: VfoBits = 1 << 0;
pub const VFO_B: VfoBits = 1 << 1;
pub const VFO_C: VfoBits = 1 << 2;
pub const VFO_SUB_A: VfoBits = 1 << 21;
pub const VFO_SUB_B: VfoBits = 1 << 22;
pub const VFO_MAIN_A: VfoBits = 1 << 23;
pub const VFO_MAIN_B: VfoBits = 1 << 24;
pub const VFO_SUB: VfoBits = 1 << 25;
pub const VFO_MAIN: VfoBits = 1 << 26;
pub const VFO_VFO: VfoBits = 1 << 27;
pub const VFO_MEM: VfoBits = 1 << 28;
/// The currently selected VFO; always addressable.
pub const VFO_CURR: VfoBits = 1 << 29;

// ---------------------------------------------------------------------------
// PTT / DCD
// ---------------------------------------------------------------------------

pub const PTT_OFF: u32 = 0;
pub const PTT_ON: u32 = 1;

pub const DCD_OFF: u32 = 0;
pub const DCD_ON: u32 = 1;

pub const PTT_TYPE_NONE: u32 = 0;
pub const PTT_TYPE_RIG: u32 = 1;
pub const PTT_TYPE_SERIAL_DTR: u32 = 2;
pub const PTT_TYPE_SERIAL_RTS: u32 = 3;
pub const PTT_TYPE_PARALLEL: u32 = 4;
pub const PTT_TYPE_RIG_MICDATA: u32 = 5;
pub const PTT_TYPE_CM108: u32 = 6;
pub const PTT_TYPE_GPIO: u32 = 7;
pub const PTT_TYPE_GPION: u32 = 8;

pub const DCD_TYPE_NONE: u32 = 0;
pub const DCD_TYPE_RIG: u32 = 1;
pub const DCD_TYPE_SERIAL_DSR: u32 = 2;
pub const DCD_TYPE_SERIAL_CTS: u32 = 3;
pub const DCD_TYPE_SERIAL_CAR: u32 = 4;
pub const DCD_TYPE_PARALLEL: u32 = 5;
pub const DCD_TYPE_CM108: u32 = 6;
pub const DCD_TYPE_GPIO: u32 = 7;
pub const DCD_TYPE_GPION: u32 = 8;

// ---------------------------------------------------------------------------
// Serial port
// ---------------------------------------------------------------------------

pub const PARITY_NONE: u32 = 0;
pub const PARITY_ODD: u32 = 1;
pub const PARITY_EVEN: u32 = 2;
pub const PARITY_MARK: u32 = 3;
pub const PARITY_SPACE: u32 = 4;

pub const HANDSHAKE_NONE: u32 = 0;
pub const HANDSHAKE_XONXOFF: u32 = 1;
pub const HANDSHAKE_HARDWARE: u32 = 2;

// ---------------------------------------------------------------------------
// Levels
// ---------------------------------------------------------------------------

pub const LEVEL_PREAMP: LevelBits = 1 << 0;
pub const LEVEL_ATT: LevelBits = 1 << 1;
pub const LEVEL_VOXDELAY: LevelBits = 1 << 2;
pub const LEVEL_AF: LevelBits = 1 << 3;
pub const LEVEL_RF: LevelBits = 1 << 4;
pub const LEVEL_SQL: LevelBits = 1 << 5;
pub const LEVEL_IF: LevelBits = 1 << 6;
pub const LEVEL_APF: LevelBits = 1 << 7;
pub const LEVEL_NR: LevelBits = 1 << 8;
pub const LEVEL_PBT_IN: LevelBits = 1 << 9;
pub const LEVEL_PBT_OUT: LevelBits = 1 << 10;
pub const LEVEL_CWPITCH: LevelBits = 1 << 11;
pub const LEVEL_RFPOWER: LevelBits = 1 << 12;
pub const LEVEL_MICGAIN: LevelBits = 1 << 13;
pub const LEVEL_KEYSPD: LevelBits = 1 << 14;
pub const LEVEL_NOTCHF: LevelBits = 1 << 15;
pub const LEVEL_COMP: LevelBits = 1 << 16;
pub const LEVEL_AGC: LevelBits = 1 << 17;
pub const LEVEL_BKINDL: LevelBits = 1 << 18;
pub const LEVEL_BALANCE: LevelBits = 1 << 19;
pub const LEVEL_VOXGAIN: LevelBits = 1 << 21;
pub const LEVEL_ANTIVOX: LevelBits = 1 << 22;
pub const LEVEL_RAWSTR: LevelBits = 1 << 26;
pub const LEVEL_SWR: LevelBits = 1 << 28;
pub const LEVEL_ALC: LevelBits = 1 << 29;
pub const LEVEL_STRENGTH: LevelBits = 1 << 30;

/// Levels whose native value is a float; all others are integers.
pub const LEVEL_FLOAT_LIST: LevelBits = LEVEL_AF
    | LEVEL_RF
    | LEVEL_SQL
    | LEVEL_APF
    | LEVEL_NR
    | LEVEL_PBT_IN
    | LEVEL_PBT_OUT
    | LEVEL_RFPOWER
    | LEVEL_MICGAIN
    | LEVEL_COMP
    | LEVEL_BALANCE
    | LEVEL_VOXGAIN
    | LEVEL_ANTIVOX
    | LEVEL_SWR
    | LEVEL_ALC;

/// Meter levels that can be read but never set.
pub const LEVEL_READONLY_LIST: LevelBits =
    LEVEL_RAWSTR | LEVEL_SWR | LEVEL_ALC | LEVEL_STRENGTH;

/// A native level value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LevelValue {
    Int(i32),
    Float(f32),
}

impl LevelValue {
    /// The value widened to `f64`.
    pub fn as_f64(&self) -> f64 {
        match self {
            LevelValue::Int(i) => f64::from(*i),
            LevelValue::Float(f) => f64::from(*f),
        }
    }
}

// ---------------------------------------------------------------------------
// Functions
// ---------------------------------------------------------------------------

pub const FUNC_FAGC: FuncBits = 1 << 0;
pub const FUNC_NB: FuncBits = 1 << 1;
pub const FUNC_COMP: FuncBits = 1 << 2;
pub const FUNC_VOX: FuncBits = 1 << 3;
pub const FUNC_TONE: FuncBits = 1 << 4;
pub const FUNC_TSQL: FuncBits = 1 << 5;
pub const FUNC_SBKIN: FuncBits = 1 << 6;
pub const FUNC_FBKIN: FuncBits = 1 << 7;
pub const FUNC_ANF: FuncBits = 1 << 8;
pub const FUNC_NR: FuncBits = 1 << 9;
pub const FUNC_AIP: FuncBits = 1 << 10;
pub const FUNC_APF: FuncBits = 1 << 11;
pub const FUNC_MON: FuncBits = 1 << 12;
pub const FUNC_MN: FuncBits = 1 << 13;
pub const FUNC_RF: FuncBits = 1 << 14;
pub const FUNC_ARO: FuncBits = 1 << 15;
pub const FUNC_LOCK: FuncBits = 1 << 16;
pub const FUNC_MUTE: FuncBits = 1 << 17;
pub const FUNC_VSC: FuncBits = 1 << 18;
pub const FUNC_REV: FuncBits = 1 << 19;
pub const FUNC_SQL: FuncBits = 1 << 20;
pub const FUNC_ABM: FuncBits = 1 << 21;
pub const FUNC_BC: FuncBits = 1 << 22;
pub const FUNC_MBC: FuncBits = 1 << 23;
pub const FUNC_RIT: FuncBits = 1 << 24;
pub const FUNC_AFC: FuncBits = 1 << 25;
pub const FUNC_SATMODE: FuncBits = 1 << 26;
pub const FUNC_SCOPE: FuncBits = 1 << 27;
pub const FUNC_RESUME: FuncBits = 1 << 28;
pub const FUNC_TBURST: FuncBits = 1 << 29;
pub const FUNC_TUNER: FuncBits = 1 << 30;
pub const FUNC_XIT: FuncBits = 1 << 31;

// ---------------------------------------------------------------------------
// Scanning and VFO operations
// ---------------------------------------------------------------------------

/// Stop scanning; always accepted.
pub const SCAN_STOP: ScanBits = 0;
pub const SCAN_MEM: ScanBits = 1 << 0;
pub const SCAN_SLCT: ScanBits = 1 << 1;
pub const SCAN_PRIO: ScanBits = 1 << 2;
pub const SCAN_PROG: ScanBits = 1 << 3;
pub const SCAN_DELTA: ScanBits = 1 << 4;
pub const SCAN_VFO: ScanBits = 1 << 5;
pub const SCAN_PLT: ScanBits = 1 << 6;

pub const OP_CPY: VfoOpBits = 1 << 0;
pub const OP_XCHG: VfoOpBits = 1 << 1;
pub const OP_FROM_VFO: VfoOpBits = 1 << 2;
pub const OP_TO_VFO: VfoOpBits = 1 << 3;
pub const OP_MCL: VfoOpBits = 1 << 4;
pub const OP_UP: VfoOpBits = 1 << 5;
pub const OP_DOWN: VfoOpBits = 1 << 6;
pub const OP_BAND_UP: VfoOpBits = 1 << 7;
pub const OP_BAND_DOWN: VfoOpBits = 1 << 8;
pub const OP_LEFT: VfoOpBits = 1 << 9;
pub const OP_RIGHT: VfoOpBits = 1 << 10;
pub const OP_TUNE: VfoOpBits = 1 << 11;
pub const OP_TOGGLE: VfoOpBits = 1 << 12;

// ---------------------------------------------------------------------------
// Power and repeater
// ---------------------------------------------------------------------------

pub const POWER_OFF: u32 = 0;
pub const POWER_ON: u32 = 1;
pub const POWER_STANDBY: u32 = 2;
pub const POWER_OPERATE: u32 = 4;
pub const POWER_UNKNOWN: u32 = 8;

pub const RPT_SHIFT_NONE: u32 = 0;
pub const RPT_SHIFT_MINUS: u32 = 1;
pub const RPT_SHIFT_PLUS: u32 = 2;
