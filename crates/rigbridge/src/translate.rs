//! Parameter translation between symbolic values and driver constants.
//!
//! Every configurable axis has a fixed bidirectional [`MappingTable`]. A
//! [`Translator`] combines those tables with the capability record of one
//! model, so a name is accepted only when it is both known to the table and
//! published by that model. Everything here runs on the caller's thread and
//! performs no I/O; a rejected value never reaches a worker.

use std::sync::Arc;

use rigbridge_core::error::{Error, Result};
use rigbridge_core::native::*;
use rigbridge_core::types::{ChannelData, SerialParam};
use rigbridge_core::{Channel, Granularity, RigCaps};

// ---------------------------------------------------------------------------
// Mapping tables
// ---------------------------------------------------------------------------

/// Immutable bidirectional table: symbolic name <-> driver constant.
///
/// Lookups by name are exact and case-sensitive. When several names map to
/// the same constant, the first one is canonical for reverse lookups.
#[derive(Debug)]
pub struct MappingTable<T: 'static> {
    axis: &'static str,
    entries: &'static [(&'static str, T)],
}

impl<T: Copy + PartialEq> MappingTable<T> {
    pub const fn new(axis: &'static str, entries: &'static [(&'static str, T)]) -> Self {
        MappingTable { axis, entries }
    }

    /// Name of the axis, used in error messages.
    pub fn axis(&self) -> &'static str {
        self.axis
    }

    /// Driver constant for `name`, if the table has it.
    pub fn native(&self, name: &str) -> Option<T> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
    }

    /// Canonical name for `value`, if the table has it.
    pub fn name(&self, value: T) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(_, v)| *v == value)
            .map(|(n, _)| *n)
    }

    /// Driver constant for `name`, or `InvalidArgument`.
    pub fn lookup(&self, name: &str) -> Result<T> {
        self.native(name)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown {} '{name}'", self.axis)))
    }

    /// All names in table order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(n, _)| *n)
    }

    /// All entries in table order.
    pub fn entries(&self) -> &'static [(&'static str, T)] {
        self.entries
    }
}

/// Placeholder name for a driver constant no table knows.
pub const UNKNOWN: &str = "UNKNOWN";

pub static MODES: MappingTable<ModeBits> = MappingTable::new(
    "mode",
    &[
        ("AM", MODE_AM),
        ("CW", MODE_CW),
        ("USB", MODE_USB),
        ("LSB", MODE_LSB),
        ("RTTY", MODE_RTTY),
        ("FM", MODE_FM),
        ("WFM", MODE_WFM),
        ("CWR", MODE_CWR),
        ("RTTYR", MODE_RTTYR),
        ("AMS", MODE_AMS),
        ("PKTLSB", MODE_PKTLSB),
        ("PKTUSB", MODE_PKTUSB),
        ("PKTFM", MODE_PKTFM),
        ("ECSSUSB", MODE_ECSSUSB),
        ("ECSSLSB", MODE_ECSSLSB),
        ("FAX", MODE_FAX),
        ("SAM", MODE_SAM),
        ("SAL", MODE_SAL),
        ("SAH", MODE_SAH),
        ("DSB", MODE_DSB),
        ("FMN", MODE_FMN),
        ("PKTAM", MODE_PKTAM),
    ],
);

pub static VFOS: MappingTable<VfoBits> = MappingTable::new(
    "VFO",
    &[
        ("VFOA", VFO_A),
        ("VFOB", VFO_B),
        ("VFOC", VFO_C),
        ("SubA", VFO_SUB_A),
        ("SubB", VFO_SUB_B),
        ("MainA", VFO_MAIN_A),
        ("MainB", VFO_MAIN_B),
        ("Sub", VFO_SUB),
        ("Main", VFO_MAIN),
        ("VFO", VFO_VFO),
        ("MEM", VFO_MEM),
        ("currVFO", VFO_CURR),
        // Input aliases.
        ("VFO-A", VFO_A),
        ("VFO-B", VFO_B),
    ],
);

pub static LEVELS: MappingTable<LevelBits> = MappingTable::new(
    "level",
    &[
        ("PREAMP", LEVEL_PREAMP),
        ("ATT", LEVEL_ATT),
        ("VOXDELAY", LEVEL_VOXDELAY),
        ("AF", LEVEL_AF),
        ("RF", LEVEL_RF),
        ("SQL", LEVEL_SQL),
        ("IF", LEVEL_IF),
        ("APF", LEVEL_APF),
        ("NR", LEVEL_NR),
        ("PBT_IN", LEVEL_PBT_IN),
        ("PBT_OUT", LEVEL_PBT_OUT),
        ("CWPITCH", LEVEL_CWPITCH),
        ("RFPOWER", LEVEL_RFPOWER),
        ("MICGAIN", LEVEL_MICGAIN),
        ("KEYSPD", LEVEL_KEYSPD),
        ("NOTCHF", LEVEL_NOTCHF),
        ("COMP", LEVEL_COMP),
        ("AGC", LEVEL_AGC),
        ("BKINDL", LEVEL_BKINDL),
        ("BALANCE", LEVEL_BALANCE),
        ("VOXGAIN", LEVEL_VOXGAIN),
        ("ANTIVOX", LEVEL_ANTIVOX),
        ("RAWSTR", LEVEL_RAWSTR),
        ("SWR", LEVEL_SWR),
        ("ALC", LEVEL_ALC),
        ("STRENGTH", LEVEL_STRENGTH),
    ],
);

pub static FUNCTIONS: MappingTable<FuncBits> = MappingTable::new(
    "function",
    &[
        ("FAGC", FUNC_FAGC),
        ("NB", FUNC_NB),
        ("COMP", FUNC_COMP),
        ("VOX", FUNC_VOX),
        ("TONE", FUNC_TONE),
        ("TSQL", FUNC_TSQL),
        ("SBKIN", FUNC_SBKIN),
        ("FBKIN", FUNC_FBKIN),
        ("ANF", FUNC_ANF),
        ("NR", FUNC_NR),
        ("AIP", FUNC_AIP),
        ("APF", FUNC_APF),
        ("MON", FUNC_MON),
        ("MN", FUNC_MN),
        ("RF", FUNC_RF),
        ("ARO", FUNC_ARO),
        ("LOCK", FUNC_LOCK),
        ("MUTE", FUNC_MUTE),
        ("VSC", FUNC_VSC),
        ("REV", FUNC_REV),
        ("SQL", FUNC_SQL),
        ("ABM", FUNC_ABM),
        ("BC", FUNC_BC),
        ("MBC", FUNC_MBC),
        ("RIT", FUNC_RIT),
        ("AFC", FUNC_AFC),
        ("SATMODE", FUNC_SATMODE),
        ("SCOPE", FUNC_SCOPE),
        ("RESUME", FUNC_RESUME),
        ("TBURST", FUNC_TBURST),
        ("TUNER", FUNC_TUNER),
        ("XIT", FUNC_XIT),
    ],
);

pub static PTT_TYPES: MappingTable<u32> = MappingTable::new(
    "PTT type",
    &[
        ("NONE", PTT_TYPE_NONE),
        ("RIG", PTT_TYPE_RIG),
        ("DTR", PTT_TYPE_SERIAL_DTR),
        ("RTS", PTT_TYPE_SERIAL_RTS),
        ("PARALLEL", PTT_TYPE_PARALLEL),
        ("MICDATA", PTT_TYPE_RIG_MICDATA),
        ("CM108", PTT_TYPE_CM108),
        ("GPIO", PTT_TYPE_GPIO),
        ("GPION", PTT_TYPE_GPION),
    ],
);

pub static DCD_TYPES: MappingTable<u32> = MappingTable::new(
    "DCD type",
    &[
        ("NONE", DCD_TYPE_NONE),
        ("RIG", DCD_TYPE_RIG),
        ("DSR", DCD_TYPE_SERIAL_DSR),
        ("CTS", DCD_TYPE_SERIAL_CTS),
        ("CD", DCD_TYPE_SERIAL_CAR),
        ("PARALLEL", DCD_TYPE_PARALLEL),
        ("CM108", DCD_TYPE_CM108),
        ("GPIO", DCD_TYPE_GPIO),
        ("GPION", DCD_TYPE_GPION),
    ],
);

pub static PARITIES: MappingTable<u32> = MappingTable::new(
    "serial parity",
    &[
        ("None", PARITY_NONE),
        ("Odd", PARITY_ODD),
        ("Even", PARITY_EVEN),
        ("Mark", PARITY_MARK),
        ("Space", PARITY_SPACE),
    ],
);

pub static HANDSHAKES: MappingTable<u32> = MappingTable::new(
    "serial handshake",
    &[
        ("None", HANDSHAKE_NONE),
        ("XONXOFF", HANDSHAKE_XONXOFF),
        ("Hardware", HANDSHAKE_HARDWARE),
    ],
);

pub static SCAN_TYPES: MappingTable<ScanBits> = MappingTable::new(
    "scan type",
    &[
        ("STOP", SCAN_STOP),
        ("MEM", SCAN_MEM),
        ("SLCT", SCAN_SLCT),
        ("PRIO", SCAN_PRIO),
        ("PROG", SCAN_PROG),
        ("DELTA", SCAN_DELTA),
        ("VFO", SCAN_VFO),
        ("PLT", SCAN_PLT),
    ],
);

pub static VFO_OPS: MappingTable<VfoOpBits> = MappingTable::new(
    "VFO operation",
    &[
        ("CPY", OP_CPY),
        ("XCHG", OP_XCHG),
        ("FROM_VFO", OP_FROM_VFO),
        ("TO_VFO", OP_TO_VFO),
        ("MCL", OP_MCL),
        ("UP", OP_UP),
        ("DOWN", OP_DOWN),
        ("BAND_UP", OP_BAND_UP),
        ("BAND_DOWN", OP_BAND_DOWN),
        ("LEFT", OP_LEFT),
        ("RIGHT", OP_RIGHT),
        ("TUNE", OP_TUNE),
        ("TOGGLE", OP_TOGGLE),
    ],
);

pub static POWER_STATES: MappingTable<u32> = MappingTable::new(
    "power state",
    &[
        ("OFF", POWER_OFF),
        ("ON", POWER_ON),
        ("STANDBY", POWER_STANDBY),
        ("OPERATE", POWER_OPERATE),
        ("UNKNOWN", POWER_UNKNOWN),
    ],
);

pub static REPEATER_SHIFTS: MappingTable<u32> = MappingTable::new(
    "repeater shift",
    &[
        ("NONE", RPT_SHIFT_NONE),
        ("MINUS", RPT_SHIFT_MINUS),
        ("PLUS", RPT_SHIFT_PLUS),
    ],
);

/// Passband hint for `set_mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassbandHint {
    Narrow,
    Normal,
    Wide,
}

pub static PASSBAND_HINTS: MappingTable<PassbandHint> = MappingTable::new(
    "bandwidth",
    &[
        ("narrow", PassbandHint::Narrow),
        ("normal", PassbandHint::Normal),
        ("wide", PassbandHint::Wide),
    ],
);

/// Serial rates the port layer accepts.
const SERIAL_RATES: [u32; 12] = [
    300, 600, 1_200, 2_400, 4_800, 9_600, 19_200, 38_400, 57_600, 115_200, 230_400, 460_800,
];

// ---------------------------------------------------------------------------
// Reverse lookups used outside a translator (relay events)
// ---------------------------------------------------------------------------

/// Symbolic name for a native mode, or [`UNKNOWN`].
pub fn mode_name(mode: ModeBits) -> &'static str {
    MODES.name(mode).unwrap_or(UNKNOWN)
}

/// Symbolic name for a native VFO, or [`UNKNOWN`].
pub fn vfo_name(vfo: VfoBits) -> &'static str {
    VFOS.name(vfo).unwrap_or(UNKNOWN)
}

/// Names of every table entry whose bit is set in `published`.
fn published_names<T>(table: &MappingTable<T>, published: T) -> Vec<&'static str>
where
    T: Copy + PartialEq + std::ops::BitAnd<Output = T> + Default,
{
    let mut names = Vec::new();
    let mut seen: Vec<T> = Vec::new();
    for (name, bit) in table.entries() {
        if (published & *bit) != T::default() && !seen.contains(bit) {
            seen.push(*bit);
            names.push(*name);
        }
    }
    names
}

// ---------------------------------------------------------------------------
// Level scaling
// ---------------------------------------------------------------------------

fn is_float_level(level: LevelBits) -> bool {
    level & LEVEL_FLOAT_LIST != 0
}

/// Smallest distinguishable native increment for a level.
fn resolution(gran: &Granularity, float: bool) -> f64 {
    if gran.step > 0.0 {
        gran.step
    } else if float {
        0.0
    } else {
        1.0
    }
}

/// Scale a normalized value in `[0.0, 1.0]` to the native range, snapping
/// to the step.
pub fn denormalize(gran: &Granularity, float: bool, value: f64) -> LevelValue {
    let (lo, hi) = (gran.min.min(gran.max), gran.min.max(gran.max));
    let mut raw = gran.min + value * (gran.max - gran.min);
    let step = resolution(gran, float);
    if step > 0.0 {
        raw = gran.min + ((raw - gran.min) / step).round() * step;
    }
    let raw = raw.clamp(lo, hi);
    if float {
        LevelValue::Float(raw as f32)
    } else {
        LevelValue::Int(raw.round() as i32)
    }
}

/// Scale a native value back into `[0.0, 1.0]`.
pub fn normalize(gran: &Granularity, value: LevelValue) -> f64 {
    let span = gran.max - gran.min;
    if span == 0.0 {
        return 0.0;
    }
    ((value.as_f64() - gran.min) / span).clamp(0.0, 1.0)
}

// ---------------------------------------------------------------------------
// Translator
// ---------------------------------------------------------------------------

/// Validates and converts host values for one model.
///
/// Cheap to clone; the capability record is shared.
#[derive(Debug, Clone)]
pub struct Translator {
    caps: Arc<RigCaps>,
}

impl Translator {
    pub fn new(caps: Arc<RigCaps>) -> Self {
        Translator { caps }
    }

    /// The capability record this translator validates against.
    pub fn caps(&self) -> &RigCaps {
        &self.caps
    }

    fn not_published(axis: &str, name: &str, model: &str) -> Error {
        Error::InvalidArgument(format!("{axis} '{name}' is not supported by {model}"))
    }

    // -- tuning ---------------------------------------------------------------

    /// Validate a frequency in hertz.
    pub fn frequency(&self, hz: u64) -> Result<f64> {
        if hz == 0 {
            return Err(Error::InvalidArgument(
                "frequency must be greater than 0 Hz".into(),
            ));
        }
        Ok(hz as f64)
    }

    /// Convert a native frequency reported by the driver.
    pub fn frequency_from_native(freq: f64) -> u64 {
        if freq.is_finite() && freq > 0.0 {
            freq.round() as u64
        } else {
            0
        }
    }

    pub fn mode(&self, name: &str) -> Result<ModeBits> {
        let mode = MODES.lookup(name)?;
        if self.caps.modes & mode == 0 {
            return Err(Self::not_published("mode", name, self.caps.model_name));
        }
        Ok(mode)
    }

    /// Resolve a passband hint for `mode`. No hint means the driver's
    /// normal passband.
    pub fn passband(&self, mode: ModeBits, hint: Option<&str>) -> Result<i64> {
        let Some(hint) = hint else {
            return Ok(PASSBAND_NORMAL);
        };
        let hint = PASSBAND_HINTS.lookup(hint)?;
        let Some(filter) = self.caps.filter_for(mode) else {
            return Ok(PASSBAND_NORMAL);
        };
        Ok(match hint {
            PassbandHint::Narrow => filter.narrow,
            PassbandHint::Normal => PASSBAND_NORMAL,
            PassbandHint::Wide => filter.wide,
        })
    }

    /// Validate an optional VFO name; `None` addresses the current VFO.
    pub fn vfo(&self, name: Option<&str>) -> Result<VfoBits> {
        match name {
            None => Ok(VFO_CURR),
            Some(name) => self.named_vfo(name),
        }
    }

    /// Validate a VFO name that must be given.
    pub fn named_vfo(&self, name: &str) -> Result<VfoBits> {
        let vfo = VFOS.lookup(name)?;
        if vfo != VFO_CURR && self.caps.vfos & vfo == 0 {
            return Err(Self::not_published("VFO", name, self.caps.model_name));
        }
        Ok(vfo)
    }

    pub fn rit(&self, offset_hz: i32) -> Result<i32> {
        Self::offset("RIT", offset_hz, self.caps.max_rit)
    }

    pub fn xit(&self, offset_hz: i32) -> Result<i32> {
        Self::offset("XIT", offset_hz, self.caps.max_xit)
    }

    fn offset(axis: &str, offset_hz: i32, max: i32) -> Result<i32> {
        if offset_hz.unsigned_abs() > max.unsigned_abs() {
            return Err(Error::InvalidArgument(format!(
                "{axis} offset {offset_hz} Hz exceeds +/-{max} Hz"
            )));
        }
        Ok(offset_hz)
    }

    // -- levels and functions -------------------------------------------------

    fn gettable_level(&self, name: &str) -> Result<LevelBits> {
        let level = LEVELS.lookup(name)?;
        if self.caps.has_get_level & level == 0 {
            return Err(Self::not_published("level", name, self.caps.model_name));
        }
        Ok(level)
    }

    fn level_granularity(&self, level: LevelBits) -> Granularity {
        self.caps.granularity(level).unwrap_or(if is_float_level(level) {
            Granularity::new(0.0, 1.0, 0.0)
        } else {
            Granularity::new(0.0, 255.0, 1.0)
        })
    }

    /// Validate a level name for reading.
    pub fn level(&self, name: &str) -> Result<LevelBits> {
        self.gettable_level(name)
    }

    /// Validate a level name and normalized value for writing.
    pub fn level_value(&self, name: &str, value: f64) -> Result<(LevelBits, LevelValue)> {
        let level = LEVELS.lookup(name)?;
        if self.caps.has_set_level & level == 0 {
            return Err(Self::not_published("settable level", name, self.caps.model_name));
        }
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(Error::InvalidArgument(format!(
                "level value {value} is outside 0.0..=1.0"
            )));
        }
        let gran = self.level_granularity(level);
        Ok((level, denormalize(&gran, is_float_level(level), value)))
    }

    /// Convert a native level reading to the normalized scale.
    pub fn level_from_native(&self, level: LevelBits, value: LevelValue) -> f64 {
        normalize(&self.level_granularity(level), value)
    }

    /// One native step of `level`, expressed on the normalized scale.
    pub fn level_resolution(&self, level: LevelBits) -> f64 {
        let gran = self.level_granularity(level);
        let span = (gran.max - gran.min).abs();
        if span == 0.0 {
            0.0
        } else {
            resolution(&gran, is_float_level(level)) / span
        }
    }

    pub fn function(&self, name: &str) -> Result<FuncBits> {
        let func = FUNCTIONS.lookup(name)?;
        if self.caps.has_get_func & func == 0 {
            return Err(Self::not_published("function", name, self.caps.model_name));
        }
        Ok(func)
    }

    pub fn settable_function(&self, name: &str) -> Result<FuncBits> {
        let func = FUNCTIONS.lookup(name)?;
        if self.caps.has_set_func & func == 0 {
            return Err(Self::not_published(
                "settable function",
                name,
                self.caps.model_name,
            ));
        }
        Ok(func)
    }

    /// Level names the model can read or write, in table order.
    pub fn supported_levels(&self) -> Vec<String> {
        published_names(&LEVELS, self.caps.has_get_level | self.caps.has_set_level)
            .into_iter()
            .map(String::from)
            .collect()
    }

    /// Level names the model can write, in table order.
    pub fn settable_levels(&self) -> Vec<String> {
        published_names(&LEVELS, self.caps.has_set_level)
            .into_iter()
            .map(String::from)
            .collect()
    }

    /// Function names the model can read or write, in table order.
    pub fn supported_functions(&self) -> Vec<String> {
        published_names(&FUNCTIONS, self.caps.has_get_func | self.caps.has_set_func)
            .into_iter()
            .map(String::from)
            .collect()
    }

    pub fn supported_modes(&self) -> Vec<&'static str> {
        published_names(&MODES, self.caps.modes)
    }

    pub fn supported_vfos(&self) -> Vec<&'static str> {
        published_names(&VFOS, self.caps.vfos)
    }

    // -- memory channels ------------------------------------------------------

    pub fn channel_number(&self, n: i32) -> Result<i32> {
        if n < 0 {
            return Err(Error::InvalidArgument(format!(
                "channel number {n} must not be negative"
            )));
        }
        if !self.caps.channels.is_empty() && !self.caps.channels.iter().any(|r| r.contains(n)) {
            return Err(Error::InvalidArgument(format!(
                "channel {n} is not a memory channel of {}",
                self.caps.model_name
            )));
        }
        Ok(n)
    }

    /// Validate and convert a full channel description.
    pub fn channel(&self, n: i32, data: &ChannelData) -> Result<Channel> {
        let number = self.channel_number(n)?;
        let freq = self.frequency(data.frequency)?;
        let mode = data.mode.as_deref().map(|m| self.mode(m)).transpose()?;
        let tx_mode = data.tx_mode.as_deref().map(|m| self.mode(m)).transpose()?;
        let tx_freq = data.tx_frequency.map(|f| self.frequency(f)).transpose()?;
        let vfo = match data.vfo.as_deref() {
            Some(name) => self.named_vfo(name)?,
            None => VFO_MEM,
        };
        let rptr_shift = data
            .repeater_shift
            .as_deref()
            .map(|s| REPEATER_SHIFTS.lookup(s))
            .transpose()?;
        let ctcss_tone = data.ctcss_tone.map(|t| self.ctcss_tone(t)).transpose()?;
        let dcs_code = data.dcs_code.map(|c| self.dcs_code(c)).transpose()?;
        let mut funcs = 0;
        for name in &data.functions {
            funcs |= self.settable_function(name)?;
        }
        Ok(Channel {
            number,
            vfo,
            freq,
            mode: mode.unwrap_or(MODE_NONE),
            width: data.width.unwrap_or(PASSBAND_NORMAL),
            split: data.split,
            tx_freq: tx_freq.unwrap_or(0.0),
            tx_mode: tx_mode.unwrap_or(MODE_NONE),
            rptr_shift: rptr_shift.unwrap_or(RPT_SHIFT_NONE),
            rptr_offs: data.repeater_offset.unwrap_or(0),
            ctcss_tone: ctcss_tone.unwrap_or(0),
            dcs_code: dcs_code.unwrap_or(0),
            funcs,
            description: data.description.clone(),
        })
    }

    /// Convert a native channel read back from the driver.
    pub fn channel_from_native(channel: &Channel) -> ChannelData {
        let named_mode = |m: ModeBits| (m != MODE_NONE).then(|| mode_name(m).to_string());
        ChannelData {
            frequency: Self::frequency_from_native(channel.freq),
            mode: named_mode(channel.mode),
            width: (channel.mode != MODE_NONE).then_some(channel.width),
            vfo: (channel.vfo != VFO_NONE).then(|| vfo_name(channel.vfo).to_string()),
            split: channel.split,
            tx_frequency: (channel.tx_freq > 0.0)
                .then(|| Self::frequency_from_native(channel.tx_freq)),
            tx_mode: named_mode(channel.tx_mode),
            repeater_shift: (channel.rptr_shift != RPT_SHIFT_NONE)
                .then(|| REPEATER_SHIFTS.name(channel.rptr_shift).unwrap_or(UNKNOWN).to_string()),
            repeater_offset: (channel.rptr_offs != 0).then_some(channel.rptr_offs),
            ctcss_tone: (channel.ctcss_tone != 0).then_some(channel.ctcss_tone),
            dcs_code: (channel.dcs_code != 0).then_some(channel.dcs_code),
            functions: published_names(&FUNCTIONS, channel.funcs)
                .into_iter()
                .map(String::from)
                .collect(),
            description: channel.description.clone(),
        }
    }

    // -- scanning and VFO operations ------------------------------------------

    pub fn scan(&self, name: &str) -> Result<ScanBits> {
        let scan = SCAN_TYPES.lookup(name)?;
        if scan != SCAN_STOP && self.caps.scan_ops & scan == 0 {
            return Err(Self::not_published("scan type", name, self.caps.model_name));
        }
        Ok(scan)
    }

    pub fn vfo_op(&self, name: &str) -> Result<VfoOpBits> {
        let op = VFO_OPS.lookup(name)?;
        if self.caps.vfo_ops & op == 0 {
            return Err(Self::not_published("VFO operation", name, self.caps.model_name));
        }
        Ok(op)
    }

    // -- miscellaneous --------------------------------------------------------

    pub fn antenna(&self, ant: u32) -> Result<u32> {
        if ant == 0 || ant > self.caps.antennas {
            return Err(Error::InvalidArgument(format!(
                "antenna {ant} is outside 1..={}",
                self.caps.antennas
            )));
        }
        Ok(ant)
    }

    pub fn power_state(&self, name: &str) -> Result<u32> {
        POWER_STATES.lookup(name)
    }

    pub fn repeater_shift(&self, name: &str) -> Result<u32> {
        REPEATER_SHIFTS.lookup(name)
    }

    pub fn ctcss_tone(&self, tone: u32) -> Result<u32> {
        if !self.caps.ctcss_tones.contains(&tone) {
            return Err(Error::InvalidArgument(format!(
                "CTCSS tone {}.{} Hz is not supported by {}",
                tone / 10,
                tone % 10,
                self.caps.model_name
            )));
        }
        Ok(tone)
    }

    pub fn dcs_code(&self, code: u32) -> Result<u32> {
        if !self.caps.dcs_codes.contains(&code) {
            return Err(Error::InvalidArgument(format!(
                "DCS code {code:03} is not supported by {}",
                self.caps.model_name
            )));
        }
        Ok(code)
    }

    pub fn ptt_type(&self, name: &str) -> Result<u32> {
        PTT_TYPES.lookup(name)
    }

    pub fn dcd_type(&self, name: &str) -> Result<u32> {
        DCD_TYPES.lookup(name)
    }

    pub fn serial_param(&self, name: &str) -> Result<SerialParam> {
        SerialParam::from_name(name)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown serial parameter '{name}'")))
    }

    /// Validate a serial parameter and its value.
    pub fn serial_config(&self, name: &str, value: &str) -> Result<(SerialParam, u32)> {
        let param = self.serial_param(name)?;
        Ok((param, serial_value(param, value)?))
    }

    /// Render a native serial parameter value.
    pub fn serial_value_name(param: SerialParam, value: u32) -> String {
        match param {
            SerialParam::Parity => PARITIES.name(value).unwrap_or(UNKNOWN).to_string(),
            SerialParam::Handshake => HANDSHAKES.name(value).unwrap_or(UNKNOWN).to_string(),
            _ => value.to_string(),
        }
    }
}

/// Validate one serial parameter value without a model.
pub fn serial_value(param: SerialParam, value: &str) -> Result<u32> {
    let numeric = |allowed: &[u32]| -> Result<u32> {
        value
            .parse::<u32>()
            .ok()
            .filter(|v| allowed.contains(v))
            .ok_or_else(|| {
                Error::InvalidArgument(format!("invalid {} '{value}'", param.name()))
            })
    };
    match param {
        SerialParam::Rate => numeric(&SERIAL_RATES),
        SerialParam::DataBits => numeric(&[5, 6, 7, 8]),
        SerialParam::StopBits => numeric(&[1, 2]),
        SerialParam::Parity => PARITIES.lookup(value),
        SerialParam::Handshake => HANDSHAKES.lookup(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rigbridge_core::{ChannelRange, FilterSpec};

    fn test_caps() -> RigCaps {
        RigCaps {
            model_id: 9000,
            model_name: "TEST-1",
            manufacturer: "Test",
            modes: MODE_USB | MODE_LSB | MODE_CW | MODE_FM | MODE_AM,
            vfos: VFO_A | VFO_B | VFO_MEM,
            has_get_level: LEVEL_AF | LEVEL_RFPOWER | LEVEL_KEYSPD | LEVEL_STRENGTH,
            has_set_level: LEVEL_AF | LEVEL_RFPOWER | LEVEL_KEYSPD,
            level_granularity: vec![
                (LEVEL_AF, Granularity::new(0.0, 1.0, 0.0)),
                (LEVEL_RFPOWER, Granularity::new(0.05, 1.0, 0.01)),
                (LEVEL_KEYSPD, Granularity::new(4.0, 60.0, 1.0)),
                (LEVEL_STRENGTH, Granularity::new(-54.0, 60.0, 1.0)),
            ],
            has_get_func: FUNC_NB | FUNC_COMP | FUNC_LOCK,
            has_set_func: FUNC_NB | FUNC_COMP,
            scan_ops: SCAN_MEM | SCAN_VFO,
            vfo_ops: OP_CPY | OP_XCHG,
            max_rit: 9_999,
            max_xit: 9_999,
            antennas: 2,
            ctcss_tones: vec![670, 885, 1_000],
            dcs_codes: vec![23, 25],
            channels: vec![ChannelRange::new(1, 99)],
            filters: vec![FilterSpec {
                modes: MODE_FM,
                normal: 15_000,
                narrow: 10_000,
                wide: 20_000,
            }],
            ..RigCaps::default()
        }
    }

    fn translator() -> Translator {
        Translator::new(Arc::new(test_caps()))
    }

    #[test]
    fn tables_round_trip_names() {
        for (name, bit) in MODES.entries() {
            assert_eq!(MODES.name(*bit), Some(*name));
        }
        assert_eq!(VFOS.name(VFO_A), Some("VFOA"));
        assert_eq!(VFOS.native("VFO-A"), Some(VFO_A));
    }

    #[test]
    fn table_lookup_is_case_sensitive() {
        assert_eq!(MODES.native("FM"), Some(MODE_FM));
        assert!(MODES.native("fm").is_none());
        let err = MODES.lookup("fm").unwrap_err();
        assert_eq!(err, Error::InvalidArgument("unknown mode 'fm'".into()));
    }

    #[test]
    fn mode_must_be_published() {
        let t = translator();
        assert_eq!(t.mode("FM").unwrap(), MODE_FM);
        assert!(matches!(t.mode("PKTUSB"), Err(Error::InvalidArgument(_))));
        assert!(matches!(t.mode("XYZ"), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn passband_hints() {
        let t = translator();
        assert_eq!(t.passband(MODE_FM, None).unwrap(), PASSBAND_NORMAL);
        assert_eq!(t.passband(MODE_FM, Some("narrow")).unwrap(), 10_000);
        assert_eq!(t.passband(MODE_FM, Some("wide")).unwrap(), 20_000);
        assert_eq!(t.passband(MODE_FM, Some("normal")).unwrap(), PASSBAND_NORMAL);
        assert_eq!(t.passband(MODE_USB, Some("wide")).unwrap(), PASSBAND_NORMAL);
        assert!(t.passband(MODE_FM, Some("skinny")).is_err());
    }

    #[test]
    fn vfo_validation() {
        let t = translator();
        assert_eq!(t.vfo(None).unwrap(), VFO_CURR);
        assert_eq!(t.vfo(Some("VFOB")).unwrap(), VFO_B);
        assert_eq!(t.vfo(Some("VFO-A")).unwrap(), VFO_A);
        assert_eq!(t.vfo(Some("currVFO")).unwrap(), VFO_CURR);
        assert!(t.vfo(Some("VFOC")).is_err());
        assert!(t.vfo(Some("vfoa")).is_err());
    }

    #[test]
    fn frequency_rejects_zero() {
        let t = translator();
        assert_eq!(t.frequency(144_390_000).unwrap(), 144_390_000.0);
        assert!(t.frequency(0).is_err());
        assert_eq!(Translator::frequency_from_native(14_074_000.4), 14_074_000);
        assert_eq!(Translator::frequency_from_native(f64::NAN), 0);
    }

    #[test]
    fn rit_xit_bounds() {
        let t = translator();
        assert_eq!(t.rit(-500).unwrap(), -500);
        assert!(t.rit(10_000).is_err());
        assert!(t.xit(-10_000).is_err());
    }

    #[test]
    fn level_scaling_float_continuous() {
        let t = translator();
        let (level, value) = t.level_value("AF", 0.5).unwrap();
        assert_eq!(level, LEVEL_AF);
        assert_eq!(value, LevelValue::Float(0.5));
        assert!((t.level_from_native(LEVEL_AF, value) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn level_scaling_int_snaps_to_step() {
        let t = translator();
        let (_, low) = t.level_value("KEYSPD", 0.0).unwrap();
        let (_, mid) = t.level_value("KEYSPD", 0.5).unwrap();
        let (_, high) = t.level_value("KEYSPD", 1.0).unwrap();
        assert_eq!(low, LevelValue::Int(4));
        assert_eq!(mid, LevelValue::Int(32));
        assert_eq!(high, LevelValue::Int(60));
    }

    #[test]
    fn level_scaling_is_monotonic() {
        let t = translator();
        let mut last = f64::MIN;
        for i in 0..=100 {
            let (_, v) = t.level_value("RFPOWER", f64::from(i) / 100.0).unwrap();
            assert!(v.as_f64() >= last);
            last = v.as_f64();
        }
    }

    #[test]
    fn level_round_trip_within_one_step() {
        let t = translator();
        for name in t.settable_levels() {
            let level = LEVELS.native(&name).unwrap();
            let tolerance = t.level_resolution(level) + 1e-6;
            for v in [0.0, 0.5, 1.0] {
                let (_, native) = t.level_value(&name, v).unwrap();
                let back = t.level_from_native(level, native);
                assert!((back - v).abs() <= tolerance, "{name} {v} -> {back}");
            }
        }
    }

    #[test]
    fn level_rejects_out_of_range_and_readonly() {
        let t = translator();
        assert!(t.level_value("AF", 1.5).is_err());
        assert!(t.level_value("AF", -0.1).is_err());
        assert!(t.level_value("AF", f64::NAN).is_err());
        assert!(t.level_value("STRENGTH", 0.5).is_err());
        assert!(t.level("STRENGTH").is_ok());
        assert!(t.level("SQL").is_err());
    }

    #[test]
    fn supported_lists_follow_caps() {
        let t = translator();
        assert_eq!(t.supported_levels(), ["AF", "RFPOWER", "KEYSPD", "STRENGTH"]);
        assert_eq!(t.settable_levels(), ["AF", "RFPOWER", "KEYSPD"]);
        assert_eq!(t.supported_functions(), ["NB", "COMP", "LOCK"]);
        assert_eq!(t.supported_vfos(), ["VFOA", "VFOB", "MEM"]);
        assert_eq!(t.supported_modes(), ["AM", "CW", "USB", "LSB", "FM"]);
    }

    #[test]
    fn functions_get_and_set_membership() {
        let t = translator();
        assert_eq!(t.function("LOCK").unwrap(), FUNC_LOCK);
        assert!(t.settable_function("LOCK").is_err());
        assert!(t.function("TUNER").is_err());
    }

    #[test]
    fn channel_numbers() {
        let t = translator();
        assert_eq!(t.channel_number(1).unwrap(), 1);
        assert!(t.channel_number(-1).is_err());
        assert!(t.channel_number(0).is_err());
        assert!(t.channel_number(100).is_err());
    }

    #[test]
    fn channel_conversion_round_trip() {
        let t = translator();
        let data = ChannelData {
            frequency: 146_520_000,
            mode: Some("FM".into()),
            width: Some(15_000),
            repeater_shift: Some("MINUS".into()),
            repeater_offset: Some(600_000),
            ctcss_tone: Some(885),
            functions: vec!["NB".into()],
            description: "CALLING".into(),
            ..ChannelData::default()
        };
        let native = t.channel(5, &data).unwrap();
        assert_eq!(native.number, 5);
        assert_eq!(native.mode, MODE_FM);
        assert_eq!(native.rptr_shift, RPT_SHIFT_MINUS);
        assert_eq!(native.funcs, FUNC_NB);

        let back = Translator::channel_from_native(&native);
        assert_eq!(back.frequency, 146_520_000);
        assert_eq!(back.mode.as_deref(), Some("FM"));
        assert_eq!(back.repeater_shift.as_deref(), Some("MINUS"));
        assert_eq!(back.ctcss_tone, Some(885));
        assert_eq!(back.functions, ["NB"]);
        assert_eq!(back.description, "CALLING");
    }

    #[test]
    fn channel_rejects_bad_fields() {
        let t = translator();
        let base = ChannelData {
            frequency: 146_520_000,
            ..ChannelData::default()
        };
        let bad_tone = ChannelData {
            ctcss_tone: Some(1234),
            ..base.clone()
        };
        let bad_func = ChannelData {
            functions: vec!["LOCK".into()],
            ..base.clone()
        };
        let bad_freq = ChannelData {
            frequency: 0,
            ..base.clone()
        };
        assert!(t.channel(1, &base).is_ok());
        assert!(t.channel(1, &bad_tone).is_err());
        assert!(t.channel(1, &bad_func).is_err());
        assert!(t.channel(1, &bad_freq).is_err());
    }

    #[test]
    fn scan_and_vfo_ops() {
        let t = translator();
        assert_eq!(t.scan("STOP").unwrap(), SCAN_STOP);
        assert_eq!(t.scan("MEM").unwrap(), SCAN_MEM);
        assert!(t.scan("PRIO").is_err());
        assert_eq!(t.vfo_op("XCHG").unwrap(), OP_XCHG);
        assert!(t.vfo_op("TUNE").is_err());
    }

    #[test]
    fn misc_axes() {
        let t = translator();
        assert_eq!(t.antenna(2).unwrap(), 2);
        assert!(t.antenna(0).is_err());
        assert!(t.antenna(3).is_err());
        assert_eq!(t.power_state("STANDBY").unwrap(), POWER_STANDBY);
        assert!(t.power_state("SLEEP").is_err());
        assert_eq!(t.repeater_shift("PLUS").unwrap(), RPT_SHIFT_PLUS);
        assert!(t.dcs_code(23).is_ok());
        assert!(t.dcs_code(24).is_err());
        assert_eq!(t.ptt_type("RTS").unwrap(), PTT_TYPE_SERIAL_RTS);
        assert_eq!(t.dcd_type("CD").unwrap(), DCD_TYPE_SERIAL_CAR);
        assert!(t.ptt_type("CAT").is_err());
    }

    #[test]
    fn serial_config_values() {
        let t = translator();
        assert_eq!(t.serial_config("rate", "38400").unwrap(), (SerialParam::Rate, 38_400));
        assert_eq!(
            t.serial_config("serial_parity", "Even").unwrap(),
            (SerialParam::Parity, PARITY_EVEN)
        );
        assert_eq!(
            t.serial_config("serial_handshake", "Hardware").unwrap(),
            (SerialParam::Handshake, HANDSHAKE_HARDWARE)
        );
        assert!(t.serial_config("rate", "12345").is_err());
        assert!(t.serial_config("data_bits", "9").is_err());
        assert!(t.serial_config("stop_bits", "two").is_err());
        assert!(t.serial_config("baud", "9600").is_err());
        assert_eq!(Translator::serial_value_name(SerialParam::Parity, PARITY_ODD), "Odd");
        assert_eq!(Translator::serial_value_name(SerialParam::Rate, 9_600), "9600");
    }
}
