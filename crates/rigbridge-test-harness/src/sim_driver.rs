//! Simulated blocking driver for deterministic bridge tests.
//!
//! [`SimBackend`] implements [`DriverBackend`] over the model catalog in
//! [`crate::models`]. Every rig it creates is a [`SimRig`]: an in-memory
//! radio whose state survives close and reopen, whose I/O calls sleep for a
//! configurable latency and are appended to a shared [`CallLog`], and whose
//! faults can be injected through its [`SimPanel`].
//!
//! # Example
//!
//! ```
//! use rigbridge_core::DriverBackend;
//! use rigbridge_core::native::MODEL_DUMMY;
//! use rigbridge_test_harness::SimBackend;
//!
//! let backend = SimBackend::new();
//! let mut rig = backend.init(MODEL_DUMMY).unwrap();
//! rig.open().unwrap();
//! rig.set_freq(rigbridge_core::native::VFO_CURR, 7_074_000.0).unwrap();
//! assert_eq!(backend.log().calls(0), ["open", "set_freq"]);
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::debug;

use rigbridge_core::native::*;
use rigbridge_core::types::{DebugLevel, ModelId, ModelInfo, SerialParam};
use rigbridge_core::{
    Channel, DriverBackend, DriverResult, FreqCallback, PortConfig, PttCallback, RigCaps,
    RigDriver, SerialSettings, Status,
};

use crate::call_log::CallLog;
use crate::models;
use crate::panel::{SimPanel, spawn_monitor};

// ---------------------------------------------------------------------------
// Simulated radio state
// ---------------------------------------------------------------------------

/// Everything a simulated radio remembers.
#[derive(Debug, Clone)]
pub struct SimState {
    pub open: bool,
    pub opens: u32,
    pub closes: u32,
    pub curr_vfo: VfoBits,
    pub freqs: HashMap<VfoBits, f64>,
    pub mode: ModeBits,
    pub width: i64,
    pub ptt: u32,
    pub dcd: u32,
    /// Signal strength in dB relative to S9.
    pub strength: i32,
    pub rit: i32,
    pub xit: i32,
    pub levels: HashMap<LevelBits, LevelValue>,
    pub funcs: FuncBits,
    pub split: bool,
    pub tx_vfo: VfoBits,
    pub split_freq: f64,
    pub split_mode: ModeBits,
    pub split_width: i64,
    pub channels: HashMap<i32, Channel>,
    pub mem_channel: i32,
    pub scan: ScanBits,
    pub antenna: u32,
    pub power: u32,
    pub rptr_shift: u32,
    pub rptr_offs: i32,
    pub ctcss_tone: u32,
    pub dcs_code: u32,
    pub serial: SerialSettings,
    pub ptt_type: u32,
    pub dcd_type: u32,
    pub port: Option<PortConfig>,
}

impl SimState {
    fn new(caps: &RigCaps) -> Self {
        let mut freqs = HashMap::new();
        for (vfo, hz) in [
            (VFO_A, 14_074_000.0),
            (VFO_B, 7_074_000.0),
            (VFO_C, 10_136_000.0),
            (VFO_MAIN, 14_074_000.0),
            (VFO_SUB, 7_074_000.0),
            (VFO_MEM, 145_500_000.0),
        ] {
            if caps.vfos & vfo != 0 {
                freqs.insert(vfo, hz);
            }
        }
        let curr_vfo = if caps.vfos & VFO_A != 0 { VFO_A } else { VFO_MAIN };
        SimState {
            open: false,
            opens: 0,
            closes: 0,
            curr_vfo,
            freqs,
            mode: MODE_USB,
            width: 2_400,
            ptt: PTT_OFF,
            dcd: DCD_OFF,
            strength: -20,
            rit: 0,
            xit: 0,
            levels: HashMap::new(),
            funcs: 0,
            split: false,
            tx_vfo: VFO_B,
            split_freq: 0.0,
            split_mode: MODE_USB,
            split_width: 2_400,
            channels: HashMap::new(),
            mem_channel: 0,
            scan: SCAN_STOP,
            antenna: 1,
            power: POWER_ON,
            rptr_shift: RPT_SHIFT_NONE,
            rptr_offs: 0,
            ctcss_tone: 0,
            dcs_code: 0,
            serial: SerialSettings::default(),
            ptt_type: PTT_TYPE_RIG,
            dcd_type: DCD_TYPE_RIG,
            port: None,
        }
    }

    /// Resolve `VFO_CURR` to the selected VFO.
    pub fn resolve(&self, vfo: VfoBits) -> VfoBits {
        if vfo == VFO_CURR { self.curr_vfo } else { vfo }
    }

    /// Frequency of `vfo` (after resolving), or 0 if it has none.
    pub fn freq(&self, vfo: VfoBits) -> f64 {
        self.freqs.get(&self.resolve(vfo)).copied().unwrap_or(0.0)
    }
}

/// One injected failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// The next I/O call returns this status.
    Status(Status),
    /// The next I/O call panics, as a crashing driver would.
    Panic,
}

#[derive(Debug, Default)]
pub(crate) struct Faults {
    pub fail_open: Option<Status>,
    pub next: Option<Fault>,
}

#[derive(Default)]
pub(crate) struct Callbacks {
    pub freq: Option<FreqCallback>,
    pub ptt: Option<PttCallback>,
}

/// State shared between a [`SimRig`], its panel, and its monitor thread.
pub(crate) struct RigShared {
    pub index: usize,
    pub caps: RigCaps,
    pub state: Mutex<SimState>,
    pub faults: Mutex<Faults>,
    pub callbacks: Mutex<Callbacks>,
    pub latency: Mutex<Duration>,
    pub released: AtomicBool,
}

// ---------------------------------------------------------------------------
// SimRig
// ---------------------------------------------------------------------------

/// One simulated driver connection.
pub struct SimRig {
    shared: Arc<RigShared>,
    log: CallLog,
    /// Whether the model reports front-panel changes through callbacks.
    transceive: bool,
}

impl SimRig {
    /// Perform one recorded I/O call.
    fn io_with<T>(
        &mut self,
        call: &'static str,
        requires_open: bool,
        f: impl FnOnce(&mut SimState, &RigCaps) -> DriverResult<T>,
    ) -> DriverResult<T> {
        let start = Instant::now();
        let latency = *self.shared.latency.lock();
        if !latency.is_zero() {
            std::thread::sleep(latency);
        }

        let fault = self.shared.faults.lock().next.take();
        let result = match fault {
            Some(Fault::Panic) => panic!("simulated driver fault in {call}"),
            Some(Fault::Status(status)) => {
                debug!(rig = self.shared.index, call, code = status.code(), "injected failure");
                Err(status)
            }
            None => {
                let mut state = self.shared.state.lock();
                if requires_open && !state.open {
                    Err(Status::EIO)
                } else {
                    f(&mut state, &self.shared.caps)
                }
            }
        };

        self.log.record(self.shared.index, call, start, Instant::now());
        result
    }

    fn io<T>(
        &mut self,
        call: &'static str,
        f: impl FnOnce(&mut SimState, &RigCaps) -> DriverResult<T>,
    ) -> DriverResult<T> {
        self.io_with(call, true, f)
    }
}

impl Drop for SimRig {
    fn drop(&mut self) {
        *self.shared.callbacks.lock() = Callbacks::default();
        self.shared.released.store(true, Ordering::Release);
    }
}

fn check_vfo(caps: &RigCaps, state: &SimState, vfo: VfoBits) -> DriverResult<VfoBits> {
    let vfo = state.resolve(vfo);
    if caps.vfos & vfo == 0 {
        return Err(Status::EVFO);
    }
    Ok(vfo)
}

fn check_mode(caps: &RigCaps, mode: ModeBits) -> DriverResult<()> {
    if caps.modes & mode == 0 {
        return Err(Status::EINVAL);
    }
    Ok(())
}

fn resolve_width(caps: &RigCaps, mode: ModeBits, width: i64, current: i64) -> i64 {
    match width {
        PASSBAND_NOCHANGE => current,
        PASSBAND_NORMAL => caps.filter_for(mode).map_or(2_400, |f| f.normal),
        w => w,
    }
}

fn check_channel(caps: &RigCaps, number: i32) -> DriverResult<()> {
    if caps.channels.iter().any(|r| r.contains(number)) {
        Ok(())
    } else {
        Err(Status::EINVAL)
    }
}

fn check_offset(offset: i32, max: i32) -> DriverResult<()> {
    if offset.unsigned_abs() > max.unsigned_abs() {
        Err(Status::EINVAL)
    } else {
        Ok(())
    }
}

/// Reading for a level that was never written.
fn default_level(caps: &RigCaps, state: &SimState, level: LevelBits) -> LevelValue {
    match level {
        LEVEL_STRENGTH => LevelValue::Int(state.strength),
        LEVEL_RAWSTR => LevelValue::Int(((state.strength + 54) * 255 / 114).clamp(0, 255)),
        LEVEL_SWR => LevelValue::Float(1.0),
        LEVEL_ALC => LevelValue::Float(0.0),
        _ => {
            let min = caps.granularity(level).map_or(0.0, |g| g.min);
            if level & LEVEL_FLOAT_LIST != 0 {
                LevelValue::Float(min as f32)
            } else {
                LevelValue::Int(min as i32)
            }
        }
    }
}

impl RigDriver for SimRig {
    fn caps(&self) -> &RigCaps {
        &self.shared.caps
    }

    fn set_port(&mut self, port: &PortConfig) -> DriverResult<()> {
        let mut state = self.shared.state.lock();
        state.serial = port.serial;
        state.ptt_type = port.ptt_type;
        state.dcd_type = port.dcd_type;
        state.port = Some(port.clone());
        Ok(())
    }

    fn open(&mut self) -> DriverResult<()> {
        let fail = self.shared.faults.lock().fail_open;
        self.io_with("open", false, move |st, _| {
            if let Some(status) = fail {
                return Err(status);
            }
            st.open = true;
            st.opens += 1;
            Ok(())
        })
    }

    fn close(&mut self) -> DriverResult<()> {
        self.io("close", |st, _| {
            st.open = false;
            st.closes += 1;
            Ok(())
        })
    }

    fn set_freq(&mut self, vfo: VfoBits, freq: f64) -> DriverResult<()> {
        self.io("set_freq", |st, caps| {
            let vfo = check_vfo(caps, st, vfo)?;
            if !freq.is_finite() || freq <= 0.0 {
                return Err(Status::EINVAL);
            }
            st.freqs.insert(vfo, freq);
            Ok(())
        })
    }

    fn get_freq(&mut self, vfo: VfoBits) -> DriverResult<f64> {
        self.io("get_freq", |st, caps| {
            let vfo = check_vfo(caps, st, vfo)?;
            Ok(st.freq(vfo))
        })
    }

    fn set_mode(&mut self, _vfo: VfoBits, mode: ModeBits, width: i64) -> DriverResult<()> {
        self.io("set_mode", |st, caps| {
            check_mode(caps, mode)?;
            st.width = resolve_width(caps, mode, width, st.width);
            st.mode = mode;
            Ok(())
        })
    }

    fn get_mode(&mut self, _vfo: VfoBits) -> DriverResult<(ModeBits, i64)> {
        self.io("get_mode", |st, _| Ok((st.mode, st.width)))
    }

    fn set_vfo(&mut self, vfo: VfoBits) -> DriverResult<()> {
        self.io("set_vfo", |st, caps| {
            st.curr_vfo = check_vfo(caps, st, vfo)?;
            Ok(())
        })
    }

    fn get_vfo(&mut self) -> DriverResult<VfoBits> {
        self.io("get_vfo", |st, _| Ok(st.curr_vfo))
    }

    fn set_ptt(&mut self, _vfo: VfoBits, ptt: u32) -> DriverResult<()> {
        self.io("set_ptt", |st, _| {
            st.ptt = ptt;
            Ok(())
        })
    }

    fn get_ptt(&mut self, _vfo: VfoBits) -> DriverResult<u32> {
        self.io("get_ptt", |st, _| Ok(st.ptt))
    }

    fn get_dcd(&mut self, _vfo: VfoBits) -> DriverResult<u32> {
        self.io("get_dcd", |st, _| Ok(st.dcd))
    }

    fn get_strength(&mut self, _vfo: VfoBits) -> DriverResult<i32> {
        self.io("get_strength", |st, _| Ok(st.strength))
    }

    fn set_channel(&mut self, _vfo: VfoBits, channel: &Channel) -> DriverResult<()> {
        self.io("set_channel", |st, caps| {
            check_channel(caps, channel.number)?;
            st.channels.insert(channel.number, channel.clone());
            Ok(())
        })
    }

    fn get_channel(&mut self, _vfo: VfoBits, number: i32, _read_only: bool) -> DriverResult<Channel> {
        self.io("get_channel", |st, caps| {
            check_channel(caps, number)?;
            Ok(st.channels.get(&number).cloned().unwrap_or(Channel {
                number,
                vfo: VFO_MEM,
                ..Channel::default()
            }))
        })
    }

    fn set_mem(&mut self, _vfo: VfoBits, number: i32) -> DriverResult<()> {
        self.io("set_mem", |st, caps| {
            check_channel(caps, number)?;
            st.mem_channel = number;
            Ok(())
        })
    }

    fn set_rit(&mut self, _vfo: VfoBits, offset: i32) -> DriverResult<()> {
        self.io("set_rit", |st, caps| {
            check_offset(offset, caps.max_rit)?;
            st.rit = offset;
            Ok(())
        })
    }

    fn get_rit(&mut self, _vfo: VfoBits) -> DriverResult<i32> {
        self.io("get_rit", |st, _| Ok(st.rit))
    }

    fn set_xit(&mut self, _vfo: VfoBits, offset: i32) -> DriverResult<()> {
        self.io("set_xit", |st, caps| {
            check_offset(offset, caps.max_xit)?;
            st.xit = offset;
            Ok(())
        })
    }

    fn get_xit(&mut self, _vfo: VfoBits) -> DriverResult<i32> {
        self.io("get_xit", |st, _| Ok(st.xit))
    }

    fn scan(&mut self, _vfo: VfoBits, scan: ScanBits, _channel: i32) -> DriverResult<()> {
        self.io("scan", |st, caps| {
            if scan != SCAN_STOP && caps.scan_ops & scan == 0 {
                return Err(Status::EINVAL);
            }
            st.scan = scan;
            Ok(())
        })
    }

    fn set_level(&mut self, _vfo: VfoBits, level: LevelBits, value: LevelValue) -> DriverResult<()> {
        self.io("set_level", |st, caps| {
            if caps.has_set_level & level == 0 {
                return Err(Status::EINVAL);
            }
            st.levels.insert(level, value);
            Ok(())
        })
    }

    fn get_level(&mut self, _vfo: VfoBits, level: LevelBits) -> DriverResult<LevelValue> {
        self.io("get_level", |st, caps| {
            if caps.has_get_level & level == 0 {
                return Err(Status::EINVAL);
            }
            Ok(st
                .levels
                .get(&level)
                .copied()
                .unwrap_or_else(|| default_level(caps, st, level)))
        })
    }

    fn set_func(&mut self, _vfo: VfoBits, func: FuncBits, on: bool) -> DriverResult<()> {
        self.io("set_func", |st, caps| {
            if caps.has_set_func & func == 0 {
                return Err(Status::EINVAL);
            }
            if on {
                st.funcs |= func;
            } else {
                st.funcs &= !func;
            }
            Ok(())
        })
    }

    fn get_func(&mut self, _vfo: VfoBits, func: FuncBits) -> DriverResult<bool> {
        self.io("get_func", |st, caps| {
            if caps.has_get_func & func == 0 {
                return Err(Status::EINVAL);
            }
            Ok(st.funcs & func != 0)
        })
    }

    fn set_split_freq(&mut self, _vfo: VfoBits, freq: f64) -> DriverResult<()> {
        self.io("set_split_freq", |st, _| {
            if !freq.is_finite() || freq <= 0.0 {
                return Err(Status::EINVAL);
            }
            st.split_freq = freq;
            Ok(())
        })
    }

    fn get_split_freq(&mut self, _vfo: VfoBits) -> DriverResult<f64> {
        self.io("get_split_freq", |st, _| Ok(st.split_freq))
    }

    fn set_split_mode(&mut self, _vfo: VfoBits, mode: ModeBits, width: i64) -> DriverResult<()> {
        self.io("set_split_mode", |st, caps| {
            check_mode(caps, mode)?;
            st.split_width = resolve_width(caps, mode, width, st.split_width);
            st.split_mode = mode;
            Ok(())
        })
    }

    fn get_split_mode(&mut self, _vfo: VfoBits) -> DriverResult<(ModeBits, i64)> {
        self.io("get_split_mode", |st, _| Ok((st.split_mode, st.split_width)))
    }

    fn set_split_vfo(&mut self, _vfo: VfoBits, split: bool, tx_vfo: VfoBits) -> DriverResult<()> {
        self.io("set_split_vfo", |st, caps| {
            let tx_vfo = check_vfo(caps, st, tx_vfo)?;
            st.split = split;
            st.tx_vfo = tx_vfo;
            Ok(())
        })
    }

    fn get_split_vfo(&mut self, _vfo: VfoBits) -> DriverResult<(bool, VfoBits)> {
        self.io("get_split_vfo", |st, _| Ok((st.split, st.tx_vfo)))
    }

    fn vfo_op(&mut self, _vfo: VfoBits, op: VfoOpBits) -> DriverResult<()> {
        self.io("vfo_op", |st, caps| {
            if caps.vfo_ops & op == 0 {
                return Err(Status::EINVAL);
            }
            let a = st.freq(VFO_A);
            let b = st.freq(VFO_B);
            let curr = st.curr_vfo;
            match op {
                OP_CPY => {
                    st.freqs.insert(VFO_B, a);
                }
                OP_XCHG => {
                    st.freqs.insert(VFO_A, b);
                    st.freqs.insert(VFO_B, a);
                }
                OP_TOGGLE => {
                    st.curr_vfo = if curr == VFO_A { VFO_B } else { VFO_A };
                }
                OP_UP | OP_DOWN => {
                    let step = if op == OP_UP { 100.0 } else { -100.0 };
                    let freq = (st.freq(curr) + step).max(1.0);
                    st.freqs.insert(curr, freq);
                }
                _ => {}
            }
            Ok(())
        })
    }

    fn set_ant(&mut self, _vfo: VfoBits, ant: u32) -> DriverResult<()> {
        self.io("set_ant", |st, caps| {
            if ant == 0 || ant > caps.antennas {
                return Err(Status::EINVAL);
            }
            st.antenna = ant;
            Ok(())
        })
    }

    fn get_ant(&mut self, _vfo: VfoBits) -> DriverResult<u32> {
        self.io("get_ant", |st, _| Ok(st.antenna))
    }

    fn set_powerstat(&mut self, status: u32) -> DriverResult<()> {
        self.io("set_powerstat", |st, _| {
            st.power = status;
            Ok(())
        })
    }

    fn get_powerstat(&mut self) -> DriverResult<u32> {
        self.io("get_powerstat", |st, _| Ok(st.power))
    }

    fn set_rptr_shift(&mut self, _vfo: VfoBits, shift: u32) -> DriverResult<()> {
        self.io("set_rptr_shift", |st, _| {
            st.rptr_shift = shift;
            Ok(())
        })
    }

    fn get_rptr_shift(&mut self, _vfo: VfoBits) -> DriverResult<u32> {
        self.io("get_rptr_shift", |st, _| Ok(st.rptr_shift))
    }

    fn set_rptr_offs(&mut self, _vfo: VfoBits, offset: i32) -> DriverResult<()> {
        self.io("set_rptr_offs", |st, _| {
            st.rptr_offs = offset;
            Ok(())
        })
    }

    fn get_rptr_offs(&mut self, _vfo: VfoBits) -> DriverResult<i32> {
        self.io("get_rptr_offs", |st, _| Ok(st.rptr_offs))
    }

    fn set_ctcss_tone(&mut self, _vfo: VfoBits, tone: u32) -> DriverResult<()> {
        self.io("set_ctcss_tone", |st, caps| {
            if tone != 0 && !caps.ctcss_tones.contains(&tone) {
                return Err(Status::EINVAL);
            }
            st.ctcss_tone = tone;
            Ok(())
        })
    }

    fn get_ctcss_tone(&mut self, _vfo: VfoBits) -> DriverResult<u32> {
        self.io("get_ctcss_tone", |st, _| Ok(st.ctcss_tone))
    }

    fn set_dcs_code(&mut self, _vfo: VfoBits, code: u32) -> DriverResult<()> {
        self.io("set_dcs_code", |st, caps| {
            if code != 0 && !caps.dcs_codes.contains(&code) {
                return Err(Status::EINVAL);
            }
            st.dcs_code = code;
            Ok(())
        })
    }

    fn get_dcs_code(&mut self, _vfo: VfoBits) -> DriverResult<u32> {
        self.io("get_dcs_code", |st, _| Ok(st.dcs_code))
    }

    fn set_serial_config(&mut self, param: SerialParam, value: u32) -> DriverResult<()> {
        self.io("set_serial_config", |st, _| {
            st.serial.set(param, value);
            Ok(())
        })
    }

    fn get_serial_config(&mut self, param: SerialParam) -> DriverResult<u32> {
        self.io("get_serial_config", |st, _| Ok(st.serial.get(param)))
    }

    fn set_ptt_type(&mut self, ptt_type: u32) -> DriverResult<()> {
        self.io("set_ptt_type", |st, _| {
            st.ptt_type = ptt_type;
            Ok(())
        })
    }

    fn get_ptt_type(&mut self) -> DriverResult<u32> {
        self.io("get_ptt_type", |st, _| Ok(st.ptt_type))
    }

    fn set_dcd_type(&mut self, dcd_type: u32) -> DriverResult<()> {
        self.io("set_dcd_type", |st, _| {
            st.dcd_type = dcd_type;
            Ok(())
        })
    }

    fn get_dcd_type(&mut self) -> DriverResult<u32> {
        self.io("get_dcd_type", |st, _| Ok(st.dcd_type))
    }

    fn set_freq_callback(&mut self, callback: Option<FreqCallback>) -> DriverResult<()> {
        if !self.transceive {
            return Err(Status::ENIMPL);
        }
        self.shared.callbacks.lock().freq = callback;
        Ok(())
    }

    fn set_ptt_callback(&mut self, callback: Option<PttCallback>) -> DriverResult<()> {
        if !self.transceive {
            return Err(Status::ENIMPL);
        }
        self.shared.callbacks.lock().ptt = callback;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SimBackend
// ---------------------------------------------------------------------------

/// Simulated driver library: model registry plus every rig it created.
pub struct SimBackend {
    models: Vec<RigCaps>,
    log: CallLog,
    latency: Mutex<Duration>,
    rigs: Mutex<Vec<SimPanel>>,
    debug_levels: Mutex<Vec<DebugLevel>>,
}

impl SimBackend {
    /// Backend over the full simulated catalog with no latency.
    pub fn new() -> Self {
        SimBackend {
            models: models::all_models(),
            log: CallLog::new(),
            latency: Mutex::new(Duration::ZERO),
            rigs: Mutex::new(Vec::new()),
            debug_levels: Mutex::new(Vec::new()),
        }
    }

    /// Backend whose rigs sleep for `latency` in every I/O call.
    pub fn with_latency(latency: Duration) -> Self {
        let backend = Self::new();
        *backend.latency.lock() = latency;
        backend
    }

    /// Latency for rigs created from now on.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = latency;
    }

    /// The call trace shared by every rig of this backend.
    pub fn log(&self) -> &CallLog {
        &self.log
    }

    /// Number of rigs created so far.
    pub fn rig_count(&self) -> usize {
        self.rigs.lock().len()
    }

    /// Panel of the rig created `index`-th.
    pub fn panel(&self, index: usize) -> Option<SimPanel> {
        self.rigs.lock().get(index).cloned()
    }

    /// Panel of the most recently created rig.
    pub fn last_panel(&self) -> Option<SimPanel> {
        self.rigs.lock().last().cloned()
    }

    /// Every debug level applied, in order.
    pub fn debug_levels(&self) -> Vec<DebugLevel> {
        self.debug_levels.lock().clone()
    }
}

impl Default for SimBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DriverBackend for SimBackend {
    fn models(&self) -> Vec<ModelInfo> {
        self.models.iter().map(RigCaps::model_info).collect()
    }

    fn init(&self, model: ModelId) -> Option<Box<dyn RigDriver>> {
        let caps = self.models.iter().find(|c| c.model_id == model)?.clone();
        let mut rigs = self.rigs.lock();
        let index = rigs.len();
        debug!(rig = index, model, name = caps.model_name, "simulated rig created");

        let shared = Arc::new(RigShared {
            index,
            state: Mutex::new(SimState::new(&caps)),
            caps,
            faults: Mutex::new(Faults::default()),
            callbacks: Mutex::new(Callbacks::default()),
            latency: Mutex::new(*self.latency.lock()),
            released: AtomicBool::new(false),
        });
        let monitor = spawn_monitor(Arc::clone(&shared));
        rigs.push(SimPanel::new(Arc::clone(&shared), monitor));

        Some(Box::new(SimRig {
            shared,
            log: self.log.clone(),
            transceive: model != MODEL_NETRIGCTL,
        }))
    }

    fn set_debug_level(&self, level: DebugLevel) {
        self.debug_levels.lock().push(level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MODEL_K3;

    fn open_rig(backend: &SimBackend, model: ModelId) -> Box<dyn RigDriver> {
        let mut rig = backend.init(model).unwrap();
        rig.open().unwrap();
        rig
    }

    #[test]
    fn unknown_model_is_rejected() {
        let backend = SimBackend::new();
        assert!(backend.init(424_242).is_none());
        assert_eq!(backend.rig_count(), 0);
    }

    #[test]
    fn catalog_lists_every_model() {
        let backend = SimBackend::new();
        let models = backend.models();
        assert_eq!(models.len(), models::all_models().len());
        assert!(models.iter().any(|m| m.model_name == "IC-7300"));
    }

    #[test]
    fn io_requires_open() {
        let backend = SimBackend::new();
        let mut rig = backend.init(MODEL_DUMMY).unwrap();
        assert_eq!(rig.get_freq(VFO_CURR), Err(Status::EIO));
    }

    #[test]
    fn state_survives_reopen() {
        let backend = SimBackend::new();
        let mut rig = open_rig(&backend, MODEL_DUMMY);
        rig.set_freq(VFO_CURR, 144_390_000.0).unwrap();
        rig.close().unwrap();
        rig.open().unwrap();
        assert_eq!(rig.get_freq(VFO_CURR).unwrap(), 144_390_000.0);
        assert_eq!(
            backend.log().calls(0),
            ["open", "set_freq", "close", "open", "get_freq"]
        );
    }

    #[test]
    fn normal_passband_comes_from_filter_table() {
        let backend = SimBackend::new();
        let mut rig = open_rig(&backend, MODEL_DUMMY);
        rig.set_mode(VFO_CURR, MODE_FM, PASSBAND_NORMAL).unwrap();
        assert_eq!(rig.get_mode(VFO_CURR).unwrap(), (MODE_FM, 15_000));
        rig.set_mode(VFO_CURR, MODE_CW, 250).unwrap();
        assert_eq!(rig.get_mode(VFO_CURR).unwrap(), (MODE_CW, 250));
        rig.set_mode(VFO_CURR, MODE_CW, PASSBAND_NOCHANGE).unwrap();
        assert_eq!(rig.get_mode(VFO_CURR).unwrap(), (MODE_CW, 250));
    }

    #[test]
    fn unsupported_values_are_rejected_by_the_rig() {
        let backend = SimBackend::new();
        let mut rig = open_rig(&backend, MODEL_K3);
        assert_eq!(rig.set_mode(VFO_CURR, MODE_PKTFM, 0), Err(Status::EINVAL));
        assert_eq!(rig.set_ant(VFO_CURR, 3), Err(Status::EINVAL));
        assert_eq!(rig.set_dcs_code(VFO_CURR, 23), Err(Status::EINVAL));
        assert_eq!(rig.set_freq(VFO_MEM, 7_000_000.0), Err(Status::EVFO));
    }

    #[test]
    fn injected_status_fails_one_call() {
        let backend = SimBackend::new();
        let mut rig = open_rig(&backend, MODEL_DUMMY);
        backend.panel(0).unwrap().fail_next(Status::ETIMEOUT);
        assert_eq!(rig.get_freq(VFO_CURR), Err(Status::ETIMEOUT));
        assert!(rig.get_freq(VFO_CURR).is_ok());
    }

    #[test]
    fn injected_open_failure() {
        let backend = SimBackend::new();
        let mut rig = backend.init(MODEL_DUMMY).unwrap();
        let panel = backend.panel(0).unwrap();
        panel.fail_open(Some(Status::EIO));
        assert_eq!(rig.open(), Err(Status::EIO));
        assert!(!panel.snapshot().open);
        panel.fail_open(None);
        assert!(rig.open().is_ok());
    }

    #[test]
    fn level_defaults_and_storage() {
        let backend = SimBackend::new();
        let mut rig = open_rig(&backend, MODEL_DUMMY);
        assert_eq!(rig.get_level(VFO_CURR, LEVEL_KEYSPD).unwrap(), LevelValue::Int(5));
        assert_eq!(rig.get_level(VFO_CURR, LEVEL_AF).unwrap(), LevelValue::Float(0.0));
        assert_eq!(rig.get_strength(VFO_CURR).unwrap(), -20);
        rig.set_level(VFO_CURR, LEVEL_AF, LevelValue::Float(0.25)).unwrap();
        assert_eq!(rig.get_level(VFO_CURR, LEVEL_AF).unwrap(), LevelValue::Float(0.25));
        assert_eq!(
            rig.set_level(VFO_CURR, LEVEL_STRENGTH, LevelValue::Int(0)),
            Err(Status::EINVAL)
        );
    }

    #[test]
    fn vfo_operations() {
        let backend = SimBackend::new();
        let mut rig = open_rig(&backend, MODEL_DUMMY);
        rig.vfo_op(VFO_CURR, OP_XCHG).unwrap();
        assert_eq!(rig.get_freq(VFO_A).unwrap(), 7_074_000.0);
        assert_eq!(rig.get_freq(VFO_B).unwrap(), 14_074_000.0);
        rig.vfo_op(VFO_CURR, OP_TOGGLE).unwrap();
        assert_eq!(rig.get_vfo().unwrap(), VFO_B);
    }

    #[test]
    fn network_model_has_no_callbacks() {
        let backend = SimBackend::new();
        let mut rig = backend.init(MODEL_NETRIGCTL).unwrap();
        assert_eq!(rig.set_freq_callback(None), Err(Status::ENIMPL));
    }

    #[test]
    fn dropping_rig_marks_it_released() {
        let backend = SimBackend::new();
        let rig = backend.init(MODEL_DUMMY).unwrap();
        let panel = backend.panel(0).unwrap();
        assert!(!panel.is_released());
        drop(rig);
        assert!(panel.is_released());
    }

    #[test]
    fn latency_is_applied_per_call() {
        let backend = SimBackend::with_latency(Duration::from_millis(20));
        let mut rig = open_rig(&backend, MODEL_DUMMY);
        let start = Instant::now();
        rig.get_freq(VFO_CURR).unwrap();
        assert!(start.elapsed() >= Duration::from_millis(20));
        let record = backend.log().records()[1].clone();
        assert!(record.end - record.start >= Duration::from_millis(20));
    }

    #[test]
    fn debug_levels_are_recorded() {
        let backend = SimBackend::new();
        backend.set_debug_level(DebugLevel::Warn);
        assert_eq!(backend.debug_levels(), [DebugLevel::Warn]);
    }
}
