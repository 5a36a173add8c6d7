//! RigHandle -- the host-facing handle for one rig.
//!
//! Every operation translates its symbolic arguments on the caller's
//! thread, queues one request on the handle's lane and returns a
//! [`Completion`]. Argument errors, [`Error::NotOpen`] and
//! [`Error::HandleDestroyed`] are decided before anything is queued, so the
//! returned completion is already settled and no driver call is made.
//!
//! Requests are queued eagerly, in call order. Awaiting the completions in
//! a different order does not change the order the driver sees.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use rigbridge::{Bridge, RigHandleBuilder};
//! use rigbridge_test_harness::SimBackend;
//! use rigbridge_test_harness::models::MODEL_FT991;
//!
//! # async fn example() -> rigbridge::Result<()> {
//! let bridge = Bridge::with_defaults(Arc::new(SimBackend::new()))?;
//! let rig = RigHandleBuilder::new(MODEL_FT991)
//!     .port("/dev/ttyUSB0")
//!     .build(&bridge)
//!     .await?;
//!
//! rig.open().await?;
//! rig.set_frequency(144_390_000, None).await?;
//! rig.set_mode("FM", None).await?;
//! println!("{} Hz", rig.get_frequency(None).await?);
//! rig.destroy().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::broadcast;
use tracing::debug;

use rigbridge_core::RigCaps;
use rigbridge_core::error::{Error, Result};
use rigbridge_core::events::RigEvent;
use rigbridge_core::native::*;
use rigbridge_core::types::{
    ChannelData, HandleInfo, HandleState, ModeReading, ModelId, SplitStatus, TransportKind,
};

use crate::completion::Completion;
use crate::dispatcher::{Command, Lane, SharedState};
use crate::operation::{Operation, Reply};
use crate::relay::{EventObserver, Relay};
use crate::translate::{
    DCD_TYPES, POWER_STATES, PTT_TYPES, REPEATER_SHIFTS, Translator, UNKNOWN, mode_name, vfo_name,
};

/// Everything the builder hands over to a new handle.
pub(crate) struct HandleParts {
    pub transport: TransportKind,
    pub port: String,
    pub requested_model: ModelId,
    pub effective_model: ModelId,
    pub translator: Translator,
    pub state: SharedState,
    pub relay: Relay,
    pub lane: Lane,
}

/// Async handle to one rig.
///
/// Created by [`RigHandleBuilder`](crate::RigHandleBuilder). Dropping a
/// handle without calling [`destroy`](RigHandle::destroy) still releases the
/// driver, in the background.
pub struct RigHandle {
    transport: TransportKind,
    port: String,
    requested_model: ModelId,
    effective_model: ModelId,
    translator: Translator,
    state: SharedState,
    /// Set by the first `destroy`; rejects everything afterwards.
    destroying: AtomicBool,
    relay: Relay,
    lane: Lane,
}

impl RigHandle {
    pub(crate) fn new(parts: HandleParts) -> Self {
        RigHandle {
            transport: parts.transport,
            port: parts.port,
            requested_model: parts.requested_model,
            effective_model: parts.effective_model,
            translator: parts.translator,
            state: parts.state,
            destroying: AtomicBool::new(false),
            relay: parts.relay,
            lane: parts.lane,
        }
    }

    // -----------------------------------------------------------------------
    // Dispatch helpers
    // -----------------------------------------------------------------------

    fn check_open(&self) -> Result<()> {
        if self.destroying.load(Ordering::Acquire) {
            return Err(Error::HandleDestroyed);
        }
        match self.state.get() {
            HandleState::Open => Ok(()),
            HandleState::Destroyed => Err(Error::HandleDestroyed),
            HandleState::Uninitialized | HandleState::Closed => Err(Error::NotOpen),
        }
    }

    /// Queue `op` (built on the caller's thread) and convert its reply.
    fn dispatch<T, B, M>(&self, build: B, map: M) -> Completion<T>
    where
        B: FnOnce(&Translator) -> Result<Operation>,
        M: FnOnce(Reply) -> Result<T> + Send + 'static,
    {
        if let Err(e) = self.check_open() {
            return Completion::err(e);
        }
        let op = match build(&self.translator) {
            Ok(op) => op,
            Err(e) => return Completion::err(e),
        };
        debug!(port = %self.port, op = op.name(), "queued");
        Completion::pending(self.lane.submit(Command::Call(op)), map)
    }

    fn set<B>(&self, build: B) -> Completion<()>
    where
        B: FnOnce(&Translator) -> Result<Operation>,
    {
        self.dispatch(build, Reply::into_unit)
    }

    // -----------------------------------------------------------------------
    // Connection
    // -----------------------------------------------------------------------

    /// Connect to the rig.
    ///
    /// Resolves immediately, without a driver call, when already open.
    pub fn open(&self) -> Completion<()> {
        if self.destroying.load(Ordering::Acquire) {
            return Completion::err(Error::HandleDestroyed);
        }
        match self.state.get() {
            HandleState::Open => Completion::ready(Ok(())),
            HandleState::Destroyed => Completion::err(Error::HandleDestroyed),
            HandleState::Uninitialized | HandleState::Closed => {
                Completion::pending(self.lane.submit(Command::Open), Reply::into_unit)
            }
        }
    }

    /// Disconnect from the rig. The handle can be reopened.
    pub fn close(&self) -> Completion<()> {
        if let Err(e) = self.check_open() {
            return Completion::err(e);
        }
        Completion::pending(self.lane.submit(Command::Close), Reply::into_unit)
    }

    /// Release the driver for good.
    ///
    /// Stops event delivery immediately, then, after every request already
    /// queued has settled, closes the connection if open and releases the
    /// driver. Later calls fail with [`Error::HandleDestroyed`].
    pub fn destroy(&self) -> Completion<()> {
        if self.destroying.swap(true, Ordering::AcqRel) {
            return Completion::err(Error::HandleDestroyed);
        }
        self.relay.shared().deactivate();
        debug!(port = %self.port, "destroy requested");
        Completion::pending(self.lane.submit(Command::Teardown), Reply::into_unit)
    }

    /// Identity and current state; never touches the driver.
    pub fn describe(&self) -> HandleInfo {
        HandleInfo {
            transport: self.transport,
            port: self.port.clone(),
            requested_model: self.requested_model,
            effective_model: self.effective_model,
            model_name: self.translator.caps().model_name,
            state: self.state(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.state.get() == HandleState::Open
    }

    pub fn state(&self) -> HandleState {
        self.state.get()
    }

    /// Capability record of the model in use.
    pub fn caps(&self) -> &RigCaps {
        self.translator.caps()
    }

    /// Name tables and validators bound to this handle's model.
    pub fn translator(&self) -> &Translator {
        &self.translator
    }

    /// Whether the lane has exited after teardown.
    pub fn is_released(&self) -> bool {
        self.lane.is_finished()
    }

    // -----------------------------------------------------------------------
    // Tuning
    // -----------------------------------------------------------------------

    /// Tune `vfo` (current VFO when `None`) to `hz`.
    pub fn set_frequency(&self, hz: u64, vfo: Option<&str>) -> Completion<()> {
        self.set(|t| {
            Ok(Operation::SetFreq {
                vfo: t.vfo(vfo)?,
                freq: t.frequency(hz)?,
            })
        })
    }

    pub fn get_frequency(&self, vfo: Option<&str>) -> Completion<u64> {
        self.dispatch(
            |t| Ok(Operation::GetFreq { vfo: t.vfo(vfo)? }),
            |r| r.into_freq().map(Translator::frequency_from_native),
        )
    }

    /// Set the mode of the current VFO.
    ///
    /// `bandwidth` is `narrow`, `normal` or `wide`; `None` selects the
    /// driver's normal passband for the mode.
    pub fn set_mode(&self, mode: &str, bandwidth: Option<&str>) -> Completion<()> {
        self.set(|t| {
            let mode = t.mode(mode)?;
            Ok(Operation::SetMode {
                vfo: VFO_CURR,
                mode,
                width: t.passband(mode, bandwidth)?,
            })
        })
    }

    pub fn get_mode(&self) -> Completion<ModeReading> {
        self.dispatch(
            |_| Ok(Operation::GetMode { vfo: VFO_CURR }),
            |r| r.into_mode().map(mode_reading),
        )
    }

    pub fn set_vfo(&self, vfo: &str) -> Completion<()> {
        self.set(|t| Ok(Operation::SetVfo { vfo: t.named_vfo(vfo)? }))
    }

    pub fn get_vfo(&self) -> Completion<String> {
        self.dispatch(
            |_| Ok(Operation::GetVfo),
            |r| r.into_u32().map(|v| vfo_name(v).to_string()),
        )
    }

    // -----------------------------------------------------------------------
    // Transmit and receive status
    // -----------------------------------------------------------------------

    pub fn set_ptt(&self, on: bool) -> Completion<()> {
        self.set(|_| {
            Ok(Operation::SetPtt {
                vfo: VFO_CURR,
                ptt: if on { PTT_ON } else { PTT_OFF },
            })
        })
    }

    pub fn get_ptt(&self) -> Completion<bool> {
        self.dispatch(
            |_| Ok(Operation::GetPtt { vfo: VFO_CURR }),
            |r| r.into_u32().map(|p| p != PTT_OFF),
        )
    }

    /// Squelch state: `true` when the squelch is open.
    pub fn get_dcd(&self) -> Completion<bool> {
        self.dispatch(
            |_| Ok(Operation::GetDcd { vfo: VFO_CURR }),
            |r| r.into_u32().map(|d| d != DCD_OFF),
        )
    }

    /// Signal strength in dB relative to S9.
    pub fn get_strength(&self) -> Completion<i32> {
        self.dispatch(
            |_| Ok(Operation::GetStrength { vfo: VFO_CURR }),
            Reply::into_i32,
        )
    }

    // -----------------------------------------------------------------------
    // Memory channels
    // -----------------------------------------------------------------------

    pub fn set_memory_channel(&self, number: i32, data: &ChannelData) -> Completion<()> {
        self.set(|t| {
            Ok(Operation::SetChannel {
                vfo: VFO_MEM,
                channel: Box::new(t.channel(number, data)?),
            })
        })
    }

    pub fn get_memory_channel(&self, number: i32, read_only: bool) -> Completion<ChannelData> {
        self.dispatch(
            |t| {
                Ok(Operation::GetChannel {
                    vfo: VFO_MEM,
                    number: t.channel_number(number)?,
                    read_only,
                })
            },
            |r| r.into_channel().map(|c| Translator::channel_from_native(&c)),
        )
    }

    /// Recall memory channel `number`.
    pub fn select_memory_channel(&self, number: i32) -> Completion<()> {
        self.set(|t| {
            Ok(Operation::SetMem {
                vfo: VFO_CURR,
                number: t.channel_number(number)?,
            })
        })
    }

    // -----------------------------------------------------------------------
    // RIT / XIT
    // -----------------------------------------------------------------------

    pub fn set_rit(&self, offset_hz: i32) -> Completion<()> {
        self.set(|t| {
            Ok(Operation::SetRit {
                vfo: VFO_CURR,
                offset: t.rit(offset_hz)?,
            })
        })
    }

    pub fn get_rit(&self) -> Completion<i32> {
        self.dispatch(|_| Ok(Operation::GetRit { vfo: VFO_CURR }), Reply::into_i32)
    }

    pub fn set_xit(&self, offset_hz: i32) -> Completion<()> {
        self.set(|t| {
            Ok(Operation::SetXit {
                vfo: VFO_CURR,
                offset: t.xit(offset_hz)?,
            })
        })
    }

    pub fn get_xit(&self) -> Completion<i32> {
        self.dispatch(|_| Ok(Operation::GetXit { vfo: VFO_CURR }), Reply::into_i32)
    }

    /// Zero both offsets in one queued request.
    pub fn clear_rit_xit(&self) -> Completion<()> {
        self.set(|_| Ok(Operation::ClearRitXit { vfo: VFO_CURR }))
    }

    // -----------------------------------------------------------------------
    // Scanning
    // -----------------------------------------------------------------------

    pub fn start_scan(&self, scan_type: &str, channel: Option<i32>) -> Completion<()> {
        self.set(|t| {
            let scan = t.scan(scan_type)?;
            let channel = channel.map(|n| t.channel_number(n)).transpose()?;
            Ok(Operation::Scan {
                vfo: VFO_CURR,
                scan,
                channel: channel.unwrap_or(0),
            })
        })
    }

    pub fn stop_scan(&self) -> Completion<()> {
        self.set(|_| {
            Ok(Operation::Scan {
                vfo: VFO_CURR,
                scan: SCAN_STOP,
                channel: 0,
            })
        })
    }

    // -----------------------------------------------------------------------
    // Levels and functions
    // -----------------------------------------------------------------------

    /// Set a level to a normalized value in `0.0..=1.0`.
    pub fn set_level(&self, name: &str, value: f64) -> Completion<()> {
        self.set(|t| {
            let (level, value) = t.level_value(name, value)?;
            Ok(Operation::SetLevel {
                vfo: VFO_CURR,
                level,
                value,
            })
        })
    }

    /// Read a level, normalized to `0.0..=1.0`.
    pub fn get_level(&self, name: &str) -> Completion<f64> {
        let translator = self.translator.clone();
        let level = self.translator.level(name);
        let query = level.clone();
        self.dispatch(
            move |_| {
                Ok(Operation::GetLevel {
                    vfo: VFO_CURR,
                    level: query?,
                })
            },
            move |r| {
                let level = level?;
                r.into_level().map(|v| translator.level_from_native(level, v))
            },
        )
    }

    /// Level names the model can read.
    pub fn get_supported_levels(&self) -> Completion<Vec<String>> {
        self.caps_query(Translator::supported_levels)
    }

    pub fn set_function(&self, name: &str, on: bool) -> Completion<()> {
        self.set(|t| {
            Ok(Operation::SetFunc {
                vfo: VFO_CURR,
                func: t.settable_function(name)?,
                on,
            })
        })
    }

    pub fn get_function(&self, name: &str) -> Completion<bool> {
        self.dispatch(
            |t| {
                Ok(Operation::GetFunc {
                    vfo: VFO_CURR,
                    func: t.function(name)?,
                })
            },
            Reply::into_bool,
        )
    }

    /// Function names the model can read.
    pub fn get_supported_functions(&self) -> Completion<Vec<String>> {
        self.caps_query(Translator::supported_functions)
    }

    /// Answer from the capability record without queuing anything.
    fn caps_query<T>(&self, f: impl FnOnce(&Translator) -> T) -> Completion<T> {
        match self.check_open() {
            Ok(()) => Completion::ready(Ok(f(&self.translator))),
            Err(e) => Completion::err(e),
        }
    }

    // -----------------------------------------------------------------------
    // Split operation
    // -----------------------------------------------------------------------

    pub fn set_split_freq(&self, hz: u64) -> Completion<()> {
        self.set(|t| {
            Ok(Operation::SetSplitFreq {
                vfo: VFO_CURR,
                freq: t.frequency(hz)?,
            })
        })
    }

    pub fn get_split_freq(&self) -> Completion<u64> {
        self.dispatch(
            |_| Ok(Operation::GetSplitFreq { vfo: VFO_CURR }),
            |r| r.into_freq().map(Translator::frequency_from_native),
        )
    }

    pub fn set_split_mode(&self, mode: &str, bandwidth: Option<&str>) -> Completion<()> {
        self.set(|t| {
            let mode = t.mode(mode)?;
            Ok(Operation::SetSplitMode {
                vfo: VFO_CURR,
                mode,
                width: t.passband(mode, bandwidth)?,
            })
        })
    }

    pub fn get_split_mode(&self) -> Completion<ModeReading> {
        self.dispatch(
            |_| Ok(Operation::GetSplitMode { vfo: VFO_CURR }),
            |r| r.into_mode().map(mode_reading),
        )
    }

    /// Enable or disable split. The transmit VFO defaults to `VFOB`, or
    /// `Sub` on models without a second VFO.
    pub fn set_split(&self, enable: bool, tx_vfo: Option<&str>) -> Completion<()> {
        self.set(|t| {
            let tx_vfo = match tx_vfo {
                Some(name) => t.named_vfo(name)?,
                None => default_tx_vfo(t.caps()),
            };
            Ok(Operation::SetSplitVfo {
                vfo: VFO_CURR,
                split: enable,
                tx_vfo,
            })
        })
    }

    pub fn get_split_status(&self) -> Completion<SplitStatus> {
        self.dispatch(
            |_| Ok(Operation::GetSplitVfo { vfo: VFO_CURR }),
            |r| {
                r.into_split().map(|(enabled, tx)| SplitStatus {
                    enabled,
                    tx_vfo: vfo_name(tx).to_string(),
                })
            },
        )
    }

    // -----------------------------------------------------------------------
    // Miscellaneous controls
    // -----------------------------------------------------------------------

    /// Run a VFO operation such as `CPY`, `XCHG` or `TOGGLE`.
    pub fn vfo_operation(&self, op: &str) -> Completion<()> {
        self.set(|t| {
            Ok(Operation::VfoOp {
                vfo: VFO_CURR,
                op: t.vfo_op(op)?,
            })
        })
    }

    pub fn set_antenna(&self, antenna: u32) -> Completion<()> {
        self.set(|t| {
            Ok(Operation::SetAnt {
                vfo: VFO_CURR,
                ant: t.antenna(antenna)?,
            })
        })
    }

    pub fn get_antenna(&self) -> Completion<u32> {
        self.dispatch(|_| Ok(Operation::GetAnt { vfo: VFO_CURR }), Reply::into_u32)
    }

    pub fn set_power_state(&self, state: &str) -> Completion<()> {
        self.set(|t| {
            Ok(Operation::SetPowerstat {
                status: t.power_state(state)?,
            })
        })
    }

    pub fn get_power_state(&self) -> Completion<String> {
        self.dispatch(
            |_| Ok(Operation::GetPowerstat),
            |r| r.into_u32().map(|v| named(POWER_STATES.name(v))),
        )
    }

    pub fn set_repeater_shift(&self, shift: &str) -> Completion<()> {
        self.set(|t| {
            Ok(Operation::SetRptrShift {
                vfo: VFO_CURR,
                shift: t.repeater_shift(shift)?,
            })
        })
    }

    pub fn get_repeater_shift(&self) -> Completion<String> {
        self.dispatch(
            |_| Ok(Operation::GetRptrShift { vfo: VFO_CURR }),
            |r| r.into_u32().map(|v| named(REPEATER_SHIFTS.name(v))),
        )
    }

    /// Repeater offset in hertz.
    pub fn set_repeater_offset(&self, offset_hz: i32) -> Completion<()> {
        self.set(|_| {
            Ok(Operation::SetRptrOffs {
                vfo: VFO_CURR,
                offset: offset_hz,
            })
        })
    }

    pub fn get_repeater_offset(&self) -> Completion<i32> {
        self.dispatch(
            |_| Ok(Operation::GetRptrOffs { vfo: VFO_CURR }),
            Reply::into_i32,
        )
    }

    /// CTCSS tone in tenths of hertz (e.g. `885` for 88.5 Hz).
    pub fn set_ctcss_tone(&self, tone: u32) -> Completion<()> {
        self.set(|t| {
            Ok(Operation::SetCtcssTone {
                vfo: VFO_CURR,
                tone: t.ctcss_tone(tone)?,
            })
        })
    }

    pub fn get_ctcss_tone(&self) -> Completion<u32> {
        self.dispatch(
            |_| Ok(Operation::GetCtcssTone { vfo: VFO_CURR }),
            Reply::into_u32,
        )
    }

    pub fn set_dcs_code(&self, code: u32) -> Completion<()> {
        self.set(|t| {
            Ok(Operation::SetDcsCode {
                vfo: VFO_CURR,
                code: t.dcs_code(code)?,
            })
        })
    }

    pub fn get_dcs_code(&self) -> Completion<u32> {
        self.dispatch(
            |_| Ok(Operation::GetDcsCode { vfo: VFO_CURR }),
            Reply::into_u32,
        )
    }

    /// Change one serial parameter, e.g. `("rate", "38400")` or
    /// `("serial_parity", "Even")`.
    pub fn set_serial_config(&self, param: &str, value: &str) -> Completion<()> {
        self.set(|t| {
            let (param, value) = t.serial_config(param, value)?;
            Ok(Operation::SetSerialConfig { param, value })
        })
    }

    pub fn get_serial_config(&self, param: &str) -> Completion<String> {
        let param = self.translator.serial_param(param);
        let query = param.clone();
        self.dispatch(
            move |_| Ok(Operation::GetSerialConfig { param: query? }),
            move |r| {
                let param = param?;
                r.into_u32().map(|v| Translator::serial_value_name(param, v))
            },
        )
    }

    pub fn set_ptt_type(&self, ptt_type: &str) -> Completion<()> {
        self.set(|t| {
            Ok(Operation::SetPttType {
                ptt_type: t.ptt_type(ptt_type)?,
            })
        })
    }

    pub fn get_ptt_type(&self) -> Completion<String> {
        self.dispatch(
            |_| Ok(Operation::GetPttType),
            |r| r.into_u32().map(|v| named(PTT_TYPES.name(v))),
        )
    }

    pub fn set_dcd_type(&self, dcd_type: &str) -> Completion<()> {
        self.set(|t| {
            Ok(Operation::SetDcdType {
                dcd_type: t.dcd_type(dcd_type)?,
            })
        })
    }

    pub fn get_dcd_type(&self) -> Completion<String> {
        self.dispatch(
            |_| Ok(Operation::GetDcdType),
            |r| r.into_u32().map(|v| named(DCD_TYPES.name(v))),
        )
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    /// Receive every event relayed from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<RigEvent> {
        self.relay.subscribe()
    }

    /// Call `observer` on the host runtime for every relayed event.
    ///
    /// A panicking observer loses that one event; it stays registered.
    pub fn on_event<F>(&self, observer: F)
    where
        F: Fn(&RigEvent) + Send + Sync + 'static,
    {
        let observer: EventObserver = Arc::new(observer);
        self.relay.add_observer(observer);
    }
}

impl Drop for RigHandle {
    fn drop(&mut self) {
        if !self.destroying.load(Ordering::Acquire) {
            debug!(port = %self.port, "handle dropped without destroy, releasing in background");
        }
    }
}

impl std::fmt::Debug for RigHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RigHandle")
            .field("port", &self.port)
            .field("model", &self.translator.caps().model_name)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

fn mode_reading((mode, width): (ModeBits, i64)) -> ModeReading {
    ModeReading {
        mode: mode_name(mode).to_string(),
        width,
    }
}

fn named(name: Option<&'static str>) -> String {
    name.unwrap_or(UNKNOWN).to_string()
}

fn default_tx_vfo(caps: &RigCaps) -> VfoBits {
    [VFO_B, VFO_SUB]
        .into_iter()
        .find(|v| caps.vfos & v != 0)
        .unwrap_or(VFO_CURR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use rigbridge_test_harness::models::{MODEL_FT991, MODEL_K3};
    use rigbridge_test_harness::{SimBackend, SimPanel};

    use crate::{Bridge, RigHandleBuilder};

    async fn open_rig(model: ModelId) -> (Arc<SimBackend>, SimPanel, RigHandle) {
        let backend = Arc::new(SimBackend::new());
        let bridge = Bridge::with_defaults(backend.clone()).unwrap();
        let rig = RigHandleBuilder::new(model)
            .port("/dev/ttyUSB0")
            .build(&bridge)
            .await
            .unwrap();
        rig.open().await.unwrap();
        let panel = backend.panel(0).unwrap();
        (backend, panel, rig)
    }

    #[tokio::test]
    async fn open_twice_makes_one_driver_call() {
        let (backend, _panel, rig) = open_rig(MODEL_DUMMY).await;
        let again = rig.open();
        assert!(again.is_ready());
        again.await.unwrap();
        assert_eq!(backend.log().calls(0), ["open"]);
    }

    #[tokio::test]
    async fn tuning_round_trip() {
        let (_backend, _panel, rig) = open_rig(MODEL_FT991).await;
        rig.set_frequency(145_500_000, Some("VFOB")).await.unwrap();
        assert_eq!(rig.get_frequency(Some("VFO-B")).await.unwrap(), 145_500_000);

        rig.set_mode("CW", Some("narrow")).await.unwrap();
        let reading = rig.get_mode().await.unwrap();
        assert_eq!(reading.mode, "CW");
        assert_eq!(reading.width, 250);

        rig.set_vfo("VFOB").await.unwrap();
        assert_eq!(rig.get_vfo().await.unwrap(), "VFOB");
    }

    #[tokio::test]
    async fn transmit_and_meters() {
        let (_backend, panel, rig) = open_rig(MODEL_DUMMY).await;
        panel.set_strength(10);
        panel.set_dcd(true);
        rig.set_ptt(true).await.unwrap();
        assert!(rig.get_ptt().await.unwrap());
        assert!(rig.get_dcd().await.unwrap());
        assert_eq!(rig.get_strength().await.unwrap(), 10);
    }

    #[tokio::test]
    async fn memory_channel_round_trip() {
        let (_backend, _panel, rig) = open_rig(MODEL_DUMMY).await;
        let data = ChannelData {
            frequency: 146_520_000,
            mode: Some("FM".into()),
            width: Some(15_000),
            repeater_shift: Some("MINUS".into()),
            repeater_offset: Some(600_000),
            ctcss_tone: Some(1000),
            functions: vec!["TONE".into()],
            description: "Simplex".into(),
            ..ChannelData::default()
        };
        rig.set_memory_channel(12, &data).await.unwrap();
        let back = rig.get_memory_channel(12, true).await.unwrap();
        assert_eq!(back.frequency, 146_520_000);
        assert_eq!(back.mode.as_deref(), Some("FM"));
        assert_eq!(back.vfo.as_deref(), Some("MEM"));
        assert_eq!(back.repeater_shift.as_deref(), Some("MINUS"));
        assert_eq!(back.ctcss_tone, Some(1000));
        assert_eq!(back.functions, ["TONE"]);
        assert_eq!(back.description, "Simplex");

        rig.select_memory_channel(12).await.unwrap();
        assert!(matches!(
            rig.select_memory_channel(500).await,
            Err(Error::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn rit_xit_and_clear() {
        let (backend, _panel, rig) = open_rig(MODEL_DUMMY).await;
        rig.set_rit(-500).await.unwrap();
        rig.set_xit(250).await.unwrap();
        assert_eq!(rig.get_rit().await.unwrap(), -500);
        assert_eq!(rig.get_xit().await.unwrap(), 250);
        rig.clear_rit_xit().await.unwrap();
        assert_eq!(rig.get_rit().await.unwrap(), 0);
        assert_eq!(rig.get_xit().await.unwrap(), 0);
        assert!(backend.log().calls(0).ends_with(&["set_rit", "set_xit", "get_rit", "get_xit"]));
        assert!(matches!(rig.set_rit(20_000).await, Err(Error::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn scanning() {
        let (_backend, panel, rig) = open_rig(MODEL_DUMMY).await;
        rig.start_scan("MEM", Some(5)).await.unwrap();
        assert_eq!(panel.snapshot().scan, SCAN_MEM);
        rig.stop_scan().await.unwrap();
        assert_eq!(panel.snapshot().scan, SCAN_STOP);
        assert!(matches!(rig.start_scan("PLT", None).await, Err(Error::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn levels_and_functions() {
        let (_backend, _panel, rig) = open_rig(MODEL_DUMMY).await;
        rig.set_level("AF", 0.5).await.unwrap();
        let af = rig.get_level("AF").await.unwrap();
        assert!((af - 0.5).abs() < 1e-6);

        let levels = rig.get_supported_levels().await.unwrap();
        assert!(levels.iter().any(|l| l == "STRENGTH"));

        rig.set_function("NB", true).await.unwrap();
        assert!(rig.get_function("NB").await.unwrap());
        let funcs = rig.get_supported_functions().await.unwrap();
        assert!(funcs.iter().any(|f| f == "NB"));

        assert!(matches!(rig.get_level("BOGUS").await, Err(Error::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn split_operation() {
        let (_backend, _panel, rig) = open_rig(MODEL_DUMMY).await;
        rig.set_split_freq(14_230_000).await.unwrap();
        rig.set_split_mode("USB", None).await.unwrap();
        rig.set_split(true, None).await.unwrap();
        assert_eq!(rig.get_split_freq().await.unwrap(), 14_230_000);
        assert_eq!(rig.get_split_mode().await.unwrap().mode, "USB");
        let status = rig.get_split_status().await.unwrap();
        assert!(status.enabled);
        assert_eq!(status.tx_vfo, "VFOB");
    }

    #[tokio::test]
    async fn misc_controls() {
        let (_backend, _panel, rig) = open_rig(MODEL_DUMMY).await;
        rig.vfo_operation("XCHG").await.unwrap();
        assert_eq!(rig.get_frequency(Some("VFOA")).await.unwrap(), 7_074_000);

        rig.set_antenna(3).await.unwrap();
        assert_eq!(rig.get_antenna().await.unwrap(), 3);
        rig.set_power_state("STANDBY").await.unwrap();
        assert_eq!(rig.get_power_state().await.unwrap(), "STANDBY");
        rig.set_repeater_shift("PLUS").await.unwrap();
        assert_eq!(rig.get_repeater_shift().await.unwrap(), "PLUS");
        rig.set_repeater_offset(600_000).await.unwrap();
        assert_eq!(rig.get_repeater_offset().await.unwrap(), 600_000);
        rig.set_ctcss_tone(885).await.unwrap();
        assert_eq!(rig.get_ctcss_tone().await.unwrap(), 885);
        rig.set_dcs_code(23).await.unwrap();
        assert_eq!(rig.get_dcs_code().await.unwrap(), 23);
    }

    #[tokio::test]
    async fn serial_and_line_types() {
        let (_backend, _panel, rig) = open_rig(MODEL_DUMMY).await;
        rig.set_serial_config("rate", "38400").await.unwrap();
        assert_eq!(rig.get_serial_config("rate").await.unwrap(), "38400");
        rig.set_serial_config("serial_parity", "Odd").await.unwrap();
        assert_eq!(rig.get_serial_config("serial_parity").await.unwrap(), "Odd");
        rig.set_ptt_type("DTR").await.unwrap();
        assert_eq!(rig.get_ptt_type().await.unwrap(), "DTR");
        rig.set_dcd_type("CD").await.unwrap();
        assert_eq!(rig.get_dcd_type().await.unwrap(), "CD");
        assert!(matches!(
            rig.get_serial_config("flow").await,
            Err(Error::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn model_without_dcs_rejects_codes() {
        let (backend, _panel, rig) = open_rig(MODEL_K3).await;
        let c = rig.set_dcs_code(23);
        assert!(c.is_ready());
        assert!(matches!(c.await, Err(Error::InvalidArgument(_))));
        assert_eq!(backend.log().calls(0), ["open"]);
    }

    #[tokio::test]
    async fn driver_error_carries_code_and_text() {
        let (_backend, panel, rig) = open_rig(MODEL_DUMMY).await;
        panel.fail_next(rigbridge_core::Status::ETIMEOUT);
        let err = rig.get_frequency(None).await.unwrap_err();
        assert_eq!(
            err,
            Error::Driver {
                code: -5,
                message: "Communication timed out".into()
            }
        );
        assert!(rig.is_open());
    }

    #[tokio::test]
    async fn failed_open_leaves_state() {
        let backend = Arc::new(SimBackend::new());
        let bridge = Bridge::with_defaults(backend.clone()).unwrap();
        let rig = RigHandleBuilder::new(MODEL_DUMMY)
            .port("/dev/ttyUSB0")
            .build(&bridge)
            .await
            .unwrap();
        backend
            .panel(0)
            .unwrap()
            .fail_open(Some(rigbridge_core::Status::EIO));
        let err = rig.open().await.unwrap_err();
        assert!(matches!(err, Error::Connection { code: -6, .. }));
        assert_eq!(rig.state(), HandleState::Uninitialized);
    }

    #[tokio::test]
    async fn destroy_twice_fails() {
        let (backend, panel, rig) = open_rig(MODEL_DUMMY).await;
        rig.destroy().await.unwrap();
        assert_eq!(rig.state(), HandleState::Destroyed);
        assert_eq!(rig.destroy().await, Err(Error::HandleDestroyed));
        assert_eq!(rig.open().await, Err(Error::HandleDestroyed));
        assert_eq!(rig.get_mode().await, Err(Error::HandleDestroyed));
        assert!(panel.is_released());
        assert_eq!(backend.log().calls(0), ["open", "close"]);
    }

    #[tokio::test]
    async fn dropped_handle_releases_driver() {
        let (_backend, panel, rig) = open_rig(MODEL_DUMMY).await;
        drop(rig);
        for _ in 0..100 {
            if panel.is_released() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(panel.is_released());
        assert!(!panel.snapshot().open);
    }

    #[tokio::test]
    async fn events_reach_subscribers_and_observers() {
        let (_backend, panel, rig) = open_rig(MODEL_DUMMY).await;
        let mut rx = rig.subscribe();
        let (obs_tx, mut obs_rx) = tokio::sync::mpsc::unbounded_channel();
        rig.on_event(move |e| {
            let _ = obs_tx.send(e.clone());
        });

        panel.turn_dial(VFO_A, 14_250_000);
        panel.flush().await;

        let expected = RigEvent::Frequency {
            vfo: "VFOA".into(),
            freq_hz: 14_250_000,
        };
        let got = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(got, expected);
        let observed = tokio::time::timeout(Duration::from_secs(1), obs_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(observed, expected);
    }

    #[tokio::test]
    async fn debug_output_names_port() {
        let (_backend, _panel, rig) = open_rig(MODEL_DUMMY).await;
        let text = format!("{rig:?}");
        assert!(text.contains("/dev/ttyUSB0"));
        assert!(text.contains("Dummy"));
    }
}
