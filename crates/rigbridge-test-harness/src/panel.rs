//! Front panel of a simulated rig.
//!
//! A [`SimPanel`] plays the operator: turning the dial or keying the
//! transmitter updates the rig state and, while the rig is open, fires the
//! driver callbacks from the rig's own monitor thread, exactly as a real
//! driver reports transceive changes. The panel is also where tests inject
//! faults and inspect state.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use rigbridge_core::Status;
use rigbridge_core::native::{PTT_OFF, PTT_ON, VfoBits};

use crate::sim_driver::{Fault, RigShared, SimState};

pub(crate) enum PanelAction {
    Dial { vfo: VfoBits, freq_hz: u64 },
    Ptt(bool),
    Flush(oneshot::Sender<()>),
}

/// Operator controls and test hooks for one simulated rig.
#[derive(Clone)]
pub struct SimPanel {
    shared: Arc<RigShared>,
    monitor: mpsc::UnboundedSender<PanelAction>,
}

impl SimPanel {
    pub(crate) fn new(shared: Arc<RigShared>, monitor: mpsc::UnboundedSender<PanelAction>) -> Self {
        SimPanel { shared, monitor }
    }

    /// Index of the rig in creation order; matches [`crate::CallRecord::rig`].
    pub fn index(&self) -> usize {
        self.shared.index
    }

    /// Turn the tuning dial of `vfo` to `freq_hz`.
    pub fn turn_dial(&self, vfo: VfoBits, freq_hz: u64) {
        let _ = self.monitor.send(PanelAction::Dial { vfo, freq_hz });
    }

    /// Key or unkey the transmitter from the front panel.
    pub fn key_ptt(&self, on: bool) {
        let _ = self.monitor.send(PanelAction::Ptt(on));
    }

    /// Wait until every panel action sent so far has been processed.
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        if self.monitor.send(PanelAction::Flush(tx)).is_ok() {
            let _ = rx.await;
        }
    }

    /// Set the received signal strength, in dB relative to S9.
    pub fn set_strength(&self, db: i32) {
        self.shared.state.lock().strength = db;
    }

    /// Set the squelch (DCD) state.
    pub fn set_dcd(&self, open: bool) {
        self.shared.state.lock().dcd = u32::from(open);
    }

    /// Change the per-call latency of this rig.
    pub fn set_latency(&self, latency: Duration) {
        *self.shared.latency.lock() = latency;
    }

    /// Fail the next I/O call with `status`.
    pub fn fail_next(&self, status: Status) {
        self.shared.faults.lock().next = Some(Fault::Status(status));
    }

    /// Make the next I/O call panic.
    pub fn panic_next(&self) {
        self.shared.faults.lock().next = Some(Fault::Panic);
    }

    /// Fail every `open` with `status` until cleared with `None`.
    pub fn fail_open(&self, status: Option<Status>) {
        self.shared.faults.lock().fail_open = status;
    }

    /// Copy of the current rig state.
    pub fn snapshot(&self) -> SimState {
        self.shared.state.lock().clone()
    }

    /// Whether transceive callbacks are currently registered.
    pub fn callbacks_registered(&self) -> bool {
        let callbacks = self.shared.callbacks.lock();
        callbacks.freq.is_some() && callbacks.ptt.is_some()
    }

    /// Whether the driver connection has been dropped.
    pub fn is_released(&self) -> bool {
        self.shared.released.load(Ordering::Acquire)
    }
}

/// Start the monitor thread of one rig and return its action queue.
pub(crate) fn spawn_monitor(shared: Arc<RigShared>) -> mpsc::UnboundedSender<PanelAction> {
    let (tx, rx) = mpsc::unbounded_channel();
    let name = format!("sim-rig-{}", shared.index);
    if let Err(e) = std::thread::Builder::new()
        .name(name)
        .spawn(move || monitor_loop(shared, rx))
    {
        warn!("failed to start simulated rig monitor: {e}");
    }
    tx
}

fn monitor_loop(shared: Arc<RigShared>, mut rx: mpsc::UnboundedReceiver<PanelAction>) {
    while let Some(action) = rx.blocking_recv() {
        match action {
            PanelAction::Dial { vfo, freq_hz } => {
                let (vfo, open) = {
                    let mut state = shared.state.lock();
                    let vfo = state.resolve(vfo);
                    state.freqs.insert(vfo, freq_hz as f64);
                    (vfo, state.open)
                };
                // Clone out so the callback runs without holding any lock.
                let callback = shared.callbacks.lock().freq.clone();
                if let (true, Some(callback)) = (open, callback) {
                    debug!(rig = shared.index, vfo, freq_hz, "panel frequency change");
                    callback(vfo, freq_hz as f64);
                }
            }
            PanelAction::Ptt(on) => {
                let ptt = if on { PTT_ON } else { PTT_OFF };
                let (vfo, open) = {
                    let mut state = shared.state.lock();
                    state.ptt = ptt;
                    (state.curr_vfo, state.open)
                };
                let callback = shared.callbacks.lock().ptt.clone();
                if let (true, Some(callback)) = (open, callback) {
                    debug!(rig = shared.index, vfo, on, "panel ptt change");
                    callback(vfo, ptt);
                }
            }
            PanelAction::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
}
