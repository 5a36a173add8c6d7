//! Event relay from driver callbacks to the host runtime.
//!
//! Driver callbacks run on a driver-owned thread. They capture only a
//! [`Weak`] reference to [`RelayShared`], check its liveness flag under a
//! read gate, and push a sanitized [`RigEvent`] into an unbounded channel.
//! A pump task on the host runtime drains that channel into a broadcast
//! channel and any registered observers.
//!
//! Teardown clears the liveness flag first, then takes the gate for writing,
//! which waits out every callback that already passed the check.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use rigbridge_core::events::RigEvent;
use rigbridge_core::native::{PTT_OFF, VfoBits};
use rigbridge_core::{FreqCallback, PttCallback};

use crate::translate::{Translator, vfo_name};

/// Host-side event observer.
pub type EventObserver = Arc<dyn Fn(&RigEvent) + Send + Sync>;

/// State shared between the handle and the driver callbacks.
pub(crate) struct RelayShared {
    active: AtomicBool,
    gate: RwLock<()>,
    tx: mpsc::UnboundedSender<RigEvent>,
}

impl RelayShared {
    fn deliver(&self, event: RigEvent) {
        let _inflight = self.gate.read();
        if !self.active.load(Ordering::Acquire) {
            return;
        }
        let _ = self.tx.send(event);
    }

    /// Stop accepting callbacks. Callbacks already inside the gate still
    /// deliver.
    pub(crate) fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }

    /// Block until no callback is inside the gate. Call only from a worker
    /// thread.
    pub(crate) fn quiesce(&self) {
        drop(self.gate.write());
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Occupy the gate the way a callback in progress does.
    #[cfg(test)]
    pub(crate) fn enter_gate(&self) -> parking_lot::RwLockReadGuard<'_, ()> {
        self.gate.read()
    }
}

/// Build the pair of driver callbacks for `shared`.
///
/// The callbacks never keep the relay alive; once the relay is gone they
/// return without doing anything.
pub(crate) fn driver_callbacks(shared: &Arc<RelayShared>) -> (FreqCallback, PttCallback) {
    let weak: Weak<RelayShared> = Arc::downgrade(shared);
    let on_freq: FreqCallback = Arc::new(move |vfo: VfoBits, freq: f64| {
        if let Some(shared) = weak.upgrade() {
            shared.deliver(RigEvent::Frequency {
                vfo: vfo_name(vfo).to_string(),
                freq_hz: Translator::frequency_from_native(freq),
            });
        }
    });

    let weak: Weak<RelayShared> = Arc::downgrade(shared);
    let on_ptt: PttCallback = Arc::new(move |vfo: VfoBits, ptt: u32| {
        if let Some(shared) = weak.upgrade() {
            shared.deliver(RigEvent::Ptt {
                vfo: vfo_name(vfo).to_string(),
                on: ptt != PTT_OFF,
            });
        }
    });

    (on_freq, on_ptt)
}

/// Per-handle relay: shared callback state plus the host-side pump.
pub(crate) struct Relay {
    shared: Arc<RelayShared>,
    event_tx: broadcast::Sender<RigEvent>,
    observers: Arc<Mutex<Vec<EventObserver>>>,
    pump: JoinHandle<()>,
}

impl Relay {
    /// Create the relay and spawn its pump on the current runtime.
    pub(crate) fn spawn(capacity: usize) -> Relay {
        let (tx, rx) = mpsc::unbounded_channel();
        let (event_tx, _) = broadcast::channel(capacity);
        let observers: Arc<Mutex<Vec<EventObserver>>> = Arc::new(Mutex::new(Vec::new()));

        let shared = Arc::new(RelayShared {
            active: AtomicBool::new(true),
            gate: RwLock::new(()),
            tx,
        });

        let pump = tokio::spawn(pump(rx, event_tx.clone(), Arc::clone(&observers)));

        Relay {
            shared,
            event_tx,
            observers,
            pump,
        }
    }

    pub(crate) fn shared(&self) -> &Arc<RelayShared> {
        &self.shared
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<RigEvent> {
        self.event_tx.subscribe()
    }

    pub(crate) fn add_observer(&self, observer: EventObserver) {
        self.observers.lock().push(observer);
    }
}

impl Drop for Relay {
    fn drop(&mut self) {
        self.shared.deactivate();
        self.pump.abort();
    }
}

async fn pump(
    mut rx: mpsc::UnboundedReceiver<RigEvent>,
    event_tx: broadcast::Sender<RigEvent>,
    observers: Arc<Mutex<Vec<EventObserver>>>,
) {
    while let Some(event) = rx.recv().await {
        debug!(kind = event.kind(), "relaying rig event");
        // No subscribers is not an error.
        let _ = event_tx.send(event.clone());

        let snapshot: Vec<EventObserver> = observers.lock().clone();
        for observer in snapshot {
            if catch_unwind(AssertUnwindSafe(|| observer(&event))).is_err() {
                warn!(kind = event.kind(), "event observer panicked; event dropped");
            }
        }
    }
    debug!("event relay stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use rigbridge_core::native::{VFO_A, VFO_CURR};

    async fn recv(rx: &mut broadcast::Receiver<RigEvent>) -> RigEvent {
        tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("event timed out")
            .expect("relay closed")
    }

    #[tokio::test]
    async fn callbacks_reach_subscribers() {
        let relay = Relay::spawn(16);
        let mut rx = relay.subscribe();
        let (on_freq, on_ptt) = driver_callbacks(relay.shared());

        std::thread::spawn(move || {
            on_freq(VFO_A, 14_074_000.0);
            on_ptt(VFO_CURR, 1);
        })
        .join()
        .unwrap();

        assert_eq!(
            recv(&mut rx).await,
            RigEvent::Frequency {
                vfo: "VFOA".into(),
                freq_hz: 14_074_000
            }
        );
        assert_eq!(
            recv(&mut rx).await,
            RigEvent::Ptt {
                vfo: "currVFO".into(),
                on: true
            }
        );
    }

    #[tokio::test]
    async fn unknown_vfo_is_named_unknown() {
        let relay = Relay::spawn(16);
        let mut rx = relay.subscribe();
        let (on_freq, _) = driver_callbacks(relay.shared());
        on_freq(1 << 15, 7_000_000.0);
        match recv(&mut rx).await {
            RigEvent::Frequency { vfo, .. } => assert_eq!(vfo, "UNKNOWN"),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn deactivated_relay_drops_callbacks() {
        let relay = Relay::spawn(16);
        let mut rx = relay.subscribe();
        let (on_freq, _) = driver_callbacks(relay.shared());

        relay.shared().deactivate();
        relay.shared().quiesce();
        on_freq(VFO_A, 7_000_000.0);

        let res = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
        assert!(res.is_err(), "no event expected after deactivation");
        assert!(!relay.shared().is_active());
    }

    #[tokio::test]
    async fn callbacks_outliving_relay_are_inert() {
        let relay = Relay::spawn(16);
        let (on_freq, on_ptt) = driver_callbacks(relay.shared());
        drop(relay);
        on_freq(VFO_A, 7_000_000.0);
        on_ptt(VFO_A, 0);
    }

    #[tokio::test]
    async fn observer_panic_does_not_stop_pump() {
        let relay = Relay::spawn(16);
        let mut rx = relay.subscribe();
        let seen = Arc::new(AtomicUsize::new(0));

        relay.add_observer(Arc::new(|_event: &RigEvent| panic!("observer failure")));
        let counter = Arc::clone(&seen);
        relay.add_observer(Arc::new(move |_event: &RigEvent| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        let (_, on_ptt) = driver_callbacks(relay.shared());
        on_ptt(VFO_A, 1);
        on_ptt(VFO_A, 0);
        recv(&mut rx).await;
        recv(&mut rx).await;

        // Observers run after the broadcast; give the pump a moment.
        for _ in 0..50 {
            if seen.load(Ordering::SeqCst) == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }
}
