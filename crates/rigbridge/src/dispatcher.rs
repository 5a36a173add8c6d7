//! Command dispatch: per-handle lanes over a shared, bounded worker pool.
//!
//! Each handle owns one lane: a Tokio task that owns the driver and drains
//! an unbounded request queue in order. For every request the lane borrows
//! a permit from the process-wide [`WorkerPool`], moves the driver onto a
//! blocking worker for exactly one call, and takes it back when the call
//! returns. The reply travels to the caller's [`Completion`] over a
//! one-shot channel.
//!
//! [`Completion`]: crate::completion::Completion

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use tokio::sync::{Semaphore, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use rigbridge_core::error::{Error, Result};
use rigbridge_core::types::HandleState;
use rigbridge_core::{DriverBackend, DriverResult, RigDriver, Status};

use crate::operation::{Operation, Reply};
use crate::relay::{RelayShared, driver_callbacks};

// ---------------------------------------------------------------------------
// Worker pool
// ---------------------------------------------------------------------------

/// Process-wide bound on concurrently executing driver calls.
#[derive(Clone)]
pub(crate) struct WorkerPool {
    permits: Arc<Semaphore>,
    size: usize,
}

impl WorkerPool {
    pub(crate) fn new(size: usize) -> Self {
        WorkerPool {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    pub(crate) fn size(&self) -> usize {
        self.size
    }

    /// Permits not currently held by a running call.
    pub(crate) fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Run `f` on a blocking worker once a permit is free.
    ///
    /// Returns `None` if the worker panicked.
    pub(crate) async fn run<F, R>(&self, f: F) -> Option<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let permit = Arc::clone(&self.permits).acquire_owned().await.ok()?;
        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            f()
        })
        .await
        .ok()
    }
}

// ---------------------------------------------------------------------------
// Shared handle state
// ---------------------------------------------------------------------------

/// Handle lifecycle state, written by the lane and read anywhere.
#[derive(Clone)]
pub(crate) struct SharedState(Arc<AtomicU8>);

impl SharedState {
    pub(crate) fn new(state: HandleState) -> Self {
        SharedState(Arc::new(AtomicU8::new(state as u8)))
    }

    pub(crate) fn get(&self) -> HandleState {
        HandleState::from_u8(self.0.load(Ordering::Acquire))
    }

    fn set(&self, state: HandleState) {
        self.0.store(state as u8, Ordering::Release);
    }
}

// ---------------------------------------------------------------------------
// Lane
// ---------------------------------------------------------------------------

/// What a lane can be asked to do.
#[derive(Debug)]
pub(crate) enum Command {
    /// Connect; registers driver callbacks on success.
    Open,
    /// Deregister callbacks and disconnect.
    Close,
    /// Wait out in-flight callbacks, close if open, release the driver.
    /// The lane exits afterwards.
    Teardown,
    /// One driver call; requires the handle to be open.
    Call(Operation),
}

struct Request {
    command: Command,
    reply: oneshot::Sender<Result<Reply>>,
}

/// Handle to a lane task. Stored inside [`RigHandle`](crate::RigHandle).
pub(crate) struct Lane {
    tx: mpsc::UnboundedSender<Request>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl Lane {
    /// Queue `command` behind everything already submitted.
    ///
    /// If the lane has exited, the returned receiver resolves to a closed
    /// channel error.
    pub(crate) fn submit(&self, command: Command) -> oneshot::Receiver<Result<Reply>> {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(Request { command, reply }).is_err() {
            debug!("lane already exited, dropping request");
        }
        rx
    }

    /// Whether the lane task has finished.
    pub(crate) fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(|t| t.is_finished())
    }
}

impl Drop for Lane {
    fn drop(&mut self) {
        // The lane releases the driver on its own; it is never aborted, so a
        // blocking call in flight finishes and the driver is closed cleanly.
        self.cancel.cancel();
        self.task.take();
    }
}

/// Everything a lane needs besides the driver.
pub(crate) struct LaneContext {
    pub backend: Arc<dyn DriverBackend>,
    pub pool: WorkerPool,
    pub relay: Arc<RelayShared>,
    pub state: SharedState,
    /// Port descriptor, for diagnostics.
    pub label: String,
}

/// Spawn the lane task that owns `driver`.
pub(crate) fn spawn_lane(driver: Box<dyn RigDriver>, ctx: LaneContext) -> Lane {
    let (tx, rx) = mpsc::unbounded_channel::<Request>();
    let cancel = CancellationToken::new();
    let task = tokio::spawn(lane_loop(
        LaneWorker {
            driver: Some(driver),
            ctx,
        },
        rx,
        cancel.clone(),
    ));
    Lane {
        tx,
        cancel,
        task: Some(task),
    }
}

struct LaneWorker {
    /// `None` once a worker panicked while holding it, or after teardown.
    driver: Option<Box<dyn RigDriver>>,
    ctx: LaneContext,
}

async fn lane_loop(
    mut worker: LaneWorker,
    mut rx: mpsc::UnboundedReceiver<Request>,
    cancel: CancellationToken,
) {
    debug!(port = %worker.ctx.label, "lane started");
    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                debug!(port = %worker.ctx.label, "handle dropped, tearing down lane");
                worker.ctx.relay.deactivate();
                let _ = worker.teardown().await;
                break;
            }

            req = rx.recv() => {
                let Some(Request { command, reply }) = req else {
                    worker.ctx.relay.deactivate();
                    let _ = worker.teardown().await;
                    break;
                };
                let exit = matches!(command, Command::Teardown);
                let result = worker.process(command).await;
                let _ = reply.send(result);
                if exit {
                    break;
                }
            }
        }
    }
    debug!(port = %worker.ctx.label, "lane exited");
}

impl LaneWorker {
    async fn process(&mut self, command: Command) -> Result<Reply> {
        match command {
            Command::Open => self.open().await,
            Command::Close => self.close().await,
            Command::Teardown => self.teardown().await,
            Command::Call(op) => self.call(op).await,
        }
    }

    /// Run `f` with the driver on a blocking worker and take the driver
    /// back. `None` means the driver is gone.
    async fn with_driver<F, R>(&mut self, f: F) -> Option<R>
    where
        F: FnOnce(&mut dyn RigDriver) -> R + Send + 'static,
        R: Send + 'static,
    {
        let mut driver = self.driver.take()?;
        let (driver, out) = self
            .ctx
            .pool
            .run(move || {
                let out = f(&mut *driver);
                (driver, out)
            })
            .await?;
        self.driver = Some(driver);
        Some(out)
    }

    fn driver_lost(&self) -> Error {
        warn!(port = %self.ctx.label, "driver lost to a failed worker");
        Error::driver(
            Status::EINTERNAL,
            self.ctx.backend.error_text(Status::EINTERNAL),
        )
    }

    async fn call(&mut self, op: Operation) -> Result<Reply> {
        if self.ctx.state.get() != HandleState::Open {
            return Err(Error::NotOpen);
        }
        let name = op.name();
        debug!(port = %self.ctx.label, op = name, "dispatching");
        match self.with_driver(move |driver| op.execute(driver)).await {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(status)) => {
                debug!(port = %self.ctx.label, op = name, code = status.code(), "driver call failed");
                Err(Error::driver(status, self.ctx.backend.error_text(status)))
            }
            None => Err(self.driver_lost()),
        }
    }

    async fn open(&mut self) -> Result<Reply> {
        match self.ctx.state.get() {
            HandleState::Open => return Ok(Reply::Unit),
            HandleState::Destroyed => return Err(Error::HandleDestroyed),
            HandleState::Uninitialized | HandleState::Closed => {}
        }

        let (on_freq, on_ptt) = driver_callbacks(&self.ctx.relay);
        let label = self.ctx.label.clone();
        let outcome = self
            .with_driver(move |driver| -> DriverResult<()> {
                driver.open()?;
                // Callbacks are optional; a driver without them still opens.
                if let Err(status) = driver.set_freq_callback(Some(on_freq)) {
                    debug!(port = %label, code = status.code(), "frequency callback not registered");
                }
                if let Err(status) = driver.set_ptt_callback(Some(on_ptt)) {
                    debug!(port = %label, code = status.code(), "PTT callback not registered");
                }
                Ok(())
            })
            .await;

        match outcome {
            Some(Ok(())) => {
                self.ctx.state.set(HandleState::Open);
                debug!(port = %self.ctx.label, "rig opened");
                Ok(Reply::Unit)
            }
            Some(Err(status)) => Err(Error::connection(
                status,
                self.ctx.backend.error_text(status),
            )),
            None => Err(self.driver_lost()),
        }
    }

    async fn close(&mut self) -> Result<Reply> {
        if self.ctx.state.get() != HandleState::Open {
            return Err(Error::NotOpen);
        }
        let outcome = self
            .with_driver(|driver| {
                clear_callbacks(driver);
                driver.close()
            })
            .await;

        match outcome {
            Some(Ok(())) => {
                self.ctx.state.set(HandleState::Closed);
                debug!(port = %self.ctx.label, "rig closed");
                Ok(Reply::Unit)
            }
            Some(Err(status)) => Err(Error::connection(
                status,
                self.ctx.backend.error_text(status),
            )),
            None => Err(self.driver_lost()),
        }
    }

    async fn teardown(&mut self) -> Result<Reply> {
        let was_open = self.ctx.state.get() == HandleState::Open;
        if let Some(mut driver) = self.driver.take() {
            let relay = Arc::clone(&self.ctx.relay);
            let label = self.ctx.label.clone();
            let released = self
                .ctx
                .pool
                .run(move || {
                    relay.quiesce();
                    clear_callbacks(&mut *driver);
                    if was_open {
                        if let Err(status) = driver.close() {
                            debug!(port = %label, code = status.code(), "close during teardown failed");
                        }
                    }
                    drop(driver);
                })
                .await;
            if released.is_none() {
                warn!(port = %self.ctx.label, "worker failed while releasing driver");
            }
        } else {
            // Driver already lost; still wait out callbacks in flight.
            let relay = Arc::clone(&self.ctx.relay);
            if self.ctx.pool.run(move || relay.quiesce()).await.is_none() {
                warn!(port = %self.ctx.label, "worker failed while quiescing relay");
            }
        }
        self.ctx.state.set(HandleState::Destroyed);
        debug!(port = %self.ctx.label, "handle destroyed");
        Ok(Reply::Unit)
    }
}

fn clear_callbacks(driver: &mut dyn RigDriver) {
    let _ = driver.set_freq_callback(None);
    let _ = driver.set_ptt_callback(None);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::{Duration, Instant};

    use rigbridge_core::native::*;
    use rigbridge_core::types::ModelInfo;
    use rigbridge_core::{FreqCallback, RigCaps};

    use crate::relay::Relay;

    /// Minimal driver: sleeps on `get_freq`, panics on `get_vfo`, fails to
    /// open when asked to.
    struct TestDriver {
        caps: RigCaps,
        fail_open: bool,
        freq: f64,
        callbacks: Arc<AtomicUsize>,
    }

    impl RigDriver for TestDriver {
        fn caps(&self) -> &RigCaps {
            &self.caps
        }
        fn open(&mut self) -> DriverResult<()> {
            if self.fail_open {
                Err(Status::EIO)
            } else {
                Ok(())
            }
        }
        fn close(&mut self) -> DriverResult<()> {
            Ok(())
        }
        fn set_freq(&mut self, _vfo: VfoBits, freq: f64) -> DriverResult<()> {
            self.freq = freq;
            Ok(())
        }
        fn get_freq(&mut self, _vfo: VfoBits) -> DriverResult<f64> {
            std::thread::sleep(Duration::from_millis(50));
            Ok(self.freq)
        }
        fn get_vfo(&mut self) -> DriverResult<VfoBits> {
            panic!("driver crashed");
        }
        fn set_freq_callback(&mut self, cb: Option<FreqCallback>) -> DriverResult<()> {
            if cb.is_some() {
                self.callbacks.fetch_add(1, Ordering::SeqCst);
            }
            Ok(())
        }
    }

    struct TestBackend;

    impl DriverBackend for TestBackend {
        fn models(&self) -> Vec<ModelInfo> {
            Vec::new()
        }
        fn init(&self, _model: u32) -> Option<Box<dyn RigDriver>> {
            None
        }
    }

    fn driver(fail_open: bool) -> (Box<dyn RigDriver>, Arc<AtomicUsize>) {
        let callbacks = Arc::new(AtomicUsize::new(0));
        let d = TestDriver {
            caps: RigCaps::default(),
            fail_open,
            freq: 0.0,
            callbacks: Arc::clone(&callbacks),
        };
        (Box::new(d), callbacks)
    }

    fn lane_with(driver: Box<dyn RigDriver>, pool: WorkerPool) -> (Lane, SharedState, Relay) {
        let relay = Relay::spawn(8);
        let state = SharedState::new(HandleState::Uninitialized);
        let lane = spawn_lane(
            driver,
            LaneContext {
                backend: Arc::new(TestBackend),
                pool,
                relay: Arc::clone(relay.shared()),
                state: state.clone(),
                label: "test".into(),
            },
        );
        (lane, state, relay)
    }

    #[tokio::test]
    async fn pool_run_returns_value() {
        let pool = WorkerPool::new(2);
        assert_eq!(pool.size(), 2);
        assert_eq!(pool.run(|| 40 + 2).await, Some(42));
        assert_eq!(pool.available(), 2);
    }

    #[tokio::test]
    async fn pool_run_reports_panic() {
        let pool = WorkerPool::new(1);
        let out: Option<()> = pool.run(|| panic!("worker failure")).await;
        assert!(out.is_none());
        assert_eq!(pool.available(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn pool_bounds_concurrency() {
        let pool = WorkerPool::new(1);
        let start = Instant::now();
        let a = pool.run(|| std::thread::sleep(Duration::from_millis(60)));
        let b = pool.run(|| std::thread::sleep(Duration::from_millis(60)));
        let _ = tokio::join!(a, b);
        assert!(start.elapsed() >= Duration::from_millis(115));
    }

    #[tokio::test]
    async fn call_before_open_is_not_open() {
        let (d, _) = driver(false);
        let (lane, _, _relay) = lane_with(d, WorkerPool::new(2));
        let rx = lane.submit(Command::Call(Operation::GetFreq { vfo: VFO_CURR }));
        assert_eq!(rx.await.unwrap().unwrap_err(), Error::NotOpen);
    }

    #[tokio::test]
    async fn open_registers_callbacks_and_sets_state() {
        let (d, callbacks) = driver(false);
        let (lane, state, _relay) = lane_with(d, WorkerPool::new(2));
        lane.submit(Command::Open).await.unwrap().unwrap();
        assert_eq!(state.get(), HandleState::Open);
        assert_eq!(callbacks.load(Ordering::SeqCst), 1);

        // Second open: no driver call.
        lane.submit(Command::Open).await.unwrap().unwrap();
        assert_eq!(callbacks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_open_is_connection_error() {
        let (d, callbacks) = driver(true);
        let (lane, state, _relay) = lane_with(d, WorkerPool::new(2));
        let err = lane.submit(Command::Open).await.unwrap().unwrap_err();
        assert_eq!(err.code(), Some(Status::EIO.code()));
        assert!(matches!(err, Error::Connection { .. }));
        assert_eq!(state.get(), HandleState::Uninitialized);
        assert_eq!(callbacks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn queued_call_behind_close_is_not_open() {
        let (d, _) = driver(false);
        let (lane, state, _relay) = lane_with(d, WorkerPool::new(2));
        let open = lane.submit(Command::Open);
        let close = lane.submit(Command::Close);
        let get = lane.submit(Command::Call(Operation::GetFreq { vfo: VFO_CURR }));
        open.await.unwrap().unwrap();
        close.await.unwrap().unwrap();
        assert_eq!(get.await.unwrap().unwrap_err(), Error::NotOpen);
        assert_eq!(state.get(), HandleState::Closed);
    }

    #[tokio::test]
    async fn calls_run_in_submission_order() {
        let (d, _) = driver(false);
        let (lane, _, _relay) = lane_with(d, WorkerPool::new(4));
        lane.submit(Command::Open);
        let set_a = lane.submit(Command::Call(Operation::SetFreq {
            vfo: VFO_CURR,
            freq: 7_000_000.0,
        }));
        let get_a = lane.submit(Command::Call(Operation::GetFreq { vfo: VFO_CURR }));
        let set_b = lane.submit(Command::Call(Operation::SetFreq {
            vfo: VFO_CURR,
            freq: 14_000_000.0,
        }));
        let get_b = lane.submit(Command::Call(Operation::GetFreq { vfo: VFO_CURR }));

        // Await out of order; results still reflect submission order.
        assert_eq!(get_b.await.unwrap().unwrap(), Reply::Freq(14_000_000.0));
        assert_eq!(get_a.await.unwrap().unwrap(), Reply::Freq(7_000_000.0));
        set_a.await.unwrap().unwrap();
        set_b.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn worker_panic_loses_driver() {
        let (d, _) = driver(false);
        let (lane, _, _relay) = lane_with(d, WorkerPool::new(2));
        lane.submit(Command::Open).await.unwrap().unwrap();

        let err = lane
            .submit(Command::Call(Operation::GetVfo))
            .await
            .unwrap()
            .unwrap_err();
        assert_eq!(err.code(), Some(Status::EINTERNAL.code()));

        let later = lane
            .submit(Command::Call(Operation::GetFreq { vfo: VFO_CURR }))
            .await
            .unwrap()
            .unwrap_err();
        assert_eq!(later.code(), Some(Status::EINTERNAL.code()));
    }

    #[tokio::test]
    async fn teardown_exits_lane() {
        let (d, _) = driver(false);
        let (lane, state, relay) = lane_with(d, WorkerPool::new(2));
        lane.submit(Command::Open).await.unwrap().unwrap();
        relay.shared().deactivate();
        lane.submit(Command::Teardown).await.unwrap().unwrap();
        assert_eq!(state.get(), HandleState::Destroyed);

        // Requests after the lane exited see a closed reply channel.
        let rx = lane.submit(Command::Call(Operation::GetVfo));
        assert!(rx.await.is_err());
        for _ in 0..50 {
            if lane.is_finished() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(lane.is_finished());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn teardown_after_lost_driver_waits_for_callbacks() {
        let (d, _) = driver(false);
        let (lane, state, relay) = lane_with(d, WorkerPool::new(2));
        lane.submit(Command::Open).await.unwrap().unwrap();
        let err = lane
            .submit(Command::Call(Operation::GetVfo))
            .await
            .unwrap()
            .unwrap_err();
        assert_eq!(err.code(), Some(Status::EINTERNAL.code()));

        // A callback still running on the driver's thread.
        let shared = Arc::clone(relay.shared());
        let (entered_tx, entered_rx) = std::sync::mpsc::channel();
        let callback = std::thread::spawn(move || {
            let _inflight = shared.enter_gate();
            entered_tx.send(()).unwrap();
            std::thread::sleep(Duration::from_millis(100));
        });
        entered_rx.recv().unwrap();

        let start = Instant::now();
        relay.shared().deactivate();
        lane.submit(Command::Teardown).await.unwrap().unwrap();
        assert!(start.elapsed() >= Duration::from_millis(80));
        assert_eq!(state.get(), HandleState::Destroyed);
        callback.join().unwrap();
    }

    #[tokio::test]
    async fn dropping_lane_tears_down() {
        let (d, _) = driver(false);
        let (lane, state, _relay) = lane_with(d, WorkerPool::new(2));
        lane.submit(Command::Open).await.unwrap().unwrap();
        drop(lane);
        for _ in 0..100 {
            if state.get() == HandleState::Destroyed {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(state.get(), HandleState::Destroyed);
    }
}
