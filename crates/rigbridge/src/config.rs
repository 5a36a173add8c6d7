//! Process-wide bridge configuration and the [`Bridge`] context.
//!
//! A [`Bridge`] owns the driver backend and the bounded worker pool that
//! every handle's lane draws from. It is created once, applies the driver
//! debug level once, and is cheap to clone.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use rigbridge_core::DriverBackend;
use rigbridge_core::error::{Error, Result};
use rigbridge_core::types::DebugLevel;

use crate::dispatcher::WorkerPool;

/// Default number of blocking workers.
pub const DEFAULT_WORKERS: usize = 8;

/// Default per-handle event buffer.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Bridge-wide settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Upper bound on driver calls executing at the same time, across all
    /// handles.
    pub workers: usize,
    /// Driver diagnostic verbosity.
    pub debug_level: DebugLevel,
    /// Broadcast buffer per handle; slow subscribers lag past this many
    /// events.
    pub event_capacity: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            workers: DEFAULT_WORKERS,
            debug_level: DebugLevel::None,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl BridgeConfig {
    pub fn workers(mut self, n: usize) -> Self {
        self.workers = n;
        self
    }

    pub fn debug_level(mut self, level: DebugLevel) -> Self {
        self.debug_level = level;
        self
    }

    pub fn event_capacity(mut self, n: usize) -> Self {
        self.event_capacity = n;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::Config("worker pool size must be at least 1".into()));
        }
        if self.event_capacity == 0 {
            return Err(Error::Config("event capacity must be at least 1".into()));
        }
        Ok(())
    }
}

struct BridgeInner {
    backend: Arc<dyn DriverBackend>,
    pool: WorkerPool,
    config: BridgeConfig,
}

/// Shared context for every handle: driver backend plus worker pool.
#[derive(Clone)]
pub struct Bridge {
    inner: Arc<BridgeInner>,
}

impl Bridge {
    /// Create a bridge over `backend`.
    ///
    /// Validates `config` and applies its debug level to the backend.
    pub fn new(backend: Arc<dyn DriverBackend>, config: BridgeConfig) -> Result<Bridge> {
        config.validate()?;
        backend.set_debug_level(config.debug_level);
        debug!(
            workers = config.workers,
            debug_level = ?config.debug_level,
            "bridge created"
        );
        Ok(Bridge {
            inner: Arc::new(BridgeInner {
                pool: WorkerPool::new(config.workers),
                backend,
                config,
            }),
        })
    }

    /// Create a bridge with [`BridgeConfig::default`].
    pub fn with_defaults(backend: Arc<dyn DriverBackend>) -> Result<Bridge> {
        Self::new(backend, BridgeConfig::default())
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    /// Size of the worker pool.
    pub fn workers(&self) -> usize {
        self.inner.pool.size()
    }

    /// Workers not currently running a driver call.
    pub fn idle_workers(&self) -> usize {
        self.inner.pool.available()
    }

    pub(crate) fn backend(&self) -> &Arc<dyn DriverBackend> {
        &self.inner.backend
    }

    pub(crate) fn pool(&self) -> &WorkerPool {
        &self.inner.pool
    }
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rigbridge_test_harness::SimBackend;

    #[test]
    fn default_config() {
        let config = BridgeConfig::default();
        assert_eq!(config.workers, 8);
        assert_eq!(config.debug_level, DebugLevel::None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_workers_rejected() {
        let config = BridgeConfig::default().workers(0);
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn zero_event_capacity_rejected() {
        let backend = Arc::new(SimBackend::new());
        let result = Bridge::new(backend, BridgeConfig::default().event_capacity(0));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn debug_level_applied_once() {
        let backend = Arc::new(SimBackend::new());
        let bridge = Bridge::new(
            backend.clone(),
            BridgeConfig::default().workers(3).debug_level(DebugLevel::Warn),
        )
        .unwrap();
        assert_eq!(bridge.workers(), 3);
        assert_eq!(bridge.idle_workers(), 3);
        let _clone = bridge.clone();
        assert_eq!(backend.debug_levels(), [DebugLevel::Warn]);
    }
}
