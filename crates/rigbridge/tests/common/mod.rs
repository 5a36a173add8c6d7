//! Shared setup for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use rigbridge::{Bridge, BridgeConfig, ModelId, RigHandle, RigHandleBuilder};
use rigbridge_test_harness::SimBackend;

pub struct Bench {
    pub backend: Arc<SimBackend>,
    pub bridge: Bridge,
}

impl Bench {
    pub fn new() -> Self {
        Self::with(Duration::ZERO, BridgeConfig::default())
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self::with(latency, BridgeConfig::default())
    }

    pub fn with(latency: Duration, config: BridgeConfig) -> Self {
        let backend = Arc::new(SimBackend::with_latency(latency));
        let bridge = Bridge::new(backend.clone(), config).expect("bridge");
        Bench { backend, bridge }
    }

    /// A handle that has been created but not opened.
    pub async fn handle(&self, model: ModelId) -> RigHandle {
        let port = format!("/dev/ttyUSB{}", self.backend.rig_count());
        RigHandleBuilder::new(model)
            .port(&port)
            .build(&self.bridge)
            .await
            .expect("build handle")
    }

    /// A handle that is open.
    pub async fn open(&self, model: ModelId) -> RigHandle {
        let rig = self.handle(model).await;
        rig.open().await.expect("open");
        rig
    }
}
