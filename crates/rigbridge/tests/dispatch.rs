//! Ordering and concurrency of dispatched driver calls.

mod common;

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::task::JoinSet;

use rigbridge::BridgeConfig;
use rigbridge::native::MODEL_DUMMY;
use rigbridge_test_harness::models::{MODEL_FT991, MODEL_IC7300, MODEL_K3};

use common::Bench;

#[tokio::test]
async fn one_handle_runs_in_call_order() {
    let bench = Bench::with_latency(Duration::from_millis(5));
    let rig = bench.open(MODEL_DUMMY).await;

    let mut sets = Vec::new();
    let mut gets = Vec::new();
    for i in 0..10u64 {
        sets.push(rig.set_frequency(7_000_000 + i * 1_000, None));
        gets.push(rig.get_frequency(None));
    }

    // Awaiting out of order does not change execution order.
    for (i, get) in gets.into_iter().enumerate().rev() {
        assert_eq!(get.await.unwrap(), 7_000_000 + i as u64 * 1_000);
    }
    for set in sets {
        set.await.unwrap();
    }

    let calls = bench.backend.log().calls(0);
    assert_eq!(calls.len(), 21);
    assert_eq!(calls[0], "open");
    for pair in calls[1..].chunks(2) {
        assert_eq!(pair, ["set_freq", "get_freq"]);
    }
    assert!(!bench.backend.log().has_overlap(0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn distinct_handles_run_concurrently() {
    let bench = Bench::with_latency(Duration::from_millis(100));
    let models = [MODEL_DUMMY, MODEL_IC7300, MODEL_FT991, MODEL_K3];
    let mut rigs = Vec::new();
    for model in models {
        rigs.push(bench.open(model).await);
    }

    let started = Instant::now();
    let pending: Vec<_> = rigs.iter().map(|rig| rig.get_strength()).collect();
    for completion in pending {
        completion.await.unwrap();
    }
    let elapsed = started.elapsed();
    assert!(elapsed < Duration::from_millis(250), "took {elapsed:?}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn worker_pool_bounds_concurrency() {
    let bench = Bench::with(
        Duration::from_millis(100),
        BridgeConfig::default().workers(2),
    );
    let mut rigs = Vec::new();
    for _ in 0..4 {
        rigs.push(bench.open(MODEL_DUMMY).await);
    }

    let started = Instant::now();
    let pending: Vec<_> = rigs.iter().map(|rig| rig.get_ptt()).collect();
    for completion in pending {
        completion.await.unwrap();
    }
    assert!(started.elapsed() >= Duration::from_millis(200));
    assert_eq!(bench.bridge.idle_workers(), 2);
}

#[tokio::test]
async fn driver_failure_is_reported_with_code_and_text() {
    let bench = Bench::new();
    let rig = bench.open(MODEL_DUMMY).await;
    bench
        .backend
        .panel(0)
        .unwrap()
        .fail_next(rigbridge::Status::ETIMEOUT);

    let err = rig.get_frequency(None).await.unwrap_err();
    match err {
        rigbridge::Error::Driver { code, message } => {
            assert_eq!(code, rigbridge::Status::ETIMEOUT.code());
            assert!(!message.is_empty());
        }
        other => panic!("expected driver error, got {other:?}"),
    }

    // The lane keeps going after a failed call.
    assert_eq!(rig.get_frequency(None).await.unwrap(), 14_074_000);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn random_load_settles_every_request() {
    const RIGS: usize = 4;
    const OPS: usize = 200;
    const MODES: [&str; 4] = ["USB", "LSB", "CW", "AM"];

    let bench = Bench::with(Duration::ZERO, BridgeConfig::default().workers(3));
    let mut rigs = Vec::new();
    for _ in 0..RIGS {
        rigs.push(bench.open(MODEL_DUMMY).await);
    }

    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut last_freq = [14_074_000u64; RIGS];
    let mut set: JoinSet<rigbridge::Result<()>> = JoinSet::new();

    for _ in 0..OPS {
        let k = rng.gen_range(0..RIGS);
        let rig = &rigs[k];
        match rng.gen_range(0..7) {
            0 => {
                let hz = rng.gen_range(1_800_000..30_000_000);
                last_freq[k] = hz;
                let c = rig.set_frequency(hz, None);
                set.spawn(c);
            }
            1 => {
                let c = rig.get_frequency(None);
                set.spawn(async move { c.await.map(drop) });
            }
            2 => {
                let c = rig.set_mode(MODES[rng.gen_range(0..MODES.len())], None);
                set.spawn(c);
            }
            3 => {
                let c = rig.get_mode();
                set.spawn(async move { c.await.map(drop) });
            }
            4 => {
                let c = rig.set_ptt(rng.gen_bool(0.5));
                set.spawn(c);
            }
            5 => {
                let c = rig.set_level("AF", rng.gen_range(0.0..=1.0));
                set.spawn(c);
            }
            _ => {
                let c = rig.get_strength();
                set.spawn(async move { c.await.map(drop) });
            }
        }
    }

    let mut settled = 0;
    while let Some(joined) = set.join_next().await {
        joined.expect("task panicked").expect("operation failed");
        settled += 1;
    }
    assert_eq!(settled, OPS);
    assert_eq!(bench.backend.log().len(), RIGS + OPS);

    for (k, rig) in rigs.iter().enumerate() {
        assert!(!bench.backend.log().has_overlap(k));
        assert_eq!(rig.get_frequency(None).await.unwrap(), last_freq[k]);
    }
}
