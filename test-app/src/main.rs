// rigbridge test application -- CLI tool for exercising the async bridge
// against the simulated blocking driver.
//
// Usage:
//   rigbridge-test-app list
//   rigbridge-test-app list --manufacturer icom
//   rigbridge-test-app --model 3073 info
//   rigbridge-test-app --model 3073 --port /dev/ttyUSB0 freq set 14074000
//   rigbridge-test-app --model 1035 mode set PKTUSB --bandwidth narrow
//   rigbridge-test-app --model 2029 level get AF
//   rigbridge-test-app --model 1 --port localhost:4532 info
//   rigbridge-test-app --model 1 --latency-ms 20 stress --rigs 4 --count 500
//   rigbridge-test-app --model 3073 monitor --duration 5

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use rand::Rng;
use tokio::task::JoinSet;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use rigbridge::native::{VFO_A, VFO_B};
use rigbridge::{Bridge, BridgeConfig, DebugLevel, ModelId, RigEvent, RigHandle, RigHandleBuilder};
use rigbridge_test_harness::SimBackend;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// rigbridge test application -- drives simulated rigs from the command line.
#[derive(Parser)]
#[command(name = "rigbridge-test-app", version, about)]
struct Cli {
    /// Numeric rig model (see `list`). Required for all commands except `list`.
    #[arg(long)]
    model: Option<ModelId>,

    /// Serial path or `host:port` network endpoint.
    #[arg(long, default_value = "/dev/ttyUSB0")]
    port: String,

    /// Serial baud rate.
    #[arg(long)]
    baud: Option<u32>,

    /// Simulated latency of every driver call, in milliseconds.
    #[arg(long, default_value_t = 0)]
    latency_ms: u64,

    /// Number of blocking workers shared by all handles.
    #[arg(long, default_value_t = rigbridge::config::DEFAULT_WORKERS)]
    workers: usize,

    /// Driver debug level: none, bug, err, warn, verbose, trace.
    #[arg(long, default_value = "none")]
    debug_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the models the driver supports.
    List {
        /// Only show models from this manufacturer.
        #[arg(long)]
        manufacturer: Option<String>,
    },
    /// Show handle and capability details for the selected model.
    Info,
    /// Read or write the frequency.
    Freq {
        #[command(subcommand)]
        action: FreqAction,
    },
    /// Read or write the mode.
    Mode {
        #[command(subcommand)]
        action: ModeAction,
    },
    /// Read or key the transmitter.
    Ptt {
        #[command(subcommand)]
        action: PttAction,
    },
    /// List, read or write levels.
    Level {
        #[command(subcommand)]
        action: LevelAction,
    },
    /// Print rig events while the simulated front panel is operated.
    Monitor {
        /// Seconds to keep turning the dial.
        #[arg(long, default_value_t = 3)]
        duration: u64,
    },
    /// Fire random operations at several handles and report throughput.
    Stress {
        /// Number of handles to open.
        #[arg(long, default_value_t = 4)]
        rigs: usize,
        /// Total number of operations.
        #[arg(long, default_value_t = 200)]
        count: usize,
    },
}

#[derive(Subcommand)]
enum FreqAction {
    /// Read the frequency.
    Get {
        /// VFO name, e.g. VFOA. Defaults to the current VFO.
        #[arg(long)]
        vfo: Option<String>,
    },
    /// Set the frequency in Hz.
    Set {
        freq_hz: u64,
        #[arg(long)]
        vfo: Option<String>,
    },
}

#[derive(Subcommand)]
enum ModeAction {
    /// Read the mode and passband.
    Get,
    /// Set the mode (e.g. USB, PKTUSB, CW).
    Set {
        mode: String,
        /// Passband hint: narrow, normal or wide.
        #[arg(long)]
        bandwidth: Option<String>,
    },
}

#[derive(Subcommand)]
enum PttAction {
    Get,
    On,
    Off,
}

#[derive(Subcommand)]
enum LevelAction {
    /// List the levels the model can read.
    List,
    /// Read a level, normalized to 0..1.
    Get { name: String },
    /// Write a level, normalized to 0..1.
    Set { name: String, value: f64 },
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Format a frequency in Hz as a human-readable MHz string.
fn format_freq(hz: u64) -> String {
    let mhz = hz as f64 / 1_000_000.0;
    format!("{mhz:.6} MHz")
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn create_bridge(cli: &Cli, backend: Arc<SimBackend>) -> Result<Bridge> {
    let debug_level: DebugLevel = cli
        .debug_level
        .parse()
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    let config = BridgeConfig::default()
        .workers(cli.workers)
        .debug_level(debug_level);
    Bridge::new(backend, config).context("failed to create bridge")
}

async fn create_rig(cli: &Cli, bridge: &Bridge, port: &str) -> Result<RigHandle> {
    let Some(model) = cli.model else {
        bail!("--model is required for this command (see `list`)");
    };
    let mut builder = RigHandleBuilder::new(model).port(port);
    if let Some(baud) = cli.baud {
        builder = builder.serial_rate(baud);
    }
    let rig = builder
        .build(bridge)
        .await
        .with_context(|| format!("failed to create handle for model {model} on {port}"))?;
    rig.open()
        .await
        .with_context(|| format!("failed to open {port}"))?;
    debug!(model, port, "rig ready");
    Ok(rig)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_list(bridge: &Bridge, manufacturer: Option<&str>) -> Result<()> {
    let models = match manufacturer {
        Some(name) => bridge.models_by_manufacturer(name),
        None => bridge.supported_models(),
    };
    if models.is_empty() {
        println!("No models found.");
        return Ok(());
    }

    let mfr_width = models
        .iter()
        .map(|m| m.manufacturer.len())
        .max()
        .unwrap_or(12)
        .max(12);
    let name_width = models
        .iter()
        .map(|m| m.model_name.len())
        .max()
        .unwrap_or(12)
        .max(12);

    println!(
        "{:>6}  {:<mfr_width$}  {:<name_width$}  {:<9}  Status",
        "Model", "Manufacturer", "Name", "Version",
    );
    println!(
        "{:>6}  {:<mfr_width$}  {:<name_width$}  {:<9}  ------",
        "-----",
        "-".repeat(mfr_width),
        "-".repeat(name_width),
        "-------",
    );
    for m in &models {
        println!(
            "{:>6}  {:<mfr_width$}  {:<name_width$}  {:<9}  {}",
            m.model_id, m.manufacturer, m.model_name, m.driver_version, m.status,
        );
    }
    println!();
    println!("{} models total.", models.len());
    Ok(())
}

async fn cmd_info(rig: &RigHandle) -> Result<()> {
    let info = rig.describe();
    println!("Model:      {} ({})", info.model_name, info.requested_model);
    if info.effective_model != info.requested_model {
        println!("Driver:     network model {}", info.effective_model);
    }
    println!("Port:       {} ({})", info.port, info.transport);
    println!("State:      {}", info.state);
    println!("Modes:      {}", rig.translator().supported_modes().join(" "));
    println!("VFOs:       {}", rig.translator().supported_vfos().join(" "));
    println!("Levels:     {}", rig.get_supported_levels().await?.join(" "));
    println!("Functions:  {}", rig.get_supported_functions().await?.join(" "));
    println!("Frequency:  {}", format_freq(rig.get_frequency(None).await?));
    let mode = rig.get_mode().await?;
    println!("Mode:       {} ({} Hz)", mode.mode, mode.width);
    Ok(())
}

async fn cmd_freq(rig: &RigHandle, action: &FreqAction) -> Result<()> {
    match action {
        FreqAction::Get { vfo } => {
            let hz = rig.get_frequency(vfo.as_deref()).await?;
            println!("{}: {}", vfo.as_deref().unwrap_or("current"), format_freq(hz));
        }
        FreqAction::Set { freq_hz, vfo } => {
            rig.set_frequency(*freq_hz, vfo.as_deref()).await?;
            println!(
                "{}: set to {}",
                vfo.as_deref().unwrap_or("current"),
                format_freq(*freq_hz)
            );
        }
    }
    Ok(())
}

async fn cmd_mode(rig: &RigHandle, action: &ModeAction) -> Result<()> {
    match action {
        ModeAction::Get => {
            let reading = rig.get_mode().await?;
            println!("{} ({} Hz)", reading.mode, reading.width);
        }
        ModeAction::Set { mode, bandwidth } => {
            rig.set_mode(mode, bandwidth.as_deref()).await?;
            let reading = rig.get_mode().await?;
            println!("mode set to {} ({} Hz)", reading.mode, reading.width);
        }
    }
    Ok(())
}

async fn cmd_ptt(rig: &RigHandle, action: &PttAction) -> Result<()> {
    match action {
        PttAction::Get => {}
        PttAction::On => rig.set_ptt(true).await?,
        PttAction::Off => rig.set_ptt(false).await?,
    }
    if rig.get_ptt().await? {
        println!("PTT: ON (transmitting)");
    } else {
        println!("PTT: OFF (receiving)");
    }
    Ok(())
}

async fn cmd_level(rig: &RigHandle, action: &LevelAction) -> Result<()> {
    match action {
        LevelAction::List => {
            for name in rig.get_supported_levels().await? {
                println!("{name}");
            }
        }
        LevelAction::Get { name } => {
            let value = rig.get_level(name).await?;
            println!("{name}: {value:.3}");
        }
        LevelAction::Set { name, value } => {
            rig.set_level(name, *value).await?;
            let back = rig.get_level(name).await?;
            println!("{name}: set to {back:.3}");
        }
    }
    Ok(())
}

async fn cmd_monitor(rig: &RigHandle, backend: &SimBackend, duration_secs: u64) -> Result<()> {
    let mut event_rx = rig.subscribe();
    let panel = backend
        .last_panel()
        .context("simulated rig has no front panel")?;

    println!("Turning the dial for {duration_secs} s...");
    let deadline = Instant::now() + Duration::from_secs(duration_secs);
    let mut ticker = tokio::time::interval(Duration::from_millis(250));
    let mut hz = rig.get_frequency(Some("VFOA")).await?;
    let mut keyed = false;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if Instant::now() >= deadline {
                    println!("Monitor duration elapsed.");
                    break;
                }
                hz += 100;
                panel.turn_dial(VFO_A, hz);
                if hz % 1_000 == 0 {
                    keyed = !keyed;
                    panel.key_ptt(keyed);
                }
            }
            event = event_rx.recv() => match event {
                Ok(RigEvent::Frequency { vfo, freq_hz }) => {
                    println!("[event] {vfo}: {}", format_freq(freq_hz));
                }
                Ok(RigEvent::Ptt { vfo, on }) => {
                    println!("[event] {vfo}: PTT {}", if on { "ON" } else { "OFF" });
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    println!("[warning] missed {n} events (consumer too slow)");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                    println!("Event channel closed.");
                    break;
                }
            },
        }
    }

    if keyed {
        panel.key_ptt(false);
    }
    Ok(())
}

async fn cmd_stress(cli: &Cli, bridge: &Bridge, rigs: usize, count: usize) -> Result<()> {
    if rigs == 0 {
        bail!("--rigs must be at least 1");
    }
    let mut handles = Vec::with_capacity(rigs);
    for i in 0..rigs {
        let port = format!("/dev/ttyUSB{i}");
        handles.push(create_rig(cli, bridge, &port).await?);
    }

    info!(rigs, count, workers = bridge.workers(), "starting stress run");
    let mut rng = rand::thread_rng();
    let mut set: JoinSet<rigbridge::Result<()>> = JoinSet::new();
    let start = Instant::now();

    for _ in 0..count {
        let rig = &handles[rng.gen_range(0..rigs)];
        match rng.gen_range(0..5) {
            0 => {
                let c = rig.set_frequency(rng.gen_range(3_500_000..29_700_000), None);
                set.spawn(c);
            }
            1 => {
                let c = rig.get_frequency(None);
                set.spawn(async move { c.await.map(drop) });
            }
            2 => {
                let c = rig.get_mode();
                set.spawn(async move { c.await.map(drop) });
            }
            3 => {
                let c = rig.get_strength();
                set.spawn(async move { c.await.map(drop) });
            }
            _ => {
                let vfo = if rng.gen_bool(0.5) { VFO_A } else { VFO_B };
                let c = rig.get_frequency(Some(rigbridge::translate::vfo_name(vfo)));
                set.spawn(async move { c.await.map(drop) });
            }
        }
    }

    let mut success = 0usize;
    let mut failures = 0usize;
    while let Some(joined) = set.join_next().await {
        match joined.context("stress task panicked")? {
            Ok(()) => success += 1,
            Err(e) => {
                eprintln!("operation failed: {e}");
                failures += 1;
            }
        }
    }
    let elapsed = start.elapsed();
    let rate = if elapsed.as_secs_f64() > 0.0 {
        count as f64 / elapsed.as_secs_f64()
    } else {
        0.0
    };

    println!("Results:");
    println!("  Handles:        {rigs}");
    println!("  Operations:     {count}");
    println!("  Successes:      {success}");
    println!("  Failures:       {failures}");
    println!("  Elapsed:        {:.3} s", elapsed.as_secs_f64());
    println!("  Rate:           {rate:.1} ops/sec");

    for rig in &handles {
        rig.destroy().await?;
    }
    if failures > 0 {
        bail!("{failures} out of {count} operations failed");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let backend = Arc::new(SimBackend::with_latency(Duration::from_millis(
        cli.latency_ms,
    )));
    let bridge = create_bridge(&cli, backend.clone())?;

    // Catalog queries need no handle.
    if let Command::List { manufacturer } = &cli.command {
        return cmd_list(&bridge, manufacturer.as_deref());
    }
    if let Command::Stress { rigs, count } = &cli.command {
        return cmd_stress(&cli, &bridge, *rigs, *count).await;
    }

    let rig = create_rig(&cli, &bridge, &cli.port).await?;
    let result = match &cli.command {
        Command::Info => cmd_info(&rig).await,
        Command::Freq { action } => cmd_freq(&rig, action).await,
        Command::Mode { action } => cmd_mode(&rig, action).await,
        Command::Ptt { action } => cmd_ptt(&rig, action).await,
        Command::Level { action } => cmd_level(&rig, action).await,
        Command::Monitor { duration } => cmd_monitor(&rig, &backend, *duration).await,
        Command::List { .. } => unreachable!("list handled above"),
        Command::Stress { .. } => unreachable!("stress handled above"),
    };
    rig.destroy().await.ok();
    result
}
