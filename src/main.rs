//! Roverlink host simulator: runs the control loop on a real TCP socket.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                 Adapters (outer ring)                  │
//! │                                                        │
//! │  TcpAcceptor    SimHardware       LogEventSink StdClock│
//! │  (Listener)     (Motor+StatusLed) (EventSink)  (Clock) │
//! │                                                        │
//! │  ──────────── Port Trait Boundary ──────────────       │
//! │                                                        │
//! │  ┌──────────────────────────────────────────────┐      │
//! │  │          Controller (pure logic)             │      │
//! │  │  Router · MotionSupervisor · StatusIndicator │      │
//! │  └──────────────────────────────────────────────┘      │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! Point a browser at `http://<bind>:<port>/` to drive the simulated rover.
#![deny(unused_must_use)]

use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use roverlink::adapters::log_sink::LogEventSink;
use roverlink::adapters::sim_hw::SimHardware;
use roverlink::adapters::tcp::TcpAcceptor;
use roverlink::adapters::time::StdClock;
use roverlink::ports::Clock;
use roverlink::{Controller, ControllerConfig};

#[derive(Parser)]
#[command(version, about = "Run the rover control loop against a TCP socket")]
struct Opts {
    /// JSON configuration file; missing fields use defaults
    #[arg(long)]
    config: Option<PathBuf>,
    /// Address to listen on (defaults to the configured AP address)
    #[arg(long)]
    bind: Option<Ipv4Addr>,
    /// Listen port (overrides the config)
    #[arg(long)]
    port: Option<u16>,
    /// Failsafe timeout in milliseconds, 0 disables (overrides the config)
    #[arg(long)]
    failsafe_ms: Option<u32>,
}

fn load_config(opts: &Opts) -> Result<ControllerConfig> {
    let mut config = match &opts.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            ControllerConfig::from_json(&text)
                .with_context(|| format!("loading {}", path.display()))?
        }
        None => ControllerConfig::default(),
    };
    if let Some(port) = opts.port {
        config.network.port = port;
    }
    if let Some(ms) = opts.failsafe_ms {
        config.motion.failsafe_timeout_ms = ms;
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. Logging ────────────────────────────────────────────
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("Roverlink v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Configuration ──────────────────────────────────────
    let opts = Opts::parse();
    let config = load_config(&opts)?;

    // ── 3. Adapters ───────────────────────────────────────────
    let mut clock = StdClock::new();
    let mut hw = SimHardware::new();
    let mut sink = LogEventSink::new();

    // ── 4. Core + demo controls ───────────────────────────────
    let mut ctrl = Controller::new(&config, clock.now_ms());
    ctrl.begin(clock.now_ms(), &mut sink);

    ctrl.register_message_callback(|msg| info!("MSG | {msg}"));
    if !ctrl.register_button("Horn", || info!("BEEP | horn pressed")) {
        warn!("demo button not registered");
    }
    if !ctrl.register_slider("Camera pan", |v| info!("PAN | {v} deg"), 0, 180, 90, 1) {
        warn!("demo slider not registered");
    }

    // ── 5. Network bring-up ───────────────────────────────────
    let ip = opts.bind.unwrap_or(Ipv4Addr::from(config.network.ip));
    let mut listener = match TcpAcceptor::bind((ip, config.network.port)) {
        Ok(l) => l,
        Err(e) => {
            ctrl.fatal(clock.now_ms(), &mut sink);
            return Err(e).with_context(|| format!("binding {ip}:{}", config.network.port));
        }
    };
    info!(
        "AP '{}' ready, control page at http://{}/",
        config.network.ssid,
        listener.local_addr().context("reading bound address")?
    );
    ctrl.ap_ready(clock.now_ms(), &mut sink);

    // ── 6. Control loop ───────────────────────────────────────
    let interval = Duration::from_millis(u64::from(config.loop_interval_ms));
    loop {
        ctrl.tick(&mut listener, &mut clock, &mut hw, &mut sink);
        std::thread::sleep(interval);
    }
}
