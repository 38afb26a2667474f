//! keyrelay server entry point.
//!
//! Startup order:
//!
//! 1. Parse the CLI and load the TOML config; CLI flags win over the file.
//! 2. Initialise `tracing` (`RUST_LOG` first, then `log_level` from config).
//! 3. Open the input device: the configured port, or the best discovered one.
//!    No device is fatal.
//! 4. Bind the RPC listener and serve until Ctrl-C.
//!
//! `--write-config` stops after step 1 and saves the merged config instead.

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use keyrelay_server::application::device::DeviceLink;
use keyrelay_server::application::dispatch::CommandDispatcher;
use keyrelay_server::infrastructure::cursor::NativeCursorLocator;
use keyrelay_server::infrastructure::rpc::{bind, run_server};
use keyrelay_server::infrastructure::serial::{discover_port, SerialPortChannel};
use keyrelay_server::infrastructure::storage::config::{
    config_file_path, load_config, save_config, AppConfig,
};

// ── CLI ───────────────────────────────────────────────────────────────────────

/// Relays key and mouse RPC calls to a serial input-emulation device.
#[derive(Debug, Parser)]
#[command(name = "keyrelay", version)]
struct Cli {
    /// Config file (default: platform config dir, `keyrelay/config.toml`).
    #[arg(long, env = "KEYRELAY_CONFIG")]
    config: Option<PathBuf>,

    /// Address the RPC listener binds to.
    #[arg(long, env = "KEYRELAY_BIND")]
    bind: Option<String>,

    /// RPC listener port.
    #[arg(long, env = "KEYRELAY_PORT")]
    port: Option<u16>,

    /// Serial port of the device; skips discovery.
    #[arg(long, env = "KEYRELAY_DEVICE")]
    device: Option<String>,

    #[arg(long, env = "KEYRELAY_BAUD_RATE")]
    baud_rate: Option<u32>,

    /// Pause between a pointer move and its click or scroll, in milliseconds.
    #[arg(long, env = "KEYRELAY_SETTLE_DELAY_MS")]
    settle_delay_ms: Option<u64>,

    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long, env = "KEYRELAY_LOG_LEVEL")]
    log_level: Option<String>,

    /// Save the merged config (file plus flags) to the config file and exit.
    #[arg(long)]
    write_config: bool,
}

impl Cli {
    /// Overlays the flags that were given onto `config`.
    fn apply(self, mut config: AppConfig) -> AppConfig {
        if let Some(bind) = self.bind {
            config.server.bind_address = bind;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(device) = self.device {
            config.device.port = Some(device);
        }
        if let Some(baud_rate) = self.baud_rate {
            config.device.baud_rate = baud_rate;
        }
        if let Some(ms) = self.settle_delay_ms {
            config.input.settle_delay_ms = ms;
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }
        config
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let file_config = load_config(cli.config.as_deref()).context("failed to load config")?;
    let config_path = cli.config.clone();
    let write_config = cli.write_config;
    let config = cli.apply(file_config);

    if write_config {
        let path = match config_path {
            Some(path) => path,
            None => config_file_path()?,
        };
        save_config(&config, &path)
            .with_context(|| format!("failed to write config to {}", path.display()))?;
        println!("wrote {}", path.display());
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    let addr = config.server.socket_addr()?;
    let port = match config.device.port.clone() {
        Some(port) => port,
        None => discover_port().context("no input device found")?,
    };
    let channel = SerialPortChannel::open(&port, config.device.baud_rate)
        .with_context(|| format!("failed to open input device {port}"))?;

    info!(
        device = channel.name(),
        baud_rate = config.device.baud_rate,
        settle_delay_ms = config.input.settle_delay_ms,
        "keyrelay starting on {addr}"
    );

    let dispatcher = Arc::new(CommandDispatcher::new(
        DeviceLink::new(Box::new(channel)),
        Arc::new(NativeCursorLocator::new()),
        config.input.settle_delay(),
    ));

    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C; shutting down");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    let listener = bind(addr).await?;
    run_server(listener, dispatcher, running).await?;

    info!("keyrelay stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
