// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

mod config;
mod stream;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tokio::signal;
use tokio::sync::{mpsc, watch};
use tracing::info;

use hmd_app::{init_logging, normalize_name, ConfigFile};
use hmd_core::{DynResult, RawFrame};
use hmd_transport::{register_builtin_transports_on, RegistrationContext, TransportAccess};

use config::MonitorConfig;
use stream::{OutputFormat, ReportPrinter};

const PKG_DESCRIPTION: &str = concat!(
    env!("CARGO_PKG_NAME"),
    " - head-mounted display IMU report monitor"
);
const FRAME_CHANNEL_BUFFER: usize = 256;
const SHUTDOWN_GRACE_MS: u64 = 200;

#[derive(Debug, Parser)]
#[command(
    author = env!("CARGO_PKG_AUTHORS"),
    version = env!("CARGO_PKG_VERSION"),
    about = PKG_DESCRIPTION,
)]
struct Cli {
    /// Path to configuration file
    #[arg(long = "config", short = 'C', value_name = "FILE")]
    config: Option<PathBuf>,
    /// Print example configuration and exit
    #[arg(long = "print-config")]
    print_config: bool,
    /// Transport to read reports from
    #[arg(short = 't', long = "transport", value_enum)]
    transport: Option<TransportKind>,
    /// Endpoints:
    /// when transport is hidraw: device paths (default: discover by USB id);
    /// when transport is replay: the capture file
    #[arg(value_name = "ENDPOINT")]
    endpoints: Vec<PathBuf>,
    /// Output format
    #[arg(short = 'f', long = "format", value_enum)]
    format: Option<FormatKind>,
    /// Stop after this many decoded reports
    #[arg(short = 'n', long = "count")]
    count: Option<u64>,
    /// Log level (trace, debug, info, warn, error)
    #[arg(long = "log-level")]
    log_level: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TransportKind {
    Hidraw,
    Replay,
    Dummy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatKind {
    Text,
    Json,
}

/// Resolved configuration after merging config file and CLI arguments.
struct ResolvedConfig {
    transport: String,
    access: TransportAccess,
    format: OutputFormat,
    count: Option<u64>,
}

fn resolve_config(
    cli: &Cli,
    cfg: &MonitorConfig,
    registry: &RegistrationContext,
) -> DynResult<ResolvedConfig> {
    let transport = cli
        .transport
        .map(|t| match t {
            TransportKind::Hidraw => "hidraw",
            TransportKind::Replay => "replay",
            TransportKind::Dummy => "dummy",
        })
        .or(cfg.transport.transport_type.as_deref())
        .map(normalize_name)
        .unwrap_or_else(|| "hidraw".to_string());
    if !registry.is_transport_registered(&transport) {
        return Err(format!(
            "Unknown transport: {} (available: {})",
            transport,
            registry.registered_transports().join(", ")
        )
        .into());
    }

    let interval = Duration::from_millis(cfg.transport.interval_ms);
    let access = match transport.as_str() {
        "hidraw" => {
            let endpoints = if cli.endpoints.is_empty() {
                cfg.transport.endpoints.clone()
            } else {
                cli.endpoints.clone()
            };
            TransportAccess::Hidraw {
                endpoints,
                vendor_id: cfg.transport.vendor_id,
                product_id: cfg.transport.product_id,
            }
        }
        "replay" => {
            if cli.endpoints.len() > 1 {
                return Err("Replay transport takes a single capture file".into());
            }
            let path = cli
                .endpoints
                .first()
                .cloned()
                .or_else(|| cfg.transport.replay_file.clone())
                .ok_or("Replay transport requires a capture file. Use 'ENDPOINT' argument or set [transport].replay_file in config.")?;
            TransportAccess::Replay { path, interval }
        }
        "dummy" => {
            if !cli.endpoints.is_empty() {
                return Err("Dummy transport takes no endpoints".into());
            }
            TransportAccess::Dummy { interval }
        }
        other => return Err(format!("Unknown transport: {}", other).into()),
    };

    let format_name = cli
        .format
        .map(|f| match f {
            FormatKind::Text => "text",
            FormatKind::Json => "json",
        })
        .unwrap_or(cfg.output.format.as_str());
    let format = OutputFormat::from_name(format_name)
        .ok_or_else(|| format!("Unknown output format: {}", format_name))?;

    let count = cli.count.or(cfg.output.count);
    if count == Some(0) {
        return Err("--count must be > 0".into());
    }

    Ok(ResolvedConfig {
        transport,
        access,
        format,
        count,
    })
}

#[tokio::main]
async fn main() -> DynResult<()> {
    let mut registry = RegistrationContext::new();
    register_builtin_transports_on(&mut registry);

    let cli = Cli::parse();

    if cli.print_config {
        println!("{}", MonitorConfig::example_combined_toml());
        return Ok(());
    }

    let (cfg, config_path) = if let Some(ref path) = cli.config {
        let cfg = MonitorConfig::load_from_file(path)?;
        (cfg, Some(path.clone()))
    } else {
        MonitorConfig::load_from_default_paths()?
    };
    cfg.validate()
        .map_err(|e| format!("Invalid monitor configuration: {}", e))?;

    init_logging(
        cli.log_level
            .as_deref()
            .or(cfg.general.log_level.as_deref()),
    );

    if let Some(ref path) = config_path {
        info!("Loaded configuration from {}", path.display());
    }

    let resolved = resolve_config(&cli, &cfg, &registry)?;
    info!(
        "Starting hmd-monitor (transport: {}, format: {:?})",
        resolved.transport, resolved.format
    );

    let sources = registry.build_sources(&resolved.transport, resolved.access)?;
    for source in &sources {
        let endpoint = source.info();
        info!(
            "Endpoint {}: {} {}",
            endpoint.index, endpoint.transport, endpoint.address
        );
    }

    let (frame_tx, frame_rx) = mpsc::channel::<RawFrame>(FRAME_CHANNEL_BUFFER);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task_handles = stream::spawn_endpoint_readers(sources, frame_tx, shutdown_rx.clone());

    let mut printer = ReportPrinter::new(tokio::io::stdout(), resolved.format);
    let decode = stream::run_decode_loop(frame_rx, &mut printer, resolved.count, shutdown_rx);
    tokio::pin!(decode);

    let result = tokio::select! {
        res = &mut decode => res,
        res = signal::ctrl_c() => {
            res?;
            info!("Ctrl+C received, shutting down");
            let _ = shutdown_tx.send(true);
            decode.await
        }
    };

    let _ = shutdown_tx.send(true);
    if task_handles.iter().any(|handle| !handle.is_finished()) {
        tokio::time::sleep(Duration::from_millis(SHUTDOWN_GRACE_MS)).await;
    }
    for handle in &task_handles {
        if !handle.is_finished() {
            handle.abort();
        }
    }
    for handle in task_handles {
        let _ = handle.await;
    }

    let stats = result?;
    let total: u64 = stats.values().map(|s| s.accepted).sum();
    info!("Decoded {} report(s)", total);
    Ok(())
}
