#![forbid(unsafe_code)]

//! `ondemand-agent` — on-demand profiling agent daemon.
//!
//! Boots configuration, arms the session controller with the built-in
//! CPU-time capability, and serves the HTTP and signal trigger
//! surfaces until shut down by ctrl-c or SIGTERM.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use ondemand_agent::capability::cputime::CpuTimeProfiler;
use ondemand_agent::capability::spool::SpoolExporter;
use ondemand_agent::config::AgentConfig;
use ondemand_agent::scheduler::{OnDemandScheduler, ProfilingScheduler};
use ondemand_agent::session::SessionControllerBuilder;
use ondemand_agent::trigger::{http, signal};
use ondemand_agent::{AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "ondemand-agent", about = "On-demand profiling agent", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Override the snapshot spool directory.
    #[arg(long)]
    spool_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("ondemand-agent bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = match args.config {
        Some(ref path) => AgentConfig::load_from_path(path)?,
        None => {
            info!("no config file given; using defaults");
            AgentConfig::default()
        }
    };
    if let Some(dir) = args.spool_dir {
        config.spool_dir = dir;
    }
    config.apply_env_overrides();

    if config.upload_interval_seconds > 0 {
        info!(
            seconds = config.upload_interval_seconds,
            "periodic export enabled"
        );
    } else {
        info!("periodic export disabled; a single snapshot is exported at session end");
    }

    // ── Build controller and arm the profiler ────────────
    let exporter = Arc::new(SpoolExporter::new(&config.spool_dir)?);
    let controller = SessionControllerBuilder::new()
        .exporter(exporter)
        .upload_interval_seconds(config.upload_interval_seconds)
        .build()?;

    let scheduler = OnDemandScheduler::new(Arc::clone(&controller));
    scheduler.start(Arc::new(CpuTimeProfiler::new()));

    // ── Start trigger surfaces ──────────────────────────
    // A trigger that fails to come up is disabled, never fatal: the
    // rest of the agent keeps running.
    let ct = CancellationToken::new();

    let http_handle = if config.http_trigger.enabled {
        match http::bind(config.http_trigger.port).await {
            Ok(listener) => {
                let controller = Arc::clone(&controller);
                let default_duration = config.default_duration_seconds;
                let ct = ct.clone();
                Some(tokio::spawn(async move {
                    if let Err(err) = http::serve(listener, controller, default_duration, ct).await
                    {
                        error!(%err, "HTTP trigger failed");
                    }
                }))
            }
            Err(err) => {
                error!(%err, "HTTP trigger disabled");
                None
            }
        }
    } else {
        info!("HTTP trigger disabled by config");
        None
    };

    let signal_handle = if config.signal_trigger.enabled {
        match signal::spawn(
            Arc::clone(&controller),
            config.signal_default_duration_seconds,
            ct.clone(),
        ) {
            Ok(handle) => Some(handle),
            Err(err) => {
                error!(%err, "signal trigger disabled");
                None
            }
        }
    } else {
        info!("signal trigger disabled by config");
        None
    };

    info!("on-demand profiling armed; waiting for triggers");

    // ── Wait for shutdown signal ────────────────────────
    shutdown_signal().await;
    info!("shutdown signal received");
    ct.cancel();

    // Terminate any in-flight session so its final window is exported.
    controller.shutdown().await;

    if let Some(handle) = http_handle {
        let _ = handle.await;
    }
    if let Some(handle) = signal_handle {
        let _ = handle.await;
    }
    info!("ondemand-agent shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
