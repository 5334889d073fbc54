#![forbid(unsafe_code)]

//! `ondemand-agent-ctl` — local CLI companion for `ondemand-agent`.
//!
//! Drives the daemon's HTTP control API and prints the server's JSON
//! response verbatim. Designed for operators triggering or inspecting
//! profiling sessions from the box the agent runs on.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Debug, Parser)]
#[command(
    name = "ondemand-agent-ctl",
    about = "Local CLI for the ondemand-agent control API",
    version,
    long_about = None
)]
struct Cli {
    /// Address of the agent's HTTP trigger (host:port).
    #[arg(long, default_value = "127.0.0.1:8930")]
    addr: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start a profiling session.
    Start {
        /// Session duration in seconds; 0 runs until stopped.
        /// Omitted: the server applies its default.
        #[arg(long)]
        duration: Option<u64>,
    },

    /// Stop the active profiling session and export its final window.
    Stop,

    /// Show whether a profiling session is active.
    Status,
}

async fn run(args: Cli) -> Result<Value, String> {
    let client = reqwest::Client::new();
    let base = format!("http://{}", args.addr);

    let response = match args.command {
        Command::Start { duration } => {
            let mut request = client.post(format!("{base}/profile/start"));
            if let Some(duration) = duration {
                request = request.json(&serde_json::json!({ "duration": duration }));
            }
            request.send().await
        }
        Command::Stop => client.post(format!("{base}/profile/stop")).send().await,
        Command::Status => client.get(format!("{base}/profile/status")).send().await,
    };

    let response = response.map_err(|err| format!("cannot reach agent at {}: {err}", args.addr))?;
    response
        .json::<Value>()
        .await
        .map_err(|err| format!("malformed response from agent: {err}"))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Cli::parse();

    match run(args).await {
        Ok(body) => {
            println!("{body}");
            // Business refusals (already active, not active) exit non-zero
            // so scripts can branch on them.
            if body.get("success").and_then(Value::as_bool) == Some(false) {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}
