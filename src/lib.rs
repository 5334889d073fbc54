#![forbid(unsafe_code)]

//! `ondemand_agent` — control plane for an on-demand profiling agent.
//!
//! The agent keeps a sampling profiler armed but idle until an external
//! trigger (HTTP request or OS signal) starts a session. The
//! [`session::SessionController`] owns all session state and timing;
//! [`trigger`] adapters translate stimuli into controller calls;
//! [`capability`] defines the contracts for the sampling engine and the
//! export pipeline, which are external collaborators.

pub mod capability;
pub mod config;
pub mod errors;
pub mod scheduler;
pub mod session;
pub mod trigger;

pub use config::AgentConfig;
pub use errors::{AppError, Result};
