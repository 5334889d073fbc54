//! Session state machine and its timer service.

pub mod controller;
pub mod timer;

pub use controller::{ProfilingResult, SessionController, SessionControllerBuilder};
pub use timer::SessionTimerHandle;
