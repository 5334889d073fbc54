//! Trigger adapters: thin, stateless translators from an external
//! stimulus (HTTP request, OS signal) into session-controller calls.
//! They hold no session state and duplicate no controller logic.

pub mod http;
pub mod signal;
