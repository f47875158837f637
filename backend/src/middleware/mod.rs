//! Request middleware for tracing and dashboard access control.

pub mod access_gate;
pub mod trace;

pub use access_gate::{AccessGateLayer, DEFAULT_PROTECTED_PREFIX, ProtectedPrefix, ProtectedPrefixError};
pub use trace::Trace;
