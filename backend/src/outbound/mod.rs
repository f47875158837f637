//! Outbound adapters implementing driven ports.
//!
//! - **identity**: GoTrue-compatible identity store over HTTPS (`reqwest`)
//! - **persistence**: PostgreSQL notification storage (Diesel)
//!
//! Adapters translate between transport or row types and domain types; they
//! hold no business logic.

pub mod identity;
pub mod persistence;
