//! Access gateway and notification fan-out for the marketplace staff
//! dashboard.
//!
//! The crate is a hexagonal modular monolith: [`domain`] holds the decision
//! logic and its ports, [`inbound`] adapts HTTP requests onto driving ports,
//! and [`outbound`] implements driven ports against the identity store and
//! PostgreSQL.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
