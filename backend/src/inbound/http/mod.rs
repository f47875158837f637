//! HTTP inbound adapter exposing REST endpoints.

pub mod auth;
pub mod dashboard;
pub mod error;
pub mod health;
pub mod notifications;
pub mod schemas;
pub mod session;
pub mod state;

pub use error::ApiResult;
