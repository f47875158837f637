//! PostgreSQL persistence adapters using Diesel with `diesel-async` and
//! `bb8` pooling.
//!
//! Row structs (`models.rs`) and table definitions (`schema.rs`) stay
//! private; adapters translate them into domain types.

mod diesel_notification_repository;
mod models;
mod pool;
mod schema;

pub use diesel_notification_repository::DieselNotificationRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
