//! Identity store outbound adapter.
//!
//! Implements the `IdentityStore` port against a GoTrue-compatible auth API
//! over HTTPS.

mod config;
mod dto;
mod http_store;

pub use config::{
    ANON_KEY_ENV, IdentityConfigError, IdentityStoreConfig, SERVICE_ROLE_KEY_ENV, URL_ENV,
    identity_config_from_env,
};
pub use http_store::HttpIdentityStore;
