//! Domain primitives, services, and ports.
//!
//! Purpose: own every access and notification decision without knowing how
//! requests arrive or where data lives. Adapters reach the domain only
//! through the traits in [`ports`].
//!
//! Public surface:
//! - `Error`: transport agnostic failure payload.
//! - `Role` and `resolve_role`: normalised access tier of an identity.
//! - `AccessGateway`: per-request authorisation pipeline.
//! - `AudienceResolver` and `NotificationFanoutService`: notification fan-out.

pub mod access;
pub mod audience;
pub mod auth_events;
pub mod error;
pub mod fanout;
pub mod identity;
pub mod notification;
pub mod ports;
pub mod role;
pub mod sign_out;
pub mod trace_id;

pub use self::access::{AccessDecision, AccessGateway, AccessOutcome, AccessReason, RedirectTarget};
pub use self::audience::AudienceResolver;
pub use self::auth_events::{AuthEventBus, AuthStateChange, DEFAULT_AUTH_EVENT_CAPACITY};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::fanout::NotificationFanoutService;
pub use self::identity::{
    Identity, IdentityValidationError, Principal, Session, SessionCredentials, SessionToken,
    UserId,
};
pub use self::notification::{
    FanoutResult, NotificationContent, NotificationDraft, NotificationKind, NotificationRecord,
    NotificationTarget, NotificationValidationError, SendNotificationRequest,
};
pub use self::role::{Role, UnknownRole, resolve_role};
pub use self::sign_out::SignOutService;
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};

/// Convenient domain result alias.
///
/// # Examples
/// ```
/// use marketplace_gateway::domain::{DomainResult, Error};
///
/// fn use_case() -> DomainResult<()> {
///     Err(Error::not_found("nothing here"))
/// }
/// assert!(use_case().is_err());
/// ```
pub type DomainResult<T> = Result<T, Error>;
