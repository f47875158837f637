//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod access_gate;
mod auth_event_publisher;
mod identity_store;
mod notification_command;
mod notification_repository;
mod session_command;

pub use access_gate::AccessGate;
#[cfg(test)]
pub use access_gate::MockAccessGate;
#[cfg(test)]
pub use auth_event_publisher::MockAuthEventPublisher;
pub use auth_event_publisher::{AuthEventPublisher, NoopAuthEventPublisher};
#[cfg(test)]
pub use identity_store::MockIdentityStore;
pub use identity_store::{FixtureIdentityStore, IdentityStore, IdentityStoreError};
#[cfg(test)]
pub use notification_command::MockNotificationCommand;
pub use notification_command::NotificationCommand;
#[cfg(test)]
pub use notification_repository::MockNotificationRepository;
pub use notification_repository::{
    FixtureNotificationRepository, NotificationRepository, NotificationRepositoryError,
};
#[cfg(test)]
pub use session_command::MockSessionCommand;
pub use session_command::SessionCommand;
