//! Turn a notification target into concrete recipient ids.

use std::sync::Arc;

use tracing::{error, info};

use super::ports::{IdentityStore, IdentityStoreError};
use super::{Error, Identity, NotificationTarget, Role, UserId, resolve_role};

/// Resolves a [`NotificationTarget`] against the identity store.
///
/// Role filters and broadcasts list users in one unpaginated call. The
/// result is a point-in-time snapshot of the store.
#[derive(Clone)]
pub struct AudienceResolver {
    store: Arc<dyn IdentityStore>,
}

impl AudienceResolver {
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self { store }
    }

    /// Resolve `target` to recipient ids in identity store order.
    ///
    /// # Errors
    /// - `NotFound` when a role filter matches no user.
    /// - `StoreUnavailable` when the user listing fails.
    pub async fn resolve(&self, target: &NotificationTarget) -> Result<Vec<UserId>, Error> {
        match target {
            NotificationTarget::SingleUser(user_id) => Ok(vec![user_id.clone()]),
            NotificationTarget::RoleFilter(role) => self.resolve_role_filter(*role).await,
            NotificationTarget::Broadcast => {
                let users = self.list_users().await?;
                Ok(users.into_iter().map(|user| user.id().clone()).collect())
            }
        }
    }

    async fn resolve_role_filter(&self, role: Role) -> Result<Vec<UserId>, Error> {
        let recipients: Vec<UserId> = self
            .list_users()
            .await?
            .into_iter()
            .filter(|user| resolve_role(Some(user)) == Some(role))
            .map(|user| user.id().clone())
            .collect();
        if recipients.is_empty() {
            info!(role = role.as_str(), "role filter matched no users");
            return Err(Error::not_found(format!("no users found with role {role}")));
        }
        Ok(recipients)
    }

    async fn list_users(&self) -> Result<Vec<Identity>, Error> {
        self.store.list_users().await.map_err(map_store_error)
    }
}

fn map_store_error(err: IdentityStoreError) -> Error {
    error!(error = %err, "identity store listing failed");
    Error::store_unavailable("identity store is unavailable")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::MockIdentityStore;
    use rstest::{fixture, rstest};
    use serde_json::json;

    fn user(id: &str, role: Option<&str>) -> Identity {
        let metadata = match role {
            Some(role) => json!({ "role": role }),
            None => json!({}),
        };
        Identity::new(UserId::new(id).expect("valid id"), None, metadata)
    }

    #[fixture]
    fn directory() -> Vec<Identity> {
        vec![
            user("a-1", Some("admin")),
            user("v-1", Some("vendor")),
            user("c-1", Some("customer")),
            user("v-2", Some("vendor")),
            user("x-1", Some("Vendor")),
            user("n-1", None),
        ]
    }

    fn resolver_listing(users: Vec<Identity>) -> AudienceResolver {
        let mut store = MockIdentityStore::new();
        store
            .expect_list_users()
            .times(1)
            .return_once(move || Ok(users));
        AudienceResolver::new(Arc::new(store))
    }

    fn ids(values: &[UserId]) -> Vec<&str> {
        values.iter().map(AsRef::as_ref).collect()
    }

    #[rstest]
    #[tokio::test]
    async fn single_user_skips_the_store() {
        let mut store = MockIdentityStore::new();
        store.expect_list_users().times(0);
        let resolver = AudienceResolver::new(Arc::new(store));
        let target = NotificationTarget::SingleUser(UserId::new("ghost").expect("valid id"));

        let resolved = resolver.resolve(&target).await.expect("single user resolves");

        assert_eq!(ids(&resolved), ["ghost"]);
    }

    #[rstest]
    #[tokio::test]
    async fn broadcast_returns_every_listed_user(directory: Vec<Identity>) {
        let expected: Vec<String> = directory.iter().map(|u| u.id().to_string()).collect();
        let resolver = resolver_listing(directory);

        let resolved = resolver
            .resolve(&NotificationTarget::Broadcast)
            .await
            .expect("broadcast resolves");

        assert_eq!(ids(&resolved), expected);
    }

    #[rstest]
    #[case(Role::Vendor, &["v-1", "v-2"])]
    #[case(Role::Admin, &["a-1"])]
    #[case(Role::Customer, &["c-1"])]
    #[tokio::test]
    async fn role_filter_keeps_exact_matches(
        directory: Vec<Identity>,
        #[case] role: Role,
        #[case] expected: &[&str],
    ) {
        let resolver = resolver_listing(directory);

        let resolved = resolver
            .resolve(&NotificationTarget::RoleFilter(role))
            .await
            .expect("role filter resolves");

        assert_eq!(ids(&resolved), expected);
    }

    #[rstest]
    #[tokio::test]
    async fn empty_role_filter_is_not_found() {
        let resolver = resolver_listing(vec![user("a-1", Some("admin")), user("c-1", None)]);

        let err = resolver
            .resolve(&NotificationTarget::RoleFilter(Role::Vendor))
            .await
            .expect_err("no vendors");

        assert_eq!(err.code(), ErrorCode::NotFound);
        assert_eq!(err.message(), "no users found with role vendor");
    }

    #[rstest]
    #[tokio::test]
    async fn empty_broadcast_is_not_an_error() {
        let resolver = resolver_listing(Vec::new());

        let resolved = resolver
            .resolve(&NotificationTarget::Broadcast)
            .await
            .expect("empty broadcast resolves");

        assert!(resolved.is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn listing_failure_is_store_unavailable() {
        let mut store = MockIdentityStore::new();
        store
            .expect_list_users()
            .times(1)
            .return_once(|| Err(IdentityStoreError::query("status 500")));
        let resolver = AudienceResolver::new(Arc::new(store));

        let err = resolver
            .resolve(&NotificationTarget::Broadcast)
            .await
            .expect_err("listing fails");

        assert_eq!(err.code(), ErrorCode::StoreUnavailable);
        assert!(!err.message().contains("status 500"));
    }
}
