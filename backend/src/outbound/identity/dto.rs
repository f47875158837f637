//! DTOs for decoding identity store (GoTrue) user payloads.

use serde::Deserialize;
use serde_json::Value;

use crate::domain::{Identity, UserId};

#[derive(Debug, Deserialize)]
pub(super) struct UserDto {
    pub(super) id: String,
    #[serde(default)]
    pub(super) email: Option<String>,
    #[serde(default)]
    pub(super) user_metadata: Value,
}

#[derive(Debug, Deserialize)]
pub(super) struct UserListDto {
    #[serde(default)]
    pub(super) users: Vec<UserDto>,
}

impl UserDto {
    /// Blank emails are reported as absent.
    pub(super) fn into_identity(self) -> Result<Identity, String> {
        let id = UserId::new(self.id.as_str())
            .map_err(|err| format!("user id {:?} rejected: {err}", self.id))?;
        let email = self.email.filter(|email| !email.trim().is_empty());
        Ok(Identity::new(id, email, self.user_metadata))
    }
}

impl UserListDto {
    pub(super) fn into_identities(self) -> Result<Vec<Identity>, String> {
        self.users.into_iter().map(UserDto::into_identity).collect()
    }
}
