//! Identity store connection settings read from the environment.
//!
//! Missing or invalid settings are reported as a typed error rather than
//! aborting start-up; the server then runs with an unconfigured gateway that
//! redirects every protected request to the configuration error page.

use std::fmt;

use mockable::Env;
use url::Url;
use zeroize::Zeroizing;

/// Base URL of the identity store, e.g. `https://project.supabase.co`.
pub const URL_ENV: &str = "IDENTITY_STORE_URL";
/// Public (anonymous) API key sent with every request.
pub const ANON_KEY_ENV: &str = "IDENTITY_STORE_ANON_KEY";
/// Privileged key required for listing users.
pub const SERVICE_ROLE_KEY_ENV: &str = "IDENTITY_STORE_SERVICE_ROLE_KEY";

/// Errors raised while reading identity store settings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityConfigError {
    /// A required variable is unset or blank.
    #[error("missing required environment variable: {name}")]
    MissingEnv { name: &'static str },
    /// The store URL does not parse or is not http(s).
    #[error("invalid value for IDENTITY_STORE_URL='{value}': {reason}")]
    InvalidUrl { value: String, reason: String },
}

/// Connection parameters for the identity store HTTP adapter.
#[derive(Clone)]
pub struct IdentityStoreConfig {
    url: Url,
    anon_key: Zeroizing<String>,
    service_role_key: Option<Zeroizing<String>>,
}

impl IdentityStoreConfig {
    pub fn new(url: Url, anon_key: impl Into<String>) -> Self {
        Self {
            url,
            anon_key: Zeroizing::new(anon_key.into()),
            service_role_key: None,
        }
    }

    #[must_use]
    pub fn with_service_role_key(mut self, key: impl Into<String>) -> Self {
        self.service_role_key = Some(Zeroizing::new(key.into()));
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn anon_key(&self) -> &str {
        self.anon_key.as_str()
    }

    pub fn service_role_key(&self) -> Option<&str> {
        self.service_role_key.as_deref().map(String::as_str)
    }
}

impl fmt::Debug for IdentityStoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityStoreConfig")
            .field("url", &self.url.as_str())
            .field("anon_key", &"<redacted>")
            .field(
                "service_role_key",
                &self.service_role_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

fn non_blank<E: Env>(env: &E, name: &'static str) -> Option<String> {
    env.string(name)
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn parse_url(raw: String) -> Result<Url, IdentityConfigError> {
    let url = Url::parse(&raw).map_err(|err| IdentityConfigError::InvalidUrl {
        value: raw.clone(),
        reason: err.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(IdentityConfigError::InvalidUrl {
            value: raw,
            reason: "scheme must be http or https".to_owned(),
        });
    }
    Ok(url)
}

/// Read identity store settings from `env`.
///
/// # Examples
///
/// ```rust
/// use marketplace_gateway::outbound::identity::identity_config_from_env;
/// use mockable::MockEnv;
///
/// let mut env = MockEnv::new();
/// env.expect_string().returning(|name| match name {
///     "IDENTITY_STORE_URL" => Some("https://auth.example.com".to_owned()),
///     "IDENTITY_STORE_ANON_KEY" => Some("anon".to_owned()),
///     _ => None,
/// });
///
/// let config = identity_config_from_env(&env).expect("valid settings");
/// assert_eq!(config.url().host_str(), Some("auth.example.com"));
/// assert!(config.service_role_key().is_none());
/// ```
pub fn identity_config_from_env<E: Env>(env: &E) -> Result<IdentityStoreConfig, IdentityConfigError> {
    let url = non_blank(env, URL_ENV).ok_or(IdentityConfigError::MissingEnv { name: URL_ENV })?;
    let anon_key =
        non_blank(env, ANON_KEY_ENV).ok_or(IdentityConfigError::MissingEnv { name: ANON_KEY_ENV })?;
    let config = IdentityStoreConfig::new(parse_url(url)?, anon_key);
    Ok(match non_blank(env, SERVICE_ROLE_KEY_ENV) {
        Some(key) => config.with_service_role_key(key),
        None => config,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockable::MockEnv;
    use rstest::rstest;
    use std::collections::HashMap;

    fn mock_env(vars: &[(&str, &str)]) -> MockEnv {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        let mut env = MockEnv::new();
        env.expect_string()
            .times(0..)
            .returning(move |key| vars.get(key).cloned());
        env
    }

    #[rstest]
    fn reads_all_settings() {
        let env = mock_env(&[
            (URL_ENV, "https://auth.example.com/"),
            (ANON_KEY_ENV, " anon-key "),
            (SERVICE_ROLE_KEY_ENV, "service-key"),
        ]);

        let config = identity_config_from_env(&env).expect("valid settings");

        assert_eq!(config.url().as_str(), "https://auth.example.com/");
        assert_eq!(config.anon_key(), "anon-key");
        assert_eq!(config.service_role_key(), Some("service-key"));
    }

    #[rstest]
    #[case(&[], URL_ENV)]
    #[case(&[(URL_ENV, "https://auth.example.com")], ANON_KEY_ENV)]
    #[case(&[(URL_ENV, "  "), (ANON_KEY_ENV, "anon")], URL_ENV)]
    #[case(&[(URL_ENV, "https://auth.example.com"), (ANON_KEY_ENV, "")], ANON_KEY_ENV)]
    fn missing_required_settings_are_reported(
        #[case] vars: &[(&str, &str)],
        #[case] expected: &'static str,
    ) {
        let err = identity_config_from_env(&mock_env(vars)).expect_err("settings incomplete");
        assert_eq!(err, IdentityConfigError::MissingEnv { name: expected });
    }

    #[rstest]
    #[case("not a url")]
    #[case("ftp://auth.example.com")]
    fn invalid_urls_are_rejected(#[case] raw: &str) {
        let env = mock_env(&[(URL_ENV, raw), (ANON_KEY_ENV, "anon")]);
        let err = identity_config_from_env(&env).expect_err("url rejected");
        assert!(matches!(err, IdentityConfigError::InvalidUrl { value, .. } if value == raw));
    }

    #[rstest]
    fn blank_service_key_is_treated_as_absent() {
        let env = mock_env(&[
            (URL_ENV, "https://auth.example.com"),
            (ANON_KEY_ENV, "anon"),
            (SERVICE_ROLE_KEY_ENV, " "),
        ]);
        let config = identity_config_from_env(&env).expect("valid settings");
        assert!(config.service_role_key().is_none());
    }

    #[rstest]
    fn debug_output_redacts_keys() {
        let config = IdentityStoreConfig::new(
            Url::parse("https://auth.example.com").expect("valid url"),
            "anon-secret",
        )
        .with_service_role_key("service-secret");

        let rendered = format!("{config:?}");

        assert!(!rendered.contains("anon-secret"));
        assert!(!rendered.contains("service-secret"));
        assert!(rendered.contains("auth.example.com"));
    }
}
