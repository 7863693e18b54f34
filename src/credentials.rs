use std::collections::HashMap;

use crate::config::GitHubSettings;

/// Service name under which GitHub credentials are looked up.
pub const GITHUB_SERVICE: &str = "github";

/// Authentication material for one remote service.
#[derive(Clone, PartialEq, Eq)]
pub struct ServiceCredentials {
    pub username: String,
    /// Password or personal access token.
    pub token: String,
    pub email: Option<String>,
}

impl std::fmt::Debug for ServiceCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceCredentials")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .field("email", &self.email)
            .finish()
    }
}

/// Looks up credentials by service name.
///
/// Callers query it for every request instead of holding on to the result.
pub trait CredentialProvider: Send + Sync {
    fn service(&self, name: &str) -> Option<ServiceCredentials>;
}

/// In-memory keychain.
#[derive(Debug, Default, Clone)]
pub struct Keychain {
    services: HashMap<String, ServiceCredentials>,
}

impl Keychain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_service(&mut self, name: impl Into<String>, credentials: ServiceCredentials) {
        self.services.insert(name.into(), credentials);
    }
}

impl CredentialProvider for Keychain {
    fn service(&self, name: &str) -> Option<ServiceCredentials> {
        self.services.get(name).cloned()
    }
}

/// Keychain backed by the `github` section of the global configuration.
#[derive(Debug, Clone)]
pub struct EnvKeychain {
    github: Option<ServiceCredentials>,
}

impl EnvKeychain {
    pub fn new(settings: &GitHubSettings) -> Self {
        let github = match (&settings.username, &settings.token) {
            (Some(username), Some(token)) => Some(ServiceCredentials {
                username: username.clone(),
                token: token.clone(),
                email: settings.email.clone(),
            }),
            _ => None,
        };
        EnvKeychain { github }
    }
}

impl CredentialProvider for EnvKeychain {
    fn service(&self, name: &str) -> Option<ServiceCredentials> {
        match name {
            GITHUB_SERVICE => self.github.clone(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn keychain_returns_stored_service() {
        let mut keychain = Keychain::new();
        let credentials = ServiceCredentials {
            username: "TestUser".to_string(),
            token: "TestPass".to_string(),
            email: Some("testuser@testdomain.com".to_string()),
        };
        keychain.set_service(GITHUB_SERVICE, credentials.clone());
        assert_eq!(keychain.service(GITHUB_SERVICE), Some(credentials));
        assert_eq!(keychain.service("gitlab"), None);
    }

    #[test]
    fn env_keychain_needs_username_and_token() {
        let partial = GitHubSettings {
            username: Some("TestUser".to_string()),
            ..Default::default()
        };
        assert_eq!(EnvKeychain::new(&partial).service(GITHUB_SERVICE), None);

        let complete = GitHubSettings {
            token: Some("secret".to_string()),
            ..partial
        };
        let credentials = EnvKeychain::new(&complete).service(GITHUB_SERVICE).unwrap();
        assert_eq!(credentials.username, "TestUser");
        assert_eq!(credentials.token, "secret");
    }

    #[test]
    fn debug_output_hides_the_token() {
        let credentials = ServiceCredentials {
            username: "u".to_string(),
            token: "hunter2".to_string(),
            email: None,
        };
        assert!(!format!("{credentials:?}").contains("hunter2"));
    }
}
