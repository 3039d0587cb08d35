//! Client credentials for the Instagram app
//!
//! Supplied once when the flow is built and never mutated afterwards. The
//! secret is wrapped in [`Secret`] so `Debug` output and tracing fields
//! never contain it.

use common::Secret;

/// Env var holding the Instagram app id.
pub const CLIENT_ID_ENV: &str = "INSTAGRAM_CLIENT_ID";
/// Env var holding the Instagram app secret.
pub const CLIENT_SECRET_ENV: &str = "INSTAGRAM_CLIENT_SECRET";
/// Env var holding the registered OAuth redirect URI.
pub const REDIRECT_URI_ENV: &str = "INSTAGRAM_REDIRECT_URI";

#[derive(Debug, Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: Secret<String>,
    pub redirect_uri: String,
}

impl ClientCredentials {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<Secret<String>>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
        }
    }

    /// Build credentials from `INSTAGRAM_CLIENT_ID`, `INSTAGRAM_CLIENT_SECRET`
    /// and `INSTAGRAM_REDIRECT_URI`. All three must be set.
    pub fn from_env() -> common::Result<Self> {
        let client_id = require_env(CLIENT_ID_ENV)?;
        let client_secret = require_env(CLIENT_SECRET_ENV)?;
        let redirect_uri = require_env(REDIRECT_URI_ENV)?;
        Ok(Self::new(client_id, client_secret, redirect_uri))
    }

    /// The secret, or `None` when it is blank.
    pub(crate) fn configured_secret(&self) -> Option<&str> {
        if self.client_secret.is_blank() {
            None
        } else {
            Some(self.client_secret.expose())
        }
    }
}

fn require_env(key: &'static str) -> common::Result<String> {
    std::env::var(key).map_err(|_| common::Error::MissingEnv(key))
}
