//! Configuration types and loading
//!
//! Precedence: env vars > config file > defaults. The client secret is
//! loaded from `INSTAGRAM_CLIENT_SECRET` or `client_secret_file`, never
//! from the TOML body, so config files can be committed without leaking it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use common::Secret;
use serde::Deserialize;
use tracing::info;

use crate::credentials::{CLIENT_ID_ENV, CLIENT_SECRET_ENV, ClientCredentials, REDIRECT_URI_ENV};
use crate::flow::{Endpoints, InstagramFlow};

/// Env var naming the config file when no path is given.
pub const CONFIG_PATH_ENV: &str = "INSTAGRAM_AUTH_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "instagram-auth.toml";

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub client: ClientConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub endpoints: EndpointOverrides,
}

/// Instagram app registration
#[derive(Debug, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub redirect_uri: String,
    /// Path to a file containing the app secret (alternative to the env var)
    #[serde(default)]
    pub client_secret_file: Option<PathBuf>,
    #[serde(skip)]
    pub client_secret: Option<Secret<String>>,
}

/// Outbound HTTP settings
#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
        }
    }
}

/// Optional replacements for the built-in Instagram endpoints
#[derive(Debug, Default, Deserialize)]
pub struct EndpointOverrides {
    pub authorize: Option<String>,
    pub token: Option<String>,
    pub long_lived_token: Option<String>,
    pub profile: Option<String>,
}

fn default_timeout() -> u64 {
    30
}

impl EndpointOverrides {
    /// Apply the overrides on top of the built-in endpoints.
    pub fn resolve(&self) -> crate::Result<Endpoints> {
        let mut endpoints = Endpoints::default();
        if let Some(url) = &self.authorize {
            endpoints.authorize = Endpoints::parse(url)?;
        }
        if let Some(url) = &self.token {
            endpoints.token = Endpoints::parse(url)?;
        }
        if let Some(url) = &self.long_lived_token {
            endpoints.long_lived_token = Endpoints::parse(url)?;
        }
        if let Some(url) = &self.profile {
            endpoints.profile = Endpoints::parse(url)?;
        }
        Ok(endpoints)
    }
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    ///
    /// Client secret resolution order:
    /// 1. `INSTAGRAM_CLIENT_SECRET` env var
    /// 2. `client_secret_file` path from config
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        if let Ok(client_id) = std::env::var(CLIENT_ID_ENV) {
            config.client.client_id = client_id;
        }
        if let Ok(redirect_uri) = std::env::var(REDIRECT_URI_ENV) {
            config.client.redirect_uri = redirect_uri;
        }

        if config.client.client_id.trim().is_empty() {
            return Err(common::Error::Config(format!(
                "client_id is required (set it in the file or via {CLIENT_ID_ENV})"
            )));
        }

        if !config.client.redirect_uri.starts_with("http://")
            && !config.client.redirect_uri.starts_with("https://")
        {
            return Err(common::Error::Config(format!(
                "redirect_uri must start with http:// or https://, got: {}",
                config.client.redirect_uri
            )));
        }

        if config.http.timeout_secs == 0 {
            return Err(common::Error::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        config
            .endpoints
            .resolve()
            .map_err(|e| common::Error::Config(e.to_string()))?;

        if let Ok(secret) = std::env::var(CLIENT_SECRET_ENV) {
            config.client.client_secret = Some(Secret::new(secret));
        } else if let Some(ref secret_file) = config.client.client_secret_file {
            let secret = std::fs::read_to_string(secret_file).map_err(|e| {
                common::Error::Config(format!(
                    "failed to read client_secret_file {}: {e}",
                    secret_file.display()
                ))
            })?;
            let secret = secret.trim().to_owned();
            if !secret.is_empty() {
                config.client.client_secret = Some(Secret::new(secret));
            }
        }

        info!(
            path = %path.display(),
            client_id = %config.client.client_id,
            secret_configured = config.client.client_secret.is_some(),
            "loaded instagram auth config"
        );
        Ok(config)
    }

    /// Resolve config file path from an explicit argument or `INSTAGRAM_AUTH_CONFIG`.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var(CONFIG_PATH_ENV) {
            return PathBuf::from(p);
        }
        PathBuf::from(DEFAULT_CONFIG_PATH)
    }

    /// Credentials for the flow. A missing secret becomes an empty one,
    /// which disables `appsecret_proof`.
    pub fn credentials(&self) -> ClientCredentials {
        ClientCredentials::new(
            self.client.client_id.clone(),
            self.client
                .client_secret
                .clone()
                .unwrap_or_else(|| Secret::new(String::new())),
            self.client.redirect_uri.clone(),
        )
    }

    /// Build the HTTP client and the flow described by this config.
    pub fn build_flow(&self) -> crate::Result<InstagramFlow> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.http.timeout_secs))
            .build()
            .map_err(crate::Error::HttpClient)?;
        InstagramFlow::with_endpoints(http, self.credentials(), self.endpoints.resolve()?)
    }
}
