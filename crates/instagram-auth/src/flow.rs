//! The Instagram OAuth flow
//!
//! One value holding the HTTP client, the app credentials and the
//! endpoints, exposing each protocol step directly. Every operation takes
//! `&self` and returns its result; nothing is cached between calls, so a
//! single flow can serve concurrent callbacks.
//!
//! Typical callback handling:
//! 1. `authorization_url()` with a state from `generate_state()`, redirect
//! 2. Callback: check state with `state_matches()`, then `authenticate(code)`
//! 3. Optionally `upgrade_to_long_lived()` with the short-lived token

use std::net::IpAddr;

use tracing::debug;
use url::{Host, Url};

use crate::authorize::{AuthorizationRequest, build_authorization_url};
use crate::constants::{
    AUTHORIZE_ENDPOINT, DEFAULT_PROFILE_FIELDS, LONG_LIVED_TOKEN_ENDPOINT, PROFILE_ENDPOINT,
    TOKEN_ENDPOINT,
};
use crate::credentials::ClientCredentials;
use crate::error::{Error, Result};
use crate::profile::{self, UserProfile};
use crate::token::{self, TokenResponse};

/// Instagram endpoint URLs. Overridable for testing or proxies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub authorize: Url,
    pub token: Url,
    pub long_lived_token: Url,
    pub profile: Url,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            authorize: builtin(AUTHORIZE_ENDPOINT),
            token: builtin(TOKEN_ENDPOINT),
            long_lived_token: builtin(LONG_LIVED_TOKEN_ENDPOINT),
            profile: builtin(PROFILE_ENDPOINT),
        }
    }
}

fn builtin(endpoint: &'static str) -> Url {
    Url::parse(endpoint).unwrap_or_else(|e| unreachable!("built-in endpoint {endpoint}: {e}"))
}

impl Endpoints {
    /// Parse one endpoint and check it is safe to send credentials to.
    pub fn parse(endpoint: &str) -> Result<Url> {
        let url = Url::parse(endpoint)
            .map_err(|e| Error::InvalidEndpoint(format!("{endpoint}: {e}")))?;
        check_transport(&url)?;
        Ok(url)
    }

    /// Every endpoint must use `https`, except loopback hosts.
    ///
    /// The code exchange and the long-lived exchange both carry the client
    /// secret, the latter in the query string.
    pub fn validate(&self) -> Result<()> {
        for url in [
            &self.authorize,
            &self.token,
            &self.long_lived_token,
            &self.profile,
        ] {
            check_transport(url)?;
        }
        Ok(())
    }
}

fn check_transport(url: &Url) -> Result<()> {
    match url.scheme() {
        "https" => Ok(()),
        "http" if is_loopback(url) => Ok(()),
        scheme => Err(Error::InvalidEndpoint(format!(
            "{url}: scheme {scheme} is not allowed, use https"
        ))),
    }
}

fn is_loopback(url: &Url) -> bool {
    match url.host() {
        Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(ip)) => IpAddr::V4(ip).is_loopback(),
        Some(Host::Ipv6(ip)) => IpAddr::V6(ip).is_loopback(),
        None => false,
    }
}

/// Result of a completed callback: the token payload and the profile.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedUser {
    pub token: TokenResponse,
    pub profile: UserProfile,
}

/// Client side of Instagram's authorization code flow.
#[derive(Debug, Clone)]
pub struct InstagramFlow {
    http: reqwest::Client,
    credentials: ClientCredentials,
    endpoints: Endpoints,
}

impl InstagramFlow {
    /// Flow against the production Instagram endpoints.
    pub fn new(http: reqwest::Client, credentials: ClientCredentials) -> Self {
        Self {
            http,
            credentials,
            endpoints: Endpoints::default(),
        }
    }

    /// Flow against custom endpoints, validated with [`Endpoints::validate`].
    pub fn with_endpoints(
        http: reqwest::Client,
        credentials: ClientCredentials,
        endpoints: Endpoints,
    ) -> Result<Self> {
        endpoints.validate()?;
        Ok(Self {
            http,
            credentials,
            endpoints,
        })
    }

    pub fn credentials(&self) -> &ClientCredentials {
        &self.credentials
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Redirect URL for `request`. Pure string construction.
    pub fn authorization_url(&self, request: &AuthorizationRequest) -> String {
        build_authorization_url(
            &self.endpoints.authorize,
            &self.credentials.client_id,
            &self.credentials.redirect_uri,
            request,
        )
    }

    /// Redirect URL from loose parts. Custom parameters are appended after
    /// the standard ones in iteration order.
    pub fn build_authorization_url<S, K, V>(
        &self,
        state: &str,
        scopes: impl IntoIterator<Item = S>,
        custom_parameters: impl IntoIterator<Item = (K, V)>,
    ) -> String
    where
        S: Into<String>,
        K: Into<String>,
        V: Into<String>,
    {
        let request = AuthorizationRequest::new(state)
            .scopes(scopes)
            .with_parameters(custom_parameters);
        self.authorization_url(&request)
    }

    /// Exchange the callback's authorization code for a short-lived token.
    pub async fn exchange_code_for_token(&self, code: &str) -> Result<TokenResponse> {
        token::exchange_code(&self.http, &self.endpoints.token, &self.credentials, code).await
    }

    /// Exchange a short-lived token for a long-lived (about 60 days) one.
    pub async fn upgrade_to_long_lived(&self, short_lived_token: &str) -> Result<TokenResponse> {
        token::exchange_for_long_lived(
            &self.http,
            &self.endpoints.long_lived_token,
            &self.credentials.client_secret,
            short_lived_token,
        )
        .await
    }

    /// Fetch the token owner's profile. `appsecret_proof` is attached when
    /// the client secret is non-empty.
    pub async fn fetch_profile(&self, access_token: &str, fields: &[&str]) -> Result<UserProfile> {
        profile::fetch_profile(
            &self.http,
            &self.endpoints.profile,
            access_token,
            fields,
            self.credentials.configured_secret(),
        )
        .await
    }

    pub async fn fetch_default_profile(&self, access_token: &str) -> Result<UserProfile> {
        self.fetch_profile(access_token, DEFAULT_PROFILE_FIELDS).await
    }

    /// Complete a callback: exchange the code, then fetch the profile with
    /// the short-lived token.
    pub async fn authenticate(&self, code: &str) -> Result<AuthenticatedUser> {
        let token = self.exchange_code_for_token(code).await?;
        let profile = self.fetch_default_profile(&token.access_token).await?;
        debug!(user_id = %profile.id, "callback completed");
        Ok(AuthenticatedUser { token, profile })
    }
}
