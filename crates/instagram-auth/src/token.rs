//! Authorization code exchange and long-lived token upgrade
//!
//! Two token interactions, on two different hosts:
//! 1. Code exchange: form-encoded POST to `api.instagram.com`, returns a
//!    short-lived (about one hour) token.
//! 2. Long-lived upgrade: GET to `graph.instagram.com` with the client
//!    secret in the query string (Instagram's documented contract), returns
//!    a token valid for about 60 days.
//!
//! Neither call is retried. An authorization code is single-use, so a
//! retried exchange would fail anyway and hide the original error.

use common::Secret;
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use crate::constants::{AUTHORIZATION_CODE_GRANT, LONG_LIVED_EXCHANGE_GRANT};
use crate::credentials::ClientCredentials;
use crate::error::{Error, Failure, Result};
use crate::response::{JsonObject, missing_or_rejected, read_object};

/// Credential payload from the token endpoints.
///
/// `raw` keeps the whole decoded body so provider-specific fields
/// (`user_id`, `permissions`) stay reachable.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: Option<String>,
    /// Seconds until the token expires (delta, not absolute)
    pub expires_in: Option<u64>,
    pub raw: JsonObject,
}

impl TokenResponse {
    /// Parse a decoded body. Returns `None` when no `access_token` is present.
    ///
    /// The code exchange can answer either with a flat object or with the
    /// credential wrapped as `{"data": [{...}]}`; both are accepted.
    pub fn from_raw(raw: JsonObject) -> Option<Self> {
        let credential = credential_object(&raw)?;
        let access_token = credential.get("access_token")?.as_str()?.to_owned();
        let token_type = credential
            .get("token_type")
            .and_then(Value::as_str)
            .map(str::to_owned);
        let expires_in = credential.get("expires_in").and_then(Value::as_u64);

        Some(Self {
            access_token,
            token_type,
            expires_in,
            raw,
        })
    }

    /// The Instagram user id the token belongs to.
    ///
    /// Instagram sends it as a JSON number on some API versions and as a
    /// string on others.
    pub fn user_id(&self) -> Option<String> {
        match credential_object(&self.raw)?.get("user_id")? {
            Value::String(id) => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }

    /// Permissions granted by the user, from a comma-separated string or an
    /// array. Empty when the provider did not report them.
    pub fn permissions(&self) -> Vec<String> {
        let Some(credential) = credential_object(&self.raw) else {
            return Vec::new();
        };
        match credential.get("permissions") {
            Some(Value::String(list)) => list
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_owned)
                .collect(),
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// The object holding `access_token`: the body itself, or `data[0]`.
fn credential_object(raw: &JsonObject) -> Option<&JsonObject> {
    if raw.contains_key("access_token") {
        return Some(raw);
    }
    raw.get("data")?
        .as_array()?
        .first()?
        .as_object()
        .filter(|inner| inner.contains_key("access_token"))
}

/// Exchange an authorization code for a short-lived access token.
pub async fn exchange_code(
    client: &reqwest::Client,
    endpoint: &Url,
    credentials: &ClientCredentials,
    code: &str,
) -> Result<TokenResponse> {
    debug!(endpoint = %endpoint, "exchanging authorization code");

    let response = client
        .post(endpoint.clone())
        .header(reqwest::header::ACCEPT, "application/json")
        .form(&[
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.expose().as_str()),
            ("grant_type", AUTHORIZATION_CODE_GRANT),
            ("redirect_uri", credentials.redirect_uri.as_str()),
            ("code", code),
        ])
        .send()
        .await
        .map_err(|e| exchange_failed(Failure::Transport(e.without_url())))?;

    let body = read_object(response).await.map_err(exchange_failed)?;
    let token = parse_token(body).map_err(exchange_failed)?;

    let user_id = token.user_id();
    info!(
        user_id = user_id.as_deref().unwrap_or("unknown"),
        "authorization code exchanged"
    );
    Ok(token)
}

/// Exchange a short-lived token for a long-lived one.
///
/// On success the decoded body is returned as-is (`access_token`,
/// `token_type`, `expires_in`).
pub async fn exchange_for_long_lived(
    client: &reqwest::Client,
    endpoint: &Url,
    client_secret: &Secret<String>,
    short_lived_token: &str,
) -> Result<TokenResponse> {
    debug!(endpoint = %endpoint, "requesting long-lived token");

    let mut url = endpoint.clone();
    url.query_pairs_mut()
        .append_pair("grant_type", LONG_LIVED_EXCHANGE_GRANT)
        .append_pair("client_secret", client_secret.expose())
        .append_pair("access_token", short_lived_token);

    let response = client
        .get(url)
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await
        .map_err(|e| upgrade_failed(Failure::Transport(e.without_url())))?;

    let body = read_object(response).await.map_err(upgrade_failed)?;
    let token = parse_token(body).map_err(upgrade_failed)?;

    info!(expires_in = ?token.expires_in, "long-lived token issued");
    Ok(token)
}

/// A body without a usable `access_token` is a rejection when it carries a
/// provider error, and a missing field otherwise.
fn parse_token(body: JsonObject) -> std::result::Result<TokenResponse, Failure> {
    let has_token = credential_object(&body)
        .and_then(|credential| credential.get("access_token"))
        .is_some_and(Value::is_string);
    if !has_token {
        return Err(missing_or_rejected(&body, "access_token"));
    }
    TokenResponse::from_raw(body).ok_or(Failure::MissingField("access_token"))
}

fn exchange_failed(failure: Failure) -> Error {
    log_failure("token exchange", &failure);
    Error::TokenExchange(failure)
}

fn upgrade_failed(failure: Failure) -> Error {
    log_failure("long-lived token exchange", &failure);
    Error::TokenUpgrade(failure)
}

pub(crate) fn log_failure(operation: &str, failure: &Failure) {
    match failure {
        Failure::Rejected {
            status, message, ..
        } => warn!(operation, status = ?status, message = %message, "provider rejected request"),
        other => warn!(operation, error = %other, "request failed"),
    }
}
