//! Authorization redirect URL and CSRF state helpers
//!
//! Builds the URL the user is sent to for consent. Standard OAuth2 query
//! parameters come first; caller-supplied custom parameters are appended
//! after them in insertion order, without de-duplication, so a custom
//! `scope` or `state` shadows the standard one for providers that read the
//! last value. Nothing here validates scope or state contents.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngExt;
use subtle::ConstantTimeEq;
use url::Url;

use crate::constants::{DEFAULT_SCOPES, SCOPE_SEPARATOR};

/// Number of random bytes behind a generated state value.
const STATE_BYTES: usize = 40;

/// Parameters for one authorization redirect.
///
/// Built fresh per redirect. Starts with [`DEFAULT_SCOPES`] and no custom
/// parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    pub state: String,
    pub scopes: Vec<String>,
    pub custom_parameters: Vec<(String, String)>,
}

impl AuthorizationRequest {
    pub fn new(state: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            scopes: DEFAULT_SCOPES.iter().map(|s| (*s).to_owned()).collect(),
            custom_parameters: Vec::new(),
        }
    }

    /// Replace the requested scopes.
    pub fn scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    /// Add one scope to the requested set.
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scopes.push(scope.into());
        self
    }

    /// Append a custom query parameter.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_parameters.push((key.into(), value.into()));
        self
    }

    /// Append several custom query parameters, keeping their order.
    pub fn with_parameters<I, K, V>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.custom_parameters
            .extend(parameters.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Scopes joined by a single space. Repeated scopes are emitted once,
    /// at their first position.
    pub fn scope_string(&self) -> String {
        let mut seen: Vec<&str> = Vec::with_capacity(self.scopes.len());
        for scope in &self.scopes {
            if !seen.contains(&scope.as_str()) {
                seen.push(scope);
            }
        }
        seen.join(SCOPE_SEPARATOR)
    }
}

/// Build the authorization redirect URL.
///
/// Values are form-urlencoded, so the space between scopes is emitted as
/// `+` and decodes back to a single space.
pub fn build_authorization_url(
    endpoint: &Url,
    client_id: &str,
    redirect_uri: &str,
    request: &AuthorizationRequest,
) -> String {
    let mut url = endpoint.clone();
    url.query_pairs_mut()
        .append_pair("client_id", client_id)
        .append_pair("redirect_uri", redirect_uri)
        .append_pair("response_type", "code")
        .append_pair("state", &request.state)
        .append_pair("scope", &request.scope_string());

    if !request.custom_parameters.is_empty() {
        url.query_pairs_mut()
            .extend_pairs(request.custom_parameters.iter());
    }

    url.into()
}

/// Generate an opaque, URL-safe state value for CSRF protection.
///
/// The host application stores it in the user's session and checks the
/// callback with [`state_matches`].
pub fn generate_state() -> String {
    let mut bytes = [0u8; STATE_BYTES];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Constant-time comparison of the stored state and the callback's state.
///
/// An empty stored state never matches.
pub fn state_matches(expected: &str, returned: &str) -> bool {
    if expected.is_empty() {
        return false;
    }
    expected.as_bytes().ct_eq(returned.as_bytes()).into()
}
