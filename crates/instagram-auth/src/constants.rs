//! Instagram API endpoints and protocol constants
//!
//! The authorize and code-exchange endpoints live on `api.instagram.com`;
//! the long-lived exchange and profile endpoints live on the Graph host
//! (`graph.instagram.com`). Mixing the two hosts up yields a 400 with an
//! unhelpful "unsupported request" payload.

/// Authorization endpoint the user is redirected to for consent
pub const AUTHORIZE_ENDPOINT: &str = "https://api.instagram.com/oauth/authorize";

/// Token endpoint for the authorization code exchange (form-encoded POST)
pub const TOKEN_ENDPOINT: &str = "https://api.instagram.com/oauth/access_token";

/// Short-lived to long-lived exchange endpoint (GET with query parameters)
pub const LONG_LIVED_TOKEN_ENDPOINT: &str = "https://graph.instagram.com/access_token";

/// Profile of the user who owns the access token
pub const PROFILE_ENDPOINT: &str = "https://graph.instagram.com/me";

/// Scope requested when the caller does not choose any.
pub const DEFAULT_SCOPES: &[&str] = &["instagram_business_basic"];

/// Instagram separates scopes with a single space (not a comma).
pub const SCOPE_SEPARATOR: &str = " ";

/// Profile fields requested when the caller does not choose any.
pub const DEFAULT_PROFILE_FIELDS: &[&str] = &["account_type", "id", "username", "media_count"];

pub const AUTHORIZATION_CODE_GRANT: &str = "authorization_code";

pub const LONG_LIVED_EXCHANGE_GRANT: &str = "ig_exchange_token";
