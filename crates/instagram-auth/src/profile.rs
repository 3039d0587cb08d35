//! Authenticated profile fetch
//!
//! `GET /me` on the Graph host with the access token and a comma-joined
//! field list. When the app secret is known, an `appsecret_proof` is sent
//! too. Instagram then refuses the token unless the caller also knows the
//! secret, so a leaked token alone cannot read the profile.

use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use tracing::{debug, info};
use url::Url;

use crate::constants::DEFAULT_PROFILE_FIELDS;
use crate::error::{Error, Failure, Result};
use crate::response::{JsonObject, error_payload, missing_or_rejected, read_object};
use crate::token::log_failure;

type HmacSha256 = Hmac<Sha256>;

/// The authenticated Instagram user.
///
/// Mapped from the Graph payload: `id` and `username` are required,
/// everything else is optional. `raw` keeps the source object.
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub id: String,
    /// Instagram's `username`
    pub name: String,
    pub account_type: Option<String>,
    pub media_count: Option<u64>,
    pub raw: JsonObject,
}

impl UserProfile {
    /// Map a decoded Graph payload.
    ///
    /// `id` may arrive as a string or a number. A missing or non-integer
    /// `media_count` maps to `None` instead of failing.
    pub fn from_raw(raw: JsonObject) -> std::result::Result<Self, Failure> {
        let id = match raw.get("id") {
            Some(Value::String(id)) if !id.is_empty() => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            _ => return Err(Failure::MissingField("id")),
        };
        let name = match raw.get("username") {
            Some(Value::String(username)) if !username.is_empty() => username.clone(),
            _ => return Err(Failure::MissingField("username")),
        };
        let account_type = raw
            .get("account_type")
            .and_then(Value::as_str)
            .map(str::to_owned);
        let media_count = raw.get("media_count").and_then(Value::as_u64);

        Ok(Self {
            id,
            name,
            account_type,
            media_count,
            raw,
        })
    }
}

/// `appsecret_proof`: lowercase hex HMAC-SHA256 of the access token, keyed
/// by the app secret.
pub fn appsecret_proof(client_secret: &str, access_token: &str) -> String {
    // HMAC accepts keys of any length
    let mut mac = <HmacSha256 as Mac>::new_from_slice(client_secret.as_bytes())
        .unwrap_or_else(|_| unreachable!());
    mac.update(access_token.as_bytes());
    mac.finalize()
        .into_bytes()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Fetch the profile of the user owning `access_token`.
///
/// `fields` are sent comma-joined in the given order; an empty slice means
/// [`DEFAULT_PROFILE_FIELDS`]. With `client_secret` set, `appsecret_proof`
/// is attached.
pub async fn fetch_profile(
    client: &reqwest::Client,
    endpoint: &Url,
    access_token: &str,
    fields: &[&str],
    client_secret: Option<&str>,
) -> Result<UserProfile> {
    let fields = if fields.is_empty() {
        DEFAULT_PROFILE_FIELDS
    } else {
        fields
    };
    debug!(
        endpoint = %endpoint,
        fields = fields.len(),
        proof = client_secret.is_some(),
        "fetching profile"
    );

    let mut url = endpoint.clone();
    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("access_token", access_token)
            .append_pair("fields", &fields.join(","));
        if let Some(secret) = client_secret {
            query.append_pair("appsecret_proof", &appsecret_proof(secret, access_token));
        }
    }

    let response = client
        .get(url)
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await
        .map_err(|e| fetch_failed(Failure::Transport(e.without_url())))?;

    let body = read_object(response).await.map_err(fetch_failed)?;
    if error_payload(&body).is_some() {
        return Err(fetch_failed(missing_or_rejected(&body, "id")));
    }
    let profile = UserProfile::from_raw(body).map_err(fetch_failed)?;

    info!(user_id = %profile.id, "profile fetched");
    Ok(profile)
}

fn fetch_failed(failure: Failure) -> Error {
    log_failure("profile fetch", &failure);
    Error::ProfileFetch(failure)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use super::*;
    use crate::test_support::{MockProvider, Route};

    fn object(value: Value) -> JsonObject {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn proof_matches_known_vectors() {
        assert_eq!(
            appsecret_proof("s", "t"),
            "61f074c3fcd0a129debe8f2b1c6f66d8824d615cf8397cc192eb58a8b0367889"
        );
        assert_eq!(
            appsecret_proof("key", "The quick brown fox jumps over the lazy dog"),
            "f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8"
        );
    }

    #[test]
    fn maps_username_to_name() {
        let profile = UserProfile::from_raw(object(json!({
            "id": "1",
            "username": "bob",
            "account_type": "PERSONAL",
            "media_count": 5
        })))
        .unwrap();

        assert_eq!(profile.id, "1");
        assert_eq!(profile.name, "bob");
        assert_eq!(profile.account_type.as_deref(), Some("PERSONAL"));
        assert_eq!(profile.media_count, Some(5));
        assert_eq!(profile.raw["username"], "bob");
    }

    #[test]
    fn media_count_is_optional() {
        let profile = UserProfile::from_raw(object(json!({
            "id": 17841400000000000u64,
            "username": "bob"
        })))
        .unwrap();

        assert_eq!(profile.id, "17841400000000000");
        assert_eq!(profile.media_count, None);
        assert_eq!(profile.account_type, None);
    }

    #[test]
    fn missing_identity_fields_fail() {
        let err = UserProfile::from_raw(object(json!({"id": "1"}))).unwrap_err();
        assert!(matches!(err, Failure::MissingField("username")));

        let err = UserProfile::from_raw(object(json!({"username": "bob"}))).unwrap_err();
        assert!(matches!(err, Failure::MissingField("id")));
    }

    #[tokio::test]
    async fn fetch_sends_fields_and_proof() {
        let mock = MockProvider::start(vec![Route::json(
            "/me",
            StatusCode::OK,
            json!({"id": "1", "username": "bob", "account_type": "PERSONAL", "media_count": 5}),
        )])
        .await;

        let profile = fetch_profile(
            &reqwest::Client::new(),
            &mock.url("/me"),
            "t",
            DEFAULT_PROFILE_FIELDS,
            Some("s"),
        )
        .await
        .unwrap();

        assert_eq!(profile.name, "bob");
        assert_eq!(profile.media_count, Some(5));

        let request = mock.single_request();
        assert_eq!(request.method, "GET");
        assert_eq!(request.accept.as_deref(), Some("application/json"));
        assert_eq!(request.query_value("access_token"), Some("t"));
        assert_eq!(
            request.query_value("fields"),
            Some("account_type,id,username,media_count")
        );
        assert_eq!(
            request.query_value("appsecret_proof"),
            Some("61f074c3fcd0a129debe8f2b1c6f66d8824d615cf8397cc192eb58a8b0367889")
        );
    }

    #[tokio::test]
    async fn fetch_without_secret_omits_proof() {
        let mock = MockProvider::start(vec![Route::json(
            "/me",
            StatusCode::OK,
            json!({"id": "1", "username": "bob"}),
        )])
        .await;

        fetch_profile(
            &reqwest::Client::new(),
            &mock.url("/me"),
            "t",
            &["id", "username"],
            None,
        )
        .await
        .unwrap();

        let request = mock.single_request();
        assert_eq!(request.query_value("fields"), Some("id,username"));
        assert_eq!(request.query_value("appsecret_proof"), None);
    }

    #[tokio::test]
    async fn empty_field_list_uses_defaults() {
        let mock = MockProvider::start(vec![Route::json(
            "/me",
            StatusCode::OK,
            json!({"id": "1", "username": "bob"}),
        )])
        .await;

        fetch_profile(&reqwest::Client::new(), &mock.url("/me"), "t", &[], None)
            .await
            .unwrap();

        assert_eq!(
            mock.single_request().query_value("fields"),
            Some("account_type,id,username,media_count")
        );
    }

    #[tokio::test]
    async fn payload_without_username_is_profile_error() {
        let mock = MockProvider::start(vec![Route::json(
            "/me",
            StatusCode::OK,
            json!({"id": "1", "account_type": "BUSINESS"}),
        )])
        .await;

        let err = fetch_profile(&reqwest::Client::new(), &mock.url("/me"), "t", &[], None)
            .await
            .unwrap_err();

        assert!(
            matches!(err, Error::ProfileFetch(Failure::MissingField("username"))),
            "got: {err:?}"
        );
    }

    #[tokio::test]
    async fn graph_error_is_rejection() {
        let mock = MockProvider::start(vec![Route::json(
            "/me",
            StatusCode::BAD_REQUEST,
            json!({"error": {"message": "Invalid appsecret_proof provided in the API argument", "code": 100}}),
        )])
        .await;

        let err = fetch_profile(&reqwest::Client::new(), &mock.url("/me"), "t", &[], Some("s"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ProfileFetch(_)));
        assert_eq!(
            err.provider_message(),
            Some("Invalid appsecret_proof provided in the API argument")
        );
    }

    #[tokio::test]
    async fn malformed_json_is_profile_error() {
        let mock =
            MockProvider::start(vec![Route::text("/me", StatusCode::OK, "<html>oops</html>")]).await;

        let err = fetch_profile(&reqwest::Client::new(), &mock.url("/me"), "t", &[], None)
            .await
            .unwrap_err();

        assert!(
            matches!(err, Error::ProfileFetch(Failure::Decode(_))),
            "got: {err:?}"
        );
    }

    #[tokio::test]
    async fn unreachable_host_is_transport_error() {
        // Bind then drop a listener so the port is closed
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let endpoint = Url::parse(&format!("http://{addr}/me")).unwrap();

        let err = fetch_profile(&reqwest::Client::new(), &endpoint, "t", &[], Some("s"))
            .await
            .unwrap_err();

        assert!(err.is_transport(), "got: {err:?}");
        assert!(
            !err.to_string().contains("access_token"),
            "transport errors must not echo the query string: {err}"
        );
    }
}
