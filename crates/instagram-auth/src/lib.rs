//! Instagram OAuth client library
//!
//! Client side of Instagram's authorization code flow: the consent redirect
//! URL, the code exchange, the short-lived to long-lived token upgrade and
//! the authenticated profile fetch (with `appsecret_proof`). HTTP transport
//! is a caller-supplied `reqwest::Client`; session storage and routing are
//! left to the host application.
//!
//! Flow:
//! 1. Host generates a state with `authorize::generate_state()` and stores it
//! 2. User is redirected to `InstagramFlow::authorization_url()`
//! 3. Callback: host checks the state with `authorize::state_matches()`
//! 4. `InstagramFlow::authenticate()` exchanges the code and fetches the profile
//! 5. Optionally `InstagramFlow::upgrade_to_long_lived()` for a 60-day token

pub mod authorize;
pub mod config;
pub mod constants;
pub mod credentials;
pub mod error;
pub mod flow;
pub mod profile;
mod response;
pub mod token;

#[cfg(test)]
mod test_support;

pub use authorize::{AuthorizationRequest, generate_state, state_matches};
pub use config::Config;
pub use constants::*;
pub use credentials::ClientCredentials;
pub use error::{Error, Failure, Result};
pub use flow::{AuthenticatedUser, Endpoints, InstagramFlow};
pub use profile::{UserProfile, appsecret_proof};
pub use token::TokenResponse;
