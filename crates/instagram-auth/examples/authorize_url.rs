//! Print an Instagram authorization URL, or complete a callback.
//!
//! ```text
//! cargo run -p instagram-auth --example authorize_url -- [--config PATH] [--code CODE] [--long-lived]
//! ```
//!
//! Without `--code`, prints a fresh state and the redirect URL. With
//! `--code`, exchanges it, fetches the profile and optionally upgrades the
//! token. Tokens are never printed.

use instagram_auth::{AuthorizationRequest, Config, generate_state};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let args: Vec<String> = std::env::args().collect();

    let path = Config::resolve_path(flag_value(&args, "--config"));
    let config = match Config::load(&path) {
        Ok(config) => config,
        Err(e) => {
            error!(path = %path.display(), error = %e, "failed to load config");
            std::process::exit(1);
        }
    };
    let flow = match config.build_flow() {
        Ok(flow) => flow,
        Err(e) => {
            error!(error = %e, "failed to build flow");
            std::process::exit(1);
        }
    };

    let Some(code) = flag_value(&args, "--code") else {
        let state = generate_state();
        let url = flow.authorization_url(&AuthorizationRequest::new(state.clone()));
        println!("state: {state}");
        println!("{url}");
        return;
    };

    let user = match flow.authenticate(code).await {
        Ok(user) => user,
        Err(e) => {
            error!(error = %e, provider_message = ?e.provider_message(), "callback failed");
            std::process::exit(1);
        }
    };
    info!(
        user_id = %user.profile.id,
        username = %user.profile.name,
        account_type = ?user.profile.account_type,
        media_count = ?user.profile.media_count,
        "authenticated"
    );

    if args.iter().any(|a| a == "--long-lived") {
        match flow.upgrade_to_long_lived(&user.token.access_token).await {
            Ok(token) => info!(expires_in = ?token.expires_in, "long-lived token issued"),
            Err(e) => {
                error!(error = %e, "long-lived exchange failed");
                std::process::exit(1);
            }
        }
    }
}

fn flag_value<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}
