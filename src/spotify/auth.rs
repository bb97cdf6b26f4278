use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use color_eyre::eyre::{Context, Result, eyre};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::Deserialize;
use tokio::sync::oneshot;

use crate::spotify::types::SpotifyTokenResponse;

const SPOTIFY_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

const SCOPES: &str = "user-read-private playlist-modify-public playlist-modify-private user-library-read user-library-modify";

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Port of the local callback listener; the redirect URI registered with
    /// Spotify has to match it.
    pub callback_port: u16,
}

/// Generate a random state parameter for CSRF protection
fn generate_state() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

fn build_auth_url(config: &AuthConfig, redirect_uri: &str, state: &str) -> String {
    format!(
        "{}?client_id={}&response_type=code&redirect_uri={}&state={}&scope={}",
        SPOTIFY_AUTH_URL,
        urlencoding::encode(&config.client_id),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(state),
        urlencoding::encode(SCOPES)
    )
}

struct CallbackContext {
    expected_state: String,
    /// Consumed by the first valid callback; later hits get a 404.
    code_tx: Mutex<Option<oneshot::Sender<String>>>,
}

#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

async fn handle_callback(
    State(context): State<Arc<CallbackContext>>,
    Query(params): Query<CallbackParams>,
) -> (StatusCode, &'static str) {
    if params.state.as_deref() != Some(context.expected_state.as_str()) {
        return (StatusCode::NOT_FOUND, "State mismatch");
    }
    if params.error.is_some() {
        return (StatusCode::FORBIDDEN, "Login was denied");
    }
    let Some(code) = params.code else {
        return (StatusCode::BAD_REQUEST, "Missing authorization code");
    };

    let sender = context.code_tx.lock().unwrap_or_else(|e| e.into_inner()).take();
    match sender {
        Some(tx) => {
            let _ = tx.send(code);
            (StatusCode::OK, "Login completed! You can close this tab.")
        }
        None => (StatusCode::NOT_FOUND, "Already logged in"),
    }
}

/// Runs the authorization-code flow: starts a one-shot callback listener,
/// prints the login URL, waits for the browser redirect and exchanges the
/// code for an access token.
pub async fn authorize(config: &AuthConfig) -> Result<String> {
    let state = generate_state();
    let redirect_uri = format!("http://localhost:{}/callback", config.callback_port);

    let (code_tx, code_rx) = oneshot::channel();
    let context = Arc::new(CallbackContext {
        expected_state: state.clone(),
        code_tx: Mutex::new(Some(code_tx)),
    });
    let app = Router::new()
        .route("/callback", get(handle_callback))
        .with_state(context);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", config.callback_port))
        .await
        .wrap_err("Failed to bind the auth callback listener")?;
    let server = tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            tracing::error!("Auth callback server failed: {err}");
        }
    });

    let auth_url = build_auth_url(config, &redirect_uri, &state);
    println!("Please log in to Spotify by visiting the following page in your browser: {auth_url}");

    let code = code_rx
        .await
        .wrap_err("Auth callback listener went away before a login completed")?;
    server.abort();

    let token = exchange_code_for_token(config, &code, &redirect_uri)
        .await
        .wrap_err("Failed to exchange the authorization code for a token")?;
    tracing::debug!("Access token valid for {} seconds", token.expires_in);

    Ok(token.access_token)
}

/// Exchange authorization code for access token
/// https://developer.spotify.com/documentation/web-api/tutorials/code-flow
async fn exchange_code_for_token(
    config: &AuthConfig,
    code: &str,
    redirect_uri: &str,
) -> Result<SpotifyTokenResponse> {
    let client = reqwest::Client::new();

    let mut params = HashMap::new();
    params.insert("grant_type", "authorization_code");
    params.insert("code", code);
    params.insert("redirect_uri", redirect_uri);

    let response = client
        .post(SPOTIFY_TOKEN_URL)
        // Serializes to x-www-form-urlencoded, as the token endpoint requires
        .form(&params)
        .basic_auth(&config.client_id, Some(&config.client_secret))
        .timeout(Duration::from_secs(10))
        .send()
        .await
        .wrap_err("Failed to send token request")?;

    if !response.status().is_success() {
        let reason = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to get error text".to_string());
        return Err(eyre!("Token endpoint rejected the code: {reason}"));
    }

    response
        .json()
        .await
        .wrap_err("Failed to parse token response")
}
