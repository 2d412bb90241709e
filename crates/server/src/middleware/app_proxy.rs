//! Shopify App Proxy signature verification.
//!
//! Shopify signs every proxied storefront request: the query string carries a
//! `signature` parameter holding hex HMAC-SHA256 over a canonical rendering
//! of the remaining parameters. The canonical message is each `key=value`
//! pair (percent-decoded, repeated keys kept as repeated pairs), sorted
//! lexicographically and concatenated with no separator.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use thiserror::Error;

use crate::error::AppError;
use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

/// Why a proxied request was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProxySignatureError {
    /// No `signature` parameter in the query string.
    #[error("missing signature parameter")]
    MissingSignature,

    /// The signature did not match the canonical message.
    #[error("invalid signature")]
    InvalidSignature,
}

/// Render the canonical message and extract the claimed signature from a raw
/// query string.
fn canonical_message(raw_query: &str) -> (String, Option<String>) {
    let mut signature = None;
    let mut rendered: Vec<String> = url::form_urlencoded::parse(raw_query.as_bytes())
        .filter_map(|(key, value)| {
            if key == "signature" {
                signature = Some(value.into_owned());
                None
            } else {
                Some(format!("{key}={value}"))
            }
        })
        .collect();

    rendered.sort();
    (rendered.concat(), signature)
}

/// Verify the App Proxy signature over a raw query string.
///
/// # Errors
///
/// Returns [`ProxySignatureError`] if the signature is absent, malformed,
/// or does not match.
pub fn verify_signature(
    raw_query: &str,
    secret: &SecretString,
) -> Result<(), ProxySignatureError> {
    let (message, signature) = canonical_message(raw_query);
    let signature = signature.ok_or(ProxySignatureError::MissingSignature)?;

    let claimed =
        hex::decode(&signature).map_err(|_| ProxySignatureError::InvalidSignature)?;

    let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
        .map_err(|_| ProxySignatureError::InvalidSignature)?;
    mac.update(message.as_bytes());

    // Constant-time comparison
    mac.verify_slice(&claimed)
        .map_err(|_| ProxySignatureError::InvalidSignature)
}

/// Middleware guarding App Proxy routes.
///
/// Skipped entirely when the configuration exempts the environment (local
/// development, where requests do not come through Shopify).
pub async fn verify_app_proxy(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if state.config().verify_proxy_signature() {
        let raw_query = request.uri().query().unwrap_or("");
        if let Err(err) = verify_signature(raw_query, &state.config().shopify.api_secret) {
            tracing::warn!(error = %err, "rejected app proxy request");
            return AppError::Unauthorized(err.to_string()).into_response();
        }
    }

    next.run(request).await
}
