//! Bearer-token gate for the protected API routes.
//!
//! Tokens come from the `[auth]` config section; the matching entry's name
//! becomes the request [`Principal`], which handlers read to attribute and
//! scope the documents they create.

use std::collections::HashMap;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use rand::Rng;
use tracing::{debug, warn};

use super::state::AppState;
use crate::config::AuthConfig;
use crate::error::AppError;

/// Principal used for every request when auth is not required.
pub const ANONYMOUS: &str = "anonymous";

/// Token charset: alphanumeric without ambiguous chars (0/O, 1/I/l).
const TOKEN_CHARSET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZabcdefghjkmnpqrstuvwxyz23456789";
const TOKEN_LEN: usize = 32;

/// Generate a random API token for the `[[auth.tokens]]` config section.
pub fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    (0..TOKEN_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..TOKEN_CHARSET.len());
            TOKEN_CHARSET[idx] as char
        })
        .collect()
}

/// The authenticated caller, inserted into request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub name: String,
}

/// Result of checking a request's credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthDecision {
    Allowed(Principal),
    /// The `String` is a human-readable reason returned to the caller.
    Denied(String),
}

#[derive(Debug, Clone)]
pub struct TokenGate {
    required: bool,
    /// token -> principal name
    tokens: HashMap<String, String>,
}

impl TokenGate {
    pub fn from_config(config: &AuthConfig) -> Self {
        if config.required && config.tokens.is_empty() {
            warn!(
                "auth is required but no API tokens are configured; \
                 protected routes will reject every request"
            );
        }
        Self {
            required: config.required,
            tokens: config
                .tokens
                .iter()
                .map(|t| (t.token.clone(), t.name.clone()))
                .collect(),
        }
    }

    /// Decide on a raw `Authorization` header value.
    pub fn authorize(&self, header: Option<&str>) -> AuthDecision {
        if !self.required {
            return AuthDecision::Allowed(Principal {
                name: ANONYMOUS.to_string(),
            });
        }

        let Some(header) = header else {
            return AuthDecision::Denied("missing bearer token".to_string());
        };
        let Some(token) = header.strip_prefix("Bearer ").map(str::trim) else {
            return AuthDecision::Denied(
                "authorization header must use the Bearer scheme".to_string(),
            );
        };

        match self.tokens.get(token) {
            Some(name) => AuthDecision::Allowed(Principal { name: name.clone() }),
            None => AuthDecision::Denied("invalid token".to_string()),
        }
    }
}

/// Middleware: reject unauthenticated requests, attach the [`Principal`] otherwise.
pub async fn require_token(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match state.gate.authorize(header) {
        AuthDecision::Allowed(principal) => {
            debug!(principal = %principal.name, path = %request.uri().path(), "request authorized");
            request.extensions_mut().insert(principal);
            Ok(next.run(request).await)
        }
        AuthDecision::Denied(reason) => Err(AppError::Unauthorized(reason)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiToken;

    fn gate(required: bool) -> TokenGate {
        TokenGate::from_config(&AuthConfig {
            required,
            tokens: vec![ApiToken {
                name: "analyst".into(),
                token: "s3cret".into(),
            }],
        })
    }

    #[test]
    fn test_valid_token_is_allowed() {
        assert_eq!(
            gate(true).authorize(Some("Bearer s3cret")),
            AuthDecision::Allowed(Principal {
                name: "analyst".into()
            })
        );
    }

    #[test]
    fn test_missing_or_wrong_token_is_denied() {
        let gate = gate(true);
        assert!(matches!(gate.authorize(None), AuthDecision::Denied(_)));
        assert!(matches!(gate.authorize(Some("Bearer nope")), AuthDecision::Denied(_)));
        assert!(matches!(gate.authorize(Some("Basic s3cret")), AuthDecision::Denied(_)));
    }

    #[test]
    fn test_generated_tokens_use_charset() {
        let token = generate_token();
        assert_eq!(token.len(), TOKEN_LEN);
        assert!(token.bytes().all(|b| TOKEN_CHARSET.contains(&b)));
        assert_ne!(token, generate_token());
    }

    #[test]
    fn test_not_required_runs_as_anonymous() {
        assert_eq!(
            gate(false).authorize(None),
            AuthDecision::Allowed(Principal {
                name: ANONYMOUS.into()
            })
        );
    }
}
