//! Bearer-token gate for protected routes.

use axum::http::{header::AUTHORIZATION, HeaderMap};
use tracing::debug;

use crate::account::{token::TokenService, AccountError, Identity, UNAUTHORIZED};

/// Pull the bearer token out of the `Authorization` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Verify the request's bearer token and resolve the caller's identity.
///
/// Missing, malformed, tampered and expired tokens all collapse to the same
/// generic rejection; the precise cause only reaches the logs. Rejection is
/// terminal for the request.
///
/// # Errors
///
/// `Auth` when no valid token is presented.
pub fn require_auth(headers: &HeaderMap, tokens: &TokenService) -> Result<Identity, AccountError> {
    let Some(token) = bearer_token(headers) else {
        debug!("missing bearer token");
        return Err(AccountError::Auth(UNAUTHORIZED));
    };
    match tokens.verify(&token) {
        Ok(claims) => Ok(Identity {
            id: claims.sub,
            name: claims.name,
        }),
        Err(err) => {
            debug!("rejected bearer token: {err}");
            Err(AccountError::Auth(UNAUTHORIZED))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use secrecy::SecretString;
    use uuid::Uuid;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn tokens() -> TokenService {
        TokenService::new(SecretString::from("gate-secret".to_string()), 3600)
    }

    #[test]
    fn bearer_token_accepts_both_prefix_cases() {
        assert_eq!(
            bearer_token(&headers_with("Bearer abc")),
            Some("abc".to_string())
        );
        assert_eq!(
            bearer_token(&headers_with("bearer abc")),
            Some("abc".to_string())
        );
        assert_eq!(
            bearer_token(&headers_with("  Bearer   abc  ")),
            Some("abc".to_string())
        );
    }

    #[test]
    fn bearer_token_rejects_missing_or_empty() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
        assert_eq!(bearer_token(&headers_with("Bearer ")), None);
        assert_eq!(bearer_token(&headers_with("Basic abc")), None);
        assert_eq!(bearer_token(&headers_with("abc")), None);
    }

    #[test]
    fn require_auth_resolves_identity_from_valid_token() {
        let tokens = tokens();
        let id = Uuid::new_v4();
        let token = tokens.issue(id, "Ada").unwrap();

        let identity = require_auth(&headers_with(&format!("Bearer {token}")), &tokens).unwrap();
        assert_eq!(identity.id, id);
        assert_eq!(identity.name, "Ada");
    }

    #[test]
    fn require_auth_rejects_absent_and_invalid_tokens_identically() {
        let tokens = tokens();
        let absent = require_auth(&HeaderMap::new(), &tokens).unwrap_err();
        let garbage = require_auth(&headers_with("Bearer not.a.token"), &tokens).unwrap_err();

        assert_eq!(absent.to_string(), garbage.to_string());
        assert!(matches!(absent, AccountError::Auth(_)));
        assert!(matches!(garbage, AccountError::Auth(_)));
    }

    #[test]
    fn require_auth_rejects_expired_token() {
        let tokens = tokens();
        let token = tokens.issue_at(Uuid::new_v4(), "Ada", 0).unwrap();
        let result = require_auth(&headers_with(&format!("Bearer {token}")), &tokens);
        assert!(matches!(result, Err(AccountError::Auth(_))));
    }

    #[test]
    fn require_auth_rejects_token_signed_with_other_key() {
        let other = TokenService::new(SecretString::from("other-secret".to_string()), 3600);
        let token = other.issue(Uuid::new_v4(), "Ada").unwrap();
        let result = require_auth(&headers_with(&format!("Bearer {token}")), &tokens());
        assert!(matches!(result, Err(AccountError::Auth(_))));
    }
}
