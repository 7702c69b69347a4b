//! Caller identity
//!
//! The identity provider is an external collaborator: it verifies a bearer
//! credential and yields a stable user identifier, which the rest of the
//! system trusts as-is. The provider is trait-based so deployments can
//! plug in their own verification.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

use crate::api::AppState;
use crate::api::error::ApiError;

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verifies a bearer credential; `None` means the credential is rejected.
    async fn verify(&self, credential: &str) -> Option<String>;
}

/// Identity provider for deployments where an upstream gateway has already
/// verified the credential and the bearer value is the stable user id.
pub struct TrustedTokenIdentity;

#[async_trait]
impl IdentityProvider for TrustedTokenIdentity {
    async fn verify(&self, credential: &str) -> Option<String> {
        let id = credential.trim();
        if id.is_empty() {
            None
        } else {
            Some(id.to_string())
        }
    }
}

/// The authenticated caller, extracted from the Authorization header
#[derive(Debug, Clone)]
pub struct AuthUser(pub String);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

        let credential = bearer_credential(header_value)
            .ok_or_else(|| ApiError::Unauthorized("Expected a bearer credential".to_string()))?;

        let user_id = state
            .identity
            .verify(credential)
            .await
            .ok_or_else(|| ApiError::Unauthorized("Credential rejected".to_string()))?;

        Ok(AuthUser(user_id))
    }
}

fn bearer_credential(header_value: &str) -> Option<&str> {
    let rest = header_value.strip_prefix("Bearer ")?;
    let credential = rest.trim();
    if credential.is_empty() {
        None
    } else {
        Some(credential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_credential_parsing() {
        assert_eq!(bearer_credential("Bearer abc123"), Some("abc123"));
        assert_eq!(bearer_credential("Bearer   spaced  "), Some("spaced"));
        assert_eq!(bearer_credential("Bearer "), None);
        assert_eq!(bearer_credential("Basic abc123"), None);
        assert_eq!(bearer_credential(""), None);
    }

    #[tokio::test]
    async fn test_trusted_token_identity() {
        let provider = TrustedTokenIdentity;
        assert_eq!(provider.verify("user-1").await.as_deref(), Some("user-1"));
        assert_eq!(provider.verify("  ").await, None);
    }
}
