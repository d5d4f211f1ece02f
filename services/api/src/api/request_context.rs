//! Request-scoped context extracted from HTTP requests.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use sha2::{Digest, Sha256};
use tramdoc_id::RequestId;

use crate::api::error::ApiError;

pub const AUTHORIZATION_HEADER: &str = "Authorization";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Identity of the caller as derived from the bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// Stable, non-secret owner id used to scope books and notes.
    pub owner_id: String,
}

#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    /// `None` when the request carried no `Authorization` header.
    pub actor: Option<Actor>,
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

fn hashed_owner_id(subject: &str) -> String {
    let digest = Sha256::digest(subject.as_bytes());
    let hex = format!("{:x}", digest);
    let short = hex.get(..32).unwrap_or(&hex);
    format!("usr_{short}")
}

fn actor_from_authorization_header(
    headers: &HeaderMap,
    request_id: &str,
) -> Result<Option<Actor>, ApiError> {
    let Some(auth_value) = header_string(headers, AUTHORIZATION_HEADER) else {
        return Ok(None);
    };

    let auth_value = auth_value.trim();
    let Some(token) = auth_value.strip_prefix("Bearer ") else {
        return Err(ApiError::unauthorized(
            "invalid_authorization",
            "Authorization must be a Bearer token",
        )
        .with_request_id(request_id.to_string()));
    };

    let token = token.trim();
    if token.is_empty() {
        return Err(ApiError::unauthorized(
            "invalid_authorization",
            "Authorization Bearer token cannot be empty",
        )
        .with_request_id(request_id.to_string()));
    }

    // Dev stub until real sessions exist:
    // - `user:<email>` tokens identify a reader by email.
    // - any other token is opaque and mapped to a stable hashed owner id.
    // Bearer tokens are never persisted or logged; only the hash is kept.
    if let Some(email) = token.strip_prefix("user:") {
        let email = email.trim();
        if email.is_empty() || email.len() > 320 || !email.contains('@') {
            return Err(ApiError::unauthorized(
                "invalid_token",
                "user token must be in the form 'user:<email>'",
            )
            .with_request_id(request_id.to_string()));
        }

        return Ok(Some(Actor {
            owner_id: hashed_owner_id(&email.to_lowercase()),
        }));
    }

    Ok(Some(Actor {
        owner_id: hashed_owner_id(token),
    }))
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let request_id = header_string(&parts.headers, REQUEST_ID_HEADER)
            .unwrap_or_else(|| RequestId::new().to_string());

        let actor = actor_from_authorization_header(&parts.headers, &request_id)?;

        Ok(Self { request_id, actor })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_auth(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_str(value).unwrap());
        headers
    }

    fn actor(value: &str) -> Result<Option<Actor>, ApiError> {
        actor_from_authorization_header(&headers_with_auth(value), "req")
    }

    #[test]
    fn test_no_header_is_anonymous() {
        let actor = actor_from_authorization_header(&HeaderMap::new(), "req").unwrap();
        assert!(actor.is_none());
    }

    #[test]
    fn test_user_token_is_case_insensitive_and_stable() {
        let a = actor("Bearer user:Reader@Example.com").unwrap().unwrap();
        let b = actor("Bearer user:reader@example.com").unwrap().unwrap();
        assert_eq!(a, b);
        assert!(a.owner_id.starts_with("usr_"));
        assert_eq!(a.owner_id.len(), "usr_".len() + 32);
    }

    #[test]
    fn test_distinct_users_get_distinct_owner_ids() {
        let a = actor("Bearer user:a@example.com").unwrap().unwrap();
        let b = actor("Bearer user:b@example.com").unwrap().unwrap();
        assert_ne!(a.owner_id, b.owner_id);
    }

    #[test]
    fn test_non_bearer_rejected() {
        let err = actor("Basic abc").unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::UNAUTHORIZED);
        assert_eq!(err.problem.code, "invalid_authorization");
    }

    #[test]
    fn test_malformed_user_token_rejected() {
        let err = actor("Bearer user:nobody").unwrap_err();
        assert_eq!(err.problem.code, "invalid_token");
    }

    #[test]
    fn test_opaque_token_is_hashed() {
        let actor = actor("Bearer abc123").unwrap().unwrap();
        assert!(actor.owner_id.starts_with("usr_"));
        assert!(!actor.owner_id.contains("abc123"));
    }
}
