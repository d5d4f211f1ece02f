//! Authorization helpers.
//!
//! Every book and note belongs to exactly one reader. Handlers resolve the
//! caller's owner id here and then scope each query by it.

use crate::api::error::ApiError;
use crate::api::request_context::RequestContext;

/// Returns the caller's owner id, or 401 for anonymous requests.
pub fn require_owner(ctx: &RequestContext) -> Result<&str, ApiError> {
    ctx.actor
        .as_ref()
        .map(|actor| actor.owner_id.as_str())
        .ok_or_else(|| {
            ApiError::unauthorized("unauthorized", "Missing or invalid Authorization token")
                .with_request_id(ctx.request_id.clone())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::request_context::Actor;

    #[test]
    fn test_anonymous_rejected() {
        let ctx = RequestContext {
            request_id: "req_1".to_string(),
            actor: None,
        };
        let err = require_owner(&ctx).unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::UNAUTHORIZED);
        assert_eq!(err.problem.request_id, "req_1");
    }

    #[test]
    fn test_owner_returned() {
        let ctx = RequestContext {
            request_id: "req_1".to_string(),
            actor: Some(Actor {
                owner_id: "usr_abc".to_string(),
            }),
        };
        assert_eq!(require_owner(&ctx).unwrap(), "usr_abc");
    }
}
