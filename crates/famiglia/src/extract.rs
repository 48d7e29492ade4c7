//! Request extractors.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use famiglia_session::{Authenticator, BEARER, Identity};
use famiglia_store::Storage;

use crate::{AppState, FamigliaError};

/// The authenticated caller, resolved from the `Authorization: Bearer`
/// header. Rejects with 401 when the header is missing or the token is
/// not a valid access token.
#[derive(Debug, Clone)]
pub struct Caller(pub Identity);

impl<S: Storage> FromRequestParts<Arc<AppState<S>>> for Caller {
    type Rejection = FamigliaError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or(FamigliaError::MissingToken)?
            .to_string();
        let identity = state.auth.authenticate(&token).await?;
        Ok(Self(identity))
    }
}

/// Pulls the token out of an `Authorization: Bearer <token>` header. The
/// scheme is matched case-insensitively.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case(BEARER) && !token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_extracts_token() {
        assert_eq!(bearer_token(&headers("Bearer abc.def")), Some("abc.def"));
        assert_eq!(bearer_token(&headers("bearer abc")), Some("abc"));
    }

    #[test]
    fn test_bearer_token_rejects_other_schemes() {
        assert_eq!(bearer_token(&headers("Basic dXNlcg==")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
