//! Token authentication
//!
//! Clients send `Authorization: Token <token>`; `Bearer` is accepted as an
//! alias. Anything else is answered with 401.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use std::sync::Arc;

use crate::core::error::Error;
use crate::core::AppState;
use crate::security::User;

/// The authenticated caller of a request
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = Arc::<AppState>::from_ref(state);
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(Error::Unauthenticated)?;

        let token = parse_token(header).ok_or(Error::Unauthenticated)?;
        state.users.authenticate(token).map(AuthUser)
    }
}

/// Extract the token from an `Authorization` header value
pub fn parse_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    let known = scheme.eq_ignore_ascii_case("token") || scheme.eq_ignore_ascii_case("bearer");
    (known && !token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token() {
        assert_eq!(parse_token("Token abc123"), Some("abc123"));
        assert_eq!(parse_token("Bearer abc123"), Some("abc123"));
        assert_eq!(parse_token("token  abc123 "), Some("abc123"));
        assert_eq!(parse_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(parse_token("Token"), None);
        assert_eq!(parse_token("Token "), None);
    }
}
