use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use contracts::system::auth::TokenClaims;

/// Claims of the authenticated user, taken from request extensions.
/// `require_auth` must run earlier in the chain; on a route without it
/// the extractor rejects with 401.
pub struct CurrentUser(pub TokenClaims);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<TokenClaims>() {
            Some(claims) => Ok(CurrentUser(claims.clone())),
            None => Err(StatusCode::UNAUTHORIZED),
        }
    }
}
