//! The [`Voter`] extractor: the authenticated user a request acts as.

use agora_core::user::User;
use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::ApiError;

/// The authenticated user, taken from the request extensions.
///
/// Authentication itself is the embedding server's job: it must insert a
/// [`User`] extension for authenticated requests. Handlers taking a `Voter`
/// reject anything else with 401.
#[derive(Debug, Clone)]
pub struct Voter(pub User);

impl<St> FromRequestParts<St> for Voter
where
  St: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &St,
  ) -> Result<Self, Self::Rejection> {
    parts
      .extensions
      .get::<User>()
      .cloned()
      .map(Voter)
      .ok_or(ApiError::Unauthorized)
  }
}
