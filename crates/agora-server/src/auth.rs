//! HTTP Basic authentication against the user store.
//!
//! [`attach_user`] runs on every request. Without an `Authorization` header
//! the request passes through anonymously (the API's `Voter` extractor then
//! rejects endpoints that need a user). With one, the credentials must verify
//! or the request is answered with 401.

use agora_core::{store::UserStore, user::User};
use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  extract::{Request, State},
  http::HeaderMap,
  middleware::Next,
  response::{IntoResponse, Response},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use rand_core::OsRng;

use crate::{AppState, error::Error};

/// Hash `password` into an argon2 PHC string for storage.
pub fn hash_password(password: &str) -> Result<String, Error> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| Error::Hash(e.to_string()))
}

/// Extract `(username, password)` from a Basic `Authorization` header.
///
/// `Ok(None)` when the header is absent; [`Error::Unauthorized`] when it is
/// present but malformed.
pub fn basic_credentials(headers: &HeaderMap) -> Result<Option<(String, String)>, Error> {
  let Some(value) = headers.get(axum::http::header::AUTHORIZATION) else {
    return Ok(None);
  };

  let encoded = value
    .to_str()
    .ok()
    .and_then(|v| v.strip_prefix("Basic "))
    .ok_or(Error::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| Error::Unauthorized)?;
  let creds   = String::from_utf8(decoded).map_err(|_| Error::Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(Error::Unauthorized)?;
  Ok(Some((username.to_owned(), password.to_owned())))
}

/// Resolve the request's user, if it carries credentials.
pub async fn authenticate<S>(store: &S, headers: &HeaderMap) -> Result<Option<User>, Error>
where
  S: UserStore,
{
  let Some((username, password)) = basic_credentials(headers)? else {
    return Ok(None);
  };

  let creds = store
    .find_credentials(&username)
    .await
    .map_err(|e| Error::Store(Box::new(e)))?
    .ok_or_else(|| {
      tracing::warn!(%username, "login attempt for unknown user");
      Error::Unauthorized
    })?;

  let parsed_hash = PasswordHash::new(&creds.password_hash)
    .map_err(|_| Error::Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| {
      tracing::warn!(%username, "wrong password");
      Error::Unauthorized
    })?;

  Ok(Some(creds.user))
}

/// Middleware inserting the authenticated [`User`] into the request
/// extensions.
pub async fn attach_user<S>(
  State(state): State<AppState<S>>,
  mut req: Request,
  next: Next,
) -> Response
where
  S: UserStore + 'static,
{
  match authenticate(state.store.as_ref(), req.headers()).await {
    Ok(Some(user)) => {
      req.extensions_mut().insert(user);
      next.run(req).await
    }
    Ok(None) => next.run(req).await,
    Err(e) => e.into_response(),
  }
}
