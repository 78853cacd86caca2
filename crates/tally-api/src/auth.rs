//! `x-api-key` extractor and standalone verifier.

use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, request::Parts};
use sha2::{Digest as _, Sha256};
use tally_core::store::SalesStore;

use crate::{AppState, error::ApiError};

/// Header carrying the shared ingest secret.
pub const API_KEY_HEADER: &str = "x-api-key";

/// The secret accepted by protected routes.
///
/// With no key configured every protected request is refused.
#[derive(Clone, Default)]
pub struct ApiKeyConfig {
  pub key: Option<String>,
}

impl ApiKeyConfig {
  pub fn new(key: impl Into<String>) -> Self { Self { key: Some(key.into()) } }
}

/// Zero-size marker: present in the handler means the request carried the
/// configured API key.
pub struct RequireApiKey;

/// Verify the API key directly from headers.
pub fn verify_api_key(headers: &HeaderMap, config: &ApiKeyConfig) -> Result<(), ApiError> {
  let expected = config
    .key
    .as_deref()
    .filter(|k| !k.is_empty())
    .ok_or(ApiError::Unauthorized)?;

  let presented = headers
    .get(API_KEY_HEADER)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthorized)?;

  // Compare fixed-length digests rather than the raw strings.
  if Sha256::digest(presented.as_bytes()) != Sha256::digest(expected.as_bytes()) {
    return Err(ApiError::Unauthorized);
  }

  Ok(())
}

impl<S> FromRequestParts<AppState<S>> for RequireApiKey
where
  S: SalesStore + Clone + Send + Sync + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    verify_api_key(&parts.headers, &state.api_key).inspect_err(|_| {
      tracing::warn!(uri = %parts.uri, "rejected request without a valid API key");
    })?;
    Ok(RequireApiKey)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::Arc;
  use axum::http::Request;
  use tally_core::{sale::SaleDocument, store::CreateOutcome};

  // A minimal no-op store for testing auth only.
  #[derive(Clone)]
  struct NoopStore;

  impl SalesStore for NoopStore {
    type Error = std::convert::Infallible;
    async fn create_sale(&self, _: SaleDocument) -> Result<CreateOutcome, Self::Error> { unimplemented!() }
    async fn get_sale(&self, _: &str) -> Result<Option<SaleDocument>, Self::Error> { unimplemented!() }
    async fn list_sales(&self) -> Result<Vec<SaleDocument>, Self::Error> { unimplemented!() }
  }

  fn make_state(key: Option<&str>) -> AppState<NoopStore> {
    AppState {
      store:   Arc::new(NoopStore),
      api_key: Arc::new(ApiKeyConfig { key: key.map(str::to_owned) }),
    }
  }

  async fn extract(req: Request<axum::body::Body>, state: &AppState<NoopStore>) -> Result<RequireApiKey, ApiError> {
    let (mut parts, _) = req.into_parts();
    RequireApiKey::from_request_parts(&mut parts, state).await
  }

  #[tokio::test]
  async fn correct_key() {
    let state = make_state(Some("s3cret"));
    let req = Request::builder()
      .header(API_KEY_HEADER, "s3cret")
      .body(axum::body::Body::empty()).unwrap();
    assert!(extract(req, &state).await.is_ok());
  }

  #[tokio::test]
  async fn wrong_key() {
    let state = make_state(Some("s3cret"));
    let req = Request::builder()
      .header(API_KEY_HEADER, "s3cret ")
      .body(axum::body::Body::empty()).unwrap();
    assert!(matches!(extract(req, &state).await, Err(ApiError::Unauthorized)));
  }

  #[tokio::test]
  async fn missing_header() {
    let state = make_state(Some("s3cret"));
    let req = Request::builder().body(axum::body::Body::empty()).unwrap();
    assert!(matches!(extract(req, &state).await, Err(ApiError::Unauthorized)));
  }

  #[tokio::test]
  async fn no_configured_key_rejects_everything() {
    for key in [None, Some("")] {
      let state = make_state(key);
      let req = Request::builder()
        .header(API_KEY_HEADER, "")
        .body(axum::body::Body::empty()).unwrap();
      assert!(matches!(extract(req, &state).await, Err(ApiError::Unauthorized)));
    }
  }
}
