//! Bearer token authentication.
//!
//! Tokens are issued by an external identity provider and signed with the
//! shared secret. The `sub` claim names the owner whose namespace a request
//! operates on.

use axum::{
    async_trait,
    body::Body,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, Request},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::web::error::ApiError;

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject: the owner identifier.
    pub sub: String,
    /// Issued at timestamp.
    #[serde(default)]
    pub iat: u64,
    /// Expiration timestamp.
    pub exp: u64,
}

/// Key material for verifying bearer tokens.
#[derive(Clone)]
pub struct JwtState {
    /// Decoding key for JWT verification.
    pub decoding_key: DecodingKey,
    /// Validation settings.
    pub validation: Validation,
}

impl JwtState {
    /// Create a new JWT state from a secret key.
    pub fn new(secret: &str) -> Self {
        let decoding_key = DecodingKey::from_secret(secret.as_bytes());
        let mut validation = Validation::default();
        validation.validate_exp = true;

        Self {
            decoding_key,
            validation,
        }
    }
}

/// Authenticated owner of the request, from the `Authorization` header.
#[derive(Debug, Clone)]
pub struct AuthUser(pub JwtClaims);

impl AuthUser {
    /// Owner identifier of the caller's namespace.
    pub fn owner(&self) -> &str {
        &self.0.sub
    }
}

/// Authenticated owner of a download link.
///
/// Accepts the `Authorization` header or a `token` query parameter so that a
/// plain link can fetch a file. Only the download route uses it.
#[derive(Debug, Clone)]
pub struct LinkAuthUser(pub JwtClaims);

impl LinkAuthUser {
    /// Owner identifier of the caller's namespace.
    pub fn owner(&self) -> &str {
        &self.0.sub
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(str::to_string)
}

fn query_token(parts: &Parts) -> Option<String> {
    parts.uri.query()?.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        if key == "token" {
            urlencoding::decode(value).ok().map(|s| s.into_owned())
        } else {
            None
        }
    })
}

/// Verify `token` against the state injected by [`jwt_auth`].
fn verify(parts: &Parts, token: Option<String>) -> Result<JwtClaims, ApiError> {
    let token = token.ok_or_else(|| ApiError::unauthorized("Missing authorization"))?;

    let jwt_state = parts
        .extensions
        .get::<Arc<JwtState>>()
        .ok_or_else(|| ApiError::internal("JWT state not configured"))?;

    let token_data = decode::<JwtClaims>(&token, &jwt_state.decoding_key, &jwt_state.validation)
        .map_err(|e| {
            tracing::debug!("JWT validation failed: {}", e);
            ApiError::unauthorized("Invalid or expired token")
        })?;

    if token_data.claims.sub.is_empty() {
        return Err(ApiError::unauthorized("Token has no subject"));
    }

    Ok(token_data.claims)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        verify(parts, bearer_token(parts)).map(AuthUser)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for LinkAuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).or_else(|| query_token(parts));
        verify(parts, token).map(LinkAuthUser)
    }
}

/// Middleware function to inject JWT state into request extensions.
pub async fn jwt_auth(
    jwt_state: Arc<JwtState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    request.extensions_mut().insert(jwt_state);
    next.run(request).await
}
