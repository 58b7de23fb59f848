//! Staff identity seam.
//!
//! Identity lives in a separate service; this module only verifies the bearer
//! tokens it issues and turns them into a [`StaffContext`] carrying the
//! organization scope and role every operation needs. Login, refresh, and
//! profile storage are deliberately not here.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::debug;
use uuid::Uuid;

use crate::errors::ServiceError;

/// Claim structure for staff bearer tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Staff member id
    pub sub: String,
    /// Organization the staff member acts for
    pub org: String,
    /// Role name, e.g. "Owner" or "Worker"
    pub role: String,
    /// JWT ID (unique identifier for this token)
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}

/// Roles recognized by this service. Anything else is rejected at the door.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum StaffRole {
    Owner,
    Worker,
}

impl StaffRole {
    /// Moving quantities between stages, rework included.
    pub fn can_move_items(&self) -> bool {
        matches!(self, StaffRole::Owner | StaffRole::Worker)
    }

    /// Changing the workflow topology itself.
    pub fn can_manage_stages(&self) -> bool {
        matches!(self, StaffRole::Owner)
    }
}

/// Verified staff identity attached to each request.
#[derive(Debug, Clone)]
pub struct StaffContext {
    pub staff_id: Uuid,
    pub organization_id: Uuid,
    pub role: StaffRole,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub token_ttl_minutes: i64,
}

/// Validates bearer tokens and, for tooling and tests, issues them.
#[derive(Clone)]
pub struct AuthService {
    config: AuthConfig,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Issue a signed staff token. Production tokens come from the identity
    /// service; this exists for local development and the test harness.
    pub fn issue_token(
        &self,
        staff_id: Uuid,
        organization_id: Uuid,
        role: StaffRole,
    ) -> Result<String, ServiceError> {
        let now = Utc::now();
        let claims = Claims {
            sub: staff_id.to_string(),
            org: organization_id.to_string(),
            role: role.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::minutes(self.config.token_ttl_minutes)).timestamp(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| ServiceError::InternalError(format!("failed to sign token: {}", e)))
    }

    /// Verify a bearer token and resolve it to a staff context.
    pub fn verify_token(&self, token: &str) -> Result<StaffContext, ServiceError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.jwt_issuer]);
        validation.set_audience(&[&self.config.jwt_audience]);

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| {
            debug!(error = %e, "Bearer token rejected");
            ServiceError::Unauthorized("invalid or expired bearer token".to_string())
        })?;

        let claims = data.claims;
        let staff_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| ServiceError::Unauthorized("malformed staff id in token".to_string()))?;
        let organization_id = Uuid::parse_str(&claims.org).map_err(|_| {
            ServiceError::Unauthorized("malformed organization id in token".to_string())
        })?;
        let role = claims.role.parse::<StaffRole>().map_err(|_| {
            ServiceError::Forbidden(format!(
                "role '{}' is not permitted to use this service",
                claims.role
            ))
        })?;

        Ok(StaffContext {
            staff_id,
            organization_id,
            role,
        })
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Middleware gating a router on a verified staff identity. The resolved
/// [`StaffContext`] lands in request extensions for extractors downstream.
pub async fn authenticate(
    State(auth): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    let token = bearer_token(request.headers())
        .ok_or_else(|| ServiceError::Unauthorized("missing bearer token".to_string()))?;
    let staff = auth.verify_token(token)?;
    request.extensions_mut().insert(staff);
    Ok(next.run(request).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for StaffContext
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<StaffContext>().cloned().ok_or_else(|| {
            ServiceError::Unauthorized("request reached a handler without authentication".into())
        })
    }
}
