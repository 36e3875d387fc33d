use std::collections::HashMap;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use uuid::Uuid;

use abi::{AuthConfig, Principal};

use crate::{ApiError, AppState};

/// Resolves a bearer token to a verified principal. Token issuance and
/// verification belong to the identity provider in front of this service;
/// this trait is the seam it plugs into.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Option<Principal>;
}

/// Static token table from the config file, the deployment stand-in for
/// the external identity provider.
#[derive(Debug, Default)]
pub struct StaticTokens {
    tokens: HashMap<String, Principal>,
}

impl StaticTokens {
    pub fn from_config(auth: &AuthConfig) -> Self {
        let tokens = auth
            .tokens
            .iter()
            .map(|t| {
                (
                    t.token.clone(),
                    Principal {
                        user_id: t.user_id,
                        name: t.name.clone(),
                        role: t.role,
                    },
                )
            })
            .collect();
        Self { tokens }
    }
}

#[async_trait]
impl TokenVerifier for StaticTokens {
    async fn verify(&self, token: &str) -> Option<Principal> {
        self.tokens.get(token).cloned()
    }
}

/// Extractor for the authenticated caller; rejects with 401 when the
/// bearer token is absent or unknown.
#[derive(Debug, Clone)]
pub struct AuthorizedUser {
    pub principal: Principal,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthorizedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .ok_or(ApiError::Unauthorized)?;
        let principal = state
            .verifier
            .verify(token)
            .await
            .ok_or(ApiError::Unauthorized)?;
        Ok(AuthorizedUser { principal })
    }
}

impl AuthorizedUser {
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.principal.role.is_admin() {
            Ok(())
        } else {
            Err(abi::Error::Forbidden("admin access required".into()).into())
        }
    }

    pub fn require_admin_or_owner(&self) -> Result<(), ApiError> {
        if self.principal.role.is_admin_or_owner() {
            Ok(())
        } else {
            Err(abi::Error::Forbidden("admin or owner access required".into()).into())
        }
    }

    pub fn require_self_or_admin(&self, id: Uuid) -> Result<(), ApiError> {
        if self.principal.user_id == id || self.principal.role.is_admin() {
            Ok(())
        } else {
            Err(abi::Error::Forbidden("can only view your own profile".into()).into())
        }
    }
}
