//! Access token handling.
//!
//! Tokens are issued by the identity service, not by this server. Every authenticated route takes a [`JwtClaims`]
//! argument, which is extracted from the `Authorization: Bearer <token>` header and verified against the HS256 secret
//! held in the [`TokenVerifier`] app data.
use std::future::{ready, Ready};

use actix_web::{dev::Payload, http::header::AUTHORIZATION, web, FromRequest, HttpRequest};
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use log::*;
use serde::{Deserialize, Serialize};
use storefront_engine::{db_types::UserId, traits::Actor};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The user id
    pub sub: UserId,
    #[serde(default)]
    pub is_staff: bool,
    /// Permission codenames, e.g. `update_order_status`
    #[serde(default)]
    pub permissions: Vec<String>,
    pub exp: i64,
}

impl JwtClaims {
    pub fn user_id(&self) -> UserId {
        self.sub
    }

    pub fn actor(&self) -> Actor {
        Actor { user_id: self.sub, is_staff: self.is_staff, permissions: self.permissions.clone() }
    }
}

pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        let key = DecodingKey::from_secret(config.jwt_secret.reveal().as_bytes());
        let validation = Validation::new(Algorithm::HS256);
        Self { key, validation }
    }

    pub fn verify(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let data = decode::<JwtClaims>(token, &self.key, &self.validation).map_err(|e| match e.kind() {
            ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
                AuthError::PoorlyFormattedToken(e.to_string())
            },
            _ => AuthError::ValidationError(e.to_string()),
        })?;
        Ok(data.claims)
    }
}

impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(claims_from_request(req))
    }
}

fn claims_from_request(req: &HttpRequest) -> Result<JwtClaims, ServerError> {
    let verifier = req.app_data::<web::Data<TokenVerifier>>().ok_or_else(|| {
        error!("🔐️ No token verifier has been configured for this route");
        ServerError::ConfigurationError("Token verifier is missing".to_string())
    })?;
    let header = req.headers().get(AUTHORIZATION).ok_or(AuthError::MissingToken)?;
    let token = header
        .to_str()
        .ok()
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::PoorlyFormattedToken("Expected 'Bearer <token>'".to_string()))?;
    let claims = verifier.verify(token).map_err(|e| {
        debug!("🔐️ Rejecting access token. {e}");
        e
    })?;
    trace!("🔐️ Access token verified for user {}", claims.sub);
    Ok(claims)
}
