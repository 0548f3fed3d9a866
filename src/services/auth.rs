use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest, HttpResponse};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};
use thiserror::Error;

use crate::models::ErrorResponse;

/// Errors from bearer-token validation
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Auth not configured")]
    NotConfigured,
}

impl actix_web::ResponseError for AuthError {
    fn error_response(&self) -> HttpResponse {
        let status_code = match self {
            AuthError::NotConfigured => 503,
            _ => 401,
        };
        HttpResponse::build(
            actix_web::http::StatusCode::from_u16(status_code)
                .unwrap_or(actix_web::http::StatusCode::UNAUTHORIZED),
        )
        .json(ErrorResponse {
            error: "unauthorized".to_string(),
            message: self.to_string(),
            status_code,
        })
    }
}

/// JWT claims the gateway cares about. Token issuance lives in the main
/// application; this layer only verifies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

/// Validates HS256 bearer tokens and yields the caller's user id.
pub struct JwtValidator {
    decoding_key: DecodingKey,
}

impl JwtValidator {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn validate(&self, token: &str) -> Result<AuthedUser, AuthError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            tracing::debug!("Token rejected: {}", e);
            AuthError::InvalidToken
        })?;

        Ok(AuthedUser {
            user_id: data.claims.sub,
        })
    }
}

/// The resolved identity attached to each authenticated request.
#[derive(Debug, Clone)]
pub struct AuthedUser {
    pub user_id: String,
}

impl FromRequest for AuthedUser {
    type Error = AuthError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(extract_user(req))
    }
}

fn extract_user(req: &HttpRequest) -> Result<AuthedUser, AuthError> {
    let validator = req
        .app_data::<web::Data<JwtValidator>>()
        .ok_or(AuthError::NotConfigured)?;

    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(AuthError::MissingToken)?;

    validator.validate(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token_for(sub: &str, secret: &str, exp: usize) -> String {
        let claims = Claims { sub: sub.to_string(), exp };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn far_future() -> usize {
        (chrono::Utc::now().timestamp() + 3600) as usize
    }

    #[test]
    fn test_valid_token_yields_user() {
        let validator = JwtValidator::new("secret");
        let token = token_for("agent-42", "secret", far_future());

        let user = validator.validate(&token).unwrap();
        assert_eq!(user.user_id, "agent-42");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let validator = JwtValidator::new("secret");
        let token = token_for("agent-42", "other-secret", far_future());

        assert!(matches!(
            validator.validate(&token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let validator = JwtValidator::new("secret");
        let expired = (chrono::Utc::now().timestamp() - 3600) as usize;
        let token = token_for("agent-42", "secret", expired);

        assert!(matches!(
            validator.validate(&token),
            Err(AuthError::InvalidToken)
        ));
    }
}
