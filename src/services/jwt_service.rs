use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::config::EnvironmentConfig;
use crate::models::auth::{Caller, JwtClaims, Role};
use crate::utils::errors::{AppError, AppResult};

/// Vida máxima de un token de acceso (10 años)
pub const MAX_TOKEN_LIFETIME_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Configuración JWT
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub algorithm: Algorithm,
    pub access_token_duration: Duration,
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>, expiration_secs: u64) -> Self {
        Self {
            secret: secret.into(),
            algorithm: Algorithm::HS256,
            access_token_duration: token_lifetime(expiration_secs),
        }
    }

    pub fn from_environment(config: &EnvironmentConfig) -> Self {
        Self::new(config.jwt_secret.clone(), config.jwt_expiration)
    }
}

fn token_lifetime(expiration_secs: u64) -> Duration {
    let secs = expiration_secs.min(MAX_TOKEN_LIFETIME_SECS) as i64;
    Duration::try_seconds(secs).unwrap_or_else(|| Duration::seconds(MAX_TOKEN_LIFETIME_SECS as i64))
}

/// Servicio JWT
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_ref());
        let decoding_key = DecodingKey::from_secret(config.secret.as_ref());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Segundos de validez de un token emitido
    pub fn expires_in(&self) -> i64 {
        self.config.access_token_duration.num_seconds()
    }

    /// Genera un token de acceso
    pub fn generate_access_token(&self, user_id: i64, role: Role) -> AppResult<String> {
        let now = Utc::now();
        let exp = now + self.config.access_token_duration;

        let claims = JwtClaims {
            sub: user_id.to_string(),
            role: role.as_str().to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::new(self.config.algorithm), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Error generating access token: {}", e)))
    }

    /// Valida y decodifica un token
    pub fn validate_token(&self, token: &str) -> AppResult<JwtClaims> {
        let validation = Validation::new(self.config.algorithm);

        decode::<JwtClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
    }

    /// Resuelve la identidad de quien llama a partir del token
    pub fn caller_from_token(&self, token: &str) -> AppResult<Caller> {
        let claims = self.validate_token(token)?;

        let user_id = claims
            .sub
            .parse::<i64>()
            .map_err(|_| AppError::Unauthorized("Invalid subject in token".to_string()))?;
        let role = claims
            .role
            .parse::<Role>()
            .map_err(|_| AppError::Unauthorized("Invalid role in token".to_string()))?;

        Ok(Caller::new(user_id, role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::new(JwtConfig::new("test-secret", 1800))
    }

    #[test]
    fn test_generate_and_validate_token() {
        let jwt_service = service();

        let token = jwt_service.generate_access_token(42, Role::Operator).unwrap();
        assert!(!token.is_empty());

        let claims = jwt_service.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.role, "operator");
        assert_eq!(claims.exp - claims.iat, 1800);

        let caller = jwt_service.caller_from_token(&token).unwrap();
        assert_eq!(caller, Caller::new(42, Role::Operator));
    }

    #[test]
    fn test_foreign_or_garbled_tokens_are_unauthorized() {
        let token = service().generate_access_token(1, Role::Admin).unwrap();

        let other = JwtService::new(JwtConfig::new("another-secret", 1800));
        assert!(matches!(
            other.caller_from_token(&token),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            service().caller_from_token("not-a-token"),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_oversized_lifetime_is_capped() {
        let jwt_service = JwtService::new(JwtConfig::new("test-secret", u64::MAX));
        assert_eq!(jwt_service.expires_in(), MAX_TOKEN_LIFETIME_SECS as i64);

        let token = jwt_service.generate_access_token(3, Role::Guest).unwrap();
        assert!(jwt_service.validate_token(&token).is_ok());
    }
}
