//! JWT token service: generation, validation, parsing.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// HS256 signing secret, at least 32 bytes in production.
    pub secret: String,
    /// Token lifetime in minutes.
    pub expiration_minutes: i64,
    pub issuer: String,
    pub audience: String,
}

impl JwtConfig {
    pub fn from_env() -> Self {
        Self {
            secret: std::env::var("JWT_SECRET")
                .unwrap_or_else(|_| "dev-secret-change-me-before-deploying".into()),
            expiration_minutes: std::env::var("JWT_EXPIRATION_MINUTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1440),
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "store-server".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "store-clients".into()),
        }
    }
}

/// Claims carried in every token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    /// Role name: customer | operator | admin.
    pub role: String,
    /// Comma-separated permission list.
    pub permissions: String,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
    pub aud: String,
}

#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    ExpiredToken,

    #[error("Token generation failed: {0}")]
    GenerationFailed(String),
}

/// Stateless HS256 token service; keys derived once from the config.
#[derive(Clone)]
pub struct JwtService {
    pub config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn with_config(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    pub fn generate_token(
        &self,
        user_id: &str,
        role: &str,
        permissions: &[&str],
    ) -> Result<String, JwtError> {
        let now = Utc::now();
        let expiration = now + Duration::minutes(self.config.expiration_minutes);

        let claims = Claims {
            sub: user_id.to_string(),
            role: role.to_string(),
            permissions: permissions.join(","),
            exp: expiration.timestamp(),
            iat: now.timestamp(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| JwtError::GenerationFailed(e.to_string()))
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&self.config.audience]);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_required_spec_claims(&["sub", "exp", "iat", "iss", "aud"]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
                _ => JwtError::InvalidToken(e.to_string()),
            }
        })?;
        Ok(data.claims)
    }

    /// `Authorization: Bearer <token>`
    pub fn extract_from_header(header: &str) -> Option<&str> {
        header.strip_prefix("Bearer ")
    }
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService").finish_non_exhaustive()
    }
}

/// Authenticated caller, injected into request extensions by the auth
/// middleware.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
    pub role: String,
    pub permissions: Vec<String>,
}

impl From<Claims> for CurrentUser {
    fn from(claims: Claims) -> Self {
        let permissions = if claims.permissions.is_empty() {
            vec![]
        } else {
            claims.permissions.split(',').map(str::to_string).collect()
        };
        Self {
            id: claims.sub,
            role: claims.role,
            permissions,
        }
    }
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }

    /// Exact match, `prefix:*` wildcard, or the `all` super-permission.
    pub fn has_permission(&self, permission: &str) -> bool {
        if self.is_admin() {
            return true;
        }
        self.permissions.iter().any(|p| {
            p == permission
                || p == "all"
                || p.strip_suffix(":*")
                    .is_some_and(|prefix| permission.starts_with(prefix))
        })
    }

    /// Errors with 403 unless the caller holds `permission`.
    pub fn require(&self, permission: &str) -> Result<(), crate::core::AppError> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(crate::core::AppError::Forbidden(format!(
                "Missing permission: {permission}"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> JwtService {
        JwtService::with_config(JwtConfig {
            secret: "test-secret-at-least-32-characters-ok".into(),
            expiration_minutes: 60,
            issuer: "store-server".into(),
            audience: "store-clients".into(),
        })
    }

    #[test]
    fn test_generate_and_validate() {
        let service = test_service();
        let token = service
            .generate_token("u1", "customer", &["cart:use"])
            .unwrap();
        let claims = service.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.role, "customer");

        let user = CurrentUser::from(claims);
        assert_eq!(user.permissions, vec!["cart:use"]);
    }

    #[test]
    fn test_rejects_wrong_secret() {
        let service = test_service();
        let other = JwtService::with_config(JwtConfig {
            secret: "a-completely-different-32-char-secret".into(),
            expiration_minutes: 60,
            issuer: "store-server".into(),
            audience: "store-clients".into(),
        });
        let token = other.generate_token("u1", "customer", &[]).unwrap();
        assert!(matches!(
            service.validate_token(&token),
            Err(JwtError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_rejects_expired_token() {
        let service = JwtService::with_config(JwtConfig {
            secret: "test-secret-at-least-32-characters-ok".into(),
            expiration_minutes: -5,
            issuer: "store-server".into(),
            audience: "store-clients".into(),
        });
        let token = service.generate_token("u1", "customer", &[]).unwrap();
        assert!(matches!(
            service.validate_token(&token),
            Err(JwtError::ExpiredToken)
        ));
    }

    #[test]
    fn test_permission_wildcards() {
        let user = CurrentUser {
            id: "u1".into(),
            role: "operator".into(),
            permissions: vec!["returns:*".into()],
        };
        assert!(user.has_permission("returns:manage"));
        assert!(!user.has_permission("store:manage"));

        let admin = CurrentUser {
            id: "a1".into(),
            role: "admin".into(),
            permissions: vec![],
        };
        assert!(admin.has_permission("store:manage"));
    }

    #[test]
    fn test_require_errors_without_permission() {
        let user = CurrentUser {
            id: "u1".into(),
            role: "customer".into(),
            permissions: vec![],
        };
        assert!(user.require("store:manage").is_err());
    }
}
