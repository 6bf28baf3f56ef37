use async_trait::async_trait;

use crate::auth::credential::Credential;
use crate::config::JwtConfig;
use crate::error::AppResult;
use crate::utils::jwt::validate_token;

/// Turns a bearer token into a verified [`Credential`].
///
/// Any failure must be `AppError::Unauthorized`.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> AppResult<Credential>;
}

/// HS256 JWT verifier
#[derive(Debug, Clone)]
pub struct JwtVerifier {
    secret: String,
    issuer: Option<String>,
}

impl JwtVerifier {
    pub fn new(secret: impl Into<String>, issuer: Option<String>) -> Self {
        Self {
            secret: secret.into(),
            issuer,
        }
    }
}

impl From<&JwtConfig> for JwtVerifier {
    fn from(config: &JwtConfig) -> Self {
        Self::new(config.secret.clone(), config.issuer.clone())
    }
}

#[async_trait]
impl CredentialVerifier for JwtVerifier {
    async fn verify(&self, token: &str) -> AppResult<Credential> {
        let claims = validate_token(token, &self.secret, self.issuer.as_deref())?;
        Ok(Credential::from(claims))
    }
}
