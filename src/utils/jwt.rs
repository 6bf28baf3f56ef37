use jiff::{SignedDuration, Timestamp};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// JWT claims carried by access tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (caller id)
    pub sub: String,
    /// Granted scopes, space-delimited
    #[serde(default)]
    pub scope: String,
    /// Issuer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    /// Issued at (timestamp)
    pub iat: i64,
    /// Expiration time (timestamp)
    pub exp: i64,
}

impl Claims {
    /// Creates claims valid from now for `expiration_hours`
    ///
    /// # Arguments
    /// * `subject` - The caller's id
    /// * `scope` - Space-delimited scopes to grant
    /// * `issuer` - Optional `iss` claim
    /// * `expiration_hours` - Token validity duration in hours (negative yields an expired token)
    pub fn new(
        subject: impl Into<String>,
        scope: impl Into<String>,
        issuer: Option<String>,
        expiration_hours: i64,
    ) -> Self {
        let now = Timestamp::now();
        let exp = now.as_second() + SignedDuration::from_hours(expiration_hours).as_secs();

        Self {
            sub: subject.into(),
            scope: scope.into(),
            iss: issuer,
            iat: now.as_second(),
            exp,
        }
    }
}

/// Signs claims with HS256
///
/// # Arguments
/// * `claims` - The claims to encode
/// * `secret` - The secret key for signing the token
///
/// # Returns
/// The encoded JWT token string
pub fn generate_token(claims: &Claims, secret: &str) -> AppResult<String> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal {
        source: anyhow::anyhow!("Failed to generate JWT token: {}", e),
    })
}

/// Mints an access token granting `scope` to `subject`
pub fn issue_access_token(
    subject: &str,
    scope: &str,
    issuer: Option<&str>,
    secret: &str,
    expiration_hours: i64,
) -> AppResult<String> {
    let claims = Claims::new(subject, scope, issuer.map(str::to_string), expiration_hours);
    generate_token(&claims, secret)
}

/// Validates and decodes a JWT token
///
/// # Arguments
/// * `token` - The JWT token string to validate
/// * `secret` - The secret key for verifying the token
/// * `issuer` - When set, the `iss` claim must match it
///
/// # Returns
/// The decoded claims if the token is valid
///
/// # Example
/// ```ignore
/// let claims = validate_token(&token, "secret", Some("depot"))?;
/// println!("Subject: {}", claims.sub);
/// ```
pub fn validate_token(token: &str, secret: &str, issuer: Option<&str>) -> AppResult<Claims> {
    let mut validation = Validation::default();
    if let Some(issuer) = issuer {
        validation.set_issuer(&[issuer]);
    }

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
            AppError::unauthorized("Token has expired")
        }
        jsonwebtoken::errors::ErrorKind::InvalidToken => AppError::unauthorized("Invalid token"),
        jsonwebtoken::errors::ErrorKind::InvalidSignature => {
            AppError::unauthorized("Invalid token signature")
        }
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => {
            AppError::unauthorized("Token issuer is not accepted")
        }
        _ => AppError::unauthorized(format!("Token validation failed: {}", e)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "test_secret_key_for_jwt_testing_only";

    fn unauthorized_message(result: AppResult<Claims>) -> String {
        match result {
            Err(AppError::Unauthorized { message }) => message,
            other => panic!("Expected Unauthorized error, got: {:?}", other),
        }
    }

    #[test]
    fn test_issue_and_validate() {
        let token = issue_access_token("42", "products::list bins::get", None, TEST_SECRET, 1).unwrap();
        assert!(token.contains('.'));

        let claims = validate_token(&token, TEST_SECRET, None).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.scope, "products::list bins::get");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_expired_token() {
        let token = issue_access_token("42", "", None, TEST_SECRET, -1).unwrap();
        let message = unauthorized_message(validate_token(&token, TEST_SECRET, None));
        assert!(message.contains("expired"));
    }

    #[test]
    fn test_wrong_secret() {
        let token = issue_access_token("42", "", None, TEST_SECRET, 1).unwrap();
        let message = unauthorized_message(validate_token(
            &token,
            "another_secret_key_that_is_long_enough",
            None,
        ));
        assert!(message.contains("signature"));
    }

    #[test]
    fn test_issuer_must_match_when_configured() {
        let token = issue_access_token("42", "", Some("depot"), TEST_SECRET, 1).unwrap();
        assert!(validate_token(&token, TEST_SECRET, Some("depot")).is_ok());
        assert!(validate_token(&token, TEST_SECRET, None).is_ok());
        unauthorized_message(validate_token(&token, TEST_SECRET, Some("elsewhere")));
    }

    #[test]
    fn test_garbage_token() {
        unauthorized_message(validate_token("not-a-token", TEST_SECRET, None));
    }
}
