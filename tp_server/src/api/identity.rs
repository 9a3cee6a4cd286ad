//! Bearer token verification.
//!
//! Tokens are issued by the platform's identity service and signed with a
//! shared HS256 secret. This server only verifies them.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use teen_patti::room::UserId;

/// JWT claims carried by an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    pub sub: UserId, // User ID
    pub exp: i64,    // Expiration timestamp
    #[serde(default)]
    pub iat: i64, // Issued at timestamp
}

pub struct IdentityVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl IdentityVerifier {
    pub fn new(jwt_secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Verify an access token
    ///
    /// # Returns
    ///
    /// * `Result<AccessTokenClaims, jsonwebtoken::errors::Error>` - Decoded claims or error
    pub fn verify(&self, token: &str) -> Result<AccessTokenClaims, jsonwebtoken::errors::Error> {
        let token_data = decode::<AccessTokenClaims>(token, &self.key, &self.validation)?;
        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode, get_current_timestamp};

    const SECRET: &str = "test_secret_key_for_testing_only_32b";

    fn token(secret: &str, sub: UserId, exp: u64) -> String {
        let claims = AccessTokenClaims {
            sub,
            exp: exp as i64,
            iat: get_current_timestamp() as i64,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_valid_token() {
        let verifier = IdentityVerifier::new(SECRET);
        let claims = verifier
            .verify(&token(SECRET, 42, get_current_timestamp() + 600))
            .unwrap();
        assert_eq!(claims.sub, 42);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let verifier = IdentityVerifier::new(SECRET);
        let forged = token("another_secret_of_at_least_32_chars", 42, get_current_timestamp() + 600);
        assert!(verifier.verify(&forged).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let verifier = IdentityVerifier::new(SECRET);
        let expired = token(SECRET, 42, get_current_timestamp() - 3600);
        assert!(verifier.verify(&expired).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(IdentityVerifier::new(SECRET).verify("not.a.token").is_err());
    }
}
