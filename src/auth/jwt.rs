use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::utils::error::AppError;

/// Bearer token claims. `sub` carries the principal's email; `exp` is
/// enforced on decode.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
}

pub fn encode_token(
    email: &str,
    secret: &str,
    ttl: chrono::Duration,
) -> Result<String, AppError> {
    let claims = Claims {
        sub: email.to_string(),
        exp: (Utc::now() + ttl).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to sign token: {e}")))
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthenticated("Could not validate credentials".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret";

    #[test]
    fn test_token_round_trip() {
        let token = encode_token("ada@example.com", SECRET, chrono::Duration::minutes(15))
            .expect("token should encode");
        let claims = decode_token(&token, SECRET).expect("token should decode");
        assert_eq!(claims.sub, "ada@example.com");
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn test_expired_token_rejected() {
        // Valid subject, already past expiry
        let token = encode_token("ada@example.com", SECRET, chrono::Duration::minutes(-5))
            .expect("token should encode");
        let err = decode_token(&token, SECRET).unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = encode_token("ada@example.com", SECRET, chrono::Duration::minutes(15))
            .expect("token should encode");
        let err = decode_token(&token, "another-secret").unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let err = decode_token("not-a-jwt", SECRET).unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }
}
