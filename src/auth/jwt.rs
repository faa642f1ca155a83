use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::Error};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::credentials::Principal;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    #[schema(example = "admin")]
    pub sub: String,
    #[schema(example = "admin")]
    pub username: String,
    #[schema(example = "admin")]
    pub role: String,
    pub iat: usize,
    pub exp: usize,
    pub jti: String,
}

fn now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as usize)
        .unwrap_or_default()
}

pub fn generate_token(principal: &Principal, secret: &str, ttl: usize) -> Result<String, Error> {
    let issued_at = now();
    let claims = Claims {
        sub: principal.username.clone(),
        username: principal.username.clone(),
        role: principal.role.clone(),
        iat: issued_at,
        exp: issued_at + ttl,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> Principal {
        Principal {
            username: "admin".to_string(),
            role: "admin".to_string(),
        }
    }

    #[test]
    fn test_token_round_trip() {
        let token = generate_token(&admin(), "secret", 900).expect("token");
        let claims = verify_token(&token, "secret").expect("claims");
        assert_eq!(claims.sub, "admin");
        assert_eq!(claims.username, "admin");
        assert_eq!(claims.role, "admin");
        assert_eq!(claims.exp, claims.iat + 900);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = generate_token(&admin(), "secret", 900).expect("token");
        assert!(verify_token(&token, "other").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let claims = Claims {
            sub: "admin".to_string(),
            username: "admin".to_string(),
            role: "admin".to_string(),
            iat: 1_000,
            exp: 2_000,
            jti: "jti".to_string(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .expect("token");
        assert!(verify_token(&token, "secret").is_err());
    }
}
