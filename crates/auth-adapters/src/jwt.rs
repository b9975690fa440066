use chrono::{Duration, Utc};
use domains::{AppError, Result, TokenIssuer};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: Uuid,
    iat: i64,
    exp: i64,
}

/// HS256 tokens carrying the user id as `sub`.
pub struct JwtIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtIssuer {
    pub fn new(secret: &SecretString, ttl_hours: i64) -> Self {
        let key = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(key),
            decoding: DecodingKey::from_secret(key),
            ttl: Duration::hours(ttl_hours),
        }
    }
}

impl TokenIssuer for JwtIssuer {
    fn issue(&self, user_id: Uuid) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("token signing failed: {e}")))
    }

    fn verify(&self, token: &str) -> Result<Uuid> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims.sub)
            .map_err(|err| {
                tracing::debug!(error = %err, "rejected bearer token");
                AppError::Unauthorized("Access denied.".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer(secret: &str, ttl_hours: i64) -> JwtIssuer {
        JwtIssuer::new(&SecretString::from(secret.to_string()), ttl_hours)
    }

    #[test]
    fn issued_token_verifies_to_same_user() {
        let jwt = issuer("s3cret", 1);
        let id = Uuid::now_v7();
        let token = jwt.issue(id).unwrap();
        assert_eq!(jwt.verify(&token).unwrap(), id);
    }

    #[test]
    fn wrong_secret_is_unauthorized() {
        let token = issuer("one", 1).issue(Uuid::now_v7()).unwrap();
        assert!(matches!(
            issuer("two", 1).verify(&token),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn expired_token_is_unauthorized() {
        // Past the default 60s leeway.
        let jwt = issuer("s3cret", -1);
        let token = jwt.issue(Uuid::now_v7()).unwrap();
        assert!(jwt.verify(&token).is_err());
    }

    #[test]
    fn garbage_is_unauthorized() {
        assert!(issuer("s3cret", 1).verify("not.a.jwt").is_err());
    }
}
