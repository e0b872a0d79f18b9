// Jetons de session HS256. La clé vient de AppConfig::jwt_secret.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Durée de validité d'une session
pub const SESSION_HOURS: i64 = 24;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32, // user_id
    pub username: String,
    pub exp: i64,
}

fn ensure_secret(secret: &str) -> Result<&[u8], String> {
    if secret.trim().is_empty() {
        return Err("Session secret is not configured".to_string());
    }
    Ok(secret.as_bytes())
}

/// Émet le jeton d'un utilisateur, valable SESSION_HOURS heures
pub fn generate_token(secret: &str, user_id: i32, username: &str) -> Result<String, String> {
    let key = EncodingKey::from_secret(ensure_secret(secret)?);

    let exp = Utc::now()
        .checked_add_signed(Duration::hours(SESSION_HOURS))
        .ok_or("Failed to calculate expiration")?
        .timestamp();

    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp,
    };

    encode(&Header::new(Algorithm::HS256), &claims, &key)
        .map_err(|e| format!("Failed to generate token: {}", e))
}

/// Signature, algorithme et expiration sont vérifiés
pub fn verify_token(secret: &str, token: &str) -> Result<Claims, String> {
    let key = DecodingKey::from_secret(ensure_secret(secret)?);

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_required_spec_claims(&["exp", "sub"]);

    decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| format!("Invalid token: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-session-secret";

    #[test]
    fn test_generate_and_verify_token() {
        let token = generate_token(SECRET, 7, "nina").unwrap();
        let claims = verify_token(SECRET, &token).unwrap();

        assert_eq!(claims.sub, 7);
        assert_eq!(claims.username, "nina");
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn test_token_from_another_secret_rejected() {
        let forged = generate_token("someone-else", 1, "ana").unwrap();
        assert!(verify_token(SECRET, &forged).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let claims = Claims {
            sub: 1,
            username: "ana".to_string(),
            exp: Utc::now().timestamp() - 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(verify_token(SECRET, &token).is_err());
    }

    #[test]
    fn test_blank_secret_refused() {
        assert!(generate_token("", 1, "ana").is_err());
        assert!(verify_token("  ", "a.b.c").is_err());
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(verify_token(SECRET, "invalid.token.here").is_err());
    }
}
