use anyhow::Result;
use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// JWT Claims structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Email
    pub uid: i32,    // User ID
    pub sid: String, // Session ID
    pub exp: usize,  // Expiration timestamp
}

/// Sign a bearer token for a login session. It expires with the session.
pub fn sign(
    user_id: i32,
    email: &str,
    session_id: &str,
    expires_at: DateTime<Utc>,
    secret: &str,
) -> Result<String> {
    let claims = Claims {
        sub: email.to_owned(),
        uid: user_id,
        sid: session_id.to_owned(),
        exp: usize::try_from(expires_at.timestamp())?,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Verify and decode a JWT token.
pub fn verify(token: &str, secret: &str) -> Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}
