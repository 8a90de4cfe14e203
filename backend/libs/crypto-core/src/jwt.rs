/// Session token signing and validation
///
/// Session tokens are RS256-signed JWTs stored in the session cookie. The
/// service that issues them also validates them, so both halves of the key
/// pair are loaded at startup.
///
/// ## Usage
///
/// ```rust,ignore
/// use crypto_core::jwt;
///
/// jwt::initialize_jwt_keys(&private_pem, &public_pem)?;
/// let token = jwt::generate_session_token(user_id, "alice", chrono::Duration::hours(24))?;
/// let claims = jwt::validate_token(&token)?.claims;
/// ```
use anyhow::{anyhow, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation,
};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Only RS256 is accepted; tokens signed with anything else fail validation.
const JWT_ALGORITHM: Algorithm = Algorithm::RS256;

const SESSION_TOKEN_TYPE: &str = "session";

/// Claims carried by a session token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    pub token_type: String,
    pub username: String,
}

static JWT_ENCODING_KEY: OnceCell<EncodingKey> = OnceCell::new();
static JWT_DECODING_KEY: OnceCell<DecodingKey> = OnceCell::new();

/// Initialize JWT keys from PEM-formatted strings
///
/// Must be called once during startup before any token operation.
/// Subsequent calls return an error.
pub fn initialize_jwt_keys(private_key_pem: &str, public_key_pem: &str) -> Result<()> {
    let encoding_key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
        .map_err(|e| anyhow!("Failed to parse RSA private key: {e}"))?;
    let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
        .map_err(|e| anyhow!("Failed to parse RSA public key: {e}"))?;

    JWT_ENCODING_KEY
        .set(encoding_key)
        .map_err(|_| anyhow!("JWT encoding key already initialized"))?;
    JWT_DECODING_KEY
        .set(decoding_key)
        .map_err(|_| anyhow!("JWT decoding key already initialized"))?;

    Ok(())
}

/// Whether `initialize_jwt_keys` has completed
pub fn keys_initialized() -> bool {
    JWT_ENCODING_KEY.get().is_some() && JWT_DECODING_KEY.get().is_some()
}

fn get_encoding_key() -> Result<&'static EncodingKey> {
    JWT_ENCODING_KEY.get().ok_or_else(|| {
        anyhow!("JWT keys not initialized. Call initialize_jwt_keys() during startup.")
    })
}

fn get_decoding_key() -> Result<&'static DecodingKey> {
    JWT_DECODING_KEY.get().ok_or_else(|| {
        anyhow!("JWT keys not initialized. Call initialize_jwt_keys() during startup.")
    })
}

/// Generate a session token for `user_id` valid for `ttl`
pub fn generate_session_token(user_id: Uuid, username: &str, ttl: Duration) -> Result<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
        token_type: SESSION_TOKEN_TYPE.to_string(),
        username: username.to_string(),
    };

    encode(&Header::new(JWT_ALGORITHM), &claims, get_encoding_key()?)
        .map_err(|e| anyhow!("Failed to generate session token: {e}"))
}

/// Validate and decode a session token
///
/// Fails on bad signature, expiry, malformed input, a non-session token type,
/// or when keys were never initialized.
pub fn validate_token(token: &str) -> Result<TokenData<Claims>> {
    let mut validation = Validation::new(JWT_ALGORITHM);
    validation.validate_exp = true;

    let data = decode::<Claims>(token, get_decoding_key()?, &validation)
        .map_err(|e| anyhow!("Token validation failed: {e}"))?;

    if data.claims.token_type != SESSION_TOKEN_TYPE {
        return Err(anyhow!("Unexpected token type: {}", data.claims.token_type));
    }

    Ok(data)
}

/// Extract user ID from a validated token
pub fn get_user_id_from_token(token: &str) -> Result<Uuid> {
    let token_data = validate_token(token)?;
    Uuid::parse_str(&token_data.claims.sub)
        .map_err(|e| anyhow!("Invalid user ID format in token: {e}"))
}
