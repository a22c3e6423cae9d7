use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{config::SessionConfig, error::ApiError, state::AppState};

/// Payload of a session token: who the user is and how long the session
/// lasts. Stateless; there is no server-side session table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub name: String,
    pub iat: usize,
    pub exp: usize,
}

/// Signing material plus the cookie settings the token travels in.
#[derive(Clone)]
pub struct SessionKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub cookie_name: String,
    pub cookie_secure: bool,
    pub ttl: Duration,
}

impl FromRef<AppState> for SessionKeys {
    fn from_ref(state: &AppState) -> Self {
        let SessionConfig {
            secret,
            cookie_name,
            cookie_secure,
            ttl_hours,
        } = state.config.session.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            cookie_name,
            cookie_secure,
            ttl: Duration::hours(ttl_hours),
        }
    }
}

impl SessionKeys {
    pub fn sign(&self, user_id: Uuid, name: &str) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            sub: user_id,
            name: name.to_string(),
            iat: now.unix_timestamp() as usize,
            exp: (now + self.ttl).unix_timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user_id, "session token signed");
        Ok(token)
    }

    /// Signature and expiry check; any failure means no session.
    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())?;
        debug!(user_id = %data.claims.sub, "session token verified");
        Ok(data.claims)
    }

    /// The cookie carrying a freshly signed token. HTTP-only and
    /// SameSite=Strict; `Secure` follows configuration (true behind TLS).
    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((self.cookie_name.clone(), token))
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(self.cookie_secure)
            .path("/")
            .max_age(self.ttl)
            .build()
    }

    /// Name+path stub used to clear the session cookie on logout.
    pub fn removal_cookie(&self) -> Cookie<'static> {
        Cookie::build((self.cookie_name.clone(), "")).path("/").build()
    }
}

/// Identity attached to an authenticated request, extracted from the
/// session cookie before the handler body runs.
#[derive(Debug)]
pub struct AuthUser {
    pub id: Uuid,
    pub name: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    SessionKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = SessionKeys::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(&keys.cookie_name)
            .map(|c| c.value().to_string())
            .ok_or_else(|| ApiError::Unauthorized("missing session cookie".into()))?;

        let claims = keys.verify(&token).map_err(|_| {
            warn!("invalid or expired session token");
            ApiError::Unauthorized("invalid or expired session".into())
        })?;

        Ok(AuthUser {
            id: claims.sub,
            name: claims.name,
        })
    }
}
