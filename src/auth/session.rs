use std::time::Duration;

use axum::{
    extract::FromRef,
    http::{
        header::{InvalidHeaderValue, COOKIE},
        HeaderMap, HeaderValue,
    },
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::claims::SessionClaims;
use crate::{
    config::{SessionConfig, MAX_SESSION_TTL_MINUTES},
    state::AppState,
};

pub const SESSION_COOKIE_NAME: &str = "todolist_session";

/// Signing and verification keys plus the cookie policy.
#[derive(Clone)]
pub struct SessionKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
    pub cookie_secure: bool,
}

impl SessionKeys {
    pub fn from_config(cfg: &SessionConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::from_secs(cfg.ttl_minutes.clamp(1, MAX_SESSION_TTL_MINUTES) as u64 * 60),
            cookie_secure: cfg.cookie_secure,
        }
    }

    pub fn sign(&self, user_id: Uuid) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = i64::try_from(self.ttl.as_secs())
            .ok()
            .and_then(|secs| now.checked_add(TimeDuration::seconds(secs)))
            .ok_or_else(|| anyhow::anyhow!("session ttl out of range: {:?}", self.ttl))?;
        let claims = SessionClaims {
            sub: user_id,
            jti: Uuid::new_v4(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user_id, "session signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<SessionClaims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<SessionClaims>(token, &self.decoding, &validation)?;
        debug!(user_id = %data.claims.sub, "session verified");
        Ok(data.claims)
    }

    /// Resolve the session cookie in `headers` to its claims.
    pub fn parse(&self, headers: &HeaderMap) -> Option<SessionClaims> {
        let token = extract_session_token(headers)?;
        self.verify(&token).ok()
    }

    /// `Set-Cookie` value carrying a freshly signed token.
    pub fn session_cookie(&self, token: &str) -> Result<HeaderValue, InvalidHeaderValue> {
        let ttl_seconds = self.ttl.as_secs();
        let mut cookie = format!(
            "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={ttl_seconds}"
        );
        if self.cookie_secure {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie)
    }

    pub fn clear_session_cookie(&self) -> Result<HeaderValue, InvalidHeaderValue> {
        let mut cookie = format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
        if self.cookie_secure {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie)
    }
}

impl FromRef<AppState> for SessionKeys {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

/// Pull the session token out of the `Cookie` header, ignoring other cookies.
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    for header in headers.get_all(COOKIE) {
        let Ok(value) = header.to_str() else {
            continue;
        };
        for pair in value.split(';') {
            let Some((key, val)) = pair.trim().split_once('=') else {
                continue;
            };
            let val = val.trim();
            if key.trim() == SESSION_COOKIE_NAME && !val.is_empty() {
                return Some(val.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys(secret: &str, issuer: &str, audience: &str) -> SessionKeys {
        SessionKeys::from_config(&SessionConfig {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            ttl_minutes: 5,
            cookie_secure: false,
        })
    }

    fn cookie_headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn sign_and_verify_session_token() {
        let keys = make_keys("dev-secret", "test-issuer", "test-aud");
        let user_id = Uuid::new_v4();
        let token = keys.sign(user_id).expect("sign session");
        let claims = keys.verify(&token).expect("verify token");
        assert_eq!(claims.user_id(), user_id);
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn each_signature_is_unique() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let user_id = Uuid::new_v4();
        let first = keys.sign(user_id).unwrap();
        let second = keys.sign(user_id).unwrap();
        assert_ne!(first, second);
        assert_ne!(keys.verify(&first).unwrap().jti, keys.verify(&second).unwrap().jti);
    }

    #[test]
    fn oversized_ttl_is_clamped() {
        let keys = SessionKeys::from_config(&SessionConfig {
            secret: "dev-secret".into(),
            issuer: "iss".into(),
            audience: "aud".into(),
            ttl_minutes: 100_000_000_000,
            cookie_secure: false,
        });
        assert_eq!(keys.ttl, Duration::from_secs(MAX_SESSION_TTL_MINUTES as u64 * 60));
        let token = keys.sign(Uuid::new_v4()).expect("sign session");
        assert!(keys.verify(&token).is_ok());
    }

    #[test]
    fn sign_fails_when_expiry_overflows() {
        let mut keys = make_keys("dev-secret", "iss", "aud");
        keys.ttl = Duration::from_secs(u64::MAX);
        assert!(keys.sign(Uuid::new_v4()).is_err());
        keys.ttl = Duration::from_secs(i64::MAX as u64);
        assert!(keys.sign(Uuid::new_v4()).is_err());
    }

    #[test]
    fn verify_rejects_wrong_issuer_or_audience() {
        let good_keys = make_keys("same-secret", "good-iss", "good-aud");
        let bad_keys = make_keys("same-secret", "bad-iss", "bad-aud");
        let token = good_keys.sign(Uuid::new_v4()).expect("sign session");
        assert!(bad_keys.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_foreign_signature() {
        let ours = make_keys("ours", "iss", "aud");
        let theirs = make_keys("theirs", "iss", "aud");
        let token = theirs.sign(Uuid::new_v4()).expect("sign session");
        assert!(ours.verify(&token).is_err());
    }

    #[test]
    fn extract_finds_session_among_other_cookies() {
        let headers = cookie_headers("theme=dark;  todolist_session=abc.def.ghi ; lang=en");
        assert_eq!(extract_session_token(&headers).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn extract_ignores_missing_or_empty_cookie() {
        assert_eq!(extract_session_token(&HeaderMap::new()), None);
        assert_eq!(extract_session_token(&cookie_headers("theme=dark")), None);
        assert_eq!(extract_session_token(&cookie_headers("todolist_session=")), None);
    }

    #[test]
    fn parse_treats_garbage_token_as_no_session() {
        let keys = make_keys("dev-secret", "iss", "aud");
        assert!(keys.parse(&cookie_headers("todolist_session=not-a-jwt")).is_none());
    }

    #[test]
    fn parse_round_trips_signed_cookie() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let user_id = Uuid::new_v4();
        let token = keys.sign(user_id).unwrap();
        let headers = cookie_headers(&format!("{SESSION_COOKIE_NAME}={token}"));
        assert_eq!(keys.parse(&headers).map(|c| c.sub), Some(user_id));
    }

    #[test]
    fn session_cookie_attributes() {
        let mut keys = make_keys("dev-secret", "iss", "aud");
        let cookie = keys.session_cookie("tok").unwrap();
        let cookie = cookie.to_str().unwrap();
        assert!(cookie.starts_with("todolist_session=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=300"));
        assert!(!cookie.contains("Secure"));

        keys.cookie_secure = true;
        let cleared = keys.clear_session_cookie().unwrap();
        let cleared = cleared.to_str().unwrap();
        assert!(cleared.contains("Max-Age=0"));
        assert!(cleared.ends_with("; Secure"));
    }
}
