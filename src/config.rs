use anyhow::bail;
use serde::Deserialize;

pub const DEFAULT_SESSION_TTL_MINUTES: i64 = 60 * 24 * 7;
/// One year.
pub const MAX_SESSION_TTL_MINUTES: i64 = 60 * 24 * 365;

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    /// Adds `Secure` to the session cookie; enable when served over HTTPS.
    pub cookie_secure: bool,
}

/// Optional account created at startup for local development.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedUser {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub session: SessionConfig,
    pub seed_user: Option<SeedUser>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let session = SessionConfig {
            secret: std::env::var("SESSION_SECRET")?,
            issuer: std::env::var("SESSION_ISSUER").unwrap_or_else(|_| "todolist".into()),
            audience: std::env::var("SESSION_AUDIENCE").unwrap_or_else(|_| "todolist-web".into()),
            ttl_minutes: parse_ttl_minutes(std::env::var("SESSION_TTL_MINUTES").ok().as_deref())?,
            cookie_secure: std::env::var("SESSION_COOKIE_SECURE")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        };
        let seed_user = match (
            std::env::var("SEED_USER_EMAIL"),
            std::env::var("SEED_USER_PASSWORD"),
        ) {
            (Ok(email), Ok(password)) if !email.is_empty() && !password.is_empty() => {
                Some(SeedUser { email, password })
            }
            _ => None,
        };
        Ok(Self {
            database_url,
            session,
            seed_user,
        })
    }
}

/// Unset means the default; anything else must be a whole number of minutes
/// in `1..=MAX_SESSION_TTL_MINUTES`.
pub fn parse_ttl_minutes(raw: Option<&str>) -> anyhow::Result<i64> {
    let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(DEFAULT_SESSION_TTL_MINUTES);
    };
    let minutes: i64 = match raw.parse() {
        Ok(v) => v,
        Err(_) => bail!("SESSION_TTL_MINUTES must be an integer, got {raw:?}"),
    };
    if !(1..=MAX_SESSION_TTL_MINUTES).contains(&minutes) {
        bail!("SESSION_TTL_MINUTES must be between 1 and {MAX_SESSION_TTL_MINUTES}, got {minutes}");
    }
    Ok(minutes)
}
