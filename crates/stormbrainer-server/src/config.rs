use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me",
    "dev-secret-change-me",
    "a_strong_default_secret_please_change_in_production",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub addr: SocketAddr,
    pub token_ttl: chrono::Duration,
    pub cors_origin: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = get("STORMBRAINER_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("STORMBRAINER_JWT_SECRET is unset or still a placeholder");
        }

        let db_path = get("STORMBRAINER_DB_PATH")
            .unwrap_or_else(|| "stormbrainer.db".into())
            .into();
        let host = get("STORMBRAINER_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = get("STORMBRAINER_PORT")
            .unwrap_or_else(|| "3001".into())
            .parse()
            .context("STORMBRAINER_PORT must be a port number")?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", host, port))?;

        let ttl_days: i64 = match get("STORMBRAINER_TOKEN_TTL_DAYS") {
            Some(v) => v.parse().context("STORMBRAINER_TOKEN_TTL_DAYS must be an integer")?,
            None => 7,
        };
        if ttl_days <= 0 {
            bail!("STORMBRAINER_TOKEN_TTL_DAYS must be positive");
        }

        let cors_origin = get("STORMBRAINER_CORS_ORIGIN").filter(|v| !v.is_empty());

        Ok(Self {
            jwt_secret,
            db_path,
            addr,
            token_ttl: chrono::Duration::days(ttl_days),
            cors_origin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply() {
        let cfg = Config::from_lookup(lookup(&[("STORMBRAINER_JWT_SECRET", "s3cret")])).unwrap();
        assert_eq!(cfg.addr, "0.0.0.0:3001".parse::<SocketAddr>().unwrap());
        assert_eq!(cfg.db_path, PathBuf::from("stormbrainer.db"));
        assert_eq!(cfg.token_ttl, chrono::Duration::days(7));
        assert!(cfg.cors_origin.is_none());
    }

    #[test]
    fn placeholder_secret_is_rejected() {
        assert!(Config::from_lookup(lookup(&[])).is_err());
        assert!(
            Config::from_lookup(lookup(&[("STORMBRAINER_JWT_SECRET", "dev-secret-change-me")]))
                .is_err()
        );
    }

    #[test]
    fn bad_numbers_are_rejected() {
        let secret = ("STORMBRAINER_JWT_SECRET", "s3cret");
        assert!(Config::from_lookup(lookup(&[secret, ("STORMBRAINER_PORT", "http")])).is_err());
        assert!(
            Config::from_lookup(lookup(&[secret, ("STORMBRAINER_TOKEN_TTL_DAYS", "0")])).is_err()
        );
    }
}
