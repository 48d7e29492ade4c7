//! Server configuration, read from the environment.

use std::path::PathBuf;
use std::time::Duration;

use famiglia_game::GameSettings;
use famiglia_session::{AdminCredentials, TokenConfig};
use famiglia_store::RetryPolicy;
use tracing::warn;

/// Everything needed to start a server.
///
/// `Default` gives a local development setup: loopback bind, development
/// secret and admin password, no seed file.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    /// Address to listen on. Default: `127.0.0.1:8000`.
    pub bind_addr: String,
    pub tokens: TokenConfig,
    pub admin: AdminCredentials,
    pub retry: RetryPolicy,
    pub game: GameSettings,
    /// JSON file with initial players, missions and offers.
    pub seed_path: Option<PathBuf>,
}

/// Environment keys read by [`ServerConfig::from_env`].
pub mod env {
    pub const BIND: &str = "FAMIGLIA_BIND";
    pub const SECRET_KEY: &str = "SECRET_KEY";
    pub const ADMIN_USERNAME: &str = "ADMIN_USERNAME";
    pub const ADMIN_PASSWORD: &str = "ADMIN_PASSWORD";
    pub const SEED: &str = "FAMIGLIA_SEED";
    pub const STORE_TIMEOUT_MS: &str = "FAMIGLIA_STORE_TIMEOUT_MS";
}

const DEFAULT_BIND: &str = "127.0.0.1:8000";

impl ServerConfig {
    /// Builds a config from the process environment, falling back to the
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self {
            bind_addr: DEFAULT_BIND.to_string(),
            ..Self::default()
        };

        if let Some(bind) = get(env::BIND) {
            config.bind_addr = bind;
        }
        match get(env::SECRET_KEY) {
            Some(secret) => config.tokens.secret = secret,
            None => warn!("SECRET_KEY not set, using the development secret"),
        }
        if let Some(email) = get(env::ADMIN_USERNAME) {
            config.game.test_recipient = email.clone();
            config.admin.email = email;
        }
        match get(env::ADMIN_PASSWORD) {
            Some(password) => config.admin.password = password,
            None => warn!("ADMIN_PASSWORD not set, using the development password"),
        }
        config.seed_path = get(env::SEED).map(PathBuf::from);
        if let Some(raw) = get(env::STORE_TIMEOUT_MS) {
            match raw.parse::<u64>() {
                Ok(ms) => config.retry.timeout = Duration::from_millis(ms),
                Err(e) => warn!(value = %raw, error = %e, "ignoring invalid store timeout"),
            }
        }
        config
    }

    /// Clamp out-of-range values in every sub-config.
    pub fn validated(mut self) -> Self {
        if self.bind_addr.is_empty() {
            self.bind_addr = DEFAULT_BIND.to_string();
        }
        self.retry = self.retry.validated();
        self.game = self.game.validated();
        self
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_from_lookup_empty_uses_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[]));

        assert_eq!(config.bind_addr, DEFAULT_BIND);
        assert_eq!(config.admin.email, AdminCredentials::default().email);
        assert!(config.seed_path.is_none());
        assert_eq!(config.retry.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_from_lookup_reads_every_key() {
        let config = ServerConfig::from_lookup(lookup(&[
            (env::BIND, "0.0.0.0:9000"),
            (env::SECRET_KEY, "s3cret"),
            (env::ADMIN_USERNAME, "don@corleone.it"),
            (env::ADMIN_PASSWORD, "olive-oil"),
            (env::SEED, "/tmp/seed.json"),
            (env::STORE_TIMEOUT_MS, "250"),
        ]));

        assert_eq!(config.bind_addr, "0.0.0.0:9000");
        assert_eq!(config.tokens.secret, "s3cret");
        assert_eq!(config.admin.email, "don@corleone.it");
        assert_eq!(config.game.test_recipient, "don@corleone.it");
        assert_eq!(config.admin.password, "olive-oil");
        assert_eq!(config.seed_path, Some(PathBuf::from("/tmp/seed.json")));
        assert_eq!(config.retry.timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_from_lookup_bad_timeout_keeps_default() {
        let config = ServerConfig::from_lookup(lookup(&[(env::STORE_TIMEOUT_MS, "soon")]));
        assert_eq!(config.retry.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_validated_fills_empty_bind() {
        let config = ServerConfig::default().validated();
        assert_eq!(config.bind_addr, DEFAULT_BIND);
    }
}
