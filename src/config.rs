use actix_web::cookie::Key;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/lawdesk";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_ADMIN_EMAIL: &str = "admin@mycase.local";
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";
const MIN_SESSION_KEY_LEN: usize = 64;

/// Runtime settings read from the environment (and `.env` via dotenvy).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub port: u16,
    pub max_connections: u32,
    pub session_key: Option<String>,
    pub cookie_secure: bool,
    pub admin_email: String,
    pub admin_password: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup. Unparsable numbers fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let port = match non_empty("PORT").map(|v| v.parse::<u16>()) {
            Some(Ok(p)) => p,
            Some(Err(_)) => {
                log::warn!("PORT is not a valid port number, using {DEFAULT_PORT}");
                DEFAULT_PORT
            }
            None => DEFAULT_PORT,
        };

        let max_connections = non_empty("DB_MAX_CONNECTIONS")
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_MAX_CONNECTIONS);

        let cookie_secure = non_empty("COOKIE_SECURE")
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        AppConfig {
            database_url: non_empty("DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            bind_addr: non_empty("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            port,
            max_connections,
            session_key: non_empty("SESSION_KEY"),
            cookie_secure,
            admin_email: non_empty("ADMIN_EMAIL")
                .unwrap_or_else(|| DEFAULT_ADMIN_EMAIL.to_string()),
            admin_password: non_empty("ADMIN_PASSWORD")
                .unwrap_or_else(|| DEFAULT_ADMIN_PASSWORD.to_string()),
        }
    }

    /// Session encryption key. A missing or short SESSION_KEY yields a random key,
    /// so sessions do not survive a restart.
    pub fn cookie_key(&self) -> Key {
        match &self.session_key {
            Some(val) if val.len() >= MIN_SESSION_KEY_LEN => {
                log::info!("Using SESSION_KEY from environment");
                Key::from(val.as_bytes())
            }
            Some(val) => {
                log::warn!(
                    "SESSION_KEY too short ({} bytes, need {MIN_SESSION_KEY_LEN}+), generating random key",
                    val.len()
                );
                Key::generate()
            }
            None => {
                log::warn!("No SESSION_KEY set, generating random key (sessions lost on restart)");
                Key::generate()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let cfg = config_from(&[]);
        assert_eq!(cfg.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(cfg.bind_addr, "0.0.0.0");
        assert_eq!(cfg.port, 5000);
        assert_eq!(cfg.max_connections, 8);
        assert!(!cfg.cookie_secure);
        assert!(cfg.session_key.is_none());
        assert_eq!(cfg.admin_email, "admin@mycase.local");
    }

    #[test]
    fn reads_overrides() {
        let cfg = config_from(&[
            ("DATABASE_URL", "postgres://db/firm"),
            ("PORT", "8088"),
            ("DB_MAX_CONNECTIONS", "20"),
            ("COOKIE_SECURE", "true"),
        ]);
        assert_eq!(cfg.database_url, "postgres://db/firm");
        assert_eq!(cfg.port, 8088);
        assert_eq!(cfg.max_connections, 20);
        assert!(cfg.cookie_secure);
    }

    #[test]
    fn bad_numbers_fall_back() {
        let cfg = config_from(&[("PORT", "eighty"), ("DB_MAX_CONNECTIONS", "0")]);
        assert_eq!(cfg.port, 5000);
        assert_eq!(cfg.max_connections, 8);
    }

    #[test]
    fn blank_values_count_as_unset() {
        let cfg = config_from(&[("SESSION_KEY", "   "), ("ADMIN_PASSWORD", "")]);
        assert!(cfg.session_key.is_none());
        assert_eq!(cfg.admin_password, "admin123");
    }
}
