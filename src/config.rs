use std::env;
use std::fmt;
use std::time::Duration;

/// Value of `DATABASE_URL` that selects the in-process store instead of Postgres.
pub const MEMORY_DATABASE_URL: &str = "memory";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_port: u16,
    pub server_host: String,
    pub bcrypt_cost: u32,
    pub db_max_connections: u32,
    pub db_timeout: Duration,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid { key, value } => write!(f, "{} has invalid value {:?}", key, value),
        }
    }
}

impl std::error::Error for ConfigError {}

fn parse_or<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let bcrypt_cost = parse_or("BCRYPT_COST", bcrypt::DEFAULT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                key: "BCRYPT_COST",
                value: bcrypt_cost.to_string(),
            });
        }

        let timeout_secs: u64 = parse_or("DB_TIMEOUT_SECS", 5)?;
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "DB_TIMEOUT_SECS",
                value: "0".into(),
            });
        }

        Ok(Self {
            database_url,
            server_port: parse_or("SERVER_PORT", 8080)?,
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            bcrypt_cost,
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", 5)?,
            db_timeout: Duration::from_secs(timeout_secs),
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }

    pub fn uses_memory_store(&self) -> bool {
        self.database_url == MEMORY_DATABASE_URL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lazy_static::lazy_static;
    use std::sync::Mutex;

    lazy_static! {
        static ref ENV_LOCK: Mutex<()> = Mutex::new(());
    }

    const KEYS: [&str; 6] = [
        "DATABASE_URL",
        "SERVER_PORT",
        "SERVER_HOST",
        "BCRYPT_COST",
        "DB_MAX_CONNECTIONS",
        "DB_TIMEOUT_SECS",
    ];

    fn clear() {
        for key in KEYS {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_config_from_env() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear();
        env::set_var("DATABASE_URL", "postgres://test");

        let config = Config::from_env().unwrap();

        assert_eq!(config.database_url, "postgres://test");
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.server_host, "127.0.0.1");
        assert_eq!(config.bcrypt_cost, bcrypt::DEFAULT_COST);
        assert_eq!(config.db_timeout, Duration::from_secs(5));
        assert!(!config.uses_memory_store());

        env::set_var("SERVER_PORT", "3000");
        env::set_var("SERVER_HOST", "0.0.0.0");
        env::set_var("BCRYPT_COST", "10");

        let config = Config::from_env().unwrap();

        assert_eq!(config.server_port, 3000);
        assert_eq!(config.server_host, "0.0.0.0");
        assert_eq!(config.bcrypt_cost, 10);
        assert_eq!(config.server_url(), "http://0.0.0.0:3000");
        clear();
    }

    #[test]
    fn test_config_rejects_bad_values() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear();
        assert_eq!(
            Config::from_env().unwrap_err(),
            ConfigError::Missing("DATABASE_URL")
        );

        env::set_var("DATABASE_URL", MEMORY_DATABASE_URL);
        env::set_var("SERVER_PORT", "eighty");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid { key: "SERVER_PORT", .. })
        ));

        env::remove_var("SERVER_PORT");
        env::set_var("BCRYPT_COST", "2");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid { key: "BCRYPT_COST", .. })
        ));

        env::remove_var("BCRYPT_COST");
        assert!(Config::from_env().unwrap().uses_memory_store());
        clear();
    }
}
