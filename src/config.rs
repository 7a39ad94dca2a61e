use std::collections::HashMap;
use std::env;
use std::fmt;

/// Ten years.
pub const MAX_TOKEN_EXPIRATION_HOURS: i64 = 24 * 365 * 10;

/// Authentication settings shared by token issuance and verification.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC secret used to sign and verify JWTs.
    pub jwt_secret: String,
    /// Token lifetime in hours.
    pub token_expiration_hours: i64,
}

impl AuthConfig {
    pub fn new(jwt_secret: impl Into<String>, token_expiration_hours: i64) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            token_expiration_hours,
        }
    }
}

/// Credentials of the administrator created on first start.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Application configuration, assembled once at process start.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_port: u16,
    pub server_host: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub auth: AuthConfig,
    pub admin: Option<AdminConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid { key, value } => {
                write!(f, "{} has an invalid value: '{}'", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Builds the configuration from an explicit variable map.
    ///
    /// Blank values are treated as unset.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            vars.get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let database_url = match get("DATABASE_URL") {
            Some(url) => url,
            None => format!(
                "postgresql://{}:{}@{}/{}?sslmode=disable",
                get("DB_USER").unwrap_or_else(|| "dbadmin".to_string()),
                get("DB_PASSWORD").unwrap_or_else(|| "dbadmin".to_string()),
                get("DB_HOST").unwrap_or_else(|| "localhost:5432".to_string()),
                get("DB_NAME").unwrap_or_else(|| "go-db".to_string()),
            ),
        };

        let default_connections = std::thread::available_parallelism()
            .map(|n| n.get() as u32)
            .unwrap_or(1)
            + 1;

        let server_port = parse_or(get("SERVER_PORT"), "SERVER_PORT", 8080u16)?;
        let db_max_connections =
            parse_or(get("DB_MAX_OPEN_CONN"), "DB_MAX_OPEN_CONN", default_connections)?;
        let db_min_connections =
            parse_or(get("DB_MAX_IDLE_CONN"), "DB_MAX_IDLE_CONN", default_connections)?
                .min(db_max_connections);

        let jwt_secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        let token_expiration_hours =
            parse_or(get("JWT_EXPIRATION_HOURS"), "JWT_EXPIRATION_HOURS", 24i64)?;
        if !(1..=MAX_TOKEN_EXPIRATION_HOURS).contains(&token_expiration_hours) {
            return Err(ConfigError::Invalid {
                key: "JWT_EXPIRATION_HOURS",
                value: token_expiration_hours.to_string(),
            });
        }

        let admin = match (
            get("ADMIN_USERNAME"),
            get("ADMIN_EMAIL"),
            get("ADMIN_PASSWORD"),
        ) {
            (Some(username), Some(email), Some(password)) => Some(AdminConfig {
                username,
                email,
                password,
            }),
            _ => None,
        };

        Ok(Self {
            database_url,
            server_port,
            server_host: get("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            db_max_connections,
            db_min_connections,
            auth: AuthConfig::new(jwt_secret, token_expiration_hours),
            admin,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

fn parse_or<T: std::str::FromStr>(
    value: Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(raw) => raw
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        None => Ok(default),
    }
}
