use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

const DEFAULT_RATE_LIMIT_WINDOW_MINUTES: u64 = 15;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub filter: FilterConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Local,
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "staging" | "stage" => Environment::Staging,
            "development" | "dev" => Environment::Development,
            _ => Environment::Local,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }

    /// Infix used by environment-specific variables such as `DB_DEV_HOST`.
    pub fn var_infix(&self) -> &'static str {
        match self {
            Environment::Local => "LOCAL",
            Environment::Development => "DEV",
            Environment::Staging => "STAGING",
            Environment::Production => "PROD",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Full connection string; when set the discrete fields are ignored.
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

impl DatabaseConfig {
    pub fn connection_url(&self) -> Result<String, url::ParseError> {
        if let Some(url) = &self.url {
            return Ok(url.clone());
        }
        let mut url = url::Url::parse(&format!("postgres://{}:{}", self.host, self.port))?;
        url.set_path(&self.name);
        // Only fails for cannot-be-a-base URLs, which a postgres:// URL never is.
        let _ = url.set_username(&self.user);
        let _ = url.set_password(self.password.as_deref());
        Ok(url.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    #[serde(skip_serializing)]
    pub secret: String,
    pub expires_in: Duration,
    pub refresh_expires_in: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub prefix: String,
    pub version: String,
    pub enable_rate_limiting: bool,
    pub rate_limit_requests: u32,
    pub rate_limit_window: Duration,
    pub enable_request_logging: bool,
    pub enable_response_compression: bool,
}

impl ApiConfig {
    /// Mount point of versioned routes, e.g. `/api/v1`.
    pub fn base_path(&self) -> String {
        let prefix = self.prefix.trim_matches('/');
        let version = self.version.trim_matches('/');
        match (prefix.is_empty(), version.is_empty()) {
            (true, true) => String::new(),
            (true, false) => format!("/{}", version),
            (false, true) => format!("/{}", prefix),
            (false, false) => format!("/{}/{}", prefix, version),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    /// Allowed origins; `*` allows any origin.
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    pub max_limit: Option<u64>,
    pub debug_logging: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = env::var("APP_ENV")
            .map(|v| Environment::parse(&v))
            .unwrap_or(Environment::Local);

        Self::for_environment(environment).with_env_overrides()
    }

    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Local => Self::local(),
            Environment::Development => Self::development(),
            Environment::Staging => Self::staging(),
            Environment::Production => Self::production(),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    fn with_env_overrides(mut self) -> Self {
        let infix = self.environment.var_infix();
        let scoped = |prefix: &str, suffix: &str| match suffix {
            "" => env::var(format!("{}_{}", prefix, infix)),
            _ => env::var(format!("{}_{}_{}", prefix, infix, suffix)),
        };

        // Server overrides
        if let Ok(v) = env::var("PORT").or_else(|_| env::var("APP_PORT")) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("HOST") {
            self.server.host = v;
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v).filter(|s| !s.is_empty());
        }
        if let Ok(v) = scoped("DB", "HOST") {
            self.database.host = v;
        }
        if let Ok(v) = scoped("DB", "PORT") {
            self.database.port = v.parse().unwrap_or(self.database.port);
        }
        if let Ok(v) = scoped("DB", "NAME") {
            self.database.name = v;
        }
        if let Ok(v) = scoped("DB", "USER") {
            self.database.user = v;
        }
        if let Ok(v) = scoped("DB", "PASSWORD") {
            self.database.password = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // JWT overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.jwt.secret = v;
        }
        if let Ok(v) = env::var("JWT_EXPIRES_IN") {
            self.jwt.expires_in = parse_duration(&v).unwrap_or(self.jwt.expires_in);
        }
        if let Ok(v) = env::var("JWT_REFRESH_EXPIRES_IN") {
            self.jwt.refresh_expires_in = parse_duration(&v).unwrap_or(self.jwt.refresh_expires_in);
        }

        // API overrides
        if let Ok(v) = env::var("API_PREFIX") {
            self.api.prefix = v;
        }
        if let Ok(v) = env::var("API_VERSION") {
            self.api.version = v;
        }
        if let Ok(v) = env::var("API_ENABLE_RATE_LIMITING") {
            self.api.enable_rate_limiting = v.parse().unwrap_or(self.api.enable_rate_limiting);
        }
        if let Ok(v) = env::var("RATE_LIMIT_MAX_REQUESTS") {
            self.api.rate_limit_requests = v.parse().unwrap_or(self.api.rate_limit_requests);
        }
        if let Ok(v) = env::var("RATE_LIMIT_WINDOW_MINUTES") {
            self.api.rate_limit_window = parse_window_minutes(&v).unwrap_or(self.api.rate_limit_window);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_ENABLE_RESPONSE_COMPRESSION") {
            self.api.enable_response_compression = v.parse().unwrap_or(self.api.enable_response_compression);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = scoped("CORS_ORIGIN", "").or_else(|_| env::var("SECURITY_CORS_ORIGINS")) {
            self.security.cors_origins = parse_origins(&v);
        }

        // Filter overrides
        if let Ok(v) = env::var("FILTER_MAX_LIMIT") {
            self.filter.max_limit = v.parse().ok().filter(|n| *n > 0);
        }
        if let Ok(v) = env::var("FILTER_DEBUG_LOGGING") {
            self.filter.debug_logging = v.parse().unwrap_or(self.filter.debug_logging);
        }

        self
    }

    fn local() -> Self {
        Self {
            environment: Environment::Local,
            server: ServerConfig { host: "0.0.0.0".to_string(), port: 3000 },
            database: DatabaseConfig {
                url: None,
                host: "localhost".to_string(),
                port: 5432,
                name: "catalog_local".to_string(),
                user: "postgres".to_string(),
                password: None,
                max_connections: 5,
                connection_timeout: 30,
            },
            jwt: JwtConfig {
                secret: "local-development-secret".to_string(),
                expires_in: Duration::from_secs(24 * 3600),
                refresh_expires_in: Duration::from_secs(7 * 24 * 3600),
            },
            api: ApiConfig {
                prefix: "api".to_string(),
                version: "v1".to_string(),
                enable_rate_limiting: true,
                rate_limit_requests: 100,
                rate_limit_window: Duration::from_secs(DEFAULT_RATE_LIMIT_WINDOW_MINUTES * 60),
                enable_request_logging: true,
                enable_response_compression: false,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
            },
            filter: FilterConfig { max_limit: None, debug_logging: true },
        }
    }

    fn development() -> Self {
        let mut config = Self::local();
        config.environment = Environment::Development;
        config.database.name = "catalog_dev".to_string();
        config.database.max_connections = 10;
        config
    }

    fn staging() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Staging;
        config.database.name = "catalog_staging".to_string();
        config.database.max_connections = 20;
        config.database.connection_timeout = 10;
        config.jwt.secret = String::new();
        config.api.enable_response_compression = true;
        config.security.cors_origins = vec![];
        config.filter.debug_logging = false;
        config
    }

    fn production() -> Self {
        let mut config = Self::staging();
        config.environment = Environment::Production;
        config.database.name = "catalog".to_string();
        config.database.max_connections = 50;
        config.database.connection_timeout = 5;
        config.api.enable_request_logging = false;
        config
    }
}

/// Parse a duration such as `24h`, `7d`, `15m`, `1h 30m` or a bare number of seconds.
pub fn parse_duration(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    if let Ok(seconds) = raw.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }
    humantime::parse_duration(raw).ok()
}

/// Rate-limit window from a minute count; `0` means the 15 minute default.
fn parse_window_minutes(raw: &str) -> Option<Duration> {
    match raw.trim().parse::<u64>().ok()? {
        0 => Some(Duration::from_secs(DEFAULT_RATE_LIMIT_WINDOW_MINUTES * 60)),
        minutes => minutes.checked_mul(60).map(Duration::from_secs),
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}
