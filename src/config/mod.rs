use serde::{Deserialize, Serialize};
use std::env;

/// Process configuration, built once at startup and passed down explicitly
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub package: PackageInfo,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_permissive: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is unset
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("SEEDLER_HOST") {
            self.server.host = v;
        }
        if let Some(port) = env::var("SEEDLER_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.server.port = port;
        }
        if let Ok(v) = env::var("CORS_PERMISSIVE") {
            self.server.cors_permissive = v.parse().unwrap_or(self.server.cors_permissive);
        }

        // Logging overrides
        if let Ok(v) = env::var("LOG_LEVEL") {
            self.logging.level = v.to_lowercase();
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            package: PackageInfo::current(),
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                cors_permissive: true,
            },
            logging: LoggingConfig {
                level: "debug".to_string(),
            },
            security: SecurityConfig {
                jwt_secret: "seedler-development-secret".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
            },
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            package: PackageInfo::current(),
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                cors_permissive: false,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
            },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            package: PackageInfo::current(),
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                cors_permissive: false,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 4,
            },
        }
    }

    /// `name#version`, sent as `X-Version`
    pub fn package_description(&self) -> String {
        format!("{}#{}", self.package.name, self.package.version)
    }

    /// Settings the server can start without but will not work properly with
    pub fn startup_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.security.jwt_secret.is_empty() {
            warnings.push(
                "JWT_SECRET is not set: every bearer token will be rejected".to_string(),
            );
        }

        warnings
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Named logger: a span every event of `component` is recorded under
    pub fn logger(&self, component: &'static str) -> tracing::Span {
        tracing::info_span!("component", name = component, env = ?self.environment)
    }
}

impl PackageInfo {
    pub fn current() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
