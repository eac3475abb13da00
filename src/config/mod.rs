use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub backend: Backend,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub platform: PlatformConfig,
    pub security: SecurityConfig,
    pub seed: SeedConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

/// Where profiles, clients and identities live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Backend {
    /// Hosted identity platform + Postgres
    Postgres,
    /// Process-local maps, nothing survives a restart
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

/// Identity/database platform endpoints and credentials.
///
/// `anon_key` is the non-privileged credential used to verify callers;
/// `service_role_key` is the elevated credential that bypasses row-level restriction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    pub url: Option<String>,
    pub anon_key: Option<String>,
    pub service_role_key: Option<String>,
    pub jwt_secret: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub cors_origins: Vec<String>,
    pub recovery_redirect_to: Option<String>,
    pub jwt_expiry_hours: u64,
}

/// Bootstrap admin for the in-memory backend
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedConfig {
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
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
        if let Ok(v) = env::var("DOULA_BACKEND") {
            match v.to_ascii_lowercase().as_str() {
                "memory" => self.backend = Backend::Memory,
                "postgres" => self.backend = Backend::Postgres,
                other => tracing::warn!("Ignoring unknown DOULA_BACKEND '{}'", other),
            }
        }

        // Server overrides
        if let Some(port) = env::var("DOULA_API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.server.port = port;
        }
        if let Ok(v) = env::var("DOULA_API_HOST") {
            self.server.bind_host = v;
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Platform overrides
        if let Ok(v) = env::var("SUPABASE_URL") {
            self.platform.url = Some(v);
        }
        if let Ok(v) = env::var("SUPABASE_ANON_KEY") {
            self.platform.anon_key = Some(v);
        }
        if let Ok(v) = env::var("SUPABASE_SERVICE_ROLE_KEY") {
            self.platform.service_role_key = Some(v);
        }
        if let Ok(v) = env::var("SUPABASE_JWT_SECRET") {
            self.platform.jwt_secret = Some(v);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("SECURITY_RECOVERY_REDIRECT_TO") {
            self.security.recovery_redirect_to = Some(v);
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }

        // Seed overrides
        if let Ok(v) = env::var("DOULA_SEED_ADMIN_EMAIL") {
            self.seed.admin_email = Some(v);
        }
        if let Ok(v) = env::var("DOULA_SEED_ADMIN_PASSWORD") {
            self.seed.admin_password = Some(v);
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            backend: Backend::Memory,
            server: ServerConfig {
                bind_host: "127.0.0.1".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 5,
                connection_timeout: 30,
            },
            platform: PlatformConfig {
                url: None,
                anon_key: None,
                service_role_key: None,
                jwt_secret: Some("papo-doula-dev-secret".to_string()),
            },
            security: SecurityConfig {
                cors_origins: vec!["http://localhost:4200".to_string(), "http://localhost:5173".to_string()],
                recovery_redirect_to: None,
                jwt_expiry_hours: 24,
            },
            seed: SeedConfig::default(),
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            backend: Backend::Postgres,
            server: ServerConfig {
                bind_host: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 10,
            },
            platform: PlatformConfig {
                url: None,
                anon_key: None,
                service_role_key: None,
                jwt_secret: None,
            },
            security: SecurityConfig {
                cors_origins: vec!["https://staging.papodedoula.com.br".to_string()],
                recovery_redirect_to: None,
                jwt_expiry_hours: 4,
            },
            seed: SeedConfig::default(),
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            backend: Backend::Postgres,
            server: ServerConfig {
                bind_host: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 5,
            },
            platform: PlatformConfig {
                url: None,
                anon_key: None,
                service_role_key: None,
                jwt_secret: None,
            },
            security: SecurityConfig {
                cors_origins: vec!["https://app.papodedoula.com.br".to_string()],
                recovery_redirect_to: Some("https://app.papodedoula.com.br/change-password".to_string()),
                jwt_expiry_hours: 1,
            },
            seed: SeedConfig::default(),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.bind_host, self.server.port)
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.backend, Backend::Memory);
        assert!(config.platform.jwt_secret.is_some());
        assert_eq!(config.bind_addr(), "127.0.0.1:3000");
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.backend, Backend::Postgres);
        assert!(config.platform.jwt_secret.is_none());
        assert!(config.security.recovery_redirect_to.is_some());
    }
}
