use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub course: CourseConfig,
    /// Frontend origin used for payment redirect URLs.
    pub client_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connection_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub access_token_expiry_mins: i64,
    pub refresh_token_expiry_hours: i64,
    pub reset_token_expiry_mins: i64,
    pub cors_origins: Vec<String>,
}

/// Business rules for the course catalog. The video cap was hard-coded in
/// earlier revisions; it lives here so deployments can adjust it without a
/// code change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseConfig {
    pub max_videos_per_section: usize,
    pub default_page_limit: i64,
    pub max_page_limit: i64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout_secs =
                v.parse().unwrap_or(self.database.connection_timeout_secs);
        }

        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("ACCESS_TOKEN_EXPIRY_MINS") {
            self.security.access_token_expiry_mins =
                v.parse().unwrap_or(self.security.access_token_expiry_mins);
        }
        if let Ok(v) = env::var("REFRESH_TOKEN_EXPIRY_HOURS") {
            self.security.refresh_token_expiry_hours =
                v.parse().unwrap_or(self.security.refresh_token_expiry_hours);
        }
        if let Ok(v) = env::var("RESET_TOKEN_EXPIRY_MINS") {
            self.security.reset_token_expiry_mins =
                v.parse().unwrap_or(self.security.reset_token_expiry_mins);
        }
        if let Ok(v) = env::var("CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        if let Ok(v) = env::var("COURSE_MAX_VIDEOS_PER_SECTION") {
            self.course.max_videos_per_section =
                v.parse().unwrap_or(self.course.max_videos_per_section);
        }
        if let Ok(v) = env::var("COURSE_DEFAULT_PAGE_LIMIT") {
            self.course.default_page_limit = v.parse().unwrap_or(self.course.default_page_limit);
        }
        if let Ok(v) = env::var("COURSE_MAX_PAGE_LIMIT") {
            self.course.max_page_limit = v.parse().unwrap_or(self.course.max_page_limit);
        }

        if let Ok(v) = env::var("CLIENT_URL") {
            self.client_url = v;
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout_secs: 30,
            },
            security: SecurityConfig {
                jwt_secret: "dev_secret_change_me".to_string(),
                access_token_expiry_mins: 15,
                refresh_token_expiry_hours: 24 * 7,
                reset_token_expiry_mins: 15,
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ],
            },
            course: CourseConfig {
                max_videos_per_section: 3,
                default_page_limit: 10,
                max_page_limit: 100,
            },
            client_url: "http://localhost:5173".to_string(),
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                max_connections: 20,
                connection_timeout_secs: 10,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                access_token_expiry_mins: 15,
                refresh_token_expiry_hours: 24,
                reset_token_expiry_mins: 15,
                cors_origins: vec!["https://staging.eduvia.space".to_string()],
            },
            course: CourseConfig {
                max_videos_per_section: 3,
                default_page_limit: 10,
                max_page_limit: 100,
            },
            client_url: "https://staging.eduvia.space".to_string(),
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                max_connections: 50,
                connection_timeout_secs: 5,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                access_token_expiry_mins: 15,
                refresh_token_expiry_hours: 24,
                reset_token_expiry_mins: 15,
                cors_origins: vec!["https://eduvia.space".to_string()],
            },
            course: CourseConfig {
                max_videos_per_section: 3,
                default_page_limit: 10,
                max_page_limit: 50,
            },
            client_url: "https://eduvia.space".to_string(),
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_defaults() {
        let config = AppConfig::development();
        assert_eq!(config.course.max_videos_per_section, 3);
        assert_eq!(config.course.default_page_limit, 10);
        assert!(!config.security.jwt_secret.is_empty());
    }

    #[test]
    fn production_tightens_limits() {
        let config = AppConfig::production();
        assert_eq!(config.course.max_page_limit, 50);
        assert!(config.security.jwt_secret.is_empty());
    }
}
