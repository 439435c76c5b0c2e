use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use domaris_application::ActivityLogSettings;
use domaris_core::AppError;
use tracing_subscriber::EnvFilter;

const MIN_SESSION_SECRET_LENGTH: usize = 32;

/// Runtime configuration read from the environment.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub database_url: String,
    pub frontend_url: String,
    pub session_secret: Option<String>,
    pub api_host: String,
    pub api_port: u16,
    pub cookie_secure: bool,
    pub audit_purge_default_days: u32,
    pub audit_stats_default_days: u32,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let database_url = required_env("DATABASE_URL")?;
        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());
        let session_secret = env::var("SESSION_SECRET").ok();

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);

        let cookie_secure = env::var("SESSION_COOKIE_SECURE")
            .unwrap_or_else(|_| "false".to_owned())
            .eq_ignore_ascii_case("true");

        let defaults = ActivityLogSettings::default();
        let audit_purge_default_days =
            days_env("AUDIT_PURGE_DEFAULT_DAYS", defaults.purge_default_days)?;
        let audit_stats_default_days =
            days_env("AUDIT_STATS_DEFAULT_DAYS", defaults.stats_default_days)?;

        Ok(Self {
            database_url,
            frontend_url,
            session_secret,
            api_host,
            api_port,
            cookie_secure,
            audit_purge_default_days,
            audit_stats_default_days,
        })
    }

    /// Validates the session secret; only the HTTP server needs it.
    pub fn require_session_secret(&self) -> Result<&str, AppError> {
        let secret = self
            .session_secret
            .as_deref()
            .ok_or_else(|| AppError::Validation("SESSION_SECRET is required".to_owned()))?;

        if secret.len() < MIN_SESSION_SECRET_LENGTH {
            return Err(AppError::Validation(format!(
                "SESSION_SECRET must be at least {MIN_SESSION_SECRET_LENGTH} characters"
            )));
        }

        Ok(secret)
    }

    pub fn activity_log_settings(&self) -> ActivityLogSettings {
        ActivityLogSettings {
            purge_default_days: self.audit_purge_default_days,
            stats_default_days: self.audit_stats_default_days,
        }
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn days_env(name: &str, default: u32) -> Result<u32, AppError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => parse_days(name, value.trim()),
        _ => Ok(default),
    }
}

fn parse_days(name: &str, value: &str) -> Result<u32, AppError> {
    match value.parse::<u32>() {
        Ok(days) if days > 0 => Ok(days),
        _ => Err(AppError::Validation(format!(
            "{name} must be a positive number of days, got '{value}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::{ApiConfig, parse_days};

    fn config_with_secret(secret: Option<&str>) -> ApiConfig {
        ApiConfig {
            database_url: "postgres://localhost/domaris".to_owned(),
            frontend_url: "http://localhost:3000".to_owned(),
            session_secret: secret.map(ToOwned::to_owned),
            api_host: "127.0.0.1".to_owned(),
            api_port: 3001,
            cookie_secure: false,
            audit_purge_default_days: 90,
            audit_stats_default_days: 30,
        }
    }

    #[test]
    fn short_or_missing_session_secret_is_rejected() {
        assert!(config_with_secret(None).require_session_secret().is_err());
        assert!(config_with_secret(Some("short")).require_session_secret().is_err());
        assert!(
            config_with_secret(Some(&"x".repeat(32)))
                .require_session_secret()
                .is_ok()
        );
    }

    #[test]
    fn day_windows_must_be_positive() {
        assert_eq!(parse_days("AUDIT_PURGE_DEFAULT_DAYS", "30").ok(), Some(30));
        assert!(parse_days("AUDIT_PURGE_DEFAULT_DAYS", "0").is_err());
        assert!(parse_days("AUDIT_PURGE_DEFAULT_DAYS", "soon").is_err());
    }

    #[test]
    fn socket_address_combines_host_and_port() {
        let address = config_with_secret(None).socket_address();
        assert_eq!(
            address.map(|address| address.to_string()).ok().as_deref(),
            Some("127.0.0.1:3001")
        );
    }
}
