use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEV_JWT_SECRET: &str = "campuspay-development-secret-do-not-deploy";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub host: String,
    pub port: u16,

    // Storage
    pub redis_url: String,
    pub data_file: Option<PathBuf>,
    pub flush_interval: Duration,

    // Auth
    pub jwt_secret: String,
    pub jwt_ttl: Duration,
    pub password_iterations: u32,
    pub mpin_max_attempts: u32,
    pub mpin_lockout: Duration,

    // QR payments
    pub qr_ttl: Duration,

    // Rate Limiting
    pub rate_limit_per_second: u64,
    pub rate_limit_burst: u32,

    // Bootstrap administrator
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            host: "0.0.0.0".to_string(),
            port: 8080,
            redis_url: "redis://localhost:6379".to_string(),
            data_file: None,
            flush_interval: Duration::from_secs(30),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_ttl: Duration::from_secs(86_400),
            password_iterations: 100_000,
            mpin_max_attempts: 5,
            mpin_lockout: Duration::from_secs(900),
            qr_ttl: Duration::from_secs(300),
            rate_limit_per_second: 10,
            rate_limit_burst: 30,
            admin_email: None,
            admin_password: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        let environment = Self::parse_environment()?;

        let config = Self {
            environment,
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: Self::parse_var("PORT", defaults.port)?,

            redis_url: std::env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            data_file: std::env::var("DATA_FILE").ok().map(PathBuf::from),
            flush_interval: Duration::from_secs(Self::parse_var("FLUSH_INTERVAL_SECS", 30)?),

            jwt_secret: std::env::var("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            jwt_ttl: Duration::from_secs(Self::parse_var("JWT_TTL_SECS", 86_400)?),
            password_iterations: Self::parse_var(
                "PBKDF2_ITERATIONS",
                defaults.password_iterations,
            )?,
            mpin_max_attempts: Self::parse_var("MPIN_MAX_ATTEMPTS", defaults.mpin_max_attempts)?,
            mpin_lockout: Duration::from_secs(Self::parse_var("MPIN_LOCKOUT_SECS", 900)?),

            qr_ttl: Duration::from_secs(Self::parse_var("QR_TTL_SECS", 300)?),

            rate_limit_per_second: Self::parse_var(
                "RATE_LIMIT_PER_SECOND",
                defaults.rate_limit_per_second,
            )?,
            rate_limit_burst: Self::parse_var("RATE_LIMIT_BURST", defaults.rate_limit_burst)?,

            admin_email: std::env::var("ADMIN_EMAIL").ok(),
            admin_password: std::env::var("ADMIN_PASSWORD").ok(),
        };

        config.validate()?;
        Ok(config)
    }

    fn parse_environment() -> Result<Environment> {
        let env = std::env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "development".to_string());

        match env.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" | "stage" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            _ => bail!("Unknown environment: {}", env),
        }
    }

    fn parse_var<T>(var: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        match std::env::var(var) {
            Ok(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("Invalid {}", var)),
            Err(_) => Ok(default),
        }
    }

    fn validate(&self) -> Result<()> {
        if !self.redis_url.starts_with("redis://") && !self.redis_url.starts_with("rediss://") {
            bail!("REDIS_URL must be a redis:// or rediss:// URL");
        }

        if self.environment == Environment::Production {
            if self.jwt_secret == DEV_JWT_SECRET {
                bail!("JWT_SECRET must be set in production");
            }
            if self.jwt_secret.len() < 32 {
                bail!("JWT_SECRET must be at least 32 bytes in production");
            }
            if self.password_iterations < 100_000 {
                bail!("PBKDF2_ITERATIONS must be at least 100000 in production");
            }
        }

        if self.password_iterations == 0 {
            bail!("PBKDF2_ITERATIONS must be greater than zero");
        }

        if self.mpin_max_attempts == 0 {
            bail!("MPIN_MAX_ATTEMPTS must be at least 1");
        }
        if self.qr_ttl.is_zero() {
            bail!("QR_TTL_SECS must be greater than zero");
        }
        if self.flush_interval.is_zero() {
            bail!("FLUSH_INTERVAL_SECS must be greater than zero");
        }
        if self.admin_email.is_some() != self.admin_password.is_some() {
            bail!("ADMIN_EMAIL and ADMIN_PASSWORD must be set together");
        }

        tracing::info!(
            "Configuration validated for {:?} environment",
            self.environment
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn production_rejects_development_secret() {
        let config = Config {
            environment: Environment::Production,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            environment: Environment::Production,
            jwt_secret: "x".repeat(48),
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn admin_credentials_come_in_pairs() {
        let config = Config {
            admin_email: Some("admin@campus.edu".to_string()),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
