use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub environment: Environment,
    pub service_name: String,
    pub log_level: String,
    pub redis: RedisConfig,
    pub jwt: JwtConfig,
    pub totp: TotpConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub private_key_path: String,
    pub public_key_path: String,
    pub access_token_expiry_minutes: i64,
    pub refresh_token_expiry_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TotpConfig {
    /// Issuer shown by authenticator apps and embedded in provisioning URIs.
    pub issuer: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub failed_login_threshold: u32,
    pub failed_login_window_seconds: i64,
    pub totp_setup_ttl_seconds: i64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            failed_login_threshold: 5,
            failed_login_window_seconds: 900,
            totp_setup_ttl_seconds: 300,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))?;

        let is_prod = environment == Environment::Prod;

        let config = Config {
            environment,
            service_name: get_env("SERVICE_NAME", Some("auth-core"), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            redis: RedisConfig {
                url: get_env("REDIS_URL", Some("redis://127.0.0.1:6379"), is_prod)?,
            },
            jwt: JwtConfig {
                private_key_path: get_env("JWT_PRIVATE_KEY_PATH", None, is_prod)?,
                public_key_path: get_env("JWT_PUBLIC_KEY_PATH", None, is_prod)?,
                access_token_expiry_minutes: get_env(
                    "JWT_ACCESS_TOKEN_EXPIRY_MINUTES",
                    Some("15"),
                    is_prod,
                )?
                .parse()
                .map_err(|e: std::num::ParseIntError| anyhow::anyhow!(e.to_string()))?,
                refresh_token_expiry_days: get_env(
                    "JWT_REFRESH_TOKEN_EXPIRY_DAYS",
                    Some("30"),
                    is_prod,
                )?
                .parse()
                .map_err(|e: std::num::ParseIntError| anyhow::anyhow!(e.to_string()))?,
            },
            totp: TotpConfig {
                issuer: get_env("TOTP_ISSUER", Some("FinTrack"), is_prod)?,
            },
            security: SecurityConfig {
                failed_login_threshold: get_env("FAILED_LOGIN_THRESHOLD", Some("5"), is_prod)?
                    .parse()
                    .unwrap_or(5),
                failed_login_window_seconds: get_env(
                    "FAILED_LOGIN_WINDOW_SECONDS",
                    Some("900"),
                    is_prod,
                )?
                .parse()
                .unwrap_or(900),
                totp_setup_ttl_seconds: get_env("TOTP_SETUP_TTL_SECONDS", Some("300"), is_prod)?
                    .parse()
                    .unwrap_or(300),
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), anyhow::Error> {
        if self.jwt.access_token_expiry_minutes <= 0 {
            return Err(anyhow::anyhow!(
                "JWT_ACCESS_TOKEN_EXPIRY_MINUTES must be positive"
            ));
        }

        if self.jwt.refresh_token_expiry_days <= 0 {
            return Err(anyhow::anyhow!(
                "JWT_REFRESH_TOKEN_EXPIRY_DAYS must be positive"
            ));
        }

        if self.totp.issuer.is_empty() {
            return Err(anyhow::anyhow!("TOTP_ISSUER must not be empty"));
        }

        if self.security.failed_login_threshold == 0 {
            return Err(anyhow::anyhow!("FAILED_LOGIN_THRESHOLD must be positive"));
        }

        if self.security.totp_setup_ttl_seconds <= 0 {
            return Err(anyhow::anyhow!("TOTP_SETUP_TTL_SECONDS must be positive"));
        }

        Ok(())
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, anyhow::Error> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                ))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(anyhow::anyhow!("{} is required but not set", key))
            }
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}
