//! Application configuration, read once from the environment at startup.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::db::DbConfig;
use crate::rate_limit::RateLimitConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set when ENVIRONMENT=production")]
    MissingInProduction(&'static str),

    #[error("ID_TOKEN_SECRET verification is for local development only; set FIREBASE_PROJECT_ID in production")]
    DevVerifierInProduction,

    #[error("either FIREBASE_PROJECT_ID or ID_TOKEN_SECRET must be set")]
    NoIdentityProvider,

    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// How incoming identity-provider ID tokens are verified.
#[derive(Debug, Clone)]
pub enum IdentityConfig {
    /// RS256 tokens issued by the hosted provider for this project.
    Firebase { project_id: String },
    /// HS256 tokens signed with a local secret.
    SharedSecret { secret: String },
}

#[derive(Debug, Clone)]
pub struct EmailJsConfig {
    pub service_id: String,
    pub template_id: String,
    pub public_key: String,
    pub private_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: String,
    pub host: String,
    pub port: u16,
    pub log_level: String,
    /// `None` keeps content in memory.
    pub database: Option<DbConfig>,
    pub allowed_origins: Vec<String>,
    /// Key rate limits on `X-Forwarded-For` set by a reverse proxy in front of us.
    pub trust_proxy: bool,
    pub admin_emails: Vec<String>,
    pub identity: IdentityConfig,
    pub session_ttl: Duration,
    pub upload_dir: Option<PathBuf>,
    pub site_url: String,
    pub site_name: String,
    pub emailjs: Option<EmailJsConfig>,
    pub contact_rate_limit: RateLimitConfig,
    pub auth_rate_limit: RateLimitConfig,
    pub client_log_min_severity: String,
}

const DEFAULT_SESSION_TTL_HOURS: u64 = 24 * 14;

const DEFAULT_ORIGINS: [&str; 2] = ["http://localhost:3000", "http://127.0.0.1:3000"];

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = get("ENVIRONMENT").unwrap_or_else(|| "development".to_string());
        let is_production = environment == "production";

        let admin_emails: Vec<String> = get("ADMIN_EMAILS")
            .map(|s| {
                s.split(',')
                    .map(|e| e.trim().to_string())
                    .filter(|e| !e.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let identity = match (get("FIREBASE_PROJECT_ID"), get("ID_TOKEN_SECRET")) {
            (Some(project_id), _) => IdentityConfig::Firebase { project_id },
            (None, Some(_)) if is_production => return Err(ConfigError::DevVerifierInProduction),
            (None, Some(secret)) => IdentityConfig::SharedSecret { secret },
            (None, None) => return Err(ConfigError::NoIdentityProvider),
        };

        if is_production && admin_emails.is_empty() {
            return Err(ConfigError::MissingInProduction("ADMIN_EMAILS"));
        }

        let session_ttl_hours = parse_or(&get, "SESSION_TTL_HOURS", DEFAULT_SESSION_TTL_HOURS)?;

        let emailjs = match (
            get("EMAILJS_SERVICE_ID"),
            get("EMAILJS_TEMPLATE_ID"),
            get("EMAILJS_PUBLIC_KEY"),
        ) {
            (Some(service_id), Some(template_id), Some(public_key)) => Some(EmailJsConfig {
                service_id,
                template_id,
                public_key,
                private_key: get("EMAILJS_PRIVATE_KEY"),
            }),
            _ => None,
        };

        let allowed_origins: Vec<String> = get("ALLOWED_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|origins| !origins.is_empty())
            .or_else(|| get("FRONTEND_ORIGIN").map(|o| vec![o.trim().to_string()]))
            .unwrap_or_else(|| {
                DEFAULT_ORIGINS.iter().map(|o| o.to_string()).collect()
            });

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or(&get, "PORT", 3001)?,
            log_level: get("LOG_LEVEL")
                .unwrap_or_else(|| (if is_production { "info" } else { "debug" }).to_string()),
            database: DbConfig::from_lookup(&get),
            allowed_origins,
            trust_proxy: parse_or(&get, "TRUST_PROXY", false)?,
            admin_emails,
            identity,
            session_ttl: Duration::from_secs(session_ttl_hours * 3600),
            upload_dir: get("UPLOAD_DIR").map(PathBuf::from),
            site_url: get("SITE_URL")
                .unwrap_or_else(|| "https://motionwealthgroup.com".to_string())
                .trim_end_matches('/')
                .to_string(),
            site_name: get("SITE_NAME").unwrap_or_else(|| "Motion Wealth Group".to_string()),
            emailjs,
            contact_rate_limit: RateLimitConfig {
                max_requests: parse_or(&get, "CONTACT_RATE_LIMIT", 5)?,
                window: Duration::from_secs(parse_or(&get, "CONTACT_RATE_WINDOW_SECS", 60)?),
            },
            auth_rate_limit: RateLimitConfig {
                max_requests: parse_or(&get, "AUTH_RATE_LIMIT", 10)?,
                window: Duration::from_secs(parse_or(&get, "AUTH_RATE_WINDOW_SECS", 60)?),
            },
            client_log_min_severity: get("CLIENT_LOG_MIN_SEVERITY")
                .unwrap_or_else(|| "info".to_string()),
            environment,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn parse_or<G, T>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match get(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}
