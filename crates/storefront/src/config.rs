//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront (used for payment redirects)
//! - `FIREBASE_PROJECT_ID` - Firebase project hosting the catalog documents
//! - `FIREBASE_API_KEY` - Firebase Web API key (Firestore REST + Identity Toolkit)
//! - `STRIPE_SECRET_KEY` - Stripe secret API key (server-side only)
//! - `CLOUDINARY_CLOUD_NAME` - Cloudinary cloud name for image uploads
//! - `CLOUDINARY_UPLOAD_PRESET` - Unsigned upload preset
//!
//! ## Optional
//! - `STOREFRONT_DATABASE_URL` - `SQLite` session store (default: sqlite://shesha-sessions.db?mode=rwc)
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_LOG_FORMAT` - `text` or `json` (default: text)
//! - `STOREFRONT_ADMIN_ROLE` - Role claim granting admin access (default: admin)
//! - `STRIPE_PUBLISHABLE_KEY` - Stripe publishable key
//! - `STRIPE_CURRENCY` - Checkout currency (default: usd)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use shesha_core::CurrencyCode;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

const DEFAULT_DATABASE_URL: &str = "sqlite://shesha-sessions.db?mode=rwc";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `SQLite` URL for the session store
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront, without trailing slash
    pub base_url: String,
    /// Log output format
    pub log_format: LogFormat,
    /// Role claim that grants access to `/admin`
    pub admin_role: String,
    /// Firebase (catalog + identity) configuration
    pub firebase: FirebaseConfig,
    /// Stripe checkout configuration
    pub stripe: StripeConfig,
    /// Cloudinary image upload configuration
    pub cloudinary: CloudinaryConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate
    pub sentry_sample_rate: f32,
    /// Sentry transaction sample rate
    pub sentry_traces_sample_rate: f32,
}

/// Firebase project configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct FirebaseConfig {
    /// Firebase project ID
    pub project_id: String,
    /// Web API key
    pub api_key: SecretString,
}

impl std::fmt::Debug for FirebaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseConfig")
            .field("project_id", &self.project_id)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Stripe configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct StripeConfig {
    /// Secret API key (server-side only)
    pub secret_key: SecretString,
    /// Publishable key (safe to expose in browser)
    pub publishable_key: Option<String>,
    /// Currency for checkout sessions
    pub currency: CurrencyCode,
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("secret_key", &"[REDACTED]")
            .field("publishable_key", &self.publishable_key)
            .field("currency", &self.currency)
            .finish()
    }
}

/// Cloudinary configuration.
#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    /// Cloud name (first path segment of upload and delivery URLs)
    pub cloud_name: String,
    /// Unsigned upload preset
    pub upload_preset: String,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url =
            SecretString::from(get_env_or_default("STOREFRONT_DATABASE_URL", DEFAULT_DATABASE_URL));
        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;
        let base_url = parse_base_url(&get_required_env("STOREFRONT_BASE_URL")?)?;
        let log_format = parse_log_format(&get_env_or_default("STOREFRONT_LOG_FORMAT", "text"))?;
        let admin_role = get_env_or_default("STOREFRONT_ADMIN_ROLE", "admin");

        let firebase = FirebaseConfig::from_env()?;
        let stripe = StripeConfig::from_env()?;
        let cloudinary = CloudinaryConfig::from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            log_format,
            admin_role,
            firebase,
            stripe,
            cloudinary,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: get_rate("SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: get_rate("SENTRY_TRACES_SAMPLE_RATE", 0.0)?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the storefront is served over HTTPS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    /// Absolute URL for a path on this storefront.
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl FirebaseConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            project_id: get_required_env("FIREBASE_PROJECT_ID")?,
            api_key: get_required_secret("FIREBASE_API_KEY")?,
        })
    }
}

impl StripeConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let currency = get_env_or_default("STRIPE_CURRENCY", "usd")
            .parse::<CurrencyCode>()
            .map_err(|e| ConfigError::InvalidEnvVar("STRIPE_CURRENCY".to_string(), e.to_string()))?;

        Ok(Self {
            secret_key: get_validated_secret("STRIPE_SECRET_KEY")?,
            publishable_key: get_optional_env("STRIPE_PUBLISHABLE_KEY"),
            currency,
        })
    }
}

impl CloudinaryConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            cloud_name: get_required_env("CLOUDINARY_CLOUD_NAME")?,
            upload_preset: get_required_env("CLOUDINARY_UPLOAD_PRESET")?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get a sample rate in `[0, 1]`.
fn get_rate(key: &str, default: f32) -> Result<f32, ConfigError> {
    let Some(raw) = get_optional_env(key) else {
        return Ok(default);
    };
    let rate = raw
        .parse::<f32>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !(0.0..=1.0).contains(&rate) {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("must be between 0 and 1 (got {rate})"),
        ));
    }
    Ok(rate)
}

/// Validate the public base URL and strip any trailing slash.
fn parse_base_url(raw: &str) -> Result<String, ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidEnvVar("STOREFRONT_BASE_URL".to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ConfigError::InvalidEnvVar(
            "STOREFRONT_BASE_URL".to_string(),
            "must be an absolute http(s) URL".to_string(),
        ));
    }
    Ok(raw.trim_end_matches('/').to_string())
}

fn parse_log_format(raw: &str) -> Result<LogFormat, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "text" | "pretty" => Ok(LogFormat::Text),
        "json" => Ok(LogFormat::Json),
        other => Err(ConfigError::InvalidEnvVar(
            "STOREFRONT_LOG_FORMAT".to_string(),
            format!("expected 'text' or 'json', got '{other}'"),
        )),
    }
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Check entropy (real secrets like API keys have high entropy)
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the key issued by the provider."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_config() -> StorefrontConfig {
        StorefrontConfig {
            database_url: SecretString::from("sqlite::memory:"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            log_format: LogFormat::Text,
            admin_role: "admin".to_string(),
            firebase: FirebaseConfig {
                project_id: "shop-shesha".to_string(),
                api_key: SecretString::from("super_secret_firebase_key"),
            },
            stripe: StripeConfig {
                secret_key: SecretString::from("super_secret_stripe_key"),
                publishable_key: Some("pk_test_visible".to_string()),
                currency: CurrencyCode::USD,
            },
            cloudinary: CloudinaryConfig {
                cloud_name: "optimage".to_string(),
                upload_preset: "portfolio-images".to_string(),
            },
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        // All same character = 0 entropy
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        // "ab" has entropy of 1 bit per char (50% a, 50% b)
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("sk_test_your-key-here", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("sk_test_51Hx9QmK2nL5pQ7rT0uW4zC6aB3", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_parse_base_url() {
        assert_eq!(
            parse_base_url("https://shop.example.org/").unwrap(),
            "https://shop.example.org"
        );
        assert!(parse_base_url("shop.example.org").is_err());
        assert!(parse_base_url("ftp://shop.example.org").is_err());
    }

    #[test]
    fn test_parse_log_format() {
        assert_eq!(parse_log_format("JSON").unwrap(), LogFormat::Json);
        assert_eq!(parse_log_format("text").unwrap(), LogFormat::Text);
        assert!(parse_log_format("yaml").is_err());
    }

    #[test]
    fn test_socket_addr_and_urls() {
        let config = test_config();

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
        assert!(!config.is_secure());
        assert_eq!(config.url_for("/cart"), "http://localhost:3000/cart");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let debug_output = format!("{:?}", test_config());

        assert!(debug_output.contains("shop-shesha"));
        assert!(debug_output.contains("pk_test_visible"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_firebase_key"));
        assert!(!debug_output.contains("super_secret_stripe_key"));
    }
}
