//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ADMIN_DATABASE_URL` - `PostgreSQL` connection string (session store)
//! - `ADMIN_BASE_URL` - Public URL for the admin panel
//!
//! ## Optional
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3001)
//! - `LOG_FORMAT` - `json` for structured logs, anything else for text
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`
//!
//! ## Record store
//! - `STORE_BACKEND` - `firestore` (default) or `memory`
//! - `FIRESTORE_PROJECT_ID` - required for `firestore`
//! - `FIRESTORE_DATABASE` - database ID (default: `(default)`)
//! - `FIRESTORE_API_KEY` - web API key
//! - `FIRESTORE_BEARER_TOKEN` - OAuth access token
//! - `FIRESTORE_EMULATOR_HOST` - `host:port` of the Firestore emulator
//! - `MEMORY_SEED_FILE` - YAML seed file for `memory`
//!
//! ## Identity
//! - `IDENTITY_BACKEND` - `toolkit` (default) or `local`
//! - `IDENTITY_API_KEY` - required for `toolkit`
//! - `IDENTITY_EMULATOR_HOST` - `host:port` of the Auth emulator
//! - `LOCAL_ADMIN_EMAIL`, `LOCAL_ADMIN_PASSWORD` - required for `local`
//!
//! ## Optional (TLS)
//! - `ADMIN_TLS_CERT` - PEM-encoded certificate chain
//! - `ADMIN_TLS_KEY` - PEM-encoded private key

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;

use saasbay_core::Email;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.0;
const MIN_LOCAL_PASSWORD_LENGTH: usize = 12;
const DEFAULT_FIRESTORE_DATABASE: &str = "(default)";

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

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the admin panel
    pub base_url: String,
    /// Where records live
    pub store: StoreBackend,
    /// Who checks operator credentials
    pub identity: IdentityBackend,
    /// Emit JSON logs instead of text
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
    /// TLS configuration for HTTPS (optional)
    pub tls: Option<TlsConfig>,
}

/// Record store selection.
#[derive(Debug, Clone)]
pub enum StoreBackend {
    /// Cloud Firestore (or its emulator).
    Firestore(FirestoreConfig),
    /// In-process maps, optionally seeded from a YAML file.
    Memory { seed_file: Option<PathBuf> },
}

/// Firestore REST configuration.
///
/// Implements `Debug` manually to redact credentials.
#[derive(Clone)]
pub struct FirestoreConfig {
    pub project_id: String,
    pub database: String,
    /// Web API key, sent as `?key=`
    pub api_key: Option<SecretString>,
    /// OAuth access token, sent as a bearer token
    pub bearer_token: Option<SecretString>,
    /// `host:port` of the emulator; switches to plain HTTP
    pub emulator_host: Option<String>,
}

impl std::fmt::Debug for FirestoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirestoreConfig")
            .field("project_id", &self.project_id)
            .field("database", &self.database)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field(
                "bearer_token",
                &self.bearer_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("emulator_host", &self.emulator_host)
            .finish()
    }
}

/// Identity service selection.
#[derive(Debug, Clone)]
pub enum IdentityBackend {
    /// Identity Toolkit REST.
    Toolkit(ToolkitConfig),
    /// One operator account held in configuration.
    Local(LocalAdminConfig),
}

/// Identity Toolkit configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct ToolkitConfig {
    pub api_key: SecretString,
    /// `host:port` of the Auth emulator
    pub emulator_host: Option<String>,
}

impl std::fmt::Debug for ToolkitConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolkitConfig")
            .field("api_key", &"[REDACTED]")
            .field("emulator_host", &self.emulator_host)
            .finish()
    }
}

/// Local operator account.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct LocalAdminConfig {
    pub email: Email,
    pub password: SecretString,
}

impl std::fmt::Debug for LocalAdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalAdminConfig")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// TLS configuration for HTTPS.
#[derive(Clone)]
pub struct TlsConfig {
    /// PEM-encoded certificate chain
    pub cert_pem: String,
    /// PEM-encoded private key
    pub key_pem: SecretString,
}

impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("cert_pem", &"[CERTIFICATE]")
            .field("key_pem", &"[REDACTED]")
            .finish()
    }
}

impl TlsConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let cert_pem = get_optional_env("ADMIN_TLS_CERT");
        let key_pem = get_optional_env("ADMIN_TLS_KEY");

        match (cert_pem, key_pem) {
            (Some(cert), Some(key)) => Ok(Some(Self {
                cert_pem: cert,
                key_pem: SecretString::from(key),
            })),
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "ADMIN_TLS_*".to_string(),
                "Both ADMIN_TLS_CERT and ADMIN_TLS_KEY must be set together".to_string(),
            )),
        }
    }
}

impl AdminConfig {
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

        let database_url = get_database_url("ADMIN_DATABASE_URL")?;
        let host = get_env_or_default("ADMIN_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("ADMIN_PORT", "3001")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_PORT".to_string(), e.to_string()))?;
        let base_url = get_required_env("ADMIN_BASE_URL")?;

        let store = StoreBackend::from_env()?;
        let identity = IdentityBackend::from_env()?;
        let log_json = get_optional_env("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json"));
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.1);
        let tls = TlsConfig::from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            store,
            identity,
            log_json,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
            tls,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl StoreBackend {
    /// Load the record store selection.
    ///
    /// Public so the CLI can reach the same store without the rest of the
    /// admin configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for an unknown backend or a missing project ID.
    pub fn from_env() -> Result<Self, ConfigError> {
        match get_env_or_default("STORE_BACKEND", "firestore")
            .to_ascii_lowercase()
            .as_str()
        {
            "firestore" => Ok(Self::Firestore(FirestoreConfig::from_env()?)),
            "memory" => Ok(Self::Memory {
                seed_file: get_optional_env("MEMORY_SEED_FILE").map(PathBuf::from),
            }),
            other => Err(ConfigError::InvalidEnvVar(
                "STORE_BACKEND".to_string(),
                format!("unknown backend '{other}' (expected firestore or memory)"),
            )),
        }
    }
}

impl FirestoreConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            project_id: get_required_env("FIRESTORE_PROJECT_ID")?,
            database: get_env_or_default("FIRESTORE_DATABASE", DEFAULT_FIRESTORE_DATABASE),
            api_key: get_optional_env("FIRESTORE_API_KEY").map(SecretString::from),
            bearer_token: get_optional_env("FIRESTORE_BEARER_TOKEN").map(SecretString::from),
            emulator_host: get_optional_env("FIRESTORE_EMULATOR_HOST"),
        })
    }
}

impl IdentityBackend {
    fn from_env() -> Result<Self, ConfigError> {
        match get_env_or_default("IDENTITY_BACKEND", "toolkit")
            .to_ascii_lowercase()
            .as_str()
        {
            "toolkit" => Ok(Self::Toolkit(ToolkitConfig {
                api_key: get_required_secret("IDENTITY_API_KEY")?,
                emulator_host: get_optional_env("IDENTITY_EMULATOR_HOST"),
            })),
            "local" => Ok(Self::Local(LocalAdminConfig::from_env()?)),
            other => Err(ConfigError::InvalidEnvVar(
                "IDENTITY_BACKEND".to_string(),
                format!("unknown backend '{other}' (expected toolkit or local)"),
            )),
        }
    }
}

impl LocalAdminConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let email = Email::parse(&get_required_env("LOCAL_ADMIN_EMAIL")?).map_err(|e| {
            ConfigError::InvalidEnvVar("LOCAL_ADMIN_EMAIL".to_string(), e.to_string())
        })?;
        let password = get_validated_secret("LOCAL_ADMIN_PASSWORD")?;
        validate_password_length(&password, "LOCAL_ADMIN_PASSWORD")?;
        Ok(Self { email, password })
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

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` if neither variable is set.
pub fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

fn validate_password_length(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    use secrecy::ExposeSecret;

    let len = secret.expose_secret().chars().count();
    if len < MIN_LOCAL_PASSWORD_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("must be at least {MIN_LOCAL_PASSWORD_LENGTH} characters (got {len})"),
        ));
    }
    Ok(())
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
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
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
