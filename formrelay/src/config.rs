//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `FORMRELAY_CONFIG`
//! environment variable. The file is optional: a deployment can be configured from the
//! environment alone.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `FORMRELAY_` override YAML values
//! 3. **Legacy variables** - `SENDER_EMAIL`, `RECIPIENT_EMAIL`, `MAILJET_WORKER_URL`,
//!    `WORKER_TOKEN`, `MAILJET_API_KEY` and `MAILJET_API_SECRET`, as used by older deployments
//!    of the site
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `FORMRELAY_MAIL__TYPE=worker` selects the worker transport.
//!
//! ## Transport credentials
//!
//! Missing credentials are not a startup error. The relay starts, answers every submission with
//! a generic "not configured" failure and logs which keys are absent (never their values). Run
//! with `--validate` to have the same check fail the process instead.
//!
//! ## Environment Variable Examples
//!
//! ```bash
//! # Relay through the Mailjet API
//! FORMRELAY_MAIL__TYPE=mailjet
//! FORMRELAY_MAIL__API_KEY=...
//! FORMRELAY_MAIL__API_SECRET=...
//! FORMRELAY_MAIL__RECIPIENT_EMAIL=office@example.com
//!
//! # Tighten attachment limits
//! FORMRELAY_ATTACHMENTS__MAX_FILE_SIZE=5242880
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Yaml},
    value::{Uncased, UncasedStr},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::errors::Error;

/// Slack on top of the attachment ceiling for the text fields and multipart framing.
const FORM_FIELDS_ALLOWANCE: u64 = 1024 * 1024;

/// Environment variable names understood for compatibility with older deployments.
const LEGACY_ENV_KEYS: &[(&str, &str)] = &[
    ("SENDER_EMAIL", "mail.from_email"),
    ("RECIPIENT_EMAIL", "mail.recipient_email"),
    ("MAILJET_WORKER_URL", "mail.url"),
    ("WORKER_TOKEN", "mail.token"),
    ("MAILJET_API_KEY", "mail.api_key"),
    ("MAILJET_API_SECRET", "mail.api_secret"),
];

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "FORMRELAY_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration (including transport credentials) and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// Loaded once at startup and shared read-only with every request handler.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Path the contact form posts to
    pub contact_path: String,
    /// Cross-origin settings for sites hosted on another origin than the relay
    pub cors: CorsConfig,
    /// Outbound mail settings
    pub mail: MailConfig,
    /// Upload ceilings for attached files
    pub attachments: AttachmentLimits,
    /// Enable Prometheus metrics endpoint at `/internal/metrics`
    pub enable_metrics: bool,
    /// Enable OpenTelemetry OTLP export for distributed tracing
    pub enable_otel_export: bool,
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Origins allowed to post the form (`*` or full origin URLs)
    pub allowed_origins: Vec<CorsOrigin>,
    /// Cache preflight requests for this many seconds
    pub max_age: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum CorsOrigin {
    /// Allow all origins (`*`)
    #[serde(deserialize_with = "parse_wildcard")]
    Wildcard,
    /// Specific origin URL (e.g., `https://www.example.com`)
    #[serde(deserialize_with = "parse_url")]
    Url(Url),
}

fn parse_wildcard<'de, D>(deserializer: D) -> Result<(), D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    if s == "*" {
        Ok(())
    } else {
        Err(serde::de::Error::custom("Expected '*'"))
    }
}

fn parse_url<'de, D>(deserializer: D) -> Result<Url, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    Url::parse(&s).map_err(serde::de::Error::custom)
}

/// Outbound mail configuration: sender, recipient and the transport used to reach them.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
// Note: Cannot use deny_unknown_fields here due to #[serde(flatten)] on transport
pub struct MailConfig {
    /// Transport used to dispatch every submission
    #[serde(flatten)]
    pub transport: TransportConfig,
    /// Sender email address
    pub from_email: String,
    /// Sender display name
    pub from_name: String,
    /// Address that receives the submissions
    pub recipient_email: Option<String>,
    /// Display name of the recipient
    pub recipient_name: String,
    /// Upper bound for a single transport call
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

/// Mail transport configuration, selected with the `type` key.
///
/// Credentials are optional at the type level so that an incomplete deployment still starts and
/// reports the missing keys instead of failing to deserialize. `Debug` output redacts them.
#[derive(Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportConfig {
    /// Send directly over an SMTP session
    Smtp {
        /// SMTP server hostname
        host: Option<String>,
        /// SMTP server port
        #[serde(default = "TransportConfig::default_smtp_port")]
        port: u16,
        /// SMTP authentication username (omit for unauthenticated relays)
        username: Option<String>,
        /// SMTP authentication password
        password: Option<String>,
        /// Connection security
        #[serde(default)]
        encryption: SmtpEncryption,
    },
    /// Call the Mailjet send API (v3.1) directly
    Mailjet {
        /// Mailjet public API key
        api_key: Option<String>,
        /// Mailjet private API key
        api_secret: Option<String>,
        /// API base URL
        #[serde(default = "TransportConfig::default_mailjet_base_url")]
        base_url: Url,
    },
    /// Forward the Mailjet payload to an intermediary worker that holds the provider credentials
    Worker {
        /// Worker endpoint
        url: Option<Url>,
        /// Shared token presented to the worker
        token: Option<String>,
        /// Header carrying the token
        #[serde(default = "TransportConfig::default_token_header")]
        token_header: String,
    },
    /// Write emails to files (for development/testing)
    File {
        /// Directory path where email files will be written
        path: String,
    },
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SmtpEncryption {
    /// Plain connection upgraded with STARTTLS (usually port 587)
    #[default]
    Starttls,
    /// Implicit TLS (usually port 465)
    Tls,
    /// No encryption at all
    None,
}

/// Attachment ceilings. A request breaking any of them is rejected as a whole.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AttachmentLimits {
    /// Maximum size of a single file in bytes (default: 10 MiB)
    pub max_file_size: u64,
    /// Maximum combined size of all files in bytes (default: 20 MiB)
    pub max_total_size: u64,
    /// Maximum number of files per submission (default: 10)
    pub max_files: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            contact_path: "/contact".to_string(),
            cors: CorsConfig::default(),
            mail: MailConfig::default(),
            attachments: AttachmentLimits::default(),
            enable_metrics: false,
            enable_otel_export: false,
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![CorsOrigin::Wildcard],
            max_age: Some(3600), // Cache preflight for 1 hour
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            transport: TransportConfig::default(),
            from_email: "no-reply@example.com".to_string(),
            from_name: "Kontaktformular".to_string(),
            recipient_email: None,
            recipient_name: "Empfänger".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::File {
            path: "./emails".to_string(),
        }
    }
}

impl Default for AttachmentLimits {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024,
            max_total_size: 20 * 1024 * 1024,
            max_files: 10,
        }
    }
}

const REDACTED: &str = "<redacted>";

fn redact(value: &Option<String>) -> Option<&'static str> {
    value.as_ref().map(|_| REDACTED)
}

impl std::fmt::Debug for TransportConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportConfig::Smtp {
                host,
                port,
                username,
                password,
                encryption,
            } => f
                .debug_struct("Smtp")
                .field("host", host)
                .field("port", port)
                .field("username", username)
                .field("password", &redact(password))
                .field("encryption", encryption)
                .finish(),
            TransportConfig::Mailjet {
                api_key,
                api_secret,
                base_url,
            } => f
                .debug_struct("Mailjet")
                .field("api_key", &redact(api_key))
                .field("api_secret", &redact(api_secret))
                .field("base_url", &base_url.as_str())
                .finish(),
            TransportConfig::Worker { url, token, token_header } => f
                .debug_struct("Worker")
                .field("url", &url.as_ref().map(Url::as_str))
                .field("token", &redact(token))
                .field("token_header", token_header)
                .finish(),
            TransportConfig::File { path } => f.debug_struct("File").field("path", path).finish(),
        }
    }
}

impl TransportConfig {
    fn default_smtp_port() -> u16 {
        587
    }

    fn default_mailjet_base_url() -> Url {
        Url::parse("https://api.mailjet.com").expect("static URL is valid")
    }

    fn default_token_header() -> String {
        "x-worker-token".to_string()
    }

    /// Short transport name used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            TransportConfig::Smtp { .. } => "smtp",
            TransportConfig::Mailjet { .. } => "mailjet",
            TransportConfig::Worker { .. } => "worker",
            TransportConfig::File { .. } => "file",
        }
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|v| v.trim().is_empty())
}

impl MailConfig {
    /// Names of the configuration keys a working transport still needs.
    ///
    /// Only key names are reported, never values.
    pub fn missing_keys(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();

        if is_blank(&self.recipient_email) {
            missing.push("mail.recipient_email");
        }

        match &self.transport {
            TransportConfig::Smtp {
                host, username, password, ..
            } => {
                if is_blank(host) {
                    missing.push("mail.host");
                }
                if !is_blank(username) && is_blank(password) {
                    missing.push("mail.password");
                }
            }
            TransportConfig::Mailjet { api_key, api_secret, .. } => {
                if is_blank(api_key) {
                    missing.push("mail.api_key");
                }
                if is_blank(api_secret) {
                    missing.push("mail.api_secret");
                }
            }
            TransportConfig::Worker { url, token, .. } => {
                if url.is_none() {
                    missing.push("mail.url");
                }
                if is_blank(token) {
                    missing.push("mail.token");
                }
            }
            TransportConfig::File { .. } => {}
        }

        missing
    }
}

impl AttachmentLimits {
    /// Largest request body accepted on the contact route.
    pub fn request_body_limit(&self) -> usize {
        usize::try_from(self.max_total_size.saturating_add(FORM_FIELDS_ALLOWANCE)).unwrap_or(usize::MAX)
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency.
    ///
    /// Missing transport credentials are reported by [`MailConfig::missing_keys`] instead.
    pub fn validate(&self) -> Result<(), Error> {
        if !self.contact_path.starts_with('/') {
            return Err(Error::Internal {
                operation: format!("Config validation: contact_path must start with '/' (got '{}')", self.contact_path),
            });
        }

        if !is_plain_address(&self.mail.from_email) {
            return Err(Error::Internal {
                operation: format!("Config validation: mail.from_email '{}' is not a valid address", self.mail.from_email),
            });
        }

        if let Some(recipient) = self.mail.recipient_email.as_deref().filter(|r| !r.trim().is_empty())
            && !is_plain_address(recipient.trim())
        {
            return Err(Error::Internal {
                operation: "Config validation: mail.recipient_email is not a valid address".to_string(),
            });
        }

        if self.mail.timeout.is_zero() {
            return Err(Error::Internal {
                operation: "Config validation: mail.timeout must be greater than zero".to_string(),
            });
        }

        if self.mail.timeout > Duration::from_secs(300) {
            return Err(Error::Internal {
                operation: "Config validation: mail.timeout is too long (maximum 5 minutes)".to_string(),
            });
        }

        let limits = &self.attachments;
        if limits.max_file_size == 0 || limits.max_total_size == 0 {
            return Err(Error::Internal {
                operation: "Config validation: attachment size limits must be greater than zero".to_string(),
            });
        }

        if limits.max_files == 0 {
            return Err(Error::Internal {
                operation: "Config validation: attachments.max_files must be greater than zero".to_string(),
            });
        }

        if limits.max_file_size > limits.max_total_size {
            return Err(Error::Internal {
                operation: format!(
                    "Config validation: attachments.max_file_size ({}) cannot be greater than attachments.max_total_size ({})",
                    limits.max_file_size, limits.max_total_size
                ),
            });
        }

        if self.cors.allowed_origins.is_empty() {
            return Err(Error::Internal {
                operation: "Config validation: CORS allowed_origins cannot be empty. Add at least one allowed origin.".to_string(),
            });
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        let legacy_names: Vec<&str> = LEGACY_ENV_KEYS.iter().map(|(name, _)| *name).collect();

        let figment = Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables can still override specific values
            .merge(Env::prefixed("FORMRELAY_").split("__"))
            // Variable names used by earlier deployments of the site
            .merge(Env::raw().only(&legacy_names).map(legacy_env_key));

        // Older deployments never name a transport; their credentials imply it
        match inferred_transport_type(&figment) {
            Some(kind) => figment.join(Serialized::default("mail.type", kind)),
            None => figment,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn inferred_transport_type(figment: &Figment) -> Option<&'static str> {
    let has = |key: &str| figment.find_value(key).is_ok();

    if has("mail.type") {
        None
    } else if has("mail.url") {
        Some("worker")
    } else if has("mail.api_key") || has("mail.api_secret") {
        Some("mailjet")
    } else {
        None
    }
}

/// A bare `local@domain` address, as lettre and the Mailjet API expect it.
fn is_plain_address(value: &str) -> bool {
    value.parse::<lettre::Address>().is_ok() && email_address::EmailAddress::is_valid(value)
}

fn legacy_env_key(key: &UncasedStr) -> Uncased<'_> {
    LEGACY_ENV_KEYS
        .iter()
        .find(|(name, _)| key.as_str().eq_ignore_ascii_case(name))
        .map(|(_, path)| Uncased::from(*path))
        .unwrap_or_else(|| Uncased::from(key.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn args(path: &str) -> Args {
        Args {
            config: path.to_string(),
            validate: false,
        }
    }

    #[test]
    fn test_defaults_without_config_file() {
        Jail::expect_with(|_jail| {
            let config = Config::load(&args("missing.yaml"))?;

            assert_eq!(config.port, 3000);
            assert_eq!(config.contact_path, "/contact");
            assert_eq!(config.mail.timeout, Duration::from_secs(30));
            assert_eq!(config.attachments.max_file_size, 10 * 1024 * 1024);
            assert!(matches!(config.mail.transport, TransportConfig::File { .. }));
            assert_eq!(config.mail.missing_keys(), vec!["mail.recipient_email"]);

            Ok(())
        });
    }

    #[test]
    fn test_worker_transport_from_yaml() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
mail:
  type: worker
  url: https://relay.example.workers.dev/send
  token: secret-token
  recipient_email: office@example.com
  timeout: 10s
"#,
            )?;

            let config = Config::load(&args("test.yaml"))?;

            match &config.mail.transport {
                TransportConfig::Worker { url, token, token_header } => {
                    assert_eq!(url.as_ref().map(Url::as_str), Some("https://relay.example.workers.dev/send"));
                    assert_eq!(token.as_deref(), Some("secret-token"));
                    assert_eq!(token_header, "x-worker-token");
                }
                other => panic!("expected worker transport, got {other:?}"),
            }
            assert_eq!(config.mail.timeout, Duration::from_secs(10));
            assert!(config.mail.missing_keys().is_empty());

            Ok(())
        });
    }

    #[test]
    fn test_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
port: 8080
mail:
  type: smtp
  host: smtp.example.com
"#,
            )?;

            jail.set_env("FORMRELAY_HOST", "127.0.0.1");
            jail.set_env("FORMRELAY_MAIL__PORT", "465");
            jail.set_env("FORMRELAY_MAIL__ENCRYPTION", "tls");
            jail.set_env("FORMRELAY_ATTACHMENTS__MAX_FILES", "3");

            let config = Config::load(&args("test.yaml"))?;

            assert_eq!(config.host, "127.0.0.1");
            assert_eq!(config.port, 8080);
            assert_eq!(config.attachments.max_files, 3);
            match &config.mail.transport {
                TransportConfig::Smtp {
                    host, port, encryption, ..
                } => {
                    assert_eq!(host.as_deref(), Some("smtp.example.com"));
                    assert_eq!(*port, 465);
                    assert_eq!(*encryption, SmtpEncryption::Tls);
                }
                other => panic!("expected smtp transport, got {other:?}"),
            }

            Ok(())
        });
    }

    #[test]
    fn test_legacy_env_names() {
        Jail::expect_with(|jail| {
            jail.set_env("FORMRELAY_MAIL__TYPE", "worker");
            jail.set_env("MAILJET_WORKER_URL", "https://worker.example.com/");
            jail.set_env("WORKER_TOKEN", "tok");
            jail.set_env("RECIPIENT_EMAIL", "inbox@example.com");
            jail.set_env("SENDER_EMAIL", "website@example.com");

            let config = Config::load(&args("missing.yaml"))?;

            assert_eq!(config.mail.recipient_email.as_deref(), Some("inbox@example.com"));
            assert_eq!(config.mail.from_email, "website@example.com");
            assert!(config.mail.missing_keys().is_empty());

            Ok(())
        });
    }

    #[test]
    fn test_legacy_worker_env_without_transport_type() {
        Jail::expect_with(|jail| {
            jail.set_env("MAILJET_WORKER_URL", "https://relay.example.workers.dev/send");
            jail.set_env("WORKER_TOKEN", "tok");
            jail.set_env("RECIPIENT_EMAIL", "inbox@example.com");

            let config = Config::load(&args("missing.yaml"))?;

            match &config.mail.transport {
                TransportConfig::Worker { url, token, .. } => {
                    assert_eq!(url.as_ref().map(Url::as_str), Some("https://relay.example.workers.dev/send"));
                    assert_eq!(token.as_deref(), Some("tok"));
                }
                other => panic!("expected worker transport, got {other:?}"),
            }
            assert!(config.mail.missing_keys().is_empty());

            Ok(())
        });
    }

    #[test]
    fn test_legacy_mailjet_env_without_transport_type() {
        Jail::expect_with(|jail| {
            jail.set_env("MAILJET_API_KEY", "public");
            jail.set_env("MAILJET_API_SECRET", "private");
            jail.set_env("RECIPIENT_EMAIL", "inbox@example.com");

            let config = Config::load(&args("missing.yaml"))?;

            assert!(matches!(config.mail.transport, TransportConfig::Mailjet { .. }));
            assert!(config.mail.missing_keys().is_empty());

            Ok(())
        });
    }

    #[test]
    fn test_explicit_transport_type_wins_over_legacy_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
mail:
  type: smtp
  host: smtp.example.com
"#,
            )?;
            jail.set_env("MAILJET_WORKER_URL", "https://relay.example.workers.dev/send");

            let config = Config::load(&args("test.yaml"))?;
            assert_eq!(config.mail.transport.kind(), "smtp");

            Ok(())
        });
    }

    #[test]
    fn test_transport_debug_redacts_credentials() {
        let transports = [
            TransportConfig::Smtp {
                host: Some("smtp.example.com".to_string()),
                port: 587,
                username: Some("user".to_string()),
                password: Some("smtp-password".to_string()),
                encryption: SmtpEncryption::Starttls,
            },
            TransportConfig::Mailjet {
                api_key: Some("mailjet-key".to_string()),
                api_secret: Some("mailjet-secret".to_string()),
                base_url: TransportConfig::default_mailjet_base_url(),
            },
            TransportConfig::Worker {
                url: Some(Url::parse("https://relay.example.workers.dev/send").unwrap()),
                token: Some("worker-token".to_string()),
                token_header: TransportConfig::default_token_header(),
            },
        ];

        for transport in transports {
            let mut config = Config::default();
            config.mail.transport = transport;
            let rendered = format!("{config:#?}");

            for secret in ["smtp-password", "mailjet-key", "mailjet-secret", "worker-token"] {
                assert!(!rendered.contains(secret), "{secret} leaked into {rendered}");
            }
            assert!(rendered.contains(REDACTED));
        }
    }

    #[test]
    fn test_missing_mailjet_credentials_reported_by_name() {
        let mut config = Config::default();
        config.mail.recipient_email = Some("office@example.com".to_string());
        config.mail.transport = TransportConfig::Mailjet {
            api_key: Some("key".to_string()),
            api_secret: Some("   ".to_string()),
            base_url: TransportConfig::default_mailjet_base_url(),
        };

        assert_eq!(config.mail.missing_keys(), vec!["mail.api_secret"]);
        // Missing credentials do not fail structural validation
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_smtp_password_required_with_username() {
        let mut config = Config::default();
        config.mail.recipient_email = Some("office@example.com".to_string());
        config.mail.transport = TransportConfig::Smtp {
            host: Some("smtp.example.com".to_string()),
            port: 587,
            username: Some("user".to_string()),
            password: None,
            encryption: SmtpEncryption::Starttls,
        };

        assert_eq!(config.mail.missing_keys(), vec!["mail.password"]);
    }

    #[test]
    fn test_config_validation_file_limit_above_total() {
        let mut config = Config::default();
        config.attachments.max_file_size = 30 * 1024 * 1024;

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("max_file_size"));
    }

    #[test]
    fn test_config_validation_zero_timeout() {
        let mut config = Config::default();
        config.mail.timeout = Duration::ZERO;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_invalid_sender() {
        let mut config = Config::default();
        config.mail.from_email = "not an address".to_string();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_rejects_display_name_addresses() {
        let mut config = Config::default();
        config.mail.from_email = "Kontakt <no-reply@example.com>".to_string();
        assert!(config.validate().unwrap_err().to_string().contains("mail.from_email"));

        let mut config = Config::default();
        config.mail.recipient_email = Some("Büro <office@example.com>".to_string());
        assert!(config.validate().unwrap_err().to_string().contains("mail.recipient_email"));

        let mut config = Config::default();
        config.mail.recipient_email = Some("office@example.com".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_relative_contact_path() {
        let mut config = Config::default();
        config.contact_path = "contact".to_string();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_request_body_limit_includes_field_allowance() {
        let limits = AttachmentLimits::default();
        assert_eq!(limits.request_body_limit(), 21 * 1024 * 1024);
    }

    #[test]
    fn test_cors_origins_from_yaml() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
cors:
  allowed_origins:
    - https://www.example.com
  max_age: 600
"#,
            )?;

            let config = Config::load(&args("test.yaml"))?;
            assert_eq!(
                config.cors.allowed_origins,
                vec![CorsOrigin::Url(Url::parse("https://www.example.com").unwrap())]
            );
            assert_eq!(config.cors.max_age, Some(600));

            Ok(())
        });
    }
}
