//! Configuration loading and validation for the `unwrap-key` CLI.
//!
//! All values are read from environment variables. The process exits with a
//! clear error message if any required variable is missing or invalid.

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use common::{protocol::parse_encryption_context, EncryptionContext};
use serde::Deserialize;

/// Validated CLI configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Standard base64 encoding of the wrapped data key. **Required.**
    pub ciphertext_b64: String,

    /// Encryption context as a JSON object of string values.
    #[serde(default = "default_encryption_context")]
    pub encryption_context: String,

    /// KMS key the ciphertext must have been wrapped under.
    #[serde(default)]
    pub kms_key_id: Option<String>,

    /// KMS endpoint override (VPC endpoint, proxy, local emulator).
    #[serde(default)]
    pub kms_endpoint_url: Option<String>,

    /// Seconds before the decrypt is cancelled.
    #[serde(default = "default_decrypt_timeout")]
    pub decrypt_timeout_secs: u64,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_encryption_context() -> String {
    "{}".into()
}
fn default_decrypt_timeout() -> u64 {
    30
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any required variable is absent or cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build unwrap-key configuration")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise unwrap-key configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Decoded ciphertext blob. May be empty; the key service decides.
    pub fn ciphertext(&self) -> Result<Vec<u8>> {
        STANDARD
            .decode(self.ciphertext_b64.trim())
            .context("CIPHERTEXT_B64 is not valid base64")
    }

    /// Parsed encryption context.
    pub fn encryption_context(&self) -> Result<EncryptionContext> {
        parse_encryption_context(&self.encryption_context)
            .context("ENCRYPTION_CONTEXT must be a JSON object of string values")
    }

    fn validate(&self) -> Result<()> {
        self.ciphertext()?;
        self.encryption_context()?;

        if self.decrypt_timeout_secs == 0 {
            anyhow::bail!("DECRYPT_TIMEOUT_SECS must be > 0");
        }
        ensure_non_blank(self.kms_key_id.as_deref(), "KMS_KEY_ID")?;
        ensure_non_blank(self.kms_endpoint_url.as_deref(), "KMS_ENDPOINT_URL")?;
        Ok(())
    }
}

fn ensure_non_blank(value: Option<&str>, name: &str) -> Result<()> {
    if matches!(value, Some(v) if v.trim().is_empty()) {
        anyhow::bail!("{name} must not be empty when set");
    }
    Ok(())
}
