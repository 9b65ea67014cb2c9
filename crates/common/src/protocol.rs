//! Data types exchanged with callers of the decrypt operation.
//!
//! [`DecryptOutput`] and [`ErrorOutput`] are serialised as JSON on the CLI's
//! standard output.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Authenticated, non-secret metadata bound to a ciphertext.
///
/// Must match the context supplied when the data key was encrypted.
pub type EncryptionContext = HashMap<String, String>;

/// Parse an encryption context from a JSON object of string values.
///
/// # Errors
///
/// Returns an error if `json` is not an object or if any value is not a string.
pub fn parse_encryption_context(json: &str) -> Result<EncryptionContext, serde_json::Error> {
    serde_json::from_str(json)
}

// ---------------------------------------------------------------------------
// Decrypt output
// ---------------------------------------------------------------------------

/// Successful decrypt result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecryptOutput {
    /// Standard base64 encoding of the plaintext key.
    pub plaintext: String,
    /// Plaintext length in bytes, as reported by the key service.
    pub length: usize,
}

// ---------------------------------------------------------------------------
// Error output
// ---------------------------------------------------------------------------

/// Error body written on any failed decrypt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorOutput {
    /// Short machine-readable error code (e.g. `"invalid_argument"`).
    pub code: String,
    /// Human-readable description.
    pub message: String,
}

impl ErrorOutput {
    /// Construct an [`ErrorOutput`] from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<&crate::DecryptError> for ErrorOutput {
    fn from(err: &crate::DecryptError) -> Self {
        Self::new(err.code(), err.to_string())
    }
}
