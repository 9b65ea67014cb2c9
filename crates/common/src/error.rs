//! Common error types shared across crates.

use thiserror::Error;

/// Boxed error reported by a remote decryption backend.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure of a single data-key decrypt operation.
///
/// Variants map to process exit codes returned by the CLI:
/// - [`DecryptError::InvalidArgument`] → 2
/// - [`DecryptError::RemoteService`] → 1
/// - [`DecryptError::Cancelled`] → 130
///
/// No variant ever carries partial plaintext.
#[derive(Debug, Error)]
pub enum DecryptError {
    /// A required input was absent. Detected locally; the remote service is
    /// never contacted.
    #[error("invalid argument: {0} is required")]
    InvalidArgument(&'static str),

    /// The caller cancelled the operation before or during the remote call.
    #[error("decrypt operation cancelled")]
    Cancelled,

    /// The remote decryption service reported a failure (access denied,
    /// malformed ciphertext, context mismatch, unreachable endpoint, ...).
    #[error("remote decryption service error: {0}")]
    RemoteService(#[source] BoxError),
}

impl DecryptError {
    /// Wrap any backend error as [`DecryptError::RemoteService`].
    pub fn remote<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        DecryptError::RemoteService(err.into())
    }

    /// Short machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            DecryptError::InvalidArgument(_) => "invalid_argument",
            DecryptError::Cancelled => "cancelled",
            DecryptError::RemoteService(_) => "remote_service_error",
        }
    }

    /// Returns the process exit code that should be used for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            DecryptError::InvalidArgument(_) => 2,
            DecryptError::Cancelled => 130,
            DecryptError::RemoteService(_) => 1,
        }
    }
}
