//! [`KmsRemoteDecrypt`]: the `Decrypt` API of AWS KMS behind the
//! [`RemoteDecrypt`] capability.

use async_trait::async_trait;
use aws_sdk_kms::error::DisplayErrorContext;
use aws_sdk_kms::primitives::Blob;
use common::{DecryptError, EncryptionContext};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::remote::{PlaintextStream, RemoteDecrypt};

/// A failed KMS call.
///
/// The message is the SDK's full error chain, so dispatch, timeout and
/// credential failures keep their cause rather than reading "unhandled error".
#[derive(Debug, Error)]
#[error("{detail}")]
pub struct KmsError {
    detail: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync + 'static>,
}

impl KmsError {
    fn from_sdk<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            detail: DisplayErrorContext(&err).to_string(),
            source: Box::new(err),
        }
    }
}

/// Decrypts data keys with AWS KMS.
///
/// The KMS client is internally reference counted and safe to share, so one
/// instance can serve any number of concurrent decrypts.
#[derive(Debug, Clone)]
pub struct KmsRemoteDecrypt {
    client: aws_sdk_kms::Client,
    key_id: Option<String>,
}

impl KmsRemoteDecrypt {
    pub fn new(client: aws_sdk_kms::Client) -> Self {
        Self {
            client,
            key_id: None,
        }
    }

    /// Only accept ciphertext wrapped under `key_id` (key ID, key ARN, alias
    /// name, or alias ARN). Without it KMS picks the key from the ciphertext
    /// metadata.
    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }

    pub fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }
}

#[async_trait]
impl RemoteDecrypt for KmsRemoteDecrypt {
    async fn remote_decrypt(
        &self,
        ciphertext_blob: Vec<u8>,
        encryption_context: EncryptionContext,
        cancel: &CancellationToken,
    ) -> Result<PlaintextStream, DecryptError> {
        let request = self
            .client
            .decrypt()
            .ciphertext_blob(Blob::new(ciphertext_blob))
            .set_encryption_context(Some(encryption_context))
            .set_key_id(self.key_id.clone());

        let output = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DecryptError::Cancelled),
            res = request.send() => res.map_err(|e| DecryptError::remote(KmsError::from_sdk(e)))?,
        };

        debug!(
            key_id = output.key_id().unwrap_or_default(),
            "KMS decrypt succeeded"
        );

        // Moved out rather than copied; the stream zeroes it on drop.
        let plaintext = output
            .plaintext
            .map(Blob::into_inner)
            .ok_or_else(|| DecryptError::remote("KMS decrypt response contained no plaintext"))?;
        Ok(PlaintextStream::from_bytes(plaintext))
    }
}
