//! The remote decryption capability the core delegates to.
//!
//! Anything that can turn a ciphertext blob plus an encryption context into a
//! plaintext byte stream implements [`RemoteDecrypt`]: the AWS KMS backend in
//! [`crate::aws`], test doubles, or an alternate key-management service.

use std::fmt;
use std::io::Cursor;
use std::pin::Pin;

use async_trait::async_trait;
use common::{DecryptError, EncryptionContext};
use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;
use zeroize::Zeroizing;

#[cfg(test)]
use mockall::automock;

/// A remote key-management backend able to unwrap a data key.
///
/// Implementations must be safe to share between concurrent decrypt calls.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RemoteDecrypt: Send + Sync {
    /// Decrypt `ciphertext_blob` under `encryption_context`.
    ///
    /// `cancel` is the caller's cancellation signal; implementations should
    /// abandon in-flight work and return [`DecryptError::Cancelled`] once it
    /// fires.
    ///
    /// # Errors
    ///
    /// Provider failures (access denied, invalid ciphertext, context mismatch)
    /// are reported as [`DecryptError::RemoteService`].
    async fn remote_decrypt(
        &self,
        ciphertext_blob: Vec<u8>,
        encryption_context: EncryptionContext,
        cancel: &CancellationToken,
    ) -> Result<PlaintextStream, DecryptError>;
}

/// Plaintext returned by a [`RemoteDecrypt`] backend: a byte stream whose
/// total length is known up front.
pub struct PlaintextStream {
    len: usize,
    reader: Pin<Box<dyn AsyncRead + Send>>,
}

impl PlaintextStream {
    /// Wrap `reader`, which is expected to yield exactly `len` bytes.
    pub fn new<R>(len: usize, reader: R) -> Self
    where
        R: AsyncRead + Send + 'static,
    {
        Self {
            len,
            reader: Box::pin(reader),
        }
    }

    /// Stream over an in-memory buffer; the reported length is `bytes.len()`.
    ///
    /// The buffer is zeroed once the stream is dropped.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self::new(bytes.len(), Cursor::new(SecretBytes(Zeroizing::new(bytes))))
    }

    /// Plaintext length reported by the backend.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn into_parts(self) -> (usize, Pin<Box<dyn AsyncRead + Send>>) {
        (self.len, self.reader)
    }
}

/// Plaintext held in memory until it has been copied out; zeroed on drop.
struct SecretBytes(Zeroizing<Vec<u8>>);

impl AsRef<[u8]> for SecretBytes {
    fn as_ref(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl fmt::Debug for PlaintextStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaintextStream")
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::AsyncReadExt;

    use super::*;

    #[tokio::test]
    async fn from_bytes_reports_length_and_yields_bytes() {
        let stream = PlaintextStream::from_bytes(b"sixteen byte key".to_vec());
        assert_eq!(stream.len(), 16);
        let (_, mut reader) = stream.into_parts();
        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"sixteen byte key");
    }

    #[test]
    fn secret_bytes_zeroize_on_demand() {
        use zeroize::Zeroize;
        let mut secret = SecretBytes(Zeroizing::new(vec![0x42; 8]));
        assert_eq!(secret.as_ref(), [0x42u8; 8]);
        secret.0.zeroize();
        assert!(secret.as_ref().is_empty());
    }

    #[test]
    fn debug_omits_contents() {
        let stream = PlaintextStream::from_bytes(vec![0xAB; 4]);
        let dbg = format!("{stream:?}");
        assert!(dbg.contains("len: 4"));
        assert!(!dbg.contains("171"));
    }
}
