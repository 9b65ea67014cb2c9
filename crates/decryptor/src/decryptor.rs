//! [`KeyDecryptor`]: unwrap one data key per call through a [`RemoteDecrypt`]
//! backend.
//!
//! # Operation
//!
//! 1. A cancellation token that has already fired fails the call with
//!    [`DecryptError::Cancelled`] before anything else happens.
//! 2. An absent ciphertext or encryption context fails with
//!    [`DecryptError::InvalidArgument`]. Empty values are passed through; the
//!    remote service decides whether they are valid.
//! 3. The ciphertext and context are handed to the backend verbatim.
//! 4. The returned stream is drained into a buffer of exactly the reported
//!    length, using as many reads as it takes.
//!
//! Steps 3 and 4 are raced against the cancellation token, so a backend that
//! ignores the token is still abandoned.
//!
//! # Invariants
//!
//! - Exactly one remote call per invocation that gets past step 2. No retries.
//! - Plaintext is never logged, cached, or retained after the call returns.
//! - On failure the partially filled buffer is zeroed and the stream dropped.

use std::future::Future;
use std::sync::Arc;

use common::{DecryptError, EncryptionContext};
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::plaintext::PlaintextKey;
use crate::remote::{PlaintextStream, RemoteDecrypt};

/// Decrypts wrapped data keys via a remote key-management backend.
///
/// Holds no state besides the backend handle; clones share the backend and
/// concurrent calls are independent.
#[derive(Clone)]
pub struct KeyDecryptor {
    remote: Arc<dyn RemoteDecrypt>,
}

impl KeyDecryptor {
    /// Create a decryptor backed by `remote`.
    pub fn new<R>(remote: R) -> Self
    where
        R: RemoteDecrypt + 'static,
    {
        Self {
            remote: Arc::new(remote),
        }
    }

    /// Create a decryptor from an already shared backend.
    pub fn from_shared(remote: Arc<dyn RemoteDecrypt>) -> Self {
        Self { remote }
    }

    /// Start building a decrypt call.
    pub fn decrypt(&self) -> DecryptKeyFluentBuilder<'_> {
        DecryptKeyFluentBuilder {
            decryptor: self,
            ciphertext_blob: None,
            encryption_context: None,
            cancellation: None,
        }
    }

    /// Decrypt `ciphertext_blob` under `encryption_context`.
    ///
    /// Shorthand for the [`KeyDecryptor::decrypt`] builder with every field set.
    ///
    /// # Errors
    ///
    /// See [`DecryptKeyFluentBuilder::send`].
    pub async fn decrypt_key(
        &self,
        ciphertext_blob: Vec<u8>,
        encryption_context: EncryptionContext,
        cancel: Option<&CancellationToken>,
    ) -> Result<PlaintextKey, DecryptError> {
        self.decrypt()
            .ciphertext_blob(ciphertext_blob)
            .set_encryption_context(Some(encryption_context))
            .set_cancellation(cancel.cloned())
            .send()
            .await
    }
}

impl std::fmt::Debug for KeyDecryptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyDecryptor").finish_non_exhaustive()
    }
}

/// Builder for a single decrypt call. Unset fields are treated as absent.
#[derive(Debug)]
#[must_use = "a decrypt request does nothing until `send` is awaited"]
pub struct DecryptKeyFluentBuilder<'a> {
    decryptor: &'a KeyDecryptor,
    ciphertext_blob: Option<Vec<u8>>,
    encryption_context: Option<EncryptionContext>,
    cancellation: Option<CancellationToken>,
}

impl DecryptKeyFluentBuilder<'_> {
    /// Wrapped data key to decrypt.
    pub fn ciphertext_blob(mut self, blob: impl Into<Vec<u8>>) -> Self {
        self.ciphertext_blob = Some(blob.into());
        self
    }

    pub fn set_ciphertext_blob(mut self, blob: Option<Vec<u8>>) -> Self {
        self.ciphertext_blob = blob;
        self
    }

    /// Add one key/value pair to the encryption context.
    pub fn encryption_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.encryption_context
            .get_or_insert_with(EncryptionContext::new)
            .insert(key.into(), value.into());
        self
    }

    /// Replace the whole encryption context. `Some(empty map)` is a present,
    /// empty context; `None` is absent.
    pub fn set_encryption_context(mut self, context: Option<EncryptionContext>) -> Self {
        self.encryption_context = context;
        self
    }

    /// Token the caller fires to abandon the call.
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn set_cancellation(mut self, token: Option<CancellationToken>) -> Self {
        self.cancellation = token;
        self
    }

    /// Perform the decrypt.
    ///
    /// # Errors
    ///
    /// - [`DecryptError::Cancelled`] if the token fires before or during the call.
    /// - [`DecryptError::InvalidArgument`] if the ciphertext or context is unset.
    /// - [`DecryptError::RemoteService`] if the backend fails or its plaintext
    ///   stream ends before the reported length.
    pub async fn send(self) -> Result<PlaintextKey, DecryptError> {
        let cancel = self.cancellation.unwrap_or_default();
        if cancel.is_cancelled() {
            return Err(DecryptError::Cancelled);
        }

        let ciphertext_blob = self
            .ciphertext_blob
            .ok_or(DecryptError::InvalidArgument("ciphertext_blob"))?;
        let encryption_context = self
            .encryption_context
            .ok_or(DecryptError::InvalidArgument("encryption_context"))?;

        debug!(
            ciphertext_len = ciphertext_blob.len(),
            context_entries = encryption_context.len(),
            "submitting decrypt request"
        );

        let remote = &self.decryptor.remote;
        let stream = until_cancelled(
            &cancel,
            remote.remote_decrypt(ciphertext_blob, encryption_context, &cancel),
        )
        .await?;

        let key = until_cancelled(&cancel, read_plaintext(stream)).await?;
        debug!(plaintext_len = key.len(), "decrypt request completed");
        Ok(key)
    }
}

/// Drain `stream` into a buffer of exactly its reported length.
async fn read_plaintext(stream: PlaintextStream) -> Result<PlaintextKey, DecryptError> {
    let (len, mut reader) = stream.into_parts();
    let mut key = PlaintextKey::zeroed(len);
    reader
        .read_exact(key.as_mut_slice())
        .await
        .map_err(DecryptError::remote)?;
    Ok(key)
}

/// Run `fut` unless `cancel` fires first. Cancellation wins ties.
async fn until_cancelled<F, T>(cancel: &CancellationToken, fut: F) -> Result<T, DecryptError>
where
    F: Future<Output = Result<T, DecryptError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(DecryptError::Cancelled),
        res = fut => res,
    }
}
