//! Encrypt-then-decrypt through an in-memory key service.
//!
//! `FakeKeyService` wraps data keys under a master key with AES-256-GCM-SIV,
//! binding the encryption context as associated data, so a context mismatch
//! fails authentication the way a real key-management service rejects it.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use aes_gcm_siv::{
    aead::{rand_core::RngCore, Aead, KeyInit, OsRng, Payload},
    Aes256GcmSiv, Nonce,
};
use async_trait::async_trait;
use decryptor::{
    CancellationToken, DecryptError, EncryptionContext, KeyDecryptor, PlaintextStream,
    RemoteDecrypt,
};

const NONCE_LEN: usize = 12;

struct FakeKeyService {
    master_key: [u8; 32],
    calls: AtomicUsize,
}

impl FakeKeyService {
    fn new() -> Self {
        let mut master_key = [0u8; 32];
        OsRng.fill_bytes(&mut master_key);
        Self {
            master_key,
            calls: AtomicUsize::new(0),
        }
    }

    fn cipher(&self) -> Aes256GcmSiv {
        Aes256GcmSiv::new_from_slice(&self.master_key).expect("32-byte master key")
    }

    /// Canonical associated data: entries sorted by key.
    fn aad(context: &EncryptionContext) -> Vec<u8> {
        let sorted: BTreeMap<_, _> = context.iter().collect();
        let mut aad = Vec::new();
        for (k, v) in sorted {
            aad.extend_from_slice(k.as_bytes());
            aad.push(0);
            aad.extend_from_slice(v.as_bytes());
            aad.push(0);
        }
        aad
    }

    /// Wrap `data_key` as `nonce || ciphertext+tag`.
    fn encrypt(&self, data_key: &[u8], context: &EncryptionContext) -> Vec<u8> {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);
        let aad = Self::aad(context);
        let sealed = self
            .cipher()
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: data_key,
                    aad: &aad,
                },
            )
            .expect("encrypt");
        [nonce.as_slice(), sealed.as_slice()].concat()
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteDecrypt for FakeKeyService {
    async fn remote_decrypt(
        &self,
        ciphertext_blob: Vec<u8>,
        encryption_context: EncryptionContext,
        _cancel: &CancellationToken,
    ) -> Result<PlaintextStream, DecryptError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if ciphertext_blob.len() < NONCE_LEN {
            return Err(DecryptError::remote("InvalidCiphertextException"));
        }
        let (nonce, sealed) = ciphertext_blob.split_at(NONCE_LEN);
        let aad = Self::aad(&encryption_context);
        let plaintext = self
            .cipher()
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: sealed,
                    aad: &aad,
                },
            )
            .map_err(|_| DecryptError::remote("InvalidCiphertextException"))?;
        Ok(PlaintextStream::from_bytes(plaintext))
    }
}

fn setup() -> (Arc<FakeKeyService>, KeyDecryptor) {
    let service = Arc::new(FakeKeyService::new());
    let decryptor = KeyDecryptor::from_shared(service.clone());
    (service, decryptor)
}

fn context(purpose: &str) -> EncryptionContext {
    EncryptionContext::from([("purpose".to_owned(), purpose.to_owned())])
}

#[tokio::test]
async fn encrypt_then_decrypt_yields_original_key() {
    let (service, decryptor) = setup();
    let mut data_key = [0u8; 32];
    OsRng.fill_bytes(&mut data_key);
    let wrapped = service.encrypt(&data_key, &context("table-encryption"));

    let key = decryptor
        .decrypt_key(wrapped, context("table-encryption"), None)
        .await
        .unwrap();

    assert_eq!(key.len(), data_key.len());
    assert_eq!(key.as_bytes(), data_key);
    assert_eq!(service.calls(), 1);
}

#[tokio::test]
async fn context_order_does_not_matter() {
    let (service, decryptor) = setup();
    let ctx: EncryptionContext = [("purpose", "table-encryption"), ("table", "credential-store")]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect();
    let wrapped = service.encrypt(b"sixteen byte key", &ctx);

    let key = decryptor
        .decrypt()
        .ciphertext_blob(wrapped)
        .encryption_context("table", "credential-store")
        .encryption_context("purpose", "table-encryption")
        .send()
        .await
        .unwrap();
    assert_eq!(key.as_bytes(), b"sixteen byte key");
}

#[tokio::test]
async fn context_mismatch_is_remote_error() {
    let (service, decryptor) = setup();
    let wrapped = service.encrypt(b"sixteen byte key", &context("table-encryption"));

    let err = decryptor
        .decrypt_key(wrapped, context("backup-encryption"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, DecryptError::RemoteService(_)));
    assert_eq!(service.calls(), 1);
}

#[tokio::test]
async fn missing_context_never_reaches_the_service() {
    let (service, decryptor) = setup();
    let wrapped = service.encrypt(b"sixteen byte key", &context("table-encryption"));

    let err = decryptor
        .decrypt()
        .ciphertext_blob(wrapped)
        .send()
        .await
        .unwrap_err();
    assert!(matches!(err, DecryptError::InvalidArgument(_)));
    assert_eq!(service.calls(), 0);
}

#[tokio::test]
async fn cancelled_call_never_reaches_the_service() {
    let (service, decryptor) = setup();
    let wrapped = service.encrypt(b"sixteen byte key", &context("table-encryption"));
    let token = CancellationToken::new();
    token.cancel();

    let err = decryptor
        .decrypt_key(wrapped, context("table-encryption"), Some(&token))
        .await
        .unwrap_err();
    assert!(matches!(err, DecryptError::Cancelled));
    assert_eq!(service.calls(), 0);
}

#[tokio::test]
async fn empty_ciphertext_is_rejected_by_the_service() {
    let (service, decryptor) = setup();
    let err = decryptor
        .decrypt_key(Vec::new(), EncryptionContext::new(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, DecryptError::RemoteService(_)));
    assert_eq!(service.calls(), 1);
}
