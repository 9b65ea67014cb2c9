//! Data-key decryption through a remote key-management service.
//!
//! [`KeyDecryptor`] validates the request, hands the ciphertext and encryption
//! context to a [`RemoteDecrypt`] backend, and drains the returned plaintext
//! stream into a [`PlaintextKey`]. [`aws::KmsRemoteDecrypt`] is the AWS KMS
//! backend.
//!
//! # Security invariants
//!
//! - Plaintext key material is **never** logged, cached, or written to disk.
//! - [`PlaintextKey`] zeroes its buffer on drop and redacts itself in `Debug`.

pub mod aws;
pub mod decryptor;
pub mod plaintext;
pub mod remote;

pub use common::{DecryptError, EncryptionContext};
pub use decryptor::{DecryptKeyFluentBuilder, KeyDecryptor};
pub use plaintext::PlaintextKey;
pub use remote::{PlaintextStream, RemoteDecrypt};
pub use tokio_util::sync::CancellationToken;
