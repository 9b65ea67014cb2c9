//! [`PlaintextKey`]: the caller-owned result of a decrypt.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

/// Decrypted data-key bytes.
///
/// The buffer is overwritten with zeroes when dropped, so plaintext does not
/// outlive the value in RAM unless the caller takes it out with
/// [`PlaintextKey::into_vec`]. It is neither `Clone` nor
/// `PartialEq`: compare through [`PlaintextKey::as_bytes`].
///
/// ```compile_fail
/// let key = decryptor::PlaintextKey::from(vec![1u8, 2, 3]);
/// let _copy = key.clone();
/// ```
///
/// ```compile_fail
/// let a = decryptor::PlaintextKey::from(vec![1u8]);
/// let b = decryptor::PlaintextKey::from(vec![1u8]);
/// let _ = a == b;
/// ```
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct PlaintextKey(Vec<u8>);

impl PlaintextKey {
    /// A zero-filled key of exactly `len` bytes, to be filled in place.
    pub(crate) fn zeroed(len: usize) -> Self {
        Self(vec![0u8; len])
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Take ownership of the raw bytes. The returned vector is not zeroed on
    /// drop.
    pub fn into_vec(mut self) -> Vec<u8> {
        std::mem::take(&mut self.0)
    }
}

impl From<Vec<u8>> for PlaintextKey {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for PlaintextKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for PlaintextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print key material — not even in debug builds.
        write!(f, "PlaintextKey([REDACTED; {}])", self.0.len())
    }
}
