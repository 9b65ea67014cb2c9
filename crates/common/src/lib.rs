//! Common types, output definitions, and errors shared across `kms-unwrap` crates.

pub mod error;
pub mod protocol;

pub use error::DecryptError;
pub use protocol::EncryptionContext;
