//! AWS KMS implementation of the [`RemoteDecrypt`](crate::RemoteDecrypt)
//! capability, plus client construction.
//!
//! Credentials and region come from the standard AWS provider chain. The KMS
//! endpoint can be overridden to reach a VPC endpoint, a forwarding proxy, or a
//! local KMS emulator.

pub mod clients;
pub mod kms;

pub use clients::kms_client;
pub use kms::KmsRemoteDecrypt;
