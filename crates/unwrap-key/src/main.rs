//! `unwrap-key` — decrypt a KMS-wrapped data key from the command line.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`](config::Config) from environment variables.
//! 2. Initialise structured JSON logging (stderr).
//! 3. Build the KMS client and the [`KeyDecryptor`].
//! 4. Arm the deadline / Ctrl-C cancellation watcher.
//! 5. Decrypt and print the JSON result on stdout.

mod cancel;
mod config;
mod output;
mod telemetry;

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use decryptor::aws::{kms_client, KmsRemoteDecrypt};
use decryptor::{CancellationToken, KeyDecryptor};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = config::Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: unwrap-key configuration invalid: {e:#}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init(&cfg.log_level)?;
    info!(version = env!("CARGO_PKG_VERSION"), "unwrap-key starting");

    // -----------------------------------------------------------------------
    // 3. KMS backend
    // -----------------------------------------------------------------------
    let ciphertext = cfg.ciphertext()?;
    let encryption_context = cfg.encryption_context()?;

    let mut backend = KmsRemoteDecrypt::new(kms_client(cfg.kms_endpoint_url.as_deref()).await);
    if let Some(key_id) = &cfg.kms_key_id {
        backend = backend.with_key_id(key_id);
    }
    let decryptor = KeyDecryptor::new(backend);

    // -----------------------------------------------------------------------
    // 4. Cancellation
    // -----------------------------------------------------------------------
    let cancel = CancellationToken::new();
    let watcher = cancel::cancel_on_deadline_or_interrupt(
        cancel.clone(),
        Duration::from_secs(cfg.decrypt_timeout_secs),
    );

    // -----------------------------------------------------------------------
    // 5. Decrypt
    // -----------------------------------------------------------------------
    let result = decryptor
        .decrypt_key(ciphertext, encryption_context, Some(&cancel))
        .await;
    watcher.abort();

    match &result {
        Ok(key) => info!(plaintext_len = key.len(), "data key decrypted"),
        Err(e) => warn!(code = e.code(), error = %e, "data key decrypt failed"),
    }

    let (line, code) = output::render(&result).context("failed to render decrypt result")?;
    println!("{line}");
    Ok(ExitCode::from(code))
}
