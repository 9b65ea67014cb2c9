//! JSON rendering of the decrypt result for stdout.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use common::protocol::{DecryptOutput, ErrorOutput};
use common::DecryptError;
use decryptor::PlaintextKey;

/// Render `result` as a JSON line and pick the process exit code.
///
/// # Errors
///
/// Returns an error only if JSON serialisation fails.
pub fn render(result: &Result<PlaintextKey, DecryptError>) -> serde_json::Result<(String, u8)> {
    match result {
        Ok(key) => {
            let out = DecryptOutput {
                plaintext: STANDARD.encode(key.as_bytes()),
                length: key.len(),
            };
            Ok((serde_json::to_string(&out)?, 0))
        }
        Err(e) => Ok((serde_json::to_string(&ErrorOutput::from(e))?, e.exit_code())),
    }
}
