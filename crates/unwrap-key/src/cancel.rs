//! Deadline and Ctrl-C handling: both fire the decrypt's cancellation token.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Spawn a watcher that cancels `token` once `timeout` elapses or the process
/// receives Ctrl-C, whichever comes first. Exits quietly if the token is
/// cancelled by someone else.
pub fn cancel_on_deadline_or_interrupt(token: CancellationToken, timeout: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {}
            _ = tokio::time::sleep(timeout) => {
                warn!(timeout_secs = timeout.as_secs_f64(), "decrypt deadline exceeded; cancelling");
                token.cancel();
            }
            res = tokio::signal::ctrl_c() => {
                if res.is_ok() {
                    warn!("interrupt received; cancelling decrypt");
                    token.cancel();
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn deadline_cancels_token() {
        let token = CancellationToken::new();
        let watcher = cancel_on_deadline_or_interrupt(token.clone(), Duration::from_millis(10));
        tokio::time::timeout(Duration::from_secs(5), token.cancelled())
            .await
            .expect("token cancelled by deadline");
        watcher.await.unwrap();
    }

    #[tokio::test]
    async fn watcher_exits_when_token_cancelled_elsewhere() {
        let token = CancellationToken::new();
        let watcher = cancel_on_deadline_or_interrupt(token.clone(), Duration::from_secs(3600));
        token.cancel();
        tokio::time::timeout(Duration::from_secs(5), watcher)
            .await
            .expect("watcher exits")
            .unwrap();
    }
}
