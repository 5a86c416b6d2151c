//! Translate OS signals into [`Signal`]s
//!
//! - `SIGHUP` reloads the configuration
//! - `SIGTERM` and Ctrl+C start the final shutdown

use beacon_common::{Signal, lifecycle};
use tokio::{
    signal::unix::{SignalKind, signal},
    sync::broadcast,
};

///
/// Forward OS signals to `sender` until a shutdown has been sent
///
/// # Errors
/// If the signal handlers cannot be installed
///
pub async fn forward(sender: broadcast::Sender<Signal>) -> anyhow::Result<()> {
    let mut hangup = signal(SignalKind::hangup())?;
    let mut terminate = signal(SignalKind::terminate())?;

    loop {
        let received = tokio::select! {
            _ = hangup.recv() => Signal::Reload,
            _ = terminate.recv() => Signal::Shutdown,
            r = tokio::signal::ctrl_c() => {
                r?;
                lifecycle!(level = INFO, "CTRL+C entered -- Enter it again to force shutdown");
                Signal::Shutdown
            }
        };

        lifecycle!(level = INFO, "Received {:?}", received);

        if sender.send(received).is_err() || received == Signal::Shutdown {
            return Ok(());
        }
    }
}
