use std::fmt;
use tokio::{
    io,
    signal::unix::{signal, SignalKind},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

/// Process signal that asked the service to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Interrupt,
    Terminate,
    Hangup,
    Quit,
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShutdownSignal::Interrupt => "SIGINT",
            ShutdownSignal::Terminate => "SIGTERM",
            ShutdownSignal::Hangup => "SIGHUP",
            ShutdownSignal::Quit => "SIGQUIT",
        };
        f.write_str(name)
    }
}

// Spawn a task that waits for the first shutdown signal, cancels
// `cancellation_token` and yields the signal it saw.
//
// Handlers are installed before returning so a signal that arrives right
// after this call is not lost.
pub fn trigger_cancellation_on_signal(
    cancellation_token: CancellationToken,
) -> io::Result<JoinHandle<Option<ShutdownSignal>>> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sighup = signal(SignalKind::hangup())?;
    let mut sigquit = signal(SignalKind::quit())?;

    let signal_handle = tokio::spawn(async move {
        let received = tokio::select! {
            _ = sigterm.recv() => Some(ShutdownSignal::Terminate),
            _ = sigint.recv() => Some(ShutdownSignal::Interrupt),
            _ = sighup.recv() => Some(ShutdownSignal::Hangup),
            _ = sigquit.recv() => Some(ShutdownSignal::Quit),
            _ = cancellation_token.cancelled() => None,
        };
        if let Some(sig) = received {
            log::info!("Received {sig}, shutting down");
        }
        cancellation_token.cancel();
        received
    });

    Ok(signal_handle)
}
