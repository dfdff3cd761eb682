//! Turns OS signals into a shutdown notification for the web server.

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupted {
    OsSigInt,
    OsSigQuit,
    OsSigTerm,
    UserInt,
}

/// After this many signals the process exits without waiting for a graceful shutdown.
const FORCE_QUIT_THRESHOLD: u8 = 3;

/// The receiving side of the shutdown notification.
#[derive(Debug)]
pub struct InterruptReceiver {
    interrupt_rx: broadcast::Receiver<Interrupted>,
}

impl InterruptReceiver {
    /// Wait for an interrupt signal to be received.
    ///
    /// # Errors
    ///
    /// Fails if the interrupt signal cannot be received (e.g. the sender has been dropped)
    #[inline]
    pub async fn wait(&mut self) -> Result<Interrupted, broadcast::error::RecvError> {
        self.interrupt_rx.recv().await
    }

    /// Re-subscribe to the broadcast channel.
    #[must_use]
    #[inline]
    pub fn resubscribe(&self) -> Self {
        Self {
            interrupt_rx: self.interrupt_rx.resubscribe(),
        }
    }
}

/// The sending side of the shutdown notification.
#[derive(Debug, Clone)]
pub struct Terminator {
    interrupt_tx: broadcast::Sender<Interrupted>,
}

impl Terminator {
    /// Notify every [`InterruptReceiver`].
    ///
    /// # Errors
    ///
    /// Fails if there are no receivers left.
    #[inline]
    pub fn terminate(&self, interrupted: Interrupted) -> anyhow::Result<()> {
        self.interrupt_tx.send(interrupted)?;
        Ok(())
    }

    fn forward(&self, interrupted: Interrupted, kill_count: &mut u8) {
        if let Err(e) = self.terminate(interrupted) {
            log::warn!("failed to forward {interrupted:?}: {e}");
        }
        *kill_count += 1;
        if *kill_count >= FORCE_QUIT_THRESHOLD {
            log::warn!("Received {FORCE_QUIT_THRESHOLD} signals, forcefully terminating the daemon");
            std::process::exit(1);
        }
    }
}

#[cfg(unix)]
async fn terminate_by_signal(terminator: Terminator) -> std::io::Result<()> {
    let mut interrupt_signal = signal(SignalKind::interrupt())?;
    let mut term_signal = signal(SignalKind::terminate())?;
    let mut quit_signal = signal(SignalKind::quit())?;

    let mut kill_count = 0;
    loop {
        let interrupted = tokio::select! {
            _ = interrupt_signal.recv() => Interrupted::OsSigInt,
            _ = term_signal.recv() => Interrupted::OsSigTerm,
            _ = quit_signal.recv() => Interrupted::OsSigQuit,
            _ = tokio::signal::ctrl_c() => Interrupted::UserInt,
        };
        log::info!("received {interrupted:?}");
        terminator.forward(interrupted, &mut kill_count);
    }
}

#[cfg(not(unix))]
async fn terminate_by_signal(terminator: Terminator) -> std::io::Result<()> {
    let mut kill_count = 0;
    loop {
        tokio::signal::ctrl_c().await?;
        log::info!("received {:?}", Interrupted::UserInt);
        terminator.forward(Interrupted::UserInt, &mut kill_count);
    }
}

/// Create the shutdown channel and start listening for signals on the current tokio runtime.
#[allow(clippy::module_name_repetitions)]
#[must_use]
#[inline]
pub fn create_termination() -> (Terminator, InterruptReceiver) {
    let (interrupt_tx, interrupt_rx) = broadcast::channel(FORCE_QUIT_THRESHOLD as usize);
    let terminator = Terminator { interrupt_tx };

    let listener = terminator.clone();
    tokio::spawn(async move {
        if let Err(e) = terminate_by_signal(listener).await {
            log::error!("failed to listen for signals: {e}");
        }
    });

    (terminator, InterruptReceiver { interrupt_rx })
}
