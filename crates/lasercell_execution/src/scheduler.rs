//! Timer scheduling for delays and calibration polling.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::trace;

/// What a timer is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeupKind {
    /// Post-motion delay of a task point elapsed
    DelayElapsed,
    /// Camera settled, time to request a snapshot
    Snapshot,
    /// Time to look for the calibration result
    CalibrationPoll,
}

/// A timer firing, tagged with the run generation that armed it.
///
/// Wakeups from an earlier generation are stale and dropped by the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wakeup {
    pub generation: u64,
    pub kind: WakeupKind,
}

impl Wakeup {
    pub fn new(generation: u64, kind: WakeupKind) -> Self {
        Self { generation, kind }
    }
}

/// Arms one-shot timers that come back as [`Wakeup`]s.
pub trait Scheduler: Send {
    fn schedule(&mut self, after: Duration, wakeup: Wakeup);

    /// Cancel every pending timer.
    fn cancel_all(&mut self);
}

/// Scheduler backed by tokio sleeps feeding a channel.
#[derive(Debug)]
pub struct TokioScheduler {
    tx: UnboundedSender<Wakeup>,
    pending: Vec<JoinHandle<()>>,
}

impl TokioScheduler {
    pub fn new(tx: UnboundedSender<Wakeup>) -> Self {
        Self {
            tx,
            pending: Vec::new(),
        }
    }

    /// Number of timers still armed.
    pub fn pending(&self) -> usize {
        self.pending.iter().filter(|h| !h.is_finished()).count()
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&mut self, after: Duration, wakeup: Wakeup) {
        self.pending.retain(|h| !h.is_finished());
        trace!(?after, ?wakeup, "Arming timer");
        let tx = self.tx.clone();
        self.pending.push(tokio::spawn(async move {
            tokio::time::sleep(after).await;
            // Receiver gone means the socket shut down.
            let _ = tx.send(wakeup);
        }));
    }

    fn cancel_all(&mut self) {
        for handle in self.pending.drain(..) {
            handle.abort();
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
