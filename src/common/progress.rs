//! Upload progress reporting.
//!
//! One tracker per submission. Emitted values are integer percentages that
//! never decrease; the terminal 100 is withheld until the service has
//! acknowledged the upload, so a failed call never ends its sequence at 100.

use tokio::sync::mpsc;

pub type ProgressSender = mpsc::UnboundedSender<u8>;
pub type ProgressReceiver = mpsc::UnboundedReceiver<u8>;

pub fn progress_channel() -> (ProgressSender, ProgressReceiver) {
    mpsc::unbounded_channel()
}

/// Tracks bytes on the wire for a single upload and emits percentage
/// notifications. Not restartable: a new submission gets a new tracker.
pub struct ProgressTracker {
    total: u64,
    sent: u64,
    last_emitted: Option<u8>,
    tx: Option<ProgressSender>,
}

impl ProgressTracker {
    pub fn new(total: u64, tx: Option<ProgressSender>) -> Self {
        Self {
            total,
            sent: 0,
            last_emitted: None,
            tx,
        }
    }

    /// Emit the opening 0% notification.
    pub fn start(&mut self) {
        self.emit(0);
    }

    /// Record `n` more bytes sent. Intermediate values are capped at 99;
    /// only `finish` produces 100.
    pub fn advance(&mut self, n: u64) {
        self.sent = self.sent.saturating_add(n).min(self.total);
        self.emit(self.percent().min(99));
    }

    /// Terminal notification once the call has settled successfully.
    pub fn finish(&mut self) {
        self.emit(100);
    }

    fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.sent as u128 * 100) / self.total as u128) as u8
    }

    fn emit(&mut self, pct: u8) {
        let pct = pct.min(100);
        // Monotonic: never re-emit an equal or lower value
        if self.last_emitted.is_some_and(|last| pct <= last) {
            return;
        }
        self.last_emitted = Some(pct);
        if let Some(tx) = &self.tx {
            // A dropped receiver means the caller stopped listening
            let _ = tx.send(pct);
        }
    }
}
