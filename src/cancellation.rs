//! Timer cancellation on top of `CancellationToken`.
//! Each timer is a tokio sleep raced against its own child of the root token.
//! A timer cancelled after it fired but before its event was handled is
//! caught by [`TimerSet::fired`], so cancelled timers never reach the reactor.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::event::{Event, TimerId};

pub struct TimerSet {
    root: CancellationToken,
    active: HashMap<TimerId, CancellationToken>,
    tx: mpsc::UnboundedSender<Event>,
}

impl TimerSet {
    /// Fired timers are delivered on `tx` as [`Event::Timer`].
    pub fn new(root: CancellationToken, tx: mpsc::UnboundedSender<Event>) -> Self {
        Self {
            root,
            active: HashMap::new(),
            tx,
        }
    }

    /// Start `timer`, replacing an earlier start of the same id.
    pub fn start(&mut self, timer: TimerId, delay: Duration) {
        let token = self.root.child_token();
        if let Some(previous) = self.active.insert(timer, token.clone()) {
            previous.cancel();
        }
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    let _ = tx.send(Event::Timer(timer));
                }
            }
        });
        debug!(?timer, delay_ms = delay.as_millis() as u64, "timer_started");
    }

    /// Returns false if the timer was not pending.
    pub fn cancel(&mut self, timer: TimerId) -> bool {
        match self.active.remove(&timer) {
            Some(token) => {
                token.cancel();
                debug!(?timer, "timer_cancelled");
                true
            }
            None => false,
        }
    }

    /// Claim a delivered timer. False means it was cancelled in the meantime
    /// and its event must be dropped.
    pub fn fired(&mut self, timer: TimerId) -> bool {
        self.active.remove(&timer).is_some()
    }

    pub fn pending(&self) -> usize {
        self.active.len()
    }

    /// Token for other work that must stop on shutdown.
    pub fn child_token(&self) -> CancellationToken {
        self.root.child_token()
    }

    /// Cancel every timer and everything holding a child token.
    pub fn shutdown(&mut self) {
        self.root.cancel();
        self.active.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::TimerKind;
    use tokio::time::Instant;

    const WAIT: Duration = Duration::from_secs(5);

    fn timers() -> (TimerSet, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (TimerSet::new(CancellationToken::new(), tx), rx)
    }

    #[tokio::test(start_paused = true)]
    async fn started_timer_fires_after_delay() {
        let (mut timers, mut rx) = timers();
        let id = TimerId::new(TimerKind::AffordanceDelay, 1);
        let before = Instant::now();
        timers.start(id, Duration::from_millis(500));

        assert_eq!(rx.recv().await, Some(Event::Timer(id)));
        assert!(before.elapsed() >= Duration::from_millis(500));
        assert!(timers.fired(id));
        assert!(!timers.fired(id));
        assert_eq!(timers.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_timer_never_fires() {
        let (mut timers, mut rx) = timers();
        let id = TimerId::new(TimerKind::OutsideClickArm, 1);
        timers.start(id, Duration::from_millis(100));
        assert!(timers.cancel(id));
        assert!(!timers.cancel(id));

        assert!(tokio::time::timeout(WAIT, rx.recv()).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_after_fire_is_caught_by_claim() {
        let (mut timers, mut rx) = timers();
        let id = TimerId::new(TimerKind::CopyFeedback, 1);
        timers.start(id, Duration::from_millis(10));
        let delivered = rx.recv().await;
        assert_eq!(delivered, Some(Event::Timer(id)));

        timers.cancel(id);
        assert!(!timers.fired(id));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_everything() {
        let (mut timers, mut rx) = timers();
        timers.start(TimerId::new(TimerKind::AffordanceDelay, 1), Duration::from_millis(100));
        timers.start(TimerId::new(TimerKind::CopyFeedback, 2), Duration::from_millis(200));
        let work = timers.child_token();
        timers.shutdown();

        assert!(work.is_cancelled());
        assert_eq!(timers.pending(), 0);
        assert!(tokio::time::timeout(WAIT, rx.recv()).await.is_err());
    }
}
