//! Selection tracker: decides when a finished selection arms the affordance
//! timer and when pointer/selection activity clears the UI.
//!
//! Phases: Idle → Pending(snapshot, timer) → Committed. Pure: every input
//! returns a [`TrackerOutput`] and the caller applies it.

use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::event::{Surface, TimerId, TimerKind};
use crate::geometry::Point;

/// Trimmed non-empty selection plus the pointer position at release.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionSnapshot {
    pub text: String,
    pub anchor: Point,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrackerPhase {
    Idle,
    Pending {
        snapshot: SelectionSnapshot,
        timer: TimerId,
    },
    Committed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrackerOutput {
    Ignored,
    /// Tear down UI, cancelling the pending timer if there was one.
    Clear { cancel: Option<TimerId> },
    /// Start `timer`; cancel the superseded one first.
    Arm {
        timer: TimerId,
        delay: Duration,
        cancel: Option<TimerId>,
    },
    /// Delay elapsed undisturbed: show the affordance for this snapshot.
    Commit(SelectionSnapshot),
}

pub struct SelectionTracker {
    phase: TrackerPhase,
    /// Pointer is down and a selection gesture may be under way.
    gesture_in_progress: bool,
    delay: Duration,
    seq: u64,
}

impl SelectionTracker {
    pub fn new(delay: Duration) -> Self {
        Self {
            phase: TrackerPhase::Idle,
            gesture_in_progress: false,
            delay,
            seq: 0,
        }
    }

    pub fn phase(&self) -> &TrackerPhase {
        &self.phase
    }

    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }

    pub fn on_pointer_down(&mut self, target: Surface, translating: bool) -> TrackerOutput {
        if target.is_interactive() || translating {
            return TrackerOutput::Ignored;
        }
        self.gesture_in_progress = true;
        TrackerOutput::Clear {
            cancel: self.take_pending(),
        }
    }

    pub fn on_selection_change(&mut self, text: &str, target: Surface, translating: bool) -> TrackerOutput {
        if translating || target.is_interactive() {
            return TrackerOutput::Ignored;
        }
        if text.trim().is_empty() && !self.gesture_in_progress {
            return TrackerOutput::Clear {
                cancel: self.take_pending(),
            };
        }
        TrackerOutput::Ignored
    }

    pub fn on_pointer_up(
        &mut self,
        text: &str,
        anchor: Point,
        target: Surface,
        translating: bool,
    ) -> TrackerOutput {
        if target.is_interactive() {
            return TrackerOutput::Ignored;
        }
        self.gesture_in_progress = false;
        if translating {
            return TrackerOutput::Ignored;
        }

        let cancel = self.take_pending();
        let text = text.trim();
        if text.is_empty() {
            return TrackerOutput::Clear { cancel };
        }

        self.seq += 1;
        let timer = TimerId::new(TimerKind::AffordanceDelay, self.seq);
        debug!(len = text.chars().count(), timer = self.seq, "selection_detected");
        self.phase = TrackerPhase::Pending {
            snapshot: SelectionSnapshot {
                text: text.to_owned(),
                anchor,
            },
            timer,
        };
        TrackerOutput::Arm {
            timer,
            delay: self.delay,
            cancel,
        }
    }

    /// Only the currently pending timer may commit; stale fires are ignored.
    pub fn on_timer(&mut self, fired: TimerId) -> TrackerOutput {
        match &self.phase {
            TrackerPhase::Pending { timer, .. } if *timer == fired => {}
            _ => return TrackerOutput::Ignored,
        }
        match std::mem::replace(&mut self.phase, TrackerPhase::Committed) {
            TrackerPhase::Pending { snapshot, .. } => TrackerOutput::Commit(snapshot),
            _ => TrackerOutput::Ignored,
        }
    }

    /// Forget everything; returns the timer to cancel, if any.
    pub fn reset(&mut self) -> Option<TimerId> {
        self.gesture_in_progress = false;
        self.take_pending()
    }

    fn take_pending(&mut self) -> Option<TimerId> {
        match std::mem::replace(&mut self.phase, TrackerPhase::Idle) {
            TrackerPhase::Pending { timer, .. } => Some(timer),
            _ => None,
        }
    }
}
