//! UI lifecycle: Idle → AffordanceArmed → AffordanceShown → Loading → Result → Idle.
//! One `UiState` is live at a time; the presenter owns it and moves it
//! through validated transitions.

use std::fmt;

use tracing::{info, warn};

use crate::presenter::content::PanelBody;
use crate::tracker::SelectionSnapshot;

/// Live UI state, carrying at most one selection snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum UiState {
    Idle,
    /// Affordance delay timer pending; the tracker still owns the snapshot.
    AffordanceArmed,
    AffordanceShown {
        snapshot: SelectionSnapshot,
    },
    Loading {
        snapshot: SelectionSnapshot,
        generation: u64,
    },
    Result {
        snapshot: SelectionSnapshot,
        body: PanelBody,
    },
}

/// Data-free tag of [`UiState`], used for transition rules and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UiPhase {
    Idle,
    AffordanceArmed,
    AffordanceShown,
    Loading,
    Result,
}

impl fmt::Display for UiPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UiPhase::Idle => write!(f, "Idle"),
            UiPhase::AffordanceArmed => write!(f, "AffordanceArmed"),
            UiPhase::AffordanceShown => write!(f, "AffordanceShown"),
            UiPhase::Loading => write!(f, "Loading"),
            UiPhase::Result => write!(f, "Result"),
        }
    }
}

impl UiPhase {
    pub fn can_transition_to(self, next: UiPhase) -> bool {
        matches!(
            (self, next),
            (UiPhase::Idle, UiPhase::AffordanceArmed)
                | (UiPhase::Idle, UiPhase::AffordanceShown) // shown programmatically
                | (UiPhase::AffordanceArmed, UiPhase::AffordanceArmed) // re-armed by a newer selection
                | (UiPhase::AffordanceArmed, UiPhase::AffordanceShown)
                | (UiPhase::AffordanceShown, UiPhase::AffordanceArmed)
                | (UiPhase::AffordanceShown, UiPhase::Loading)
                | (UiPhase::Loading, UiPhase::Result)
                | (UiPhase::Result, UiPhase::AffordanceArmed)
                // teardown is always allowed
                | (_, UiPhase::Idle)
        )
    }
}

impl UiState {
    pub fn phase(&self) -> UiPhase {
        match self {
            UiState::Idle => UiPhase::Idle,
            UiState::AffordanceArmed => UiPhase::AffordanceArmed,
            UiState::AffordanceShown { .. } => UiPhase::AffordanceShown,
            UiState::Loading { .. } => UiPhase::Loading,
            UiState::Result { .. } => UiPhase::Result,
        }
    }

    pub fn snapshot(&self) -> Option<&SelectionSnapshot> {
        match self {
            UiState::Idle | UiState::AffordanceArmed => None,
            UiState::AffordanceShown { snapshot }
            | UiState::Loading { snapshot, .. }
            | UiState::Result { snapshot, .. } => Some(snapshot),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid transition: {from} -> {to}")]
pub struct InvalidTransition {
    pub from: UiPhase,
    pub to: UiPhase,
}

/// Owner of the single live [`UiState`].
#[derive(Debug)]
pub struct StateMachine {
    state: UiState,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    pub fn new() -> Self {
        Self { state: UiState::Idle }
    }

    pub fn current(&self) -> &UiState {
        &self.state
    }

    pub fn phase(&self) -> UiPhase {
        self.state.phase()
    }

    /// Move to `next` if the rules allow it.
    pub fn transition(&mut self, next: UiState) -> Result<UiPhase, InvalidTransition> {
        let from = self.state.phase();
        let to = next.phase();
        if !from.can_transition_to(to) {
            let err = InvalidTransition { from, to };
            warn!("{}", err);
            return Err(err);
        }
        self.state = next;
        info!(from = %from, to = %to, "state_transition");
        Ok(to)
    }

    /// Drop back to Idle from any state, returning what was live.
    pub fn force_idle(&mut self) -> UiState {
        let prev = std::mem::replace(&mut self.state, UiState::Idle);
        if prev.phase() != UiPhase::Idle {
            info!(from = %prev.phase(), "force_idle");
        }
        prev
    }
}
