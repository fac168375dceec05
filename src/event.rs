//! Inputs to and outputs from the reactive core.
//! Host events arrive already resolved against the UI surfaces; effects are
//! plain data applied by the scheduler and the host.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::presenter::content::PanelBody;
use crate::presenter::layout::PanelLayout;
use crate::translate::{TranslationRequest, TranslationResult};

/// Which interactive surface an event target lies within. The host answers
/// this containment query with its own hit-testing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    #[default]
    Page,
    Affordance,
    Panel,
}

impl Surface {
    /// True for the affordance and panel, whose own events never dismiss them.
    pub fn is_interactive(self) -> bool {
        !matches!(self, Surface::Page)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    AffordanceDelay,
    OutsideClickArm,
    CopyFeedback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TimerId {
    pub kind: TimerKind,
    pub seq: u64,
}

impl TimerId {
    pub const fn new(kind: TimerKind, seq: u64) -> Self {
        Self { kind, seq }
    }
}

/// Notifications from the host document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HostEvent {
    Viewport {
        width: f64,
        height: f64,
    },
    PointerMove {
        x: f64,
        y: f64,
    },
    PointerDown {
        #[serde(default)]
        target: Surface,
    },
    PointerUp {
        #[serde(default)]
        target: Surface,
        /// Selected text at release time.
        #[serde(default)]
        selection: String,
        #[serde(default)]
        x: Option<f64>,
        #[serde(default)]
        y: Option<f64>,
    },
    SelectionChange {
        #[serde(default)]
        target: Surface,
        #[serde(default)]
        selection: String,
    },
    Click {
        #[serde(default)]
        target: Surface,
    },
    AffordanceActivated,
    /// Reply to `RenderPanel` with the hidden panel's measured size.
    PanelMeasured {
        render: u64,
        width: f64,
        height: f64,
    },
    CopyRequested,
    Close,
    /// The external settings dialog saved new values.
    SettingsChanged,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Host(HostEvent),
    Timer(TimerId),
    Translated {
        generation: u64,
        result: TranslationResult,
    },
}

impl From<HostEvent> for Event {
    fn from(event: HostEvent) -> Self {
        Event::Host(event)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    ShowAffordance {
        at: Point,
    },
    HideAffordance,
    RemoveAffordance,
    /// Render hidden at `width` and answer with `PanelMeasured`.
    RenderPanel {
        render: u64,
        body: PanelBody,
        width: f64,
    },
    PlacePanel {
        render: u64,
        layout: PanelLayout,
    },
    RemovePanel,
    SetCopyLabel {
        label: String,
    },
    WriteClipboard {
        text: String,
    },
    StartTimer {
        timer: TimerId,
        delay: Duration,
    },
    CancelTimer {
        timer: TimerId,
    },
    Translate {
        generation: u64,
        request: TranslationRequest,
    },
}

impl Effect {
    /// Effects the host applies; timers and dispatch stay in the scheduler.
    pub fn is_host_facing(&self) -> bool {
        !matches!(
            self,
            Effect::StartTimer { .. } | Effect::CancelTimer { .. } | Effect::Translate { .. }
        )
    }
}
