//! Panel presenter: owns the affordance icon, the floating panel and the
//! single live [`UiState`]. Every operation returns the effects the host and
//! scheduler must apply; nothing here touches a clock or the network.

pub mod content;
pub mod layout;

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::event::{Effect, Surface, TimerId, TimerKind};
use crate::geometry::{Point, Size};
use crate::i18n::InterfaceLanguage;
use crate::state_machine::{StateMachine, UiPhase, UiState};
use crate::tracker::SelectionSnapshot;
use crate::translate::{TargetLanguage, TranslationRequest, TranslationResult};

use content::PanelBody;

/// Outside clicks are ignored for this long after a panel render, so the
/// activating gesture cannot close its own panel.
pub const OUTSIDE_CLICK_ARM_DELAY: Duration = Duration::from_millis(100);
/// How long the copy button reads "Copied".
pub const COPY_FEEDBACK_DELAY: Duration = Duration::from_millis(1500);

const DEFAULT_VIEWPORT: Size = Size::new(1280.0, 800.0);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresenterSettings {
    pub max_width: f64,
    pub target_language: TargetLanguage,
    pub interface_language: InterfaceLanguage,
    pub preserve_format: bool,
}

impl From<&Settings> for PresenterSettings {
    fn from(settings: &Settings) -> Self {
        Self {
            max_width: settings.max_width,
            target_language: settings.target_language,
            interface_language: settings.interface_language,
            preserve_format: true,
        }
    }
}

pub struct PanelPresenter {
    machine: StateMachine,
    settings: PresenterSettings,
    viewport: Size,
    /// Generation of the request awaiting a result. Survives teardown.
    in_flight: Option<u64>,
    generation: u64,
    render_seq: u64,
    /// Latest render; only its measurements are placed.
    current_render: Option<u64>,
    panel_anchor: Point,
    affordance_present: bool,
    panel_present: bool,
    outside_click_armed: bool,
    arm_timer: Option<TimerId>,
    copy_timer: Option<TimerId>,
    timer_seq: u64,
}

impl PanelPresenter {
    pub fn new(settings: PresenterSettings) -> Self {
        Self {
            machine: StateMachine::new(),
            settings,
            viewport: DEFAULT_VIEWPORT,
            in_flight: None,
            generation: 0,
            render_seq: 0,
            current_render: None,
            panel_anchor: Point::default(),
            affordance_present: false,
            panel_present: false,
            outside_click_armed: false,
            arm_timer: None,
            copy_timer: None,
            timer_seq: 0,
        }
    }

    pub fn state(&self) -> &UiState {
        self.machine.current()
    }

    pub fn phase(&self) -> UiPhase {
        self.machine.phase()
    }

    pub fn is_translating(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Takes effect from the next render or request.
    pub fn apply_settings(&mut self, settings: PresenterSettings) {
        self.settings = settings;
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    /// A fresh selection is waiting out its delay: clear whatever is shown.
    pub fn arm(&mut self) -> Vec<Effect> {
        let effects = self.clear_visuals();
        if !self.machine.phase().can_transition_to(UiPhase::AffordanceArmed) {
            self.machine.force_idle();
        }
        if let Err(e) = self.machine.transition(UiState::AffordanceArmed) {
            warn!(error = %e, "arm rejected");
        }
        effects
    }

    pub fn show_affordance(&mut self, snapshot: SelectionSnapshot) -> Vec<Effect> {
        if self.affordance_present {
            debug!("affordance already shown");
            return Vec::new();
        }
        if self.is_translating() {
            debug!("translation in flight, affordance suppressed");
            return Vec::new();
        }

        let at = layout::affordance_position(snapshot.anchor);
        let mut effects = self.clear_visuals();
        if self.machine.transition(UiState::AffordanceShown { snapshot }).is_err() {
            return effects;
        }
        self.affordance_present = true;
        effects.push(Effect::ShowAffordance { at });
        effects
    }

    /// The user activated the affordance; `pointer` anchors the panel.
    pub fn activate(&mut self, pointer: Point) -> Vec<Effect> {
        if self.is_translating() {
            debug!("activation ignored, translation in flight");
            return Vec::new();
        }
        let snapshot = match self.machine.current() {
            UiState::AffordanceShown { snapshot } => snapshot.clone(),
            _ => return Vec::new(),
        };

        self.generation += 1;
        let generation = self.generation;
        let request = TranslationRequest {
            source_text: snapshot.text.clone(),
            target_language: self.settings.target_language,
            preserve_format: self.settings.preserve_format,
        };
        if self
            .machine
            .transition(UiState::Loading { snapshot, generation })
            .is_err()
        {
            return Vec::new();
        }
        self.in_flight = Some(generation);
        self.panel_anchor = pointer;
        info!(generation, target = %request.target_language, "translation_requested");

        let body = PanelBody::loading(
            self.settings.interface_language,
            self.settings.target_language,
        );
        let mut effects = self.render(body);
        effects.push(Effect::Translate { generation, request });
        effects
    }

    pub fn present(&mut self, generation: u64, result: TranslationResult) -> Vec<Effect> {
        if self.in_flight == Some(generation) {
            self.in_flight = None;
        }
        let snapshot = match self.machine.current() {
            UiState::Loading { snapshot, generation: live } if *live == generation => snapshot.clone(),
            _ => {
                info!(generation, "discarding stale translation result");
                return Vec::new();
            }
        };

        let ui = self.settings.interface_language;
        let body = match &result {
            Ok(translation) => {
                info!(
                    generation,
                    provider = %translation.provider,
                    model = %translation.model,
                    "translation_presented"
                );
                PanelBody::translation(&translation.text, ui)
            }
            Err(err) => {
                info!(generation, kind = ?err.kind(), error = %err, "translation_failed");
                PanelBody::error(err, ui)
            }
        };

        if self
            .machine
            .transition(UiState::Result { snapshot, body: body.clone() })
            .is_err()
        {
            return Vec::new();
        }
        let mut effects = Vec::new();
        if self.affordance_present {
            effects.push(Effect::HideAffordance);
        }
        effects.extend(self.render(body));
        effects
    }

    /// Host measured the hidden panel for `render`.
    pub fn place(&mut self, render: u64, measured: Size) -> Vec<Effect> {
        if !self.panel_present || self.current_render != Some(render) {
            debug!(render, "ignoring stale panel measurement");
            return Vec::new();
        }
        let layout = layout::place(self.panel_anchor, measured, self.viewport, self.settings.max_width);
        vec![Effect::PlacePanel { render, layout }]
    }

    pub fn on_click(&mut self, target: Surface) -> Vec<Effect> {
        if target.is_interactive() {
            return Vec::new();
        }
        let dismiss = match self.machine.phase() {
            UiPhase::AffordanceShown => !self.panel_present,
            UiPhase::Loading | UiPhase::Result => self.outside_click_armed,
            UiPhase::Idle | UiPhase::AffordanceArmed => false,
        };
        if !dismiss {
            return Vec::new();
        }
        debug!("outside click");
        self.teardown()
    }

    pub fn on_timer(&mut self, timer: TimerId) -> Vec<Effect> {
        match timer.kind {
            TimerKind::OutsideClickArm if self.arm_timer == Some(timer) => {
                self.arm_timer = None;
                self.outside_click_armed = true;
                Vec::new()
            }
            TimerKind::CopyFeedback if self.copy_timer == Some(timer) => {
                self.copy_timer = None;
                vec![Effect::SetCopyLabel {
                    label: self.settings.interface_language.texts().copy_button.to_owned(),
                }]
            }
            _ => Vec::new(),
        }
    }

    pub fn copy(&mut self) -> Vec<Effect> {
        let text = match self.machine.current() {
            UiState::Result { body, .. } => match body.plain_text() {
                Some(text) => text.to_owned(),
                None => return Vec::new(),
            },
            _ => return Vec::new(),
        };

        let mut effects = vec![
            Effect::WriteClipboard { text },
            Effect::SetCopyLabel {
                label: self.settings.interface_language.texts().copied.to_owned(),
            },
        ];
        if let Some(timer) = self.copy_timer.take() {
            effects.push(Effect::CancelTimer { timer });
        }
        let timer = self.next_timer(TimerKind::CopyFeedback);
        self.copy_timer = Some(timer);
        effects.push(Effect::StartTimer { timer, delay: COPY_FEEDBACK_DELAY });
        effects
    }

    /// Remove icon and panel together and return to Idle. An in-flight
    /// request keeps its slot until its result arrives.
    pub fn teardown(&mut self) -> Vec<Effect> {
        let effects = self.clear_visuals();
        self.machine.force_idle();
        effects
    }

    fn render(&mut self, body: PanelBody) -> Vec<Effect> {
        let mut effects = Vec::new();
        if let Some(timer) = self.copy_timer.take() {
            effects.push(Effect::CancelTimer { timer });
        }

        self.render_seq += 1;
        let render = self.render_seq;
        self.current_render = Some(render);
        self.panel_present = true;
        let width = layout::provisional_width(self.viewport, self.settings.max_width);
        effects.push(Effect::RenderPanel { render, body, width });

        if !self.outside_click_armed && self.arm_timer.is_none() {
            let timer = self.next_timer(TimerKind::OutsideClickArm);
            self.arm_timer = Some(timer);
            effects.push(Effect::StartTimer { timer, delay: OUTSIDE_CLICK_ARM_DELAY });
        }
        effects
    }

    fn clear_visuals(&mut self) -> Vec<Effect> {
        let mut effects: Vec<Effect> = [self.arm_timer.take(), self.copy_timer.take()]
            .into_iter()
            .flatten()
            .map(|timer| Effect::CancelTimer { timer })
            .collect();
        if self.affordance_present || self.panel_present {
            effects.push(Effect::RemoveAffordance);
            effects.push(Effect::RemovePanel);
        }
        self.affordance_present = false;
        self.panel_present = false;
        self.outside_click_armed = false;
        self.current_render = None;
        effects
    }

    fn next_timer(&mut self, kind: TimerKind) -> TimerId {
        self.timer_seq += 1;
        TimerId::new(kind, self.timer_seq)
    }
}
