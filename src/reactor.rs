//! Reactive core: `(state, event) -> effects`.
//!
//! Host events go to the selection tracker first; its verdict drives the
//! presenter. Timers and translation results come back in as events, so
//! every state change happens here on a single thread.

use tracing::debug;

use crate::config::Settings;
use crate::event::{Effect, Event, HostEvent, TimerKind};
use crate::geometry::{Point, Size};
use crate::presenter::{PanelPresenter, PresenterSettings};
use crate::tracker::{SelectionTracker, TrackerOutput};

pub struct Reactor {
    tracker: SelectionTracker,
    presenter: PanelPresenter,
    /// Last known pointer position.
    pointer: Point,
}

impl Reactor {
    pub fn new(settings: &Settings) -> Self {
        Self {
            tracker: SelectionTracker::new(settings.delay),
            presenter: PanelPresenter::new(PresenterSettings::from(settings)),
            pointer: Point::default(),
        }
    }

    pub fn presenter(&self) -> &PanelPresenter {
        &self.presenter
    }

    pub fn apply_settings(&mut self, settings: &Settings) {
        self.tracker.set_delay(settings.delay);
        self.presenter.apply_settings(PresenterSettings::from(settings));
    }

    pub fn handle(&mut self, event: Event) -> Vec<Effect> {
        match event {
            Event::Host(host) => self.handle_host(host),
            Event::Timer(timer) => match timer.kind {
                TimerKind::AffordanceDelay => {
                    let out = self.tracker.on_timer(timer);
                    self.apply_tracker(out)
                }
                TimerKind::OutsideClickArm | TimerKind::CopyFeedback => self.presenter.on_timer(timer),
            },
            Event::Translated { generation, result } => self.presenter.present(generation, result),
        }
    }

    fn handle_host(&mut self, event: HostEvent) -> Vec<Effect> {
        let translating = self.presenter.is_translating();
        match event {
            HostEvent::Viewport { width, height } => {
                self.presenter.set_viewport(Size::new(width, height));
                Vec::new()
            }
            HostEvent::PointerMove { x, y } => {
                self.pointer = Point::new(x, y);
                Vec::new()
            }
            HostEvent::PointerDown { target } => {
                let out = self.tracker.on_pointer_down(target, translating);
                self.apply_tracker(out)
            }
            HostEvent::PointerUp { target, selection, x, y } => {
                if let (Some(x), Some(y)) = (x, y) {
                    self.pointer = Point::new(x, y);
                }
                let out = self.tracker.on_pointer_up(&selection, self.pointer, target, translating);
                self.apply_tracker(out)
            }
            HostEvent::SelectionChange { target, selection } => {
                let out = self.tracker.on_selection_change(&selection, target, translating);
                self.apply_tracker(out)
            }
            HostEvent::Click { target } => self.presenter.on_click(target),
            HostEvent::AffordanceActivated => self.presenter.activate(self.pointer),
            HostEvent::PanelMeasured { render, width, height } => {
                self.presenter.place(render, Size::new(width, height))
            }
            HostEvent::CopyRequested => self.presenter.copy(),
            HostEvent::Close => {
                let cancel = self.tracker.reset();
                self.apply_tracker(TrackerOutput::Clear { cancel })
            }
            HostEvent::SettingsChanged => {
                debug!("settings change is applied by the driver");
                Vec::new()
            }
        }
    }

    fn apply_tracker(&mut self, out: TrackerOutput) -> Vec<Effect> {
        match out {
            TrackerOutput::Ignored => Vec::new(),
            TrackerOutput::Clear { cancel } => {
                let mut effects: Vec<Effect> =
                    cancel.map(|timer| Effect::CancelTimer { timer }).into_iter().collect();
                effects.extend(self.presenter.teardown());
                effects
            }
            TrackerOutput::Arm { timer, delay, cancel } => {
                let mut effects: Vec<Effect> =
                    cancel.map(|timer| Effect::CancelTimer { timer }).into_iter().collect();
                effects.extend(self.presenter.arm());
                effects.push(Effect::StartTimer { timer, delay });
                effects
            }
            TrackerOutput::Commit(snapshot) => self.presenter.show_affordance(snapshot),
        }
    }
}
