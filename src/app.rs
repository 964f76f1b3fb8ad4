//! Application event loop
//!
//! A winit loop with no windows: the tray icon is created once the loop is
//! live, and `ControlFlow::WaitUntil` acts as the animation timer. All
//! state mutation happens on this thread.

use std::time::{Duration, Instant};

use anyhow::Context;
use winit::application::ApplicationHandler;
use winit::event::{StartCause, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::WindowId;

use crate::eye::{render_eyes, render_roll_frame, Eye, EyeGeometry, EyeTracker, RenderRequest};
use crate::platform::{Desktop, Point, SystemDesktop};
use crate::settings::{refresh_speed_label, Preferences};
use crate::tray::{TrayAction, TrayClick, TrayManager};

/// Number of frames in the roll gesture.
const ROLL_STEPS: u32 = 12;
/// Delay between roll frames; 12 steps make the burst ~300ms.
const ROLL_STEP_DELAY: Duration = Duration::from_millis(25);

/// Run the tray app until the user quits.
pub fn run() -> anyhow::Result<()> {
    let prefs = Preferences::load();
    tracing::info!(
        refresh_rate = prefs.refresh_rate,
        random_blink = prefs.random_blink,
        sleepy_mode = prefs.sleepy_mode,
        "starting Iris"
    );

    if prefs.start_at_login != Preferences::is_start_at_login_enabled() {
        tracing::debug!("start-at-login preference is out of sync with the registry");
    }

    let event_loop = EventLoop::new().context("failed to create event loop")?;
    let mut app = IrisApp::new(prefs);
    event_loop.run_app(&mut app).context("event loop failed")?;
    Ok(())
}

struct IrisApp {
    prefs: Preferences,
    desktop: SystemDesktop,
    geometry: EyeGeometry,
    tracker: EyeTracker,
    tray: Option<TrayManager>,
    next_tick: Instant,
}

impl IrisApp {
    fn new(prefs: Preferences) -> Self {
        let desktop = SystemDesktop;
        let geometry = EyeGeometry::default();
        let now = Instant::now();
        let cursor = desktop.cursor_position().unwrap_or(Point { x: 0, y: 0 });
        let next_tick = now + prefs.interval();
        Self {
            tracker: EyeTracker::new(geometry, now, cursor),
            prefs,
            desktop,
            geometry,
            tray: None,
            next_tick,
        }
    }

    /// The tray icon has to be created on the event loop thread, so this
    /// runs on `StartCause::Init` rather than in `new`.
    fn init_tray(&mut self, event_loop: &ActiveEventLoop) {
        let initial = render_eyes(&RenderRequest::neutral(), &self.geometry);
        match TrayManager::new(&self.prefs, initial) {
            Ok(tray) => self.tray = Some(tray),
            Err(e) => {
                tracing::error!("could not create tray icon: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn schedule(&mut self, event_loop: &ActiveEventLoop) {
        self.next_tick = Instant::now() + self.prefs.interval();
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_tick));
    }

    /// One animation frame. A failed desktop query skips the frame; the
    /// next tick retries.
    fn tick(&mut self) {
        let Some(tray) = &self.tray else { return };

        let (cursor, bounds) = match (self.desktop.cursor_position(), self.desktop.screen_bounds())
        {
            (Ok(cursor), Ok(bounds)) => (cursor, bounds),
            (Err(e), _) | (_, Err(e)) => {
                tracing::debug!("skipping frame: {e}");
                return;
            }
        };

        let request = self.tracker.tick(Instant::now(), cursor, bounds, &self.prefs);
        let image = render_eyes(&request, &self.geometry);
        if let Err(e) = tray.update_icon(image) {
            tracing::warn!("failed to update tray icon: {e:#}");
        }
    }

    fn drain_events(&mut self, event_loop: &ActiveEventLoop) {
        let (actions, clicks) = match &self.tray {
            Some(tray) => (
                std::iter::from_fn(|| tray.next_menu_action()).collect::<Vec<_>>(),
                std::iter::from_fn(|| tray.next_click()).collect::<Vec<_>>(),
            ),
            None => return,
        };

        for action in actions {
            self.apply_action(action, event_loop);
        }
        for click in clicks {
            self.handle_click(click);
        }
    }

    fn apply_action(&mut self, action: TrayAction, event_loop: &ActiveEventLoop) {
        match action {
            TrayAction::ToggleRandomBlink => {
                self.prefs.random_blink = !self.prefs.random_blink;
                tracing::info!(enabled = self.prefs.random_blink, "random blink toggled");
                self.persist();
            }
            TrayAction::ToggleSleepyMode => {
                self.prefs.sleepy_mode = !self.prefs.sleepy_mode;
                tracing::info!(enabled = self.prefs.sleepy_mode, "sleepy mode toggled");
                self.persist();
            }
            TrayAction::ToggleStartAtLogin => {
                let enabled = !self.prefs.start_at_login;
                if let Err(e) = self.prefs.set_start_at_login(enabled) {
                    tracing::warn!("could not update start-at-login: {e:#}");
                }
                self.persist();
            }
            TrayAction::SetRefreshRate(ms) => {
                self.prefs.refresh_rate = ms;
                tracing::info!(
                    speed = refresh_speed_label(ms).unwrap_or("custom"),
                    "refresh rate set to {ms}ms"
                );
                self.persist();
            }
            TrayAction::Quit => {
                // Best-effort: a failed save loses at most the latest change.
                self.persist();
                tracing::info!("quitting");
                event_loop.exit();
            }
        }

        if let Some(tray) = &self.tray {
            tray.sync_checks(&self.prefs);
        }
    }

    fn handle_click(&mut self, click: TrayClick) {
        match click {
            TrayClick::Left => self.tracker.trigger_blink(Eye::Left),
            TrayClick::Right => self.tracker.trigger_blink(Eye::Right),
            TrayClick::Double => self.roll_eyes(),
        }
    }

    /// Deliberately synchronous: the roll is a short user-triggered burst
    /// that monopolizes the loop thread; regular ticks resume afterwards.
    fn roll_eyes(&mut self) {
        let Some(tray) = &self.tray else { return };
        tracing::debug!("rolling eyes");
        for step in 0..ROLL_STEPS {
            let frame = render_roll_frame(step, ROLL_STEPS, &self.geometry);
            if let Err(e) = tray.update_icon(frame) {
                tracing::debug!("roll frame dropped: {e:#}");
                break;
            }
            std::thread::sleep(ROLL_STEP_DELAY);
        }
    }

    fn persist(&self) {
        if let Err(e) = self.prefs.save() {
            tracing::warn!("failed to persist preferences: {e:#}");
        }
    }
}

impl ApplicationHandler for IrisApp {
    fn resumed(&mut self, _event_loop: &ActiveEventLoop) {}

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        _event: WindowEvent,
    ) {
    }

    fn new_events(&mut self, event_loop: &ActiveEventLoop, cause: StartCause) {
        match cause {
            StartCause::Init => {
                self.init_tray(event_loop);
                self.tick();
                self.schedule(event_loop);
            }
            StartCause::ResumeTimeReached { .. } => {
                self.tick();
                self.schedule(event_loop);
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        self.drain_events(event_loop);
        if !event_loop.exiting() {
            event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_tick));
        }
    }
}
