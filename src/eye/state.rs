//! Animation state controller
//!
//! Owns all per-tick timing state: the idle clock, the random blink
//! schedule, and the smoothed pupil positions. `tick` is the only
//! mutation point and runs once per timer fire on the UI thread.

use std::time::{Duration, Instant};

use rand::Rng;

use crate::eye::geometry::EyeGeometry;
use crate::platform::{Point, ScreenBounds};
use crate::settings::Preferences;

/// Exponential moving-average weight applied to pupil movement per tick.
const SMOOTHING_FACTOR: f32 = 0.45;

/// Cursor inactivity after which the eyelids droop.
const SLEEPY_AFTER: Duration = Duration::from_secs(10);

/// Random blink scheduling window, seconds.
const BLINK_DELAY_SECS: (f64, f64) = (3.0, 8.0);

/// One of the two eyes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eye {
    Left,
    Right,
}

/// Smoothed pupil displacement from the eye center, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PupilOffset {
    pub dx: f32,
    pub dy: f32,
}

impl PupilOffset {
    pub fn magnitude(&self) -> f32 {
        self.dx.hypot(self.dy)
    }
}

/// Everything the renderer needs for one eye this frame.
#[derive(Debug, Clone, Copy)]
pub struct EyeFrame {
    pub blink: bool,
    pub pupil: PupilOffset,
}

/// One frame's worth of render input.
#[derive(Debug, Clone, Copy)]
pub struct RenderRequest {
    pub sleepy: bool,
    pub left: EyeFrame,
    pub right: EyeFrame,
}

impl RenderRequest {
    /// Open eyes with centered pupils; the frame shown before the first tick.
    pub fn neutral() -> Self {
        let frame = EyeFrame { blink: false, pupil: PupilOffset::default() };
        Self { sleepy: false, left: frame, right: frame }
    }
}

/// Per-process animation state. Created at startup, discarded on exit.
pub struct EyeTracker {
    geometry: EyeGeometry,
    last_cursor: Point,
    last_activity: Instant,
    next_blink: Instant,
    blink_left: bool,
    blink_right: bool,
    pupil_left: PupilOffset,
    pupil_right: PupilOffset,
}

impl EyeTracker {
    pub fn new(geometry: EyeGeometry, now: Instant, cursor: Point) -> Self {
        Self {
            geometry,
            last_cursor: cursor,
            last_activity: now,
            next_blink: now + random_blink_delay(),
            blink_left: false,
            blink_right: false,
            pupil_left: PupilOffset::default(),
            pupil_right: PupilOffset::default(),
        }
    }

    /// Advance one frame and describe what the eyes should look like.
    ///
    /// A blink lasts exactly one emitted frame regardless of refresh rate,
    /// so its on-screen duration shrinks as the refresh interval does.
    pub fn tick(
        &mut self,
        now: Instant,
        cursor: Point,
        bounds: ScreenBounds,
        prefs: &Preferences,
    ) -> RenderRequest {
        if cursor != self.last_cursor {
            self.last_activity = now;
        }
        self.last_cursor = cursor;

        if prefs.random_blink && now >= self.next_blink {
            if rand::rng().random_bool(0.5) {
                self.blink_left = true;
            } else {
                self.blink_right = true;
            }
            self.next_blink = now + random_blink_delay();
        }

        let idle = now.duration_since(self.last_activity);
        let sleepy = prefs.sleepy_mode && idle > SLEEPY_AFTER;

        let target = bounds.clamp(cursor);
        let max_offset = self.geometry.max_pupil_offset();
        self.pupil_left = smooth(
            self.pupil_left,
            pupil_target(self.geometry.left_center(), target, max_offset),
        );
        self.pupil_right = smooth(
            self.pupil_right,
            pupil_target(self.geometry.right_center(), target, max_offset),
        );

        let request = RenderRequest {
            sleepy,
            left: EyeFrame { blink: self.blink_left, pupil: self.pupil_left },
            right: EyeFrame { blink: self.blink_right, pupil: self.pupil_right },
        };

        // One-frame pulse: the flags drop as soon as they have been emitted.
        self.blink_left = false;
        self.blink_right = false;

        request
    }

    /// Force a blink on the next frame (tray click).
    pub fn trigger_blink(&mut self, eye: Eye) {
        match eye {
            Eye::Left => self.blink_left = true,
            Eye::Right => self.blink_right = true,
        }
    }
}

/// Vector from the eye center to the cursor, magnitude-clamped so the pupil
/// never leaves the eyeball. A zero direction vector passes through as-is;
/// otherwise only the magnitude is reduced, never the direction.
pub fn pupil_target(center: (f32, f32), cursor: Point, max_offset: f32) -> PupilOffset {
    let dx = cursor.x as f32 - center.0;
    let dy = cursor.y as f32 - center.1;
    let distance = dx.hypot(dy);
    if distance > max_offset {
        PupilOffset {
            dx: dx / distance * max_offset,
            dy: dy / distance * max_offset,
        }
    } else {
        PupilOffset { dx, dy }
    }
}

fn smooth(current: PupilOffset, raw: PupilOffset) -> PupilOffset {
    PupilOffset {
        dx: current.dx + (raw.dx - current.dx) * SMOOTHING_FACTOR,
        dy: current.dy + (raw.dy - current.dy) * SMOOTHING_FACTOR,
    }
}

fn random_blink_delay() -> Duration {
    let secs = rand::rng().random_range(BLINK_DELAY_SECS.0..BLINK_DELAY_SECS.1);
    Duration::from_secs_f64(secs)
}
