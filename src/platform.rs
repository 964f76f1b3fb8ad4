//! Desktop queries: global cursor position and primary screen bounds
//!
//! Both are polled once per tick. A failed query is not fatal; the caller
//! skips the frame and tries again on the next tick.

use thiserror::Error;

/// A point in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// Primary display extents, used to clamp cursor coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenBounds {
    pub width: i32,
    pub height: i32,
}

impl ScreenBounds {
    /// Clamp a point into `[0, width] x [0, height]`.
    pub fn clamp(&self, point: Point) -> Point {
        Point {
            x: point.x.clamp(0, self.width),
            y: point.y.clamp(0, self.height),
        }
    }
}

/// Errors from desktop queries
#[derive(Debug, Error)]
pub enum DesktopError {
    #[error("cursor position query failed: {0}")]
    Cursor(String),
    #[error("screen metrics unavailable")]
    Screen,
    #[error("desktop queries are not supported on this platform")]
    Unsupported,
}

/// Source of cursor position and screen bounds.
pub trait Desktop {
    fn cursor_position(&self) -> Result<Point, DesktopError>;
    fn screen_bounds(&self) -> Result<ScreenBounds, DesktopError>;
}

/// The real desktop, queried through the Win32 API.
pub struct SystemDesktop;

#[cfg(windows)]
impl Desktop for SystemDesktop {
    fn cursor_position(&self) -> Result<Point, DesktopError> {
        use windows::Win32::Foundation::POINT;
        use windows::Win32::UI::WindowsAndMessaging::GetCursorPos;

        let mut pt = POINT::default();
        unsafe { GetCursorPos(&mut pt) }.map_err(|e| DesktopError::Cursor(e.to_string()))?;
        Ok(Point { x: pt.x, y: pt.y })
    }

    fn screen_bounds(&self) -> Result<ScreenBounds, DesktopError> {
        use windows::Win32::UI::WindowsAndMessaging::{GetSystemMetrics, SM_CXSCREEN, SM_CYSCREEN};

        let width = unsafe { GetSystemMetrics(SM_CXSCREEN) };
        let height = unsafe { GetSystemMetrics(SM_CYSCREEN) };
        if width <= 0 || height <= 0 {
            return Err(DesktopError::Screen);
        }
        Ok(ScreenBounds { width, height })
    }
}

#[cfg(not(windows))]
impl Desktop for SystemDesktop {
    fn cursor_position(&self) -> Result<Point, DesktopError> {
        Err(DesktopError::Unsupported)
    }

    fn screen_bounds(&self) -> Result<ScreenBounds, DesktopError> {
        Err(DesktopError::Unsupported)
    }
}
