//! System tray module for Iris
//!
//! Owns the tray icon, its context menu, and the event receivers.

pub mod manager;

pub use manager::{TrayAction, TrayClick, TrayManager};
