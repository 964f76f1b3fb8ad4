//! System tray manager
//!
//! Builds the tray icon with its context menu and translates raw menu/tray
//! events into application actions. Menu dispatch compares stored item ids
//! against incoming events; there are no per-item callbacks.

use crossbeam_channel::Receiver;
use image::RgbaImage;
use tray_icon::{
    menu::{CheckMenuItem, Menu, MenuEvent, MenuItem, PredefinedMenuItem, Submenu},
    MouseButton, MouseButtonState, TrayIcon, TrayIconBuilder, TrayIconEvent,
};

use crate::eye::to_tray_icon;
use crate::settings::{Preferences, REFRESH_SPEEDS};

/// Actions a user can take from the context menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayAction {
    ToggleRandomBlink,
    ToggleSleepyMode,
    ToggleStartAtLogin,
    SetRefreshRate(u64),
    Quit,
}

/// Clicks on the tray icon itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayClick {
    Left,
    Right,
    Double,
}

/// System tray manager
pub struct TrayManager {
    tray_icon: TrayIcon,
    random_blink_item: CheckMenuItem,
    sleepy_item: CheckMenuItem,
    start_login_item: CheckMenuItem,
    speed_items: Vec<(u64, CheckMenuItem)>,
    quit_item: MenuItem,
    menu_rx: &'static Receiver<MenuEvent>,
    tray_rx: &'static Receiver<TrayIconEvent>,
}

impl TrayManager {
    /// Create the tray icon showing `initial` and a menu reflecting `prefs`.
    pub fn new(prefs: &Preferences, initial: RgbaImage) -> anyhow::Result<Self> {
        let menu = Menu::new();

        let about_item = MenuItem::new(
            format!("Iris {} ({})", env!("CARGO_PKG_VERSION"), env!("GIT_COMMIT")),
            false,
            None,
        );

        let random_blink_item = CheckMenuItem::new("Random Blink", true, prefs.random_blink, None);
        let sleepy_item = CheckMenuItem::new("Sleepy Mode", true, prefs.sleepy_mode, None);
        let start_login_item =
            CheckMenuItem::new("Start with Windows", true, prefs.start_at_login, None);

        // Radio group backed by the static speed table.
        let speed_menu = Submenu::new("Refresh Speed", true);
        let speed_items: Vec<(u64, CheckMenuItem)> = REFRESH_SPEEDS
            .iter()
            .map(|(label, ms)| {
                (*ms, CheckMenuItem::new(*label, true, *ms == prefs.refresh_rate, None))
            })
            .collect();
        for (_, item) in &speed_items {
            speed_menu.append(item)?;
        }

        let prefs_menu = Submenu::new("Preferences", true);
        prefs_menu.append(&random_blink_item)?;
        prefs_menu.append(&sleepy_item)?;
        prefs_menu.append(&PredefinedMenuItem::separator())?;
        prefs_menu.append(&speed_menu)?;
        prefs_menu.append(&PredefinedMenuItem::separator())?;
        prefs_menu.append(&start_login_item)?;

        let quit_item = MenuItem::new("Quit", true, None);

        menu.append(&about_item)?;
        menu.append(&PredefinedMenuItem::separator())?;
        menu.append(&prefs_menu)?;
        menu.append(&PredefinedMenuItem::separator())?;
        menu.append(&quit_item)?;

        let tray_icon = TrayIconBuilder::new()
            .with_menu(Box::new(menu))
            .with_tooltip("Iris - eyes on your cursor")
            .with_icon(to_tray_icon(initial)?)
            .with_menu_on_left_click(false)
            .build()?;

        Ok(Self {
            tray_icon,
            random_blink_item,
            sleepy_item,
            start_login_item,
            speed_items,
            quit_item,
            menu_rx: MenuEvent::receiver(),
            tray_rx: TrayIconEvent::receiver(),
        })
    }

    /// Replace the tray image with a freshly rendered frame.
    pub fn update_icon(&self, image: RgbaImage) -> anyhow::Result<()> {
        self.tray_icon.set_icon(Some(to_tray_icon(image)?))?;
        Ok(())
    }

    /// Reflect the current preferences in the menu check marks.
    pub fn sync_checks(&self, prefs: &Preferences) {
        self.random_blink_item.set_checked(prefs.random_blink);
        self.sleepy_item.set_checked(prefs.sleepy_mode);
        self.start_login_item.set_checked(prefs.start_at_login);
        for (ms, item) in &self.speed_items {
            item.set_checked(*ms == prefs.refresh_rate);
        }
    }

    /// Next pending menu action, if any.
    pub fn next_menu_action(&self) -> Option<TrayAction> {
        loop {
            let event = self.menu_rx.try_recv().ok()?;
            let id = event.id();
            if id == self.quit_item.id() {
                return Some(TrayAction::Quit);
            }
            if id == self.random_blink_item.id() {
                return Some(TrayAction::ToggleRandomBlink);
            }
            if id == self.sleepy_item.id() {
                return Some(TrayAction::ToggleSleepyMode);
            }
            if id == self.start_login_item.id() {
                return Some(TrayAction::ToggleStartAtLogin);
            }
            if let Some(action) = self
                .speed_items
                .iter()
                .find(|(_, item)| id == item.id())
                .map(|(ms, _)| TrayAction::SetRefreshRate(*ms))
            {
                return Some(action);
            }
            // Unknown id (e.g. the disabled about entry): keep draining.
        }
    }

    /// Next pending click on the tray icon, if any.
    pub fn next_click(&self) -> Option<TrayClick> {
        loop {
            match self.tray_rx.try_recv().ok()? {
                TrayIconEvent::Click {
                    button: MouseButton::Left,
                    button_state: MouseButtonState::Up,
                    ..
                } => return Some(TrayClick::Left),
                TrayIconEvent::Click {
                    button: MouseButton::Right,
                    button_state: MouseButtonState::Up,
                    ..
                } => return Some(TrayClick::Right),
                TrayIconEvent::DoubleClick { button: MouseButton::Left, .. } => {
                    return Some(TrayClick::Double)
                }
                _ => continue,
            }
        }
    }
}
