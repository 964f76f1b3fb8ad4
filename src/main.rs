//! Iris - a pair of cartoon eyes living in the Windows system tray
//!
//! The eyes follow the global mouse cursor, blink at random, and doze off
//! when the cursor goes quiet. The tray icon is the whole UI; a context
//! menu holds the handful of preferences.

mod app;
mod eye;
mod logging;
mod platform;
mod settings;
mod single_instance;
mod tray;

fn main() {
    let exit_code = run();
    std::process::exit(exit_code);
}

fn run() -> i32 {
    if let Err(e) = logging::init() {
        eprintln!("Failed to initialize logging: {}", e);
        return 1;
    }

    // Check for existing instance
    let _guard = match single_instance::SingleInstanceGuard::try_acquire() {
        Some(guard) => guard,
        None => {
            eprintln!("Iris is already running. Check your system tray.");
            return 0; // Not an error, just exit gracefully
        }
    };

    match app::run() {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!("{e:#}");
            1
        }
    }
}
