/// Platform-specific functionality: showing a folder in the system
/// file browser.
use std::io;
use std::path::Path;
use std::process::Command;
use tracing::{info, warn};

/// The command that opens a folder in the platform file browser, if known.
fn browser_command() -> Option<&'static str> {
    if cfg!(target_os = "windows") {
        Some("explorer.exe")
    } else if cfg!(target_os = "macos") {
        Some("open")
    } else if cfg!(any(
        target_os = "linux",
        target_os = "freebsd",
        target_os = "openbsd",
        target_os = "netbsd",
        target_os = "dragonfly"
    )) {
        Some("xdg-open")
    } else {
        None
    }
}

/// Launch the file browser on `path` without waiting for it.
pub fn open_in_file_browser(path: &Path) -> io::Result<()> {
    let program = browser_command().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::Unsupported,
            "no file browser known for this platform",
        )
    })?;
    Command::new(program).arg(path).spawn()?;
    Ok(())
}

/// Best-effort [`open_in_file_browser`]: failures are logged, never returned.
pub fn reveal(path: &Path) {
    match open_in_file_browser(path) {
        Ok(()) => info!("Opened {} in the file browser", path.display()),
        Err(err) => warn!("Could not open {} in a file browser: {err}", path.display()),
    }
}
