//! Foreground window detection.
//!
//! The overlay only cares about one question: is the target application the
//! window that currently has input focus? Each platform answers it by
//! reading the title of the foreground window.

use tracing::trace;

/// Answers "is the target application in the foreground".
///
/// Implementations may block briefly (a syscall or a helper process), so
/// callers on an async runtime should query from a blocking thread.
pub trait ForegroundWatcher: Send + Sync {
    fn is_target_foreground(&self) -> bool;
}

/// Matches the foreground window title against a fixed target title.
#[derive(Debug, Clone)]
pub struct TitleWatcher {
    target: String,
}

impl TitleWatcher {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }

    /// Exact title comparison, ignoring surrounding whitespace.
    pub fn matches(&self, title: &str) -> bool {
        title.trim() == self.target
    }
}

impl ForegroundWatcher for TitleWatcher {
    fn is_target_foreground(&self) -> bool {
        match foreground_window_title() {
            Some(title) => {
                trace!(title = %title, "foreground window");
                self.matches(&title)
            }
            None => false,
        }
    }
}

/// Title of the window that currently has input focus, if any.
pub fn foreground_window_title() -> Option<String> {
    #[cfg(target_os = "windows")]
    return title_windows();

    #[cfg(target_os = "macos")]
    return title_macos();

    #[cfg(target_os = "linux")]
    return title_linux();

    #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
    return None;
}

#[cfg(target_os = "windows")]
fn title_windows() -> Option<String> {
    use windows::Win32::Foundation::HWND;
    use windows::Win32::UI::WindowsAndMessaging::{GetForegroundWindow, GetWindowTextW};

    unsafe {
        let hwnd: HWND = GetForegroundWindow();
        if hwnd.0.is_null() {
            return None;
        }

        let mut buf = [0u16; 512];
        let len = GetWindowTextW(hwnd, &mut buf);
        if len > 0 {
            Some(String::from_utf16_lossy(&buf[..len as usize]))
        } else {
            None
        }
    }
}

#[cfg(target_os = "macos")]
fn title_macos() -> Option<String> {
    use std::process::Command;

    let script = r#"
        tell application "System Events"
            set frontApp to first application process whose frontmost is true
            set windowTitle to ""
            try
                set windowTitle to name of front window of frontApp
            end try
            if windowTitle is "" then set windowTitle to name of frontApp
            return windowTitle
        end tell
    "#;

    let out = Command::new("osascript").args(["-e", script]).output().ok()?;
    if !out.status.success() {
        return None;
    }
    let title = String::from_utf8_lossy(&out.stdout).trim().to_string();
    (!title.is_empty()).then_some(title)
}

#[cfg(target_os = "linux")]
fn title_linux() -> Option<String> {
    use std::process::Command;

    let out = Command::new("xdotool")
        .args(["getactivewindow", "getwindowname"])
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    let title = String::from_utf8_lossy(&out.stdout).trim().to_string();
    (!title.is_empty()).then_some(title)
}
