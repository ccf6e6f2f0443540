//! OS-facing collaborators: foreground window identity and host discovery.

pub mod discovery;
pub mod foreground;

pub use discovery::{api_file_path, discover, read_endpoint, HostEndpoint, API_FILE, HOST_APP_NAME};
pub use foreground::{foreground_window_title, ForegroundWatcher, TitleWatcher};
