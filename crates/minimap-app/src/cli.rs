use std::path::PathBuf;

use clap::Parser;

/// Minimap overlay for New World, hosted inside the electron-spirit overlay.
#[derive(Parser, Debug)]
#[command(name = "minimap", version, about)]
pub struct Args {
    /// Host API port. Skips reading the host's `api.json`.
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// Settings file path.
    #[arg(long, default_value = minimap_config::SETTINGS_FILE)]
    pub settings: PathBuf,

    /// Title of the window that keeps the overlay visible.
    #[arg(long, default_value = "New World")]
    pub target_window: String,

    /// Topic the element is registered under.
    #[arg(long, default_value = "nwmp")]
    pub topic: String,

    /// Foreground poll interval in milliseconds.
    #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u64).range(1..))]
    pub poll_interval_ms: u64,

    /// Log level override (e.g. `minimap=debug`).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Wait for Enter before exiting after a startup failure.
    #[arg(long)]
    pub pause_on_error: bool,
}

pub fn parse() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["minimap"]).unwrap();
        assert_eq!(args.port, None);
        assert_eq!(args.settings, PathBuf::from("plugin.setting.json"));
        assert_eq!(args.target_window, "New World");
        assert_eq!(args.topic, "nwmp");
        assert_eq!(args.poll_interval_ms, 100);
        assert!(args.log_level.is_none());
        assert!(!args.pause_on_error);
    }

    #[test]
    fn overrides() {
        let args = Args::try_parse_from([
            "minimap",
            "--port",
            "5000",
            "--settings",
            "cfg/minimap.json",
            "--target-window",
            "Other Game",
            "--poll-interval-ms",
            "250",
            "--pause-on-error",
        ])
        .unwrap();
        assert_eq!(args.port, Some(5000));
        assert_eq!(args.settings, PathBuf::from("cfg/minimap.json"));
        assert_eq!(args.target_window, "Other Game");
        assert_eq!(args.poll_interval_ms, 250);
        assert!(args.pause_on_error);
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        assert!(Args::try_parse_from(["minimap", "--poll-interval-ms", "0"]).is_err());
    }
}
