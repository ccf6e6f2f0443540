//! Shared fixtures for unit tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use minimap_config::{ConfigStore, Configuration};
use minimap_host::{HostClient, HostCommand};
use minimap_platform::ForegroundWatcher;
use tokio::sync::mpsc;

use crate::controller::{ControllerOptions, ElementController};

/// Watcher whose answer the test flips by hand.
pub struct FakeWatcher {
    foreground: AtomicBool,
}

impl FakeWatcher {
    pub fn new(foreground: bool) -> Arc<Self> {
        Arc::new(Self {
            foreground: AtomicBool::new(foreground),
        })
    }

    pub fn set(&self, foreground: bool) {
        self.foreground.store(foreground, Ordering::SeqCst);
    }
}

impl ForegroundWatcher for FakeWatcher {
    fn is_target_foreground(&self) -> bool {
        self.foreground.load(Ordering::SeqCst)
    }
}

pub struct Harness {
    pub controller: ElementController,
    pub commands: mpsc::UnboundedReceiver<HostCommand>,
    pub watcher: Arc<FakeWatcher>,
    pub store: ConfigStore,
    pub dir: tempfile::TempDir,
}

/// Controller on a detached client with settings in a temp dir.
pub fn harness(foreground: bool) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let store = ConfigStore::new(dir.path().join("plugin.setting.json"));
    let (client, commands) = HostClient::detached();
    let watcher = FakeWatcher::new(foreground);
    let controller = ElementController::new(
        client,
        store.clone(),
        Configuration::default(),
        watcher.clone(),
        ControllerOptions {
            topic: "nwmp".into(),
            poll_interval: Duration::from_millis(5),
        },
    );
    Harness {
        controller,
        commands,
        watcher,
        store,
        dir,
    }
}

/// Everything queued so far, without waiting.
pub fn drain(rx: &mut mpsc::UnboundedReceiver<HostCommand>) -> Vec<HostCommand> {
    let mut out = Vec::new();
    while let Ok(cmd) = rx.try_recv() {
        out.push(cmd);
    }
    out
}

/// Next emitted event name, or `None` if nothing arrives within `wait`.
pub async fn next_emit(
    rx: &mut mpsc::UnboundedReceiver<HostCommand>,
    wait: Duration,
) -> Option<String> {
    loop {
        match tokio::time::timeout(wait, rx.recv()).await {
            Ok(Some(HostCommand::Emit { event, .. })) => return Some(event),
            Ok(Some(_)) => continue,
            Ok(None) | Err(_) => return None,
        }
    }
}
