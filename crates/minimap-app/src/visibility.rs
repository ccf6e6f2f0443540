//! Show or hide the overlay as the target window gains or loses focus.

use std::sync::Arc;
use std::time::Duration;

use minimap_common::{ModeFlags, SessionContext};
use minimap_config::Configuration;
use minimap_host::{events, ElementDescriptor, HostClient};
use minimap_platform::ForegroundWatcher;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::controller::wait_for_element;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Show,
    Hide,
    /// Leave the element as it is.
    Hold,
}

/// The target window in front always shows the overlay. Otherwise it is
/// hidden only while the host UI is locked and idle and debug is off.
pub fn evaluate(foreground: bool, flags: ModeFlags, debug: bool) -> Decision {
    if foreground {
        Decision::Show
    } else if flags.is_locked_idle() && !debug {
        Decision::Hide
    } else {
        Decision::Hold
    }
}

/// Everything the loop needs, moved into its task.
pub struct VisibilityTask {
    pub client: HostClient,
    pub ctx: SessionContext,
    pub watcher: Arc<dyn ForegroundWatcher>,
    pub interval: Duration,
    pub config: watch::Receiver<Configuration>,
    pub mode: watch::Receiver<ModeFlags>,
    pub elements: watch::Receiver<usize>,
    pub visible: Arc<watch::Sender<bool>>,
    pub cancel: CancellationToken,
}

pub async fn run_visibility_loop(mut task: VisibilityTask) {
    if !wait_for_element(&mut task.elements, &task.cancel).await {
        debug!("Visibility loop cancelled before the element existed");
        return;
    }
    info!(interval_ms = task.interval.as_millis() as u64, "Visibility loop started");

    let mut ticker = tokio::time::interval(task.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = task.cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let watcher = Arc::clone(&task.watcher);
        let foreground = match tokio::task::spawn_blocking(move || watcher.is_target_foreground()).await {
            Ok(foreground) => foreground,
            Err(e) => {
                warn!(error = %e, "Foreground query failed");
                continue;
            }
        };

        let flags = *task.mode.borrow();
        let (debug_mode, descriptor) = {
            let config = task.config.borrow();
            (
                config.debug,
                ElementDescriptor::web_view(config.bound(), config.content_url()),
            )
        };
        let shown = *task.visible.borrow();

        match (evaluate(foreground, flags, debug_mode), shown) {
            (Decision::Show, false) => {
                debug!("Target focused, showing element");
                task.client
                    .emit(events::SHOW_ELEMENT, descriptor.args(&task.ctx))
                    .await;
                task.visible.send_replace(true);
            }
            (Decision::Hide, true) => {
                debug!("Target lost focus, hiding element");
                task.client
                    .emit(events::HIDE_ELEMENT, descriptor.args(&task.ctx))
                    .await;
                task.visible.send_replace(false);
            }
            _ => {}
        }
    }

    debug!("Visibility loop stopped");
}
