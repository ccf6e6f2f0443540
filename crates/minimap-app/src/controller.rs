//! Element lifecycle and the state shared with background tasks.
//!
//! The controller owns every piece of mutable session state. Inbound host
//! events mutate it through the handlers in [`crate::handlers`]; the
//! visibility and opacity tasks only read it, except for the visible flag
//! which the visibility task owns.

use std::sync::Arc;
use std::time::Duration;

use minimap_common::{BoundUpdate, ModeFlags, SessionContext};
use minimap_config::{ConfigStore, Configuration};
use minimap_host::{events, Dispatch, ElementDescriptor, EventRouter, HostClient, HostEvent};
use minimap_platform::ForegroundWatcher;
use serde_json::json;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::opacity::run_opacity_sync;
use crate::visibility::{run_visibility_loop, VisibilityTask};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Runtime options that do not live in the settings file.
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub topic: String,
    pub poll_interval: Duration,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            topic: "nwmp".into(),
            poll_interval: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Unregistered,
    Registering,
    Registered,
}

/// Observable element state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementState {
    Unregistered,
    /// "Add element" sent, host has not confirmed yet.
    Registering,
    Registered { visible: bool },
}

/// Why [`ElementController::run`] returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// The connection ended before the host ever accepted it.
    Refused(String),
    /// An established connection was lost.
    Lost(String),
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

pub struct ElementController {
    client: HostClient,
    store: ConfigStore,
    watcher: Arc<dyn ForegroundWatcher>,
    options: ControllerOptions,

    config: watch::Sender<Configuration>,
    mode: watch::Sender<ModeFlags>,
    elements: watch::Sender<usize>,
    visible: Arc<watch::Sender<bool>>,

    phase: Phase,
    ctx: Option<SessionContext>,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl ElementController {
    pub fn new(
        client: HostClient,
        store: ConfigStore,
        config: Configuration,
        watcher: Arc<dyn ForegroundWatcher>,
        options: ControllerOptions,
    ) -> Self {
        let (config, _) = watch::channel(config);
        let (mode, _) = watch::channel(ModeFlags::default());
        let (elements, _) = watch::channel(0usize);
        let (visible, _) = watch::channel(true);

        Self {
            client,
            store,
            watcher,
            options,
            config,
            mode,
            elements,
            visible: Arc::new(visible),
            phase: Phase::Unregistered,
            ctx: None,
            cancel: CancellationToken::new(),
            tasks: Vec::new(),
        }
    }

    pub fn state(&self) -> ElementState {
        match self.phase {
            Phase::Unregistered => ElementState::Unregistered,
            Phase::Registering => ElementState::Registering,
            Phase::Registered => ElementState::Registered {
                visible: *self.visible.borrow(),
            },
        }
    }

    pub fn config(&self) -> Configuration {
        self.config.borrow().clone()
    }

    pub fn mode(&self) -> ModeFlags {
        *self.mode.borrow()
    }

    pub fn element_count(&self) -> usize {
        *self.elements.borrow()
    }

    pub fn context(&self) -> Option<&SessionContext> {
        self.ctx.as_ref()
    }

    /// The element as it should currently look.
    pub fn descriptor(&self) -> ElementDescriptor {
        let config = self.config.borrow();
        ElementDescriptor::web_view(config.bound(), config.content_url())
    }

    // -- lifecycle --

    /// Register with the host after the connection is established.
    ///
    /// Resets the mirrored host state, emits the greeting, the topic
    /// registration and the element itself, then starts the background
    /// tasks. Both tasks hold off until the host confirms the element.
    pub async fn register(&mut self) {
        self.mode.send_replace(ModeFlags::default());
        self.elements.send_replace(0);
        self.visible.send_replace(true);

        let ctx = SessionContext::fresh(&self.options.topic);
        let descriptor = self.descriptor();
        info!(topic = %ctx, bound = %descriptor.bound, content = %descriptor.content, "Registering element");

        self.client
            .emit(events::ECHO, vec![json!("Hello World!")])
            .await;
        self.client
            .emit(events::REGISTER_TOPIC, vec![ctx.to_value()])
            .await;
        self.client
            .emit(events::ADD_ELEMENT, descriptor.args(&ctx))
            .await;

        self.phase = Phase::Registering;
        self.ctx = Some(ctx.clone());
        self.spawn_tasks(ctx);
    }

    fn spawn_tasks(&mut self, ctx: SessionContext) {
        let visibility = VisibilityTask {
            client: self.client.clone_sender(),
            ctx: ctx.clone(),
            watcher: Arc::clone(&self.watcher),
            interval: self.options.poll_interval,
            config: self.config.subscribe(),
            mode: self.mode.subscribe(),
            elements: self.elements.subscribe(),
            visible: Arc::clone(&self.visible),
            cancel: self.cancel.clone(),
        };
        self.tasks.push(tokio::spawn(run_visibility_loop(visibility)));

        let client = self.client.clone_sender();
        let config = self.config.subscribe();
        let elements = self.elements.subscribe();
        let cancel = self.cancel.clone();
        self.tasks.push(tokio::spawn(async move {
            run_opacity_sync(client, ctx, config, elements, cancel).await;
        }));
    }

    /// Stop the background tasks and wait for them to finish.
    pub async fn shutdown(&mut self) {
        self.cancel.cancel();
        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                warn!(error = %e, "Background task ended abnormally");
            }
        }
    }

    /// Drive the session until the connection ends.
    ///
    /// Inbound events are handled one at a time in arrival order. Replies
    /// from handlers are sent back when the host asked for an ack.
    pub async fn run(
        &mut self,
        router: &EventRouter<Self>,
        events: &mut mpsc::Receiver<HostEvent>,
    ) -> SessionEnd {
        while let Some(event) = events.recv().await {
            match event {
                HostEvent::Connected { sid } => {
                    info!(sid = %sid, "Host connection established");
                    self.register().await;
                }
                HostEvent::Message { name, args, ack } => {
                    let outcome = router.dispatch(self, &name, &args);
                    if let Some(id) = ack {
                        let reply = match outcome {
                            Dispatch::Handled(Some(value)) => vec![value],
                            _ => Vec::new(),
                        };
                        self.client.ack(id, reply).await;
                    }
                }
                HostEvent::Error(e) => warn!(error = %e, "Host connection error"),
                HostEvent::Disconnected { reason } => return self.end_session(reason).await,
            }
        }
        self.end_session("event stream closed".into()).await
    }

    async fn end_session(&mut self, reason: String) -> SessionEnd {
        self.shutdown().await;
        let end = if self.phase == Phase::Unregistered {
            SessionEnd::Refused(reason)
        } else {
            SessionEnd::Lost(reason)
        };
        self.phase = Phase::Unregistered;
        end
    }

    // -- mutations driven by host events --

    pub(crate) fn element_added(&mut self) {
        self.elements.send_modify(|n| *n += 1);
        let count = self.element_count();
        if self.phase == Phase::Registering {
            self.phase = Phase::Registered;
            info!(count, "Element registered");
        } else {
            debug!(count, "Element added");
        }
    }

    pub(crate) fn element_removed(&mut self) {
        self.elements.send_modify(|n| *n = n.saturating_sub(1));
        debug!(count = self.element_count(), "Element removed");
    }

    pub(crate) fn apply_bound(&mut self, update: &BoundUpdate) {
        let next = self.config.borrow().with_bound(update);
        info!(bound = %next.bound(), "Bound updated by host");
        self.commit(next);
    }

    pub(crate) fn apply_opacity(&mut self, opacity: f64) {
        let next = self.config.borrow().with_opacity(opacity);
        info!(opacity = next.opacity, "Opacity updated by host");
        self.commit(next);
    }

    pub(crate) fn set_mode(&mut self, flags: ModeFlags) {
        debug!(lock = flags.lock, moving = flags.moving, dev = flags.dev, "Mode flags");
        self.mode.send_replace(flags);
    }

    /// Publish `next` and persist it. A failed write leaves the in-memory
    /// value authoritative; the next mutation writes again.
    fn commit(&mut self, next: Configuration) {
        if let Err(e) = self.store.save(&next) {
            error!(path = %self.store.path().display(), "Failed to persist settings: {e}");
        }
        self.config.send_replace(next);
    }
}

/// Resolve once the host reports at least one element, or `false` if
/// `cancel` fires first.
pub(crate) async fn wait_for_element(
    elements: &mut watch::Receiver<usize>,
    cancel: &CancellationToken,
) -> bool {
    loop {
        if *elements.borrow_and_update() >= 1 {
            return true;
        }
        tokio::select! {
            changed = elements.changed() => {
                if changed.is_err() {
                    return false;
                }
            }
            _ = cancel.cancelled() => return false,
        }
    }
}
