mod cli;
mod controller;
mod handlers;
mod opacity;
#[cfg(test)]
mod test_support;
mod visibility;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use minimap_common::MinimapError;
use minimap_config::ConfigStore;
use minimap_host::{HostClient, HostConfig, HostEvent};
use minimap_platform::TitleWatcher;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use crate::controller::{ControllerOptions, ElementController, SessionEnd};

const DEFAULT_LOG_DIRECTIVE: &str = "minimap=info";
const EXIT_STARTUP_FAILURE: u8 = 1;
const EXIT_DISCONNECTED: u8 = 2;
const DISCONNECT_GRACE: Duration = Duration::from_secs(2);

fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        eprintln!("\n--- minimap crashed ---");
        eprintln!("{info}");
        eprintln!("Run with --log-level minimap=debug and include the log when reporting.");
        eprintln!("-----------------------\n");

        default_hook(info);
    }));
}

fn init_logging(directive: Option<&str>) {
    let directive = directive.unwrap_or(DEFAULT_LOG_DIRECTIVE);
    let mut filter = EnvFilter::from_default_env();
    match directive.parse() {
        Ok(d) => filter = filter.add_directive(d),
        Err(e) => {
            eprintln!("ignoring invalid log level {directive:?}: {e}");
            if let Ok(d) = DEFAULT_LOG_DIRECTIVE.parse() {
                filter = filter.add_directive(d);
            }
        }
    }
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> ExitCode {
    install_panic_hook();

    let args = cli::parse();
    init_logging(args.log_level.as_deref());

    tracing::info!("minimap v{} starting...", env!("CARGO_PKG_VERSION"));

    let port = match resolve_port(args.port) {
        Ok(port) => port,
        Err(e) => return startup_failure(e, args.pause_on_error).await,
    };

    let store = ConfigStore::new(&args.settings);
    let config = store.load();
    tracing::info!(
        path = %store.path().display(),
        bound = %config.bound(),
        opacity = config.opacity,
        "Settings loaded"
    );

    let (client, mut events) = HostClient::connect(HostConfig::local(port));
    let watcher = Arc::new(TitleWatcher::new(args.target_window.clone()));
    let options = ControllerOptions {
        topic: args.topic.clone(),
        poll_interval: Duration::from_millis(args.poll_interval_ms),
    };
    let mut controller =
        ElementController::new(client.clone_sender(), store, config, watcher, options);
    let router = handlers::build_router();

    let outcome = tokio::select! {
        end = controller.run(&router, &mut events) => Some(end),
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                tracing::warn!("Failed to listen for Ctrl-C: {e}");
            }
            None
        }
    };

    controller.shutdown().await;
    tracing::debug!(
        state = ?controller.state(),
        mode = ?controller.mode(),
        elements = controller.element_count(),
        opacity = controller.config().opacity,
        ctx = ?controller.context(),
        "Session state at exit"
    );

    match outcome {
        None => {
            tracing::info!("Interrupted, shutting down");
            if !close_connection(&client, &mut events, DISCONNECT_GRACE).await {
                tracing::warn!("Host connection did not close in time");
            }
            ExitCode::SUCCESS
        }
        Some(SessionEnd::Refused(reason)) => {
            let err = MinimapError::Other(format!(
                "could not connect to host on port {port}: {reason}"
            ));
            startup_failure(err, args.pause_on_error).await
        }
        Some(SessionEnd::Lost(reason)) => {
            tracing::error!("Host disconnected: {reason}");
            ExitCode::from(EXIT_DISCONNECTED)
        }
    }
}

/// Explicit `--port`, else whatever the host advertised in `api.json`.
fn resolve_port(port: Option<u16>) -> minimap_common::Result<u16> {
    match port {
        Some(port) => Ok(port),
        None => Ok(minimap_platform::discover()?.port),
    }
}

/// Ask the connection task to close and wait up to `grace` for it to
/// report `Disconnected`. Returns false on timeout.
async fn close_connection(
    client: &HostClient,
    events: &mut mpsc::Receiver<HostEvent>,
    grace: Duration,
) -> bool {
    client.disconnect().await;
    let closed = async {
        while let Some(event) = events.recv().await {
            if let HostEvent::Disconnected { reason } = event {
                tracing::debug!(reason = %reason, "Host connection closed");
                return;
            }
        }
    };
    tokio::time::timeout(grace, closed).await.is_ok()
}

async fn startup_failure(err: MinimapError, pause: bool) -> ExitCode {
    tracing::error!("Startup failed: {err}");
    eprintln!("minimap: {err}");

    if pause {
        eprintln!("Press Enter to exit.");
        let _ = tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            std::io::stdin().read_line(&mut line)
        })
        .await;
    }

    ExitCode::from(EXIT_STARTUP_FAILURE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use minimap_host::HostCommand;
    use serde_json::json;

    #[tokio::test]
    async fn close_waits_for_disconnected() {
        let (client, mut commands) = HostClient::detached();
        let (event_tx, mut events) = mpsc::channel(8);

        let host = tokio::spawn(async move {
            while let Some(cmd) = commands.recv().await {
                if cmd == HostCommand::Disconnect {
                    let stray = HostEvent::Message {
                        name: "notify".into(),
                        args: vec![json!("bye")],
                        ack: None,
                    };
                    event_tx.send(stray).await.unwrap();
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    event_tx
                        .send(HostEvent::Disconnected {
                            reason: "client disconnect".into(),
                        })
                        .await
                        .unwrap();
                    return true;
                }
            }
            false
        });

        assert!(close_connection(&client, &mut events, Duration::from_secs(5)).await);
        assert!(host.await.unwrap());
    }

    #[tokio::test]
    async fn close_gives_up_after_grace() {
        let (client, mut commands) = HostClient::detached();
        let (_event_tx, mut events) = mpsc::channel::<HostEvent>(8);

        let started = std::time::Instant::now();
        assert!(!close_connection(&client, &mut events, Duration::from_millis(100)).await);
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(commands.recv().await, Some(HostCommand::Disconnect));
    }

    #[tokio::test]
    async fn close_returns_when_events_end() {
        let (client, _commands) = HostClient::detached();
        let (event_tx, mut events) = mpsc::channel::<HostEvent>(8);
        drop(event_tx);

        // Channel closed without a Disconnected event: nothing to wait for,
        // so the wait finishes before the grace period.
        assert!(close_connection(&client, &mut events, Duration::from_secs(5)).await);
    }
}
