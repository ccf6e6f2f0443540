//! Push the persisted opacity once the host has created the element.

use minimap_common::SessionContext;
use minimap_config::Configuration;
use minimap_host::{events, opacity_args, HostClient, ELEMENT_KEY};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::controller::wait_for_element;

/// Returns whether `set_opacity` was sent.
pub async fn run_opacity_sync(
    client: HostClient,
    ctx: SessionContext,
    config: watch::Receiver<Configuration>,
    mut elements: watch::Receiver<usize>,
    cancel: CancellationToken,
) -> bool {
    if !wait_for_element(&mut elements, &cancel).await {
        debug!("Opacity sync cancelled before the element existed");
        return false;
    }

    let opacity = config.borrow().opacity;
    info!(opacity, "Applying saved opacity");
    client
        .emit(events::SET_OPACITY, opacity_args(&ctx, ELEMENT_KEY, opacity))
        .await;
    true
}
