//! Inbound host event handlers.

use minimap_host::protocol::{
    parse_bound_update, parse_key, parse_mode_flags, parse_opacity_update,
};
use minimap_host::{events, EventRouter, HandlerResult, ELEMENT_KEY};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::controller::ElementController;

/// Router with every host event the controller understands.
pub fn build_router() -> EventRouter<ElementController> {
    let mut router = EventRouter::new()
        .on(events::ELEMENT_ADDED, on_element_added)
        .on(events::ELEMENT_REMOVED, on_element_removed)
        .on(events::UPDATE_BOUND, on_update_bound)
        .on(events::UPDATE_OPACITY, on_update_opacity)
        .on(events::MODE_FLAG, on_mode_flag)
        .on(events::ELEM_REMOVE, on_veto)
        .on(events::ELEM_REFRESH, on_veto);

    for &name in events::INFORMATIONAL {
        router = router.on(name, move |_: &mut ElementController, args: &[Value]| {
            let args = Value::from(args.to_vec());
            info!(event = name, args = %args, "Host event");
            Ok(None)
        });
    }

    router
}

fn on_element_added(c: &mut ElementController, args: &[Value]) -> HandlerResult {
    debug!(args = ?args, "update_elem");
    c.element_added();
    Ok(None)
}

fn on_element_removed(c: &mut ElementController, args: &[Value]) -> HandlerResult {
    debug!(args = ?args, "remove_elem");
    c.element_removed();
    Ok(None)
}

fn on_update_bound(c: &mut ElementController, args: &[Value]) -> HandlerResult {
    let (key, update) = parse_bound_update(args)?;
    if key != ELEMENT_KEY {
        debug!(key = %key, "Bound update for another element");
        return Ok(None);
    }
    c.apply_bound(&update);
    Ok(None)
}

fn on_update_opacity(c: &mut ElementController, args: &[Value]) -> HandlerResult {
    let (key, opacity) = parse_opacity_update(args)?;
    if key != ELEMENT_KEY {
        debug!(key = %key, "Opacity update for another element");
        return Ok(None);
    }
    c.apply_opacity(opacity);
    Ok(None)
}

fn on_mode_flag(c: &mut ElementController, args: &[Value]) -> HandlerResult {
    c.set_mode(parse_mode_flags(args)?);
    Ok(None)
}

/// The host asks before removing or refreshing an element. `true` refuses
/// for our element; other elements are not our business.
fn on_veto(_: &mut ElementController, args: &[Value]) -> HandlerResult {
    let key = parse_key(args, 0)?;
    let veto = key == ELEMENT_KEY;
    info!(key = %key, veto, "Host asked to remove or refresh element");
    Ok(Some(json!(veto)))
}
