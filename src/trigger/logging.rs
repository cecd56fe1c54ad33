//! Log output for trigger transitions.

use super::{RejectReason, TriggerEvent};
use crate::common::utils::format_distance;

/// Log the appropriate message for a trigger event.
///
/// `debug_enabled` adds the quiet events (rejections, unchanged samples).
pub fn log_trigger_event(event: &TriggerEvent, debug_enabled: bool) {
    match event {
        TriggerEvent::None => {
            // Nothing to report for an unchanged position
        }
        TriggerEvent::Armed => {
            log_block_start!("Geofence armed, waiting for the first location fix");
        }
        TriggerEvent::Disarmed => {
            log_block_start!("Geofence disarmed");
        }
        TriggerEvent::Suspended => {
            log_block_start!("Geofencing disabled, ignoring location samples");
        }
        TriggerEvent::Outside { distance_m } => {
            log_block_start!("Away from home ({} from home)", format_distance(*distance_m));
        }
        TriggerEvent::EnteredHome { distance_m } => {
            log_block_start!("Arrived home ({} from home)", format_distance(*distance_m));
        }
        TriggerEvent::LeftHome { distance_m } => {
            log_block_start!("Left home ({} from home)", format_distance(*distance_m));
        }
        TriggerEvent::Unavailable(error) => {
            log_pipe!();
            log_warning!("Geofence unavailable: {error}");
            log_indented!("Keeping the last known state until the next fix");
        }
        TriggerEvent::Rejected(reason) => {
            if debug_enabled {
                log_pipe!();
                log_debug!("Ignored sample: {}", describe_reason(reason));
            }
        }
    }
}

fn describe_reason(reason: &RejectReason) -> String {
    match reason {
        RejectReason::NotArmed => "geofence is not armed".to_string(),
        RejectReason::Disabled => "geofencing is disabled".to_string(),
        RejectReason::StaleGeneration {
            generation,
            current,
        } => format!("from sampler run {generation}, current run is {current}"),
        RejectReason::OutOfOrder => "older than the last applied sample".to_string(),
        RejectReason::Inaccurate {
            accuracy_m,
            limit_m,
        } => format!(
            "accuracy {} exceeds the {} limit",
            format_distance(*accuracy_m),
            format_distance(*limit_m)
        ),
    }
}
