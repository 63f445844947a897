//! Metrics collection.
//!
//! # Metrics
//! - `hashview_renders_total` (counter): UI updates by component and visibility
//! - `hashview_route_changes_total` (counter): committed fragment changes
//! - `hashview_compile_failures_total` (counter): template sources rejected
//! - `hashview_handler_dispatch_total` (counter): handler invocations by component
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; without an installed recorder
//!   every call is a no-op
//! - Labels are component names only, never state values

pub fn record_render(component: &str, visible: bool) {
    metrics::counter!(
        "hashview_renders_total",
        "component" => component.to_string(),
        "visible" => if visible { "true" } else { "false" }
    )
    .increment(1);
}

pub fn record_route_change() {
    metrics::counter!("hashview_route_changes_total").increment(1);
}

pub fn record_compile_failure() {
    metrics::counter!("hashview_compile_failures_total").increment(1);
}

pub fn record_dispatch(component: &str) {
    metrics::counter!(
        "hashview_handler_dispatch_total",
        "component" => component.to_string()
    )
    .increment(1);
}
