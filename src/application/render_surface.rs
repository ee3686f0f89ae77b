// Render surface seam - the map binding lives behind this trait
use crate::domain::device::{DeviceStatus, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BaseStyle {
    #[default]
    Streets,
    Satellite,
}

/// Abstract map surface. Implementations own the marker/source/layer
/// lifecycle; callers only express intent.
pub trait RenderSurface: Send + Sync {
    /// Create-or-move the single marker for a key. The surface must never
    /// end up holding two live markers for the same key.
    fn upsert_marker(&self, id: &str, lat: f64, lng: f64, status: DeviceStatus);

    /// No-op when the key has no marker.
    fn remove_marker(&self, id: &str);

    /// Replace the history trail overlay. Idempotent: a second call leaves
    /// exactly one line layer and one point layer under the fixed ids.
    fn draw_history_trail(&self, positions: &[Position], with_labels: bool);

    fn clear_history_trail(&self);

    /// Best-effort viewport move; the engine may already be mid-animation.
    fn focus_on(&self, lat: f64, lng: f64, zoom: f64);

    /// Toggle all label-class layers. Surfaces must reapply this after a
    /// full style swap, which discards layout overrides.
    fn set_label_visibility(&self, show: bool);

    /// Swap the base style; a no-op when already on the requested style.
    fn set_base_style(&self, style: BaseStyle);
}
