// In-memory map scene - models the rendering engine's marker, source, and
// layer lifecycle so the concrete map binding stays a thin adapter
use crate::application::render_surface::{BaseStyle, RenderSurface};
use crate::domain::device::{DeviceStatus, Position};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Mutex;

pub const TRAIL_LINE_ID: &str = "device-history";
pub const TRAIL_POINTS_ID: &str = "device-history-pts";
pub const TRAIL_LABELS_ID: &str = "device-history-pts-labels";

/// Every 5th trail point carries a timestamp label.
const LABEL_STRIDE: usize = 5;

const DEFAULT_CENTER: (f64, f64) = (25.7617, -80.1918);
const DEFAULT_ZOOM: f64 = 9.0;

/// Label-class layers every base style ships with; a style swap recreates
/// them with default visibility.
const STYLE_LABEL_LAYERS: [&str; 2] = ["place-labels", "road-labels"];

fn marker_color(status: DeviceStatus) -> &'static str {
    match status {
        DeviceStatus::Moving => "#22c55e",
        DeviceStatus::Idle => "#f59e0b",
        DeviceStatus::Offline => "#ef4444",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSnapshot {
    pub lat: f64,
    pub lng: f64,
    pub status: DeviceStatus,
    pub color: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LayerKind {
    Line,
    Circle,
    Symbol,
}

#[derive(Debug, Clone)]
struct Layer {
    id: String,
    kind: LayerKind,
    source: String,
    visible: bool,
}

struct SceneState {
    markers: BTreeMap<String, MarkerSnapshot>,
    sources: BTreeMap<String, Value>,
    layers: Vec<Layer>,
    base_style: BaseStyle,
    labels_visible: bool,
    center: (f64, f64),
    zoom: f64,
}

impl SceneState {
    fn new() -> Self {
        let mut state = Self {
            markers: BTreeMap::new(),
            sources: BTreeMap::new(),
            layers: Vec::new(),
            base_style: BaseStyle::Streets,
            labels_visible: true,
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
        };
        state.seed_style_layers();
        state
    }

    /// The base style's own label layers arrive visible; the stored
    /// preference is applied on top, which is exactly what has to happen
    /// again after every style swap.
    fn seed_style_layers(&mut self) {
        for id in STYLE_LABEL_LAYERS {
            self.layers.push(Layer {
                id: id.to_string(),
                kind: LayerKind::Symbol,
                source: "basemap".to_string(),
                visible: true,
            });
        }
        self.apply_label_visibility();
    }

    fn apply_label_visibility(&mut self) {
        for layer in &mut self.layers {
            if layer.kind == LayerKind::Symbol {
                layer.visible = self.labels_visible;
            }
        }
    }

    fn remove_overlay(&mut self, id: &str) {
        // Layer before source: the engine refuses to drop a source that
        // still backs a layer
        self.layers.retain(|layer| layer.id != id);
        self.sources.remove(id);
    }

    fn add_layer(&mut self, id: &str, kind: LayerKind, source: &str, visible: bool) {
        debug_assert!(self.sources.contains_key(source));
        self.layers.push(Layer {
            id: id.to_string(),
            kind,
            source: source.to_string(),
            visible,
        });
    }
}

pub struct MapScene {
    state: Mutex<SceneState>,
}

impl MapScene {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SceneState::new()),
        }
    }

    fn line_geojson(positions: &[Position]) -> Value {
        let coords: Vec<Value> = positions.iter().map(|p| json!([p.lng, p.lat])).collect();
        json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": { "type": "LineString", "coordinates": coords },
                "properties": {}
            }]
        })
    }

    fn points_geojson(positions: &[Position]) -> Value {
        let features: Vec<Value> = positions
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let label = if i % LABEL_STRIDE == 0 {
                    p.ts.map(|ts| ts.format("%H:%M:%S").to_string())
                        .unwrap_or_default()
                } else {
                    String::new()
                };
                json!({
                    "type": "Feature",
                    "geometry": { "type": "Point", "coordinates": [p.lng, p.lat] },
                    "properties": {
                        "ts": p.ts.map(|ts| ts.to_rfc3339()).unwrap_or_default(),
                        "speed": p.speed.unwrap_or(0.0),
                        "label": label
                    }
                })
            })
            .collect();
        json!({ "type": "FeatureCollection", "features": features })
    }

    // Snapshot accessors, used by the panel layer and by tests.

    pub fn marker(&self, id: &str) -> Option<MarkerSnapshot> {
        self.state.lock().unwrap().markers.get(id).cloned()
    }

    pub fn marker_count(&self) -> usize {
        self.state.lock().unwrap().markers.len()
    }

    pub fn layer_ids(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .layers
            .iter()
            .map(|l| l.id.clone())
            .collect()
    }

    pub fn has_source(&self, id: &str) -> bool {
        self.state.lock().unwrap().sources.contains_key(id)
    }

    pub fn source(&self, id: &str) -> Option<Value> {
        self.state.lock().unwrap().sources.get(id).cloned()
    }

    pub fn layer_visible(&self, id: &str) -> Option<bool> {
        self.state
            .lock()
            .unwrap()
            .layers
            .iter()
            .find(|l| l.id == id)
            .map(|l| l.visible)
    }

    pub fn center(&self) -> (f64, f64) {
        self.state.lock().unwrap().center
    }

    pub fn zoom(&self) -> f64 {
        self.state.lock().unwrap().zoom
    }

    pub fn base_style(&self) -> BaseStyle {
        self.state.lock().unwrap().base_style
    }
}

impl Default for MapScene {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderSurface for MapScene {
    fn upsert_marker(&self, id: &str, lat: f64, lng: f64, status: DeviceStatus) {
        let snapshot = MarkerSnapshot {
            lat,
            lng,
            status,
            color: marker_color(status),
        };
        // BTreeMap replacement keeps exactly one live marker per key
        self.state
            .lock()
            .unwrap()
            .markers
            .insert(id.to_string(), snapshot);
    }

    fn remove_marker(&self, id: &str) {
        self.state.lock().unwrap().markers.remove(id);
    }

    fn draw_history_trail(&self, positions: &[Position], with_labels: bool) {
        let mut state = self.state.lock().unwrap();

        for id in [TRAIL_LABELS_ID, TRAIL_POINTS_ID, TRAIL_LINE_ID] {
            state.remove_overlay(id);
        }

        // Source before its layer on the way in
        state
            .sources
            .insert(TRAIL_LINE_ID.to_string(), Self::line_geojson(positions));
        state.add_layer(TRAIL_LINE_ID, LayerKind::Line, TRAIL_LINE_ID, true);

        state
            .sources
            .insert(TRAIL_POINTS_ID.to_string(), Self::points_geojson(positions));
        state.add_layer(TRAIL_POINTS_ID, LayerKind::Circle, TRAIL_POINTS_ID, true);

        if with_labels {
            state.add_layer(TRAIL_LABELS_ID, LayerKind::Symbol, TRAIL_POINTS_ID, true);
        }
    }

    fn clear_history_trail(&self) {
        let mut state = self.state.lock().unwrap();
        for id in [TRAIL_LABELS_ID, TRAIL_POINTS_ID, TRAIL_LINE_ID] {
            state.remove_overlay(id);
        }
    }

    fn focus_on(&self, lat: f64, lng: f64, zoom: f64) {
        let mut state = self.state.lock().unwrap();
        state.center = (lat, lng);
        state.zoom = zoom;
    }

    fn set_label_visibility(&self, show: bool) {
        let mut state = self.state.lock().unwrap();
        state.labels_visible = show;
        state.apply_label_visibility();
    }

    fn set_base_style(&self, style: BaseStyle) {
        let mut state = self.state.lock().unwrap();
        if state.base_style == style {
            return;
        }
        tracing::debug!(?style, "swapping base style");

        // A style swap discards every overlay and layout override; markers
        // live outside the style and survive. Center/zoom and the label
        // preference are reapplied from stored state.
        state.base_style = style;
        state.layers.clear();
        state.sources.clear();
        state.seed_style_layers();
    }
}
