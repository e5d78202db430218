//! Layer rendering and lifecycle
//!
//! [`LayerRenderer`] turns an enriched region set into one visual layer on a
//! [`MapBackend`], and owns the layer lifecycle after that: dim, restore,
//! label toggling, and idempotent removal.
//!
//! # Event Wiring
//!
//! Callbacks are an explicit registration table ([`FeatureCallbacks`])
//! passed in at render time; there is no ambient global hook object. The
//! embedding UI forwards user input through `dispatch_click` /
//! `dispatch_hover` / `dispatch_hover_exit`; programmatic style changes
//! (dim, restore) never fire callbacks.
//!
//! Hover pairs always balance: every hover-enter eventually produces a
//! hover-exit, and removing a layer mid-hover synthesizes the exit before
//! the layer detaches.
//!
//! Callbacks are invoked outside the renderer's internal lock; they must be
//! cheap and must not block (the controller's callbacks forward events to a
//! channel).

mod backend;
mod style;

pub use backend::{FeatureSpec, LayerSpec, MapBackend, RenderError, RenderedLayerHandle};
pub use style::{dimmed, style_for, DimFactors, FeatureStyle, StylePalette};

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::region::{Region, RegionCode};

/// A feature event callback, shared so it can be invoked outside the lock.
pub type FeatureCallback = Arc<dyn Fn(&Region) + Send + Sync>;

/// Callback registration table for one layer.
#[derive(Default, Clone)]
pub struct FeatureCallbacks {
    /// Fired once per user click on a feature.
    pub on_click: Option<FeatureCallback>,
    /// Fired when the pointer enters a feature.
    pub on_hover: Option<FeatureCallback>,
    /// Fired when the pointer leaves a feature (or the layer is removed
    /// mid-hover).
    pub on_hover_exit: Option<FeatureCallback>,
}

/// Per-layer state the renderer retains after handing the layer to the
/// backend.
struct LayerState {
    regions: Arc<Vec<Region>>,
    callbacks: FeatureCallbacks,
    /// Undimmed styles, kept for restore.
    base_styles: Vec<(RegionCode, FeatureStyle)>,
    dimmed: bool,
    hovered: Option<RegionCode>,
}

/// Renders enriched region sets and manages layer lifecycle.
pub struct LayerRenderer {
    backend: Arc<dyn MapBackend>,
    dim_factors: DimFactors,
    layers: Mutex<HashMap<u64, LayerState>>,
    next_id: AtomicU64,
}

impl LayerRenderer {
    /// Create a renderer over the given backend.
    pub fn new(backend: Arc<dyn MapBackend>, dim_factors: DimFactors) -> Self {
        Self {
            backend,
            dim_factors,
            layers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Render one region set as a new layer.
    ///
    /// Each region becomes one feature; style is computed per-feature by
    /// `style_fn`; labels combine name and child count. On backend failure
    /// nothing is retained and no handle is issued.
    pub fn render<F>(
        &self,
        regions: Arc<Vec<Region>>,
        style_fn: F,
        callbacks: FeatureCallbacks,
        labels_visible: bool,
    ) -> Result<RenderedLayerHandle, RenderError>
    where
        F: Fn(&Region) -> FeatureStyle,
    {
        let handle = RenderedLayerHandle(self.next_id.fetch_add(1, Ordering::Relaxed));

        let features: Vec<FeatureSpec> = regions
            .iter()
            .map(|region| FeatureSpec {
                code: region.code.clone(),
                name: region.name.clone(),
                geometry: region.geometry.clone(),
                style: style_fn(region),
                label: format!("{} ({})", region.name, region.child_count),
            })
            .collect();

        let level = regions
            .first()
            .map(|r| r.level)
            .unwrap_or(crate::region::Level::District);

        let base_styles: Vec<(RegionCode, FeatureStyle)> = features
            .iter()
            .map(|f| (f.code.clone(), f.style.clone()))
            .collect();

        let spec = LayerSpec {
            id: handle,
            level,
            features,
            labels_visible,
        };
        self.backend.add_layer(&spec)?;

        self.layers.lock().insert(
            handle.0,
            LayerState {
                regions,
                callbacks,
                base_styles,
                dimmed: false,
                hovered: None,
            },
        );

        debug!(handle = %handle, features = spec.features.len(), "Layer rendered");
        Ok(handle)
    }

    /// Fade a layer to show it as ancestor context.
    ///
    /// Keeps the layer attached; [`LayerRenderer::restore`] reverses it from
    /// retained styles without refetching anything.
    pub fn dim(&self, handle: RenderedLayerHandle) -> Result<(), RenderError> {
        let styles = {
            let layers = self.layers.lock();
            let state = layers
                .get(&handle.0)
                .ok_or(RenderError::UnknownLayer(handle))?;
            if state.dimmed {
                return Ok(());
            }
            state
                .base_styles
                .iter()
                .map(|(code, style)| (code.clone(), dimmed(style, &self.dim_factors)))
                .collect::<Vec<_>>()
        };
        self.backend.set_feature_styles(handle, &styles)?;
        // Mark dimmed only once the backend has accepted the restyle.
        if let Some(state) = self.layers.lock().get_mut(&handle.0) {
            state.dimmed = true;
        }
        Ok(())
    }

    /// Restore a dimmed layer to its original styles.
    pub fn restore(&self, handle: RenderedLayerHandle) -> Result<(), RenderError> {
        let styles = {
            let layers = self.layers.lock();
            let state = layers
                .get(&handle.0)
                .ok_or(RenderError::UnknownLayer(handle))?;
            if !state.dimmed {
                return Ok(());
            }
            state.base_styles.clone()
        };
        self.backend.set_feature_styles(handle, &styles)?;
        if let Some(state) = self.layers.lock().get_mut(&handle.0) {
            state.dimmed = false;
        }
        Ok(())
    }

    /// Detach a layer from the view.
    ///
    /// Idempotent: removing an unknown or already-removed handle is a no-op.
    /// If the layer is removed mid-hover, the balancing hover-exit fires
    /// first.
    pub fn remove(&self, handle: RenderedLayerHandle) -> Result<(), RenderError> {
        let state = match self.layers.lock().remove(&handle.0) {
            Some(state) => state,
            None => return Ok(()),
        };

        if let Some(code) = &state.hovered {
            fire(&state.callbacks.on_hover_exit, &state.regions, code);
        }

        self.backend.remove_layer(handle)?;
        debug!(handle = %handle, "Layer removed");
        Ok(())
    }

    /// Toggle permanent labels for a layer.
    pub fn set_labels_visible(
        &self,
        handle: RenderedLayerHandle,
        visible: bool,
    ) -> Result<(), RenderError> {
        if !self.layers.lock().contains_key(&handle.0) {
            return Err(RenderError::UnknownLayer(handle));
        }
        self.backend.set_label_visibility(handle, visible)
    }

    /// Forward a user click on a feature to the layer's click callback.
    pub fn dispatch_click(&self, handle: RenderedLayerHandle, code: &RegionCode) {
        let (callback, regions) = {
            let layers = self.layers.lock();
            match layers.get(&handle.0) {
                Some(state) => (state.callbacks.on_click.clone(), Arc::clone(&state.regions)),
                None => {
                    warn!(handle = %handle, code = %code, "Click on unknown layer");
                    return;
                }
            }
        };
        fire(&callback, &regions, code);
    }

    /// Forward a hover-enter. Re-hovering the current feature is a no-op;
    /// moving between features fires the exit for the previous one first.
    pub fn dispatch_hover(&self, handle: RenderedLayerHandle, code: &RegionCode) {
        let (callbacks, regions, previous) = {
            let mut layers = self.layers.lock();
            let state = match layers.get_mut(&handle.0) {
                Some(state) => state,
                None => return,
            };
            if state.hovered.as_ref() == Some(code) {
                return;
            }
            let previous = state.hovered.replace(code.clone());
            (
                state.callbacks.clone(),
                Arc::clone(&state.regions),
                previous,
            )
        };

        if let Some(previous) = previous {
            fire(&callbacks.on_hover_exit, &regions, &previous);
        }
        fire(&callbacks.on_hover, &regions, code);
    }

    /// Forward a hover-exit for the currently hovered feature.
    pub fn dispatch_hover_exit(&self, handle: RenderedLayerHandle) {
        let fired = {
            let mut layers = self.layers.lock();
            let state = match layers.get_mut(&handle.0) {
                Some(state) => state,
                None => return,
            };
            state
                .hovered
                .take()
                .map(|code| (state.callbacks.clone(), Arc::clone(&state.regions), code))
        };
        if let Some((callbacks, regions, code)) = fired {
            fire(&callbacks.on_hover_exit, &regions, &code);
        }
    }

    /// Number of layers currently attached.
    pub fn layer_count(&self) -> usize {
        self.layers.lock().len()
    }

    /// Whether a layer is currently dimmed.
    pub fn is_dimmed(&self, handle: RenderedLayerHandle) -> Option<bool> {
        self.layers.lock().get(&handle.0).map(|s| s.dimmed)
    }
}

/// Invoke a callback with the region for `code`, if both exist.
fn fire(callback: &Option<FeatureCallback>, regions: &[Region], code: &RegionCode) {
    if let Some(callback) = callback {
        match regions.iter().find(|r| &r.code == code) {
            Some(region) => callback(region),
            None => warn!(code = %code, "Event for feature not present in layer"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::{Geometry, Level};
    use parking_lot::Mutex as PlMutex;

    /// Records every backend call for assertions.
    #[derive(Default)]
    struct RecordingBackend {
        calls: PlMutex<Vec<String>>,
        fail_add: bool,
        fail_style: bool,
    }

    impl RecordingBackend {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }
    }

    impl MapBackend for RecordingBackend {
        fn add_layer(&self, layer: &LayerSpec) -> Result<(), RenderError> {
            if self.fail_add {
                return Err(RenderError::Backend("add rejected".to_string()));
            }
            self.calls
                .lock()
                .push(format!("add:{}:{}", layer.id, layer.features.len()));
            Ok(())
        }

        fn remove_layer(&self, id: RenderedLayerHandle) -> Result<(), RenderError> {
            self.calls.lock().push(format!("remove:{id}"));
            Ok(())
        }

        fn set_feature_styles(
            &self,
            id: RenderedLayerHandle,
            styles: &[(RegionCode, FeatureStyle)],
        ) -> Result<(), RenderError> {
            if self.fail_style {
                return Err(RenderError::Backend("restyle rejected".to_string()));
            }
            self.calls
                .lock()
                .push(format!("style:{id}:{}", styles.len()));
            Ok(())
        }

        fn set_label_visibility(
            &self,
            id: RenderedLayerHandle,
            visible: bool,
        ) -> Result<(), RenderError> {
            self.calls.lock().push(format!("labels:{id}:{visible}"));
            Ok(())
        }
    }

    fn regions(codes: &[&str]) -> Arc<Vec<Region>> {
        Arc::new(
            codes
                .iter()
                .map(|code| Region {
                    level: Level::Subdistrict,
                    code: RegionCode::new(code),
                    parent_code: Some(RegionCode::new("10")),
                    name: format!("Region {code}"),
                    geometry: Geometry::Polygon(vec![vec![
                        [0.0, 0.0],
                        [1.0, 0.0],
                        [1.0, 1.0],
                        [0.0, 0.0],
                    ]]),
                    child_count: 0,
                    is_active: true,
                })
                .collect(),
        )
    }

    fn plain_style(_: &Region) -> FeatureStyle {
        StylePalette::default().none.clone()
    }

    fn renderer() -> (Arc<RecordingBackend>, LayerRenderer) {
        let backend = Arc::new(RecordingBackend::default());
        let renderer = LayerRenderer::new(
            Arc::clone(&backend) as Arc<dyn MapBackend>,
            DimFactors::default(),
        );
        (backend, renderer)
    }

    #[test]
    fn test_render_adds_one_feature_per_region() {
        let (backend, renderer) = renderer();
        let handle = renderer
            .render(
                regions(&["S1", "S2", "S3"]),
                plain_style,
                FeatureCallbacks::default(),
                true,
            )
            .unwrap();

        assert_eq!(backend.calls(), vec![format!("add:{handle}:3")]);
        assert_eq!(renderer.layer_count(), 1);
    }

    #[test]
    fn test_render_failure_retains_nothing() {
        let backend = Arc::new(RecordingBackend {
            fail_add: true,
            ..Default::default()
        });
        let renderer = LayerRenderer::new(
            Arc::clone(&backend) as Arc<dyn MapBackend>,
            DimFactors::default(),
        );

        let err = renderer
            .render(
                regions(&["S1"]),
                plain_style,
                FeatureCallbacks::default(),
                true,
            )
            .unwrap_err();
        assert!(matches!(err, RenderError::Backend(_)));
        assert_eq!(renderer.layer_count(), 0);
    }

    #[test]
    fn test_dim_and_restore_restyle_without_removal() {
        let (backend, renderer) = renderer();
        let handle = renderer
            .render(
                regions(&["S1", "S2"]),
                plain_style,
                FeatureCallbacks::default(),
                true,
            )
            .unwrap();

        renderer.dim(handle).unwrap();
        assert_eq!(renderer.is_dimmed(handle), Some(true));
        // Dim twice is a no-op on the backend.
        renderer.dim(handle).unwrap();
        renderer.restore(handle).unwrap();
        assert_eq!(renderer.is_dimmed(handle), Some(false));

        assert_eq!(
            backend.calls(),
            vec![
                format!("add:{handle}:2"),
                format!("style:{handle}:2"),
                format!("style:{handle}:2"),
            ]
        );
    }

    #[test]
    fn test_rejected_restyle_leaves_dim_state_unchanged() {
        let backend = Arc::new(RecordingBackend {
            fail_style: true,
            ..Default::default()
        });
        let renderer = LayerRenderer::new(
            Arc::clone(&backend) as Arc<dyn MapBackend>,
            DimFactors::default(),
        );
        let handle = renderer
            .render(
                regions(&["S1"]),
                plain_style,
                FeatureCallbacks::default(),
                true,
            )
            .unwrap();

        assert!(renderer.dim(handle).is_err());
        // The layer is still undimmed, so a later dim retries the restyle.
        assert_eq!(renderer.is_dimmed(handle), Some(false));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let (backend, renderer) = renderer();
        let handle = renderer
            .render(
                regions(&["S1"]),
                plain_style,
                FeatureCallbacks::default(),
                true,
            )
            .unwrap();

        renderer.remove(handle).unwrap();
        renderer.remove(handle).unwrap();

        let removes = backend
            .calls()
            .iter()
            .filter(|c| c.starts_with("remove"))
            .count();
        assert_eq!(removes, 1);
        assert_eq!(renderer.layer_count(), 0);
    }

    #[test]
    fn test_click_fires_once_with_region() {
        let (_, renderer) = renderer();
        let clicked: Arc<PlMutex<Vec<String>>> = Arc::default();
        let clicked_cb = Arc::clone(&clicked);

        let handle = renderer
            .render(
                regions(&["S1", "S2"]),
                plain_style,
                FeatureCallbacks {
                    on_click: Some(Arc::new(move |r| {
                        clicked_cb.lock().push(r.code.as_str().to_string())
                    })),
                    ..Default::default()
                },
                true,
            )
            .unwrap();

        renderer.dispatch_click(handle, &RegionCode::new("S2"));
        assert_eq!(clicked.lock().clone(), vec!["S2".to_string()]);
    }

    #[test]
    fn test_programmatic_restyle_fires_no_callbacks() {
        let (_, renderer) = renderer();
        let clicks = Arc::new(PlMutex::new(0u32));
        let clicks_cb = Arc::clone(&clicks);

        let handle = renderer
            .render(
                regions(&["S1"]),
                plain_style,
                FeatureCallbacks {
                    on_click: Some(Arc::new(move |_| *clicks_cb.lock() += 1)),
                    ..Default::default()
                },
                true,
            )
            .unwrap();

        renderer.dim(handle).unwrap();
        renderer.restore(handle).unwrap();
        assert_eq!(*clicks.lock(), 0);
    }

    #[test]
    fn test_hover_pairs_balance() {
        let (_, renderer) = renderer();
        let events: Arc<PlMutex<Vec<String>>> = Arc::default();
        let enter = Arc::clone(&events);
        let exit = Arc::clone(&events);

        let handle = renderer
            .render(
                regions(&["S1", "S2"]),
                plain_style,
                FeatureCallbacks {
                    on_hover: Some(Arc::new(move |r| {
                        enter.lock().push(format!("enter:{}", r.code))
                    })),
                    on_hover_exit: Some(Arc::new(move |r| {
                        exit.lock().push(format!("exit:{}", r.code))
                    })),
                    ..Default::default()
                },
                true,
            )
            .unwrap();

        renderer.dispatch_hover(handle, &RegionCode::new("S1"));
        // Re-hovering the same feature does not duplicate events.
        renderer.dispatch_hover(handle, &RegionCode::new("S1"));
        // Moving to S2 closes S1 first.
        renderer.dispatch_hover(handle, &RegionCode::new("S2"));
        renderer.dispatch_hover_exit(handle);

        assert_eq!(
            events.lock().clone(),
            vec!["enter:S1", "exit:S1", "enter:S2", "exit:S2"]
        );
    }

    #[test]
    fn test_removal_mid_hover_synthesizes_exit() {
        let (_, renderer) = renderer();
        let events: Arc<PlMutex<Vec<String>>> = Arc::default();
        let exit = Arc::clone(&events);

        let handle = renderer
            .render(
                regions(&["S1"]),
                plain_style,
                FeatureCallbacks {
                    on_hover_exit: Some(Arc::new(move |r| {
                        exit.lock().push(format!("exit:{}", r.code))
                    })),
                    ..Default::default()
                },
                true,
            )
            .unwrap();

        renderer.dispatch_hover(handle, &RegionCode::new("S1"));
        renderer.remove(handle).unwrap();

        assert_eq!(events.lock().clone(), vec!["exit:S1"]);
    }

    #[test]
    fn test_label_toggle_requires_known_layer() {
        let (backend, renderer) = renderer();
        let handle = renderer
            .render(
                regions(&["S1"]),
                plain_style,
                FeatureCallbacks::default(),
                true,
            )
            .unwrap();

        renderer.set_labels_visible(handle, false).unwrap();
        assert!(backend
            .calls()
            .contains(&format!("labels:{handle}:false")));

        renderer.remove(handle).unwrap();
        let err = renderer.set_labels_visible(handle, true).unwrap_err();
        assert!(matches!(err, RenderError::UnknownLayer(_)));
    }
}
