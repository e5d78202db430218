//! Map backend abstraction.
//!
//! The narrow interface to the actual rendering primitive (a web map, a
//! canvas, a test recorder). [`crate::render::LayerRenderer`] is the only
//! component that calls these methods; nothing else in the crate may touch
//! the map directly.

use thiserror::Error;

use crate::region::{Geometry, Level, RegionCode};

use super::style::FeatureStyle;

/// Opaque reference to a rendered layer.
///
/// Issued by the renderer, owned by the drill-down controller, and used only
/// to request dim/restore/removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderedLayerHandle(pub(crate) u64);

impl std::fmt::Display for RenderedLayerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "layer#{}", self.0)
    }
}

/// Errors from the rendering backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The backend rejected an operation.
    #[error("backend error: {0}")]
    Backend(String),

    /// An operation referenced a handle the renderer no longer tracks.
    #[error("unknown layer {0}")]
    UnknownLayer(RenderedLayerHandle),
}

/// One renderable feature: a region's geometry plus its computed style and
/// label.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSpec {
    /// Canonical region code; also the feature's identity for events.
    pub code: RegionCode,
    /// Display name.
    pub name: String,
    /// Boundary geometry.
    pub geometry: Geometry,
    /// Computed fill/border style.
    pub style: FeatureStyle,
    /// Permanent label text (name + child count).
    pub label: String,
}

/// A complete layer handed to the backend in one call.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSpec {
    /// Handle the renderer will use for later style/removal calls.
    pub id: RenderedLayerHandle,
    /// Level the layer's regions belong to.
    pub level: Level,
    /// All features, one per region.
    pub features: Vec<FeatureSpec>,
    /// Initial label visibility.
    pub labels_visible: bool,
}

/// Rendering primitive operations.
///
/// Implementations must be cheap to call repeatedly: the renderer re-styles
/// whole layers on dim/restore rather than diffing.
pub trait MapBackend: Send + Sync {
    /// Attach a new layer to the view.
    fn add_layer(&self, layer: &LayerSpec) -> Result<(), RenderError>;

    /// Detach a layer. Called at most once per handle by the renderer.
    fn remove_layer(&self, id: RenderedLayerHandle) -> Result<(), RenderError>;

    /// Replace the style of the listed features in place.
    fn set_feature_styles(
        &self,
        id: RenderedLayerHandle,
        styles: &[(RegionCode, FeatureStyle)],
    ) -> Result<(), RenderError>;

    /// Toggle permanent labels for a layer.
    fn set_label_visibility(&self, id: RenderedLayerHandle, visible: bool)
        -> Result<(), RenderError>;
}
