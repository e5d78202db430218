//! Console map backend.
//!
//! Renders layer operations as indented terminal output so the drill-down
//! lifecycle is visible without a graphical map.

use geodrill::{FeatureStyle, LayerSpec, MapBackend, RegionCode, RenderError, RenderedLayerHandle};

/// Prints every layer operation to stdout.
#[derive(Debug, Default)]
pub struct ConsoleBackend;

impl MapBackend for ConsoleBackend {
    fn add_layer(&self, layer: &LayerSpec) -> Result<(), RenderError> {
        println!("+ {} ({} level, {} features)", layer.id, layer.level, layer.features.len());
        for feature in &layer.features {
            println!(
                "    {} {:<24} fill={} opacity={:.2}",
                feature.code, feature.label, feature.style.fill, feature.style.fill_opacity
            );
        }
        Ok(())
    }

    fn remove_layer(&self, id: RenderedLayerHandle) -> Result<(), RenderError> {
        println!("- {}", id);
        Ok(())
    }

    fn set_feature_styles(
        &self,
        id: RenderedLayerHandle,
        styles: &[(RegionCode, FeatureStyle)],
    ) -> Result<(), RenderError> {
        let opacity = styles.first().map(|(_, s)| s.fill_opacity).unwrap_or(0.0);
        println!("~ {} restyled ({} features, opacity={:.2})", id, styles.len(), opacity);
        Ok(())
    }

    fn set_label_visibility(
        &self,
        id: RenderedLayerHandle,
        visible: bool,
    ) -> Result<(), RenderError> {
        println!("~ {} labels {}", id, if visible { "on" } else { "off" });
        Ok(())
    }
}
