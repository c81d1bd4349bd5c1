//! Capability implementations that record what the selection machine asked
//! for instead of performing it. Hosts without direct access to the surface
//! (the wasm facade, the CLI replay) drain these after each event.

use serde::{Deserialize, Serialize};

use crate::layout::Bounds;
use crate::selection::{
    AssetLocation, ExplorerNavigator, ExplorerPath, PathChangeMode, ViewportSurface,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum ViewportCommand {
    #[serde(rename_all = "camelCase")]
    ZoomToSvgBox {
        bounds: Bounds,
        animate: bool,
        target_scale: Option<f64>,
    },
    ZoomToSvgCoords { x: f64, y: f64, animate: bool },
    Autocenter { animate: bool },
    Focus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedViewport {
    pub commands: Vec<ViewportCommand>,
    /// Answer for `scale_for_svg_bounds`; hosts update it from the real surface.
    pub fit_scale: f64,
}

impl Default for RecordedViewport {
    fn default() -> Self {
        Self {
            commands: Vec::new(),
            fit_scale: 1.0,
        }
    }
}

impl RecordedViewport {
    pub fn drain(&mut self) -> Vec<ViewportCommand> {
        std::mem::take(&mut self.commands)
    }
}

impl ViewportSurface for RecordedViewport {
    fn zoom_to_svg_box(&mut self, bounds: Bounds, animate: bool, target_scale: Option<f64>) {
        self.commands.push(ViewportCommand::ZoomToSvgBox {
            bounds,
            animate,
            target_scale,
        });
    }

    fn zoom_to_svg_coords(&mut self, x: f64, y: f64, animate: bool) {
        self.commands
            .push(ViewportCommand::ZoomToSvgCoords { x, y, animate });
    }

    fn autocenter(&mut self, animate: bool) {
        self.commands.push(ViewportCommand::Autocenter { animate });
    }

    fn focus(&mut self) {
        self.commands.push(ViewportCommand::Focus);
    }

    fn scale_for_svg_bounds(&self, _width: f64, _height: f64) -> f64 {
        self.fit_scale
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordedNavigator {
    pub changes: Vec<(ExplorerPath, PathChangeMode)>,
    pub navigations: Vec<AssetLocation>,
}

impl ExplorerNavigator for RecordedNavigator {
    fn change_explorer_path(&mut self, path: &ExplorerPath, mode: PathChangeMode) {
        self.changes.push((path.clone(), mode));
    }

    fn navigate_to_source_asset(&mut self, location: AssetLocation) {
        self.navigations.push(location);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_json_shape() {
        let command = ViewportCommand::ZoomToSvgBox {
            bounds: Bounds::new(1.0, 2.0, 3.0, 4.0),
            animate: false,
            target_scale: None,
        };
        let json = serde_json::to_string(&command).unwrap();

        insta::assert_snapshot!(json, @r#"{"command":"zoomToSvgBox","bounds":{"x":1.0,"y":2.0,"width":3.0,"height":4.0},"animate":false,"targetScale":null}"#);
    }

    #[test]
    fn test_drain_empties_log() {
        let mut viewport = RecordedViewport::default();
        viewport.focus();
        viewport.autocenter(true);

        assert_eq!(
            viewport.drain(),
            vec![
                ViewportCommand::Focus,
                ViewportCommand::Autocenter { animate: true }
            ]
        );
        assert!(viewport.commands.is_empty());
    }
}
