use serde::{Deserialize, Serialize};

use crate::viewport::{GROUPS_ONLY_SCALE, MINIMAL_SCALE};

/// Tunables for the explorer. Every field has a default so partial
/// configuration files are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
#[serde(default, rename_all = "camelCase")]
pub struct ExplorerConfig {
    /// Below this scale nodes render in their minimal representation.
    pub minimal_scale: f64,
    /// Below this scale (with groups present) only group boxes are drawn.
    pub groups_only_scale: f64,
    /// Graphs with more nodes than this are laid out asynchronously.
    pub async_layout_threshold: usize,
    /// Scale used when double-clicking a node.
    pub node_zoom_scale: f64,
    /// Fraction of the fitting scale used when double-clicking a group.
    pub group_zoom_factor: f64,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            minimal_scale: MINIMAL_SCALE,
            groups_only_scale: GROUPS_ONLY_SCALE,
            async_layout_threshold: 100,
            node_zoom_scale: 1.2,
            group_zoom_factor: 0.9,
        }
    }
}
