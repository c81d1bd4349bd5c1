//! Which nodes, groups and edges the rendering surface should draw for the
//! current pan and zoom.

use serde::{Deserialize, Serialize};

use crate::config::ExplorerConfig;
use crate::layout::{Bounds, GraphLayout, LayoutEdge, LayoutGroup, LayoutNode};
use crate::GraphData;

pub const MINIMAL_SCALE: f64 = 0.6;
pub const GROUPS_ONLY_SCALE: f64 = 0.15;

/// Visible scene rectangle reported by the rendering surface each frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
pub struct ViewportRect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl ViewportRect {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }
}

/// How much of a node to draw at a given scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
#[serde(rename_all = "lowercase")]
pub enum RenderDetail {
    Full,
    Minimal,
    /// Nodes are hidden behind their group box.
    Collapsed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
#[serde(rename_all = "lowercase")]
pub enum ArrowDirection {
    Left,
    Right,
    Up,
    Down,
}

pub fn is_node_offscreen(bounds: &Bounds, rect: &ViewportRect) -> bool {
    bounds.right() < rect.left
        || bounds.bottom() < rect.top
        || bounds.x > rect.right
        || bounds.y > rect.bottom
}

/// Scale thresholds plus whether the layout can collapse into groups.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportFilter {
    pub minimal_scale: f64,
    pub groups_only_scale: f64,
    pub allow_groups_only_zoom_level: bool,
}

impl Default for ViewportFilter {
    fn default() -> Self {
        Self {
            minimal_scale: MINIMAL_SCALE,
            groups_only_scale: GROUPS_ONLY_SCALE,
            allow_groups_only_zoom_level: false,
        }
    }
}

impl ViewportFilter {
    /// Group collapsing is only possible when the layout produced groups.
    pub fn new(config: &ExplorerConfig, layout: &GraphLayout) -> Self {
        Self {
            minimal_scale: config.minimal_scale,
            groups_only_scale: config.groups_only_scale,
            allow_groups_only_zoom_level: !layout.groups.is_empty(),
        }
    }

    pub fn is_groups_only(&self, scale: f64) -> bool {
        self.allow_groups_only_zoom_level && scale < self.groups_only_scale
    }

    pub fn render_detail(&self, scale: f64) -> RenderDetail {
        if self.is_groups_only(scale) {
            RenderDetail::Collapsed
        } else if scale < self.minimal_scale {
            RenderDetail::Minimal
        } else {
            RenderDetail::Full
        }
    }

    /// Drop edges inside a single group once nodes collapse into group boxes.
    pub fn visible_edges<'e>(
        &self,
        edges: &'e [LayoutEdge],
        scale: f64,
        graph: &GraphData,
    ) -> Vec<&'e LayoutEdge> {
        if !self.is_groups_only(scale) {
            return edges.iter().collect();
        }

        let membership = |id: &str| graph.node(id).map(|node| node.definition.membership());

        edges
            .iter()
            .filter(|edge| membership(&edge.from_id) != membership(&edge.to_id))
            .collect()
    }

    /// On-screen nodes, or none while collapsed into groups.
    pub fn visible_nodes<'l>(
        &self,
        layout: &'l GraphLayout,
        rect: &ViewportRect,
        scale: f64,
    ) -> Vec<&'l LayoutNode> {
        if self.render_detail(scale) == RenderDetail::Collapsed {
            return Vec::new();
        }
        layout
            .nodes
            .values()
            .filter(|node| !is_node_offscreen(&node.bounds, rect))
            .collect()
    }

    /// On-screen groups, outermost (shortest id) first.
    pub fn visible_groups<'l>(
        &self,
        layout: &'l GraphLayout,
        rect: &ViewportRect,
    ) -> Vec<&'l LayoutGroup> {
        let mut groups: Vec<&LayoutGroup> = layout
            .groups
            .values()
            .filter(|group| !is_node_offscreen(&group.bounds, rect))
            .collect();
        groups.sort_by_key(|group| group.id.len());
        groups
    }
}

/// Edge filter with the default groups-only threshold.
pub fn visible_edges<'e>(
    edges: &'e [LayoutEdge],
    allow_groups_only_zoom_level: bool,
    scale: f64,
    graph: &GraphData,
) -> Vec<&'e LayoutEdge> {
    ViewportFilter {
        allow_groups_only_zoom_level,
        ..ViewportFilter::default()
    }
    .visible_edges(edges, scale, graph)
}

/// Nearest node whose centre lies strictly on the `direction` side of
/// `from_id`'s centre. Only ids accepted by `include` are candidates.
pub fn closest_node_in_direction<'l>(
    layout: &'l GraphLayout,
    from_id: &str,
    direction: ArrowDirection,
    include: impl Fn(&str) -> bool,
) -> Option<&'l str> {
    let (fx, fy) = layout.nodes.get(from_id)?.bounds.center();

    layout
        .nodes
        .values()
        .filter(|node| node.id != from_id && include(&node.id))
        .filter_map(|node| {
            let (x, y) = node.bounds.center();
            let in_direction = match direction {
                ArrowDirection::Left => x < fx,
                ArrowDirection::Right => x > fx,
                ArrowDirection::Up => y < fy,
                ArrowDirection::Down => y > fy,
            };
            in_direction.then(|| (node.id.as_str(), (x - fx).hypot(y - fy)))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, _)| id)
}
