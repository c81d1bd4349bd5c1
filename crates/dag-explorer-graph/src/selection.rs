//! Selection state machine.
//!
//! The machine owns the explorer path (the URL-backed selection) and reacts
//! to clicks and key presses. Viewport movement and navigation happen through
//! the capability objects it is constructed with.

use serde::{Deserialize, Serialize};

use crate::config::ExplorerConfig;
use crate::layout::{Bounds, GraphLayout};
use crate::range::{tokens_in_range, uniq};
use crate::viewport::{ArrowDirection, closest_node_in_direction};
use crate::{AssetDefinition, AssetKey, GraphData, GraphNode, NodeKind};

/// Path state mirrored into the URL.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
#[serde(rename_all = "camelCase")]
pub struct ExplorerPath {
    #[serde(default)]
    pub op_names: Vec<String>,
    #[serde(default)]
    pub ops_query: String,
    #[serde(default)]
    pub pipeline_name: String,
}

impl ExplorerPath {
    /// Selected tokens: the last `op_names` entry, comma separated.
    pub fn selected_tokens(&self) -> Vec<String> {
        let Some(last) = self.op_names.last() else {
            return Vec::new();
        };
        uniq(
            last.split(',')
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(String::from),
        )
    }

    pub fn with_selection(&self, tokens: &[String]) -> Self {
        let op_names = if tokens.is_empty() {
            Vec::new()
        } else {
            vec![tokens.join(",")]
        };
        Self {
            op_names,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
#[serde(rename_all = "lowercase")]
pub enum PathChangeMode {
    Replace,
    Push,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
pub struct ClickModifiers {
    #[serde(default)]
    pub shift: bool,
    /// Meta key, or the platform equivalent.
    #[serde(default)]
    pub meta: bool,
}

impl ClickModifiers {
    pub const NONE: Self = Self {
        shift: false,
        meta: false,
    };
    pub const SHIFT: Self = Self {
        shift: true,
        meta: false,
    };
    pub const META: Self = Self {
        shift: false,
        meta: true,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
#[serde(rename_all = "lowercase")]
pub enum SelectionState {
    Idle,
    Single,
    Multi,
}

impl SelectionState {
    fn for_count(count: usize) -> Self {
        match count {
            0 => SelectionState::Idle,
            1 => SelectionState::Single,
            _ => SelectionState::Multi,
        }
    }
}

/// Where a reference node's asset actually lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
#[serde(rename_all = "camelCase")]
pub struct AssetLocation {
    pub asset_key: AssetKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_name: Option<String>,
    #[serde(default)]
    pub op_names: Vec<String>,
}

impl AssetLocation {
    /// Location of an asset no repository defines.
    pub fn unknown(asset_key: AssetKey) -> Self {
        Self {
            asset_key,
            repository_name: None,
            repository_location: None,
            group_name: None,
            job_name: None,
            op_names: Vec::new(),
        }
    }
}

/// Imperative operations of the rendering surface.
pub trait ViewportSurface {
    fn zoom_to_svg_box(&mut self, bounds: Bounds, animate: bool, target_scale: Option<f64>);
    fn zoom_to_svg_coords(&mut self, x: f64, y: f64, animate: bool);
    fn autocenter(&mut self, animate: bool);
    fn focus(&mut self);
    /// Scale at which a box of this size fills the viewport.
    fn scale_for_svg_bounds(&self, width: f64, height: f64) -> f64;
}

/// Navigation/path layer.
pub trait ExplorerNavigator {
    fn change_explorer_path(&mut self, path: &ExplorerPath, mode: PathChangeMode);
    fn navigate_to_source_asset(&mut self, location: AssetLocation);
}

/// Resolves assets that are not part of the displayed graph.
pub trait AssetLocator {
    fn find_asset_location(&self, key: &AssetKey) -> AssetLocation;
}

/// Locates assets by looking them up in a wider graph snapshot.
pub struct GraphLocator<'g>(pub &'g GraphData);

impl AssetLocator for GraphLocator<'_> {
    fn find_asset_location(&self, key: &AssetKey) -> AssetLocation {
        let Some(node) = self.0.node(&key.to_node_id()) else {
            return AssetLocation::unknown(key.clone());
        };
        let definition = &node.definition;
        AssetLocation {
            asset_key: key.clone(),
            repository_name: Some(definition.repository.name.clone()),
            repository_location: Some(definition.repository.location.name.clone()),
            group_name: definition.group_name.clone(),
            job_name: definition.job_names.first().cloned(),
            op_names: definition.op_names.clone(),
        }
    }
}

/// Definitions a launch action applies to.
#[derive(Debug, Clone, PartialEq)]
pub enum LaunchScope<'g> {
    Selected(Vec<&'g AssetDefinition>),
    All(Vec<&'g AssetDefinition>),
}

impl<'g> LaunchScope<'g> {
    pub fn definitions(&self) -> &[&'g AssetDefinition] {
        match self {
            LaunchScope::Selected(definitions) | LaunchScope::All(definitions) => definitions,
        }
    }

    /// Same scope restricted to observable assets.
    pub fn observable(&self) -> Self {
        let keep = |definitions: &Vec<&'g AssetDefinition>| -> Vec<&'g AssetDefinition> {
            definitions
                .iter()
                .copied()
                .filter(|d| d.is_observable)
                .collect()
        };
        match self {
            LaunchScope::Selected(definitions) => LaunchScope::Selected(keep(definitions)),
            LaunchScope::All(definitions) => LaunchScope::All(keep(definitions)),
        }
    }
}

pub struct SelectionMachine<V, N> {
    path: ExplorerPath,
    config: ExplorerConfig,
    viewport: V,
    navigator: N,
    rendered_generation: Option<u64>,
    prefer_asset_rendering: bool,
}

impl<V: ViewportSurface, N: ExplorerNavigator> SelectionMachine<V, N> {
    pub fn new(path: ExplorerPath, config: ExplorerConfig, viewport: V, navigator: N) -> Self {
        Self {
            path,
            config,
            viewport,
            navigator,
            rendered_generation: None,
            prefer_asset_rendering: true,
        }
    }

    pub fn path(&self) -> &ExplorerPath {
        &self.path
    }

    pub fn viewport(&self) -> &V {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut V {
        &mut self.viewport
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    pub fn navigator_mut(&mut self) -> &mut N {
        &mut self.navigator
    }

    /// Adopt a path changed outside the machine (history navigation, sidebar
    /// query edits). The navigator is not notified.
    pub fn sync_path(&mut self, path: ExplorerPath) {
        self.path = path;
    }

    pub fn selected_tokens(&self) -> Vec<String> {
        self.path.selected_tokens()
    }

    /// Whether nodes are drawn as assets rather than as the ops behind them.
    pub fn prefers_asset_rendering(&self) -> bool {
        self.prefer_asset_rendering
    }

    pub fn state(&self) -> SelectionState {
        SelectionState::for_count(self.selected_tokens().len())
    }

    /// Selected nodes present in `graph`, in selection order. Tokens of
    /// nodes missing from this snapshot stay selected but are skipped here.
    pub fn selected_nodes<'g>(&self, graph: &'g GraphData) -> Vec<&'g GraphNode> {
        self.selected_tokens()
            .iter()
            .filter_map(|token| graph.node_for_token(token))
            .collect()
    }

    pub fn last_selected_node<'g>(&self, graph: &'g GraphData) -> Option<&'g GraphNode> {
        self.selected_nodes(graph).pop()
    }

    /// Node shown in the info panel: only when exactly one is selected.
    pub fn sidebar_node<'g>(&self, graph: &'g GraphData) -> Option<&'g GraphNode> {
        match self.selected_nodes(graph).as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    /// Selected definitions, or every candidate when nothing is selected.
    /// `empty_default_items` replaces the graph's definitions while an
    /// empty default is applied to a large graph.
    pub fn launch_scope<'g>(
        &self,
        graph: &'g GraphData,
        empty_default_items: Option<&'g [AssetDefinition]>,
    ) -> LaunchScope<'g> {
        let selected: Vec<&AssetDefinition> = self
            .selected_nodes(graph)
            .into_iter()
            .map(|node| &node.definition)
            .collect();
        if !selected.is_empty() {
            return LaunchScope::Selected(selected);
        }

        let all = match empty_default_items {
            Some(items) => items.iter().collect(),
            None => {
                let mut nodes: Vec<&GraphNode> = graph.nodes.values().collect();
                nodes.sort_by(|a, b| a.id.cmp(&b.id));
                nodes.into_iter().map(|node| &node.definition).collect()
            }
        };
        LaunchScope::All(all)
    }

    /// Click on a node box.
    pub fn on_node_click(
        &mut self,
        graph: &GraphData,
        layout: Option<&GraphLayout>,
        node_id: &str,
        modifiers: ClickModifiers,
        locator: &impl AssetLocator,
    ) {
        match graph.node_kind(node_id) {
            Some(NodeKind::Present(node)) => self.select_node(graph, layout, node, modifiers),
            Some(NodeKind::Reference(key)) => {
                // Not in this graph: hand off to whoever owns that asset.
                tracing::debug!(asset = %key.to_token(), "navigating to source asset");
                let location = locator.find_asset_location(&key);
                self.navigator.navigate_to_source_asset(location);
            }
            None => tracing::debug!(node_id, "ignoring click on unknown node"),
        }
    }

    fn select_node(
        &mut self,
        graph: &GraphData,
        layout: Option<&GraphLayout>,
        node: &GraphNode,
        modifiers: ClickModifiers,
    ) {
        let token = node.token();

        let next = if modifiers.shift || modifiers.meta {
            let existing = self.selected_tokens();
            if modifiers.meta && existing.contains(&token) {
                existing.into_iter().filter(|t| *t != token).collect()
            } else {
                let mut tokens_to_add = vec![token];
                if modifiers.shift {
                    let selected = self.selected_nodes(graph);
                    if let Some(range) = selected
                        .into_iter()
                        .rev()
                        .map(|from| tokens_in_range(graph, Some(from), node))
                        .find(|range| !range.is_empty())
                    {
                        tokens_to_add = range;
                    }
                }
                uniq(existing.into_iter().chain(tokens_to_add))
            }
        } else {
            vec![token]
        };

        let center = next
            .last()
            .and_then(|last| graph.node_for_token(last))
            .and_then(|last| layout.and_then(|layout| layout.bounds_of(&last.id)));
        if let Some(bounds) = center {
            self.viewport.zoom_to_svg_coords(bounds.x, bounds.y, true);
        }

        self.apply_selection(next, PathChangeMode::Replace);
    }

    /// Sidebar and keyboard selection: a plain click followed by zooming to
    /// the node's box.
    pub fn select_node_by_id(
        &mut self,
        graph: &GraphData,
        layout: Option<&GraphLayout>,
        node_id: &str,
    ) {
        let Some(node) = graph.node(node_id) else {
            return;
        };
        self.select_node(graph, layout, node, ClickModifiers::NONE);
        if let Some(bounds) = layout.and_then(|layout| layout.bounds_of(node_id)) {
            self.viewport.zoom_to_svg_box(bounds, true, None);
        }
    }

    pub fn on_background_click(&mut self) {
        self.apply_selection(Vec::new(), PathChangeMode::Replace);
    }

    /// Move the selection to the nearest present node in `direction`.
    pub fn on_arrow_key(
        &mut self,
        graph: &GraphData,
        layout: Option<&GraphLayout>,
        direction: ArrowDirection,
    ) {
        let (Some(layout), Some(last)) = (layout, self.last_selected_node(graph)) else {
            return;
        };
        let next = closest_node_in_direction(layout, &last.id, direction, |id| {
            graph.node(id).is_some()
        });
        if let Some(next) = next {
            self.select_node_by_id(graph, Some(layout), next);
        }
    }

    /// Called each time the surface draws a layout. The first draw of a new
    /// layout jumps to the selection without animation. Returns whether the
    /// viewport was moved.
    pub fn on_layout_rendered(
        &mut self,
        graph: &GraphData,
        generation: u64,
        layout: &GraphLayout,
    ) -> bool {
        if self.rendered_generation == Some(generation) {
            return false;
        }

        if let Some(last) = self.last_selected_node(graph) {
            if let Some(bounds) = layout.bounds_of(&last.id) {
                self.viewport.zoom_to_svg_box(bounds, false, None);
            }
            self.viewport.focus();
        } else {
            self.viewport.autocenter(false);
        }

        self.rendered_generation = Some(generation);
        true
    }

    pub fn on_node_double_click(&mut self, layout: &GraphLayout, node_id: &str) {
        if let Some(bounds) = layout.bounds_of(node_id) {
            self.viewport
                .zoom_to_svg_box(bounds, true, Some(self.config.node_zoom_scale));
        }
    }

    pub fn on_group_double_click(&mut self, layout: &GraphLayout, group_id: &str) {
        let Some(group) = layout.groups.get(group_id) else {
            return;
        };
        let fit = self
            .viewport
            .scale_for_svg_bounds(group.bounds.width, group.bounds.height);
        self.viewport
            .zoom_to_svg_box(group.bounds, true, Some(fit * self.config.group_zoom_factor));
    }

    pub fn on_background_double_click(&mut self) {
        self.viewport.autocenter(true);
    }

    pub fn set_query(&mut self, ops_query: &str) {
        self.path.ops_query = ops_query.to_string();
        self.navigator
            .change_explorer_path(&self.path, PathChangeMode::Replace);
    }

    pub fn clear_query(&mut self) {
        self.path.ops_query.clear();
        self.navigator
            .change_explorer_path(&self.path, PathChangeMode::Push);
    }

    /// Switch between the asset and op renderings. The path is rewritten to
    /// the ops of the first selected definition, since op graphs select by
    /// op name. Returns the new preference.
    pub fn toggle_asset_rendering(&mut self, graph: &GraphData) -> bool {
        self.path.op_names = self
            .selected_nodes(graph)
            .first()
            .map(|node| node.definition.op_names.clone())
            .unwrap_or_default();
        self.navigator
            .change_explorer_path(&self.path, PathChangeMode::Replace);
        self.prefer_asset_rendering = !self.prefer_asset_rendering;
        tracing::debug!(
            prefer_asset_rendering = self.prefer_asset_rendering,
            "rendering toggled"
        );
        self.prefer_asset_rendering
    }

    fn apply_selection(&mut self, tokens: Vec<String>, mode: PathChangeMode) {
        let before = self.state();
        self.path = self.path.with_selection(&tokens);
        tracing::debug!(
            ?before,
            after = ?self.state(),
            selection = %tokens.join(","),
            "selection changed"
        );
        self.navigator.change_explorer_path(&self.path, mode);
    }
}
