use dag_explorer_graph::{
    AssetDefinition, AssetLocation, ClickModifiers, ExplorerConfig, ExplorerError, ExplorerPath,
    GraphData, GraphFetch, GraphLayout, GraphLocator, GraphNotice, LayoutScheduler,
    PathChangeMode, RecordedNavigator, RecordedViewport, SelectionMachine, SelectionState,
    ViewportCommand, gate,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::{console_log, parse_direction, to_js_error};

type Machine = SelectionMachine<RecordedViewport, RecordedNavigator>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathChange {
    pub path: ExplorerPath,
    pub mode: PathChangeMode,
}

/// Everything the host must apply after an event
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUpdate {
    pub selected: Vec<String>,
    pub state: SelectionState,
    pub path_changes: Vec<PathChange>,
    pub viewport_commands: Vec<ViewportCommand>,
    pub navigations: Vec<AssetLocation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoticePayload {
    pub kind: GraphNotice,
    pub title: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderingToggle {
    pub prefer_asset_rendering: bool,
    #[serde(flatten)]
    pub update: SessionUpdate,
}

/// Answer to a graph load: which layout to compute and what to show meanwhile
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutPlan {
    pub generation: u64,
    pub run_async: bool,
    pub notice: Option<NoticePayload>,
}

/// Interactive explorer state for one mounted graph view
#[wasm_bindgen]
pub struct ExplorerSession {
    machine: Machine,
    scheduler: LayoutScheduler,
    graph: GraphData,
    /// Unfiltered graph used to locate assets outside the current view.
    full_graph: Option<GraphData>,
    /// Definitions the query matched, launched instead of the graph while
    /// an empty default hides a large graph.
    query_items: Vec<AssetDefinition>,
    applying_empty_default: bool,
}

#[wasm_bindgen]
impl ExplorerSession {
    #[wasm_bindgen(constructor)]
    pub fn new(path_json: &str, config_json: Option<String>) -> Result<ExplorerSession, JsValue> {
        let path: ExplorerPath = serde_json::from_str(path_json)
            .map_err(|e| JsValue::from_str(&format!("Failed to parse explorer path: {}", e)))?;
        let config = match config_json {
            Some(json) => serde_json::from_str(&json)
                .map_err(|e| JsValue::from_str(&format!("Failed to parse config: {}", e)))?,
            None => ExplorerConfig::default(),
        };
        Ok(ExplorerSession::with_config(path, config))
    }

    /// Load the query result; `graph_json` is null when the query failed.
    /// `query_items_json` lists the definitions the query matched.
    /// Rejects with the error text for query failures and cycles.
    pub fn set_graph(
        &mut self,
        graph_json: Option<String>,
        query_items_json: Option<String>,
        query_item_count: usize,
        applying_empty_default: bool,
    ) -> Result<JsValue, JsValue> {
        let graph = graph_json
            .map(|json| GraphData::from_json(&json))
            .transpose()
            .map_err(to_js_error)?;
        let query_items: Vec<AssetDefinition> = match query_items_json {
            Some(json) => serde_json::from_str(&json)
                .map_err(|e| JsValue::from_str(&format!("Failed to parse query items: {}", e)))?,
            None => Vec::new(),
        };
        let plan = self
            .load_graph(
                GraphFetch {
                    graph,
                    query_item_count,
                    applying_empty_default,
                },
                query_items,
            )
            .map_err(to_js_error)?;
        Ok(serde_wasm_bindgen::to_value(&plan).unwrap_or_else(|_| JsValue::NULL))
    }

    pub fn set_full_graph(&mut self, graph_json: &str) -> Result<(), JsValue> {
        self.full_graph = Some(GraphData::from_json(graph_json).map_err(to_js_error)?);
        Ok(())
    }

    /// Hand over a computed layout. Returns false when a newer graph
    /// superseded the request.
    pub fn accept_layout(&mut self, generation: u32, layout_json: &str) -> Result<bool, JsValue> {
        let layout = GraphLayout::from_json(layout_json).map_err(to_js_error)?;
        Ok(self.scheduler.accept(u64::from(generation), layout))
    }

    pub fn is_loading(&self) -> bool {
        self.scheduler.is_loading()
    }

    pub fn is_async(&self) -> bool {
        self.scheduler.is_async()
    }

    /// Adopt a path changed by history navigation.
    pub fn sync_path(&mut self, path_json: &str) -> Result<(), JsValue> {
        let path: ExplorerPath = serde_json::from_str(path_json)
            .map_err(|e| JsValue::from_str(&format!("Failed to parse explorer path: {}", e)))?;
        self.machine.sync_path(path);
        Ok(())
    }

    pub fn layout_rendered(&mut self) -> JsValue {
        to_js(&self.rendered())
    }

    pub fn click(&mut self, node_id: &str, shift: bool, meta: bool) -> JsValue {
        to_js(&self.node_click(node_id, ClickModifiers { shift, meta }))
    }

    pub fn background_click(&mut self) -> JsValue {
        self.machine.on_background_click();
        to_js(&self.drain())
    }

    pub fn arrow_key(&mut self, direction: &str) -> JsValue {
        to_js(&self.arrow(direction))
    }

    pub fn node_double_click(&mut self, node_id: &str) -> JsValue {
        if let Some((_, layout)) = self.scheduler.layout() {
            self.machine.on_node_double_click(layout, node_id);
        }
        to_js(&self.drain())
    }

    /// `fit_scale` is the surface's scale for fitting the group box.
    pub fn group_double_click(&mut self, group_id: &str, fit_scale: f64) -> JsValue {
        to_js(&self.group_zoom(group_id, fit_scale))
    }

    pub fn background_double_click(&mut self) -> JsValue {
        self.machine.on_background_double_click();
        to_js(&self.drain())
    }

    pub fn set_query(&mut self, ops_query: &str) -> JsValue {
        self.machine.set_query(ops_query);
        to_js(&self.drain())
    }

    pub fn clear_query(&mut self) -> JsValue {
        self.machine.clear_query();
        to_js(&self.drain())
    }

    /// Definition for the info panel, or null unless exactly one node is selected
    pub fn sidebar_node(&self) -> JsValue {
        let definition = self
            .machine
            .sidebar_node(&self.graph)
            .map(|node| &node.definition);
        serde_wasm_bindgen::to_value(&definition).unwrap_or_else(|_| JsValue::NULL)
    }

    /// Flip the "view as asset graph" option; returns the new preference
    /// and the path change it causes.
    pub fn toggle_asset_rendering(&mut self) -> JsValue {
        to_js(&self.toggle_rendering())
    }

    pub fn prefers_asset_rendering(&self) -> bool {
        self.machine.prefers_asset_rendering()
    }

    /// Tokens of the assets a launch would cover
    pub fn launch_tokens(&self, observable_only: bool) -> Vec<String> {
        let empty_default_items = self
            .applying_empty_default
            .then_some(self.query_items.as_slice());
        let scope = self.machine.launch_scope(&self.graph, empty_default_items);
        let scope = if observable_only {
            scope.observable()
        } else {
            scope
        };
        scope
            .definitions()
            .iter()
            .map(|definition| definition.asset_key.to_token())
            .collect()
    }
}

impl ExplorerSession {
    pub fn with_config(path: ExplorerPath, config: ExplorerConfig) -> Self {
        ExplorerSession {
            scheduler: LayoutScheduler::new(&config),
            machine: SelectionMachine::new(
                path,
                config,
                RecordedViewport::default(),
                RecordedNavigator::default(),
            ),
            graph: GraphData::new(),
            full_graph: None,
            query_items: Vec::new(),
            applying_empty_default: false,
        }
    }

    /// Gate a fetch and plan its layout. A rejected fetch clears the graph
    /// and the layout so later events cannot act on the previous one.
    pub fn load_graph(
        &mut self,
        fetch: GraphFetch,
        query_items: Vec<AssetDefinition>,
    ) -> Result<LayoutPlan, ExplorerError> {
        let applying_empty_default = fetch.applying_empty_default;
        let gated = match gate(fetch) {
            Ok(gated) => gated,
            Err(err) => {
                console_log(&format!("Graph rejected: {}", err));
                self.graph = GraphData::new();
                self.scheduler.reset();
                self.query_items.clear();
                self.applying_empty_default = false;
                return Err(err);
            }
        };
        self.query_items = query_items;
        self.applying_empty_default = applying_empty_default;
        let request = self.scheduler.request(&gated.graph);
        console_log(&format!(
            "Layout generation {} requested for {} nodes (async={})",
            request.generation,
            gated.graph.nodes.len(),
            request.run_async
        ));
        self.graph = gated.graph;
        Ok(LayoutPlan {
            generation: request.generation,
            run_async: request.run_async,
            notice: gated.notice.map(|kind| NoticePayload {
                kind,
                title: kind.title(),
                description: kind.description(),
            }),
        })
    }

    pub fn rendered(&mut self) -> SessionUpdate {
        if let Some((generation, layout)) = self.scheduler.layout() {
            self.machine
                .on_layout_rendered(&self.graph, generation, layout);
        }
        self.drain()
    }

    pub fn node_click(&mut self, node_id: &str, modifiers: ClickModifiers) -> SessionUpdate {
        let layout = self.scheduler.layout().map(|(_, layout)| layout);
        let locator = GraphLocator(self.full_graph.as_ref().unwrap_or(&self.graph));
        self.machine
            .on_node_click(&self.graph, layout, node_id, modifiers, &locator);
        self.drain()
    }

    pub fn arrow(&mut self, direction: &str) -> SessionUpdate {
        match parse_direction(direction) {
            Some(direction) => {
                let layout = self.scheduler.layout().map(|(_, layout)| layout);
                self.machine.on_arrow_key(&self.graph, layout, direction);
            }
            None => console_log(&format!("Ignoring unknown arrow direction {}", direction)),
        }
        self.drain()
    }

    pub fn group_zoom(&mut self, group_id: &str, fit_scale: f64) -> SessionUpdate {
        self.machine.viewport_mut().fit_scale = fit_scale;
        if let Some((_, layout)) = self.scheduler.layout() {
            self.machine.on_group_double_click(layout, group_id);
        }
        self.drain()
    }

    pub fn toggle_rendering(&mut self) -> RenderingToggle {
        let prefer_asset_rendering = self.machine.toggle_asset_rendering(&self.graph);
        RenderingToggle {
            prefer_asset_rendering,
            update: self.drain(),
        }
    }

    fn drain(&mut self) -> SessionUpdate {
        let commands = self.machine.viewport_mut().drain();
        let navigator = self.machine.navigator_mut();
        let path_changes = std::mem::take(&mut navigator.changes)
            .into_iter()
            .map(|(path, mode)| PathChange { path, mode })
            .collect();
        let navigations = std::mem::take(&mut navigator.navigations);

        SessionUpdate {
            selected: self.machine.selected_tokens(),
            state: self.machine.state(),
            path_changes,
            viewport_commands: commands,
            navigations,
        }
    }
}

fn to_js<T: Serialize>(value: &T) -> JsValue {
    serde_wasm_bindgen::to_value(value).unwrap_or_else(|_| JsValue::NULL)
}
