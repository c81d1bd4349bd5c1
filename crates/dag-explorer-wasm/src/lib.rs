mod session;

pub use session::ExplorerSession;

use dag_explorer_graph::{
    ArrowDirection, AssetNodeRecord, ExplorerConfig, GraphData, GraphDirection, GraphLayout,
    LayoutEdge, RenderDetail, ViewportFilter, ViewportRect, build_graph_data,
    closest_node_in_direction, direction_of, find_cycle, has_cycle, tokens_in_range,
};
use wasm_bindgen::prelude::*;

pub(crate) fn console_log(message: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::log_1(&message.into());
    #[cfg(not(target_arch = "wasm32"))]
    let _ = message;
}

pub(crate) fn to_js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

pub(crate) fn parse_direction(direction: &str) -> Option<ArrowDirection> {
    match direction {
        "left" | "ArrowLeft" => Some(ArrowDirection::Left),
        "right" | "ArrowRight" => Some(ArrowDirection::Right),
        "up" | "ArrowUp" => Some(ArrowDirection::Up),
        "down" | "ArrowDown" => Some(ArrowDirection::Down),
        _ => None,
    }
}

/// Read-only graph queries exposed to JavaScript
#[wasm_bindgen]
pub struct GraphExplorer {
    graph: GraphData,
    config: ExplorerConfig,
    layout: Option<GraphLayout>,
}

#[wasm_bindgen]
impl GraphExplorer {
    /// Create a GraphExplorer from graph JSON (`nodes`, `downstream`, optional `upstream`)
    #[wasm_bindgen(constructor)]
    pub fn new(graph_json: &str) -> Result<GraphExplorer, JsValue> {
        let graph = GraphData::from_json(graph_json).map_err(to_js_error)?;
        Ok(GraphExplorer::from_graph(graph))
    }

    /// Create a GraphExplorer from the flat asset records of a fetch
    #[wasm_bindgen(js_name = fromAssetNodes)]
    pub fn from_asset_nodes(records_json: &str) -> Result<GraphExplorer, JsValue> {
        let records: Vec<AssetNodeRecord> = serde_json::from_str(records_json)
            .map_err(|e| JsValue::from_str(&format!("Failed to parse asset records: {}", e)))?;
        Ok(GraphExplorer::from_graph(build_graph_data(&records)))
    }

    pub fn set_config(&mut self, config_json: &str) -> Result<(), JsValue> {
        self.config = serde_json::from_str(config_json)
            .map_err(|e| JsValue::from_str(&format!("Failed to parse config: {}", e)))?;
        Ok(())
    }

    pub fn set_layout(&mut self, layout_json: &str) -> Result<(), JsValue> {
        self.layout = Some(GraphLayout::from_json(layout_json).map_err(to_js_error)?);
        Ok(())
    }

    pub fn node_count(&self) -> usize {
        self.graph.nodes.len()
    }

    pub fn has_cycle(&self) -> bool {
        has_cycle(&self.graph)
    }

    /// Tokens of one cycle, or null when the graph is acyclic
    pub fn find_cycle(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&find_cycle(&self.graph)).unwrap_or_else(|_| JsValue::NULL)
    }

    /// "downstream" or "upstream"; undefined when either token is not in the graph
    pub fn direction_of(&self, from_token: &str, to_token: &str) -> Option<String> {
        let from = self.graph.node_for_token(from_token)?;
        let to = self.graph.node_for_token(to_token)?;
        let direction = match direction_of(&self.graph, from, to) {
            GraphDirection::Downstream => "downstream",
            GraphDirection::Upstream => "upstream",
        };
        Some(direction.to_string())
    }

    /// Tokens on the paths between two nodes, for shift-click range selection
    pub fn tokens_in_range(&self, from_token: Option<String>, to_token: &str) -> Vec<String> {
        let Some(to) = self.graph.node_for_token(to_token) else {
            return Vec::new();
        };
        let from = from_token
            .as_deref()
            .and_then(|token| self.graph.node_for_token(token));
        tokens_in_range(&self.graph, from, to)
    }

    /// "full", "minimal" or "collapsed"
    pub fn render_detail(&self, scale: f64) -> String {
        let detail = match self.filter().render_detail(scale) {
            RenderDetail::Full => "full",
            RenderDetail::Minimal => "minimal",
            RenderDetail::Collapsed => "collapsed",
        };
        detail.to_string()
    }

    /// Layout edges to draw at `scale`
    pub fn visible_edges(&self, scale: f64) -> JsValue {
        serde_wasm_bindgen::to_value(&self.edges_at(scale)).unwrap_or_else(|_| JsValue::NULL)
    }

    /// Ids of the nodes inside the visible rectangle
    pub fn visible_nodes(
        &self,
        left: f64,
        top: f64,
        right: f64,
        bottom: f64,
        scale: f64,
    ) -> Vec<String> {
        let Some(layout) = &self.layout else {
            return Vec::new();
        };
        let rect = ViewportRect::new(left, top, right, bottom);
        self.filter()
            .visible_nodes(layout, &rect, scale)
            .into_iter()
            .map(|node| node.id.clone())
            .collect()
    }

    /// Ids of the groups inside the visible rectangle, outermost first
    pub fn visible_groups(&self, left: f64, top: f64, right: f64, bottom: f64) -> Vec<String> {
        let Some(layout) = &self.layout else {
            return Vec::new();
        };
        let rect = ViewportRect::new(left, top, right, bottom);
        self.filter()
            .visible_groups(layout, &rect)
            .into_iter()
            .map(|group| group.id.clone())
            .collect()
    }

    /// Nearest laid-out node from `from_id` in an arrow-key direction
    pub fn closest_node(&self, from_id: &str, direction: &str) -> Option<String> {
        let layout = self.layout.as_ref()?;
        let direction = parse_direction(direction)?;
        closest_node_in_direction(layout, from_id, direction, |id| {
            self.graph.node(id).is_some()
        })
        .map(String::from)
    }
}

impl GraphExplorer {
    fn from_graph(graph: GraphData) -> Self {
        console_log(&format!(
            "GraphExplorer loaded {} nodes, {} edges",
            graph.nodes.len(),
            graph.edge_count()
        ));
        GraphExplorer {
            graph,
            config: ExplorerConfig::default(),
            layout: None,
        }
    }

    fn filter(&self) -> ViewportFilter {
        match &self.layout {
            Some(layout) => ViewportFilter::new(&self.config, layout),
            None => ViewportFilter {
                minimal_scale: self.config.minimal_scale,
                groups_only_scale: self.config.groups_only_scale,
                allow_groups_only_zoom_level: false,
            },
        }
    }

    fn edges_at(&self, scale: f64) -> Vec<&LayoutEdge> {
        match &self.layout {
            Some(layout) => self.filter().visible_edges(&layout.edges, scale, &self.graph),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) const RECORDS: &str = r#"[
        {"assetKey": {"path": ["raw"]}, "groupName": "ingest",
         "repository": {"id": "r1", "location": {"id": "l1"}}},
        {"assetKey": {"path": ["clean"]}, "groupName": "ingest", "opNames": ["clean_op"],
         "repository": {"id": "r1", "location": {"id": "l1"}},
         "dependencyKeys": [{"path": ["raw"]}]},
        {"assetKey": {"path": ["report"]}, "groupName": "bi",
         "repository": {"id": "r1", "location": {"id": "l1"}},
         "dependencyKeys": [{"path": ["clean"]}]}
    ]"#;

    pub(crate) const LAYOUT: &str = r#"{
        "width": 300, "height": 100,
        "nodes": {
            "[\"raw\"]": {"id": "[\"raw\"]", "bounds": {"x": 0, "y": 0, "width": 50, "height": 20}},
            "[\"clean\"]": {"id": "[\"clean\"]", "bounds": {"x": 100, "y": 0, "width": 50, "height": 20}},
            "[\"report\"]": {"id": "[\"report\"]", "bounds": {"x": 200, "y": 0, "width": 50, "height": 20}}
        },
        "groups": {
            "ingest": {"id": "ingest", "groupName": "ingest", "bounds": {"x": 0, "y": 0, "width": 150, "height": 20}},
            "bi": {"id": "bi", "groupName": "bi", "bounds": {"x": 200, "y": 0, "width": 50, "height": 20}}
        },
        "edges": [
            {"fromId": "[\"raw\"]", "toId": "[\"clean\"]"},
            {"fromId": "[\"clean\"]", "toId": "[\"report\"]"}
        ]
    }"#;

    fn explorer() -> GraphExplorer {
        let mut explorer = GraphExplorer::from_asset_nodes(RECORDS).unwrap();
        explorer.set_layout(LAYOUT).unwrap();
        explorer
    }

    #[test]
    fn test_graph_explorer_creation() {
        let graph_json = r#"{
            "nodes": {},
            "downstream": {}
        }"#;

        let explorer = GraphExplorer::new(graph_json).unwrap();
        assert_eq!(explorer.node_count(), 0);
        assert!(!explorer.has_cycle());
    }

    #[test]
    fn test_direction_and_range() {
        let explorer = explorer();

        assert_eq!(explorer.direction_of("raw", "report").as_deref(), Some("downstream"));
        assert_eq!(explorer.direction_of("report", "raw").as_deref(), Some("upstream"));
        assert_eq!(explorer.direction_of("raw", "missing"), None);

        assert_eq!(
            explorer.tokens_in_range(Some("report".to_string()), "raw"),
            vec!["raw", "clean", "report"]
        );
        assert_eq!(explorer.tokens_in_range(None, "raw"), Vec::<String>::new());
    }

    #[test]
    fn test_render_detail_follows_scale() {
        let explorer = explorer();

        assert_eq!(explorer.render_detail(1.0), "full");
        assert_eq!(explorer.render_detail(0.3), "minimal");
        assert_eq!(explorer.render_detail(0.1), "collapsed");
    }

    #[test]
    fn test_edges_collapse_inside_groups() {
        let explorer = explorer();

        assert_eq!(explorer.edges_at(1.0).len(), 2);

        let collapsed: Vec<(&str, &str)> = explorer
            .edges_at(0.1)
            .iter()
            .map(|edge| (edge.from_id.as_str(), edge.to_id.as_str()))
            .collect();
        assert_eq!(collapsed, vec![(r#"["clean"]"#, r#"["report"]"#)]);
    }

    #[test]
    fn test_visible_nodes_and_groups() {
        let explorer = explorer();

        let nodes = explorer.visible_nodes(90.0, 0.0, 160.0, 50.0, 1.0);
        assert_eq!(nodes, vec![r#"["clean"]"#]);
        assert!(explorer.visible_nodes(0.0, 0.0, 300.0, 100.0, 0.1).is_empty());

        assert_eq!(explorer.visible_groups(180.0, 0.0, 300.0, 50.0), vec!["bi"]);
    }

    #[test]
    fn test_closest_node() {
        let explorer = explorer();

        assert_eq!(
            explorer.closest_node(r#"["raw"]"#, "right").as_deref(),
            Some(r#"["clean"]"#)
        );
        assert_eq!(explorer.closest_node(r#"["raw"]"#, "left"), None);
        assert_eq!(explorer.closest_node(r#"["raw"]"#, "sideways"), None);
    }

    #[test]
    fn test_parse_direction() {
        assert_eq!(parse_direction("ArrowUp"), Some(ArrowDirection::Up));
        assert_eq!(parse_direction("down"), Some(ArrowDirection::Down));
        assert_eq!(parse_direction(""), None);
    }
}
