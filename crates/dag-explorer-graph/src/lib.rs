use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::hash::{DefaultHasher, Hash, Hasher};

use petgraph::Graph;
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};

pub mod builder;
pub mod config;
pub mod cycle;
pub mod direction;
pub mod error;
pub mod explorer;
pub mod layout;
pub mod range;
pub mod recording;
pub mod selection;
pub mod viewport;

pub use builder::{AssetNodeRecord, build_graph_data};
pub use config::ExplorerConfig;
pub use cycle::{find_cycle, has_cycle};
pub use direction::{GraphDirection, direction_of};
pub use error::ExplorerError;
pub use explorer::{GatedGraph, GraphFetch, GraphNotice, gate};
pub use layout::{
    Bounds, GraphLayout, LayoutEdge, LayoutGroup, LayoutNode, LayoutRequest, LayoutScheduler,
};
pub use range::tokens_in_range;
pub use recording::{RecordedNavigator, RecordedViewport, ViewportCommand};
pub use selection::{
    AssetLocation, AssetLocator, ClickModifiers, ExplorerNavigator, ExplorerPath, GraphLocator,
    LaunchScope, PathChangeMode, SelectionMachine, SelectionState, ViewportSurface,
};
pub use viewport::{
    ArrowDirection, GROUPS_ONLY_SCALE, MINIMAL_SCALE, RenderDetail, ViewportFilter, ViewportRect,
    closest_node_in_direction, is_node_offscreen, visible_edges,
};

/// Adjacency keyed by node id. Entries may name ids that are missing from
/// [`GraphData::nodes`]; those are foreign/reference nodes.
pub type Adjacency = BTreeMap<String, BTreeSet<String>>;

/// Identity of an asset: a path of segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
pub struct AssetKey {
    pub path: Vec<String>,
}

impl AssetKey {
    pub fn new<I, S>(path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            path: path.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a selection token (`a/b/c`).
    pub fn from_token(token: &str) -> Self {
        Self::new(token.split('/'))
    }

    /// Parse a node id (the JSON encoding of the path).
    pub fn from_node_id(id: &str) -> Option<Self> {
        serde_json::from_str::<Vec<String>>(id)
            .ok()
            .map(|path| Self { path })
    }

    /// Token used for selection and URL encoding.
    pub fn to_token(&self) -> String {
        self.path.join("/")
    }

    /// Node id used as the key of [`GraphData::nodes`] and of layout boxes.
    pub fn to_node_id(&self) -> String {
        // A Vec<String> always serializes.
        serde_json::to_string(&self.path).unwrap_or_default()
    }
}

/// Convenience mirror of [`AssetKey::to_token`].
pub fn token_for_asset_key(key: &AssetKey) -> String {
    key.to_token()
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
pub struct RepositoryLocation {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
pub struct Repository {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub location: RepositoryLocation,
}

/// Definition payload of an asset. The graph algorithms only look at group
/// and repository membership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
#[serde(rename_all = "camelCase")]
pub struct AssetDefinition {
    pub asset_key: AssetKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    pub repository: Repository,
    #[serde(default)]
    pub op_names: Vec<String>,
    #[serde(default)]
    pub job_names: Vec<String>,
    #[serde(default)]
    pub is_observable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl AssetDefinition {
    /// Group membership compared when edges are collapsed at low zoom.
    pub fn membership(&self) -> (Option<&str>, &str, &str) {
        (
            self.group_name.as_deref(),
            self.repository.id.as_str(),
            self.repository.location.id.as_str(),
        )
    }
}

/// Graph node representation shared between the core and the frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: String,
    pub asset_key: AssetKey,
    pub definition: AssetDefinition,
}

impl GraphNode {
    pub fn new(definition: AssetDefinition) -> Self {
        Self {
            id: definition.asset_key.to_node_id(),
            asset_key: definition.asset_key.clone(),
            definition,
        }
    }

    pub fn token(&self) -> String {
        self.asset_key.to_token()
    }
}

/// What an id mentioned by the layout or by adjacency resolves to.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind<'a> {
    Present(&'a GraphNode),
    Reference(AssetKey),
}

/// In-memory dependency graph for the current query scope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
pub struct GraphData {
    pub nodes: HashMap<String, GraphNode>,
    #[serde(default)]
    pub downstream: Adjacency,
    #[serde(default)]
    pub upstream: Adjacency,
}

impl GraphData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a graph snapshot and derive upstream adjacency when the payload
    /// only carries the downstream side.
    pub fn from_json(json: &str) -> Result<Self, error::ExplorerError> {
        let mut graph: GraphData =
            serde_json::from_str(json).map_err(error::ExplorerError::InvalidGraph)?;
        if graph.upstream.is_empty() {
            graph.upstream = invert_adjacency(&graph.downstream);
        }
        Ok(graph)
    }

    pub fn insert_node(&mut self, node: GraphNode) {
        self.nodes.insert(node.id.clone(), node);
    }

    /// Record that `to` depends on `from`.
    pub fn add_dependency(&mut self, from: &str, to: &str) {
        self.downstream
            .entry(from.to_string())
            .or_default()
            .insert(to.to_string());
        self.upstream
            .entry(to.to_string())
            .or_default()
            .insert(from.to_string());
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    /// Node whose token is `token`. Path segments may themselves contain
    /// '/', so a split that misses falls back to comparing tokens.
    pub fn node_for_token(&self, token: &str) -> Option<&GraphNode> {
        if let Some(node) = self.node(&AssetKey::from_token(token).to_node_id()) {
            return Some(node);
        }
        self.nodes.values().find(|node| node.token() == token)
    }

    pub fn node_kind(&self, id: &str) -> Option<NodeKind<'_>> {
        match self.nodes.get(id) {
            Some(node) => Some(NodeKind::Present(node)),
            None => AssetKey::from_node_id(id).map(NodeKind::Reference),
        }
    }

    /// Downstream neighbours present in the graph. Dangling ids are skipped.
    pub fn downstream_of<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a GraphNode> + 'a {
        neighbours(&self.downstream, &self.nodes, id)
    }

    /// Upstream neighbours present in the graph. Dangling ids are skipped.
    pub fn upstream_of<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a GraphNode> + 'a {
        neighbours(&self.upstream, &self.nodes, id)
    }

    pub fn edge_count(&self) -> usize {
        self.downstream
            .iter()
            .filter(|(from, _)| self.nodes.contains_key(*from))
            .flat_map(|(_, targets)| targets)
            .filter(|to| self.nodes.contains_key(*to))
            .count()
    }

    /// Stable hash of node ids and adjacency, used to key layout requests.
    pub fn fingerprint(&self) -> u64 {
        let mut ids: Vec<&String> = self.nodes.keys().collect();
        ids.sort();

        let mut hasher = DefaultHasher::new();
        ids.hash(&mut hasher);
        self.downstream.hash(&mut hasher);
        hasher.finish()
    }
}

fn neighbours<'a>(
    adjacency: &'a Adjacency,
    nodes: &'a HashMap<String, GraphNode>,
    id: &str,
) -> impl Iterator<Item = &'a GraphNode> + 'a {
    adjacency
        .get(id)
        .into_iter()
        .flatten()
        .filter_map(move |neighbour| nodes.get(neighbour))
}

/// Swap the direction of every edge.
pub fn invert_adjacency(adjacency: &Adjacency) -> Adjacency {
    let mut inverted = Adjacency::new();
    for (from, targets) in adjacency {
        for to in targets {
            inverted.entry(to.clone()).or_default().insert(from.clone());
        }
    }
    inverted
}

/// Build a petgraph graph over the present nodes. Dangling edges are dropped.
pub fn build_graph(graph: &GraphData) -> (Graph<String, ()>, HashMap<String, NodeIndex>) {
    let mut ids: Vec<&String> = graph.nodes.keys().collect();
    ids.sort();

    let mut petgraph = Graph::<String, ()>::new();
    let mut node_map: HashMap<String, NodeIndex> = HashMap::new();

    for id in ids {
        let idx = petgraph.add_node(id.clone());
        node_map.insert(id.clone(), idx);
    }

    for (from, targets) in &graph.downstream {
        for to in targets {
            if let (Some(&source_idx), Some(&target_idx)) = (node_map.get(from), node_map.get(to)) {
                petgraph.add_edge(source_idx, target_idx, ());
            }
        }
    }

    (petgraph, node_map)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn definition(path: &str, group: &str, repo: &str, location: &str) -> AssetDefinition {
        AssetDefinition {
            asset_key: AssetKey::from_token(path),
            group_name: Some(group.to_string()),
            repository: Repository {
                id: repo.to_string(),
                name: repo.to_string(),
                location: RepositoryLocation {
                    id: location.to_string(),
                    name: location.to_string(),
                },
            },
            op_names: vec![path.replace('/', "__")],
            job_names: Vec::new(),
            is_observable: false,
            description: None,
        }
    }

    pub fn node(path: &str) -> GraphNode {
        GraphNode::new(definition(path, "default", "repo", "loc"))
    }

    pub fn id(path: &str) -> String {
        AssetKey::from_token(path).to_node_id()
    }

    /// Build a graph from `(from, to)` token pairs; every mentioned token
    /// becomes a present node.
    pub fn graph(edges: &[(&str, &str)]) -> GraphData {
        let mut graph = GraphData::new();
        for (from, to) in edges {
            graph.insert_node(node(from));
            graph.insert_node(node(to));
            graph.add_dependency(&id(from), &id(to));
        }
        graph
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_token_and_node_id() {
        let key = AssetKey::new(["raw", "orders"]);

        assert_eq!(key.to_token(), "raw/orders");
        assert_eq!(key.to_node_id(), r#"["raw","orders"]"#);
        assert_eq!(AssetKey::from_node_id(&key.to_node_id()), Some(key.clone()));
        assert_eq!(AssetKey::from_token("raw/orders"), key);
        assert_eq!(AssetKey::from_node_id("not json"), None);
    }

    #[test]
    fn test_node_for_token_with_slash_in_segment() {
        let mut graph = graph(&[("a", "b")]);
        let mut slashed = definition("x", "default", "repo", "loc");
        slashed.asset_key = AssetKey::new(["a/b"]);
        graph.insert_node(GraphNode::new(slashed));

        let node = graph.node_for_token("a/b").unwrap();
        assert_eq!(node.asset_key, AssetKey::new(["a/b"]));
        assert_eq!(node.id, r#"["a/b"]"#);
        assert_eq!(graph.node_for_token("a").map(|n| n.token()), Some("a".to_string()));
        assert!(graph.node_for_token("a/c").is_none());
    }

    #[test]
    fn test_neighbours_skip_dangling() {
        let mut graph = graph(&[("a", "b")]);
        graph.add_dependency(&id("a"), &id("foreign"));

        let downstream: Vec<String> = graph.downstream_of(&id("a")).map(|n| n.token()).collect();
        assert_eq!(downstream, vec!["b".to_string()]);
        assert_eq!(graph.edge_count(), 1);

        let upstream: Vec<String> = graph.upstream_of(&id("b")).map(|n| n.token()).collect();
        assert_eq!(upstream, vec!["a".to_string()]);
    }

    #[test]
    fn test_node_kind() {
        let mut graph = graph(&[("a", "b")]);
        graph.add_dependency(&id("x/y"), &id("a"));

        assert!(matches!(graph.node_kind(&id("a")), Some(NodeKind::Present(_))));
        assert_eq!(
            graph.node_kind(&id("x/y")),
            Some(NodeKind::Reference(AssetKey::new(["x", "y"])))
        );
    }

    #[test]
    fn test_from_json_derives_upstream() {
        let original = graph(&[("a", "b"), ("b", "c")]);
        let mut payload = original.clone();
        payload.upstream.clear();

        let json = serde_json::to_string(&payload).unwrap();
        let parsed = GraphData::from_json(&json).unwrap();

        assert_eq!(parsed.upstream, original.upstream);
        assert!(GraphData::from_json("{").is_err());
    }

    #[test]
    fn test_fingerprint_tracks_structure() {
        let a = graph(&[("a", "b")]);
        let b = graph(&[("a", "b")]);
        let c = graph(&[("a", "c")]);

        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn test_build_graph_drops_dangling_edges() {
        let mut graph = graph(&[("a", "b")]);
        graph.add_dependency(&id("b"), &id("missing"));

        let (petgraph, node_map) = build_graph(&graph);
        assert_eq!(petgraph.node_count(), 2);
        assert_eq!(petgraph.edge_count(), 1);
        assert!(node_map.contains_key(&id("a")));
    }
}
