use serde::{Deserialize, Serialize};

use crate::{AssetDefinition, AssetKey, GraphData, GraphNode, Repository};

/// Flat asset record as returned by the data-fetch layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
#[serde(rename_all = "camelCase")]
pub struct AssetNodeRecord {
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
    /// Assets this one depends on.
    #[serde(default)]
    pub dependency_keys: Vec<AssetKey>,
}

impl AssetNodeRecord {
    fn definition(&self) -> AssetDefinition {
        AssetDefinition {
            asset_key: self.asset_key.clone(),
            group_name: self.group_name.clone(),
            repository: self.repository.clone(),
            op_names: self.op_names.clone(),
            job_names: self.job_names.clone(),
            is_observable: self.is_observable,
            description: self.description.clone(),
        }
    }
}

/// Build the dependency graph from fetched records.
///
/// Dependencies on assets outside `records` stay in the adjacency maps and
/// surface as reference nodes.
pub fn build_graph_data(records: &[AssetNodeRecord]) -> GraphData {
    let mut graph = GraphData::new();

    for record in records {
        graph.insert_node(GraphNode::new(record.definition()));
    }

    for record in records {
        let id = record.asset_key.to_node_id();
        for dependency in &record.dependency_keys {
            graph.add_dependency(&dependency.to_node_id(), &id);
        }
    }

    tracing::debug!(
        nodes = graph.nodes.len(),
        edges = graph.edge_count(),
        "built asset graph"
    );

    graph
}
