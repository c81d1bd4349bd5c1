use petgraph::algo::{is_cyclic_directed, tarjan_scc};

use crate::{AssetKey, GraphData, build_graph};

/// True iff some node reaches itself through one or more downstream edges.
pub fn has_cycle(graph: &GraphData) -> bool {
    let (petgraph, _) = build_graph(graph);
    is_cyclic_directed(&petgraph)
}

/// Tokens of one strongly connected component that forms a cycle, sorted.
/// Self-loops count as a cycle of one.
pub fn find_cycle(graph: &GraphData) -> Option<Vec<String>> {
    let (petgraph, _) = build_graph(graph);

    tarjan_scc(&petgraph)
        .into_iter()
        .find(|component| match component.as_slice() {
            [single] => petgraph.contains_edge(*single, *single),
            _ => true,
        })
        .map(|component| {
            let mut members: Vec<String> = component
                .into_iter()
                .map(|idx| {
                    let id = &petgraph[idx];
                    AssetKey::from_node_id(id)
                        .map(|key| key.to_token())
                        .unwrap_or_else(|| id.clone())
                })
                .collect();
            members.sort();
            members
        })
}
