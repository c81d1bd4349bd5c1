use serde::Serialize;

use crate::cycle::find_cycle;
use crate::error::ExplorerError;
use crate::GraphData;

/// What the data-fetch layer handed over for the current query.
#[derive(Debug, Clone, Default)]
pub struct GraphFetch {
    /// Graph after query filtering; `None` when the query failed.
    pub graph: Option<GraphData>,
    /// Number of assets the query could match before filtering.
    pub query_item_count: usize,
    /// The graph is too large to show by default and an empty selection was applied.
    pub applying_empty_default: bool,
}

/// User-visible state that is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GraphNotice {
    Empty,
    LargeDag,
    EntirelyFiltered,
}

impl GraphNotice {
    pub fn title(&self) -> &'static str {
        match self {
            GraphNotice::Empty => "Empty graph",
            GraphNotice::LargeDag => "Large graph",
            GraphNotice::EntirelyFiltered => "Nothing to display",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            GraphNotice::Empty => {
                "This graph is empty. Assets will appear here when they are added to your definitions."
            }
            GraphNotice::LargeDag => {
                "This is a large graph that may be difficult to visualize. Type * in the query to render the entire thing, or type asset names and use + or * to expand around them."
            }
            GraphNotice::EntirelyFiltered => {
                "No assets match your query filter. Try removing your filter, typing * to render the entire graph, or entering another filter string."
            }
        }
    }
}

/// A graph cleared for layout.
#[derive(Debug, Clone)]
pub struct GatedGraph {
    pub graph: GraphData,
    pub notice: Option<GraphNotice>,
}

/// Decide whether a fetched graph may be laid out and rendered.
///
/// Cycles are fatal for the snapshot; a new fetch or filter change is
/// needed before rendering is attempted again.
pub fn gate(fetch: GraphFetch) -> Result<GatedGraph, ExplorerError> {
    let Some(graph) = fetch.graph else {
        tracing::debug!("no usable graph in fetch result");
        return Err(ExplorerError::QueryError);
    };

    if let Some(members) = find_cycle(&graph) {
        tracing::warn!(?members, "asset dependencies form a cycle");
        return Err(ExplorerError::CycleDetected { members });
    }

    let notice = if fetch.query_item_count == 0 {
        Some(GraphNotice::Empty)
    } else if fetch.applying_empty_default {
        Some(GraphNotice::LargeDag)
    } else if graph.nodes.is_empty() {
        Some(GraphNotice::EntirelyFiltered)
    } else {
        None
    };

    tracing::debug!(nodes = graph.nodes.len(), ?notice, "graph cleared for layout");
    Ok(GatedGraph { graph, notice })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{graph, id};

    fn fetch(graph: Option<GraphData>, query_item_count: usize) -> GraphFetch {
        GraphFetch {
            graph,
            query_item_count,
            applying_empty_default: false,
        }
    }

    #[test]
    fn test_missing_graph_is_query_error() {
        assert!(matches!(gate(fetch(None, 3)), Err(ExplorerError::QueryError)));
    }

    #[test]
    fn test_cycle_is_fatal() {
        let mut g = graph(&[("a", "b")]);
        g.add_dependency(&id("b"), &id("a"));

        match gate(fetch(Some(g), 2)) {
            Err(err @ ExplorerError::CycleDetected { .. }) => {
                assert_eq!(
                    err.to_string(),
                    "Cycle detected: asset dependencies form a cycle (a, b)"
                );
            }
            other => panic!("expected cycle error, got {other:?}"),
        }
    }

    #[test]
    fn test_notices() {
        let gated = gate(fetch(Some(GraphData::new()), 0)).unwrap();
        assert_eq!(gated.notice, Some(GraphNotice::Empty));

        let gated = gate(fetch(Some(GraphData::new()), 4)).unwrap();
        assert_eq!(gated.notice, Some(GraphNotice::EntirelyFiltered));

        let gated = gate(GraphFetch {
            graph: Some(GraphData::new()),
            query_item_count: 400,
            applying_empty_default: true,
        })
        .unwrap();
        assert_eq!(gated.notice, Some(GraphNotice::LargeDag));

        let gated = gate(fetch(Some(graph(&[("a", "b")])), 2)).unwrap();
        assert_eq!(gated.notice, None);
        assert_eq!(gated.graph.nodes.len(), 2);
    }
}
