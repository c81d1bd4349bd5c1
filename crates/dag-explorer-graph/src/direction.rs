use std::collections::HashSet;

use crate::{GraphData, GraphNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphDirection {
    Downstream,
    Upstream,
}

/// Whether `to` is reachable downstream of `from`.
///
/// Anything not found downstream is reported as `Upstream`, including pairs
/// that are not connected at all.
pub fn direction_of(graph: &GraphData, from: &GraphNode, to: &GraphNode) -> GraphDirection {
    let mut stack: Vec<&GraphNode> = vec![from];
    let mut visited: HashSet<&str> = HashSet::new();

    while let Some(node) = stack.pop() {
        if !visited.insert(node.id.as_str()) {
            continue;
        }

        let downstream: Vec<&GraphNode> = graph.downstream_of(&node.id).collect();
        if downstream.iter().any(|d| d.id == to.id) {
            return GraphDirection::Downstream;
        }
        stack.extend(downstream);
    }

    GraphDirection::Upstream
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{graph, id};

    #[test]
    fn test_chain_direction() {
        let g = graph(&[("a", "b"), ("b", "c")]);
        let a = g.node(&id("a")).unwrap();
        let c = g.node(&id("c")).unwrap();

        assert_eq!(direction_of(&g, a, c), GraphDirection::Downstream);
        assert_eq!(direction_of(&g, c, a), GraphDirection::Upstream);
    }

    #[test]
    fn test_disconnected_defaults_to_upstream() {
        let g = graph(&[("a", "b"), ("x", "y")]);
        let a = g.node(&id("a")).unwrap();
        let y = g.node(&id("y")).unwrap();

        assert_eq!(direction_of(&g, a, y), GraphDirection::Upstream);
        assert_eq!(direction_of(&g, y, a), GraphDirection::Upstream);
    }

    #[test]
    fn test_terminates_on_unexpected_cycle() {
        let mut g = graph(&[("a", "b"), ("b", "c")]);
        g.add_dependency(&id("c"), &id("a"));
        g.insert_node(crate::test_support::node("z"));

        let a = g.node(&id("a")).unwrap();
        let z = g.node(&id("z")).unwrap();
        assert_eq!(direction_of(&g, a, z), GraphDirection::Upstream);
    }
}
