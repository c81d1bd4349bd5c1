use std::collections::HashSet;

use crate::direction::{GraphDirection, direction_of};
use crate::{GraphData, GraphNode};

/// Tokens of every node on a downstream path connecting `from` and `to`,
/// in root-to-leaf order with duplicates removed.
///
/// The pair is swapped when `to` lies upstream of `from`, so edges are only
/// ever walked downstream. Returns an empty list when `from` is missing or no
/// path exists.
pub fn tokens_in_range<'a>(
    graph: &'a GraphData,
    from: Option<&'a GraphNode>,
    to: &'a GraphNode,
) -> Vec<String> {
    let tokens = collect_range(graph, from, to, &[]);
    tracing::debug!(to = %to.token(), count = tokens.len(), "range selection");
    tokens
}

fn collect_range<'a>(
    graph: &'a GraphData,
    from: Option<&'a GraphNode>,
    to: &'a GraphNode,
    seen: &[&'a str],
) -> Vec<String> {
    let Some(mut from) = from else {
        return Vec::new();
    };
    let mut to = to;

    if from.id == to.id {
        return vec![to.token()];
    }

    if seen.is_empty() && direction_of(graph, from, to) == GraphDirection::Upstream {
        std::mem::swap(&mut from, &mut to);
    }

    // Each branch below gets this snapshot; siblings never observe each other's visits.
    let mut branch_seen: Vec<&'a str> = seen.to_vec();
    branch_seen.push(from.id.as_str());

    let mut led_to_target: Vec<String> = Vec::new();
    for node in graph.downstream_of(&from.id) {
        if seen.contains(&node.id.as_str()) {
            continue;
        }
        let result = collect_range(graph, Some(node), to, &branch_seen);
        if !result.is_empty() {
            led_to_target.push(from.token());
            led_to_target.extend(result);
        }
    }

    uniq(led_to_target)
}

/// Remove duplicates, keeping the first occurrence.
pub(crate) fn uniq(tokens: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tokens
        .into_iter()
        .filter(|token| seen.insert(token.clone()))
        .collect()
}
