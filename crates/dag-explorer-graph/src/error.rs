use thiserror::Error;

/// Errors that stop the explorer from rendering a graph snapshot.
#[derive(Error, Debug)]
pub enum ExplorerError {
    #[error("Query error: the asset graph could not be loaded")]
    QueryError,
    #[error("Cycle detected: asset dependencies form a cycle ({})", .members.join(", "))]
    CycleDetected { members: Vec<String> },
    #[error("Failed to parse graph JSON: {0}")]
    InvalidGraph(serde_json::Error),
    #[error("Failed to parse layout JSON: {0}")]
    InvalidLayout(serde_json::Error),
}
