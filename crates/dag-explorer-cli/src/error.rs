use std::path::PathBuf;

use dag_explorer_graph::ExplorerError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to read {0}: {1}")]
    Read(PathBuf, std::io::Error),

    #[error("Failed to parse config {0}: {1}")]
    Config(PathBuf, toml::de::Error),

    #[error("Failed to parse asset records: {0}")]
    Records(serde_json::Error),

    #[error("Unknown asset: {0}")]
    UnknownAsset(String),

    #[error("Invalid event on line {line}: {text}")]
    InvalidEvent { line: usize, text: String },

    #[error("A layout is required for this command")]
    MissingLayout,

    #[error(transparent)]
    Explorer(#[from] ExplorerError),
}
