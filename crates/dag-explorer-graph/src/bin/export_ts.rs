use std::error::Error;
use std::fs;
use std::path::PathBuf;

use dag_explorer_graph::{
    AssetLocation, ExplorerConfig, ExplorerPath, GraphData, GraphLayout, RenderDetail,
    SelectionState, ViewportCommand, ViewportRect,
};
use ts_rs::TS;

fn main() -> Result<(), Box<dyn Error>> {
    let out_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("frontend")
        .join("src")
        .join("bindings");

    fs::create_dir_all(&out_dir)?;

    let export = |result: Result<(), ts_rs::ExportError>| {
        result.map_err(|err| format!("failed to export TypeScript bindings: {err}"))
    };

    export(GraphData::export_all_to(&out_dir))?;
    export(GraphLayout::export_all_to(&out_dir))?;
    export(ExplorerPath::export_all_to(&out_dir))?;
    export(ExplorerConfig::export_all_to(&out_dir))?;
    export(AssetLocation::export_all_to(&out_dir))?;
    export(ViewportCommand::export_all_to(&out_dir))?;
    export(ViewportRect::export_all_to(&out_dir))?;
    export(RenderDetail::export_all_to(&out_dir))?;
    export(SelectionState::export_all_to(&out_dir))?;

    println!("Generated TypeScript bindings in {}", out_dir.display());
    Ok(())
}
