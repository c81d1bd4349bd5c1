//! Integration tests for the dag-explorer commands

use std::path::PathBuf;

#[path = "../src/error.rs"]
mod error;

#[path = "../src/commands.rs"]
mod commands;

use dag_explorer_graph::{ExplorerConfig, ExplorerPath};
use error::CliError;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn assets() -> dag_explorer_graph::GraphData {
    commands::load_graph(&fixture_path("assets.json")).expect("Failed to load assets")
}

fn layout() -> dag_explorer_graph::GraphLayout {
    commands::load_layout(&fixture_path("layout.json")).expect("Failed to load layout")
}

#[test]
fn test_check_counts_nodes_edges_and_references() {
    let output = commands::check(assets(), None, false).unwrap();

    insta::assert_snapshot!(output, @"ok: 5 nodes, 5 edges, 1 references");
}

#[test]
fn test_check_reports_empty_notice() {
    let output = commands::check(assets(), Some(0), false).unwrap();

    insta::assert_snapshot!(output, @r###"
ok: 5 nodes, 5 edges, 1 references
Empty graph: This graph is empty. Assets will appear here when they are added to your definitions.
"###);
}

#[test]
fn test_check_rejects_cycles() {
    let graph = commands::load_graph(&fixture_path("cyclic.json")).unwrap();

    let err = commands::check(graph, None, false).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Cycle detected: asset dependencies form a cycle (a, b)"
    );
}

#[test]
fn test_direction() {
    let graph = assets();

    assert_eq!(commands::direction(&graph, "raw", "dashboard").unwrap(), "downstream");
    assert_eq!(commands::direction(&graph, "dashboard", "raw").unwrap(), "upstream");
    assert!(matches!(
        commands::direction(&graph, "raw", "nope"),
        Err(CliError::UnknownAsset(token)) if token == "nope"
    ));
}

#[test]
fn test_range_through_diamond() {
    let graph = assets();

    insta::assert_snapshot!(commands::range(&graph, "raw", "dashboard").unwrap(), @r###"
raw
clean
metrics
dashboard
report
"###);
}

#[test]
fn test_range_is_symmetric_and_can_be_empty() {
    let graph = assets();

    assert_eq!(
        commands::range(&graph, "clean", "raw").unwrap(),
        commands::range(&graph, "raw", "clean").unwrap()
    );
    assert_eq!(commands::range(&graph, "report", "metrics").unwrap(), "(no path)");
}

#[test]
fn test_edges_collapse_at_low_zoom() {
    let graph = assets();
    let layout = layout();
    let config = ExplorerConfig::default();

    let full = commands::edges(&graph, &layout, &config, 1.0);
    assert!(full.starts_with("detail: full\n"));
    assert_eq!(full.lines().count(), 7);

    insta::assert_snapshot!(commands::edges(&graph, &layout, &config, 0.1), @r###"
detail: collapsed
clean -> report
clean -> metrics
external/feed -> dashboard
"###);
}

#[test]
fn test_config_file_overrides_thresholds() {
    let config = commands::load_config(Some(fixture_path("explorer.toml").as_path())).unwrap();
    assert_eq!(config.groups_only_scale, 0.05);
    assert_eq!(config.node_zoom_scale, 2.0);
    assert_eq!(config.minimal_scale, 0.6);

    let output = commands::edges(&assets(), &layout(), &config, 0.1);
    assert!(output.starts_with("detail: minimal\n"));
    assert_eq!(output.lines().count(), 7);
}

#[test]
fn test_missing_config_file() {
    let err = commands::load_config(Some(fixture_path("missing.toml").as_path())).unwrap_err();
    assert!(matches!(err, CliError::Read(..)));
}

#[test]
fn test_select_session_replay() {
    let graph = assets();
    let layout = layout();
    let script = std::fs::read_to_string(fixture_path("session.txt")).unwrap();

    let output = commands::select(
        &graph,
        Some(&layout),
        &ExplorerConfig::default(),
        ExplorerPath::default(),
        &script,
    )
    .unwrap();

    insta::assert_snapshot!(output, @r###"
> render
  selection (idle) []
  viewport {"command":"autocenter","animate":false}
> click raw
  selection (single) [raw]
  viewport {"command":"zoomToSvgCoords","x":0.0,"y":0.0,"animate":true}
  path replace {"opNames":["raw"],"opsQuery":"","pipelineName":""}
> shift dashboard
  selection (multi) [raw, clean, metrics, dashboard, report]
  viewport {"command":"zoomToSvgCoords","x":200.0,"y":0.0,"animate":true}
  path replace {"opNames":["raw,clean,metrics,dashboard,report"],"opsQuery":"","pipelineName":""}
> meta metrics
  selection (multi) [raw, clean, dashboard, report]
  viewport {"command":"zoomToSvgCoords","x":200.0,"y":0.0,"animate":true}
  path replace {"opNames":["raw,clean,dashboard,report"],"opsQuery":"","pipelineName":""}
> arrow down
  selection (single) [metrics]
  viewport {"command":"zoomToSvgCoords","x":200.0,"y":100.0,"animate":true}
  viewport {"command":"zoomToSvgBox","bounds":{"x":200.0,"y":100.0,"width":50.0,"height":20.0},"animate":true,"targetScale":null}
  path replace {"opNames":["metrics"],"opsQuery":"","pipelineName":""}
> background
  selection (idle) []
  path replace {"opNames":[],"opsQuery":"","pipelineName":""}
> click external/feed
  selection (idle) []
  navigate external/feed (repository unknown)
> dblclick-group bi@warehouse:etl 2.0
  selection (idle) []
  viewport {"command":"zoomToSvgBox","bounds":{"x":200.0,"y":0.0,"width":150.0,"height":120.0},"animate":true,"targetScale":1.8}
> dblclick report
  selection (idle) []
  viewport {"command":"zoomToSvgBox","bounds":{"x":200.0,"y":0.0,"width":50.0,"height":20.0},"animate":true,"targetScale":1.2}
> dblclick-background
  selection (idle) []
  viewport {"command":"autocenter","animate":true}
> query raw+
  selection (idle) []
  path replace {"opNames":[],"opsQuery":"raw+","pipelineName":""}
> clear-query
  selection (idle) []
  path push {"opNames":[],"opsQuery":"","pipelineName":""}
"###);
}

#[test]
fn test_select_starts_from_initial_selection() {
    let graph = assets();
    let path = ExplorerPath {
        op_names: vec!["report".to_string()],
        ..ExplorerPath::default()
    };

    let output = commands::select(
        &graph,
        Some(&layout()),
        &ExplorerConfig::default(),
        path,
        "render",
    )
    .unwrap();

    insta::assert_snapshot!(output, @r###"
> render
  selection (single) [report]
  viewport {"command":"zoomToSvgBox","bounds":{"x":200.0,"y":0.0,"width":50.0,"height":20.0},"animate":false,"targetScale":null}
  viewport {"command":"focus"}
"###);
}

#[test]
fn test_select_toggles_rendering() {
    let graph = assets();

    let output = commands::select(
        &graph,
        None,
        &ExplorerConfig::default(),
        ExplorerPath::default(),
        "click clean\ntoggle-rendering\ntoggle-rendering",
    )
    .unwrap();

    insta::assert_snapshot!(output, @r###"
> click clean
  selection (single) [clean]
  path replace {"opNames":["clean"],"opsQuery":"","pipelineName":""}
> toggle-rendering
  selection (single) [clean]
  rendering ops
  path replace {"opNames":["clean"],"opsQuery":"","pipelineName":""}
> toggle-rendering
  selection (single) [clean]
  path replace {"opNames":["clean"],"opsQuery":"","pipelineName":""}
"###);
}

#[test]
fn test_select_token_with_slash_in_segment() {
    let graph = commands::parse_graph(
        r#"[
            {"assetKey": {"path": ["s3://bucket/orders"]},
             "repository": {"id": "r", "location": {"id": "l"}}}
        ]"#,
    )
    .unwrap();

    let output = commands::select(
        &graph,
        None,
        &ExplorerConfig::default(),
        ExplorerPath::default(),
        "click s3://bucket/orders",
    )
    .unwrap();

    insta::assert_snapshot!(output, @r###"
> click s3://bucket/orders
  selection (single) [s3://bucket/orders]
  path replace {"opNames":["s3://bucket/orders"],"opsQuery":"","pipelineName":""}
"###);
}

#[test]
fn test_select_rejects_bad_scripts() {
    let graph = assets();
    let config = ExplorerConfig::default();

    let err = commands::select(&graph, None, &config, ExplorerPath::default(), "click raw\nwiggle")
        .unwrap_err();
    assert!(matches!(err, CliError::InvalidEvent { line: 2, .. }));

    let err = commands::select(&graph, None, &config, ExplorerPath::default(), "click ghost")
        .unwrap_err();
    assert!(matches!(err, CliError::UnknownAsset(_)));

    let err = commands::select(&graph, None, &config, ExplorerPath::default(), "render")
        .unwrap_err();
    assert!(matches!(err, CliError::MissingLayout));
}
