use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use dag_explorer_graph::{
    ArrowDirection, AssetKey, AssetNodeRecord, ClickModifiers, ExplorerConfig, ExplorerPath,
    GraphData, GraphDirection, GraphFetch, GraphLayout, GraphLocator, GraphNode, PathChangeMode,
    RecordedNavigator, RecordedViewport, SelectionMachine, SelectionState, ViewportFilter,
    build_graph_data, direction_of, gate, tokens_in_range,
};

use crate::error::CliError;

type Machine = SelectionMachine<RecordedViewport, RecordedNavigator>;

fn read(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|e| CliError::Read(path.to_path_buf(), e))
}

/// Explorer settings from a TOML file, or the defaults.
pub fn load_config(path: Option<&Path>) -> Result<ExplorerConfig, CliError> {
    let Some(path) = path else {
        return Ok(ExplorerConfig::default());
    };
    toml::from_str(&read(path)?).map_err(|e| CliError::Config(path.to_path_buf(), e))
}

/// Accepts either a graph snapshot object or an array of asset records.
pub fn parse_graph(json: &str) -> Result<GraphData, CliError> {
    if json.trim_start().starts_with('[') {
        let records: Vec<AssetNodeRecord> =
            serde_json::from_str(json).map_err(CliError::Records)?;
        return Ok(build_graph_data(&records));
    }
    Ok(GraphData::from_json(json)?)
}

pub fn load_graph(path: &Path) -> Result<GraphData, CliError> {
    parse_graph(&read(path)?)
}

pub fn load_layout(path: &Path) -> Result<GraphLayout, CliError> {
    Ok(GraphLayout::from_json(&read(path)?)?)
}

fn present<'g>(graph: &'g GraphData, token: &str) -> Result<&'g GraphNode, CliError> {
    graph
        .node_for_token(token)
        .ok_or_else(|| CliError::UnknownAsset(token.to_string()))
}

/// Node id for a token that is either in the graph or referenced by it.
fn known_id(graph: &GraphData, token: &str) -> Result<String, CliError> {
    if let Some(node) = graph.node_for_token(token) {
        return Ok(node.id.clone());
    }
    let id = AssetKey::from_token(token).to_node_id();
    let known = graph.nodes.contains_key(&id)
        || graph.downstream.contains_key(&id)
        || graph.upstream.contains_key(&id);
    if known {
        Ok(id)
    } else {
        Err(CliError::UnknownAsset(token.to_string()))
    }
}

fn token_of(id: &str) -> String {
    AssetKey::from_node_id(id)
        .map(|key| key.to_token())
        .unwrap_or_else(|| id.to_string())
}

fn reference_ids(graph: &GraphData) -> BTreeSet<&str> {
    graph
        .downstream
        .iter()
        .chain(graph.upstream.iter())
        .flat_map(|(from, targets)| std::iter::once(from).chain(targets))
        .map(String::as_str)
        .filter(|id| !graph.nodes.contains_key(*id))
        .collect()
}

/// Gate the graph the way the explorer does before layout.
pub fn check(
    graph: GraphData,
    query_item_count: Option<usize>,
    applying_empty_default: bool,
) -> Result<String, CliError> {
    let query_item_count = query_item_count.unwrap_or(graph.nodes.len());
    let gated = gate(GraphFetch {
        graph: Some(graph),
        query_item_count,
        applying_empty_default,
    })?;

    let mut lines = vec![format!(
        "ok: {} nodes, {} edges, {} references",
        gated.graph.nodes.len(),
        gated.graph.edge_count(),
        reference_ids(&gated.graph).len()
    )];
    if let Some(notice) = gated.notice {
        lines.push(format!("{}: {}", notice.title(), notice.description()));
    }
    Ok(lines.join("\n"))
}

pub fn direction(graph: &GraphData, from: &str, to: &str) -> Result<String, CliError> {
    let direction = direction_of(graph, present(graph, from)?, present(graph, to)?);
    Ok(match direction {
        GraphDirection::Downstream => "downstream",
        GraphDirection::Upstream => "upstream",
    }
    .to_string())
}

pub fn range(graph: &GraphData, from: &str, to: &str) -> Result<String, CliError> {
    let tokens = tokens_in_range(graph, Some(present(graph, from)?), present(graph, to)?);
    if tokens.is_empty() {
        return Ok("(no path)".to_string());
    }
    Ok(tokens.join("\n"))
}

/// Render detail and the edges drawn at `scale`.
pub fn edges(
    graph: &GraphData,
    layout: &GraphLayout,
    config: &ExplorerConfig,
    scale: f64,
) -> String {
    let filter = ViewportFilter::new(config, layout);
    let detail = serde_json::to_string(&filter.render_detail(scale)).unwrap_or_default();

    let mut lines = vec![format!("detail: {}", detail.trim_matches('"'))];
    lines.extend(
        filter
            .visible_edges(&layout.edges, scale, graph)
            .into_iter()
            .map(|edge| format!("{} -> {}", token_of(&edge.from_id), token_of(&edge.to_id))),
    );
    lines.join("\n")
}

enum Event<'a> {
    Click(&'a str, ClickModifiers),
    Background,
    Arrow(ArrowDirection),
    Render,
    DoubleClick(&'a str),
    GroupDoubleClick(&'a str, f64),
    BackgroundDoubleClick,
    Query(&'a str),
    ClearQuery,
    ToggleRendering,
}

impl<'a> Event<'a> {
    fn parse(text: &'a str) -> Option<Self> {
        let (verb, rest) = text.split_once(' ').unwrap_or((text, ""));
        let rest = rest.trim();
        let argument = (!rest.is_empty()).then_some(rest);

        let event = match verb {
            "click" => Event::Click(argument?, ClickModifiers::NONE),
            "shift" => Event::Click(argument?, ClickModifiers::SHIFT),
            "meta" => Event::Click(argument?, ClickModifiers::META),
            "shift-meta" => Event::Click(
                argument?,
                ClickModifiers {
                    shift: true,
                    meta: true,
                },
            ),
            "background" => Event::Background,
            "arrow" => Event::Arrow(match argument? {
                "left" => ArrowDirection::Left,
                "right" => ArrowDirection::Right,
                "up" => ArrowDirection::Up,
                "down" => ArrowDirection::Down,
                _ => return None,
            }),
            "render" => Event::Render,
            "dblclick" => Event::DoubleClick(argument?),
            "dblclick-group" => {
                let (group, fit) = argument?.split_once(' ')?;
                Event::GroupDoubleClick(group, fit.trim().parse().ok()?)
            }
            "dblclick-background" => Event::BackgroundDoubleClick,
            "query" => Event::Query(rest),
            "clear-query" => Event::ClearQuery,
            "toggle-rendering" => Event::ToggleRendering,
            _ => return None,
        };
        Some(event)
    }
}

/// Replay an event script through the selection machine and describe what
/// it asked the surface and the navigator to do after each event.
///
/// One event per line: `click <token>`, `shift <token>`, `meta <token>`,
/// `shift-meta <token>`, `background`, `arrow <left|right|up|down>`,
/// `render`, `dblclick <token>`, `dblclick-group <group id> <fit scale>`,
/// `dblclick-background`, `query <text>`, `clear-query`,
/// `toggle-rendering`. Blank lines and `#` comments are skipped.
pub fn select(
    graph: &GraphData,
    layout: Option<&GraphLayout>,
    config: &ExplorerConfig,
    path: ExplorerPath,
    script: &str,
) -> Result<String, CliError> {
    let mut machine: Machine = SelectionMachine::new(
        path,
        config.clone(),
        RecordedViewport::default(),
        RecordedNavigator::default(),
    );
    let locator = GraphLocator(graph);
    let mut generation = 0;
    let mut lines = Vec::new();

    for (index, text) in script.lines().enumerate() {
        let text = text.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        let event = Event::parse(text).ok_or_else(|| CliError::InvalidEvent {
            line: index + 1,
            text: text.to_string(),
        })?;

        match event {
            Event::Click(token, modifiers) => {
                let id = known_id(graph, token)?;
                machine.on_node_click(graph, layout, &id, modifiers, &locator);
            }
            Event::Background => machine.on_background_click(),
            Event::Arrow(direction) => machine.on_arrow_key(graph, layout, direction),
            Event::Render => {
                // Each render shows a freshly computed layout.
                let layout = layout.ok_or(CliError::MissingLayout)?;
                machine.on_layout_rendered(graph, generation, layout);
                generation += 1;
            }
            Event::DoubleClick(token) => {
                let layout = layout.ok_or(CliError::MissingLayout)?;
                machine.on_node_double_click(layout, &known_id(graph, token)?);
            }
            Event::GroupDoubleClick(group, fit) => {
                let layout = layout.ok_or(CliError::MissingLayout)?;
                machine.viewport_mut().fit_scale = fit;
                machine.on_group_double_click(layout, group);
            }
            Event::BackgroundDoubleClick => machine.on_background_double_click(),
            Event::Query(query) => machine.set_query(query),
            Event::ClearQuery => machine.clear_query(),
            Event::ToggleRendering => {
                machine.toggle_asset_rendering(graph);
            }
        }

        lines.push(format!("> {text}"));
        lines.extend(describe(&mut machine));
    }

    Ok(lines.join("\n"))
}

fn describe(machine: &mut Machine) -> Vec<String> {
    let state = match machine.state() {
        SelectionState::Idle => "idle",
        SelectionState::Single => "single",
        SelectionState::Multi => "multi",
    };
    let mut lines = vec![format!(
        "  selection ({state}) [{}]",
        machine.selected_tokens().join(", ")
    )];
    if !machine.prefers_asset_rendering() {
        lines.push("  rendering ops".to_string());
    }

    for command in machine.viewport_mut().drain() {
        lines.push(format!(
            "  viewport {}",
            serde_json::to_string(&command).unwrap_or_default()
        ));
    }

    let navigator = machine.navigator_mut();
    for (path, mode) in std::mem::take(&mut navigator.changes) {
        let mode = match mode {
            PathChangeMode::Replace => "replace",
            PathChangeMode::Push => "push",
        };
        lines.push(format!(
            "  path {mode} {}",
            serde_json::to_string(&path).unwrap_or_default()
        ));
    }
    for location in std::mem::take(&mut navigator.navigations) {
        lines.push(format!(
            "  navigate {} (repository {})",
            location.asset_key.to_token(),
            location.repository_name.as_deref().unwrap_or("unknown")
        ));
    }

    lines
}
