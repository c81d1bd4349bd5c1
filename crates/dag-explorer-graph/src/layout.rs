//! Layout results produced by the external layout engine, and the
//! bookkeeping that keeps only the newest one.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::ExplorerConfig;
use crate::error::ExplorerError;
use crate::GraphData;

/// Axis-aligned box in scene coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
pub struct LayoutNode {
    pub id: String,
    pub bounds: Bounds,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
#[serde(rename_all = "camelCase")]
pub struct LayoutGroup {
    pub id: String,
    #[serde(default)]
    pub group_name: String,
    pub bounds: Bounds,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
#[serde(rename_all = "camelCase")]
pub struct LayoutEdge {
    pub from_id: String,
    pub to_id: String,
    #[serde(default)]
    pub from: Point,
    #[serde(default)]
    pub to: Point,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
pub struct GraphLayout {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub nodes: BTreeMap<String, LayoutNode>,
    #[serde(default)]
    pub groups: BTreeMap<String, LayoutGroup>,
    #[serde(default)]
    pub edges: Vec<LayoutEdge>,
}

impl GraphLayout {
    pub fn from_json(json: &str) -> Result<Self, ExplorerError> {
        serde_json::from_str(json).map_err(ExplorerError::InvalidLayout)
    }

    pub fn bounds_of(&self, id: &str) -> Option<Bounds> {
        self.nodes.get(id).map(|node| node.bounds)
    }
}

/// A pending layout computation keyed on a graph snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutRequest {
    pub generation: u64,
    pub fingerprint: u64,
    /// Large graphs are laid out off the interaction tick; the UI shows a
    /// progress notice meanwhile.
    pub run_async: bool,
}

/// Tracks the newest layout request and drops results for older ones.
#[derive(Debug, Default)]
pub struct LayoutScheduler {
    async_threshold: usize,
    latest: Option<LayoutRequest>,
    current: Option<(u64, GraphLayout)>,
}

impl LayoutScheduler {
    pub fn new(config: &ExplorerConfig) -> Self {
        Self {
            async_threshold: config.async_layout_threshold,
            latest: None,
            current: None,
        }
    }

    /// Register a layout request for `graph`. An unchanged snapshot keeps
    /// its generation so an in-flight layout stays valid.
    pub fn request(&mut self, graph: &GraphData) -> LayoutRequest {
        let fingerprint = graph.fingerprint();
        if let Some(latest) = self.latest.filter(|l| l.fingerprint == fingerprint) {
            return latest;
        }

        let generation = self.latest.map(|l| l.generation + 1).unwrap_or(0);
        let request = LayoutRequest {
            generation,
            fingerprint,
            run_async: graph.nodes.len() > self.async_threshold,
        };
        self.latest = Some(request);
        request
    }

    /// Keep `layout` if it answers the newest request generation. Returns
    /// false for a stale result, which is discarded.
    pub fn accept(&mut self, generation: u64, layout: GraphLayout) -> bool {
        if self.latest.map(|l| l.generation) != Some(generation) {
            tracing::warn!(generation, "discarding stale layout result");
            return false;
        }
        self.current = Some((generation, layout));
        true
    }

    /// Forget the pending request and the accepted layout, e.g. after the
    /// graph was rejected.
    pub fn reset(&mut self) {
        self.latest = None;
        self.current = None;
    }

    pub fn is_loading(&self) -> bool {
        match (self.latest, &self.current) {
            (Some(latest), Some((generation, _))) => latest.generation != *generation,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    /// Whether the pending request runs off the interaction tick.
    pub fn is_async(&self) -> bool {
        self.is_loading() && self.latest.map(|l| l.run_async).unwrap_or(false)
    }

    /// Newest accepted layout with its generation, unless a newer request
    /// is still pending.
    pub fn layout(&self) -> Option<(u64, &GraphLayout)> {
        if self.is_loading() {
            return None;
        }
        self.current
            .as_ref()
            .map(|(generation, layout)| (*generation, layout))
    }
}
