// Graph document and canvas viewport
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Size used for elements that carry no size of their own.
pub const FALLBACK_SIZE: [f64; 2] = [140.0, 80.0];

/// A positioned node. Fields this crate does not touch are kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    #[serde(default)]
    pub id: Value,
    pub pos: [f64; 2],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<[f64; 2]>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GraphNode {
    pub fn new(id: impl Into<Value>, pos: [f64; 2], size: Option<[f64; 2]>) -> Self {
        Self {
            id: id.into(),
            pos,
            size,
            extra: Map::new(),
        }
    }
}

/// A visual group; `bounding` is `[x, y, width, height]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphGroup {
    pub bounding: [f64; 4],
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GraphGroup {
    pub fn new(bounding: [f64; 4]) -> Self {
        Self {
            bounding,
            extra: Map::new(),
        }
    }
}

/// Canonical graph document. Subgraph boundary pseudo-nodes live outside
/// `nodes` under `inputNode` / `outputNode`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub groups: Vec<GraphGroup>,
    #[serde(rename = "inputNode", default, skip_serializing_if = "Option::is_none")]
    pub input_node: Option<GraphNode>,
    #[serde(rename = "outputNode", default, skip_serializing_if = "Option::is_none")]
    pub output_node: Option<GraphNode>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Graph {
    pub fn to_document(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    pub fn from_document(doc: Value) -> serde_json::Result<Self> {
        serde_json::from_value(doc)
    }
}

/// Pan/zoom of the host canvas. Screen position = (graph position + offset) * scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub offset: [f64; 2],
    pub scale: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            offset: [0.0, 0.0],
            scale: 1.0,
            width: 1280.0,
            height: 720.0,
        }
    }
}

impl Viewport {
    /// Graph-space point shown at the canvas midpoint.
    pub fn center_in_graph(&self) -> [f64; 2] {
        let scale = if self.scale > 0.0 { self.scale } else { 1.0 };
        [
            self.width / 2.0 / scale - self.offset[0],
            self.height / 2.0 / scale - self.offset[1],
        ]
    }

    /// Pan so graph-space origin sits at the canvas midpoint.
    pub fn center_on_origin(&mut self) {
        let scale = if self.scale > 0.0 { self.scale } else { 1.0 };
        self.offset = [self.width / 2.0 / scale, self.height / 2.0 / scale];
    }
}
