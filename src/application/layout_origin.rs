// Layout origin tool - Move the graph's bounding box center to the origin
use crate::domain::graph::{Graph, GraphNode, Viewport, FALLBACK_SIZE};
use serde::Serialize;

/// Host canvas state the tool reads and writes.
pub trait HostCanvas {
    fn graph_mut(&mut self) -> Option<&mut Graph>;

    fn viewport_mut(&mut self) -> &mut Viewport;

    fn mark_dirty(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RecenterOutcome {
    /// No graph is loaded.
    NoGraph,
    NoNodes,
    Recentered { moved: usize, shift: [f64; 2] },
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Bounds {
    min: [f64; 2],
    max: [f64; 2],
}

impl Bounds {
    fn center(&self) -> [f64; 2] {
        [
            (self.min[0] + self.max[0]) / 2.0,
            (self.min[1] + self.max[1]) / 2.0,
        ]
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

fn extend(bounds: Option<Bounds>, pos: [f64; 2], size: [f64; 2]) -> Option<Bounds> {
    let x = finite_or_zero(pos[0]);
    let y = finite_or_zero(pos[1]);
    let w = finite_or_zero(size[0]);
    let h = finite_or_zero(size[1]);
    let (lo, hi) = ([x.min(x + w), y.min(y + h)], [x.max(x + w), y.max(y + h)]);

    Some(match bounds {
        None => Bounds { min: lo, max: hi },
        Some(b) => Bounds {
            min: [b.min[0].min(lo[0]), b.min[1].min(lo[1])],
            max: [b.max[0].max(hi[0]), b.max[1].max(hi[1])],
        },
    })
}

fn translate(pos: &mut [f64; 2], shift: [f64; 2]) {
    pos[0] = finite_or_zero(pos[0]) + shift[0];
    pos[1] = finite_or_zero(pos[1]) + shift[1];
}

/// Shift every node and group so the union bounding box is centered on the
/// origin, then pan the view so the origin sits at the canvas midpoint.
pub fn recenter_to_origin(canvas: &mut dyn HostCanvas) -> RecenterOutcome {
    let Some(graph) = canvas.graph_mut() else {
        return RecenterOutcome::NoGraph;
    };

    let Graph { nodes, groups, input_node, output_node, .. } = graph;
    // boundary pseudo-nodes live outside `nodes` and must move with them
    let mut nodes: Vec<&mut GraphNode> = nodes
        .iter_mut()
        .chain(input_node.as_mut())
        .chain(output_node.as_mut())
        .collect();
    let mut bounds = None;
    if nodes.is_empty() {
        tracing::info!("No nodes to move");
        return RecenterOutcome::NoNodes;
    }
    for node in &nodes {
        bounds = extend(bounds, node.pos, node.size.unwrap_or(FALLBACK_SIZE));
    }
    let Some(bounds) = bounds else {
        return RecenterOutcome::NoNodes;
    };
    let moved = nodes.len();

    let bounds = groups.iter().fold(bounds, |acc, g| {
        let [x, y, w, h] = g.bounding;
        extend(Some(acc), [x, y], [w, h]).unwrap_or(acc)
    });

    let center = bounds.center();
    let shift = [-center[0], -center[1]];
    for node in nodes.iter_mut() {
        translate(&mut node.pos, shift);
    }
    for group in groups.iter_mut() {
        let mut pos = [group.bounding[0], group.bounding[1]];
        translate(&mut pos, shift);
        group.bounding[0] = pos[0];
        group.bounding[1] = pos[1];
    }

    canvas.mark_dirty();
    canvas.viewport_mut().center_on_origin();
    tracing::info!("Moved {} nodes by ({:.1}, {:.1})", moved, shift[0], shift[1]);
    RecenterOutcome::Recentered { moved, shift }
}
