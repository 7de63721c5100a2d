// Workspace - The graph document and canvas viewport this process edits
use crate::application::bridge_listener::WorkflowSource;
use crate::application::coordinate_readout::ViewportSource;
use crate::application::layout_origin::{recenter_to_origin, HostCanvas, RecenterOutcome};
use crate::domain::graph::{Graph, Viewport};
use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Default)]
pub struct Workspace {
    graph: Option<Graph>,
    viewport: Viewport,
    dirty: bool,
    path: Option<PathBuf>,
}

impl Workspace {
    pub fn new(graph: Option<Graph>, viewport: Viewport) -> Self {
        Self {
            graph,
            viewport,
            dirty: false,
            path: None,
        }
    }

    /// A missing file yields an empty workspace bound to `path`.
    pub fn load(path: &Path, viewport: Viewport) -> anyhow::Result<Self> {
        let graph = if path.exists() {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading workflow {}", path.display()))?;
            let doc: Value = serde_json::from_str(&text)
                .with_context(|| format!("parsing workflow {}", path.display()))?;
            Some(Graph::from_document(doc)?)
        } else {
            tracing::info!("Workflow {} not found, starting without a graph", path.display());
            None
        };

        Ok(Self {
            path: Some(path.to_path_buf()),
            ..Self::new(graph, viewport)
        })
    }

    pub fn graph(&self) -> Option<&Graph> {
        self.graph.as_ref()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Write the graph back to its file, if any, and clear the dirty flag.
    pub fn save(&mut self) -> anyhow::Result<()> {
        if let (Some(path), Some(graph)) = (&self.path, &self.graph) {
            let text = serde_json::to_string_pretty(&graph.to_document()?)?;
            std::fs::write(path, text).with_context(|| format!("writing workflow {}", path.display()))?;
            tracing::debug!("Saved workflow to {}", path.display());
        }
        self.dirty = false;
        Ok(())
    }
}

impl HostCanvas for Workspace {
    fn graph_mut(&mut self) -> Option<&mut Graph> {
        self.graph.as_mut()
    }

    fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}

#[derive(Debug, Clone, Default)]
pub struct SharedWorkspace(Arc<Mutex<Workspace>>);

impl SharedWorkspace {
    pub fn new(workspace: Workspace) -> Self {
        Self(Arc::new(Mutex::new(workspace)))
    }

    fn lock(&self) -> anyhow::Result<std::sync::MutexGuard<'_, Workspace>> {
        self.0.lock().map_err(|_| anyhow::anyhow!("workspace lock poisoned"))
    }

    /// Recenter a copy, write it, then commit it. A failed write leaves the
    /// shared graph and viewport untouched.
    pub async fn recenter(&self) -> anyhow::Result<RecenterOutcome> {
        let mut staged = self.lock()?.clone();
        let outcome = recenter_to_origin(&mut staged);
        if !staged.is_dirty() {
            return Ok(outcome);
        }

        let staged = tokio::task::spawn_blocking(move || {
            staged.save()?;
            Ok::<_, anyhow::Error>(staged)
        })
        .await??;

        let mut workspace = self.lock()?;
        workspace.graph = staged.graph;
        workspace.viewport = staged.viewport;
        workspace.dirty = false;
        Ok(outcome)
    }

    pub fn document(&self) -> Option<Value> {
        let workspace = self.0.lock().ok()?;
        let graph = workspace.graph()?;
        match graph.to_document() {
            Ok(doc) => Some(doc),
            Err(e) => {
                tracing::warn!("Failed to serialize workflow: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl WorkflowSource for SharedWorkspace {
    async fn workflow_document(&self) -> Option<Value> {
        self.document()
    }
}

impl ViewportSource for SharedWorkspace {
    fn viewport(&self) -> Viewport {
        self.0.lock().map(|w| w.viewport()).unwrap_or_default()
    }
}
