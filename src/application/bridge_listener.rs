// Bridge listener - Commands relayed from the profiler window
use crate::domain::host::BridgeMessage;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("backend rejected request with status {0}")]
    Status(u16),
    #[error("no graph loaded")]
    NoGraph,
}

/// Produces the current graph in its canonical document form.
#[async_trait]
pub trait WorkflowSource: Send + Sync {
    async fn workflow_document(&self) -> Option<Value>;
}

#[async_trait]
pub trait WorkflowSubmitter: Send + Sync {
    /// One-shot submission of the workflow context; never retried.
    async fn submit_context(&self, document: Value) -> Result<(), SubmitError>;
}

#[async_trait]
pub trait ExecutionQueue: Send + Sync {
    /// `front` queues ahead of pending work; default priority is `false`.
    async fn enqueue(&self, front: bool) -> Result<(), SubmitError>;
}

#[derive(Clone)]
pub struct BridgeListener {
    source: Arc<dyn WorkflowSource>,
    submitter: Arc<dyn WorkflowSubmitter>,
    queue: Arc<dyn ExecutionQueue>,
}

impl BridgeListener {
    pub fn new(
        source: Arc<dyn WorkflowSource>,
        submitter: Arc<dyn WorkflowSubmitter>,
        queue: Arc<dyn ExecutionQueue>,
    ) -> Self {
        Self {
            source,
            submitter,
            queue,
        }
    }

    /// Network work is spawned so a slow backend never holds up the next message.
    pub fn handle(&self, message: BridgeMessage) -> Option<tokio::task::JoinHandle<()>> {
        match message {
            BridgeMessage::GetWorkflowForProfiler => {
                let source = self.source.clone();
                let submitter = self.submitter.clone();
                Some(tokio::spawn(async move {
                    let Some(document) = source.workflow_document().await else {
                        tracing::warn!("Profiler asked for the workflow but no graph is loaded");
                        return;
                    };
                    match submitter.submit_context(document).await {
                        Ok(()) => tracing::debug!("Submitted workflow context for profiler"),
                        Err(e) => tracing::warn!("Failed to submit workflow context: {}", e),
                    }
                }))
            }
            BridgeMessage::QueuePrompt => {
                let queue = self.queue.clone();
                Some(tokio::spawn(async move {
                    if let Err(e) = queue.enqueue(false).await {
                        tracing::warn!("Failed to queue prompt from profiler: {}", e);
                    }
                }))
            }
            BridgeMessage::Unknown => None,
        }
    }

    /// Consume the broadcast channel until every sender is gone.
    pub async fn run(self, rx: broadcast::Receiver<BridgeMessage>) {
        let mut messages = BroadcastStream::new(rx);
        while let Some(message) = messages.next().await {
            match message {
                Ok(message) => {
                    self.handle(message);
                }
                Err(BroadcastStreamRecvError::Lagged(n)) => {
                    tracing::warn!("Bridge listener lagged, {} messages dropped", n);
                }
            }
        }
        tracing::debug!("Bridge channel closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Fakes {
        submitted: Mutex<Vec<Value>>,
        queued: Mutex<Vec<bool>>,
        fail_submit: bool,
        has_graph: bool,
    }

    #[async_trait]
    impl WorkflowSource for Fakes {
        async fn workflow_document(&self) -> Option<Value> {
            self.has_graph.then(|| json!({"nodes": []}))
        }
    }

    #[async_trait]
    impl WorkflowSubmitter for Fakes {
        async fn submit_context(&self, document: Value) -> Result<(), SubmitError> {
            if self.fail_submit {
                return Err(SubmitError::Status(500));
            }
            self.submitted.lock().unwrap().push(document);
            Ok(())
        }
    }

    #[async_trait]
    impl ExecutionQueue for Fakes {
        async fn enqueue(&self, front: bool) -> Result<(), SubmitError> {
            self.queued.lock().unwrap().push(front);
            Ok(())
        }
    }

    fn listener(fakes: Arc<Fakes>) -> BridgeListener {
        BridgeListener::new(fakes.clone(), fakes.clone(), fakes)
    }

    #[tokio::test]
    async fn test_workflow_request_submits_document() {
        let fakes = Arc::new(Fakes { has_graph: true, ..Default::default() });
        let task = listener(fakes.clone()).handle(BridgeMessage::GetWorkflowForProfiler);
        task.unwrap().await.unwrap();
        assert_eq!(*fakes.submitted.lock().unwrap(), vec![json!({"nodes": []})]);
    }

    #[tokio::test]
    async fn test_queue_prompt_uses_default_priority() {
        let fakes = Arc::new(Fakes::default());
        listener(fakes.clone()).handle(BridgeMessage::QueuePrompt).unwrap().await.unwrap();
        assert_eq!(*fakes.queued.lock().unwrap(), vec![false]);
    }

    #[tokio::test]
    async fn test_unknown_message_ignored() {
        let fakes = Arc::new(Fakes::default());
        assert!(listener(fakes.clone()).handle(BridgeMessage::Unknown).is_none());
    }

    #[tokio::test]
    async fn test_failed_submission_does_not_block_later_messages() {
        let fakes = Arc::new(Fakes { has_graph: true, fail_submit: true, ..Default::default() });
        let (tx, rx) = broadcast::channel(8);
        let run = tokio::spawn(listener(fakes.clone()).run(rx));

        tx.send(BridgeMessage::GetWorkflowForProfiler).unwrap();
        tx.send(BridgeMessage::Unknown).unwrap();
        tx.send(BridgeMessage::QueuePrompt).unwrap();
        drop(tx);
        run.await.unwrap();

        for _ in 0..50 {
            if !fakes.queued.lock().unwrap().is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(fakes.submitted.lock().unwrap().is_empty());
        assert_eq!(*fakes.queued.lock().unwrap(), vec![false]);
    }
}
