// Host HTTP API - Workflow context submission and prompt queueing
use crate::application::bridge_listener::{ExecutionQueue, SubmitError, WorkflowSource, WorkflowSubmitter};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use url::Url;

#[derive(Debug, Clone)]
pub struct HostApi {
    client: reqwest::Client,
    context_url: Url,
    prompt_url: Url,
}

impl HostApi {
    pub fn new(context_url: Url, prompt_url: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            context_url,
            prompt_url,
        }
    }

    async fn post_json(&self, url: &Url, body: &Value) -> Result<(), SubmitError> {
        let response = self.client.post(url.clone()).json(body).send().await?;

        if !response.status().is_success() {
            return Err(SubmitError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}

#[async_trait]
impl WorkflowSubmitter for HostApi {
    async fn submit_context(&self, document: Value) -> Result<(), SubmitError> {
        self.post_json(&self.context_url, &document).await
    }
}

/// Enqueues the current graph through the host's prompt endpoint.
#[derive(Clone)]
pub struct PromptQueue {
    api: HostApi,
    source: Arc<dyn WorkflowSource>,
}

impl PromptQueue {
    pub fn new(api: HostApi, source: Arc<dyn WorkflowSource>) -> Self {
        Self { api, source }
    }
}

#[async_trait]
impl ExecutionQueue for PromptQueue {
    async fn enqueue(&self, front: bool) -> Result<(), SubmitError> {
        let workflow = self.source.workflow_document().await.ok_or(SubmitError::NoGraph)?;
        let body = json!({ "workflow": workflow, "front": front });
        self.api.post_json(&self.api.prompt_url, &body).await
    }
}
