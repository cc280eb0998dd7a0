//! `reqwest`-backed implementation of [`TaskGateway`].

use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use tasklist_core::{Task, TaskDraft, TaskId};
use tracing::debug;

use crate::TaskGateway;
use crate::config::GatewayConfig;
use crate::error::{GatewayError, Operation, Result};

/// Gateway speaking JSON over HTTP to a single collection resource.
#[derive(Debug, Clone)]
pub struct HttpTaskGateway {
    client: Client,
    collection: Url,
}

impl HttpTaskGateway {
    /// Build a gateway from connection settings.
    ///
    /// # Errors
    /// Returns [`GatewayError::Config`] if the URL is invalid or the HTTP
    /// client cannot be constructed.
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let collection = config.collection_url()?;
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| GatewayError::Config(format!("failed to build HTTP client: {err}")))?;
        Ok(Self { client, collection })
    }

    /// Absolute URL of the collection resource.
    pub const fn collection_url(&self) -> &Url {
        &self.collection
    }

    fn item_url(&self, id: TaskId) -> String {
        format!("{}/{id}", self.collection.as_str().trim_end_matches('/'))
    }

    async fn send(&self, operation: Operation, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await.map_err(|err| network(operation, &err))?;
        let status = response.status();
        debug!(%operation, status = status.as_u16(), url = %response.url(), "Received response");
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_else(|err| {
            debug!(%operation, error = %err, "Failed to read error response body");
            String::new()
        });
        Err(GatewayError::from_status(operation, status.as_u16(), body))
    }

    async fn decode<T: DeserializeOwned>(operation: Operation, response: Response) -> Result<T> {
        let status = response.status().as_u16();
        let bytes = response.bytes().await.map_err(|err| network(operation, &err))?;
        serde_json::from_slice(&bytes).map_err(|err| GatewayError::Server {
            operation,
            status,
            message: format!("malformed response body: {err}"),
        })
    }
}

fn network(operation: Operation, err: &reqwest::Error) -> GatewayError {
    GatewayError::Network {
        operation,
        message: err.to_string(),
    }
}

impl TaskGateway for HttpTaskGateway {
    async fn list(&self) -> Result<Vec<Task>> {
        debug!(url = %self.collection, "GET task collection");
        let response = self
            .send(Operation::List, self.client.get(self.collection.clone()))
            .await?;
        Self::decode(Operation::List, response).await
    }

    async fn create(&self, draft: &TaskDraft) -> Result<Task> {
        debug!(url = %self.collection, name = %draft.name, "POST task");
        let response = self
            .send(
                Operation::Create,
                self.client.post(self.collection.clone()).json(draft),
            )
            .await?;
        Self::decode(Operation::Create, response).await
    }

    async fn update(&self, id: TaskId, task: &Task) -> Result<Task> {
        let url = self.item_url(id);
        debug!(%url, task = %id, "PUT task");
        let operation = Operation::Update(id);
        let response = self.send(operation, self.client.put(url).json(task)).await?;
        Self::decode(operation, response).await
    }

    async fn delete(&self, id: TaskId) -> Result<()> {
        let url = self.item_url(id);
        debug!(%url, task = %id, "DELETE task");
        self.send(Operation::Delete(id), self.client.delete(url)).await?;
        Ok(())
    }
}
