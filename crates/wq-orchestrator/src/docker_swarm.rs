//! `ServiceOrchestrator` over a JSON HTTP gateway in front of the Docker
//! Swarm API (the kind a small sidecar or `portainer`-style proxy
//! exposes). Talks in the wire shapes `wq_core::orchestrator` already
//! defines, so there is no separate DTO layer to keep in sync.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use wq_core::{ServiceInfo, ServiceOrchestrator, ServiceUpdate, TaskInfo, WqError};
use wq_domain::ServiceMetrics;

pub struct DockerSwarmOrchestrator {
    base_url: String,
    client: reqwest::Client,
}

impl DockerSwarmOrchestrator {
    pub fn new(base_url: impl Into<String>) -> Result<Self, WqError> {
        let client = reqwest::Client::builder().timeout(std::time::Duration::from_secs(30))
                                                .build()
                                                .map_err(|e| WqError::FatalStorage(format!("failed to build orchestrator http client: {e}")))?;
        Ok(Self { base_url: base_url.into(), client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Maps a transport or non-2xx failure onto `WqError`. There is no
    /// dedicated orchestrator-transport variant in the shared taxonomy;
    /// callers (deploy/scale/incident handlers) already wrap this in their
    /// own operational error before it reaches a user, so `BusinessLogic`
    /// is enough here.
    async fn handle_response<T: for<'de> Deserialize<'de>>(response: reqwest::Response) -> Result<T, WqError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(WqError::BusinessLogic(format!("orchestrator API returned {status}: {body}")));
        }
        response.json::<T>()
                .await
                .map_err(|e| WqError::BusinessLogic(format!("failed to parse orchestrator response: {e}")))
    }
}

#[derive(Debug, Serialize)]
struct UpdateServiceRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    image_tag: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    environment_variables: Option<&'a std::collections::HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    replicas: Option<u32>,
    force: bool,
}

#[async_trait]
impl ServiceOrchestrator for DockerSwarmOrchestrator {
    async fn get_service(&self, service_name: &str) -> Result<Option<ServiceInfo>, WqError> {
        let response = self.client
                            .get(self.url(&format!("/services/{service_name}")))
                            .send()
                            .await
                            .map_err(|e| WqError::TransientStorage(format!("orchestrator request failed: {e}")))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::handle_response(response).await
    }

    async fn create_service(&self, info: &ServiceInfo) -> Result<(), WqError> {
        let response = self.client
                            .post(self.url("/services"))
                            .json(info)
                            .send()
                            .await
                            .map_err(|e| WqError::TransientStorage(format!("orchestrator request failed: {e}")))?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(WqError::DeploymentFailed(format!("create_service({}) returned {status}: {body}", info.service_name)));
        }
        Ok(())
    }

    async fn update_service(&self, service_name: &str, update: &ServiceUpdate) -> Result<(), WqError> {
        let body = UpdateServiceRequest { image_tag: update.image_tag.as_deref(),
                                           environment_variables: update.environment_variables.as_ref(),
                                           replicas: update.replicas,
                                           force: update.force };
        let response = self.client
                            .post(self.url(&format!("/services/{service_name}/update")))
                            .json(&body)
                            .send()
                            .await
                            .map_err(|e| WqError::TransientStorage(format!("orchestrator request failed: {e}")))?;
        if !response.status().is_success() {
            let status = response.status();
            let resp_body = response.text().await.unwrap_or_default();
            return Err(WqError::DeploymentFailed(format!("update_service({service_name}) returned {status}: {resp_body}")));
        }
        Ok(())
    }

    async fn list_services(&self) -> Result<Vec<ServiceInfo>, WqError> {
        let response = self.client
                            .get(self.url("/services"))
                            .send()
                            .await
                            .map_err(|e| WqError::TransientStorage(format!("orchestrator request failed: {e}")))?;
        Self::handle_response(response).await
    }

    async fn get_tasks(&self, service_name: &str) -> Result<Vec<TaskInfo>, WqError> {
        let response = self.client
                            .get(self.url(&format!("/services/{service_name}/tasks")))
                            .send()
                            .await
                            .map_err(|e| WqError::TransientStorage(format!("orchestrator request failed: {e}")))?;
        Self::handle_response(response).await
    }

    async fn get_metrics(&self, service_name: &str) -> Result<ServiceMetrics, WqError> {
        let response = self.client
                            .get(self.url(&format!("/services/{service_name}/metrics")))
                            .send()
                            .await
                            .map_err(|e| WqError::TransientStorage(format!("orchestrator request failed: {e}")))?;
        Self::handle_response(response).await
    }
}
