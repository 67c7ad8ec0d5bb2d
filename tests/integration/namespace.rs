//! Per-test namespaces holding the pods a wait hook selects

use std::collections::BTreeMap;
use std::time::Duration;

use k8s_openapi::api::core::v1::{Namespace, Pod};
use kube::api::{DeleteParams, ListParams, PostParams, PropagationPolicy};
use kube::core::ObjectMeta;
use kube::{Api, Client, ResourceExt};
use thiserror::Error;
use tokio::time::{Instant, sleep};
use uuid::Uuid;

/// Label put on every namespace created by these tests
pub const TEST_LABEL: &str = "kube-wait-hook.test";

#[derive(Error, Debug)]
pub enum NamespaceError {
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("Pods in {namespace} still present after {timeout:?}: {remaining:?}")]
    PodsRemain {
        namespace: String,
        timeout: Duration,
        remaining: Vec<String>,
    },
}

/// A namespace owned by one test
pub struct TestNamespace {
    name: String,
    client: Client,
}

impl TestNamespace {
    /// Create `{prefix}-{uuid8}` labelled as test-owned
    pub async fn create(client: Client, prefix: &str) -> Result<Self, NamespaceError> {
        let name = format!("{}-{}", prefix, &Uuid::new_v4().simple().to_string()[..8]);

        let ns = Namespace {
            metadata: ObjectMeta {
                name: Some(name.clone()),
                labels: Some(BTreeMap::from([
                    (TEST_LABEL.to_string(), "true".to_string()),
                    ("test-prefix".to_string(), prefix.to_string()),
                ])),
                ..Default::default()
            },
            ..Default::default()
        };
        Api::<Namespace>::all(client.clone())
            .create(&PostParams::default(), &ns)
            .await?;

        tracing::info!("Created test namespace: {}", name);
        Ok(Self { name, client })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pods(&self) -> Api<Pod> {
        Api::namespaced(self.client.clone(), &self.name)
    }

    /// Create a pod in this namespace
    pub async fn run_pod(&self, pod: &Pod) -> Result<Pod, NamespaceError> {
        let created = self.pods().create(&PostParams::default(), pod).await?;
        tracing::debug!("Created pod {}/{}", self.name, created.name_any());
        Ok(created)
    }

    /// Delete every pod immediately and wait until none is listed anymore
    pub async fn remove_pods(&self, timeout: Duration) -> Result<(), NamespaceError> {
        let pods = self.pods();
        let dp = DeleteParams {
            grace_period_seconds: Some(0),
            ..Default::default()
        };
        pods.delete_collection(&dp, &ListParams::default()).await?;

        let deadline = Instant::now() + timeout;
        loop {
            let remaining: Vec<String> = pods
                .list(&ListParams::default())
                .await?
                .items
                .iter()
                .map(|p| p.name_any())
                .collect();
            if remaining.is_empty() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(NamespaceError::PodsRemain {
                    namespace: self.name.clone(),
                    timeout,
                    remaining,
                });
            }
            sleep(Duration::from_secs(1)).await;
        }
    }

    /// Remove the pods, then start deleting the namespace without waiting for it
    pub async fn cleanup(&self) -> Result<(), NamespaceError> {
        self.remove_pods(Duration::from_secs(60)).await?;

        let dp = DeleteParams {
            propagation_policy: Some(PropagationPolicy::Background),
            ..Default::default()
        };
        match Api::<Namespace>::all(self.client.clone())
            .delete(&self.name, &dp)
            .await
        {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(e)) if e.code == 404 => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
