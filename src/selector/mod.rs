//! Container selection
//!
//! Turns a [`ContainerSelector`] into the set of pod/container pairs that
//! currently match it. The wait loop only depends on the
//! [`ContainerSelection`] trait; [`KubeContainerFilter`] is the
//! implementation backed by the Kubernetes API.

pub mod image;
pub mod labels;

pub use image::{ImageSelector, resolve_image_name, resolve_image_selector};
pub use labels::render_label_selector;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Container, Pod};
use kube::api::ListParams;
use kube::{Api, Client, ResourceExt};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum SelectionError {
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),
}

/// Which containers to select. Every field that is set narrows the result.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContainerSelector {
    /// Container image must match any of these (ignored when empty)
    pub image_selectors: Vec<ImageSelector>,
    /// Rendered label selector, empty for none
    pub label_selector: String,
    /// Exact pod name
    pub pod: Option<String>,
    /// Exact container name
    pub container_name: Option<String>,
    /// Namespace to search, `None` for the client's default namespace
    pub namespace: Option<String>,
}

impl ContainerSelector {
    fn matches_container(&self, container: &Container) -> bool {
        if let Some(name) = &self.container_name {
            if &container.name != name {
                return false;
            }
        }

        if self.image_selectors.is_empty() {
            return true;
        }
        let image = container.image.as_deref().unwrap_or_default();
        self.image_selectors.iter().any(|s| s.matches(image))
    }
}

/// One container of a selected pod, as observed in a single poll
#[derive(Clone, Debug)]
pub struct SelectedContainer {
    pub pod: Pod,
    pub container_name: String,
}

impl SelectedContainer {
    pub fn new(pod: Pod, container_name: impl Into<String>) -> Self {
        Self {
            pod,
            container_name: container_name.into(),
        }
    }
}

/// Source of selected containers
#[async_trait]
pub trait ContainerSelection: Send + Sync {
    async fn select_containers(
        &self,
        selector: &ContainerSelector,
    ) -> Result<Vec<SelectedContainer>, SelectionError>;
}

/// Selects containers by listing pods through the Kubernetes API
#[derive(Clone)]
pub struct KubeContainerFilter {
    client: Client,
}

impl KubeContainerFilter {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn pods_api(&self, namespace: Option<&str>) -> Api<Pod> {
        match namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::default_namespaced(self.client.clone()),
        }
    }
}

#[async_trait]
impl ContainerSelection for KubeContainerFilter {
    async fn select_containers(
        &self,
        selector: &ContainerSelector,
    ) -> Result<Vec<SelectedContainer>, SelectionError> {
        let api = self.pods_api(selector.namespace.as_deref());

        let mut params = ListParams::default();
        if !selector.label_selector.is_empty() {
            params = params.labels(&selector.label_selector);
        }
        if let Some(pod) = &selector.pod {
            params = params.fields(&format!("metadata.name={}", pod));
        }

        let pods = api.list(&params).await?;
        let selected = filter_containers(pods.items, selector);

        debug!(
            containers = selected.len(),
            label_selector = %selector.label_selector,
            "Selected containers"
        );

        Ok(selected)
    }
}

/// Expand pods into the containers matching the selector
///
/// Init containers are listed before regular containers. The pod name filter
/// is applied again here so that results are correct even when the API
/// ignored the field selector.
pub fn filter_containers(pods: Vec<Pod>, selector: &ContainerSelector) -> Vec<SelectedContainer> {
    let mut selected = Vec::new();

    for pod in pods {
        if let Some(name) = &selector.pod {
            if &pod.name_any() != name {
                continue;
            }
        }

        let Some(spec) = pod.spec.as_ref() else {
            continue;
        };

        let names: Vec<String> = spec
            .init_containers
            .iter()
            .flatten()
            .chain(spec.containers.iter())
            .filter(|c| selector.matches_container(c))
            .map(|c| c.name.clone())
            .collect();

        for name in names {
            selected.push(SelectedContainer::new(pod.clone(), name));
        }
    }

    selected
}
