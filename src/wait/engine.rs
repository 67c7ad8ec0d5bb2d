//! Entry point of the wait hook
//!
//! Validates preconditions, resolves the container filters of a hook and
//! runs the poll loop with the hook's deadline.

use std::sync::Arc;

use kube::Client;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::config::{ContainerWhere, Dependency, HookConfig, PollConfig, ProjectConfig, non_empty};
use crate::selector::{
    ContainerSelection, ContainerSelector, ImageSelector, KubeContainerFilter,
    render_label_selector, resolve_image_name, resolve_image_selector,
};
use crate::wait::error::{Error, Result};
use crate::wait::log::{TracingLog, WaitLog};
use crate::wait::poll::Poller;

/// Execution context shared by the hooks of one run
#[derive(Clone)]
pub struct HookContext {
    /// Cluster access, `None` when no cluster is configured
    pub client: Option<Arc<dyn ContainerSelection>>,
    /// Cancels any wait running under this context
    pub cancel: CancellationToken,
}

impl HookContext {
    /// Context backed by a Kubernetes client
    pub fn new(client: Client) -> Self {
        Self::with_selection(Arc::new(KubeContainerFilter::new(client)))
    }

    /// Context backed by any container selection implementation
    pub fn with_selection(selection: Arc<dyn ContainerSelection>) -> Self {
        Self {
            client: Some(selection),
            cancel: CancellationToken::new(),
        }
    }

    /// Context without cluster access
    pub fn detached() -> Self {
        Self {
            client: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally owned cancellation token
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Waits until the containers selected by a hook reach its wait condition
#[derive(Debug, Default)]
pub struct WaitHook<L = TracingLog> {
    log: L,
}

impl WaitHook<TracingLog> {
    pub fn new() -> Self {
        Self { log: TracingLog }
    }
}

impl<L: WaitLog> WaitHook<L> {
    /// Wait hook reporting through a custom log
    pub fn with_log(log: L) -> Self {
        Self { log }
    }

    pub fn log(&self) -> &L {
        &self.log
    }

    /// Execute the hook
    ///
    /// Fails immediately when no cluster client is attached, when an image
    /// filter is requested without a loaded config, or when an image cannot
    /// be resolved. Otherwise blocks until the condition holds for every
    /// selected container, the deadline passes, selection fails or the
    /// context is cancelled.
    #[instrument(skip_all, fields(hook = %hook.display_name()))]
    pub async fn execute(
        &self,
        ctx: &HookContext,
        hook: &HookConfig,
        config: Option<&ProjectConfig>,
        dependencies: &[Dependency],
    ) -> Result<()> {
        let name = hook.display_name();

        let selection = ctx
            .client
            .as_ref()
            .ok_or_else(|| Error::ClientNotInitialized {
                hook: name.to_string(),
            })?;

        let condition = hook
            .wait
            .as_ref()
            .ok_or_else(|| Error::MissingWaitCondition {
                hook: name.to_string(),
            })?;

        let container = hook.container_where();
        let image_selectors = resolve_images(name, &container, config, dependencies)?;
        let selector = build_selector(&container, image_selectors);
        let poll_config = PollConfig::for_wait(condition);

        info!(
            timeout = ?poll_config.timeout,
            label_selector = %selector.label_selector,
            "Waiting for containers"
        );

        Poller::new(&self.log)
            .poll(
                selection.as_ref(),
                &selector,
                condition,
                poll_config,
                &ctx.cancel,
            )
            .await
            .map_err(|source| Error::Wait {
                hook: name.to_string(),
                source,
            })?;

        self.log
            .done(&format!("Hook '{}' successfully executed", name));
        Ok(())
    }
}

/// Resolve the image filters of a hook
///
/// Requires a loaded config as soon as any image filter is set.
fn resolve_images(
    hook: &str,
    container: &ContainerWhere,
    config: Option<&ProjectConfig>,
    dependencies: &[Dependency],
) -> Result<Vec<ImageSelector>> {
    let mut selectors = Vec::new();
    if !container.wants_images() {
        return Ok(selectors);
    }

    let config = config
        .filter(|c| c.is_loaded())
        .ok_or_else(|| Error::ConfigNotLoaded {
            hook: hook.to_string(),
        })?;

    if let Some(image_name) = non_empty(&container.image_name) {
        if let Some(selector) = resolve_image_name(image_name, config, dependencies)? {
            selectors.push(selector);
        }
    }

    if let Some(expression) = non_empty(&container.image_selector) {
        selectors.push(resolve_image_selector(expression, config, dependencies)?);
    }

    Ok(selectors)
}

/// Build the effective selector from a hook's container filter
pub fn build_selector(
    container: &ContainerWhere,
    image_selectors: Vec<ImageSelector>,
) -> ContainerSelector {
    ContainerSelector {
        image_selectors,
        label_selector: render_label_selector(&container.label_selector),
        pod: non_empty(&container.pod).map(String::from),
        container_name: non_empty(&container.container_name).map(String::from),
        namespace: non_empty(&container.namespace).map(String::from),
    }
}
