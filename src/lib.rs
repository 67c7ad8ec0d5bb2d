pub mod config;
pub mod selector;
pub mod status;
pub mod wait;

pub use config::{
    ContainerWhere, DEFAULT_WAIT_TIMEOUT, Dependency, DependencyConfig, HookConfig, HookFile,
    HookWaitConfig, HookWhere, POLL_INTERVAL, PollConfig, ProjectConfig, hook_schema,
};
pub use selector::{
    ContainerSelection, ContainerSelector, ImageSelector, KubeContainerFilter, SelectedContainer,
    SelectionError,
};
pub use status::{has_pod_problem, pod_status};
pub use wait::{
    Error, HookContext, Result, TracingLog, WaitError, WaitHook, WaitLog, WarningGate,
    is_satisfied,
};

use tracing::info;

/// Run every hook of a file in order, stopping at the first failure.
///
/// Hooks share the context, so cancelling its token aborts the hook that is
/// currently waiting and skips the rest.
pub async fn run_hooks<L: WaitLog>(
    waiter: &WaitHook<L>,
    ctx: &HookContext,
    hooks: &HookFile,
    config: Option<&ProjectConfig>,
    dependencies: &[Dependency],
) -> Result<()> {
    info!("Running {} hook(s)", hooks.hooks.len());

    for hook in &hooks.hooks {
        waiter.execute(ctx, hook, config, dependencies).await?;
    }

    Ok(())
}
