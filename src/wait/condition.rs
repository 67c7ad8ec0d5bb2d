//! Evaluation of a wait condition against one selected container

use k8s_openapi::api::core::v1::ContainerStatus;

use crate::config::HookWaitConfig;
use crate::selector::SelectedContainer;

/// Check whether a selected container currently satisfies the wait condition
///
/// A pod with a deletion timestamp never satisfies a condition, whatever its
/// last reported container state was. Both the init and the regular
/// container statuses are searched for the container's name.
pub fn is_satisfied(condition: &HookWaitConfig, container: &SelectedContainer) -> bool {
    let pod = &container.pod;
    if pod.metadata.deletion_timestamp.is_some() {
        return false;
    }

    let Some(status) = pod.status.as_ref() else {
        return false;
    };

    status
        .init_container_statuses
        .iter()
        .flatten()
        .chain(status.container_statuses.iter().flatten())
        .filter(|cs| cs.name == container.container_name)
        .any(|cs| status_satisfies(condition, cs))
}

fn status_satisfies(condition: &HookWaitConfig, cs: &ContainerStatus) -> bool {
    let state = cs.state.as_ref();

    // Running alone is not enough, the readiness check has to pass too
    let running = state.and_then(|s| s.running.as_ref()).is_some();
    if condition.running && running && cs.ready {
        return true;
    }

    match (
        condition.terminated_with_code,
        state.and_then(|s| s.terminated.as_ref()),
    ) {
        (Some(code), Some(terminated)) => terminated.exit_code == code,
        _ => false,
    }
}
