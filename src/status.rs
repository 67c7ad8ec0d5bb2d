//! Pod status rendering and problem detection
//!
//! Produces the same one-word status `kubectl get pods` shows in its STATUS
//! column, and flags pods whose status means they will most likely never
//! become ready without intervention.

use k8s_openapi::api::core::v1::{ContainerStatus, Pod};

/// Statuses that indicate a pod is stuck
pub const CRITICAL_STATUSES: &[&str] = &[
    "Error",
    "Unknown",
    "ImagePullBackOff",
    "CrashLoopBackOff",
    "RunContainerError",
    "ErrImagePull",
    "CreateContainerConfigError",
    "InvalidImageName",
];

/// Check whether a pod is in a critical state
///
/// Init container problems (`Init:CrashLoopBackOff`) count as well.
pub fn has_pod_problem(pod: &Pod) -> bool {
    let status = pod_status(pod);
    let status = status.strip_prefix("Init:").unwrap_or(&status);
    CRITICAL_STATUSES.contains(&status)
}

/// Render the status of a pod the way kubectl does
pub fn pod_status(pod: &Pod) -> String {
    let status = pod.status.as_ref();
    let pod_reason = status.and_then(|s| s.reason.as_deref()).unwrap_or_default();

    let mut reason = status
        .and_then(|s| s.phase.clone())
        .unwrap_or_default();
    if !pod_reason.is_empty() {
        reason = pod_reason.to_string();
    }

    let init_statuses = status
        .and_then(|s| s.init_container_statuses.as_deref())
        .unwrap_or_default();
    let init_total = pod
        .spec
        .as_ref()
        .and_then(|s| s.init_containers.as_ref())
        .map(Vec::len)
        .unwrap_or(init_statuses.len());

    let init_reason = init_statuses
        .iter()
        .enumerate()
        .find_map(|(i, cs)| init_container_reason(i, init_total, cs));

    match init_reason {
        Some(init) => reason = init,
        None => {
            let container_statuses = status
                .and_then(|s| s.container_statuses.as_deref())
                .unwrap_or_default();

            let mut has_running = false;
            for cs in container_statuses.iter().rev() {
                let state = cs.state.as_ref();
                let waiting = state.and_then(|s| s.waiting.as_ref());
                let terminated = state.and_then(|s| s.terminated.as_ref());

                if let Some(w) = waiting.and_then(|w| w.reason.as_deref()).filter(|r| !r.is_empty())
                {
                    reason = w.to_string();
                } else if let Some(t) = terminated {
                    reason = match t.reason.as_deref().filter(|r| !r.is_empty()) {
                        Some(r) => r.to_string(),
                        None => match t.signal {
                            Some(signal) if signal != 0 => format!("Signal:{}", signal),
                            _ => format!("ExitCode:{}", t.exit_code),
                        },
                    };
                } else if cs.ready && state.and_then(|s| s.running.as_ref()).is_some() {
                    has_running = true;
                }
            }

            // A completed sidecar next to a running container is still running
            if reason == "Completed" && has_running {
                reason = "Running".to_string();
            }
        }
    }

    if pod.metadata.deletion_timestamp.is_some() {
        if pod_reason == "NodeLost" {
            reason = "Unknown".to_string();
        } else {
            reason = "Terminating".to_string();
        }
    }

    reason
}

/// Status contributed by an init container, `None` if it completed successfully
fn init_container_reason(index: usize, total: usize, cs: &ContainerStatus) -> Option<String> {
    let state = cs.state.as_ref();

    if let Some(t) = state.and_then(|s| s.terminated.as_ref()) {
        if t.exit_code == 0 {
            return None;
        }
        let reason = match t.reason.as_deref().filter(|r| !r.is_empty()) {
            Some(r) => format!("Init:{}", r),
            None => match t.signal {
                Some(signal) if signal != 0 => format!("Init:Signal:{}", signal),
                _ => format!("Init:ExitCode:{}", t.exit_code),
            },
        };
        return Some(reason);
    }

    if let Some(r) = state
        .and_then(|s| s.waiting.as_ref())
        .and_then(|w| w.reason.as_deref())
        .filter(|r| !r.is_empty() && *r != "PodInitializing")
    {
        return Some(format!("Init:{}", r));
    }

    Some(format!("Init:{}/{}", index, total))
}
