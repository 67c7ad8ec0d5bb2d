//! Unit tests for pod status rendering and problem detection

use kube_wait_hook::{has_pod_problem, pod_status};

use crate::common::*;

mod pod_status_tests {
    use super::*;

    #[test]
    fn test_running_pod() {
        let pod = running_pod("api-0", "api", true);
        assert_eq!(pod_status(&pod), "Running");
    }

    #[test]
    fn test_pod_reason_overrides_phase() {
        let pod = PodBuilder::new("api-0", "default")
            .phase("Failed")
            .reason("Evicted")
            .build();
        assert_eq!(pod_status(&pod), "Evicted");
    }

    #[test]
    fn test_waiting_reason() {
        let pod = image_pull_backoff_pod("api-0", "api");
        assert_eq!(pod_status(&pod), "ImagePullBackOff");
    }

    #[test]
    fn test_terminated_reason() {
        let pod = PodBuilder::new("job-0", "default")
            .phase("Succeeded")
            .terminated_with("job", 0, Some("Completed"), None)
            .build();
        assert_eq!(pod_status(&pod), "Completed");
    }

    #[test]
    fn test_terminated_without_reason_shows_exit_code() {
        let pod = PodBuilder::new("job-0", "default")
            .phase("Failed")
            .terminated("job", 3)
            .build();
        assert_eq!(pod_status(&pod), "ExitCode:3");
    }

    #[test]
    fn test_terminated_by_signal() {
        let pod = PodBuilder::new("job-0", "default")
            .phase("Failed")
            .terminated_with("job", 137, None, Some(9))
            .build();
        assert_eq!(pod_status(&pod), "Signal:9");
    }

    #[test]
    fn test_completed_sidecar_with_running_container() {
        let pod = PodBuilder::new("api-0", "default")
            .phase("Running")
            .running("api", true)
            .terminated_with("init-sidecar", 0, Some("Completed"), None)
            .build();
        assert_eq!(pod_status(&pod), "Running");
    }

    #[test]
    fn test_init_container_progress() {
        let pod = PodBuilder::new("api-0", "default")
            .with_init_container("first", "busybox")
            .with_init_container("second", "busybox")
            .phase("Pending")
            .init_terminated("first", 0)
            .init_running("second", false)
            .build();
        assert_eq!(pod_status(&pod), "Init:1/2");
    }

    #[test]
    fn test_init_container_waiting_reason() {
        let pod = PodBuilder::new("api-0", "default")
            .with_init_container("setup", "busybox")
            .phase("Pending")
            .init_waiting("setup", "CrashLoopBackOff")
            .build();
        assert_eq!(pod_status(&pod), "Init:CrashLoopBackOff");
    }

    #[test]
    fn test_init_container_pod_initializing_shows_progress() {
        let pod = PodBuilder::new("api-0", "default")
            .with_init_container("setup", "busybox")
            .phase("Pending")
            .init_waiting("setup", "PodInitializing")
            .build();
        assert_eq!(pod_status(&pod), "Init:0/1");
    }

    #[test]
    fn test_init_container_failed() {
        let pod = PodBuilder::new("api-0", "default")
            .with_init_container("setup", "busybox")
            .phase("Pending")
            .init_terminated("setup", 2)
            .build();
        assert_eq!(pod_status(&pod), "Init:ExitCode:2");
    }

    #[test]
    fn test_deleting_pod() {
        let pod = PodBuilder::new("api-0", "default")
            .phase("Running")
            .running("api", true)
            .deleting()
            .build();
        assert_eq!(pod_status(&pod), "Terminating");
    }

    #[test]
    fn test_deleting_pod_on_lost_node() {
        let pod = PodBuilder::new("api-0", "default")
            .phase("Running")
            .reason("NodeLost")
            .deleting()
            .build();
        assert_eq!(pod_status(&pod), "Unknown");
    }
}

mod problem_detection_tests {
    use super::*;

    #[test]
    fn test_healthy_pod_has_no_problem() {
        assert!(!has_pod_problem(&running_pod("api-0", "api", true)));
    }

    #[test]
    fn test_not_ready_pod_has_no_problem() {
        assert!(!has_pod_problem(&running_pod("api-0", "api", false)));
    }

    #[test]
    fn test_critical_waiting_reasons() {
        for reason in [
            "ImagePullBackOff",
            "CrashLoopBackOff",
            "ErrImagePull",
            "CreateContainerConfigError",
            "InvalidImageName",
            "RunContainerError",
        ] {
            let pod = PodBuilder::new("api-0", "default")
                .phase("Pending")
                .waiting("api", reason)
                .build();
            assert!(has_pod_problem(&pod), "{} should be a problem", reason);
        }
    }

    #[test]
    fn test_container_creating_is_not_a_problem() {
        let pod = PodBuilder::new("api-0", "default")
            .phase("Pending")
            .waiting("api", "ContainerCreating")
            .build();
        assert!(!has_pod_problem(&pod));
    }

    #[test]
    fn test_error_termination_is_a_problem() {
        let pod = PodBuilder::new("job-0", "default")
            .phase("Failed")
            .terminated_with("job", 1, Some("Error"), None)
            .build();
        assert!(has_pod_problem(&pod));
    }

    #[test]
    fn test_init_problem_is_a_problem() {
        let pod = PodBuilder::new("api-0", "default")
            .with_init_container("setup", "busybox")
            .phase("Pending")
            .init_waiting("setup", "CrashLoopBackOff")
            .build();
        assert!(has_pod_problem(&pod));
    }
}
