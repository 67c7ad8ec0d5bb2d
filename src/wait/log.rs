/// User facing messages emitted while waiting
///
/// Messages are fire-and-forget and never influence the outcome of a wait.
pub trait WaitLog: Send + Sync {
    /// Advisory warning, e.g. a pod in a critical state
    fn warn(&self, msg: &str);

    /// Successful completion of a hook
    fn done(&self, msg: &str);
}

/// Sends messages to the `tracing` subscriber
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLog;

impl WaitLog for TracingLog {
    fn warn(&self, msg: &str) {
        tracing::warn!("{}", msg);
    }

    fn done(&self, msg: &str) {
        tracing::info!("{}", msg);
    }
}
