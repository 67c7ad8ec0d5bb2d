//! Fixed-interval poll loop
//!
//! The first check happens one interval after the wait starts, later checks
//! follow at the same fixed interval. Each iteration selects the containers
//! again and succeeds only when every selected container satisfies the
//! condition. A selection error ends the wait immediately.

use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::{HookWaitConfig, PollConfig};
use crate::selector::{ContainerSelection, ContainerSelector, SelectedContainer};
use crate::status::{has_pod_problem, pod_status};
use crate::wait::condition::is_satisfied;
use crate::wait::error::WaitError;
use crate::wait::gate::WarningGate;
use crate::wait::log::WaitLog;

/// Stand-in deadline for timeouts too large to add to the current instant
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Poll loop for a single wait
///
/// Owns the problem-pod warning gate, so each `Poller` warns at most once.
/// Create a new one per wait.
pub struct Poller<'a> {
    gate: WarningGate,
    log: &'a dyn WaitLog,
}

impl<'a> Poller<'a> {
    pub fn new(log: &'a dyn WaitLog) -> Self {
        Self {
            gate: WarningGate::new(),
            log,
        }
    }

    /// Poll until all selected containers satisfy `condition`
    ///
    /// The deadline wins over a poll tick that falls on the same instant, so
    /// a timeout shorter than the interval fails without a single check.
    /// Cancellation is observed both while sleeping and while a selection
    /// call is in flight.
    pub async fn poll(
        &self,
        selection: &dyn ContainerSelection,
        selector: &ContainerSelector,
        condition: &HookWaitConfig,
        config: PollConfig,
        cancel: &CancellationToken,
    ) -> Result<(), WaitError> {
        let start = Instant::now();
        let deadline = sleep_until(offset(start, config.timeout));
        tokio::pin!(deadline);

        let mut ticks = interval_at(offset(start, config.interval), config.interval);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut attempt: u32 = 0;
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(WaitError::Cancelled),
                _ = &mut deadline => return Err(WaitError::Timeout(config.timeout)),
                _ = ticks.tick() => {}
            }

            attempt += 1;
            let containers = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(WaitError::Cancelled),
                result = selection.select_containers(selector) => result?,
            };

            if self.check(condition, &containers) {
                debug!(
                    attempt,
                    containers = containers.len(),
                    elapsed = ?start.elapsed(),
                    "Wait condition met"
                );
                return Ok(());
            }

            debug!(
                attempt,
                containers = containers.len(),
                "Wait condition not met yet"
            );
        }
    }

    /// Evaluate one poll result, warning about problem pods along the way
    fn check(&self, condition: &HookWaitConfig, containers: &[SelectedContainer]) -> bool {
        let mut all_satisfied = true;

        for selected in containers {
            if has_pod_problem(&selected.pod) {
                self.gate.fire_once(|| {
                    let pod = &selected.pod;
                    self.log.warn(&format!(
                        "Pod {}/{} has critical status: {}. Will continue waiting, but this operation might time out",
                        pod.metadata.namespace.as_deref().unwrap_or_default(),
                        pod.metadata.name.as_deref().unwrap_or_default(),
                        pod_status(pod)
                    ));
                });
            }

            if !is_satisfied(condition, selected) {
                all_satisfied = false;
            }
        }

        all_satisfied
    }
}

/// `start + delay`, saturating at a far-future instant instead of overflowing
fn offset(start: Instant, delay: Duration) -> Instant {
    start
        .checked_add(delay)
        .or_else(|| start.checked_add(FAR_FUTURE))
        .unwrap_or(start)
}
