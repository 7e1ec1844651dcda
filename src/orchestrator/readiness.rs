//! Concurrent TCP readiness probing.

use super::RunningService;
use crate::config::ReadinessSettings;
use crate::error::StartupError;
use crate::healthcheck::{poll_until_healthy, PollOutcome, TcpChecker};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Probe every service concurrently until all accept connections.
///
/// Returns on the first timeout (or cancellation) and aborts the probes
/// still in flight, so an error always names exactly one service.
pub(super) async fn wait_until_reachable(
    services: &[RunningService],
    settings: ReadinessSettings,
    cancel: &CancellationToken,
) -> Result<(), StartupError> {
    let mut probes = JoinSet::new();

    for service in services {
        let checker = TcpChecker::new(&service.host, service.port, settings.connect_timeout);
        let name = service.name.clone();
        let cancel = cancel.clone();
        tracing::debug!("Probing '{}' on {}", name, checker.address());
        probes.spawn(async move {
            let outcome =
                poll_until_healthy(&checker, settings.interval, settings.timeout, &cancel).await;
            (name, checker.address(), outcome)
        });
    }

    while let Some(joined) = probes.join_next().await {
        let (name, address, outcome) = match joined {
            Ok(result) => result,
            Err(e) => {
                probes.abort_all();
                return Err(StartupError::OrchestratorFailure {
                    service: "readiness probe".to_string(),
                    cause: e.to_string(),
                });
            }
        };
        match outcome {
            PollOutcome::Healthy { attempts } => {
                tracing::info!(
                    "Service '{}' is accepting connections on {} ({} attempt{})",
                    name,
                    address,
                    attempts,
                    if attempts == 1 { "" } else { "s" }
                );
            }
            PollOutcome::TimedOut { attempts } => {
                probes.abort_all();
                tracing::debug!("Gave up on '{}' after {} attempts", name, attempts);
                return Err(StartupError::Timeout {
                    service: name,
                    address,
                    timeout: settings.timeout,
                });
            }
            PollOutcome::Cancelled => {
                probes.abort_all();
                return Err(StartupError::Cancelled(name));
            }
        }
    }
    Ok(())
}
