//! Runs dashboard commands as tokio tasks
//!
//! Every effect posts its outcome back to the event channel; tasks never touch
//! dashboard state. A shutdown token stops everything still in flight.

use std::future::Future;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

use crate::cancel::{CancelSource, CancelToken};
use crate::dashboard::{Command, Event, PollTicket};
use crate::domain::{LogSource, MetricsSource, ViewMode};
use crate::error::ProviderError;

/// Spawns the asynchronous side of each [`Command`]
pub struct EffectExecutor {
    metrics: Arc<dyn MetricsSource>,
    logs: Arc<dyn LogSource>,
    events: mpsc::UnboundedSender<Event>,
    poll_timeout: Duration,
    shutdown: CancelSource,
}

impl EffectExecutor {
    pub fn new(
        metrics: Arc<dyn MetricsSource>,
        logs: Arc<dyn LogSource>,
        events: mpsc::UnboundedSender<Event>,
        poll_timeout: Duration,
    ) -> Self {
        Self {
            metrics,
            logs,
            events,
            poll_timeout,
            shutdown: CancelSource::new(),
        }
    }

    /// Token cancelled once the executor shuts down
    #[must_use]
    pub fn shutdown_token(&self) -> CancelToken {
        self.shutdown.token()
    }

    /// Stop all pending effects; their results are never posted
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Start one command; `Break` means the dashboard asked to quit
    pub fn execute(&self, command: Command) -> ControlFlow<()> {
        debug!(command = command.name(), "Executing command");
        match command {
            Command::ScheduleTick(delay) => {
                self.spawn_until_shutdown(async move {
                    tokio::time::sleep(delay).await;
                    Some(Event::Tick)
                });
            }
            Command::FetchNamespaces => {
                let metrics = Arc::clone(&self.metrics);
                let limit = self.poll_timeout;
                self.spawn_until_shutdown(async move {
                    let result =
                        bounded("list namespaces", limit, metrics.list_namespaces()).await;
                    Some(Event::NamespacesLoaded(result))
                });
            }
            Command::Poll(ticket) => self.poll(ticket),
            Command::OpenLogStream { id, target, cancel } => {
                let logs = Arc::clone(&self.logs);
                self.spawn_until_shutdown(async move {
                    let result = tokio::select! {
                        _ = cancel.cancelled() => return None,
                        result = logs.stream_logs(&target, cancel.clone()) => result,
                    };
                    if cancel.is_cancelled() {
                        return None;
                    }
                    Some(match result {
                        Ok(stream) => Event::LogStreamOpened { id, stream },
                        Err(error) => Event::LogStreamFailed { id, error },
                    })
                });
            }
            Command::ReadNextLog {
                id,
                mut stream,
                cancel,
            } => {
                self.spawn_until_shutdown(async move {
                    let next = tokio::select! {
                        _ = cancel.cancelled() => return None,
                        next = stream.next() => next,
                    };
                    if cancel.is_cancelled() {
                        return None;
                    }
                    Some(match next {
                        Some(line) => Event::LogLineReceived { id, line, stream },
                        None => Event::LogStreamEnded { id },
                    })
                });
            }
            Command::Quit => {
                self.shutdown();
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    fn poll(&self, ticket: PollTicket) {
        let metrics = Arc::clone(&self.metrics);
        let limit = self.poll_timeout;
        self.spawn_until_shutdown(async move {
            Some(match ticket.view {
                ViewMode::Pods => {
                    let result = bounded(
                        "list pods",
                        limit,
                        metrics.list_pods(&ticket.scope, &ticket.selector),
                    )
                    .await;
                    Event::PodsLoaded { ticket, result }
                }
                ViewMode::Nodes => {
                    let result = bounded("list nodes", limit, metrics.list_nodes()).await;
                    Event::NodesLoaded { ticket, result }
                }
            })
        });
    }

    /// Run `task` and post its event unless shutdown happened first
    fn spawn_until_shutdown<F>(&self, task: F)
    where
        F: Future<Output = Option<Event>> + Send + 'static,
    {
        let shutdown = self.shutdown.token();
        let events = self.events.clone();
        tokio::spawn(async move {
            let event = tokio::select! {
                _ = shutdown.cancelled() => None,
                event = task => event,
            };
            if let Some(event) = event
                && !shutdown.is_cancelled()
            {
                // Receiver gone means the UI loop already exited
                let _ = events.send(event);
            }
        });
    }
}

/// Bound a provider call, reporting expiry as a timeout error
async fn bounded<T>(
    operation: &'static str,
    limit: Duration,
    call: impl Future<Output = Result<T, ProviderError>>,
) -> Result<T, ProviderError> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout {
            operation,
            after_ms: limit.as_millis() as u64,
        }),
    }
}
