//! Capability traits the dashboard consumes from data providers

use async_trait::async_trait;
use std::fmt;
use tokio::sync::mpsc;

use super::models::{LogLine, LogTarget, NamespaceScope, NodeSnapshot, PodSnapshot};
use crate::cancel::CancelToken;
use crate::error::ProviderError;

/// Source of namespace, pod and node usage listings
///
/// Implementations must degrade gracefully: when a usage source is
/// temporarily unavailable they return rows with zero usage instead of
/// failing the whole call.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Selectable namespaces, in display order
    async fn list_namespaces(&self) -> Result<Vec<String>, ProviderError>;

    /// Pods in `scope` matching a label selector (empty selector matches all)
    async fn list_pods(
        &self,
        scope: &NamespaceScope,
        selector: &str,
    ) -> Result<Vec<PodSnapshot>, ProviderError>;

    async fn list_nodes(&self) -> Result<Vec<NodeSnapshot>, ProviderError>;
}

/// Source of streaming log lines
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Open a stream for `target`
    ///
    /// The provider closes the stream when it ends or when `cancel` fires;
    /// the consumer only ever reads from it.
    async fn stream_logs(
        &self,
        target: &LogTarget,
        cancel: CancelToken,
    ) -> Result<LogStream, ProviderError>;
}

/// Pull handle over a provider's log channel
///
/// The handle is moved into each read, so a subscription can never have more
/// than one read outstanding.
pub struct LogStream {
    rx: mpsc::Receiver<LogLine>,
}

impl LogStream {
    #[must_use]
    pub fn new(rx: mpsc::Receiver<LogLine>) -> Self {
        Self { rx }
    }

    /// Next line, or `None` once the provider closed the stream
    pub async fn next(&mut self) -> Option<LogLine> {
        self.rx.recv().await
    }
}

impl From<mpsc::Receiver<LogLine>> for LogStream {
    fn from(rx: mpsc::Receiver<LogLine>) -> Self {
        Self::new(rx)
    }
}

impl fmt::Debug for LogStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogStream")
            .field("closed", &self.rx.is_closed())
            .finish()
    }
}
