//! Synthetic cluster for `--mock` runs and tests
//!
//! Usage wobbles around fixed baselines so tables, bars and sparklines move
//! without a cluster. Trends accumulate in a [`TrendStore`] across polls.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::debug;

use super::normalize::{cpu_trend_sample, memory_trend_sample};
use crate::cancel::CancelToken;
use crate::domain::{
    LogLevel, LogLine, LogSource, LogStream, LogTarget, MetricsSource, NamespaceScope,
    NodeSnapshot, PodSnapshot,
};
use crate::error::ProviderError;
use crate::trend::{TrendCapacity, TrendStore};

const NODES: [&str; 5] = [
    "ip-10-0-1-5",
    "ip-10-0-1-12",
    "ip-10-0-2-3",
    "ip-10-0-2-7",
    "ip-10-0-3-2",
];

/// (pod, container, node)
const PODS: [(&str, &str, &str); 4] = [
    ("api-7cfb9d9c9c-9tghd", "api", "ip-10-0-1-5"),
    ("api-7cfb9d9c9c-sj2lq", "api", "ip-10-0-1-12"),
    ("worker-5f7dcbffd6-2jqkz", "worker", "ip-10-0-2-3"),
    ("cart-6d79f8b5f7-m2x8l", "cart", "ip-10-0-2-7"),
];

const NAMESPACES: [&str; 3] = ["default", "staging", "kube-system"];

const CPU_REQUEST_MILLICORES: u64 = 100;
const MEMORY_REQUEST_BYTES: u64 = 256 * 1024 * 1024;
const MIB: u64 = 1024 * 1024;

/// Delay between synthetic log lines
pub const LOG_INTERVAL: Duration = Duration::from_millis(500);

/// In-memory provider producing plausible, jittered cluster data
#[derive(Debug)]
pub struct SyntheticProvider {
    rng: Mutex<StdRng>,
    started: Instant,
    trends: TrendStore,
    log_interval: Duration,
}

impl SyntheticProvider {
    #[must_use]
    pub fn new(capacity: TrendCapacity) -> Self {
        Self::from_rng(StdRng::from_os_rng(), capacity)
    }

    /// Deterministic provider for tests
    #[must_use]
    pub fn with_seed(seed: u64, capacity: TrendCapacity) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed), capacity)
    }

    fn from_rng(rng: StdRng, capacity: TrendCapacity) -> Self {
        Self {
            rng: Mutex::new(rng),
            started: Instant::now(),
            trends: TrendStore::new(capacity),
            log_interval: LOG_INTERVAL,
        }
    }

    /// Override the log line interval
    #[must_use]
    pub fn with_log_interval(mut self, interval: Duration) -> Self {
        self.log_interval = interval;
        self
    }

    /// Uniform sample in `[0, 1)`
    fn random(&self) -> f64 {
        match self.rng.lock() {
            Ok(mut rng) => rng.random::<f64>(),
            Err(poisoned) => poisoned.into_inner().random::<f64>(),
        }
    }

    /// Slow wave plus per-entity offset plus jitter
    fn noise(&self, seed: usize) -> f64 {
        let wave = self.started.elapsed().as_secs_f64().sin();
        wave + (seed % 3) as f64 * 0.1 + self.random() * 0.2
    }
}

#[async_trait]
impl MetricsSource for SyntheticProvider {
    async fn list_namespaces(&self) -> Result<Vec<String>, ProviderError> {
        Ok(NAMESPACES.iter().map(|ns| ns.to_string()).collect())
    }

    async fn list_pods(
        &self,
        scope: &NamespaceScope,
        selector: &str,
    ) -> Result<Vec<PodSnapshot>, ProviderError> {
        let namespace = match scope {
            NamespaceScope::All => "default",
            NamespaceScope::Named(name) => name.as_str(),
        };

        let mut pods = Vec::with_capacity(PODS.len());
        for (i, (name, container, node)) in PODS.iter().enumerate() {
            if !matches_selector(name, container, selector) {
                continue;
            }

            let (cpu, memory) = if i == 0 {
                (120, 612 * MIB)
            } else {
                (
                    80 + (60.0 * self.random()) as u64,
                    500 * MIB + (300.0 * MIB as f64 * self.random()) as u64,
                )
            };

            let key = format!("{}/{}", namespace, name);
            pods.push(PodSnapshot {
                namespace: namespace.to_string(),
                name: name.to_string(),
                container: container.to_string(),
                node: node.to_string(),
                cpu_millicores: cpu,
                memory_bytes: memory,
                cpu_request_millicores: CPU_REQUEST_MILLICORES,
                memory_request_bytes: MEMORY_REQUEST_BYTES,
                ready: "1/1".to_string(),
                phase: "Running".to_string(),
                cpu_trend: self.trends.record(&key, cpu_trend_sample(cpu)),
                memory_trend: self
                    .trends
                    .record(&format!("{}-mem", key), memory_trend_sample(memory)),
            });
        }

        debug!(namespace, selector, count = pods.len(), "Synthesized pods");
        Ok(pods)
    }

    async fn list_nodes(&self) -> Result<Vec<NodeSnapshot>, ProviderError> {
        let nodes = NODES
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let cpu = (0.45 + 0.25 * self.noise(i)).clamp(0.0, 1.0);
                let memory = (0.42 + 0.28 * self.noise(i + 10)).clamp(0.0, 1.0);
                NodeSnapshot {
                    name: name.to_string(),
                    cpu_ratio: cpu,
                    memory_ratio: memory,
                    pods: 70 + i * 5 + (10.0 * self.random()) as usize,
                    kubelet_version: "1.29".to_string(),
                    cpu_trend: self.trends.record(&format!("cpu-{}", name), cpu),
                    memory_trend: self.trends.record(&format!("mem-{}", name), memory),
                }
            })
            .collect();
        Ok(nodes)
    }
}

#[async_trait]
impl LogSource for SyntheticProvider {
    async fn stream_logs(
        &self,
        target: &LogTarget,
        cancel: CancelToken,
    ) -> Result<LogStream, ProviderError> {
        let (tx, rx) = mpsc::channel(100);
        let source = format!(
            "{}/{}",
            target.name,
            target.container.as_deref().unwrap_or("api")
        );
        let interval = self.log_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // First tick fires immediately
            ticker.tick().await;
            let mut count: u64 = 0;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        count += 1;
                        let line = synthetic_line(count, &source);
                        if tx.send(line).await.is_err() {
                            break;
                        }
                    }
                }
            }
            debug!(source = %source, lines = count, "Synthetic log stream closed");
        });

        Ok(LogStream::new(rx))
    }
}

/// The `n`th line of a synthetic stream (1-based)
fn synthetic_line(n: u64, source: &str) -> LogLine {
    let (level, text) = if n % 37 == 0 {
        (LogLevel::Error, "db timeout op=save_order retry=1")
    } else if n % 13 == 0 {
        (LogLevel::Warn, "queue lag=233ms")
    } else {
        (LogLevel::Info, "request ok")
    };
    LogLine::new(level, text, source)
}

/// Loose label-selector matching against pod and container names
///
/// Terms are comma separated. `app=`, `component=` and `name=` match the
/// container name exactly (case-insensitive) or a pod name substring; other
/// `key=value` terms and bare terms match a substring of either name.
#[must_use]
pub fn matches_selector(pod: &str, container: &str, selector: &str) -> bool {
    selector
        .split(',')
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .all(|term| match term.split_once('=') {
            Some((key, value)) => {
                let value = value.trim();
                match key.trim() {
                    "app" | "component" | "name" => {
                        container.eq_ignore_ascii_case(value) || pod.contains(value)
                    }
                    _ => pod.contains(value) || container.contains(value),
                }
            }
            None => pod.contains(term) || container.contains(term),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelSource;

    fn provider() -> SyntheticProvider {
        SyntheticProvider::with_seed(7, TrendCapacity::new(5))
    }

    #[test]
    fn test_selector_matching() {
        assert!(matches_selector("api-1", "api", ""));
        assert!(matches_selector("api-1", "api", "app=API"));
        assert!(matches_selector("worker-2", "worker", " worker , tier=work"));
        assert!(!matches_selector("cart-1", "cart", "app=api"));
        assert!(!matches_selector("cart-1", "cart", "cart,api"));
        assert!(matches_selector("cart-1", "cart", ",,"));
    }

    #[test]
    fn test_synthetic_levels() {
        assert_eq!(synthetic_line(1, "a/api").level, LogLevel::Info);
        assert_eq!(synthetic_line(13, "a/api").level, LogLevel::Warn);
        assert_eq!(synthetic_line(37, "a/api").level, LogLevel::Error);
        assert_eq!(synthetic_line(13 * 37, "a/api").level, LogLevel::Error);
    }

    #[tokio::test]
    async fn test_pods_carry_requests_and_scope_namespace() {
        let p = provider();
        let scope = NamespaceScope::Named("staging".to_string());
        let pods = p.list_pods(&scope, "").await.unwrap();
        assert_eq!(pods.len(), 4);
        assert!(pods.iter().all(|pod| pod.namespace == "staging"));
        assert!(pods.iter().all(|pod| pod.cpu_request_millicores == 100));
        assert_eq!(pods[0].cpu_millicores, 120);
        assert_eq!(pods[0].memory_bytes, 612 * MIB);

        let all = p.list_pods(&NamespaceScope::All, "app=cart").await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].namespace, "default");
    }

    #[tokio::test]
    async fn test_trends_grow_to_capacity() {
        let p = provider();
        for _ in 0..8 {
            p.list_nodes().await.unwrap();
        }
        let nodes = p.list_nodes().await.unwrap();
        assert_eq!(nodes.len(), 5);
        for node in &nodes {
            assert_eq!(node.cpu_trend.len(), 5);
            assert!((0.0..=1.0).contains(&node.cpu_ratio));
            assert_eq!(node.cpu_trend.latest(), Some(node.cpu_ratio));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_log_stream_stops_on_cancel() {
        let p = provider().with_log_interval(Duration::from_millis(10));
        let source = CancelSource::new();
        let target = LogTarget::pod("default", "api-1", "");
        let mut stream = p.stream_logs(&target, source.token()).await.unwrap();

        let line = stream.next().await.unwrap();
        assert_eq!(line.source, "api-1/api");
        assert_eq!(line.text, "request ok");

        source.cancel();
        // Drain anything already buffered, then observe closure
        while stream.next().await.is_some() {}
    }
}
