//! Live cluster provider backed by the Kubernetes API and metrics.k8s.io

use async_trait::async_trait;
use futures::{AsyncBufReadExt, Stream, StreamExt, TryStreamExt};
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
use k8s_openapi::api::core::v1::{Event, Namespace, Node, Pod};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::api::{ListParams, LogParams, WatchEvent, WatchParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::core::{ApiResource, DynamicObject, GroupVersionKind};
use kube::{Api, Client, Config, ResourceExt};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::normalize::{cpu_trend_sample, memory_trend_sample};
use super::quantity::{parse_cpu_millicores, parse_memory_bytes};
use crate::cancel::CancelToken;
use crate::domain::{
    LogLevel, LogLine, LogSource, LogStream, LogTarget, LogTargetKind, MetricsSource,
    NamespaceScope, NodeSnapshot, PodSnapshot,
};
use crate::error::ProviderError;
use crate::render::clamp_ratio;
use crate::trend::{TrendCapacity, TrendStore};

/// Buffered lines per log stream before the reader waits on the dashboard
const LOG_CHANNEL_CAPACITY: usize = 200;

/// Where to find cluster credentials
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KubeSettings {
    /// Explicit kubeconfig path; falls back to the usual discovery
    pub kubeconfig: Option<PathBuf>,
    pub context: Option<String>,
}

/// Provider talking to a real cluster
#[derive(Clone)]
pub struct KubeProvider {
    client: Client,
    trends: std::sync::Arc<TrendStore>,
}

impl std::fmt::Debug for KubeProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeProvider")
            .field("trends", &self.trends.len())
            .finish_non_exhaustive()
    }
}

impl KubeProvider {
    /// Build a client from kubeconfig (or in-cluster credentials)
    pub async fn connect(
        settings: &KubeSettings,
        capacity: TrendCapacity,
    ) -> Result<Self, ProviderError> {
        let config = load_config(settings).await?;
        info!(cluster = %config.cluster_url, "Connecting to cluster");
        let client = Client::try_from(config).map_err(ProviderError::configuration)?;
        Ok(Self::with_client(client, capacity))
    }

    #[must_use]
    pub fn with_client(client: Client, capacity: TrendCapacity) -> Self {
        Self {
            client,
            trends: std::sync::Arc::new(TrendStore::new(capacity)),
        }
    }

    fn pods_api(&self, scope: &NamespaceScope) -> Api<Pod> {
        match scope {
            NamespaceScope::All => Api::all(self.client.clone()),
            NamespaceScope::Named(namespace) => Api::namespaced(self.client.clone(), namespace),
        }
    }

    /// Summed container usage per `ns/pod`; empty when metrics are unavailable
    async fn pod_usage(
        &self,
        scope: &NamespaceScope,
        selector: &str,
    ) -> HashMap<String, (u64, u64)> {
        let gvk = GroupVersionKind::gvk("metrics.k8s.io", "v1beta1", "PodMetrics");
        let resource = ApiResource::from_gvk_with_plural(&gvk, "pods");
        let api: Api<DynamicObject> = match scope {
            NamespaceScope::All => Api::all_with(self.client.clone(), &resource),
            NamespaceScope::Named(namespace) => {
                Api::namespaced_with(self.client.clone(), namespace, &resource)
            }
        };

        match api.list(&list_params(selector)).await {
            Ok(list) => list
                .items
                .into_iter()
                .map(|metric| {
                    let key = format!(
                        "{}/{}",
                        metric.namespace().unwrap_or_default(),
                        metric.name_any()
                    );
                    (key, sum_container_usage(&metric.data))
                })
                .collect(),
            Err(error) => {
                warn!(error = %error, "Pod metrics unavailable, reporting zero usage");
                HashMap::new()
            }
        }
    }

    /// Usage per node name; empty when metrics are unavailable
    async fn node_usage(&self) -> HashMap<String, (u64, u64)> {
        let gvk = GroupVersionKind::gvk("metrics.k8s.io", "v1beta1", "NodeMetrics");
        let resource = ApiResource::from_gvk_with_plural(&gvk, "nodes");
        let api: Api<DynamicObject> = Api::all_with(self.client.clone(), &resource);

        match api.list(&ListParams::default()).await {
            Ok(list) => list
                .items
                .into_iter()
                .map(|metric| (metric.name_any(), usage_from_value(&metric.data["usage"])))
                .collect(),
            Err(error) => {
                warn!(error = %error, "Node metrics unavailable, reporting zero usage");
                HashMap::new()
            }
        }
    }

    /// Label selector of a workload, rendered as `k=v,...`
    async fn owner_selector(&self, target: &LogTarget) -> Result<String, ProviderError> {
        let client = self.client.clone();
        let ns = target.namespace.as_str();
        let fail = |e: kube::Error| ProviderError::stream_start(target, e);

        let selector = match target.kind {
            LogTargetKind::Deployment => Api::<Deployment>::namespaced(client, ns)
                .get(&target.name)
                .await
                .map_err(fail)?
                .spec
                .map(|spec| spec.selector),
            LogTargetKind::StatefulSet => Api::<StatefulSet>::namespaced(client, ns)
                .get(&target.name)
                .await
                .map_err(fail)?
                .spec
                .map(|spec| spec.selector),
            LogTargetKind::DaemonSet => Api::<DaemonSet>::namespaced(client, ns)
                .get(&target.name)
                .await
                .map_err(fail)?
                .spec
                .map(|spec| spec.selector),
            LogTargetKind::Pod | LogTargetKind::Node => None,
        };

        selector
            .as_ref()
            .map(format_label_selector)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ProviderError::stream_start(target, "workload has no label selector"))
    }

    async fn stream_pod(
        &self,
        target: &LogTarget,
        cancel: CancelToken,
    ) -> Result<LogStream, ProviderError> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), &target.namespace);
        let params = LogParams {
            container: target.container.clone(),
            follow: true,
            ..LogParams::default()
        };
        let reader = api
            .log_stream(&target.name, &params)
            .await
            .map_err(|e| ProviderError::stream_start(target, e))?;

        let (tx, rx) = mpsc::channel(LOG_CHANNEL_CAPACITY);
        let source = format!(
            "{}/{}",
            target.name,
            target.container.as_deref().unwrap_or_default()
        );
        tokio::spawn(forward_lines(reader.lines(), source, tx, cancel));
        Ok(LogStream::new(rx))
    }

    /// Fan in the logs of every pod selected by a workload
    async fn stream_workload(
        &self,
        target: &LogTarget,
        cancel: CancelToken,
    ) -> Result<LogStream, ProviderError> {
        let selector = self.owner_selector(target).await?;
        let api: Api<Pod> = Api::namespaced(self.client.clone(), &target.namespace);
        let pods = api
            .list(&list_params(&selector))
            .await
            .map_err(|e| ProviderError::stream_start(target, e))?;

        let (tx, rx) = mpsc::channel(LOG_CHANNEL_CAPACITY);
        let params = LogParams {
            container: target.container.clone(),
            follow: true,
            ..LogParams::default()
        };

        let mut opened = 0usize;
        for pod in pods.items {
            let name = pod.name_any();
            match api.log_stream(&name, &params).await {
                Ok(reader) => {
                    let source = format!(
                        "{}/{}",
                        name,
                        target.container.as_deref().unwrap_or_default()
                    );
                    let lines = reader.lines();
                    tokio::spawn(forward_lines(lines, source, tx.clone(), cancel.clone()));
                    opened += 1;
                }
                Err(error) => debug!(pod = %name, error = %error, "Skipping pod log stream"),
            }
        }
        info!(target = %target, pods = opened, "Streaming workload logs");
        Ok(LogStream::new(rx))
    }

    /// Node "logs" are the events recorded against the node
    async fn stream_node_events(
        &self,
        target: &LogTarget,
        cancel: CancelToken,
    ) -> Result<LogStream, ProviderError> {
        let api: Api<Event> = Api::all(self.client.clone());
        let params = WatchParams::default().fields(&format!(
            "involvedObject.kind=Node,involvedObject.name={}",
            target.name
        ));
        let events = api
            .watch(&params, "0")
            .await
            .map_err(|e| ProviderError::stream_start(target, e))?;

        let (tx, rx) = mpsc::channel(LOG_CHANNEL_CAPACITY);
        let source = format!("event/{}", target.name);
        tokio::spawn(async move {
            let mut events = Box::pin(events);
            loop {
                let next = tokio::select! {
                    _ = cancel.cancelled() => break,
                    next = events.next() => next,
                };
                let event = match next {
                    Some(Ok(WatchEvent::Added(event) | WatchEvent::Modified(event))) => event,
                    Some(Ok(_)) => continue,
                    Some(Err(error)) => {
                        debug!(error = %error, "Node event watch failed");
                        break;
                    }
                    None => break,
                };
                let level = LogLevel::infer(event.type_.as_deref().unwrap_or_default());
                let line = LogLine::new(level, event.message.unwrap_or_default(), source.as_str());
                if tx.send(line).await.is_err() {
                    break;
                }
            }
        });
        Ok(LogStream::new(rx))
    }
}

#[async_trait]
impl MetricsSource for KubeProvider {
    async fn list_namespaces(&self) -> Result<Vec<String>, ProviderError> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        let list = api
            .list(&ListParams::default())
            .await
            .map_err(|e| ProviderError::fetch("namespaces", e))?;

        let mut names = Vec::with_capacity(list.items.len() + 1);
        names.push(NamespaceScope::ALL_LABEL.to_string());
        names.extend(list.items.iter().map(ResourceExt::name_any));
        Ok(names)
    }

    async fn list_pods(
        &self,
        scope: &NamespaceScope,
        selector: &str,
    ) -> Result<Vec<PodSnapshot>, ProviderError> {
        let pods = self
            .pods_api(scope)
            .list(&list_params(selector))
            .await
            .map_err(|e| ProviderError::fetch("pods", e))?;
        let usage = self.pod_usage(scope, selector).await;

        let snapshots = pods
            .items
            .iter()
            .map(|pod| {
                let mut snapshot = pod_snapshot(pod);
                let key = snapshot.key();
                let (cpu, memory) = usage.get(&key).copied().unwrap_or_default();
                snapshot.cpu_millicores = cpu;
                snapshot.memory_bytes = memory;
                snapshot.cpu_trend = self.trends.record(&key, cpu_trend_sample(cpu));
                snapshot.memory_trend = self
                    .trends
                    .record(&format!("{}-mem", key), memory_trend_sample(memory));
                snapshot
            })
            .collect::<Vec<_>>();

        debug!(namespace = %scope, count = snapshots.len(), "Listed pods");
        Ok(snapshots)
    }

    async fn list_nodes(&self) -> Result<Vec<NodeSnapshot>, ProviderError> {
        let usage = self.node_usage().await;
        let nodes: Api<Node> = Api::all(self.client.clone());
        let nodes = nodes
            .list(&ListParams::default())
            .await
            .map_err(|e| ProviderError::fetch("nodes", e))?;

        // One listing for all pod counts instead of one per node
        let all_pods = self.pods_api(&NamespaceScope::All);
        let pods_per_node = match all_pods.list(&ListParams::default()).await {
            Ok(pods) => count_pods_per_node(&pods.items),
            Err(error) => {
                warn!(error = %error, "Could not count pods per node");
                HashMap::new()
            }
        };

        let snapshots = nodes
            .items
            .iter()
            .map(|node| {
                let name = node.name_any();
                let (cpu_used, memory_used) = usage.get(&name).copied().unwrap_or_default();
                let (cpu_alloc, memory_alloc) = node
                    .status
                    .as_ref()
                    .and_then(|status| status.allocatable.as_ref())
                    .map(resources_from_map)
                    .unwrap_or_default();

                let cpu_ratio = clamp_ratio(cpu_used as f64 / cpu_alloc.max(1) as f64);
                let memory_ratio = clamp_ratio(memory_used as f64 / memory_alloc.max(1) as f64);

                NodeSnapshot {
                    cpu_ratio,
                    memory_ratio,
                    pods: pods_per_node.get(&name).copied().unwrap_or(0),
                    kubelet_version: node
                        .status
                        .as_ref()
                        .and_then(|status| status.node_info.as_ref())
                        .map(|info| info.kubelet_version.clone())
                        .unwrap_or_default(),
                    cpu_trend: self.trends.record(&format!("cpu-{}", name), cpu_ratio),
                    memory_trend: self.trends.record(&format!("mem-{}", name), memory_ratio),
                    name,
                }
            })
            .collect();
        Ok(snapshots)
    }
}

#[async_trait]
impl LogSource for KubeProvider {
    async fn stream_logs(
        &self,
        target: &LogTarget,
        cancel: CancelToken,
    ) -> Result<LogStream, ProviderError> {
        info!(target = %target, "Opening log stream");
        match target.kind {
            LogTargetKind::Pod => self.stream_pod(target, cancel).await,
            LogTargetKind::Deployment | LogTargetKind::StatefulSet | LogTargetKind::DaemonSet => {
                self.stream_workload(target, cancel).await
            }
            LogTargetKind::Node => self.stream_node_events(target, cancel).await,
        }
    }
}

async fn load_config(settings: &KubeSettings) -> Result<Config, ProviderError> {
    if settings.kubeconfig.is_none() && settings.context.is_none() {
        return Config::infer().await.map_err(ProviderError::configuration);
    }

    let kubeconfig = match &settings.kubeconfig {
        Some(path) => Kubeconfig::read_from(path),
        None => Kubeconfig::read(),
    }
    .map_err(ProviderError::configuration)?;

    let options = KubeConfigOptions {
        context: settings.context.clone(),
        ..KubeConfigOptions::default()
    };
    Config::from_custom_kubeconfig(kubeconfig, &options)
        .await
        .map_err(ProviderError::configuration)
}

fn list_params(selector: &str) -> ListParams {
    let selector = selector.trim();
    if selector.is_empty() {
        ListParams::default()
    } else {
        ListParams::default().labels(selector)
    }
}

/// Read lines until the stream ends, errors, or the token fires
async fn forward_lines<S>(
    lines: S,
    source: String,
    tx: mpsc::Sender<LogLine>,
    cancel: CancelToken,
) where
    S: Stream<Item = std::io::Result<String>> + Send + 'static,
{
    let mut lines = Box::pin(lines);
    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => break,
            next = lines.try_next() => next,
        };
        match next {
            Ok(Some(text)) => {
                let text = text.trim_end_matches(['\r', '\n']).to_string();
                let line = LogLine::new(LogLevel::infer(&text), text, source.as_str());
                if tx.send(line).await.is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(error) => {
                debug!(source = %source, error = %error, "Log stream read failed");
                break;
            }
        }
    }
    debug!(source = %source, "Log stream closed");
}

/// Static fields of a pod row; usage and trends are filled in by the caller
fn pod_snapshot(pod: &Pod) -> PodSnapshot {
    let spec = pod.spec.as_ref();
    let first = spec.and_then(|spec| spec.containers.first());
    let (cpu_request, memory_request) = first
        .and_then(|container| container.resources.as_ref())
        .and_then(|resources| resources.requests.as_ref())
        .map(resources_from_map)
        .unwrap_or_default();

    let status = pod.status.as_ref();
    let statuses = status
        .and_then(|status| status.container_statuses.as_deref())
        .unwrap_or_default();
    let ready = statuses.iter().filter(|s| s.ready).count();

    PodSnapshot {
        namespace: pod.namespace().unwrap_or_default(),
        name: pod.name_any(),
        container: first.map(|c| c.name.clone()).unwrap_or_default(),
        node: spec.and_then(|spec| spec.node_name.clone()).unwrap_or_default(),
        cpu_request_millicores: cpu_request,
        memory_request_bytes: memory_request,
        ready: format!("{}/{}", ready, statuses.len().max(1)),
        phase: status
            .and_then(|status| status.phase.clone())
            .unwrap_or_default(),
        ..PodSnapshot::default()
    }
}

fn count_pods_per_node(pods: &[Pod]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for node in pods
        .iter()
        .filter_map(|pod| pod.spec.as_ref().and_then(|spec| spec.node_name.clone()))
    {
        *counts.entry(node).or_insert(0) += 1;
    }
    counts
}

/// `(cpu millicores, memory bytes)` from a resource list
fn resources_from_map(resources: &BTreeMap<String, Quantity>) -> (u64, u64) {
    let cpu = resources
        .get("cpu")
        .and_then(|q| parse_cpu_millicores(&q.0))
        .unwrap_or(0);
    let memory = resources
        .get("memory")
        .and_then(|q| parse_memory_bytes(&q.0))
        .unwrap_or(0);
    (cpu, memory)
}

/// Sum of `containers[].usage` in a PodMetrics object
fn sum_container_usage(data: &Value) -> (u64, u64) {
    data.get("containers")
        .and_then(Value::as_array)
        .map(|containers| {
            containers.iter().fold((0u64, 0u64), |(cpu, memory), container| {
                let (c, m) = container.get("usage").map(usage_from_value).unwrap_or_default();
                (cpu.saturating_add(c), memory.saturating_add(m))
            })
        })
        .unwrap_or_default()
}

fn usage_from_value(value: &Value) -> (u64, u64) {
    let cpu = value
        .get("cpu")
        .and_then(Value::as_str)
        .and_then(parse_cpu_millicores)
        .unwrap_or(0);
    let memory = value
        .get("memory")
        .and_then(Value::as_str)
        .and_then(parse_memory_bytes)
        .unwrap_or(0);
    (cpu, memory)
}

fn format_label_selector(selector: &LabelSelector) -> String {
    let mut terms: Vec<String> = selector
        .match_labels
        .iter()
        .flatten()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect();

    for expr in selector.match_expressions.iter().flatten() {
        let values = expr.values.as_deref().unwrap_or_default().join(",");
        let term = match expr.operator.as_str() {
            "In" => format!("{} in ({})", expr.key, values),
            "NotIn" => format!("{} notin ({})", expr.key, values),
            "Exists" => expr.key.clone(),
            "DoesNotExist" => format!("!{}", expr.key),
            other => {
                debug!(operator = other, "Ignoring unknown selector operator");
                continue;
            }
        };
        terms.push(term);
    }
    terms.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelectorRequirement;
    use serde_json::json;

    #[test]
    fn test_sum_container_usage() {
        let data = json!({
            "containers": [
                {"name": "app", "usage": {"cpu": "120m", "memory": "100Mi"}},
                {"name": "sidecar", "usage": {"cpu": "250000000n", "memory": "28Mi"}},
            ]
        });
        assert_eq!(sum_container_usage(&data), (370, 128 * 1024 * 1024));
        assert_eq!(sum_container_usage(&json!({})), (0, 0));
    }

    #[test]
    fn test_format_label_selector() {
        let selector = LabelSelector {
            match_labels: Some(BTreeMap::from([
                ("app".to_string(), "api".to_string()),
                ("tier".to_string(), "web".to_string()),
            ])),
            match_expressions: Some(vec![LabelSelectorRequirement {
                key: "env".to_string(),
                operator: "In".to_string(),
                values: Some(vec!["prod".to_string(), "staging".to_string()]),
            }]),
        };
        assert_eq!(
            format_label_selector(&selector),
            "app=api,tier=web,env in (prod,staging)"
        );
    }

    #[test]
    fn test_pod_snapshot_from_spec() {
        let pod: Pod = serde_json::from_value(json!({
            "metadata": {"name": "api-1", "namespace": "default"},
            "spec": {
                "nodeName": "n1",
                "containers": [{
                    "name": "api",
                    "resources": {"requests": {"cpu": "100m", "memory": "256Mi"}}
                }]
            },
            "status": {
                "phase": "Running",
                "containerStatuses": [{
                    "name": "api", "ready": true, "restartCount": 0,
                    "image": "api:1", "imageID": ""
                }]
            }
        }))
        .unwrap();

        let snapshot = pod_snapshot(&pod);
        assert_eq!(snapshot.key(), "default/api-1");
        assert_eq!(snapshot.container, "api");
        assert_eq!(snapshot.node, "n1");
        assert_eq!(snapshot.cpu_request_millicores, 100);
        assert_eq!(snapshot.memory_request_bytes, 256 * 1024 * 1024);
        assert_eq!(snapshot.ready, "1/1");
        assert_eq!(snapshot.phase, "Running");
    }

    #[test]
    fn test_ready_defaults_to_one_total_without_statuses() {
        let pod: Pod = serde_json::from_value(json!({
            "metadata": {"name": "pending", "namespace": "default"}
        }))
        .unwrap();
        assert_eq!(pod_snapshot(&pod).ready, "0/1");
    }

    #[test]
    fn test_list_params_selector() {
        assert_eq!(list_params("  ").label_selector, None);
        assert_eq!(
            list_params("app=api").label_selector.as_deref(),
            Some("app=api")
        );
    }
}
