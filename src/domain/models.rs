//! Snapshot rows, log lines and the selectors that address them

use chrono::{DateTime, Local};
use std::fmt;
use std::sync::Arc;

// ============================================================================
// View Selectors
// ============================================================================

/// Which entity list the dashboard is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ViewMode {
    #[default]
    Pods,
    Nodes,
}

impl ViewMode {
    /// The other view
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Pods => Self::Nodes,
            Self::Nodes => Self::Pods,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pods => "Pods",
            Self::Nodes => "Nodes",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Metric the entity tables are ordered by (always descending)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortKey {
    #[default]
    Cpu,
    Memory,
}

impl SortKey {
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Cpu => Self::Memory,
            Self::Memory => Self::Cpu,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Memory => "mem",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Namespace filter applied to pod polls
///
/// Providers that speak the Kubernetes API convention translate `All` to the
/// empty namespace string via [`NamespaceScope::api_namespace`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NamespaceScope {
    All,
    Named(String),
}

impl NamespaceScope {
    /// Label used for the unfiltered scope in namespace candidate lists
    pub const ALL_LABEL: &'static str = "all";

    /// Parse a namespace candidate; `"all"` and blank input select every namespace
    #[must_use]
    pub fn parse(name: &str) -> Self {
        let name = name.trim();
        if name.is_empty() || name == Self::ALL_LABEL {
            Self::All
        } else {
            Self::Named(name.to_string())
        }
    }

    /// Human-facing label (`"all"` for the unfiltered scope)
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::All => Self::ALL_LABEL,
            Self::Named(name) => name,
        }
    }

    /// Namespace string in API convention (empty means all namespaces)
    #[must_use]
    pub fn api_namespace(&self) -> &str {
        match self {
            Self::All => "",
            Self::Named(name) => name,
        }
    }

    /// Whether a row from `namespace` belongs to this scope
    #[must_use]
    pub fn contains(&self, namespace: &str) -> bool {
        match self {
            Self::All => true,
            Self::Named(name) => name == namespace,
        }
    }
}

impl Default for NamespaceScope {
    fn default() -> Self {
        Self::Named("default".to_string())
    }
}

impl fmt::Display for NamespaceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// Snapshot Rows
// ============================================================================

/// Read-only view of an entity's normalized usage history, most recent last
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trend {
    samples: Arc<[f64]>,
}

impl Trend {
    #[must_use]
    pub fn new(samples: impl Into<Arc<[f64]>>) -> Self {
        Self {
            samples: samples.into(),
        }
    }

    #[must_use]
    #[inline]
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Most recent sample, if any
    #[must_use]
    pub fn latest(&self) -> Option<f64> {
        self.samples.last().copied()
    }
}

impl From<Vec<f64>> for Trend {
    fn from(samples: Vec<f64>) -> Self {
        Self::new(samples)
    }
}

/// One row of the Pods table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PodSnapshot {
    pub namespace: String,
    pub name: String,
    /// Container shown in the table and used for log targets
    pub container: String,
    pub node: String,
    pub cpu_millicores: u64,
    pub memory_bytes: u64,
    /// Zero when the container declares no request
    pub cpu_request_millicores: u64,
    pub memory_request_bytes: u64,
    /// Ready containers as `"ready/total"`
    pub ready: String,
    pub phase: String,
    pub cpu_trend: Trend,
    pub memory_trend: Trend,
}

impl PodSnapshot {
    /// Trend key in `<namespace>/<pod>` form
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

/// One row of the Nodes table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeSnapshot {
    pub name: String,
    /// Used / allocatable, clamped to `[0, 1]`
    pub cpu_ratio: f64,
    pub memory_ratio: f64,
    pub pods: usize,
    pub kubelet_version: String,
    pub cpu_trend: Trend,
    pub memory_trend: Trend,
}

// ============================================================================
// Log Lines
// ============================================================================

/// Severity of a streamed log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LogLevel {
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Infer a level from raw log text
    #[must_use]
    pub fn infer(text: &str) -> Self {
        let upper = text.to_ascii_uppercase();
        if upper.contains("ERROR") {
            Self::Error
        } else if upper.contains("WARN") {
            Self::Warn
        } else {
            Self::Info
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // pad() keeps width specifiers like {:<5} working
        f.pad(self.as_str())
    }
}

/// A single line delivered by a log stream
#[derive(Debug, Clone, PartialEq)]
pub struct LogLine {
    pub timestamp: DateTime<Local>,
    pub level: LogLevel,
    pub text: String,
    /// `pod/container`, `event/<node>` and similar
    pub source: String,
}

impl LogLine {
    #[must_use]
    pub fn new(level: LogLevel, text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            level,
            text: text.into(),
            source: source.into(),
        }
    }

    /// Display form: `HH:MM:SS.mmm LEVEL text [source]`
    #[must_use]
    pub fn display(&self) -> String {
        format!(
            "{} {:<5} {} [{}]",
            self.timestamp.format("%H:%M:%S%.3f"),
            self.level,
            self.text,
            self.source
        )
    }
}

/// What kind of object a log stream subscribes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogTargetKind {
    Pod,
    Deployment,
    StatefulSet,
    DaemonSet,
    Node,
}

impl LogTargetKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pod => "Pod",
            Self::Deployment => "Deployment",
            Self::StatefulSet => "StatefulSet",
            Self::DaemonSet => "DaemonSet",
            Self::Node => "Node",
        }
    }
}

/// Identifies what a log stream subscribes to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LogTarget {
    /// Empty for cluster-scoped targets (nodes)
    pub namespace: String,
    pub kind: LogTargetKind,
    pub name: String,
    pub container: Option<String>,
}

impl LogTarget {
    #[must_use]
    pub fn pod(namespace: &str, name: &str, container: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            kind: LogTargetKind::Pod,
            name: name.to_string(),
            container: (!container.is_empty()).then(|| container.to_string()),
        }
    }

    #[must_use]
    pub fn node(name: &str) -> Self {
        Self {
            namespace: String::new(),
            kind: LogTargetKind::Node,
            name: name.to_string(),
            container: None,
        }
    }
}

impl fmt::Display for LogTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.kind.as_str())?;
        if !self.namespace.is_empty() {
            write!(f, "{}/", self.namespace)?;
        }
        write!(f, "{}", self.name)?;
        if let Some(container) = &self.container {
            write!(f, " ({})", container)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_namespace_scope_parse() {
        assert_eq!(NamespaceScope::parse("all"), NamespaceScope::All);
        assert_eq!(NamespaceScope::parse("  "), NamespaceScope::All);
        assert_eq!(
            NamespaceScope::parse(" staging "),
            NamespaceScope::Named("staging".to_string())
        );
    }

    #[test]
    fn test_namespace_scope_api_convention() {
        assert_eq!(NamespaceScope::All.api_namespace(), "");
        assert_eq!(NamespaceScope::All.label(), "all");
        let scope = NamespaceScope::default();
        assert_eq!(scope.api_namespace(), "default");
        assert!(scope.contains("default"));
        assert!(!scope.contains("staging"));
        assert!(NamespaceScope::All.contains("anything"));
    }

    #[test]
    fn test_view_and_sort_toggle() {
        assert_eq!(ViewMode::Pods.toggled(), ViewMode::Nodes);
        assert_eq!(ViewMode::Nodes.toggled().toggled(), ViewMode::Nodes);
        assert_eq!(SortKey::Cpu.toggled(), SortKey::Memory);
        assert_eq!(SortKey::default(), SortKey::Cpu);
    }

    #[test]
    fn test_log_level_infer() {
        assert_eq!(LogLevel::infer("db error: timeout"), LogLevel::Error);
        assert_eq!(LogLevel::infer("[warning] slow"), LogLevel::Warn);
        assert_eq!(LogLevel::infer("request ok"), LogLevel::Info);
    }

    #[test]
    fn test_log_line_display_format() {
        let timestamp = Local
            .with_ymd_and_hms(2024, 5, 1, 9, 8, 7)
            .single()
            .unwrap()
            + chrono::Duration::milliseconds(42);
        let line = LogLine {
            timestamp,
            level: LogLevel::Warn,
            text: "queue lag=233ms".to_string(),
            source: "api-1/api".to_string(),
        };
        assert_eq!(line.display(), "09:08:07.042 WARN  queue lag=233ms [api-1/api]");
    }

    #[test]
    fn test_log_target_constructors() {
        let pod = LogTarget::pod("default", "api-1", "");
        assert_eq!(pod.container, None);
        assert_eq!(pod.to_string(), "Pod default/api-1");

        let node = LogTarget::node("ip-10-0-1-5");
        assert_eq!(node.kind, LogTargetKind::Node);
        assert_eq!(node.to_string(), "Node ip-10-0-1-5");
    }

    #[test]
    fn test_trend_accessors() {
        let trend = Trend::from(vec![0.1, 0.5]);
        assert_eq!(trend.len(), 2);
        assert_eq!(trend.latest(), Some(0.5));
        assert!(Trend::default().is_empty());
    }
}
