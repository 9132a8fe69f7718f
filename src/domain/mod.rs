//! Domain model shared by the dashboard core and the data providers

mod models;
mod ports;

pub use models::{
    LogLevel, LogLine, LogTarget, LogTargetKind, NamespaceScope, NodeSnapshot, PodSnapshot,
    SortKey, Trend, ViewMode,
};
pub use ports::{LogSource, LogStream, MetricsSource};
