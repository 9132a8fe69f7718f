//! Data providers implementing the metrics and log capabilities
//!
//! [`SyntheticProvider`] serves `--mock` runs and tests. With the `kube`
//! feature, [`KubeProvider`] talks to a live cluster.

pub mod mock;
mod normalize;

#[cfg(feature = "kube")]
pub mod live;
#[cfg(feature = "kube")]
mod quantity;

pub use mock::{SyntheticProvider, matches_selector};
pub use normalize::{cpu_trend_sample, memory_trend_sample};

#[cfg(feature = "kube")]
pub use live::{KubeProvider, KubeSettings};
