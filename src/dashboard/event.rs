//! Events fed into the dashboard and the effects it asks the executor to run

use std::fmt;
use std::time::Duration;

use crate::cancel::CancelToken;
use crate::domain::{
    LogLine, LogStream, LogTarget, NamespaceScope, NodeSnapshot, PodSnapshot, SortKey, ViewMode,
};
use crate::error::ProviderError;

/// Identifies one log subscription; never reused within a dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Parameters of one poll, echoed back with its result
///
/// `seq` grows monotonically so out-of-order completions can be discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollTicket {
    pub seq: u64,
    pub view: ViewMode,
    pub scope: NamespaceScope,
    pub sort: SortKey,
    pub selector: String,
}

/// Key presses the dashboard understands, decoupled from the terminal backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    CtrlC,
    Tab,
    Enter,
    Esc,
    Up,
    Down,
    PageUp,
    PageDown,
    Home,
    End,
}

/// Everything that can change dashboard state
#[derive(Debug)]
pub enum Event {
    /// Refresh interval elapsed
    Tick,
    Key(Key),
    Resize {
        width: u16,
        height: u16,
    },
    NamespacesLoaded(Result<Vec<String>, ProviderError>),
    PodsLoaded {
        ticket: PollTicket,
        result: Result<Vec<PodSnapshot>, ProviderError>,
    },
    NodesLoaded {
        ticket: PollTicket,
        result: Result<Vec<NodeSnapshot>, ProviderError>,
    },
    LogStreamOpened {
        id: SubscriptionId,
        stream: LogStream,
    },
    LogStreamFailed {
        id: SubscriptionId,
        error: ProviderError,
    },
    /// A line arrived; the stream handle comes back for the next read
    LogLineReceived {
        id: SubscriptionId,
        line: LogLine,
        stream: LogStream,
    },
    LogStreamEnded {
        id: SubscriptionId,
    },
}

/// Effects requested by the dashboard, run asynchronously by the executor
#[derive(Debug)]
pub enum Command {
    /// Post `Event::Tick` after the delay
    ScheduleTick(Duration),
    FetchNamespaces,
    Poll(PollTicket),
    OpenLogStream {
        id: SubscriptionId,
        target: LogTarget,
        cancel: CancelToken,
    },
    /// Read one line and post it back together with the stream
    ReadNextLog {
        id: SubscriptionId,
        stream: LogStream,
        cancel: CancelToken,
    },
    Quit,
}

impl Command {
    /// Short name for tracing
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ScheduleTick(_) => "schedule_tick",
            Self::FetchNamespaces => "fetch_namespaces",
            Self::Poll(_) => "poll",
            Self::OpenLogStream { .. } => "open_log_stream",
            Self::ReadNextLog { .. } => "read_next_log",
            Self::Quit => "quit",
        }
    }
}
