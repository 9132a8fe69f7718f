//! Reactive dashboard engine
//!
//! [`Dashboard`] owns all view state and is mutated only through
//! [`Dashboard::update`], one [`Event`] at a time. Handlers never block; any
//! work that may take time is returned as a [`Command`] for the executor,
//! whose results come back later as new events. This keeps every frame a
//! consistent snapshot of the last fully processed event.

mod event;
mod logs;
mod sort;

pub use event::{Command, Event, Key, PollTicket, SubscriptionId};
pub use logs::{DEFAULT_LOG_LINES, LogPane, LogSubscription, SubscriptionStatus};
pub use sort::{sort_nodes, sort_pods};

use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::domain::{
    LogLine, LogStream, LogTarget, NamespaceScope, NodeSnapshot, PodSnapshot, SortKey, ViewMode,
};
use crate::error::ProviderError;
use crate::layout::{self, DashboardLayout};

/// Namespace candidate used when none could be fetched
pub const FALLBACK_NAMESPACE: &str = "default";

/// Rows moved by page keys when the logs pane is closed
const TABLE_PAGE: usize = 10;

/// Terminal size assumed until the first resize event
const DEFAULT_TERMINAL: TerminalSize = TerminalSize {
    width: 120,
    height: 40,
};

/// Knobs resolved from configuration at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSettings {
    pub refresh_interval: Duration,
    pub initial_namespace: NamespaceScope,
    /// Label selector passed to every pod poll
    pub selector: String,
    /// Whether `esc` quits once no pane is left to close
    pub esc_quits: bool,
    pub log_buffer_lines: usize,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(2),
            initial_namespace: NamespaceScope::default(),
            selector: String::new(),
            esc_quits: true,
            log_buffer_lines: DEFAULT_LOG_LINES,
        }
    }
}

/// Independently toggleable panes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Panes {
    pub info: bool,
    pub logs: bool,
    pub namespace_picker: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalSize {
    pub width: u16,
    pub height: u16,
}

/// The dashboard state machine
#[derive(Debug)]
pub struct Dashboard {
    settings: DashboardSettings,
    view: ViewMode,
    namespace: NamespaceScope,
    namespace_candidates: Vec<String>,
    picker_cursor: usize,
    sort: SortKey,
    selection: usize,
    reset_cursor: bool,
    panes: Panes,
    pods: Vec<PodSnapshot>,
    nodes: Vec<NodeSnapshot>,
    log_pane: LogPane,
    subscription: Option<LogSubscription>,
    terminal: TerminalSize,
    layout: DashboardLayout,
    last_error: Option<ProviderError>,
    next_seq: u64,
    applied_seq: Option<u64>,
    next_subscription: u64,
    quitting: bool,
}

impl Dashboard {
    #[must_use]
    pub fn new(settings: DashboardSettings) -> Self {
        let view = ViewMode::default();
        let layout = layout::compute(
            DEFAULT_TERMINAL.width,
            DEFAULT_TERMINAL.height,
            false,
            false,
            view,
        );
        let mut log_pane = LogPane::new(settings.log_buffer_lines);
        log_pane.set_viewport(layout.logs_viewport());

        Self {
            namespace: settings.initial_namespace.clone(),
            settings,
            view,
            namespace_candidates: vec![FALLBACK_NAMESPACE.to_string()],
            picker_cursor: 0,
            sort: SortKey::default(),
            selection: 0,
            reset_cursor: false,
            panes: Panes::default(),
            pods: Vec::new(),
            nodes: Vec::new(),
            log_pane,
            subscription: None,
            terminal: DEFAULT_TERMINAL,
            layout,
            last_error: None,
            next_seq: 1,
            applied_seq: None,
            next_subscription: 1,
            quitting: false,
        }
    }

    /// Effects to run once at startup: namespaces, first poll, first tick
    pub fn start(&mut self) -> Vec<Command> {
        info!(
            view = %self.view,
            namespace = %self.namespace,
            interval_ms = self.settings.refresh_interval.as_millis() as u64,
            "Starting dashboard"
        );
        vec![
            Command::FetchNamespaces,
            self.poll(),
            Command::ScheduleTick(self.settings.refresh_interval),
        ]
    }

    /// Apply one event and return the effects it schedules
    pub fn update(&mut self, event: Event) -> Vec<Command> {
        if self.quitting {
            return Vec::new();
        }

        match event {
            Event::Tick => self.on_tick(),
            Event::Key(key) => self.on_key(key),
            Event::Resize { width, height } => {
                self.terminal = TerminalSize { width, height };
                self.relayout();
                Vec::new()
            }
            Event::NamespacesLoaded(result) => {
                self.on_namespaces(result);
                Vec::new()
            }
            Event::PodsLoaded { ticket, result } => {
                self.on_pods(ticket, result);
                Vec::new()
            }
            Event::NodesLoaded { ticket, result } => {
                self.on_nodes(ticket, result);
                Vec::new()
            }
            Event::LogStreamOpened { id, stream } => self.on_stream_opened(id, stream),
            Event::LogStreamFailed { id, error } => {
                self.on_stream_failed(id, error);
                Vec::new()
            }
            Event::LogLineReceived { id, line, stream } => self.on_log_line(id, line, stream),
            Event::LogStreamEnded { id } => {
                self.on_stream_ended(id);
                Vec::new()
            }
        }
    }

    // ------------------------------------------------------------------
    // Polling
    // ------------------------------------------------------------------

    fn poll(&mut self) -> Command {
        let seq = self.next_seq;
        self.next_seq += 1;
        debug!(seq, view = %self.view, namespace = %self.namespace, "Scheduling poll");
        Command::Poll(PollTicket {
            seq,
            view: self.view,
            scope: self.namespace.clone(),
            sort: self.sort,
            selector: self.settings.selector.clone(),
        })
    }

    fn on_tick(&mut self) -> Vec<Command> {
        // Polls may overlap; sequence numbers drop whichever result lands late
        vec![
            self.poll(),
            Command::ScheduleTick(self.settings.refresh_interval),
        ]
    }

    /// Whether a completed poll may replace the cache
    fn accept_poll(&self, ticket: &PollTicket) -> bool {
        if self.applied_seq.is_some_and(|applied| ticket.seq < applied) {
            debug!(seq = ticket.seq, applied = ?self.applied_seq, "Discarding out-of-order poll");
            return false;
        }
        if ticket.view != self.view || ticket.scope != self.namespace {
            debug!(seq = ticket.seq, "Discarding poll for a previous view or namespace");
            return false;
        }
        true
    }

    fn on_pods(&mut self, ticket: PollTicket, result: Result<Vec<PodSnapshot>, ProviderError>) {
        if !self.accept_poll(&ticket) {
            return;
        }
        match result {
            Ok(mut pods) => {
                sort_pods(&mut pods, self.sort);
                self.pods = pods;
                self.finish_poll(ticket.seq);
            }
            Err(error) => self.record_error(error),
        }
    }

    fn on_nodes(&mut self, ticket: PollTicket, result: Result<Vec<NodeSnapshot>, ProviderError>) {
        if !self.accept_poll(&ticket) {
            return;
        }
        match result {
            Ok(mut nodes) => {
                sort_nodes(&mut nodes, self.sort);
                self.nodes = nodes;
                self.finish_poll(ticket.seq);
            }
            Err(error) => self.record_error(error),
        }
    }

    fn finish_poll(&mut self, seq: u64) {
        self.applied_seq = Some(seq);
        self.last_error = None;
        let rows = self.row_count();
        if rows == 0 || self.reset_cursor || self.selection >= rows {
            self.selection = 0;
        }
        self.reset_cursor = false;
    }

    fn record_error(&mut self, error: ProviderError) {
        if error.is_fatal() {
            error!(error = %error, "Provider is misconfigured, keeping previous data");
        } else {
            warn!(error = %error, "Provider call failed, keeping previous data");
        }
        self.last_error = Some(error);
    }

    fn on_namespaces(&mut self, result: Result<Vec<String>, ProviderError>) {
        match result {
            Ok(names) if !names.is_empty() => self.namespace_candidates = names,
            Ok(_) => self.namespace_candidates = vec![FALLBACK_NAMESPACE.to_string()],
            Err(error) => self.record_error(error),
        }
        if self.namespace_candidates.is_empty() {
            self.namespace_candidates = vec![FALLBACK_NAMESPACE.to_string()];
        }
        self.picker_cursor = self.picker_cursor.min(self.namespace_candidates.len() - 1);
    }

    // ------------------------------------------------------------------
    // Keyboard
    // ------------------------------------------------------------------

    fn on_key(&mut self, key: Key) -> Vec<Command> {
        if self.panes.namespace_picker {
            return self.on_picker_key(key);
        }

        match key {
            Key::Char('q') | Key::CtrlC => self.quit(),
            Key::Esc => self.on_escape(),
            Key::Tab => self.switch_view(),
            Key::Char('n') => {
                self.open_picker();
                Vec::new()
            }
            Key::Char('i') => {
                self.panes.info = !self.panes.info;
                self.relayout();
                Vec::new()
            }
            Key::Enter => {
                if !self.panes.info {
                    self.panes.info = true;
                    self.relayout();
                }
                Vec::new()
            }
            Key::Char('l') => {
                if self.panes.logs {
                    self.close_logs();
                    Vec::new()
                } else {
                    self.open_logs()
                }
            }
            Key::Char('s') => self.toggle_sort(),
            Key::Char('r') => vec![Command::FetchNamespaces, self.poll()],
            Key::Up | Key::Char('k') => {
                self.move_selection(-1);
                Vec::new()
            }
            Key::Down | Key::Char('j') => {
                self.move_selection(1);
                Vec::new()
            }
            Key::PageUp | Key::PageDown | Key::Home | Key::End => {
                self.on_scroll_key(key);
                Vec::new()
            }
            Key::Char(_) => Vec::new(),
        }
    }

    fn on_escape(&mut self) -> Vec<Command> {
        if self.panes.info {
            self.panes.info = false;
            self.relayout();
        } else if self.panes.logs {
            self.close_logs();
        } else if self.settings.esc_quits {
            return self.quit();
        }
        Vec::new()
    }

    fn on_scroll_key(&mut self, key: Key) {
        if self.panes.logs {
            match key {
                Key::PageUp => self.log_pane.page_up(),
                Key::PageDown => self.log_pane.page_down(),
                Key::Home => self.log_pane.scroll_to_top(),
                _ => self.log_pane.scroll_to_bottom(),
            }
            return;
        }

        let last = self.row_count().saturating_sub(1);
        self.selection = match key {
            Key::PageUp => self.selection.saturating_sub(TABLE_PAGE),
            Key::PageDown => (self.selection + TABLE_PAGE).min(last),
            Key::Home => 0,
            _ => last,
        };
    }

    fn move_selection(&mut self, delta: isize) {
        let rows = self.row_count();
        if rows == 0 {
            self.selection = 0;
            return;
        }
        self.selection = self.selection.saturating_add_signed(delta).min(rows - 1);
    }

    fn quit(&mut self) -> Vec<Command> {
        info!("Quit requested");
        self.cancel_subscription();
        self.quitting = true;
        vec![Command::Quit]
    }

    fn switch_view(&mut self) -> Vec<Command> {
        self.view = self.view.toggled();
        self.panes.info = false;
        self.close_logs();
        self.selection = 0;
        self.reset_cursor = true;
        self.relayout();
        info!(view = %self.view, "Switched view");
        vec![self.poll()]
    }

    fn toggle_sort(&mut self) -> Vec<Command> {
        self.sort = self.sort.toggled();
        sort_pods(&mut self.pods, self.sort);
        sort_nodes(&mut self.nodes, self.sort);
        debug!(sort = %self.sort, "Toggled sort key");
        vec![self.poll()]
    }

    // ------------------------------------------------------------------
    // Namespace picker
    // ------------------------------------------------------------------

    fn open_picker(&mut self) {
        self.panes.namespace_picker = true;
        self.picker_cursor = self
            .namespace_candidates
            .iter()
            .position(|candidate| NamespaceScope::parse(candidate) == self.namespace)
            .unwrap_or(0);
    }

    fn on_picker_key(&mut self, key: Key) -> Vec<Command> {
        let last = self.namespace_candidates.len().saturating_sub(1);
        match key {
            Key::Up | Key::Char('k') => self.picker_cursor = self.picker_cursor.saturating_sub(1),
            Key::Down | Key::Char('j') => self.picker_cursor = (self.picker_cursor + 1).min(last),
            Key::PageUp => self.picker_cursor = self.picker_cursor.saturating_sub(TABLE_PAGE),
            Key::PageDown => self.picker_cursor = (self.picker_cursor + TABLE_PAGE).min(last),
            Key::Home => self.picker_cursor = 0,
            Key::End => self.picker_cursor = last,
            Key::Enter => return self.confirm_namespace(),
            Key::Esc => self.panes.namespace_picker = false,
            Key::Char('q') | Key::CtrlC => return self.quit(),
            _ => {}
        }
        Vec::new()
    }

    fn confirm_namespace(&mut self) -> Vec<Command> {
        self.panes.namespace_picker = false;
        let index = self.picker_cursor.min(self.namespace_candidates.len().saturating_sub(1));
        let Some(candidate) = self.namespace_candidates.get(index) else {
            return Vec::new();
        };
        let scope = NamespaceScope::parse(candidate);
        if scope == self.namespace {
            return Vec::new();
        }

        info!(from = %self.namespace, to = %scope, "Switching namespace");
        // Cancel before anything else so no old line can reach the cleared pane
        self.cancel_subscription();
        self.namespace = scope;
        self.selection = 0;
        self.reset_cursor = true;
        self.panes.info = false;
        self.panes.logs = false;
        self.log_pane.clear();
        self.relayout();
        vec![self.poll()]
    }

    // ------------------------------------------------------------------
    // Log subscription
    // ------------------------------------------------------------------

    fn open_logs(&mut self) -> Vec<Command> {
        if self.panes.logs {
            return Vec::new();
        }
        let Some(target) = self.selected_log_target() else {
            debug!("No row selected, not opening logs");
            return Vec::new();
        };

        self.cancel_subscription();
        self.log_pane.clear();

        let id = SubscriptionId::new(self.next_subscription);
        self.next_subscription += 1;
        let subscription = LogSubscription::new(id, target.clone());
        let cancel = subscription.token();
        self.subscription = Some(subscription);
        self.panes.logs = true;
        self.relayout();

        info!(subscription = %id, target = %target, "Opening log stream");
        vec![Command::OpenLogStream { id, target, cancel }]
    }

    fn close_logs(&mut self) {
        if !self.panes.logs {
            return;
        }
        self.panes.logs = false;
        self.cancel_subscription();
        self.relayout();
    }

    fn cancel_subscription(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.cancel();
            info!(subscription = %subscription.id(), "Cancelled log stream");
        }
    }

    /// The live subscription, if `id` still refers to it
    fn active_subscription(&mut self, id: SubscriptionId) -> Option<&mut LogSubscription> {
        self.subscription
            .as_mut()
            .filter(|subscription| subscription.id() == id && !subscription.is_cancelled())
    }

    fn on_stream_opened(&mut self, id: SubscriptionId, stream: LogStream) -> Vec<Command> {
        let Some(subscription) = self.active_subscription(id) else {
            debug!(subscription = %id, "Dropping stream for stale subscription");
            return Vec::new();
        };
        subscription.set_status(SubscriptionStatus::Streaming);
        let cancel = subscription.token();
        vec![Command::ReadNextLog { id, stream, cancel }]
    }

    fn on_stream_failed(&mut self, id: SubscriptionId, error: ProviderError) {
        if self.active_subscription(id).is_none() {
            return;
        }
        warn!(subscription = %id, error = %error, "Log stream failed to open");
        self.cancel_subscription();
        self.panes.logs = false;
        self.last_error = Some(error);
        self.relayout();
    }

    fn on_log_line(&mut self, id: SubscriptionId, line: LogLine, stream: LogStream) -> Vec<Command> {
        let Some(subscription) = self.active_subscription(id) else {
            return Vec::new();
        };
        let cancel = subscription.token();
        self.log_pane.push(line.display());
        vec![Command::ReadNextLog { id, stream, cancel }]
    }

    fn on_stream_ended(&mut self, id: SubscriptionId) {
        if let Some(subscription) = self.active_subscription(id) {
            subscription.set_status(SubscriptionStatus::Ended);
            info!(subscription = %id, "Log stream ended");
        }
    }

    // ------------------------------------------------------------------
    // Derived state
    // ------------------------------------------------------------------

    fn relayout(&mut self) {
        self.layout = layout::compute(
            self.terminal.width,
            self.terminal.height,
            self.panes.info,
            self.panes.logs,
            self.view,
        );
        self.log_pane.set_viewport(self.layout.logs_viewport());
    }

    fn selected_log_target(&self) -> Option<LogTarget> {
        match self.view {
            ViewMode::Pods => self
                .selected_pod()
                .map(|pod| LogTarget::pod(&pod.namespace, &pod.name, &pod.container)),
            ViewMode::Nodes => self.selected_node().map(|node| LogTarget::node(&node.name)),
        }
    }

    /// Rows in the table for the active view
    #[must_use]
    pub fn row_count(&self) -> usize {
        match self.view {
            ViewMode::Pods => self.pods.len(),
            ViewMode::Nodes => self.nodes.len(),
        }
    }

    #[must_use]
    pub fn selected_pod(&self) -> Option<&PodSnapshot> {
        self.pods.get(self.selection)
    }

    #[must_use]
    pub fn selected_node(&self) -> Option<&NodeSnapshot> {
        self.nodes.get(self.selection)
    }

    #[must_use]
    pub fn view(&self) -> ViewMode {
        self.view
    }

    #[must_use]
    pub fn namespace(&self) -> &NamespaceScope {
        &self.namespace
    }

    #[must_use]
    pub fn namespace_candidates(&self) -> &[String] {
        &self.namespace_candidates
    }

    #[must_use]
    pub fn picker_cursor(&self) -> usize {
        self.picker_cursor
    }

    #[must_use]
    pub fn sort_key(&self) -> SortKey {
        self.sort
    }

    #[must_use]
    pub fn selection(&self) -> usize {
        self.selection
    }

    #[must_use]
    pub fn panes(&self) -> Panes {
        self.panes
    }

    #[must_use]
    pub fn pods(&self) -> &[PodSnapshot] {
        &self.pods
    }

    #[must_use]
    pub fn nodes(&self) -> &[NodeSnapshot] {
        &self.nodes
    }

    #[must_use]
    pub fn log_pane(&self) -> &LogPane {
        &self.log_pane
    }

    #[must_use]
    pub fn subscription(&self) -> Option<&LogSubscription> {
        self.subscription.as_ref()
    }

    #[must_use]
    pub fn layout(&self) -> &DashboardLayout {
        &self.layout
    }

    #[must_use]
    pub fn terminal_size(&self) -> TerminalSize {
        self.terminal
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&ProviderError> {
        self.last_error.as_ref()
    }

    #[must_use]
    pub fn selector(&self) -> &str {
        &self.settings.selector
    }

    #[must_use]
    pub fn is_quitting(&self) -> bool {
        self.quitting
    }
}
