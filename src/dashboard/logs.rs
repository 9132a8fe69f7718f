//! Log pane buffer and the active log subscription

use std::collections::VecDeque;

use super::event::SubscriptionId;
use crate::cancel::{CancelSource, CancelToken};
use crate::domain::LogTarget;

/// Default number of log lines kept in memory
pub const DEFAULT_LOG_LINES: usize = 1000;

/// Scrollback of formatted log lines shown in the logs pane
///
/// Keeps the most recent `capacity` lines. While `follow` is set the view
/// sticks to the bottom as lines arrive; manual scrolling up clears it.
#[derive(Debug, Clone)]
pub struct LogPane {
    lines: VecDeque<String>,
    capacity: usize,
    scroll: usize,
    viewport: usize,
    follow: bool,
}

impl LogPane {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: VecDeque::with_capacity(capacity.min(DEFAULT_LOG_LINES)),
            capacity,
            scroll: 0,
            viewport: 0,
            follow: true,
        }
    }

    /// Append a line, dropping the oldest when full
    ///
    /// A manual scroll position stays on the same text when the oldest line
    /// is evicted underneath it.
    pub fn push(&mut self, line: String) {
        if self.lines.len() >= self.capacity {
            self.lines.pop_front();
            if !self.follow {
                self.scroll = self.scroll.saturating_sub(1);
            }
        }
        self.lines.push_back(line);
        if self.follow {
            self.scroll_to_bottom();
        } else {
            self.scroll = self.scroll.min(self.max_scroll());
        }
    }

    /// Forget all lines and re-enable follow mode
    pub fn clear(&mut self) {
        self.lines.clear();
        self.scroll = 0;
        self.follow = true;
    }

    /// Number of visible rows, updated on layout changes
    pub fn set_viewport(&mut self, rows: usize) {
        self.viewport = rows;
        if self.follow {
            self.scroll_to_bottom();
        } else {
            self.scroll = self.scroll.min(self.max_scroll());
        }
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll = self.max_scroll();
        self.follow = true;
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll = 0;
        self.follow = self.max_scroll() == 0;
    }

    pub fn page_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(self.page());
        self.follow = false;
    }

    pub fn page_down(&mut self) {
        self.scroll = (self.scroll + self.page()).min(self.max_scroll());
        self.follow = self.scroll == self.max_scroll();
    }

    #[must_use]
    pub fn lines(&self) -> &VecDeque<String> {
        &self.lines
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// First visible line
    #[must_use]
    pub fn scroll(&self) -> usize {
        self.scroll
    }

    #[must_use]
    pub fn is_following(&self) -> bool {
        self.follow
    }

    /// Lines currently in view
    pub fn visible(&self) -> impl Iterator<Item = &str> {
        self.lines
            .iter()
            .skip(self.scroll)
            .take(self.viewport.max(1))
            .map(String::as_str)
    }

    fn max_scroll(&self) -> usize {
        self.lines.len().saturating_sub(self.viewport.max(1))
    }

    fn page(&self) -> usize {
        self.viewport.max(1)
    }
}

impl Default for LogPane {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_LINES)
    }
}

/// Lifecycle of a log subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionStatus {
    /// Waiting for the provider to open the stream
    Opening,
    Streaming,
    /// Provider closed the stream; the pane keeps the final buffer
    Ended,
}

/// The one log stream the dashboard is currently consuming
#[derive(Debug)]
pub struct LogSubscription {
    id: SubscriptionId,
    target: LogTarget,
    cancel: CancelSource,
    status: SubscriptionStatus,
}

impl LogSubscription {
    #[must_use]
    pub fn new(id: SubscriptionId, target: LogTarget) -> Self {
        Self {
            id,
            target,
            cancel: CancelSource::new(),
            status: SubscriptionStatus::Opening,
        }
    }

    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    #[must_use]
    pub fn target(&self) -> &LogTarget {
        &self.target
    }

    #[must_use]
    pub fn status(&self) -> SubscriptionStatus {
        self.status
    }

    pub(crate) fn set_status(&mut self, status: SubscriptionStatus) {
        self.status = status;
    }

    #[must_use]
    pub fn token(&self) -> CancelToken {
        self.cancel.token()
    }

    /// Stop the underlying stream; safe to call more than once
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pane_with(lines: usize, viewport: usize) -> LogPane {
        let mut pane = LogPane::new(100);
        pane.set_viewport(viewport);
        for i in 0..lines {
            pane.push(format!("line {}", i));
        }
        pane
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut pane = LogPane::new(3);
        for i in 0..5 {
            pane.push(format!("line {}", i));
        }
        let lines: Vec<&String> = pane.lines().iter().collect();
        assert_eq!(lines, vec!["line 2", "line 3", "line 4"]);
    }

    #[test]
    fn test_follow_sticks_to_bottom() {
        let pane = pane_with(20, 5);
        assert!(pane.is_following());
        assert_eq!(pane.scroll(), 15);
        let visible: Vec<&str> = pane.visible().collect();
        assert_eq!(visible.first(), Some(&"line 15"));
        assert_eq!(visible.last(), Some(&"line 19"));
    }

    #[test]
    fn test_page_up_stops_following() {
        let mut pane = pane_with(20, 5);
        pane.page_up();
        assert!(!pane.is_following());
        assert_eq!(pane.scroll(), 10);

        pane.push("new".to_string());
        assert_eq!(pane.scroll(), 10, "manual position kept while not following");
    }

    #[test]
    fn test_manual_position_tracks_text_across_eviction() {
        let mut pane = LogPane::new(10);
        pane.set_viewport(3);
        for i in 0..10 {
            pane.push(format!("line {}", i));
        }
        pane.page_up();
        assert_eq!(pane.scroll(), 4);
        assert_eq!(pane.visible().next(), Some("line 4"));

        for i in 10..13 {
            pane.push(format!("line {}", i));
        }
        assert!(!pane.is_following());
        assert_eq!(pane.scroll(), 1);
        assert_eq!(pane.visible().next(), Some("line 4"));
    }

    #[test]
    fn test_page_down_to_bottom_resumes_follow() {
        let mut pane = pane_with(20, 5);
        pane.scroll_to_top();
        assert_eq!(pane.scroll(), 0);
        pane.page_down();
        pane.page_down();
        pane.page_down();
        assert!(pane.is_following());
        assert_eq!(pane.scroll(), 15);
    }

    #[test]
    fn test_clear_resets() {
        let mut pane = pane_with(10, 3);
        pane.page_up();
        pane.clear();
        assert!(pane.is_empty());
        assert!(pane.is_following());
        assert_eq!(pane.scroll(), 0);
    }

    #[test]
    fn test_subscription_cancel_is_idempotent() {
        let sub = LogSubscription::new(SubscriptionId::new(1), LogTarget::node("n1"));
        let token = sub.token();
        assert_eq!(sub.status(), SubscriptionStatus::Opening);
        sub.cancel();
        sub.cancel();
        assert!(sub.is_cancelled());
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_dropping_subscription_cancels_tokens() {
        let sub = LogSubscription::new(SubscriptionId::new(2), LogTarget::node("n1"));
        let token = sub.token();
        drop(sub);
        assert!(token.is_cancelled());
    }
}
