//! Responsive layout: pane heights and table column widths from terminal size
//!
//! Everything here is a pure function of its inputs, so the dashboard can
//! recompute it on every resize or pane toggle without bookkeeping.

use crate::domain::ViewMode;

/// Layout constants
pub mod constants {
    /// Title line plus status line
    pub const HEADER_HEIGHT: u16 = 2;
    pub const FOOTER_HEIGHT: u16 = 1;
    /// Top and bottom padding around the body
    pub const VERTICAL_PADDING: u16 = 2;
    /// Side padding and borders subtracted from the terminal width
    pub const HORIZONTAL_PADDING: u16 = 4;

    /// Floor for the space shared by table and panes
    pub const MIN_BODY_HEIGHT: u16 = 10;
    /// The table never shrinks below this, whatever the pane ratios say
    pub const MIN_TABLE_HEIGHT: u16 = 8;
    /// Border plus one line of content
    pub const MIN_PANE_HEIGHT: u16 = 3;

    pub const BOTH_PANES_TABLE_PCT: u16 = 50;
    pub const BOTH_PANES_LOGS_PCT: u16 = 30;
    pub const LOGS_ONLY_TABLE_PCT: u16 = 55;
    pub const INFO_ONLY_TABLE_PCT: u16 = 65;
}

use constants::*;

/// Column widths of the Pods table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PodColumns {
    pub pod: u16,
    pub cpu: u16,
    pub cpu_bar: u16,
    pub memory: u16,
    pub memory_bar: u16,
    pub ready: u16,
    pub node: u16,
    pub trend: u16,
}

/// Column widths of the Nodes table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeColumns {
    pub node: u16,
    pub cpu_pct: u16,
    pub cpu_bar: u16,
    pub memory_pct: u16,
    pub memory_bar: u16,
    pub pods: u16,
    pub version: u16,
    pub trend: u16,
}

/// Column widths for whichever view is active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnWidths {
    Pods(PodColumns),
    Nodes(NodeColumns),
}

impl ColumnWidths {
    /// Widths in display order
    #[must_use]
    pub fn as_array(&self) -> [u16; 8] {
        match *self {
            Self::Pods(c) => [
                c.pod,
                c.cpu,
                c.cpu_bar,
                c.memory,
                c.memory_bar,
                c.ready,
                c.node,
                c.trend,
            ],
            Self::Nodes(c) => [
                c.node,
                c.cpu_pct,
                c.cpu_bar,
                c.memory_pct,
                c.memory_bar,
                c.pods,
                c.version,
                c.trend,
            ],
        }
    }

    /// Widths of the two usage-bar columns
    #[must_use]
    pub fn bar_widths(&self) -> (u16, u16) {
        match *self {
            Self::Pods(c) => (c.cpu_bar, c.memory_bar),
            Self::Nodes(c) => (c.cpu_bar, c.memory_bar),
        }
    }

    /// Width of the trend column
    #[must_use]
    pub fn trend_width(&self) -> u16 {
        match *self {
            Self::Pods(c) => c.trend,
            Self::Nodes(c) => c.trend,
        }
    }
}

/// Computed geometry for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardLayout {
    pub table_height: u16,
    /// Zero when the info pane is closed
    pub info_height: u16,
    /// Zero when the logs pane is closed
    pub logs_height: u16,
    /// Width available to the table and panes
    pub content_width: u16,
    pub columns: ColumnWidths,
}

impl DashboardLayout {
    /// Lines of log text visible inside the bordered logs pane
    #[must_use]
    pub fn logs_viewport(&self) -> usize {
        usize::from(self.logs_height.saturating_sub(2))
    }
}

/// Compute pane heights and column widths
#[must_use]
pub fn compute(
    width: u16,
    height: u16,
    info_open: bool,
    logs_open: bool,
    view: ViewMode,
) -> DashboardLayout {
    let body = height
        .saturating_sub(HEADER_HEIGHT + FOOTER_HEIGHT + VERTICAL_PADDING)
        .max(MIN_BODY_HEIGHT);

    let (table, info, logs) = match (info_open, logs_open) {
        (true, true) => {
            let table = percent_of(body, BOTH_PANES_TABLE_PCT);
            let logs = percent_of(body, BOTH_PANES_LOGS_PCT);
            (table, body.saturating_sub(table + logs), logs)
        }
        (false, true) => {
            let table = percent_of(body, LOGS_ONLY_TABLE_PCT);
            (table, 0, body.saturating_sub(table))
        }
        (true, false) => {
            let table = percent_of(body, INFO_ONLY_TABLE_PCT);
            (table, body.saturating_sub(table), 0)
        }
        (false, false) => (body, 0, 0),
    };

    let open_pane = |open: bool, h: u16| if open { h.max(MIN_PANE_HEIGHT) } else { 0 };
    let content_width = width.saturating_sub(HORIZONTAL_PADDING);

    DashboardLayout {
        table_height: table.max(MIN_TABLE_HEIGHT),
        info_height: open_pane(info_open, info),
        logs_height: open_pane(logs_open, logs),
        content_width,
        columns: column_widths(view, content_width),
    }
}

/// Column widths for `view` within `total` cells
#[must_use]
pub fn column_widths(view: ViewMode, total: u16) -> ColumnWidths {
    match view {
        ViewMode::Pods => ColumnWidths::Pods(pod_columns(total)),
        ViewMode::Nodes => ColumnWidths::Nodes(node_columns(total)),
    }
}

#[inline]
fn percent_of(value: u16, pct: u16) -> u16 {
    (u32::from(value) * u32::from(pct) / 100) as u16
}

#[inline]
fn clamp_width(value: i32, min: i32, max: i32) -> u16 {
    value.clamp(min, max) as u16
}

/// Fixed minimums per column; leftover width goes to the bars, the rest to the pod name
fn pod_columns(total: u16) -> PodColumns {
    const MIN_POD: i32 = 24;
    const MIN_CPU: i32 = 6;
    const MIN_MEM: i32 = 8;
    const MIN_READY: i32 = 6;
    const MIN_NODE: i32 = 12;
    const MIN_TREND: i32 = 8;
    const MIN_REMAIN: i32 = 10;

    let base = MIN_POD + MIN_CPU + MIN_MEM + MIN_READY + MIN_NODE + MIN_TREND;
    let remain = (i32::from(total) - base).max(MIN_REMAIN);

    let cpu_bar = remain / 3;
    let memory_bar = remain / 3;
    let extra = remain - (cpu_bar + memory_bar);

    PodColumns {
        pod: clamp_width(MIN_POD + extra, 16, 60),
        cpu: MIN_CPU as u16,
        cpu_bar: clamp_width(cpu_bar, 6, 40),
        memory: MIN_MEM as u16,
        memory_bar: clamp_width(memory_bar, 6, 40),
        ready: MIN_READY as u16,
        node: clamp_width(MIN_NODE, 10, 30),
        trend: MIN_TREND as u16,
    }
}

/// Fixed minimums per column; leftover width is split between the two bars
fn node_columns(total: u16) -> NodeColumns {
    const MIN_NODE: i32 = 16;
    const MIN_PCT: i32 = 6;
    const MIN_PODS: i32 = 5;
    const MIN_VERSION: i32 = 6;
    const MIN_TREND: i32 = 8;
    const MIN_REMAIN: i32 = 8;

    let base = MIN_NODE + MIN_PCT + MIN_PCT + MIN_PODS + MIN_VERSION + MIN_TREND;
    let remain = (i32::from(total) - base).max(MIN_REMAIN);

    let cpu_bar = remain / 2;
    let memory_bar = remain - cpu_bar;

    NodeColumns {
        node: clamp_width(MIN_NODE, 12, 40),
        cpu_pct: MIN_PCT as u16,
        cpu_bar: clamp_width(cpu_bar, 6, 40),
        memory_pct: MIN_PCT as u16,
        memory_bar: clamp_width(memory_bar, 6, 40),
        pods: MIN_PODS as u16,
        version: MIN_VERSION as u16,
        trend: MIN_TREND as u16,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_panes_table_fills_body() {
        let layout = compute(120, 40, false, false, ViewMode::Pods);
        assert_eq!(layout.table_height, 40 - 5);
        assert_eq!(layout.info_height, 0);
        assert_eq!(layout.logs_height, 0);
        assert_eq!(layout.content_width, 116);
    }

    #[test]
    fn test_both_panes_split() {
        let layout = compute(120, 45, true, true, ViewMode::Pods);
        // body = 40
        assert_eq!(layout.table_height, 20);
        assert_eq!(layout.logs_height, 12);
        assert_eq!(layout.info_height, 8);
    }

    #[test]
    fn test_logs_only_split() {
        let layout = compute(120, 45, false, true, ViewMode::Nodes);
        assert_eq!(layout.table_height, 22);
        assert_eq!(layout.logs_height, 18);
        assert_eq!(layout.logs_viewport(), 16);
    }

    #[test]
    fn test_info_only_split() {
        let layout = compute(120, 45, true, false, ViewMode::Pods);
        assert_eq!(layout.table_height, 26);
        assert_eq!(layout.info_height, 14);
        assert_eq!(layout.logs_height, 0);
    }

    #[test]
    fn test_table_floor_on_narrow_short_terminal() {
        let layout = compute(40, 12, true, true, ViewMode::Pods);
        assert!(layout.table_height >= MIN_TABLE_HEIGHT);
        assert!(layout.logs_height >= MIN_PANE_HEIGHT);
    }

    #[test]
    fn test_zero_sized_terminal_does_not_underflow() {
        let layout = compute(0, 0, true, true, ViewMode::Nodes);
        assert_eq!(layout.content_width, 0);
        assert!(layout.table_height >= MIN_TABLE_HEIGHT);
    }

    #[test]
    fn test_pod_columns_wide_terminal() {
        let ColumnWidths::Pods(c) = column_widths(ViewMode::Pods, 116) else {
            panic!("expected pod columns");
        };
        // base 64, remain 52 -> bars 17, extra 18
        assert_eq!(c.cpu_bar, 17);
        assert_eq!(c.memory_bar, 17);
        assert_eq!(c.pod, 42);
        assert_eq!(c.node, 12);
    }

    #[test]
    fn test_pod_columns_narrow_terminal_clamps_bars() {
        let ColumnWidths::Pods(c) = column_widths(ViewMode::Pods, 20) else {
            panic!("expected pod columns");
        };
        assert_eq!(c.cpu_bar, 6);
        assert_eq!(c.memory_bar, 6);
        assert_eq!(c.pod, 28);
    }

    #[test]
    fn test_bars_never_exceed_clamp() {
        let columns = column_widths(ViewMode::Nodes, u16::MAX);
        let (cpu, mem) = columns.bar_widths();
        assert_eq!((cpu, mem), (40, 40));
        assert_eq!(columns.trend_width(), 8);
    }

    #[test]
    fn test_node_columns_split_leftover() {
        let ColumnWidths::Nodes(c) = column_widths(ViewMode::Nodes, 60) else {
            panic!("expected node columns");
        };
        // base 47, remain 13 -> 6 + 7
        assert_eq!(c.cpu_bar, 6);
        assert_eq!(c.memory_bar, 7);
        assert_eq!(column_widths(ViewMode::Nodes, 60).as_array().len(), 8);
    }

    #[test]
    fn test_compute_is_idempotent() {
        let a = compute(97, 33, true, false, ViewMode::Pods);
        let b = compute(97, 33, true, false, ViewMode::Pods);
        assert_eq!(a, b);
    }
}
