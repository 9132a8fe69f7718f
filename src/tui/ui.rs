//! TUI rendering

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Flex, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, BorderType, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table,
        TableState,
    },
};

use super::constants::{frame, styles, text};
use crate::dashboard::{Dashboard, SubscriptionStatus};
use crate::domain::{NodeSnapshot, PodSnapshot, ViewMode};
use crate::formatting::{
    format_bytes, format_mebibytes, format_millicores, format_percent, ratio_of,
};
use crate::render::{bar, sparkline};

/// Render one frame of the dashboard
pub fn render_ui(f: &mut Frame, dashboard: &Dashboard) {
    let layout = dashboard.layout();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(frame::MARGIN)
        .constraints(frame::main_sections(layout))
        .split(f.area());

    render_header(f, chunks[0], dashboard);
    render_table(f, chunks[1], dashboard);
    if dashboard.panes().info {
        render_info(f, chunks[2], dashboard);
    }
    if dashboard.panes().logs {
        render_logs(f, chunks[3], dashboard);
    }
    render_footer(f, chunks[5]);

    if dashboard.panes().namespace_picker {
        render_namespace_picker(f, dashboard);
    }
}

fn label(s: impl Into<String>) -> Span<'static> {
    Span::styled(s.into(), Style::default().fg(styles::LABEL))
}

fn value(s: impl Into<String>) -> Span<'static> {
    Span::styled(
        s.into(),
        Style::default()
            .fg(styles::ACCENT)
            .add_modifier(Modifier::BOLD),
    )
}

/// Status line plus key hints
fn render_header(f: &mut Frame, area: Rect, dashboard: &Dashboard) {
    let mut status = vec![
        Span::styled(
            format!("{} v{}", text::APP_NAME, env!("CARGO_PKG_VERSION")),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        label(text::SEPARATOR),
        label("ns: "),
        value(dashboard.namespace().label()),
        label("  view: "),
        value(dashboard.view().label()),
        label("  sort: "),
        value(dashboard.sort_key().label()),
    ];
    if !dashboard.selector().is_empty() {
        status.push(label("  selector: "));
        status.push(value(dashboard.selector()));
    }
    if let Some(error) = dashboard.last_error() {
        status.push(label("  "));
        status.push(Span::styled(
            format!("{}{}", text::ERROR_MARKER, error),
            Style::default().fg(styles::DANGER),
        ));
    }

    let header = Paragraph::new(vec![
        Line::from(status),
        Line::from(Span::styled(
            text::KEY_HINTS,
            Style::default().fg(styles::HEADER),
        )),
    ]);
    f.render_widget(header, area);
}

fn render_table(f: &mut Frame, area: Rect, dashboard: &Dashboard) {
    let columns = dashboard.layout().columns;
    let (cpu_bar, memory_bar) = columns.bar_widths();
    // One cell of each bar column is left as a gap before the next value
    let glyphs = GlyphWidths {
        cpu_bar: usize::from(cpu_bar.saturating_sub(1)),
        memory_bar: usize::from(memory_bar.saturating_sub(1)),
        trend: usize::from(columns.trend_width()),
    };
    let (headers, rows) = match dashboard.view() {
        ViewMode::Pods => (text::POD_HEADERS, pod_rows(dashboard.pods(), glyphs)),
        ViewMode::Nodes => (text::NODE_HEADERS, node_rows(dashboard.nodes(), glyphs)),
    };

    let widths = columns.as_array().map(Constraint::Length);
    let header = Row::new(headers).style(
        Style::default()
            .fg(styles::HEADER)
            .add_modifier(Modifier::BOLD),
    );
    let row_count = rows.len();
    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(styles::BORDER_NORMAL))
                .title(format!(" {} ({}) ", dashboard.view(), row_count)),
        )
        .row_highlight_style(
            Style::default()
                .bg(styles::SELECTED_BG)
                .add_modifier(Modifier::BOLD),
        );

    let mut state = TableState::default();
    if row_count > 0 {
        state.select(Some(dashboard.selection()));
    }
    f.render_stateful_widget(table, area, &mut state);
}

/// Largest cpu and memory in the list, floored at one
fn list_max(pods: &[PodSnapshot]) -> (u64, u64) {
    pods.iter().fold((1, 1), |(cpu, memory), pod| {
        (cpu.max(pod.cpu_millicores), memory.max(pod.memory_bytes))
    })
}

/// Usage ratio against the request when declared, else against the list maximum
fn bar_ratio(used: u64, request: u64, max: u64) -> f64 {
    if request > 0 {
        ratio_of(used, request)
    } else {
        ratio_of(used, max)
    }
}

/// Glyph counts for the bar and trend cells of one table
#[derive(Clone, Copy)]
struct GlyphWidths {
    cpu_bar: usize,
    memory_bar: usize,
    trend: usize,
}

fn pod_rows(pods: &[PodSnapshot], widths: GlyphWidths) -> Vec<Row<'static>> {
    let (max_cpu, max_memory) = list_max(pods);

    pods.iter()
        .map(|pod| {
            let cpu = bar_ratio(pod.cpu_millicores, pod.cpu_request_millicores, max_cpu);
            let memory = bar_ratio(pod.memory_bytes, pod.memory_request_bytes, max_memory);
            Row::new(vec![
                Cell::from(format!("{} ({})", pod.name, pod.container)),
                Cell::from(format_millicores(pod.cpu_millicores)),
                Cell::from(bar(cpu, widths.cpu_bar)).style(usage_style(cpu)),
                Cell::from(format_mebibytes(pod.memory_bytes)),
                Cell::from(bar(memory, widths.memory_bar)).style(usage_style(memory)),
                Cell::from(pod.ready.clone()),
                Cell::from(pod.node.clone()),
                Cell::from(sparkline(pod.cpu_trend.samples(), widths.trend)),
            ])
        })
        .collect()
}

fn node_rows(nodes: &[NodeSnapshot], widths: GlyphWidths) -> Vec<Row<'static>> {
    nodes
        .iter()
        .map(|node| {
            let mut trend = sparkline(node.cpu_trend.samples(), widths.trend);
            if trend.is_empty() {
                trend = text::EMPTY_TREND.to_string();
            }
            Row::new(vec![
                Cell::from(node.name.clone()),
                Cell::from(format_percent(node.cpu_ratio)),
                Cell::from(bar(node.cpu_ratio, widths.cpu_bar))
                    .style(usage_style(node.cpu_ratio)),
                Cell::from(format_percent(node.memory_ratio)),
                Cell::from(bar(node.memory_ratio, widths.memory_bar))
                    .style(usage_style(node.memory_ratio)),
                Cell::from(node.pods.to_string()),
                Cell::from(node.kubelet_version.clone()),
                Cell::from(trend),
            ])
        })
        .collect()
}

fn usage_style(ratio: f64) -> Style {
    let color = if ratio >= 0.9 {
        styles::DANGER
    } else if ratio >= 0.7 {
        styles::WARN
    } else {
        styles::GOOD
    };
    Style::default().fg(color)
}

fn pane_block(title: String) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(styles::BORDER_NORMAL))
        .title(title)
}

fn render_info(f: &mut Frame, area: Rect, dashboard: &Dashboard) {
    let lines = match dashboard.view() {
        ViewMode::Pods => match dashboard.selected_pod() {
            Some(pod) => pod_info(pod, dashboard.pods()),
            None => vec![Line::from(label(text::NO_PODS))],
        },
        ViewMode::Nodes => match dashboard.selected_node() {
            Some(node) => node_info(node),
            None => vec![Line::from(label(text::NO_NODES))],
        },
    };
    f.render_widget(
        Paragraph::new(lines).block(pane_block(" Info ".to_string())),
        area,
    );
}

/// Name, placement, requests, utilisation bars and trends of one pod
pub(crate) fn pod_info(pod: &PodSnapshot, pods: &[PodSnapshot]) -> Vec<Line<'static>> {
    let (max_cpu, max_memory) = list_max(pods);
    let cpu_vs_request = ratio_of(pod.cpu_millicores, pod.cpu_request_millicores);
    let memory_vs_request = ratio_of(pod.memory_bytes, pod.memory_request_bytes);
    let cpu_vs_max = ratio_of(pod.cpu_millicores, max_cpu);
    let memory_vs_max = ratio_of(pod.memory_bytes, max_memory);
    let width = frame::INFO_BAR_WIDTH;
    let trend_width = frame::POD_INFO_TREND_WIDTH;

    vec![
        Line::from(vec![
            label("Pod: "),
            value(pod.name.clone()),
            label("  ns: "),
            value(pod.namespace.clone()),
            label("  node: "),
            value(pod.node.clone()),
            label("  phase: "),
            value(pod.phase.clone()),
        ]),
        Line::from(vec![
            label("Requests: "),
            Span::raw(format!(
                "cpu={}m mem={}",
                pod.cpu_request_millicores,
                format_bytes(pod.memory_request_bytes)
            )),
            label("  Ready: "),
            Span::raw(pod.ready.clone()),
        ]),
        Line::default(),
        Line::from(vec![
            label("Util vs Req: "),
            Span::raw(format!(
                "CPU {:.0}% {}  MEM {:.0}% {}",
                cpu_vs_request * 100.0,
                bar(cpu_vs_request / 2.5, width),
                memory_vs_request * 100.0,
                bar(memory_vs_request / 3.0, width),
            )),
        ]),
        Line::from(vec![
            label("Util vs Max: "),
            Span::raw(format!(
                "CPU {:.0}% {}  MEM {:.0}% {}",
                cpu_vs_max * 100.0,
                bar(cpu_vs_max, width),
                memory_vs_max * 100.0,
                bar(memory_vs_max, width),
            )),
        ]),
        Line::default(),
        Line::from(vec![
            label("Trend CPU: "),
            Span::raw(sparkline(pod.cpu_trend.samples(), trend_width)),
        ]),
        Line::from(vec![
            label("Trend MEM: "),
            Span::raw(sparkline(pod.memory_trend.samples(), trend_width)),
        ]),
    ]
}

pub(crate) fn node_info(node: &NodeSnapshot) -> Vec<Line<'static>> {
    let width = frame::NODE_INFO_TREND_WIDTH;
    vec![
        Line::from(vec![
            label("Node: "),
            value(node.name.clone()),
            label("  k8s: "),
            value(node.kubelet_version.clone()),
            label("  pods: "),
            value(node.pods.to_string()),
        ]),
        Line::from(vec![
            label("CPU: "),
            Span::raw(sparkline(node.cpu_trend.samples(), width)),
        ]),
        Line::from(vec![
            label("MEM: "),
            Span::raw(sparkline(node.memory_trend.samples(), width)),
        ]),
    ]
}

fn render_logs(f: &mut Frame, area: Rect, dashboard: &Dashboard) {
    let pane = dashboard.log_pane();
    let title = match dashboard.subscription() {
        Some(subscription) => {
            let state = match subscription.status() {
                SubscriptionStatus::Opening => "opening",
                SubscriptionStatus::Streaming if pane.is_following() => "following",
                SubscriptionStatus::Streaming => "paused",
                SubscriptionStatus::Ended => "ended",
            };
            format!(" Logs: {} [{}] ", subscription.target(), state)
        }
        None => " Logs ".to_string(),
    };

    let lines: Vec<Line> = pane
        .visible()
        .map(|line| Line::from(Span::styled(line.to_string(), log_style(line))))
        .collect();
    f.render_widget(Paragraph::new(lines).block(pane_block(title)), area);
}

fn log_style(line: &str) -> Style {
    if line.contains(" ERROR ") {
        Style::default().fg(styles::DANGER)
    } else if line.contains(" WARN ") {
        Style::default().fg(styles::WARN)
    } else {
        Style::default()
    }
}

fn render_footer(f: &mut Frame, area: Rect) {
    let footer = Paragraph::new(Line::from(Span::styled(
        text::FOOTER_HELP,
        Style::default().fg(styles::FOOTER),
    )));
    f.render_widget(footer, area);
}

/// Rectangle of at most `width` x `height` centered in `area`
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let [vertical] = Layout::vertical([Constraint::Length(height.min(area.height))])
        .flex(Flex::Center)
        .areas(area);
    let [centered] = Layout::horizontal([Constraint::Length(width.min(area.width))])
        .flex(Flex::Center)
        .areas(vertical);
    centered
}

fn render_namespace_picker(f: &mut Frame, dashboard: &Dashboard) {
    let area = centered(f.area(), frame::PICKER_WIDTH, frame::PICKER_HEIGHT);
    let current = dashboard.namespace().label();

    let items: Vec<ListItem> = dashboard
        .namespace_candidates()
        .iter()
        .map(|candidate| {
            let style = if candidate == current {
                Style::default().fg(styles::ACCENT)
            } else {
                Style::default()
            };
            ListItem::new(Span::styled(candidate.clone(), style))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(styles::BORDER_ACTIVE))
                .title(text::PICKER_TITLE),
        )
        .highlight_style(
            Style::default()
                .bg(styles::SELECTED_BG)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(Some(dashboard.picker_cursor()));
    f.render_widget(Clear, area);
    f.render_stateful_widget(list, area, &mut state);
}
