//! TUI constants and configuration

// ============================================================================
// Layout Constants
// ============================================================================

/// Frame geometry not covered by the responsive layout
pub mod frame {
    use ratatui::layout::Constraint;

    use crate::layout::DashboardLayout;
    use crate::layout::constants::{FOOTER_HEIGHT, HEADER_HEIGHT};

    /// Outer margin on every side
    pub const MARGIN: u16 = 1;

    /// Namespace picker popup size
    pub const PICKER_WIDTH: u16 = 40;
    pub const PICKER_HEIGHT: u16 = 14;

    /// Sparkline widths in the info pane
    pub const POD_INFO_TREND_WIDTH: usize = 30;
    pub const NODE_INFO_TREND_WIDTH: usize = 40;
    pub const INFO_BAR_WIDTH: usize = 12;

    /// Header, table, info, logs, slack, footer
    pub fn main_sections(layout: &DashboardLayout) -> [Constraint; 6] {
        [
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Length(layout.table_height),
            Constraint::Length(layout.info_height),
            Constraint::Length(layout.logs_height),
            Constraint::Fill(1),
            Constraint::Length(FOOTER_HEIGHT),
        ]
    }
}

// ============================================================================
// Color Palette
// ============================================================================

/// UI colors
pub mod styles {
    use ratatui::style::Color;

    pub const ACCENT: Color = Color::Rgb(0x7D, 0xCE, 0x13);
    pub const HEADER: Color = Color::Rgb(0xAA, 0xAA, 0xAA);
    pub const FOOTER: Color = Color::Rgb(0x77, 0x77, 0x77);
    pub const DANGER: Color = Color::Rgb(0xFF, 0x5F, 0x87);
    pub const WARN: Color = Color::Rgb(0xFF, 0xAF, 0x00);
    pub const GOOD: Color = Color::Rgb(0x5F, 0xD7, 0xAF);
    pub const LABEL: Color = Color::Gray;
    pub const BORDER_ACTIVE: Color = ACCENT;
    pub const BORDER_NORMAL: Color = Color::White;
    pub const SELECTED_BG: Color = Color::Rgb(0x30, 0x30, 0x30);
}

// ============================================================================
// Text Constants
// ============================================================================

/// UI text constants
pub mod text {
    pub const APP_NAME: &str = "kmet";
    pub const KEY_HINTS: &str =
        "(Tab switch Pods/Nodes)  [i]info [l]logs [n]namespace [s]sort [r]refresh [q]quit";
    pub const FOOTER_HELP: &str = "↑/↓ move • [Tab] switch view • [n] namespace • [i] info • [l] logs • [s] sort • [q] quit";
    pub const PICKER_TITLE: &str = " Switch Namespace (↑/↓, Enter, Esc) ";
    pub const NO_PODS: &str = "No pods";
    pub const NO_NODES: &str = "No nodes";
    pub const EMPTY_TREND: &str = "—";
    pub const SEPARATOR: &str = " │ ";
    pub const ERROR_MARKER: &str = "⚠ ";

    pub const POD_HEADERS: [&str; 8] = ["POD", "CPU", "", "MEM", "", "READY", "NODE", "Trend"];
    pub const NODE_HEADERS: [&str; 8] = ["NODE", "CPU%", "", "MEM%", "", "PODS", "K8S", "Trend"];
}
