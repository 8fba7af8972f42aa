use colored::Colorize;

use crate::utils::fit;
use crate::view::{DisplayMode, SortIndicator, TableView};

const MAX_COLUMN_WIDTH: usize = 36;
const COLUMN_GAP: &str = "  ";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" | "table" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

pub fn render(
    view: &TableView,
    format: OutputFormat,
    color: bool,
) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Text => Ok(render_text(view, color)),
        OutputFormat::Json => render_json(view),
    }
}

fn header_label(label: &str, indicator: SortIndicator) -> String {
    match indicator {
        SortIndicator::None => label.to_string(),
        SortIndicator::Ascending => format!("{label} ^"),
        SortIndicator::Descending => format!("{label} v"),
    }
}

/// Fixed-width table followed by a status line and the pagination footer.
/// Rows only appear when the view is in success mode.
pub fn render_text(view: &TableView, color: bool) -> String {
    let labels: Vec<String> = view
        .headers
        .iter()
        .map(|h| header_label(h.label, h.indicator))
        .collect();

    let widths: Vec<usize> = labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let cells = view
                .rows
                .iter()
                .filter_map(|r| r.cells.get(i))
                .map(|c| c.chars().count())
                .max()
                .unwrap_or(0);
            cells.max(label.chars().count()).min(MAX_COLUMN_WIDTH)
        })
        .collect();

    let mut out = String::new();
    let header_line = labels
        .iter()
        .zip(&widths)
        .map(|(label, width)| fit(label, *width))
        .collect::<Vec<_>>()
        .join(COLUMN_GAP);
    let header_line = header_line.trim_end();
    if color {
        out.push_str(&header_line.bold().to_string());
    } else {
        out.push_str(header_line);
    }
    out.push('\n');
    let rule_width: usize = widths.iter().sum::<usize>() + COLUMN_GAP.len() * widths.len().saturating_sub(1);
    out.push_str(&"-".repeat(rule_width));
    out.push('\n');

    for row in &view.rows {
        let line = row
            .cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| fit(cell, *width))
            .collect::<Vec<_>>()
            .join(COLUMN_GAP);
        out.push_str(line.trim_end());
        out.push('\n');
    }

    out.push_str(&status_line(view, color));
    out.push('\n');
    out.push_str(&footer_line(view));
    out.push('\n');
    out
}

fn status_line(view: &TableView, color: bool) -> String {
    let line = match &view.mode {
        DisplayMode::Idle => "Not loaded yet.".to_string(),
        DisplayMode::Loading => "Loading...".to_string(),
        DisplayMode::Error(message) => format!("Error: {message}"),
        DisplayMode::Success if view.rows.is_empty() => "No landlords match.".to_string(),
        DisplayMode::Success => String::new(),
    };
    if !color {
        return line;
    }
    match &view.mode {
        DisplayMode::Error(_) => line.red().to_string(),
        DisplayMode::Loading => line.yellow().to_string(),
        _ => line.dimmed().to_string(),
    }
}

fn footer_line(view: &TableView) -> String {
    let p = &view.pagination;
    let mut line = format!(
        "Page {} of {} | {} landlords | {} per page",
        p.page_index.saturating_add(1),
        p.page_count.max(1),
        p.total_count,
        p.page_size
    );
    if !view.filter_text.is_empty() {
        line.push_str(&format!(" | filter \"{}\"", view.filter_text));
    }
    let mut controls = Vec::new();
    if p.can_previous {
        controls.push("prev");
    }
    if p.can_next {
        controls.push("next");
    }
    if !controls.is_empty() {
        line.push_str(&format!(" | {}", controls.join(", ")));
    }
    line
}

pub fn render_json(view: &TableView) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(view)
}
