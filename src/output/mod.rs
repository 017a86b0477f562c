pub mod report;

use colored::Colorize;
use serde::Serialize;

use crate::model::{Record, RowStyle, COLUMN_COUNT, COLUMN_HEADERS};
use crate::pagination::{LinkKind, PageLink};
use crate::view::{PageView, Summary, TableBody, ViewState};

pub const EMPTY_MESSAGE: &str = "No records found";
pub const ERROR_MESSAGE: &str = "Failed to load data, will retry on the next refresh";
pub const PENDING_MESSAGE: &str = "Loading...";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Html,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".html") || lower.ends_with(".htm") {
        return Some(OutputFormat::Html);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

pub fn render(view: &PageView, format: OutputFormat, color: bool) -> Vec<u8> {
    match format {
        OutputFormat::Text => render_text(view, color).into_bytes(),
        OutputFormat::Json => render_json(view),
        OutputFormat::Html => render_html(view),
    }
}

#[derive(Serialize)]
struct Snapshot<'a> {
    state: &'a ViewState,
    page: usize,
    total_pages: usize,
    summary: &'a Summary,
    body: &'a TableBody,
    pagination: &'a [PageLink],
}

pub fn render_json(view: &PageView) -> Vec<u8> {
    let snapshot = Snapshot {
        state: view.state(),
        page: view.shown_page(),
        total_pages: view.total_pages(),
        summary: view.summary(),
        body: view.body(),
        pagination: view.links(),
    };
    serde_json::to_vec_pretty(&snapshot).unwrap_or_else(|_| b"{}\n".to_vec())
}

pub fn render_html(view: &PageView) -> Vec<u8> {
    report::render_html(view)
}

pub(crate) fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Bootstrap-style `<li>` items for one pagination bar.
pub fn render_pagination_html(links: &[PageLink]) -> String {
    let mut out = String::new();
    for link in links {
        if link.kind == LinkKind::Ellipsis {
            out.push_str(&format!(
                "<li class=\"page-item disabled\"><span class=\"page-link\">{}</span></li>\n",
                escape_html(&link.label)
            ));
            continue;
        }
        let mut classes = String::from("page-item");
        if link.disabled {
            classes.push_str(" disabled");
        }
        if link.active {
            classes.push_str(" active");
        }
        let data_page = link
            .page_index
            .map(|i| format!(" data-page=\"{i}\""))
            .unwrap_or_default();
        out.push_str(&format!(
            "<li class=\"{classes}\"><a class=\"page-link\" href=\"#\"{data_page}>{}</a></li>\n",
            escape_html(&link.label)
        ));
    }
    out
}

/// One-line bar: active page in brackets, unusable arrows in parentheses.
pub fn render_pagination_text(links: &[PageLink], color: bool) -> String {
    links
        .iter()
        .map(|link| match link.kind {
            LinkKind::Previous | LinkKind::Next if link.disabled => {
                let s = format!("({})", link.label);
                if color {
                    s.dimmed().to_string()
                } else {
                    s
                }
            }
            LinkKind::Page if link.active => {
                let s = format!("[{}]", link.label);
                if color {
                    s.bold().cyan().to_string()
                } else {
                    s
                }
            }
            _ => link.label.clone(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn body_rows_html(body: &TableBody) -> String {
    match body {
        TableBody::Rows(records) => records.iter().map(row_html).collect(),
        TableBody::Empty => message_row_html(EMPTY_MESSAGE, "text-center"),
        TableBody::Pending => message_row_html(PENDING_MESSAGE, "text-center"),
        TableBody::Error(message) => message_row_html(
            &format!("{ERROR_MESSAGE} ({message})"),
            "text-center text-danger",
        ),
    }
}

fn row_html(record: &Record) -> String {
    let class = record.row_style().css_class();
    let mut out = format!("<tr class=\"{class}\">");
    for cell in record.cells() {
        out.push_str("<td>");
        out.push_str(&escape_html(&cell));
        out.push_str("</td>");
    }
    out.push_str("</tr>\n");
    out
}

fn message_row_html(message: &str, class: &str) -> String {
    format!(
        "<tr><td colspan=\"{COLUMN_COUNT}\" class=\"{class}\">{}</td></tr>\n",
        escape_html(message)
    )
}

fn format_kv_line(out: &mut String, label: &str, value: &str) {
    out.push_str(&format!(":: {:<10}: {}\n", label, value));
}

fn format_rate(rate: Option<f64>) -> String {
    rate.map(|r| format!(" ({r}%)")).unwrap_or_default()
}

pub(crate) fn stats_line(summary: &Summary) -> Option<String> {
    let stats = &summary.stats;
    if stats.is_empty() {
        return None;
    }
    let mut parts: Vec<String> = Vec::new();
    if let Some(n) = stats.killed_count {
        parts.push(format!("killed={n}{}", format_rate(stats.killed_rate)));
    }
    if let Some(n) = stats.hit_count {
        parts.push(format!("hit={n}{}", format_rate(stats.hit_rate)));
    }
    if let Some(n) = stats.total_count {
        parts.push(format!("total={n}"));
    }
    if let Some(n) = stats.suggested_bet_count {
        parts.push(format!("suggested={n}"));
    }
    if let Some(r) = stats.suggested_hit_rate {
        parts.push(format!("suggested_hit={r}%"));
    }
    Some(parts.join(" "))
}

pub(crate) fn last_updated_label(summary: &Summary) -> String {
    summary
        .last_updated
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--".to_string())
}

fn pad(cell: &str, width: usize) -> String {
    let len = cell.chars().count();
    let mut out = cell.to_string();
    out.extend(std::iter::repeat(' ').take(width.saturating_sub(len)));
    out
}

fn styled_row(line: String, style: RowStyle, color: bool) -> String {
    if !color {
        return line;
    }
    match style {
        RowStyle::Danger => line.red().to_string(),
        RowStyle::Success => line.green().to_string(),
        RowStyle::Plain => line,
    }
}

/// Terminal frame: summary lines, pagination, table, pagination again.
pub fn render_text(view: &PageView, color: bool) -> String {
    let state = view.state();
    let summary = view.summary();
    let mut out = String::new();

    let page_label = if view.total_pages() == 0 {
        "no pages".to_string()
    } else {
        format!("page {} of {}", view.shown_page() + 1, view.total_pages())
    };
    format_kv_line(
        &mut out,
        "Records",
        &format!(
            "total={} showing={} ({page_label})",
            summary.total_records, summary.display_count
        ),
    );
    format_kv_line(
        &mut out,
        "View",
        &format!(
            "filter={} page_size={}",
            state.filter.label(),
            state.page_size
        ),
    );
    if let Some(line) = stats_line(summary) {
        format_kv_line(&mut out, "Stats", &line);
    }
    let refresh = if state.auto_refresh {
        let s = "enabled";
        if color {
            s.green().to_string()
        } else {
            s.to_string()
        }
    } else {
        let s = "disabled";
        if color {
            s.red().to_string()
        } else {
            s.to_string()
        }
    };
    format_kv_line(
        &mut out,
        "Refresh",
        &format!("{refresh} updated={}", last_updated_label(summary)),
    );

    let bar = render_pagination_text(view.links(), color);
    out.push('\n');
    out.push_str(&bar);
    out.push_str("\n\n");

    match view.body() {
        TableBody::Rows(records) => {
            let cells: Vec<[String; COLUMN_COUNT]> = records.iter().map(Record::cells).collect();
            let mut widths = COLUMN_HEADERS.map(|h| h.chars().count());
            for row in cells.iter() {
                for (i, cell) in row.iter().enumerate() {
                    widths[i] = widths[i].max(cell.chars().count());
                }
            }
            let header = COLUMN_HEADERS
                .iter()
                .enumerate()
                .map(|(i, h)| pad(h, widths[i]))
                .collect::<Vec<_>>()
                .join(" | ")
                .trim_end()
                .to_string();
            out.push_str(&if color { header.bold().to_string() } else { header });
            out.push('\n');
            for (record, row) in records.iter().zip(cells.iter()) {
                let line = row
                    .iter()
                    .enumerate()
                    .map(|(i, c)| pad(c, widths[i]))
                    .collect::<Vec<_>>()
                    .join(" | ")
                    .trim_end()
                    .to_string();
                out.push_str(&styled_row(line, record.row_style(), color));
                out.push('\n');
            }
        }
        TableBody::Empty => {
            out.push_str(EMPTY_MESSAGE);
            out.push('\n');
        }
        TableBody::Pending => {
            out.push_str(PENDING_MESSAGE);
            out.push('\n');
        }
        TableBody::Error(message) => {
            let line = format!("{ERROR_MESSAGE} ({message})");
            out.push_str(&if color { line.red().bold().to_string() } else { line });
            out.push('\n');
        }
    }

    out.push('\n');
    out.push_str(&bar);
    out.push('\n');
    out
}
