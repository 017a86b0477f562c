use super::{
    body_rows_html, escape_html, last_updated_label, render_pagination_html, stats_line,
};
use crate::model::COLUMN_HEADERS;
use crate::view::PageView;

fn header_cells() -> String {
    COLUMN_HEADERS
        .iter()
        .map(|h| {
            format!(
                "<th class=\"px-3 py-3 text-[11px] font-display text-slate-100 uppercase tracking-widest\">{}</th>",
                escape_html(h)
            )
        })
        .collect::<Vec<_>>()
        .join("\n                ")
}

/// Self-contained page with the table and the same pagination markup above
/// and below it.
pub fn render_html(view: &PageView) -> Vec<u8> {
    let state = view.state();
    let summary = view.summary();
    let pagination = render_pagination_html(view.links());
    let rows = body_rows_html(view.body());
    let headers = header_cells();

    let (badge_class, badge_label) = if state.auto_refresh {
        ("bg-emerald-100 text-emerald-700", "enabled")
    } else {
        ("bg-rose-100 text-rose-700", "disabled")
    };
    let stats = stats_line(summary)
        .map(|s| escape_html(&s))
        .unwrap_or_else(|| "--".to_string());
    let page_label = if view.total_pages() == 0 {
        "no pages".to_string()
    } else {
        format!("page {} of {}", view.shown_page() + 1, view.total_pages())
    };

    let html = format!(
        r####"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8"/>
  <meta content="width=device-width, initial-scale=1.0" name="viewport"/>
  <title>SF444 History</title>
  <script src="https://cdn.tailwindcss.com?plugins=forms,container-queries"></script>
  <link href="https://fonts.googleapis.com/css2?family=Montserrat:wght@700;800&amp;family=Inter:wght@400;500;600;700&amp;display=swap" rel="stylesheet"/>
  <style>
    body {{ font-family: 'Inter', sans-serif; }}
    h1, h2, .font-display {{ font-family: 'Montserrat', sans-serif; font-weight: 800; letter-spacing: -0.025em; }}
    .table-success {{ background-color: rgba(40, 167, 69, 0.15); }}
    .table-danger {{ background-color: rgba(220, 53, 69, 0.15); }}
    .text-danger {{ color: #dc3545; }}
    .text-center {{ text-align: center; }}
    td {{ padding: 0.2rem 0.5rem; white-space: nowrap; text-align: center; border: 1px solid #e2e8f0; font-size: 0.85rem; }}
    .pagination {{ display: flex; gap: 0.25rem; list-style: none; justify-content: center; }}
    .page-item .page-link {{ display: block; padding: 0.3rem 0.6rem; border: 1px solid #cbd5e1; border-radius: 0.375rem; font-size: 0.85rem; }}
    .page-item.active .page-link {{ background-color: #135bec; color: white; border-color: #135bec; }}
    .page-item.disabled .page-link {{ color: #94a3b8; pointer-events: none; }}
  </style>
</head>
<body class="bg-slate-50 text-slate-900 min-h-screen">
  <div class="flex h-full grow flex-col">
    <header class="flex items-center justify-between border-b border-slate-200 bg-white px-8 py-4">
      <h2 class="text-xl font-display uppercase tracking-tight">SF444 History</h2>
      <div class="text-sm text-slate-500">Last update: <span id="lastUpdateTime">{last_updated}</span></div>
    </header>

    <main class="flex-1 max-w-[1600px] mx-auto w-full px-8 py-8">
      <div class="grid grid-cols-1 md:grid-cols-2 gap-6 mb-8">
        <div class="bg-white rounded-2xl border border-slate-200 p-5 shadow-sm text-sm">
          <p>Total records: <span id="totalRecords" class="font-bold">{total_records}</span></p>
          <p>Showing: <span id="currentDisplayCount" class="font-bold">{display_count}</span> records ({page_label})</p>
          <p>Auto refresh: <span id="autoRefreshStatus" class="rounded-full px-2 py-0.5 text-xs font-bold {badge_class}">{badge_label}</span></p>
        </div>
        <div class="bg-white rounded-2xl border border-slate-200 p-5 shadow-sm text-sm">
          <p>Filter: <span class="font-bold">{filter}</span></p>
          <p>Page size: <span class="font-bold">{page_size}</span></p>
          <p>Statistics: <span id="globalStats">{stats}</span></p>
        </div>
      </div>

      <nav class="mb-4"><ul id="pagination" class="pagination">
{pagination}</ul></nav>

      <div class="bg-white border border-slate-200 rounded-2xl overflow-x-auto shadow-sm">
        <table id="historyTable" class="w-full border-collapse">
          <thead>
            <tr class="bg-slate-800">
                {headers}
            </tr>
          </thead>
          <tbody>
{rows}</tbody>
        </table>
      </div>

      <nav class="mt-4"><ul id="pagination-bottom" class="pagination">
{pagination}</ul></nav>
    </main>
  </div>
</body>
</html>
"####,
        last_updated = escape_html(&last_updated_label(summary)),
        total_records = summary.total_records,
        display_count = summary.display_count,
        filter = escape_html(state.filter.label()),
        page_size = escape_html(&state.page_size.to_string()),
    );
    html.into_bytes()
}
