use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Local;
use tokio::sync::mpsc;

use crate::client::{ClientError, PageSource};
use crate::model::{FilterType, PageResponse, PageSize, Record};
use crate::output;
use crate::refresh::RefreshStatus;
use crate::runner::{Command, Flow, Session, ViewUpdate};
use crate::view::{PageQuery, PageView, TableBody, ViewState};

const FAST: Duration = Duration::from_millis(10);

#[derive(Clone)]
struct FakeSource {
    total_pages: usize,
    delays: Arc<Mutex<HashMap<usize, Duration>>>,
    fail: Arc<AtomicBool>,
    calls: Arc<Mutex<Vec<PageQuery>>>,
}

impl FakeSource {
    fn new(total_pages: usize) -> Self {
        Self {
            total_pages,
            delays: Arc::new(Mutex::new(HashMap::new())),
            fail: Arc::new(AtomicBool::new(false)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn delay_page(&self, page: usize, delay: Duration) {
        self.delays.lock().unwrap().insert(page, delay);
    }

    fn calls(&self) -> Vec<PageQuery> {
        self.calls.lock().unwrap().clone()
    }
}

impl PageSource for FakeSource {
    fn fetch_page(
        &self,
        query: PageQuery,
    ) -> impl Future<Output = Result<PageResponse, ClientError>> + Send {
        let this = self.clone();
        async move {
            this.calls.lock().unwrap().push(query.clone());
            let delay = this
                .delays
                .lock()
                .unwrap()
                .get(&query.page)
                .copied()
                .unwrap_or(FAST);
            tokio::time::sleep(delay).await;
            if this.fail.load(Ordering::SeqCst) {
                return Err(ClientError::Status {
                    url: "http://fake/sf444/data".to_string(),
                    status: 502,
                });
            }
            Ok(page_response(query.page, this.total_pages))
        }
    }
}

fn record(period: &str, final_result: &str) -> Record {
    Record {
        period: Some(period.to_string()),
        final_result: Some(final_result.to_string()),
        ..Record::default()
    }
}

fn page_response(page: usize, total_pages: usize) -> PageResponse {
    PageResponse {
        records: vec![
            record(&format!("p{page}-a"), "1"),
            record(&format!("p{page}-b"), "中"),
            record(&format!("p{page}-c"), "0"),
        ],
        total_records: (total_pages * 3) as u64,
        total_pages,
        current_page: Some(page),
        ..PageResponse::default()
    }
}

fn manual_state() -> ViewState {
    ViewState {
        auto_refresh: false,
        ..ViewState::default()
    }
}

async fn pump(session: &mut Session<FakeSource>) -> Option<ViewUpdate> {
    let event = session.next_event().await.unwrap();
    session.handle_event(event)
}

async fn started(source: &FakeSource, state: ViewState) -> Session<FakeSource> {
    let mut session = Session::new(source.clone(), state, Duration::from_secs(60));
    session.start();
    assert_eq!(pump(&mut session).await, Some(ViewUpdate::Loaded));
    session
}

#[tokio::test(start_paused = true)]
async fn initial_load_fills_table_and_pagination() {
    let source = FakeSource::new(12);
    let session = started(&source, manual_state()).await;

    let view = session.view();
    assert_eq!(view.total_pages(), 12);
    assert_eq!(view.shown_page(), 0);
    assert_eq!(view.summary().total_records, 36);
    assert_eq!(view.summary().display_count, 3);
    assert!(view.summary().last_updated.is_some());
    assert!(matches!(view.body(), TableBody::Rows(rows) if rows.len() == 3));
    let labels: Vec<_> = view.links().iter().map(|l| l.label.as_str()).collect();
    assert_eq!(
        labels,
        vec!["Previous", "1", "2", "3", "4", "5", "...", "12", "Next"]
    );
    assert_eq!(session.in_flight(), 0);
}

#[tokio::test(start_paused = true)]
async fn start_page_past_the_end_reloads_last_page() {
    let source = FakeSource::new(3);
    let state = ViewState {
        page_index: 9,
        ..manual_state()
    };
    let mut session = started(&source, state).await;

    assert_eq!(session.view().state().page_index, 2);
    assert_eq!(session.in_flight(), 1);
    assert_eq!(pump(&mut session).await, Some(ViewUpdate::Loaded));
    assert_eq!(session.in_flight(), 0);

    let pages: Vec<_> = source.calls().iter().map(|q| q.page).collect();
    assert_eq!(pages, vec![9, 2]);
    assert_eq!(session.view().shown_page(), 2);
    match session.view().body() {
        TableBody::Rows(rows) => assert_eq!(rows[0].period.as_deref(), Some("p2-a")),
        other => panic!("unexpected body {other:?}"),
    }
    assert_eq!(
        session.handle_command(Command::PreviousPage),
        (Flow::Continue, None)
    );
}

#[tokio::test(start_paused = true)]
async fn slow_older_response_is_discarded() {
    let source = FakeSource::new(5);
    let mut session = started(&source, manual_state()).await;

    source.delay_page(1, Duration::from_millis(500));
    assert_eq!(
        session.handle_command(Command::GoToPage(1)),
        (Flow::Continue, None)
    );
    assert_eq!(
        session.handle_command(Command::GoToPage(2)),
        (Flow::Continue, None)
    );
    assert_eq!(session.in_flight(), 2);

    assert_eq!(pump(&mut session).await, Some(ViewUpdate::Loaded));
    assert_eq!(session.view().shown_page(), 2);

    assert_eq!(pump(&mut session).await, None);
    assert_eq!(session.view().shown_page(), 2);
    assert_eq!(session.view().state().page_index, 2);
    match session.view().body() {
        TableBody::Rows(rows) => assert_eq!(rows[0].period.as_deref(), Some("p2-a")),
        other => panic!("unexpected body {other:?}"),
    }
    assert_eq!(session.in_flight(), 0);
}

#[tokio::test(start_paused = true)]
async fn page_size_and_filter_changes_return_to_first_page() {
    let source = FakeSource::new(5);
    let mut session = started(&source, manual_state()).await;

    session.handle_command(Command::GoToPage(3));
    pump(&mut session).await;
    assert_eq!(session.view().shown_page(), 3);

    session.handle_command(Command::SetPageSize(PageSize::Fixed(50)));
    assert_eq!(session.view().state().page_index, 0);
    pump(&mut session).await;
    assert_eq!(session.view().shown_page(), 0);

    session.handle_command(Command::GoToPage(4));
    pump(&mut session).await;
    session.handle_command(Command::SetFilter(FilterType::Hit));
    assert_eq!(session.view().state().page_index, 0);
    pump(&mut session).await;

    let last = source.calls().pop().unwrap();
    assert_eq!(
        last,
        PageQuery {
            page: 0,
            page_size: PageSize::Fixed(50),
            filter: FilterType::Hit,
        }
    );
}

#[tokio::test(start_paused = true)]
async fn navigation_outside_known_range_is_ignored() {
    let source = FakeSource::new(3);
    let mut session = Session::new(source.clone(), manual_state(), Duration::from_secs(60));

    // nothing loaded yet, so no page is known
    assert_eq!(
        session.handle_command(Command::NextPage),
        (Flow::Continue, Some(ViewUpdate::Ignored))
    );

    session.start();
    pump(&mut session).await;
    let before = source.calls().len();

    assert_eq!(
        session.handle_command(Command::PreviousPage),
        (Flow::Continue, Some(ViewUpdate::Ignored))
    );
    assert_eq!(
        session.handle_command(Command::GoToPage(3)),
        (Flow::Continue, Some(ViewUpdate::Ignored))
    );
    assert_eq!(session.in_flight(), 0);
    assert_eq!(source.calls().len(), before);
    assert_eq!(session.view().state().page_index, 0);
}

#[tokio::test(start_paused = true)]
async fn toggling_refresh_keeps_a_single_timer() {
    let source = FakeSource::new(3);
    let mut session = started(&source, ViewState::default()).await;
    assert_eq!(session.refresh().active_timers(), 1);

    assert_eq!(
        session.handle_command(Command::ToggleRefresh),
        (
            Flow::Continue,
            Some(ViewUpdate::RefreshChanged(RefreshStatus::Disabled))
        )
    );
    assert_eq!(session.refresh().active_timers(), 0);
    assert!(!session.view().state().auto_refresh);

    assert_eq!(
        session.handle_command(Command::ToggleRefresh),
        (
            Flow::Continue,
            Some(ViewUpdate::RefreshChanged(RefreshStatus::Enabled))
        )
    );
    assert_eq!(session.refresh().active_timers(), 1);
    assert!(session.view().state().auto_refresh);
}

#[tokio::test(start_paused = true)]
async fn failed_load_keeps_pagination_and_summary() {
    let source = FakeSource::new(7);
    let mut session = started(&source, manual_state()).await;
    let links = session.view().links().to_vec();
    let summary = session.view().summary().clone();

    source.fail.store(true, Ordering::SeqCst);
    session.handle_command(Command::Reload);
    match pump(&mut session).await {
        Some(ViewUpdate::LoadFailed(message)) => assert!(message.contains("502")),
        other => panic!("unexpected update {other:?}"),
    }

    assert!(matches!(session.view().body(), TableBody::Error(_)));
    assert_eq!(session.view().links(), links.as_slice());
    assert_eq!(session.view().summary(), &summary);
    assert_eq!(session.view().total_pages(), 7);
}

#[tokio::test(start_paused = true)]
async fn timer_tick_reloads_current_page() {
    let source = FakeSource::new(5);
    let mut session = started(&source, ViewState::default()).await;

    session.handle_command(Command::GoToPage(2));
    assert_eq!(pump(&mut session).await, Some(ViewUpdate::Loaded));
    let before = source.calls().len();

    // next event is the tick one period after start
    assert_eq!(pump(&mut session).await, None);
    assert_eq!(session.in_flight(), 1);
    assert_eq!(pump(&mut session).await, Some(ViewUpdate::Loaded));

    let calls = source.calls();
    assert_eq!(calls.len(), before + 1);
    assert_eq!(calls[before].page, 2);
    assert_eq!(session.view().shown_page(), 2);
}

#[tokio::test(start_paused = true)]
async fn run_stops_once_input_closes_and_nothing_is_pending() {
    let source = FakeSource::new(4);
    let session = Session::new(source.clone(), manual_state(), Duration::from_secs(60));
    let (tx, rx) = mpsc::channel(8);
    tx.send(Command::Reload).await.unwrap();
    drop(tx);

    let mut updates = Vec::new();
    let view = session
        .run(rx, |_view, update| updates.push(update.clone()))
        .await;

    assert!(updates.contains(&ViewUpdate::Loaded));
    assert_eq!(view.total_pages(), 4);
    assert_eq!(source.calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn quit_command_ends_run() {
    let source = FakeSource::new(4);
    let session = Session::new(source, ViewState::default(), Duration::from_secs(60));
    let (tx, rx) = mpsc::channel(8);
    tx.send(Command::Quit).await.unwrap();

    let view = session.run(rx, |_, _| {}).await;
    assert_eq!(view.state().page_index, 0);
    drop(tx);
}

fn loaded_view(page: usize, total_pages: usize) -> PageView {
    let mut view = PageView::new(ViewState::default());
    for _ in 0..page {
        // walk forward once the page count is known
        if view.total_pages() == 0 {
            let ticket = view.reload();
            view.apply_success(&ticket, page_response(0, total_pages), Local::now());
        }
        let ticket = view.next_page().unwrap();
        view.apply_success(&ticket, page_response(ticket.query.page, total_pages), Local::now());
    }
    if view.total_pages() == 0 {
        let ticket = view.reload();
        view.apply_success(&ticket, page_response(0, total_pages), Local::now());
    }
    view
}

fn between<'a>(haystack: &'a str, start: &str, end: &str) -> &'a str {
    let from = haystack.find(start).unwrap() + start.len();
    let len = haystack[from..].find(end).unwrap();
    &haystack[from..from + len]
}

#[test]
fn html_report_repeats_identical_pagination_bars() {
    let view = loaded_view(5, 12);
    let html = String::from_utf8(output::render_html(&view)).unwrap();
    let top = between(&html, "<ul id=\"pagination\" class=\"pagination\">", "</ul>");
    let bottom = between(
        &html,
        "<ul id=\"pagination-bottom\" class=\"pagination\">",
        "</ul>",
    );
    assert!(!top.trim().is_empty());
    assert_eq!(top, bottom);
    assert!(top.contains("<li class=\"page-item active\"><a class=\"page-link\" href=\"#\" data-page=\"5\">6</a></li>"));
    assert_eq!(top.matches("page-item disabled").count(), 2);
}

#[test]
fn html_rows_are_styled_by_final_result() {
    let view = loaded_view(0, 2);
    let html = String::from_utf8(output::render_html(&view)).unwrap();
    assert!(html.contains("<tr class=\"table-danger\"><td>p0-a</td>"));
    assert!(html.contains("<tr class=\"table-success\"><td>p0-b</td>"));
    assert!(html.contains("<tr class=\"\"><td>p0-c</td>"));
    assert!(html.contains("<span id=\"totalRecords\" class=\"font-bold\">6</span>"));
}

#[test]
fn html_error_row_spans_every_column() {
    let mut view = loaded_view(0, 2);
    let ticket = view.reload();
    view.apply_failure(&ticket, "boom");
    let html = String::from_utf8(output::render_html(&view)).unwrap();
    assert!(html.contains("<td colspan=\"12\" class=\"text-center text-danger\">"));
    assert!(html.contains("(boom)"));
    assert!(html.contains("data-page=\"1\">2</a>"));
}

#[test]
fn plain_text_frame_marks_active_page_and_disabled_arrows() {
    let view = loaded_view(0, 3);
    let text = output::render_text(&view, false);
    assert!(text.contains("(Previous) [1] 2 3 Next"));
    assert!(text.contains(":: Records   : total=9 showing=3 (page 1 of 3)"));
    assert!(text.contains("p0-b"));
    assert_eq!(text.matches("(Previous) [1] 2 3 Next").count(), 2);
}

#[test]
fn json_snapshot_carries_pagination_data() {
    let view = loaded_view(1, 3);
    let value: serde_json::Value = serde_json::from_slice(&output::render_json(&view)).unwrap();
    assert_eq!(value["page"], 1);
    assert_eq!(value["total_pages"], 3);
    assert_eq!(value["body"]["kind"], "rows");
    let links = value["pagination"].as_array().unwrap();
    assert_eq!(links.first().unwrap()["page_index"], 0);
    assert_eq!(links.last().unwrap()["disabled"], false);
}
