use chrono::{DateTime, Local};
use serde::Serialize;

use crate::model::{FilterType, GlobalStats, PageResponse, PageSize, Record};
use crate::pagination::{self, PageLink};

/// Parameters of one `/sf444/data` request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PageQuery {
    pub page: usize,
    pub page_size: PageSize,
    pub filter: FilterType,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ViewState {
    pub page_index: usize,
    pub page_size: PageSize,
    pub filter: FilterType,
    pub auto_refresh: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            page_index: 0,
            page_size: PageSize::default(),
            filter: FilterType::default(),
            auto_refresh: true,
        }
    }
}

impl ViewState {
    pub fn query(&self) -> PageQuery {
        PageQuery {
            page: self.page_index,
            page_size: self.page_size,
            filter: self.filter,
        }
    }
}

/// Handle for one issued fetch. The view only accepts a completion whose
/// ticket is newer than the last one it applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadTicket {
    pub seq: u64,
    pub query: PageQuery,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum TableBody {
    /// Nothing loaded yet.
    Pending,
    Rows(Vec<Record>),
    Empty,
    Error(String),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Summary {
    pub total_records: u64,
    pub display_count: usize,
    pub stats: GlobalStats,
    pub last_updated: Option<DateTime<Local>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    Failed,
    /// An older request finished after a newer one was already applied.
    Stale,
}

#[derive(Clone, Debug)]
pub struct PageView {
    state: ViewState,
    total_pages: usize,
    next_seq: u64,
    applied_seq: Option<u64>,
    shown_page: usize,
    body: TableBody,
    links: Vec<PageLink>,
    summary: Summary,
}

impl PageView {
    pub fn new(state: ViewState) -> Self {
        Self {
            shown_page: state.page_index,
            state,
            total_pages: 0,
            next_seq: 0,
            applied_seq: None,
            body: TableBody::Pending,
            links: Vec::new(),
            summary: Summary::default(),
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Last-known page count from the most recent applied response.
    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    /// 0-based page the links and page label refer to.
    pub fn shown_page(&self) -> usize {
        self.shown_page
    }

    pub fn body(&self) -> &TableBody {
        &self.body
    }

    pub fn links(&self) -> &[PageLink] {
        &self.links
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    pub fn set_auto_refresh(&mut self, enabled: bool) {
        self.state.auto_refresh = enabled;
    }

    fn issue(&mut self) -> LoadTicket {
        self.next_seq += 1;
        LoadTicket {
            seq: self.next_seq,
            query: self.state.query(),
        }
    }

    /// Fetch for the current page without touching pagination state.
    pub fn reload(&mut self) -> LoadTicket {
        self.issue()
    }

    pub fn set_page_size(&mut self, page_size: PageSize) -> LoadTicket {
        self.state.page_size = page_size;
        self.state.page_index = 0;
        self.issue()
    }

    pub fn set_filter(&mut self, filter: FilterType) -> LoadTicket {
        self.state.filter = filter;
        self.state.page_index = 0;
        self.issue()
    }

    /// Moves to `index` if it is inside the last-known page range; otherwise
    /// nothing changes and no fetch is issued.
    pub fn go_to_page(&mut self, index: usize) -> Option<LoadTicket> {
        if index >= self.total_pages {
            tracing::debug!(
                event = "view.page_out_of_range",
                index,
                total_pages = self.total_pages
            );
            return None;
        }
        self.state.page_index = index;
        Some(self.issue())
    }

    pub fn next_page(&mut self) -> Option<LoadTicket> {
        let target = self.state.page_index.checked_add(1)?;
        self.go_to_page(target)
    }

    pub fn previous_page(&mut self) -> Option<LoadTicket> {
        let target = self.state.page_index.checked_sub(1)?;
        self.go_to_page(target)
    }

    fn accept(&mut self, ticket: &LoadTicket) -> bool {
        if self.applied_seq.is_some_and(|applied| ticket.seq <= applied) {
            tracing::debug!(
                event = "view.stale_response",
                seq = ticket.seq,
                applied = ?self.applied_seq
            );
            return false;
        }
        self.applied_seq = Some(ticket.seq);
        true
    }

    pub fn apply_success(
        &mut self,
        ticket: &LoadTicket,
        response: PageResponse,
        now: DateTime<Local>,
    ) -> LoadOutcome {
        if !self.accept(ticket) {
            return LoadOutcome::Stale;
        }
        self.total_pages = response.total_pages;
        // a start page past the end, or data that shrank since the request
        if self.state.page_index >= self.total_pages.max(1) {
            tracing::debug!(
                event = "view.page_clamped",
                index = self.state.page_index,
                total_pages = self.total_pages
            );
            self.state.page_index = self.total_pages.saturating_sub(1);
        }
        self.shown_page = self.state.page_index;
        self.links = pagination::build_links(self.shown_page, self.total_pages);
        self.summary = Summary {
            total_records: response.total_records,
            display_count: response.records.len(),
            stats: response.stats,
            last_updated: Some(now),
        };
        self.body = if response.records.is_empty() {
            TableBody::Empty
        } else {
            TableBody::Rows(response.records)
        };
        LoadOutcome::Applied
    }

    /// True when applying `ticket` moved the view back into range, so the rows
    /// on screen belong to a page that no longer exists.
    pub fn needs_reload(&self, ticket: &LoadTicket) -> bool {
        self.applied_seq == Some(ticket.seq) && ticket.query.page != self.state.page_index
    }

    /// Replaces the table body with an error; pagination and summary keep
    /// their last good values.
    pub fn apply_failure(&mut self, ticket: &LoadTicket, message: impl Into<String>) -> LoadOutcome {
        if !self.accept(ticket) {
            return LoadOutcome::Stale;
        }
        self.body = TableBody::Error(message.into());
        LoadOutcome::Failed
    }
}
