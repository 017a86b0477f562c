//! Page-link window computation.
//!
//! Everything here is pure: the view recomputes the link list after every
//! successful load and renderers turn it into markup or terminal text.

use serde::Serialize;

/// Maximum number of numbered links shown around the current page.
pub const WINDOW_WIDTH: usize = 5;

pub const PREVIOUS_LABEL: &str = "Previous";
pub const NEXT_LABEL: &str = "Next";
pub const ELLIPSIS_LABEL: &str = "...";

/// Inclusive range of 1-based page numbers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PageWindow {
    pub start: usize,
    pub end: usize,
}

impl PageWindow {
    pub fn len(&self) -> usize {
        (self.end + 1).saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    pub fn contains(&self, page: usize) -> bool {
        (self.start..=self.end).contains(&page)
    }
}

/// Computes the visible window for a 1-based `current_display` page.
///
/// Returns `None` when there are no pages. A `current_display` past the end
/// still yields an in-range window; it just does not contain the current page.
pub fn page_window(current_display: usize, total_pages: usize) -> Option<PageWindow> {
    if total_pages == 0 {
        return None;
    }
    let mut start = current_display.saturating_sub(WINDOW_WIDTH / 2).max(1);
    let end = total_pages.min(start + WINDOW_WIDTH - 1);

    // window narrower than WINDOW_WIDTH near the right edge: pull it left
    if end + 1 < start + WINDOW_WIDTH && start > 1 {
        start = end.saturating_sub(WINDOW_WIDTH - 1).max(1);
    }
    Some(PageWindow { start, end })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    Previous,
    Page,
    Ellipsis,
    Next,
}

/// One entry of a pagination bar. `page_index` is the 0-based target and is
/// `None` for entries that cannot be followed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PageLink {
    pub kind: LinkKind,
    pub label: String,
    pub page_index: Option<usize>,
    pub disabled: bool,
    pub active: bool,
}

impl PageLink {
    fn page(index: usize, active: bool) -> Self {
        Self {
            kind: LinkKind::Page,
            label: (index + 1).to_string(),
            page_index: Some(index),
            disabled: false,
            active,
        }
    }

    fn ellipsis() -> Self {
        Self {
            kind: LinkKind::Ellipsis,
            label: ELLIPSIS_LABEL.to_string(),
            page_index: None,
            disabled: true,
            active: false,
        }
    }

    /// Target page if the link can be followed.
    pub fn target(&self) -> Option<usize> {
        if self.disabled {
            None
        } else {
            self.page_index
        }
    }
}

/// Builds the full bar for 0-based `current_index`: previous, optional
/// leading `1 ...`, the window, optional trailing `... N`, next.
pub fn build_links(current_index: usize, total_pages: usize) -> Vec<PageLink> {
    let mut links = Vec::with_capacity(WINDOW_WIDTH + 6);
    let current_display = current_index + 1;

    links.push(PageLink {
        kind: LinkKind::Previous,
        label: PREVIOUS_LABEL.to_string(),
        page_index: current_index.checked_sub(1),
        disabled: current_index == 0,
        active: false,
    });

    if let Some(window) = page_window(current_display, total_pages) {
        if window.start > 1 {
            links.push(PageLink::page(0, false));
            if window.start > 2 {
                links.push(PageLink::ellipsis());
            }
        }

        for page in window.start..=window.end {
            links.push(PageLink::page(page - 1, page == current_display));
        }

        if window.end < total_pages {
            if window.end + 1 < total_pages {
                links.push(PageLink::ellipsis());
            }
            links.push(PageLink::page(total_pages - 1, false));
        }
    }

    links.push(PageLink {
        kind: LinkKind::Next,
        label: NEXT_LABEL.to_string(),
        page_index: Some(current_index + 1),
        disabled: current_index + 1 >= total_pages,
        active: false,
    });

    links
}
