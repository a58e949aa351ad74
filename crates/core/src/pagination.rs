use std::num::NonZeroU64;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: u64,
    pub limit: u64,
}

impl PageWindow {
    #[must_use]
    pub fn for_page(page: NonZeroU64, page_size: NonZeroU64) -> Self {
        Self {
            offset: (page.get() - 1).saturating_mul(page_size.get()),
            limit: page_size.get(),
        }
    }
}

#[must_use]
pub fn total_pages(total_records: u64, page_size: NonZeroU64) -> u64 {
    total_records.div_ceil(page_size.get())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageLink {
    Previous { page: u64 },
    Page { page: u64, active: bool },
    Gap,
    Next { page: u64 },
}

#[must_use]
pub fn page_links(current: u64, total_pages: u64) -> Vec<PageLink> {
    if total_pages <= 1 {
        return Vec::new();
    }

    let mut links = Vec::new();
    if current > 1 {
        links.push(PageLink::Previous { page: current - 1 });
    }

    links.push(PageLink::Page {
        page: 1,
        active: current == 1,
    });

    if current > 3 {
        links.push(PageLink::Gap);
    }

    let start = current.saturating_sub(1).max(2);
    let end = current.saturating_add(1).min(total_pages - 1);
    for page in start..=end {
        links.push(PageLink::Page {
            page,
            active: page == current,
        });
    }

    if current.saturating_add(2) < total_pages {
        links.push(PageLink::Gap);
    }

    links.push(PageLink::Page {
        page: total_pages,
        active: current == total_pages,
    });

    if current < total_pages {
        links.push(PageLink::Next { page: current + 1 });
    }

    links
}
