//! Pager fill: navigation links for the current sort and page.

use serde::{Deserialize, Serialize};

use crate::error::{RenderError, Result};
use crate::renderer::RenderContext;

/// Role of a pager link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    First,
    Prev,
    Page,
    Next,
    Last,
}

/// One navigation link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PagerLink {
    pub kind: LinkKind,
    pub label: String,
    pub page: usize,
    pub href: String,
    /// The page being displayed. Current links are still handed out so the
    /// target can render them unlinked.
    pub current: bool,
}

/// A pager widget that accepts links.
pub trait PagerTarget {
    fn add_link(&mut self, link: PagerLink) -> std::result::Result<(), String>;

    /// Called once before any link with the paging totals.
    fn set_totals(&mut self, _page: usize, _pages: usize, _total: usize) {}
}

/// In-memory pager.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Pager {
    pub page: usize,
    pub pages: usize,
    pub total: usize,
    pub links: Vec<PagerLink>,
}

impl Pager {
    pub fn new() -> Self {
        Pager::default()
    }

    /// Page numbers of the numbered links.
    pub fn numbers(&self) -> Vec<usize> {
        self.links
            .iter()
            .filter(|l| l.kind == LinkKind::Page)
            .map(|l| l.page)
            .collect()
    }
}

impl PagerTarget for Pager {
    fn add_link(&mut self, link: PagerLink) -> std::result::Result<(), String> {
        self.links.push(link);
        Ok(())
    }

    fn set_totals(&mut self, page: usize, pages: usize, total: usize) {
        self.page = page;
        self.pages = pages;
        self.total = total;
    }
}

/// Options for [`fill_pager`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagerOptions {
    /// Numbered links shown on each side of the current page.
    pub delta: usize,
    pub first_label: String,
    pub prev_label: String,
    pub next_label: String,
    pub last_label: String,
    pub show_first_last: bool,
}

impl Default for PagerOptions {
    fn default() -> Self {
        PagerOptions {
            delta: 2,
            first_label: "<<".to_string(),
            prev_label: "<".to_string(),
            next_label: ">".to_string(),
            last_label: ">>".to_string(),
            show_first_last: true,
        }
    }
}

/// Hands pager links to `target`.
///
/// Links keep the current sort. First/prev are omitted on page 1 and
/// next/last on the last page; a single-page grid gets no links at all.
pub fn fill_pager(
    ctx: &RenderContext<'_>,
    target: &mut dyn PagerTarget,
    options: &PagerOptions,
) -> Result<()> {
    let page = ctx.page.page();
    let pages = ctx.page_count();
    target.set_totals(page, pages, ctx.total);
    if pages <= 1 {
        return Ok(());
    }

    let link = |kind, label: &str, to: usize| PagerLink {
        kind,
        label: label.to_string(),
        page: to,
        href: ctx.page_href(to),
        current: to == page,
    };

    let mut links = Vec::new();
    if page > 1 {
        if options.show_first_last {
            links.push(link(LinkKind::First, &options.first_label, 1));
        }
        links.push(link(LinkKind::Prev, &options.prev_label, page - 1));
    }
    let low = page.saturating_sub(options.delta).max(1);
    let high = page.saturating_add(options.delta).min(pages);
    for number in low..=high {
        links.push(link(LinkKind::Page, &number.to_string(), number));
    }
    if page < pages {
        links.push(link(LinkKind::Next, &options.next_label, page + 1));
        if options.show_first_last {
            links.push(link(LinkKind::Last, &options.last_label, pages));
        }
    }

    for link in links {
        let label = link.label.clone();
        target
            .add_link(link)
            .map_err(|reason| RenderError::fill_rejected("pager", label, reason))?;
    }
    Ok(())
}
