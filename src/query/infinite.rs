//! Infinite feed state: a growing list of pages for one query

use super::Entry;
use crate::api::TokenApi;
use crate::error::ApiError;
use crate::types::{Token, TokenPage, TokenQueryParams};
use std::time::{Duration, Instant};

#[derive(Default)]
pub(crate) struct FeedEntry {
    pub(crate) pages: Entry<Vec<TokenPage>>,
    pub(crate) fetching_next: bool,
}

impl FeedEntry {
    pub(crate) fn needs_fetch(&self, stale_time: Duration) -> bool {
        !self.fetching_next && self.pages.needs_fetch(stale_time)
    }

    pub(crate) fn is_unused(&self, now: Instant, gc_time: Duration) -> bool {
        !self.fetching_next && self.pages.is_unused(now, gc_time)
    }

    pub(crate) fn loaded_pages(&self) -> usize {
        self.pages.data.as_ref().map_or(0, Vec::len)
    }

    pub(crate) fn next_page(&self) -> Option<u32> {
        self.pages
            .data
            .as_ref()
            .and_then(|pages| pages.last())
            .and_then(TokenPage::next_page)
    }

    pub(crate) fn can_fetch_next(&self) -> bool {
        !self.pages.fetching && !self.fetching_next && self.pages.error.is_none() && self.next_page().is_some()
    }

    /// Append `page` if it still follows the last loaded page of the same
    /// generation; anything else is a leftover from before a reload.
    pub(crate) fn resolve_next(
        &mut self,
        number: u32,
        result: Result<TokenPage, ApiError>,
        generation: u64,
    ) {
        self.fetching_next = false;
        if generation != self.pages.generation || self.next_page() != Some(number) {
            return;
        }
        match result {
            Ok(page) => {
                if let Some(pages) = self.pages.data.as_mut() {
                    pages.push(page);
                }
            }
            Err(e) => self.pages.error = Some(e.display_message()),
        }
    }

    pub(crate) fn snapshot(&self) -> FeedQuery {
        let pages = self.pages.data.as_deref().unwrap_or_default();
        FeedQuery {
            tokens: pages.iter().flat_map(|p| p.tokens.iter().cloned()).collect(),
            total: pages.last().and_then(|p| p.meta).map(|m| m.total),
            loaded: self.pages.data.is_some(),
            has_next_page: self.next_page().is_some(),
            is_fetching: self.pages.fetching,
            is_fetching_next_page: self.fetching_next,
            error: self.pages.error.clone(),
        }
    }
}

/// What the browse view sees of a feed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedQuery {
    pub tokens: Vec<Token>,
    pub total: Option<u64>,
    pub loaded: bool,
    pub has_next_page: bool,
    pub is_fetching: bool,
    pub is_fetching_next_page: bool,
    pub error: Option<String>,
}

impl FeedQuery {
    /// First load, nothing to show yet
    pub fn is_loading(&self) -> bool {
        !self.loaded && self.error.is_none()
    }

    pub fn is_empty(&self) -> bool {
        self.loaded && self.tokens.is_empty()
    }
}

/// Load pages `1..=count` in order, stopping early at the last page.
pub(crate) async fn load_pages(
    api: &TokenApi,
    params: &TokenQueryParams,
    count: usize,
) -> Result<Vec<TokenPage>, ApiError> {
    let mut pages = Vec::with_capacity(count.max(1));
    for number in 1..=count.max(1) as u32 {
        let page = api.list(&params.with_page(number)).await?;
        let last = page.next_page().is_none();
        pages.push(page);
        if last {
            break;
        }
    }
    Ok(pages)
}
