//! Drives multi page listings to completion.
//!
//! Sources hand [`paginate`] a closure that fetches one page. The controller
//! stops on the first of: a repeated page signature, a page with nothing new,
//! the provider's own total, or the page cap. Only the first and last of these
//! leave the listing incomplete.

use std::{collections::HashSet, fmt, future::Future, hash::Hash, time::Duration};

use serde::Serialize;

use crate::error::{SourceError, SourceResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationConfig {
    /// Hard cap on requested pages, never less than one
    pub max_pages: usize,
    /// Pause between consecutive page requests
    pub page_delay: Duration,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            max_pages: 200,
            page_delay: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// One based page number
    pub index: usize,
    /// Continuation token from the previous page, if the source uses one
    pub cursor: Option<String>,
}

impl PageRequest {
    pub fn first() -> Self {
        Self {
            index: 1,
            cursor: None,
        }
    }
}

/// Size of the whole listing as announced by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageTotal {
    Items(usize),
    Pages(usize),
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Identifies the page content; a repeat means the provider is looping
    pub signature: String,
    pub next_cursor: Option<String>,
    pub total: Option<PageTotal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IncompleteReason {
    LoopDetected { page: usize },
    CapReached { cap: usize },
    Interrupted { page: usize, error: SourceError },
}

impl fmt::Display for IncompleteReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoopDetected { page } => write!(f, "page {page} repeats an earlier page"),
            Self::CapReached { cap } => write!(f, "stopped at the {cap} page cap"),
            Self::Interrupted { page, error } => write!(f, "page {page} failed: {error}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PaginationStatus {
    Complete,
    Incomplete { reason: IncompleteReason },
}

impl PaginationStatus {
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }

    pub fn incomplete(reason: IncompleteReason) -> Self {
        Self::Incomplete { reason }
    }
}

#[derive(Debug, Clone)]
pub struct Paginated<T> {
    /// Unique items in provider order
    pub items: Vec<T>,
    pub status: PaginationStatus,
    /// Pages actually received
    pub pages: usize,
}

impl<T> Paginated<T> {
    fn finish(items: Vec<T>, pages: usize, status: PaginationStatus) -> Self {
        Self {
            items,
            status,
            pages,
        }
    }
}

/// Fetches pages with `fetch` until the listing ends.
///
/// `key` identifies an item; an item whose key was already collected is
/// dropped. A failure on the first page is returned as is, a failure on a
/// later page ends the listing as `Interrupted` with what was gathered.
pub async fn paginate<T, K, KF, F, Fut>(
    config: &PaginationConfig,
    key: KF,
    mut fetch: F,
) -> SourceResult<Paginated<T>>
where
    K: Eq + Hash,
    KF: Fn(&T) -> K,
    F: FnMut(PageRequest) -> Fut,
    Fut: Future<Output = SourceResult<Page<T>>>,
{
    let cap = config.max_pages.max(1);
    let mut items = Vec::new();
    let mut keys = HashSet::new();
    let mut signatures = HashSet::new();
    let mut request = PageRequest::first();

    loop {
        if request.index > 1 && !config.page_delay.is_zero() {
            tokio::time::sleep(config.page_delay).await;
        }

        let index = request.index;
        debug!("fetching page {index}");

        let page = match fetch(request).await {
            Ok(page) => page,
            Err(e) if index == 1 => return Err(e),
            Err(e) => {
                warn!("page {index} failed, keeping {} items: {e}", items.len());
                let reason = IncompleteReason::Interrupted {
                    page: index,
                    error: e,
                };
                return Ok(Paginated::finish(
                    items,
                    index - 1,
                    PaginationStatus::incomplete(reason),
                ));
            }
        };

        if !signatures.insert(page.signature.clone()) {
            warn!("page {index} repeats an earlier page, stopping");
            let reason = IncompleteReason::LoopDetected { page: index };
            return Ok(Paginated::finish(
                items,
                index,
                PaginationStatus::incomplete(reason),
            ));
        }

        let mut fresh = 0;
        for item in page.items {
            if keys.insert(key(&item)) {
                items.push(item);
                fresh += 1;
            }
        }

        if fresh == 0 {
            debug!("page {index} has nothing new, listing done");
            return Ok(Paginated::finish(items, index, PaginationStatus::Complete));
        }

        let reached = match page.total {
            Some(PageTotal::Items(total)) => items.len() >= total,
            Some(PageTotal::Pages(total)) => index >= total,
            None => false,
        };
        if reached {
            debug!("listing done after {index} pages, {} items", items.len());
            return Ok(Paginated::finish(items, index, PaginationStatus::Complete));
        }

        if index >= cap {
            warn!("page cap {cap} reached with {} items", items.len());
            let reason = IncompleteReason::CapReached { cap };
            return Ok(Paginated::finish(
                items,
                index,
                PaginationStatus::incomplete(reason),
            ));
        }

        request = PageRequest {
            index: index + 1,
            cursor: page.next_cursor,
        };
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn page(items: &[u32], total: Option<PageTotal>) -> Page<u32> {
        Page {
            items: items.to_vec(),
            signature: format!("{items:?}"),
            next_cursor: None,
            total,
        }
    }

    fn config(max_pages: usize) -> PaginationConfig {
        PaginationConfig {
            max_pages,
            page_delay: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn test_stops_on_empty_page() {
        let result = paginate(&config(10), |n: &u32| *n, |req| async move {
            Ok(match req.index {
                1 => page(&[1, 2], None),
                2 => page(&[3, 4], None),
                _ => page(&[], None),
            })
        })
        .await
        .unwrap();

        assert_eq!(result.items, vec![1, 2, 3, 4]);
        assert_eq!(result.status, PaginationStatus::Complete);
        assert_eq!(result.pages, 3);
    }

    #[tokio::test]
    async fn test_stops_on_item_total() {
        let mut calls = 0;
        let result = paginate(&config(10), |n: &u32| *n, |req| {
            calls += 1;
            async move {
                let start = (req.index as u32 - 1) * 2;
                Ok(page(&[start, start + 1], Some(PageTotal::Items(5))))
            }
        })
        .await
        .unwrap();

        assert_eq!(result.items, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(result.status, PaginationStatus::Complete);
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn test_stops_on_page_total() {
        let result = paginate(&config(10), |n: &u32| *n, |req| async move {
            let n = req.index as u32;
            Ok(page(&[n], Some(PageTotal::Pages(2))))
        })
        .await
        .unwrap();

        assert_eq!(result.items, vec![1, 2]);
        assert!(result.status.is_complete());
    }

    #[tokio::test]
    async fn test_repeating_page_three_forever_is_incomplete() {
        let mut calls = 0;
        let result = paginate(&config(50), |n: &u32| *n, |req| {
            calls += 1;
            async move {
                Ok(match req.index {
                    1 => page(&[1, 2], None),
                    2 => page(&[3, 4], None),
                    _ => page(&[5, 6], None),
                })
            }
        })
        .await
        .unwrap();

        assert!(calls <= 50);
        assert_eq!(result.items, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(
            result.status,
            PaginationStatus::incomplete(IncompleteReason::LoopDetected { page: 4 })
        );
    }

    #[tokio::test]
    async fn test_cap_is_a_circuit_breaker() {
        let result = paginate(&config(3), |n: &u32| *n, |req| async move {
            Ok(page(&[req.index as u32], None))
        })
        .await
        .unwrap();

        assert_eq!(result.items, vec![1, 2, 3]);
        assert_eq!(
            result.status,
            PaginationStatus::incomplete(IncompleteReason::CapReached { cap: 3 })
        );
    }

    #[tokio::test]
    async fn test_first_page_failure_propagates() {
        let result = paginate(&config(3), |n: &u32| *n, |_req| async move {
            Err::<Page<u32>, _>(SourceError::Unavailable("down".to_string()))
        })
        .await;

        assert!(matches!(result, Err(SourceError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_later_failure_keeps_gathered_items() {
        let result = paginate(&config(5), |n: &u32| *n, |req| async move {
            if req.index == 1 {
                Ok(page(&[10, 11], None))
            } else {
                Err(SourceError::Unavailable("reset".to_string()))
            }
        })
        .await
        .unwrap();

        assert_eq!(result.items, vec![10, 11]);
        assert_eq!(result.pages, 1);
        assert!(matches!(
            result.status,
            PaginationStatus::Incomplete {
                reason: IncompleteReason::Interrupted { page: 2, .. }
            }
        ));
    }

    #[tokio::test]
    async fn test_cursor_is_forwarded() {
        let mut seen = vec![];
        let result = paginate(&config(5), |n: &u32| *n, |req| {
            seen.push(req.cursor.clone());
            async move {
                let n = req.index as u32;
                Ok(Page {
                    items: vec![n],
                    signature: n.to_string(),
                    next_cursor: Some(format!("after-{n}")),
                    total: Some(PageTotal::Pages(3)),
                })
            }
        })
        .await
        .unwrap();

        assert_eq!(result.items, vec![1, 2, 3]);
        assert_eq!(
            seen,
            vec![None, Some("after-1".to_string()), Some("after-2".to_string())]
        );
    }
}
