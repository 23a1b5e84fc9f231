//! Paginated ingestion stream
//!
//! Generic cursor-driven stream over an adapter's list capability. The
//! stream is pull-based: a page is fetched only when the consumer asks for
//! it, so a slow consumer never causes fetch-ahead buffering and early
//! termination never over-fetches.

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, Stream};

use crate::envelope::ListEnvelope;
use crate::error::AdapterResult;

/// Capability of fetching one page at a given offset.
#[async_trait]
pub trait PageLister: Send + Sync {
    /// Fetch the page starting at `offset`.
    ///
    /// Transport failures surface as connection errors; the stream layer
    /// never retries them — retry is the orchestrating workflow's job.
    async fn fetch_page(&self, offset: u64) -> AdapterResult<ListEnvelope>;
}

/// A pull-based stream of page envelopes.
pub type PageStream = Pin<Box<dyn Stream<Item = AdapterResult<ListEnvelope>> + Send>>;

/// Build a page stream over a lister, starting at `start_offset`.
///
/// The cursor advances to `meta.next.offset` after each page and the
/// stream terminates when the provider stops reporting one. The first
/// fetch error ends the stream with that error.
pub fn page_stream(lister: Arc<dyn PageLister>, start_offset: u64) -> PageStream {
    Box::pin(stream::try_unfold(
        Some(start_offset),
        move |cursor: Option<u64>| {
            let lister = Arc::clone(&lister);
            async move {
                let Some(offset) = cursor else {
                    return Ok(None);
                };
                let page = lister.fetch_page(offset).await?;
                let next = page.next_offset();
                Ok(Some((page, next)))
            }
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{Meta, NextPage};
    use crate::error::AdapterError;
    use futures::StreamExt;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Lister serving a fixed page sequence, counting fetches.
    struct FixedPages {
        pages: Vec<ListEnvelope>,
        fetches: AtomicU32,
        fail_at: Option<u64>,
    }

    impl FixedPages {
        fn new(count: usize, page_size: u64) -> Self {
            let pages = (0..count)
                .map(|i| ListEnvelope {
                    data: vec![json!({"id": format!("per_{i}")})],
                    included: Vec::new(),
                    links: None,
                    meta: Meta {
                        count: Some(1),
                        total_count: Some(count as u64),
                        next: if i + 1 < count {
                            Some(NextPage {
                                offset: (i as u64 + 1) * page_size,
                            })
                        } else {
                            None
                        },
                    },
                })
                .collect();
            Self {
                pages,
                fetches: AtomicU32::new(0),
                fail_at: None,
            }
        }

        fn failing_at(mut self, offset: u64) -> Self {
            self.fail_at = Some(offset);
            self
        }
    }

    #[async_trait]
    impl PageLister for FixedPages {
        async fn fetch_page(&self, offset: u64) -> AdapterResult<ListEnvelope> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.fail_at == Some(offset) {
                return Err(AdapterError::connection("socket reset"));
            }
            let idx = (offset / 25) as usize;
            Ok(self.pages[idx].clone())
        }
    }

    #[tokio::test]
    async fn test_yields_every_page_in_order_then_terminates() {
        let lister = Arc::new(FixedPages::new(3, 25));
        let mut stream = page_stream(lister.clone(), 0);

        let mut seen = Vec::new();
        while let Some(page) = stream.next().await {
            seen.push(page.unwrap().data[0]["id"].as_str().unwrap().to_string());
        }

        assert_eq!(seen, vec!["per_0", "per_1", "per_2"]);
        assert_eq!(lister.fetches.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_two_page_scenario() {
        // page 1 reports meta.next.offset = 25, page 2 reports no next
        let lister = Arc::new(FixedPages::new(2, 25));
        let pages: Vec<_> = page_stream(lister, 0).collect().await;

        assert_eq!(pages.len(), 2);
        assert!(pages.iter().all(Result::is_ok));
    }

    #[tokio::test]
    async fn test_early_stop_does_not_fetch_ahead() {
        let lister = Arc::new(FixedPages::new(5, 25));
        let mut stream = page_stream(lister.clone(), 0);

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.next_offset(), Some(25));
        drop(stream);

        assert_eq!(lister.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transport_failure_ends_stream_with_error() {
        let lister = Arc::new(FixedPages::new(3, 25).failing_at(25));
        let mut stream = page_stream(lister.clone(), 0);

        assert!(stream.next().await.unwrap().is_ok());
        let err = stream.next().await.unwrap().unwrap_err();
        assert_eq!(err.error_code(), "CONNECTION_FAILED");
        assert!(stream.next().await.is_none());
        // no retry of the failed page
        assert_eq!(lister.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_starting_offset_is_honored() {
        let lister = Arc::new(FixedPages::new(3, 25));
        let mut stream = page_stream(lister.clone(), 50);

        let page = stream.next().await.unwrap().unwrap();
        assert_eq!(page.data[0]["id"], "per_2");
        assert!(stream.next().await.is_none());
    }
}
