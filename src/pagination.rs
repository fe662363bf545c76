//! Pagination loop over `GET /patients`
//!
//! The fetcher walks pages from 1 until the server reports `hasNext = false`.
//! It never fails: a permanent error, or a page that keeps failing on a transient
//! status after `max_page_retries` re-requests, ends the loop and whatever was
//! accumulated so far is returned.
//!
//! The loop trusts `hasNext`: a server that keeps answering `hasNext = true` keeps
//! the loop requesting pages, even when those pages carry no records. Such pages
//! are logged at `warn`.

use crate::config::PaginationConfig;
use crate::error::Result;
use crate::types::{Patient, PatientPage};
use async_trait::async_trait;

/// Anything that can serve one page of patient records
///
/// Implementations are expected to apply their own request-level retry; the
/// fetcher layers a coarser page-level retry on top.
#[async_trait]
pub trait PatientSource: Send + Sync {
    /// Fetch page `page` (1-based) with `limit` records per page
    async fn fetch_page(&self, page: u32, limit: u32) -> Result<PatientPage>;
}

/// Why the pagination loop stopped
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchStop {
    /// The server reported no further pages
    Exhausted,
    /// A page failed and the loop kept the records gathered so far
    Failed {
        /// Page that could not be fetched
        page: u32,
        /// Last error message for that page
        error: String,
    },
}

/// Records gathered by [`fetch_all_patients`]
#[derive(Clone, Debug)]
pub struct FetchOutcome {
    /// All records, in page order
    pub patients: Vec<Patient>,
    /// Number of pages successfully fetched
    pub pages_fetched: u32,
    /// Why the loop ended
    pub stop: FetchStop,
}

impl FetchOutcome {
    /// True when every page was fetched
    pub fn is_complete(&self) -> bool {
        self.stop == FetchStop::Exhausted
    }
}

/// Fetch every page from `source`, degrading to partial data on failure
pub async fn fetch_all_patients<S>(source: &S, config: &PaginationConfig) -> FetchOutcome
where
    S: PatientSource + ?Sized,
{
    let mut patients = Vec::new();
    let mut page: u32 = 1;
    let mut pages_fetched: u32 = 0;
    let mut page_retries: u32 = 0;

    loop {
        match source.fetch_page(page, config.page_size).await {
            Ok(response) => {
                let records = response.data.len();
                patients.extend(response.data);
                pages_fetched += 1;

                tracing::debug!(
                    page,
                    records,
                    total = patients.len(),
                    has_next = response.pagination.has_next,
                    "Fetched patient page"
                );

                if records == 0 && response.pagination.has_next {
                    tracing::warn!(
                        page,
                        "Page returned no records but reports more pages, continuing"
                    );
                }

                if !response.pagination.has_next {
                    tracing::info!(
                        pages = pages_fetched,
                        patients = patients.len(),
                        "Fetched all patient pages"
                    );
                    return FetchOutcome {
                        patients,
                        pages_fetched,
                        stop: FetchStop::Exhausted,
                    };
                }

                page += 1;
                page_retries = 0;
            }
            Err(e) if e.is_transient() && page_retries < config.max_page_retries => {
                page_retries += 1;
                tracing::warn!(
                    page,
                    error = %e,
                    page_retry = page_retries,
                    max_page_retries = config.max_page_retries,
                    delay_ms = config.page_retry_delay.as_millis() as u64,
                    "Page fetch failed with transient status, re-requesting page"
                );
                tokio::time::sleep(config.page_retry_delay).await;
            }
            Err(e) => {
                tracing::error!(
                    page,
                    error = %e,
                    patients = patients.len(),
                    "Page fetch failed, stopping with partial results"
                );
                return FetchOutcome {
                    patients,
                    pages_fetched,
                    stop: FetchStop::Failed {
                        page,
                        error: e.to_string(),
                    },
                };
            }
        }
    }
}
