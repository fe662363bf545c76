//! # patient-risk
//!
//! Client for a paginated patient-records API that classifies clinical risk from
//! three vital signs and submits the aggregated lists back.
//!
//! ## Pipeline
//!
//! 1. [`pagination::fetch_all_patients`] walks `GET /patients` page by page. Each page
//!    request is retried on 429/500/503 with linear backoff ([`retry`]); a page that keeps
//!    failing is re-requested a bounded number of times, and any other failure stops the
//!    loop with the records gathered so far.
//! 2. [`scoring::assess_patients`] scores blood pressure, temperature, and age for each
//!    record and builds the high-risk, fever, and data-quality lists.
//! 3. [`submission::Submitter`] posts the lists to `POST /submit-assessment`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use patient_risk::{Config, run_assessment};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let outcome = run_assessment(&config, false).await?;
//!     println!("{} patients, reply: {:?}", outcome.patients_fetched, outcome.submission);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// HTTP client for the patient API
pub mod client;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Pagination loop
pub mod pagination;
/// Retry logic with linear backoff
pub mod retry;
/// Risk scoring
pub mod scoring;
/// Assessment submission
pub mod submission;
/// Core data types
pub mod types;

pub use client::ApiClient;
pub use config::{ApiConfig, Config, PaginationConfig, RetryConfig, SubmissionConfig};
pub use error::{Error, Result};
pub use pagination::{FetchOutcome, FetchStop, PatientSource, fetch_all_patients};
pub use scoring::{RiskScore, assess_patients, score_patient};
pub use submission::Submitter;
pub use types::{AssessmentResult, Pagination, Patient, PatientPage};

/// Result of [`run_assessment`]
#[derive(Clone, Debug)]
pub struct AssessmentOutcome {
    /// Records that were fetched and scored
    pub patients_fetched: usize,
    /// Whether every page was fetched
    pub complete: bool,
    /// The three lists
    pub result: AssessmentResult,
    /// Server reply, `None` on a dry run
    pub submission: Option<serde_json::Value>,
}

/// Fetch all patients, score them, and submit unless `dry_run` is set
///
/// Fetching never fails; a partial fetch is scored and submitted as-is. Only client
/// construction and the submission itself can return an error.
pub async fn run_assessment(config: &Config, dry_run: bool) -> Result<AssessmentOutcome> {
    let client = ApiClient::new(config)?;

    let fetched = fetch_all_patients(&client, &config.pagination).await;
    if !fetched.is_complete() {
        tracing::warn!(
            patients = fetched.patients.len(),
            stop = ?fetched.stop,
            "Scoring partial patient data"
        );
    }

    let result = assess_patients(&fetched.patients);

    let submission = if dry_run {
        tracing::info!("Dry run, skipping submission");
        None
    } else {
        let submitter = Submitter::new(&client, config.submission.clone());
        Some(submitter.submit(&result).await?)
    };

    Ok(AssessmentOutcome {
        patients_fetched: fetched.patients.len(),
        complete: fetched.is_complete(),
        result,
        submission,
    })
}
