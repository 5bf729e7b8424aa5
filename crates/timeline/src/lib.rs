//! # Timeline
//!
//! Traces one named entity through the commits of one file and produces its
//! distinct versions, oldest first.
//!
//! ```text
//! HistoryProvider ──list_commits──> commits (newest first)
//!        │                               │ reverse
//!        └──file_at (batched, bounded)──>│
//!                                        ▼
//!                  EntityLocator ──> SnapshotBuilder ──> EntityHistory
//!                                     (LCS line diff)
//! ```
//!
//! [`analyze`] runs a whole [`AnalyzeRequest`] from repository reference to
//! wire response.

mod builder;
mod cache;
mod config;
mod diff;
mod error;
mod tracer;
mod wire;

pub use builder::{ChangeKind, Snapshot, SnapshotBuilder};
pub use cache::ContentCache;
pub use config::{
    TimelineConfig, DEFAULT_BATCH_SIZE, DEFAULT_FETCH_CONCURRENCY, FETCH_CONCURRENCY_ENV,
    MAX_FETCH_CONCURRENCY,
};
pub use diff::{all_lines, changed_lines};
pub use error::{Result, TimelineError};
pub use tracer::{EntityHistory, EntityQuery, HistoryTracer};
pub use wire::{entity_kind, type_selector};

use fn_history_protocol::{AnalyzeRequest, AnalyzeResponse};
use fn_history_provider::{open_provider, RepoRef};

/// Resolve the repository reference, open its provider and trace the entity.
///
/// An empty `file_path` is taken from a `…/blob/<branch>/<path>` URL.
pub async fn analyze(request: &AnalyzeRequest, config: &TimelineConfig) -> Result<EntityHistory> {
    let reference = RepoRef::parse(&request.repository)?;

    let file_path = match (request.file_path.trim(), reference.embedded_file_path()) {
        ("", Some(embedded)) => embedded.to_string(),
        ("", None) => {
            return Err(TimelineError::invalid_request(format!(
                "no file path given and none embedded in {}",
                request.repository
            )))
        }
        (given, _) => given.to_string(),
    };

    let provider = open_provider(&reference, &config.provider_options()).await?;
    let tracer = HistoryTracer::new(provider, config.clone())?;
    let query = EntityQuery::new(
        request.entity_name.clone(),
        file_path,
        type_selector(request.entity_type),
    );
    tracer.trace(&query).await
}

/// [`analyze`], shaped for the wire
pub async fn analyze_response(
    request: &AnalyzeRequest,
    config: &TimelineConfig,
) -> Result<AnalyzeResponse> {
    analyze(request, config)
        .await
        .map(|history| AnalyzeResponse::from(&history))
}
