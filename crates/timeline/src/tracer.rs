use crate::builder::{Snapshot, SnapshotBuilder};
use crate::cache::ContentCache;
use crate::config::TimelineConfig;
use crate::error::{Result, TimelineError};
use fn_history_entity_locator::{EntityLocator, EntityType, Language, TypeSelector};
use fn_history_provider::{Commit, HistoryProvider};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// What to trace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityQuery {
    pub name: String,
    pub file_path: String,
    pub selector: TypeSelector,
}

impl EntityQuery {
    pub fn new(
        name: impl Into<String>,
        file_path: impl Into<String>,
        selector: TypeSelector,
    ) -> Self {
        Self {
            name: name.into(),
            file_path: file_path.into(),
            selector,
        }
    }
}

/// Ordered versions of one entity, oldest first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityHistory {
    pub entity_name: String,
    pub file_path: String,
    pub repository: String,
    pub entity_type: EntityType,
    pub snapshots: Vec<Snapshot>,
}

/// Drives one provider and the locator over a file's commits
pub struct HistoryTracer {
    provider: Arc<dyn HistoryProvider>,
    locator: Arc<EntityLocator>,
    config: TimelineConfig,
}

/// Per-request state: nothing here outlives one `trace` call
struct Request<'a> {
    query: &'a EntityQuery,
    file_path: String,
    language: Language,
    cache: Arc<ContentCache>,
    permits: Arc<Semaphore>,
}

impl HistoryTracer {
    pub fn new(provider: Arc<dyn HistoryProvider>, config: TimelineConfig) -> Result<Self> {
        config.validate()?;
        let locator = EntityLocator::new(config.locator.clone())?;
        Ok(Self {
            provider,
            locator: Arc::new(locator),
            config,
        })
    }

    /// Trace `query` through every commit that touched its file
    pub async fn trace(&self, query: &EntityQuery) -> Result<EntityHistory> {
        if query.name.trim().is_empty() {
            return Err(TimelineError::invalid_request("entity name is empty"));
        }

        let file_path = self.provider.normalize_path(&query.file_path)?;
        let request = Request {
            query,
            language: Language::from_path(&file_path),
            file_path,
            cache: Arc::new(ContentCache::new()),
            permits: Arc::new(Semaphore::new(self.config.effective_fetch_concurrency())),
        };

        let Some(current) = self.provider.current_file(&request.file_path).await? else {
            return Err(TimelineError::FileNotFound(request.file_path));
        };

        let mut commits = self.provider.list_commits(&request.file_path).await?;
        log::info!(
            "Tracing '{}' through {} commits of {} ({})",
            query.name,
            commits.len(),
            request.file_path,
            request.language.as_str()
        );

        let entity_type = self.resolve_type(&request, &current, &commits).await?;

        commits.reverse();
        let mut builder = SnapshotBuilder::new();
        for batch in commits.chunks(self.config.batch_size) {
            self.prefetch(&request, batch).await?;
            for commit in batch {
                let location = request
                    .cache
                    .get(&commit.hash)
                    .flatten()
                    .and_then(|content| {
                        self.locator.locate(
                            &content,
                            request.language,
                            &query.name,
                            TypeSelector::Exact(entity_type),
                        )
                    });
                builder.observe(commit, location);
            }
        }

        if builder.is_empty() {
            return Err(TimelineError::entity_not_found(
                &query.name,
                entity_type.as_str(),
                &request.file_path,
            ));
        }

        let snapshots = builder.finish();
        log::info!(
            "Found {} versions of {} '{}'",
            snapshots.len(),
            entity_type,
            query.name
        );

        Ok(EntityHistory {
            entity_name: query.name.clone(),
            file_path: request.file_path,
            repository: self.provider.repository_id(),
            entity_type,
            snapshots,
        })
    }

    /// Pin `auto` to one concrete type: the current file first, then commits
    /// newest first. The whole sequence is then traced with that type.
    async fn resolve_type(
        &self,
        request: &Request<'_>,
        current: &str,
        newest_first: &[Commit],
    ) -> Result<EntityType> {
        let name = &request.query.name;
        if let Some(entity_type) = request.query.selector.exact() {
            return Ok(entity_type);
        }

        let detect = |source: &str| {
            self.locator
                .locate(source, request.language, name, TypeSelector::Auto)
                .map(|location| location.entity_type)
        };

        if let Some(entity_type) = detect(current) {
            log::debug!("'{name}' resolved to {entity_type} in the current file");
            return Ok(entity_type);
        }

        for batch in newest_first.chunks(self.config.batch_size) {
            self.prefetch(request, batch).await?;
            for commit in batch {
                let Some(content) = request.cache.get(&commit.hash).flatten() else {
                    continue;
                };
                if let Some(entity_type) = detect(content.as_ref()) {
                    log::debug!("'{name}' resolved to {entity_type} at {}", commit.short_hash);
                    return Ok(entity_type);
                }
            }
        }

        Err(TimelineError::entity_not_found(
            name,
            "entity",
            &request.file_path,
        ))
    }

    /// Fetch the uncached commits of `batch` concurrently into the request
    /// cache. Dropping the returned future aborts fetches still in flight.
    async fn prefetch(&self, request: &Request<'_>, batch: &[Commit]) -> Result<()> {
        let mut tasks = JoinSet::new();

        for commit in batch {
            if request.cache.contains(&commit.hash) {
                continue;
            }
            let provider = Arc::clone(&self.provider);
            let cache = Arc::clone(&request.cache);
            let permits = Arc::clone(&request.permits);
            let hash = commit.hash.clone();
            let file_path = request.file_path.clone();

            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await.map_err(|_| {
                    TimelineError::ProviderUnavailable("fetch pool closed".to_string())
                })?;
                let content = provider.file_at(&hash, &file_path).await?;
                cache.insert(hash, content.map(Arc::from));
                Ok::<(), TimelineError>(())
            });
        }

        while let Some(joined) = tasks.join_next().await {
            joined.map_err(|e| {
                TimelineError::ProviderUnavailable(format!("fetch task failed: {e}"))
            })??;
        }
        Ok(())
    }
}
