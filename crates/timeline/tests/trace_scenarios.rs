use async_trait::async_trait;
use fn_history_entity_locator::{EntityType, TypeSelector};
use fn_history_protocol::{AnalyzeResponse, ChangeType};
use fn_history_provider::{Commit, HistoryError, HistoryProvider};
use fn_history_timeline::{
    changed_lines, ChangeKind, EntityQuery, HistoryTracer, TimelineConfig, TimelineError,
};
use pretty_assertions::assert_eq;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const FILE: &str = "src/math.js";

/// In-memory repository: one tracked file, one version per commit
struct FakeRepo {
    newest_first: Vec<Commit>,
    contents: HashMap<String, Option<String>>,
    current: Option<String>,
    broken_commit: Option<String>,
    listing_fails: bool,
    fetches: AtomicUsize,
}

impl FakeRepo {
    /// `versions` oldest first; `None` = file absent at that commit
    fn new(versions: &[Option<&str>]) -> Self {
        let mut newest_first = Vec::new();
        let mut contents = HashMap::new();
        for (i, version) in versions.iter().enumerate() {
            let commit = Commit::new(
                format!("{:040x}", i + 1),
                "Dev",
                "dev@example.com",
                format!("2024-01-{:02}T00:00:00Z", i + 1),
                format!("Commit {i}"),
            );
            contents.insert(commit.hash.clone(), version.map(str::to_string));
            newest_first.insert(0, commit);
        }
        let current = versions.last().copied().flatten().map(str::to_string);

        Self {
            newest_first,
            contents,
            current,
            broken_commit: None,
            listing_fails: false,
            fetches: AtomicUsize::new(0),
        }
    }

    fn hash_of(i: usize) -> String {
        format!("{:040x}", i + 1)
    }
}

#[async_trait]
impl HistoryProvider for FakeRepo {
    fn repository_id(&self) -> String {
        "fake/repo".to_string()
    }

    async fn list_commits(&self, file_path: &str) -> fn_history_provider::Result<Vec<Commit>> {
        assert_eq!(file_path, FILE);
        if self.listing_fails {
            return Err(HistoryError::api("503 Service Unavailable"));
        }
        Ok(self.newest_first.clone())
    }

    async fn file_at(&self, hash: &str, _path: &str) -> fn_history_provider::Result<Option<String>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.broken_commit.as_deref() == Some(hash) {
            return Err(HistoryError::Timeout("cat-file".into()));
        }
        Ok(self.contents.get(hash).cloned().flatten())
    }

    async fn current_file(&self, _path: &str) -> fn_history_provider::Result<Option<String>> {
        Ok(self.current.clone())
    }
}

fn build_tracer(repo: FakeRepo) -> (HistoryTracer, Arc<FakeRepo>) {
    build_tracer_with(repo, TimelineConfig::default())
}

fn build_tracer_with(repo: FakeRepo, config: TimelineConfig) -> (HistoryTracer, Arc<FakeRepo>) {
    let repo = Arc::new(repo);
    let provider: Arc<dyn HistoryProvider> = repo.clone();
    (HistoryTracer::new(provider, config).unwrap(), repo)
}

fn query(name: &str, selector: TypeSelector) -> EntityQuery {
    EntityQuery::new(name, FILE, selector)
}

const ADD_V1: &str = "function add(a, b) {\n  return a + b;\n}\n";
const ADD_V2: &str = "function add(a, b, c) {\n  return a + b;\n}\n";

#[tokio::test]
async fn signature_change_yields_created_then_modified() {
    let (tracer, _) = build_tracer(FakeRepo::new(&[Some(ADD_V1), Some(ADD_V2)]));
    let history = tracer.trace(&query("add", TypeSelector::Auto)).await.unwrap();

    assert_eq!(history.entity_type, EntityType::Function);
    assert_eq!(history.repository, "fake/repo");
    assert_eq!(history.snapshots.len(), 2);

    let created = &history.snapshots[0];
    assert_eq!(created.change, ChangeKind::Created);
    assert_eq!(created.source, "function add(a, b) {\n  return a + b;\n}");
    assert_eq!(created.changed_lines, BTreeSet::from([0, 1, 2]));
    assert_eq!(created.commit.hash, FakeRepo::hash_of(0));

    let modified = &history.snapshots[1];
    assert_eq!(modified.index, 1);
    assert_eq!(modified.change, ChangeKind::Modified);
    assert!(modified.source.starts_with("function add(a, b, c)"));
    assert_eq!(modified.changed_lines, BTreeSet::from([0]));
    assert_eq!((modified.start_line, modified.end_line), (1, 3));
}

#[tokio::test]
async fn identical_reintroduction_after_deletion_is_not_a_new_version() {
    let other = "function other() {}\n";
    let (tracer, _) = build_tracer(FakeRepo::new(&[Some(ADD_V1), Some(other), Some(ADD_V1)]));
    let history = tracer.trace(&query("add", TypeSelector::Auto)).await.unwrap();

    assert_eq!(history.snapshots.len(), 1);
    assert_eq!(history.snapshots[0].commit.hash, FakeRepo::hash_of(0));
}

#[tokio::test]
async fn changed_reintroduction_compares_against_last_present_version() {
    let (tracer, _) = build_tracer(FakeRepo::new(&[Some(ADD_V1), None, Some(ADD_V2)]));
    let history = tracer.trace(&query("add", TypeSelector::Auto)).await.unwrap();

    let hashes: Vec<_> = history.snapshots.iter().map(|s| s.commit.hash.clone()).collect();
    assert_eq!(hashes, vec![FakeRepo::hash_of(0), FakeRepo::hash_of(2)]);
    assert_eq!(history.snapshots[1].change, ChangeKind::Modified);
    assert_eq!(history.snapshots[1].changed_lines, BTreeSet::from([0]));
}

#[tokio::test]
async fn requested_type_is_never_substituted() {
    let (tracer, _) = build_tracer(FakeRepo::new(&[Some(ADD_V1), Some(ADD_V2)]));
    let err = tracer
        .trace(&query("add", EntityType::Class.into()))
        .await
        .unwrap_err();
    assert!(matches!(err, TimelineError::EntityNotFound { .. }), "{err}");
    assert_eq!(err.code(), "entity_not_found");
}

#[tokio::test]
async fn unknown_entity_is_not_found() {
    let (tracer, _) = build_tracer(FakeRepo::new(&[Some(ADD_V1)]));
    let err = tracer
        .trace(&query("subtract", TypeSelector::Auto))
        .await
        .unwrap_err();
    assert!(matches!(err, TimelineError::EntityNotFound { .. }));
}

#[tokio::test]
async fn file_missing_at_head_is_file_not_found() {
    let (tracer, _) = build_tracer(FakeRepo::new(&[Some(ADD_V1), None]));
    let err = tracer.trace(&query("add", TypeSelector::Auto)).await.unwrap_err();
    assert!(matches!(err, TimelineError::FileNotFound(ref path) if path == FILE));
}

#[tokio::test]
async fn provider_failures_surface_as_unavailable() {
    let mut repo = FakeRepo::new(&[Some(ADD_V1), Some(ADD_V2)]);
    repo.broken_commit = Some(FakeRepo::hash_of(0));
    let (tracer, _) = build_tracer(repo);
    let err = tracer.trace(&query("add", TypeSelector::Auto)).await.unwrap_err();
    assert!(matches!(err, TimelineError::ProviderUnavailable(_)), "{err}");

    let mut repo = FakeRepo::new(&[Some(ADD_V1)]);
    repo.listing_fails = true;
    let (tracer, _) = build_tracer(repo);
    let err = tracer.trace(&query("add", TypeSelector::Auto)).await.unwrap_err();
    assert_eq!(err.code(), "provider_unavailable");
}

#[tokio::test]
async fn auto_type_falls_back_to_history_when_head_lacks_entity() {
    let removed = "// add was removed\n";
    let (tracer, _) = build_tracer(FakeRepo::new(&[Some(ADD_V1), Some(ADD_V2), Some(removed)]));
    let history = tracer.trace(&query("add", TypeSelector::Auto)).await.unwrap();

    assert_eq!(history.entity_type, EntityType::Function);
    assert_eq!(history.snapshots.len(), 2);
}

#[tokio::test]
async fn empty_name_is_invalid() {
    let (tracer, _) = build_tracer(FakeRepo::new(&[Some(ADD_V1)]));
    let err = tracer.trace(&query("  ", TypeSelector::Auto)).await.unwrap_err();
    assert!(matches!(err, TimelineError::InvalidRequest(_)));
}

#[tokio::test]
async fn long_histories_keep_order_and_fetch_each_commit_once() {
    let bodies = [
        "function add(a, b) {\n  return a + b;\n}\n",
        "function add(a, b) {\n  // sum\n  return a + b;\n}\n",
        "function add(a, b) {\n  // sum\n  return b + a;\n}\n",
    ];
    // Mix of repeats, gaps and unrelated edits
    let versions: Vec<Option<&str>> = (0..41)
        .map(|i| match i % 7 {
            3 => None,
            5 => Some("function unrelated() {}\n"),
            _ => Some(bodies[(i / 2) % bodies.len()]),
        })
        .chain([Some(bodies[0])])
        .collect();
    let commit_count = versions.len();

    let config = TimelineConfig {
        fetch_concurrency: 3,
        batch_size: 4,
        ..TimelineConfig::default()
    };
    let (tracer, repo) = build_tracer_with(FakeRepo::new(&versions), config);
    let history = tracer.trace(&query("add", TypeSelector::Auto)).await.unwrap();
    let snapshots = &history.snapshots;

    assert_eq!(repo.fetches.load(Ordering::SeqCst), commit_count);
    assert!(snapshots.len() > 2);

    let mut seen = HashSet::new();
    for (i, snapshot) in snapshots.iter().enumerate() {
        assert_eq!(snapshot.index, i);
        assert!(seen.insert(snapshot.commit.hash.clone()), "duplicate commit");
        let expected = if i == 0 { ChangeKind::Created } else { ChangeKind::Modified };
        assert_eq!(snapshot.change, expected);
        assert_eq!(
            snapshot.end_line - snapshot.start_line + 1,
            snapshot.source.split('\n').count()
        );
    }

    for pair in snapshots.windows(2) {
        // Hashes encode commit order
        assert!(pair[0].commit.hash < pair[1].commit.hash);
        assert_ne!(pair[0].source, pair[1].source);
        assert_eq!(
            pair[1].changed_lines,
            changed_lines(&pair[0].source, &pair[1].source)
        );
    }
}

#[tokio::test]
async fn history_converts_to_wire_response() {
    let (tracer, _) = build_tracer(FakeRepo::new(&[Some(ADD_V1), Some(ADD_V2)]));
    let history = tracer.trace(&query("add", TypeSelector::Auto)).await.unwrap();
    let response = AnalyzeResponse::from(&history);

    assert_eq!(response.entity_name, "add");
    assert_eq!(response.file_path, FILE);
    let kinds: Vec<_> = response.snapshots.iter().map(|s| s.change_type).collect();
    assert_eq!(kinds, vec![ChangeType::Created, ChangeType::Modified]);
    assert_eq!(response.snapshots[1].changed_lines, vec![0]);
    assert_eq!(response.snapshots[1].commit.subject, "Commit 1");
}

#[tokio::test]
async fn invalid_config_is_rejected_up_front() {
    let provider: Arc<dyn HistoryProvider> = Arc::new(FakeRepo::new(&[Some(ADD_V1)]));
    let config = TimelineConfig {
        batch_size: 0,
        ..TimelineConfig::default()
    };
    let result = HistoryTracer::new(provider, config);
    assert!(matches!(result, Err(TimelineError::InvalidConfig(_))));
}

/// Counts `file_at` calls that were torn down before finishing
struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Provider whose content reads never complete
struct StallingRepo {
    newest_first: Vec<Commit>,
    started: AtomicUsize,
    torn_down: Arc<AtomicUsize>,
}

#[async_trait]
impl HistoryProvider for StallingRepo {
    fn repository_id(&self) -> String {
        "stalling/repo".to_string()
    }

    async fn list_commits(&self, _file_path: &str) -> fn_history_provider::Result<Vec<Commit>> {
        Ok(self.newest_first.clone())
    }

    async fn file_at(&self, _hash: &str, _path: &str) -> fn_history_provider::Result<Option<String>> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let _in_flight = InFlight(Arc::clone(&self.torn_down));
        std::future::pending::<()>().await;
        Ok(None)
    }

    async fn current_file(&self, _path: &str) -> fn_history_provider::Result<Option<String>> {
        Ok(Some(ADD_V2.to_string()))
    }
}

#[tokio::test]
async fn dropping_a_trace_aborts_in_flight_fetches() {
    let versions: Vec<Option<&str>> = vec![Some(ADD_V1); 10];
    let repo = Arc::new(StallingRepo {
        newest_first: FakeRepo::new(&versions).newest_first,
        started: AtomicUsize::new(0),
        torn_down: Arc::new(AtomicUsize::new(0)),
    });
    let provider: Arc<dyn HistoryProvider> = repo.clone();
    let config = TimelineConfig {
        fetch_concurrency: 2,
        ..TimelineConfig::default()
    };
    let tracer = HistoryTracer::new(provider, config).unwrap();

    let query = query("add", TypeSelector::Auto);
    let outcome = tokio::time::timeout(Duration::from_millis(100), tracer.trace(&query)).await;
    assert!(outcome.is_err(), "trace should still be waiting on content");

    // Aborted tasks are torn down the next time the runtime polls them
    for _ in 0..100 {
        if repo.torn_down.load(Ordering::SeqCst) == repo.started.load(Ordering::SeqCst) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let started = repo.started.load(Ordering::SeqCst);
    // Only permitted fetches ever reached the provider
    assert_eq!(started, 2);
    assert_eq!(repo.torn_down.load(Ordering::SeqCst), started);
}
