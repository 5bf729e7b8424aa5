use crate::builder::{ChangeKind, Snapshot};
use crate::tracer::EntityHistory;
use fn_history_entity_locator::{EntityType, TypeSelector};
use fn_history_protocol::{
    AnalyzeResponse, ChangeType, CommitPayload, EntityKind, RequestedType, SnapshotPayload,
    RESPONSE_SCHEMA_VERSION,
};
use fn_history_provider::Commit;

pub fn entity_kind(entity_type: EntityType) -> EntityKind {
    match entity_type {
        EntityType::Function => EntityKind::Function,
        EntityType::Class => EntityKind::Class,
        EntityType::Struct => EntityKind::Struct,
        EntityType::Enum => EntityKind::Enum,
        EntityType::Impl => EntityKind::Impl,
        EntityType::Interface => EntityKind::Interface,
    }
}

pub fn type_selector(requested: RequestedType) -> TypeSelector {
    let entity_type = match requested.kind() {
        None => return TypeSelector::Auto,
        Some(EntityKind::Function) => EntityType::Function,
        Some(EntityKind::Class) => EntityType::Class,
        Some(EntityKind::Struct) => EntityType::Struct,
        Some(EntityKind::Enum) => EntityType::Enum,
        Some(EntityKind::Impl) => EntityType::Impl,
        Some(EntityKind::Interface) => EntityType::Interface,
    };
    TypeSelector::Exact(entity_type)
}

fn commit_payload(commit: &Commit) -> CommitPayload {
    CommitPayload {
        hash: commit.hash.clone(),
        short_hash: commit.short_hash.clone(),
        date: commit.timestamp.clone(),
        subject: commit.subject.clone(),
        message: commit.message.clone(),
        author: commit.author_name.clone(),
    }
}

fn snapshot_payload(snapshot: &Snapshot) -> SnapshotPayload {
    SnapshotPayload {
        index: snapshot.index,
        commit: commit_payload(&snapshot.commit),
        source: snapshot.source.clone(),
        start_line: snapshot.start_line,
        end_line: snapshot.end_line,
        change_type: match snapshot.change {
            ChangeKind::Created => ChangeType::Created,
            ChangeKind::Modified => ChangeType::Modified,
        },
        changed_lines: snapshot.changed_lines.iter().copied().collect(),
    }
}

impl From<&EntityHistory> for AnalyzeResponse {
    fn from(history: &EntityHistory) -> Self {
        AnalyzeResponse {
            schema_version: RESPONSE_SCHEMA_VERSION,
            entity_name: history.entity_name.clone(),
            file_path: history.file_path.clone(),
            repository: history.repository.clone(),
            entity_type: entity_kind(history.entity_type),
            snapshots: history.snapshots.iter().map(snapshot_payload).collect(),
        }
    }
}
