pub mod grid;
pub mod mem;
pub mod validate;

use async_trait::async_trait;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

pub use grid::{GridError, TimeGrid};
pub use mem::MemRepository;
pub use types::{
    Batch, BatchId, Classroom, ClassroomId, Faculty, FacultyId, Generated, GridConfig, Placement,
    RoomKind, SlotSpec, Subject, SubjectId, SubjectKind, Timetable, TimetableOption,
    TimetableStatus,
};
pub use validate::{validate_schedule, IssueKind, ValidationIssue};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Read-only view of the persisted reference data the engine needs. The
/// surrounding system owns writes; a scheduling run only snapshots.
#[async_trait]
pub trait Repository: Send + Sync + 'static {
    /// Loads a batch with its subject/faculty bindings as persisted. Bindings
    /// may carry missing halves; the engine rejects those, not the repository.
    async fn get_batch(&self, id: &BatchId) -> Result<Batch, RepoError>;

    /// All classrooms with `active = true`.
    async fn list_active_classrooms(&self) -> Result<Vec<Classroom>, RepoError>;

    /// All timetables with status `active` or `published`. Drafts are
    /// excluded so iterative generation does not block on its own output.
    async fn list_committed_timetables(&self) -> Result<Vec<Timetable>, RepoError>;
}

/// What exhausted the search for an unplaceable subject.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockedBy {
    Faculty,
    Room,
}

impl fmt::Display for BlockedBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BlockedBy::Faculty => "assigned faculty has no free block",
            BlockedBy::Room => "no suitable room free in any candidate block",
        })
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("batch not found: {0}")]
    NotFound(BatchId),
    #[error("invalid batch input: {detail} (bindings {indices:?})")]
    InvalidInput { detail: String, indices: Vec<usize> },
    #[error("required {required} weekly hours exceed grid capacity of {available} slots")]
    HoursExceedCapacity { required: u32, available: u32 },
    #[error("no {room_kind} room available for subject {subject}")]
    MissingRoomType {
        subject: SubjectId,
        room_kind: RoomKind,
    },
    #[error("could not place subject {subject}: {reason}")]
    Unplaceable {
        subject: SubjectId,
        reason: BlockedBy,
    },
    #[error("generation cancelled")]
    Cancelled,
    #[error("generated timetable failed validation: {0}")]
    Internal(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Cooperative cancellation handle, checked between bindings.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
