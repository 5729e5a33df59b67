//! In-memory [`Repository`] for embedding and tests.

use crate::{BatchId, Repository, RepoError};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use types::{Batch, Classroom, Timetable};

#[derive(Default)]
struct Store {
    batches: HashMap<String, Batch>,
    classrooms: Vec<Classroom>,
    timetables: Vec<Timetable>,
}

/// Map-backed repository. Enforces the same contract a persistent
/// implementation would: only active classrooms and committed timetables are
/// visible to readers.
#[derive(Default)]
pub struct MemRepository {
    inner: RwLock<Store>,
}

impl MemRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_batch(&self, batch: Batch) {
        self.inner.write().batches.insert(batch.id.0.clone(), batch);
    }

    pub fn insert_classroom(&self, room: Classroom) {
        self.inner.write().classrooms.push(room);
    }

    pub fn insert_timetable(&self, timetable: Timetable) {
        self.inner.write().timetables.push(timetable);
    }

    pub fn with_batch(self, batch: Batch) -> Self {
        self.insert_batch(batch);
        self
    }

    pub fn with_classroom(self, room: Classroom) -> Self {
        self.insert_classroom(room);
        self
    }

    pub fn with_timetable(self, timetable: Timetable) -> Self {
        self.insert_timetable(timetable);
        self
    }
}

#[async_trait]
impl Repository for MemRepository {
    async fn get_batch(&self, id: &BatchId) -> Result<Batch, RepoError> {
        self.inner
            .read()
            .batches
            .get(&id.0)
            .cloned()
            .ok_or_else(|| RepoError::NotFound {
                entity: "batch",
                id: id.0.clone(),
            })
    }

    async fn list_active_classrooms(&self) -> Result<Vec<Classroom>, RepoError> {
        Ok(self
            .inner
            .read()
            .classrooms
            .iter()
            .filter(|r| r.active)
            .cloned()
            .collect())
    }

    async fn list_committed_timetables(&self) -> Result<Vec<Timetable>, RepoError> {
        Ok(self
            .inner
            .read()
            .timetables
            .iter()
            .filter(|t| t.status.is_committed())
            .cloned()
            .collect())
    }
}
