//! Busy sets derived from committed timetables of other batches.

use std::collections::{HashMap, HashSet};
use tracing::debug;
use tt_core::TimeGrid;
use types::{ClassroomId, FacultyId, Placement, Timetable};

/// Immutable per-run index of externally occupied (day, slot) pairs, keyed by
/// faculty and room. Built once from the committed snapshot; membership is
/// O(1). Placements that do not resolve against the grid cannot collide with
/// grid placements and are skipped.
#[derive(Debug, Default)]
pub struct ConflictIndex {
    faculty_busy: HashMap<FacultyId, HashSet<(usize, usize)>>,
    room_busy: HashMap<ClassroomId, HashSet<(usize, usize)>>,
    skipped: usize,
}

impl ConflictIndex {
    pub fn build(grid: &TimeGrid, timetables: &[Timetable]) -> Self {
        let mut index = Self::default();
        for timetable in timetables {
            if !timetable.status.is_committed() {
                continue;
            }
            for p in &timetable.week_slots {
                let Some((day, start, end)) = resolve_span(grid, p) else {
                    index.skipped += 1;
                    continue;
                };
                for slot in start..=end {
                    index
                        .faculty_busy
                        .entry(p.faculty.clone())
                        .or_default()
                        .insert((day, slot));
                    index
                        .room_busy
                        .entry(p.classroom.clone())
                        .or_default()
                        .insert((day, slot));
                }
            }
        }
        if index.skipped > 0 {
            debug!(
                skipped = index.skipped,
                "ignored committed placements outside the grid"
            );
        }
        index
    }

    pub fn faculty_busy(&self, faculty: &FacultyId, day: usize, slot: usize) -> bool {
        self.faculty_busy
            .get(faculty)
            .is_some_and(|s| s.contains(&(day, slot)))
    }

    pub fn room_busy(&self, room: &ClassroomId, day: usize, slot: usize) -> bool {
        self.room_busy
            .get(room)
            .is_some_and(|s| s.contains(&(day, slot)))
    }

    /// Committed placements that fell outside the grid at build time.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Commit-time hook: descriptions of every collision between `placements`
    /// and this index. Empty means the schedule is still clean against the
    /// snapshot the index was built from.
    pub fn clashes(&self, grid: &TimeGrid, placements: &[Placement]) -> Vec<String> {
        let mut out = Vec::new();
        for p in placements {
            let Some((day, start, end)) = resolve_span(grid, p) else {
                continue;
            };
            for slot in start..=end {
                let at = &grid.slots()[slot].start;
                if self.faculty_busy(&p.faculty, day, slot) {
                    out.push(format!(
                        "faculty {} already booked on {} at {}",
                        p.faculty, p.day, at
                    ));
                }
                if self.room_busy(&p.classroom, day, slot) {
                    out.push(format!(
                        "room {} already booked on {} at {}",
                        p.classroom, p.day, at
                    ));
                }
            }
        }
        out
    }
}

fn resolve_span(grid: &TimeGrid, p: &Placement) -> Option<(usize, usize, usize)> {
    let day = grid.day_index(p.day)?;
    let start = grid.slot_index_by_start(&p.start_time)?;
    let end = grid.slot_index_by_end(&p.end_time)?;
    (end >= start).then_some((day, start, end))
}
