//! Hardest-first greedy placement with cross-batch conflict awareness.
//!
//! Bindings are ordered by block duration, then weekly hours, then subject
//! code/id, so multi-hour lab blocks claim contiguous runs before 1-hour
//! theory fills the gaps. Every iteration order (bindings, days, slots,
//! rooms) is total and stable: identical inputs produce identical schedules.

use crate::conflict::ConflictIndex;
use crate::pool::ResourcePool;
use std::collections::HashSet;
use tracing::{debug, warn};
use tt_core::{BlockedBy, CancelToken, EngineError, TimeGrid};
use types::{Batch, Faculty, Placement, Subject};

/// A batch binding with both halves present.
#[derive(Clone, Debug)]
pub struct ResolvedBinding {
    pub subject: Subject,
    pub faculty: Faculty,
}

impl ResolvedBinding {
    fn block_duration(&self) -> usize {
        if self.subject.kind.is_lab() {
            self.subject.hours_per_week as usize
        } else {
            1
        }
    }
}

#[derive(Debug)]
pub struct SchedulerOutcome {
    pub placements: Vec<Placement>,
    pub warnings: Vec<String>,
    pub probes: u64,
}

pub struct Scheduler<'a> {
    grid: &'a TimeGrid,
    pool: &'a ResourcePool,
    external: &'a ConflictIndex,
    allow_capacity_fallback: bool,
}

impl<'a> Scheduler<'a> {
    pub fn new(
        grid: &'a TimeGrid,
        pool: &'a ResourcePool,
        external: &'a ConflictIndex,
        allow_capacity_fallback: bool,
    ) -> Self {
        Self {
            grid,
            pool,
            external,
            allow_capacity_fallback,
        }
    }

    /// Places every binding or fails without emitting a partial schedule.
    /// Placements come out in canonical order: day ascending, start ascending.
    pub fn schedule(
        &self,
        batch: &Batch,
        bindings: &[ResolvedBinding],
        cancel: Option<&CancelToken>,
    ) -> Result<SchedulerOutcome, EngineError> {
        let n_slots = self.grid.slots().len();
        let slot_key = |day: usize, slot: usize| day * n_slots + slot;

        let mut order: Vec<usize> = (0..bindings.len()).collect();
        order.sort_by(|&a, &b| {
            let (ba, bb) = (&bindings[a], &bindings[b]);
            bb.block_duration()
                .cmp(&ba.block_duration())
                .then(bb.subject.hours_per_week.cmp(&ba.subject.hours_per_week))
                .then(ba.subject.code.cmp(&bb.subject.code))
                .then(ba.subject.id.cmp(&bb.subject.id))
        });

        // Busy sets local to this run; the external index never mutates.
        let mut occ_faculty: HashSet<(&str, usize)> = HashSet::new();
        let mut occ_room: HashSet<(&str, usize)> = HashSet::new();
        let mut daily: HashSet<(&str, usize)> = HashSet::new();

        let mut committed: Vec<(usize, usize, Placement)> = Vec::new();
        let mut warnings: Vec<String> = Vec::new();
        let mut probes: u64 = 0;

        for &bi in &order {
            if cancel.is_some_and(|c| c.is_cancelled()) {
                return Err(EngineError::Cancelled);
            }

            let binding = &bindings[bi];
            let subject = &binding.subject;
            let duration = binding.block_duration();
            let iterations = if subject.kind.is_lab() {
                1
            } else {
                subject.hours_per_week
            };

            if self.pool.rooms_for(subject.kind).is_empty() {
                return Err(EngineError::MissingRoomType {
                    subject: subject.id.clone(),
                    room_kind: ResourcePool::required_kind(subject.kind),
                });
            }
            let candidates =
                self.pool
                    .candidates(subject.kind, batch.strength, self.allow_capacity_fallback);

            for _ in 0..iterations {
                let mut placed = false;
                let mut faculty_had_block = false;

                'days: for day in 0..self.grid.days().len() {
                    if !subject.kind.is_lab() && daily.contains(&(subject.id.0.as_str(), day)) {
                        continue;
                    }
                    for start in 0..n_slots {
                        if !self.grid.fits(start, duration) {
                            break;
                        }
                        if self.grid.crosses_lunch(start, duration) {
                            continue;
                        }
                        let faculty_clash = (start..start + duration).any(|slot| {
                            self.external.faculty_busy(&binding.faculty.id, day, slot)
                                || occ_faculty
                                    .contains(&(binding.faculty.id.0.as_str(), slot_key(day, slot)))
                        });
                        if faculty_clash {
                            continue;
                        }
                        faculty_had_block = true;

                        for room in &candidates {
                            probes += 1;
                            let room_clash = (start..start + duration).any(|slot| {
                                self.external.room_busy(&room.id, day, slot)
                                    || occ_room.contains(&(room.id.0.as_str(), slot_key(day, slot)))
                            });
                            if room_clash {
                                continue;
                            }

                            for slot in start..start + duration {
                                occ_faculty
                                    .insert((binding.faculty.id.0.as_str(), slot_key(day, slot)));
                                occ_room.insert((room.id.0.as_str(), slot_key(day, slot)));
                                committed.push((
                                    day,
                                    slot,
                                    Placement {
                                        day: self.grid.days()[day],
                                        start_time: self.grid.slots()[slot].start.clone(),
                                        end_time: self.grid.slots()[slot].end.clone(),
                                        subject: subject.id.clone(),
                                        faculty: binding.faculty.id.clone(),
                                        classroom: room.id.clone(),
                                        kind: subject.kind,
                                    },
                                ));
                            }
                            daily.insert((subject.id.0.as_str(), day));

                            if room.capacity < batch.strength {
                                let msg = format!(
                                    "capacity_fallback: subject {} placed in room {} (capacity {} < strength {})",
                                    subject.code, room.id, room.capacity, batch.strength
                                );
                                warn!(subject = %subject.id, room = %room.id, "capacity fallback");
                                if !warnings.contains(&msg) {
                                    warnings.push(msg);
                                }
                            }
                            debug!(
                                subject = %subject.id,
                                day = %self.grid.days()[day],
                                start = %self.grid.slots()[start].start,
                                room = %room.id,
                                duration,
                                "block committed"
                            );
                            placed = true;
                            break 'days;
                        }
                    }
                }

                if !placed {
                    return Err(EngineError::Unplaceable {
                        subject: subject.id.clone(),
                        reason: if faculty_had_block {
                            BlockedBy::Room
                        } else {
                            BlockedBy::Faculty
                        },
                    });
                }
            }
        }

        committed.sort_by_key(|(day, slot, _)| (*day, *slot));
        Ok(SchedulerOutcome {
            placements: committed.into_iter().map(|(_, _, p)| p).collect(),
            warnings,
            probes,
        })
    }
}
