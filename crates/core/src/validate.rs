//! Independent post-check for a produced schedule.
//!
//! Re-derives faculty and room busy sets from the placement list and reports
//! overlaps, per-subject hour totals that do not match the demand, and
//! lunch-boundary violations. The scheduler never feeds it; it is the safety
//! net for generation and the oracle the surrounding system can re-run at
//! commit time.

use crate::grid::TimeGrid;
use std::collections::HashMap;
use types::{ClassroomId, FacultyId, Placement, SubjectId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    /// A faculty member appears twice in one (day, slot).
    FacultyOverlap,
    /// A classroom appears twice in one (day, slot).
    RoomOverlap,
    /// A subject's placed slot total differs from its weekly demand.
    HoursMismatch,
    /// A placement spans the lunch boundary.
    LunchViolation,
    /// A placement references a day outside the grid.
    UnknownDay,
    /// A placement's start or end does not resolve to a grid slot.
    UnknownSlot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub kind: IssueKind,
    pub message: String,
}

impl ValidationIssue {
    fn new(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates a schedule against the grid and the expected per-subject weekly
/// hours. Returns all detected issues, not just the first.
pub fn validate_schedule(
    grid: &TimeGrid,
    expected_hours: &[(SubjectId, u32)],
    placements: &[Placement],
) -> Result<(), Vec<ValidationIssue>> {
    let mut issues = Vec::new();

    let mut faculty_busy: HashMap<(&FacultyId, usize, usize), &Placement> = HashMap::new();
    let mut room_busy: HashMap<(&ClassroomId, usize, usize), &Placement> = HashMap::new();
    let mut placed_hours: HashMap<&SubjectId, u32> = HashMap::new();

    for p in placements {
        let Some(day) = grid.day_index(p.day) else {
            issues.push(ValidationIssue::new(
                IssueKind::UnknownDay,
                format!("placement for {} on {} is outside the grid", p.subject, p.day),
            ));
            continue;
        };
        let Some(start) = grid.slot_index_by_start(&p.start_time) else {
            issues.push(ValidationIssue::new(
                IssueKind::UnknownSlot,
                format!(
                    "placement for {} starts at unknown slot {}",
                    p.subject, p.start_time
                ),
            ));
            continue;
        };
        let Some(end) = grid.slot_index_by_end(&p.end_time) else {
            issues.push(ValidationIssue::new(
                IssueKind::UnknownSlot,
                format!(
                    "placement for {} ends at unknown slot {}",
                    p.subject, p.end_time
                ),
            ));
            continue;
        };
        if end < start {
            issues.push(ValidationIssue::new(
                IssueKind::UnknownSlot,
                format!(
                    "placement for {} ends ({}) before it starts ({})",
                    p.subject, p.end_time, p.start_time
                ),
            ));
            continue;
        }

        let duration = end - start + 1;
        if grid.crosses_lunch(start, duration) {
            issues.push(ValidationIssue::new(
                IssueKind::LunchViolation,
                format!(
                    "placement for {} on {} {}-{} spans the lunch break",
                    p.subject, p.day, p.start_time, p.end_time
                ),
            ));
        }

        *placed_hours.entry(&p.subject).or_default() += duration as u32;

        for slot in start..=end {
            if let Some(prev) = faculty_busy.insert((&p.faculty, day, slot), p) {
                issues.push(ValidationIssue::new(
                    IssueKind::FacultyOverlap,
                    format!(
                        "faculty {} double-booked on {} at {} ({} vs {})",
                        p.faculty, p.day, grid.slots()[slot].start, prev.subject, p.subject
                    ),
                ));
            }
            if let Some(prev) = room_busy.insert((&p.classroom, day, slot), p) {
                issues.push(ValidationIssue::new(
                    IssueKind::RoomOverlap,
                    format!(
                        "room {} double-booked on {} at {} ({} vs {})",
                        p.classroom, p.day, grid.slots()[slot].start, prev.subject, p.subject
                    ),
                ));
            }
        }
    }

    for (subject, hours) in expected_hours {
        let placed = placed_hours.remove(subject).unwrap_or(0);
        if placed != *hours {
            issues.push(ValidationIssue::new(
                IssueKind::HoursMismatch,
                format!(
                    "subject {} placed for {} slots, demand is {}",
                    subject, placed, hours
                ),
            ));
        }
    }
    for (subject, placed) in placed_hours {
        issues.push(ValidationIssue::new(
            IssueKind::HoursMismatch,
            format!("subject {} placed for {} slots but is not in the batch", subject, placed),
        ));
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}
