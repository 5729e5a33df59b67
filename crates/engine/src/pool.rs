//! Room pools per subject kind, ordered for best-fit selection.

use types::{Classroom, RoomKind, SubjectKind};

/// Active classrooms partitioned by use: labs for lab subjects, lecture and
/// seminar rooms for everything else. Each pool is sorted ascending by
/// capacity (id as tiebreak) so the smallest sufficient room wins.
#[derive(Debug)]
pub struct ResourcePool {
    lecture_rooms: Vec<Classroom>,
    lab_rooms: Vec<Classroom>,
}

impl ResourcePool {
    pub fn new(rooms: Vec<Classroom>) -> Self {
        let (mut lab_rooms, mut lecture_rooms): (Vec<_>, Vec<_>) = rooms
            .into_iter()
            .partition(|r| matches!(r.kind, RoomKind::Lab));
        lecture_rooms.sort_by(|a, b| a.capacity.cmp(&b.capacity).then(a.id.cmp(&b.id)));
        lab_rooms.sort_by(|a, b| a.capacity.cmp(&b.capacity).then(a.id.cmp(&b.id)));
        Self {
            lecture_rooms,
            lab_rooms,
        }
    }

    /// The pool a subject kind draws from.
    pub fn rooms_for(&self, kind: SubjectKind) -> &[Classroom] {
        if kind.is_lab() {
            &self.lab_rooms
        } else {
            &self.lecture_rooms
        }
    }

    /// Pool identity for error reporting.
    pub fn required_kind(kind: SubjectKind) -> RoomKind {
        if kind.is_lab() {
            RoomKind::Lab
        } else {
            RoomKind::Lecture
        }
    }

    /// Rooms to try, in order: every room seating the batch, smallest first;
    /// then, when fallback is allowed, the remaining rooms largest first so a
    /// too-small room is only ever the last resort.
    pub fn candidates(
        &self,
        kind: SubjectKind,
        strength: u32,
        allow_fallback: bool,
    ) -> Vec<&Classroom> {
        let pool = self.rooms_for(kind);
        let mut out: Vec<&Classroom> = pool.iter().filter(|r| r.capacity >= strength).collect();
        if allow_fallback {
            out.extend(pool.iter().rev().filter(|r| r.capacity < strength));
        }
        out
    }
}
