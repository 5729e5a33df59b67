//! Timetable generation engine.
//!
//! Orchestration: load the batch and the committed snapshot through the
//! [`Repository`], derive a [`ConflictIndex`] and [`ResourcePool`], run the
//! greedy [`Scheduler`], then cross-check the result with the independent
//! validator before returning it.

pub mod conflict;
pub mod pool;
pub mod scheduler;

pub use conflict::ConflictIndex;
pub use pool::ResourcePool;
pub use scheduler::{ResolvedBinding, Scheduler, SchedulerOutcome};
pub use tt_core::{
    validate_schedule, BlockedBy, CancelToken, EngineError, GridError, MemRepository, RepoError,
    Repository, TimeGrid,
};

use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use types::{Batch, BatchId, Generated, GridConfig, SubjectId, TimetableOption};

fn default_true() -> bool {
    true
}

/// Engine configuration: the grid keys (`days`, `slots`,
/// `lunchBoundaryIndex`) plus `allowCapacityFallback`.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    #[serde(flatten)]
    pub grid: GridConfig,
    #[serde(default = "default_true")]
    pub allow_capacity_fallback: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            allow_capacity_fallback: true,
        }
    }
}

pub struct Engine {
    repo: Arc<dyn Repository>,
    grid: TimeGrid,
    allow_capacity_fallback: bool,
}

impl Engine {
    /// Engine on the standard Mon-Fri grid with capacity fallback enabled.
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self {
            repo,
            grid: TimeGrid::standard(),
            allow_capacity_fallback: true,
        }
    }

    pub fn with_config(repo: Arc<dyn Repository>, config: &EngineConfig) -> Result<Self, GridError> {
        Ok(Self {
            repo,
            grid: TimeGrid::from_config(&config.grid)?,
            allow_capacity_fallback: config.allow_capacity_fallback,
        })
    }

    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    pub async fn generate(&self, batch_id: &BatchId) -> Result<Generated, EngineError> {
        self.generate_with_cancel(batch_id, None).await
    }

    /// Generates a conflict-free weekly timetable for the batch, or fails
    /// with a precise error. Never returns a partial schedule.
    pub async fn generate_with_cancel(
        &self,
        batch_id: &BatchId,
        cancel: Option<&CancelToken>,
    ) -> Result<Generated, EngineError> {
        let batch = self.repo.get_batch(batch_id).await.map_err(|e| match e {
            RepoError::NotFound { .. } => EngineError::NotFound(batch_id.clone()),
            other => EngineError::Repo(other),
        })?;
        let bindings = resolve_bindings(&batch)?;

        let required: u32 = bindings.iter().map(|b| b.subject.hours_per_week).sum();
        let available = self.grid.usable_slots_per_week();
        if required > available {
            return Err(EngineError::HoursExceedCapacity {
                required,
                available,
            });
        }

        let classrooms = self.repo.list_active_classrooms().await?;
        let committed = self.repo.list_committed_timetables().await?;
        let external = ConflictIndex::build(&self.grid, &committed);
        let pool = ResourcePool::new(classrooms);

        let scheduler = Scheduler::new(&self.grid, &pool, &external, self.allow_capacity_fallback);
        let outcome = scheduler.schedule(&batch, &bindings, cancel)?;

        let expected: Vec<(SubjectId, u32)> = bindings
            .iter()
            .map(|b| (b.subject.id.clone(), b.subject.hours_per_week))
            .collect();
        if let Err(issues) = validate_schedule(&self.grid, &expected, &outcome.placements) {
            let joined = issues
                .iter()
                .map(|i| i.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(EngineError::Internal(joined));
        }

        info!(
            batch = %batch.id,
            subjects = bindings.len(),
            placements = outcome.placements.len(),
            probes = outcome.probes,
            "timetable generated"
        );
        let stats = serde_json::json!({
            "method": "greedy",
            "subjects": bindings.len(),
            "placements": outcome.placements.len(),
            "probes": outcome.probes,
            "externalIgnored": external.skipped(),
        });

        Ok(Generated {
            options: vec![TimetableOption {
                name: format!("{} weekly timetable", batch.code),
                description: format!(
                    "Conflict-free weekly schedule for {} ({} subjects)",
                    batch.name,
                    bindings.len()
                ),
                week_slots: outcome.placements,
            }],
            warnings: outcome.warnings,
            stats,
        })
    }
}

fn resolve_bindings(batch: &Batch) -> Result<Vec<ResolvedBinding>, EngineError> {
    if batch.bindings.is_empty() {
        return Err(EngineError::InvalidInput {
            detail: "batch has no subjects".into(),
            indices: vec![],
        });
    }
    let mut bad = Vec::new();
    let mut resolved = Vec::new();
    for (i, b) in batch.bindings.iter().enumerate() {
        match (&b.subject, &b.faculty) {
            (Some(s), Some(f)) => {
                if s.hours_per_week == 0 {
                    bad.push(i);
                } else {
                    resolved.push(ResolvedBinding {
                        subject: s.clone(),
                        faculty: f.clone(),
                    });
                }
            }
            _ => bad.push(i),
        }
    }
    if !bad.is_empty() {
        return Err(EngineError::InvalidInput {
            detail: "binding missing subject, faculty, or weekly hours".into(),
            indices: bad,
        });
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::{
        Classroom, ClassroomId, DayOfWeek, Faculty, FacultyId, Placement, RoomKind, Subject,
        SubjectBinding, SubjectKind, Timetable, TimetableStatus,
    };

    fn init_logs() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .try_init();
    }

    fn subject(id: &str, code: &str, kind: SubjectKind, hours: u32) -> Subject {
        Subject {
            id: id.into(),
            name: code.to_string(),
            code: code.to_string(),
            kind,
            hours_per_week: hours,
        }
    }

    fn faculty(id: &str) -> Faculty {
        Faculty {
            id: FacultyId::from(id),
            name: id.to_uppercase(),
        }
    }

    fn room(id: &str, capacity: u32, kind: RoomKind) -> Classroom {
        Classroom {
            id: ClassroomId::from(id),
            name: id.to_uppercase(),
            capacity,
            kind,
            active: true,
        }
    }

    fn bound(s: Subject, f: Faculty) -> SubjectBinding {
        SubjectBinding {
            subject: Some(s),
            faculty: Some(f),
        }
    }

    fn batch(id: &str, strength: u32, bindings: Vec<SubjectBinding>) -> Batch {
        Batch {
            id: id.into(),
            name: format!("{id} batch"),
            code: id.to_uppercase(),
            strength,
            bindings,
        }
    }

    fn external_placement(
        day: DayOfWeek,
        start: &str,
        end: &str,
        faculty: &str,
        room: &str,
    ) -> Placement {
        Placement {
            day,
            start_time: start.into(),
            end_time: end.into(),
            subject: "ext".into(),
            faculty: faculty.into(),
            classroom: room.into(),
            kind: SubjectKind::Theory,
        }
    }

    fn engine(repo: MemRepository) -> Engine {
        Engine::new(Arc::new(repo))
    }

    #[tokio::test]
    async fn trivial_feasible_batch() {
        init_logs();
        let repo = MemRepository::new()
            .with_batch(batch(
                "b1",
                30,
                vec![bound(
                    subject("math", "MATH", SubjectKind::Theory, 3),
                    faculty("f1"),
                )],
            ))
            .with_classroom(room("r1", 40, RoomKind::Lecture));

        let out = engine(repo).generate(&"b1".into()).await.unwrap();
        assert_eq!(out.options.len(), 1);
        assert!(out.warnings.is_empty());

        let slots = &out.options[0].week_slots;
        assert_eq!(slots.len(), 3);
        let days: Vec<_> = slots.iter().map(|p| p.day).collect();
        assert_eq!(days, vec![DayOfWeek::Mon, DayOfWeek::Tue, DayOfWeek::Wed]);
        for p in slots {
            assert_eq!(p.start_time, "09:00");
            assert_eq!(p.end_time, "10:00");
            assert_eq!(p.classroom.0, "r1");
            assert_eq!(p.faculty.0, "f1");
        }
    }

    #[tokio::test]
    async fn lab_block_lands_after_lunch() {
        let repo = MemRepository::new()
            .with_batch(batch(
                "b1",
                30,
                vec![bound(
                    subject("lab", "LAB", SubjectKind::Lab, 4),
                    faculty("f1"),
                )],
            ))
            .with_classroom(room("lab1", 30, RoomKind::Lab));

        let out = engine(repo).generate(&"b1".into()).await.unwrap();
        let slots = &out.options[0].week_slots;
        // A 4-hour block cannot start pre-lunch (it would span the break),
        // so it starts at 13:00 and runs to 17:00 on Monday.
        assert_eq!(slots.len(), 4);
        let starts: Vec<_> = slots.iter().map(|p| p.start_time.as_str()).collect();
        assert_eq!(starts, vec!["13:00", "14:00", "15:00", "16:00"]);
        assert!(slots.iter().all(|p| p.day == DayOfWeek::Mon));
        assert_eq!(slots.last().unwrap().end_time, "17:00");
    }

    #[tokio::test]
    async fn cross_batch_faculty_conflict_is_avoided() {
        let repo = MemRepository::new()
            .with_batch(batch(
                "b2",
                30,
                vec![bound(
                    subject("math", "MATH", SubjectKind::Theory, 3),
                    faculty("f1"),
                )],
            ))
            .with_classroom(room("r1", 40, RoomKind::Lecture))
            .with_timetable(Timetable {
                batch: "b1".into(),
                week_slots: vec![
                    external_placement(DayOfWeek::Mon, "09:00", "10:00", "f1", "other-room"),
                    external_placement(DayOfWeek::Mon, "10:00", "11:00", "f1", "other-room"),
                ],
                status: TimetableStatus::Published,
            });

        let out = engine(repo).generate(&"b2".into()).await.unwrap();
        let slots = &out.options[0].week_slots;
        let got: Vec<_> = slots
            .iter()
            .map(|p| (p.day, p.start_time.as_str()))
            .collect();
        assert_eq!(
            got,
            vec![
                (DayOfWeek::Mon, "11:00"),
                (DayOfWeek::Tue, "09:00"),
                (DayOfWeek::Wed, "09:00"),
            ]
        );
    }

    #[tokio::test]
    async fn draft_timetables_do_not_block() {
        let repo = MemRepository::new()
            .with_batch(batch(
                "b2",
                30,
                vec![bound(
                    subject("math", "MATH", SubjectKind::Theory, 1),
                    faculty("f1"),
                )],
            ))
            .with_classroom(room("r1", 40, RoomKind::Lecture))
            .with_timetable(Timetable {
                batch: "b1".into(),
                week_slots: vec![external_placement(
                    DayOfWeek::Mon,
                    "09:00",
                    "10:00",
                    "f1",
                    "r1",
                )],
                status: TimetableStatus::Draft,
            });

        let out = engine(repo).generate(&"b2".into()).await.unwrap();
        let p = &out.options[0].week_slots[0];
        assert_eq!((p.day, p.start_time.as_str()), (DayOfWeek::Mon, "09:00"));
    }

    #[tokio::test]
    async fn capacity_fallback_places_in_largest_room_with_warning() {
        let repo = MemRepository::new()
            .with_batch(batch(
                "b1",
                60,
                vec![bound(
                    subject("math", "MATH", SubjectKind::Theory, 1),
                    faculty("f1"),
                )],
            ))
            .with_classroom(room("r40", 40, RoomKind::Lecture))
            .with_classroom(room("r50", 50, RoomKind::Lecture));

        let out = engine(repo).generate(&"b1".into()).await.unwrap();
        let p = &out.options[0].week_slots[0];
        assert_eq!(p.classroom.0, "r50");
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].starts_with("capacity_fallback"));
    }

    #[tokio::test]
    async fn capacity_fallback_can_be_disabled() {
        let repo = MemRepository::new()
            .with_batch(batch(
                "b1",
                60,
                vec![bound(
                    subject("math", "MATH", SubjectKind::Theory, 1),
                    faculty("f1"),
                )],
            ))
            .with_classroom(room("r40", 40, RoomKind::Lecture));

        let config = EngineConfig {
            allow_capacity_fallback: false,
            ..EngineConfig::default()
        };
        let engine = Engine::with_config(Arc::new(repo), &config).unwrap();
        let err = engine.generate(&"b1".into()).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Unplaceable {
                reason: BlockedBy::Room,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn hours_overflow_fails_before_solving() {
        let bindings = (0..8)
            .map(|i| {
                bound(
                    subject(&format!("s{i}"), &format!("S{i}"), SubjectKind::Theory, 5),
                    faculty(&format!("f{i}")),
                )
            })
            .collect();
        let repo = MemRepository::new()
            .with_batch(batch("b1", 30, bindings))
            .with_classroom(room("r1", 40, RoomKind::Lecture));

        let err = engine(repo).generate(&"b1".into()).await.unwrap_err();
        match err {
            EngineError::HoursExceedCapacity {
                required,
                available,
            } => {
                assert_eq!(required, 40);
                assert_eq!(available, 35);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn lab_unplaceable_when_rooms_saturated() {
        // Only slot 3 can host a 4-hour block; occupying 14:00 every day
        // leaves no contiguous run for the lab room.
        let week: Vec<Placement> = [
            DayOfWeek::Mon,
            DayOfWeek::Tue,
            DayOfWeek::Wed,
            DayOfWeek::Thu,
            DayOfWeek::Fri,
        ]
        .into_iter()
        .map(|day| external_placement(day, "14:00", "15:00", "other-f", "lab1"))
        .collect();

        let repo = MemRepository::new()
            .with_batch(batch(
                "b1",
                30,
                vec![bound(
                    subject("lab", "LAB", SubjectKind::Lab, 4),
                    faculty("f1"),
                )],
            ))
            .with_classroom(room("lab1", 30, RoomKind::Lab))
            .with_timetable(Timetable {
                batch: "b0".into(),
                week_slots: week,
                status: TimetableStatus::Active,
            });

        let err = engine(repo).generate(&"b1".into()).await.unwrap_err();
        match err {
            EngineError::Unplaceable { subject, reason } => {
                assert_eq!(subject.0, "lab");
                assert_eq!(reason, BlockedBy::Room);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn unplaceable_reports_faculty_when_faculty_saturated() {
        let mut week = Vec::new();
        for day in [
            DayOfWeek::Mon,
            DayOfWeek::Tue,
            DayOfWeek::Wed,
            DayOfWeek::Thu,
            DayOfWeek::Fri,
        ] {
            for (start, end) in [
                ("09:00", "10:00"),
                ("10:00", "11:00"),
                ("11:00", "12:00"),
                ("13:00", "14:00"),
                ("14:00", "15:00"),
                ("15:00", "16:00"),
                ("16:00", "17:00"),
            ] {
                week.push(external_placement(day, start, end, "f1", "elsewhere"));
            }
        }
        let repo = MemRepository::new()
            .with_batch(batch(
                "b1",
                30,
                vec![bound(
                    subject("math", "MATH", SubjectKind::Theory, 1),
                    faculty("f1"),
                )],
            ))
            .with_classroom(room("r1", 40, RoomKind::Lecture))
            .with_timetable(Timetable {
                batch: "b0".into(),
                week_slots: week,
                status: TimetableStatus::Active,
            });

        let err = engine(repo).generate(&"b1".into()).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Unplaceable {
                reason: BlockedBy::Faculty,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn unknown_batch_is_not_found() {
        let repo = MemRepository::new();
        let err = engine(repo).generate(&"ghost".into()).await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound(id) if id.0 == "ghost"));
    }

    #[tokio::test]
    async fn unresolved_bindings_are_rejected_with_indices() {
        let repo = MemRepository::new().with_batch(batch(
            "b1",
            30,
            vec![
                bound(
                    subject("math", "MATH", SubjectKind::Theory, 3),
                    faculty("f1"),
                ),
                SubjectBinding {
                    subject: None,
                    faculty: Some(faculty("f2")),
                },
                SubjectBinding {
                    subject: Some(subject("phy", "PHY", SubjectKind::Theory, 2)),
                    faculty: None,
                },
            ],
        ));

        let err = engine(repo).generate(&"b1".into()).await.unwrap_err();
        match err {
            EngineError::InvalidInput { indices, .. } => assert_eq!(indices, vec![1, 2]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn empty_batch_is_invalid() {
        let repo = MemRepository::new().with_batch(batch("b1", 30, vec![]));
        let err = engine(repo).generate(&"b1".into()).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn generation_is_deterministic() {
        fn make_repo() -> MemRepository {
            MemRepository::new()
                .with_batch(batch(
                    "b1",
                    45,
                    vec![
                        bound(
                            subject("math", "MATH", SubjectKind::Theory, 4),
                            faculty("f1"),
                        ),
                        bound(subject("lab", "LAB", SubjectKind::Lab, 3), faculty("f2")),
                        bound(
                            subject("sem", "SEM", SubjectKind::Seminar, 2),
                            faculty("f1"),
                        ),
                        bound(
                            subject("prac", "PRAC", SubjectKind::Practical, 2),
                            faculty("f3"),
                        ),
                    ],
                ))
                .with_classroom(room("r1", 50, RoomKind::Lecture))
                .with_classroom(room("r2", 60, RoomKind::Seminar))
                .with_classroom(room("lab1", 45, RoomKind::Lab))
                .with_timetable(Timetable {
                    batch: "b0".into(),
                    week_slots: vec![external_placement(
                        DayOfWeek::Mon,
                        "09:00",
                        "10:00",
                        "f1",
                        "elsewhere",
                    )],
                    status: TimetableStatus::Published,
                })
        }

        let first = engine(make_repo()).generate(&"b1".into()).await.unwrap();
        let second = engine(make_repo()).generate(&"b1".into()).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn generated_schedule_passes_external_clash_check() {
        let committed = Timetable {
            batch: "b0".into(),
            week_slots: vec![
                external_placement(DayOfWeek::Mon, "09:00", "10:00", "f1", "r1"),
                external_placement(DayOfWeek::Tue, "13:00", "14:00", "f1", "r1"),
            ],
            status: TimetableStatus::Active,
        };
        let repo = MemRepository::new()
            .with_batch(batch(
                "b1",
                30,
                vec![
                    bound(
                        subject("math", "MATH", SubjectKind::Theory, 5),
                        faculty("f1"),
                    ),
                    bound(subject("lab", "LAB", SubjectKind::Lab, 2), faculty("f2")),
                ],
            ))
            .with_classroom(room("r1", 40, RoomKind::Lecture))
            .with_classroom(room("lab1", 40, RoomKind::Lab))
            .with_timetable(committed.clone());

        let eng = engine(repo);
        let out = eng.generate(&"b1".into()).await.unwrap();

        let index = ConflictIndex::build(eng.grid(), &[committed]);
        assert!(index
            .clashes(eng.grid(), &out.options[0].week_slots)
            .is_empty());
    }
}
