use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq, Hash, PartialOrd, Ord)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}
id_newtype!(BatchId);
id_newtype!(SubjectId);
id_newtype!(FacultyId);
id_newtype!(ClassroomId);

#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl DayOfWeek {
    pub fn as_str(&self) -> &'static str {
        match self {
            DayOfWeek::Mon => "mon",
            DayOfWeek::Tue => "tue",
            DayOfWeek::Wed => "wed",
            DayOfWeek::Thu => "thu",
            DayOfWeek::Fri => "fri",
            DayOfWeek::Sat => "sat",
            DayOfWeek::Sun => "sun",
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SlotLabel {
    Morning,
    Afternoon,
    Evening,
}

/// Subject delivery kind. A `lab` is scheduled as one contiguous block of
/// `hours_per_week` slots; every other kind as independent 1-hour blocks.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    Theory,
    Lab,
    Practical,
    Seminar,
}

impl SubjectKind {
    pub fn is_lab(&self) -> bool {
        matches!(self, SubjectKind::Lab)
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RoomKind {
    Lecture,
    Lab,
    Seminar,
}

impl fmt::Display for RoomKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RoomKind::Lecture => "lecture",
            RoomKind::Lab => "lab",
            RoomKind::Seminar => "seminar",
        })
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TimetableStatus {
    Draft,
    Active,
    Published,
}

impl TimetableStatus {
    /// Only committed timetables block other batches.
    pub fn is_committed(&self) -> bool {
        matches!(self, TimetableStatus::Active | TimetableStatus::Published)
    }
}

/// One 1-hour teaching slot. Identity on the wire is the `start` string.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct SlotSpec {
    pub start: String,
    pub end: String,
    pub label: SlotLabel,
}

impl SlotSpec {
    pub fn new(start: &str, end: &str, label: SlotLabel) -> Self {
        Self {
            start: start.to_string(),
            end: end.to_string(),
            label,
        }
    }
}

/// Weekly time grid configuration. The lunch break sits between slot
/// `lunch_boundary_index - 1` and slot `lunch_boundary_index`.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GridConfig {
    #[serde(default = "GridConfig::default_days")]
    pub days: Vec<DayOfWeek>,
    #[serde(default = "GridConfig::default_slots")]
    pub slots: Vec<SlotSpec>,
    #[serde(default = "GridConfig::default_lunch_boundary")]
    pub lunch_boundary_index: usize,
}

impl GridConfig {
    fn default_days() -> Vec<DayOfWeek> {
        vec![
            DayOfWeek::Mon,
            DayOfWeek::Tue,
            DayOfWeek::Wed,
            DayOfWeek::Thu,
            DayOfWeek::Fri,
        ]
    }

    fn default_slots() -> Vec<SlotSpec> {
        vec![
            SlotSpec::new("09:00", "10:00", SlotLabel::Morning),
            SlotSpec::new("10:00", "11:00", SlotLabel::Morning),
            SlotSpec::new("11:00", "12:00", SlotLabel::Morning),
            SlotSpec::new("13:00", "14:00", SlotLabel::Afternoon),
            SlotSpec::new("14:00", "15:00", SlotLabel::Afternoon),
            SlotSpec::new("15:00", "16:00", SlotLabel::Afternoon),
            SlotSpec::new("16:00", "17:00", SlotLabel::Evening),
        ]
    }

    fn default_lunch_boundary() -> usize {
        3
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            days: Self::default_days(),
            slots: Self::default_slots(),
            lunch_boundary_index: Self::default_lunch_boundary(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct Classroom {
    pub id: ClassroomId,
    pub name: String,
    pub capacity: u32,
    #[serde(rename = "type")]
    pub kind: RoomKind,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct Faculty {
    pub id: FacultyId,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    pub code: String,
    #[serde(rename = "type")]
    pub kind: SubjectKind,
    pub hours_per_week: u32,
}

/// A subject paired with its assigned faculty. Either half may be missing on
/// the wire; the engine rejects such bindings with their indices.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct SubjectBinding {
    #[serde(default)]
    pub subject: Option<Subject>,
    #[serde(default)]
    pub faculty: Option<Faculty>,
}

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct Batch {
    pub id: BatchId,
    pub name: String,
    pub code: String,
    pub strength: u32,
    #[serde(default)]
    pub bindings: Vec<SubjectBinding>,
}

/// One (day, slot, subject, faculty, classroom) assignment. Multi-hour lab
/// blocks are emitted as one placement per slot. Day names and `HH:MM`
/// strings are the stable wire identifiers.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub day: DayOfWeek,
    pub start_time: String,
    pub end_time: String,
    pub subject: SubjectId,
    pub faculty: FacultyId,
    pub classroom: ClassroomId,
    #[serde(rename = "type")]
    pub kind: SubjectKind,
}

/// A persisted weekly timetable. Only `active` and `published` status is
/// visible to conflict derivation; drafts never block generation.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Timetable {
    pub batch: BatchId,
    pub week_slots: Vec<Placement>,
    pub status: TimetableStatus,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimetableOption {
    pub name: String,
    pub description: String,
    pub week_slots: Vec<Placement>,
}

/// Successful generation result: one or more candidate timetables plus
/// soft-policy warnings and run statistics.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Generated {
    pub options: Vec<TimetableOption>,
    pub warnings: Vec<String>,
    pub stats: serde_json::Value,
}
