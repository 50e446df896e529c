use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unix milliseconds — the only internal time type. Wall-clock values exist
/// only at the request boundary.
pub type Ms = i64;

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Ms,
    pub end: Ms,
}

impl Span {
    pub fn new(start: Ms, end: Ms) -> Self {
        debug_assert!(start < end, "Span start must be before end");
        Self { start, end }
    }

    pub fn duration_ms(&self) -> Ms {
        self.end - self.start
    }

    /// Two spans conflict iff they overlap. Touching boundaries
    /// (`a.end == b.start`) do not.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// What a bookable asset is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    Classroom,
    Laboratory,
    Field,
    Hall,
    Library,
    ReligiousSpace,
    CommonArea,
    Equipment,
}

impl ResourceKind {
    pub fn as_label(&self) -> &'static str {
        match self {
            ResourceKind::Classroom => "classroom",
            ResourceKind::Laboratory => "laboratory",
            ResourceKind::Field => "field",
            ResourceKind::Hall => "hall",
            ResourceKind::Library => "library",
            ResourceKind::ReligiousSpace => "religious-space",
            ResourceKind::CommonArea => "common-area",
            ResourceKind::Equipment => "equipment",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        match s {
            "classroom" => Some(ResourceKind::Classroom),
            "laboratory" => Some(ResourceKind::Laboratory),
            "field" => Some(ResourceKind::Field),
            "hall" => Some(ResourceKind::Hall),
            "library" => Some(ResourceKind::Library),
            "religious-space" => Some(ResourceKind::ReligiousSpace),
            "common-area" => Some(ResourceKind::CommonArea),
            "equipment" => Some(ResourceKind::Equipment),
            _ => None,
        }
    }
}

/// Senior-high grade level. Carried by classrooms and inherited by their
/// reservations; other resource kinds have none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcademicLevel {
    X,
    XI,
    XII,
}

impl AcademicLevel {
    pub fn as_label(&self) -> &'static str {
        match self {
            AcademicLevel::X => "X",
            AcademicLevel::XI => "XI",
            AcademicLevel::XII => "XII",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        match s {
            "X" => Some(AcademicLevel::X),
            "XI" => Some(AcademicLevel::XI),
            "XII" => Some(AcademicLevel::XII),
            _ => None,
        }
    }
}

/// Level scope for academic events and calendar filters: a specific grade or
/// everyone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelScope {
    All,
    Level(AcademicLevel),
}

impl LevelScope {
    /// "All" on either side matches everything.
    pub fn admits(&self, other: &LevelScope) -> bool {
        match (self, other) {
            (LevelScope::All, _) | (_, LevelScope::All) => true,
            (LevelScope::Level(a), LevelScope::Level(b)) => a == b,
        }
    }
}

/// A committed claim on one resource for one time window. Never mutated after
/// commit; `resource_kind` and `academic_level` are denormalized from the
/// catalog at commit time so display needs no join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Ulid,
    pub resource_id: String,
    pub resource_kind: ResourceKind,
    pub requester_name: String,
    pub requester_group: String,
    pub purpose: String,
    pub span: Span,
    pub academic_level: Option<AcademicLevel>,
}

/// Category of an independently scheduled academic calendar item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventCategory {
    Exam,
    Assignment,
    Info,
    Activity,
    Meeting,
    Holiday,
}

/// An academic calendar item (exam, activity, holiday). Read-only input to
/// the calendar view; never part of the reservation write path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcademicEvent {
    pub date: NaiveDate,
    pub title: String,
    pub level: LevelScope,
    pub category: EventCategory,
}

/// WAL record format — flat, no nesting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    ReservationCommitted {
        id: Ulid,
        resource_id: String,
        resource_kind: ResourceKind,
        requester_name: String,
        requester_group: String,
        purpose: String,
        span: Span,
        academic_level: Option<AcademicLevel>,
    },
}

impl Event {
    pub fn resource_id(&self) -> &str {
        match self {
            Event::ReservationCommitted { resource_id, .. } => resource_id,
        }
    }
}

/// Per-resource committed reservations, kept sorted by `span.start`.
#[derive(Debug, Clone)]
pub struct ResourceState {
    pub resource_id: String,
    pub reservations: Vec<Reservation>,
}

impl ResourceState {
    pub fn new(resource_id: String) -> Self {
        Self {
            resource_id,
            reservations: Vec::new(),
        }
    }

    /// Insert maintaining sort order by span.start.
    pub fn insert_reservation(&mut self, reservation: Reservation) {
        let pos = self
            .reservations
            .binary_search_by_key(&reservation.span.start, |r| r.span.start)
            .unwrap_or_else(|e| e);
        self.reservations.insert(pos, reservation);
    }

    /// Reservations whose span overlaps the query window, in start order.
    /// Binary search skips everything starting at or after `query.end`.
    pub fn overlapping(&self, query: &Span) -> impl Iterator<Item = &Reservation> {
        let right_bound = self
            .reservations
            .partition_point(|r| r.span.start < query.end);
        self.reservations[..right_bound]
            .iter()
            .filter(move |r| r.span.end > query.start)
    }
}
