//! Merged per-day calendar projection: independently scheduled academic
//! events overlaid with facility reservations, under user-selected filters.
//! Read-only and restartable; a view never mutates the stores it reads.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::engine::{Engine, ReservationError};
use crate::model::{AcademicEvent, AcademicLevel, LevelScope, Reservation, ResourceKind};
use crate::observability;
use crate::request::{self, CalendarQuery};

/// Items shown per day cell before collapsing into an overflow counter.
pub const DEFAULT_DISPLAY_CAP: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarCategory {
    Academic,
    Facility,
}

impl CalendarCategory {
    pub fn from_label(s: &str) -> Option<Self> {
        match s {
            "academic" => Some(CalendarCategory::Academic),
            "facility" => Some(CalendarCategory::Facility),
            _ => None,
        }
    }
}

/// Active filter set for a day view.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarFilter {
    pub categories: Vec<CalendarCategory>,
    pub level: LevelScope,
    pub facility_kind: Option<ResourceKind>,
}

impl Default for CalendarFilter {
    fn default() -> Self {
        Self {
            categories: vec![CalendarCategory::Academic, CalendarCategory::Facility],
            level: LevelScope::All,
            facility_kind: None,
        }
    }
}

impl CalendarFilter {
    /// Parse a raw UI query into a date plus typed filter.
    pub fn from_query(q: &CalendarQuery) -> Result<(NaiveDate, CalendarFilter), ReservationError> {
        let date = request::parse_date(&q.date)?;

        let mut categories = Vec::new();
        for raw in &q.categories {
            let cat = CalendarCategory::from_label(raw)
                .ok_or(ReservationError::Validation("unknown calendar category"))?;
            if !categories.contains(&cat) {
                categories.push(cat);
            }
        }

        let level = match q.academic_level.as_deref() {
            None | Some("all") => LevelScope::All,
            Some(raw) => AcademicLevel::from_label(raw)
                .map(LevelScope::Level)
                .ok_or(ReservationError::Validation("unknown academic level"))?,
        };

        let facility_kind = match q.facility_kind.as_deref() {
            None => None,
            Some(raw) => Some(
                ResourceKind::from_label(raw)
                    .ok_or(ReservationError::Validation("unknown facility kind"))?,
            ),
        };

        Ok((date, CalendarFilter { categories, level, facility_kind }))
    }

    fn includes(&self, category: CalendarCategory) -> bool {
        self.categories.contains(&category)
    }

    fn admits_reservation(&self, r: &Reservation) -> bool {
        if let Some(kind) = self.facility_kind
            && r.resource_kind != kind
        {
            return false;
        }
        match self.level {
            LevelScope::All => true,
            LevelScope::Level(level) => r.academic_level == Some(level),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CalendarItem {
    Academic(AcademicEvent),
    Facility(Reservation),
}

/// One day cell: the visible items plus how many were hidden by the display
/// cap. Derived on demand, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarDayView {
    pub date: NaiveDate,
    pub items: Vec<CalendarItem>,
    pub overflow: usize,
}

/// The academic-event feed. Scheduled elsewhere; this core only reads it.
#[async_trait]
pub trait AcademicEventSource: Send + Sync {
    async fn events_on(&self, date: NaiveDate) -> Vec<AcademicEvent>;
}

/// Fixed in-memory feed.
pub struct StaticEventSource {
    events: Vec<AcademicEvent>,
}

impl StaticEventSource {
    pub fn new(events: Vec<AcademicEvent>) -> Self {
        Self { events }
    }
}

#[async_trait]
impl AcademicEventSource for StaticEventSource {
    async fn events_on(&self, date: NaiveDate) -> Vec<AcademicEvent> {
        self.events.iter().filter(|e| e.date == date).cloned().collect()
    }
}

/// Merges the academic feed with the reservation store into day views.
/// Holds no state of its own; safe to share across any number of readers.
pub struct CalendarAggregator {
    engine: Arc<Engine>,
    source: Arc<dyn AcademicEventSource>,
    display_cap: usize,
}

impl CalendarAggregator {
    pub fn new(engine: Arc<Engine>, source: Arc<dyn AcademicEventSource>) -> Self {
        Self {
            engine,
            source,
            display_cap: DEFAULT_DISPLAY_CAP,
        }
    }

    pub fn with_display_cap(mut self, cap: usize) -> Self {
        self.display_cap = cap;
        self
    }

    /// The day's matching items: academic events first, then reservations,
    /// each in fetch order, truncated to the display cap with an overflow
    /// count. Identical inputs give identical output.
    pub async fn view(
        &self,
        date: NaiveDate,
        filter: &CalendarFilter,
    ) -> Result<CalendarDayView, ReservationError> {
        metrics::counter!(observability::CALENDAR_VIEWS_TOTAL).increment(1);

        let mut items = Vec::new();

        if filter.includes(CalendarCategory::Academic) {
            for event in self.source.events_on(date).await {
                if filter.level.admits(&event.level) {
                    items.push(CalendarItem::Academic(event));
                }
            }
        }

        if filter.includes(CalendarCategory::Facility) {
            let day = request::local_day_span(date)?;
            for reservation in self.engine.list_by_date_range(day.start, day.end).await? {
                if filter.admits_reservation(&reservation) {
                    items.push(CalendarItem::Facility(reservation));
                }
            }
        }

        let overflow = items.len().saturating_sub(self.display_cap);
        items.truncate(self.display_cap);

        Ok(CalendarDayView { date, items, overflow })
    }
}
