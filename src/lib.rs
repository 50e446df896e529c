//! Facility reservation core for a school portal: a conflict-checked booking
//! engine over a seeded resource catalog, plus a merged calendar projection
//! overlaying reservations with the academic-event feed.

pub mod advisory;
pub mod calendar;
pub mod catalog;
pub mod engine;
pub mod limits;
pub mod model;
pub mod notify;
pub mod observability;
pub mod request;
pub mod wal;

pub use advisory::{AdvisoryAnnotator, NoopAnnotator};
pub use calendar::{AcademicEventSource, CalendarAggregator, CalendarDayView, CalendarFilter};
pub use catalog::{Resource, ResourceCatalog};
pub use engine::{Engine, Receipt, ReservationError};
pub use model::{AcademicEvent, AcademicLevel, Reservation, ResourceKind, Span};
pub use notify::{Notice, NotifyHub};
pub use request::{BookingRequest, CalendarQuery};
