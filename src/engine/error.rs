use chrono::{Local, TimeZone};
use ulid::Ulid;

use crate::model::{Ms, Span};

/// Summary of the reservation a rejected request collided with, surfaced so
/// the requester can pick another window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictInfo {
    pub reservation_id: Ulid,
    pub resource_id: String,
    pub resource_name: String,
    pub span: Span,
    pub requester_group: String,
}

#[derive(Debug)]
pub enum ReservationError {
    /// resource_id does not resolve in the catalog.
    ResourceNotFound(String),
    /// Malformed date/time input or inverted interval.
    Validation(&'static str),
    /// Input over a hard limit.
    LimitExceeded(&'static str),
    /// Overlap with a committed reservation. Retriable with a new window.
    Conflict(ConflictInfo),
    /// The durable commit could not complete. Transient; the whole submit may
    /// be retried and will re-run the atomic check-then-write.
    Persistence(String),
}

pub(crate) fn fmt_local(ms: Ms) -> String {
    match Local.timestamp_millis_opt(ms).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => format!("{ms}ms"),
    }
}

impl std::fmt::Display for ReservationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReservationError::ResourceNotFound(id) => write!(f, "unknown resource: {id}"),
            ReservationError::Validation(msg) => write!(f, "invalid request: {msg}"),
            ReservationError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            ReservationError::Conflict(info) => write!(
                f,
                "schedule conflict on {} ({}): already reserved {} – {} by {}",
                info.resource_name,
                info.resource_id,
                fmt_local(info.span.start),
                fmt_local(info.span.end),
                info.requester_group,
            ),
            ReservationError::Persistence(e) => write!(f, "commit failed: {e}"),
        }
    }
}

impl std::error::Error for ReservationError {}
