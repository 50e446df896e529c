//! The sole authority on booking validity: a pure overlap scan over a
//! resource's committed reservations. Advisory commentary never feeds into
//! this decision.

use crate::limits::*;
use crate::model::{Ms, Reservation, ResourceState, Span};

use super::ReservationError;

pub(crate) fn now_ms() -> Ms {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as Ms
}

pub(crate) fn validate_span(span: &Span) -> Result<(), ReservationError> {
    if span.start < MIN_VALID_TIMESTAMP_MS || span.end > MAX_VALID_TIMESTAMP_MS {
        return Err(ReservationError::LimitExceeded("timestamp out of range"));
    }
    if span.duration_ms() > MAX_SPAN_DURATION_MS {
        return Err(ReservationError::LimitExceeded("window too wide"));
    }
    Ok(())
}

/// First committed reservation overlapping `span`, in start-ascending order,
/// or `None` when the window is free. Pure: no side effects, identical inputs
/// give identical output, so callers may re-run it freely.
pub fn first_conflict<'a>(rs: &'a ResourceState, span: &Span) -> Option<&'a Reservation> {
    rs.overlapping(span).next()
}
