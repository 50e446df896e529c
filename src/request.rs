//! Boundary types: what the booking form and calendar UI send, parsed into
//! epoch-ms spans and typed filters. All wall-clock interpretation happens
//! here, in the school's local timezone.

use chrono::{Local, NaiveDate, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::engine::ReservationError;
use crate::model::{Ms, Span};

/// A reservation submission as the booking form sends it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub resource_id: String,
    pub requester_name: String,
    pub requester_group: String,
    pub purpose: String,
    /// ISO date, `YYYY-MM-DD`.
    pub date: String,
    /// `HH:MM`, local time.
    pub start_time: String,
    /// `HH:MM`, local time. Exclusive.
    pub end_time: String,
}

impl BookingRequest {
    /// Parse the date/time fields into a half-open epoch-ms span.
    /// Inverted or zero-length windows are rejected here, before any
    /// conflict logic runs.
    pub fn parse_span(&self) -> Result<Span, ReservationError> {
        let date = parse_date(&self.date)?;
        let start = local_ms(date, parse_time(&self.start_time)?)?;
        let end = local_ms(date, parse_time(&self.end_time)?)?;
        if start >= end {
            return Err(ReservationError::Validation("start must be before end"));
        }
        Ok(Span::new(start, end))
    }
}

pub fn parse_date(s: &str) -> Result<NaiveDate, ReservationError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| ReservationError::Validation("malformed date, expected YYYY-MM-DD"))
}

fn parse_time(s: &str) -> Result<NaiveTime, ReservationError> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .map_err(|_| ReservationError::Validation("malformed time, expected HH:MM"))
}

fn local_ms(date: NaiveDate, time: NaiveTime) -> Result<Ms, ReservationError> {
    Local
        .from_local_datetime(&date.and_time(time))
        .earliest()
        .map(|dt| dt.timestamp_millis())
        .ok_or(ReservationError::Validation(
            "time does not exist in the local timezone",
        ))
}

/// The half-open epoch-ms span covering one local calendar day. This is the
/// "same day" test for calendar views — interval math, not string equality.
pub fn local_day_span(date: NaiveDate) -> Result<Span, ReservationError> {
    let next = date
        .succ_opt()
        .ok_or(ReservationError::Validation("date out of range"))?;
    let midnight = NaiveTime::from_hms_opt(0, 0, 0).expect("midnight is valid");
    let start = local_ms(date, midnight)?;
    let end = local_ms(next, midnight)?;
    Ok(Span::new(start, end))
}

/// A calendar query as the UI sends it: an ISO date plus filter strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarQuery {
    pub date: String,
    /// Subset of {"academic", "facility"}.
    pub categories: Vec<String>,
    /// "X" | "XI" | "XII" | "all"; absent means all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub academic_level: Option<String>,
    /// One of the resource kind labels; absent means any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facility_kind: Option<String>,
}
