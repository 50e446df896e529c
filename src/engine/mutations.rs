use std::time::Instant;

use ulid::Ulid;

use crate::advisory::annotate_best_effort;
use crate::limits::*;
use crate::model::{Event, Span};
use crate::notify::{Notice, NoticeKind};
use crate::observability;
use crate::request::BookingRequest;

use super::conflict::{first_conflict, now_ms, validate_span};
use super::error::{ConflictInfo, fmt_local};
use super::{Engine, ReservationError};

/// What a successful submission returns: the committed reservation id plus
/// the (non-authoritative) advisory commentary gathered along the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub id: Ulid,
    pub advisory: String,
}

impl Engine {
    /// Accept or reject a reservation request.
    ///
    /// Resolve the resource, validate the window, gather advisory commentary,
    /// then re-check for conflicts and commit under the resource's write
    /// lock. Exactly one reservation is persisted, or none. Safe to call
    /// concurrently: overlapping submissions on one resource serialize on the
    /// lock and at most one of them commits.
    pub async fn submit(&self, req: &BookingRequest) -> Result<Receipt, ReservationError> {
        let started = Instant::now();
        let result = self.submit_inner(req).await;

        let status = match &result {
            Ok(_) => "ok",
            Err(ReservationError::ResourceNotFound(_)) => "not_found",
            Err(ReservationError::Validation(_)) => "validation",
            Err(ReservationError::LimitExceeded(_)) => "limit",
            Err(ReservationError::Conflict(_)) => "conflict",
            Err(ReservationError::Persistence(_)) => "persistence",
        };
        metrics::counter!(observability::SUBMISSIONS_TOTAL, "status" => status).increment(1);
        metrics::histogram!(observability::SUBMIT_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());
        result
    }

    async fn submit_inner(&self, req: &BookingRequest) -> Result<Receipt, ReservationError> {
        let resource = self
            .catalog
            .get(&req.resource_id)
            .ok_or_else(|| ReservationError::ResourceNotFound(req.resource_id.clone()))?
            .clone();

        if req.requester_name.is_empty() || req.requester_name.len() > MAX_NAME_LEN {
            return Err(ReservationError::LimitExceeded("requester name length"));
        }
        if req.requester_group.len() > MAX_GROUP_LEN {
            return Err(ReservationError::LimitExceeded("requester group length"));
        }
        if req.purpose.len() > MAX_PURPOSE_LEN {
            return Err(ReservationError::LimitExceeded("purpose too long"));
        }
        let span = req.parse_span()?;
        validate_span(&span)?;

        // Commentary only. Gathered before the lock, never consulted for the
        // decision, and any failure inside degrades to a canned note.
        let advisory = {
            let candidate = format!(
                "{} ({}) {} – {} for {} by {} ({})",
                resource.name,
                resource.id,
                fmt_local(span.start),
                fmt_local(span.end),
                req.purpose,
                req.requester_name,
                req.requester_group,
            );
            let existing = self.describe_nearby(&resource.id, &span).await;
            annotate_best_effort(self.advisory.as_ref(), &candidate, &existing).await
        };

        let rs = self
            .resource_state(&resource.id)
            .ok_or_else(|| ReservationError::ResourceNotFound(resource.id.clone()))?;
        let mut guard = rs.write().await;

        if guard.reservations.len() >= MAX_RESERVATIONS_PER_RESOURCE {
            return Err(ReservationError::LimitExceeded(
                "too many reservations on resource",
            ));
        }

        // The lock is held from here through the WAL ack, so this check and
        // the insert below are indivisible per resource.
        if let Some(existing) = first_conflict(&guard, &span) {
            metrics::counter!(observability::CONFLICTS_TOTAL).increment(1);
            tracing::info!(
                resource_id = %resource.id,
                winner = %existing.id,
                "submission rejected: window already reserved"
            );
            return Err(ReservationError::Conflict(ConflictInfo {
                reservation_id: existing.id,
                resource_id: existing.resource_id.clone(),
                resource_name: resource.name.clone(),
                span: existing.span,
                requester_group: existing.requester_group.clone(),
            }));
        }

        let id = Ulid::new();
        let event = Event::ReservationCommitted {
            id,
            resource_id: resource.id.clone(),
            resource_kind: resource.kind,
            requester_name: req.requester_name.clone(),
            requester_group: req.requester_group.clone(),
            purpose: req.purpose.clone(),
            span,
            academic_level: resource.academic_level,
        };
        self.wal_append(&event).await?;
        super::apply_to_resource(&mut guard, &event);
        drop(guard);

        self.send_booking_notice(&resource.id, &resource.name, &req.requester_name, &span);
        tracing::info!(reservation_id = %id, resource_id = %resource.id, "reservation committed");

        Ok(Receipt { id, advisory })
    }

    /// Same-day reservations on the resource, rendered for the annotator.
    async fn describe_nearby(&self, resource_id: &str, span: &Span) -> String {
        let Some(rs) = self.resource_state(resource_id) else {
            return String::new();
        };
        let guard = rs.read().await;
        let window = Span::new(span.start - MAX_SPAN_DURATION_MS, span.end + MAX_SPAN_DURATION_MS);
        let lines: Vec<String> = guard
            .overlapping(&window)
            .map(|r| {
                format!(
                    "{} {} – {} ({})",
                    r.resource_id,
                    fmt_local(r.span.start),
                    fmt_local(r.span.end),
                    r.requester_group,
                )
            })
            .collect();
        lines.join("; ")
    }

    fn send_booking_notice(&self, resource_id: &str, resource_name: &str, requester: &str, span: &Span) {
        let notice = Notice {
            kind: NoticeKind::Booking,
            title: "Booking Successful".into(),
            message: format!(
                "{} reserved for {}: {} – {}",
                resource_name,
                requester,
                fmt_local(span.start),
                fmt_local(span.end),
            ),
            timestamp: now_ms(),
        };
        metrics::counter!(observability::NOTICES_TOTAL).increment(1);
        self.notify.send(resource_id, notice);
    }
}
