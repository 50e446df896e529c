use crate::limits::*;
use crate::model::{Ms, Reservation, Span};

use super::{Engine, ReservationError};

impl Engine {
    /// All committed reservations on one resource, start-ascending. An
    /// unknown resource yields an empty list — absence is not an error.
    pub async fn list_by_resource(&self, resource_id: &str) -> Vec<Reservation> {
        let Some(rs) = self.resource_state(resource_id) else {
            return Vec::new();
        };
        let guard = rs.read().await;
        guard.reservations.clone()
    }

    /// Reservations (across all resources) whose interval intersects
    /// `[start, end)`, ordered by start time. Ties break on reservation id so
    /// the order is stable for equal starts.
    pub async fn list_by_date_range(
        &self,
        start: Ms,
        end: Ms,
    ) -> Result<Vec<Reservation>, ReservationError> {
        if start >= end {
            return Err(ReservationError::Validation("empty query range"));
        }
        if end - start > MAX_QUERY_WINDOW_MS {
            return Err(ReservationError::LimitExceeded("query window too wide"));
        }
        let query = Span::new(start, end);

        // Snapshot the Arcs first; awaiting a read lock while holding a
        // DashMap ref would block writers on the same shard.
        let states: Vec<_> = self.state.iter().map(|e| e.value().clone()).collect();

        let mut hits = Vec::new();
        for rs in states {
            let guard = rs.read().await;
            hits.extend(guard.overlapping(&query).cloned());
        }
        hits.sort_by(|a, b| {
            a.span
                .start
                .cmp(&b.span.start)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(hits)
    }
}
