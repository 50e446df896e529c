//! Hard input limits. Requests over these are rejected outright.

use crate::model::Ms;

pub const MAX_NAME_LEN: usize = 120;
pub const MAX_GROUP_LEN: usize = 40;
pub const MAX_PURPOSE_LEN: usize = 280;

/// Timestamps must land in [1970, 2100).
pub const MIN_VALID_TIMESTAMP_MS: Ms = 0;
pub const MAX_VALID_TIMESTAMP_MS: Ms = 4_102_444_800_000;

/// A reservation window never crosses a calendar day at the form boundary,
/// so a full day is the widest representable span.
pub const MAX_SPAN_DURATION_MS: Ms = 86_400_000;

/// Date-range listings are capped at one school year.
pub const MAX_QUERY_WINDOW_MS: Ms = 366 * 86_400_000;

pub const MAX_RESERVATIONS_PER_RESOURCE: usize = 10_000;
