use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::Interval;

/// How a rejected booking relates to the reservations it collided with.
/// One label is surfaced per request, computed over the whole conflict set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictLabel {
    Exact,
    Within,
    Contains,
    Overlaps,
}

impl ConflictLabel {
    /// Human wording used in conflict messages ("your booking ... existing
    /// booking(s)").
    pub fn as_phrase(self) -> &'static str {
        match self {
            ConflictLabel::Exact => "exactly matches",
            ConflictLabel::Within => "is within",
            ConflictLabel::Contains => "contains",
            ConflictLabel::Overlaps => "overlaps with",
        }
    }
}

impl fmt::Display for ConflictLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConflictLabel::Exact => "exact",
            ConflictLabel::Within => "within",
            ConflictLabel::Contains => "contains",
            ConflictLabel::Overlaps => "overlaps",
        };
        f.write_str(label)
    }
}

/// One existing booking intersecting a proposed interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictRecord {
    pub id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub owner_id: Uuid,
    /// Whether the conflicting booking belongs to the requesting user.
    pub owned_by_requester: bool,
}

/// The full conflict set for a rejected create, ordered by the existing
/// bookings' start times, plus the aggregate label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictReport {
    pub label: ConflictLabel,
    pub conflicts: Vec<ConflictRecord>,
}

impl ConflictReport {
    pub fn new(candidate: &Interval, conflicts: Vec<ConflictRecord>) -> Self {
        Self {
            label: classify(candidate, &conflicts),
            conflicts,
        }
    }
}

/// Classify a candidate interval against its conflict set with explicit
/// precedence: exact > within > contains > overlaps.
pub fn classify(candidate: &Interval, conflicts: &[ConflictRecord]) -> ConflictLabel {
    if conflicts
        .iter()
        .any(|c| c.start_time == candidate.start && c.end_time == candidate.end)
    {
        ConflictLabel::Exact
    } else if conflicts
        .iter()
        .any(|c| c.start_time <= candidate.start && c.end_time >= candidate.end)
    {
        ConflictLabel::Within
    } else if conflicts
        .iter()
        .any(|c| candidate.start <= c.start_time && candidate.end >= c.end_time)
    {
        ConflictLabel::Contains
    } else {
        ConflictLabel::Overlaps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interval(start: &str, end: &str) -> Interval {
        Interval::new(start.parse().unwrap(), end.parse().unwrap()).unwrap()
    }

    fn record(start: &str, end: &str) -> ConflictRecord {
        ConflictRecord {
            id: Uuid::new_v4(),
            start_time: start.parse().unwrap(),
            end_time: end.parse().unwrap(),
            owner_id: Uuid::new_v4(),
            owned_by_requester: false,
        }
    }

    #[test]
    fn identical_bounds_classify_as_exact() {
        let candidate = interval("2025-03-15T10:00:00Z", "2025-03-15T11:00:00Z");
        let conflicts = [record("2025-03-15T10:00:00Z", "2025-03-15T11:00:00Z")];
        assert_eq!(classify(&candidate, &conflicts), ConflictLabel::Exact);
    }

    #[test]
    fn candidate_inside_existing_classifies_as_within() {
        let candidate = interval("2025-03-15T10:30:00Z", "2025-03-15T10:45:00Z");
        let conflicts = [record("2025-03-15T10:00:00Z", "2025-03-15T11:00:00Z")];
        assert_eq!(classify(&candidate, &conflicts), ConflictLabel::Within);
    }

    #[test]
    fn candidate_swallowing_existing_classifies_as_contains() {
        let candidate = interval("2025-03-15T09:00:00Z", "2025-03-15T11:00:00Z");
        let conflicts = [record("2025-03-15T10:00:00Z", "2025-03-15T10:30:00Z")];
        assert_eq!(classify(&candidate, &conflicts), ConflictLabel::Contains);
    }

    #[test]
    fn partial_intersection_falls_back_to_overlaps() {
        let candidate = interval("2025-03-15T10:30:00Z", "2025-03-15T11:30:00Z");
        let conflicts = [record("2025-03-15T10:00:00Z", "2025-03-15T11:00:00Z")];
        assert_eq!(classify(&candidate, &conflicts), ConflictLabel::Overlaps);
    }

    #[test]
    fn exact_wins_over_every_other_relation() {
        let candidate = interval("2025-03-15T10:00:00Z", "2025-03-15T11:00:00Z");
        let conflicts = [
            // partial overlap
            record("2025-03-15T09:30:00Z", "2025-03-15T10:30:00Z"),
            // contains the candidate
            record("2025-03-15T09:00:00Z", "2025-03-15T12:00:00Z"),
            // exact match, listed last on purpose
            record("2025-03-15T10:00:00Z", "2025-03-15T11:00:00Z"),
        ];
        assert_eq!(classify(&candidate, &conflicts), ConflictLabel::Exact);
    }

    #[test]
    fn within_wins_over_contains() {
        let candidate = interval("2025-03-15T10:00:00Z", "2025-03-15T11:00:00Z");
        let conflicts = [
            // contained by the candidate
            record("2025-03-15T10:15:00Z", "2025-03-15T10:45:00Z"),
            // contains the candidate
            record("2025-03-15T09:00:00Z", "2025-03-15T12:00:00Z"),
        ];
        assert_eq!(classify(&candidate, &conflicts), ConflictLabel::Within);
    }

    #[test]
    fn report_keeps_conflict_order() {
        let candidate = interval("2025-03-15T10:00:00Z", "2025-03-15T12:00:00Z");
        let first = record("2025-03-15T09:30:00Z", "2025-03-15T10:30:00Z");
        let second = record("2025-03-15T11:30:00Z", "2025-03-15T12:30:00Z");
        let report = ConflictReport::new(&candidate, vec![first.clone(), second.clone()]);
        assert_eq!(report.conflicts, vec![first, second]);
        assert_eq!(report.label, ConflictLabel::Overlaps);
    }
}
