//! Event correlation
//!
//! Filters a namespace's event snapshot down to the events that matter for a
//! live diagnosis: warnings (or, when only the unfiltered listing could be
//! fetched, events whose reason mentions an error or failure) that happened
//! recently. Correlation to a resource is an exact match on the involved
//! object's name.

use crate::fetch::EventQuery;
use crate::issue::EventSummary;
use crate::records::EventRecord;
use chrono::{DateTime, Duration, Utc};
use std::cmp::Ordering;

/// Default recency window for actionable events, in seconds
pub const DEFAULT_MAX_EVENT_AGE_SECS: i64 = 3600;

/// Upper bound on events attached to a single issue
pub const DEFAULT_MAX_EVENTS_PER_ISSUE: usize = 20;

/// Filters and ranks events as of a fixed evaluation time
#[derive(Debug, Clone)]
pub struct EventCorrelator {
    now: DateTime<Utc>,
    max_age: Duration,
    query: EventQuery,
}

impl EventCorrelator {
    pub fn new(now: DateTime<Utc>, query: EventQuery) -> Self {
        Self {
            now,
            max_age: Duration::seconds(DEFAULT_MAX_EVENT_AGE_SECS),
            query,
        }
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Whether an event is relevant under the current query mode
    pub fn is_relevant(&self, event: &EventRecord) -> bool {
        if event.event_type == "Warning" {
            return true;
        }
        // Case-sensitive heuristic applied only to the unfiltered listing
        self.query == EventQuery::All
            && (event.reason.contains("Error") || event.reason.contains("Failed"))
    }

    /// Whether an event is recent enough to keep.
    ///
    /// Missing or unparseable timestamps are kept.
    pub fn is_recent(&self, event: &EventRecord) -> bool {
        match parse_timestamp(event) {
            Some(ts) => self.now.signed_duration_since(ts) <= self.max_age,
            None => true,
        }
    }

    /// Relevant, recent events in the namespace, most recent first
    pub fn namespace_events(&self, events: &[EventRecord], limit: usize) -> Vec<EventSummary> {
        self.select(events.iter(), limit)
    }

    /// Relevant, recent events about the named object, most recent first
    pub fn for_resource(
        &self,
        events: &[EventRecord],
        name: &str,
        limit: usize,
    ) -> Vec<EventSummary> {
        self.select(
            events.iter().filter(|e| e.involved_object.name == name),
            limit,
        )
    }

    fn select<'a>(
        &self,
        events: impl Iterator<Item = &'a EventRecord>,
        limit: usize,
    ) -> Vec<EventSummary> {
        let mut kept: Vec<(Option<DateTime<Utc>>, &EventRecord)> = events
            .filter(|e| self.is_relevant(e) && self.is_recent(e))
            .map(|e| (parse_timestamp(e), e))
            .collect();

        // Stable sort: newest first, undated events last in listing order
        kept.sort_by(|(a, _), (b, _)| match (a, b) {
            (Some(a), Some(b)) => b.cmp(a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });

        kept.into_iter()
            .take(limit)
            .map(|(_, e)| summarize(e))
            .collect()
    }
}

fn parse_timestamp(event: &EventRecord) -> Option<DateTime<Utc>> {
    event
        .last_timestamp
        .as_deref()
        .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
        .map(|ts| ts.with_timezone(&Utc))
}

/// Condense an event record into the form attached to issues
pub fn summarize(event: &EventRecord) -> EventSummary {
    EventSummary {
        event_type: event.event_type.clone(),
        reason: event.reason.clone(),
        message: event.message.clone(),
        count: event.count,
        last_seen: event.last_timestamp.clone(),
        object: format!("{}/{}", event.involved_object.kind, event.involved_object.name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::ObjectRef;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn event(object: &str, event_type: &str, reason: &str, ts: Option<&str>) -> EventRecord {
        EventRecord {
            name: format!("{}.{}", object, reason),
            namespace: "default".to_string(),
            event_type: event_type.to_string(),
            reason: reason.to_string(),
            message: format!("{} happened", reason),
            count: 1,
            last_timestamp: ts.map(str::to_string),
            involved_object: ObjectRef {
                kind: "Pod".to_string(),
                name: object.to_string(),
                namespace: "default".to_string(),
            },
        }
    }

    #[test]
    fn test_warning_only_mode_ignores_normal_events() {
        let correlator = EventCorrelator::new(now(), EventQuery::WarningsOnly);
        assert!(correlator.is_relevant(&event("a", "Warning", "BackOff", None)));
        assert!(!correlator.is_relevant(&event("a", "Normal", "FailedMount", None)));
    }

    #[test]
    fn test_all_mode_matches_error_and_failed_reasons() {
        let correlator = EventCorrelator::new(now(), EventQuery::All);
        assert!(correlator.is_relevant(&event("a", "Normal", "FailedScheduling", None)));
        assert!(correlator.is_relevant(&event("a", "Normal", "ImagePullError", None)));
        assert!(!correlator.is_relevant(&event("a", "Normal", "Pulled", None)));
        // Case-sensitive
        assert!(!correlator.is_relevant(&event("a", "Normal", "failedsync", None)));
    }

    #[test]
    fn test_recency_filter() {
        let correlator = EventCorrelator::new(now(), EventQuery::WarningsOnly);
        assert!(correlator.is_recent(&event("a", "Warning", "x", Some("2024-03-01T11:30:00Z"))));
        assert!(correlator.is_recent(&event("a", "Warning", "x", Some("2024-03-01T11:00:00Z"))));
        assert!(!correlator.is_recent(&event("a", "Warning", "x", Some("2024-03-01T10:59:59Z"))));
    }

    #[test]
    fn test_unparseable_timestamps_are_kept() {
        let correlator = EventCorrelator::new(now(), EventQuery::WarningsOnly);
        assert!(correlator.is_recent(&event("a", "Warning", "x", Some("yesterday-ish"))));
        assert!(correlator.is_recent(&event("a", "Warning", "x", None)));
    }

    #[test]
    fn test_for_resource_exact_name_and_ordering() {
        let correlator = EventCorrelator::new(now(), EventQuery::WarningsOnly);
        let events = vec![
            event("web-1", "Warning", "Old", Some("2024-03-01T11:10:00Z")),
            event("web-10", "Warning", "OtherPod", Some("2024-03-01T11:55:00Z")),
            event("web-1", "Warning", "Undated", None),
            event("web-1", "Warning", "Newest", Some("2024-03-01T11:50:00Z")),
            event("web-1", "Warning", "Stale", Some("2024-03-01T09:00:00Z")),
            event("web-1", "Normal", "Started", Some("2024-03-01T11:58:00Z")),
        ];

        let matched = correlator.for_resource(&events, "web-1", 20);
        let reasons: Vec<_> = matched.iter().map(|e| e.reason.as_str()).collect();
        assert_eq!(reasons, vec!["Newest", "Old", "Undated"]);
        assert_eq!(matched[0].object, "Pod/web-1");
    }

    #[test]
    fn test_limit_applies_after_ranking() {
        let correlator = EventCorrelator::new(now(), EventQuery::WarningsOnly);
        let events: Vec<_> = (0..30)
            .map(|i| {
                event(
                    "web-1",
                    "Warning",
                    &format!("R{}", i),
                    Some(&format!("2024-03-01T11:{:02}:00Z", i)),
                )
            })
            .collect();

        let matched = correlator.for_resource(&events, "web-1", DEFAULT_MAX_EVENTS_PER_ISSUE);
        assert_eq!(matched.len(), 20);
        assert_eq!(matched[0].reason, "R29");
        assert_eq!(matched[19].reason, "R10");
    }

    #[test]
    fn test_custom_max_age() {
        let correlator =
            EventCorrelator::new(now(), EventQuery::WarningsOnly).with_max_age(Duration::minutes(5));
        let events = vec![
            event("a", "Warning", "Recent", Some("2024-03-01T11:58:00Z")),
            event("b", "Warning", "Older", Some("2024-03-01T11:30:00Z")),
        ];
        let kept = correlator.namespace_events(&events, 50);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].reason, "Recent");
    }
}
