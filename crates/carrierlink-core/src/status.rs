//! Provider status vocabulary normalization
//!
//! Carriers report free-form status strings. Each adapter owns an ordered
//! table of `(substring, status)` rules; the first rule whose substring
//! occurs in the lowercased provider string wins. Strings no rule matches
//! map to [`ShipmentStatus::Created`] instead of failing.

use std::cmp::Ordering;

use crate::types::{ShipmentStatus, TrackingEvent};

/// A single substring rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusRule {
    /// Lowercase substring to look for
    pub needle: &'static str,
    pub status: ShipmentStatus,
}

const fn rule(needle: &'static str, status: ShipmentStatus) -> StatusRule {
    StatusRule { needle, status }
}

/// Ordered rule table; earlier rules take precedence
#[derive(Debug, Clone, Copy)]
pub struct StatusRules(pub &'static [StatusRule]);

impl StatusRules {
    /// Map a provider status string onto the canonical lifecycle
    pub fn normalize(&self, raw: &str) -> ShipmentStatus {
        self.matching_rule(raw)
            .map(|r| r.status)
            .unwrap_or(ShipmentStatus::Created)
    }

    /// The rule that decides `raw`, if any
    pub fn matching_rule(&self, raw: &str) -> Option<&'static StatusRule> {
        let lowered = raw.to_lowercase();
        if lowered.trim().is_empty() {
            return None;
        }
        self.0.iter().find(|r| lowered.contains(r.needle))
    }

    pub fn rules(&self) -> &'static [StatusRule] {
        self.0
    }
}

/// Shiprocket status vocabulary
///
/// Order: delivered, in transit, picked up, label created, then
/// cancelled and exception. Strings such as "Cancelled - In Transit
/// Reversal" therefore resolve to in transit.
pub const SHIPROCKET_STATUS_RULES: StatusRules = StatusRules(&[
    rule("delivered", ShipmentStatus::Delivered),
    rule("in transit", ShipmentStatus::InTransit),
    rule("in-transit", ShipmentStatus::InTransit),
    rule("intransit", ShipmentStatus::InTransit),
    rule("out for delivery", ShipmentStatus::InTransit),
    rule("reached at", ShipmentStatus::InTransit),
    rule("shipped", ShipmentStatus::InTransit),
    rule("dispatched", ShipmentStatus::InTransit),
    rule("picked up", ShipmentStatus::PickedUp),
    rule("pickup done", ShipmentStatus::PickedUp),
    rule("picked", ShipmentStatus::PickedUp),
    rule("label", ShipmentStatus::LabelCreated),
    rule("manifest", ShipmentStatus::LabelCreated),
    rule("awb assigned", ShipmentStatus::LabelCreated),
    rule("pickup scheduled", ShipmentStatus::LabelCreated),
    rule("pickup queued", ShipmentStatus::LabelCreated),
    rule("pickup generated", ShipmentStatus::LabelCreated),
    rule("ready to ship", ShipmentStatus::LabelCreated),
    rule("cancel", ShipmentStatus::Cancelled),
    rule("rto initiated", ShipmentStatus::Cancelled),
    rule("return to origin", ShipmentStatus::Cancelled),
    rule("exception", ShipmentStatus::Exception),
    rule("lost", ShipmentStatus::Exception),
    rule("damaged", ShipmentStatus::Exception),
    rule("failed", ShipmentStatus::Exception),
    rule("misrouted", ShipmentStatus::Exception),
    rule("on hold", ShipmentStatus::Exception),
]);

/// Order events most recent first
///
/// Events sharing a timestamp follow the feed's own direction. A feed is
/// read oldest-first, so later entries win ties, unless its first dated
/// event is newer than its last. Events without a timestamp sort after
/// all dated events and keep their source order.
pub fn sort_events_most_recent_first(events: &mut [TrackingEvent]) {
    let mut dated = events.iter().filter_map(|e| e.timestamp);
    let first = dated.next();
    let newest_first = matches!((first, dated.last()), (Some(first), Some(last)) if first > last);

    let mut order: Vec<usize> = (0..events.len()).collect();
    order.sort_by(|&a, &b| match (events[a].timestamp, events[b].timestamp) {
        (Some(ta), Some(tb)) => tb.cmp(&ta).then_with(|| {
            if newest_first {
                a.cmp(&b)
            } else {
                b.cmp(&a)
            }
        }),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(&b),
    });

    let sorted: Vec<TrackingEvent> = order.iter().map(|&i| events[i].clone()).collect();
    events.clone_from_slice(&sorted);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    fn normalize(raw: &str) -> ShipmentStatus {
        SHIPROCKET_STATUS_RULES.normalize(raw)
    }

    #[test]
    fn test_every_rule_is_reachable() {
        // Each needle on its own must resolve through its own rule
        for rule in SHIPROCKET_STATUS_RULES.rules() {
            let matched = SHIPROCKET_STATUS_RULES
                .matching_rule(&rule.needle.to_uppercase())
                .unwrap();
            assert_eq!(matched.status, rule.status, "needle '{}'", rule.needle);
        }
    }

    #[test]
    fn test_common_shiprocket_statuses() {
        assert_eq!(normalize("DELIVERED"), ShipmentStatus::Delivered);
        assert_eq!(normalize("IN TRANSIT"), ShipmentStatus::InTransit);
        assert_eq!(normalize("OUT FOR DELIVERY"), ShipmentStatus::InTransit);
        assert_eq!(normalize("Reached at Destination Hub"), ShipmentStatus::InTransit);
        assert_eq!(normalize("SHIPPED"), ShipmentStatus::InTransit);
        assert_eq!(normalize("PICKED UP"), ShipmentStatus::PickedUp);
        assert_eq!(normalize("Pickup Done"), ShipmentStatus::PickedUp);
        assert_eq!(normalize("AWB Assigned"), ShipmentStatus::LabelCreated);
        assert_eq!(normalize("Label Generated"), ShipmentStatus::LabelCreated);
        assert_eq!(normalize("Manifest Generated"), ShipmentStatus::LabelCreated);
        assert_eq!(normalize("Pickup Scheduled"), ShipmentStatus::LabelCreated);
        assert_eq!(normalize("Pickup Queued"), ShipmentStatus::LabelCreated);
        assert_eq!(normalize("CANCELED"), ShipmentStatus::Cancelled);
        assert_eq!(normalize("Cancellation Requested"), ShipmentStatus::Cancelled);
        assert_eq!(normalize("RTO Initiated"), ShipmentStatus::Cancelled);
        assert_eq!(normalize("LOST"), ShipmentStatus::Exception);
        assert_eq!(normalize("Damaged"), ShipmentStatus::Exception);
        assert_eq!(normalize("Pickup Exception"), ShipmentStatus::Exception);
        assert_eq!(normalize("Delivery Failed"), ShipmentStatus::Exception);
    }

    #[test]
    fn test_rule_order_resolves_mixed_strings() {
        assert_eq!(normalize("Cancelled - In Transit Reversal"), ShipmentStatus::InTransit);
        assert_eq!(normalize("Picked up, label printed"), ShipmentStatus::PickedUp);
        assert_eq!(normalize("RTO Delivered"), ShipmentStatus::Delivered);
    }

    #[test]
    fn test_unknown_vocabulary_defaults_to_created() {
        assert_eq!(normalize("NEW"), ShipmentStatus::Created);
        assert_eq!(normalize(""), ShipmentStatus::Created);
        assert_eq!(normalize("   "), ShipmentStatus::Created);
        assert_eq!(normalize("Statut inconnu"), ShipmentStatus::Created);
    }

    fn event(ts: Option<i64>, description: &str) -> TrackingEvent {
        TrackingEvent {
            timestamp: ts.map(|secs| Utc.timestamp_opt(secs, 0).unwrap()),
            status: ShipmentStatus::InTransit,
            location: None,
            description: description.to_string(),
            provider_status_code: None,
        }
    }

    #[test]
    fn test_sort_events_most_recent_first() {
        let mut events = vec![
            event(Some(100), "a"),
            event(None, "undated"),
            event(Some(300), "c"),
            event(Some(200), "b"),
        ];
        sort_events_most_recent_first(&mut events);
        let order: Vec<_> = events.iter().map(|e| e.description.as_str()).collect();
        assert_eq!(order, vec!["c", "b", "a", "undated"]);
    }

    #[test]
    fn test_timestamp_ties_follow_feed_direction() {
        let order = |mut events: Vec<TrackingEvent>| {
            sort_events_most_recent_first(&mut events);
            events.into_iter().map(|e| e.description).collect::<Vec<_>>()
        };

        // Oldest-first feed: the later entry of a tie is the newer one
        let ascending = vec![
            event(Some(100), "picked up"),
            event(Some(100), "in transit"),
            event(Some(200), "delivered"),
        ];
        assert_eq!(order(ascending), ["delivered", "in transit", "picked up"]);

        // Newest-first feed keeps its own order for ties
        let descending = vec![
            event(Some(200), "delivered"),
            event(Some(100), "in transit"),
            event(Some(100), "picked up"),
        ];
        assert_eq!(order(descending), ["delivered", "in transit", "picked up"]);

        let single_instant = vec![event(Some(100), "first"), event(Some(100), "second")];
        assert_eq!(order(single_instant), ["second", "first"]);

        let undated = vec![
            event(None, "note 1"),
            event(Some(100), "picked up"),
            event(None, "note 2"),
            event(Some(200), "delivered"),
        ];
        assert_eq!(order(undated), ["delivered", "picked up", "note 1", "note 2"]);
    }

    proptest! {
        #[test]
        fn prop_delivered_anywhere_maps_to_delivered(
            prefix in "[a-zA-Z0-9 ,\\-]{0,20}",
            suffix in "[a-zA-Z0-9 ,\\-]{0,20}",
            casing in prop::sample::select(vec!["delivered", "DELIVERED", "Delivered", "dElIvErEd"]),
        ) {
            let raw = format!("{}{}{}", prefix, casing, suffix);
            prop_assert_eq!(normalize(&raw), ShipmentStatus::Delivered);
        }

        #[test]
        fn prop_normalize_never_panics(raw in "\\PC{0,40}") {
            let _ = normalize(&raw);
        }
    }
}
