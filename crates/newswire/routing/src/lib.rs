//! Event routing
//!
//! The router is the switchboard of the pipeline: given a classified and
//! scored event, it matches the registered subscription set and returns
//! the ordered, deduplicated destinations. Routing to zero destinations
//! is a valid outcome, not an error.

#![deny(unsafe_code)]

use newswire_types::{DestinationId, Event, Subscription, SubscriptionId};
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;
use tracing::debug;

pub type RoutingResult<T> = Result<T, RoutingError>;

#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("subscription not found: {0}")]
    SubscriptionNotFound(SubscriptionId),

    #[error("subscription {0} is owned by another consumer")]
    NotOwner(SubscriptionId),
}

/// Registry of routing rules with stable registration order.
///
/// Interior locking keeps registration/removal safe against concurrent
/// routing reads; the lock never spans a delivery.
#[derive(Default)]
pub struct SubscriptionRegistry {
    subscriptions: RwLock<Vec<Subscription>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscription and return its id.
    pub fn register(&self, subscription: Subscription) -> SubscriptionId {
        let id = subscription.id.clone();
        let mut guard = self.subscriptions.write().unwrap_or_else(|e| e.into_inner());
        guard.push(subscription);
        debug!(subscription_id = %id, total = guard.len(), "Subscription registered");
        id
    }

    /// Remove a subscription. Only the consumer that registered it may
    /// remove it; there is no implicit expiry.
    pub fn remove(&self, id: &SubscriptionId, owner: &str) -> RoutingResult<()> {
        let mut guard = self.subscriptions.write().unwrap_or_else(|e| e.into_inner());
        let position = guard
            .iter()
            .position(|s| &s.id == id)
            .ok_or_else(|| RoutingError::SubscriptionNotFound(id.clone()))?;
        if guard[position].owner != owner {
            return Err(RoutingError::NotOwner(id.clone()));
        }
        guard.remove(position);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.subscriptions.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Match an event against the registry.
    ///
    /// Broadcast subscriptions always match; predicate subscriptions match
    /// only when every clause holds. Each destination appears at most once,
    /// keyed by its highest-weighted matching subscription; output order is
    /// weight descending, ties broken by registration order.
    pub fn route(&self, event: &Event) -> Vec<DestinationId> {
        let guard = self.subscriptions.read().unwrap_or_else(|e| e.into_inner());

        // destination -> (best weight, registration index of that subscription)
        let mut best: HashMap<&DestinationId, (f64, usize)> = HashMap::new();
        for (index, subscription) in guard.iter().enumerate() {
            if !subscription.filter.matches(event) {
                continue;
            }
            let candidate = (subscription.weight, index);
            best.entry(&subscription.destination)
                .and_modify(|current| {
                    if subscription.weight > current.0 {
                        *current = candidate;
                    }
                })
                .or_insert(candidate);
        }

        let mut ordered: Vec<(&DestinationId, (f64, usize))> = best.into_iter().collect();
        ordered.sort_by(|a, b| {
            b.1 .0
                .partial_cmp(&a.1 .0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.1 .1.cmp(&b.1 .1))
        });

        let destinations: Vec<DestinationId> =
            ordered.into_iter().map(|(d, _)| d.clone()).collect();
        debug!(
            event_id = %event.id,
            destinations = destinations.len(),
            "Event routed"
        );
        destinations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use newswire_types::{EventCategory, EventId, EventSource, SubscriptionFilter};
    use std::collections::BTreeSet;

    fn event(category: EventCategory, topics: &[&str], priority: f64) -> Event {
        Event {
            id: EventId::new("e-1"),
            source: EventSource::NewsApi,
            title: "t".into(),
            body: "b".into(),
            url: None,
            fingerprint: "fp".into(),
            category,
            topics: topics.iter().map(|t| t.to_string()).collect::<BTreeSet<_>>(),
            breaking: false,
            priority_score: priority,
            created_at: Utc::now(),
            enrichment: None,
        }
    }

    fn sub(dest: &str, filter: SubscriptionFilter, weight: f64) -> Subscription {
        Subscription::new(DestinationId::new(dest), filter, dest).with_weight(weight)
    }

    #[test]
    fn broadcast_always_included() {
        let registry = SubscriptionRegistry::new();
        registry.register(sub("all", SubscriptionFilter::Broadcast, 1.0));
        let routed = registry.route(&event(EventCategory::Other, &[], 0.1));
        assert_eq!(routed, vec![DestinationId::new("all")]);
    }

    #[test]
    fn predicate_clauses_must_all_hold() {
        let registry = SubscriptionRegistry::new();
        registry.register(sub(
            "picky",
            SubscriptionFilter::Matching {
                category: Some(EventCategory::Tech),
                topics: vec!["ai".into()],
                min_priority: Some(2.0),
            },
            1.0,
        ));

        // Category and topic match, priority too low.
        assert!(registry.route(&event(EventCategory::Tech, &["ai"], 1.0)).is_empty());
        // Everything matches.
        assert_eq!(
            registry.route(&event(EventCategory::Tech, &["ai", "chips"], 3.0)),
            vec![DestinationId::new("picky")]
        );
    }

    #[test]
    fn duplicate_matches_deliver_once() {
        let registry = SubscriptionRegistry::new();
        registry.register(sub("agent-1", SubscriptionFilter::Broadcast, 1.0));
        registry.register(sub("agent-1", SubscriptionFilter::topic("ai"), 5.0));

        let routed = registry.route(&event(EventCategory::Tech, &["ai"], 1.0));
        assert_eq!(routed, vec![DestinationId::new("agent-1")]);
    }

    #[test]
    fn ordering_by_weight_then_registration() {
        let registry = SubscriptionRegistry::new();
        registry.register(sub("low", SubscriptionFilter::Broadcast, 1.0));
        registry.register(sub("high", SubscriptionFilter::Broadcast, 3.0));
        registry.register(sub("tied-late", SubscriptionFilter::Broadcast, 1.0));

        let routed = registry.route(&event(EventCategory::Other, &[], 0.0));
        assert_eq!(
            routed,
            vec![
                DestinationId::new("high"),
                DestinationId::new("low"),
                DestinationId::new("tied-late"),
            ]
        );
    }

    #[test]
    fn zero_destinations_is_empty_not_error() {
        let registry = SubscriptionRegistry::new();
        registry.register(sub("sports-desk", SubscriptionFilter::category(EventCategory::Sports), 1.0));
        assert!(registry.route(&event(EventCategory::Tech, &[], 1.0)).is_empty());
    }

    #[test]
    fn remove_requires_matching_owner() {
        let registry = SubscriptionRegistry::new();
        let id = registry.register(sub("d", SubscriptionFilter::Broadcast, 1.0));

        assert!(matches!(
            registry.remove(&id, "someone-else"),
            Err(RoutingError::NotOwner(_))
        ));
        registry.remove(&id, "d").unwrap();
        assert!(registry.is_empty());
        assert!(matches!(
            registry.remove(&id, "d"),
            Err(RoutingError::SubscriptionNotFound(_))
        ));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn arb_filter() -> impl Strategy<Value = SubscriptionFilter> {
            prop_oneof![
                Just(SubscriptionFilter::Broadcast),
                prop_oneof![
                    Just(EventCategory::Tech),
                    Just(EventCategory::Sports),
                    Just(EventCategory::Other),
                ]
                .prop_map(SubscriptionFilter::category),
                "[a-c]{1,2}".prop_map(SubscriptionFilter::topic),
                (0.0f64..5.0).prop_map(SubscriptionFilter::min_priority),
            ]
        }

        proptest! {
            #[test]
            fn routed_destinations_are_unique(
                subs in prop::collection::vec((0u8..6, arb_filter(), 0.0f64..10.0), 0..24),
                topics in prop::collection::vec("[a-c]{1,2}", 0..4),
                priority in 0.0f64..10.0,
            ) {
                let registry = SubscriptionRegistry::new();
                for (dest, filter, weight) in subs {
                    let name = format!("dest-{dest}");
                    registry.register(
                        Subscription::new(DestinationId::new(&name), filter, name.clone())
                            .with_weight(weight),
                    );
                }
                let topic_refs: Vec<&str> = topics.iter().map(String::as_str).collect();
                let routed = registry.route(&event(EventCategory::Tech, &topic_refs, priority));

                let mut seen = std::collections::HashSet::new();
                for destination in &routed {
                    prop_assert!(seen.insert(destination.clone()), "duplicate destination routed");
                }
            }
        }
    }
}
