//! Routing subscriptions
//!
//! A subscription binds an interest predicate to a destination. The router
//! matches events against the registered set and returns destinations in
//! weight order.

use crate::{DestinationId, SubscriptionId};
use crate::{Event, EventCategory};
use serde::{Deserialize, Serialize};

/// Interest predicate for a subscription
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum SubscriptionFilter {
    /// Matches every event
    Broadcast,
    /// Matches only when every present clause is satisfied
    Matching {
        #[serde(skip_serializing_if = "Option::is_none")]
        category: Option<EventCategory>,
        /// All listed topics must be present on the event
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        topics: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        min_priority: Option<f64>,
    },
}

impl SubscriptionFilter {
    pub fn category(category: EventCategory) -> Self {
        SubscriptionFilter::Matching {
            category: Some(category),
            topics: Vec::new(),
            min_priority: None,
        }
    }

    pub fn topic(topic: impl Into<String>) -> Self {
        SubscriptionFilter::Matching {
            category: None,
            topics: vec![topic.into()],
            min_priority: None,
        }
    }

    pub fn min_priority(threshold: f64) -> Self {
        SubscriptionFilter::Matching {
            category: None,
            topics: Vec::new(),
            min_priority: Some(threshold),
        }
    }

    /// Whether this filter accepts the event. An event is only handed to
    /// the router after classification and prioritization, so category and
    /// priority_score are always meaningful here.
    pub fn matches(&self, event: &Event) -> bool {
        match self {
            SubscriptionFilter::Broadcast => true,
            SubscriptionFilter::Matching {
                category,
                topics,
                min_priority,
            } => {
                if let Some(category) = category {
                    if event.category != *category {
                        return false;
                    }
                }
                if !topics.iter().all(|t| event.topics.contains(t)) {
                    return false;
                }
                if let Some(threshold) = min_priority {
                    if event.priority_score < *threshold {
                        return false;
                    }
                }
                true
            }
        }
    }
}

/// A registered routing rule
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub destination: DestinationId,
    pub filter: SubscriptionFilter,
    /// Higher-weight subscriptions place their destination earlier in the
    /// routed order
    pub weight: f64,
    /// Consumer that registered the rule; only the same owner may remove it
    pub owner: String,
}

impl Subscription {
    pub fn new(
        destination: DestinationId,
        filter: SubscriptionFilter,
        owner: impl Into<String>,
    ) -> Self {
        Self {
            id: SubscriptionId::generate(),
            destination,
            filter,
            weight: 1.0,
            owner: owner.into(),
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }
}
