/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! Consumer subscriptions and batch matching.

use crate::message::{KeyDeclaration, Subscription, Update, Uri};
use crate::routing::notify_set::{MatchPlan, SubscriptionMatch};
use crate::routing::subscription_filter::{KeyMatchStrictness, SubscriptionFilter};
use std::collections::{BTreeMap, HashMap};

/// Active subscriptions of one consumer in one broker context.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConsumerRegistration {
    filters: BTreeMap<String, SubscriptionFilter>,
}

impl ConsumerRegistration {
    /// Adds new subscription ids and replaces existing ones.
    pub(crate) fn merge(&mut self, subscriptions: Vec<Subscription>) {
        for subscription in subscriptions {
            self.filters.insert(subscription.id, subscription.filter);
        }
    }

    /// Removes the named ids, ignoring unknown ones. Returns how many were removed.
    pub(crate) fn remove(&mut self, subscription_ids: &[String]) -> usize {
        subscription_ids
            .iter()
            .filter(|id| self.filters.remove(id.as_str()).is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn subscription_ids(&self) -> impl Iterator<Item = &str> {
        self.filters.keys().map(String::as_str)
    }

    pub fn filter(&self, subscription_id: &str) -> Option<&SubscriptionFilter> {
        self.filters.get(subscription_id)
    }

    /// Matches a batch against every subscription. Subscriptions with no
    /// matching update are left out.
    pub(crate) fn match_updates(
        &self,
        updates: &[Update],
        declared_keys: &[KeyDeclaration],
        strictness: KeyMatchStrictness,
    ) -> Vec<SubscriptionMatch> {
        self.filters
            .iter()
            .filter_map(|(subscription_id, filter)| {
                let matched: Vec<Update> = updates
                    .iter()
                    .filter(|update| filter.matches(&update.header, declared_keys, strictness))
                    .cloned()
                    .collect();

                if matched.is_empty() {
                    return None;
                }
                Some(SubscriptionMatch {
                    subscription_id: subscription_id.clone(),
                    updates: matched,
                })
            })
            .collect()
    }
}

/// Consumer registrations of one broker context, keyed by consumer address.
#[derive(Debug, Default)]
pub(crate) struct ConsumerRegistry {
    registrations: HashMap<Uri, ConsumerRegistration>,
}

impl ConsumerRegistry {
    /// Returns `true` when the consumer had no registration before.
    pub(crate) fn add_subscriptions(
        &mut self,
        consumer: &Uri,
        subscriptions: Vec<Subscription>,
    ) -> bool {
        let created = !self.registrations.contains_key(consumer);
        self.registrations
            .entry(consumer.clone())
            .or_default()
            .merge(subscriptions);
        created
    }

    /// Removes the named ids and drops the registration once it is empty.
    /// Returns the number of subscriptions removed.
    pub(crate) fn remove_subscriptions(
        &mut self,
        consumer: &Uri,
        subscription_ids: &[String],
    ) -> usize {
        let Some(registration) = self.registrations.get_mut(consumer) else {
            return 0;
        };

        let removed = registration.remove(subscription_ids);
        if registration.is_empty() {
            self.registrations.remove(consumer);
        }
        removed
    }

    pub(crate) fn remove_consumer(&mut self, consumer: &Uri) -> bool {
        self.registrations.remove(consumer).is_some()
    }

    pub(crate) fn get(&self, consumer: &Uri) -> Option<&ConsumerRegistration> {
        self.registrations.get(consumer)
    }

    pub(crate) fn contains(&self, consumer: &Uri) -> bool {
        self.registrations.contains_key(consumer)
    }

    pub(crate) fn match_batch(
        &self,
        updates: &[Update],
        declared_keys: &[KeyDeclaration],
        strictness: KeyMatchStrictness,
    ) -> MatchPlan {
        let mut plan = MatchPlan::new();
        for (consumer, registration) in &self.registrations {
            let matches = registration.match_updates(updates, declared_keys, strictness);
            if !matches.is_empty() {
                plan.insert(consumer.clone(), matches);
            }
        }
        plan
    }

    pub(crate) fn len(&self) -> usize {
        self.registrations.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Attribute, UpdateHeader, UpdateValue};
    use crate::routing::subscription_filter::KeyFilter;

    fn update(value: i32, body: &str) -> Update {
        Update::new(
            UpdateHeader {
                source: "P".to_string(),
                domain: vec!["esa".to_string(), "mission".to_string()],
                key_values: vec![Some(Attribute::Integer(value))],
            },
            vec![UpdateValue::Decoded(Attribute::String(body.to_string()))],
        )
    }

    fn k1_in(id: &str, values: &[i32]) -> Subscription {
        Subscription::new(
            id,
            SubscriptionFilter::new(vec![KeyFilter::any_of(
                "K1",
                values.iter().map(|value| Attribute::Integer(*value)).collect(),
            )]),
        )
    }

    #[test]
    fn merge_adds_and_replaces_by_id() {
        let mut registry = ConsumerRegistry::default();
        let consumer = Uri::from("C1");

        assert!(registry.add_subscriptions(&consumer, vec![k1_in("SUB1", &[5])]));
        assert!(!registry.add_subscriptions(&consumer, vec![k1_in("SUB1", &[7]), k1_in("SUB2", &[9])]));

        let registration = registry.get(&consumer).expect("registered consumer");
        assert_eq!(registration.subscription_ids().collect::<Vec<_>>(), vec!["SUB1", "SUB2"]);
        assert_eq!(
            registration.filter("SUB1"),
            Some(&k1_in("SUB1", &[7]).filter)
        );
    }

    #[test]
    fn removing_last_subscription_drops_consumer() {
        let mut registry = ConsumerRegistry::default();
        let consumer = Uri::from("C1");
        registry.add_subscriptions(&consumer, vec![k1_in("SUB1", &[5]), k1_in("SUB2", &[7])]);

        assert_eq!(registry.remove_subscriptions(&consumer, &["SUB1".to_string()]), 1);
        assert!(registry.contains(&consumer));

        assert_eq!(
            registry.remove_subscriptions(&consumer, &["SUB2".to_string(), "SUB9".to_string()]),
            1
        );
        assert!(!registry.contains(&consumer));
        assert!(registry.is_empty());
    }

    #[test]
    fn removing_unknown_ids_or_consumers_is_a_no_op() {
        let mut registry = ConsumerRegistry::default();
        let consumer = Uri::from("C1");
        registry.add_subscriptions(&consumer, vec![k1_in("SUB1", &[5])]);

        assert_eq!(registry.remove_subscriptions(&consumer, &["nope".to_string()]), 0);
        assert_eq!(registry.remove_subscriptions(&Uri::from("C9"), &["SUB1".to_string()]), 0);
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.get(&consumer).map(|r| r.subscription_ids().count()),
            Some(1)
        );
    }

    #[test]
    fn match_batch_groups_by_subscription_and_keeps_order() {
        let mut registry = ConsumerRegistry::default();
        registry.add_subscriptions(
            &Uri::from("C1"),
            vec![k1_in("SUB1", &[5]), k1_in("SUB2", &[7, 5]), k1_in("SUB3", &[11])],
        );
        registry.add_subscriptions(&Uri::from("C2"), vec![k1_in("ONLY", &[42])]);

        let batch = vec![update(5, "A"), update(7, "B"), update(5, "C")];
        let plan = registry.match_batch(&batch, &[], KeyMatchStrictness::Arity);

        assert_eq!(plan.len(), 1);
        let matches = &plan[&Uri::from("C1")];
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].subscription_id, "SUB1");
        assert_eq!(matches[0].updates, vec![update(5, "A"), update(5, "C")]);
        assert_eq!(matches[1].subscription_id, "SUB2");
        assert_eq!(matches[1].updates, batch);
    }
}
