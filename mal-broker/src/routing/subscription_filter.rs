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

//! Subscription filter predicates over update key vectors.

use crate::message::{Attribute, KeyDeclaration, UpdateHeader};
use serde::Deserialize;
use tracing::trace;

const DOMAIN_WILDCARD: &str = "*";

/// How a filter whose shape differs from the update key vector is treated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyMatchStrictness {
    /// Compare overlapping positions only. Positions missing from the update
    /// count as null, so only wildcards pass there.
    Lenient,
    /// Filter width must equal the update key-vector width.
    #[default]
    Arity,
    /// As `Arity`, and the filter key names must equal the provider's
    /// declared key names in order whenever the provider declared any.
    Strict,
}

/// One filter position. An empty value set is a wildcard.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyFilter {
    pub name: String,
    pub values: Vec<Attribute>,
}

impl KeyFilter {
    pub fn wildcard(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
        }
    }

    pub fn any_of(name: impl Into<String>, values: Vec<Attribute>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        self.values.is_empty()
    }

    /// A null update value never passes a non-wildcard position.
    fn admits(&self, value: Option<&Attribute>) -> bool {
        if self.is_wildcard() {
            return true;
        }
        value.is_some_and(|value| self.values.contains(value))
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SubscriptionFilter {
    /// Domain pattern; a trailing `*` element matches any remaining suffix.
    /// `None` accepts every domain.
    pub domain: Option<Vec<String>>,
    pub keys: Vec<KeyFilter>,
}

impl SubscriptionFilter {
    pub fn new(keys: Vec<KeyFilter>) -> Self {
        Self { domain: None, keys }
    }

    /// Filter that matches every update published in its context.
    pub fn catch_all() -> Self {
        Self::default()
    }

    pub fn with_domain(mut self, domain: Vec<String>) -> Self {
        self.domain = Some(domain);
        self
    }

    pub fn is_catch_all(&self) -> bool {
        self.domain.is_none() && self.keys.iter().all(KeyFilter::is_wildcard)
    }

    pub fn matches(
        &self,
        header: &UpdateHeader,
        declared_keys: &[KeyDeclaration],
        strictness: KeyMatchStrictness,
    ) -> bool {
        if let Some(pattern) = &self.domain {
            if !domain_matches(pattern, &header.domain) {
                return false;
            }
        }

        // Every position wildcarded: shape is irrelevant.
        if self.keys.iter().all(KeyFilter::is_wildcard) {
            return true;
        }

        if strictness != KeyMatchStrictness::Lenient
            && self.keys.len() != header.key_values.len()
        {
            trace!(
                filter_width = self.keys.len(),
                update_width = header.key_values.len(),
                source = %header.source,
                "filter arity mismatch treated as non-match"
            );
            return false;
        }

        if strictness == KeyMatchStrictness::Strict
            && !declared_keys.is_empty()
            && !(names_agree(&self.keys, declared_keys) && types_agree(header, declared_keys))
        {
            return false;
        }

        self.keys.iter().enumerate().all(|(position, key)| {
            key.admits(header.key_values.get(position).and_then(Option::as_ref))
        })
    }
}

fn names_agree(keys: &[KeyFilter], declared_keys: &[KeyDeclaration]) -> bool {
    keys.len() == declared_keys.len()
        && keys
            .iter()
            .zip(declared_keys)
            .all(|(key, declared)| key.name == declared.name)
}

/// Non-null update values must carry the type their position was declared with.
fn types_agree(header: &UpdateHeader, declared_keys: &[KeyDeclaration]) -> bool {
    header
        .key_values
        .iter()
        .zip(declared_keys)
        .all(|(value, declared)| {
            value
                .as_ref()
                .map_or(true, |value| value.attribute_type() == declared.key_type)
        })
}

fn domain_matches(pattern: &[String], domain: &[String]) -> bool {
    let mut domain_parts = domain.iter();
    for (index, part) in pattern.iter().enumerate() {
        if part == DOMAIN_WILDCARD && index == pattern.len() - 1 {
            return true;
        }
        match domain_parts.next() {
            Some(candidate) if candidate == part => {}
            _ => return false,
        }
    }
    domain_parts.next().is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::AttributeType;

    fn header(key_values: Vec<Option<Attribute>>) -> UpdateHeader {
        UpdateHeader {
            source: "provider".to_string(),
            domain: vec!["esa".to_string(), "mission".to_string()],
            key_values,
        }
    }

    fn k1_in(values: Vec<Attribute>) -> SubscriptionFilter {
        SubscriptionFilter::new(vec![KeyFilter::any_of("K1", values)])
    }

    fn domain(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|part| part.to_string()).collect()
    }

    #[test]
    fn value_set_must_contain_update_value() {
        let filter = k1_in(vec![Attribute::Integer(5)]);

        assert!(filter.matches(
            &header(vec![Some(Attribute::Integer(5))]),
            &[],
            KeyMatchStrictness::Arity
        ));
        assert!(!filter.matches(
            &header(vec![Some(Attribute::Integer(7))]),
            &[],
            KeyMatchStrictness::Arity
        ));
        assert!(!filter.matches(
            &header(vec![Some(Attribute::Long(5))]),
            &[],
            KeyMatchStrictness::Arity
        ));
    }

    #[test]
    fn null_update_value_fails_non_wildcard_position() {
        let filter = k1_in(vec![Attribute::Integer(5)]);
        assert!(!filter.matches(&header(vec![None]), &[], KeyMatchStrictness::Lenient));
    }

    #[test]
    fn catch_all_matches_any_shape_and_nulls() {
        let filter = SubscriptionFilter::new(vec![KeyFilter::wildcard("K1"), KeyFilter::wildcard("K2")]);
        assert!(filter.is_catch_all());

        for strictness in [
            KeyMatchStrictness::Lenient,
            KeyMatchStrictness::Arity,
            KeyMatchStrictness::Strict,
        ] {
            assert!(filter.matches(&header(vec![None]), &[], strictness));
            assert!(filter.matches(&header(vec![]), &[], strictness));
            assert!(filter.matches(
                &header(vec![Some(Attribute::Boolean(true)), None, None]),
                &[KeyDeclaration::new("X", AttributeType::Boolean)],
                strictness
            ));
        }
    }

    #[test]
    fn arity_mismatch_is_non_match_unless_lenient() {
        let filter = SubscriptionFilter::new(vec![
            KeyFilter::any_of("K1", vec![Attribute::Integer(5)]),
            KeyFilter::wildcard("K2"),
        ]);
        let short_update = header(vec![Some(Attribute::Integer(5))]);

        assert!(!filter.matches(&short_update, &[], KeyMatchStrictness::Arity));
        assert!(!filter.matches(&short_update, &[], KeyMatchStrictness::Strict));
        assert!(filter.matches(&short_update, &[], KeyMatchStrictness::Lenient));

        let missing_constrained = SubscriptionFilter::new(vec![
            KeyFilter::wildcard("K1"),
            KeyFilter::any_of("K2", vec![Attribute::Integer(1)]),
        ]);
        assert!(!missing_constrained.matches(&short_update, &[], KeyMatchStrictness::Lenient));
    }

    #[test]
    fn strict_requires_declared_names_in_order() {
        let declared = vec![
            KeyDeclaration::new("K1", AttributeType::Integer),
            KeyDeclaration::new("K2", AttributeType::Integer),
        ];
        let update = header(vec![Some(Attribute::Integer(5)), Some(Attribute::Integer(6))]);

        let in_order = SubscriptionFilter::new(vec![
            KeyFilter::any_of("K1", vec![Attribute::Integer(5)]),
            KeyFilter::wildcard("K2"),
        ]);
        let swapped = SubscriptionFilter::new(vec![
            KeyFilter::any_of("K2", vec![Attribute::Integer(5)]),
            KeyFilter::wildcard("K1"),
        ]);

        assert!(in_order.matches(&update, &declared, KeyMatchStrictness::Strict));
        assert!(!swapped.matches(&update, &declared, KeyMatchStrictness::Strict));
        assert!(swapped.matches(&update, &declared, KeyMatchStrictness::Arity));
        assert!(swapped.matches(&update, &[], KeyMatchStrictness::Strict));
    }

    #[test]
    fn strict_requires_declared_key_types() {
        let declared = vec![KeyDeclaration::new("K1", AttributeType::Integer)];
        let filter = SubscriptionFilter::new(vec![KeyFilter::any_of(
            "K1",
            vec![Attribute::Integer(5), Attribute::Long(5)],
        )]);

        let integer = header(vec![Some(Attribute::Integer(5))]);
        let long = header(vec![Some(Attribute::Long(5))]);

        assert!(filter.matches(&integer, &declared, KeyMatchStrictness::Strict));
        assert!(!filter.matches(&long, &declared, KeyMatchStrictness::Strict));
        assert!(filter.matches(&long, &declared, KeyMatchStrictness::Arity));
    }

    #[test]
    fn domain_pattern_supports_trailing_wildcard() {
        assert!(domain_matches(&domain(&["esa", "*"]), &domain(&["esa", "mission", "aocs"])));
        assert!(domain_matches(&domain(&["esa", "*"]), &domain(&["esa"])));
        assert!(domain_matches(&domain(&["*"]), &domain(&[])));
        assert!(domain_matches(&domain(&["esa", "mission"]), &domain(&["esa", "mission"])));
        assert!(!domain_matches(&domain(&["esa", "mission"]), &domain(&["esa"])));
        assert!(!domain_matches(&domain(&["esa"]), &domain(&["esa", "mission"])));
        assert!(!domain_matches(&domain(&["nasa", "*"]), &domain(&["esa", "mission"])));
    }

    #[test]
    fn domain_filter_applies_before_keys() {
        let filter = SubscriptionFilter::catch_all().with_domain(domain(&["esa", "other"]));
        assert!(!filter.is_catch_all());
        assert!(!filter.matches(&header(vec![]), &[], KeyMatchStrictness::Arity));

        let filter = SubscriptionFilter::catch_all().with_domain(domain(&["esa", "*"]));
        assert!(filter.matches(&header(vec![None]), &[], KeyMatchStrictness::Arity));
    }
}
