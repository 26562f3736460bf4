/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Entry ordering for sorted views.
//!
//! Keys sort before numbers; keys compare with [`locale_compare`],
//! indices and numeric map keys numerically. Sorting is stable, so entries that compare
//! equal keep their input order. Chunk building and unchunked
//! rendering both go through [`sort_entries`] so they never disagree
//! about sequence.

use std::cmp::Ordering;

use crate::path::PathSegment;
use crate::value::Entry;

/// Compare two path segments for sorted display.
pub fn compare_segments(a: &PathSegment, b: &PathSegment) -> Ordering {
    match (a, b) {
        (PathSegment::Key(a), PathSegment::Key(b)) => locale_compare(a, b),
        (PathSegment::Index(a), PathSegment::Index(b)) => a.cmp(b),
        (PathSegment::Key(_), _) => Ordering::Less,
        (_, PathSegment::Key(_)) => Ordering::Greater,
        (a, b) => match (a.as_number(), b.as_number()) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            _ => Ordering::Equal,
        },
    }
}

/// Case-insensitive lexical comparison with lowercase ordered before
/// uppercase on ties, then raw code point order.
///
/// Approximates a root-locale collation without pulling in ICU data.
pub fn locale_compare(a: &str, b: &str) -> Ordering {
    let primary = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    primary
        .then_with(|| case_order(a, b))
        .then_with(|| a.cmp(b))
}

fn case_order(a: &str, b: &str) -> Ordering {
    for (x, y) in a.chars().zip(b.chars()) {
        if x == y {
            continue;
        }
        match (x.is_lowercase(), y.is_lowercase()) {
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            _ => {}
        }
    }
    Ordering::Equal
}

/// Stable in-place sort of entries by key.
pub fn sort_entries(entries: &mut [Entry]) {
    entries.sort_by(|(a, _), (b, _)| compare_segments(a, b));
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::controller::ViewController;
    use crate::path;
    use crate::path::MapNumber;
    use crate::value::Value;

    fn entries(keys: &[PathSegment]) -> Vec<Entry> {
        keys.iter()
            .enumerate()
            .map(|(i, k)| (k.clone(), Value::from(i as i32)))
            .collect()
    }

    #[test]
    fn strings_before_numbers() {
        let mut es = entries(&[
            PathSegment::Index(2),
            PathSegment::from("b"),
            PathSegment::Index(1),
            PathSegment::from("a"),
        ]);
        sort_entries(&mut es);
        let keys: Vec<String> = es.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, vec!["a", "b", "1", "2"]);
    }

    #[test]
    fn numeric_map_keys_sort_numerically_after_strings() {
        let map = Value::map([
            (Value::Number(10.5), Value::from(0)),
            (Value::Number(2.0), Value::from(1)),
            (Value::string("b"), Value::from(2)),
            (Value::Number(-3.0), Value::from(3)),
        ]);
        let mut controller = ViewController::default();
        let node = controller.make_node(&path!["m"], &map).unwrap();
        let mut es = node.children(&map);
        sort_entries(&mut es);
        let keys: Vec<String> = es.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, vec!["b", "-3", "2", "10.5"]);
        assert_eq!(es[1].0.as_number(), Some(-3.0));
        assert_eq!(es[2].0, PathSegment::Index(2));
    }

    #[test]
    fn numbers_compare_numerically() {
        assert_eq!(
            compare_segments(&PathSegment::Index(10), &PathSegment::Index(9)),
            Ordering::Greater
        );
    }

    #[test]
    fn locale_compare_ignores_case_first() {
        assert_eq!(locale_compare("apple", "Banana"), Ordering::Less);
        assert_eq!(locale_compare("a", "A"), Ordering::Less);
        assert_eq!(locale_compare("B", "a"), Ordering::Greater);
        assert_eq!(locale_compare("same", "same"), Ordering::Equal);
        assert_eq!(locale_compare("ab", "abc"), Ordering::Less);
    }

    fn segment() -> impl Strategy<Value = PathSegment> {
        prop_oneof![
            "[a-zA-Z]{0,4}".prop_map(PathSegment::Key),
            (0usize..50).prop_map(PathSegment::Index),
            (-50.0f64..50.0).prop_map(|n| PathSegment::Number(MapNumber(n))),
        ]
    }

    proptest! {
        #[test]
        fn sorting_is_idempotent(keys in prop::collection::vec(segment(), 0..60)) {
            let mut once = entries(&keys);
            sort_entries(&mut once);
            let mut twice = once.clone();
            sort_entries(&mut twice);
            let a: Vec<_> = once.iter().map(|(k, _)| k.clone()).collect();
            let b: Vec<_> = twice.iter().map(|(k, _)| k.clone()).collect();
            prop_assert_eq!(a, b);
        }

        #[test]
        fn all_keys_precede_all_numbers(keys in prop::collection::vec(segment(), 0..60)) {
            let mut es = entries(&keys);
            sort_entries(&mut es);
            let first_number = es.iter().position(|(k, _)| k.as_number().is_some());
            if let Some(pos) = first_number {
                prop_assert!(es[pos..].iter().all(|(k, _)| k.as_number().is_some()));
                for pair in es[pos..].windows(2) {
                    let (a, b) = (pair[0].0.as_number(), pair[1].0.as_number());
                    prop_assert!(a <= b);
                }
            }
        }

        #[test]
        fn sort_is_stable_for_equal_keys(n in 1usize..20) {
            let keys: Vec<PathSegment> = (0..n).map(|_| PathSegment::Index(7)).collect();
            let mut es = entries(&keys);
            sort_entries(&mut es);
            let order: Vec<f64> = es.iter().filter_map(|(_, v)| v.as_f64()).collect();
            let expected: Vec<f64> = (0..n).map(|i| i as f64).collect();
            prop_assert_eq!(order, expected);
        }
    }
}
