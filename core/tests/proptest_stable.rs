//! Property tests for stable iteration and multi-symbol decomposition.

use ember::{Key, Node, Table, Value, multi_sym, stablepairs};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

/// Short identifier-like key names, so collisions between recorded and
/// added keys are common.
fn key_name() -> impl Strategy<Value = String> {
    "[a-e]{1,3}"
}

fn segment() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,5}"
}

/// A permutation of `0..n` for some small `n`.
fn permutation() -> impl Strategy<Value = Vec<usize>> {
    (1usize..12).prop_flat_map(|n| Just((0..n).collect::<Vec<_>>()).prop_shuffle())
}

fn build_ordered(recorded: &[String]) -> Table {
    Table::from_ordered(
        recorded
            .iter()
            .enumerate()
            .map(|(i, k)| (Key::from(k.as_str()), Value::from(i as i64)))
            .collect(),
        None,
    )
}

fn keys(table: &Table) -> Vec<Key> {
    stablepairs(table).map(|(k, _)| k).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn stablepairs_is_repeatable(recorded in prop::collection::vec(key_name(), 0..12)) {
        let table = build_ordered(&recorded);
        prop_assert_eq!(keys(&table), keys(&table));
    }

    #[test]
    fn stablepairs_yields_each_key_exactly_once(
        recorded in prop::collection::vec(key_name(), 0..12),
        added in prop::collection::vec(key_name(), 0..12),
    ) {
        let table = build_ordered(&recorded);
        for k in &added {
            table.insert(k.as_str(), true);
        }
        let mut yielded = keys(&table);
        prop_assert_eq!(yielded.len(), table.len());
        yielded.sort_by_key(|k| k.to_string());
        yielded.dedup();
        prop_assert_eq!(yielded.len(), table.len());
    }

    #[test]
    fn added_keys_follow_recorded_keys_in_sorted_order(
        recorded in prop::collection::vec(key_name(), 0..12),
        removed in prop::collection::vec(key_name(), 0..4),
        added in prop::collection::vec("[f-h]{1,3}", 0..8),
    ) {
        let table = build_ordered(&recorded);
        for k in &removed {
            table.remove(&Key::from(k.as_str()));
        }
        for k in &added {
            table.insert(k.as_str(), true);
        }

        let names: Vec<String> = keys(&table).iter().map(Key::to_string).collect();

        // Recorded keys that survived, first occurrence order.
        let mut expected: Vec<String> = Vec::new();
        for k in &recorded {
            if !removed.contains(k) && !expected.contains(k) {
                expected.push(k.clone());
            }
        }
        let mut extra: Vec<String> = added.clone();
        extra.sort();
        extra.dedup();
        expected.extend(extra);

        prop_assert_eq!(names, expected);
    }

    #[test]
    fn container_keys_follow_creation_order(order in permutation()) {
        let nodes: Vec<Node> = (0..order.len())
            .map(|i| if i % 2 == 0 { Node::table() } else { Node::list(vec![]) })
            .collect();
        let table = Table::new();
        for &i in &order {
            table.insert(nodes[i].clone(), i as i64);
        }

        // Lists sort before tables by label, each group in creation order.
        let mut expected: Vec<i64> = (0..nodes.len() as i64).filter(|i| i % 2 == 1).collect();
        expected.extend((0..nodes.len() as i64).filter(|i| i % 2 == 0));
        let values: Vec<Value> = stablepairs(&table).map(|(_, v)| v).collect();
        let expected: Vec<Value> = expected.into_iter().map(Value::from).collect();
        prop_assert_eq!(values, expected);
    }

    #[test]
    fn symbol_keys_sort_by_name(names in prop::collection::btree_set(key_name(), 0..10)) {
        let table = Table::new();
        for name in names.iter().rev() {
            table.insert(Node::symbol(name), true);
        }
        let yielded: Vec<String> = keys(&table).iter().map(Key::to_string).collect();
        let expected: Vec<String> = names.into_iter().collect();
        prop_assert_eq!(yielded, expected);
    }

    #[test]
    fn dotted_paths_round_trip(parts in prop::collection::vec(segment(), 2..5)) {
        let name = parts.join(".");
        let decomposed = multi_sym(&name).expect("well-formed dotted path");
        prop_assert_eq!(decomposed.parts, parts);
        prop_assert!(!decomposed.method_call);
    }

    #[test]
    fn method_call_paths(parts in prop::collection::vec(segment(), 1..4), method in segment()) {
        let name = format!("{}:{}", parts.join("."), method);
        let decomposed = multi_sym(&name).expect("well-formed method path");
        prop_assert!(decomposed.method_call);
        prop_assert_eq!(decomposed.parts.last(), Some(&method));
        prop_assert_eq!(decomposed.parts.len(), parts.len() + 1);
    }

    #[test]
    fn doubled_separators_are_rejected(
        left in segment(),
        right in segment(),
        sep in prop::sample::select(vec!["..", "::", ".:", ":."]),
    ) {
        let name = format!("{left}{sep}{right}");
        prop_assert!(multi_sym(&name).is_none());
    }
}
