//! Integration tests for stable iteration, delegate traversal and the
//! mapping helpers.

use ember::{
    AllPairs, EmberError, ExprCategory, Key, Mapped, Node, Table, Value, allpairs, copy,
    copy_into, kvmap, kvmap_into, map_into, stablepairs, walk_with,
};
use pretty_assertions::assert_eq;

fn key_names(table: &Table) -> Vec<String> {
    stablepairs(table).map(|(k, _)| k.to_string()).collect()
}

/// A table as the reader would build it from `{:name "x" :arity 2 :doc "..."}`.
fn reader_table() -> Table {
    Table::from_ordered(
        vec![
            (Key::from("name"), Value::from("x")),
            (Key::from("arity"), Value::from(2i64)),
            (Key::from("doc"), Value::from("...")),
        ],
        None,
    )
}

// ============================================================================
// stablepairs
// ============================================================================

#[test]
fn test_repeated_enumeration_is_identical() {
    let table = reader_table();
    let first = key_names(&table);
    let second = key_names(&table);
    assert_eq!(first, second);
    assert_eq!(first, vec!["name", "arity", "doc"]);
}

#[test]
fn test_mutation_between_enumerations() {
    let table = reader_table();
    let before = key_names(&table);
    assert!(!before.contains(&"added-b".to_string()));

    table.remove(&Key::from("arity"));
    table.insert("zz-added", true);
    table.insert("added-b", true);
    table.insert("added-a", true);

    assert_eq!(
        key_names(&table),
        vec!["name", "doc", "added-a", "added-b", "zz-added"]
    );
}

#[test]
fn test_independent_of_insertion_history() {
    // The same synthetic contents built in different orders enumerate alike.
    let forward = Table::new();
    let backward = Table::new();
    let keys = ["k1", "k7", "k3", "k9", "k0", "k5"];
    for k in keys {
        forward.insert(k, true);
    }
    for k in keys.iter().rev() {
        backward.insert(*k, true);
    }
    assert_eq!(key_names(&forward), key_names(&backward));
}

#[test]
fn test_symbol_keys_sort_by_name() {
    let table = Table::new();
    table.insert(Node::symbol("beta"), 2i64);
    table.insert(Node::symbol("alpha"), 1i64);
    assert_eq!(key_names(&table), vec!["alpha", "beta"]);
    // Symbol keys are found by name, not by handle.
    assert_eq!(table.get(&Key::from(Node::symbol("beta"))), Some(Value::from(2i64)));
}

fn stable_keys(table: &Table) -> Vec<Key> {
    stablepairs(table).map(|(k, _)| k).collect()
}

#[test]
fn test_self_keyed_table() {
    let table = Table::new();
    table.insert(Node::Table(table.clone()), 1i64);
    table.insert("a", 2i64);

    let pairs: Vec<(Key, Value)> = stablepairs(&table).collect();
    assert_eq!(pairs.len(), 2);
    assert_eq!(pairs[0], (Key::from("a"), Value::from(2i64)));
    assert_eq!(pairs[1], (Key::from(Node::Table(table.clone())), Value::from(1i64)));
    assert_eq!(Node::Table(table).to_string(), "{a 2, <cycle> 1}");
}

#[test]
fn test_key_table_holding_itself() {
    // The key's contents are never enumerated while sorting.
    let key = Table::new();
    key.insert("self", Node::Table(key.clone()));
    key.insert(Node::Table(key.clone()), true);
    let table = Table::new();
    table.insert(Node::Table(key.clone()), "k");
    table.insert(Node::list(vec![]), "l");

    let keys = stable_keys(&table);
    assert_eq!(keys.len(), 2);
    assert!(matches!(&keys[0], Key::Node(Node::List(_))));
    assert_eq!(keys[1], Key::from(Node::Table(key)));
}

#[test]
fn test_mixed_key_kinds_order() {
    let table = Table::new();
    let nested = Table::new();
    nested.insert("zzz", 1i64);
    table.insert(Node::Table(nested), 1i64);
    table.insert(Node::expr("x", ExprCategory::SymRef), 2i64);
    table.insert(Node::symbol("a"), 3i64);
    table.insert("a", 4i64);
    table.insert("b", 5i64);
    table.insert(10i64, 6i64);
    table.insert(9i64, 7i64);

    let order: Vec<Value> = stablepairs(&table).map(|(_, v)| v).collect();
    // "10" < "9" < "a" (string) < a (symbol) < "b" < table < x
    let expected: Vec<Value> = [6i64, 7, 4, 3, 5, 1, 2].into_iter().map(Value::from).collect();
    assert_eq!(order, expected);
}

#[test]
fn test_lookalike_nodes_follow_creation_order() {
    let first = Node::list(vec![Value::from(1i64)]);
    let second = Node::list(vec![Value::from(1i64)]);
    let third = Node::list(vec![Value::from(1i64)]);

    let table = Table::new();
    for node in [&third, &first, &second] {
        table.insert(node.clone(), true);
    }

    let expected = vec![Key::from(first), Key::from(second), Key::from(third)];
    assert_eq!(stable_keys(&table), expected);
    assert_eq!(stable_keys(&table), expected);
}

#[test]
fn test_distinct_tables_as_keys_enumerate_repeatably() {
    let keys: Vec<Table> = (0..4).map(|_| Table::new()).collect();
    let table = Table::new();
    for key in keys.iter().rev() {
        table.insert(Node::Table(key.clone()), true);
    }
    let yielded = stable_keys(&table);
    for (key, expected) in yielded.iter().zip(&keys) {
        assert_eq!(key, &Key::from(Node::Table(expected.clone())));
    }
    assert_eq!(yielded.len(), 4);
}

// ============================================================================
// allpairs
// ============================================================================

#[test]
fn test_allpairs_each_key_once_from_closest_level() {
    let level3 = Table::new();
    level3.insert("y", "level3");
    level3.insert("z", "level3");
    let level2 = Table::new();
    level2.insert("x", "level2");
    level2.insert("y", "level2");
    level2.set_delegate(Some(level3));
    let level1 = Table::new();
    level1.insert("x", "level1");
    level1.set_delegate(Some(level2));

    let mut pairs: Vec<(String, Value)> = allpairs(&Value::from(level1))
        .expect("level1 is a table")
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(
        pairs,
        vec![
            ("x".to_string(), Value::from("level1")),
            ("y".to_string(), Value::from("level2")),
            ("z".to_string(), Value::from("level3")),
        ]
    );
}

#[test]
fn test_allpairs_type_error() {
    for value in [
        Value::Nil,
        Value::from("str"),
        Value::from(Node::symbol("s")),
        Value::from(Node::sequence(vec![])),
    ] {
        assert!(matches!(
            allpairs(&value),
            Err(EmberError::NotATable { .. })
        ));
    }
}

#[test]
fn test_allpairs_long_cycle_terminates() {
    let tables: Vec<Table> = (0..5).map(|_| Table::new()).collect();
    for (i, table) in tables.iter().enumerate() {
        table.insert(format!("k{i}"), i as i64);
        table.insert("shared", i as i64);
        table.set_delegate(Some(tables[(i + 1) % tables.len()].clone()));
    }
    let pairs: Vec<(Key, Value)> = AllPairs::new(&tables[2]).collect();
    assert_eq!(pairs.len(), 6);
    let shared = pairs
        .iter()
        .find(|(k, _)| *k == Key::from("shared"))
        .map(|(_, v)| v.clone());
    assert_eq!(shared, Some(Value::from(2i64)));
}

// ============================================================================
// map / kvmap / copy
// ============================================================================

#[test]
fn test_map_into_appends() {
    let mut out = vec![Value::from("existing")];
    map_into(
        &[Value::from(1i64), Value::Nil, Value::from(2i64)],
        |v| (!v.is_nil()).then(|| v.clone()),
        &mut out,
    );
    assert_eq!(
        out,
        vec![Value::from("existing"), Value::from(1i64), Value::from(2i64)]
    );
}

#[test]
fn test_kvmap_uses_stable_order_for_positional_output() {
    let table = reader_table();
    let names = kvmap(&table, |k, _| Some(Mapped::Value(Value::from(k.clone()))));
    assert_eq!(names.border(), 3);
    assert_eq!(names.get(&Key::Int(1)), Some(Value::from("name")));
    assert_eq!(names.get(&Key::Int(3)), Some(Value::from("doc")));
}

#[test]
fn test_kvmap_into_existing_table() {
    let out = Table::new();
    out.push("first");
    let source = Table::new();
    source.insert("a", 1i64);
    source.insert("b", 2i64);
    kvmap_into(
        &source,
        |k, v| match k {
            Key::Str(s) if s == "a" => Some(Mapped::Value(v.clone())),
            _ => Some(Mapped::Pair(k.clone(), v.clone())),
        },
        &out,
    );
    assert_eq!(out.get(&Key::Int(2)), Some(Value::from(1i64)));
    assert_eq!(out.get(&Key::from("b")), Some(Value::from(2i64)));
}

#[test]
fn test_copy_semantics() {
    assert!(copy(None).is_empty());

    let source = Table::new();
    source.insert("a", 1i64);
    source.insert("b", 2i64);
    let dup = copy(Some(&source));
    assert!(!dup.ptr_eq(&source));
    let mut entries = dup.entries();
    entries.sort_by_key(|(k, _)| k.to_string());
    assert_eq!(
        entries,
        vec![
            (Key::from("a"), Value::from(1i64)),
            (Key::from("b"), Value::from(2i64)),
        ]
    );

    let target = Table::new();
    target.insert("a", 0i64);
    target.insert("c", 3i64);
    copy_into(Some(&source), &target);
    assert_eq!(target.len(), 3);
    assert_eq!(target.get(&Key::from("a")), Some(Value::from(1i64)));
}

#[test]
fn test_walk_with_stable_order_over_reader_table() {
    let root = Value::from(reader_table());
    let mut keys = Vec::new();
    walk_with(
        &root,
        |index, _, _| {
            keys.extend(index.map(Key::to_string));
            true
        },
        ember::stable_children,
    );
    assert_eq!(keys, vec!["name", "arity", "doc"]);
}
