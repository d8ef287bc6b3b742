//! Generic pre-order traversal of IR trees.

use crate::iter::stablepairs;
use crate::node::Node;
use crate::value::{Key, Value};

/// Children of a container node in native order: lists and sequences by
/// one-based position, tables in hash order. Other kinds have no children.
pub fn native_children(node: &Node) -> Vec<(Key, Value)> {
    match node {
        Node::List(list) => positional(list.items()),
        Node::Sequence(seq) => positional(seq.items()),
        Node::Table(table) => table.entries(),
        _ => Vec::new(),
    }
}

/// Like `native_children`, but tables are enumerated with `stablepairs`.
pub fn stable_children(node: &Node) -> Vec<(Key, Value)> {
    match node {
        Node::Table(table) => stablepairs(table).collect(),
        other => native_children(other),
    }
}

fn positional(items: Vec<Value>) -> Vec<(Key, Value)> {
    items
        .into_iter()
        .enumerate()
        .map(|(i, v)| (Key::Int(i as i64 + 1), v))
        .collect()
}

/// Walk `root` depth-first, pre-order, enumerating children in native order.
///
/// `visit(index, value, parent)` is called for every value reached; the root
/// gets no index and no parent. Children of a node are only visited when
/// `visit` returns `true` for it. Cyclic structures are not detected.
pub fn walk<'a, F>(root: &'a Value, visit: F) -> &'a Value
where
    F: FnMut(Option<&Key>, &Value, Option<&Node>) -> bool,
{
    walk_with(root, visit, native_children)
}

/// `walk` with a caller-supplied child enumeration, e.g. `stable_children`.
pub fn walk_with<'a, F, I>(root: &'a Value, mut visit: F, children: I) -> &'a Value
where
    F: FnMut(Option<&Key>, &Value, Option<&Node>) -> bool,
    I: Fn(&Node) -> Vec<(Key, Value)>,
{
    walk_value(root, None, None, &mut visit, &children);
    root
}

fn walk_value<F, I>(value: &Value, index: Option<&Key>, parent: Option<&Node>, visit: &mut F, children: &I)
where
    F: FnMut(Option<&Key>, &Value, Option<&Node>) -> bool,
    I: Fn(&Node) -> Vec<(Key, Value)>,
{
    if !visit(index, value, parent) {
        return;
    }
    if let Value::Node(node) = value {
        for (key, child) in children(node) {
            walk_value(&child, Some(&key), Some(node), visit, children);
        }
    }
}
