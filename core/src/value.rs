//! Values stored inside IR containers, and the keys of associative nodes.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::EmberError;
use crate::multisym::multi_sym;
use crate::node::{Node, Symbol, Table};

// ============================================================================
// Numbers
// ============================================================================

/// A numeric literal as read from source.
#[derive(Debug, Clone, Copy)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a == b,
            (Number::Float(a), Number::Float(b)) => a == b,
            (Number::Int(a), Number::Float(b)) | (Number::Float(b), Number::Int(a)) => {
                *a as f64 == *b
            }
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(n) => write!(f, "{n}"),
            // Debug keeps the trailing ".0" so floats stay floats when printed.
            Number::Float(x) => write!(f, "{x:?}"),
        }
    }
}

// ============================================================================
// Values
// ============================================================================

/// Anything that can sit inside a list, sequence or table.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(Number),
    Str(String),
    Node(Node),
}

impl Value {
    /// Only `nil` and `false` are falsy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Value::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&Symbol> {
        self.as_node().and_then(Node::as_symbol)
    }

    pub fn as_table(&self) -> Option<&Table> {
        self.as_node().and_then(Node::as_table)
    }

    /// Name of this value's type, as used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Node(node) => node.kind().name(),
        }
    }

    /// Whether this value can be duplicated in generated code without
    /// changing meaning: literals, and symbols that are not field paths.
    pub fn is_idempotent_expr(&self) -> bool {
        match self {
            Value::Str(_) | Value::Number(_) | Value::Bool(_) => true,
            Value::Node(Node::Symbol(sym)) => sym.with_name(|name| multi_sym(name).is_none()),
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Node(a), Value::Node(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(Number::Int(n))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Number(Number::Float(x))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Node> for Value {
    fn from(node: Node) -> Self {
        Value::Node(node)
    }
}

impl From<Key> for Value {
    fn from(key: Key) -> Self {
        match key {
            Key::Bool(b) => Value::Bool(b),
            Key::Int(n) => Value::Number(Number::Int(n)),
            Key::Str(s) => Value::Str(s),
            Key::Node(node) => Value::Node(node),
        }
    }
}

fn escape_string(s: &str) -> String {
    let mut result = String::new();
    for c in s.chars() {
        match c {
            '\n' => result.push_str("\\n"),
            '\t' => result.push_str("\\t"),
            '\r' => result.push_str("\\r"),
            '\\' => result.push_str("\\\\"),
            '"' => result.push_str("\\\""),
            c => result.push(c),
        }
    }
    result
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Str(s) => write!(f, "\"{}\"", escape_string(s)),
            Value::Node(node) => write!(f, "{node}"),
        }
    }
}

// ============================================================================
// Keys
// ============================================================================

/// A key of an associative node.
///
/// `nil` is not a key. Node keys follow node equality: symbols and comments
/// by text, every other node by identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Bool(bool),
    Int(i64),
    Str(String),
    Node(Node),
}

impl Key {
    /// Tie-breaker between keys whose stringified forms collide (`1` vs `"1"`).
    /// Sort key for keys without a recorded position: text, then kind,
    /// then creation order. Node keys contribute only a shallow label, so
    /// building the key never descends into a container.
    pub(crate) fn sort_key(&self) -> (String, u8, u64) {
        match self {
            Key::Node(node) => (node.shallow_label(), self.rank(), node.serial()),
            other => (other.to_string(), other.rank(), 0),
        }
    }

    pub(crate) fn rank(&self) -> u8 {
        match self {
            Key::Int(_) => 0,
            Key::Bool(_) => 1,
            Key::Str(_) => 2,
            Key::Node(_) => 3,
        }
    }
}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Key::Bool(b) => b.hash(state),
            Key::Int(n) => n.hash(state),
            Key::Str(s) => s.hash(state),
            Key::Node(node) => node.hash(state),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Bool(b) => write!(f, "{b}"),
            Key::Int(n) => write!(f, "{n}"),
            Key::Str(s) => write!(f, "{s}"),
            Key::Node(node) => write!(f, "{node}"),
        }
    }
}

impl From<bool> for Key {
    fn from(b: bool) -> Self {
        Key::Bool(b)
    }
}

impl From<i64> for Key {
    fn from(n: i64) -> Self {
        Key::Int(n)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Str(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Str(s)
    }
}

impl From<Node> for Key {
    fn from(node: Node) -> Self {
        Key::Node(node)
    }
}

macro_rules! node_conversions {
    ($($kind:ident),*) => {
        $(
            impl From<crate::node::$kind> for Value {
                fn from(node: crate::node::$kind) -> Self {
                    Value::Node(Node::$kind(node))
                }
            }

            impl From<crate::node::$kind> for Key {
                fn from(node: crate::node::$kind) -> Self {
                    Key::Node(Node::$kind(node))
                }
            }
        )*
    };
}

node_conversions!(Symbol, List, Sequence, Varg, Comment, Expr, Table);

impl TryFrom<Value> for Key {
    type Error = EmberError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Bool(b) => Ok(Key::Bool(b)),
            Value::Number(Number::Int(n)) => Ok(Key::Int(n)),
            // Integral floats normalize to integer keys.
            Value::Number(Number::Float(x)) if x.fract() == 0.0 && x.is_finite() => {
                Ok(Key::Int(x as i64))
            }
            Value::Str(s) => Ok(Key::Str(s)),
            Value::Node(node) => Ok(Key::Node(node)),
            other => Err(EmberError::InvalidKey {
                found: other.to_string(),
            }),
        }
    }
}
