//! The IR node kinds produced by the reader and consumed by the compiler.
//!
//! Every node is a cheap handle around shared state, so cloning a node
//! aliases it rather than copying it. Container kinds (`List`, `Sequence`,
//! `Table`) allow their contents to be mutated through any handle, which is
//! how macros rewrite forms in place; the kind of a node never changes.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};

use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::interner::InternedSymbol;
use crate::iter::stablepairs;
use crate::multisym::{MultiSym, multi_sym};
use crate::span::SourceSpan;
use crate::value::{Key, Value};

// ============================================================================
// Node
// ============================================================================

static NEXT_SERIAL: AtomicU64 = AtomicU64::new(1);

/// Creation number of an identity-compared node.
fn next_serial() -> u64 {
    NEXT_SERIAL.fetch_add(1, AtomicOrdering::Relaxed)
}

/// The closed set of IR node kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Symbol,
    List,
    Sequence,
    Varg,
    Comment,
    Expr,
    Table,
}

impl NodeKind {
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Symbol => "symbol",
            NodeKind::List => "list",
            NodeKind::Sequence => "sequence",
            NodeKind::Varg => "varg",
            NodeKind::Comment => "comment",
            NodeKind::Expr => "expr",
            NodeKind::Table => "table",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One IR value of a fixed kind.
#[derive(Debug, Clone)]
pub enum Node {
    Symbol(Symbol),
    List(List),
    Sequence(Sequence),
    Varg(Varg),
    Comment(Comment),
    Expr(Expr),
    Table(Table),
}

impl Node {
    pub fn symbol(name: &str) -> Node {
        Node::Symbol(Symbol::new(name))
    }

    pub fn symbol_with_span(name: &str, span: SourceSpan) -> Node {
        Node::Symbol(Symbol::with_span(name, span))
    }

    pub fn list(items: Vec<Value>) -> Node {
        Node::List(List::new(items))
    }

    pub fn list_with_span(items: Vec<Value>, span: SourceSpan) -> Node {
        Node::List(List::with_span(items, span))
    }

    pub fn sequence(items: Vec<Value>) -> Node {
        Node::Sequence(Sequence::new(items))
    }

    pub fn sequence_with_span(items: Vec<Value>, span: SourceSpan) -> Node {
        Node::Sequence(Sequence::with_span(items, span))
    }

    pub fn varg() -> Node {
        Node::Varg(Varg::new())
    }

    pub fn varg_with_span(span: SourceSpan) -> Node {
        Node::Varg(Varg::with_span(span))
    }

    pub fn comment(text: &str) -> Node {
        Node::Comment(Comment::new(text))
    }

    pub fn comment_with_span(text: &str, span: SourceSpan) -> Node {
        Node::Comment(Comment::with_span(text, span))
    }

    pub fn expr(code: &str, category: ExprCategory) -> Node {
        Node::Expr(Expr::new(code, category))
    }

    pub fn table() -> Node {
        Node::Table(Table::new())
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Symbol(_) => NodeKind::Symbol,
            Node::List(_) => NodeKind::List,
            Node::Sequence(_) => NodeKind::Sequence,
            Node::Varg(_) => NodeKind::Varg,
            Node::Comment(_) => NodeKind::Comment,
            Node::Expr(_) => NodeKind::Expr,
            Node::Table(_) => NodeKind::Table,
        }
    }

    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self {
            Node::Symbol(sym) => Some(sym),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&List> {
        match self {
            Node::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&Sequence> {
        match self {
            Node::Sequence(seq) => Some(seq),
            _ => None,
        }
    }

    pub fn as_varg(&self) -> Option<&Varg> {
        match self {
            Node::Varg(varg) => Some(varg),
            _ => None,
        }
    }

    pub fn as_comment(&self) -> Option<&Comment> {
        match self {
            Node::Comment(comment) => Some(comment),
            _ => None,
        }
    }

    pub fn as_expr(&self) -> Option<&Expr> {
        match self {
            Node::Expr(expr) => Some(expr),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Node::Table(table) => Some(table),
            _ => None,
        }
    }

    /// The source span recorded for this node, if any. Exprs never have one.
    pub fn span(&self) -> Option<&SourceSpan> {
        match self {
            Node::Symbol(sym) => sym.span(),
            Node::List(list) => list.span(),
            Node::Sequence(seq) => seq.span(),
            Node::Varg(varg) => varg.span(),
            Node::Comment(comment) => comment.span(),
            Node::Expr(_) => None,
            Node::Table(table) => table.span(),
        }
    }

    /// Whether two handles refer to the very same node.
    pub fn ptr_eq(&self, other: &Node) -> bool {
        self.identity() == other.identity()
    }

    /// A short label that never looks inside containers: the name of a
    /// symbol, the text of a comment, the code of an expr, otherwise the
    /// kind name.
    pub(crate) fn shallow_label(&self) -> String {
        match self {
            Node::Symbol(sym) => sym.name(),
            Node::Comment(comment) => comment.text().to_string(),
            Node::Expr(expr) => expr.code().to_string(),
            other => other.kind().name().to_string(),
        }
    }

    /// Order of creation among identity-compared nodes. Symbols and
    /// comments compare by text and report 0.
    pub(crate) fn serial(&self) -> u64 {
        match self {
            Node::Symbol(_) | Node::Comment(_) => 0,
            Node::List(list) => list.inner.serial,
            Node::Sequence(seq) => seq.inner.serial,
            Node::Varg(varg) => varg.inner.serial,
            Node::Expr(expr) => expr.inner.serial,
            Node::Table(table) => table.inner.serial,
        }
    }

    fn identity(&self) -> (NodeKind, usize) {
        let addr = match self {
            Node::Symbol(sym) => Arc::as_ptr(&sym.inner) as *const () as usize,
            Node::List(list) => Arc::as_ptr(&list.inner) as *const () as usize,
            Node::Sequence(seq) => Arc::as_ptr(&seq.inner) as *const () as usize,
            Node::Varg(varg) => Arc::as_ptr(&varg.inner) as *const () as usize,
            Node::Comment(comment) => Arc::as_ptr(&comment.inner) as *const () as usize,
            Node::Expr(expr) => Arc::as_ptr(&expr.inner) as *const () as usize,
            Node::Table(table) => Arc::as_ptr(&table.inner) as *const () as usize,
        };
        (self.kind(), addr)
    }
}

/// The source span of any value, or an empty span when none is recorded.
pub fn ast_source(value: &Value) -> SourceSpan {
    value
        .as_node()
        .and_then(Node::span)
        .cloned()
        .unwrap_or_default()
}

// Symbols and comments compare by text; everything else by identity.
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Node::Symbol(a), Node::Symbol(b)) => a == b,
            (Node::Comment(a), Node::Comment(b)) => a == b,
            _ => self.identity() == other.identity(),
        }
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Node::Symbol(sym) => {
                NodeKind::Symbol.hash(state);
                sym.inner.name.hash(state);
            }
            Node::Comment(comment) => {
                NodeKind::Comment.hash(state);
                comment.inner.text.hash(state);
            }
            _ => self.identity().hash(state),
        }
    }
}

impl PartialOrd for Node {
    /// Only symbols and comments are ordered, each among their own kind.
    /// Any other node is only comparable with itself.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Node::Symbol(a), Node::Symbol(b)) => Some(a.cmp(b)),
            (Node::Comment(a), Node::Comment(b)) => Some(a.cmp(b)),
            _ if self == other => Some(Ordering::Equal),
            _ => None,
        }
    }
}

thread_local! {
    /// Containers currently being printed on this thread.
    static PRINTING: RefCell<FxHashSet<usize>> = RefCell::new(FxHashSet::default());
}

struct PrintGuard(usize);

impl PrintGuard {
    fn enter(node: &Node) -> Option<PrintGuard> {
        let (_, addr) = node.identity();
        PRINTING
            .with(|printing| printing.borrow_mut().insert(addr))
            .then(|| PrintGuard(addr))
    }
}

impl Drop for PrintGuard {
    fn drop(&mut self) {
        PRINTING.with(|printing| {
            printing.borrow_mut().remove(&self.0);
        });
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Symbol(sym) => write!(f, "{sym}"),
            Node::Varg(_) => write!(f, "..."),
            Node::Comment(comment) => write!(f, "{}", comment.text()),
            Node::Expr(expr) => write!(f, "{}", expr.code()),
            container => {
                // A container reached again while printing itself.
                let Some(_guard) = PrintGuard::enter(container) else {
                    return write!(f, "<cycle>");
                };
                write_container(f, container)
            }
        }
    }
}

fn write_container(f: &mut fmt::Formatter<'_>, node: &Node) -> fmt::Result {
    match node {
        Node::List(list) => write_items(f, "(", &list.items(), ")"),
        Node::Sequence(seq) => write_items(f, "[", &seq.items(), "]"),
        Node::Table(table) => {
            write!(f, "{{")?;
            for (i, (k, v)) in stablepairs(table).enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{k} {v}")?;
            }
            write!(f, "}}")
        }
        // Leaves are printed directly by `Display`.
        _ => Ok(()),
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, open: &str, items: &[Value], close: &str) -> fmt::Result {
    write!(f, "{open}")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{item}")?;
    }
    write!(f, "{close}")
}

// ============================================================================
// Symbol
// ============================================================================

#[derive(Debug)]
struct SymbolData {
    name: InternedSymbol,
    span: Option<SourceSpan>,
    quoted: AtomicBool,
}

/// A name that identifies a binding or a reference.
#[derive(Debug, Clone)]
pub struct Symbol {
    inner: Arc<SymbolData>,
}

impl Symbol {
    pub fn new(name: &str) -> Self {
        Symbol::build(name, None)
    }

    pub fn with_span(name: &str, span: SourceSpan) -> Self {
        Symbol::build(name, Some(span))
    }

    /// Build a symbol whose span is read from a source table; non-string
    /// keys in `source` are dropped.
    pub fn from_source(name: &str, source: &Table) -> Self {
        Symbol::with_span(name, SourceSpan::from_table(source))
    }

    fn build(name: &str, span: Option<SourceSpan>) -> Self {
        Symbol {
            inner: Arc::new(SymbolData {
                name: InternedSymbol::new(name),
                span,
                quoted: AtomicBool::new(false),
            }),
        }
    }

    pub fn name(&self) -> String {
        self.inner.name.resolve()
    }

    /// Run `f` with the name without allocating.
    pub fn with_name<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&str) -> R,
    {
        self.inner.name.with_str(f)
    }

    pub fn interned(&self) -> InternedSymbol {
        self.inner.name
    }

    /// Whether this symbol has the given name.
    pub fn is_named(&self, name: &str) -> bool {
        self.with_name(|own| own == name)
    }

    pub fn span(&self) -> Option<&SourceSpan> {
        self.inner.span.as_ref()
    }

    /// Whether the quote macro produced this symbol.
    pub fn is_quoted(&self) -> bool {
        self.inner.quoted.load(AtomicOrdering::Relaxed)
    }

    pub fn set_quoted(&self, quoted: bool) {
        self.inner.quoted.store(quoted, AtomicOrdering::Relaxed);
    }

    /// Decompose a dotted or colon-separated name into its path segments.
    pub fn multi_sym(&self) -> Option<MultiSym> {
        self.with_name(multi_sym)
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.inner.name == other.inner.name
    }
}

impl Eq for Symbol {}

impl PartialOrd for Symbol {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Symbol {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.name.cmp_text(&other.inner.name)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner.name)
    }
}

// ============================================================================
// List and Sequence
// ============================================================================

#[derive(Debug)]
struct Elements {
    items: RwLock<Vec<Value>>,
    span: Option<SourceSpan>,
    serial: u64,
}

// List and Sequence share their storage and API but stay distinct types so
// that one can never be mistaken for the other.
macro_rules! ordered_node {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name {
            inner: Arc<Elements>,
        }

        impl $name {
            pub fn new(items: Vec<Value>) -> Self {
                $name::build(items, None)
            }

            pub fn with_span(items: Vec<Value>, span: SourceSpan) -> Self {
                $name::build(items, Some(span))
            }

            fn build(items: Vec<Value>, span: Option<SourceSpan>) -> Self {
                $name {
                    inner: Arc::new(Elements {
                        items: RwLock::new(items),
                        span,
                        serial: next_serial(),
                    }),
                }
            }

            pub fn len(&self) -> usize {
                self.inner.items.read().len()
            }

            pub fn is_empty(&self) -> bool {
                self.inner.items.read().is_empty()
            }

            /// Zero-based element access.
            pub fn get(&self, index: usize) -> Option<Value> {
                self.inner.items.read().get(index).cloned()
            }

            pub fn first(&self) -> Option<Value> {
                self.get(0)
            }

            /// A snapshot of the current elements.
            pub fn items(&self) -> Vec<Value> {
                self.inner.items.read().clone()
            }

            pub fn push(&self, value: impl Into<Value>) {
                self.inner.items.write().push(value.into());
            }

            /// Replace the element at `index`, returning the old one.
            /// Out-of-range indices leave the node untouched.
            pub fn set(&self, index: usize, value: impl Into<Value>) -> Option<Value> {
                let mut items = self.inner.items.write();
                items
                    .get_mut(index)
                    .map(|slot| std::mem::replace(slot, value.into()))
            }

            pub fn insert(&self, index: usize, value: impl Into<Value>) {
                let mut items = self.inner.items.write();
                let index = index.min(items.len());
                items.insert(index, value.into());
            }

            pub fn remove(&self, index: usize) -> Option<Value> {
                let mut items = self.inner.items.write();
                (index < items.len()).then(|| items.remove(index))
            }

            /// Replace all elements at once.
            pub fn replace_items(&self, items: Vec<Value>) -> Vec<Value> {
                std::mem::replace(&mut *self.inner.items.write(), items)
            }

            pub fn span(&self) -> Option<&SourceSpan> {
                self.inner.span.as_ref()
            }

            pub fn ptr_eq(&self, other: &$name) -> bool {
                Arc::ptr_eq(&self.inner, &other.inner)
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.ptr_eq(other)
            }
        }
    };
}

ordered_node! {
    /// A parenthesized form: a call, a special form, or a macro invocation.
    List
}

ordered_node! {
    /// A bracketed literal.
    Sequence
}

impl List {
    /// The head symbol of a call form, e.g. `fn` in `(fn f [x] x)`.
    pub fn head_symbol(&self) -> Option<Symbol> {
        self.first().and_then(|head| head.as_symbol().cloned())
    }
}

// ============================================================================
// Varg
// ============================================================================

#[derive(Debug)]
struct VargData {
    span: Option<SourceSpan>,
    serial: u64,
}

/// The `...` placeholder for variadic arguments.
#[derive(Debug, Clone)]
pub struct Varg {
    inner: Arc<VargData>,
}

impl Varg {
    pub fn new() -> Self {
        Varg {
            inner: Arc::new(VargData {
                span: None,
                serial: next_serial(),
            }),
        }
    }

    pub fn with_span(span: SourceSpan) -> Self {
        Varg {
            inner: Arc::new(VargData {
                span: Some(span),
                serial: next_serial(),
            }),
        }
    }

    pub fn from_source(source: &Table) -> Self {
        Varg::with_span(SourceSpan::from_table(source))
    }

    pub fn span(&self) -> Option<&SourceSpan> {
        self.inner.span.as_ref()
    }
}

impl Default for Varg {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Varg {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

// ============================================================================
// Comment
// ============================================================================

#[derive(Debug)]
struct CommentData {
    text: String,
    span: Option<SourceSpan>,
}

/// A source comment carried through the pipeline for tooling.
#[derive(Debug, Clone)]
pub struct Comment {
    inner: Arc<CommentData>,
}

impl Comment {
    pub fn new(text: &str) -> Self {
        Comment {
            inner: Arc::new(CommentData {
                text: text.to_string(),
                span: None,
            }),
        }
    }

    pub fn with_span(text: &str, span: SourceSpan) -> Self {
        Comment {
            inner: Arc::new(CommentData {
                text: text.to_string(),
                span: Some(span),
            }),
        }
    }

    pub fn text(&self) -> &str {
        &self.inner.text
    }

    pub fn span(&self) -> Option<&SourceSpan> {
        self.inner.span.as_ref()
    }
}

impl PartialEq for Comment {
    fn eq(&self, other: &Self) -> bool {
        self.inner.text == other.inner.text
    }
}

impl Eq for Comment {}

impl PartialOrd for Comment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Comment {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.text.cmp(&other.inner.text)
    }
}

// ============================================================================
// Expr
// ============================================================================

/// How a fragment of generated code may be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExprCategory {
    /// A constant such as `nil`, `true` or a number.
    Literal,
    /// Any value-producing expression.
    Expression,
    /// Code that can only stand as a statement.
    Statement,
    /// A `...` expansion.
    Vargs,
    /// A plain reference to a local or global name.
    SymRef,
}

#[derive(Debug)]
struct ExprData {
    code: String,
    category: ExprCategory,
    serial: u64,
}

/// A fragment of already-generated target code.
#[derive(Debug, Clone)]
pub struct Expr {
    inner: Arc<ExprData>,
}

impl Expr {
    pub fn new(code: &str, category: ExprCategory) -> Self {
        Expr {
            inner: Arc::new(ExprData {
                code: code.to_string(),
                category,
                serial: next_serial(),
            }),
        }
    }

    pub fn code(&self) -> &str {
        &self.inner.code
    }

    pub fn category(&self) -> ExprCategory {
        self.inner.category
    }
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

// ============================================================================
// Table
// ============================================================================

#[derive(Debug, Default)]
struct TableState {
    entries: FxHashMap<Key, Value>,
    /// Key order recorded by the reader when it built this table.
    order: Option<Vec<Key>>,
    /// Fallback table consulted for keys this one lacks.
    delegate: Option<Table>,
}

#[derive(Debug)]
struct TableData {
    state: RwLock<TableState>,
    span: Option<SourceSpan>,
    serial: u64,
}

/// A plain associative node.
///
/// The source span lives beside the entries, never under a key, so user keys
/// such as `"line"` cannot collide with it. Native enumeration order
/// (`entries`, `keys`) is unspecified; use `stablepairs` for a
/// reproducible order.
#[derive(Clone)]
pub struct Table {
    inner: Arc<TableData>,
}

impl Table {
    pub fn new() -> Self {
        Table::build(TableState::default(), None)
    }

    pub fn with_span(span: SourceSpan) -> Self {
        Table::build(TableState::default(), Some(span))
    }

    /// Build a table the way the reader does: entries in source order, with
    /// that order recorded for `stablepairs`.
    pub fn from_ordered(entries: Vec<(Key, Value)>, span: Option<SourceSpan>) -> Self {
        let order: Vec<Key> = entries.iter().map(|(k, _)| k.clone()).collect();
        let entries = entries.into_iter().filter(|(_, v)| !v.is_nil()).collect();
        Table::build(
            TableState {
                entries,
                order: Some(order),
                delegate: None,
            },
            span,
        )
    }

    fn build(state: TableState, span: Option<SourceSpan>) -> Self {
        Table {
            inner: Arc::new(TableData {
                state: RwLock::new(state),
                span,
                serial: next_serial(),
            }),
        }
    }

    /// Look up a key in this table only.
    pub fn get(&self, key: &Key) -> Option<Value> {
        self.inner.state.read().entries.get(key).cloned()
    }

    /// Look up a key here, then along the delegate chain.
    pub fn lookup(&self, key: &Key) -> Option<Value> {
        let mut current = Some(self.clone());
        let mut visited = Vec::new();
        while let Some(table) = current {
            if visited.iter().any(|seen: &Table| seen.ptr_eq(&table)) {
                return None;
            }
            let state = table.inner.state.read();
            if let Some(value) = state.entries.get(key) {
                return Some(value.clone());
            }
            current = state.delegate.clone();
            drop(state);
            visited.push(table);
        }
        None
    }

    pub fn contains_key(&self, key: &Key) -> bool {
        self.inner.state.read().entries.contains_key(key)
    }

    /// Store a value under a key, returning the previous value.
    /// Storing `Value::Nil` removes the key.
    pub fn insert(&self, key: impl Into<Key>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        let mut state = self.inner.state.write();
        if value.is_nil() {
            state.entries.remove(&key)
        } else {
            state.entries.insert(key, value)
        }
    }

    pub fn remove(&self, key: &Key) -> Option<Value> {
        self.inner.state.write().entries.remove(key)
    }

    /// Number of entries, positional or not.
    pub fn len(&self) -> usize {
        self.inner.state.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.state.read().entries.is_empty()
    }

    /// Length of the positional part: the largest `n` such that keys
    /// `1..=n` are all present.
    pub fn border(&self) -> i64 {
        let state = self.inner.state.read();
        let mut n = 0;
        while state.entries.contains_key(&Key::Int(n + 1)) {
            n += 1;
        }
        n
    }

    /// Append a value at the next positional key.
    pub fn push(&self, value: impl Into<Value>) {
        let next = self.border() + 1;
        self.insert(next, value);
    }

    /// Keys in native (unspecified) order.
    pub fn keys(&self) -> Vec<Key> {
        self.inner.state.read().entries.keys().cloned().collect()
    }

    /// Entries in native (unspecified) order.
    pub fn entries(&self) -> Vec<(Key, Value)> {
        self.inner
            .state
            .read()
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn key_order(&self) -> Option<Vec<Key>> {
        self.inner.state.read().order.clone()
    }

    /// Record (or clear) the insertion order used by `stablepairs`.
    pub fn set_key_order(&self, order: Option<Vec<Key>>) {
        self.inner.state.write().order = order;
    }

    pub fn delegate(&self) -> Option<Table> {
        self.inner.state.read().delegate.clone()
    }

    /// Set the fallback table consulted by `lookup` and `allpairs`.
    pub fn set_delegate(&self, delegate: Option<Table>) {
        self.inner.state.write().delegate = delegate;
    }

    pub fn span(&self) -> Option<&SourceSpan> {
        self.inner.span.as_ref()
    }

    pub fn ptr_eq(&self, other: &Table) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn id(&self) -> usize {
        Arc::as_ptr(&self.inner) as *const () as usize
    }
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

// Tables may delegate to themselves, so Debug stays shallow.
impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.read();
        f.debug_struct("Table")
            .field("id", &format!("{:#x}", self.id()))
            .field("len", &state.entries.len())
            .field("ordered", &state.order.is_some())
            .field("delegate", &state.delegate.as_ref().map(Table::id))
            .field("span", &self.inner.span)
            .finish()
    }
}
