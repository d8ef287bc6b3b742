//! Core data model for Ember
//!
//! This crate contains the IR node kinds shared by the reader, compiler and
//! macro expander, the deterministic iteration and tree-walking utilities
//! built on them, and the plugin hook and compile session machinery. It does
//! not parse, expand macros, or generate code.

pub mod debug;
pub mod error;
pub mod interner;
pub mod iter;
pub mod multisym;
pub mod node;
pub mod options;
pub mod plugin;
pub mod session;
pub mod span;
pub mod value;
pub mod walk;

/// Version of the compiler, as checked against plugin declarations.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Re-export commonly used items for convenience
pub use debug::debug_on;
pub use error::{EmberError, Result};
pub use interner::InternedSymbol;
pub use iter::{
    AllPairs, Mapped, StablePairs, allpairs, copy, copy_into, every, kvmap, kvmap_into, map,
    map_into, member, stablepairs,
};
pub use multisym::{MultiSym, multi_sym};
pub use node::{
    Comment, Expr, ExprCategory, List, Node, NodeKind, Sequence, Symbol, Table, Varg, ast_source,
};
pub use options::{CompileOptions, EnvRef, PROPAGATED_OPTIONS, propagate_options};
pub use plugin::{Handler, Plugin, check_plugin_version, hook};
pub use session::{Chunk, Root, Scope, Session, TracingSink, WarningSink};
pub use span::SourceSpan;
pub use value::{Key, Number, Value};
pub use walk::{native_children, stable_children, walk, walk_with};
