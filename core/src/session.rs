//! Compile session state: the chunk being written, the scope being compiled
//! in, and the options in effect.
//!
//! A nested compile (a macro calling the compiler, a REPL evaluation)
//! installs its own root with `enter` and returns to the previous one with
//! `reset`. Sessions are independent values, so concurrent compiles each
//! use their own.

use std::fmt;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::VERSION;
use crate::options::CompileOptions;
use crate::plugin::{Plugin, PluginId};

// ============================================================================
// Warning sink
// ============================================================================

/// Destination for non-fatal compiler warnings.
pub trait WarningSink: Send {
    fn warn(&mut self, message: &str);
}

/// Forwards warnings to `tracing` at WARN level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl WarningSink for TracingSink {
    fn warn(&mut self, message: &str) {
        tracing::warn!(target: "ember", "{message}");
    }
}

impl<F> WarningSink for F
where
    F: FnMut(&str) + Send,
{
    fn warn(&mut self, message: &str) {
        self(message)
    }
}

// ============================================================================
// Chunk and Scope
// ============================================================================

/// Accumulated output of a compile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chunk {
    lines: Vec<String>,
}

impl Chunk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lines.join("\n"))
    }
}

/// A lexical scope: source names mangled to target-safe names.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    pub parent: Option<Arc<Scope>>,
    pub depth: usize,
    pub manglings: FxHashMap<String, String>,
    pub unmanglings: FxHashMap<String, String>,
    /// Whether `...` is available in this scope.
    pub vararg: bool,
}

impl Scope {
    /// A top-level scope.
    pub fn root() -> Self {
        Self::default()
    }

    /// A scope nested in `parent`, inheriting its vararg availability.
    pub fn child(parent: &Arc<Scope>) -> Self {
        Scope {
            parent: Some(Arc::clone(parent)),
            depth: parent.depth + 1,
            vararg: parent.vararg,
            ..Self::default()
        }
    }

    /// Record that `name` compiles to `mangled` in this scope.
    pub fn bind(&mut self, name: impl Into<String>, mangled: impl Into<String>) {
        let name = name.into();
        let mangled = mangled.into();
        self.unmanglings.insert(mangled.clone(), name.clone());
        self.manglings.insert(name, mangled);
    }

    /// Find the mangled name of `name`, walking up the parent chain.
    pub fn mangling(&self, name: &str) -> Option<&str> {
        if let Some(mangled) = self.manglings.get(name) {
            return Some(mangled.as_str());
        }
        match &self.parent {
            Some(parent) => parent.mangling(name),
            None => None,
        }
    }
}

// ============================================================================
// Session
// ============================================================================

/// The state of one compile: output chunk, current scope, options.
#[derive(Debug, Clone, Default)]
pub struct Root {
    pub chunk: Chunk,
    pub scope: Option<Arc<Scope>>,
    pub options: CompileOptions,
}

impl Root {
    pub fn new(options: CompileOptions) -> Self {
        Root {
            chunk: Chunk::new(),
            scope: Some(Arc::new(Scope::root())),
            options,
        }
    }
}

/// The live compile state plus the stack of roots it has replaced.
pub struct Session {
    root: Root,
    saved: Vec<Root>,
    /// Plugins already warned about in this session.
    warned: FxHashSet<PluginId>,
    sink: Box<dyn WarningSink>,
}

impl Session {
    pub fn new() -> Self {
        Self::with_sink(TracingSink)
    }

    pub fn with_sink(sink: impl WarningSink + 'static) -> Self {
        Session {
            root: Root::default(),
            saved: Vec::new(),
            warned: FxHashSet::default(),
            sink: Box::new(sink),
        }
    }

    pub fn root(&self) -> &Root {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Root {
        &mut self.root
    }

    pub fn chunk_mut(&mut self) -> &mut Chunk {
        &mut self.root.chunk
    }

    pub fn scope(&self) -> Option<&Arc<Scope>> {
        self.root.scope.as_ref()
    }

    pub fn options(&self) -> &CompileOptions {
        &self.root.options
    }

    pub fn options_mut(&mut self) -> &mut CompileOptions {
        &mut self.root.options
    }

    /// How many roots are saved beneath the current one.
    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    /// Install `root`, saving the current one for `reset`.
    pub fn enter(&mut self, root: Root) {
        let previous = std::mem::replace(&mut self.root, root);
        self.saved.push(previous);
        tracing::trace!(depth = self.saved.len(), "entered compile root");
    }

    /// Restore the root saved by the matching `enter`, returning the one it
    /// replaces. At the bottom of the stack nothing changes and `None` is
    /// returned.
    pub fn reset(&mut self) -> Option<Root> {
        let previous = self.saved.pop()?;
        tracing::trace!(depth = self.saved.len(), "restored compile root");
        Some(std::mem::replace(&mut self.root, previous))
    }

    /// Run `f` with `root` installed, then restore the current root even if
    /// `f` entered further roots without resetting them.
    pub fn nested<F, R>(&mut self, root: Root, f: F) -> R
    where
        F: FnOnce(&mut Session) -> R,
    {
        let depth = self.saved.len();
        self.enter(root);
        let result = f(self);
        while self.saved.len() > depth {
            self.reset();
        }
        result
    }

    /// The compiler version plugins are checked against.
    pub fn compiler_version(&self) -> String {
        self.root
            .options
            .version
            .clone()
            .unwrap_or_else(|| VERSION.to_string())
    }

    pub fn warn(&mut self, message: &str) {
        self.sink.warn(message);
    }

    /// Record that `plugin` has been warned about. Returns `false` if it
    /// already was.
    pub(crate) fn mark_warned(&mut self, plugin: &Arc<Plugin>) -> bool {
        self.warned.insert(PluginId(Arc::clone(plugin)))
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("root", &self.root)
            .field("depth", &self.saved.len())
            .field("warned", &self.warned.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enter_and_reset_restore_exact_snapshot() {
        let mut session = Session::new();
        session.chunk_mut().emit("local x = 1");
        session.options_mut().filename = Some("outer.emb".to_string());

        session.enter(Root::new(CompileOptions::new().with_filename("inner.emb")));
        assert_eq!(session.depth(), 1);
        assert!(session.root().chunk.is_empty());
        session.chunk_mut().emit("return 2");

        let inner = session.reset().expect("a saved root");
        assert_eq!(inner.chunk.lines(), ["return 2".to_string()]);
        assert_eq!(session.root().chunk.lines(), ["local x = 1".to_string()]);
        assert_eq!(session.options().filename.as_deref(), Some("outer.emb"));
        assert_eq!(session.depth(), 0);
    }

    #[test]
    fn test_reset_at_bottom_is_noop() {
        let mut session = Session::new();
        session.chunk_mut().emit("keep");
        assert!(session.reset().is_none());
        assert_eq!(session.root().chunk.len(), 1);
    }

    #[test]
    fn test_resets_chain() {
        let mut session = Session::new();
        for name in ["a", "b", "c"] {
            session.enter(Root::new(CompileOptions::new().with_filename(name)));
        }
        assert_eq!(session.options().filename.as_deref(), Some("c"));
        session.reset();
        assert_eq!(session.options().filename.as_deref(), Some("b"));
        session.reset();
        assert_eq!(session.options().filename.as_deref(), Some("a"));
        session.reset();
        assert_eq!(session.options().filename, None);
    }

    #[test]
    fn test_nested_restores_on_error_and_unbalanced_enter() {
        let mut session = Session::new();
        let result: Result<(), String> = session.nested(Root::default(), |s| {
            s.enter(Root::default());
            s.enter(Root::default());
            Err("macro failed".to_string())
        });
        assert!(result.is_err());
        assert_eq!(session.depth(), 0);
    }

    #[test]
    fn test_scope_mangling_walks_parents() {
        let mut root = Scope::root();
        root.bind("my-var", "my_var");
        let root = Arc::new(root);
        let mut child = Scope::child(&root);
        child.bind("x", "x_0");

        assert_eq!(child.depth, 1);
        assert_eq!(child.mangling("x"), Some("x_0"));
        assert_eq!(child.mangling("my-var"), Some("my_var"));
        assert_eq!(child.mangling("absent"), None);
        assert_eq!(root.unmanglings.get("my_var").map(String::as_str), Some("my-var"));
    }

    #[test]
    fn test_closure_sink() {
        let collected = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = {
            let collected = Arc::clone(&collected);
            move |message: &str| collected.lock().push(message.to_string())
        };
        let mut session = Session::with_sink(sink);
        session.warn("careful");
        assert_eq!(*collected.lock(), vec!["careful".to_string()]);
    }

    #[test]
    fn test_compiler_version_override() {
        let mut session = Session::new();
        assert_eq!(session.compiler_version(), VERSION);
        session.options_mut().version = Some("2.0.0".to_string());
        assert_eq!(session.compiler_version(), "2.0.0");
    }
}
