//! Compile options and their propagation into nested compiles.

use std::sync::Arc;

use crate::node::Table;
use crate::plugin::Plugin;

/// Names of the options copied from a parent compile into a nested one.
pub const PROPAGATED_OPTIONS: [&str; 6] = [
    "allowed-globals",
    "indent",
    "correlate",
    "use-metadata",
    "env",
    "compiler-env",
];

/// An environment a compile runs against.
#[derive(Debug, Clone, PartialEq)]
pub enum EnvRef {
    /// A user-supplied environment table.
    Table(Table),
    /// Share the environment the compiler itself runs in.
    Compiler,
    /// A locked-down environment exposing only safe globals.
    Strict,
}

/// Options controlling a single compile.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Globals the compiled code may reference; `None` allows any.
    pub allowed_globals: Option<Vec<String>>,
    /// Indentation unit for generated code.
    pub indent: Option<String>,
    /// Keep generated lines aligned with source lines.
    pub correlate: Option<bool>,
    /// Record docstrings and arglists as function metadata.
    pub use_metadata: Option<bool>,
    pub env: Option<EnvRef>,
    /// Environment macros are evaluated in.
    pub compiler_env: Option<EnvRef>,

    pub filename: Option<String>,
    pub module_name: Option<String>,
    pub require_as_include: bool,
    /// Plugins consulted by `hook`, in order.
    pub plugins: Vec<Arc<Plugin>>,
    /// Overrides the compiler version plugins are checked against.
    pub version: Option<String>,
}

impl CompileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_allowed_globals<I, S>(mut self, globals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_globals = Some(globals.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_indent(mut self, indent: impl Into<String>) -> Self {
        self.indent = Some(indent.into());
        self
    }

    pub fn with_correlate(mut self, correlate: bool) -> Self {
        self.correlate = Some(correlate);
        self
    }

    pub fn with_use_metadata(mut self, use_metadata: bool) -> Self {
        self.use_metadata = Some(use_metadata);
        self
    }

    pub fn with_env(mut self, env: EnvRef) -> Self {
        self.env = Some(env);
        self
    }

    pub fn with_compiler_env(mut self, env: EnvRef) -> Self {
        self.compiler_env = Some(env);
        self
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_plugin(mut self, plugin: Plugin) -> Self {
        self.plugins.push(Arc::new(plugin));
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

/// Copy the propagated options from `parent` into `child` (a fresh set of
/// options when `None`) and return it.
///
/// Only options the parent sets are copied; the child keeps its own value
/// for any the parent leaves unset. No other field is touched.
pub fn propagate_options(parent: &CompileOptions, child: Option<CompileOptions>) -> CompileOptions {
    let mut child = child.unwrap_or_default();
    for name in PROPAGATED_OPTIONS {
        copy_option(name, parent, &mut child);
    }
    child
}

/// Copy the option called `name` from `parent` into `child`. Returns `false`
/// if `name` is not a propagated option.
fn copy_option(name: &str, parent: &CompileOptions, child: &mut CompileOptions) -> bool {
    match name {
        "allowed-globals" => copy_if_set(&parent.allowed_globals, &mut child.allowed_globals),
        "indent" => copy_if_set(&parent.indent, &mut child.indent),
        "correlate" => copy_if_set(&parent.correlate, &mut child.correlate),
        "use-metadata" => copy_if_set(&parent.use_metadata, &mut child.use_metadata),
        "env" => copy_if_set(&parent.env, &mut child.env),
        "compiler-env" => copy_if_set(&parent.compiler_env, &mut child.compiler_env),
        _ => return false,
    }
    true
}

fn copy_if_set<T: Clone>(from: &Option<T>, to: &mut Option<T>) {
    if let Some(value) = from {
        *to = Some(value.clone());
    }
}
