//! Compiler plugins and hook dispatch.
//!
//! Compiler phases announce named events (`"symbol-to-expression"`,
//! `"call"`, `"do"`, ...) through `hook`. Each plugin registered in the
//! session's options gets a chance to handle the event, in order; the first
//! truthy result short-circuits the rest.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::session::Session;
use crate::value::Value;

/// An event handler. It receives the live session so it can inspect or
/// change compile state, including running a nested compile.
pub type Handler = Arc<dyn Fn(&mut Session, &[Value]) -> Option<Value> + Send + Sync>;

/// A plugin: optional metadata plus handlers keyed by event name.
#[derive(Clone, Default)]
pub struct Plugin {
    pub name: Option<String>,
    /// Compiler versions this plugin declares support for.
    pub versions: Option<Vec<String>>,
    handlers: FxHashMap<String, Handler>,
}

impl Plugin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Plugin {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_versions<I, S>(mut self, versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.versions = Some(versions.into_iter().map(Into::into).collect());
        self
    }

    /// Register `handler` for `event`, replacing any earlier one.
    pub fn on<F>(mut self, event: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut Session, &[Value]) -> Option<Value> + Send + Sync + 'static,
    {
        self.handlers.insert(event.into(), Arc::new(handler));
        self
    }

    pub fn handler(&self, event: &str) -> Option<Handler> {
        self.handlers.get(event).cloned()
    }

    pub fn handles(&self, event: &str) -> bool {
        self.handlers.contains_key(event)
    }

    /// Whether `version` (with any `-dev` suffix removed) is declared.
    pub fn supports(&self, version: &str) -> bool {
        let release = version.strip_suffix("-dev").unwrap_or(version);
        self.versions
            .as_ref()
            .is_some_and(|versions| versions.iter().any(|v| v == release))
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("unknown")
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut events: Vec<&String> = self.handlers.keys().collect();
        events.sort();
        f.debug_struct("Plugin")
            .field("name", &self.name)
            .field("versions", &self.versions)
            .field("events", &events)
            .finish()
    }
}

/// A plugin compared and hashed by identity, for the warned-once set.
#[derive(Clone)]
pub(crate) struct PluginId(pub(crate) Arc<Plugin>);

impl PartialEq for PluginId {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for PluginId {}

impl Hash for PluginId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.0) as usize).hash(state);
    }
}

/// Warn, once per plugin object, when a plugin does not declare support for
/// the running compiler version. Returns whether the plugin is compatible.
///
/// The warned set belongs to `session`: a plugin shared by two sessions is
/// warned about once in each.
pub fn check_plugin_version(session: &mut Session, plugin: &Arc<Plugin>) -> bool {
    let version = session.compiler_version();
    if plugin.supports(&version) {
        return true;
    }
    if session.mark_warned(plugin) {
        session.warn(&format!(
            "plugin {} not known to be compatible with Ember {}",
            plugin.display_name(),
            version
        ));
    }
    false
}

/// Dispatch `event` to the plugins of the current options.
///
/// Plugins run in registration order. Incompatible plugins still run, after
/// a warning. The first handler returning a truthy value ends dispatch and
/// its value is returned; otherwise the result is `None`.
pub fn hook(session: &mut Session, event: &str, args: &[Value]) -> Option<Value> {
    // Handlers may swap the session's options, so dispatch over a snapshot.
    let plugins = session.options().plugins.clone();
    for plugin in &plugins {
        check_plugin_version(session, plugin);
        let Some(handler) = plugin.handler(event) else {
            continue;
        };
        tracing::trace!(event, plugin = plugin.display_name(), "dispatching hook");
        if let Some(result) = handler(session, args).filter(Value::is_truthy) {
            tracing::debug!(event, plugin = plugin.display_name(), "hook short-circuited");
            return Some(result);
        }
    }
    None
}
