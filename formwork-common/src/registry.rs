//! Named registries for pluggable behaviour.
//!
//! Every pluggable category (type validators, custom validators, form
//! validators, submission handlers, widget components in the rendering layer)
//! is a [`Registry`]: a name → `Arc<T>` map with register / get / list /
//! unregister.
//!
//! A registry can be *sealed*: names present at sealing time become reserved
//! and any attempt to overwrite or remove them is refused with a warning. This
//! is how the closed built-in categories are protected while still allowing
//! new names to be added.
//!
//! Registries are meant to be filled during start-up. Mutation requires
//! `&mut self`; sharing a registry across threads while it is being mutated
//! is not supported.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

/// Outcome of [`Registry::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// The name was new.
    Added,
    /// An existing unreserved entry was overwritten.
    Replaced,
    /// The name is reserved; the registry is unchanged.
    Rejected,
}

impl Registration {
    /// True unless the registration was rejected.
    pub fn is_accepted(self) -> bool {
        !matches!(self, Registration::Rejected)
    }
}

/// A name → entry map with an optional set of reserved names.
pub struct Registry<T: ?Sized> {
    category: &'static str,
    entries: HashMap<String, Arc<T>>,
    reserved: HashSet<String>,
}

impl<T: ?Sized> Registry<T> {
    /// Create an empty registry. `category` is used in log lines only.
    pub fn new(category: &'static str) -> Self {
        Self {
            category,
            entries: HashMap::new(),
            reserved: HashSet::new(),
        }
    }

    /// The category label given at construction.
    pub fn category(&self) -> &'static str {
        self.category
    }

    /// Register `entry` under `name`.
    pub fn register(&mut self, name: impl Into<String>, entry: Arc<T>) -> Registration {
        let name = name.into();
        if self.reserved.contains(&name) {
            warn!(
                category = self.category,
                name = %name,
                "refusing to overwrite reserved registry entry"
            );
            return Registration::Rejected;
        }
        let outcome = if self.entries.insert(name.clone(), entry).is_some() {
            Registration::Replaced
        } else {
            Registration::Added
        };
        debug!(category = self.category, name = %name, ?outcome, "registered");
        outcome
    }

    /// Look up an entry.
    pub fn get(&self, name: &str) -> Option<Arc<T>> {
        self.entries.get(name).cloned()
    }

    /// Check if an entry exists
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// All registered names, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }

    /// Remove an entry. Reserved entries are kept and `None` is returned.
    pub fn unregister(&mut self, name: &str) -> Option<Arc<T>> {
        if self.reserved.contains(name) {
            warn!(
                category = self.category,
                name, "refusing to remove reserved registry entry"
            );
            return None;
        }
        let removed = self.entries.remove(name);
        if removed.is_some() {
            debug!(category = self.category, name, "unregistered");
        }
        removed
    }

    /// Reserve every name currently registered.
    pub fn seal(&mut self) {
        self.reserved.extend(self.entries.keys().cloned());
    }

    /// Whether `name` is reserved.
    pub fn is_reserved(&self, name: &str) -> bool {
        self.reserved.contains(name)
    }

    /// Remove every unreserved entry.
    pub fn clear(&mut self) {
        let reserved = &self.reserved;
        self.entries.retain(|name, _| reserved.contains(name));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: ?Sized> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("category", &self.category)
            .field("entries", &self.list())
            .field("reserved", &self.reserved.len())
            .finish()
    }
}
