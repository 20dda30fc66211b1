//! Dependency registry.
//!
//! Maps logical capability names to lazily constructed values. The registry
//! is built with `&mut` access during bootstrap and then frozen behind an
//! `Arc`; pipeline-time readers only ever see `&Registry`.
//!
//! # Data Flow
//! ```text
//! main.rs
//!     → Registry::new() + update(configuration, secret provider)
//!     → bootstrap handlers update(clients, store client)
//!     → Arc<Registry> (immutable)
//!     → PipelineContext / export stage read entries
//! ```

pub mod names;

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

type Value = Arc<dyn Any + Send + Sync>;
type Constructor = Box<dyn Fn(&Registry) -> Option<Value> + Send + Sync>;

struct Entry {
    constructor: Constructor,
    value: OnceLock<Option<Value>>,
}

/// Name → lazily constructed value mapping.
#[derive(Default)]
pub struct Registry {
    entries: HashMap<&'static str, Entry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the constructor for `name`.
    ///
    /// The constructor runs on first `get`. Returning `None` records the
    /// entry as present-but-absent, which is a valid state.
    pub fn update<T, F>(&mut self, name: &'static str, constructor: F)
    where
        T: Any + Send + Sync,
        F: Fn(&Registry) -> Option<T> + Send + Sync + 'static,
    {
        let constructor: Constructor =
            Box::new(move |registry| constructor(registry).map(|v| Arc::new(v) as Value));
        self.entries.insert(
            name,
            Entry {
                constructor,
                value: OnceLock::new(),
            },
        );
    }

    /// Register an already constructed value.
    pub fn insert<T>(&mut self, name: &'static str, value: T)
    where
        T: Any + Send + Sync + Clone,
    {
        self.update(name, move |_| Some(value.clone()));
    }

    /// Look up `name`, constructing it on first access.
    ///
    /// Returns `None` when the name is unknown, when the constructor
    /// produced nothing, or when the stored value is not a `T`.
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        let entry = self.entries.get(name)?;
        let value = entry
            .value
            .get_or_init(|| (entry.constructor)(self))
            .clone()?;
        value.downcast::<T>().ok()
    }

    /// Look up `name` and clone the value out of its `Arc`.
    pub fn get_cloned<T: Any + Send + Sync + Clone>(&self, name: &str) -> Option<T> {
        self.get::<T>(name).map(|v| (*v).clone())
    }

    /// Whether a constructor is registered for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.entries.keys().collect();
        names.sort();
        f.debug_struct("Registry").field("entries", &names).finish()
    }
}
