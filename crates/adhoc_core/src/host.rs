//! Host capability interface
//!
//! The binder never talks to a UI framework directly. Everything it needs
//! from the component being enhanced goes through [`Host`]: a place to keep
//! state, a way to inject properties, and mount/unmount hooks. A framework
//! plugs in by implementing the trait; [`crate::component::Instance`] is the
//! in-memory implementation.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::dispatch::Dispatch;
use crate::error::BindError;

/// Reads the current value of a state slot
pub type Getter<V> = Rc<dyn Fn() -> V>;

/// Overwrites a state slot
pub type Setter<V> = Rc<dyn Fn(V)>;

/// Runs once when the component mounts, with the props at that moment
pub type MountCallback<V, A> = Box<dyn FnOnce(&Props<V, A>)>;

/// Runs once when the component unmounts
pub type UnmountCallback = Box<dyn FnOnce()>;

/// Receives errors the binder cannot handle itself
pub type ErrorBoundary = Rc<dyn Fn(BindError)>;

/// Capabilities a component host offers to the binder
pub trait Host<V, A> {
    /// Allocate a state slot exposed as `name`, written through a setter
    /// registered as `setter_name`
    fn inject_state(&mut self, name: &str, setter_name: &str, initial: V) -> (Getter<V>, Setter<V>);

    /// Expose a fixed property
    fn inject_property(&mut self, name: &str, value: Prop<V, A>);

    fn on_mount(&mut self, callback: MountCallback<V, A>);

    fn on_unmount(&mut self, callback: UnmountCallback);

    /// Where stream errors go; logs by default
    fn error_boundary(&self) -> ErrorBoundary {
        Rc::new(|error: BindError| tracing::error!(%error, "unhandled binder error"))
    }
}

/// A single property value
pub enum Prop<V, A> {
    Value(V),
    Dispatch(Dispatch<A>),
}

impl<V, A> Prop<V, A> {
    pub fn as_value(&self) -> Option<&V> {
        match self {
            Prop::Value(value) => Some(value),
            Prop::Dispatch(_) => None,
        }
    }

    pub fn as_dispatch(&self) -> Option<&Dispatch<A>> {
        match self {
            Prop::Dispatch(dispatch) => Some(dispatch),
            Prop::Value(_) => None,
        }
    }
}

impl<V: Clone, A> Clone for Prop<V, A> {
    fn clone(&self) -> Self {
        match self {
            Prop::Value(value) => Prop::Value(value.clone()),
            Prop::Dispatch(dispatch) => Prop::Dispatch(dispatch.clone()),
        }
    }
}

impl<V: fmt::Debug, A> fmt::Debug for Prop<V, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prop::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Prop::Dispatch(dispatch) => f.debug_tuple("Dispatch").field(dispatch).finish(),
        }
    }
}

/// Ordered property map passed to components and blueprints
pub struct Props<V, A> {
    entries: IndexMap<String, Prop<V, A>>,
}

impl<V, A> Props<V, A> {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Add a plain value (builder style)
    pub fn with_value(mut self, name: impl Into<String>, value: V) -> Self {
        self.insert(name, Prop::Value(value));
        self
    }

    /// Set a property, returning the one it replaced
    pub fn insert(&mut self, name: impl Into<String>, prop: Prop<V, A>) -> Option<Prop<V, A>> {
        self.entries.insert(name.into(), prop)
    }

    pub fn get(&self, name: &str) -> Option<&Prop<V, A>> {
        self.entries.get(name)
    }

    /// Value of a plain property
    pub fn value(&self, name: &str) -> Option<&V> {
        self.get(name).and_then(Prop::as_value)
    }

    /// Dispatch handle stored under `name`
    pub fn dispatch(&self, name: &str) -> Option<&Dispatch<A>> {
        self.get(name).and_then(Prop::as_dispatch)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Prop<V, A>)> {
        self.entries.iter().map(|(name, prop)| (name.as_str(), prop))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V, A> Default for Props<V, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone, A> Clone for Props<V, A> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<V: fmt::Debug, A> fmt::Debug for Props<V, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}
