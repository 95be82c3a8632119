//! In-memory component host
//!
//! A minimal component model: a base [`Component`] renders an [`Element`]
//! from props, [`Enhancer::apply`] wraps it, and every [`Instance`] of the
//! wrapped component is a [`Host`] the enhancer installs itself on.
//!
//! [`Enhancer::apply`]: crate::binder::Enhancer::apply

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use crate::binder::{Bound, Enhancer};
use crate::dispatch::Dispatch;
use crate::error::BindError;
use crate::host::{
    ErrorBoundary, Getter, Host, MountCallback, Prop, Props, Setter, UnmountCallback,
};
use crate::naming::DISPLAY_NAME;

/// Rendered output of a component
pub struct Element<V, A> {
    pub tag: String,
    pub props: Props<V, A>,
}

impl<V, A> Element<V, A> {
    /// Value of a plain property
    pub fn prop(&self, name: &str) -> Option<&V> {
        self.props.value(name)
    }

    /// Dispatch handle stored under `name`
    pub fn dispatch(&self, name: &str) -> Option<&Dispatch<A>> {
        self.props.dispatch(name)
    }
}

impl<V: fmt::Debug, A> fmt::Debug for Element<V, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("tag", &self.tag)
            .field("props", &self.props)
            .finish()
    }
}

/// A base component
pub trait Component<V, A> {
    fn render(&self, props: &Props<V, A>) -> Element<V, A>;

    fn display_name(&self) -> Option<&str> {
        None
    }
}

impl<V, A, F> Component<V, A> for F
where
    F: Fn(&Props<V, A>) -> Element<V, A>,
{
    fn render(&self, props: &Props<V, A>) -> Element<V, A> {
        self(props)
    }
}

/// Renders a bare element carrying every prop it receives
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tag {
    name: String,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl<V: Clone, A> Component<V, A> for Tag {
    fn render(&self, props: &Props<V, A>) -> Element<V, A> {
        Element {
            tag: self.name.clone(),
            props: props.clone(),
        }
    }

    fn display_name(&self) -> Option<&str> {
        Some(&self.name)
    }
}

/// A base component wrapped by an [`Enhancer`]
pub struct EnhancedComponent<C, V, A> {
    base: Rc<C>,
    enhancer: Enhancer<V, A>,
}

impl<C, V, A> EnhancedComponent<C, V, A> {
    pub(crate) fn new(base: C, enhancer: Enhancer<V, A>) -> Self {
        Self {
            base: Rc::new(base),
            enhancer,
        }
    }

    /// Always `"withStreams"`
    pub fn display_name(&self) -> &'static str {
        DISPLAY_NAME
    }

    pub fn base(&self) -> &C {
        &self.base
    }

    pub fn enhancer(&self) -> &Enhancer<V, A> {
        &self.enhancer
    }
}

impl<C, V, A> EnhancedComponent<C, V, A>
where
    C: Component<V, A>,
    V: Clone + Default + 'static,
    A: Clone + 'static,
{
    /// Create an unmounted instance with the given own props
    pub fn instantiate(&self, own_props: Props<V, A>) -> Instance<C, V, A> {
        let errors = Rc::new(RefCell::new(Vec::new()));
        let mut instance = Instance {
            base: Rc::clone(&self.base),
            own_props,
            states: IndexMap::new(),
            setters: FxHashMap::default(),
            properties: Props::new(),
            mount_callbacks: Vec::new(),
            unmount_callbacks: Vec::new(),
            lifecycle: Lifecycle::Created,
            errors,
            bound: None,
        };
        let bound = self.enhancer.install(&mut instance);
        instance.bound = Some(bound);
        instance
    }

    /// Create an instance and mount it
    pub fn mount(&self, own_props: Props<V, A>) -> Instance<C, V, A> {
        let mut instance = self.instantiate(own_props);
        instance.mount();
        instance
    }
}

/// Lifecycle of an [`Instance`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    Created,
    Mounted,
    Unmounted,
}

/// One live instance of an enhanced component
///
/// Dropping a mounted instance unmounts it.
pub struct Instance<C, V, A> {
    base: Rc<C>,
    own_props: Props<V, A>,
    states: IndexMap<String, Rc<RefCell<V>>>,
    setters: FxHashMap<String, Setter<V>>,
    properties: Props<V, A>,
    mount_callbacks: Vec<MountCallback<V, A>>,
    unmount_callbacks: Vec<UnmountCallback>,
    lifecycle: Lifecycle,
    errors: Rc<RefCell<Vec<BindError>>>,
    bound: Option<Bound<V, A>>,
}

impl<C, V, A> Instance<C, V, A> {
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_mounted(&self) -> bool {
        self.lifecycle == Lifecycle::Mounted
    }

    /// Run unmount callbacks in reverse registration order
    ///
    /// Releases every stream subscription the enhancer made on mount.
    pub fn unmount(&mut self) {
        if self.lifecycle == Lifecycle::Unmounted {
            return;
        }
        self.lifecycle = Lifecycle::Unmounted;

        let callbacks = std::mem::take(&mut self.unmount_callbacks);
        tracing::debug!(component = DISPLAY_NAME, callbacks = callbacks.len(), "unmounting");
        for callback in callbacks.into_iter().rev() {
            callback();
        }
    }

    /// Errors delivered to this instance's error boundary
    pub fn errors(&self) -> Vec<BindError> {
        self.errors.borrow().clone()
    }

    /// The injected dispatch handle
    pub fn dispatch(&self) -> Option<&Dispatch<A>> {
        self.bound.as_ref().map(Bound::dispatch)
    }

    /// Setter registered under `setter_name`
    pub fn setter(&self, setter_name: &str) -> Option<Setter<V>> {
        self.setters.get(setter_name).cloned()
    }
}

impl<C, V, A> Instance<C, V, A>
where
    C: Component<V, A>,
    V: Clone,
{
    /// Run mount callbacks with the current props
    ///
    /// Only the first call on a fresh instance has any effect.
    pub fn mount(&mut self) {
        if self.lifecycle != Lifecycle::Created {
            tracing::debug!(lifecycle = ?self.lifecycle, "mount ignored");
            return;
        }
        self.lifecycle = Lifecycle::Mounted;

        let props = self.props();
        let callbacks = std::mem::take(&mut self.mount_callbacks);
        tracing::debug!(component = DISPLAY_NAME, callbacks = callbacks.len(), "mounting");
        for callback in callbacks {
            callback(&props);
        }
    }

    /// Props the base component receives
    ///
    /// Own props first, then injected properties, then state values, so a
    /// state key shadows an injected property of the same name.
    pub fn props(&self) -> Props<V, A> {
        let mut props = self.own_props.clone();
        for (name, prop) in self.properties.iter() {
            props.insert(name, prop.clone());
        }
        for (name, cell) in &self.states {
            props.insert(name.as_str(), Prop::Value(cell.borrow().clone()));
        }
        props
    }

    pub fn render(&self) -> Element<V, A> {
        self.base.render(&self.props())
    }

    /// Current value of a state-backed property
    pub fn value(&self, name: &str) -> Option<V> {
        self.bound.as_ref().and_then(|bound| bound.value(name))
    }
}

impl<C, V, A> Host<V, A> for Instance<C, V, A>
where
    V: Clone + 'static,
{
    fn inject_state(&mut self, name: &str, setter_name: &str, initial: V) -> (Getter<V>, Setter<V>) {
        let cell = Rc::new(RefCell::new(initial));

        let read = Rc::clone(&cell);
        let getter: Getter<V> = Rc::new(move || read.borrow().clone());

        let write = Rc::clone(&cell);
        let property = name.to_string();
        let setter: Setter<V> = Rc::new(move |value| {
            tracing::trace!(%property, "state updated");
            *write.borrow_mut() = value;
        });

        self.states.insert(name.to_string(), cell);
        self.setters.insert(setter_name.to_string(), Rc::clone(&setter));
        (getter, setter)
    }

    fn inject_property(&mut self, name: &str, value: Prop<V, A>) {
        self.properties.insert(name, value);
    }

    fn on_mount(&mut self, callback: MountCallback<V, A>) {
        self.mount_callbacks.push(callback);
    }

    fn on_unmount(&mut self, callback: UnmountCallback) {
        self.unmount_callbacks.push(callback);
    }

    fn error_boundary(&self) -> ErrorBoundary {
        let errors = Rc::clone(&self.errors);
        Rc::new(move |error: BindError| {
            tracing::error!(%error, "stream error reached component boundary");
            errors.borrow_mut().push(error);
        })
    }
}

impl<C, V, A> Drop for Instance<C, V, A> {
    fn drop(&mut self) {
        self.unmount();
    }
}

impl<C, V: fmt::Debug, A> fmt::Debug for Instance<C, V, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("lifecycle", &self.lifecycle)
            .field("states", &self.states)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::{with_streams, Blueprints};
    use adhoc_stream::Stream;

    type Text = Props<String, String>;

    #[test]
    fn test_closure_component_renders() {
        let list = |props: &Text| Element {
            tag: "ul".to_string(),
            props: props.clone(),
        };
        let element = list.render(&Props::new().with_value("items", "a".to_string()));
        assert_eq!(element.tag, "ul");
        assert_eq!(element.prop("items"), Some(&"a".to_string()));
    }

    #[test]
    fn test_mount_twice_is_ignored() {
        let calls = Rc::new(RefCell::new(0));
        let calls_clone = calls.clone();
        let blueprints = Blueprints::new().with("n", move |s: Stream<String>, _: &Text| {
            *calls_clone.borrow_mut() += 1;
            s
        });
        let component = with_streams(blueprints, false).apply(Tag::new("div"));

        let mut instance = component.mount(Props::new());
        instance.mount();
        assert_eq!(*calls.borrow(), 1);
        assert_eq!(instance.lifecycle(), Lifecycle::Mounted);
    }

    #[test]
    fn test_setter_not_rendered() {
        let blueprints = Blueprints::new().with("n", |s: Stream<String>, _: &Text| s);
        let component = with_streams(blueprints, false).apply(Tag::new("div"));
        let instance = component.mount(Props::new());

        let element = instance.render();
        assert!(!element.props.contains("setn"));
        assert!(instance.setter("setn").is_some());
    }

    #[test]
    fn test_setter_writes_state() {
        let blueprints = Blueprints::new().with("n", |s: Stream<String>, _: &Text| s);
        let component = with_streams(blueprints, true).apply(Tag::new("div"));
        let instance = component.mount(Props::new());

        if let Some(set) = instance.setter("data-setn") {
            set("manual".to_string());
        }
        assert_eq!(instance.value("data-n"), Some("manual".to_string()));
    }

    #[test]
    fn test_drop_unmounts() {
        let probe: Rc<RefCell<Option<Stream<String>>>> = Rc::new(RefCell::new(None));
        let probe_clone = probe.clone();
        let blueprints = Blueprints::new().with("n", move |s: Stream<String>, _: &Text| {
            *probe_clone.borrow_mut() = Some(s.clone());
            s
        });
        let component = with_streams(blueprints, false).apply(Tag::new("div"));
        let instance = component.mount(Props::new());

        let source = probe.borrow().clone();
        assert!(source.as_ref().is_some_and(Stream::is_running));
        drop(instance);
        assert!(source.as_ref().is_some_and(|s| !s.is_running()));
    }
}
