//! Stream binder
//!
//! [`with_streams`] turns a map of blueprints into an [`Enhancer`]. Installing
//! the enhancer on a component gives it:
//!
//! - one state-backed property per blueprint key, starting at `V::default()`
//! - a `dispatch` property feeding the component's source stream
//! - on mount, one subscription per blueprint that writes every value the
//!   derived stream emits into that key's state
//!
//! Subscriptions live exactly as long as the component stays mounted.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use adhoc_stream::{Observer, Stream, Subscription};
use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::component::{Component, EnhancedComponent};
use crate::config::BindConfig;
use crate::dispatch::{source_stream, Dispatch};
use crate::error::{BindError, Result};
use crate::host::{ErrorBoundary, Getter, Host, Prop, Props, Setter};
use crate::naming::{dispatch_name, reserved_collision, PropNames, DISPLAY_NAME};

/// Builds a property's derived stream from the source stream and the
/// component's props at mount time
pub type Blueprint<V, A> = Rc<dyn Fn(Stream<A>, &Props<V, A>) -> Stream<V>>;

/// Ordered map of property key to blueprint
///
/// Insertion order is the order blueprints run in on mount.
pub struct Blueprints<V, A> {
    entries: IndexMap<String, Blueprint<V, A>>,
}

impl<V, A> Blueprints<V, A> {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Add a blueprint (builder style)
    pub fn with<F>(mut self, key: impl Into<String>, blueprint: F) -> Self
    where
        F: Fn(Stream<A>, &Props<V, A>) -> Stream<V> + 'static,
    {
        self.insert(key, blueprint);
        self
    }

    /// Add or replace a blueprint
    pub fn insert<F>(&mut self, key: impl Into<String>, blueprint: F)
    where
        F: Fn(Stream<A>, &Props<V, A>) -> Stream<V> + 'static,
    {
        self.entries.insert(key.into(), Rc::new(blueprint));
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V, A> Default for Blueprints<V, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, A> Clone for Blueprints<V, A> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

struct Binding<V, A> {
    key: String,
    names: PropNames,
    blueprint: Blueprint<V, A>,
}

/// Attaches blueprint streams to components
///
/// Built once by [`with_streams`] or [`try_with_streams`]; every component
/// instance it is installed on gets its own source stream and state.
pub struct Enhancer<V, A> {
    bindings: Rc<[Binding<V, A>]>,
    dispatch_name: String,
}

/// Create an enhancer binding each blueprint to a property of the same name
///
/// With `test_mode`, every injected name carries the `data-` prefix. Keys
/// that shadow a reserved property are accepted with a warning; use
/// [`try_with_streams`] with a strict [`BindConfig`] to reject them.
pub fn with_streams<V, A>(blueprints: Blueprints<V, A>, test_mode: bool) -> Enhancer<V, A> {
    let config = BindConfig {
        test_mode,
        ..BindConfig::default()
    };
    let enhancer = Enhancer::from_blueprints(blueprints, &config);
    for (key, reserved) in enhancer.collisions() {
        tracing::warn!(%key, %reserved, "blueprint shadows a reserved property");
    }
    enhancer
}

/// Create an enhancer from an explicit configuration
pub fn try_with_streams<V, A>(
    blueprints: Blueprints<V, A>,
    config: BindConfig,
) -> Result<Enhancer<V, A>> {
    let enhancer = Enhancer::from_blueprints(blueprints, &config);
    for (key, reserved) in enhancer.collisions() {
        if config.strict_names {
            return Err(BindError::ReservedName { key, reserved });
        }
        tracing::warn!(%key, %reserved, "blueprint shadows a reserved property");
    }
    Ok(enhancer)
}

impl<V, A> Enhancer<V, A> {
    fn from_blueprints(blueprints: Blueprints<V, A>, config: &BindConfig) -> Self {
        let bindings: Vec<Binding<V, A>> = blueprints
            .entries
            .into_iter()
            .map(|(key, blueprint)| Binding {
                names: PropNames::for_key(&key, config),
                key,
                blueprint,
            })
            .collect();

        Self {
            bindings: Rc::from(bindings),
            dispatch_name: dispatch_name(config),
        }
    }

    /// Always `"withStreams"`
    pub fn display_name(&self) -> &'static str {
        DISPLAY_NAME
    }

    /// Name of the injected dispatch property
    pub fn dispatch_name(&self) -> &str {
        &self.dispatch_name
    }

    /// Names injected for each blueprint, in mount order
    pub fn prop_names(&self) -> impl Iterator<Item = &PropNames> {
        self.bindings.iter().map(|binding| &binding.names)
    }

    /// `(key, reserved name)` for every blueprint key shadowing a reserved
    /// property
    pub fn collisions(&self) -> Vec<(String, String)> {
        let names: Vec<PropNames> = self.prop_names().cloned().collect();
        self.bindings
            .iter()
            .filter_map(|binding| {
                reserved_collision(&binding.names, &names)
                    .map(|reserved| (binding.key.clone(), reserved))
            })
            .collect()
    }
}

impl<V: Clone + Default + 'static, A: Clone + 'static> Enhancer<V, A> {
    /// Wire one component instance through `host`
    ///
    /// Allocates the instance's source stream and state slots immediately;
    /// blueprints run when the host fires its mount callback, and all
    /// subscriptions are released by its unmount callback.
    pub fn install<H: Host<V, A> + ?Sized>(&self, host: &mut H) -> Bound<V, A> {
        let (source, dispatch) = source_stream::<A>();

        let mut getters = IndexMap::with_capacity(self.bindings.len());
        let mut setters: SmallVec<[Setter<V>; 4]> = SmallVec::new();
        for binding in self.bindings.iter() {
            let (getter, setter) = host.inject_state(
                &binding.names.property_name,
                &binding.names.setter_name,
                V::default(),
            );
            getters.insert(binding.names.property_name.clone(), getter);
            setters.push(setter);
        }
        host.inject_property(&self.dispatch_name, Prop::Dispatch(dispatch.clone()));

        let guard = Rc::new(RefCell::new(MountGuard::default()));
        let bindings = Rc::clone(&self.bindings);
        let boundary = host.error_boundary();
        let on_mount_guard = Rc::clone(&guard);

        host.on_mount(Box::new(move |props: &Props<V, A>| {
            tracing::debug!(streams = bindings.len(), "binding streams on mount");
            let mut subscriptions: SmallVec<[Subscription; 4]> = SmallVec::new();
            for (binding, setter) in bindings.iter().zip(setters) {
                subscriptions.push(subscribe(binding, &source, props, setter, &boundary));

                // Unmounted by a synchronous emission; drop what we hold
                if on_mount_guard.borrow().released {
                    tracing::debug!(property = %binding.names.property_name, "unmounted while binding");
                    return;
                }
            }
            on_mount_guard.borrow_mut().subscriptions = subscriptions;
        }));

        host.on_unmount(Box::new(move || {
            let released = {
                let mut guard = guard.borrow_mut();
                guard.released = true;
                std::mem::take(&mut guard.subscriptions)
            };
            tracing::debug!(subscriptions = released.len(), "releasing stream bindings");
            drop(released);
        }));

        Bound { getters, dispatch }
    }

    /// Wrap `base` so each of its instances is installed with this enhancer
    pub fn apply<C: Component<V, A>>(&self, base: C) -> EnhancedComponent<C, V, A> {
        EnhancedComponent::new(base, self.clone())
    }
}

fn subscribe<V, A>(
    binding: &Binding<V, A>,
    source: &Stream<A>,
    props: &Props<V, A>,
    setter: Setter<V>,
    boundary: &ErrorBoundary,
) -> Subscription
where
    V: Clone + 'static,
    A: Clone + 'static,
{
    let derived = (binding.blueprint)(source.clone(), props);
    let property = binding.names.property_name.clone();
    let boundary = Rc::clone(boundary);

    derived.subscribe(Observer::new(move |value| setter(value)).on_error(move |error| {
        boundary(BindError::Stream {
            property: property.clone(),
            source: error.clone(),
        })
    }))
}

impl<V, A> Clone for Enhancer<V, A> {
    fn clone(&self) -> Self {
        Self {
            bindings: Rc::clone(&self.bindings),
            dispatch_name: self.dispatch_name.clone(),
        }
    }
}

impl<V, A> fmt::Debug for Enhancer<V, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Enhancer")
            .field("display_name", &DISPLAY_NAME)
            .field("properties", &self.prop_names().collect::<Vec<_>>())
            .field("dispatch_name", &self.dispatch_name)
            .finish()
    }
}

/// Subscriptions held for one mounted instance
#[derive(Default)]
struct MountGuard {
    subscriptions: SmallVec<[Subscription; 4]>,
    released: bool,
}

/// Handles returned by [`Enhancer::install`]
pub struct Bound<V, A> {
    getters: IndexMap<String, Getter<V>>,
    dispatch: Dispatch<A>,
}

impl<V, A> Bound<V, A> {
    /// Current value of the property named `name`
    pub fn value(&self, name: &str) -> Option<V> {
        self.getters.get(name).map(|getter| getter())
    }

    pub fn dispatch(&self) -> &Dispatch<A> {
        &self.dispatch
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.getters.keys().map(String::as_str)
    }
}
