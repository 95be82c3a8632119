//! Push streams
//!
//! A [`Stream`] is a lazily started, multicast source of values. Nothing runs
//! until the first listener subscribes: the stream's [`Producer`] is started
//! at that point and stopped again when the last listener leaves.
//!
//! Streams are single-threaded. Every emission runs synchronously on the
//! caller's stack, in push order.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

use crate::error::StreamError;

new_key_type! {
    /// Unique identifier for a listener attached to a stream
    pub struct ListenerId;
}

/// Callback receiving emitted values
pub type NextFn<T> = Rc<dyn Fn(T)>;

/// Callback receiving a terminal error
pub type ErrorFn = Rc<dyn Fn(&StreamError)>;

/// Callback invoked once when a stream completes
pub type CompleteFn = Rc<dyn Fn()>;

/// Callbacks listening to a stream
pub struct Observer<T> {
    next: NextFn<T>,
    error: Option<ErrorFn>,
    complete: Option<CompleteFn>,
}

impl<T> Observer<T> {
    /// Create an observer that only handles values
    pub fn new<F: Fn(T) + 'static>(next: F) -> Self {
        Self {
            next: Rc::new(next),
            error: None,
            complete: None,
        }
    }

    /// Handle the stream's terminal error
    pub fn on_error<F: Fn(&StreamError) + 'static>(mut self, handler: F) -> Self {
        self.error = Some(Rc::new(handler));
        self
    }

    /// Handle stream completion
    pub fn on_complete<F: Fn() + 'static>(mut self, handler: F) -> Self {
        self.complete = Some(Rc::new(handler));
        self
    }
}

impl<T> Clone for Observer<T> {
    fn clone(&self) -> Self {
        Self {
            next: Rc::clone(&self.next),
            error: self.error.clone(),
            complete: self.complete.clone(),
        }
    }
}

/// Source of values for a stream
pub trait Producer<T> {
    /// Called when the first listener subscribes
    fn start(&mut self, sink: Sink<T>);

    /// Called when the last listener leaves or the stream terminates
    fn stop(&mut self);
}

struct Inner<T> {
    listeners: SlotMap<ListenerId, Observer<T>>,
    /// `None` while the producer is out of the cell for a start/stop call
    producer: Option<Box<dyn Producer<T>>>,
    running: bool,
}

/// A lazily started multicast stream
pub struct Stream<T> {
    inner: Rc<RefCell<Inner<T>>>,
}

impl<T> Clone for Stream<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + 'static> Stream<T> {
    /// Create a stream driven by `producer`
    pub fn create<P: Producer<T> + 'static>(producer: P) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                listeners: SlotMap::with_key(),
                producer: Some(Box::new(producer)),
                running: false,
            })),
        }
    }

    /// Attach a listener, starting the producer if this is the first one
    ///
    /// The listener is registered before the producer starts, so values
    /// emitted synchronously from [`Producer::start`] reach it.
    pub fn subscribe(&self, observer: Observer<T>) -> Subscription {
        let (id, should_start) = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.listeners.insert(observer);
            let should_start = !inner.running;
            inner.running = true;
            (id, should_start)
        };

        if should_start {
            start_producer(&self.inner);
        }

        let inner = Rc::clone(&self.inner);
        Subscription::new(move || remove_listener(&inner, id))
    }

    /// Shorthand for subscribing with a value-only observer
    pub fn for_each<F: Fn(T) + 'static>(&self, next: F) -> Subscription {
        self.subscribe(Observer::new(next))
    }
}

impl<T> Stream<T> {
    /// Number of attached listeners
    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    /// Whether the producer is currently started
    pub fn is_running(&self) -> bool {
        self.inner.borrow().running
    }
}

impl<T> fmt::Debug for Stream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(inner) => f
                .debug_struct("Stream")
                .field("listeners", &inner.listeners.len())
                .field("running", &inner.running)
                .finish(),
            Err(_) => f.write_str("Stream { <emitting> }"),
        }
    }
}

/// Emitting handle given to a [`Producer`]
///
/// Holds the stream weakly; emitting into a dropped stream does nothing.
pub struct Sink<T> {
    inner: Weak<RefCell<Inner<T>>>,
}

impl<T> Clone for Sink<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<T: Clone + 'static> Sink<T> {
    /// Push a value to every current listener
    pub fn next(&self, value: T) {
        if let Some(inner) = self.inner.upgrade() {
            emit(&inner, value);
        }
    }

    /// Terminate the stream with an error
    pub fn error(&self, error: StreamError) {
        if let Some(inner) = self.inner.upgrade() {
            tracing::debug!(%error, "stream terminated with error");
            terminate(&inner, |observer| {
                if let Some(handler) = &observer.error {
                    handler(&error);
                }
            });
        }
    }

    /// Terminate the stream normally
    pub fn complete(&self) {
        if let Some(inner) = self.inner.upgrade() {
            tracing::trace!("stream completed");
            terminate(&inner, |observer| {
                if let Some(handler) = &observer.complete {
                    handler();
                }
            });
        }
    }
}

impl<T> Sink<T> {
    /// True once the stream is dropped or no longer running
    pub fn is_closed(&self) -> bool {
        self.inner
            .upgrade()
            .map_or(true, |inner| !inner.borrow().running)
    }
}

/// Handle to an attached listener
///
/// Dropping the handle detaches the listener. A subscription also keeps the
/// stream it listens to alive, so a derived stream can be dropped by its
/// creator once subscribed.
#[must_use = "dropping a Subscription detaches the listener immediately"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    fn new<F: FnOnce() + 'static>(release: F) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Detach the listener now
    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("attached", &self.release.is_some())
            .finish()
    }
}

fn start_producer<T>(inner: &Rc<RefCell<Inner<T>>>) {
    let taken = inner.borrow_mut().producer.take();
    let Some(mut producer) = taken else {
        // Mid start/stop; the outer call settles the final state
        return;
    };

    tracing::trace!("stream producer starting");
    producer.start(Sink {
        inner: Rc::downgrade(inner),
    });

    let stopped = {
        let mut inner = inner.borrow_mut();
        inner.producer = Some(producer);
        !inner.running
    };

    // Completed, errored or abandoned while starting
    if stopped {
        stop_producer(inner);
    }
}

fn stop_producer<T>(inner: &Rc<RefCell<Inner<T>>>) {
    let taken = inner.borrow_mut().producer.take();
    let Some(mut producer) = taken else {
        return;
    };

    tracing::trace!("stream producer stopping");
    producer.stop();

    let restarted = {
        let mut inner = inner.borrow_mut();
        inner.producer = Some(producer);
        inner.running
    };

    // Resubscribed while stopping
    if restarted {
        start_producer(inner);
    }
}

fn remove_listener<T>(inner: &Rc<RefCell<Inner<T>>>, id: ListenerId) {
    let idle = {
        let mut inner = inner.borrow_mut();
        if inner.listeners.remove(id).is_none() {
            return;
        }
        let idle = inner.running && inner.listeners.is_empty();
        if idle {
            inner.running = false;
        }
        idle
    };

    if idle {
        stop_producer(inner);
    }
}

fn emit<T: Clone>(inner: &Rc<RefCell<Inner<T>>>, value: T) {
    let targets: SmallVec<[(ListenerId, NextFn<T>); 4]> = inner
        .borrow()
        .listeners
        .iter()
        .map(|(id, observer)| (id, Rc::clone(&observer.next)))
        .collect();

    for (id, next) in targets {
        // Skip listeners detached by an earlier callback of this emission
        let attached = inner.borrow().listeners.contains_key(id);
        if attached {
            next(value.clone());
        }
    }
}

fn terminate<T>(inner: &Rc<RefCell<Inner<T>>>, notify: impl Fn(&Observer<T>)) {
    let (observers, was_running) = {
        let mut inner = inner.borrow_mut();
        let observers: SmallVec<[Observer<T>; 4]> =
            inner.listeners.drain().map(|(_, observer)| observer).collect();
        let was_running = std::mem::replace(&mut inner.running, false);
        (observers, was_running)
    };

    if was_running {
        stop_producer(inner);
    }

    for observer in &observers {
        notify(observer);
    }
}
