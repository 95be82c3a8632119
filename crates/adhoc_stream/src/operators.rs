//! Stream operators
//!
//! Every operator returns a new lazily started stream. The operator's
//! producer subscribes upstream when the derived stream starts and drops
//! that subscription when it stops.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::error::{Result, StreamError};
use crate::stream::{Observer, Producer, Sink, Stream, Subscription};

/// Observer that forwards error and completion to `sink` untouched
fn forward<T, U, F>(sink: Sink<U>, next: F) -> Observer<T>
where
    T: 'static,
    U: Clone + 'static,
    F: Fn(T, &Sink<U>) + 'static,
{
    let on_next = sink.clone();
    let on_error = sink.clone();
    Observer::new(move |value| next(value, &on_next))
        .on_error(move |error| on_error.error(error.clone()))
        .on_complete(move || sink.complete())
}

/// Producer that subscribes to one upstream with a per-start observer
struct Pipe<T, U> {
    source: Stream<T>,
    observer: Box<dyn Fn(Sink<U>) -> Observer<T>>,
    subscription: Option<Subscription>,
}

impl<T: Clone + 'static, U> Producer<U> for Pipe<T, U> {
    fn start(&mut self, sink: Sink<U>) {
        let observer = (self.observer)(sink);
        self.subscription = Some(self.source.subscribe(observer));
    }

    fn stop(&mut self) {
        self.subscription.take();
    }
}

fn pipe<T, U, F>(source: &Stream<T>, observer: F) -> Stream<U>
where
    T: Clone + 'static,
    U: Clone + 'static,
    F: Fn(Sink<U>) -> Observer<T> + 'static,
{
    Stream::create(Pipe {
        source: source.clone(),
        observer: Box::new(observer),
        subscription: None,
    })
}

struct StartWith<T> {
    source: Stream<T>,
    initial: T,
    subscription: Option<Subscription>,
}

impl<T: Clone + 'static> Producer<T> for StartWith<T> {
    fn start(&mut self, sink: Sink<T>) {
        sink.next(self.initial.clone());
        if sink.is_closed() {
            return;
        }
        self.subscription = Some(self.source.subscribe(forward(sink, |v, s| s.next(v))));
    }

    fn stop(&mut self) {
        self.subscription.take();
    }
}

struct Fold<T, U> {
    source: Stream<T>,
    seed: U,
    step: Rc<dyn Fn(U, T) -> U>,
    subscription: Option<Subscription>,
}

impl<T: Clone + 'static, U: Clone + 'static> Producer<U> for Fold<T, U> {
    fn start(&mut self, sink: Sink<U>) {
        // Accumulator restarts from the seed on every start
        let acc = Rc::new(RefCell::new(self.seed.clone()));
        sink.next(self.seed.clone());
        if sink.is_closed() {
            return;
        }

        let step = Rc::clone(&self.step);
        self.subscription = Some(self.source.subscribe(forward(sink, move |v, s| {
            let next = step(acc.borrow().clone(), v);
            *acc.borrow_mut() = next.clone();
            s.next(next);
        })));
    }

    fn stop(&mut self) {
        self.subscription.take();
    }
}

struct Take<T> {
    source: Stream<T>,
    count: usize,
    subscription: Option<Subscription>,
}

impl<T: Clone + 'static> Producer<T> for Take<T> {
    fn start(&mut self, sink: Sink<T>) {
        if self.count == 0 {
            sink.complete();
            return;
        }

        let count = self.count;
        let taken = Rc::new(Cell::new(0usize));
        self.subscription = Some(self.source.subscribe(forward(sink, move |v, s| {
            if taken.get() >= count {
                return;
            }
            taken.set(taken.get() + 1);
            s.next(v);
            if taken.get() == count {
                s.complete();
            }
        })));
    }

    fn stop(&mut self) {
        self.subscription.take();
    }
}

impl<T: Clone + 'static> Stream<T> {
    /// Transform every value
    pub fn map<U, F>(&self, f: F) -> Stream<U>
    where
        U: Clone + 'static,
        F: Fn(T) -> U + 'static,
    {
        let f = Rc::new(f);
        pipe(self, move |sink| {
            let f = Rc::clone(&f);
            forward(sink, move |v, s| s.next(f(v)))
        })
    }

    /// Replace every value with a constant
    pub fn map_to<U: Clone + 'static>(&self, value: U) -> Stream<U> {
        self.map(move |_| value.clone())
    }

    /// Transform every value, terminating the stream on the first error
    pub fn try_map<U, F>(&self, f: F) -> Stream<U>
    where
        U: Clone + 'static,
        F: Fn(T) -> Result<U> + 'static,
    {
        let f = Rc::new(f);
        pipe(self, move |sink| {
            let f = Rc::clone(&f);
            forward(sink, move |v, s| match f(v) {
                Ok(mapped) => s.next(mapped),
                Err(error) => s.error(error),
            })
        })
    }

    /// Keep only values matching `predicate`
    pub fn filter<F>(&self, predicate: F) -> Stream<T>
    where
        F: Fn(&T) -> bool + 'static,
    {
        let predicate = Rc::new(predicate);
        pipe(self, move |sink| {
            let predicate = Rc::clone(&predicate);
            forward(sink, move |v, s| {
                if predicate(&v) {
                    s.next(v);
                }
            })
        })
    }

    /// Emit `initial` synchronously on start, then every upstream value
    pub fn start_with(&self, initial: T) -> Stream<T> {
        Stream::create(StartWith {
            source: self.clone(),
            initial,
            subscription: None,
        })
    }

    /// Running accumulation, emitting `seed` first
    pub fn fold<U, F>(&self, seed: U, step: F) -> Stream<U>
    where
        U: Clone + 'static,
        F: Fn(U, T) -> U + 'static,
    {
        Stream::create(Fold {
            source: self.clone(),
            seed,
            step: Rc::new(step),
            subscription: None,
        })
    }

    /// Emit the first `count` values, then complete
    pub fn take(&self, count: usize) -> Stream<T> {
        Stream::create(Take {
            source: self.clone(),
            count,
            subscription: None,
        })
    }

    /// Log every value at trace level and pass it through
    pub fn inspect(&self, label: &'static str) -> Stream<T>
    where
        T: fmt::Debug,
    {
        self.map(move |value| {
            tracing::trace!(stream = label, ?value, "emit");
            value
        })
    }
}

/// Fail a fallible step with an operator error
pub fn operator_error(message: impl Into<String>) -> StreamError {
    StreamError::Operator(message.into())
}
