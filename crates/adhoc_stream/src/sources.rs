//! Stream constructors

use std::cell::Cell;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::stream::{Observer, Producer, Sink, Stream, Subscription};

/// Emits a fixed list of values on every start, then completes
struct Of<T> {
    values: Vec<T>,
}

impl<T: Clone + 'static> Producer<T> for Of<T> {
    fn start(&mut self, sink: Sink<T>) {
        for value in &self.values {
            if sink.is_closed() {
                return;
            }
            sink.next(value.clone());
        }
        sink.complete();
    }

    fn stop(&mut self) {}
}

/// Never emits and never completes
struct Never;

impl<T> Producer<T> for Never {
    fn start(&mut self, _sink: Sink<T>) {}

    fn stop(&mut self) {}
}

struct Merge<T> {
    sources: Vec<Stream<T>>,
    subscriptions: SmallVec<[Subscription; 4]>,
}

impl<T: Clone + 'static> Producer<T> for Merge<T> {
    fn start(&mut self, sink: Sink<T>) {
        if self.sources.is_empty() {
            sink.complete();
            return;
        }

        // Completes once every source has completed
        let remaining = Rc::new(Cell::new(self.sources.len()));
        for source in &self.sources {
            if sink.is_closed() {
                break;
            }
            let on_next = sink.clone();
            let on_error = sink.clone();
            let on_complete = sink.clone();
            let remaining = Rc::clone(&remaining);
            let observer = Observer::new(move |v| on_next.next(v))
                .on_error(move |e| on_error.error(e.clone()))
                .on_complete(move || {
                    remaining.set(remaining.get().saturating_sub(1));
                    if remaining.get() == 0 {
                        on_complete.complete();
                    }
                });
            self.subscriptions.push(source.subscribe(observer));
        }
    }

    fn stop(&mut self) {
        self.subscriptions.clear();
    }
}

impl<T: Clone + 'static> Stream<T> {
    /// Stream that emits `values` in order on start, then completes
    pub fn of<I: IntoIterator<Item = T>>(values: I) -> Self {
        Stream::create(Of {
            values: values.into_iter().collect(),
        })
    }

    /// Stream that completes immediately
    pub fn empty() -> Self {
        Stream::create(Of { values: Vec::new() })
    }

    /// Stream that stays silent until every listener leaves
    pub fn never() -> Self {
        Stream::create(Never)
    }

    /// Interleave values from all `sources` in arrival order
    pub fn merge<I: IntoIterator<Item = Stream<T>>>(sources: I) -> Self {
        Stream::create(Merge {
            sources: sources.into_iter().collect(),
            subscriptions: SmallVec::new(),
        })
    }
}
