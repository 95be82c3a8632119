//! Dispatching into a component's source stream
//!
//! Each enhanced component instance owns one source stream. Its producer
//! publishes the stream's sink into a shared cell while started and clears
//! it again on stop, so [`Dispatch`] can tell whether anything is listening.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use adhoc_stream::{Producer, Sink, Stream};

use crate::action::Action;
use crate::error::{BindError, Result};

/// Whether the source stream is started
enum SinkState<A> {
    Inactive,
    Active(Sink<A>),
}

type SinkCell<A> = Rc<RefCell<SinkState<A>>>;

struct DispatchProducer<A> {
    sink: SinkCell<A>,
}

impl<A: Clone + 'static> Producer<A> for DispatchProducer<A> {
    fn start(&mut self, sink: Sink<A>) {
        tracing::trace!("source stream active");
        *self.sink.borrow_mut() = SinkState::Active(sink);
    }

    fn stop(&mut self) {
        tracing::trace!("source stream inactive");
        *self.sink.borrow_mut() = SinkState::Inactive;
    }
}

/// Create a source stream and the dispatch handle feeding it
pub fn source_stream<A: Clone + 'static>() -> (Stream<A>, Dispatch<A>) {
    let sink = Rc::new(RefCell::new(SinkState::Inactive));
    let stream = Stream::create(DispatchProducer {
        sink: Rc::clone(&sink),
    });
    (stream, Dispatch { sink })
}

/// Pushes actions into a component's source stream
pub struct Dispatch<A> {
    sink: SinkCell<A>,
}

impl<A> Clone for Dispatch<A> {
    fn clone(&self) -> Self {
        Self {
            sink: Rc::clone(&self.sink),
        }
    }
}

impl<A> Dispatch<A> {
    /// True between the source stream's start and stop
    pub fn is_active(&self) -> bool {
        matches!(*self.sink.borrow(), SinkState::Active(_))
    }
}

impl<A: Clone + 'static> Dispatch<A> {
    /// Push `action` to every stream derived from the source
    ///
    /// Returns [`BindError::Inactive`] when the source stream is not
    /// started; nothing is queued in that case.
    pub fn dispatch(&self, action: A) -> Result<()> {
        let sink = match &*self.sink.borrow() {
            SinkState::Active(sink) => sink.clone(),
            SinkState::Inactive => {
                tracing::debug!("dispatch dropped: source stream inactive");
                return Err(BindError::Inactive);
            }
        };
        sink.next(action);
        Ok(())
    }
}

impl<K: Clone + 'static, P: Clone + 'static> Dispatch<Action<K, P>> {
    /// Build an [`Action`] from `kind` and `payload` and dispatch it
    pub fn dispatch_kind(&self, kind: K, payload: P) -> Result<()> {
        self.dispatch(Action::new(kind, payload))
    }
}

impl<A> fmt::Debug for Dispatch<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let active = self
            .sink
            .try_borrow()
            .map(|state| matches!(*state, SinkState::Active(_)))
            .unwrap_or(true);
        f.debug_struct("Dispatch").field("active", &active).finish()
    }
}
