//! Adhoc Streams
//!
//! Single-threaded push streams used to feed component state:
//!
//! - **Lazy producers**: a [`Producer`] starts with the first listener and
//!   stops with the last one
//! - **Operators**: `map`, `filter`, `start_with`, `fold`, `take`, `merge`
//! - **Scoped listeners**: a [`Subscription`] detaches on drop
//!
//! # Example
//!
//! ```rust
//! use adhoc_stream::Stream;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let seen_clone = seen.clone();
//!
//! let doubled = Stream::of(vec![1, 2, 3]).map(|v| v * 2).start_with(0);
//! let _subscription = doubled.for_each(move |v| seen_clone.borrow_mut().push(v));
//!
//! assert_eq!(*seen.borrow(), vec![0, 2, 4, 6]);
//! ```

pub mod error;
pub mod operators;
pub mod sources;
pub mod stream;

pub use error::StreamError;
pub use operators::operator_error;
pub use stream::{ListenerId, Observer, Producer, Sink, Stream, Subscription};
