//! Adhoc Core
//!
//! Binds named push streams to the properties of a component:
//!
//! - **Blueprints**: one function per property, deriving a stream from the
//!   component's source stream and props
//! - **Dispatch**: an injected handle that pushes actions into the source
//!   stream while it is active
//! - **Host capabilities**: state, property and lifecycle hooks behind the
//!   [`Host`] trait, with an in-memory [`Instance`] implementation
//!
//! # Example
//!
//! ```rust
//! use adhoc_core::{with_streams, Blueprints, Props, Tag};
//! use adhoc_stream::Stream;
//!
//! let blueprints = Blueprints::new()
//!     .with("greeting", |stream: Stream<String>, _: &Props<String, String>| {
//!         stream.map(|name| format!("Hello, {name}!")).start_with("Hi".to_string())
//!     });
//!
//! let component = with_streams(blueprints, false).apply(Tag::new("div"));
//! let instance = component.mount(Props::new());
//! assert_eq!(instance.render().prop("greeting"), Some(&"Hi".to_string()));
//!
//! if let Some(dispatch) = instance.dispatch() {
//!     dispatch.dispatch("Ada".to_string()).unwrap();
//! }
//! assert_eq!(instance.value("greeting"), Some("Hello, Ada!".to_string()));
//! ```

pub mod action;
pub mod binder;
pub mod component;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod host;
pub mod naming;

pub use action::Action;
pub use binder::{try_with_streams, with_streams, Blueprint, Blueprints, Bound, Enhancer};
pub use component::{Component, Element, EnhancedComponent, Instance, Lifecycle, Tag};
pub use config::BindConfig;
pub use dispatch::{source_stream, Dispatch};
pub use error::{BindError, Result};
pub use host::{ErrorBoundary, Getter, Host, MountCallback, Prop, Props, Setter, UnmountCallback};
pub use naming::{PropNames, DISPLAY_NAME, TEST_PREFIX};
