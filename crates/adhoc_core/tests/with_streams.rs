//! Integration tests for stream binding on enhanced components
//!
//! These tests verify that:
//! - Injected properties start empty and follow their derived streams
//! - Dispatch reaches every blueprint in call order while mounted
//! - Test mode prefixes every injected name
//! - Unmounting releases every subscription, even mid-emission

use adhoc_core::{
    try_with_streams, with_streams, Action, BindConfig, BindError, Blueprints, Dispatch,
    ErrorBoundary, Getter, Host, MountCallback, Prop, Props, Setter, Tag, UnmountCallback,
};
use adhoc_stream::{operator_error, Stream};
use std::cell::RefCell;
use std::rc::Rc;

type Text = Props<String, String>;

fn identity(stream: Stream<String>, _: &Text) -> Stream<String> {
    stream
}

/// Records the source stream a blueprint receives
fn capture(
    slot: &Rc<RefCell<Option<Stream<String>>>>,
) -> impl Fn(Stream<String>, &Text) -> Stream<String> {
    let slot = slot.clone();
    move |stream: Stream<String>, _: &Text| {
        *slot.borrow_mut() = Some(stream.clone());
        stream
    }
}

#[test]
fn test_display_name() {
    let probe = with_streams(Blueprints::<String, String>::new(), true).apply(Tag::new("div"));
    assert_eq!(probe.display_name(), "withStreams");
    assert_eq!(probe.enhancer().display_name(), "withStreams");
}

#[test]
fn test_empty_blueprints_inject_only_dispatch() {
    let probe = with_streams(Blueprints::<String, String>::new(), true).apply(Tag::new("div"));
    let instance = probe.mount(Props::new());
    let div = instance.render();

    assert_eq!(div.tag, "div");
    assert_eq!(div.props.names().collect::<Vec<_>>(), vec!["data-dispatch"]);
    assert!(div.dispatch("data-dispatch").is_some());
}

#[test]
fn test_passes_additional_props_to_base_component() {
    let blueprints = Blueprints::new().with("test", identity);
    let probe = with_streams(blueprints, true).apply(Tag::new("div"));
    let div = probe.mount(Props::new()).render();

    assert_eq!(div.prop("data-test"), Some(&String::new()));
    assert!(div.dispatch("data-dispatch").is_some());
}

#[test]
fn test_populates_value_from_stream_on_mount() {
    let blueprints = Blueprints::new().with("test", |stream: Stream<String>, _: &Text| {
        stream.start_with("Boom!".to_string())
    });
    let probe = with_streams(blueprints, true).apply(Tag::new("div"));
    let div = probe.mount(Props::new()).render();

    assert_eq!(div.prop("data-test"), Some(&"Boom!".to_string()));
}

#[test]
fn test_every_property_starts_empty() {
    let blueprints = Blueprints::new()
        .with("a", identity)
        .with("b", |s: Stream<String>, _: &Text| s.map(|v| v.repeat(2)))
        .with("c", |s: Stream<String>, _: &Text| s.filter(|v| !v.is_empty()));
    let probe = with_streams(blueprints, false).apply(Tag::new("div"));

    let instance = probe.instantiate(Props::new());
    let before = instance.render();
    for name in ["a", "b", "c"] {
        assert_eq!(before.prop(name), Some(&String::new()));
    }
    assert!(!instance.is_mounted());
}

#[test]
fn test_normal_mode_has_no_prefix() {
    let blueprints = Blueprints::new().with("count", identity);
    let div = with_streams(blueprints, false)
        .apply(Tag::new("div"))
        .mount(Props::new())
        .render();

    assert_eq!(div.props.names().collect::<Vec<_>>(), vec!["dispatch", "count"]);
    assert!(!div.props.names().any(|name| name.starts_with("data-")));
}

#[test]
fn test_dispatch_reaches_every_blueprint_in_order() {
    let blueprints = Blueprints::new()
        .with("history", |s: Stream<String>, _: &Text| {
            s.fold(String::new(), |acc, v| format!("{acc}{v}"))
        })
        .with("last", identity);
    let probe = with_streams(blueprints, false).apply(Tag::new("div"));
    let instance = probe.mount(Props::new());

    let dispatch = instance.dispatch().cloned();
    let dispatch = dispatch.expect("dispatch injected");
    dispatch.dispatch("a".to_string()).unwrap();
    dispatch.dispatch("b".to_string()).unwrap();
    dispatch.dispatch("c".to_string()).unwrap();

    assert_eq!(instance.value("history"), Some("abc".to_string()));
    assert_eq!(instance.value("last"), Some("c".to_string()));
}

#[test]
fn test_dispatch_before_mount_is_inactive() {
    let blueprints = Blueprints::new().with("test", identity);
    let probe = with_streams(blueprints, false).apply(Tag::new("div"));
    let instance = probe.instantiate(Props::new());

    let dispatch = instance.dispatch().cloned().expect("dispatch injected");
    assert!(!dispatch.is_active());
    assert_eq!(dispatch.dispatch("early".to_string()), Err(BindError::Inactive));
    assert_eq!(instance.value("test"), Some(String::new()));
}

#[test]
fn test_unmount_releases_subscriptions() {
    let source = Rc::new(RefCell::new(None));
    let blueprints = Blueprints::new().with("test", capture(&source));
    let probe = with_streams(blueprints, false).apply(Tag::new("div"));
    let mut instance = probe.mount(Props::new());

    let stream = source.borrow().clone().expect("blueprint ran on mount");
    assert_eq!(stream.listener_count(), 1);

    instance.unmount();
    assert_eq!(stream.listener_count(), 0);
    assert!(!stream.is_running());

    let dispatch = instance.dispatch().cloned().expect("dispatch injected");
    assert_eq!(dispatch.dispatch("late".to_string()), Err(BindError::Inactive));
}

#[test]
fn test_instances_do_not_share_source_streams() {
    let blueprints = Blueprints::new().with("test", identity);
    let probe = with_streams(blueprints, false).apply(Tag::new("div"));
    let first = probe.mount(Props::new());
    let second = probe.mount(Props::new());

    first
        .dispatch()
        .expect("dispatch injected")
        .dispatch("only first".to_string())
        .unwrap();

    assert_eq!(first.value("test"), Some("only first".to_string()));
    assert_eq!(second.value("test"), Some(String::new()));
}

#[test]
fn test_blueprint_receives_own_props() {
    let blueprints = Blueprints::new().with("greeting", |s: Stream<String>, props: &Text| {
        let name = props.value("name").cloned().unwrap_or_default();
        s.map(move |salutation| format!("{salutation}, {name}"))
    });
    let probe = with_streams(blueprints, false).apply(Tag::new("p"));
    let instance = probe.mount(Props::new().with_value("name", "Ada".to_string()));

    instance
        .dispatch()
        .expect("dispatch injected")
        .dispatch("Hello".to_string())
        .unwrap();

    let p = instance.render();
    assert_eq!(p.prop("greeting"), Some(&"Hello, Ada".to_string()));
    assert_eq!(p.prop("name"), Some(&"Ada".to_string()));
}

#[test]
fn test_stream_error_reaches_boundary() {
    let blueprints = Blueprints::new().with("test", |s: Stream<String>, _: &Text| {
        s.try_map(|v| {
            if v == "bad" {
                Err(operator_error("rejected"))
            } else {
                Ok(v)
            }
        })
    });
    let probe = with_streams(blueprints, true).apply(Tag::new("div"));
    let instance = probe.mount(Props::new());
    let dispatch = instance.dispatch().cloned().expect("dispatch injected");

    dispatch.dispatch("good".to_string()).unwrap();
    dispatch.dispatch("bad".to_string()).unwrap();

    assert_eq!(instance.value("data-test"), Some("good".to_string()));
    assert_eq!(
        instance.errors(),
        vec![BindError::Stream {
            property: "data-test".to_string(),
            source: operator_error("rejected"),
        }]
    );
    // The failed stream released the source
    assert!(!dispatch.is_active());
}

#[test]
fn test_reserved_key_overwrites_dispatch() {
    let blueprints = Blueprints::new().with("dispatch", identity);
    let div = with_streams(blueprints, false)
        .apply(Tag::new("div"))
        .mount(Props::new())
        .render();

    assert_eq!(div.prop("dispatch"), Some(&String::new()));
    assert!(div.dispatch("dispatch").is_none());
}

#[test]
fn test_strict_config_rejects_reserved_key() {
    let blueprints = Blueprints::new().with("dispatch", identity);
    let result = try_with_streams(blueprints, BindConfig::new().test_mode().strict());

    match result {
        Err(BindError::ReservedName { key, reserved }) => {
            assert_eq!(key, "dispatch");
            assert_eq!(reserved, "data-dispatch");
        }
        _ => panic!("expected a reserved name error"),
    }
}

#[test]
fn test_custom_prefix() {
    let blueprints = Blueprints::new().with("test", identity);
    let enhancer =
        try_with_streams(blueprints, BindConfig::new().test_mode().with_prefix("qa-")).unwrap();
    let div = enhancer.apply(Tag::new("div")).mount(Props::new()).render();

    assert_eq!(div.props.names().collect::<Vec<_>>(), vec!["qa-dispatch", "qa-test"]);
}

#[test]
fn test_tagged_actions() {
    type Counter = Props<i64, Action<&'static str, i64>>;

    let blueprints = Blueprints::new().with(
        "count",
        |s: Stream<Action<&'static str, i64>>, _: &Counter| {
            s.fold(0, |total, action| match action.kind {
                "add" => total + action.payload,
                "sub" => total - action.payload,
                _ => total,
            })
        },
    );
    let probe = with_streams(blueprints, false).apply(Tag::new("span"));
    let instance = probe.mount(Props::new());
    let dispatch = instance.dispatch().cloned().expect("dispatch injected");

    dispatch.dispatch_kind("add", 5).unwrap();
    dispatch.dispatch_kind("sub", 2).unwrap();
    dispatch.dispatch(Action::new("noop", 100)).unwrap();

    assert_eq!(instance.value("count"), Some(3));
}

/// Host whose setters can trigger an unmount from inside an emission
struct ReentrantHost {
    values: Rc<RefCell<Vec<String>>>,
    dispatch: Option<Dispatch<String>>,
    mount: Vec<MountCallback<String, String>>,
    unmount: Rc<RefCell<Vec<UnmountCallback>>>,
}

impl ReentrantHost {
    fn new() -> Self {
        Self {
            values: Rc::new(RefCell::new(Vec::new())),
            dispatch: None,
            mount: Vec::new(),
            unmount: Rc::new(RefCell::new(Vec::new())),
        }
    }

    fn mount(&mut self) {
        let props = Props::new();
        for callback in std::mem::take(&mut self.mount) {
            callback(&props);
        }
    }
}

fn run_unmount(callbacks: &Rc<RefCell<Vec<UnmountCallback>>>) {
    let pending = std::mem::take(&mut *callbacks.borrow_mut());
    for callback in pending {
        callback();
    }
}

impl Host<String, String> for ReentrantHost {
    fn inject_state(
        &mut self,
        _name: &str,
        _setter_name: &str,
        initial: String,
    ) -> (Getter<String>, Setter<String>) {
        let values = self.values.clone();
        values.borrow_mut().push(initial.clone());
        let unmount = self.unmount.clone();

        let getter: Getter<String> = Rc::new(move || initial.clone());
        let setter: Setter<String> = Rc::new(move |value: String| {
            let stop = value == "stop";
            values.borrow_mut().push(value);
            if stop {
                run_unmount(&unmount);
            }
        });
        (getter, setter)
    }

    fn inject_property(&mut self, _name: &str, value: Prop<String, String>) {
        if let Prop::Dispatch(dispatch) = value {
            self.dispatch = Some(dispatch);
        }
    }

    fn on_mount(&mut self, callback: MountCallback<String, String>) {
        self.mount.push(callback);
    }

    fn on_unmount(&mut self, callback: UnmountCallback) {
        self.unmount.borrow_mut().push(callback);
    }

    fn error_boundary(&self) -> ErrorBoundary {
        Rc::new(|error: BindError| panic!("unexpected error: {error}"))
    }
}

#[test]
fn test_unmount_during_emission_releases_everything() {
    let source = Rc::new(RefCell::new(None));
    let blueprints = Blueprints::new()
        .with("first", capture(&source))
        .with("second", identity);
    let enhancer = with_streams(blueprints, false);

    let mut host = ReentrantHost::new();
    let bound = enhancer.install(&mut host);
    host.mount();

    let stream = source.borrow().clone().expect("blueprint ran on mount");
    assert_eq!(stream.listener_count(), 2);

    bound.dispatch().dispatch("go".to_string()).unwrap();
    bound.dispatch().dispatch("stop".to_string()).unwrap();

    // "stop" unmounted from inside the first listener; the second never saw it
    assert_eq!(*host.values.borrow(), vec!["", "", "go", "go", "stop"]);
    assert_eq!(stream.listener_count(), 0);
    assert!(!bound.dispatch().is_active());
    assert!(host.dispatch.as_ref().is_some_and(|d| !d.is_active()));
}

#[test]
fn test_unmount_during_mount_releases_everything() {
    let source = Rc::new(RefCell::new(None));
    let calls = Rc::new(RefCell::new(0));
    let calls_clone = calls.clone();
    let blueprints = Blueprints::new()
        .with("first", |s: Stream<String>, _: &Text| s.start_with("stop".to_string()))
        .with("second", move |s: Stream<String>, _: &Text| {
            *calls_clone.borrow_mut() += 1;
            s
        })
        .with("third", capture(&source));
    let enhancer = with_streams(blueprints, false);

    let mut host = ReentrantHost::new();
    let bound = enhancer.install(&mut host);
    host.mount();

    assert_eq!(*calls.borrow(), 0);
    assert!(source.borrow().is_none());
    assert!(!bound.dispatch().is_active());
}
