//! End-to-end component behavior: mount, re-render under each reconcile
//! strategy, contract violations, timers and tracing.

use std::cell::Cell;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use oof_dom::{Document, NodeId, children};
use oof_reactive::{Dependencies, Value, deps};
use oof_runtime::{
    El, ElError, ElHandle, Lifecycle, MountConfig, ReconcileStrategy, RenderCx, TimerId, Timers,
};
use tracing::Subscriber;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};

// ── Helpers ─────────────────────────────────────────────────────────────

struct Counter {
    count: Value<i64>,
    timers: Option<Timers>,
    interval: Option<TimerId>,
}

impl Counter {
    fn new() -> Self {
        Self {
            count: Value::new(0),
            timers: None,
            interval: None,
        }
    }

    fn ticking(timers: &Timers) -> Self {
        Self {
            timers: Some(timers.clone()),
            ..Self::new()
        }
    }
}

impl El for Counter {
    type Options = ();

    fn init(&mut self, (): ()) -> Dependencies {
        if let Some(timers) = &self.timers {
            let count = self.count.clone();
            self.interval = Some(timers.set_interval(Duration::from_secs(1), move || {
                count.update(|n| n.copied().unwrap_or(0) + 1);
            }));
        }
        deps![self.count]
    }

    fn render(&self, cx: &RenderCx<'_>) -> Result<NodeId, ElError> {
        let count: &i64 = cx.get(0)?;
        let doc = cx.doc();
        let node = doc.element("div.counter", &[], children![
            doc.element("span.value", &[], children![*count])?,
        ])?;
        let cell = self.count.clone();
        doc.on(node, "click", move |_| cell.set(0))?;
        Ok(node)
    }

    fn destroy(&mut self) {
        if let (Some(timers), Some(id)) = (&self.timers, self.interval.take()) {
            timers.clear(id);
        }
    }
}

/// Renders the same node every time, which is attached after the first.
struct Reuses {
    tick: Value<u32>,
    node: Cell<Option<NodeId>>,
}

impl El for Reuses {
    type Options = ();

    fn init(&mut self, (): ()) -> Dependencies {
        deps![self.tick]
    }

    fn render(&self, cx: &RenderCx<'_>) -> Result<NodeId, ElError> {
        let node = match self.node.get() {
            Some(node) => node,
            None => {
                let node = cx.doc().create_element("p");
                self.node.set(Some(node));
                node
            }
        };
        Ok(node)
    }
}

/// Reads its dependency as the wrong type.
struct Confused {
    text: Value<String>,
}

impl El for Confused {
    type Options = ();

    fn init(&mut self, (): ()) -> Dependencies {
        deps![self.text]
    }

    fn render(&self, cx: &RenderCx<'_>) -> Result<NodeId, ElError> {
        let n: &i64 = cx.get(0)?;
        Ok(cx.doc().element("p", &[], children![*n])?)
    }
}

fn setup() -> (Document, NodeId) {
    let doc = Document::new();
    let app = doc.create_element("#app");
    doc.append_child(doc.body(), app).unwrap();
    (doc, app)
}

fn mount_counter(doc: &Document, strategy: ReconcileStrategy) -> ElHandle<Counter> {
    let config = MountConfig::new().with_strategy(strategy);
    ElHandle::mount_with(doc, "#app", Counter::new(), (), config).unwrap()
}

// ── Reconcile strategies ────────────────────────────────────────────────

#[test]
fn counter_replace_swaps_node() {
    let (doc, app) = setup();
    let counter = mount_counter(&doc, ReconcileStrategy::Replace);
    let before = counter.mounted_nodes()[0];
    assert_eq!(doc.text_content(app).unwrap(), "0");

    counter.with(|c| c.count.set(5));
    let after = counter.mounted_nodes()[0];
    assert_ne!(before, after);
    assert!(!doc.is_live(before));
    assert_eq!(doc.children(app).unwrap(), vec![after]);
    assert_eq!(
        doc.inner_html(app).unwrap(),
        r#"<div class="counter"><span class="value">5</span></div>"#
    );
}

#[test]
fn counter_patch_keeps_node() {
    let (doc, app) = setup();
    let counter = mount_counter(&doc, ReconcileStrategy::Patch);
    let before = counter.mounted_nodes()[0];
    let nodes = doc.node_count();

    counter.with(|c| c.count.set(5));
    assert_eq!(counter.mounted_nodes(), vec![before]);
    assert_eq!(doc.text_content(app).unwrap(), "5");
    assert_eq!(doc.node_count(), nodes);
}

#[test]
fn click_listener_survives_both_strategies() {
    for strategy in [ReconcileStrategy::Replace, ReconcileStrategy::Patch] {
        let (doc, app) = setup();
        let counter = mount_counter(&doc, strategy);
        counter.with(|c| c.count.set(7));

        let node = counter.mounted_nodes()[0];
        assert_eq!(doc.listener_count(node, "click").unwrap(), 1, "{strategy}");
        doc.dispatch(node, "click").unwrap();
        assert_eq!(doc.text_content(app).unwrap(), "0", "{strategy}");
    }
}

#[test]
fn every_matching_target_is_updated() {
    let doc = Document::new();
    for _ in 0..3 {
        let slot = doc.create_element(".slot");
        doc.append_child(doc.body(), slot).unwrap();
    }
    let counter = ElHandle::mount(&doc, ".slot", Counter::new(), ()).unwrap();
    assert_eq!(counter.targets().len(), 3);

    counter.with(|c| c.count.set(2));
    for slot in doc.query_selector_all(".slot").unwrap() {
        assert_eq!(doc.text_content(slot).unwrap(), "2");
    }
    let distinct: std::collections::HashSet<_> = counter.mounted_nodes().into_iter().collect();
    assert_eq!(distinct.len(), 3);
}

// ── Contract violations ─────────────────────────────────────────────────

#[test]
fn violation_on_first_render_attaches_nothing() {
    let (doc, app) = setup();
    let before = doc.node_count();
    let err = ElHandle::mount(&doc, app, Confused { text: Value::new("x".into()) }, ())
        .unwrap_err();
    assert!(err.is_contract_violation());
    assert!(err.to_string().contains("Confused"), "{err}");
    assert!(doc.children(app).unwrap().is_empty());
    assert_eq!(doc.node_count(), before);
}

#[test]
fn attached_node_on_rerender_fails_component() {
    let (doc, app) = setup();
    let handle = ElHandle::mount_with(
        &doc,
        app,
        Reuses {
            tick: Value::new(0),
            node: Cell::new(None),
        },
        (),
        MountConfig::new().with_strategy(ReconcileStrategy::Replace),
    )
    .unwrap();
    let tick = handle.with(|r| r.tick.clone());

    tick.set(1);
    assert_eq!(handle.lifecycle(), Lifecycle::Failed);
    assert!(handle.last_error().is_some_and(|e| e.is_contract_violation()));
    assert_eq!(doc.children(app).unwrap().len(), 1);

    // Failed components ignore further changes.
    tick.set(2);
    assert_eq!(handle.lifecycle(), Lifecycle::Failed);
}

// ── Timers ──────────────────────────────────────────────────────────────

#[test]
fn interval_drives_counter_until_destroyed() {
    let (doc, app) = setup();
    let timers = Timers::new();
    let counter = ElHandle::mount(&doc, app, Counter::ticking(&timers), ()).unwrap();
    assert_eq!(timers.pending(), 1);

    timers.advance(Duration::from_secs(3));
    assert_eq!(doc.text_content(app).unwrap(), "3");

    doc.dispatch(counter.mounted_nodes()[0], "click").unwrap();
    assert_eq!(doc.text_content(app).unwrap(), "0");
    timers.advance(Duration::from_secs(1));
    assert_eq!(doc.text_content(app).unwrap(), "1");

    counter.destroy();
    assert_eq!(timers.pending(), 0);
    timers.advance(Duration::from_secs(5));
    assert_eq!(doc.text_content(app).unwrap(), "1");
}

#[test]
fn dropping_handle_clears_interval() {
    let (doc, app) = setup();
    let timers = Timers::new();
    let counter = ElHandle::mount(&doc, app, Counter::ticking(&timers), ()).unwrap();
    drop(counter);
    assert_eq!(timers.pending(), 0);
}

#[test]
fn detached_handle_keeps_rendering() {
    let (doc, app) = setup();
    let timers = Timers::new();
    ElHandle::mount(&doc, app, Counter::ticking(&timers), ())
        .unwrap()
        .detach();

    timers.advance(Duration::from_secs(2));
    assert_eq!(doc.text_content(app).unwrap(), "2");
}

// ── Tracing ─────────────────────────────────────────────────────────────

#[derive(Default)]
struct TraceState {
    saw_mount_span: bool,
    saw_render_span: bool,
    saw_duration_record: bool,
    saw_failure_event: bool,
}

struct TraceCapture {
    state: Arc<Mutex<TraceState>>,
}

impl<S> Layer<S> for TraceCapture
where
    S: Subscriber + for<'lookup> tracing_subscriber::registry::LookupSpan<'lookup>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        _id: &tracing::Id,
        _ctx: Context<'_, S>,
    ) {
        let mut state = self.state.lock().expect("trace lock");
        match attrs.metadata().name() {
            "el.mount" => state.saw_mount_span = true,
            "el.render" => state.saw_render_span = true,
            _ => {}
        }
    }

    fn on_record(&self, id: &tracing::Id, values: &tracing::span::Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        if span.metadata().name() != "el.render" {
            return;
        }
        struct V {
            saw: bool,
        }
        impl tracing::field::Visit for V {
            fn record_u64(&mut self, field: &tracing::field::Field, _value: u64) {
                if field.name() == "render_duration_us" {
                    self.saw = true;
                }
            }

            fn record_debug(&mut self, _field: &tracing::field::Field, _value: &dyn std::fmt::Debug) {
            }
        }
        let mut v = V { saw: false };
        values.record(&mut v);
        if v.saw {
            self.state.lock().expect("trace lock").saw_duration_record = true;
        }
    }

    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        struct Msg {
            message: Option<String>,
        }
        impl tracing::field::Visit for Msg {
            fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
                if field.name() == "message" {
                    self.message = Some(value.to_string());
                }
            }

            fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
                if field.name() == "message" {
                    self.message = Some(format!("{value:?}").trim_matches('"').to_string());
                }
            }
        }
        let mut msg = Msg { message: None };
        event.record(&mut msg);
        if msg.message.as_deref() == Some("el.render_failed") {
            self.state.lock().expect("trace lock").saw_failure_event = true;
        }
    }
}

#[test]
fn render_span_and_failure_event_emitted() {
    let state = Arc::new(Mutex::new(TraceState::default()));
    let subscriber = tracing_subscriber::registry().with(TraceCapture {
        state: Arc::clone(&state),
    });
    let _guard = tracing::subscriber::set_default(subscriber);

    let (doc, app) = setup();
    let handle = ElHandle::mount(
        &doc,
        app,
        Reuses {
            tick: Value::new(0),
            node: Cell::new(None),
        },
        (),
    )
    .unwrap();
    handle.with(|r| r.tick.set(1));

    let snapshot = state.lock().expect("trace lock");
    assert!(snapshot.saw_mount_span, "expected el.mount span");
    assert!(snapshot.saw_render_span, "expected el.render span");
    assert!(snapshot.saw_duration_record, "expected render_duration_us record");
    assert!(snapshot.saw_failure_event, "expected el.render_failed event");
}
