//! Runs each demo end to end and checks the printed HTML.

use oof::runtime::ReconcileStrategy;
use oof_demo::cli::{DemoKind, Opts};
use oof_demo::run;

// ── Helpers ─────────────────────────────────────────────────────────────

fn output(demo: DemoKind, ticks: u32, reconciler: ReconcileStrategy) -> Vec<String> {
    let opts = Opts {
        demo,
        ticks,
        reconciler,
    };
    let mut out = Vec::new();
    run(&opts, &mut out).unwrap();
    String::from_utf8(out)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

// ── Demos ───────────────────────────────────────────────────────────────

#[test]
fn counter_prints_each_tick_and_resets_on_click() {
    let lines = output(DemoKind::Counter, 5, ReconcileStrategy::Auto);
    assert_eq!(lines.len(), 6);
    assert_eq!(lines[0], r#"tick 0: <span id="my-counter"><span>Count: 0</span></span>"#);
    assert_eq!(lines[3], r#"tick 3: <span id="my-counter"><span>Count: 3</span></span>"#);
    // Tick 4 clicks after the interval fires.
    assert_eq!(lines[4], r#"tick 4: <span id="my-counter"><span>Count: 0</span></span>"#);
    assert_eq!(lines[5], r#"tick 5: <span id="my-counter"><span>Count: 1</span></span>"#);
}

#[test]
fn list_appends_one_item_per_tick() {
    let lines = output(DemoKind::List, 2, ReconcileStrategy::Auto);
    assert_eq!(
        lines,
        vec![
            r#"tick 0: <ul id="list"><li>foo</li><li>bar</li></ul>"#,
            r#"tick 1: <ul id="list"><li>foo</li><li>bar</li><li>item 2</li></ul>"#,
            r#"tick 2: <ul id="list"><li>foo</li><li>bar</li><li>item 2</li><li>item 3</li></ul>"#,
        ]
    );
}

#[test]
fn items_output_does_not_depend_on_reconciler() {
    let replaced = output(DemoKind::Items, 6, ReconcileStrategy::Replace);
    let patched = output(DemoKind::Items, 6, ReconcileStrategy::Patch);
    assert_eq!(replaced, patched);
    assert_eq!(
        replaced[6],
        r#"tick 6: <div class="list"><ul><li>0</li><li>1</li><li>2</li></ul></div>"#
    );
}

#[test]
fn zero_ticks_prints_initial_state_only() {
    let lines = output(DemoKind::Counter, 0, ReconcileStrategy::Replace);
    assert_eq!(lines.len(), 1);
}
