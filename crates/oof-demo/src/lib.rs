#![forbid(unsafe_code)]

//! oof demo runner.
//!
//! Mounts one demo into a fresh [`Document`](oof::dom::Document), advances a
//! virtual clock one second per tick and writes the body's HTML after each
//! tick. Logs go to stderr, filtered by `RUST_LOG`.

pub mod cli;
pub mod demos;
pub mod error;

use std::io::{self, Write};
use std::time::Duration;

use oof::prelude::*;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::{Command, DemoKind, HELP_TEXT, Opts, VERSION};
use crate::demos::{Counter, CounterOptions, Items, ticking_list};
use crate::error::Result;

/// Every this many ticks the counter demo clicks its counter.
const CLICK_EVERY: u32 = 4;

/// Install the stderr log subscriber.
pub fn init_logging() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .try_init()?;
    Ok(())
}

pub fn run_from_env() -> Result<()> {
    init_logging()?;
    match Opts::parse()? {
        Command::Help => println!("{HELP_TEXT}"),
        Command::Version => println!("oof-demo {VERSION}"),
        Command::Run(opts) => run(&opts, &mut io::stdout().lock())?,
    }
    Ok(())
}

/// Run the demo `opts` selects, writing one line of HTML per tick to `out`.
pub fn run(opts: &Opts, out: &mut impl Write) -> Result<()> {
    tracing::info!(
        message = "demo.start",
        demo = %opts.demo,
        ticks = opts.ticks,
        reconciler = %opts.reconciler
    );
    let doc = Document::new();
    let timers = Timers::new();
    let config = MountConfig::new().with_strategy(opts.reconciler);

    match opts.demo {
        DemoKind::Counter => {
            let target = mount_point(&doc, "span#my-counter")?;
            let counter = ElHandle::mount_with(
                &doc,
                target,
                Counter::new(&timers),
                CounterOptions::default(),
                config,
            )?;
            let _log = counter.with(|c| {
                c.count()
                    .on_change(|count| tracing::debug!(message = "demo.count", count = *count))
            });
            tick_loop(&doc, &timers, opts.ticks, out, |tick| {
                if tick % CLICK_EVERY == 0
                    && let Some(&node) = counter.mounted_nodes().first()
                {
                    doc.dispatch(node, "click")?;
                }
                Ok(())
            })?;
            counter.destroy();
        }
        DemoKind::List => {
            mount_point(&doc, "ul#list")?;
            let (list, _guard) = ticking_list(&doc, &timers);
            list.mount("#list")?;
            tick_loop(&doc, &timers, opts.ticks, out, |_| Ok(()))?;
        }
        DemoKind::Items => {
            let target = mount_point(&doc, "div.list")?;
            let items = ElHandle::mount_with(&doc, target, Items::new(&timers), (), config)?;
            tick_loop(&doc, &timers, opts.ticks, out, |_| Ok(()))?;
            items.destroy();
        }
    }
    Ok(())
}

fn mount_point(doc: &Document, spec: &str) -> Result<NodeId> {
    let node = doc.create_element(spec);
    doc.append_child(doc.body(), node)?;
    Ok(node)
}

/// Print tick 0, then advance one second per tick, calling `after` and
/// printing each time.
fn tick_loop(
    doc: &Document,
    timers: &Timers,
    ticks: u32,
    out: &mut impl Write,
    mut after: impl FnMut(u32) -> Result<()>,
) -> Result<()> {
    write_tick(doc, 0, out)?;
    for tick in 1..=ticks {
        let fired = timers.advance(Duration::from_secs(1));
        after(tick)?;
        tracing::debug!(message = "demo.tick", tick, fired, nodes = doc.node_count());
        write_tick(doc, tick, out)?;
    }
    out.flush()?;
    Ok(())
}

fn write_tick(doc: &Document, tick: u32, out: &mut impl Write) -> Result<()> {
    let html = doc.inner_html(doc.body())?;
    writeln!(out, "tick {tick}: {html}")?;
    Ok(())
}
