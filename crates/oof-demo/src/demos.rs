#![forbid(unsafe_code)]

//! The demo components.

use std::time::Duration;

use oof::prelude::*;
use oof::runtime::TimerId;

/// Options for [`Counter`].
#[derive(Debug, Clone, Copy)]
pub struct CounterOptions {
    pub starting_count: i64,
    pub change_by: i64,
}

impl Default for CounterOptions {
    fn default() -> Self {
        Self {
            starting_count: 0,
            change_by: 1,
        }
    }
}

/// A count that changes every second. Clicking it resets it to zero.
pub struct Counter {
    count: Value<i64>,
    timers: Timers,
    interval: Option<TimerId>,
}

impl Counter {
    #[must_use]
    pub fn new(timers: &Timers) -> Self {
        Self {
            count: Value::unset(),
            timers: timers.clone(),
            interval: None,
        }
    }

    #[must_use]
    pub fn count(&self) -> &Value<i64> {
        &self.count
    }
}

impl El for Counter {
    type Options = CounterOptions;

    fn init(&mut self, options: CounterOptions) -> Dependencies {
        self.count.set(options.starting_count);
        let count = self.count.clone();
        self.interval = Some(self.timers.set_interval(Duration::from_secs(1), move || {
            count.update(|n| n.copied().unwrap_or(0) + options.change_by);
        }));
        deps![self.count]
    }

    fn render(&self, cx: &RenderCx<'_>) -> Result<NodeId, ElError> {
        let count: &i64 = cx.get(0)?;
        let doc = cx.doc();
        let span = doc.element("span", &[], children![format!("Count: {count}")])?;
        let cell = self.count.clone();
        doc.on(span, "click", move |_| cell.set(0))?;
        Ok(span)
    }

    fn destroy(&mut self) {
        if let Some(id) = self.interval.take() {
            self.timers.clear(id);
        }
    }
}

/// A list of numbers that grows every two seconds, re-rendered as a whole on
/// each change.
pub struct Items {
    items: Value<Vec<u32>>,
    timers: Timers,
    interval: Option<TimerId>,
}

impl Items {
    #[must_use]
    pub fn new(timers: &Timers) -> Self {
        Self {
            items: Value::new(Vec::new()),
            timers: timers.clone(),
            interval: None,
        }
    }
}

impl El for Items {
    type Options = ();

    fn init(&mut self, (): ()) -> Dependencies {
        let items = self.items.clone();
        self.interval = Some(self.timers.set_interval(Duration::from_secs(2), move || {
            items.update(|current| {
                let mut next = current.cloned().unwrap_or_default();
                next.push(next.len() as u32);
                next
            });
        }));
        deps![self.items]
    }

    fn render(&self, cx: &RenderCx<'_>) -> Result<NodeId, ElError> {
        let items: &Vec<u32> = cx.get(0)?;
        let doc = cx.doc();
        let children = items
            .iter()
            .map(|item| doc.element("li", &[], children![*item]).map(Child::from))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(doc.element("ul", &[], children)?)
    }

    fn destroy(&mut self) {
        if let Some(id) = self.interval.take() {
            self.timers.clear(id);
        }
    }
}

/// Render function for the list demo.
pub fn list_item(doc: &Document, item: &String) -> Result<Item, ElError> {
    Ok(doc.element("li", &[], children![item])?.into())
}

/// A list component seeded with two items that appends one every second.
/// The interval is cleared when the returned guard is dropped.
pub fn ticking_list(doc: &Document, timers: &Timers) -> (ElList<String>, IntervalGuard) {
    let list = ElList::new(doc, ["foo".to_string(), "bar".to_string()], list_item);
    let appender = list.clone();
    let id = timers.set_interval(Duration::from_secs(1), move || {
        let next = format!("item {}", appender.len());
        if let Err(error) = appender.append(next) {
            tracing::error!(message = "demo.list_append_failed", %error);
        }
    });
    (
        list,
        IntervalGuard {
            timers: timers.clone(),
            id,
        },
    )
}

/// Clears an interval on drop.
#[derive(Debug)]
pub struct IntervalGuard {
    timers: Timers,
    id: TimerId,
}

impl Drop for IntervalGuard {
    fn drop(&mut self) {
        self.timers.clear(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(spec: &str) -> (Document, NodeId, Timers) {
        let doc = Document::new();
        let target = doc.create_element(spec);
        doc.append_child(doc.body(), target).unwrap();
        (doc, target, Timers::new())
    }

    #[test]
    fn counter_counts_and_resets() {
        let (doc, target, timers) = setup("#counter");
        let options = CounterOptions {
            starting_count: 10,
            change_by: -2,
        };
        let counter = ElHandle::mount(&doc, target, Counter::new(&timers), options).unwrap();
        assert_eq!(doc.text_content(target).unwrap(), "Count: 10");

        timers.advance(Duration::from_secs(2));
        assert_eq!(doc.text_content(target).unwrap(), "Count: 6");

        doc.dispatch(counter.mounted_nodes()[0], "click").unwrap();
        assert_eq!(counter.with(|c| c.count().get()), Some(0));
        assert_eq!(doc.text_content(target).unwrap(), "Count: 0");

        counter.destroy();
        assert_eq!(timers.pending(), 0);
    }

    #[test]
    fn items_grow_every_two_seconds() {
        let (doc, target, timers) = setup("div.list");
        let _items = ElHandle::mount(&doc, target, Items::new(&timers), ()).unwrap();
        assert_eq!(doc.inner_html(target).unwrap(), "<ul></ul>");

        timers.advance(Duration::from_secs(5));
        assert_eq!(
            doc.inner_html(target).unwrap(),
            "<ul><li>0</li><li>1</li></ul>"
        );
    }

    #[test]
    fn list_appends_until_guard_drops() {
        let (doc, target, timers) = setup("ul#list");
        let (list, guard) = ticking_list(&doc, &timers);
        list.mount(target).unwrap();

        timers.advance(Duration::from_secs(1));
        assert_eq!(
            doc.inner_html(target).unwrap(),
            "<li>foo</li><li>bar</li><li>item 2</li>"
        );

        drop(guard);
        timers.advance(Duration::from_secs(3));
        assert_eq!(list.len(), 3);
    }
}
