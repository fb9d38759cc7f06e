//! Property-based tests for list components.
//!
//! 1. After any sequence of operations every target's children mirror the
//!    backing state, item for item.
//! 2. Operations leave nodes of untouched items in place.
//! 3. Rejected operations change neither state nor document.

use oof_dom::{Document, NodeId, children};
use oof_runtime::{ElError, ElList, Item};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    Append(u16),
    Prepend(u16),
    Set(usize, u16),
    Remove(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<u16>().prop_map(Op::Append),
        any::<u16>().prop_map(Op::Prepend),
        (0usize..12, any::<u16>()).prop_map(|(i, v)| Op::Set(i, v)),
        (0usize..12).prop_map(Op::Remove),
    ]
}

fn render(doc: &Document, n: &u16) -> Result<Item, ElError> {
    Ok(doc.element("li", &[], children![*n])?.into())
}

fn texts(doc: &Document, target: NodeId) -> Vec<String> {
    doc.children(target)
        .unwrap()
        .into_iter()
        .map(|child| doc.text_content(child).unwrap())
        .collect()
}

fn setup(initial: &[u16], targets: usize) -> (Document, Vec<NodeId>, ElList<u16>) {
    let doc = Document::new();
    let list = ElList::new(&doc, initial.iter().copied(), render);
    let mut nodes = Vec::new();
    for _ in 0..targets {
        let target = doc.create_element("ul.list");
        doc.append_child(doc.body(), target).unwrap();
        nodes.push(target);
    }
    list.mount(".list").unwrap();
    (doc, nodes, list)
}

fn apply(list: &ElList<u16>, model: &mut Vec<u16>, op: &Op) {
    match *op {
        Op::Append(v) => {
            list.append(v).unwrap();
            model.push(v);
        }
        Op::Prepend(v) => {
            list.prepend(v).unwrap();
            model.insert(0, v);
        }
        Op::Set(i, v) => {
            let result = list.set(i, v);
            if i < model.len() {
                result.unwrap();
                model[i] = v;
            } else {
                assert_eq!(result, Err(ElError::IndexOutOfRange { index: i, len: model.len() }));
            }
        }
        Op::Remove(i) => {
            let result = list.remove(i);
            if i < model.len() {
                assert_eq!(result, Ok(model.remove(i)));
            } else {
                assert!(result.is_err());
            }
        }
    }
}

// ── Properties ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn children_mirror_state(
        initial in proptest::collection::vec(any::<u16>(), 0..6),
        ops in proptest::collection::vec(op(), 0..24),
        targets in 1usize..4,
    ) {
        let (doc, nodes, list) = setup(&initial, targets);
        let mut model = initial.clone();
        for op in &ops {
            apply(&list, &mut model, op);
        }

        let expected: Vec<String> = model.iter().map(u16::to_string).collect();
        prop_assert_eq!(list.with(|items| items.to_vec()), model);
        for target in nodes {
            prop_assert_eq!(texts(&doc, target), expected.clone());
        }
    }

    #[test]
    fn set_touches_only_its_index(
        initial in proptest::collection::vec(any::<u16>(), 1..8),
        pick in any::<prop::sample::Index>(),
        value in any::<u16>(),
    ) {
        let (doc, nodes, list) = setup(&initial, 1);
        let target = nodes[0];
        let index = pick.index(initial.len());
        let before = doc.children(target).unwrap();

        list.set(index, value).unwrap();
        let after = doc.children(target).unwrap();
        prop_assert_eq!(after.len(), before.len());
        for (i, (old, new)) in before.iter().zip(&after).enumerate() {
            if i == index {
                prop_assert_ne!(old, new);
            } else {
                prop_assert_eq!(old, new);
            }
        }
    }

    #[test]
    fn rejected_ops_change_nothing(
        initial in proptest::collection::vec(any::<u16>(), 0..5),
        offset in 0usize..4,
    ) {
        let (doc, nodes, list) = setup(&initial, 2);
        let html_before = doc.inner_html(doc.body()).unwrap();
        let count_before = doc.node_count();

        let index = initial.len() + offset;
        prop_assert!(list.set(index, 0).is_err());
        prop_assert!(list.remove(index).is_err());
        prop_assert_eq!(doc.inner_html(doc.body()).unwrap(), html_before);
        prop_assert_eq!(doc.node_count(), count_before);
        prop_assert_eq!(list.len(), initial.len());
        prop_assert_eq!(nodes.len(), 2);
    }
}
