//! Cascade of a diff batch down the node tree.
//!
//! Starting at the root, every node fires its subscribers once, mirrors the
//! cascade into its chained projection, drops cached children that no longer
//! address anything, and recurses only into children whose key some diff
//! passes through. When no diff carries a path below the node (the node
//! itself or one of its ancestors was replaced), every cached child is
//! visited.

use crate::diff::{strip_diffs, NodeDiff};
use crate::event::AttachEvent;
use crate::lens::Lens;
use crate::tree::{NodeId, Source, Tree};
use alloc::rc::Rc;
use alloc::vec::Vec;
use lenskit_core::{Kind, Value};
use tracing::trace;

pub(crate) fn cascade(tree: &Rc<Tree>, id: NodeId, diffs: Vec<NodeDiff>, value: Value, prev: Value) {
    let (subscribers, chain) = tree.with(id, |r| (r.subscribers.snapshot(), r.chain));

    if !subscribers.is_empty() {
        let event = AttachEvent::new(diffs.clone(), value.clone(), prev.clone());
        let lens = Lens::from_parts(Rc::clone(tree), id);
        for callback in subscribers {
            callback(&event, &lens);
        }
    }

    if let Some(chain) = chain {
        if let Source::Chain { mapping, .. } = tree.source(chain) {
            let (mapped, mapped_prev) = (mapping.forward(&value), mapping.forward(&prev));
            cascade(tree, chain, diffs.clone(), mapped, mapped_prev);
        }
    }

    match value.kind() {
        Kind::Scalar => {
            let evicted = tree.evict(id, |_| true);
            if evicted > 0 {
                trace!(node = id, evicted, "children evicted");
            }
            return;
        }
        Kind::Sequence => {
            let len = value.len();
            let grew_or_kept = prev.is_array() && prev.len() <= len;
            if !grew_or_kept {
                let evicted = tree.evict(id, |k| k.as_index().map_or(false, |i| i >= len));
                if evicted > 0 {
                    trace!(node = id, evicted, "children evicted");
                }
            }
        }
        Kind::Map => {}
    }

    let wholesale = diffs.iter().all(NodeDiff::is_root);
    for (key, child) in tree.children(id) {
        // a subscriber may have evicted or replaced it meanwhile
        if !tree.is_child(id, &key, child) {
            continue;
        }
        if !wholesale && !diffs.iter().any(|d| d.enters(&key)) {
            continue;
        }
        cascade(
            tree,
            child,
            strip_diffs(&key, &diffs),
            value.get_key(&key),
            prev.get_key(&key),
        );
    }
}
