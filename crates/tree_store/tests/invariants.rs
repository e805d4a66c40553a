//! Linkage invariants under randomized operation sequences.
//!
//! After any sequence of store operations:
//! - every node's parent is the root or a live node,
//! - a node is listed in its parent's children iff its parent names that
//!   parent, with no duplicate child entries,
//! - no node is its own transitive ancestor.

use serde_json::json;
use tree_store::{Attributes, NodeStore};

fn assert_linkage(store: &NodeStore) {
    let snapshot = store.inspect();
    for node in &snapshot.nodes {
        match &node.parent {
            None => {
                assert!(
                    store.roots().contains(&node.id),
                    "root-parented node {} missing from roots",
                    node.id
                );
            }
            Some(parent) => {
                let parent_node = snapshot
                    .get(parent)
                    .unwrap_or_else(|| panic!("parent {parent} of {} is not live", node.id));
                let listed = parent_node.children.iter().filter(|c| **c == node.id).count();
                assert_eq!(listed, 1, "node {} listed {listed} times under {parent}", node.id);
            }
        }
        for child in &node.children {
            let child_node = snapshot
                .get(child)
                .unwrap_or_else(|| panic!("child {child} of {} is not live", node.id));
            assert_eq!(child_node.parent.as_deref(), Some(node.id.as_str()));
        }
        // Acyclicity: walking up from any node terminates at the root.
        let mut hops = 0usize;
        let mut cursor = node.parent.clone();
        while let Some(p) = cursor {
            hops += 1;
            assert!(hops <= snapshot.len(), "parent chain from {} cycles", node.id);
            cursor = snapshot.get(&p).and_then(|n| n.parent.clone());
        }
    }
}

struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        self.state
    }

    fn gen_range(&mut self, upper: usize) -> usize {
        if upper == 0 {
            return 0;
        }
        (self.next_u64() >> 32) as usize % upper
    }
}

#[test]
fn linkage_holds_after_randomized_operations() {
    for seed in 0..8u64 {
        let mut rng = Lcg::new(0x5eed_0000 + seed);
        let mut store = NodeStore::new();
        let mut known: Vec<String> = Vec::new();

        for step in 0..400 {
            match rng.gen_range(6) {
                // Create under a random known parent (sometimes a retired id,
                // which must degrade to root).
                0 | 1 => {
                    let parent = if known.is_empty() || rng.gen_range(4) == 0 {
                        None
                    } else {
                        Some(known[rng.gen_range(known.len())].clone())
                    };
                    let id = store.create_node(parent.as_deref(), "div", Attributes::new());
                    known.push(id);
                }
                // Create with an explicit, possibly colliding id.
                2 => {
                    let mut attrs = Attributes::new();
                    attrs.insert("id".into(), json!(format!("fixed-{}", rng.gen_range(10))));
                    let id = store.create_node(None, "p", attrs);
                    known.push(id);
                }
                // Rename to a fresh id.
                3 => {
                    if !known.is_empty() {
                        let target = known[rng.gen_range(known.len())].clone();
                        let mut attrs = Attributes::new();
                        attrs.insert("id".into(), json!(format!("renamed-{step}")));
                        if let Ok(new_id) = store.update_node(&target, attrs) {
                            known.push(new_id);
                        }
                    }
                }
                // Set text (discards children).
                4 => {
                    if !known.is_empty() {
                        let target = known[rng.gen_range(known.len())].clone();
                        let _ = store.set_text(&target, "t");
                    }
                }
                // Remove (redundant removals included).
                _ => {
                    if !known.is_empty() {
                        let target = known[rng.gen_range(known.len())].clone();
                        store.remove_node(&target);
                    }
                }
            }
            assert_linkage(&store);
        }
    }
}

#[test]
fn snapshot_matches_store_contents() {
    let mut store = NodeStore::new();
    let a = store.create_node(None, "section", Attributes::new());
    let b = store.create_node(Some(&a), "p", Attributes::new());
    store.set_text(&b, "hi").unwrap();
    let snapshot = store.inspect();
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot.get(&b).unwrap().text, "hi");
    assert_eq!(snapshot.get(&b).unwrap().depth, 1);
    let rendered = snapshot.to_string();
    assert!(rendered.contains(&format!("section#{a}")));
    assert!(rendered.contains("\"hi\""));
}
