//! Read-only tree projection for diagnostics and tests.

use crate::node::Attributes;
use crate::store::NodeStore;
use serde::Serialize;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SnapshotNode {
    pub id: String,
    pub label: String,
    pub parent: Option<String>,
    pub children: Vec<String>,
    pub text: String,
    pub attributes: Attributes,
    pub depth: usize,
}

/// Preorder projection of the whole tree. Child order is authoritative; map
/// iteration order is never consulted.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TreeSnapshot {
    pub nodes: Vec<SnapshotNode>,
}

impl TreeSnapshot {
    pub(crate) fn capture(store: &NodeStore) -> Self {
        let mut nodes = Vec::with_capacity(store.len());
        let mut stack: Vec<(String, usize)> = store
            .roots()
            .iter()
            .rev()
            .map(|id| (id.clone(), 0))
            .collect();
        while let Some((id, depth)) = stack.pop() {
            let Some(node) = store.node(&id) else {
                debug_assert!(false, "child list references retired id {id:?}");
                continue;
            };
            for child in node.children().iter().rev() {
                stack.push((child.clone(), depth + 1));
            }
            nodes.push(SnapshotNode {
                id,
                label: node.label().to_string(),
                parent: node.parent().map(str::to_string),
                children: node.children().to_vec(),
                text: node.text().to_string(),
                attributes: node.attributes().clone(),
                depth,
            });
        }
        Self { nodes }
    }

    pub fn get(&self, id: &str) -> Option<&SnapshotNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl fmt::Display for TreeSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, node) in self.nodes.iter().enumerate() {
            if i != 0 {
                f.write_str("\n")?;
            }
            write!(f, "{:indent$}{}#{}", "", node.label, node.id, indent = node.depth * 2)?;
            if !node.text.is_empty() {
                write!(f, " {:?}", node.text)?;
            }
        }
        Ok(())
    }
}
