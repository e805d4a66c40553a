use crate::error::StoreError;
use crate::node::{Attributes, DEFAULT_LABEL, Node};
use crate::snapshot::TreeSnapshot;
use std::collections::HashMap;
use ulid::Generator;

/// Authoritative tree state for one rendering session.
///
/// All operations are synchronous and bounded; nothing here suspends. The
/// store is single-consumer by contract and must not be shared across
/// sessions without external synchronization.
///
/// Fallible paths degrade where the producer (a one-way instruction stream)
/// cannot be asked to retry: an unknown parent falls back to the root, an
/// empty label falls back to [`DEFAULT_LABEL`], and a redundant removal is a
/// no-op. Only mutations addressing a named target that must already exist
/// (`update_node`, `set_text`, `append_text`) report `NotFound`.
pub struct NodeStore {
    nodes: HashMap<String, Node>,
    /// Ordered ids of top-level nodes (children of the implicit root).
    roots: Vec<String>,
    /// Id generator scoped to this store instance, so independent sessions
    /// never interfere.
    ids: Generator,
}

impl NodeStore {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            roots: Vec::new(),
            ids: Generator::new(),
        }
    }

    /// Create a node under `parent_id` and return its final id.
    ///
    /// An absent or unknown parent degrades to the root. An explicit
    /// `attributes.id` is honored verbatim; if that id is already live, the
    /// old occupant's subtree is retired first. Without an explicit id, a
    /// fresh ulid is assigned (monotonic timestamp + entropy; collisions
    /// against live ids are effectively impossible and not retried).
    pub fn create_node(
        &mut self,
        parent_id: Option<&str>,
        label: &str,
        attributes: Attributes,
    ) -> String {
        let label = if label.trim().is_empty() {
            log::debug!(target: "store", "empty label degraded to {DEFAULT_LABEL:?}");
            DEFAULT_LABEL
        } else {
            label
        };

        let id = match attributes.get("id").and_then(|v| v.as_str()) {
            Some(explicit) if !explicit.is_empty() => {
                if self.nodes.contains_key(explicit) {
                    // Id reuse is destructive-then-constructive.
                    log::debug!(target: "store", "id {explicit:?} reused; retiring old subtree");
                    self.remove_node(explicit);
                }
                explicit.to_string()
            }
            _ => self.generate_id(),
        };

        let parent = match parent_id {
            Some(p) if self.nodes.contains_key(p) => Some(p.to_string()),
            Some(p) => {
                log::debug!(target: "store", "unknown parent {p:?}; attaching {id:?} to root");
                None
            }
            None => None,
        };

        let node = Node::new(label.to_string(), attributes, parent.clone());
        debug_assert!(!self.nodes.contains_key(&id));
        self.nodes.insert(id.clone(), node);
        match parent {
            Some(p) => {
                // Liveness was checked after any id-reuse retirement, so the
                // parent is still present here.
                if let Some(parent_node) = self.nodes.get_mut(&p) {
                    parent_node.children.push(id.clone());
                }
            }
            None => self.roots.push(id.clone()),
        }
        log::trace!(target: "store", "created node {id:?} label {label:?}");
        id
    }

    /// Shallow-merge `attributes` into the node's attribute map; supplied
    /// keys overwrite, absent keys persist. Returns the node's final id.
    ///
    /// If the merge changes `attributes.id`, the node is re-keyed under the
    /// new id: the arena entry, the parent's child-list entry (in place) and
    /// the children's parent references all move together, and the old id
    /// stops resolving immediately.
    pub fn update_node(
        &mut self,
        id: &str,
        attributes: Attributes,
    ) -> Result<String, StoreError> {
        let node = self.nodes.get_mut(id).ok_or_else(|| StoreError::NotFound {
            id: id.to_string(),
        })?;
        for (key, value) in attributes {
            node.attributes.insert(key, value);
        }

        let new_id = match node.attributes.get("id").and_then(|v| v.as_str()) {
            Some(n) if !n.is_empty() && n != id => n.to_string(),
            _ => return Ok(id.to_string()),
        };

        // Rename: the new id must be unique among live nodes, so any current
        // occupant is retired first (same rule as creation-time reuse). If
        // the occupant was an ancestor of the renamed node, that retirement
        // already removed the node itself.
        if self.nodes.contains_key(&new_id) {
            log::debug!(target: "store", "rename target {new_id:?} occupied; retiring old subtree");
            self.remove_node(&new_id);
        }
        let Some(node) = self.nodes.remove(id) else {
            return Err(StoreError::NotFound { id: id.to_string() });
        };

        let children = node.children.clone();
        let parent = node.parent.clone();
        self.nodes.insert(new_id.clone(), node);

        // Re-key the sibling-list entry in place so ordering is preserved.
        match parent {
            Some(p) => {
                if let Some(parent_node) = self.nodes.get_mut(&p)
                    && let Some(entry) = parent_node.children.iter_mut().find(|c| c.as_str() == id)
                {
                    *entry = new_id.clone();
                }
            }
            None => {
                if let Some(entry) = self.roots.iter_mut().find(|c| c.as_str() == id) {
                    *entry = new_id.clone();
                }
            }
        }
        for child in children {
            if let Some(child_node) = self.nodes.get_mut(&child) {
                child_node.parent = Some(new_id.clone());
            }
        }
        log::trace!(target: "store", "renamed node {id:?} -> {new_id:?}");
        Ok(new_id)
    }

    /// Replace the node's text payload, discarding any element children
    /// (text and element children are mutually exclusive under a node).
    pub fn set_text(&mut self, id: &str, text: &str) -> Result<(), StoreError> {
        let node = self.nodes.get_mut(id).ok_or_else(|| StoreError::NotFound {
            id: id.to_string(),
        })?;
        let children = std::mem::take(&mut node.children);
        node.text = text.to_string();
        for child in children {
            self.remove_subtree(&child);
        }
        Ok(())
    }

    /// Concatenate onto the node's text payload.
    pub fn append_text(&mut self, id: &str, text: &str) -> Result<(), StoreError> {
        let node = self.nodes.get_mut(id).ok_or_else(|| StoreError::NotFound {
            id: id.to_string(),
        })?;
        node.text.push_str(text);
        Ok(())
    }

    /// Remove a node and its entire subtree. Redundant removal of an absent
    /// id is a no-op, not an error; returns whether anything was removed.
    pub fn remove_node(&mut self, id: &str) -> bool {
        let Some(node) = self.nodes.get(id) else {
            log::trace!(target: "store", "redundant removal of {id:?} ignored");
            return false;
        };
        match node.parent.clone() {
            Some(p) => {
                if let Some(parent_node) = self.nodes.get_mut(&p) {
                    parent_node.children.retain(|c| c != id);
                }
            }
            None => self.roots.retain(|c| c != id),
        }
        self.remove_subtree(id);
        true
    }

    /// Remove every node reachable from `id`, children before parents. The
    /// subtree is assumed already detached from its parent's child list.
    fn remove_subtree(&mut self, id: &str) {
        // Iterative postorder; recursion would overflow on deep trees.
        let mut stack: Vec<(String, bool)> = vec![(id.to_string(), false)];
        while let Some((current, visited)) = stack.pop() {
            if visited {
                self.nodes.remove(&current);
                continue;
            }
            let children = self
                .nodes
                .get(&current)
                .map(|n| n.children.clone())
                .unwrap_or_default();
            stack.push((current, true));
            for child in children.into_iter().rev() {
                stack.push((child, false));
            }
        }
    }

    /// Drop every node, resetting to an empty root.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.roots.clear();
    }

    /// Read-only projection of the whole tree for diagnostics. Must not be
    /// used to drive mutation.
    pub fn inspect(&self) -> TreeSnapshot {
        TreeSnapshot::capture(self)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Ordered ids of top-level nodes.
    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn generate_id(&mut self) -> String {
        let ulid = self.ids.generate().unwrap_or_else(|_| ulid::Ulid::new());
        ulid.to_string()
    }
}

impl Default for NodeStore {
    fn default() -> Self {
        Self::new()
    }
}
