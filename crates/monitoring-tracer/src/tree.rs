//! Arena-backed action tree.
//!
//! Nodes live in a flat `Vec` and refer to each other by [`ActionId`]. Parent
//! links are plain handles, so the parent/children cycle never becomes an
//! ownership cycle and clearing the arena cannot leave dangling references.

use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::types::{Action, Call, Event, Revert};

/// Handle to a node of an [`ActionTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActionId(usize);

impl ActionId {
    /// The root is always the first node allocated.
    pub const ROOT: ActionId = ActionId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

/// A node: common header plus variant payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionNode {
    parent: Option<ActionId>,
    children: Vec<ActionId>,
    depth: usize,
    action: Action,
}

impl ActionNode {
    pub fn parent(&self) -> Option<ActionId> {
        self.parent
    }

    /// Children in execution order.
    pub fn children(&self) -> &[ActionId] {
        &self.children
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn action(&self) -> &Action {
        &self.action
    }
}

/// Trace of a single transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionTree {
    nodes: Vec<ActionNode>,
}

impl ActionTree {
    /// Drop every node and install a new root, keeping the allocation.
    pub(crate) fn reset_root(&mut self, root: Call) {
        self.nodes.clear();
        self.nodes.push(ActionNode {
            parent: None,
            children: Vec::new(),
            depth: 0,
            action: Action::Call(root),
        });
    }

    /// Append `action` as the last child of `parent`.
    ///
    /// Returns `None` if `parent` is not a node of this tree.
    pub(crate) fn push_child(&mut self, parent: ActionId, action: Action) -> Option<ActionId> {
        let depth = self.nodes.get(parent.0)?.depth.checked_add(1)?;
        let id = ActionId(self.nodes.len());
        self.nodes.push(ActionNode {
            parent: Some(parent),
            children: Vec::new(),
            depth,
            action,
        });
        self.nodes.get_mut(parent.0)?.children.push(id);
        Some(id)
    }

    pub(crate) fn call_mut(&mut self, id: ActionId) -> Option<&mut Call> {
        match &mut self.nodes.get_mut(id.0)?.action {
            Action::Call(call) => Some(call),
            _ => None,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
    }

    pub fn root(&self) -> Option<&ActionNode> {
        self.nodes.first()
    }

    /// The root frame (`initial_call`).
    pub fn root_call(&self) -> Option<&Call> {
        self.root().and_then(|node| node.action.as_call())
    }

    pub fn get(&self, id: ActionId) -> Option<&ActionNode> {
        self.nodes.get(id.0)
    }

    pub fn action(&self, id: ActionId) -> Option<&Action> {
        self.get(id).map(ActionNode::action)
    }

    pub fn parent(&self, id: ActionId) -> Option<ActionId> {
        self.get(id)?.parent
    }

    pub fn children(&self, id: ActionId) -> &[ActionId] {
        self.get(id).map(ActionNode::children).unwrap_or_default()
    }

    pub fn first_child(&self, id: ActionId) -> Option<ActionId> {
        self.children(id).first().copied()
    }

    pub fn depth(&self, id: ActionId) -> Option<usize> {
        self.get(id).map(ActionNode::depth)
    }

    /// Parent links from `id` up to and including the root.
    pub fn ancestors(&self, id: ActionId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent(id),
        }
    }

    /// All nodes in pre-order, which is execution order.
    pub fn iter(&self) -> PreOrder<'_> {
        let stack = if self.nodes.is_empty() {
            Vec::new()
        } else {
            vec![ActionId::ROOT]
        };
        PreOrder { tree: self, stack }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn calls(&self) -> impl Iterator<Item = (ActionId, &Call)> + '_ {
        self.iter()
            .filter_map(|(id, node)| node.action.as_call().map(|call| (id, call)))
    }

    pub fn events(&self) -> impl Iterator<Item = (ActionId, &Event)> + '_ {
        self.iter()
            .filter_map(|(id, node)| node.action.as_event().map(|event| (id, event)))
    }

    pub fn reverts(&self) -> impl Iterator<Item = (ActionId, &Revert)> + '_ {
        self.iter()
            .filter_map(|(id, node)| node.action.as_revert().map(|revert| (id, revert)))
    }
}

pub struct Ancestors<'a> {
    tree: &'a ActionTree,
    next: Option<ActionId>,
}

impl Iterator for Ancestors<'_> {
    type Item = ActionId;

    fn next(&mut self) -> Option<ActionId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

pub struct PreOrder<'a> {
    tree: &'a ActionTree,
    stack: Vec<ActionId>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = (ActionId, &'a ActionNode);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let node = self.tree.get(id)?;
        self.stack.extend(node.children.iter().rev());
        Some((id, node))
    }
}

impl Serialize for ActionTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.root() {
            Some(_) => NodeView {
                tree: self,
                id: ActionId::ROOT,
            }
            .serialize(serializer),
            None => serializer.serialize_none(),
        }
    }
}

/// Nested record view of one node and its subtree.
struct NodeView<'a> {
    tree: &'a ActionTree,
    id: ActionId,
}

struct ChildrenView<'a> {
    tree: &'a ActionTree,
    children: &'a [ActionId],
}

impl Serialize for ChildrenView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.children.iter().map(|id| NodeView {
            tree: self.tree,
            id: *id,
        }))
    }
}

impl Serialize for NodeView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let Some(node) = self.tree.get(self.id) else {
            return serializer.serialize_none();
        };
        let children = ChildrenView {
            tree: self.tree,
            children: &node.children,
        };
        match &node.action {
            Action::Call(call) => {
                let mut s = serializer.serialize_struct("Call", 13)?;
                s.serialize_field("type", "call")?;
                s.serialize_field("kind", &call.kind)?;
                s.serialize_field("depth", &node.depth)?;
                s.serialize_field("from", &call.from)?;
                s.serialize_field("to", &call.to)?;
                s.serialize_field("context", &call.context)?;
                s.serialize_field("code", &call.code)?;
                s.serialize_field("forwarded_context", &call.forwarded_context)?;
                s.serialize_field("forwarded_code", &call.forwarded_code)?;
                s.serialize_field("value", &call.value_hex)?;
                s.serialize_field("input", &call.input_hex)?;
                s.serialize_field("output", &call.output_hex)?;
                s.serialize_field("children", &children)?;
                s.end()
            }
            Action::Event(event) => {
                let mut s = serializer.serialize_struct("Event", 9)?;
                s.serialize_field("type", "event")?;
                s.serialize_field("kind", &event.kind)?;
                s.serialize_field("depth", &node.depth)?;
                s.serialize_field("from", &event.from)?;
                s.serialize_field("context", &event.context)?;
                s.serialize_field("code", &event.code)?;
                s.serialize_field("data", &event.data_hex)?;
                s.serialize_field("topics", &event.topics)?;
                s.serialize_field("children", &children)?;
                s.end()
            }
            Action::Revert(revert) => {
                let mut s = serializer.serialize_struct("Revert", 8)?;
                s.serialize_field("type", "revert")?;
                s.serialize_field("kind", &revert.kind)?;
                s.serialize_field("depth", &node.depth)?;
                s.serialize_field("from", &revert.from)?;
                s.serialize_field("context", &revert.context)?;
                s.serialize_field("code", &revert.code)?;
                s.serialize_field("data", &revert.data_hex)?;
                s.serialize_field("children", &children)?;
                s.end()
            }
        }
    }
}
