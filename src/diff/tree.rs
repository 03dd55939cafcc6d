//! Diff tree over two object graphs
//!
//! Nodes live in an arena owned by `DiffTree` and refer to their parent by
//! index, so walking up the ancestor chain needs no back-pointers. The tree
//! is built once per invocation and only read afterwards.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::expr::path::{resolve_segments, PathSegment};

/// Change state of one field between the two graphs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeState {
    Unchanged,
    Added,
    Changed,
    Removed,
}

/// Display metadata attached to a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMeta {
    /// Human-readable field name
    pub name: String,

    /// Value function applied to the field's values, empty for none
    #[serde(default)]
    pub function: String,
}

impl FieldMeta {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            function: String::new(),
        }
    }

    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = function.into();
        self
    }
}

/// Index of a node inside its tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct NodeData {
    parent: Option<NodeId>,
    path: Vec<PathSegment>,
    state: ChangeState,
    meta: Option<FieldMeta>,
    nested: bool,
    children: Vec<NodeId>,
}

/// Arena-backed diff tree
#[derive(Debug, Clone)]
pub struct DiffTree {
    nodes: Vec<NodeData>,
}

impl Default for DiffTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DiffTree {
    /// Create a tree holding only an unchanged root
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData {
                parent: None,
                path: Vec::new(),
                state: ChangeState::Unchanged,
                meta: None,
                nested: true,
                children: Vec::new(),
            }],
        }
    }

    pub fn root_id(&self) -> NodeId {
        NodeId(0)
    }

    /// Append a child below `parent`
    ///
    /// `nested` marks a node standing for a nested object: it is descended
    /// into but never rendered itself.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        segment: PathSegment,
        state: ChangeState,
        meta: Option<FieldMeta>,
        nested: bool,
    ) -> NodeId {
        let mut path = self.nodes[parent.0].path.clone();
        path.push(segment);

        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            parent: Some(parent),
            path,
            state,
            meta,
            nested,
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn set_state(&mut self, id: NodeId, state: ChangeState) {
        self.nodes[id.0].state = state;
    }

    pub fn node(&self, id: NodeId) -> DiffNode<'_> {
        DiffNode { tree: self, id }
    }

    pub fn root(&self) -> DiffNode<'_> {
        self.node(self.root_id())
    }

    /// Whether any node differs between the two graphs
    pub fn has_changes(&self) -> bool {
        self.nodes
            .iter()
            .any(|node| node.state != ChangeState::Unchanged)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Depth-first, pre-order walk starting at the root
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            tree: self,
            stack: vec![self.root_id()],
        }
    }
}

/// Borrowed view of one node
#[derive(Debug, Clone, Copy)]
pub struct DiffNode<'t> {
    tree: &'t DiffTree,
    id: NodeId,
}

impl<'t> DiffNode<'t> {
    fn data(&self) -> &'t NodeData {
        &self.tree.nodes[self.id.0]
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn is_root(&self) -> bool {
        self.data().parent.is_none()
    }

    pub fn state(&self) -> ChangeState {
        self.data().state
    }

    pub fn meta(&self) -> Option<&'t FieldMeta> {
        self.data().meta.as_ref()
    }

    /// Whether this node stands for a nested object
    pub fn is_nested(&self) -> bool {
        self.data().nested
    }

    /// Identity path from the graph root to this field
    pub fn path(&self) -> &'t [PathSegment] {
        &self.data().path
    }

    pub fn parent(&self) -> Option<DiffNode<'t>> {
        self.data().parent.map(|id| self.tree.node(id))
    }

    /// Ancestors from the nearest parent up to the root
    pub fn ancestors(&self) -> impl Iterator<Item = DiffNode<'t>> {
        std::iter::successors(self.parent(), |node| node.parent())
    }

    pub fn children(&self) -> impl Iterator<Item = DiffNode<'t>> + 't {
        let tree = self.tree;
        self.data().children.iter().map(move |id| tree.node(*id))
    }

    /// Read this field's value out of one of the two graphs
    pub fn value_in<'v>(&self, graph: &'v Value) -> Option<&'v Value> {
        resolve_segments(graph, self.path()).filter(|value| !value.is_null())
    }
}

/// Iterator returned by [`DiffTree::walk`]
pub struct Walk<'t> {
    tree: &'t DiffTree,
    stack: Vec<NodeId>,
}

impl<'t> Iterator for Walk<'t> {
    type Item = DiffNode<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let children = &self.tree.nodes[id.0].children;
        self.stack.extend(children.iter().rev().copied());
        Some(self.tree.node(id))
    }
}
