//! Node model: attacks, assumptions and schemes stored in per-kind arenas
//!
//! Every node owns its variants through an ordered id -> child map and keeps
//! a link back to its parent. Cross-table edges are typed [`NodeId`]s filled
//! in by the linker.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use crate::ComplexityClass;

/// Separator between ancestor ids in a `longid`
pub const LONGID_SEPARATOR: char = '.';

/// Entity kind, used in errors and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Attack,
    Assumption,
    Scheme,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Attack => write!(f, "attack"),
            NodeKind::Assumption => write!(f, "assumption"),
            NodeKind::Scheme => write!(f, "scheme"),
        }
    }
}

/// Index of a node inside its [`Table`]
pub struct NodeId<T> {
    index: usize,
    _kind: PhantomData<fn() -> T>,
}

impl<T> NodeId<T> {
    fn new(index: usize) -> Self {
        Self {
            index,
            _kind: PhantomData,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

impl<T> Clone for NodeId<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for NodeId<T> {}

impl<T> PartialEq for NodeId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for NodeId<T> {}

impl<T> Hash for NodeId<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<T> fmt::Debug for NodeId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.index)
    }
}

pub type AttackId = NodeId<Attack>;
pub type AssumptionId = NodeId<Assumption>;
pub type SchemeId = NodeId<Scheme>;

/// Display name: short and/or long form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Name {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long: Option<String>,
}

impl Name {
    pub fn new(short: Option<&str>, long: Option<&str>) -> Self {
        Self {
            short: short.map(str::to_string),
            long: long.map(str::to_string),
        }
    }

    /// Short form if present, else long form
    pub fn primary(&self) -> Option<&str> {
        self.short.as_deref().or(self.long.as_deref())
    }

    /// Long form, only when it is shadowed by a short primary
    pub fn tooltip(&self) -> Option<&str> {
        match (&self.short, &self.long) {
            (Some(_), Some(long)) => Some(long),
            _ => None,
        }
    }
}

/// Ordered slug -> URL references
pub type References = Vec<(String, String)>;

/// A direct attack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attack {
    pub complexity: ComplexityClass,
    /// Requires a quantum computer
    pub quantum: bool,
}

/// A `reduces_to` edge: breaking the source also breaks `target`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reduction {
    pub target: AssumptionId,
    /// The reduction itself only holds given quantum power
    pub quantum: bool,
}

/// A hardness assumption
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assumption {
    pub attacks: Vec<AttackId>,
    pub reduces_to: Vec<Reduction>,
}

/// A scheme, secure only while every assumption holds
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scheme {
    pub types: Vec<String>,
    pub assumptions: Vec<AssumptionId>,
}

/// Fields shared by every node kind, plus the kind-specific body
#[derive(Debug, Clone)]
pub struct Node<T> {
    id: String,
    longid: String,
    pub name: Name,
    pub references: References,
    pub comment: Option<String>,
    parent: Option<NodeId<T>>,
    variants: Vec<(String, NodeId<T>)>,
    pub body: T,
}

impl<T> Node<T> {
    /// A node outside any table, with no parent and no variants
    pub fn standalone(data: NodeData<T>) -> Self {
        Self {
            longid: data.id.clone(),
            id: data.id,
            name: data.name,
            references: data.references,
            comment: data.comment,
            parent: None,
            variants: Vec::new(),
            body: data.body,
        }
    }

    /// Id, unique among siblings
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Ancestor ids joined by [`LONGID_SEPARATOR`], stable external key
    pub fn longid(&self) -> &str {
        &self.longid
    }

    pub fn parent(&self) -> Option<NodeId<T>> {
        self.parent
    }

    /// Variants in declaration order
    pub fn variants(&self) -> impl Iterator<Item = (&str, NodeId<T>)> + '_ {
        self.variants.iter().map(|(id, node)| (id.as_str(), *node))
    }

    pub fn variant(&self, id: &str) -> Option<NodeId<T>> {
        self.variants
            .iter()
            .find(|(variant, _)| variant == id)
            .map(|(_, node)| *node)
    }

    pub fn has_variants(&self) -> bool {
        !self.variants.is_empty()
    }

    /// Primary name, falling back to the id
    pub fn display_name(&self) -> &str {
        self.name.primary().unwrap_or(&self.id)
    }
}

/// Node payload handed to [`Table::insert`]
#[derive(Debug, Clone)]
pub struct NodeData<T> {
    pub id: String,
    pub name: Name,
    pub references: References,
    pub comment: Option<String>,
    pub body: T,
}

/// Arena of one node kind
#[derive(Debug, Clone)]
pub struct Table<T> {
    kind: NodeKind,
    nodes: Vec<Node<T>>,
    top_level: Vec<NodeId<T>>,
    by_id: HashMap<String, NodeId<T>>,
    by_longid: HashMap<String, NodeId<T>>,
}

impl<T> Table<T> {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            nodes: Vec::new(),
            top_level: Vec::new(),
            by_id: HashMap::new(),
            by_longid: HashMap::new(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Insert a node, as a variant of `parent` when given
    ///
    /// Returns `None` if the id is already taken among its siblings.
    pub fn insert(&mut self, data: NodeData<T>, parent: Option<NodeId<T>>) -> Option<NodeId<T>> {
        let id = NodeId::new(self.nodes.len());
        let longid = match parent {
            Some(p) => {
                let parent = &mut self.nodes[p.index()];
                if parent.variant(&data.id).is_some() {
                    return None;
                }
                parent.variants.push((data.id.clone(), id));
                format!("{}{}{}", parent.longid, LONGID_SEPARATOR, data.id)
            }
            None => {
                if self.by_id.contains_key(&data.id) {
                    return None;
                }
                self.by_id.insert(data.id.clone(), id);
                self.top_level.push(id);
                data.id.clone()
            }
        };
        self.by_longid.insert(longid.clone(), id);
        self.nodes.push(Node {
            id: data.id,
            longid,
            name: data.name,
            references: data.references,
            comment: data.comment,
            parent,
            variants: Vec::new(),
            body: data.body,
        });
        Some(id)
    }

    pub fn get(&self, id: NodeId<T>) -> &Node<T> {
        &self.nodes[id.index()]
    }

    pub(crate) fn body_mut(&mut self, id: NodeId<T>) -> &mut T {
        &mut self.nodes[id.index()].body
    }

    /// Look up a top-level node
    pub fn lookup(&self, id: &str) -> Option<NodeId<T>> {
        self.by_id.get(id).copied()
    }

    /// Look up any node, variants included, by its longid
    pub fn lookup_longid(&self, longid: &str) -> Option<NodeId<T>> {
        self.by_longid.get(longid).copied()
    }

    /// Top-level nodes in declaration order
    pub fn top_level(&self) -> &[NodeId<T>] {
        &self.top_level
    }

    /// Every node, pre-order: each top-level node followed by its variants
    pub fn walk(&self) -> Vec<NodeId<T>> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId<T>> = self.top_level.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.get(id).variants.iter().rev().map(|(_, v)| *v));
        }
        out
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl<T> std::ops::Index<NodeId<T>> for Table<T> {
    type Output = Node<T>;

    fn index(&self, id: NodeId<T>) -> &Node<T> {
        self.get(id)
    }
}
