//! Security resolution
//!
//! For an assumption, the applicable attacks are the union of:
//! 1. its own attacks,
//! 2. every attack on its parent (an attack on the general problem breaks
//!    each specialization),
//! 3. every attack on an assumption it reduces to,
//! 4. every attack on the same-named variant of an assumption its parent
//!    reduces to.
//!
//! Quantum dependence accumulates along reductions: an attack reached
//! through a quantum-only reduction is itself quantum-only. Cycles in
//! `reduces_to` are cut by a per-path visiting set.
//!
//! A scheme is as weak as its weakest required assumption.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::node::{AssumptionId, Attack, Node, SchemeId};
use crate::{ComplexityClass, Error, KnowledgeBase, Result};

/// An attack as seen from the queried node
///
/// Pairs a borrowed attack with its effective quantum flag: the attack's own
/// flag OR-ed with the override of every reduction it was reached through.
/// Two views are the same candidate iff they borrow the same attack node and
/// carry the same effective flag.
#[derive(Clone, Copy)]
pub struct AttackView<'a> {
    node: &'a Node<Attack>,
    quantum: bool,
}

impl<'a> AttackView<'a> {
    /// View an attack directly, with its own quantum flag
    pub fn new(node: &'a Node<Attack>) -> Self {
        Self {
            node,
            quantum: node.body.quantum,
        }
    }

    /// The view after crossing a reduction with the given override
    pub fn through(self, quantum_override: bool) -> Self {
        Self {
            node: self.node,
            quantum: self.quantum || quantum_override,
        }
    }

    pub fn node(&self) -> &'a Node<Attack> {
        self.node
    }

    pub fn id(&self) -> &'a str {
        self.node.id()
    }

    pub fn longid(&self) -> &'a str {
        self.node.longid()
    }

    pub fn complexity(&self) -> ComplexityClass {
        self.node.body.complexity
    }

    /// Effective quantum requirement
    pub fn quantum(&self) -> bool {
        self.quantum
    }

    /// Whether this candidate is usable under the given threat model
    pub fn applies(&self, quantum: bool) -> bool {
        !self.quantum || quantum
    }
}

impl PartialEq for AttackView<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.node, other.node) && self.quantum == other.quantum
    }
}

impl Eq for AttackView<'_> {}

impl Hash for AttackView<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(self.node, state);
        self.quantum.hash(state);
    }
}

impl fmt::Debug for AttackView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttackView")
            .field("attack", &self.node.longid())
            .field("complexity", &self.node.body.complexity.to_string())
            .field("quantum", &self.quantum)
            .finish()
    }
}

/// Cheapest candidate; the first one wins among equals
pub fn minimum<'a>(candidates: impl IntoIterator<Item = AttackView<'a>>) -> Option<AttackView<'a>> {
    candidates.into_iter().fold(None, |best, candidate| match best {
        Some(b) if b.complexity() <= candidate.complexity() => Some(b),
        _ => Some(candidate),
    })
}

/// Assumptions on the current resolution path
///
/// Scoped to one top-level query; a node is removed again when the branch
/// that entered it returns.
#[derive(Debug, Default)]
pub struct Visiting(HashSet<AssumptionId>);

impl Visiting {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if `node` is already on the path
    fn enter(&mut self, node: AssumptionId) -> bool {
        self.0.insert(node)
    }

    fn leave(&mut self, node: AssumptionId) {
        self.0.remove(&node);
    }

    pub fn contains(&self, node: AssumptionId) -> bool {
        self.0.contains(&node)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Insertion-ordered candidate set
#[derive(Default)]
struct Candidates<'a> {
    seen: HashSet<AttackView<'a>>,
    ordered: Vec<AttackView<'a>>,
}

impl<'a> Candidates<'a> {
    fn insert(&mut self, view: AttackView<'a>) {
        if self.seen.insert(view) {
            self.ordered.push(view);
        }
    }

    fn extend(&mut self, views: impl IntoIterator<Item = AttackView<'a>>) {
        for view in views {
            self.insert(view);
        }
    }
}

/// Read-only query engine over a linked [`KnowledgeBase`]
///
/// Top-level attack sets are memoized per `(assumption, quantum)`. Nested
/// results depend on the path they were computed on and are never cached.
pub struct Resolver<'kb> {
    kb: &'kb KnowledgeBase,
    cache: RefCell<HashMap<(AssumptionId, bool), Vec<AttackView<'kb>>>>,
}

impl<'kb> Resolver<'kb> {
    pub fn new(kb: &'kb KnowledgeBase) -> Self {
        Self {
            kb,
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn knowledge_base(&self) -> &'kb KnowledgeBase {
        self.kb
    }

    /// Every attack applicable to `node` under the threat model, in rule order
    pub fn attacks(&self, node: AssumptionId, quantum: bool) -> Vec<AttackView<'kb>> {
        if let Some(hit) = self.cache.borrow().get(&(node, quantum)) {
            return hit.clone();
        }
        let found = self.attacks_with(node, quantum, &mut Visiting::new());
        self.cache.borrow_mut().insert((node, quantum), found.clone());
        found
    }

    /// [`Resolver::attacks`] with an explicit visiting set
    ///
    /// Returns nothing if `node` is already in `visiting`.
    pub fn attacks_with(
        &self,
        node: AssumptionId,
        quantum: bool,
        visiting: &mut Visiting,
    ) -> Vec<AttackView<'kb>> {
        let assumptions = self.kb.assumptions();
        let current = &assumptions[node];

        if !visiting.enter(node) {
            tracing::trace!(assumption = current.longid(), "Cycle guard hit");
            return Vec::new();
        }

        let mut found = Candidates::default();
        let admit = |found: &mut Candidates<'kb>, views: Vec<AttackView<'kb>>, via: bool| {
            found.extend(views.into_iter().map(|v| v.through(via)).filter(|v| v.applies(quantum)));
        };

        let own = current
            .body
            .attacks
            .iter()
            .map(|&id| AttackView::new(&self.kb.attacks()[id]))
            .collect();
        admit(&mut found, own, false);

        if let Some(parent) = current.parent() {
            admit(&mut found, self.attacks_with(parent, quantum, visiting), false);
        }

        for edge in &current.body.reduces_to {
            if edge.quantum && !quantum {
                continue;
            }
            admit(&mut found, self.attacks_with(edge.target, quantum, visiting), edge.quantum);
        }

        if let Some(parent) = current.parent() {
            for edge in &assumptions[parent].body.reduces_to {
                if edge.quantum && !quantum {
                    continue;
                }
                if let Some(sibling) = assumptions[edge.target].variant(current.id()) {
                    admit(&mut found, self.attacks_with(sibling, quantum, visiting), edge.quantum);
                }
            }
        }

        visiting.leave(node);
        found.ordered
    }

    /// Cheapest applicable attack on `node`
    pub fn best_attack(&self, node: AssumptionId, quantum: bool) -> Result<AttackView<'kb>> {
        minimum(self.attacks(node, quantum)).ok_or_else(|| Error::NoKnownAttack {
            node: self.kb.assumptions()[node].longid().to_string(),
            quantum,
        })
    }

    pub fn security(&self, node: AssumptionId, quantum: bool) -> Result<ComplexityClass> {
        Ok(self.best_attack(node, quantum)?.complexity())
    }

    /// Best attack on each required assumption, in declaration order
    ///
    /// Fails on the first assumption without a known attack. A scheme
    /// variant uses its own assumption list only.
    pub fn scheme_candidates(&self, scheme: SchemeId, quantum: bool) -> Result<Vec<AttackView<'kb>>> {
        self.kb.schemes()[scheme]
            .body
            .assumptions
            .iter()
            .map(|&assumption| self.best_attack(assumption, quantum))
            .collect()
    }

    /// Cheapest attack across the scheme's required assumptions
    ///
    /// A scheme without any required assumption has no known attack.
    pub fn scheme_best_attack(&self, scheme: SchemeId, quantum: bool) -> Result<AttackView<'kb>> {
        minimum(self.scheme_candidates(scheme, quantum)?).ok_or_else(|| Error::NoKnownAttack {
            node: self.kb.schemes()[scheme].longid().to_string(),
            quantum,
        })
    }

    pub fn scheme_security(&self, scheme: SchemeId, quantum: bool) -> Result<ComplexityClass> {
        Ok(self.scheme_best_attack(scheme, quantum)?.complexity())
    }
}
