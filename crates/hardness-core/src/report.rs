//! Read-only report of every node and its resolved security
//!
//! This is what presentation layers consume: names, raw comments and
//! references, and per threat model the best attack with its complexity.
//! No markup is produced here.

use serde::Serialize;

use crate::config::UnknownPolicy;
use crate::node::{Attack, AttackId, AssumptionId, Name, Node, NodeData, SchemeId};
use crate::records::OrderedMap;
use crate::resolver::{minimum, AttackView, Resolver};
use crate::{Classification, ComplexityClass, Error, KnowledgeBase, Result};

/// Id of the sentinel reported under [`UnknownPolicy::Unbounded`]
pub const TRIVIAL_ATTACK_ID: &str = "trivial";

/// Security level as reported: a classification, or `unbounded` for the sentinel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Poly,
    Subexp,
    Exp,
    Unbounded,
}

impl Level {
    pub fn of(complexity: &ComplexityClass) -> Self {
        if complexity.is_unbounded() {
            return Level::Unbounded;
        }
        match complexity.classify() {
            Classification::Poly => Level::Poly,
            Classification::Subexp => Level::Subexp,
            Classification::Exp => Level::Exp,
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Level::Poly => write!(f, "poly"),
            Level::Subexp => write!(f, "subexp"),
            Level::Exp => write!(f, "exp"),
            Level::Unbounded => write!(f, "unbounded"),
        }
    }
}

/// Fields every node reports
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub longid: String,
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub references: OrderedMap<String>,
}

impl Summary {
    fn of<T>(node: &Node<T>) -> Self {
        Self {
            longid: node.longid().to_string(),
            id: node.id().to_string(),
            name: node.display_name().to_string(),
            tooltip: node.name.tooltip().map(str::to_string),
            comment: node.comment.clone(),
            references: OrderedMap(node.references.clone()),
        }
    }
}

/// Best attack under one threat model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecurityReport {
    pub level: Level,
    pub complexity: String,
    /// Exponent `a`, absent for the sentinel
    pub exponent: Option<String>,
    /// Constant `c`, absent when unknown
    pub constant: Option<String>,
    /// Longid of the best attack
    pub attack: String,
    pub attack_name: String,
    /// Effective quantum requirement of the best attack
    pub quantum: bool,
}

impl SecurityReport {
    fn of(view: AttackView<'_>) -> Self {
        let complexity = view.complexity();
        Self {
            level: Level::of(&complexity),
            complexity: complexity.to_string(),
            exponent: complexity.exponent().finite().map(|a| a.to_string()),
            constant: complexity.constant().finite().map(|c| c.to_string()),
            attack: view.longid().to_string(),
            attack_name: view.node().display_name().to_string(),
            quantum: view.quantum(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttackEntry {
    #[serde(flatten)]
    pub summary: Summary,
    pub complexity: String,
    pub level: Level,
    pub quantum: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<AttackEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssumptionEntry {
    #[serde(flatten)]
    pub summary: Summary,
    pub classical: SecurityReport,
    pub quantum: SecurityReport,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<AssumptionEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemeEntry {
    #[serde(flatten)]
    pub summary: Summary,
    pub types: Vec<String>,
    pub classical: SecurityReport,
    pub quantum: SecurityReport,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<SchemeEntry>,
}

/// Snapshot of the whole knowledge base, in declaration order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub schemes: Vec<SchemeEntry>,
    pub assumptions: Vec<AssumptionEntry>,
    pub attacks: Vec<AttackEntry>,
}

impl Report {
    /// Resolve every node under both threat models
    ///
    /// With [`UnknownPolicy::Fail`] the first node without a reachable
    /// attack aborts the report.
    pub fn build(kb: &KnowledgeBase, policy: UnknownPolicy) -> Result<Self> {
        let reporter = Reporter::new(kb, policy);
        let report = Self {
            schemes: kb
                .schemes()
                .top_level()
                .iter()
                .map(|&id| reporter.scheme(id))
                .collect::<Result<_>>()?,
            assumptions: kb
                .assumptions()
                .top_level()
                .iter()
                .map(|&id| reporter.assumption(id))
                .collect::<Result<_>>()?,
            attacks: kb.attacks().top_level().iter().map(|&id| reporter.attack(id)).collect(),
        };
        tracing::info!(
            schemes = report.schemes.len(),
            assumptions = report.assumptions.len(),
            attacks = report.attacks.len(),
            policy = %policy,
            "Report built"
        );
        Ok(report)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Find an assumption entry by longid, searching variants
    pub fn assumption(&self, longid: &str) -> Option<&AssumptionEntry> {
        find(&self.assumptions, longid, |e| &e.summary, |e| &e.variants)
    }

    /// Find a scheme entry by longid, searching variants
    pub fn scheme(&self, longid: &str) -> Option<&SchemeEntry> {
        find(&self.schemes, longid, |e| &e.summary, |e| &e.variants)
    }
}

fn find<'r, E>(
    entries: &'r [E],
    longid: &str,
    summary: fn(&E) -> &Summary,
    variants: fn(&E) -> &Vec<E>,
) -> Option<&'r E> {
    entries.iter().find_map(|entry| {
        if summary(entry).longid == longid {
            Some(entry)
        } else {
            find(variants(entry), longid, summary, variants)
        }
    })
}

/// The sentinel attack: no known attack, largest possible complexity
pub fn trivial_attack() -> Node<Attack> {
    Node::standalone(NodeData {
        id: TRIVIAL_ATTACK_ID.to_string(),
        name: Name::new(Some("Trivial"), Some("No known attack")),
        references: Vec::new(),
        comment: None,
        body: Attack {
            complexity: ComplexityClass::UNBOUNDED,
            quantum: false,
        },
    })
}

/// Resolver plus the unknown-attack policy
///
/// Under [`UnknownPolicy::Unbounded`] every assumption without a known
/// attack is answered by the [`trivial_attack`] sentinel, including each
/// required assumption of a scheme. Under [`UnknownPolicy::Fail`] the
/// first such assumption aborts with `NoKnownAttack`.
pub struct Reporter<'kb> {
    kb: &'kb KnowledgeBase,
    resolver: Resolver<'kb>,
    policy: UnknownPolicy,
    trivial: Node<Attack>,
}

impl<'kb> Reporter<'kb> {
    pub fn new(kb: &'kb KnowledgeBase, policy: UnknownPolicy) -> Self {
        Self {
            kb,
            resolver: kb.resolver(),
            policy,
            trivial: trivial_attack(),
        }
    }

    /// Best attack on an assumption, the sentinel standing in when allowed
    pub fn best_attack(&self, id: AssumptionId, quantum: bool) -> Result<AttackView<'_>> {
        match (self.resolver.best_attack(id, quantum), self.policy) {
            (Err(Error::NoKnownAttack { .. }), UnknownPolicy::Unbounded) => {
                Ok(AttackView::new(&self.trivial))
            }
            (resolved, _) => resolved,
        }
    }

    /// Best attack across a scheme's required assumptions
    pub fn scheme_best_attack(&self, id: SchemeId, quantum: bool) -> Result<AttackView<'_>> {
        let candidates = self.kb.schemes()[id]
            .body
            .assumptions
            .iter()
            .map(|&assumption| self.best_attack(assumption, quantum))
            .collect::<Result<Vec<_>>>()?;
        match (minimum(candidates), self.policy) {
            (Some(best), _) => Ok(best),
            (None, UnknownPolicy::Unbounded) => Ok(AttackView::new(&self.trivial)),
            (None, UnknownPolicy::Fail) => Err(Error::NoKnownAttack {
                node: self.kb.schemes()[id].longid().to_string(),
                quantum,
            }),
        }
    }

    pub fn assumption_security(&self, id: AssumptionId, quantum: bool) -> Result<SecurityReport> {
        Ok(SecurityReport::of(self.best_attack(id, quantum)?))
    }

    pub fn scheme_security(&self, id: SchemeId, quantum: bool) -> Result<SecurityReport> {
        Ok(SecurityReport::of(self.scheme_best_attack(id, quantum)?))
    }

    fn attack(&self, id: AttackId) -> AttackEntry {
        let node = &self.kb.attacks()[id];
        AttackEntry {
            summary: Summary::of(node),
            complexity: node.body.complexity.to_string(),
            level: Level::of(&node.body.complexity),
            quantum: node.body.quantum,
            variants: node.variants().map(|(_, v)| self.attack(v)).collect(),
        }
    }

    fn assumption(&self, id: AssumptionId) -> Result<AssumptionEntry> {
        let node = &self.kb.assumptions()[id];
        Ok(AssumptionEntry {
            summary: Summary::of(node),
            classical: self.assumption_security(id, false)?,
            quantum: self.assumption_security(id, true)?,
            variants: node
                .variants()
                .map(|(_, v)| self.assumption(v))
                .collect::<Result<_>>()?,
        })
    }

    fn scheme(&self, id: SchemeId) -> Result<SchemeEntry> {
        let node = &self.kb.schemes()[id];
        Ok(SchemeEntry {
            summary: Summary::of(node),
            types: node.body.types.clone(),
            classical: self.scheme_security(id, false)?,
            quantum: self.scheme_security(id, true)?,
            variants: node
                .variants()
                .map(|(_, v)| self.scheme(v))
                .collect::<Result<_>>()?,
        })
    }
}
