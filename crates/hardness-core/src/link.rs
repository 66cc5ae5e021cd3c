//! Linker: rewrites id-string edges into node references
//!
//! Runs once, after every node (variants included) has been constructed.
//! Edge targets resolve against the top-level index of the target table;
//! variants are reached through their parent, never by bare id.

use crate::node::{Assumption, AssumptionId, Attack, Reduction, Scheme, SchemeId, Table};
use crate::records::ReductionRecord;
use crate::{Error, Result};

/// Raw edges of one assumption node awaiting resolution
#[derive(Debug)]
pub(crate) struct PendingAssumption {
    pub node: AssumptionId,
    pub attacks: Vec<String>,
    pub reduces_to: Vec<ReductionRecord>,
}

/// Raw edges of one scheme node awaiting resolution
#[derive(Debug)]
pub(crate) struct PendingScheme {
    pub node: SchemeId,
    pub assumptions: Vec<String>,
}

/// Edges collected during construction
#[derive(Debug, Default)]
pub(crate) struct Linker {
    assumptions: Vec<PendingAssumption>,
    schemes: Vec<PendingScheme>,
}

impl Linker {
    pub fn defer_assumption(&mut self, pending: PendingAssumption) {
        self.assumptions.push(pending);
    }

    pub fn defer_scheme(&mut self, pending: PendingScheme) {
        self.schemes.push(pending);
    }

    /// Resolve every deferred edge, failing on the first dangling id
    pub fn link(
        self,
        attacks: &Table<Attack>,
        assumptions: &mut Table<Assumption>,
        schemes: &mut Table<Scheme>,
    ) -> Result<LinkStats> {
        let mut stats = LinkStats::default();

        for pending in self.assumptions {
            let from = assumptions[pending.node].longid().to_string();

            let direct = pending
                .attacks
                .iter()
                .map(|target| resolve(attacks, &from, target))
                .collect::<Result<Vec<_>>>()?;
            let reductions = pending
                .reduces_to
                .iter()
                .map(|edge| {
                    Ok(Reduction {
                        target: resolve(&*assumptions, &from, edge.target())?,
                        quantum: edge.quantum(),
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            stats.attack_edges += direct.len();
            stats.reduction_edges += reductions.len();
            tracing::debug!(
                assumption = %from,
                attacks = direct.len(),
                reductions = reductions.len(),
                "Linked assumption"
            );

            let body = assumptions.body_mut(pending.node);
            body.attacks = direct;
            body.reduces_to = reductions;
        }

        for pending in self.schemes {
            let from = schemes[pending.node].longid().to_string();
            let required = pending
                .assumptions
                .iter()
                .map(|target| resolve(&*assumptions, &from, target))
                .collect::<Result<Vec<_>>>()?;

            stats.assumption_edges += required.len();
            tracing::debug!(scheme = %from, assumptions = required.len(), "Linked scheme");

            schemes.body_mut(pending.node).assumptions = required;
        }

        Ok(stats)
    }
}

fn resolve<T>(index: &Table<T>, from: &str, target: &str) -> Result<crate::NodeId<T>> {
    index.lookup(target).ok_or_else(|| Error::UnresolvedReference {
        kind: index.kind(),
        from_id: from.to_string(),
        target_id: target.to_string(),
    })
}

/// Edge counts produced by a link pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    pub attack_edges: usize,
    pub reduction_edges: usize,
    pub assumption_edges: usize,
}

impl LinkStats {
    pub fn total(&self) -> usize {
        self.attack_edges + self.reduction_edges + self.assumption_edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Name, NodeData, NodeKind};
    use crate::ComplexityClass;

    fn data<T>(id: &str, body: T) -> NodeData<T> {
        NodeData {
            id: id.into(),
            name: Name::default(),
            references: Vec::new(),
            comment: None,
            body,
        }
    }

    fn tables() -> (Table<Attack>, Table<Assumption>, Table<Scheme>) {
        let mut attacks = Table::new(NodeKind::Attack);
        attacks
            .insert(
                data(
                    "bf",
                    Attack {
                        complexity: ComplexityClass::parse("exp").unwrap(),
                        quantum: false,
                    },
                ),
                None,
            )
            .unwrap();
        let mut assumptions = Table::new(NodeKind::Assumption);
        assumptions.insert(data("a", Assumption::default()), None).unwrap();
        assumptions.insert(data("b", Assumption::default()), None).unwrap();
        (attacks, assumptions, Table::new(NodeKind::Scheme))
    }

    #[test]
    fn test_link_resolves_edges() {
        let (attacks, mut assumptions, mut schemes) = tables();
        let a = assumptions.lookup("a").unwrap();
        let b = assumptions.lookup("b").unwrap();
        let s = schemes.insert(data("s", Scheme::default()), None).unwrap();

        let mut linker = Linker::default();
        linker.defer_assumption(PendingAssumption {
            node: a,
            attacks: vec!["bf".into()],
            reduces_to: vec![ReductionRecord::new("b", true)],
        });
        linker.defer_scheme(PendingScheme {
            node: s,
            assumptions: vec!["a".into(), "b".into()],
        });
        let stats = linker.link(&attacks, &mut assumptions, &mut schemes).unwrap();

        assert_eq!(stats.total(), 4);
        assert_eq!(assumptions[a].body.attacks, vec![attacks.lookup("bf").unwrap()]);
        assert_eq!(
            assumptions[a].body.reduces_to,
            vec![Reduction { target: b, quantum: true }]
        );
        assert_eq!(schemes[s].body.assumptions, vec![a, b]);
    }

    #[test]
    fn test_link_reports_dangling_edge() {
        let (attacks, mut assumptions, mut schemes) = tables();
        let a = assumptions.lookup("a").unwrap();

        let mut linker = Linker::default();
        linker.defer_assumption(PendingAssumption {
            node: a,
            attacks: Vec::new(),
            reduces_to: vec![ReductionRecord::new("missing", false)],
        });
        let err = linker.link(&attacks, &mut assumptions, &mut schemes).unwrap_err();
        match err {
            Error::UnresolvedReference { kind, from_id, target_id } => {
                assert_eq!(kind, NodeKind::Assumption);
                assert_eq!(from_id, "a");
                assert_eq!(target_id, "missing");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_variants_are_not_top_level_targets() {
        let (attacks, mut assumptions, mut schemes) = tables();
        let a = assumptions.lookup("a").unwrap();
        assumptions.insert(data("v", Assumption::default()), Some(a)).unwrap();

        let mut linker = Linker::default();
        linker.defer_scheme(PendingScheme {
            node: schemes.insert(data("s", Scheme::default()), None).unwrap(),
            assumptions: vec!["v".into()],
        });
        assert!(matches!(
            linker.link(&attacks, &mut assumptions, &mut schemes),
            Err(Error::UnresolvedReference { .. })
        ));
    }
}
