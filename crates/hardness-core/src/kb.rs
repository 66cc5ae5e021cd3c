//! Knowledge base: the three linked tables
//!
//! Built once from [`Records`]: every node, variants included, is
//! constructed first, then the linker resolves edges. Read-only afterwards.

use crate::link::{Linker, PendingAssumption, PendingScheme};
use crate::node::{
    Assumption, AssumptionId, Attack, AttackId, NodeData, NodeKind, Scheme, SchemeId, Table,
};
use crate::records::{AssumptionRecord, AttackRecord, OrderedMap, Records, SchemeRecord};
use crate::{ComplexityClass, Error, KbConfig, LinkStats, Name, Resolver, Result};

#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    attacks: Table<Attack>,
    assumptions: Table<Assumption>,
    schemes: Table<Scheme>,
    link_stats: LinkStats,
}

impl KnowledgeBase {
    /// Construct and link all three tables
    pub fn from_records(records: Records) -> Result<Self> {
        let mut attacks = Table::new(NodeKind::Attack);
        let mut assumptions = Table::new(NodeKind::Assumption);
        let mut schemes = Table::new(NodeKind::Scheme);
        let mut linker = Linker::default();

        for (id, record) in records.attacks {
            insert_attack(&mut attacks, id, record, None)?;
        }
        for (id, record) in records.assumptions {
            insert_assumption(&mut assumptions, &mut linker, id, record, None)?;
        }
        for (id, record) in records.schemes {
            insert_scheme(&mut schemes, &mut linker, id, record, None)?;
        }

        tracing::info!(
            attacks = attacks.len(),
            assumptions = assumptions.len(),
            schemes = schemes.len(),
            "Knowledge base constructed"
        );

        let stats = linker.link(&attacks, &mut assumptions, &mut schemes)?;
        tracing::info!(
            attack_edges = stats.attack_edges,
            reduction_edges = stats.reduction_edges,
            assumption_edges = stats.assumption_edges,
            "Knowledge base linked"
        );

        Ok(Self {
            attacks,
            assumptions,
            schemes,
            link_stats: stats,
        })
    }

    /// Parse YAML sources, then construct and link
    pub fn from_yaml_strs(attacks: &str, assumptions: &str, schemes: &str) -> Result<Self> {
        Self::from_records(Records::from_yaml_strs(attacks, assumptions, schemes)?)
    }

    /// Read the table files named by `config`
    pub fn load(config: &KbConfig) -> Result<Self> {
        let read = |path: &std::path::Path| -> Result<String> {
            tracing::debug!(path = %path.display(), "Reading table");
            Ok(std::fs::read_to_string(path)?)
        };
        Self::from_yaml_strs(
            &read(&config.attacks)?,
            &read(&config.assumptions)?,
            &read(&config.schemes)?,
        )
    }

    pub fn attacks(&self) -> &Table<Attack> {
        &self.attacks
    }

    pub fn assumptions(&self) -> &Table<Assumption> {
        &self.assumptions
    }

    pub fn schemes(&self) -> &Table<Scheme> {
        &self.schemes
    }

    /// Edge counts from the link pass
    pub fn link_stats(&self) -> LinkStats {
        self.link_stats
    }

    /// Top-level attack by id
    pub fn attack(&self, id: &str) -> Result<AttackId> {
        found(&self.attacks, self.attacks.lookup(id), id)
    }

    /// Top-level assumption by id
    pub fn assumption(&self, id: &str) -> Result<AssumptionId> {
        found(&self.assumptions, self.assumptions.lookup(id), id)
    }

    /// Top-level scheme by id
    pub fn scheme(&self, id: &str) -> Result<SchemeId> {
        found(&self.schemes, self.schemes.lookup(id), id)
    }

    pub fn attack_by_longid(&self, longid: &str) -> Option<AttackId> {
        self.attacks.lookup_longid(longid)
    }

    pub fn assumption_by_longid(&self, longid: &str) -> Option<AssumptionId> {
        self.assumptions.lookup_longid(longid)
    }

    pub fn scheme_by_longid(&self, longid: &str) -> Option<SchemeId> {
        self.schemes.lookup_longid(longid)
    }

    /// A fresh query engine; each one owns its own cache
    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(self)
    }
}

fn found<T>(table: &Table<T>, hit: Option<crate::NodeId<T>>, id: &str) -> Result<crate::NodeId<T>> {
    hit.ok_or_else(|| Error::UnknownNode {
        kind: table.kind(),
        id: id.to_string(),
    })
}

fn node_data<T>(
    kind: NodeKind,
    id: String,
    name: Name,
    references: OrderedMap<String>,
    comment: Option<String>,
    body: T,
) -> Result<NodeData<T>> {
    let references: crate::References = references.into_iter().collect();
    for (i, (slug, _)) in references.iter().enumerate() {
        if references[..i].iter().any(|(seen, _)| seen == slug) {
            return Err(Error::InvalidRecord {
                kind,
                id,
                reason: format!("duplicate reference {slug:?}"),
            });
        }
    }
    Ok(NodeData {
        id,
        name,
        references,
        comment,
        body,
    })
}

fn duplicate(kind: NodeKind, parent_longid: Option<&str>, id: &str) -> Error {
    let id = match parent_longid {
        Some(parent) => format!("{parent}{}{id}", crate::LONGID_SEPARATOR),
        None => id.to_string(),
    };
    Error::DuplicateId { kind, id }
}

fn insert_attack(
    table: &mut Table<Attack>,
    id: String,
    record: AttackRecord,
    parent: Option<AttackId>,
) -> Result<AttackId> {
    let inherited = parent.map(|p| table[p].body.clone());
    let complexity = match (record.complexity.as_deref(), &inherited) {
        (Some(text), _) => ComplexityClass::parse(text)?,
        (None, Some(attack)) => attack.complexity,
        (None, None) => {
            return Err(Error::InvalidRecord {
                kind: NodeKind::Attack,
                id,
                reason: "missing complexity".into(),
            })
        }
    };
    let quantum = record
        .quantum
        .or(inherited.map(|attack| attack.quantum))
        .unwrap_or(false);

    let parent_longid = parent.map(|p| table[p].longid().to_string());
    let body = Attack { complexity, quantum };
    let data = node_data(NodeKind::Attack, id.clone(), record.name, record.references, record.comment, body)?;
    let node = table
        .insert(data, parent)
        .ok_or_else(|| duplicate(NodeKind::Attack, parent_longid.as_deref(), &id))?;

    for (variant, child) in record.variants {
        insert_attack(table, variant, child, Some(node))?;
    }
    Ok(node)
}

fn insert_assumption(
    table: &mut Table<Assumption>,
    linker: &mut Linker,
    id: String,
    record: AssumptionRecord,
    parent: Option<AssumptionId>,
) -> Result<AssumptionId> {
    let parent_longid = parent.map(|p| table[p].longid().to_string());
    let data = node_data(
        NodeKind::Assumption,
        id.clone(),
        record.name,
        record.references,
        record.comment,
        Assumption::default(),
    )?;
    let node = table
        .insert(data, parent)
        .ok_or_else(|| duplicate(NodeKind::Assumption, parent_longid.as_deref(), &id))?;

    linker.defer_assumption(PendingAssumption {
        node,
        attacks: record.attacks,
        reduces_to: record.reduces_to,
    });
    for (variant, child) in record.variants {
        insert_assumption(table, linker, variant, child, Some(node))?;
    }
    Ok(node)
}

fn insert_scheme(
    table: &mut Table<Scheme>,
    linker: &mut Linker,
    id: String,
    record: SchemeRecord,
    parent: Option<SchemeId>,
) -> Result<SchemeId> {
    let parent_longid = parent.map(|p| table[p].longid().to_string());
    let body = Scheme {
        types: record.types.into_vec(),
        assumptions: Vec::new(),
    };
    let data = node_data(NodeKind::Scheme, id.clone(), record.name, record.references, record.comment, body)?;
    let node = table
        .insert(data, parent)
        .ok_or_else(|| duplicate(NodeKind::Scheme, parent_longid.as_deref(), &id))?;

    linker.defer_scheme(PendingScheme {
        node,
        assumptions: record.assumptions,
    });
    for (variant, child) in record.variants {
        insert_scheme(table, linker, variant, child, Some(node))?;
    }
    Ok(node)
}
