//! Typed on-disk records for the three knowledge-base tables
//!
//! Edges are still bare id strings here; [`crate::link`] turns them into
//! [`crate::NodeId`]s.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::Name;

/// Mapping that keeps declaration order
///
/// Repeated keys are kept as separate entries; the knowledge base rejects
/// them when the tables are built.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedMap<T>(pub Vec<(String, T)>);

impl<T> OrderedMap<T> {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: T) {
        self.0.push((key.into(), value));
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T> Default for OrderedMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> IntoIterator for OrderedMap<T> {
    type Item = (String, T);
    type IntoIter = std::vec::IntoIter<(String, T)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<T: Serialize> Serialize for OrderedMap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(k, v)| (k, v)))
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for OrderedMap<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for OrderedVisitor<T> {
            type Value = OrderedMap<T>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping")
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(OrderedMap::new())
            }

            fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(OrderedMap::new())
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut map = OrderedMap(Vec::with_capacity(access.size_hint().unwrap_or(0)));
                while let Some((key, value)) = access.next_entry::<String, T>()? {
                    map.0.push((key, value));
                }
                Ok(map)
            }
        }

        deserializer.deserialize_any(OrderedVisitor(PhantomData))
    }
}

/// Either a single value or a list of them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(v) => vec![v],
            OneOrMany::Many(v) => v,
        }
    }
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

/// Quantum modifier on a `reduces_to` entry: `true`/`false` or the word `quantum`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QuantumFlag(pub bool);

impl<'de> Deserialize<'de> for QuantumFlag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Bool(bool),
            Word(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Bool(b) => Ok(QuantumFlag(b)),
            Raw::Word(w) if w == "quantum" => Ok(QuantumFlag(true)),
            Raw::Word(w) if w == "classical" => Ok(QuantumFlag(false)),
            Raw::Word(w) => Err(de::Error::custom(format!(
                "expected a boolean, \"quantum\" or \"classical\", got {w:?}"
            ))),
        }
    }
}

/// One `reduces_to` entry
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ReductionRecord {
    /// `dlog`
    Plain(String),
    /// `{id: dlog, quantum: true}`
    Tagged {
        id: String,
        #[serde(default)]
        quantum: QuantumFlag,
    },
    /// `[dlog, quantum]`
    Pair(String, QuantumFlag),
}

impl ReductionRecord {
    pub fn target(&self) -> &str {
        match self {
            ReductionRecord::Plain(id) => id,
            ReductionRecord::Tagged { id, .. } => id,
            ReductionRecord::Pair(id, _) => id,
        }
    }

    pub fn quantum(&self) -> bool {
        match self {
            ReductionRecord::Plain(_) => false,
            ReductionRecord::Tagged { quantum, .. } => quantum.0,
            ReductionRecord::Pair(_, quantum) => quantum.0,
        }
    }

    pub fn new(target: impl Into<String>, quantum: bool) -> Self {
        if quantum {
            ReductionRecord::Tagged {
                id: target.into(),
                quantum: QuantumFlag(true),
            }
        } else {
            ReductionRecord::Plain(target.into())
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttackRecord {
    #[serde(default)]
    pub name: Name,
    #[serde(default)]
    pub references: OrderedMap<String>,
    #[serde(default)]
    pub comment: Option<String>,
    /// Complexity text, parsed when the knowledge base is built.
    /// Required on top-level attacks, inherited by variants when absent
    #[serde(default)]
    pub complexity: Option<String>,
    /// Inherited by variants when absent, `false` at top level
    #[serde(default)]
    pub quantum: Option<bool>,
    #[serde(default)]
    pub variants: OrderedMap<AttackRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssumptionRecord {
    #[serde(default)]
    pub name: Name,
    #[serde(default)]
    pub references: OrderedMap<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub attacks: Vec<String>,
    #[serde(default)]
    pub reduces_to: Vec<ReductionRecord>,
    #[serde(default)]
    pub variants: OrderedMap<AssumptionRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemeRecord {
    #[serde(default)]
    pub name: Name,
    #[serde(default)]
    pub references: OrderedMap<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default, rename = "type")]
    pub types: OneOrMany<String>,
    #[serde(default)]
    pub assumptions: Vec<String>,
    #[serde(default)]
    pub variants: OrderedMap<SchemeRecord>,
}

/// The three raw tables, as produced by a loader
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Records {
    pub attacks: OrderedMap<AttackRecord>,
    pub assumptions: OrderedMap<AssumptionRecord>,
    pub schemes: OrderedMap<SchemeRecord>,
}

impl Records {
    /// Parse the three tables from YAML sources; a blank source is an empty table
    pub fn from_yaml_strs(attacks: &str, assumptions: &str, schemes: &str) -> crate::Result<Self> {
        Ok(Self {
            attacks: parse_table(attacks)?,
            assumptions: parse_table(assumptions)?,
            schemes: parse_table(schemes)?,
        })
    }
}

fn parse_table<T: de::DeserializeOwned>(source: &str) -> crate::Result<OrderedMap<T>> {
    if source.trim().is_empty() {
        return Ok(OrderedMap::new());
    }
    Ok(serde_yaml::from_str(source)?)
}
